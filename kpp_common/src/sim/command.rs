//! Control commands accepted by the kernel's command dispatcher.

use serde::{Deserialize, Serialize};

use crate::sim::control::{Hypothesis, OperatingMode};

/// A typed parameter value, as validated against [`crate::schema::ParameterSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Floating-point value.
    Float(f64),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
}

/// A single `SET_PARAMS` field: name plus proposed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamUpdate {
    /// Parameter name, matched against the schema.
    pub name: String,
    /// Proposed value.
    pub value: ParamValue,
}

/// A tagged control command, queued by any external caller and drained
/// exclusively by the kernel's single writer between simulation steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Begin stepping from `Stopped`/`Paused` (does not run the startup
    /// sequencer — use `InitiateStartup` for a full cold start).
    Start,
    /// Suspend stepping, retaining all state.
    Pause,
    /// Stop cleanly after the current step completes.
    Stop,
    /// Clear faults and return to `Stopped`.
    Reset,
    /// Execute exactly one simulation step regardless of mode (used by
    /// test harnesses and the `step()` control operation).
    Step,
    /// Validate and apply a batch of parameter updates. Invalid entries
    /// are rejected individually; valid entries are still applied.
    SetParams(Vec<ParamUpdate>),
    /// Force an injection on the nearest bottom-zone heavy floater, subject
    /// to the same pressure gate as a natural bottom-zone pass.
    TriggerPulse,
    /// Set the load manager's target load factor.
    SetLoad(f64),
    /// Immediately drive all actuators to a safe state and enter `Emergency`.
    EmergencyStop,
    /// Begin the nested startup phase sequencer from `Stopped`.
    InitiateStartup,
    /// Request a top-level operating-mode transition directly (validated
    /// against the mode machine's transition table).
    SetControlMode(OperatingMode),
    /// Enable or disable one of the three enhancement hypotheses.
    ToggleHypothesis(Hypothesis, bool),
}

/// A command paired with the trace id its outcome will be reported under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Caller-correlatable trace id.
    pub trace_id: u64,
    /// The command itself.
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_update_roundtrips_through_json() {
        let update = ParamUpdate {
            name: "floater_volume".into(),
            value: ParamValue::Float(0.4),
        };
        let json = serde_json::to_string(&update).unwrap();
        let back: ParamUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update, back);
    }
}
