//! Outer operating-mode state machine.
//!
//! Directly grounded on
//! `evo_control_unit::state::machine::MachineStateMachine::handle_event`:
//! an explicit event enum, exhaustive match over `(mode, event)`, and a
//! `TransitionResult` rather than a panic on an illegal move.

use kpp_common::sim::control::{OperatingMode, TransitionResult};

/// Events the operating-mode machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// `start()` or `initiate_startup()`.
    StartRequested,
    /// `pause()`.
    PauseRequested,
    /// `stop()`.
    StopRequested,
    /// `reset()`, valid only from `Emergency` or `Fault`.
    ResetRequested,
    /// `emergency_stop()`, or a critical fault was detected this step.
    EmergencyRequested,
    /// The nested startup sequencer reached `StartupPhase::Operational`.
    StartupCompleted,
    /// The nested startup sequencer reached `StartupPhase::Failed`.
    StartupFailed,
}

/// Advance `mode` per `event`. `Emergency` is reachable from any mode;
/// leaving it is only possible via `ResetRequested`.
pub fn handle_event(mode: OperatingMode, event: ModeEvent) -> TransitionResult<OperatingMode> {
    use ModeEvent::*;
    use OperatingMode::*;

    if matches!(event, EmergencyRequested) {
        return TransitionResult::Ok(Emergency);
    }

    match (mode, event) {
        (Stopped, StartRequested) => TransitionResult::Ok(Starting),
        (Starting, StartupCompleted) => TransitionResult::Ok(Running),
        (Starting, StartupFailed) => TransitionResult::Ok(Fault),
        (Starting, StopRequested) => TransitionResult::Ok(Stopped),
        (Running, PauseRequested) => TransitionResult::Ok(Paused),
        (Running, StopRequested) => TransitionResult::Ok(Stopped),
        (Paused, StartRequested) => TransitionResult::Ok(Running),
        (Paused, StopRequested) => TransitionResult::Ok(Stopped),
        (Emergency, ResetRequested) => TransitionResult::Ok(Stopped),
        (Fault, ResetRequested) => TransitionResult::Ok(Stopped),
        (Emergency, _) | (Fault, _) => {
            TransitionResult::Rejected("mode latched, requires reset() to clear")
        }
        (Stopped, _) | (Starting, _) | (Running, _) | (Paused, _) => {
            TransitionResult::Rejected("event not valid from the current operating mode")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_from_stopped_enters_starting() {
        let result = handle_event(OperatingMode::Stopped, ModeEvent::StartRequested);
        assert_eq!(result, TransitionResult::Ok(OperatingMode::Starting));
    }

    #[test]
    fn emergency_reachable_from_any_mode() {
        for mode in [
            OperatingMode::Stopped,
            OperatingMode::Starting,
            OperatingMode::Running,
            OperatingMode::Paused,
            OperatingMode::Fault,
        ] {
            assert_eq!(
                handle_event(mode, ModeEvent::EmergencyRequested),
                TransitionResult::Ok(OperatingMode::Emergency)
            );
        }
    }

    #[test]
    fn emergency_rejects_everything_but_reset() {
        let result = handle_event(OperatingMode::Emergency, ModeEvent::StartRequested);
        assert!(matches!(result, TransitionResult::Rejected(_)));
    }

    #[test]
    fn reset_from_emergency_returns_to_stopped() {
        let result = handle_event(OperatingMode::Emergency, ModeEvent::ResetRequested);
        assert_eq!(result, TransitionResult::Ok(OperatingMode::Stopped));
    }

    #[test]
    fn pause_only_valid_from_running() {
        let result = handle_event(OperatingMode::Starting, ModeEvent::PauseRequested);
        assert!(matches!(result, TransitionResult::Rejected(_)));
    }
}
