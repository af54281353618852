//! Error taxonomy for the KPP simulation kernel.
//!
//! Four kinds, matching the propagation rules a subsystem/controller pair
//! must follow: `ConfigurationError` and `CommandRejected` are returned
//! directly to the caller; `TransientSubsystemError` is absorbed locally and
//! only surfaced via the fault set in the next snapshot; `CriticalSubsystemFault`
//! is escalated by the control sequencer into `OperatingMode::Emergency`.
//! None of these terminate the process — see `kpp_kernel::control`.

use thiserror::Error;

/// Invalid parameters at init or via `SET_PARAMS`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A named parameter is not part of the schema.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A named parameter's value is outside its declared range.
    #[error("parameter {name} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: f64,
        /// Declared minimum.
        min: f64,
        /// Declared maximum.
        max: f64,
    },

    /// A named parameter's value has the wrong type for its schema entry.
    #[error("parameter {name} has wrong type, expected {expected}")]
    WrongType {
        /// Parameter name.
        name: String,
        /// Expected type name ("float", "int", "bool").
        expected: &'static str,
    },

    /// The configuration file could not be read from disk.
    #[error("failed to read configuration file: {0}")]
    FileIo(String),
}

/// Recoverable subsystem condition: handled locally, logged, surfaced in the
/// fault set of the next committed snapshot, and does not change the
/// control mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransientSubsystemError {
    /// A bottom-zone injection was gated on insufficient tank pressure.
    #[error("injection deferred: tank pressure {pressure:.0} Pa below threshold {threshold:.0} Pa")]
    InjectionDeferredLowPressure {
        /// Current tank pressure [Pa].
        pressure: f64,
        /// Configured injection threshold [Pa].
        threshold: f64,
    },

    /// The pneumatic safety level briefly left `Normal`.
    #[error("pneumatic safety level elevated to {0:?}")]
    PneumaticSafetyElevated(crate::sim::pneumatic::SafetyLevel),

    /// The compressor was asked to start within its minimum cycle time.
    #[error("compressor start suppressed: {remaining:.1}s remaining in minimum cycle time")]
    CompressorShortCycleSuppressed {
        /// Seconds remaining before the compressor may start again.
        remaining: f64,
    },
}

/// Unrecoverable subsystem condition: the control sequencer transitions the
/// kernel to `OperatingMode::Emergency` in response, but the process itself
/// never exits on this.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriticalSubsystemFault {
    /// The physics integrator's chain velocity exceeded the configured cap.
    #[error("integration divergence: |v|={velocity:.3} m/s exceeds cap {cap:.3} m/s")]
    IntegrationDivergence {
        /// Observed chain velocity magnitude [m/s].
        velocity: f64,
        /// Configured velocity cap [m/s].
        cap: f64,
    },

    /// Tank pressure left the safe envelope.
    #[error("pressure emergency: {pressure:.0} Pa outside [{low:.0}, {high:.0}] Pa")]
    PressureEmergency {
        /// Observed tank pressure [Pa].
        pressure: f64,
        /// Configured critical-low bound [Pa].
        low: f64,
        /// Configured emergency-high bound [Pa].
        high: f64,
    },

    /// A power-electronics protection check tripped (over/under-voltage,
    /// frequency deviation, or overcurrent).
    #[error("generator protection trip: {0}")]
    GeneratorProtectionTrip(&'static str),

    /// A startup phase exceeded its configured timeout.
    #[error("startup phase {phase:?} timed out after {elapsed:.1}s")]
    StartupPhaseTimeout {
        /// The phase that timed out.
        phase: crate::sim::control::StartupPhase,
        /// Simulation time spent in the phase [s].
        elapsed: f64,
    },

    /// A NaN or infinite value was observed in a subsystem output.
    #[error("non-finite value observed in {0}")]
    NonFiniteValue(&'static str),
}

/// A control operation could not be carried out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandRejected {
    /// `SET_CONTROL_MODE`/lifecycle transition is illegal from the current mode.
    #[error("illegal transition: {reason}")]
    InvalidTransition {
        /// Human-readable reason, in the shape of `TransitionResult::Rejected`.
        reason: &'static str,
    },

    /// One or more `SET_PARAMS` fields failed validation. Valid fields are
    /// still applied — this error only reports the rejected subset.
    #[error("{} parameter(s) rejected", .0.len())]
    ValidationFailed(Vec<FieldError>),

    /// The command variant is not recognized (e.g. sent by an out-of-date client).
    #[error("unknown command")]
    UnknownCommand,

    /// The command queue is full; the caller must retry.
    #[error("command queue full")]
    QueueFull,
}

/// A single rejected field within a `SET_PARAMS` batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Parameter name.
    pub field: String,
    /// Reason it was rejected.
    pub error: ConfigurationError,
}

/// The outcome of any kernel control operation, carrying a trace id so
/// callers can correlate requests with the fault appearing in a later
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// Correlates this outcome with the command that produced it.
    pub trace_id: u64,
    /// `Ok(())` or the rejection reason.
    pub result: Result<(), CommandRejected>,
}
