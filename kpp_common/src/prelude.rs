//! Convenience re-exports for `kpp_kernel` and `kpp_supervisor`.

pub use crate::config::{
    ControlParams, DrivetrainParams, ElectricalParams, EventParams, HypothesisParams,
    KernelConfig, PhysicsParams, PneumaticParams,
};
pub use crate::error::{
    CommandOutcome, CommandRejected, ConfigurationError, CriticalSubsystemFault, FieldError,
    TransientSubsystemError,
};
pub use crate::sim::chain::ChainState;
pub use crate::sim::command::{Command, CommandEnvelope, ParamUpdate, ParamValue};
pub use crate::sim::control::{
    ControlState, Hypothesis, HypothesisFlags, OperatingMode, StartupPhase, TransitionResult,
};
pub use crate::sim::drivetrain::{DrivetrainState, FlywheelState, LossModel, StageState};
pub use crate::sim::electrical::{ElectricalFault, ElectricalState, GridSyncState};
pub use crate::sim::fault::{DrivetrainFault, FaultSet, IntegrationFault, PneumaticFault};
pub use crate::sim::floater::{FillState, Floater, FloaterGeometry, FloaterRecord};
pub use crate::sim::pneumatic::{CompressorMode, PneumaticState, SafetyLevel};
pub use crate::sim::schema::{ParamType, ParameterDescriptor, ParameterSchema, SCHEMA};
pub use crate::sim::snapshot::{PublisherStats, Snapshot};
