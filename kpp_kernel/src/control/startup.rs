//! Nested startup phase sequencer, active only while
//! `OperatingMode::Starting`.
//!
//! Each phase has a timeout measured against `phase_entered_at`; a phase
//! advances once its gating condition holds, mirroring
//! `evo_control_unit::cycle`'s separation of "what advances the phase" from
//! "how long we've been waiting".

use kpp_common::config::{ControlParams, EventParams};
use kpp_common::sim::control::{ControlState, StartupPhase};
use kpp_common::sim::drivetrain::DrivetrainState;
use kpp_common::sim::electrical::{ElectricalState, GridSyncState};
use kpp_common::sim::pneumatic::PneumaticState;

/// Minimum chain speed considered "measurable" for the `FirstInjection` gate.
const MEASURABLE_CHAIN_SPEED: f64 = 0.01;

/// Fraction of synchronous speed the flywheel must reach before the
/// `Acceleration` gate clears.
const ACCELERATION_SPEED_FRACTION: f64 = 0.95;

/// Inputs the gating conditions read from the rest of the kernel's state.
pub struct StartupInputs<'a> {
    pub pneumatic: &'a PneumaticState,
    pub drivetrain: &'a DrivetrainState,
    pub electrical: &'a ElectricalState,
    pub chain_velocity: f64,
    pub floater_count: usize,
    pub sync_speed: f64,
}

/// Outcome of one startup-sequencer evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupEvaluation {
    /// Still in progress; no phase or mode change needed.
    InProgress,
    /// Reached `Operational`; the outer mode machine should move to `Running`.
    Completed,
    /// A phase timed out or failed its gate; the outer mode machine should
    /// move to `Emergency`.
    Failed,
}

fn phase_timeout(phase: StartupPhase, params: &ControlParams) -> Option<f64> {
    match phase {
        StartupPhase::SystemChecks => Some(params.timeout_system_checks),
        StartupPhase::PressureBuild => Some(params.timeout_pressure_build),
        StartupPhase::FirstInjection => Some(params.timeout_first_injection),
        StartupPhase::Acceleration => Some(params.timeout_acceleration),
        StartupPhase::Synchronization => Some(params.timeout_synchronization),
        StartupPhase::Initialization | StartupPhase::Operational | StartupPhase::Failed => None,
    }
}

fn gate_clears(phase: StartupPhase, inputs: &StartupInputs, event_params: &EventParams) -> bool {
    match phase {
        StartupPhase::Initialization => true,
        StartupPhase::SystemChecks => inputs.floater_count > 0,
        StartupPhase::PressureBuild => inputs.pneumatic.tank_pressure >= event_params.injection_pressure_threshold,
        StartupPhase::FirstInjection => inputs.chain_velocity.abs() >= MEASURABLE_CHAIN_SPEED,
        StartupPhase::Acceleration => {
            inputs.drivetrain.flywheel.angular_velocity >= inputs.sync_speed * ACCELERATION_SPEED_FRACTION
        }
        StartupPhase::Synchronization => inputs.electrical.grid_sync == GridSyncState::Synced,
        StartupPhase::Operational | StartupPhase::Failed => false,
    }
}

fn next_phase(phase: StartupPhase) -> StartupPhase {
    match phase {
        StartupPhase::Initialization => StartupPhase::SystemChecks,
        StartupPhase::SystemChecks => StartupPhase::PressureBuild,
        StartupPhase::PressureBuild => StartupPhase::FirstInjection,
        StartupPhase::FirstInjection => StartupPhase::Acceleration,
        StartupPhase::Acceleration => StartupPhase::Synchronization,
        StartupPhase::Synchronization => StartupPhase::Operational,
        StartupPhase::Operational | StartupPhase::Failed => phase,
    }
}

/// Evaluate and advance the nested startup phase machine by one step.
pub fn evaluate(
    state: &mut ControlState,
    inputs: &StartupInputs,
    control_params: &ControlParams,
    event_params: &EventParams,
    sim_time: f64,
) -> StartupEvaluation {
    if state.startup_phase == StartupPhase::Operational {
        return StartupEvaluation::Completed;
    }

    if let Some(timeout) = phase_timeout(state.startup_phase, control_params) {
        if sim_time - state.phase_entered_at > timeout {
            state.startup_phase = StartupPhase::Failed;
            return StartupEvaluation::Failed;
        }
    }

    if gate_clears(state.startup_phase, inputs, event_params) {
        let advanced = next_phase(state.startup_phase);
        state.startup_phase = advanced;
        state.phase_entered_at = sim_time;
        if advanced == StartupPhase::Operational {
            return StartupEvaluation::Completed;
        }
    }

    StartupEvaluation::InProgress
}
