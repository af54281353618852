//! Control state: the outer operating-mode machine, the nested startup
//! phase machine, and hypothesis enablement flags.

use serde::{Deserialize, Serialize};

/// Top-level operating mode.
///
/// `Emergency` is reachable from any state; leaving it requires an explicit
/// `reset()` (see `kpp_kernel::control::machine`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    /// No simulation stepping; drivetrain/electrical idle.
    Stopped,
    /// The nested startup phase machine is running.
    Starting,
    /// Normal operation; load manager and (if H3 enabled) pulse timing active.
    Running,
    /// Stepping suspended; state retained for a later `start()`/`step()`.
    Paused,
    /// All actuators driven to a safe state; persists until `reset()`.
    Emergency,
    /// A critical fault was detected outside of an explicit emergency stop.
    Fault,
}

/// Nested startup phase, valid only while `OperatingMode::Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupPhase {
    /// Allocating/zeroing runtime state.
    Initialization,
    /// Verifying configuration, floater count, temperatures.
    SystemChecks,
    /// Running the compressor until tank pressure reaches target.
    PressureBuild,
    /// Waiting for the first bottom-zone injection to produce measurable
    /// chain speed.
    FirstInjection,
    /// Waiting for the flywheel to reach target RPM.
    Acceleration,
    /// Waiting for the grid interface to reach `GridSyncState::Synced`.
    Synchronization,
    /// Startup complete; the sequencer will move `OperatingMode` to `Running`
    /// on the next evaluation.
    Operational,
    /// A phase timeout or gating failure occurred; the sequencer will move
    /// `OperatingMode` to `Emergency` on the next evaluation.
    Failed,
}

/// Enablement flags for the three configurable enhancement hypotheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HypothesisFlags {
    /// H1: nanobubble drag/buoyancy reduction.
    pub h1_nanobubbles: bool,
    /// H2: thermal buoyancy enhancement.
    pub h2_thermal: bool,
    /// H3: pulsed injection with coasting.
    pub h3_pulse_coast: bool,
}

/// Which hypothesis a `TOGGLE_HYPOTHESIS` command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hypothesis {
    /// Nanobubble drag/buoyancy reduction.
    H1,
    /// Thermal buoyancy enhancement.
    H2,
    /// Pulsed injection with coasting.
    H3,
}

/// Full control subsystem state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Current operating mode.
    pub mode: OperatingMode,
    /// Current startup phase (meaningful only while `mode == Starting`).
    pub startup_phase: StartupPhase,
    /// Simulation time the current startup phase was entered [s].
    pub phase_entered_at: f64,
    /// Enabled hypotheses.
    pub hypotheses: HypothesisFlags,
    /// Current load-factor setpoint in `[0, 1]`, used by the load manager.
    pub load_factor: f64,
}

impl ControlState {
    /// Construct control state at kernel init: stopped, no hypotheses.
    pub fn new() -> Self {
        Self {
            mode: OperatingMode::Stopped,
            startup_phase: StartupPhase::Initialization,
            phase_entered_at: 0.0,
            hypotheses: HypothesisFlags::default(),
            load_factor: 0.0,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of an attempted state-machine transition, in the shape of
/// `evo_control_unit::state::machine::TransitionResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult<S> {
    /// Transition succeeded — new state.
    Ok(S),
    /// Transition rejected — reason.
    Rejected(&'static str),
}
