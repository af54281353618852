//! Compressor hysteresis state machine and tank pressure accounting.
//!
//! The transition logic here mirrors
//! `evo_control_unit::state::machine::MachineStateMachine::handle_event`'s
//! shape: an explicit event enum, a method returning a rejection reason
//! instead of panicking on an invalid transition, and a pure function
//! separate from the state it mutates.

use kpp_common::config::PneumaticParams;
use kpp_common::sim::fault::PneumaticFault;
use kpp_common::sim::pneumatic::{CompressorMode, PneumaticState, SafetyLevel};

/// Events the compressor's state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressorEvent {
    /// Pressure has fallen low enough, and the cycle-time guard has cleared.
    StartRequested,
    /// Pressure has reached the high setpoint, or an emergency was declared.
    StopRequested,
    /// A fault was observed (e.g. runaway pressure rate).
    FaultDetected,
    /// `reset()` was issued; clears a latched fault.
    Reset,
}

/// Either the new mode, or a rejection reason (mirrors
/// `kpp_common::sim::control::TransitionResult`, but kept local since the
/// compressor is not part of the mode machine's generic state space).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressorTransition {
    /// Transition accepted; new mode given.
    Applied(CompressorMode),
    /// Transition rejected; not a valid move from the current mode.
    Rejected(&'static str),
}

/// Advance `compressor_mode` per `event`. Pure function over the enum; the
/// caller is responsible for updating cycle/timestamp bookkeeping.
pub fn handle_event(mode: CompressorMode, event: CompressorEvent) -> CompressorTransition {
    use CompressorEvent::*;
    use CompressorMode::*;

    match (mode, event) {
        (_, FaultDetected) => CompressorTransition::Applied(Fault),
        (Fault, Reset) => CompressorTransition::Applied(Off),
        (Fault, _) => CompressorTransition::Rejected("compressor latched in fault, awaiting reset"),
        (Off, StartRequested) => CompressorTransition::Applied(Starting),
        (Starting, StartRequested) => CompressorTransition::Applied(Running),
        (Running, StopRequested) => CompressorTransition::Applied(Stopping),
        (Stopping, StopRequested) => CompressorTransition::Applied(Off),
        (Off, StopRequested) => CompressorTransition::Applied(Off),
        (Running, StartRequested) => CompressorTransition::Applied(Running),
        (Starting, StopRequested) => CompressorTransition::Applied(Stopping),
        (Stopping, StartRequested) => CompressorTransition::Rejected("cannot restart mid-stop"),
        (Off, Reset) | (Starting, Reset) | (Running, Reset) | (Stopping, Reset) => {
            CompressorTransition::Rejected("reset only valid from fault")
        }
    }
}

/// Per-step pneumatic outcome: faults raised this step, for the caller to
/// merge into the snapshot's [`kpp_common::sim::fault::FaultSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PneumaticOutcome {
    /// Faults observed this step.
    pub faults: PneumaticFault,
    /// Electrical power drawn by the compressor this step [W], to be
    /// subtracted from net plant output.
    pub power_draw_w: f64,
}

/// The pneumatic subsystem: owns no state of its own, operates on
/// [`PneumaticState`] passed in by the kernel's per-tick orchestration.
pub struct PneumaticSubsystem;

impl PneumaticSubsystem {
    /// Advance `state` by one step of `dt`, consuming `injected_volume_m3`
    /// reported by the event handler to apply the resulting pressure drop,
    /// running the compressor hysteresis control law, and reclassifying the
    /// aggregate safety level.
    pub fn step(
        state: &mut PneumaticState,
        params: &PneumaticParams,
        sim_time: f64,
        dt: f64,
        injected_volume_m3: f64,
        injection_depth_pressure: f64,
        emergency_active: bool,
    ) -> PneumaticOutcome {
        let mut outcome = PneumaticOutcome::default();
        let pressure_before = state.tank_pressure;

        if injected_volume_m3 > 0.0 {
            let drop = injection_depth_pressure * injected_volume_m3 / params.tank_volume;
            state.tank_pressure = (state.tank_pressure - drop).max(0.0);
        }

        if emergency_active && state.compressor_mode != CompressorMode::Off {
            Self::apply(state, CompressorEvent::StopRequested, sim_time);
        } else {
            match state.compressor_mode {
                CompressorMode::Off => {
                    let cycle_guard_clear = sim_time - state.last_stop_time >= params.min_cycle_time;
                    if state.tank_pressure < params.low_setpoint && cycle_guard_clear {
                        Self::apply(state, CompressorEvent::StartRequested, sim_time);
                    }
                }
                CompressorMode::Starting | CompressorMode::Running => {
                    if state.tank_pressure >= params.high_setpoint {
                        Self::apply(state, CompressorEvent::StopRequested, sim_time);
                    } else {
                        Self::apply(state, CompressorEvent::StartRequested, sim_time);
                    }
                }
                CompressorMode::Stopping => {
                    Self::apply(state, CompressorEvent::StopRequested, sim_time);
                }
                CompressorMode::Fault => {}
            }
        }

        if state.compressor_mode == CompressorMode::Running {
            state.tank_pressure += params.fill_rate * dt;
            state.total_runtime_s += dt;
            state.energy_input_j += params.compressor_power_draw * dt;
            outcome.power_draw_w = params.compressor_power_draw;
        }

        state.pressure_rate = (state.tank_pressure - pressure_before) / dt;

        if state.pressure_rate.abs() > params.max_pressure_rate {
            outcome.faults |= PneumaticFault::RATE_EXCEEDED;
        }

        state.safety_level = if state.tank_pressure < params.critical_low || state.tank_pressure > params.emergency_high {
            outcome.faults |= PneumaticFault::PRESSURE_EMERGENCY;
            SafetyLevel::Emergency
        } else if state.tank_pressure < params.critical_low * 1.1 {
            SafetyLevel::Critical
        } else if !outcome.faults.is_empty() {
            SafetyLevel::Warning
        } else {
            SafetyLevel::Normal
        };

        if state.compressor_mode == CompressorMode::Fault {
            outcome.faults |= PneumaticFault::COMPRESSOR_FAULT;
        }

        outcome
    }

    /// Force the compressor into `Fault`, latching until `reset()`.
    pub fn declare_fault(state: &mut PneumaticState) {
        state.compressor_mode = CompressorMode::Fault;
    }

    /// Clear a latched fault, returning the compressor to `Off`.
    pub fn reset(state: &mut PneumaticState) {
        if let CompressorTransition::Applied(mode) = handle_event(state.compressor_mode, CompressorEvent::Reset) {
            state.compressor_mode = mode;
        }
    }

    fn apply(state: &mut PneumaticState, event: CompressorEvent, sim_time: f64) {
        if let CompressorTransition::Applied(new_mode) = handle_event(state.compressor_mode, event) {
            if new_mode == CompressorMode::Running && state.compressor_mode != CompressorMode::Running {
                state.last_start_time = sim_time;
                state.cycle_count += 1;
            }
            if new_mode == CompressorMode::Off && state.compressor_mode != CompressorMode::Off {
                state.last_stop_time = sim_time;
            }
            state.compressor_mode = new_mode;
        }
    }
}
