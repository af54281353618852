//! Pneumatic state: tank pressure, compressor mode, and cycle accounting.
//!
//! The compressor hysteresis state machine itself (the transition logic)
//! lives in `kpp_kernel::pneumatic` — this module only carries the shared
//! data types, in the style of `evo_common` (state enums) vs.
//! `evo_control_unit` (transition functions).

use serde::{Deserialize, Serialize};

/// Compressor operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressorMode {
    /// Not running, pressure above the low setpoint or in min-cycle hold.
    Off,
    /// Transitioning on (modeled instantaneously; present for symmetry with
    /// `Stopping` and for future spin-up modeling).
    Starting,
    /// Actively filling the tank.
    Running,
    /// Transitioning off.
    Stopping,
    /// Latched fault — will not restart until the fault is cleared by a
    /// `reset()`.
    Fault,
}

/// Aggregate pressure/rate safety classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLevel {
    /// Pressure and rate within normal bounds.
    Normal,
    /// Rate of change exceeds the configured maximum.
    Warning,
    /// Pressure within the emergency band but not yet past it.
    Critical,
    /// Pressure outside `[critical_low, emergency_high]`.
    Emergency,
}

/// Full pneumatic subsystem state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PneumaticState {
    /// Tank pressure [Pa]. Invariant: never negative, never above
    /// `emergency_high`.
    pub tank_pressure: f64,
    /// Current compressor mode.
    pub compressor_mode: CompressorMode,
    /// Simulation time of the last compressor stop [s].
    pub last_stop_time: f64,
    /// Simulation time of the last compressor start [s].
    pub last_start_time: f64,
    /// Cumulative electrical energy the compressor has consumed [J].
    pub energy_input_j: f64,
    /// Monotonically increasing compressor start count.
    pub cycle_count: u64,
    /// Monotonically increasing compressor runtime [s].
    pub total_runtime_s: f64,
    /// Most recent pressure rate of change [Pa/s], for diagnostics.
    pub pressure_rate: f64,
    /// Aggregate safety classification.
    pub safety_level: SafetyLevel,
}

impl PneumaticState {
    /// Construct pneumatic state at rest with the tank already at its
    /// low setpoint (a cold system starts with the compressor able to run
    /// immediately).
    pub fn new(initial_pressure: f64) -> Self {
        Self {
            tank_pressure: initial_pressure,
            compressor_mode: CompressorMode::Off,
            last_stop_time: f64::NEG_INFINITY,
            last_start_time: f64::NEG_INFINITY,
            energy_input_j: 0.0,
            cycle_count: 0,
            total_runtime_s: 0.0,
            pressure_rate: 0.0,
            safety_level: SafetyLevel::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_off_and_normal() {
        let p = PneumaticState::new(3.0e5);
        assert_eq!(p.compressor_mode, CompressorMode::Off);
        assert_eq!(p.safety_level, SafetyLevel::Normal);
        assert_eq!(p.cycle_count, 0);
    }
}
