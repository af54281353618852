//! H3 pulse-coast timing: forces an injection at a computed optimal phase
//! offset, then coasts for a configured duration before the next one.
//!
//! Only consulted by the kernel when `HypothesisFlags::h3_pulse_coast` is
//! set; otherwise the natural bottom-zone crossing in the event handler is
//! the only injection path.

use kpp_common::config::HypothesisParams;

/// Tracks when the last forced pulse occurred, so the kernel knows when the
/// next one is due. Held in `kernel.rs`, not in any committed snapshot
/// state, since it is pure scheduling bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PulseTimer {
    last_pulse_time: f64,
}

impl PulseTimer {
    /// A timer that has never fired.
    pub fn new() -> Self {
        Self {
            last_pulse_time: f64::NEG_INFINITY,
        }
    }

    /// True if `sim_time` has reached the next scheduled pulse, given the
    /// configured coast duration and the current chain angle's distance from
    /// the optimal injection offset.
    pub fn due(&self, sim_time: f64, chain_angle: f64, params: &HypothesisParams) -> bool {
        if sim_time - self.last_pulse_time < params.h3_pulse_coast_duration {
            return false;
        }
        let optimal_angle = params.h3_optimal_phase_offset * std::f64::consts::TAU;
        let angular_distance = (chain_angle - optimal_angle).rem_euclid(std::f64::consts::TAU);
        angular_distance < 0.05 || angular_distance > std::f64::consts::TAU - 0.05
    }

    /// Record that a pulse was just triggered.
    pub fn record_pulse(&mut self, sim_time: f64) {
        self.last_pulse_time = sim_time;
    }
}
