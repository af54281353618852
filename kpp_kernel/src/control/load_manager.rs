//! Running-mode load manager: tracks a target electrical power by adjusting
//! the generator's load-factor setpoint.

use kpp_common::config::ControlParams;

/// Proportional load manager. A single free function rather than a struct
/// since it carries no state beyond what `ControlState::load_factor` already
/// holds.
pub fn update_load_factor(current_load_factor: f64, output_power_w: f64, params: &ControlParams, dt: f64) -> f64 {
    let error = params.target_power - output_power_w;
    let adjusted = current_load_factor + params.load_manager_gain * error * dt;
    adjusted.clamp(0.0, 1.0)
}
