//! Bottom/top zone crossing detection: fill-state transitions and injection
//! energy accounting.
//!
//! Returns an explicit outcome struct rather than mutating hidden counters,
//! in the style of `evaluate_errors`/`evaluate_axis_safety`'s per-cycle
//! evaluation functions.

use kpp_common::config::EventParams;
use kpp_common::error::TransientSubsystemError;
use kpp_common::sim::floater::{FillState, Floater};
use kpp_common::sim::pneumatic::PneumaticState;

/// Result of one event-handler pass over all floaters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
    /// Number of injections performed this step.
    pub injections: u32,
    /// Number of ventings performed this step.
    pub ventings: u32,
    /// Total injection energy booked this step [J].
    pub injection_energy_j: f64,
    /// Total air volume injected this step [m^3], consumed by
    /// `kpp_kernel::pneumatic` to compute the resulting pressure drop.
    pub injected_volume_m3: f64,
    /// Transient faults raised this step (deferred injections).
    pub transient_faults: Vec<TransientSubsystemError>,
}

/// Depth-pressure at the tank: `P_atm + rho_water * g * tank_depth`.
fn injection_depth_pressure(params: &EventParams, gravity: f64, water_density: f64) -> f64 {
    params.atmospheric_pressure + water_density * gravity * params.tank_depth
}

/// Per-step zone-crossing / fill-state transition handler.
pub struct EventHandler;

impl EventHandler {
    /// Process one step for all floaters, mutating fill states and the
    /// tank's pressure as a side effect of injections. `gravity` and
    /// `water_density` are taken from [`kpp_common::config::PhysicsParams`]
    /// since the depth-pressure formula depends on them.
    pub fn process(
        floaters: &mut [Floater],
        pneumatic: &PneumaticState,
        params: &EventParams,
        gravity: f64,
        water_density: f64,
    ) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        let depth_pressure = injection_depth_pressure(params, gravity, water_density);

        for floater in floaters.iter_mut() {
            let in_bottom_zone = floater.angle < params.bottom_zone_half_angle
                || floater.angle > std::f64::consts::TAU - params.bottom_zone_half_angle;
            let in_top_zone = (floater.angle - std::f64::consts::PI).abs() < params.top_zone_half_angle;

            // `fill_state` itself is the debounce: a floater injects at most once
            // per bottom pass (Heavy -> Light) and vents at most once per top pass
            // (Light -> Heavy), with no separate per-revolution flag needed.
            if floater.fill_state == FillState::Heavy && in_bottom_zone {
                if pneumatic.tank_pressure >= params.injection_pressure_threshold {
                    floater.fill_state = FillState::Light;
                    let energy = depth_pressure * floater.geometry.volume;
                    outcome.injection_energy_j += energy;
                    outcome.injected_volume_m3 += floater.geometry.volume;
                    outcome.injections += 1;
                } else {
                    outcome.transient_faults.push(TransientSubsystemError::InjectionDeferredLowPressure {
                        pressure: pneumatic.tank_pressure,
                        threshold: params.injection_pressure_threshold,
                    });
                }
            }

            if floater.fill_state == FillState::Light && in_top_zone {
                floater.fill_state = FillState::Heavy;
            }
        }

        outcome
    }

    /// Force an injection on the nearest bottom-zone heavy floater, subject
    /// to the same pressure gate as a natural pass. Used by `TRIGGER_PULSE`.
    pub fn trigger_pulse(
        floaters: &mut [Floater],
        pneumatic: &PneumaticState,
        params: &EventParams,
        gravity: f64,
        water_density: f64,
    ) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        let depth_pressure = injection_depth_pressure(params, gravity, water_density);

        let nearest = floaters
            .iter_mut()
            .filter(|f| f.fill_state == FillState::Heavy)
            .min_by(|a, b| {
                let da = a.angle.min(std::f64::consts::TAU - a.angle);
                let db = b.angle.min(std::f64::consts::TAU - b.angle);
                da.partial_cmp(&db).unwrap()
            });

        let Some(floater) = nearest else {
            return outcome;
        };

        if pneumatic.tank_pressure >= params.injection_pressure_threshold {
            floater.fill_state = FillState::Light;
            outcome.injection_energy_j = depth_pressure * floater.geometry.volume;
            outcome.injections = 1;
        } else {
            outcome.transient_faults.push(TransientSubsystemError::InjectionDeferredLowPressure {
                pressure: pneumatic.tank_pressure,
                threshold: params.injection_pressure_threshold,
            });
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpp_common::sim::floater::FloaterGeometry;

    fn geom() -> FloaterGeometry {
        FloaterGeometry {
            volume: 0.3,
            area: 0.5,
            drag_coefficient: 0.8,
            container_mass: 20.0,
        }
    }

    fn params() -> EventParams {
        EventParams::default()
    }

    #[test]
    fn heavy_floater_in_bottom_zone_with_pressure_injects() {
        let mut floaters = vec![Floater::new(0, 0.0, geom())];
        let pneumatic = PneumaticState::new(3.0e5);
        let outcome = EventHandler::process(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(outcome.injections, 1);
        assert_eq!(floaters[0].fill_state, FillState::Light);
    }

    #[test]
    fn injection_deferred_below_threshold() {
        let mut floaters = vec![Floater::new(0, 0.0, geom())];
        let pneumatic = PneumaticState::new(1.0e4);
        let outcome = EventHandler::process(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(outcome.injections, 0);
        assert_eq!(floaters[0].fill_state, FillState::Heavy);
        assert_eq!(outcome.transient_faults.len(), 1);
    }

    #[test]
    fn floater_injects_at_bottom_then_vents_at_top() {
        let mut floaters = vec![Floater::new(0, 0.0, geom())];
        let pneumatic = PneumaticState::new(3.0e5);
        EventHandler::process(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(floaters[0].fill_state, FillState::Light);

        floaters[0].angle = std::f64::consts::PI;
        EventHandler::process(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(floaters[0].fill_state, FillState::Heavy);
    }

    #[test]
    fn no_double_injection_within_one_revolution() {
        let mut floaters = vec![Floater::new(0, 0.0, geom())];
        let pneumatic = PneumaticState::new(3.0e5);
        let first = EventHandler::process(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(first.injections, 1);
        let second = EventHandler::process(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(second.injections, 0);
    }

    #[test]
    fn trigger_pulse_picks_nearest_bottom_floater() {
        let mut floaters = vec![
            Floater::new(0, 0.3, geom()),
            Floater::new(1, 0.02, geom()),
        ];
        let pneumatic = PneumaticState::new(3.0e5);
        let outcome = EventHandler::trigger_pulse(&mut floaters, &pneumatic, &params(), 9.80665, 1000.0);
        assert_eq!(outcome.injections, 1);
        assert_eq!(floaters[1].fill_state, FillState::Light);
        assert_eq!(floaters[0].fill_state, FillState::Heavy);
    }
}
