//! Declarative parameter schema used to validate `SET_PARAMS` requests and
//! to answer `get_parameter_schema()`.
//!
//! The schema is the single source of truth for what a caller may set:
//! name, type, and bounds are declared once here and checked against a
//! [`crate::config::KernelConfig`] value by [`ParameterSchema::validate`].
//! Unknown names and out-of-range or wrongly-typed values are rejected
//! per-field.

use crate::error::{ConfigurationError, FieldError};
use crate::sim::command::{ParamUpdate, ParamValue};

/// The declared type of a schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// IEEE-754 double.
    Float,
    /// Signed 64-bit integer.
    Int,
    /// Boolean flag.
    Bool,
}

impl ParamType {
    fn name(self) -> &'static str {
        match self {
            ParamType::Float => "float",
            ParamType::Int => "int",
            ParamType::Bool => "bool",
        }
    }
}

/// One entry in the parameter schema.
#[derive(Debug, Clone, Copy)]
pub struct ParameterDescriptor {
    /// Dotted name, e.g. `"physics.floater_volume"`.
    pub name: &'static str,
    /// Declared type.
    pub param_type: ParamType,
    /// Inclusive minimum, for numeric types. Ignored for `Bool`.
    pub min: f64,
    /// Inclusive maximum, for numeric types. Ignored for `Bool`.
    pub max: f64,
    /// Default value, as an `f64` (bools encode as `0.0`/`1.0`).
    pub default: f64,
}

/// The full set of settable parameters, in declaration order.
pub struct ParameterSchema {
    entries: &'static [ParameterDescriptor],
}

macro_rules! descriptor {
    ($name:expr, Float, $min:expr, $max:expr, $default:expr) => {
        ParameterDescriptor {
            name: $name,
            param_type: ParamType::Float,
            min: $min,
            max: $max,
            default: $default,
        }
    };
    ($name:expr, Int, $min:expr, $max:expr, $default:expr) => {
        ParameterDescriptor {
            name: $name,
            param_type: ParamType::Int,
            min: $min,
            max: $max,
            default: $default,
        }
    };
    ($name:expr, Bool, $default:expr) => {
        ParameterDescriptor {
            name: $name,
            param_type: ParamType::Bool,
            min: 0.0,
            max: 1.0,
            default: $default,
        }
    };
}

/// The schema instance every `SET_PARAMS` call and `get_parameter_schema()`
/// response is validated against.
pub static SCHEMA: ParameterSchema = ParameterSchema {
    entries: &[
        descriptor!("physics.gravity", Float, 1.0, 20.0, 9.80665),
        descriptor!("physics.water_density", Float, 500.0, 1500.0, 1000.0),
        descriptor!("physics.sprocket_radius", Float, 0.1, 5.0, 1.0),
        descriptor!("physics.dt", Float, 0.01, 0.1, 0.1),
        descriptor!("physics.velocity_cap", Float, 1.0, 200.0, 50.0),
        descriptor!("physics.floater_count", Int, 1.0, 64.0, 8.0),
        descriptor!("physics.floater_volume", Float, 0.01, 10.0, 0.3),
        descriptor!("physics.floater_area", Float, 0.01, 10.0, 0.5),
        descriptor!("physics.floater_drag_coefficient", Float, 0.0, 3.0, 0.8),
        descriptor!("physics.floater_container_mass", Float, 0.1, 500.0, 20.0),
        descriptor!("hypotheses.h1_nanobubble_void_fraction", Float, 0.0, 0.5, 0.1),
        descriptor!("hypotheses.h1_drag_reduction_factor", Float, 0.0, 1.0, 0.5),
        descriptor!("hypotheses.h2_thermal_delta_factor", Float, 0.0, 1.0, 0.05),
        descriptor!("hypotheses.h2_enhancement_coefficient", Float, 0.0, 1.0, 0.2),
        descriptor!("hypotheses.h3_pulse_coast_duration", Float, 0.0, 30.0, 2.0),
        descriptor!("hypotheses.h3_optimal_phase_offset", Float, 0.0, 1.0, 0.1),
        descriptor!("events.bottom_zone_half_angle", Float, 0.001, 0.5, 0.05),
        descriptor!("events.top_zone_half_angle", Float, 0.001, 0.5, 0.05),
        descriptor!("events.injection_pressure_threshold", Float, 0.0, 1.0e7, 2.5e5),
        descriptor!("events.atmospheric_pressure", Float, 5.0e4, 2.0e5, 101_325.0),
        descriptor!("events.tank_depth", Float, 0.1, 200.0, 10.0),
        descriptor!("pneumatic.tank_volume", Float, 0.01, 100.0, 2.0),
        descriptor!("pneumatic.low_setpoint", Float, 0.0, 1.0e7, 2.8e5),
        descriptor!("pneumatic.high_setpoint", Float, 0.0, 1.0e7, 3.5e5),
        descriptor!("pneumatic.critical_low", Float, 0.0, 1.0e7, 1.2e5),
        descriptor!("pneumatic.emergency_high", Float, 0.0, 1.0e7, 6.0e5),
        descriptor!("pneumatic.min_cycle_time", Float, 0.0, 600.0, 30.0),
        descriptor!("pneumatic.fill_rate", Float, 0.0, 1.0e6, 5000.0),
        descriptor!("pneumatic.compressor_power_draw", Float, 0.0, 1.0e6, 3000.0),
        descriptor!("pneumatic.max_pressure_rate", Float, 0.0, 1.0e6, 20_000.0),
        descriptor!("drivetrain.gearbox_stage1_ratio", Float, 0.1, 50.0, 4.0),
        descriptor!("drivetrain.gearbox_stage1_efficiency", Float, 0.01, 1.0, 0.97),
        descriptor!("drivetrain.gearbox_stage2_ratio", Float, 0.1, 50.0, 3.0),
        descriptor!("drivetrain.gearbox_stage2_efficiency", Float, 0.01, 1.0, 0.97),
        descriptor!("drivetrain.clutch_engage_epsilon", Float, 0.0, 0.5, 0.02),
        descriptor!("drivetrain.flywheel_inertia", Float, 1.0, 100_000.0, 500.0),
        descriptor!("electrical.sync_speed", Float, 1.0, 1000.0, 157.08),
        descriptor!("electrical.stator_resistance", Float, 0.001, 10.0, 0.05),
        descriptor!("electrical.rotor_resistance", Float, 0.001, 10.0, 0.08),
        descriptor!("electrical.stator_reactance", Float, 0.001, 10.0, 0.2),
        descriptor!("electrical.rotor_reactance", Float, 0.001, 10.0, 0.2),
        descriptor!("electrical.rated_voltage", Float, 1.0, 50_000.0, 690.0),
        descriptor!("electrical.rated_current", Float, 1.0, 50_000.0, 500.0),
        descriptor!("electrical.slip_max", Float, 0.001, 0.5, 0.05),
        descriptor!("electrical.rectifier_efficiency", Float, 0.01, 1.0, 0.98),
        descriptor!("electrical.inverter_efficiency", Float, 0.01, 1.0, 0.97),
        descriptor!("electrical.transformer_efficiency", Float, 0.01, 1.0, 0.99),
        descriptor!("electrical.filter_efficiency", Float, 0.01, 1.0, 0.995),
        descriptor!("electrical.voltage_tolerance", Float, 0.0, 1.0, 0.12),
        descriptor!("electrical.frequency_tolerance_hz", Float, 0.0, 10.0, 0.5),
        descriptor!("electrical.sync_time_constant", Float, 0.1, 60.0, 5.0),
        descriptor!("control.timeout_system_checks", Float, 1.0, 120.0, 10.0),
        descriptor!("control.timeout_pressure_build", Float, 1.0, 300.0, 30.0),
        descriptor!("control.timeout_first_injection", Float, 1.0, 300.0, 20.0),
        descriptor!("control.timeout_acceleration", Float, 1.0, 300.0, 20.0),
        descriptor!("control.timeout_synchronization", Float, 1.0, 300.0, 15.0),
        descriptor!("control.load_manager_gain", Float, 0.0, 5.0, 0.5),
        descriptor!("control.target_power", Float, 0.0, 1.0e8, 20_000.0),
    ],
};

impl ParameterSchema {
    /// All entries, in declaration order — backs `get_parameter_schema()`.
    pub fn entries(&self) -> &'static [ParameterDescriptor] {
        self.entries
    }

    fn find(&self, name: &str) -> Option<&'static ParameterDescriptor> {
        self.entries.iter().find(|d| d.name == name)
    }

    /// Validate a single update against its descriptor. Does not mutate
    /// any config — callers apply accepted updates themselves.
    pub fn validate_one(&self, update: &ParamUpdate) -> Result<(), ConfigurationError> {
        let descriptor = self
            .find(&update.name)
            .ok_or_else(|| ConfigurationError::UnknownParameter(update.name.clone()))?;

        let value = match (descriptor.param_type, update.value) {
            (ParamType::Float, ParamValue::Float(v)) => v,
            (ParamType::Int, ParamValue::Int(v)) => v as f64,
            (ParamType::Bool, ParamValue::Bool(_)) => return Ok(()),
            _ => {
                return Err(ConfigurationError::WrongType {
                    name: update.name.clone(),
                    expected: descriptor.param_type.name(),
                });
            }
        };

        if !value.is_finite() || value < descriptor.min || value > descriptor.max {
            return Err(ConfigurationError::OutOfRange {
                name: update.name.clone(),
                value,
                min: descriptor.min,
                max: descriptor.max,
            });
        }
        Ok(())
    }

    /// Validate a batch, partitioning into accepted and rejected entries:
    /// invalid entries are rejected individually while valid ones are still
    /// applied — the caller applies `accepted`.
    pub fn validate_batch<'a>(
        &self,
        updates: &'a [ParamUpdate],
    ) -> (Vec<&'a ParamUpdate>, Vec<FieldError>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for update in updates {
            match self.validate_one(update) {
                Ok(()) => accepted.push(update),
                Err(error) => rejected.push(FieldError {
                    field: update.name.clone(),
                    error,
                }),
            }
        }
        (accepted, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_parameter_is_rejected() {
        let update = ParamUpdate {
            name: "physics.does_not_exist".into(),
            value: ParamValue::Float(1.0),
        };
        assert_eq!(
            SCHEMA.validate_one(&update),
            Err(ConfigurationError::UnknownParameter(
                "physics.does_not_exist".into()
            ))
        );
    }

    #[test]
    fn out_of_range_is_rejected() {
        let update = ParamUpdate {
            name: "physics.floater_volume".into(),
            value: ParamValue::Float(-5.0),
        };
        assert!(matches!(
            SCHEMA.validate_one(&update),
            Err(ConfigurationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let update = ParamUpdate {
            name: "physics.floater_volume".into(),
            value: ParamValue::Bool(true),
        };
        assert!(matches!(
            SCHEMA.validate_one(&update),
            Err(ConfigurationError::WrongType { .. })
        ));
    }

    #[test]
    fn in_range_value_is_accepted() {
        let update = ParamUpdate {
            name: "physics.floater_volume".into(),
            value: ParamValue::Float(0.5),
        };
        assert_eq!(SCHEMA.validate_one(&update), Ok(()));
    }

    #[test]
    fn batch_partitions_valid_and_invalid() {
        let updates = vec![
            ParamUpdate {
                name: "physics.floater_volume".into(),
                value: ParamValue::Float(0.5),
            },
            ParamUpdate {
                name: "physics.floater_volume".into(),
                value: ParamValue::Float(-1.0),
            },
            ParamUpdate {
                name: "unknown.thing".into(),
                value: ParamValue::Int(1),
            },
        ];
        let (accepted, rejected) = SCHEMA.validate_batch(&updates);
        assert_eq!(accepted.len(), 1);
        assert_eq!(rejected.len(), 2);
    }
}
