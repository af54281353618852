//! Command validation: schema checks for `SET_PARAMS`, transition legality
//! for `SET_CONTROL_MODE`. The bounded queue itself is a plain
//! `tokio::sync::mpsc::channel`, owned by `kernel.rs` — this module only
//! holds the validation rules the dispatcher applies before a command is
//! allowed onto that queue or acted on by the kernel.

use kpp_common::error::{CommandRejected, FieldError};
use kpp_common::sim::command::ParamUpdate;
use kpp_common::sim::control::OperatingMode;
use kpp_common::sim::schema::ParameterSchema;

/// Validate a `SET_PARAMS` batch against `schema`. Matches the partial-accept
/// contract: valid entries are returned for application, invalid ones as
/// field errors, and both lists are always returned together (no reason to
/// ever fail the whole batch because of one bad field).
pub fn validate_param_batch<'a>(
    schema: &ParameterSchema,
    updates: &'a [ParamUpdate],
) -> (Vec<&'a ParamUpdate>, Vec<FieldError>) {
    schema.validate_batch(updates)
}

/// Whether a direct `SET_CONTROL_MODE` request from `current` to `target`
/// is legal. Distinct from [`crate::control::machine::handle_event`] because
/// `SET_CONTROL_MODE` names a destination mode directly rather than an
/// event, but the reachable set mirrors the same table.
pub fn validate_set_control_mode(current: OperatingMode, target: OperatingMode) -> Result<(), CommandRejected> {
    use OperatingMode::*;

    let legal = match (current, target) {
        (_, Emergency) => true,
        (Emergency, Stopped) | (Fault, Stopped) => true,
        (Stopped, Starting) => true,
        (Starting, Running) | (Starting, Stopped) => true,
        (Running, Paused) | (Running, Stopped) => true,
        (Paused, Running) | (Paused, Stopped) => true,
        _ => false,
    };

    if legal {
        Ok(())
    } else {
        Err(CommandRejected::InvalidTransition {
            reason: "requested operating mode is not reachable from the current mode",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpp_common::sim::command::ParamValue;
    use kpp_common::sim::schema::SCHEMA;

    #[test]
    fn valid_and_invalid_params_partition_independently() {
        let updates = vec![
            ParamUpdate {
                name: "physics.gravity".into(),
                value: ParamValue::Float(9.8),
            },
            ParamUpdate {
                name: "not.a.real.param".into(),
                value: ParamValue::Float(1.0),
            },
        ];
        let (valid, invalid) = validate_param_batch(&SCHEMA, &updates);
        assert_eq!(valid.len(), 1);
        assert_eq!(invalid.len(), 1);
    }

    #[test]
    fn emergency_reachable_from_running() {
        assert!(validate_set_control_mode(OperatingMode::Running, OperatingMode::Emergency).is_ok());
    }

    #[test]
    fn running_to_starting_is_rejected() {
        assert!(validate_set_control_mode(OperatingMode::Running, OperatingMode::Starting).is_err());
    }
}
