//! Three-stage electrical pipeline: generator -> power electronics -> grid
//! interface.
//!
//! The generator model is a simplified induction-machine equivalent circuit
//! (stator/rotor resistance and leakage reactance, referred to the stator),
//! keeping the electromagnetic computation as a single pure function
//! returning a result struct rather than mutating fields inline.

use kpp_common::config::ElectricalParams;
use kpp_common::sim::electrical::{ElectricalFault, ElectricalState, GridSyncState};

/// Nominal grid frequency, used to convert angular speed to an electrical
/// frequency for the protection/sync checks.
const NOMINAL_FREQUENCY_HZ: f64 = 50.0;

/// Per-step electrical result, consumed by the kernel's power accounting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectricalOutput {
    /// Mechanical power drawn from the shaft this step [W] (the generator's
    /// loading of the drivetrain, regardless of grid sync state).
    pub mechanical_power: f64,
    /// Faults raised this step.
    pub faults: ElectricalFault,
}

/// The electrical pipeline.
pub struct ElectricalPipeline;

impl ElectricalPipeline {
    /// Advance `state` by one step given the drivetrain's shaft angular
    /// velocity and a load factor in `[0, 1]` set by the load manager.
    pub fn step(
        state: &mut ElectricalState,
        params: &ElectricalParams,
        shaft_angular_velocity: f64,
        load_factor: f64,
        dt: f64,
    ) -> ElectricalOutput {
        let load_factor = load_factor.clamp(0.0, 1.0);

        // Stage 1: generator, equivalent-circuit slip model.
        let raw_slip = (params.sync_speed - shaft_angular_velocity) / params.sync_speed;
        let slip = raw_slip.clamp(0.0, params.slip_max);
        let slip_for_circuit = slip.max(1e-6);

        let r2_over_s = params.rotor_resistance / slip_for_circuit;
        let impedance_sq = (params.stator_resistance + r2_over_s).powi(2)
            + (params.stator_reactance + params.rotor_reactance).powi(2);
        let current = params.rated_voltage / impedance_sq.sqrt();

        let saturation = if current > 0.8 * params.rated_current {
            let overdrive = (current - 0.8 * params.rated_current) / (0.2 * params.rated_current).max(1e-9);
            (1.0 - 0.5 * overdrive.min(1.0)).max(0.3)
        } else {
            1.0
        };

        let em_torque = load_factor * saturation * (params.rated_voltage * params.rated_voltage * r2_over_s)
            / (params.sync_speed * impedance_sq);
        let mechanical_power = em_torque * shaft_angular_velocity;

        let efficiency = (0.5 + 0.45 * load_factor) * (1.0 - slip).clamp(0.1, 1.0);
        let electrical_power_gen = mechanical_power * efficiency;

        let power_factor = if load_factor < 0.3 {
            (0.5 + load_factor).clamp(0.0, 1.0)
        } else {
            0.92
        };

        state.slip = slip;
        state.em_torque = em_torque;
        state.mechanical_power = mechanical_power;
        state.electrical_power = electrical_power_gen;
        state.efficiency = efficiency;
        state.power_factor = power_factor;

        // Stage 2: power electronics — AC -> DC -> AC conversion chain.
        let mut faults = ElectricalFault::empty();

        let terminal_voltage = params.rated_voltage * (1.0 - slip * 0.1);
        let voltage_error = (terminal_voltage - params.rated_voltage).abs() / params.rated_voltage;
        if voltage_error > params.voltage_tolerance {
            if terminal_voltage > params.rated_voltage {
                faults |= ElectricalFault::OVERVOLTAGE;
            } else {
                faults |= ElectricalFault::UNDERVOLTAGE;
            }
        }

        let frequency_actual = NOMINAL_FREQUENCY_HZ * (shaft_angular_velocity / params.sync_speed);
        let frequency_error = (frequency_actual - NOMINAL_FREQUENCY_HZ).abs();
        if frequency_error > params.frequency_tolerance_hz {
            faults |= ElectricalFault::FREQUENCY_DEVIATION;
        }

        if current > params.rated_current {
            faults |= ElectricalFault::OVERCURRENT;
        }

        let conversion_efficiency = params.rectifier_efficiency
            * params.inverter_efficiency
            * params.transformer_efficiency
            * params.filter_efficiency;
        let converted_power = if faults.is_critical() {
            0.0
        } else {
            electrical_power_gen * conversion_efficiency
        };

        state.faults = faults;

        // Stage 3: grid interface — synchronization tracking.
        let within_tolerance = voltage_error <= params.voltage_tolerance && frequency_error <= params.frequency_tolerance_hz;
        if within_tolerance {
            state.sync_progress = (state.sync_progress + dt / params.sync_time_constant).min(1.0);
        } else {
            state.sync_progress = (state.sync_progress - dt / params.sync_time_constant * 2.0).max(0.0);
        }

        state.grid_sync = if state.sync_progress >= 1.0 {
            GridSyncState::Synced
        } else if state.sync_progress > 0.0 {
            GridSyncState::Syncing
        } else {
            GridSyncState::Unsynced
        };

        state.output_power = if state.grid_sync == GridSyncState::Synced {
            converted_power
        } else {
            0.0
        };

        ElectricalOutput {
            mechanical_power,
            faults,
        }
    }
}
