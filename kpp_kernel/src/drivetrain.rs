//! Four-stage mechanical pipeline: sprocket -> gearbox -> overrunning
//! clutch -> flywheel.
//!
//! Each stage is a pure function on the previous stage's `StageState`,
//! composing small, independently testable pipeline steps rather than one
//! monolithic update.

use kpp_common::config::DrivetrainParams;
use kpp_common::sim::drivetrain::{DrivetrainState, LossModel, StageState};
use kpp_common::sim::fault::DrivetrainFault;

/// Per-step drivetrain result, consumed by the electrical pipeline and fed
/// back into the physics engine as next step's generator reaction torque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivetrainOutput {
    /// Flywheel shaft torque delivered toward the generator [N*m].
    pub shaft_torque: f64,
    /// Flywheel shaft angular velocity [rad/s].
    pub shaft_angular_velocity: f64,
    /// Faults raised this step.
    pub faults: DrivetrainFault,
}

/// The mechanical pipeline.
pub struct DrivetrainPipeline;

impl DrivetrainPipeline {
    /// Advance `state` by one step given the physics engine's net chain
    /// force/torque and the generator's reaction torque on the flywheel
    /// shaft (computed on the *previous* step, per the fixed pipeline
    /// order).
    pub fn step(
        state: &mut DrivetrainState,
        params: &DrivetrainParams,
        chain_velocity: f64,
        net_chain_force: f64,
        sprocket_radius: f64,
        gen_reaction_torque: f64,
        dt: f64,
    ) -> DrivetrainOutput {
        // Stage 1: sprocket.
        let omega_1 = chain_velocity / sprocket_radius;
        let tau_1 = net_chain_force * sprocket_radius;
        state.sprocket = StageState {
            torque: tau_1,
            angular_velocity: omega_1,
        };
        let power_in = tau_1 * omega_1;

        // Stage 2: two-stage gearbox.
        let tau_s1 = tau_1 * params.gearbox_stage1_ratio * params.gearbox_stage1_efficiency;
        let omega_s1 = omega_1 / params.gearbox_stage1_ratio;
        let tau_2 = tau_s1 * params.gearbox_stage2_ratio * params.gearbox_stage2_efficiency;
        let omega_2 = omega_s1 / params.gearbox_stage2_ratio;
        state.gearbox = StageState {
            torque: tau_2,
            angular_velocity: omega_2,
        };
        let power_out_gearbox = tau_2 * omega_2;
        let gearbox_loss = (power_in - power_out_gearbox).max(0.0);

        // Stage 3: overrunning clutch.
        let engage_threshold = state.flywheel.angular_velocity * (1.0 - params.clutch_engage_epsilon);
        let reverse_torque = tau_2 < 0.0;
        state.clutch_engaged = omega_2 >= engage_threshold && !reverse_torque;
        let tau_3 = if state.clutch_engaged { tau_2 } else { 0.0 };
        state.clutch = StageState {
            torque: tau_3,
            angular_velocity: state.flywheel.angular_velocity,
        };

        // Stage 4: flywheel integration.
        let alpha = (tau_3 - gen_reaction_torque) / params.flywheel_inertia;
        let new_omega = state.flywheel.angular_velocity + alpha * dt;
        state.flywheel.angular_velocity = new_omega;
        state.flywheel.stored_energy_j = 0.5 * params.flywheel_inertia * new_omega * new_omega;

        state.losses = LossModel {
            sprocket_loss: 0.0,
            gearbox_loss,
            clutch_loss: 0.0,
        };

        let mut faults = DrivetrainFault::empty();
        if gearbox_loss < 0.0 {
            faults |= DrivetrainFault::ENERGY_VIOLATION;
        }

        DrivetrainOutput {
            shaft_torque: tau_3,
            shaft_angular_velocity: new_omega,
            faults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DrivetrainParams {
        DrivetrainParams::default()
    }

    #[test]
    fn gearbox_multiplies_torque_and_divides_speed() {
        let mut state = DrivetrainState::default();
        let out = DrivetrainPipeline::step(&mut state, &params(), 2.0, 1000.0, 1.0, 0.0, 0.1);
        assert!(state.gearbox.torque > state.sprocket.torque);
        assert!(state.gearbox.angular_velocity < state.sprocket.angular_velocity);
        assert!(out.shaft_angular_velocity.is_finite());
    }

    #[test]
    fn clutch_disengages_on_reverse_torque() {
        let mut state = DrivetrainState::default();
        let _ = DrivetrainPipeline::step(&mut state, &params(), 2.0, -1000.0, 1.0, 0.0, 0.1);
        assert!(!state.clutch_engaged);
        assert_eq!(state.clutch.torque, 0.0);
    }

    #[test]
    fn flywheel_accumulates_stored_energy_while_spinning_up() {
        let mut state = DrivetrainState::default();
        for _ in 0..50 {
            DrivetrainPipeline::step(&mut state, &params(), 2.0, 1000.0, 1.0, 0.0, 0.1);
        }
        assert!(state.flywheel.stored_energy_j > 0.0);
        assert!(state.flywheel.angular_velocity > 0.0);
    }

    #[test]
    fn clutch_engages_once_input_speed_meets_flywheel_speed() {
        let mut state = DrivetrainState::default();
        state.flywheel.angular_velocity = 0.01;
        let _ = DrivetrainPipeline::step(&mut state, &params(), 2.0, 1000.0, 1.0, 0.0, 0.1);
        assert!(state.clutch_engaged);
    }

    #[test]
    fn gearbox_loss_is_never_negative() {
        let mut state = DrivetrainState::default();
        let _ = DrivetrainPipeline::step(&mut state, &params(), 2.0, 1000.0, 1.0, 0.0, 0.1);
        assert!(state.losses.gearbox_loss >= 0.0);
    }
}
