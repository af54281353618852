//! Drivetrain state: sprocket -> gearbox -> overrunning clutch -> flywheel.

use serde::{Deserialize, Serialize};

/// Torque/speed pair reported for one drivetrain stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageState {
    /// Stage output torque [N*m].
    pub torque: f64,
    /// Stage output angular velocity [rad/s].
    pub angular_velocity: f64,
}

/// Flywheel-specific state (the final drivetrain stage).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlywheelState {
    /// Flywheel angular velocity [rad/s].
    pub angular_velocity: f64,
    /// Stored rotational kinetic energy, `0.5 * I * omega^2` [J].
    pub stored_energy_j: f64,
}

/// Per-stage loss accounting, reported for the snapshot's loss-model block.
/// Each value is non-negative (a stage can only dissipate energy, never
/// create it).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LossModel {
    /// Sprocket-stage loss [W].
    pub sprocket_loss: f64,
    /// Gearbox-stage loss [W].
    pub gearbox_loss: f64,
    /// Clutch-stage loss [W] (zero unless slipping; engagement is a
    /// positive-torque-differential snap rather than a slip clutch).
    pub clutch_loss: f64,
}

/// Full drivetrain pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DrivetrainState {
    /// Sprocket stage (input from chain).
    pub sprocket: StageState,
    /// Gearbox output stage.
    pub gearbox: StageState,
    /// Clutch output stage.
    pub clutch: StageState,
    /// Flywheel stage.
    pub flywheel: FlywheelState,
    /// Whether the overrunning clutch is currently transmitting torque.
    pub clutch_engaged: bool,
    /// Per-stage loss accounting.
    pub losses: LossModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_drivetrain_state_is_at_rest() {
        let d = DrivetrainState::default();
        assert_eq!(d.flywheel.angular_velocity, 0.0);
        assert!(!d.clutch_engaged);
    }
}
