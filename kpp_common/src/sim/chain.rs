//! Chain state: the single shared kinematic object owned exclusively by the
//! physics engine.

use serde::{Deserialize, Serialize};

/// Unified chain kinematics. Every floater's `velocity` is a copy of
/// `ChainState::velocity` — the chain constraint means floaters cannot slip
/// relative to one another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainState {
    /// Linear chain velocity, signed by the rise-direction convention [m/s].
    pub velocity: f64,
    /// Accumulated angular position of a chain reference point, unwrapped
    /// (not clamped to one revolution) for diagnostics.
    pub angular_position: f64,
    /// Sprocket radius [m].
    pub sprocket_radius: f64,
}

impl ChainState {
    /// Construct a chain at rest.
    pub fn new(sprocket_radius: f64) -> Self {
        Self {
            velocity: 0.0,
            angular_position: 0.0,
            sprocket_radius,
        }
    }

    /// Sprocket angular velocity `omega = v / R`.
    #[inline]
    pub fn angular_velocity(&self) -> f64 {
        self.velocity / self.sprocket_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angular_velocity_matches_definition() {
        let mut c = ChainState::new(2.0);
        c.velocity = 4.0;
        assert_eq!(c.angular_velocity(), 2.0);
    }
}
