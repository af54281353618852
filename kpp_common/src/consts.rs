//! System-wide physical and engineering constants for the KPP workspace.
//!
//! Single source of truth for defaults and numeric bounds. Imported by
//! both `kpp_kernel` and `kpp_supervisor` — no duplication permitted.

use static_assertions::const_assert;

/// Standard gravitational acceleration [m/s^2].
pub const GRAVITY: f64 = 9.80665;

/// Water density at typical operating temperature [kg/m^3].
pub const WATER_DENSITY: f64 = 1000.0;

/// Atmospheric pressure at sea level [Pa].
pub const ATMOSPHERIC_PRESSURE: f64 = 101_325.0;

/// Default simulation step [s].
pub const DEFAULT_DT: f64 = 0.1;

/// Minimum allowed simulation step [s].
pub const DT_MIN: f64 = 0.01;

/// Maximum allowed simulation step [s].
pub const DT_MAX: f64 = 0.1;

/// Velocity below which the drag term uses `DRAG_VELOCITY_EPSILON` instead
/// of the true (near-zero) velocity, to avoid a zero-drag singularity at
/// rest without producing NaN.
pub const DRAG_VELOCITY_EPSILON: f64 = 1.0e-3;

/// Default chain velocity cap [m/s]. Exceeding this triggers
/// `IntegrationDivergence`.
pub const DEFAULT_VELOCITY_CAP: f64 = 50.0;

/// Default publisher tick rate [Hz].
pub const DEFAULT_TICK_RATE_HZ: f64 = 30.0;

/// Default maximum floater count.
pub const MAX_FLOATERS: usize = 64;

/// Default bottom injection zone half-angle [rad].
pub const DEFAULT_BOTTOM_ZONE_HALF_ANGLE: f64 = 0.05;

/// Default top venting zone half-angle [rad].
pub const DEFAULT_TOP_ZONE_HALF_ANGLE: f64 = 0.05;

/// Default ring buffer max snapshot count.
pub const DEFAULT_RING_BUFFER_MAX_COUNT: usize = 1800;

/// Default ring buffer max bytes.
pub const DEFAULT_RING_BUFFER_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Default bounded command queue depth.
pub const DEFAULT_COMMAND_QUEUE_DEPTH: usize = 256;

/// Default per-subscriber broadcast buffer depth.
pub const DEFAULT_SUBSCRIBER_BUFFER_DEPTH: usize = 64;

/// Maximum number of commands drained per tick before deferring the rest
/// (keeps the tick loop responsive under a command burst).
pub const MAX_COMMANDS_PER_TICK: usize = 32;

const_assert!(DT_MIN <= DT_MAX);
const_assert!(DEFAULT_DT >= DT_MIN && DEFAULT_DT <= DT_MAX);
const_assert!(MAX_COMMANDS_PER_TICK <= DEFAULT_COMMAND_QUEUE_DEPTH);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_bounds_are_consistent() {
        assert!(DT_MIN > 0.0);
        assert!(DT_MIN <= DEFAULT_DT);
        assert!(DEFAULT_DT <= DT_MAX);
    }

    #[test]
    fn velocity_epsilon_is_small() {
        assert!(DRAG_VELOCITY_EPSILON > 0.0);
        assert!(DRAG_VELOCITY_EPSILON < 1.0);
    }
}
