//! Typed configuration structures for the KPP simulation kernel.
//!
//! All config types derive `serde::Deserialize` for TOML loading. Every
//! numeric field has a `#[serde(default = "...")]` so a partial TOML
//! document still loads, matching `evo_common::control_unit::config`'s
//! forward-compatible style. Declared ranges live alongside the schema in
//! [`crate::schema`], not here — this module is the *storage*, the schema
//! is the *validator* `SET_PARAMS` checks against.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigurationError;

macro_rules! default_fn {
    ($name:ident, $ty:ty, $val:expr) => {
        fn $name() -> $ty {
            $val
        }
    };
}

// ─── Physics ─────────────────────────────────────────────────────────

default_fn!(default_gravity, f64, GRAVITY);
default_fn!(default_water_density, f64, WATER_DENSITY);
default_fn!(default_sprocket_radius, f64, 1.0);
default_fn!(default_dt, f64, DEFAULT_DT);
default_fn!(default_velocity_cap, f64, DEFAULT_VELOCITY_CAP);
default_fn!(default_floater_count, u32, 8);
default_fn!(default_floater_volume, f64, 0.3);
default_fn!(default_floater_area, f64, 0.5);
default_fn!(default_floater_drag_coefficient, f64, 0.8);
default_fn!(default_floater_container_mass, f64, 20.0);

/// Core physics integrator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Gravitational acceleration [m/s^2].
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Water density [kg/m^3].
    #[serde(default = "default_water_density")]
    pub water_density: f64,
    /// Sprocket radius [m].
    #[serde(default = "default_sprocket_radius")]
    pub sprocket_radius: f64,
    /// Simulation step [s], must stay within `[DT_MIN, DT_MAX]`.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Chain velocity cap [m/s]; exceeding it raises `IntegrationDivergence`.
    #[serde(default = "default_velocity_cap")]
    pub velocity_cap: f64,
    /// Number of floaters on the chain.
    #[serde(default = "default_floater_count")]
    pub floater_count: u32,
    /// Per-floater displaced volume [m^3].
    #[serde(default = "default_floater_volume")]
    pub floater_volume: f64,
    /// Per-floater cross-sectional area [m^2].
    #[serde(default = "default_floater_area")]
    pub floater_area: f64,
    /// Per-floater drag coefficient.
    #[serde(default = "default_floater_drag_coefficient")]
    pub floater_drag_coefficient: f64,
    /// Per-floater empty container mass [kg].
    #[serde(default = "default_floater_container_mass")]
    pub floater_container_mass: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            water_density: default_water_density(),
            sprocket_radius: default_sprocket_radius(),
            dt: default_dt(),
            velocity_cap: default_velocity_cap(),
            floater_count: default_floater_count(),
            floater_volume: default_floater_volume(),
            floater_area: default_floater_area(),
            floater_drag_coefficient: default_floater_drag_coefficient(),
            floater_container_mass: default_floater_container_mass(),
        }
    }
}

// ─── Hypotheses ──────────────────────────────────────────────────────

default_fn!(default_h1_void_fraction, f64, 0.1);
default_fn!(default_h1_drag_reduction, f64, 0.5);
default_fn!(default_h2_thermal_delta, f64, 0.05);
default_fn!(default_h2_enhancement, f64, 0.2);
default_fn!(default_h3_coast_duration, f64, 2.0);
default_fn!(default_h3_phase_offset, f64, 0.1);

/// Tunable coefficients for the three enhancement hypotheses: configured
/// parameters rather than hard-coded constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisParams {
    /// H1: fraction of water volume treated as void (reduces effective
    /// density) when nanobubbles are enabled.
    #[serde(default = "default_h1_void_fraction")]
    pub h1_nanobubble_void_fraction: f64,
    /// H1: fraction of the void fraction actually applied to buoyancy.
    #[serde(default = "default_h1_drag_reduction")]
    pub h1_drag_reduction_factor: f64,
    /// H2: temperature-delta factor driving the thermal buoyancy bonus.
    #[serde(default = "default_h2_thermal_delta")]
    pub h2_thermal_delta_factor: f64,
    /// H2: coefficient scaling the thermal bonus into a force fraction.
    #[serde(default = "default_h2_enhancement")]
    pub h2_enhancement_coefficient: f64,
    /// H3: coast duration after a pulsed injection [s].
    #[serde(default = "default_h3_coast_duration")]
    pub h3_pulse_coast_duration: f64,
    /// H3: optimal injection phase offset, as a fraction of one revolution.
    #[serde(default = "default_h3_phase_offset")]
    pub h3_optimal_phase_offset: f64,
}

impl Default for HypothesisParams {
    fn default() -> Self {
        Self {
            h1_nanobubble_void_fraction: default_h1_void_fraction(),
            h1_drag_reduction_factor: default_h1_drag_reduction(),
            h2_thermal_delta_factor: default_h2_thermal_delta(),
            h2_enhancement_coefficient: default_h2_enhancement(),
            h3_pulse_coast_duration: default_h3_coast_duration(),
            h3_optimal_phase_offset: default_h3_phase_offset(),
        }
    }
}

// ─── Events ──────────────────────────────────────────────────────────

default_fn!(default_bottom_half_angle, f64, DEFAULT_BOTTOM_ZONE_HALF_ANGLE);
default_fn!(default_top_half_angle, f64, DEFAULT_TOP_ZONE_HALF_ANGLE);
default_fn!(default_injection_threshold, f64, 2.5e5);
default_fn!(default_atmospheric_pressure, f64, ATMOSPHERIC_PRESSURE);
default_fn!(default_tank_depth, f64, 10.0);

/// Event-handler zone and injection-energy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParams {
    /// Bottom injection zone half-angle [rad].
    #[serde(default = "default_bottom_half_angle")]
    pub bottom_zone_half_angle: f64,
    /// Top venting zone half-angle [rad].
    #[serde(default = "default_top_half_angle")]
    pub top_zone_half_angle: f64,
    /// Minimum tank pressure required to perform an injection [Pa].
    #[serde(default = "default_injection_threshold")]
    pub injection_pressure_threshold: f64,
    /// Atmospheric pressure [Pa], used in the injection-depth pressure calc.
    #[serde(default = "default_atmospheric_pressure")]
    pub atmospheric_pressure: f64,
    /// Tank submersion depth [m], used in the injection-depth pressure calc.
    #[serde(default = "default_tank_depth")]
    pub tank_depth: f64,
}

impl Default for EventParams {
    fn default() -> Self {
        Self {
            bottom_zone_half_angle: default_bottom_half_angle(),
            top_zone_half_angle: default_top_half_angle(),
            injection_pressure_threshold: default_injection_threshold(),
            atmospheric_pressure: default_atmospheric_pressure(),
            tank_depth: default_tank_depth(),
        }
    }
}

// ─── Pneumatics ──────────────────────────────────────────────────────

default_fn!(default_tank_volume, f64, 2.0);
default_fn!(default_low_setpoint, f64, 2.8e5);
default_fn!(default_high_setpoint, f64, 3.5e5);
default_fn!(default_critical_low, f64, 1.2e5);
default_fn!(default_emergency_high, f64, 6.0e5);
default_fn!(default_min_cycle_time, f64, 30.0);
default_fn!(default_fill_rate, f64, 5000.0);
default_fn!(default_compressor_power_draw, f64, 3000.0);
default_fn!(default_max_pressure_rate, f64, 20_000.0);

/// Pneumatic / compressor hysteresis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PneumaticParams {
    /// Tank volume [m^3].
    #[serde(default = "default_tank_volume")]
    pub tank_volume: f64,
    /// Compressor starts when pressure falls below this [Pa].
    #[serde(default = "default_low_setpoint")]
    pub low_setpoint: f64,
    /// Compressor stops when pressure reaches this [Pa].
    #[serde(default = "default_high_setpoint")]
    pub high_setpoint: f64,
    /// Lower bound of the safe pressure envelope [Pa].
    #[serde(default = "default_critical_low")]
    pub critical_low: f64,
    /// Upper bound of the safe pressure envelope [Pa].
    #[serde(default = "default_emergency_high")]
    pub emergency_high: f64,
    /// Minimum time between a compressor stop and its next start [s].
    #[serde(default = "default_min_cycle_time")]
    pub min_cycle_time: f64,
    /// Pressure rise rate while the compressor runs [Pa/s].
    #[serde(default = "default_fill_rate")]
    pub fill_rate: f64,
    /// Electrical power drawn while the compressor runs [W].
    #[serde(default = "default_compressor_power_draw")]
    pub compressor_power_draw: f64,
    /// `|dP/dt|` above this triggers `SafetyLevel::Warning` [Pa/s].
    #[serde(default = "default_max_pressure_rate")]
    pub max_pressure_rate: f64,
}

impl Default for PneumaticParams {
    fn default() -> Self {
        Self {
            tank_volume: default_tank_volume(),
            low_setpoint: default_low_setpoint(),
            high_setpoint: default_high_setpoint(),
            critical_low: default_critical_low(),
            emergency_high: default_emergency_high(),
            min_cycle_time: default_min_cycle_time(),
            fill_rate: default_fill_rate(),
            compressor_power_draw: default_compressor_power_draw(),
            max_pressure_rate: default_max_pressure_rate(),
        }
    }
}

// ─── Drivetrain ──────────────────────────────────────────────────────

default_fn!(default_gearbox_stage1_ratio, f64, 4.0);
default_fn!(default_gearbox_stage1_efficiency, f64, 0.97);
default_fn!(default_gearbox_stage2_ratio, f64, 3.0);
default_fn!(default_gearbox_stage2_efficiency, f64, 0.97);
default_fn!(default_clutch_engage_epsilon, f64, 0.02);
default_fn!(default_flywheel_inertia, f64, 500.0);

/// Drivetrain pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivetrainParams {
    /// First gearbox stage ratio.
    #[serde(default = "default_gearbox_stage1_ratio")]
    pub gearbox_stage1_ratio: f64,
    /// First gearbox stage efficiency, in `(0, 1]`.
    #[serde(default = "default_gearbox_stage1_efficiency")]
    pub gearbox_stage1_efficiency: f64,
    /// Second gearbox stage ratio.
    #[serde(default = "default_gearbox_stage2_ratio")]
    pub gearbox_stage2_ratio: f64,
    /// Second gearbox stage efficiency, in `(0, 1]`.
    #[serde(default = "default_gearbox_stage2_efficiency")]
    pub gearbox_stage2_efficiency: f64,
    /// Fractional speed margin for clutch engagement:
    /// engages when `omega_in >= omega_flywheel * (1 - epsilon)`.
    #[serde(default = "default_clutch_engage_epsilon")]
    pub clutch_engage_epsilon: f64,
    /// Flywheel moment of inertia [kg*m^2].
    #[serde(default = "default_flywheel_inertia")]
    pub flywheel_inertia: f64,
}

impl Default for DrivetrainParams {
    fn default() -> Self {
        Self {
            gearbox_stage1_ratio: default_gearbox_stage1_ratio(),
            gearbox_stage1_efficiency: default_gearbox_stage1_efficiency(),
            gearbox_stage2_ratio: default_gearbox_stage2_ratio(),
            gearbox_stage2_efficiency: default_gearbox_stage2_efficiency(),
            clutch_engage_epsilon: default_clutch_engage_epsilon(),
            flywheel_inertia: default_flywheel_inertia(),
        }
    }
}

// ─── Electrical ──────────────────────────────────────────────────────

default_fn!(default_sync_speed, f64, 157.08);
default_fn!(default_stator_resistance, f64, 0.05);
default_fn!(default_rotor_resistance, f64, 0.08);
default_fn!(default_stator_reactance, f64, 0.2);
default_fn!(default_rotor_reactance, f64, 0.2);
default_fn!(default_rated_voltage, f64, 690.0);
default_fn!(default_rated_current, f64, 500.0);
default_fn!(default_slip_max, f64, 0.05);
default_fn!(default_rectifier_efficiency, f64, 0.98);
default_fn!(default_inverter_efficiency, f64, 0.97);
default_fn!(default_transformer_efficiency, f64, 0.99);
default_fn!(default_filter_efficiency, f64, 0.995);
default_fn!(default_voltage_tolerance, f64, 0.12);
default_fn!(default_frequency_tolerance_hz, f64, 0.5);
default_fn!(default_sync_time_constant, f64, 5.0);

/// Generator / power-electronics / grid-interface parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalParams {
    /// Synchronous angular speed [rad/s].
    #[serde(default = "default_sync_speed")]
    pub sync_speed: f64,
    /// Stator resistance [ohm].
    #[serde(default = "default_stator_resistance")]
    pub stator_resistance: f64,
    /// Rotor resistance, referred to stator [ohm].
    #[serde(default = "default_rotor_resistance")]
    pub rotor_resistance: f64,
    /// Stator leakage reactance [ohm].
    #[serde(default = "default_stator_reactance")]
    pub stator_reactance: f64,
    /// Rotor leakage reactance, referred to stator [ohm].
    #[serde(default = "default_rotor_reactance")]
    pub rotor_reactance: f64,
    /// Rated terminal voltage [V].
    #[serde(default = "default_rated_voltage")]
    pub rated_voltage: f64,
    /// Rated current [A]; saturation rolls off above 80% of this.
    #[serde(default = "default_rated_current")]
    pub rated_current: f64,
    /// Maximum allowed slip.
    #[serde(default = "default_slip_max")]
    pub slip_max: f64,
    /// Rectifier stage efficiency, in `(0, 1]`.
    #[serde(default = "default_rectifier_efficiency")]
    pub rectifier_efficiency: f64,
    /// Inverter stage efficiency, in `(0, 1]`.
    #[serde(default = "default_inverter_efficiency")]
    pub inverter_efficiency: f64,
    /// Transformer stage efficiency, in `(0, 1]`.
    #[serde(default = "default_transformer_efficiency")]
    pub transformer_efficiency: f64,
    /// Output filter stage efficiency, in `(0, 1]`.
    #[serde(default = "default_filter_efficiency")]
    pub filter_efficiency: f64,
    /// Fractional voltage tolerance for protection and sync (e.g. 0.12 = ±12%).
    #[serde(default = "default_voltage_tolerance")]
    pub voltage_tolerance: f64,
    /// Frequency deviation tolerance [Hz].
    #[serde(default = "default_frequency_tolerance_hz")]
    pub frequency_tolerance_hz: f64,
    /// Grid-sync progress time constant [s].
    #[serde(default = "default_sync_time_constant")]
    pub sync_time_constant: f64,
}

impl Default for ElectricalParams {
    fn default() -> Self {
        Self {
            sync_speed: default_sync_speed(),
            stator_resistance: default_stator_resistance(),
            rotor_resistance: default_rotor_resistance(),
            stator_reactance: default_stator_reactance(),
            rotor_reactance: default_rotor_reactance(),
            rated_voltage: default_rated_voltage(),
            rated_current: default_rated_current(),
            slip_max: default_slip_max(),
            rectifier_efficiency: default_rectifier_efficiency(),
            inverter_efficiency: default_inverter_efficiency(),
            transformer_efficiency: default_transformer_efficiency(),
            filter_efficiency: default_filter_efficiency(),
            voltage_tolerance: default_voltage_tolerance(),
            frequency_tolerance_hz: default_frequency_tolerance_hz(),
            sync_time_constant: default_sync_time_constant(),
        }
    }
}

// ─── Control / startup ───────────────────────────────────────────────

default_fn!(default_timeout_system_checks, f64, 10.0);
default_fn!(default_timeout_pressure_build, f64, 30.0);
default_fn!(default_timeout_first_injection, f64, 20.0);
default_fn!(default_timeout_acceleration, f64, 20.0);
default_fn!(default_timeout_synchronization, f64, 15.0);
default_fn!(default_load_manager_gain, f64, 0.5);
default_fn!(default_target_power, f64, 20_000.0);

/// Control-and-startup-sequencer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlParams {
    /// `SYSTEM_CHECKS` phase timeout [s].
    #[serde(default = "default_timeout_system_checks")]
    pub timeout_system_checks: f64,
    /// `PRESSURE_BUILD` phase timeout [s].
    #[serde(default = "default_timeout_pressure_build")]
    pub timeout_pressure_build: f64,
    /// `FIRST_INJECTION` phase timeout [s].
    #[serde(default = "default_timeout_first_injection")]
    pub timeout_first_injection: f64,
    /// `ACCELERATION` phase timeout [s].
    #[serde(default = "default_timeout_acceleration")]
    pub timeout_acceleration: f64,
    /// `SYNCHRONIZATION` phase timeout [s].
    #[serde(default = "default_timeout_synchronization")]
    pub timeout_synchronization: f64,
    /// Proportional gain of the running-mode load manager.
    #[serde(default = "default_load_manager_gain")]
    pub load_manager_gain: f64,
    /// Target electrical power the load manager tracks [W].
    #[serde(default = "default_target_power")]
    pub target_power: f64,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            timeout_system_checks: default_timeout_system_checks(),
            timeout_pressure_build: default_timeout_pressure_build(),
            timeout_first_injection: default_timeout_first_injection(),
            timeout_acceleration: default_timeout_acceleration(),
            timeout_synchronization: default_timeout_synchronization(),
            load_manager_gain: default_load_manager_gain(),
            target_power: default_target_power(),
        }
    }
}

// ─── Kernel-wide ─────────────────────────────────────────────────────

default_fn!(default_tick_rate_hz, f64, DEFAULT_TICK_RATE_HZ);
default_fn!(default_ring_buffer_max_count, usize, DEFAULT_RING_BUFFER_MAX_COUNT);
default_fn!(default_ring_buffer_max_bytes, usize, DEFAULT_RING_BUFFER_MAX_BYTES);
default_fn!(default_command_queue_depth, usize, DEFAULT_COMMAND_QUEUE_DEPTH);
default_fn!(default_subscriber_buffer_depth, usize, DEFAULT_SUBSCRIBER_BUFFER_DEPTH);

/// Top-level kernel configuration, aggregating every subsystem's
/// parameters plus the publisher/state-manager resource caps. Loaded from
/// TOML at startup; individual fields can later be updated (validated,
/// partial-accept) via `SET_PARAMS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Physics integrator parameters.
    #[serde(default)]
    pub physics: PhysicsParams,
    /// Enhancement hypothesis coefficients.
    #[serde(default)]
    pub hypotheses: HypothesisParams,
    /// Event-handler zone/injection parameters.
    #[serde(default)]
    pub events: EventParams,
    /// Pneumatic subsystem parameters.
    #[serde(default)]
    pub pneumatic: PneumaticParams,
    /// Drivetrain pipeline parameters.
    #[serde(default)]
    pub drivetrain: DrivetrainParams,
    /// Electrical pipeline parameters.
    #[serde(default)]
    pub electrical: ElectricalParams,
    /// Control and startup-sequencer parameters.
    #[serde(default)]
    pub control: ControlParams,
    /// Publisher fixed tick rate [Hz].
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f64,
    /// Ring buffer maximum snapshot count.
    #[serde(default = "default_ring_buffer_max_count")]
    pub ring_buffer_max_count: usize,
    /// Ring buffer maximum total bytes (approximate).
    #[serde(default = "default_ring_buffer_max_bytes")]
    pub ring_buffer_max_bytes: usize,
    /// Bounded command queue depth.
    #[serde(default = "default_command_queue_depth")]
    pub command_queue_depth: usize,
    /// Default bounded per-subscriber broadcast buffer depth.
    #[serde(default = "default_subscriber_buffer_depth")]
    pub subscriber_buffer_depth: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsParams::default(),
            hypotheses: HypothesisParams::default(),
            events: EventParams::default(),
            pneumatic: PneumaticParams::default(),
            drivetrain: DrivetrainParams::default(),
            electrical: ElectricalParams::default(),
            control: ControlParams::default(),
            tick_rate_hz: default_tick_rate_hz(),
            ring_buffer_max_count: default_ring_buffer_max_count(),
            ring_buffer_max_bytes: default_ring_buffer_max_bytes(),
            command_queue_depth: default_command_queue_depth(),
            subscriber_buffer_depth: default_subscriber_buffer_depth(),
        }
    }
}

/// Parse a `KernelConfig` from a TOML string.
pub fn load_from_str(toml_text: &str) -> Result<KernelConfig, ConfigurationError> {
    toml::from_str(toml_text).map_err(|e| ConfigurationError::ParseError(e.to_string()))
}

/// Load a `KernelConfig` from a TOML file on disk.
pub fn load_from_path(path: &std::path::Path) -> Result<KernelConfig, ConfigurationError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigurationError::FileIo(e.to_string()))?;
    load_from_str(&text)
}
