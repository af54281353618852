//! The immutable per-step telemetry record committed to the state manager's
//! ring buffer and broadcast to subscribers.

use serde::{Deserialize, Serialize};

use crate::sim::chain::ChainState;
use crate::sim::control::{ControlState, HypothesisFlags};
use crate::sim::drivetrain::DrivetrainState;
use crate::sim::electrical::ElectricalState;
use crate::sim::fault::FaultSet;
use crate::sim::floater::FloaterRecord;
use crate::sim::pneumatic::PneumaticState;

/// Per-subscriber and aggregate publisher statistics, fed back into the
/// snapshot stream so operators can observe backpressure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublisherStats {
    /// Measured effective tick rate over the last reporting window [Hz].
    pub effective_tick_rate_hz: f64,
    /// Count of ticks where the cycle body overran its budget.
    pub overrun_count: u64,
    /// Per-subscriber id -> cumulative dropped-frame count (drop-oldest
    /// policy; a subscriber falling behind never stalls the tick loop).
    pub subscriber_drops: Vec<(u64, u64)>,
    /// Ring buffer occupancy, in bytes, as reported by the state manager.
    pub ring_buffer_bytes: usize,
    /// Ring buffer occupancy, in entry count.
    pub ring_buffer_count: usize,
}

/// The immutable per-step telemetry record. Field order is stable and is
/// part of the wire contract external transports rely on — they serialize
/// this struct directly and must not reorder fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonically increasing step index, strictly increasing across the
    /// whole ring buffer.
    pub step_index: u64,
    /// Simulation time [s].
    pub sim_time: f64,
    /// Net chain torque this step [N*m].
    pub net_torque: f64,
    /// Electrical power delivered to the grid this step [W].
    pub electrical_power: f64,
    /// Overall plant efficiency this step, in `[0, 1]` (electrical output
    /// over gross buoyant + injection power input; `0` while not producing).
    pub efficiency: f64,
    /// Chain linear speed [m/s].
    pub chain_speed: f64,
    /// Tank pressure [Pa].
    pub tank_pressure: f64,
    /// Flywheel angular speed [rad/s].
    pub flywheel_speed: f64,
    /// Compact per-floater records, ordered by stable id.
    pub floaters: Vec<FloaterRecord>,
    /// Chain kinematic state.
    pub chain: ChainState,
    /// Pneumatic subsystem state.
    pub pneumatic: PneumaticState,
    /// Drivetrain pipeline state.
    pub drivetrain: DrivetrainState,
    /// Electrical pipeline state.
    pub electrical: ElectricalState,
    /// Control subsystem state.
    pub control: ControlState,
    /// Enabled-hypothesis flags (duplicated from `control` for transports
    /// that want it without deserializing the whole control block).
    pub enabled_hypotheses: HypothesisFlags,
    /// Active faults accumulated this step.
    pub faults: FaultSet,
    /// Publisher/state-manager feedback statistics.
    pub publisher_stats: PublisherStats,
}

impl Snapshot {
    /// Rough in-memory size estimate used by the state manager's byte cap.
    /// Deliberately approximate (fixed overhead + per-floater record size)
    /// rather than an exact `size_of_val` walk — a cheap O(1) estimate over
    /// exact accounting.
    pub fn approx_size_bytes(&self) -> usize {
        const BASE: usize = 512;
        const PER_FLOATER: usize = std::mem::size_of::<FloaterRecord>();
        const PER_DROP_ENTRY: usize = std::mem::size_of::<(u64, u64)>();
        BASE
            + self.floaters.len() * PER_FLOATER
            + self.publisher_stats.subscriber_drops.len() * PER_DROP_ENTRY
    }
}
