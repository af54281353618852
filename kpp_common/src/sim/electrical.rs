//! Electrical state: generator, power electronics, and grid interface.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Grid synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridSyncState {
    /// Not synchronized; `output_power` is forced to zero.
    Unsynced,
    /// Synchronization in progress; `sync_progress` in `[0, 1)`.
    Syncing,
    /// Synchronized; `output_power` may be nonzero.
    Synced,
}

bitflags! {
    /// Power-electronics protection flags. Any bit set here forces
    /// `output_power` to zero and is a `CriticalSubsystemFault` candidate
    /// (see `kpp_kernel::electrical`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ElectricalFault: u8 {
        /// Terminal voltage more than 12% above rated.
        const OVERVOLTAGE = 0b0000_0001;
        /// Terminal voltage more than 12% below rated.
        const UNDERVOLTAGE = 0b0000_0010;
        /// Frequency deviation exceeds 0.5 Hz.
        const FREQUENCY_DEVIATION = 0b0000_0100;
        /// Current exceeds the configured maximum.
        const OVERCURRENT = 0b0000_1000;
    }
}

impl ElectricalFault {
    /// Any protection flag set forces the power-electronics stage to zero
    /// output and is treated as a critical fault by the control sequencer.
    #[inline]
    pub fn is_critical(self) -> bool {
        !self.is_empty()
    }
}

/// Full electrical pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectricalState {
    /// Generator slip `(omega_sync - omega) / omega_sync`, clamped to `[0, s_max]`.
    pub slip: f64,
    /// Electromagnetic torque [N*m].
    pub em_torque: f64,
    /// Mechanical shaft power into the generator [W].
    pub mechanical_power: f64,
    /// Electrical power out of the generator, before power-electronics losses [W].
    pub electrical_power: f64,
    /// Generator efficiency in `[0, 1]`.
    pub efficiency: f64,
    /// Power factor, drops below 0.3 load.
    pub power_factor: f64,
    /// Grid synchronization state.
    pub grid_sync: GridSyncState,
    /// Synchronization progress `[0, 1]`.
    pub sync_progress: f64,
    /// Active protection faults.
    pub faults: ElectricalFault,
    /// Power actually delivered to the grid [W]. Invariant: zero whenever
    /// `grid_sync != Synced`.
    pub output_power: f64,
}

impl ElectricalState {
    /// Construct electrical state at standstill, unsynchronized.
    pub fn new() -> Self {
        Self {
            slip: 0.0,
            em_torque: 0.0,
            mechanical_power: 0.0,
            electrical_power: 0.0,
            efficiency: 0.0,
            power_factor: 1.0,
            grid_sync: GridSyncState::Unsynced,
            sync_progress: 0.0,
            faults: ElectricalFault::empty(),
            output_power: 0.0,
        }
    }
}

impl Default for ElectricalState {
    fn default() -> Self {
        Self::new()
    }
}
