//! Aggregated fault set reported in every committed snapshot.
//!
//! Mirrors `evo_common::control_unit::error`'s per-axis `AxisErrorState`
//! category split and its critical/non-critical classification, adapted to
//! this kernel's subsystems instead of axes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::sim::electrical::ElectricalFault;

bitflags! {
    /// Pneumatic subsystem faults.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PneumaticFault: u8 {
        /// Rate of pressure change exceeded the configured maximum.
        const RATE_EXCEEDED = 0b0000_0001;
        /// Pressure below `critical_low` or above `emergency_high` (critical).
        const PRESSURE_EMERGENCY = 0b0000_0010;
        /// An injection was deferred for insufficient pressure (non-critical).
        const INJECTION_DEFERRED = 0b0000_0100;
        /// The compressor is latched in `CompressorMode::Fault`.
        const COMPRESSOR_FAULT = 0b0000_1000;
    }
}

bitflags! {
    /// Drivetrain subsystem faults.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DrivetrainFault: u8 {
        /// A stage reported negative loss (energy-conservation violation) — a
        /// configuration/implementation bug, always critical.
        const ENERGY_VIOLATION = 0b0000_0001;
    }
}

bitflags! {
    /// Physics-integration faults.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct IntegrationFault: u8 {
        /// Chain velocity exceeded the configured cap.
        const DIVERGENCE = 0b0000_0001;
        /// A non-finite (NaN/inf) value was observed in a subsystem output.
        const NON_FINITE = 0b0000_0010;
    }
}

/// Aggregated fault set for one snapshot. Additive only — the event handler
/// and other subsystems never clear a flag they didn't set (clearing is the
/// control sequencer's job on `reset()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaultSet {
    /// Pneumatic faults.
    pub pneumatic: PneumaticFault,
    /// Drivetrain faults.
    pub drivetrain: DrivetrainFault,
    /// Electrical/power-electronics faults.
    pub electrical: ElectricalFault,
    /// Physics-integration faults.
    pub integration: IntegrationFault,
}

impl FaultSet {
    /// No faults.
    pub const fn clean() -> Self {
        Self {
            pneumatic: PneumaticFault::empty(),
            drivetrain: DrivetrainFault::empty(),
            electrical: ElectricalFault::empty(),
            integration: IntegrationFault::empty(),
        }
    }

    /// True if any category holds a flag classified critical.
    pub fn has_critical(&self) -> bool {
        self.pneumatic.contains(PneumaticFault::PRESSURE_EMERGENCY)
            || self.pneumatic.contains(PneumaticFault::COMPRESSOR_FAULT)
            || !self.drivetrain.is_empty()
            || self.electrical.is_critical()
            || !self.integration.is_empty()
    }

    /// True if any flag at all is set (critical or not) — used to decide
    /// whether the fault block should appear in a snapshot at all.
    pub fn has_any(&self) -> bool {
        !self.pneumatic.is_empty()
            || !self.drivetrain.is_empty()
            || !self.electrical.is_empty()
            || !self.integration.is_empty()
    }

    /// Merge another fault set's flags in, additively.
    pub fn merge(&mut self, other: FaultSet) {
        self.pneumatic |= other.pneumatic;
        self.drivetrain |= other.drivetrain;
        self.electrical |= other.electrical;
        self.integration |= other.integration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_fault_set_has_no_critical_or_any() {
        let f = FaultSet::clean();
        assert!(!f.has_critical());
        assert!(!f.has_any());
    }

    #[test]
    fn deferred_injection_is_non_critical() {
        let mut f = FaultSet::clean();
        f.pneumatic |= PneumaticFault::INJECTION_DEFERRED;
        assert!(f.has_any());
        assert!(!f.has_critical());
    }

    #[test]
    fn pressure_emergency_is_critical() {
        let mut f = FaultSet::clean();
        f.pneumatic |= PneumaticFault::PRESSURE_EMERGENCY;
        assert!(f.has_critical());
    }

    #[test]
    fn merge_is_additive_and_never_clears() {
        let mut a = FaultSet::clean();
        a.pneumatic |= PneumaticFault::INJECTION_DEFERRED;
        let mut b = FaultSet::clean();
        b.integration |= IntegrationFault::DIVERGENCE;
        a.merge(b);
        assert!(a.pneumatic.contains(PneumaticFault::INJECTION_DEFERRED));
        assert!(a.integration.contains(IntegrationFault::DIVERGENCE));
    }
}
