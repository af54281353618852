//! Control & startup sequencer: outer operating-mode machine, nested startup
//! phases, load management, and H3 pulse timing.

pub mod load_manager;
pub mod machine;
pub mod pulse_timing;
pub mod startup;

use kpp_common::sim::fault::FaultSet;

/// Evaluate whether the accumulated fault set demands an emergency
/// transition this step. Mirrors
/// `evo_control_unit::error::propagation::evaluate_errors`'s split between
/// "what was detected" and "does this force a state change".
pub fn demands_emergency(faults: &FaultSet) -> bool {
    faults.has_critical()
}
