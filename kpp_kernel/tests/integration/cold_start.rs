//! Integration test: cold start sequence.
//!
//! Drives a freshly constructed kernel from `Stopped` through
//! `InitiateStartup` and asserts the nested startup phase sequencer makes
//! real progress against the physics/pneumatic/drivetrain pipeline, without
//! timing out or tripping an emergency fault.

use kpp_common::config::KernelConfig;
use kpp_common::sim::command::Command;
use kpp_common::sim::control::{OperatingMode, StartupPhase};

use kpp_kernel::kernel::Kernel;

/// A config tuned so the mechanical/electrical chain advances quickly
/// enough for a bounded tick count: near-unity gearbox (no speed
/// reduction), a light flywheel, and a low synchronous speed so the
/// acceleration gate clears well inside the timeout budget.
fn fast_startup_config() -> KernelConfig {
    let mut config = KernelConfig::default();
    config.drivetrain.gearbox_stage1_ratio = 1.0;
    config.drivetrain.gearbox_stage1_efficiency = 1.0;
    config.drivetrain.gearbox_stage2_ratio = 1.0;
    config.drivetrain.gearbox_stage2_efficiency = 1.0;
    config.drivetrain.flywheel_inertia = 5.0;
    config.electrical.sync_speed = 1.0;
    config.control.target_power = 0.0;
    config.control.timeout_system_checks = 120.0;
    config.control.timeout_pressure_build = 120.0;
    config.control.timeout_first_injection = 120.0;
    config.control.timeout_acceleration = 120.0;
    config.control.timeout_synchronization = 120.0;
    config
}

#[tokio::test]
async fn initiate_startup_leaves_stopped_mode() {
    let kernel = Kernel::new(KernelConfig::default());
    kernel.enqueue(Command::InitiateStartup).await.unwrap();
    kernel.tick().await;
    let status = kernel.get_status().await;
    assert_eq!(status.mode, OperatingMode::Starting);
    assert_eq!(status.startup_phase, StartupPhase::Initialization);
}

#[tokio::test]
async fn cold_start_progresses_through_phases_without_emergency() {
    let kernel = Kernel::new(fast_startup_config());
    kernel.enqueue(Command::InitiateStartup).await.unwrap();

    let mut last_step = 0u64;
    let mut last_sim_time = 0.0f64;
    let mut reached_acceleration = false;

    for _ in 0..2000 {
        let snapshot = kernel.tick().await;
        assert!(snapshot.step_index > last_step || snapshot.step_index == 0, "step index must not go backwards");
        assert!(snapshot.sim_time >= last_sim_time, "sim time must not go backwards");
        last_step = snapshot.step_index;
        last_sim_time = snapshot.sim_time;

        assert!(snapshot.chain_speed.is_finite());
        assert!(snapshot.flywheel_speed.is_finite());

        if matches!(
            snapshot.control.startup_phase,
            StartupPhase::Acceleration | StartupPhase::Synchronization | StartupPhase::Operational
        ) {
            reached_acceleration = true;
        }

        if snapshot.control.mode == OperatingMode::Emergency {
            panic!(
                "startup entered emergency unexpectedly at step {} (phase {:?}, faults {:?})",
                snapshot.step_index, snapshot.control.startup_phase, snapshot.faults
            );
        }
    }

    let status = kernel.get_status().await;
    assert!(
        reached_acceleration,
        "expected the startup sequencer to reach at least the acceleration phase, got {:?}",
        status.startup_phase
    );
    assert_ne!(status.mode, OperatingMode::Stopped);
}

#[tokio::test]
async fn system_checks_require_at_least_one_floater() {
    let mut config = KernelConfig::default();
    config.physics.floater_count = 0;
    let kernel = Kernel::new(config);
    kernel.enqueue(Command::InitiateStartup).await.unwrap();

    // `floater_count.max(1)` in SimState::new guarantees at least one
    // floater even when configured to zero, so system checks still clear;
    // this asserts the startup sequencer never gets stuck in Initialization.
    kernel.tick().await;
    let status = kernel.get_status().await;
    assert_ne!(status.startup_phase, StartupPhase::Initialization);
}
