//! Integration test: emergency stop while running.
//!
//! Drives a kernel straight into `Running` via `SET_CONTROL_MODE` (bypassing
//! the full startup sequence, which is covered by `cold_start.rs`), then
//! asserts `EMERGENCY_STOP` latches the mode, freezes the simulation clock,
//! and survives an in-flight `Start` request until `Reset`.

use kpp_common::config::KernelConfig;
use kpp_common::sim::command::Command;
use kpp_common::sim::control::OperatingMode;
use kpp_common::sim::electrical::GridSyncState;
use kpp_common::sim::pneumatic::CompressorMode;

use kpp_kernel::kernel::Kernel;

async fn drive_to_running(kernel: &std::sync::Arc<Kernel>) {
    kernel.enqueue(Command::Start).await.unwrap();
    kernel.tick().await;
    kernel.enqueue(Command::SetControlMode(OperatingMode::Running)).await.unwrap();
    kernel.tick().await;
    let status = kernel.get_status().await;
    assert_eq!(status.mode, OperatingMode::Running);
}

#[tokio::test]
async fn emergency_stop_freezes_sim_time_and_latches_mode() {
    let kernel = Kernel::new(KernelConfig::default());
    drive_to_running(&kernel).await;

    for _ in 0..5 {
        kernel.tick().await;
    }
    let before = kernel.get_latest_snapshot().unwrap();
    assert!(before.sim_time > 0.0);

    kernel.enqueue(Command::EmergencyStop).await.unwrap();
    let after_trip = kernel.tick().await;
    assert_eq!(after_trip.control.mode, OperatingMode::Emergency);
    assert_eq!(
        after_trip.pneumatic.compressor_mode,
        CompressorMode::Off,
        "compressor must be forced off the instant EMERGENCY_STOP is processed"
    );
    assert_eq!(
        after_trip.electrical.output_power, 0.0,
        "no power may be reported once EMERGENCY_STOP is processed"
    );
    assert_eq!(
        after_trip.electrical.grid_sync,
        GridSyncState::Unsynced,
        "grid must be disconnected the instant EMERGENCY_STOP is processed"
    );

    let frozen_time = after_trip.sim_time;
    for _ in 0..5 {
        let snap = kernel.tick().await;
        assert_eq!(snap.sim_time, frozen_time, "simulation must not advance once in Emergency");
        assert_eq!(snap.control.mode, OperatingMode::Emergency);
    }
}

#[tokio::test]
async fn start_request_during_emergency_is_ignored_until_reset() {
    let kernel = Kernel::new(KernelConfig::default());
    drive_to_running(&kernel).await;

    kernel.enqueue(Command::EmergencyStop).await.unwrap();
    kernel.tick().await;

    kernel.enqueue(Command::Start).await.unwrap();
    kernel.tick().await;
    let status = kernel.get_status().await;
    assert_eq!(status.mode, OperatingMode::Emergency, "Start must not override a latched emergency");

    kernel.enqueue(Command::Reset).await.unwrap();
    kernel.tick().await;
    let status = kernel.get_status().await;
    assert_eq!(status.mode, OperatingMode::Stopped);
    assert!(!status.active_faults.has_any(), "Reset must clear latched faults");
}

#[tokio::test]
async fn reset_clears_faults_and_restarts_startup_phase() {
    let kernel = Kernel::new(KernelConfig::default());
    drive_to_running(&kernel).await;
    kernel.enqueue(Command::EmergencyStop).await.unwrap();
    kernel.tick().await;

    kernel.enqueue(Command::Reset).await.unwrap();
    kernel.tick().await;

    kernel.enqueue(Command::InitiateStartup).await.unwrap();
    let snap = kernel.tick().await;
    assert_eq!(snap.control.mode, OperatingMode::Starting);
}
