//! Supervisor binary for the KPP simulation kernel.
//!
//! Thin wiring only: parse CLI args, load config, construct the kernel,
//! run its fixed-rate tick loop until a shutdown signal arrives, and map
//! the final kernel state onto a process exit code. Mirrors `evo`'s
//! `main.rs` shape: a `tokio::signal::ctrl_c()` race against the tick-loop
//! future, and a graceful shutdown path run after the race resolves.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tokio::time::interval;
use tracing::{error, info, warn};

use kpp_common::config::{self, KernelConfig};
use kpp_common::sim::command::Command;
use kpp_common::sim::control::OperatingMode;
use kpp_kernel::kernel::Kernel;

/// Exit code returned by the supervisor, matching the kernel's defined
/// process-exit contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum SupervisorExit {
    CleanShutdown = 0,
    ConfigurationError = 1,
    UnrecoverableFault = 2,
    EmergencyStopExit = 3,
}

impl From<SupervisorExit> for ExitCode {
    fn from(value: SupervisorExit) -> Self {
        ExitCode::from(value as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "kpp_supervisor", about = "Runs the KPP simulation kernel's tick loop")]
struct Args {
    /// Path to a TOML configuration file. Falls back to built-in defaults
    /// when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Immediately enqueue Start + InitiateStartup so the kernel begins
    /// its startup sequence without requiring an external control client.
    #[arg(long, default_value_t = true)]
    autostart: bool,

    /// Spawn an in-process subscriber that logs a throttled one-line
    /// summary per snapshot, standing in for an out-of-scope network
    /// transport so the binary is observable on its own.
    #[arg(long)]
    demo_subscriber: bool,

    /// Run the real-time setup sequence (memory lock, CPU pinning,
    /// SCHED_FIFO) before entering the tick loop. Requires the `rt` build
    /// feature on `kpp_kernel`; otherwise every step is a no-op.
    #[arg(long)]
    rt: bool,

    /// CPU core to pin the tick loop to when `--rt` is set.
    #[arg(long, default_value_t = 0)]
    cpu_core: usize,

    /// SCHED_FIFO priority to request when `--rt` is set.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,
}

fn load_config(args: &Args) -> Result<KernelConfig, String> {
    match &args.config {
        Some(path) => config::load_from_path(path).map_err(|e| e.to_string()),
        None => Ok(KernelConfig::default()),
    }
}

async fn run_demo_subscriber(kernel: std::sync::Arc<Kernel>) {
    let handle = kernel.subscribe(16);
    let mut last_logged = 0u64;
    loop {
        let snapshot = handle.recv().await;
        if snapshot.step_index.saturating_sub(last_logged) < 10 {
            continue;
        }
        last_logged = snapshot.step_index;
        info!(
            step = snapshot.step_index,
            sim_time = snapshot.sim_time,
            mode = ?snapshot.control.mode,
            chain_speed = snapshot.chain_speed,
            electrical_power = snapshot.electrical_power,
            "snapshot"
        );
    }
}

async fn run_tick_loop(kernel: std::sync::Arc<Kernel>) {
    let mut ticker = interval(kernel.tick_interval());
    loop {
        let now = tokio::time::Instant::now();
        ticker.tick().await;
        let overran = now.elapsed() > kernel.tick_interval() * 3 / 2;
        kernel.record_tick_timing(tokio::time::Instant::now(), overran);
        kernel.tick().await;
    }
}

fn classify_exit(mode: OperatingMode, has_critical_fault: bool) -> SupervisorExit {
    match mode {
        OperatingMode::Emergency => SupervisorExit::EmergencyStopExit,
        OperatingMode::Fault => SupervisorExit::UnrecoverableFault,
        _ if has_critical_fault => SupervisorExit::UnrecoverableFault,
        _ => SupervisorExit::CleanShutdown,
    }
}

async fn shutdown_and_classify(kernel: &std::sync::Arc<Kernel>) -> SupervisorExit {
    let _ = kernel.enqueue(Command::Stop).await;
    kernel.tick().await;
    let status = kernel.get_status().await;
    classify_exit(status.mode, status.active_faults.has_critical())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(message) => {
            error!(error = %message, "failed to load configuration");
            return SupervisorExit::ConfigurationError.into();
        }
    };

    info!(tick_rate_hz = config.tick_rate_hz, "starting kpp_supervisor");

    if args.rt {
        if let Err(err) = kpp_kernel::rt::setup(args.cpu_core, args.rt_priority) {
            error!(%err, "real-time setup failed");
            return SupervisorExit::ConfigurationError.into();
        }
    }

    let kernel = Kernel::new(config);

    if args.autostart {
        if let Err(reason) = kernel.enqueue(Command::Start).await {
            warn!(%reason, "autostart Start command was rejected");
        }
        if let Err(reason) = kernel.enqueue(Command::InitiateStartup).await {
            warn!(%reason, "autostart InitiateStartup command was rejected");
        }
    }

    if args.demo_subscriber {
        tokio::spawn(run_demo_subscriber(kernel.clone()));
    }

    let tick_loop = run_tick_loop(kernel.clone());
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received shutdown signal"),
            Err(err) => error!(%err, "unable to listen for shutdown signal"),
        }
    };

    tokio::select! {
        _ = tick_loop => {
            error!("tick loop exited unexpectedly");
        }
        _ = shutdown => {
            info!("shutting down");
        }
    }

    let exit = shutdown_and_classify(&kernel).await;
    info!(?exit, "kpp_supervisor exiting");
    exit.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_mode_maps_to_emergency_exit() {
        assert_eq!(classify_exit(OperatingMode::Emergency, false), SupervisorExit::EmergencyStopExit);
    }

    #[test]
    fn fault_mode_maps_to_unrecoverable_exit() {
        assert_eq!(classify_exit(OperatingMode::Fault, false), SupervisorExit::UnrecoverableFault);
    }

    #[test]
    fn critical_fault_outside_emergency_still_maps_to_unrecoverable() {
        assert_eq!(classify_exit(OperatingMode::Running, true), SupervisorExit::UnrecoverableFault);
    }

    #[test]
    fn clean_stop_maps_to_clean_shutdown() {
        assert_eq!(classify_exit(OperatingMode::Stopped, false), SupervisorExit::CleanShutdown);
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        let args = Args {
            config: None,
            autostart: true,
            demo_subscriber: false,
            rt: false,
            cpu_core: 0,
            rt_priority: 80,
        };
        let config = load_config(&args).expect("default config must always load");
        assert_eq!(config, KernelConfig::default());
    }

    #[test]
    fn nonexistent_config_path_is_a_configuration_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/kpp_config.toml")),
            autostart: true,
            demo_subscriber: false,
            rt: false,
            cpu_core: 0,
            rt_priority: 80,
        };
        assert!(load_config(&args).is_err());
    }
}
