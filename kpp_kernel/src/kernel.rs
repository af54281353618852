//! The kernel supervisor: binds every subsystem, owns the single writer
//! task, and exposes the transport-agnostic external control/query/
//! subscription interface.
//!
//! Mirrors the single-writer-many-readers discipline from
//! `evo_control_unit::cycle::CycleRunner`: one task executes the fixed
//! pipeline order each tick; everything else reaches the kernel only
//! through the command queue or read-only snapshot access.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::time::Instant;
use tracing::{info, warn};

use kpp_common::config::KernelConfig;
use kpp_common::consts::MAX_COMMANDS_PER_TICK;
use kpp_common::error::{CommandOutcome, CommandRejected};
use kpp_common::sim::chain::ChainState;
use kpp_common::sim::command::{Command, CommandEnvelope, ParamValue};
use kpp_common::sim::control::{ControlState, Hypothesis, OperatingMode, StartupPhase};
use kpp_common::sim::drivetrain::DrivetrainState;
use kpp_common::sim::electrical::ElectricalState;
use kpp_common::sim::fault::FaultSet;
use kpp_common::sim::floater::{Floater, FloaterGeometry, FloaterRecord};
use kpp_common::sim::pneumatic::PneumaticState;
use kpp_common::sim::schema::{ParameterSchema, SCHEMA};
use kpp_common::sim::snapshot::Snapshot;

use crate::command_dispatcher::{validate_param_batch, validate_set_control_mode};
use crate::control::{demands_emergency, load_manager, machine, pulse_timing::PulseTimer, startup};
use crate::drivetrain::DrivetrainPipeline;
use crate::electrical::ElectricalPipeline;
use crate::event_handler::EventHandler;
use crate::physics::PhysicsEngine;
use crate::pneumatic::PneumaticSubsystem;
use crate::publisher::{Publisher, SubscriberHandle};
use crate::state_manager::StateManager;

/// Mutable simulation state the kernel's single writer task owns
/// exclusively between commits.
struct SimState {
    chain: ChainState,
    floaters: Vec<Floater>,
    pneumatic: PneumaticState,
    drivetrain: DrivetrainState,
    electrical: ElectricalState,
    control: ControlState,
    faults: FaultSet,
    sim_time: f64,
    step_index: u64,
    gen_reaction_torque: f64,
    pulse_timer: PulseTimer,
}

impl SimState {
    fn new(config: &KernelConfig) -> Self {
        let geometry = FloaterGeometry {
            volume: config.physics.floater_volume,
            area: config.physics.floater_area,
            drag_coefficient: config.physics.floater_drag_coefficient,
            container_mass: config.physics.floater_container_mass,
        };
        let count = config.physics.floater_count.max(1) as usize;
        let floaters = (0..count)
            .map(|i| {
                let angle = std::f64::consts::TAU * (i as f64) / (count as f64);
                Floater::new(i as u16, angle, geometry)
            })
            .collect();

        Self {
            chain: ChainState::new(config.physics.sprocket_radius),
            floaters,
            pneumatic: PneumaticState::new(config.pneumatic.low_setpoint),
            drivetrain: DrivetrainState::default(),
            electrical: ElectricalState::new(),
            control: ControlState::new(),
            faults: FaultSet::clean(),
            sim_time: 0.0,
            step_index: 0,
            gen_reaction_torque: 0.0,
            pulse_timer: PulseTimer::new(),
        }
    }
}

/// Kernel lifecycle/query/subscription facade. Internally synchronized with
/// an async mutex around the single-writer state — every external operation
/// is either a command enqueue (cheap, lock-free via `mpsc`) or a brief
/// locked mutation, never a long-held lock across a tick.
pub struct Kernel {
    config: AsyncMutex<KernelConfig>,
    state: AsyncMutex<SimState>,
    state_manager: StateManager,
    publisher: Publisher,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: AsyncMutex<mpsc::Receiver<CommandEnvelope>>,
    next_trace_id: AtomicU64,
    started_at: std::time::Instant,
}

impl Kernel {
    /// Construct a kernel from `config`, with all subsystems at their
    /// at-rest initial state.
    pub fn new(config: KernelConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.command_queue_depth);
        let state_manager = StateManager::new(config.ring_buffer_max_count, config.ring_buffer_max_bytes);
        let publisher = Publisher::new(config.tick_rate_hz);
        let state = SimState::new(&config);

        Arc::new(Self {
            config: AsyncMutex::new(config),
            state: AsyncMutex::new(state),
            state_manager,
            publisher,
            command_tx: tx,
            command_rx: AsyncMutex::new(rx),
            next_trace_id: AtomicU64::new(1),
            started_at: std::time::Instant::now(),
        })
    }

    // ── Control operations ─────────────────────────────────────────

    /// Enqueue `command`, returning a trace id the caller can correlate
    /// against a later snapshot or [`CommandOutcome`].
    pub async fn enqueue(&self, command: Command) -> Result<u64, CommandRejected> {
        let trace_id = self.next_trace_id.fetch_add(1, Ordering::Relaxed);
        self.command_tx
            .try_send(CommandEnvelope { trace_id, command })
            .map_err(|_| CommandRejected::QueueFull)?;
        Ok(trace_id)
    }

    /// Run exactly one tick: drain up to [`MAX_COMMANDS_PER_TICK`] commands,
    /// step the simulation if the mode calls for it, commit a snapshot, and
    /// fan it out. Returns the committed snapshot.
    pub async fn tick(self: &Arc<Self>) -> Arc<Snapshot> {
        let mut state = self.state.lock().await;
        let mut outcomes = Vec::new();
        let mut force_step = false;

        {
            let mut rx = self.command_rx.lock().await;
            let mut config = self.config.lock().await;
            for _ in 0..MAX_COMMANDS_PER_TICK {
                match rx.try_recv() {
                    Ok(envelope) => {
                        if envelope.command == Command::Step {
                            force_step = true;
                        }
                        let result = Self::apply_command(&mut state, &mut config, envelope.command);
                        outcomes.push(CommandOutcome {
                            trace_id: envelope.trace_id,
                            result,
                        });
                    }
                    Err(_) => break,
                }
            }
        }
        for outcome in &outcomes {
            if let Err(reason) = &outcome.result {
                warn!(trace_id = outcome.trace_id, %reason, "command rejected");
            }
        }

        let config = self.config.lock().await.clone();
        if force_step || matches!(state.control.mode, OperatingMode::Running | OperatingMode::Starting) {
            self.step(&mut state, &config);
        }

        let snapshot = self.commit_snapshot(&state, &config);
        drop(state);
        self.publisher.publish(&snapshot);
        snapshot
    }

    fn apply_command(state: &mut SimState, config: &mut KernelConfig, command: Command) -> Result<(), CommandRejected> {
        match command {
            Command::Start => Self::apply_mode_event(state, machine::ModeEvent::StartRequested),
            Command::Pause => Self::apply_mode_event(state, machine::ModeEvent::PauseRequested),
            Command::Stop => Self::apply_mode_event(state, machine::ModeEvent::StopRequested),
            Command::Reset => {
                let result = Self::apply_mode_event(state, machine::ModeEvent::ResetRequested);
                if result.is_ok() {
                    state.faults = FaultSet::clean();
                    PneumaticSubsystem::reset(&mut state.pneumatic);
                    state.control.startup_phase = StartupPhase::Initialization;
                }
                result
            }
            Command::Step => Ok(()),
            Command::SetParams(updates) => {
                let (accepted, rejected) = validate_param_batch(&SCHEMA, &updates);
                for update in accepted {
                    apply_param(config, update);
                }
                if rejected.is_empty() {
                    Ok(())
                } else {
                    Err(CommandRejected::ValidationFailed(rejected))
                }
            }
            Command::TriggerPulse => {
                let outcome = EventHandler::trigger_pulse(
                    &mut state.floaters,
                    &state.pneumatic,
                    &config.events,
                    config.physics.gravity,
                    config.physics.water_density,
                );
                if !outcome.transient_faults.is_empty() {
                    state.faults.pneumatic |= kpp_common::sim::fault::PneumaticFault::INJECTION_DEFERRED;
                }
                for fault in outcome.transient_faults {
                    warn!(?fault, "transient fault from manual pulse trigger");
                }
                Ok(())
            }
            Command::SetLoad(factor) => {
                state.control.load_factor = factor.clamp(0.0, 1.0);
                Ok(())
            }
            Command::EmergencyStop => Self::apply_mode_event(state, machine::ModeEvent::EmergencyRequested),
            Command::InitiateStartup => {
                let result = Self::apply_mode_event(state, machine::ModeEvent::StartRequested);
                if result.is_ok() {
                    state.control.startup_phase = StartupPhase::Initialization;
                    state.control.phase_entered_at = state.sim_time;
                }
                result
            }
            Command::SetControlMode(target) => {
                validate_set_control_mode(state.control.mode, target)?;
                state.control.mode = target;
                Ok(())
            }
            Command::ToggleHypothesis(hypothesis, enabled) => {
                match hypothesis {
                    Hypothesis::H1 => state.control.hypotheses.h1_nanobubbles = enabled,
                    Hypothesis::H2 => state.control.hypotheses.h2_thermal = enabled,
                    Hypothesis::H3 => state.control.hypotheses.h3_pulse_coast = enabled,
                }
                Ok(())
            }
        }
    }

    fn apply_mode_event(state: &mut SimState, event: machine::ModeEvent) -> Result<(), CommandRejected> {
        match machine::handle_event(state.control.mode, event) {
            kpp_common::sim::control::TransitionResult::Ok(mode) => {
                let entering_emergency = mode == OperatingMode::Emergency && state.control.mode != OperatingMode::Emergency;
                state.control.mode = mode;
                if entering_emergency {
                    Self::force_safe_state(state);
                }
                Ok(())
            }
            kpp_common::sim::control::TransitionResult::Rejected(reason) => {
                Err(CommandRejected::InvalidTransition { reason })
            }
        }
    }

    /// Drive every actuator to its safe state immediately, independent of
    /// whether `step()` runs this tick: compressor off, grid disconnected,
    /// zero power delivered. Called the instant the mode machine transitions
    /// into `Emergency`, so a plant producing power when `EmergencyStop` is
    /// processed does not keep reporting stale output until a later step.
    fn force_safe_state(state: &mut SimState) {
        state.pneumatic.compressor_mode = kpp_common::sim::pneumatic::CompressorMode::Off;
        state.electrical.output_power = 0.0;
        state.electrical.sync_progress = 0.0;
        state.electrical.grid_sync = kpp_common::sim::electrical::GridSyncState::Unsynced;
    }

    fn step(&self, state: &mut SimState, config: &KernelConfig) {
        let mut faults = FaultSet::clean();

        let event_outcome = EventHandler::process(
            &mut state.floaters,
            &state.pneumatic,
            &config.events,
            config.physics.gravity,
            config.physics.water_density,
        );
        if !event_outcome.transient_faults.is_empty() {
            faults.pneumatic |= kpp_common::sim::fault::PneumaticFault::INJECTION_DEFERRED;
        }

        if state.control.hypotheses.h3_pulse_coast {
            if state
                .pulse_timer
                .due(state.sim_time, state.chain.angular_position % std::f64::consts::TAU, &config.hypotheses)
            {
                let pulse_outcome = EventHandler::trigger_pulse(
                    &mut state.floaters,
                    &state.pneumatic,
                    &config.events,
                    config.physics.gravity,
                    config.physics.water_density,
                );
                if pulse_outcome.injections > 0 {
                    state.pulse_timer.record_pulse(state.sim_time);
                }
            }
        }

        let depth_pressure = config.events.atmospheric_pressure
            + config.physics.water_density * config.physics.gravity * config.events.tank_depth;
        let emergency_active = state.control.mode == OperatingMode::Emergency;
        PneumaticSubsystem::step(
            &mut state.pneumatic,
            &config.pneumatic,
            state.sim_time,
            config.physics.dt,
            event_outcome.injected_volume_m3,
            depth_pressure,
            emergency_active,
        );

        match PhysicsEngine::step(
            &mut state.chain,
            &mut state.floaters,
            &config.physics,
            &config.hypotheses,
            &state.control.hypotheses,
            config.drivetrain.flywheel_inertia,
            state.gen_reaction_torque,
        ) {
            Ok(physics_out) => {
                let drivetrain_out = DrivetrainPipeline::step(
                    &mut state.drivetrain,
                    &config.drivetrain,
                    state.chain.velocity,
                    physics_out.net_chain_force,
                    config.physics.sprocket_radius,
                    state.gen_reaction_torque,
                    config.physics.dt,
                );
                faults.drivetrain |= drivetrain_out.faults;

                if !emergency_active {
                    state.control.load_factor = load_manager::update_load_factor(
                        state.control.load_factor,
                        state.electrical.output_power,
                        &config.control,
                        config.physics.dt,
                    );
                }

                let electrical_out = ElectricalPipeline::step(
                    &mut state.electrical,
                    &config.electrical,
                    drivetrain_out.shaft_angular_velocity,
                    state.control.load_factor,
                    config.physics.dt,
                );
                faults.electrical |= electrical_out.faults;
                state.gen_reaction_torque = state.electrical.em_torque;
            }
            Err(fault) => {
                warn!(?fault, "critical physics fault");
                faults.integration |= kpp_common::sim::fault::IntegrationFault::DIVERGENCE;
            }
        }

        if state.control.mode == OperatingMode::Starting {
            let inputs = startup::StartupInputs {
                pneumatic: &state.pneumatic,
                drivetrain: &state.drivetrain,
                electrical: &state.electrical,
                chain_velocity: state.chain.velocity,
                floater_count: state.floaters.len(),
                sync_speed: config.electrical.sync_speed,
            };
            match startup::evaluate(&mut state.control, &inputs, &config.control, &config.events, state.sim_time) {
                startup::StartupEvaluation::Completed => {
                    let _ = Self::apply_mode_event(state, machine::ModeEvent::StartupCompleted);
                    info!("startup sequence complete, entering running");
                }
                startup::StartupEvaluation::Failed => {
                    let _ = Self::apply_mode_event(state, machine::ModeEvent::StartupFailed);
                    warn!("startup sequence failed");
                }
                startup::StartupEvaluation::InProgress => {}
            }
        }

        state.faults.merge(faults);
        if demands_emergency(&state.faults) {
            let _ = Self::apply_mode_event(state, machine::ModeEvent::EmergencyRequested);
        }

        state.sim_time += config.physics.dt;
        state.step_index += 1;
    }

    fn commit_snapshot(&self, state: &SimState, config: &KernelConfig) -> Arc<Snapshot> {
        let floaters: Vec<FloaterRecord> = state
            .floaters
            .iter()
            .map(|f| FloaterRecord::from_floater(f, config.physics.water_density))
            .collect();

        let (ring_count, ring_bytes) = self.state_manager.occupancy();
        let publisher_stats = self.publisher.stats(ring_count, ring_bytes);

        let gross_input = state.electrical.mechanical_power.max(0.0);
        let efficiency = if gross_input > 0.0 {
            (state.electrical.output_power / gross_input).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let snapshot = Snapshot {
            step_index: state.step_index,
            sim_time: state.sim_time,
            net_torque: state.drivetrain.sprocket.torque,
            electrical_power: state.electrical.output_power,
            efficiency,
            chain_speed: state.chain.velocity,
            tank_pressure: state.pneumatic.tank_pressure,
            flywheel_speed: state.drivetrain.flywheel.angular_velocity,
            floaters,
            chain: state.chain,
            pneumatic: state.pneumatic,
            drivetrain: state.drivetrain,
            electrical: state.electrical.clone(),
            control: state.control,
            enabled_hypotheses: state.control.hypotheses,
            faults: state.faults,
            publisher_stats,
        };
        self.state_manager.commit(snapshot)
    }

    // ── Query operations ───────────────────────────────────────────

    /// Most recent committed snapshot, if any tick has executed yet.
    pub fn get_latest_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state_manager.latest()
    }

    /// A coherent slice of up to `limit` snapshots, ending at the most
    /// recent one, with `step_index >= from_index`.
    pub fn get_snapshot_range(&self, from_index: u64, limit: usize) -> Vec<Arc<Snapshot>> {
        self.state_manager.range(from_index, limit)
    }

    /// Current mode/phase/fault/uptime summary.
    pub async fn get_status(&self) -> KernelStatus {
        let state = self.state.lock().await;
        KernelStatus {
            mode: state.control.mode,
            startup_phase: state.control.startup_phase,
            active_faults: state.faults,
            uptime_s: self.started_at.elapsed().as_secs_f64(),
        }
    }

    /// The full settable-parameter schema, for `get_parameter_schema()`.
    pub fn get_parameter_schema(&self) -> &'static ParameterSchema {
        &SCHEMA
    }

    // ── Subscription ───────────────────────────────────────────────

    /// Register a new snapshot subscriber with a bounded, drop-oldest buffer.
    pub fn subscribe(&self, buffer_size: usize) -> SubscriberHandle {
        self.publisher.subscribe(buffer_size)
    }

    /// Remove a subscriber registered via [`Kernel::subscribe`].
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        self.publisher.unsubscribe(handle.id());
    }

    /// Publisher tick interval, for the supervisor binary's tick loop.
    pub fn tick_interval(&self) -> tokio::time::Duration {
        self.publisher.tick_interval()
    }

    /// Record one tick's observed timing for the publisher statistics block.
    pub fn record_tick_timing(&self, now: Instant, overran: bool) {
        self.publisher.record_tick(now, overran);
    }
}

/// Snapshot of kernel status for `get_status()`.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelStatus {
    /// Current operating mode.
    pub mode: OperatingMode,
    /// Current startup phase (meaningful only while `Starting`).
    pub startup_phase: StartupPhase,
    /// Faults active as of the last committed snapshot.
    pub active_faults: FaultSet,
    /// Seconds since kernel construction.
    pub uptime_s: f64,
}

fn apply_param(config: &mut KernelConfig, update: &kpp_common::sim::command::ParamUpdate) {
    macro_rules! set_float {
        ($target:expr) => {
            if let ParamValue::Float(v) = update.value {
                $target = v;
            }
        };
    }
    macro_rules! set_int {
        ($target:expr, $ty:ty) => {
            if let ParamValue::Int(v) = update.value {
                $target = v as $ty;
            }
        };
    }

    match update.name.as_str() {
        "physics.gravity" => set_float!(config.physics.gravity),
        "physics.water_density" => set_float!(config.physics.water_density),
        "physics.sprocket_radius" => set_float!(config.physics.sprocket_radius),
        "physics.dt" => set_float!(config.physics.dt),
        "physics.velocity_cap" => set_float!(config.physics.velocity_cap),
        "physics.floater_count" => set_int!(config.physics.floater_count, u32),
        "physics.floater_volume" => set_float!(config.physics.floater_volume),
        "physics.floater_area" => set_float!(config.physics.floater_area),
        "physics.floater_drag_coefficient" => set_float!(config.physics.floater_drag_coefficient),
        "physics.floater_container_mass" => set_float!(config.physics.floater_container_mass),
        "hypotheses.h1_nanobubble_void_fraction" => set_float!(config.hypotheses.h1_nanobubble_void_fraction),
        "hypotheses.h1_drag_reduction_factor" => set_float!(config.hypotheses.h1_drag_reduction_factor),
        "hypotheses.h2_thermal_delta_factor" => set_float!(config.hypotheses.h2_thermal_delta_factor),
        "hypotheses.h2_enhancement_coefficient" => set_float!(config.hypotheses.h2_enhancement_coefficient),
        "hypotheses.h3_pulse_coast_duration" => set_float!(config.hypotheses.h3_pulse_coast_duration),
        "hypotheses.h3_optimal_phase_offset" => set_float!(config.hypotheses.h3_optimal_phase_offset),
        "events.bottom_zone_half_angle" => set_float!(config.events.bottom_zone_half_angle),
        "events.top_zone_half_angle" => set_float!(config.events.top_zone_half_angle),
        "events.injection_pressure_threshold" => set_float!(config.events.injection_pressure_threshold),
        "events.atmospheric_pressure" => set_float!(config.events.atmospheric_pressure),
        "events.tank_depth" => set_float!(config.events.tank_depth),
        "pneumatic.tank_volume" => set_float!(config.pneumatic.tank_volume),
        "pneumatic.low_setpoint" => set_float!(config.pneumatic.low_setpoint),
        "pneumatic.high_setpoint" => set_float!(config.pneumatic.high_setpoint),
        "pneumatic.critical_low" => set_float!(config.pneumatic.critical_low),
        "pneumatic.emergency_high" => set_float!(config.pneumatic.emergency_high),
        "pneumatic.min_cycle_time" => set_float!(config.pneumatic.min_cycle_time),
        "pneumatic.fill_rate" => set_float!(config.pneumatic.fill_rate),
        "pneumatic.compressor_power_draw" => set_float!(config.pneumatic.compressor_power_draw),
        "pneumatic.max_pressure_rate" => set_float!(config.pneumatic.max_pressure_rate),
        "drivetrain.gearbox_stage1_ratio" => set_float!(config.drivetrain.gearbox_stage1_ratio),
        "drivetrain.gearbox_stage1_efficiency" => set_float!(config.drivetrain.gearbox_stage1_efficiency),
        "drivetrain.gearbox_stage2_ratio" => set_float!(config.drivetrain.gearbox_stage2_ratio),
        "drivetrain.gearbox_stage2_efficiency" => set_float!(config.drivetrain.gearbox_stage2_efficiency),
        "drivetrain.clutch_engage_epsilon" => set_float!(config.drivetrain.clutch_engage_epsilon),
        "drivetrain.flywheel_inertia" => set_float!(config.drivetrain.flywheel_inertia),
        "electrical.sync_speed" => set_float!(config.electrical.sync_speed),
        "electrical.stator_resistance" => set_float!(config.electrical.stator_resistance),
        "electrical.rotor_resistance" => set_float!(config.electrical.rotor_resistance),
        "electrical.stator_reactance" => set_float!(config.electrical.stator_reactance),
        "electrical.rotor_reactance" => set_float!(config.electrical.rotor_reactance),
        "electrical.rated_voltage" => set_float!(config.electrical.rated_voltage),
        "electrical.rated_current" => set_float!(config.electrical.rated_current),
        "electrical.slip_max" => set_float!(config.electrical.slip_max),
        "electrical.rectifier_efficiency" => set_float!(config.electrical.rectifier_efficiency),
        "electrical.inverter_efficiency" => set_float!(config.electrical.inverter_efficiency),
        "electrical.transformer_efficiency" => set_float!(config.electrical.transformer_efficiency),
        "electrical.filter_efficiency" => set_float!(config.electrical.filter_efficiency),
        "electrical.voltage_tolerance" => set_float!(config.electrical.voltage_tolerance),
        "electrical.frequency_tolerance_hz" => set_float!(config.electrical.frequency_tolerance_hz),
        "electrical.sync_time_constant" => set_float!(config.electrical.sync_time_constant),
        "control.timeout_system_checks" => set_float!(config.control.timeout_system_checks),
        "control.timeout_pressure_build" => set_float!(config.control.timeout_pressure_build),
        "control.timeout_first_injection" => set_float!(config.control.timeout_first_injection),
        "control.timeout_acceleration" => set_float!(config.control.timeout_acceleration),
        "control.timeout_synchronization" => set_float!(config.control.timeout_synchronization),
        "control.load_manager_gain" => set_float!(config.control.load_manager_gain),
        "control.target_power" => set_float!(config.control.target_power),
        _ => {}
    }
}
