//! Real-time simulation kernel for the buoyancy-driven kinetic power plant.
//!
//! `kernel::Kernel` is the crate's entry point: it owns every subsystem and
//! exposes the external control/query/subscription surface. Everything else
//! in this crate is a pure or near-pure per-subsystem step function the
//! kernel composes each tick, in the fixed order: command dispatch, event
//! handling, physics, drivetrain, electrical, control/startup, state commit,
//! publish.

pub mod command_dispatcher;
pub mod control;
pub mod drivetrain;
pub mod electrical;
pub mod event_handler;
pub mod kernel;
pub mod physics;
pub mod pneumatic;
pub mod publisher;
pub mod rt;
pub mod state_manager;

pub use kernel::{Kernel, KernelStatus};
