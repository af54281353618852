//! Domain types shared between `kpp_kernel` and `kpp_supervisor`.
//!
//! Each submodule owns one subsystem's state representation. The
//! transition/update *logic* for most of these lives in `kpp_kernel`; this
//! crate only defines the data each subsystem carries between steps.

pub mod chain;
pub mod command;
pub mod control;
pub mod drivetrain;
pub mod electrical;
pub mod fault;
pub mod floater;
pub mod pneumatic;
pub mod schema;
pub mod snapshot;
