//! Real-time scheduling setup for the supervisor's tick loop.
//!
//! Directly grounded on `evo_control_unit::cycle`'s RT setup sequence: lock
//! memory pages, prefault the stack, pin to a CPU core, then request
//! `SCHED_FIFO`. Every step is a no-op unless the `rt` feature is enabled,
//! so the default build never touches scheduler/memory syscalls.

use thiserror::Error;

/// An RT setup step failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RtSetupError {
    /// `mlockall`, `sched_setaffinity`, or `sched_setscheduler` returned an error.
    #[error("real-time setup failed: {0}")]
    SyscallFailed(String),
}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), RtSetupError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RtSetupError::SyscallFailed(format!("mlockall: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), RtSetupError> {
    Ok(())
}

/// Touch a megabyte of stack so the RT loop never takes a page fault on it.
fn prefault_stack() {
    let mut buf = [0u8; 1024 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), RtSetupError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset.set(cpu).map_err(|e| RtSetupError::SyscallFailed(format!("CpuSet::set({cpu}): {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset).map_err(|e| RtSetupError::SyscallFailed(format!("sched_setaffinity: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), RtSetupError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), RtSetupError> {
    let param = libc::sched_param { sched_priority: priority };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RtSetupError::SyscallFailed(format!("sched_setscheduler(SCHED_FIFO, {priority}): {err}")));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), RtSetupError> {
    Ok(())
}

/// Run the full RT setup sequence. Call once, before the tick loop starts.
///
/// A no-op on every step when the `rt` feature is disabled, so the
/// supervisor may call this unconditionally.
pub fn setup(cpu_core: usize, priority: i32) -> Result<(), RtSetupError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(priority)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_a_no_op_without_the_rt_feature() {
        assert!(setup(0, 80).is_ok());
    }
}
