//! Interrupt forwarding.
//!
//! The shell keeps running when the user presses Ctrl-C. If a foreground child
//! is running, the interrupt is relayed to that child only. At the prompt, the
//! handler just breaks the line so the next prompt starts cleanly.

use crate::error::StartupError;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicI32, Ordering};

/// 0 means "no foreground child". Real child pids are always positive.
static FOREGROUND_PID: AtomicI32 = AtomicI32::new(0);

/// Handle to the single foreground child slot.
///
/// Written by the process supervisor around `waitpid`, read by the SIGINT
/// handler. A plain atomic scalar, so both sides are async-signal-safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForegroundChild;

impl ForegroundChild {
    /// Record `pid` as the child the shell is currently waiting on.
    pub fn set(pid: Pid) {
        FOREGROUND_PID.store(pid.as_raw(), Ordering::SeqCst);
    }

    pub fn clear() {
        FOREGROUND_PID.store(0, Ordering::SeqCst);
    }

    pub fn get() -> Option<Pid> {
        match FOREGROUND_PID.load(Ordering::SeqCst) {
            pid if pid > 0 => Some(Pid::from_raw(pid)),
            _ => None,
        }
    }
}

/// What the relay did with one interrupt, returned so callers outside the
/// handler can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Forwarded(Pid),
    LineBreak,
}

/// Body of the SIGINT handler.
///
/// Must stay async-signal-safe: one atomic load, then either `kill(2)` or
/// `write(2)`.
pub fn relay_interrupt() -> Relay {
    match ForegroundChild::get() {
        Some(pid) => {
            // The child may already be gone; nothing useful to do about it here.
            let _ = signal::kill(pid, Signal::SIGINT);
            Relay::Forwarded(pid)
        }
        None => {
            write_raw(libc::STDOUT_FILENO, b"\n");
            Relay::LineBreak
        }
    }
}

extern "C" fn handle_sigint(_signal: libc::c_int) {
    relay_interrupt();
}

/// Install the SIGINT handler for the shell process.
///
/// `SA_RESTART` keeps the supervisor's `waitpid` and the line editor's reads
/// going after the handler returns.
pub fn install_interrupt_relay() -> Result<(), StartupError> {
    let action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only touches an atomic and calls kill/write.
    unsafe { signal::sigaction(Signal::SIGINT, &action) }.map_err(StartupError::Signal)?;
    tracing::debug!("SIGINT relay installed");
    Ok(())
}

/// Write `bytes` to `fd` with a single `write(2)`, ignoring errors.
///
/// Used where Rust's buffered, locking writers are off limits: inside the
/// signal handler and in a freshly forked child.
pub(crate) fn write_raw(fd: libc::c_int, bytes: &[u8]) {
    // SAFETY: `bytes` is a valid buffer for its whole length.
    unsafe {
        libc::write(fd, bytes.as_ptr().cast(), bytes.len());
    }
}
