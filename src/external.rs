use crate::command::ExitCode;
use crate::error::SpawnError;
use crate::lexer::ArgumentVector;
use crate::signal::{ForegroundChild, write_raw};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{self, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::{CStr, CString};

/// Command that is not a builtin: runs as a foreground child process.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    argv: ArgumentVector,
}

/// Messages the child may need after a failed `execvp`, formatted before the
/// fork so the child does not allocate.
struct ExecDiagnostics {
    not_found: Vec<u8>,
    failed: Vec<u8>,
}

impl ExecDiagnostics {
    fn new(program: &str) -> Self {
        Self {
            not_found: format!("{program}: No such file or directory\n").into_bytes(),
            failed: format!("{program}: execvp failed: ").into_bytes(),
        }
    }
}

impl ExternalCommand {
    pub fn new(argv: ArgumentVector) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &ArgumentVector {
        &self.argv
    }

    /// Fork, replace the child's image with `argv[0]` and wait for it.
    ///
    /// Returns the child's exit code, or `128 + signo` when it was killed by a
    /// signal. An executable that cannot be found is not an error here: the
    /// child reports it on stderr and exits with status 1.
    pub fn execute(self) -> Result<ExitCode, SpawnError> {
        let Some(program) = self.argv.program() else {
            return Ok(0);
        };
        let c_args = self
            .argv
            .to_c_args()
            .map_err(|_| SpawnError::InvalidArgument(program.to_owned()))?;
        let diagnostics = ExecDiagnostics::new(program);

        let mask = InterruptMask::block();
        // SAFETY: the child branch only restores the signal mask, calls
        // execvp, write and _exit.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                mask.restore();
                exec_child(&c_args[0], &c_args, &diagnostics)
            }
            Ok(ForkResult::Parent { child }) => {
                ForegroundChild::set(child);
                mask.restore();
                tracing::debug!(pid = child.as_raw(), program, "spawned foreground child");
                let status = reap(child);
                ForegroundChild::clear();
                status
            }
            Err(errno) => {
                mask.restore();
                Err(SpawnError::Fork(errno))
            }
        }
    }
}

/// Child half of the protocol. Never returns into the shell loop.
fn exec_child(program: &CStr, args: &[CString], diagnostics: &ExecDiagnostics) -> ! {
    let errno = match unistd::execvp(program, args) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    if errno == Errno::ENOENT {
        write_raw(libc::STDERR_FILENO, &diagnostics.not_found);
    } else {
        write_raw(libc::STDERR_FILENO, &diagnostics.failed);
        write_raw(libc::STDERR_FILENO, errno.desc().as_bytes());
        write_raw(libc::STDERR_FILENO, b"\n");
    }
    // SAFETY: skip atexit handlers and stdio buffers inherited from the shell.
    unsafe { libc::_exit(1) }
}

/// Block until `child` exits or is killed.
fn reap(child: Pid) -> Result<ExitCode, SpawnError> {
    loop {
        match wait::waitpid(child, None) {
            Ok(status) => {
                if let Some(code) = exit_code(status) {
                    tracing::debug!(pid = child.as_raw(), code, "foreground child reaped");
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(SpawnError::Wait(errno)),
        }
    }
}

/// Shell-style exit code for a terminal wait status.
///
/// Stops and continues are not terminal and yield `None`.
fn exit_code(status: WaitStatus) -> Option<ExitCode> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}

/// SIGINT stays blocked from just before the fork until the parent has
/// published the child's pid, so the relay never misses the new child.
struct InterruptMask {
    previous: Option<SigSet>,
}

impl InterruptMask {
    fn block() -> Self {
        let mut set = SigSet::empty();
        set.add(Signal::SIGINT);
        let mut previous = SigSet::empty();
        match signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&set), Some(&mut previous)) {
            Ok(()) => Self {
                previous: Some(previous),
            },
            Err(errno) => {
                tracing::warn!(%errno, "could not block SIGINT around fork");
                Self { previous: None }
            }
        }
    }

    fn restore(self) {
        if let Some(previous) = self.previous {
            let _ = signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&previous), None);
        }
    }
}
