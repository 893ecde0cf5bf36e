//! Error types, one enum per failure domain.
//!
//! Only [`StartupError`] is fatal for the shell. Builtin and spawn errors are
//! printed by the session loop, which then returns to the prompt.

use nix::errno::Errno;
use std::io;
use std::path::PathBuf;

/// The shell cannot start: it has no identity to show in the prompt or it
/// cannot take over interrupt handling.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("cannot determine the invoking user")]
    UnknownUser,

    #[error("cannot determine the host name: {0}")]
    UnknownHost(io::Error),

    #[error("cannot install the SIGINT handler: {0}")]
    Signal(Errno),
}

/// Failures of the `cd` builtin.
#[derive(Debug, thiserror::Error)]
pub enum CdError {
    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("cd: {}: {source}", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures the parent observes while launching or reaping a child.
///
/// Exec failures are not represented here: they happen after the fork, in
/// the child, which reports them itself and exits.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("{0}: invalid argument")]
    InvalidArgument(String),

    #[error("fork failed: {0}")]
    Fork(#[source] Errno),

    #[error("waitpid failed: {0}")]
    Wait(#[source] Errno),
}
