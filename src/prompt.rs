//! Prompt formatting and the identity shown in it.

use crate::error::StartupError;
use nix::unistd::{Uid, User};
use std::env;
use std::path::Path;

/// Who and where the shell runs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub host: String,
}

impl Identity {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// Look up the invoking user and the host name.
    ///
    /// Either lookup failing is fatal for the shell.
    pub fn detect() -> Result<Self, StartupError> {
        let user = current_user().ok_or(StartupError::UnknownUser)?;
        let host = hostname::get()
            .map_err(StartupError::UnknownHost)?
            .into_string()
            .map_err(|_| {
                StartupError::UnknownHost(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "host name is not valid UTF-8",
                ))
            })?;
        Ok(Self { user, host })
    }

    /// `<user>@<host>: <cwd> > `
    pub fn render(&self, cwd: &Path) -> String {
        format!("{}@{}: {} > ", self.user, self.host, cwd.display())
    }
}

/// Name from the password database for the real uid, else `$USER`.
fn current_user() -> Option<String> {
    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => return Some(user.name),
        Ok(None) => tracing::debug!("no passwd entry for the current uid"),
        Err(errno) => tracing::debug!(%errno, "passwd lookup failed"),
    }
    env::var("USER").ok().filter(|name| !name.is_empty())
}
