use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Process-wide shell state owned by the session loop.
///
/// The environment contains:
/// - `vars`: snapshot of the environment variables taken at startup. Builtins
///   resolve `HOME` from here; children inherit the real process environment.
/// - `current_dir`: the last working directory the shell knew about, used for
///   the prompt when the OS can no longer report it.
/// - `should_exit`: set by `bye`, checked by the loop after every dispatch.
///
/// The identity of the foreground child lives in [`crate::signal::ForegroundChild`]
/// instead, because the interrupt handler has to reach it without arguments.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of a variable from the startup snapshot.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Ask the OS for the working directory, refreshing the cached value.
    pub fn refresh_current_dir(&mut self) -> std::io::Result<&PathBuf> {
        self.current_dir = stdenv::current_dir()?;
        Ok(&self.current_dir)
    }
}
