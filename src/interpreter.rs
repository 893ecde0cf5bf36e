use crate::builtin::CdMatching;
use crate::command::{Command, ExitCode};
use crate::env::Environment;
use crate::io_adapters::{Input, LineSource};
use crate::prompt::Identity;
use crate::signal::ForegroundChild;
use anyhow::Context;
use nix::unistd::Pid;
use std::io::{self, Write};
use std::path::PathBuf;

/// Farewell printed when the session ends, whatever the reason.
pub const FAREWELL: &str = "Bye Bye";

/// Runtime options of a session.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// How `cd` is recognised on the command line.
    pub cd_matching: CdMatching,
    /// File the line editor loads history from and saves it to.
    pub history_file: Option<PathBuf>,
}

/// The interactive shell: reads lines, runs builtins in-process and
/// everything else as a foreground child.
///
/// Example
/// ```no_run
/// use ssi::{Config, Identity, Interpreter, ScriptedSource};
/// let mut sh = Interpreter::new(Identity::new("me", "here"), Config::default());
/// let mut lines = ScriptedSource::new(["pwd", "bye"]);
/// sh.repl(&mut lines, &mut std::io::stdout(), &mut std::io::stderr()).unwrap();
/// ```
pub struct Interpreter {
    env: Environment,
    identity: Identity,
    config: Config,
}

impl Interpreter {
    /// Create a session over a snapshot of the current process environment.
    pub fn new(identity: Identity, config: Config) -> Self {
        Self::with_environment(Environment::new(), identity, config)
    }

    pub fn with_environment(env: Environment, identity: Identity, config: Config) -> Self {
        Self {
            env,
            identity,
            config,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The child the session is blocked on, if any.
    ///
    /// Mirrors the process-wide [`ForegroundChild`] slot: the SIGINT handler
    /// has no access to the session, so the pid is not stored in `self`.
    pub fn foreground_child(&self) -> Option<Pid> {
        ForegroundChild::get()
    }

    /// Prompt, read, dispatch until `bye` or end-of-input, then say goodbye.
    ///
    /// Command failures are reported on `stderr` and never end the loop; only
    /// I/O errors on the shell's own streams or line source do.
    pub fn repl(
        &mut self,
        source: &mut dyn LineSource,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<()> {
        while !self.env.should_exit {
            let prompt = self.prompt();
            stdout.flush().context("flushing stdout")?;

            match source.read_line(&prompt)? {
                Input::Line(line) => {
                    if !line.trim().is_empty() {
                        source.add_history(&line);
                    }
                    self.dispatch(&line, stdout, stderr)
                        .context("writing command output")?;
                }
                Input::Interrupted => {
                    writeln!(stdout)?;
                }
                Input::Eof => {
                    writeln!(stdout)?;
                    break;
                }
            }
        }

        writeln!(stdout, "{FAREWELL}")?;
        stdout.flush()?;
        Ok(())
    }

    /// Classify and run one command line, returning its exit code.
    pub fn dispatch(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> io::Result<ExitCode> {
        match Command::classify(line, self.config.cd_matching) {
            Command::Empty => Ok(0),
            Command::Builtin(action) => {
                tracing::debug!(builtin = action.name(), "running builtin");
                action.execute(stdout, stderr, &mut self.env)
            }
            Command::External(cmd) => {
                // The child writes straight to the inherited descriptors.
                stdout.flush()?;
                stderr.flush()?;
                match cmd.execute() {
                    Ok(code) => Ok(code),
                    Err(err) => {
                        tracing::debug!(%err, "spawn failed");
                        writeln!(stderr, "{err}")?;
                        Ok(1)
                    }
                }
            }
        }
    }

    fn prompt(&mut self) -> String {
        if let Err(err) = self.env.refresh_current_dir() {
            tracing::warn!(%err, "cannot query the working directory, showing the last known one");
        }
        self.identity.render(&self.env.current_dir)
    }
}
