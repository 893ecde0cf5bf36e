use anyhow::{Context, Result};
use argh::FromArgs;
use ssi::builtin::CdMatching;
use ssi::{Config, EditorSource, Identity, Interpreter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `ssi=debug`.
const LOG_ENV: &str = "SSI_LOG";

#[derive(FromArgs)]
/// A small interactive shell: builtins bye, pwd and cd; everything else runs
/// as a foreground child. Ctrl-C is forwarded to the running child.
struct Options {
    #[argh(switch)]
    /// treat any line starting with "cd" as the cd builtin, so "cdfoo" means "cd foo"
    legacy_cd: bool,

    #[argh(option)]
    /// load command history from this file at startup and save it on exit
    history: Option<PathBuf>,

    #[argh(switch, short = 'v')]
    /// log debug diagnostics to stderr
    verbose: bool,
}

impl Options {
    fn config(&self) -> Config {
        Config {
            cd_matching: if self.legacy_cd {
                CdMatching::Prefix
            } else {
                CdMatching::Word
            },
            history_file: self.history.clone(),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(options: &Options) -> Result<()> {
    let identity = Identity::detect()?;
    ssi::signal::install_interrupt_relay()?;

    let config = options.config();
    let mut source =
        EditorSource::new(config.history_file.clone()).context("initialising the line editor")?;

    let mut shell = Interpreter::new(identity, config);
    tracing::debug!(config = ?shell.config(), "session started");
    let result = shell.repl(&mut source, &mut std::io::stdout(), &mut std::io::stderr());
    source.save_history();
    result
}

fn main() -> ExitCode {
    let options: Options = argh::from_env();
    init_logging(options.verbose);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ssi: {err:#}");
            ExitCode::FAILURE
        }
    }
}
