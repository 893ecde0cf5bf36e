use crate::builtin::{self, BuiltinAction, CdMatching};
use crate::external::ExternalCommand;
use crate::lexer;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal report `128 + signo`, like POSIX shells do.
pub type ExitCode = i32;

/// What one command line turns into after classification.
#[derive(Debug, Clone)]
pub enum Command {
    /// Nothing but whitespace: no builtin, no process.
    Empty,
    /// Runs inside the shell process.
    Builtin(BuiltinAction),
    /// Runs as a foreground child.
    External(ExternalCommand),
}

impl Command {
    /// Classify a raw line: builtins are resolved first, on the raw text,
    /// then the line is tokenized for the process supervisor.
    pub fn classify(line: &str, matching: CdMatching) -> Self {
        if let Some(action) = builtin::resolve(line, matching) {
            return Command::Builtin(action);
        }
        let argv = lexer::split_into_tokens(line);
        if argv.is_empty() {
            Command::Empty
        } else {
            Command::External(ExternalCommand::new(argv))
        }
    }
}
