//! A small interactive Unix shell.
//!
//! The shell reads a line, runs the builtins `bye`, `pwd` and `cd` inside its
//! own process, and launches anything else as a single foreground child that
//! it waits for before prompting again. Ctrl-C is relayed to that child and
//! never terminates the shell itself.
//!
//! The main entry point is [`Interpreter`], driven by any [`LineSource`]:
//! [`EditorSource`] for interactive use, [`ScriptedSource`] for tests.
//! The public modules [`builtin`], [`command`] and [`lexer`] expose the
//! classification of a command line; [`signal`] owns the foreground child
//! slot and the interrupt relay.

pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
mod external;
mod interpreter;
mod io_adapters;
pub mod lexer;
mod prompt;
pub mod signal;

pub use external::ExternalCommand;
pub use interpreter::{Config, FAREWELL, Interpreter};
pub use io_adapters::{EditorSource, Input, LineSource, ScriptedSource};
pub use prompt::Identity;
