//! Line sources feeding the session loop.
//!
//! The interactive shell reads through `rustyline`; tests drive the loop with
//! a scripted list of lines instead.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Result of asking a line source for the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C typed at the prompt.
    Interrupted,
    /// No more input (Ctrl-D or closed stdin).
    Eof,
}

/// Supplies one raw line per prompt cycle.
pub trait LineSource {
    /// Show `prompt` and wait for the next line.
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input>;

    /// Remember a line the user entered. Sources without history ignore it.
    fn add_history(&mut self, _line: &str) {}
}

/// Interactive line editor with in-memory history, optionally persisted to a file.
pub struct EditorSource {
    editor: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl EditorSource {
    pub fn new(history_file: Option<PathBuf>) -> rustyline::Result<Self> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history_file {
            load_history(&mut editor, path);
        }
        Ok(Self {
            editor,
            history_file,
        })
    }

    /// Write the history back to the history file, if one was configured.
    pub fn save_history(&mut self) {
        if let Some(path) = &self.history_file {
            if let Err(err) = self.editor.save_history(path) {
                tracing::warn!(path = %path.display(), %err, "could not save history");
            }
        }
    }
}

fn load_history(editor: &mut DefaultEditor, path: &Path) {
    match editor.load_history(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "history loaded"),
        Err(ReadlineError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(path = %path.display(), %err, "could not load history"),
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(err) => Err(anyhow::Error::new(err).context("reading a command line")),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            tracing::warn!(%err, "could not add history entry");
        }
    }
}

/// Memory-backed line source for driving the loop from tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    inputs: VecDeque<Input>,
    prompts: Vec<String>,
    history: Vec<String>,
}

impl ScriptedSource {
    /// Create a source that yields `lines` in order, then end-of-input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_inputs(lines.into_iter().map(|l| Input::Line(l.into())))
    }

    pub fn from_inputs(inputs: impl IntoIterator<Item = Input>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Prompts shown so far, one per read.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input> {
        self.prompts.push(prompt.to_owned());
        Ok(self.inputs.pop_front().unwrap_or(Input::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_owned());
    }
}
