//! A module implementing lexical analysis (tokenization) of a command line.
//!
//! The shell performs no quoting, escaping or expansion: a token is exactly a
//! run of non-whitespace characters taken from the original line.

use std::ffi::{CString, NulError};

/// Ordered list of tokens produced from one command line.
///
/// The first element, when present, is the program name. The vector is
/// unbounded; the null sentinel expected by `execvp` is only added when the
/// tokens are handed to the operating system (see [`ArgumentVector::to_c_args`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<String>,
}

impl ArgumentVector {
    /// Build an argument vector from already split tokens.
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Program name, i.e. the first token.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Convert every token into a `CString` suitable for `execvp`.
    ///
    /// Fails if a token contains an interior NUL byte.
    pub fn to_c_args(&self) -> Result<Vec<CString>, NulError> {
        self.tokens
            .iter()
            .map(|token| CString::new(token.as_bytes()))
            .collect()
    }
}

/// Split `line` on runs of whitespace.
///
/// Leading and trailing whitespace is ignored, so an empty or all-whitespace
/// line produces an empty vector.
pub fn split_into_tokens(line: &str) -> ArgumentVector {
    ArgumentVector::new(line.split_whitespace().map(str::to_owned).collect())
}
