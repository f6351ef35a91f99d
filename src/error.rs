//! Build errors. Every failure during a build is fatal at the build level;
//! the binary logs the message and exits non-zero.

use std::{error::Error, fmt::Display};

/// Classification of a [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unbalanced quotes or parentheses.
    Lex,
    /// Malformed statement or header.
    Parse,
    /// Incompatible operand types.
    Type,
    /// Unknown identifier or function.
    Name,
    /// Function called with an argument count outside its declared bounds.
    Arity,
    /// A sub-evaluation produced `Unknown` where a value was required.
    Value,
    /// File system failure.
    Io,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Lex => "lex",
            ErrorKind::Parse => "parse",
            ErrorKind::Type => "type",
            ErrorKind::Name => "name",
            ErrorKind::Arity => "arity",
            ErrorKind::Value => "value",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    pub kind: ErrorKind,
    pub message: String,
    /// The surrounding source fragment, when one is available.
    pub snippet: Option<String>,
}

impl BuildError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lex, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }
}

impl Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)?;
        if let Some(snippet) = &self.snippet {
            write!(f, "\n  in: {snippet}")?;
        }
        Ok(())
    }
}

impl Error for BuildError {}

pub type BuildResult<T> = Result<T, BuildError>;
