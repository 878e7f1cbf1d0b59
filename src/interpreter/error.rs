use std::io;

use thiserror::Error;

use crate::parse::{ParseError, SyntaxError};

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("undefined variable: '{name}'")]
    UndefinedVariable { name: String },

    #[error("undefined function: '{name}'")]
    UndefinedFunction { name: String },

    #[error("arity mismatch calling '{name}': expected {expected} args, got {actual} args")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("cannot divide by zero")]
    DivideByZero,

    #[error("call depth exceeded the limit of {limit}")]
    CallDepthExceeded { limit: usize },

    /// The host thread ran out of stack before the call depth limit was hit.
    #[error("ran out of stack space")]
    StackExhausted,

    #[error("cannot write output")]
    Output(#[from] io::Error),

    #[error("line {line}: {error}")]
    AtLine {
        line: usize,
        error: Box<RuntimeError>,
    },
}

impl From<ParseError> for RuntimeError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::Syntax(error) => RuntimeError::Syntax(error),
            ParseError::StackExhausted => RuntimeError::StackExhausted,
        }
    }
}

impl RuntimeError {
    /// Tags the error with the line it happened on, unless a more deeply
    /// nested line already claimed it.
    pub fn at_line(self, line: usize) -> RuntimeError {
        match self {
            located @ RuntimeError::AtLine { .. } => located,
            error => RuntimeError::AtLine {
                line,
                error: Box::new(error),
            },
        }
    }

    /// The error with any line tag removed.
    pub fn kind(&self) -> &RuntimeError {
        match self {
            RuntimeError::AtLine { error, .. } => error.kind(),
            error => error,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            RuntimeError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T = i64, E = RuntimeError> = std::result::Result<T, E>;
