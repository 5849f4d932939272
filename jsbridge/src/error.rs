//! Error taxonomy for the embedding layer.
//!
//! Engine messages are preserved verbatim as context. Only the object
//! conversion fallback and close-time teardown swallow failures; everything
//! else reaches the direct caller.

use std::convert::Infallible;
use std::fmt;

use thiserror::Error;

use crate::value::ValueKind;

/// Errors produced by a [`Session`](crate::Session) or by typed extraction.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to initialize script engine: {0}")]
    EngineInit(String),

    #[error("Script execution failed: {0}")]
    ScriptExecution(String),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("Failed to bind global '{name}': {message}")]
    Binding { name: String, message: String },

    #[error("Session is closed")]
    SessionClosed,

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<Infallible> for BridgeError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// A script value that could not be converted into a host value.
///
/// `path` lists array indices from the outermost array inwards, so a failure
/// on element 3 of the array at element 1 has path `[1, 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationError {
    pub path: Vec<usize>,
    /// Element kind implied by the first element of the failing array.
    pub expected: Option<ValueKind>,
    pub message: String,
}

impl TranslationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            expected: None,
            message: message.into(),
        }
    }

    /// Element at `index` did not carry the array's element kind.
    pub fn kind_mismatch(index: usize, expected: ValueKind, found: ValueKind) -> Self {
        Self {
            path: vec![index],
            expected: Some(expected),
            message: format!("expected {expected} element, found {found}"),
        }
    }

    /// The engine failed while fetching element `index`.
    pub fn element(index: usize, message: impl Into<String>) -> Self {
        Self {
            path: vec![index],
            expected: None,
            message: message.into(),
        }
    }

    /// Innermost offending array index, if the failure happened inside an array.
    pub fn index(&self) -> Option<usize> {
        self.path.last().copied()
    }

    /// Prefix the path with the index of the enclosing array element.
    pub(crate) fn nested_in(mut self, index: usize) -> Self {
        self.path.insert(0, index);
        self
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to translate value")?;
        if !self.path.is_empty() {
            write!(f, " at ")?;
            for index in &self.path {
                write!(f, "[{index}]")?;
            }
        }
        if let Some(kind) = self.expected {
            write!(f, " in {kind} array")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for TranslationError {}
