//! Session configuration.

use serde::{Deserialize, Serialize};

/// File-name hint used when the caller does not supply one.
pub const DEFAULT_FILE_NAME: &str = "<eval>";

/// Default nesting limit for arrays translated through the generic path.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options applied to a [`Session`](crate::Session) at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hint for `eval` and `execute_bytecode`. Only shows up in diagnostics.
    pub default_file_name: String,

    /// Maximum array nesting followed by the generic path.
    /// Self-containing arrays hit this instead of recursing forever.
    pub max_depth: usize,

    /// Run non-primitive values through the object converter before
    /// falling back to a passthrough handle.
    pub convert_objects: bool,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.default_file_name = name.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Hand every non-primitive value back as a passthrough handle.
    pub fn without_object_conversion(mut self) -> Self {
        self.convert_objects = false;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_file_name: DEFAULT_FILE_NAME.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            convert_objects: true,
        }
    }
}
