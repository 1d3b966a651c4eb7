//! Compile-time and render-time configuration
//!
//! Both option structs deserialize from JSON with every field optional, so a
//! host application can keep template settings next to its own config:
//!
//! ```rust
//! use ejs::{CompileOptions, RenderOptions};
//!
//! let compile: CompileOptions = serde_json::from_str(r#"{ "strict_tags": true }"#).unwrap();
//! assert!(compile.strict_tags);
//! assert!(compile.trim_code_lines);
//!
//! let render = RenderOptions::new().with_null_text("n/a");
//! assert_eq!(render.null_text, "n/a");
//! ```

use serde::{Deserialize, Serialize};

/// Default maximum depth of nested `view` renders
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum iterations of a single `while` loop (0 = no limit)
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 1_000_000;

/// Options controlling how template source becomes a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Absorb the line break after a plain code tag that ends its line
    pub trim_code_lines: bool,

    /// Reject unterminated tags and tag openers nested inside a tag
    pub strict_tags: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            trim_code_lines: true,
            strict_tags: false,
        }
    }
}

impl CompileOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable trailing line break absorption
    pub fn with_trim_code_lines(mut self, trim: bool) -> Self {
        self.trim_code_lines = trim;
        self
    }

    /// Enable or disable strict tag checking
    pub fn with_strict_tags(mut self, strict: bool) -> Self {
        self.strict_tags = strict;
        self
    }
}

/// Options applied while a compiled template runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Text emitted for null values in output tags and `to_text`
    pub null_text: String,

    /// Maximum depth of nested `view` renders
    pub max_depth: usize,

    /// Maximum iterations of a single `while` loop (0 = no limit)
    pub max_loop_iterations: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            null_text: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
        }
    }
}

impl RenderOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the null placeholder
    pub fn with_null_text(mut self, text: impl Into<String>) -> Self {
        self.null_text = text.into();
        self
    }

    /// Set the maximum nested render depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum `while` iterations
    pub fn with_max_loop_iterations(mut self, iterations: usize) -> Self {
        self.max_loop_iterations = iterations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let compile = CompileOptions::default();
        assert!(compile.trim_code_lines);
        assert!(!compile.strict_tags);

        let render = RenderOptions::default();
        assert_eq!(render.null_text, "");
        assert_eq!(render.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_partial_json() {
        let render: RenderOptions = serde_json::from_str(r#"{ "max_depth": 4 }"#).unwrap();
        assert_eq!(render.max_depth, 4);
        assert_eq!(render.max_loop_iterations, DEFAULT_MAX_LOOP_ITERATIONS);
    }
}
