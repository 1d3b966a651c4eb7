//! ejs - Embedded-code text templates
//!
//! Compiles templates with embedded code tags into reusable render routines
//! and executes them against dynamic data. It provides:
//! - `<% code %>`, `<%= output %>` and `<%# comment %>` tags
//! - `<%%` / `%%>` escapes for literal delimiters
//! - An alternate `[% %]` delimiter pair
//! - Absorption of the line break after a code tag that ends its line
//! - Compile errors that point at the template line the author wrote
//! - Data-first identifier resolution with a helper scope behind it
//! - Built-in `to_text` and `view` helpers
//! - A thread-local cache of compiled templates
//!
//! ## Quick Start
//!
//! ```rust
//! use ejs::{Compiler, HelperSet, Renderer, Value};
//!
//! let template = Compiler::new("Hello <%= name %>!", '<')
//!     .unwrap()
//!     .compile()
//!     .unwrap();
//!
//! let data = Value::hash(vec![("name", Value::string("World"))]);
//! let out = Renderer::new(template).render(&data, &HelperSet::new()).unwrap();
//! assert_eq!(out, "Hello World!");
//! ```
//!
//! ## Data from serde
//!
//! ```rust
//! use ejs::Value;
//! use serde_json::json;
//!
//! let data = Value::from(json!({ "items": ["a", "b"] }));
//! let out = ejs::render("<% for item in items { %>[<%= item %>]<% } %>", &data).unwrap();
//! assert_eq!(out, "[a][b]");
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

pub mod cache;
pub mod error;
pub mod helpers;
pub mod options;
pub mod script;
pub mod template;
pub mod value;

/// Re-export commonly used types for convenience
pub use error::{CompileError, ConfigError, Error, RenderError, Result, ScanError};
pub use helpers::{Helper, HelperContext, HelperFn, HelperSet};
pub use options::{CompileOptions, RenderOptions};
pub use template::{
    rsplit, Buffer, CompiledTemplate, Compiler, Delimiters, Renderer, Scanner, Token,
};
pub use value::Value;

/// Compile a template with the `<% %>` delimiter pair and default options
pub fn compile(source: &str) -> Result<CompiledTemplate> {
    Ok(Compiler::new(source, '<')?.compile()?)
}

/// Render a `<% %>` template against `data` with the built-in helpers
///
/// The compiled template is memoized in the thread-local [`cache`].
pub fn render(source: &str, data: &Value) -> Result<String> {
    let template = cache::get_or_compile(source, '<')?;
    Ok(Renderer::new(template).render(data, &HelperSet::new())?)
}
