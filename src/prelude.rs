//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from ejs.
//! Importing this module with a wildcard import brings the core types into scope:
//!
//! ```
//! use ejs::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Compiling
//! - [`Compiler`] - Template compiler
//! - [`CompiledTemplate`] - Immutable compiled template
//! - [`CompileOptions`] - Compile configuration
//! - [`Delimiters`] - Delimiter pair selection
//!
//! ## Rendering
//! - [`Renderer`] - Renders with the built-in helpers
//! - [`RenderOptions`] - Render configuration
//! - [`HelperSet`] - Named helpers
//! - [`HelperContext`] - What a helper function sees
//! - [`Value`] - Dynamic data
//!
//! ## Error Handling
//! - [`Error`] - Any error from this crate
//! - [`CompileError`] - Template failed to compile
//! - [`RenderError`] - Template failed to render
//!
//! # Example
//!
//! ```
//! use ejs::prelude::*;
//!
//! let template = Compiler::new("<%= greeting %>", '<').unwrap().compile().unwrap();
//! let data = Value::hash(vec![("greeting", Value::string("hi"))]);
//! assert_eq!(Renderer::new(template).render(&data, &HelperSet::new()).unwrap(), "hi");
//! ```

pub use crate::error::{CompileError, Error, RenderError};
pub use crate::helpers::{HelperContext, HelperSet};
pub use crate::options::{CompileOptions, RenderOptions};
pub use crate::template::{CompiledTemplate, Compiler, Delimiters, Renderer};
pub use crate::value::Value;
