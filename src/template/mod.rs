//! Template front end
//!
//! Everything between raw template text and a renderable template:
//!
//! - [`split`] - the split primitive keeping matches
//! - [`delimiter`] - delimiter pairs and derived markers
//! - [`scanner`] - token stream with line tracking
//! - [`buffer`] - program text accumulator
//! - [`compiler`] - preprocessing, code generation and parsing
//! - [`renderer`] - rendering with built-in helpers

pub mod buffer;
pub mod compiler;
pub mod delimiter;
pub mod renderer;
pub mod scanner;
pub mod split;

// ============================================================================
// Re-exports
// ============================================================================

pub use buffer::{Buffer, STATEMENT_SEPARATOR};
pub use compiler::{escape_literal, preprocess, CompiledTemplate, Compiler, Preprocessed};
pub use delimiter::{Delimiters, Marker, MarkerSet, ANGLE, SQUARE};
pub use renderer::Renderer;
pub use scanner::{ScanState, Scanner, Token};
pub use split::{rsplit, SplitPattern};
