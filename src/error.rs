//! Error types for template compilation and rendering
//!
//! Every stage of the pipeline has its own error type so callers can tell a
//! bad configuration from a malformed template or a failing render:
//!
//! - [`ConfigError`] - unsupported delimiter configuration
//! - [`ScanError`] - failure while the scanner was dispatching tokens
//! - [`CompileError`] - the generated program text could not be parsed
//! - [`RenderError`] - failure while executing a compiled template
//!
//! [`Error`] is the crate-level union of all four.
//!
//! # Example Output
//!
//! ```text
//! Compile error at line 3: Unexpected ')' in expression
//! ```

use std::fmt;

/// Unsupported delimiter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No delimiter pair exists for this open character
    UnsupportedDelimiter(char),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedDelimiter(c) => write!(
                f,
                "Unsupported delimiter {:?}: expected '<' or '['",
                c
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure raised while a token was being handled during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Source line the failure was raised on (1-based)
    pub line: u32,
    /// What went wrong
    pub message: String,
}

impl ScanError {
    /// Create a new scan error
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scan error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ScanError {}

/// The generated program text failed to become a callable unit
///
/// `line` is a best-effort line number in the original template source,
/// with the wrapper prologue already accounted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Template source line (1-based)
    pub line: u32,
    /// Parser message
    pub message: String,
}

impl CompileError {
    /// Create a new compile error
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compile error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CompileError {}

/// Failure while executing a compiled template against live data
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A bare identifier was found in no scope
    Undefined(String),
    /// Operand or argument had the wrong type
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name found
        actual: String,
    },
    /// Something that is not a function was called
    NotCallable(String),
    /// A method that does not exist for the receiver type
    UnknownMethod {
        /// Receiver type name
        type_name: &'static str,
        /// Method name
        method: String,
    },
    /// Assignment to something that is not a render-local variable
    InvalidAssignment(String),
    /// Division or remainder by zero
    DivisionByZero,
    /// A helper rejected its arguments
    InvalidArgument {
        /// Helper or method name
        function: String,
        /// Reason
        message: String,
    },
    /// Nested `view` renders went deeper than allowed
    DepthExceeded(usize),
    /// A `while` loop ran more iterations than allowed
    LoopLimitExceeded(usize),
    /// A nested template failed to compile or render
    Template(Box<Error>),
    /// Custom error raised by a user helper
    Custom(String),
}

impl RenderError {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        RenderError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Undefined(name) => write!(f, "'{}' is not defined", name),
            RenderError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            RenderError::NotCallable(name) => write!(f, "'{}' is not a function", name),
            RenderError::UnknownMethod { type_name, method } => {
                write!(f, "Unknown method '{}' on {}", method, type_name)
            }
            RenderError::InvalidAssignment(target) => {
                write!(f, "Cannot assign to '{}'", target)
            }
            RenderError::DivisionByZero => write!(f, "Division by zero"),
            RenderError::InvalidArgument { function, message } => {
                write!(f, "Invalid argument to '{}': {}", function, message)
            }
            RenderError::DepthExceeded(max) => {
                write!(f, "Nested render depth exceeds limit of {}", max)
            }
            RenderError::LoopLimitExceeded(max) => {
                write!(f, "Loop exceeded limit of {} iterations", max)
            }
            RenderError::Template(inner) => write!(f, "Nested template failed: {}", inner),
            RenderError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

/// Any error produced by this crate
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Unsupported configuration
    Config(ConfigError),
    /// Tokenization failure
    Scan(ScanError),
    /// Program text failed to parse
    Compile(CompileError),
    /// Render failure
    Render(RenderError),
}

impl Error {
    /// Template source line the error points at, if it has one
    pub fn line(&self) -> Option<u32> {
        match self {
            Error::Scan(e) => Some(e.line),
            Error::Compile(e) => Some(e.line),
            Error::Config(_) | Error::Render(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "{}", e),
            Error::Scan(e) => write!(f, "{}", e),
            Error::Compile(e) => write!(f, "{}", e),
            Error::Render(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Scan(e) => Some(e),
            Error::Compile(e) => Some(e),
            Error::Render(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ScanError> for Error {
    fn from(e: ScanError) -> Self {
        Error::Scan(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::Render(e)
    }
}

/// Result alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnsupportedDelimiter('{');
        assert!(err.to_string().contains("'{'"));
    }

    #[test]
    fn test_error_line() {
        let scan: Error = ScanError::new(4, "boom").into();
        assert_eq!(scan.line(), Some(4));

        let compile: Error = CompileError::new(7, "bad").into();
        assert_eq!(compile.line(), Some(7));

        let render: Error = RenderError::DivisionByZero.into();
        assert_eq!(render.line(), None);
    }

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::new(3, "Unexpected ')'");
        assert_eq!(err.to_string(), "Compile error at line 3: Unexpected ')'");
    }

    #[test]
    fn test_nested_template_error_display() {
        let inner: Error = CompileError::new(2, "oops").into();
        let err = RenderError::Template(Box::new(inner));
        assert!(err.to_string().contains("line 2"));
    }
}
