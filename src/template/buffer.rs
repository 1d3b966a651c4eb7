//! Accumulator for generated statement fragments
//!
//! Fragments are pushed onto the current line; `cr` closes the line by
//! joining its fragments with [`STATEMENT_SEPARATOR`] and appending a newline
//! to the program text. Closed lines are already flattened and never change.
//! `close` flushes whatever is still pending without a line terminator.

/// Separator placed between fragments on the same program line
pub const STATEMENT_SEPARATOR: &str = "; ";

/// Two-phase program text builder
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    line: Vec<String>,
    script: String,
}

impl Buffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to the current line
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.line.push(fragment.into());
    }

    /// Close the current line
    pub fn cr(&mut self) {
        self.flush_line();
        self.script.push('\n');
    }

    /// Number of fragments on the current, still open line
    pub fn pending(&self) -> usize {
        self.line.len()
    }

    /// Program text of the lines closed so far
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Finish the buffer, returning the full program text
    pub fn close(mut self) -> String {
        self.flush_line();
        self.script
    }

    fn flush_line(&mut self) {
        if !self.line.is_empty() {
            self.script.push_str(&self.line.join(STATEMENT_SEPARATOR));
            self.line.clear();
        }
    }
}
