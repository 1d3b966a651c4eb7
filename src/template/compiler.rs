//! Template compiler
//!
//! Turns template source into program text for the embedded script
//! language, then parses that text into an immutable [`CompiledTemplate`].
//!
//! # Pipeline
//!
//! 1. **Preprocess** - absorb the line break after a plain code tag that
//!    ends its line, remembering which source lines lost their break
//! 2. **Scan** - stream tokens through the code generator state machine
//! 3. **Buffer** - collect statement fragments line by line
//! 4. **Wrap & parse** - add the fixed prologue/epilogue and parse
//!
//! When step 4 fails, the original (unpreprocessed) source is compiled a
//! second time purely to find a line number that points into the template
//! the author wrote. The error of the first attempt is always the one raised.
//!
//! # Example
//!
//! ```rust
//! use ejs::{Compiler, HelperSet, Value};
//!
//! let template = Compiler::new("<% for n in [1, 2, 3] { %><%= n %><% } %>", '<')
//!     .unwrap()
//!     .compile()
//!     .unwrap();
//! assert_eq!(template.render(&Value::Nil, &HelperSet::new()).unwrap(), "123");
//! ```

use crate::error::{CompileError, ConfigError, Error, RenderError, ScanError};
use crate::helpers::HelperSet;
use crate::options::{CompileOptions, RenderOptions};
use crate::script::{self, Interpreter, Program, SyntaxError};
use crate::template::buffer::Buffer;
use crate::template::delimiter::{Delimiters, Marker};
use crate::template::scanner::{ScanState, Scanner, Token};
use crate::value::Value;
use std::sync::Arc;

/// Render-local variable holding the output accumulator
pub const OUTPUT_VAR: &str = "__out";

/// Intrinsic converting an output tag's value to display text
pub const DISPLAY_FN: &str = "__display";

/// Lines placed before the generated statements
const PROLOGUE: &str = "let __out = \"\";\n";

/// Text placed after the generated statements
const EPILOGUE: &str = ";\nreturn __out;\n";

/// Number of program lines the prologue occupies
pub const PROLOGUE_LINES: u32 = 1;

/// Source after line-break absorption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    /// Rewritten source
    pub text: String,
    /// Original lines (1-based, ascending) whose line break was absorbed
    pub absorbed: Vec<u32>,
}

impl Preprocessed {
    /// Source passed through unchanged
    pub fn unchanged(source: &str) -> Self {
        Self {
            text: source.to_string(),
            absorbed: Vec::new(),
        }
    }

    /// Map a line of the rewritten source to the first original line it
    /// was merged from
    pub fn original_line(&self, line: u32) -> u32 {
        let mut original = line;
        for &absorbed in &self.absorbed {
            if absorbed < original {
                original += 1;
            } else {
                break;
            }
        }
        original
    }
}

/// Absorb trailing whitespace and the line break after single-line plain
/// code tags
pub fn preprocess(source: &str, delimiters: &Delimiters) -> Preprocessed {
    let re = delimiters.trim_regex();
    let mut text = String::with_capacity(source.len());
    let mut absorbed = Vec::new();
    let mut last = 0;
    // Line number at `last`, advanced lazily
    let mut line = 1u32;

    for caps in re.captures_iter(source) {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        text.push_str(&source[last..tag.end()]);
        line += memchr::memchr_iter(b'\n', source[last..tag.end()].as_bytes()).count() as u32;
        if source[tag.end()..whole.end()].contains('\n') {
            absorbed.push(line);
            line += 1;
        }
        last = whole.end();
    }
    text.push_str(&source[last..]);

    log_debug!("preprocess absorbed {} line breaks", absorbed.len());
    Preprocessed { text, absorbed }
}

/// Escape literal text for a double-quoted script string
///
/// Backslashes first so later substitutions are not escaped twice.
pub fn escape_literal(content: &str) -> String {
    content
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

/// Token handler turning the scanner's stream into statement fragments
struct CodeGenerator {
    delimiters: Delimiters,
    strict: bool,
    content: String,
    buffer: Buffer,
}

impl CodeGenerator {
    fn new(delimiters: Delimiters, strict: bool) -> Self {
        Self {
            delimiters,
            strict,
            content: String::new(),
            buffer: Buffer::new(),
        }
    }

    fn push_literal(&mut self) {
        let statement = format!("{} += \"{}\"", OUTPUT_VAR, escape_literal(&self.content));
        self.buffer.push(statement);
    }

    fn handle(&mut self, token: Token<'_>, state: &mut ScanState) -> Result<(), String> {
        let result = match state.open_tag {
            None => self.outside_tag(token, state),
            Some(opener) => self.inside_tag(opener, token, state),
        };
        result.map_err(|e| e.to_string())
    }

    fn outside_tag(&mut self, token: Token<'_>, state: &mut ScanState) -> Result<(), &'static str> {
        match token {
            Token::Marker(Marker::Newline) => {
                self.content.push('\n');
                self.push_literal();
                self.buffer.cr();
                self.content.clear();
            }
            Token::Marker(marker) if marker.is_opening() => {
                if !self.content.is_empty() {
                    self.push_literal();
                }
                self.content.clear();
                state.open_tag = Some(marker);
                state.tag_line = state.line;
            }
            Token::Marker(Marker::DoubleOpen) => self.content.push_str(self.delimiters.open),
            Token::Marker(Marker::DoubleClose) => self.content.push_str(self.delimiters.close),
            Token::Marker(Marker::CloseNewline) => {
                // Literal closer outside a tag, then an ordinary line break
                self.content.push_str(self.delimiters.close);
                return self.outside_tag(Token::Marker(Marker::Newline), state);
            }
            other => self.content.push_str(other.as_str(&self.delimiters)),
        }
        Ok(())
    }

    fn inside_tag(
        &mut self,
        opener: Marker,
        token: Token<'_>,
        state: &mut ScanState,
    ) -> Result<(), &'static str> {
        match token {
            Token::Marker(Marker::Close) => self.close_tag(opener, state),
            Token::Marker(Marker::CloseNewline) => {
                self.close_tag(opener, state);
                return self.outside_tag(Token::Marker(Marker::Newline), state);
            }
            Token::Marker(Marker::DoubleClose) => self.content.push_str(self.delimiters.close),
            Token::Marker(marker) if self.strict && marker.is_opening() => {
                return Err("Nested tag opener");
            }
            other => self.content.push_str(other.as_str(&self.delimiters)),
        }
        Ok(())
    }

    fn close_tag(&mut self, opener: Marker, state: &mut ScanState) {
        match opener {
            Marker::OpenEqual => {
                let statement = format!("{} += {}(({}))", OUTPUT_VAR, DISPLAY_FN, self.content);
                self.buffer.push(statement);
            }
            Marker::OpenComment => {
                // Keep program lines aligned with source lines
                for _ in memchr::memchr_iter(b'\n', self.content.as_bytes()) {
                    self.buffer.cr();
                }
            }
            _ => {
                if let Some(code) = self.content.strip_suffix('\n') {
                    self.buffer.push(code);
                    self.buffer.cr();
                } else {
                    self.buffer.push(self.content.as_str());
                }
            }
        }
        state.open_tag = None;
        self.content.clear();
    }

    fn finish(mut self, state: &ScanState) -> Result<String, ScanError> {
        if state.open_tag.is_some() {
            if self.strict {
                return Err(ScanError::new(state.tag_line, "Unterminated tag"));
            }
            // Dangling tag content is dropped
            self.content.clear();
        }
        if !self.content.is_empty() {
            self.push_literal();
        }
        Ok(self.buffer.close())
    }
}

/// Scan `source` and generate the (unwrapped) program text
pub fn generate(
    source: &str,
    delimiters: Delimiters,
    options: &CompileOptions,
) -> Result<String, ScanError> {
    let mut generator = CodeGenerator::new(delimiters, options.strict_tags);
    let state = Scanner::new(source, delimiters).scan(|token, state| generator.handle(token, state))?;
    generator.finish(&state)
}

/// Wrap generated statements with the fixed prologue and epilogue
pub fn wrap(program: &str) -> String {
    let mut wrapped = String::with_capacity(PROLOGUE.len() + program.len() + EPILOGUE.len());
    wrapped.push_str(PROLOGUE);
    wrapped.push_str(program);
    wrapped.push_str(EPILOGUE);
    wrapped
}

/// Template compiler bound to one source and one delimiter pair
#[derive(Debug, Clone)]
pub struct Compiler {
    source: String,
    delimiters: Delimiters,
    options: CompileOptions,
}

impl Compiler {
    /// Create a compiler, selecting the delimiter pair by its open character
    pub fn new(source: impl Into<String>, open: char) -> Result<Self, ConfigError> {
        Ok(Self::with_delimiters(source, Delimiters::from_open(open)?))
    }

    /// Create a compiler for an already selected delimiter pair
    pub fn with_delimiters(source: impl Into<String>, delimiters: Delimiters) -> Self {
        Self {
            source: source.into(),
            delimiters,
            options: CompileOptions::default(),
        }
    }

    /// Set compile options
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// The template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The delimiter pair
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// The compile options
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Source as it will be scanned
    pub fn preprocess(&self) -> Preprocessed {
        if self.options.trim_code_lines {
            preprocess(&self.source, &self.delimiters)
        } else {
            Preprocessed::unchanged(&self.source)
        }
    }

    /// Generated program text, before wrapping
    pub fn program_text(&self) -> Result<String, ScanError> {
        generate(&self.preprocess().text, self.delimiters, &self.options)
    }

    /// Compile the template
    pub fn compile(&self) -> Result<CompiledTemplate, Error> {
        let preprocessed = self.preprocess();
        let program_text = generate(&preprocessed.text, self.delimiters, &self.options)?;
        let wrapped = wrap(&program_text);
        log_debug!("generated {} bytes of program text", wrapped.len());

        match script::parse(&wrapped) {
            Ok(program) => Ok(CompiledTemplate {
                inner: Arc::new(Inner {
                    source: self.source.clone(),
                    delimiters: self.delimiters,
                    program_text: wrapped,
                    program,
                }),
            }),
            Err(err) => Err(self.remap(err, &preprocessed).into()),
        }
    }

    /// Find the best template line for a failure in the wrapped program
    fn remap(&self, err: SyntaxError, preprocessed: &Preprocessed) -> CompileError {
        let primary = err.line.saturating_sub(PROLOGUE_LINES);

        let line = if preprocessed.absorbed.is_empty() {
            primary
        } else {
            let fallback = generate(&self.source, self.delimiters, &self.options)
                .ok()
                .map(|text| script::parse(&wrap(&text)));
            match fallback {
                Some(Err(second)) => {
                    log_debug!("fallback compile failed at program line {}", second.line);
                    second.line.saturating_sub(PROLOGUE_LINES)
                }
                _ => {
                    log_debug!("fallback compile succeeded; mapping preprocessed line");
                    // Failures past the end of the text belong to its last line
                    let primary = primary.clamp(1, last_content_line(&preprocessed.text));
                    preprocessed.original_line(primary)
                }
            }
        };

        CompileError::new(line.clamp(1, last_content_line(&self.source)), err.message)
    }
}

/// Last 1-based line holding something other than whitespace (1 if none)
fn last_content_line(text: &str) -> u32 {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .last()
        .map_or(1, |(index, _)| index as u32 + 1)
}

#[derive(Debug)]
struct Inner {
    source: String,
    delimiters: Delimiters,
    program_text: String,
    program: Program,
}

/// Immutable, cheaply cloneable result of a successful compile
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    inner: Arc<Inner>,
}

impl CompiledTemplate {
    /// Original template source
    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// Delimiter pair the template was compiled with
    pub fn delimiters(&self) -> Delimiters {
        self.inner.delimiters
    }

    /// Wrapped program text the template was built from
    pub fn program_text(&self) -> &str {
        &self.inner.program_text
    }

    /// Parsed program
    pub fn program(&self) -> &Program {
        &self.inner.program
    }

    /// Render with exactly the given helper set and default options
    pub fn render(&self, data: &Value, helpers: &HelperSet) -> Result<String, RenderError> {
        self.render_with(data, helpers, &RenderOptions::default())
    }

    /// Render with exactly the given helper set and options
    pub fn render_with(
        &self,
        data: &Value,
        helpers: &HelperSet,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        self.render_nested(data, helpers, options, 0)
    }

    /// Render as a nested template at `depth`
    pub(crate) fn render_nested(
        &self,
        data: &Value,
        helpers: &HelperSet,
        options: &RenderOptions,
        depth: usize,
    ) -> Result<String, RenderError> {
        let result = Interpreter::new(data, helpers, options, depth)?.run(&self.inner.program)?;
        Ok(match result {
            Value::String(s) => s,
            other => other.display_with(&options.null_text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::delimiter::ANGLE;

    fn program(source: &str) -> String {
        Compiler::new(source, '<').unwrap().program_text().unwrap()
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape_literal(r#"a\b"#), r#"a\\b"#);
        assert_eq!(escape_literal("a\nb"), r"a\nb");
        assert_eq!(escape_literal(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_literal("\\n"), "\\\\n");
    }

    #[test]
    fn test_literal_lines() {
        assert_eq!(
            program("a\nb"),
            "__out += \"a\\n\"\n__out += \"b\""
        );
    }

    #[test]
    fn test_output_tag() {
        assert_eq!(program("<%= x %>"), "__out += __display(( x ))");
    }

    #[test]
    fn test_code_tag_with_text() {
        assert_eq!(
            program("a<% x = 1 %>b"),
            "__out += \"a\";  x = 1 ; __out += \"b\""
        );
    }

    #[test]
    fn test_code_tag_ending_in_newline_closes_line() {
        assert_eq!(program("<% if x {\n%>y"), " if x {\n__out += \"y\"");
    }

    #[test]
    fn test_comment_keeps_line_structure() {
        assert_eq!(program("a<%# one\ntwo %>b"), "__out += \"a\"\n__out += \"b\"");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(program("<%% x %%>"), "__out += \"<% x %>\"");
        assert_eq!(program("<%= \"%%>\" %>"), "__out += __display(( \"%>\" ))");
    }

    #[test]
    fn test_preprocess_absorbs_plain_tag_breaks() {
        let pre = preprocess("<% a %>\n<%= b %>\n<% c %>  \nend", &ANGLE);
        assert_eq!(pre.text, "<% a %><%= b %>\n<% c %>end");
        assert_eq!(pre.absorbed, vec![1, 3]);
    }

    #[test]
    fn test_preprocess_no_leading_absorption() {
        let pre = preprocess("\n<% a %>\n", &ANGLE);
        assert_eq!(pre.text, "\n<% a %>");
        assert_eq!(pre.absorbed, vec![2]);
    }

    #[test]
    fn test_original_line_mapping() {
        let pre = Preprocessed {
            text: String::new(),
            absorbed: vec![1, 2, 5],
        };
        assert_eq!(pre.original_line(1), 1);
        assert_eq!(pre.original_line(2), 4);
        assert_eq!(pre.original_line(3), 5);
        assert_eq!(pre.original_line(4), 7);
    }

    #[test]
    fn test_unterminated_tag_is_dropped() {
        assert_eq!(program("a<% b"), "__out += \"a\"");
    }

    #[test]
    fn test_strict_unterminated_tag() {
        let err = Compiler::new("ok\n<% never closed", '<')
            .unwrap()
            .with_options(CompileOptions::new().with_strict_tags(true))
            .compile()
            .unwrap_err();
        assert_eq!(err, Error::Scan(ScanError::new(2, "Unterminated tag")));
    }

    #[test]
    fn test_strict_nested_opener() {
        let err = Compiler::new("x\ny\n<% a <%= b %>", '<')
            .unwrap()
            .with_options(CompileOptions::new().with_strict_tags(true))
            .compile()
            .unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_last_content_line() {
        assert_eq!(last_content_line(""), 1);
        assert_eq!(last_content_line("a\nb\n"), 2);
        assert_eq!(last_content_line("a\n  \n\n"), 1);
    }

    #[test]
    fn test_compiled_template_keeps_source() {
        let template = Compiler::new("hi", '<').unwrap().compile().unwrap();
        assert_eq!(template.source(), "hi");
        assert!(template.program_text().starts_with(PROLOGUE));
        assert_eq!(template.delimiters(), ANGLE);
    }
}
