//! Delimiter pairs and the markers derived from them
//!
//! A template is compiled with exactly one delimiter pair. Every other marker
//! the scanner knows about is a textual extension of that pair:
//!
//! | Marker          | `<` pair  | `[` pair  |
//! |-----------------|-----------|-----------|
//! | open            | `<%`      | `[%`      |
//! | close           | `%>`      | `%]`      |
//! | double open     | `<%%`     | `[%%`     |
//! | double close    | `%%>`     | `%%]`     |
//! | open equal      | `<%=`     | `[%=`     |
//! | open comment    | `<%#`     | `[%#`     |
//! | close + newline | `%>\n`    | `%]\n`    |

use crate::error::ConfigError;
use crate::template::split::SplitPattern;
use regex::Regex;
use std::sync::OnceLock;

/// A marker recognized by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Literal-open escape (`<%%`)
    DoubleOpen,
    /// Literal-close escape (`%%>`)
    DoubleClose,
    /// Output tag opener (`<%=`)
    OpenEqual,
    /// Comment tag opener (`<%#`)
    OpenComment,
    /// Plain code tag opener (`<%`)
    Open,
    /// Tag closer directly followed by a newline (`%>\n`)
    CloseNewline,
    /// Tag closer (`%>`)
    Close,
    /// Line break
    Newline,
}

impl Marker {
    /// Scan priority: a marker is tried before every marker after it
    pub const PRIORITY: [Marker; 8] = [
        Marker::DoubleOpen,
        Marker::DoubleClose,
        Marker::OpenEqual,
        Marker::OpenComment,
        Marker::Open,
        Marker::CloseNewline,
        Marker::Close,
        Marker::Newline,
    ];

    /// Whether this marker opens a tag
    #[inline]
    pub fn is_opening(self) -> bool {
        matches!(self, Marker::Open | Marker::OpenEqual | Marker::OpenComment)
    }
}

/// An immutable open/close delimiter pair with its derived markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delimiters {
    /// Tag opener
    pub open: &'static str,
    /// Tag closer
    pub close: &'static str,
    /// Escape producing a literal opener
    pub double_open: &'static str,
    /// Escape producing a literal closer
    pub double_close: &'static str,
    /// Output tag opener
    pub open_equal: &'static str,
    /// Comment tag opener
    pub open_comment: &'static str,
    /// Closer followed by a newline
    pub close_newline: &'static str,
}

/// The `<% %>` pair
pub const ANGLE: Delimiters = Delimiters {
    open: "<%",
    close: "%>",
    double_open: "<%%",
    double_close: "%%>",
    open_equal: "<%=",
    open_comment: "<%#",
    close_newline: "%>\n",
};

/// The `[% %]` pair
pub const SQUARE: Delimiters = Delimiters {
    open: "[%",
    close: "%]",
    double_open: "[%%",
    double_close: "%%]",
    open_equal: "[%=",
    open_comment: "[%#",
    close_newline: "%]\n",
};

static ANGLE_TRIM: OnceLock<Regex> = OnceLock::new();
static SQUARE_TRIM: OnceLock<Regex> = OnceLock::new();

impl Delimiters {
    /// Select the pair for an open character (`<` or `[`)
    pub fn from_open(open: char) -> Result<Self, ConfigError> {
        match open {
            '<' => Ok(ANGLE),
            '[' => Ok(SQUARE),
            other => Err(ConfigError::UnsupportedDelimiter(other)),
        }
    }

    /// The open character this pair was selected with
    pub fn open_char(&self) -> char {
        if self.open.starts_with('[') {
            '['
        } else {
            '<'
        }
    }

    /// Text of a marker under this pair
    pub fn marker_text(&self, marker: Marker) -> &'static str {
        match marker {
            Marker::DoubleOpen => self.double_open,
            Marker::DoubleClose => self.double_close,
            Marker::OpenEqual => self.open_equal,
            Marker::OpenComment => self.open_comment,
            Marker::Open => self.open,
            Marker::CloseNewline => self.close_newline,
            Marker::Close => self.close,
            Marker::Newline => "\n",
        }
    }

    /// Ordered candidate list used to split lines into tokens
    pub fn marker_set(&self) -> MarkerSet {
        MarkerSet::new(*self)
    }

    /// Regex matching a single-line plain code tag followed by optional
    /// horizontal whitespace and a line break (or end of input)
    ///
    /// Group 1 is the tag itself; everything after it is what gets absorbed.
    /// Built once per pair and shared.
    pub fn trim_regex(&self) -> &'static Regex {
        let cell = if self.open_char() == '[' {
            &SQUARE_TRIM
        } else {
            &ANGLE_TRIM
        };
        cell.get_or_init(|| {
            Regex::new(&self.trim_pattern()).expect("trim pattern built from escaped markers")
        })
    }

    fn trim_pattern(&self) -> String {
        let open = regex::escape(self.open);
        let close = regex::escape(self.close);
        let close_char = regex::escape(&self.close[1..]);
        // The body never starts with `=`, `#` or `%` (output, comment, escape),
        // never spans lines, and never contains a closer that the scanner
        // would see: a `%` run is only allowed before an ordinary character
        // or as part of a double-close escape.
        format!(
            r"({open}[^=#%\r\n](?:[^%\r\n]|%%+{close_char}|%+[^%{close_char}\r\n])*{close})[ \t]*(?:\r?\n|\z)"
        )
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        ANGLE
    }
}

/// Ordered marker candidates with first-byte dispatch
///
/// At each position the candidates are tried in [`Marker::PRIORITY`] order
/// and the first one that matches wins, so longer markers shadow their
/// prefixes without relying on regex alternation order.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    candidates: [(Marker, &'static str); 8],
    open_byte: u8,
}

impl MarkerSet {
    /// Build the candidate list for a delimiter pair
    pub fn new(delimiters: Delimiters) -> Self {
        Self {
            candidates: Marker::PRIORITY.map(|m| (m, delimiters.marker_text(m))),
            open_byte: delimiters.open.as_bytes()[0],
        }
    }

    /// Marker starting exactly at `pos`, if any
    pub fn marker_at(&self, text: &str, pos: usize) -> Option<(Marker, &'static str)> {
        let rest = &text.as_bytes()[pos..];
        self.candidates
            .iter()
            .find(|(_, s)| rest.starts_with(s.as_bytes()))
            .copied()
    }

    /// Marker spelled exactly as `fragment`, if any
    pub fn classify(&self, fragment: &str) -> Option<Marker> {
        self.candidates
            .iter()
            .find(|(_, s)| *s == fragment)
            .map(|(m, _)| *m)
    }
}

impl SplitPattern for MarkerSet {
    fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        let bytes = text.as_bytes();
        let mut pos = from;

        // Every marker starts with the opener's first byte, '%' or '\n'
        while let Some(i) = memchr::memchr3(self.open_byte, b'%', b'\n', &bytes[pos..]) {
            let at = pos + i;
            if let Some((_, s)) = self.marker_at(text, at) {
                return Some((at, at + s.len()));
            }
            pos = at + 1;
        }

        None
    }
}
