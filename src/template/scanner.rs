//! Template scanner
//!
//! Splits the source into lines, splits each line into delimiter markers and
//! literal text, and streams the resulting tokens to a handler together with
//! the mutable [`ScanState`].
//!
//! # Example
//!
//! ```rust
//! use ejs::template::{Scanner, Token, ANGLE};
//!
//! let mut tokens = Vec::new();
//! Scanner::new("a<%= b %>", ANGLE)
//!     .scan(|token, _state| {
//!         tokens.push(token);
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(tokens.len(), 4);
//! assert_eq!(tokens[0], Token::Text("a"));
//! ```

use crate::error::ScanError;
use crate::template::delimiter::{Delimiters, Marker, MarkerSet};
use crate::template::split::rsplit;

/// A token produced by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text between markers
    Text(&'a str),
    /// A delimiter marker or line break
    Marker(Marker),
}

impl<'a> Token<'a> {
    /// Source text of this token
    pub fn as_str(&self, delimiters: &Delimiters) -> &'a str {
        match self {
            Token::Text(text) => text,
            Token::Marker(marker) => delimiters.marker_text(*marker),
        }
    }
}

/// Mutable state shared between the scanner and its handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Opening marker of the tag currently open, if any
    pub open_tag: Option<Marker>,
    /// Current source line (1-based; 0 before the first line)
    pub line: u32,
    /// Line the currently open tag started on
    pub tag_line: u32,
}

/// Streams template tokens to a handler
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    delimiters: Delimiters,
    markers: MarkerSet,
}

impl<'a> Scanner<'a> {
    /// Create a scanner for `source`
    pub fn new(source: &'a str, delimiters: Delimiters) -> Self {
        Self {
            source,
            delimiters,
            markers: delimiters.marker_set(),
        }
    }

    /// The delimiter pair in use
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// Scan the whole source, calling `on_token` once per token
    ///
    /// A handler failure aborts the scan and is reported with the line it
    /// was raised on. Returns the final state so callers can inspect a tag
    /// left open at end of input.
    pub fn scan<F>(&self, mut on_token: F) -> Result<ScanState, ScanError>
    where
        F: FnMut(Token<'a>, &mut ScanState) -> Result<(), String>,
    {
        let mut state = ScanState::default();
        // Whether the current line already got its number
        let mut line_open = false;

        for fragment in rsplit(self.source, &'\n') {
            if fragment == "\n" {
                // A line break belongs to the line it terminates
                if !line_open {
                    state.line += 1;
                }
                line_open = false;
                Self::dispatch(&mut on_token, Token::Marker(Marker::Newline), &mut state)?;
                continue;
            }

            state.line += 1;
            line_open = true;
            for piece in rsplit(fragment, &self.markers) {
                let token = match self.markers.classify(piece) {
                    Some(marker) => Token::Marker(marker),
                    None => Token::Text(piece),
                };
                Self::dispatch(&mut on_token, token, &mut state)?;
            }
        }

        log_debug!("scanned {} lines", state.line);
        Ok(state)
    }

    fn dispatch<F>(on_token: &mut F, token: Token<'a>, state: &mut ScanState) -> Result<(), ScanError>
    where
        F: FnMut(Token<'a>, &mut ScanState) -> Result<(), String>,
    {
        on_token(token, state).map_err(|message| ScanError::new(state.line, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::delimiter::{ANGLE, SQUARE};

    fn collect(source: &str, delimiters: Delimiters) -> Vec<(Token<'_>, u32)> {
        let mut tokens = Vec::new();
        Scanner::new(source, delimiters)
            .scan(|token, state| {
                tokens.push((token, state.line));
                Ok(())
            })
            .unwrap();
        tokens
    }

    #[test]
    fn test_empty_source() {
        assert!(collect("", ANGLE).is_empty());
    }

    #[test]
    fn test_tokens_in_order() {
        let tokens: Vec<_> = collect("a<% b %>c", ANGLE).into_iter().map(|t| t.0).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a"),
                Token::Marker(Marker::Open),
                Token::Text(" b "),
                Token::Marker(Marker::Close),
                Token::Text("c"),
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = collect("one\n\nthree\n", ANGLE);
        assert_eq!(
            tokens,
            vec![
                (Token::Text("one"), 1),
                (Token::Marker(Marker::Newline), 1),
                (Token::Marker(Marker::Newline), 2),
                (Token::Text("three"), 3),
                (Token::Marker(Marker::Newline), 3),
            ]
        );
    }

    #[test]
    fn test_leading_newline_counts_as_line_one() {
        let tokens = collect("\nx", ANGLE);
        assert_eq!(tokens[0], (Token::Marker(Marker::Newline), 1));
        assert_eq!(tokens[1], (Token::Text("x"), 2));
    }

    #[test]
    fn test_tokens_reconstruct_source() {
        let source = "x <%= a %>\n<%# c %> <%% y %%>\n[% z %]";
        let rebuilt: String = collect(source, ANGLE)
            .into_iter()
            .map(|(t, _)| t.as_str(&ANGLE))
            .collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_square_delimiters() {
        let tokens: Vec<_> = collect("[%= x %]", SQUARE).into_iter().map(|t| t.0).collect();
        assert_eq!(tokens[0], Token::Marker(Marker::OpenEqual));
        assert_eq!(tokens[2], Token::Marker(Marker::Close));
    }

    #[test]
    fn test_handler_failure_carries_line() {
        let err = Scanner::new("ok\nstill ok\n<% boom %>", ANGLE)
            .scan(|token, _| match token {
                Token::Marker(Marker::Open) => Err("no tags allowed".to_string()),
                _ => Ok(()),
            })
            .unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.message, "no tags allowed");
    }

    #[test]
    fn test_final_state() {
        let state = Scanner::new("a\nb", ANGLE).scan(|_, _| Ok(())).unwrap();
        assert_eq!(state.line, 2);
        assert_eq!(state.open_tag, None);
    }
}
