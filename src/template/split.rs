//! Split primitive keeping both matches and the gaps between them
//!
//! [`rsplit`] is the foundation of the scanner: it splits once on newlines
//! to get lines, and once per line on the delimiter markers.
//!
//! ```rust
//! use ejs::template::rsplit;
//!
//! assert_eq!(rsplit("a\nb\n", &'\n'), vec!["a", "\n", "b", "\n"]);
//! assert_eq!(rsplit("", &'\n'), Vec::<&str>::new());
//! ```

use regex::Regex;

/// Something `rsplit` can search for
pub trait SplitPattern {
    /// Byte range of the first match starting at or after `from`
    fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)>;
}

impl SplitPattern for char {
    #[inline]
    fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        if self.is_ascii() {
            memchr::memchr(*self as u8, &text.as_bytes()[from..])
                .map(|i| (from + i, from + i + 1))
        } else {
            text[from..]
                .find(*self)
                .map(|i| (from + i, from + i + self.len_utf8()))
        }
    }
}

impl SplitPattern for Regex {
    #[inline]
    fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        Regex::find_at(self, text, from).map(|m| (m.start(), m.end()))
    }
}

impl<P: SplitPattern + ?Sized> SplitPattern for &P {
    #[inline]
    fn find_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        (**self).find_at(text, from)
    }
}

/// Split `text` into matches and the gaps between them
///
/// Every match becomes its own fragment, every non-empty gap becomes its own
/// fragment, and order is preserved, so concatenating the result yields
/// `text` again. Zero matches yield `text` as a single fragment; empty input
/// yields no fragments. Zero-width matches are skipped.
pub fn rsplit<'a, P: SplitPattern + ?Sized>(text: &'a str, pattern: &P) -> Vec<&'a str> {
    let mut fragments = Vec::new();
    let mut pos = 0;
    let mut search = 0;

    while search <= text.len() {
        let Some((start, end)) = pattern.find_at(text, search) else {
            break;
        };

        if start == end {
            // Step past one character so a zero-width match cannot loop
            match text[end..].chars().next() {
                Some(c) => search = end + c.len_utf8(),
                None => break,
            }
            continue;
        }

        if start > pos {
            fragments.push(&text[pos..start]);
        }
        fragments.push(&text[start..end]);
        pos = end;
        search = end;
    }

    if pos < text.len() {
        fragments.push(&text[pos..]);
    }

    fragments
}
