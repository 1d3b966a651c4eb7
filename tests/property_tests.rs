//! Property-based tests for the template front end and renderer
//!
//! These tests use proptest to generate inputs and check invariants that
//! must hold for any template text.

use ejs::template::{preprocess, rsplit, Scanner, ANGLE, SQUARE};
use ejs::{HelperSet, Value};
use proptest::prelude::*;

fn render(source: &str) -> String {
    ejs::compile(source)
        .unwrap()
        .render(&Value::Nil, &HelperSet::new())
        .unwrap()
}

// ============================================================================
// Splitting and scanning
// ============================================================================

proptest! {
    /// rsplit keeps every byte: the pieces concatenate back to the input
    #[test]
    fn rsplit_reconstructs_input(s in "[a-z<>%\\[\\]= \n]{0,64}") {
        let markers = ANGLE.marker_set();
        prop_assert_eq!(rsplit(&s, &markers).concat(), s.clone());
        prop_assert_eq!(rsplit(&s, &'\n').concat(), s);
    }

    /// Tokens concatenate back to the scanned source
    #[test]
    fn scanner_tokens_reconstruct_source(s in "[a-z<>%\\[\\]=# \n]{0,64}") {
        for delimiters in [ANGLE, SQUARE] {
            let mut rebuilt = String::new();
            Scanner::new(&s, delimiters)
                .scan(|token, _| {
                    rebuilt.push_str(token.as_str(&delimiters));
                    Ok(())
                })
                .unwrap();
            prop_assert_eq!(&rebuilt, &s);
        }
    }

    /// Every absorbed line break is accounted for
    #[test]
    fn preprocess_line_accounting(
        lines in prop::collection::vec(
            prop::sample::select(vec!["text", "<% x = 1 %>", "<%= x %>", "<% y %>  ", ""]),
            0..12,
        )
    ) {
        let source = lines.join("\n");
        let pre = preprocess(&source, &ANGLE);
        let before = source.matches('\n').count();
        let after = pre.text.matches('\n').count();
        prop_assert_eq!(before, after + pre.absorbed.len());
        prop_assert!(pre.absorbed.windows(2).all(|w| w[0] < w[1]));
    }
}

// ============================================================================
// Rendering
// ============================================================================

proptest! {
    /// Text without delimiters renders unchanged
    #[test]
    fn literal_text_round_trips(s in "[a-zA-Z0-9 \n\"'\\\\.,!?{}()<>\\[\\]-]{0,64}") {
        prop_assert_eq!(render(&s), s);
    }

    /// Escaped delimiters render as the delimiters themselves
    #[test]
    fn escapes_render_literally(s in "[a-zA-Z0-9 .,\"']{0,32}") {
        let source = format!("<%%{}%%>", s);
        prop_assert_eq!(render(&source), format!("<%{}%>", s));
    }

    /// Integer arithmetic in output tags
    #[test]
    fn integer_sums(a in -10_000i32..10_000, b in -10_000i32..10_000) {
        let source = format!("<%= {} + ({}) %>", a, b);
        prop_assert_eq!(render(&source), (a + b).to_string());
    }

    /// Loops emit one copy of the body per element
    #[test]
    fn loop_repeats_body(n in 0usize..20) {
        let items: Vec<Value> = (0..n as i64).map(Value::int).collect();
        let data = Value::hash(vec![("items", Value::array(items))]);
        let out = ejs::compile("<% for i in items { %>*<% } %>")
            .unwrap()
            .render(&data, &HelperSet::new())
            .unwrap();
        prop_assert_eq!(out, "*".repeat(n));
    }
}
