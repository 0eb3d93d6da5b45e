//! Property and table tests over compiled grammars
//!
//! Pins the accepted grammar shapes: list round trips over arbitrary
//! element sets, repetition counts, build determinism, and a table of
//! literal inputs.

use gram::gram::{enclosed_list, list, lit, optional, pat, repetition, ParseError, Syntax};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Value};

/// `( word , word , ... )` with an optional single space after separators.
fn word_list() -> Syntax {
    let root = Syntax::new("root");
    root.matches(|| {
        enclosed_list(
            lit("("),
            optional([lit(" ")]).into(),
            pat("[a-z]+"),
            lit(","),
            lit(")"),
        )
    });
    root
}

fn bare_word_list() -> Syntax {
    let root = Syntax::new("root");
    root.matches(|| list(optional([lit(" ")]).into(), pat("[a-z]+"), lit(",")));
    root
}

proptest! {
    #[test]
    fn prop_enclosed_list_round_trips(words in prop::collection::vec("[a-z]{1,8}", 0..6)) {
        let input = format!("({})", words.join(","));
        let value = word_list().parse(&Value::Null, &input).expect("rendered list parses");
        prop_assert_eq!(&value["elements"], &json!(words));
        let separators = value["separators"].as_array().expect("separators array");
        prop_assert_eq!(separators.len(), words.len().saturating_sub(1));
    }

    #[test]
    fn prop_list_accepts_spaces_after_separators(
        words in prop::collection::vec("[a-z]{1,8}", 1..6),
        spaces in prop::collection::vec(any::<bool>(), 5),
    ) {
        let mut input = String::from("(");
        for (index, word) in words.iter().enumerate() {
            if index > 0 {
                input.push(',');
                if spaces[(index - 1) % spaces.len()] {
                    input.push(' ');
                }
            }
            input.push_str(word);
        }
        input.push(')');
        let value = word_list().parse(&Value::Null, &input).expect("rendered list parses");
        prop_assert_eq!(&value["elements"], &json!(words));
    }

    #[test]
    fn prop_bare_list_round_trips(words in prop::collection::vec("[a-z]{1,8}", 0..6)) {
        let input = words.join(",");
        let value = bare_word_list().parse(&Value::Null, &input).expect("rendered list parses");
        prop_assert_eq!(&value["elements"], &json!(words));
    }

    #[test]
    fn prop_repetition_count_matches_input(count in 1usize..30) {
        let root = Syntax::new("root");
        root.matches(|| repetition([lit("a")]));
        let input = "a".repeat(count);
        let value = root.parse(&Value::Null, &input).expect("repetition parses");
        prop_assert_eq!(value.as_array().expect("array value").len(), count);
    }

    #[test]
    fn prop_parse_is_deterministic(words in prop::collection::vec("[a-z]{1,8}", 0..5)) {
        let input = format!("({})", words.join(","));
        let grammar = word_list();
        let first = grammar.parse(&Value::Null, &input).expect("rendered list parses");
        let second = grammar.parse(&Value::Null, &input).expect("rendered list parses");
        prop_assert_eq!(first, second);
    }
}

#[rstest]
#[case("while")]
#[case("x")]
#[case("::")]
#[case("très")]
fn test_literal_round_trips(#[case] text: &str) {
    let root = Syntax::new("root");
    {
        let text = text.to_string();
        root.matches(move || lit(text.clone()));
    }
    let value = root.parse(&Value::Null, text).expect("exact input matches");
    assert_eq!(value, json!(text));
}

#[rstest]
#[case("(a,b", "missing end delimiter")]
#[case("a,b)", "missing start delimiter")]
#[case("(a b)", "missing separator")]
fn test_malformed_lists_fail(#[case] input: &str, #[case] why: &str) {
    let error = word_list()
        .parse(&Value::Null, input)
        .expect_err(why);
    assert!(
        matches!(
            error,
            ParseError::Incomplete | ParseError::UnexpectedToken { .. } | ParseError::Lex(_)
        ),
        "unexpected error for {}: {:?}",
        why,
        error
    );
}
