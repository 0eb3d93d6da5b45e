//! Forward declaration, mutual recursion, and nested building
//!
//! Named productions may reference each other before their alternatives
//! exist; the thunks only run at compile time. These tests exercise
//! self-recursive nesting, mutual recursion declared out of order, and
//! transform composition across recursion depth.

use gram::gram::{
    alternation, enclosed_list, lit, optional, pat, sequence, Definition, Syntax,
};
use serde_json::{json, Value};

/// Nested bracketed lists of numbers: value := number | [value, ...]
fn nested_numbers() -> Syntax {
    let value = Syntax::new("value");

    let number = Syntax::new("number");
    number.matches_with(
        || pat("[0-9]+"),
        |args| {
            args.value
                .as_str()
                .and_then(|text| text.parse::<i64>().ok())
                .map(Value::from)
                .unwrap_or(Value::Null)
        },
    );

    let items = Syntax::new("items");
    {
        let value = value.clone();
        items.matches_with(
            move || {
                enclosed_list(
                    lit("["),
                    optional([lit(" ")]).into(),
                    Definition::from(&value),
                    lit(","),
                    lit("]"),
                )
            },
            |args| args.value["elements"].clone(),
        );
    }

    {
        let number = number.clone();
        value.matches(move || Definition::from(&number));
    }
    {
        let items = items.clone();
        value.matches(move || Definition::from(&items));
    }

    value
}

#[test]
fn test_self_recursive_nesting() {
    let grammar = nested_numbers();
    let value = grammar
        .parse(&Value::Null, "[1, [2, 3], [], 4]")
        .expect("nested list matches");
    assert_eq!(value, json!([1, [2, 3], [], 4]));
}

#[test]
fn test_recursion_depth() {
    let grammar = nested_numbers();
    let value = grammar
        .parse(&Value::Null, "[[[[7]]]]")
        .expect("deep nesting matches");
    assert_eq!(value, json!([[[[7]]]]));
}

#[test]
fn test_mutual_recursion_declared_out_of_order() {
    // `expr` references `group` before `group` has any alternatives, and
    // `group` references `expr` right back.
    let expr = Syntax::new("expr");
    let group = Syntax::new("group");

    {
        let group = group.clone();
        expr.matches(move || {
            alternation([pat("[0-9]+"), Definition::from(&group)])
        });
    }
    {
        let expr = expr.clone();
        group.matches_with(
            move || sequence([lit("("), Definition::from(&expr), lit(")")]),
            |args| json!({ "grouped": args.fields.get("expr").cloned() }),
        );
    }

    let value = expr
        .parse(&Value::Null, "((42))")
        .expect("mutually recursive grammar matches");
    assert_eq!(value, json!({ "grouped": { "grouped": "42" } }));
}

#[test]
fn test_context_threads_through_recursion() {
    let value = Syntax::new("value");
    {
        let inner = value.clone();
        value.matches_with(
            move || {
                alternation([
                    lit("x"),
                    sequence([lit("("), Definition::from(&inner), lit(")")]).into(),
                ])
            },
            |args| {
                // Count nesting depth by consulting the context at every
                // level; the context must arrive unchanged everywhere.
                match args.fields.get("value") {
                    Some(Value::Null) | None => args.context.clone(),
                    Some(inner) => json!([inner, args.context]),
                }
            },
        );
    }
    let built = value
        .parse(&json!("ctx"), "((x))")
        .expect("recursive grammar matches");
    assert_eq!(built, json!([["ctx", "ctx"], "ctx"]));
}

#[test]
fn test_two_roots_compile_independently() {
    // The same shared production compiles under two different roots; the
    // per-compilation name arena must keep the grammars independent.
    let word = Syntax::new("word");
    word.matches(|| pat("[a-z]+"));

    let quoted = Syntax::new("quoted");
    {
        let word = word.clone();
        quoted.matches(move || sequence([lit("'"), Definition::from(&word), lit("'")]));
    }
    let doubled = Syntax::new("doubled");
    {
        let word = word.clone();
        doubled.matches(move || sequence([Definition::from(&word), Definition::from(&word)]));
    }

    assert_eq!(
        quoted.parse(&Value::Null, "'ab'").expect("quoted matches"),
        json!(["'", "ab", "'"])
    );
    assert_eq!(
        doubled.parse(&Value::Null, "abab").expect("doubled matches"),
        json!(["ab", "ab"])
    );
}
