//! Definition Normalization
//!
//! Combinator constructors accept loosely shaped arguments: a literal
//! string, a numeric literal, a pattern source, or an existing rule (named
//! productions included, possibly declared but not yet populated). Every
//! constructor normalizes its arguments into the closed [`Definition`]
//! union at the boundary; nothing downstream branches on argument shape
//! again.
//!
//! Normalization never mutates the argument: a literal or pattern
//! definition produces a fresh terminal rule instance when resolved, and
//! the compiler later collapses structurally identical terminals into one
//! token definition.

use super::rule::Rule;
use super::syntax::Syntax;

/// A normalized combinator argument.
#[derive(Debug, Clone)]
pub enum Definition {
    /// Matches one token equal to a fixed string.
    Literal(String),
    /// Matches one token produced by a regular-expression class.
    Pattern(String),
    /// References an existing rule.
    Rule(Rule),
}

impl Definition {
    /// Produce the rule for this definition.
    ///
    /// Literal and pattern definitions get a fresh terminal instance each
    /// time; duplicates are collapsed by the compiler, not here.
    pub(crate) fn resolve(&self) -> Rule {
        match self {
            Definition::Literal(text) => Rule::literal(text.clone()),
            Definition::Pattern(source) => Rule::pattern(source.clone()),
            Definition::Rule(rule) => rule.clone(),
        }
    }
}

/// Literal definition from a fixed string.
pub fn lit(text: impl Into<String>) -> Definition {
    Definition::Literal(text.into())
}

/// Pattern definition from a regular-expression source.
pub fn pat(source: impl Into<String>) -> Definition {
    Definition::Pattern(source.into())
}

/// Definition referencing an externally defined token type by name.
///
/// The matcher for the type is supplied on the compiled parser via
/// `Parser::define_token`; lowering only records that the type is required.
pub fn token(name: impl Into<String>) -> Definition {
    Definition::Rule(Rule::token_ref(name.into()))
}

impl From<&str> for Definition {
    fn from(text: &str) -> Self {
        Definition::Literal(text.to_string())
    }
}

impl From<String> for Definition {
    fn from(text: String) -> Self {
        Definition::Literal(text)
    }
}

impl From<i64> for Definition {
    fn from(number: i64) -> Self {
        Definition::Literal(number.to_string())
    }
}

impl From<Rule> for Definition {
    fn from(rule: Rule) -> Self {
        Definition::Rule(rule)
    }
}

impl From<&Rule> for Definition {
    fn from(rule: &Rule) -> Self {
        Definition::Rule(rule.clone())
    }
}

impl From<&Syntax> for Definition {
    fn from(syntax: &Syntax) -> Self {
        syntax.def()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_becomes_literal() {
        match Definition::from("abc") {
            Definition::Literal(text) => assert_eq!(text, "abc"),
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_number_coerces_to_string_literal() {
        match Definition::from(42) {
            Definition::Literal(text) => assert_eq!(text, "42"),
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_pat_keeps_pattern_source() {
        match pat("[a-z]+") {
            Definition::Pattern(source) => assert_eq!(source, "[a-z]+"),
            other => panic!("expected pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_reference_resolves_to_same_instance() {
        let rule = Rule::literal("x".to_string());
        let definition = Definition::from(&rule);
        assert!(definition.resolve().same_rule(&rule));
    }

    #[test]
    fn test_literal_resolution_produces_fresh_instances() {
        let definition = lit("x");
        let first = definition.resolve();
        let second = definition.resolve();
        assert!(!first.same_rule(&second));
    }
}
