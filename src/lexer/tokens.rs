//! Token Definitions
//!
//! The data model shared between the compiler and the tokenizer: a token is
//! a typed slice of the input, and a token spec declares how one token type
//! matches - by fixed literal or by regular-expression pattern. Specs are
//! plain serializable data; compiled matchers live in the tokenizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// One token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token type name, as registered in the tokenizer.
    pub kind: String,
    /// The matched input slice.
    pub text: String,
    /// Byte range of the match in the original input.
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, span: Range<usize>) -> Self {
        Token {
            kind: kind.into(),
            text: text.into(),
            span,
        }
    }
}

/// How one token type matches input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Matches this exact string.
    Literal(String),
    /// Matches this regular expression, anchored at the current offset.
    Pattern(String),
}

/// A registered token type: name plus matching behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub name: String,
    pub kind: TokenKind,
}

impl TokenSpec {
    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        TokenSpec {
            name: name.into(),
            kind: TokenKind::Literal(text.into()),
        }
    }

    pub fn pattern(name: impl Into<String>, source: impl Into<String>) -> Self {
        TokenSpec {
            name: name.into(),
            kind: TokenKind::Pattern(source.into()),
        }
    }
}

impl fmt::Display for TokenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Literal(text) => write!(f, "{} = {:?}", self.name, text),
            TokenKind::Pattern(source) => write!(f, "{} = /{}/", self.name, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_literal_spec() {
        let spec = TokenSpec::literal("lit_0", "(");
        assert_eq!(spec.to_string(), "lit_0 = \"(\"");
    }

    #[test]
    fn test_display_pattern_spec() {
        let spec = TokenSpec::pattern("pat_0", "[a-z]+");
        assert_eq!(spec.to_string(), "pat_0 = /[a-z]+/");
    }

    #[test]
    fn test_spec_serialization_round_trip() {
        let spec = TokenSpec::pattern("pat_0", "[0-9]+");
        let encoded = serde_json::to_string(&spec).expect("spec should serialize");
        let decoded: TokenSpec = serde_json::from_str(&encoded).expect("spec should deserialize");
        assert_eq!(decoded, spec);
    }
}
