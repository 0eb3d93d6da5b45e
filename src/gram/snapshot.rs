//! Grammar Snapshot - a normalized summary of a compiled parser
//!
//! A canonical, serializable view of what lowering produced: the start
//! symbol, every production with its symbols rendered as strings, and the
//! collected token definitions. Serializers and debugging tools (the CLI
//! dump, dedup assertions in tests) consume this instead of walking the
//! live grammar, which carries closures that cannot be serialized.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lexer::{TokenKind, TokenSpec};

/// A snapshot of one compiled grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarSnapshot {
    /// The start symbol name.
    pub start: String,
    /// Every production, in emission order.
    pub productions: Vec<ProductionSnapshot>,
    /// Every token definition, deduplicated, plus externally named types.
    pub tokens: Vec<TokenSnapshot>,
}

/// One production: name plus rendered symbols (nonterminals in angle
/// brackets, terminals bare).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSnapshot {
    pub name: String,
    pub symbols: Vec<String>,
}

/// One token definition: `kind` is `literal`, `pattern`, or `external`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub name: String,
    pub kind: String,
    pub source: String,
}

impl TokenSnapshot {
    pub(crate) fn from_spec(spec: TokenSpec) -> Self {
        match spec.kind {
            TokenKind::Literal(text) => TokenSnapshot {
                name: spec.name,
                kind: "literal".to_string(),
                source: text,
            },
            TokenKind::Pattern(source) => TokenSnapshot {
                name: spec.name,
                kind: "pattern".to_string(),
                source,
            },
        }
    }

    pub(crate) fn external(name: &str) -> Self {
        TokenSnapshot {
            name: name.to_string(),
            kind: "external".to_string(),
            source: String::new(),
        }
    }
}

impl fmt::Display for GrammarSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: <{}>", self.start)?;
        writeln!(f, "tokens:")?;
        for token in &self.tokens {
            writeln!(f, "  {} ({}) {:?}", token.name, token.kind, token.source)?;
        }
        writeln!(f, "productions:")?;
        for production in &self.productions {
            write!(f, "  <{}> \u{2192}", production.name)?;
            if production.symbols.is_empty() {
                write!(f, " \u{3b5}")?;
            }
            for symbol in &production.symbols {
                write!(f, " {}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GrammarSnapshot {
        GrammarSnapshot {
            start: "root".to_string(),
            productions: vec![ProductionSnapshot {
                name: "root".to_string(),
                symbols: vec!["lit_0".to_string()],
            }],
            tokens: vec![TokenSnapshot {
                name: "lit_0".to_string(),
                kind: "literal".to_string(),
                source: "x".to_string(),
            }],
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        let snapshot = sample();
        let encoded = serde_json::to_string(&snapshot).expect("snapshot should serialize");
        let decoded: GrammarSnapshot =
            serde_json::from_str(&encoded).expect("snapshot should deserialize");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_display_lists_sections() {
        let rendered = sample().to_string();
        assert!(rendered.contains("start: <root>"));
        assert!(rendered.contains("lit_0 (literal) \"x\""));
        assert!(rendered.contains("<root> \u{2192} lit_0"));
    }
}
