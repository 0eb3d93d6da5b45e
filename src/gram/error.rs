//! Configuration errors raised while declaring or compiling a grammar
//!
//! These are unrecoverable: a grammar that trips one of them is malformed
//! and compilation aborts. Parse-time failures live in
//! [`crate::gram::parser::ParseError`] instead and are ordinary recoverable
//! values.

use std::fmt;

/// Errors raised while declaring or compiling a grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    /// A delimited list was given a start delimiter without an end delimiter
    /// or vice versa.
    MismatchedDelimiters,
    /// A structural combinator was constructed with zero definitions.
    EmptyCombinator(&'static str),
    /// A named production was compiled before any `matches` registration.
    EmptySyntax(String),
    /// A pattern definition failed to compile as a regular expression.
    InvalidPattern { source: String, message: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::MismatchedDelimiters => {
                write!(f, "list start and end delimiters must be given together")
            }
            GrammarError::EmptyCombinator(kind) => {
                write!(f, "{} requires at least one definition", kind)
            }
            GrammarError::EmptySyntax(name) => {
                write!(f, "named production '{}' has no registered alternatives", name)
            }
            GrammarError::InvalidPattern { source, message } => {
                write!(f, "invalid pattern '{}': {}", source, message)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mismatched_delimiters() {
        let message = GrammarError::MismatchedDelimiters.to_string();
        assert!(message.contains("start and end"));
    }

    #[test]
    fn test_display_empty_syntax_names_the_production() {
        let message = GrammarError::EmptySyntax("expr".to_string()).to_string();
        assert!(message.contains("'expr'"));
    }
}
