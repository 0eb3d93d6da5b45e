//! Compiled Parser
//!
//! The executable produced by lowering: the production set, the tokenizer
//! configured from the grammar's terminals, and the list of externally
//! named token types still awaiting a matcher.
//!
//! `parse` runs the full pipeline: tokenize the input, feed the engine one
//! token at a time, take the first full-input result (the documented
//! ambiguity policy), and build its deferred tree against the supplied
//! context. Zero results - or input the tokenizer or engine rejects partway
//! - surface as a parse error; retrying with the same grammar and input
//! fails the same way.

use serde_json::Value;
use std::fmt;

use super::error::GrammarError;
use super::snapshot::{GrammarSnapshot, ProductionSnapshot, TokenSnapshot};
use super::value::{build_raw, Raw};
use crate::engine::{Grammar, Recognizer};
use crate::lexer::{LexError, TokenKind, TokenSpec, Tokenizer};

/// Errors raised while parsing input against a compiled grammar.
///
/// All variants are recoverable values; none of them poison the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The grammar itself failed to compile (raised by the conveniences
    /// that compile on demand).
    Grammar(GrammarError),
    /// The tokenizer rejected the input.
    Lex(LexError),
    /// A token was well-formed but no production could consume it.
    UnexpectedToken {
        kind: String,
        text: String,
        offset: usize,
    },
    /// The engine consumed the input without producing a full parse.
    Incomplete,
    /// A named token type was referenced by the grammar but never given a
    /// matcher via `define_token`.
    UndefinedToken(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Grammar(error) => write!(f, "grammar error: {}", error),
            ParseError::Lex(error) => write!(f, "lex error: {}", error),
            ParseError::UnexpectedToken { kind, text, offset } => write!(
                f,
                "unexpected {} token {:?} at byte {}",
                kind, text, offset
            ),
            ParseError::Incomplete => write!(f, "incomplete parse"),
            ParseError::UndefinedToken(name) => {
                write!(f, "token type '{}' has no matcher; call define_token first", name)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An executable parser for one compiled grammar.
#[derive(Debug)]
pub struct Parser {
    grammar: Grammar<Raw>,
    tokenizer: Tokenizer,
    required_tokens: Vec<String>,
}

impl Parser {
    pub(crate) fn new(
        grammar: Grammar<Raw>,
        tokenizer: Tokenizer,
        required_tokens: Vec<String>,
    ) -> Self {
        Parser {
            grammar,
            tokenizer,
            required_tokens,
        }
    }

    /// Supply the matcher for an externally named token type.
    pub fn define_token(&mut self, name: &str, kind: TokenKind) -> Result<(), GrammarError> {
        self.tokenizer
            .define(TokenSpec {
                name: name.to_string(),
                kind,
            })
            .map_err(|error| match error {
                LexError::InvalidPattern { source, message, .. } => {
                    GrammarError::InvalidPattern { source, message }
                }
                other => GrammarError::InvalidPattern {
                    source: String::new(),
                    message: other.to_string(),
                },
            })?;
        self.required_tokens.retain(|required| required != name);
        Ok(())
    }

    /// Match the full input without building, returning the first result's
    /// raw deferred tree.
    ///
    /// The tree holds no reference to this parser; build it any number of
    /// times, with any contexts, via [`build_raw`].
    pub fn match_input(&self, input: &str) -> Result<Raw, ParseError> {
        if let Some(missing) = self
            .required_tokens
            .iter()
            .find(|name| !self.tokenizer.defines(name))
        {
            return Err(ParseError::UndefinedToken(missing.clone()));
        }

        let tokens = self.tokenizer.tokenize(input).map_err(ParseError::Lex)?;
        let mut recognizer = Recognizer::new(&self.grammar);
        for token in &tokens {
            if !recognizer.feed(&token.kind, Raw::Text(token.text.clone())) {
                return Err(ParseError::UnexpectedToken {
                    kind: token.kind.clone(),
                    text: token.text.clone(),
                    offset: token.span.start,
                });
            }
        }
        let mut results = recognizer.results();
        if results.is_empty() {
            return Err(ParseError::Incomplete);
        }
        Ok(results.swap_remove(0))
    }

    /// Parse the full input and build the first result against `context`.
    pub fn parse(&self, context: &Value, input: &str) -> Result<Value, ParseError> {
        let raw = self.match_input(input)?;
        Ok(build_raw(&raw, context).value)
    }

    /// A serializable summary of the compiled grammar.
    pub fn snapshot(&self) -> GrammarSnapshot {
        let mut tokens: Vec<TokenSnapshot> = self
            .tokenizer
            .specs()
            .into_iter()
            .map(TokenSnapshot::from_spec)
            .collect();
        for name in &self.required_tokens {
            tokens.push(TokenSnapshot::external(name));
        }
        GrammarSnapshot {
            start: self.grammar.start.clone(),
            productions: self
                .grammar
                .productions
                .iter()
                .map(|production| ProductionSnapshot {
                    name: production.name.clone(),
                    symbols: production
                        .symbols
                        .iter()
                        .map(|symbol| symbol.to_string())
                        .collect(),
                })
                .collect(),
            tokens,
        }
    }
}
