//! Runtime Tokenizer
//!
//! A scanner configured at runtime from registered token specs. At each
//! byte offset every registered matcher is tried and the longest match
//! wins; on a tie a literal beats a pattern, and earlier registration
//! beats later. Zero-length pattern matches are rejected so a permissive
//! pattern can never stall the scanner.
//!
//! There is no implicit whitespace skipping: if the grammar cares about
//! spaces it declares matchers for them, and any input not covered by a
//! registered matcher is a lexing error carrying the byte offset.

use regex::Regex;
use std::fmt;

use super::tokens::{Token, TokenKind, TokenSpec};

/// Errors raised while configuring or running the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// A pattern spec failed to compile as a regular expression.
    InvalidPattern {
        name: String,
        source: String,
        message: String,
    },
    /// No registered matcher accepts the input at this byte offset.
    UnexpectedInput { offset: usize, snippet: String },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::InvalidPattern {
                name,
                source,
                message,
            } => write!(
                f,
                "token '{}' has an invalid pattern /{}/: {}",
                name, source, message
            ),
            LexError::UnexpectedInput { offset, snippet } => {
                write!(f, "no token matches input at byte {}: {:?}", offset, snippet)
            }
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug)]
enum Matcher {
    Literal(String),
    Pattern(Regex),
}

#[derive(Debug)]
struct Entry {
    spec: TokenSpec,
    matcher: Matcher,
}

impl Entry {
    fn new(spec: TokenSpec) -> Result<Self, LexError> {
        let matcher = match &spec.kind {
            TokenKind::Literal(text) => Matcher::Literal(text.clone()),
            TokenKind::Pattern(source) => {
                let anchored = format!(r"\A(?:{})", source);
                let regex = Regex::new(&anchored).map_err(|error| LexError::InvalidPattern {
                    name: spec.name.clone(),
                    source: source.clone(),
                    message: error.to_string(),
                })?;
                Matcher::Pattern(regex)
            }
        };
        Ok(Entry { spec, matcher })
    }

    /// Length of this entry's match at the start of `rest`, if any.
    fn match_len(&self, rest: &str) -> Option<usize> {
        match &self.matcher {
            Matcher::Literal(text) => rest.starts_with(text.as_str()).then(|| text.len()),
            Matcher::Pattern(regex) => regex.find(rest).map(|found| found.end()),
        }
    }

    fn is_literal(&self) -> bool {
        matches!(self.matcher, Matcher::Literal(_))
    }
}

/// A scanner over registered token specs.
#[derive(Debug)]
pub struct Tokenizer {
    entries: Vec<Entry>,
}

impl Tokenizer {
    /// Build a tokenizer from specs, compiling every pattern up front.
    pub fn new(specs: Vec<TokenSpec>) -> Result<Self, LexError> {
        let entries = specs.into_iter().map(Entry::new).collect::<Result<_, _>>()?;
        Ok(Tokenizer { entries })
    }

    /// Register an additional token type.
    pub fn define(&mut self, spec: TokenSpec) -> Result<(), LexError> {
        self.entries.push(Entry::new(spec)?);
        Ok(())
    }

    /// The registered specs, in registration order.
    pub fn specs(&self) -> Vec<TokenSpec> {
        self.entries.iter().map(|entry| entry.spec.clone()).collect()
    }

    /// Whether a token type of this name is registered.
    pub fn defines(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.spec.name == name)
    }

    /// Split the whole input into tokens.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        while offset < input.len() {
            let rest = &input[offset..];
            let mut best: Option<(usize, usize)> = None;
            for (index, entry) in self.entries.iter().enumerate() {
                let length = match entry.match_len(rest) {
                    // Zero-length matches would stall the scanner.
                    Some(0) | None => continue,
                    Some(length) => length,
                };
                let wins = match best {
                    None => true,
                    Some((best_length, best_index)) => {
                        length > best_length
                            || (length == best_length
                                && entry.is_literal()
                                && !self.entries[best_index].is_literal())
                    }
                };
                if wins {
                    best = Some((length, index));
                }
            }
            match best {
                Some((length, index)) => {
                    tokens.push(Token::new(
                        self.entries[index].spec.name.clone(),
                        &rest[..length],
                        offset..offset + length,
                    ));
                    offset += length;
                }
                None => {
                    return Err(LexError::UnexpectedInput {
                        offset,
                        snippet: rest.chars().take(12).collect(),
                    });
                }
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(specs: Vec<TokenSpec>) -> Tokenizer {
        Tokenizer::new(specs).expect("specs should compile")
    }

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|token| token.kind.as_str()).collect()
    }

    #[test]
    fn test_literal_tokenization_with_spans() {
        let scanner = tokenizer(vec![
            TokenSpec::literal("open", "("),
            TokenSpec::literal("close", ")"),
        ]);
        let tokens = scanner.tokenize("()").expect("input should tokenize");
        assert_eq!(kinds(&tokens), ["open", "close"]);
        assert_eq!(tokens[0].span, 0..1);
        assert_eq!(tokens[1].span, 1..2);
    }

    #[test]
    fn test_longest_match_wins() {
        let scanner = tokenizer(vec![
            TokenSpec::literal("colon", ":"),
            TokenSpec::literal("double_colon", "::"),
        ]);
        let tokens = scanner.tokenize("::").expect("input should tokenize");
        assert_eq!(kinds(&tokens), ["double_colon"]);
    }

    #[test]
    fn test_literal_beats_pattern_on_equal_length() {
        let scanner = tokenizer(vec![
            TokenSpec::pattern("word", "[a-z]+"),
            TokenSpec::literal("keyword", "if"),
        ]);
        let tokens = scanner.tokenize("if").expect("input should tokenize");
        assert_eq!(kinds(&tokens), ["keyword"]);
    }

    #[test]
    fn test_pattern_wins_when_longer() {
        let scanner = tokenizer(vec![
            TokenSpec::literal("keyword", "if"),
            TokenSpec::pattern("word", "[a-z]+"),
        ]);
        let tokens = scanner.tokenize("iffy").expect("input should tokenize");
        assert_eq!(kinds(&tokens), ["word"]);
        assert_eq!(tokens[0].text, "iffy");
    }

    #[test]
    fn test_earlier_registration_wins_ties() {
        let scanner = tokenizer(vec![
            TokenSpec::pattern("lower", "[a-z]+"),
            TokenSpec::pattern("any", "[a-zA-Z]+"),
        ]);
        let tokens = scanner.tokenize("abc").expect("input should tokenize");
        assert_eq!(kinds(&tokens), ["lower"]);
    }

    #[test]
    fn test_unexpected_input_reports_offset() {
        let scanner = tokenizer(vec![TokenSpec::literal("a", "a")]);
        let error = scanner.tokenize("aa!").expect_err("input must not tokenize");
        assert_eq!(
            error,
            LexError::UnexpectedInput {
                offset: 2,
                snippet: "!".to_string(),
            }
        );
    }

    #[test]
    fn test_zero_length_pattern_match_is_rejected() {
        let scanner = tokenizer(vec![TokenSpec::pattern("maybe", "a*")]);
        let error = scanner.tokenize("b").expect_err("zero-length match must not loop");
        assert!(matches!(error, LexError::UnexpectedInput { offset: 0, .. }));
    }

    #[test]
    fn test_invalid_pattern_is_a_configuration_error() {
        let result = Tokenizer::new(vec![TokenSpec::pattern("broken", "(")]);
        assert!(matches!(result, Err(LexError::InvalidPattern { .. })));
    }

    #[test]
    fn test_empty_input_yields_no_tokens() {
        let scanner = tokenizer(vec![TokenSpec::literal("a", "a")]);
        assert_eq!(scanner.tokenize("").expect("empty input is fine"), Vec::new());
    }

    #[test]
    fn test_pattern_is_anchored_to_current_offset() {
        let scanner = tokenizer(vec![
            TokenSpec::pattern("digits", "[0-9]+"),
            TokenSpec::literal("dash", "-"),
        ]);
        let tokens = scanner.tokenize("12-34").expect("input should tokenize");
        assert_eq!(kinds(&tokens), ["digits", "dash", "digits"]);
    }
}
