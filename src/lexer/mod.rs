//! Runtime Tokenizer
//!
//! The tokenizer half of the compilation boundary: the compiler collects
//! the terminal matchers of a grammar into token specs ([`tokens`]), and
//! the scanner ([`tokenizer`]) splits raw input into a typed token stream
//! for the matching engine.

pub mod tokenizer;
pub mod tokens;

pub use tokenizer::{LexError, Tokenizer};
pub use tokens::{Token, TokenKind, TokenSpec};
