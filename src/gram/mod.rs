//! Combinator Grammar Core
//!
//! The declaration and compilation half of the crate:
//!
//! 1. Grammars are declared as compositions of typed combinators
//!    ([`combinators`], [`list`], [`syntax`]) over normalized arguments
//!    ([`definition`])
//! 2. The combinator graph ([`rule`]) is lowered ([`compiler`]) into the
//!    flat production set and token definitions executed by the engine and
//!    tokenizer
//! 3. A successful match yields a deferred value tree ([`value`]) built on
//!    demand against a caller context through a compiled [`parser`]
//!
//! The usual entry points: declare named productions with
//! [`Syntax::new`] and `matches`/`matches_with`, compose with
//! [`sequence`], [`optional`], [`alternation`], [`repetition`], [`list`]
//! and [`enclosed_list`], then call [`Syntax::parse`] or [`compile`].

pub mod combinators;
pub mod compiler;
pub mod definition;
pub mod error;
pub mod list;
pub mod parser;
pub mod rule;
pub mod snapshot;
pub mod syntax;
pub mod value;

pub use combinators::{alternation, optional, repetition, sequence};
pub use compiler::compile;
pub use definition::{lit, pat, token, Definition};
pub use error::GrammarError;
pub use list::{delimited, enclosed_list, list};
pub use parser::{ParseError, Parser};
pub use rule::Rule;
pub use snapshot::{GrammarSnapshot, ProductionSnapshot, TokenSnapshot};
pub use syntax::{Syntax, Transform, TransformArgs};
pub use value::{build_raw, Built, Deferred, Raw};
