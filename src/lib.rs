//! # gram
//!
//! Typed grammar combinators compiled to context-free productions.
//!
//! A grammar is declared as a composition of combinators (sequence,
//! optional, alternation, repetition, delimited list, named production).
//! Compiling a root named production lowers the combinator graph into a
//! flat production set executed by a generic chart engine, with token
//! definitions collected for a runtime tokenizer. A successful match
//! yields a deferred value tree; building it against a caller-supplied
//! context evaluates user transforms bottom-up into a `serde_json::Value`.
//!
//! The crate is split along the compilation boundary:
//!
//! - [`gram`] - the combinator algebra, its compiler, and the deferred
//!   value runtime
//! - [`engine`] - a generic chart-based matching engine with no combinator
//!   knowledge
//! - [`lexer`] - a runtime-configured tokenizer driven by the lowered
//!   token definitions

pub mod engine;
pub mod gram;
pub mod lexer;
