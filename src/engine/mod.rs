//! Generic CFG Matching Engine
//!
//! The execution half of the compilation boundary: a flat production set
//! ([`grammar`]) and a chart recognizer over it ([`earley`]). The engine
//! knows nothing about combinators, token definitions, or semantic values;
//! it threads opaque values from matched tokens through production
//! builders.

pub mod earley;
pub mod grammar;

pub use earley::Recognizer;
pub use grammar::{Builder, Grammar, Production, Symbol};
