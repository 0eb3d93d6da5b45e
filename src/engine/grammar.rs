//! Production Set Model
//!
//! The grammar handed to the matching engine: a start symbol plus flat
//! productions. Each production is a nonterminal name, an ordered symbol
//! list, and an optional post-match builder composing the values of the
//! matched symbols into one value.
//!
//! The model is generic over the composed value type; the engine never
//! inspects values, it only threads them from matched symbols into
//! builders.

use std::fmt;
use std::rc::Rc;

/// One symbol in a production body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// Matches one token of the named type.
    Terminal(String),
    /// Matches the named nonterminal.
    NonTerminal(String),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(name) => write!(f, "{}", name),
            Symbol::NonTerminal(name) => write!(f, "<{}>", name),
        }
    }
}

/// Composes the values captured by a production body into one value.
pub type Builder<V> = Rc<dyn Fn(Vec<V>) -> V>;

/// One production: *name -> symbols*, with an optional post-match builder.
///
/// Without a builder the production's value is its single child's value,
/// or the default value when the body is empty.
#[derive(Clone)]
pub struct Production<V> {
    pub name: String,
    pub symbols: Vec<Symbol>,
    pub builder: Option<Builder<V>>,
}

impl<V> Production<V> {
    pub fn new(name: &str, symbols: Vec<Symbol>, builder: Option<Builder<V>>) -> Self {
        Production {
            name: name.to_string(),
            symbols,
            builder,
        }
    }
}

impl<V> fmt::Display for Production<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> \u{2192}", self.name)?;
        if self.symbols.is_empty() {
            write!(f, " \u{3b5}")?;
        }
        for symbol in &self.symbols {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

impl<V> fmt::Debug for Production<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Production({})", self)
    }
}

/// A complete production set with its start symbol.
#[derive(Debug, Clone)]
pub struct Grammar<V> {
    pub start: String,
    pub productions: Vec<Production<V>>,
}

impl<V> fmt::Display for Grammar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: <{}>", self.start)?;
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}
