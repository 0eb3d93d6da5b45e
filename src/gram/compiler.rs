//! Lowering
//!
//! Compiles a combinator graph into the flat production set and token
//! definitions the matching engine and tokenizer execute:
//!
//! 1. Discovers every reachable rule via a worklist over `children`,
//!    visiting each rule instance at most once (the graph is shared and
//!    may be cyclic; the visited set is keyed by identity, never by
//!    structure)
//! 2. Collapses structurally identical terminal matchers - equal literal
//!    text or equal pattern source - into one token definition, since the
//!    tokenizer cannot carry two definitions for the same input class;
//!    structural rules are never collapsed
//! 3. Assigns stable production names from a per-compilation arena (named
//!    productions keep their own name, everything else gets a kind-tagged
//!    counter), so compiling one grammar never interferes with another
//! 4. Lets each rule kind emit its productions through its own lowering
//!    function
//!
//! Lowering runs once per call; the memoization per root named production
//! lives on [`super::syntax::Syntax`].

use std::collections::{HashMap, HashSet, VecDeque};

use super::combinators::{emit_alternation, emit_optional, emit_repetition, emit_sequence};
use super::error::GrammarError;
use super::list::emit_list;
use super::parser::Parser;
use super::rule::{Rule, RuleKind};
use super::syntax::{emit_syntax, Syntax};
use super::value::Raw;
use crate::engine::grammar::{Grammar, Production, Symbol};
use crate::lexer::{TokenSpec, Tokenizer};

/// Compile a root named production into an executable parser.
pub fn compile(root: &Syntax) -> Result<Parser, GrammarError> {
    let mut lower = Lowerer::new();
    let root_rule = root.rule();
    let start = lower.nonterminal_name(&root_rule);

    while let Some(rule) = lower.queue.pop_front() {
        let name = lower.assigned_name(&rule);
        match rule.kind() {
            RuleKind::Literal { .. } | RuleKind::Pattern { .. } | RuleKind::TokenRef { .. } => {}
            RuleKind::Sequence(data) => emit_sequence(data, &name, &mut lower)?,
            RuleKind::Optional(data) => emit_optional(&rule, data, &name, &mut lower)?,
            RuleKind::Alternation(data) => emit_alternation(&rule, data, &name, &mut lower)?,
            RuleKind::Repetition(data) => emit_repetition(&rule, data, &name, &mut lower)?,
            RuleKind::List(data) => emit_list(&rule, data, &name, &mut lower)?,
            RuleKind::Syntax(data) => emit_syntax(data, &name, &mut lower)?,
        }
    }

    let tokenizer =
        Tokenizer::new(lower.token_specs).map_err(|error| match error {
            crate::lexer::LexError::InvalidPattern { source, message, .. } => {
                GrammarError::InvalidPattern { source, message }
            }
            other => GrammarError::InvalidPattern {
                source: String::new(),
                message: other.to_string(),
            },
        })?;

    Ok(Parser::new(
        Grammar {
            start,
            productions: lower.productions,
        },
        tokenizer,
        lower.required_tokens,
    ))
}

/// Per-compilation lowering state: the production set under construction,
/// the identity-keyed name table, and the deduplicated token definitions.
pub(crate) struct Lowerer {
    productions: Vec<Production<Raw>>,
    names: HashMap<usize, String>,
    used_names: HashSet<String>,
    queue: VecDeque<Rule>,
    counter: usize,
    token_specs: Vec<TokenSpec>,
    literal_tokens: HashMap<String, String>,
    pattern_tokens: HashMap<String, String>,
    required_tokens: Vec<String>,
}

impl Lowerer {
    fn new() -> Self {
        Lowerer {
            productions: Vec::new(),
            names: HashMap::new(),
            used_names: HashSet::new(),
            queue: VecDeque::new(),
            counter: 0,
            token_specs: Vec::new(),
            literal_tokens: HashMap::new(),
            pattern_tokens: HashMap::new(),
            required_tokens: Vec::new(),
        }
    }

    /// Append a finished production.
    pub(crate) fn emit(&mut self, production: Production<Raw>) {
        self.productions.push(production);
    }

    /// The symbol referencing a rule: a token type name for terminals
    /// (deduplicated by value), a production name for everything else
    /// (assigned on first sight, which also queues the rule for emission).
    pub(crate) fn symbol_for(&mut self, rule: &Rule) -> Symbol {
        match rule.kind() {
            RuleKind::Literal { text } => {
                if let Some(existing) = self.literal_tokens.get(text) {
                    return Symbol::Terminal(existing.clone());
                }
                let name = format!("lit_{}", self.literal_tokens.len());
                self.literal_tokens.insert(text.clone(), name.clone());
                self.token_specs.push(TokenSpec::literal(&name, text));
                Symbol::Terminal(name)
            }
            RuleKind::Pattern { source } => {
                if let Some(existing) = self.pattern_tokens.get(source) {
                    return Symbol::Terminal(existing.clone());
                }
                let name = format!("pat_{}", self.pattern_tokens.len());
                self.pattern_tokens.insert(source.clone(), name.clone());
                self.token_specs.push(TokenSpec::pattern(&name, source));
                Symbol::Terminal(name)
            }
            RuleKind::TokenRef { name } => {
                if !self.required_tokens.iter().any(|existing| existing == name) {
                    self.required_tokens.push(name.clone());
                }
                Symbol::Terminal(name.clone())
            }
            _ => Symbol::NonTerminal(self.nonterminal_name(rule)),
        }
    }

    /// The production name for a nonterminal rule, assigned on first sight.
    fn nonterminal_name(&mut self, rule: &Rule) -> String {
        if let Some(existing) = self.names.get(&rule.key()) {
            return existing.clone();
        }
        let stem = match rule.kind() {
            RuleKind::Syntax(data) => data.name().to_string(),
            _ => {
                self.counter += 1;
                format!("{}_{}", rule.kind_name(), self.counter)
            }
        };
        let mut name = stem.clone();
        let mut suffix = 1;
        while !self.used_names.insert(name.clone()) {
            suffix += 1;
            name = format!("{}_{}", stem, suffix);
        }
        self.names.insert(rule.key(), name.clone());
        self.queue.push_back(rule.clone());
        name
    }

    fn assigned_name(&self, rule: &Rule) -> String {
        self.names
            .get(&rule.key())
            .cloned()
            .unwrap_or_else(|| rule.kind_name().to_string())
    }
}
