//! Chart-Based Matching Engine
//!
//! An Earley-style recognizer over a flat production set:
//!
//! 1. Predicts productions for every nonterminal awaited in the current
//!    state set
//! 2. Scans one token at a time, advancing items whose next symbol is a
//!    terminal of the token's type
//! 3. Completes finished items, running their builder and advancing every
//!    item that was waiting on the completed nonterminal
//!
//! Left recursion is handled naturally by the chart. Nullable productions
//! are handled by recording empty-span completions per state set and
//! replaying them for items added later in the same set, so a prediction
//! never misses a nonterminal that already matched the empty string.
//!
//! Ambiguity policy: items are deduplicated by (production, dot, origin)
//! and the first derivation wins, so the result order is deterministic and
//! the first result is stable across runs.
//!
//! This module is completely generic: it has no knowledge of combinators
//! or token definitions, and its tests use toy symbols.

use std::collections::{HashMap, HashSet};

use super::grammar::{Grammar, Symbol};

#[derive(Clone)]
struct Item<V> {
    production: usize,
    dot: usize,
    origin: usize,
    values: Vec<V>,
}

struct StateSet<V> {
    items: Vec<Item<V>>,
    seen: HashSet<(usize, usize, usize)>,
    /// First empty-span completion per nonterminal in this set.
    nullable: HashMap<String, V>,
}

impl<V> StateSet<V> {
    fn new() -> Self {
        StateSet {
            items: Vec::new(),
            seen: HashSet::new(),
            nullable: HashMap::new(),
        }
    }
}

/// A chart recognizer over one grammar, fed one token at a time.
pub struct Recognizer<'g, V> {
    grammar: &'g Grammar<V>,
    by_name: HashMap<&'g str, Vec<usize>>,
    chart: Vec<StateSet<V>>,
}

impl<'g, V: Clone + Default> Recognizer<'g, V> {
    pub fn new(grammar: &'g Grammar<V>) -> Self {
        let mut by_name: HashMap<&'g str, Vec<usize>> = HashMap::new();
        for (index, production) in grammar.productions.iter().enumerate() {
            by_name
                .entry(production.name.as_str())
                .or_default()
                .push(index);
        }
        let mut recognizer = Recognizer {
            grammar,
            by_name,
            chart: vec![StateSet::new()],
        };
        let start_productions = recognizer
            .by_name
            .get(grammar.start.as_str())
            .cloned()
            .unwrap_or_default();
        for production in start_productions {
            recognizer.push(
                0,
                Item {
                    production,
                    dot: 0,
                    origin: 0,
                    values: Vec::new(),
                },
            );
        }
        recognizer.process(0);
        recognizer
    }

    /// Advance the chart by one token of the given type, carrying `value`
    /// into every production that consumed it.
    ///
    /// Returns false when no item could scan the token; the chart is then
    /// dead and further feeding cannot recover.
    pub fn feed(&mut self, kind: &str, value: V) -> bool {
        let current = self.chart.len() - 1;
        self.chart.push(StateSet::new());
        let at = current + 1;

        let candidates: Vec<Item<V>> = self.chart[current].items.to_vec();
        for item in candidates {
            if let Some(Symbol::Terminal(expected)) = self.next_symbol(&item) {
                if expected == kind {
                    let mut advanced = item;
                    advanced.dot += 1;
                    advanced.values.push(value.clone());
                    self.push(at, advanced);
                }
            }
        }
        if self.chart[at].items.is_empty() {
            return false;
        }
        self.process(at);
        true
    }

    /// Values of every complete parse of everything fed so far, first
    /// derivation first.
    pub fn results(&self) -> Vec<V> {
        let last = match self.chart.last() {
            Some(set) => set,
            None => return Vec::new(),
        };
        last.items
            .iter()
            .filter(|item| {
                item.origin == 0
                    && self.next_symbol(item).is_none()
                    && self.grammar.productions[item.production].name == self.grammar.start
            })
            .map(|item| self.reduce(item))
            .collect()
    }

    fn next_symbol(&self, item: &Item<V>) -> Option<&'g Symbol> {
        let grammar: &'g Grammar<V> = self.grammar;
        grammar.productions[item.production].symbols.get(item.dot)
    }

    fn reduce(&self, item: &Item<V>) -> V {
        let production = &self.grammar.productions[item.production];
        match &production.builder {
            Some(build) => build(item.values.clone()),
            None => item.values.first().cloned().unwrap_or_default(),
        }
    }

    /// Exhaust prediction and completion for one state set.
    fn process(&mut self, at: usize) {
        let mut index = 0;
        while index < self.chart[at].items.len() {
            let item = self.chart[at].items[index].clone();
            index += 1;
            match self.next_symbol(&item) {
                Some(Symbol::Terminal(_)) => {}
                Some(Symbol::NonTerminal(name)) => {
                    let predictions = self.by_name.get(name.as_str()).cloned().unwrap_or_default();
                    for production in predictions {
                        self.push(
                            at,
                            Item {
                                production,
                                dot: 0,
                                origin: at,
                                values: Vec::new(),
                            },
                        );
                    }
                }
                None => self.complete(at, &item),
            }
        }
    }

    fn complete(&mut self, at: usize, item: &Item<V>) {
        let value = self.reduce(item);
        let grammar: &'g Grammar<V> = self.grammar;
        let name = grammar.productions[item.production].name.as_str();

        // Record empty-span completions so later predictions in this set
        // still see them.
        if item.origin == at && !self.chart[at].nullable.contains_key(name) {
            self.chart[at]
                .nullable
                .insert(name.to_string(), value.clone());
        }

        let mut waiting = 0;
        while waiting < self.chart[item.origin].items.len() {
            let candidate = self.chart[item.origin].items[waiting].clone();
            waiting += 1;
            if let Some(Symbol::NonTerminal(awaited)) = self.next_symbol(&candidate) {
                if awaited == name {
                    let mut advanced = candidate;
                    advanced.dot += 1;
                    advanced.values.push(value.clone());
                    self.push(at, advanced);
                }
            }
        }
    }

    /// Insert an item, deduplicated by (production, dot, origin); the first
    /// derivation wins. If the item awaits a nonterminal that already
    /// completed empty in this set, the advanced item is inserted too.
    fn push(&mut self, at: usize, item: Item<V>) {
        let key = (item.production, item.dot, item.origin);
        if !self.chart[at].seen.insert(key) {
            return;
        }
        let nullable_value = match self.next_symbol(&item) {
            Some(Symbol::NonTerminal(name)) => self.chart[at].nullable.get(name).cloned(),
            _ => None,
        };
        if let Some(value) = nullable_value {
            let mut advanced = item.clone();
            advanced.dot += 1;
            advanced.values.push(value);
            self.chart[at].items.push(item);
            self.push(at, advanced);
        } else {
            self.chart[at].items.push(item);
        }
    }
}
