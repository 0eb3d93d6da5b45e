//! Structural Combinators
//!
//! The four definition-list combinators and their lowering:
//!
//! 1. `sequence` - matches its definitions in order; builds an array value
//!    and merges every child's named fields
//! 2. `optional` - matches the full sequence or nothing; the empty branch
//!    defaults every contributed field name (and the value) to null
//! 3. `alternation` - matches exactly one definition; every other branch's
//!    field names default to null so the produced shape is uniform
//! 4. `repetition` - matches one or more repetitions, lowered as a
//!    left-recursive chain; the build pass unrolls the accumulation back
//!    into match order before exposing it
//!
//! Each combinator emits its productions through its own lowering function,
//! called from the compiler's worklist. The matching engine sees only flat
//! productions; the combinator semantics live in the unpack closures
//! attached to the emitted builders.

use serde_json::{Map, Value};
use std::rc::Rc;

use super::compiler::Lowerer;
use super::definition::Definition;
use super::error::GrammarError;
use super::rule::{CombData, Rule, RuleKind};
use super::value::{build_raw, merge_fields, Built, Deferred, Raw, Unpack};
use crate::engine::grammar::{Builder, Production, Symbol};

/// Matches the definitions in order. Builds an array of the child values
/// and exposes every child's named fields.
pub fn sequence(defs: impl IntoIterator<Item = Definition>) -> Rule {
    Rule::new(RuleKind::Sequence(CombData::new(defs.into_iter().collect())))
}

/// Matches the full sequence of definitions, or nothing. With a single
/// definition the produced value is the bare matched value rather than a
/// one-element array.
pub fn optional(defs: impl IntoIterator<Item = Definition>) -> Rule {
    Rule::new(RuleKind::Optional(CombData::new(defs.into_iter().collect())))
}

/// Matches exactly one of the definitions.
pub fn alternation(defs: impl IntoIterator<Item = Definition>) -> Rule {
    Rule::new(RuleKind::Alternation(CombData::new(
        defs.into_iter().collect(),
    )))
}

/// Matches one or more repetitions of the sequence of definitions.
pub fn repetition(defs: impl IntoIterator<Item = Definition>) -> Rule {
    Rule::new(RuleKind::Repetition(CombData::new(
        defs.into_iter().collect(),
    )))
}

/// Wrap an unpack step as an engine builder producing a deferred fragment
/// over the production's captured children.
pub(crate) fn deferred_builder(unpack: Unpack) -> Builder<Raw> {
    Rc::new(move |values| Raw::Deferred(Deferred::new(Raw::Seq(values), unpack.clone())))
}

pub(crate) fn emit_sequence(
    data: &CombData,
    name: &str,
    lower: &mut Lowerer,
) -> Result<(), GrammarError> {
    let children = data.resolved().to_vec();
    if children.is_empty() {
        return Err(GrammarError::EmptyCombinator("sequence"));
    }
    let symbols = symbols_for(&children, lower);
    lower.emit(Production::new(
        name,
        symbols,
        Some(deferred_builder(sequence_unpack())),
    ));
    Ok(())
}

fn sequence_unpack() -> Unpack {
    Rc::new(|raw, context| {
        let items = match raw {
            Raw::Seq(items) => items,
            _ => return Built::null(),
        };
        let mut values = Vec::with_capacity(items.len());
        let mut fields = Map::new();
        for item in items {
            let built = build_raw(item, context);
            values.push(built.value);
            merge_fields(&mut fields, built.fields);
        }
        Built {
            value: Value::Array(values),
            fields,
        }
    })
}

pub(crate) fn emit_optional(
    rule: &Rule,
    data: &CombData,
    name: &str,
    lower: &mut Lowerer,
) -> Result<(), GrammarError> {
    let children = data.resolved().to_vec();
    if children.is_empty() {
        return Err(GrammarError::EmptyCombinator("optional"));
    }
    let symbols = symbols_for(&children, lower);

    // Present branch first: the deterministic first-result policy then
    // prefers a consumed match over the empty one.
    lower.emit(Production::new(
        name,
        symbols,
        Some(deferred_builder(optional_present_unpack(children.len()))),
    ));
    lower.emit(Production::new(
        name,
        Vec::new(),
        Some(deferred_builder(optional_empty_unpack(
            rule.names().to_vec(),
        ))),
    ));
    Ok(())
}

fn optional_present_unpack(arity: usize) -> Unpack {
    Rc::new(move |raw, context| {
        let items = match raw {
            Raw::Seq(items) => items,
            _ => return Built::null(),
        };
        let mut values = Vec::with_capacity(items.len());
        let mut fields = Map::new();
        for item in items {
            let built = build_raw(item, context);
            values.push(built.value);
            merge_fields(&mut fields, built.fields);
        }
        let value = if arity == 1 {
            values.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(values)
        };
        Built { value, fields }
    })
}

fn optional_empty_unpack(names: Vec<String>) -> Unpack {
    Rc::new(move |_, _| {
        let mut fields = Map::new();
        for name in &names {
            fields.insert(name.clone(), Value::Null);
        }
        Built {
            value: Value::Null,
            fields,
        }
    })
}

pub(crate) fn emit_alternation(
    rule: &Rule,
    data: &CombData,
    name: &str,
    lower: &mut Lowerer,
) -> Result<(), GrammarError> {
    let children = data.resolved().to_vec();
    if children.is_empty() {
        return Err(GrammarError::EmptyCombinator("alternation"));
    }
    let all_names = rule.names().to_vec();
    for child in &children {
        let symbol = lower.symbol_for(child);
        let unpack = alternation_unpack(all_names.clone());
        lower.emit(Production::new(
            name,
            vec![symbol],
            Some(Rc::new(move |values| {
                let raw = values.into_iter().next().unwrap_or(Raw::Null);
                Raw::Deferred(Deferred::new(raw, unpack.clone()))
            })),
        ));
    }
    Ok(())
}

fn alternation_unpack(all_names: Vec<String>) -> Unpack {
    Rc::new(move |raw, context| {
        let built = build_raw(raw, context);
        let mut fields = built.fields;
        for name in &all_names {
            fields.entry(name.clone()).or_insert(Value::Null);
        }
        Built {
            value: built.value,
            fields,
        }
    })
}

pub(crate) fn emit_repetition(
    rule: &Rule,
    data: &CombData,
    name: &str,
    lower: &mut Lowerer,
) -> Result<(), GrammarError> {
    let children = data.resolved().to_vec();
    if children.is_empty() {
        return Err(GrammarError::EmptyCombinator("repetition"));
    }
    let chain = format!("{}_chain", name);
    let symbols = symbols_for(&children, lower);

    // The outer production wraps the finished chain in the deferred node.
    let unpack = repetition_unpack(children.len(), rule.names().to_vec());
    lower.emit(Production::new(
        name,
        vec![Symbol::NonTerminal(chain.clone())],
        Some(Rc::new(move |values| {
            let raw = values.into_iter().next().unwrap_or(Raw::Null);
            Raw::Deferred(Deferred::new(raw, unpack.clone()))
        })),
    ));

    // Left-recursive accumulation: each chain node is the previous chain
    // fragment (or a null end marker) followed by one repetition's
    // children. The unpack step unrolls this back into match order.
    let mut recursive = vec![Symbol::NonTerminal(chain.clone())];
    recursive.extend(symbols.iter().cloned());
    lower.emit(Production::new(
        &chain,
        recursive,
        Some(Rc::new(|values| Raw::Seq(values))),
    ));
    lower.emit(Production::new(
        &chain,
        symbols,
        Some(Rc::new(|values| {
            let mut items = vec![Raw::Null];
            items.extend(values);
            Raw::Seq(items)
        })),
    ));
    Ok(())
}

fn repetition_unpack(arity: usize, names: Vec<String>) -> Unpack {
    Rc::new(move |raw, context| {
        // Unroll the left-recursive chain: accumulation order is
        // last-matched-first, so collect groups then reverse.
        let mut groups: Vec<Vec<Raw>> = Vec::new();
        let mut cursor = raw.clone();
        loop {
            let items = match cursor {
                Raw::Seq(items) if !items.is_empty() => items,
                _ => break,
            };
            let mut rest = items.into_iter();
            let head = rest.next().unwrap_or(Raw::Null);
            groups.push(rest.collect());
            match head {
                Raw::Seq(_) => cursor = head,
                _ => break,
            }
        }
        groups.reverse();

        let mut values = Vec::with_capacity(groups.len());
        let mut per_name: Map<String, Value> = Map::new();
        for name in &names {
            per_name.insert(name.clone(), Value::Array(Vec::new()));
        }
        for group in &groups {
            let mut group_values = Vec::with_capacity(group.len());
            let mut group_fields = Map::new();
            for item in group {
                let built = build_raw(item, context);
                group_values.push(built.value);
                merge_fields(&mut group_fields, built.fields);
            }
            values.push(if arity == 1 {
                group_values.into_iter().next().unwrap_or(Value::Null)
            } else {
                Value::Array(group_values)
            });
            for name in &names {
                let entry = group_fields.remove(name).unwrap_or(Value::Null);
                if let Some(Value::Array(collected)) = per_name.get_mut(name) {
                    collected.push(entry);
                }
            }
        }
        Built {
            value: Value::Array(values),
            fields: per_name,
        }
    })
}

fn symbols_for(children: &[Rule], lower: &mut Lowerer) -> Vec<Symbol> {
    children.iter().map(|child| lower.symbol_for(child)).collect()
}
