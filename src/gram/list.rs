//! Delimited List Combinator
//!
//! A separated element list, optionally enclosed by start/end delimiters,
//! with explicit whitespace matchers. Lowering generates three layers:
//!
//! 1. the outer production - `(start, ws, contents, end)` when enclosed,
//!    `(ws, contents)` otherwise
//! 2. `contents` - empty, `(elements, ws)`, or `(elements, ws, separator,
//!    ws)` for a trailing separator immediately before the end
//! 3. `elements` - a left-recursive chain `(elements, ws, separator, ws,
//!    element)` terminating in a single element
//!
//! The chain is left-recursive because that is the shape the matching
//! engine accepts efficiently; its natural accumulation order is
//! last-matched-first, so the build walk collects elements and separators
//! inward and reverses both arrays before exposing them.
//!
//! The built value is a fixed record: `start` (or null), `start_ws`,
//! `elements` (parse order), `separators`, `end_ws`, `end` (or null). An
//! empty list is a valid success value with empty `elements` and
//! `separators`. When a trailing separator was consumed it is appended to
//! `separators`, so `separators.len()` equals `elements.len()` in that case
//! and `elements.len() - 1` otherwise.

use serde_json::{Map, Value};
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use super::compiler::Lowerer;
use super::definition::Definition;
use super::error::GrammarError;
use super::rule::{Rule, RuleKind};
use super::value::{build_raw, merge_fields, Built, Deferred, Raw, Unpack};
use crate::engine::grammar::{Production, Symbol};

/// Shared storage for a list rule: the definitions as written plus the
/// child rules resolved once on first access.
pub(crate) struct ListData {
    start: Option<Definition>,
    whitespace: Definition,
    element: Definition,
    separator: Definition,
    end: Option<Definition>,
    resolved: OnceCell<ResolvedList>,
}

struct ResolvedList {
    start: Option<Rule>,
    whitespace: Rule,
    element: Rule,
    separator: Rule,
    end: Option<Rule>,
}

impl ListData {
    fn resolved(&self) -> &ResolvedList {
        self.resolved.get_or_init(|| ResolvedList {
            start: self.start.as_ref().map(Definition::resolve),
            whitespace: self.whitespace.resolve(),
            element: self.element.resolve(),
            separator: self.separator.resolve(),
            end: self.end.as_ref().map(Definition::resolve),
        })
    }

    /// Children in declaration order: start?, whitespace, element,
    /// separator, end?.
    pub(crate) fn child_rules(&self) -> Vec<Rule> {
        let resolved = self.resolved();
        let mut children = Vec::new();
        if let Some(start) = &resolved.start {
            children.push(start.clone());
        }
        children.push(resolved.whitespace.clone());
        children.push(resolved.element.clone());
        children.push(resolved.separator.clone());
        if let Some(end) = &resolved.end {
            children.push(end.clone());
        }
        children
    }
}

/// List without enclosing delimiters.
pub fn list(whitespace: Definition, element: Definition, separator: Definition) -> Rule {
    new_list(None, whitespace, element, separator, None)
}

/// List enclosed by start and end delimiters.
pub fn enclosed_list(
    start: Definition,
    whitespace: Definition,
    element: Definition,
    separator: Definition,
    end: Definition,
) -> Rule {
    new_list(Some(start), whitespace, element, separator, Some(end))
}

/// Core list constructor. Start and end delimiters must be given together;
/// a mismatch is a configuration error raised here, before any parse
/// attempt.
pub fn delimited(
    start: Option<Definition>,
    whitespace: Definition,
    element: Definition,
    separator: Definition,
    end: Option<Definition>,
) -> Result<Rule, GrammarError> {
    if start.is_some() != end.is_some() {
        return Err(GrammarError::MismatchedDelimiters);
    }
    Ok(new_list(start, whitespace, element, separator, end))
}

fn new_list(
    start: Option<Definition>,
    whitespace: Definition,
    element: Definition,
    separator: Definition,
    end: Option<Definition>,
) -> Rule {
    Rule::new(RuleKind::List(ListData {
        start,
        whitespace,
        element,
        separator,
        end,
        resolved: OnceCell::new(),
    }))
}

pub(crate) fn emit_list(
    rule: &Rule,
    data: &ListData,
    name: &str,
    lower: &mut Lowerer,
) -> Result<(), GrammarError> {
    let resolved = data.resolved();
    let ws = lower.symbol_for(&resolved.whitespace);
    let element = lower.symbol_for(&resolved.element);
    let separator = lower.symbol_for(&resolved.separator);
    let contents = format!("{}_contents", name);
    let elements = format!("{}_elements", name);

    let item_names = union_names(&resolved.element, &resolved.separator);
    let unpack = list_unpack(rule.names().to_vec(), item_names);

    // Outer production; both forms normalize to (start, ws, contents, end)
    // with null placeholders so one unpack step serves both.
    match (&resolved.start, &resolved.end) {
        (Some(start), Some(end)) => {
            let start = lower.symbol_for(start);
            let end = lower.symbol_for(end);
            let unpack = unpack.clone();
            lower.emit(Production::new(
                name,
                vec![start, ws.clone(), Symbol::NonTerminal(contents.clone()), end],
                Some(Rc::new(move |values| {
                    Raw::Deferred(Deferred::new(Raw::Seq(values), unpack.clone()))
                })),
            ));
        }
        _ => {
            let unpack = unpack.clone();
            lower.emit(Production::new(
                name,
                vec![ws.clone(), Symbol::NonTerminal(contents.clone())],
                Some(Rc::new(move |values| {
                    let mut items = vec![Raw::Null];
                    items.extend(values);
                    items.push(Raw::Null);
                    Raw::Deferred(Deferred::new(Raw::Seq(items), unpack.clone()))
                })),
            ));
        }
    }

    // Contents; every branch normalizes to (elements, end-ws, trailing
    // separator) with null placeholders.
    lower.emit(Production::new(
        &contents,
        Vec::new(),
        Some(Rc::new(|_| Raw::Seq(vec![Raw::Null, Raw::Null, Raw::Null]))),
    ));
    lower.emit(Production::new(
        &contents,
        vec![Symbol::NonTerminal(elements.clone()), ws.clone()],
        Some(Rc::new(|values| {
            let mut items = values;
            items.push(Raw::Null);
            Raw::Seq(items)
        })),
    ));
    lower.emit(Production::new(
        &contents,
        vec![
            Symbol::NonTerminal(elements.clone()),
            ws.clone(),
            separator.clone(),
            ws.clone(),
        ],
        Some(Rc::new(|values| {
            // (elements, ws, separator, ws) - the final ws is the end
            // whitespace; the one before the trailing separator is matched
            // but not exposed.
            let mut items = values.into_iter();
            let elements = items.next().unwrap_or(Raw::Null);
            let _inner_ws = items.next();
            let trailing = items.next().unwrap_or(Raw::Null);
            let end_ws = items.next().unwrap_or(Raw::Null);
            Raw::Seq(vec![elements, end_ws, trailing])
        })),
    ));

    // Elements chain: (previous | end marker, separator, element).
    lower.emit(Production::new(
        &elements,
        vec![element.clone()],
        Some(Rc::new(|values| {
            let mut items = vec![Raw::Null];
            items.extend(values);
            Raw::Seq(items)
        })),
    ));
    lower.emit(Production::new(
        &elements,
        vec![
            Symbol::NonTerminal(elements.clone()),
            ws.clone(),
            separator.clone(),
            ws,
            element,
        ],
        Some(Rc::new(|values| {
            let mut items = values.into_iter();
            let previous = items.next().unwrap_or(Raw::Null);
            let _ws_before = items.next();
            let separator = items.next().unwrap_or(Raw::Null);
            let _ws_after = items.next();
            let element = items.next().unwrap_or(Raw::Null);
            Raw::Seq(vec![previous, separator, element])
        })),
    ));
    Ok(())
}

fn union_names(element: &Rule, separator: &Rule) -> Vec<String> {
    let mut names: Vec<String> = element.names().to_vec();
    for name in separator.names() {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.clone());
        }
    }
    names
}

fn list_unpack(all_names: Vec<String>, item_names: Vec<String>) -> Unpack {
    Rc::new(move |raw, context| {
        let parts = match raw {
            Raw::Seq(parts) if parts.len() == 4 => parts,
            _ => return Built::null(),
        };
        let start = build_raw(&parts[0], context);
        let start_ws = build_raw(&parts[1], context);
        let end = build_raw(&parts[3], context);

        // Contents: (elements, end-ws, trailing separator).
        let null = Raw::Null;
        let (elements_raw, end_ws_raw, trailing_raw) = match &parts[2] {
            Raw::Seq(contents) if contents.len() == 3 => {
                (&contents[0], &contents[1], &contents[2])
            }
            _ => (&null, &null, &null),
        };
        let end_ws = build_raw(end_ws_raw, context);

        // Walk the left-recursive chain inward, then reverse into parse
        // order.
        let mut element_items: Vec<Built> = Vec::new();
        let mut separator_items: Vec<Built> = Vec::new();
        let mut cursor = elements_raw;
        loop {
            match cursor {
                Raw::Seq(link) if link.len() == 3 => {
                    element_items.push(build_raw(&link[2], context));
                    separator_items.push(build_raw(&link[1], context));
                    cursor = &link[0];
                }
                Raw::Seq(link) if link.len() == 2 => {
                    element_items.push(build_raw(&link[1], context));
                    break;
                }
                _ => break,
            }
        }
        element_items.reverse();
        separator_items.reverse();
        if !matches!(trailing_raw, Raw::Null) {
            separator_items.push(build_raw(trailing_raw, context));
        }

        // Fields: element/separator names collect as arrays in parse order;
        // delimiter and whitespace names merge directly.
        let mut fields = Map::new();
        merge_fields(&mut fields, start.fields.clone());
        merge_fields(&mut fields, start_ws.fields.clone());
        merge_fields(&mut fields, end_ws.fields.clone());
        merge_fields(&mut fields, end.fields.clone());
        for name in &item_names {
            let mut collected = Vec::new();
            for index in 0..element_items.len().max(separator_items.len()) {
                if let Some(item) = element_items.get(index) {
                    if let Some(value) = item.field(name) {
                        collected.push(value.clone());
                    }
                }
                if let Some(item) = separator_items.get(index) {
                    if let Some(value) = item.field(name) {
                        collected.push(value.clone());
                    }
                }
            }
            fields.insert(name.clone(), Value::Array(collected));
        }
        for name in &all_names {
            fields.entry(name.clone()).or_insert(Value::Null);
        }

        let record = serde_json::json!({
            "start": start.value,
            "start_ws": start_ws.value,
            "elements": element_items.iter().map(|item| item.value.clone()).collect::<Vec<_>>(),
            "separators": separator_items.iter().map(|item| item.value.clone()).collect::<Vec<_>>(),
            "end_ws": end_ws.value,
            "end": end.value,
        });
        Built {
            value: record,
            fields,
        }
    })
}
