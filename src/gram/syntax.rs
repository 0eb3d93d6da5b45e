//! Named Productions
//!
//! A [`Syntax`] is a named rule carrying one or more alternative
//! definitions, each optionally paired with a transform function. The
//! alternatives are registered as thunks and stored uninvoked; `populate`
//! materializes them idempotently the first time the graph is traversed.
//! Because a reference to a named production only needs its identity, two
//! productions can reference each other regardless of declaration order -
//! the thunks run at compile time, when both exist.
//!
//! At build time each alternative's matched value passes through an outer
//! unpack step: with a transform, the transform receives the alternative's
//! named fields, its value, and the caller's context, and its return value
//! becomes both the new value and the field keyed by the production's own
//! name. Without a transform the bare value passes through unchanged.

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;

use super::compiler::{compile, Lowerer};
use super::definition::Definition;
use super::error::GrammarError;
use super::parser::{ParseError, Parser};
use super::rule::{Rule, RuleKind};
use super::value::{build_raw, Built, Deferred, Raw, Unpack};
use crate::engine::grammar::Production;

/// Arguments handed to a transform function.
pub struct TransformArgs<'a> {
    /// The matched alternative's built value.
    pub value: &'a Value,
    /// Named fields contributed by the alternative's descendants.
    pub fields: &'a Map<String, Value>,
    /// The caller-supplied build context, passed through unchanged.
    pub context: &'a Value,
}

/// A transform applied to one alternative's match at build time.
pub type Transform = Rc<dyn Fn(&TransformArgs) -> Value>;

type Thunk = Rc<dyn Fn() -> Definition>;

struct Alternative {
    thunk: Thunk,
    transform: Option<Transform>,
}

#[derive(Clone)]
pub(crate) struct ResolvedAlternative {
    pub(crate) rule: Rule,
    pub(crate) transform: Option<Transform>,
}

/// Shared storage for a named production: registered alternatives plus the
/// rules materialized from them so far.
pub(crate) struct SyntaxData {
    name: String,
    alternatives: RefCell<Vec<Alternative>>,
    resolved: RefCell<Vec<ResolvedAlternative>>,
}

impl SyntaxData {
    fn new(name: String) -> Self {
        SyntaxData {
            name,
            alternatives: RefCell::new(Vec::new()),
            resolved: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Materialize any not-yet-resolved thunks, in registration order.
    ///
    /// Idempotent: the resolved list only ever grows up to the number of
    /// registered alternatives. No borrow is held while a thunk runs, so
    /// thunks may freely touch other productions.
    fn populate(&self) {
        loop {
            let next = {
                let alternatives = self.alternatives.borrow();
                let done = self.resolved.borrow().len();
                match alternatives.get(done) {
                    Some(alternative) => {
                        (alternative.thunk.clone(), alternative.transform.clone())
                    }
                    None => break,
                }
            };
            let rule = (next.0)().resolve();
            self.resolved.borrow_mut().push(ResolvedAlternative {
                rule,
                transform: next.1,
            });
        }
    }

    pub(crate) fn alternative_rules(&self) -> Vec<Rule> {
        self.populate();
        self.resolved
            .borrow()
            .iter()
            .map(|alternative| alternative.rule.clone())
            .collect()
    }

    fn resolved_alternatives(&self) -> Vec<ResolvedAlternative> {
        self.populate();
        self.resolved.borrow().clone()
    }

    #[cfg(test)]
    fn resolved_count(&self) -> usize {
        self.resolved.borrow().len()
    }
}

/// A named production supporting forward declaration and mutual recursion.
///
/// Cloning is cheap and preserves identity, so a production can be captured
/// by the thunks of other productions before its own alternatives exist.
#[derive(Clone)]
pub struct Syntax {
    name: String,
    rule: Rule,
    compiled: Rc<RefCell<Option<Rc<Parser>>>>,
}

impl Syntax {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Syntax {
            rule: Rule::new(RuleKind::Syntax(SyntaxData::new(name.clone()))),
            name,
            compiled: Rc::new(RefCell::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an alternative. The thunk is stored, not invoked; it runs
    /// when the grammar is compiled or first traversed.
    pub fn matches<D, F>(&self, thunk: F)
    where
        D: Into<Definition>,
        F: Fn() -> D + 'static,
    {
        self.register(Rc::new(move || thunk().into()), None);
    }

    /// Register an alternative with a transform applied at build time.
    pub fn matches_with<D, F, T>(&self, thunk: F, transform: T)
    where
        D: Into<Definition>,
        F: Fn() -> D + 'static,
        T: Fn(&TransformArgs) -> Value + 'static,
    {
        self.register(Rc::new(move || thunk().into()), Some(Rc::new(transform)));
    }

    fn register(&self, thunk: Thunk, transform: Option<Transform>) {
        if let RuleKind::Syntax(data) = self.rule.kind() {
            data.alternatives
                .borrow_mut()
                .push(Alternative { thunk, transform });
        }
        // A new alternative changes the grammar; drop any memoized parser.
        self.compiled.borrow_mut().take();
    }

    /// A definition referencing this production.
    pub fn def(&self) -> Definition {
        Definition::Rule(self.rule.clone())
    }

    pub(crate) fn rule(&self) -> Rule {
        self.rule.clone()
    }

    /// The compiled parser for this production as root, memoized on first
    /// request.
    pub fn parser(&self) -> Result<Rc<Parser>, GrammarError> {
        if let Some(parser) = self.compiled.borrow().as_ref() {
            return Ok(parser.clone());
        }
        let parser = Rc::new(compile(self)?);
        *self.compiled.borrow_mut() = Some(parser.clone());
        Ok(parser)
    }

    /// Compile (memoized) and parse in one call.
    pub fn parse(&self, context: &Value, input: &str) -> Result<Value, ParseError> {
        let parser = self.parser().map_err(ParseError::Grammar)?;
        parser.parse(context, input)
    }
}

pub(crate) fn emit_syntax(
    data: &SyntaxData,
    name: &str,
    lower: &mut Lowerer,
) -> Result<(), GrammarError> {
    let alternatives = data.resolved_alternatives();
    if alternatives.is_empty() {
        return Err(GrammarError::EmptySyntax(data.name().to_string()));
    }
    for alternative in alternatives {
        let symbol = lower.symbol_for(&alternative.rule);
        let unpack = syntax_unpack(data.name().to_string(), alternative.transform);
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

fn syntax_unpack(name: String, transform: Option<Transform>) -> Unpack {
    Rc::new(move |raw, context| {
        let inner = build_raw(raw, context);
        let value = match &transform {
            Some(apply) => apply(&TransformArgs {
                value: &inner.value,
                fields: &inner.fields,
                context,
            }),
            None => inner.value,
        };
        let mut fields = Map::new();
        fields.insert(name.clone(), value.clone());
        Built { value, fields }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gram::combinators::sequence;
    use crate::gram::definition::{lit, Definition};

    fn data_of(syntax: &Syntax) -> &SyntaxData {
        match syntax.rule.kind() {
            RuleKind::Syntax(data) => data,
            _ => panic!("syntax rule must carry syntax data"),
        }
    }

    #[test]
    fn test_thunks_are_not_invoked_at_registration() {
        let syntax = Syntax::new("word");
        syntax.matches(|| -> Definition { panic!("thunk must stay dormant until populate") });
        // Registration alone must not run the thunk.
        assert_eq!(data_of(&syntax).resolved_count(), 0);
    }

    #[test]
    fn test_populate_is_idempotent() {
        let syntax = Syntax::new("word");
        syntax.matches(|| lit("a"));
        let data = data_of(&syntax);
        data.populate();
        data.populate();
        assert_eq!(data.resolved_count(), 1);
    }

    #[test]
    fn test_alternatives_registered_after_populate_are_picked_up() {
        let syntax = Syntax::new("word");
        syntax.matches(|| lit("a"));
        data_of(&syntax).populate();
        syntax.matches(|| lit("b"));
        assert_eq!(data_of(&syntax).alternative_rules().len(), 2);
    }

    #[test]
    fn test_forward_reference_resolves_at_populate_time() {
        let outer = Syntax::new("outer");
        let inner = Syntax::new("inner");
        {
            let inner = inner.clone();
            outer.matches(move || sequence([lit("("), Definition::from(&inner), lit(")")]));
        }
        // `inner` gets its alternative only after `outer` referenced it.
        inner.matches(|| lit("x"));
        let children = outer.rule().children();
        assert_eq!(children.len(), 1);
        assert!(children[0].children()[1].same_rule(&inner.rule()));
    }
}
