//! Deferred Value Runtime
//!
//! Matching and building are two separate passes. During matching the engine
//! composes `Raw` fragments: token text, ordered sequences of child
//! fragments, and `Deferred` nodes pairing a fragment with the unpack step
//! that knows how to turn it into a semantic value. Nothing user-visible is
//! computed until `build` is called with a runtime context; only then do the
//! unpack steps run, bottom-up, invoking any transform functions registered
//! on named productions.
//!
//! A built value is a [`Built`] record: the main `value` plus the named
//! fields contributed by named-production descendants. The null sentinel for
//! absent branches and fields is `serde_json::Value::Null`.
//!
//! There is no caching across builds: building the same tree twice with the
//! same context re-evaluates every unpack step and yields equal results.

use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// A fragment captured during matching, before any build pass has run.
#[derive(Debug, Clone)]
pub enum Raw {
    /// Placeholder for an absent piece (empty optional branch, missing
    /// delimiter, empty list contents).
    Null,
    /// The text of a single matched token.
    Text(String),
    /// Ordered fragments captured by one production body.
    Seq(Vec<Raw>),
    /// A fragment paired with its unpack step, evaluated at build time.
    Deferred(Deferred),
}

impl Default for Raw {
    fn default() -> Self {
        Raw::Null
    }
}

/// The unpack step attached to a deferred fragment: given the fragment and a
/// runtime context, produce the built record.
pub type Unpack = Rc<dyn Fn(&Raw, &Value) -> Built>;

/// A build-on-demand node: a raw matched fragment plus its unpack function.
///
/// A deferred tree is owned by whoever obtained it from a parse; it holds no
/// back-reference to the grammar it came from.
#[derive(Clone)]
pub struct Deferred {
    raw: Rc<Raw>,
    unpack: Unpack,
}

impl Deferred {
    pub fn new(raw: Raw, unpack: Unpack) -> Self {
        Deferred {
            raw: Rc::new(raw),
            unpack,
        }
    }

    /// Evaluate this node against a runtime context.
    ///
    /// Children are built first (the unpack step calls [`build_raw`] on the
    /// fragments it holds), so user transforms run bottom-up.
    pub fn build(&self, context: &Value) -> Built {
        (self.unpack)(&self.raw, context)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// A fully built semantic value: the main `value` plus named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Built {
    /// The combinator's own value (array for sequences, record for lists,
    /// transform output for named productions, ...).
    pub value: Value,
    /// Named fields contributed by named-production descendants, in child
    /// order. Absent alternatives appear with a `Null` value.
    pub fields: Map<String, Value>,
}

impl Built {
    /// The empty-match record: null value, no fields.
    pub fn null() -> Self {
        Built {
            value: Value::Null,
            fields: Map::new(),
        }
    }

    /// A leaf record carrying only a value.
    pub fn leaf(value: Value) -> Self {
        Built {
            value,
            fields: Map::new(),
        }
    }

    /// Look up a named field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Build a raw fragment bottom-up against a runtime context.
///
/// Plain fragments build structurally: text becomes a string value, a
/// sequence becomes an array with its children's fields merged in child
/// order (later children win on a name clash). Deferred fragments delegate
/// to their unpack step.
pub fn build_raw(raw: &Raw, context: &Value) -> Built {
    match raw {
        Raw::Null => Built::null(),
        Raw::Text(text) => Built::leaf(Value::String(text.clone())),
        Raw::Seq(items) => {
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
        }
        Raw::Deferred(deferred) => deferred.build(context),
    }
}

/// Merge `incoming` into `fields`, later entries winning on a name clash.
pub(crate) fn merge_fields(fields: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (name, value) in incoming {
        fields.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_text_fragment() {
        let built = build_raw(&Raw::Text("hello".to_string()), &Value::Null);
        assert_eq!(built.value, json!("hello"));
        assert!(built.fields.is_empty());
    }

    #[test]
    fn test_build_null_fragment() {
        let built = build_raw(&Raw::Null, &Value::Null);
        assert_eq!(built.value, Value::Null);
    }

    #[test]
    fn test_build_seq_collects_values_in_order() {
        let raw = Raw::Seq(vec![
            Raw::Text("a".to_string()),
            Raw::Null,
            Raw::Text("b".to_string()),
        ]);
        let built = build_raw(&raw, &Value::Null);
        assert_eq!(built.value, json!(["a", null, "b"]));
    }

    #[test]
    fn test_deferred_receives_context() {
        let deferred = Deferred::new(
            Raw::Text("x".to_string()),
            Rc::new(|raw, context| {
                let inner = build_raw(raw, context);
                Built::leaf(json!({ "text": inner.value, "ctx": context }))
            }),
        );
        let built = deferred.build(&json!({ "lang": "en" }));
        assert_eq!(built.value, json!({ "text": "x", "ctx": { "lang": "en" } }));
    }

    #[test]
    fn test_build_twice_yields_equal_results() {
        let deferred = Deferred::new(
            Raw::Seq(vec![Raw::Text("a".to_string()), Raw::Text("b".to_string())]),
            Rc::new(|raw, context| build_raw(raw, context)),
        );
        let context = json!({ "n": 1 });
        assert_eq!(deferred.build(&context), deferred.build(&context));
    }

    #[test]
    fn test_seq_merges_fields_later_wins() {
        let make = |name: &str, value: Value| {
            let name = name.to_string();
            Raw::Deferred(Deferred::new(
                Raw::Null,
                Rc::new(move |_, _| {
                    let mut fields = Map::new();
                    fields.insert(name.clone(), value.clone());
                    Built {
                        value: Value::Null,
                        fields,
                    }
                }),
            ))
        };
        let raw = Raw::Seq(vec![make("k", json!(1)), make("k", json!(2))]);
        let built = build_raw(&raw, &Value::Null);
        assert_eq!(built.field("k"), Some(&json!(2)));
    }
}
