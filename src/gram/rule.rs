//! Rule Graph Core
//!
//! Every combinator instance is a [`Rule`]: a cheap-clone handle over shared
//! node storage. Identity is per instance (pointer identity), not
//! structural: two separately constructed but identical sequences are
//! distinct rules, and only terminal matchers are ever collapsed by value
//! (during lowering, never here).
//!
//! Rules are immutable after construction except for lazily populated,
//! memoized derived state: the resolved child list and the contributed
//! field-name list. Both are explicit set-once cells computed at most once
//! from immutable inputs, so repeated access is cheap and deterministic.

use once_cell::unsync::OnceCell;
use std::fmt;
use std::rc::Rc;

use super::definition::Definition;
use super::list::ListData;
use super::syntax::SyntaxData;

/// One node in the combinator graph.
///
/// Cloning is cheap and preserves identity; use [`Rule::same_rule`] to
/// compare instances.
#[derive(Clone)]
pub struct Rule {
    node: Rc<RuleNode>,
}

pub(crate) struct RuleNode {
    kind: RuleKind,
    names: OnceCell<Vec<String>>,
}

/// The closed set of rule kinds.
pub(crate) enum RuleKind {
    /// Matches one token equal to a fixed string.
    Literal { text: String },
    /// Matches one token produced by a regular-expression class.
    Pattern { source: String },
    /// Matches one token of an externally defined type.
    TokenRef { name: String },
    /// Matches its definitions in order.
    Sequence(CombData),
    /// Matches its definitions in order, or nothing.
    Optional(CombData),
    /// Matches exactly one of its definitions.
    Alternation(CombData),
    /// Matches one or more repetitions of its definitions in order.
    Repetition(CombData),
    /// Matches a separated element list, optionally enclosed by delimiters.
    List(ListData),
    /// A named production with lazily materialized alternatives.
    Syntax(SyntaxData),
}

/// Shared storage for the definition-list combinators: the definitions as
/// written, plus the child rules resolved once on first access.
pub(crate) struct CombData {
    defs: Vec<Definition>,
    resolved: OnceCell<Vec<Rule>>,
}

impl CombData {
    pub(crate) fn new(defs: Vec<Definition>) -> Self {
        CombData {
            defs,
            resolved: OnceCell::new(),
        }
    }

    /// Child rules, resolving the definitions on first access.
    pub(crate) fn resolved(&self) -> &[Rule] {
        self.resolved
            .get_or_init(|| self.defs.iter().map(Definition::resolve).collect())
    }
}

impl Rule {
    pub(crate) fn new(kind: RuleKind) -> Self {
        Rule {
            node: Rc::new(RuleNode {
                kind,
                names: OnceCell::new(),
            }),
        }
    }

    pub(crate) fn literal(text: String) -> Self {
        Rule::new(RuleKind::Literal { text })
    }

    pub(crate) fn pattern(source: String) -> Self {
        Rule::new(RuleKind::Pattern { source })
    }

    pub(crate) fn token_ref(name: String) -> Self {
        Rule::new(RuleKind::TokenRef { name })
    }

    pub(crate) fn kind(&self) -> &RuleKind {
        &self.node.kind
    }

    /// Identity key for visited sets and per-compilation name tables.
    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.node) as usize
    }

    /// Whether two handles refer to the same rule instance.
    pub fn same_rule(&self, other: &Rule) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Short tag for this rule's kind, used as the stem of generated
    /// production names.
    pub(crate) fn kind_name(&self) -> &'static str {
        match &self.node.kind {
            RuleKind::Literal { .. } => "literal",
            RuleKind::Pattern { .. } => "pattern",
            RuleKind::TokenRef { .. } => "token",
            RuleKind::Sequence(_) => "sequence",
            RuleKind::Optional(_) => "optional",
            RuleKind::Alternation(_) => "alternation",
            RuleKind::Repetition(_) => "repetition",
            RuleKind::List(_) => "list",
            RuleKind::Syntax(_) => "syntax",
        }
    }

    /// Child rules in declaration order. Terminals have none; named
    /// productions materialize their alternatives on first access.
    pub fn children(&self) -> Vec<Rule> {
        match &self.node.kind {
            RuleKind::Literal { .. } | RuleKind::Pattern { .. } | RuleKind::TokenRef { .. } => {
                Vec::new()
            }
            RuleKind::Sequence(data)
            | RuleKind::Optional(data)
            | RuleKind::Alternation(data)
            | RuleKind::Repetition(data) => data.resolved().to_vec(),
            RuleKind::List(data) => data.child_rules(),
            RuleKind::Syntax(data) => data.alternative_rules(),
        }
    }

    /// Field names this rule contributes to enclosing combinators, memoized
    /// on first access.
    ///
    /// Structural combinators contribute the union of their children's
    /// names in child order; a named production contributes exactly its own
    /// name (it is a field boundary, which also keeps this computation
    /// finite across mutually recursive productions); terminals contribute
    /// nothing.
    pub fn names(&self) -> &[String] {
        self.node.names.get_or_init(|| self.compute_names())
    }

    fn compute_names(&self) -> Vec<String> {
        match &self.node.kind {
            RuleKind::Literal { .. } | RuleKind::Pattern { .. } | RuleKind::TokenRef { .. } => {
                Vec::new()
            }
            RuleKind::Syntax(data) => vec![data.name().to_string()],
            _ => union_of_child_names(&self.children()),
        }
    }
}

/// Union of the children's contributed names, first occurrence wins.
fn union_of_child_names(children: &[Rule]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for child in children {
        for name in child.names() {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.clone());
            }
        }
    }
    names
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node.kind {
            RuleKind::Literal { text } => write!(f, "Literal({:?})", text),
            RuleKind::Pattern { source } => write!(f, "Pattern({:?})", source),
            RuleKind::TokenRef { name } => write!(f, "TokenRef({:?})", name),
            RuleKind::Syntax(data) => write!(f, "Syntax({:?})", data.name()),
            _ => write!(f, "{}", self.kind_name()),
        }
    }
}
