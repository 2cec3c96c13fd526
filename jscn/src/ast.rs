//! The JSCN abstract syntax tree.
//!
//! A single tagged sum per grammar production (see `jscn::parser` for the
//! grammar), immutable after construction. Structural `PartialEq` is
//! derived throughout: spec-level "AST-equal" comparisons (parser
//! determinism, definition-merge equality) are just `==` on these types.

use indexmap::IndexMap;
use serde_json::Value as Json;

/// A `{min, max}` bound; `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cardinal {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// The bare keyword types that carry no extra data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Boolean,
    Number,
    Null,
    Object,
    Array,
    Forbidden,
}

/// A key-name constraint used by [`ObjectRestriction`]: either a regex or
/// a reference to a named definition.
#[derive(Debug, Clone, PartialEq)]
pub enum NameConstraint {
    Regex(String),
    Ref(String),
}

/// What an object body says about properties beyond the ones it lists.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRestriction {
    /// No `only` clause: extra properties are allowed, unconstrained.
    None,
    /// `only` with no name/value clause: no extra properties allowed.
    OnlyListed,
    /// `only <constraint>`: extra properties' keys must satisfy the
    /// constraint; their values are unconstrained.
    OnlyNames(NameConstraint),
    /// `only <constraint-or-wildcard>: T`: extra properties' values must
    /// have type `T`; `None` for the constraint means the wildcard `_`
    /// (any key name).
    OnlyKV(Option<NameConstraint>, Box<Type>),
}

/// One declared property of an [`Type::Object`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: String,
    pub optional: bool,
    pub value: Type,
}

/// How the trailing item of an array type behaves.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayRepeat {
    /// No trailing repeat: the listed item types are the whole tuple.
    Closed,
    /// Trailing `*`: zero or more items of the given type follow the
    /// listed prefix (or are the whole array, if the prefix is empty).
    ZeroOrMore(Box<Type>),
    /// Trailing `+`: one or more items of the given type follow the
    /// listed prefix (or are the whole array, if the prefix is empty).
    OneOrMore(Box<Type>),
}

/// A JSCN type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A back-quoted or bare-string JSON scalar, literal, object or array.
    Literal(Json),
    /// A chain of `|`-joined literals, detected structurally while
    /// parsing (see `parser::parse_or`), lowered to a JSON Schema `enum`.
    Enum(Vec<Json>),
    Keyword(Keyword),
    /// `string` with an optional `{min, max}` char-count cardinal.
    Str(Cardinal),
    /// `integer` with an optional `{min, max}` cardinal and/or an
    /// optional `multipleOf` divisor (the grammar allows only one of the
    /// two per atom; both populated only via `&`-merged `AllOf` nodes).
    IntegerCard {
        min: Option<i64>,
        max: Option<i64>,
        multiple_of: Option<i64>,
    },
    /// `r"..."` — verbatim regex pattern.
    Regex(String),
    /// `f"..."` — verbatim format name.
    Format(String),
    /// `<name>` — a reference to a `where`-bound definition.
    Ref(String),
    Not(Box<Type>),
    /// Flattened, left-associative `&` chain.
    AllOf(Vec<Type>),
    /// Flattened, left-associative `|` chain whose children are not all
    /// literals (otherwise it would have been an [`Type::Enum`]).
    AnyOf(Vec<Type>),
    /// `if C0 then T0 (elif Ci then Ti)* (else E)?`, kept as an ordered
    /// list of branches plus an optional final `else`, lowered
    /// right-associatively (see `lower::lower_conditional`).
    Conditional {
        branches: Vec<(Type, Type)>,
        else_branch: Option<Box<Type>>,
    },
    Object {
        properties: Vec<ObjectProperty>,
        restriction: ObjectRestriction,
        cardinal: Cardinal,
    },
    Array {
        items: Vec<Type>,
        repeat: ArrayRepeat,
        only: bool,
        unique: bool,
        cardinal: Cardinal,
    },
}

/// An ordered map from definition name to bound type, preserving
/// declaration order end to end (spec requires insertion-order-stable
/// `definitions` output).
pub type Defs = IndexMap<String, Type>;

/// A compiled top-level schema: a root type plus its `where`-bound
/// definitions (which may be a superset of what the root actually
/// reaches — see `jscn::lower` for reachability pruning).
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub root: Type,
    pub defs: Defs,
}

/// A standalone `where`-clause, with no root type of its own; used to
/// build up shared definitions that are later combined with a `Schema`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Definitions {
    pub defs: Defs,
}
