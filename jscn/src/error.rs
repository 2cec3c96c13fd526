//! Public error type for the JSCN compiler.

/// The expected-token set reported by a [`Error::Parse`].
///
/// Kept as a plain string rather than a structured set: the grammar is
/// small enough that a hand-written description reads better than a
/// programmatically joined token list.
pub type ExpectedSet = Box<str>;

/// Errors produced while lexing, parsing, or lowering JSCN source.
///
/// Every variant carries enough location information (a byte offset into
/// the source, or a definition name) for a caller to build a readable
/// diagnostic. No variant is ever partially surfaced alongside a partial
/// schema: a failing operation returns before constructing any output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An unrecognized character or unterminated literal.
    #[error("lex error at byte {offset}: {message}")]
    Lex { offset: usize, message: Box<str> },

    /// A token sequence that does not match the grammar.
    #[error("parse error at byte {offset}: expected {expected}")]
    Parse {
        offset: usize,
        expected: ExpectedSet,
    },

    /// A `<name>` reference with no matching `where` definition.
    #[error("unresolved reference to definition `{name}`")]
    UnresolvedReference { name: Box<str> },

    /// Merging two definition sets where a shared name binds to
    /// structurally different types.
    #[error("definition `{name}` is bound to conflicting types")]
    DefinitionConflict { name: Box<str> },

    /// A cardinal (`{min, max}`) with `min > max`, or a negative bound.
    #[error("invalid cardinal at byte {offset}: {message}")]
    InvalidCardinal { offset: usize, message: Box<str> },

    /// The same literal key declared twice in one object body.
    #[error("duplicate property `{name}` at byte {offset}")]
    DuplicateProperty { offset: usize, name: Box<str> },
}

impl Error {
    pub(crate) fn lex(offset: usize, message: impl Into<String>) -> Self {
        Error::Lex {
            offset,
            message: message.into().into_boxed_str(),
        }
    }

    pub(crate) fn parse(offset: usize, expected: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            expected: expected.into().into_boxed_str(),
        }
    }

    pub(crate) fn invalid_cardinal(offset: usize, message: impl Into<String>) -> Self {
        Error::InvalidCardinal {
            offset,
            message: message.into().into_boxed_str(),
        }
    }

    pub(crate) fn duplicate_property(offset: usize, name: impl Into<String>) -> Self {
        Error::DuplicateProperty {
            offset,
            name: name.into().into_boxed_str(),
        }
    }

    pub(crate) fn unresolved_reference(name: impl Into<String>) -> Self {
        Error::UnresolvedReference {
            name: name.into().into_boxed_str(),
        }
    }

    pub(crate) fn definition_conflict(name: impl Into<String>) -> Self {
        Error::DefinitionConflict {
            name: name.into().into_boxed_str(),
        }
    }
}

/// Result alias for fallible compiler operations.
pub type Result<T> = std::result::Result<T, Error>;
