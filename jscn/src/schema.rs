//! The embeddable, algebraic half of the library: constructors, accessors,
//! and `&`/`|` operators on [`Schema`] and [`Definitions`], which combine
//! the way two JSON Schema documents combine under `allOf`/`anyOf`, merging
//! their `where` clauses along the way.

use std::ops::{BitAnd, BitOr};

use serde_json::Value as Json;

use crate::ast::{Defs, Definitions, Schema, Type};
use crate::error::{Error, Result};
use crate::lower;
use crate::parser;

/// Merges `b`'s entries into `a`. A name present in both must bind to
/// structurally equal types (structural `PartialEq` on the AST); a
/// mismatch is an [`Error::DefinitionConflict`]. Left side's names keep
/// their order; right-side names not already present are appended in
/// their own order.
fn merge_defs(a: &Defs, b: &Defs) -> Result<Defs> {
    let mut merged = a.clone();
    for (name, ty) in b {
        match merged.get(name) {
            Some(existing) if existing == ty => {}
            Some(_) => return Err(Error::definition_conflict(name.clone())),
            None => {
                merged.insert(name.clone(), ty.clone());
            }
        }
    }
    Ok(merged)
}

impl Schema {
    /// Parses `src` as a full `schema` production (a root type with an
    /// optional `where`-clause).
    pub fn new(src: &str) -> Result<Self> {
        parser::parse_schema(src)
    }

    /// The root type expression, before lowering.
    pub fn root_type(&self) -> &Type {
        &self.root
    }

    /// The full set of declared definitions, including any not reachable
    /// from the root type.
    pub fn definitions(&self) -> &Defs {
        &self.defs
    }

    /// Lowers this schema to a JSON Schema draft-07 document. Unresolved
    /// references are only reported here, at the point a definition is
    /// actually reached while lowering the root — not at parse or
    /// combination time.
    pub fn jsonschema(&self) -> Result<Json> {
        lower::lower_schema(self)
    }
}

impl Definitions {
    /// Parses `src` as a standalone `definitions` production.
    pub fn new(src: &str) -> Result<Self> {
        parser::parse_definitions(src)
    }

    /// The names bound by this definition set, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }
}

impl BitOr for Schema {
    type Output = Result<Schema>;

    /// `a | b`: the root becomes `anyOf: [a.root, b.root]`; definitions
    /// from both sides are merged.
    fn bitor(self, rhs: Schema) -> Result<Schema> {
        Ok(Schema {
            root: Type::AnyOf(vec![self.root, rhs.root]),
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitAnd for Schema {
    type Output = Result<Schema>;

    /// `a & b`: the root becomes `allOf: [a.root, b.root]`; definitions
    /// from both sides are merged.
    fn bitand(self, rhs: Schema) -> Result<Schema> {
        Ok(Schema {
            root: Type::AllOf(vec![self.root, rhs.root]),
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitOr<Definitions> for Schema {
    type Output = Result<Schema>;

    /// `schema | defs`: the root is unchanged; `defs`'s definitions are
    /// merged in.
    fn bitor(self, rhs: Definitions) -> Result<Schema> {
        Ok(Schema {
            root: self.root,
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitAnd<Definitions> for Schema {
    type Output = Result<Schema>;

    fn bitand(self, rhs: Definitions) -> Result<Schema> {
        Ok(Schema {
            root: self.root,
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitOr<Schema> for Definitions {
    type Output = Result<Schema>;

    fn bitor(self, rhs: Schema) -> Result<Schema> {
        Ok(Schema {
            root: rhs.root,
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitAnd<Schema> for Definitions {
    type Output = Result<Schema>;

    fn bitand(self, rhs: Schema) -> Result<Schema> {
        Ok(Schema {
            root: rhs.root,
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitOr for Definitions {
    type Output = Result<Definitions>;

    /// `a | b`: no root on either side, so the combination is just the
    /// merged `where` clause.
    fn bitor(self, rhs: Definitions) -> Result<Definitions> {
        Ok(Definitions {
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}

impl BitAnd for Definitions {
    type Output = Result<Definitions>;

    fn bitand(self, rhs: Definitions) -> Result<Definitions> {
        Ok(Definitions {
            defs: merge_defs(&self.defs, &rhs.defs)?,
        })
    }
}
