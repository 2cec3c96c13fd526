//! JSCN (JSON Schema Compact Notation) is a compact DSL that compiles to
//! JSON Schema draft-07. This crate is the compiler: a lexer and
//! recursive-descent parser produce an AST, a lowering engine turns that
//! AST into a JSON Schema document, and [`Schema`]/[`Definitions`] give
//! callers an algebraic API for combining schemas before lowering.
//!
//! ```
//! use jscn::Schema;
//!
//! let schema = Schema::new(r#"{name: string, age?: integer{0,_}}"#).unwrap();
//! let doc = schema.jsonschema().unwrap();
//! assert_eq!(doc["type"], "object");
//! ```

mod ast;
mod error;
mod lexer;
mod lower;
mod parser;
mod schema;

pub use ast::{
    ArrayRepeat, Cardinal, Defs, Keyword, NameConstraint, ObjectProperty, ObjectRestriction, Type,
};
pub use ast::{Definitions, Schema};
pub use error::{Error, Result};
pub use lower::lower_all_definitions;
