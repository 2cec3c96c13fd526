//! Recursive-descent parser over the JSCN grammar (spec §6.1).
//!
//! Precedence, lowest to highest: `|`, `&`, `not`, atom. `|` and `&` are
//! left-associative and flatten nested chains into a single `AnyOf`/`AllOf`
//! as they parse, rather than in a later normalization pass.

use serde_json::Value as Json;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenKind};

const RESERVED: &[&str] = &[
    "boolean", "string", "integer", "number", "null", "object", "array", "forbidden", "only",
    "unique", "not", "where", "and", "if", "then", "elif", "else",
];

fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// Parses a full `schema` production: a root type plus an optional
/// `where`-clause of definitions.
pub fn parse_schema(src: &str) -> Result<Schema> {
    let mut p = Parser::new(src)?;
    let root = p.parse_type()?;
    let defs = if p.is_ident("where") {
        p.bump()?;
        p.parse_definitions_list()?
    } else {
        Defs::new()
    };
    p.expect_eof()?;
    Ok(Schema { root, defs })
}

/// Parses a standalone `definitions` production (no leading type, no
/// `where` keyword) — used by the `Definitions` embedded-API constructor.
pub fn parse_definitions(src: &str) -> Result<Definitions> {
    let mut p = Parser::new(src)?;
    let defs = p.parse_definitions_list()?;
    p.expect_eof()?;
    Ok(Definitions { defs })
}

struct Parser<'a> {
    #[allow(dead_code)]
    src: &'a str,
    lexer: Lexer<'a>,
    tok: Token,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(src);
        let tok = lexer.next_token()?;
        Ok(Self { src, lexer, tok })
    }

    fn bump(&mut self) -> Result<()> {
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn offset(&self) -> usize {
        self.tok.span.start
    }

    fn is_symbol(&self, c: char) -> bool {
        matches!(self.tok.kind, TokenKind::Symbol(x) if x == c)
    }

    fn is_ident(&self, word: &str) -> bool {
        matches!(&self.tok.kind, TokenKind::Ident(t) if t == word)
    }

    fn expected(&self, what: &str) -> Error {
        Error::parse(self.offset(), what)
    }

    fn expected_at(&self, offset: usize, what: &str) -> Error {
        Error::parse(offset, what)
    }

    fn expect_symbol(&mut self, c: char) -> Result<()> {
        if self.is_symbol(c) {
            self.bump()
        } else {
            Err(self.expected(&format!("`{c}`")))
        }
    }

    fn expect_ident(&mut self, word: &str) -> Result<()> {
        if self.is_ident(word) {
            self.bump()
        } else {
            Err(self.expected(&format!("`{word}`")))
        }
    }

    fn expect_eof(&self) -> Result<()> {
        if matches!(self.tok.kind, TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.expected("end of input"))
        }
    }

    /// A plain `ident` production: an identifier that is not a reserved
    /// keyword.
    fn parse_plain_ident(&mut self) -> Result<String> {
        match self.tok.kind.clone() {
            TokenKind::Ident(name) if !is_reserved(&name) => {
                self.bump()?;
                Ok(name)
            }
            TokenKind::Ident(name) => Err(Error::parse(
                self.offset(),
                format!("an identifier (found reserved word `{name}`)"),
            )),
            _ => Err(self.expected("an identifier")),
        }
    }

    fn parse_definitions_list(&mut self) -> Result<Defs> {
        let mut defs = Defs::new();
        loop {
            let offset = self.offset();
            let name = self.parse_plain_ident()?;
            self.expect_symbol('=')?;
            let ty = self.parse_type()?;
            if defs.insert(name.clone(), ty).is_some() {
                return Err(Error::parse(
                    offset,
                    format!("a unique name (`{name}` is already defined)"),
                ));
            }
            if self.is_ident("and") {
                self.bump()?;
                continue;
            }
            break;
        }
        Ok(defs)
    }

    // type ::= or_expr
    fn parse_type(&mut self) -> Result<Type> {
        self.parse_or()
    }

    // or_expr ::= and_expr ("|" and_expr)*
    fn parse_or(&mut self) -> Result<Type> {
        let mut items = vec![self.parse_and()?];
        while self.is_symbol('|') {
            self.bump()?;
            items.push(self.parse_and()?);
        }
        if items.len() == 1 {
            return Ok(items.pop().expect("non-empty"));
        }

        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Type::AnyOf(children) => flat.extend(children),
                Type::Enum(values) => flat.extend(values.into_iter().map(Type::Literal)),
                other => flat.push(other),
            }
        }

        match try_collect_literals(&flat) {
            Some(values) => Ok(Type::Enum(values)),
            None => Ok(Type::AnyOf(flat)),
        }
    }

    // and_expr ::= not_expr ("&" not_expr)*
    fn parse_and(&mut self) -> Result<Type> {
        let mut items = vec![self.parse_not()?];
        while self.is_symbol('&') {
            self.bump()?;
            items.push(self.parse_not()?);
        }
        if items.len() == 1 {
            return Ok(items.pop().expect("non-empty"));
        }

        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Type::AllOf(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        Ok(Type::AllOf(flat))
    }

    // not_expr ::= "not" not_expr | atom
    fn parse_not(&mut self) -> Result<Type> {
        if self.is_ident("not") {
            self.bump()?;
            let inner = self.parse_not()?;
            Ok(Type::Not(Box::new(inner)))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> Result<Type> {
        match self.tok.kind.clone() {
            TokenKind::Symbol('(') => {
                self.bump()?;
                let ty = self.parse_type()?;
                self.expect_symbol(')')?;
                Ok(ty)
            }
            TokenKind::Symbol('<') => {
                self.bump()?;
                let name = self.parse_plain_ident()?;
                self.expect_symbol('>')?;
                Ok(Type::Ref(name))
            }
            TokenKind::Symbol('{') => self.parse_object(),
            TokenKind::Symbol('[') => self.parse_array(),
            TokenKind::Json(value) => {
                self.bump()?;
                Ok(Type::Literal(value))
            }
            TokenKind::Regex(pattern) => {
                self.bump()?;
                Ok(Type::Regex(pattern))
            }
            TokenKind::Format(name) => {
                self.bump()?;
                Ok(Type::Format(name))
            }
            TokenKind::Ident(word) => match word.as_str() {
                "if" => self.parse_conditional(),
                "boolean" => {
                    self.bump()?;
                    Ok(Type::Keyword(Keyword::Boolean))
                }
                "number" => {
                    self.bump()?;
                    Ok(Type::Keyword(Keyword::Number))
                }
                "null" => {
                    self.bump()?;
                    Ok(Type::Keyword(Keyword::Null))
                }
                "object" => {
                    self.bump()?;
                    Ok(Type::Keyword(Keyword::Object))
                }
                "array" => {
                    self.bump()?;
                    Ok(Type::Keyword(Keyword::Array))
                }
                "forbidden" => {
                    self.bump()?;
                    Ok(Type::Keyword(Keyword::Forbidden))
                }
                "string" => {
                    self.bump()?;
                    let cardinal = self.parse_optional_cardinal()?;
                    Ok(Type::Str(cardinal))
                }
                "integer" => {
                    self.bump()?;
                    if self.is_symbol('/') {
                        self.bump()?;
                        let offset = self.offset();
                        let TokenKind::Int(n) = self.tok.kind else {
                            return Err(self.expected("an integer divisor"));
                        };
                        self.bump()?;
                        if n <= 0 {
                            return Err(Error::invalid_cardinal(
                                offset,
                                "multipleOf must be positive",
                            ));
                        }
                        Ok(Type::IntegerCard {
                            min: None,
                            max: None,
                            multiple_of: Some(n),
                        })
                    } else {
                        let cardinal = self.parse_optional_cardinal()?;
                        Ok(Type::IntegerCard {
                            min: cardinal.min,
                            max: cardinal.max,
                            multiple_of: None,
                        })
                    }
                }
                _ => Err(self.expected("a type")),
            },
            _ => Err(self.expected("a type")),
        }
    }

    fn parse_conditional(&mut self) -> Result<Type> {
        self.expect_ident("if")?;
        let mut branches = vec![];
        loop {
            let cond = self.parse_type()?;
            self.expect_ident("then")?;
            let then_ty = self.parse_type()?;
            branches.push((cond, then_ty));
            if self.is_ident("elif") {
                self.bump()?;
                continue;
            }
            break;
        }
        let else_branch = if self.is_ident("else") {
            self.bump()?;
            Some(Box::new(self.parse_type()?))
        } else {
            None
        };
        Ok(Type::Conditional {
            branches,
            else_branch,
        })
    }

    fn parse_object(&mut self) -> Result<Type> {
        self.expect_symbol('{')?;
        let restriction = if self.is_ident("only") {
            self.bump()?;
            self.parse_restriction_tail()?
        } else {
            ObjectRestriction::None
        };

        let mut properties = vec![];
        let mut seen = std::collections::HashSet::new();
        if !self.is_symbol('}') {
            loop {
                let offset = self.offset();
                let prop = self.parse_object_property()?;
                if !seen.insert(prop.key.clone()) {
                    return Err(Error::duplicate_property(offset, prop.key));
                }
                properties.push(prop);
                if self.is_symbol(',') {
                    self.bump()?;
                    if self.is_symbol('}') {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect_symbol('}')?;
        let cardinal = self.parse_optional_cardinal()?;
        Ok(Type::Object {
            properties,
            restriction,
            cardinal,
        })
    }

    fn parse_restriction_tail(&mut self) -> Result<ObjectRestriction> {
        match self.tok.kind.clone() {
            TokenKind::Regex(pattern) => {
                self.bump()?;
                self.finish_restriction(NameConstraint::Regex(pattern))
            }
            TokenKind::Symbol('<') => {
                self.bump()?;
                let name = self.parse_plain_ident()?;
                self.expect_symbol('>')?;
                self.finish_restriction(NameConstraint::Ref(name))
            }
            TokenKind::Ident(word) if word == "_" => {
                self.bump()?;
                self.expect_symbol(':')?;
                let ty = self.parse_type()?;
                Ok(ObjectRestriction::OnlyKV(None, Box::new(ty)))
            }
            _ => Ok(ObjectRestriction::OnlyListed),
        }
    }

    fn finish_restriction(&mut self, nc: NameConstraint) -> Result<ObjectRestriction> {
        if self.is_symbol(':') {
            self.bump()?;
            let ty = self.parse_type()?;
            Ok(ObjectRestriction::OnlyKV(Some(nc), Box::new(ty)))
        } else {
            Ok(ObjectRestriction::OnlyNames(nc))
        }
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty> {
        let key = match self.tok.kind.clone() {
            TokenKind::Ident(name) if !is_reserved(&name) => {
                self.bump()?;
                name
            }
            TokenKind::Ident(name) => {
                return Err(Error::parse(
                    self.offset(),
                    format!("a property name (reserved word `{name}` must be quoted)"),
                ))
            }
            TokenKind::Json(Json::String(s)) => {
                self.bump()?;
                s
            }
            _ => return Err(self.expected("a property name")),
        };
        let optional = if self.is_symbol('?') {
            self.bump()?;
            true
        } else {
            false
        };
        self.expect_symbol(':')?;
        let value = self.parse_type()?;
        Ok(ObjectProperty {
            key,
            optional,
            value,
        })
    }

    fn parse_array(&mut self) -> Result<Type> {
        self.expect_symbol('[')?;
        let only = if self.is_ident("only") {
            self.bump()?;
            true
        } else {
            false
        };
        let unique = if self.is_ident("unique") {
            self.bump()?;
            true
        } else {
            false
        };

        let mut items = vec![];
        if !self.is_symbol(']') && !self.is_symbol('*') && !self.is_symbol('+') {
            items.push(self.parse_type()?);
            while self.is_symbol(',') {
                self.bump()?;
                items.push(self.parse_type()?);
            }
        }

        let repeat_offset = self.offset();
        let repeat_star = if self.is_symbol('*') {
            self.bump()?;
            Some(true)
        } else if self.is_symbol('+') {
            self.bump()?;
            Some(false)
        } else {
            None
        };
        if only && repeat_star.is_some() {
            return Err(self.expected_at(
                repeat_offset,
                "`]` (`only` forbids a `*`/`+` repeat tail)",
            ));
        }

        self.expect_symbol(']')?;
        let cardinal = self.parse_optional_cardinal()?;

        let repeat = match repeat_star {
            None => ArrayRepeat::Closed,
            Some(zero_or_more) => {
                let last = items
                    .pop()
                    .ok_or_else(|| self.expected("an item type before `*` or `+`"))?;
                if zero_or_more {
                    ArrayRepeat::ZeroOrMore(Box::new(last))
                } else {
                    ArrayRepeat::OneOrMore(Box::new(last))
                }
            }
        };

        Ok(Type::Array {
            items,
            repeat,
            only,
            unique,
            cardinal,
        })
    }

    fn parse_optional_cardinal(&mut self) -> Result<Cardinal> {
        if !self.is_symbol('{') {
            return Ok(Cardinal::default());
        }
        let offset = self.offset();
        self.bump()?;
        let first = self.parse_cardinal_bound()?;

        if self.is_symbol('}') {
            self.bump()?;
            let Some(n) = first else {
                return Err(self.expected("an integer"));
            };
            return validate_cardinal(
                Cardinal {
                    min: Some(n),
                    max: Some(n),
                },
                offset,
            );
        }

        self.expect_symbol(',')?;
        let second = self.parse_cardinal_bound()?;
        self.expect_symbol('}')?;
        validate_cardinal(
            Cardinal {
                min: first,
                max: second,
            },
            offset,
        )
    }

    fn parse_cardinal_bound(&mut self) -> Result<Option<i64>> {
        match self.tok.kind.clone() {
            TokenKind::Ident(word) if word == "_" => {
                self.bump()?;
                Ok(None)
            }
            TokenKind::Int(n) => {
                self.bump()?;
                Ok(Some(n))
            }
            _ => Err(self.expected("an integer or `_`")),
        }
    }
}

fn try_collect_literals(items: &[Type]) -> Option<Vec<Json>> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Type::Literal(v) => values.push(v.clone()),
            Type::Enum(vs) => values.extend(vs.iter().cloned()),
            _ => return None,
        }
    }
    Some(values)
}

fn validate_cardinal(c: Cardinal, offset: usize) -> Result<Cardinal> {
    if c.min.is_some_and(|m| m < 0) || c.max.is_some_and(|m| m < 0) {
        return Err(Error::invalid_cardinal(
            offset,
            "bound must not be negative",
        ));
    }
    if let (Some(min), Some(max)) = (c.min, c.max) {
        if min > max {
            return Err(Error::invalid_cardinal(
                offset,
                format!("min {min} is greater than max {max}"),
            ));
        }
    }
    Ok(c)
}
