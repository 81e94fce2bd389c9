//! SQL identifiers taken from request input.
//!
//! Table and column names arrive as strings at request time and cannot be bound
//! as parameters, so they are parsed into an [`Ident`] before they reach SQL text.
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts (`"Mixed Case"`) allow anything except NUL; `""` escapes a quote
//! - Parts are separated by `.` (`public.users`)

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{DbError, DbResult};

/// One `.`-separated part of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A validated schema/table/column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier such as `users`, `public.users` or `"Order Items"`.
    pub fn parse(input: &str) -> DbResult<Self> {
        if input.is_empty() {
            return Err(DbError::validation("Identifier cannot be empty"));
        }
        if input.contains('\0') {
            return Err(DbError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut chars = input.chars().peekable();
        let mut parts = vec![parse_part(&mut chars, input)?];

        while let Some(c) = chars.next() {
            if c != '.' {
                return Err(DbError::validation(format!(
                    "Expected '.' between identifier parts in '{input}', got '{c}'"
                )));
            }
            if chars.peek().is_none() {
                return Err(DbError::validation(format!(
                    "Trailing '.' in identifier '{input}'"
                )));
            }
            parts.push(parse_part(&mut chars, input)?);
        }

        Ok(Self { parts })
    }

    /// The identifier's parts, outermost first.
    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(name) => out.push_str(name),
                IdentPart::Quoted(name) => {
                    out.push('"');
                    out.push_str(&name.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn parse_part(chars: &mut Peekable<Chars<'_>>, input: &str) -> DbResult<IdentPart> {
    if chars.peek() == Some(&'"') {
        chars.next();
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    name.push('"');
                }
                Some('"') => break,
                Some(c) => name.push(c),
                None => {
                    return Err(DbError::validation(format!(
                        "Unclosed quoted identifier in '{input}'"
                    )));
                }
            }
        }
        if name.is_empty() {
            return Err(DbError::validation("Empty quoted identifier"));
        }
        return Ok(IdentPart::Quoted(name));
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' {
            break;
        }
        let ok = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !ok {
            return Err(DbError::validation(format!(
                "Invalid character '{c}' in identifier '{input}'"
            )));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(DbError::validation(format!(
            "Empty identifier segment in '{input}'"
        )));
    }
    Ok(IdentPart::Unquoted(name))
}

/// Conversion used by the builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> DbResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}
