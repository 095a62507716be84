//! Minimal s-expressions with double-quoted atoms.
//!
//! Used for association-list columns such as a storage device configuration
//! `(("location" "//server/share") ("cifspassword" "secret"))`.

use std::fmt;

use anyhow::{anyhow, bail, Result};

/// Deepest list nesting accepted by [`parse`]
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

/// Parse a single s-expression; surrounding whitespace is allowed
pub fn parse(input: &str) -> Result<Sexp> {
    let mut chars = input.chars().peekable();
    let value = parse_value(&mut chars, 0)?;
    if chars.any(|c| !c.is_whitespace()) {
        bail!("Invalid s-expression: trailing characters after the closing parenthesis");
    }
    Ok(value)
}

fn parse_value<I>(chars: &mut std::iter::Peekable<I>, depth: usize) -> Result<Sexp>
where
    I: Iterator<Item = char>,
{
    while chars.next_if(|c| c.is_whitespace()).is_some() {}

    match chars.next() {
        Some('"') => {
            let mut atom = String::new();
            loop {
                match chars.next() {
                    Some('"') => return Ok(Sexp::Atom(atom)),
                    Some('\\') => match chars.next() {
                        Some(c) => atom.push(c),
                        None => bail!("Invalid s-expression: dangling escape"),
                    },
                    Some(c) => atom.push(c),
                    None => bail!("Invalid s-expression: unterminated string"),
                }
            }
        }
        Some('(') => {
            if depth >= MAX_DEPTH {
                bail!("Invalid s-expression: nested deeper than {} lists", MAX_DEPTH);
            }
            let mut items = Vec::new();
            loop {
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                match chars.peek() {
                    Some(')') => {
                        chars.next();
                        return Ok(Sexp::List(items));
                    }
                    Some(_) => items.push(parse_value(chars, depth + 1)?),
                    None => bail!("Invalid s-expression: unterminated list"),
                }
            }
        }
        Some(c) => Err(anyhow!("Invalid s-expression: unexpected character {:?}", c)),
        None => bail!("Invalid s-expression: empty input"),
    }
}

impl Sexp {
    pub fn car(&self) -> Option<&Sexp> {
        match self {
            Sexp::List(items) => items.first(),
            Sexp::Atom(_) => None,
        }
    }

    pub fn cdr(&self) -> Option<Sexp> {
        match self {
            Sexp::List(items) if !items.is_empty() => Some(Sexp::List(items[1..].to_vec())),
            _ => None,
        }
    }

    /// Value paired with `key` in an association list
    pub fn assoc(&self, key: &str) -> Option<&Sexp> {
        let Sexp::List(items) = self else {
            return None;
        };
        items.iter().find_map(|item| match item {
            Sexp::List(pair) if pair.len() > 1 && pair[0] == Sexp::Atom(key.to_string()) => {
                Some(&pair[1])
            }
            _ => None,
        })
    }

    /// Replace every value paired with `key`; returns whether one was found
    pub fn set_assoc(&mut self, key: &str, value: Sexp) -> bool {
        let Sexp::List(items) = self else {
            return false;
        };
        let mut found = false;
        for item in items.iter_mut() {
            if let Sexp::List(pair) = item {
                if pair.len() > 1 && pair[0] == Sexp::Atom(key.to_string()) {
                    pair[1] = value.clone();
                    found = true;
                }
            }
        }
        found
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(atom) => {
                write!(f, "\"")?;
                for c in atom.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}
