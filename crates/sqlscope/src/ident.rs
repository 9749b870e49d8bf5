//! Safe SQL identifier handling.
//!
//! Identifiers cannot be bound as parameters, so every table/column name that ends up in
//! generated SQL text goes through [`Ident`] first.
//!
//! Only unquoted identifiers are accepted: quoting rules differ between MariaDB (backticks),
//! SQLite and Postgres (double quotes), and the schemas this crate targets never need them.
//! Each `.`-separated part must match `[A-Za-z_][A-Za-z0-9_]*`.
//!
//! # Example
//! ```
//! use sqlscope::Ident;
//!
//! let t = Ident::parse("items")?;
//! let c = Ident::parse("items.belongs_to_account")?;
//! assert_eq!(c.to_string(), "items.belongs_to_account");
//! assert!(Ident::parse("items; DROP TABLE users").is_err());
//! # Ok::<(), sqlscope::QbError>(())
//! ```

use crate::error::{QbError, QbResult};
use std::fmt;

/// A validated SQL identifier (table, column, or `table.column`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Parse a dotted identifier such as `items` or `items.created_on`.
    pub fn parse(s: &str) -> QbResult<Self> {
        if s.is_empty() {
            return Err(QbError::invalid_request("Identifier cannot be empty"));
        }

        let mut parts = Vec::new();
        for seg in s.split('.') {
            validate_segment(s, seg)?;
            parts.push(seg.to_string());
        }

        Ok(Self { parts })
    }

    /// Parse an identifier that must not contain a `.` (a bare column or JSON key).
    pub fn parse_single(s: &str) -> QbResult<Self> {
        let ident = Self::parse(s)?;
        if ident.parts.len() != 1 {
            return Err(QbError::invalid_request(format!(
                "Expected an unqualified identifier, got '{s}'"
            )));
        }
        Ok(ident)
    }

    /// Whether the identifier is a single, unqualified name.
    pub fn is_single(&self) -> bool {
        self.parts.len() == 1
    }

    /// The last part of the identifier (the column name of `table.column`).
    pub fn name(&self) -> &str {
        // parse() never yields an empty parts list
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Qualify a column with this identifier as its table: `items` + `id` -> `items.id`.
    pub fn column(&self, column: &str) -> String {
        format!("{self}.{column}")
    }
}

fn validate_segment(full: &str, seg: &str) -> QbResult<()> {
    let mut chars = seg.chars();
    let Some(first) = chars.next() else {
        return Err(QbError::invalid_request(format!(
            "Empty identifier segment in '{full}'"
        )));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(QbError::invalid_request(format!(
            "Invalid identifier start character '{first}' in '{full}'"
        )));
    }
    if let Some(c) = chars.find(|c| !(*c == '_' || c.is_ascii_alphanumeric())) {
        return Err(QbError::invalid_request(format!(
            "Invalid character '{c}' in identifier '{full}'"
        )));
    }
    Ok(())
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}
