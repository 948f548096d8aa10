// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Qualified names and their leaf parts.

use std::fmt;

use crate::error::{DiagnosticKind, SqlDiagnostic};
use crate::util::SqlIdent;

/// A literal keyword-like token, such as a type name or an operator
/// symbol.
///
/// The text is trimmed on construction; emptiness and punctuation-only
/// content are rejected when the formatter calls [`validate`](Self::validate).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RawString(String);

impl RawString {
    pub fn new<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self(text.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a known operator/keyword.
    pub fn is(&self, word: &str) -> bool {
        self.0.eq_ignore_ascii_case(word)
    }

    pub fn validate(&self) -> Result<&str, SqlDiagnostic> {
        if self.0.is_empty() {
            return Err(SqlDiagnostic::error(
                DiagnosticKind::InvalidRawString,
                "raw string is empty",
            ));
        }

        if self.0.chars().all(|c| ",;()[]{}.".contains(c)) {
            return Err(SqlDiagnostic::error(
                DiagnosticKind::InvalidRawString,
                format!("raw string '{}' is only punctuation", self.0),
            ));
        }

        Ok(&self.0)
    }
}

impl fmt::Display for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RawString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The terminal part of a [`QualifiedName`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum NamePart {
    Ident(SqlIdent),
    Raw(RawString),
}

impl NamePart {
    /// The bare text of the part, without quoting.
    pub fn text(&self) -> &str {
        match self {
            Self::Ident(ident) => ident.name(),
            Self::Raw(raw) => raw.as_str(),
        }
    }

    pub fn as_ident(&self) -> Option<&SqlIdent> {
        match self {
            Self::Ident(ident) => Some(ident),
            Self::Raw(_) => None,
        }
    }
}

/// A dot-separated sequence of namespace identifiers ending in a
/// terminal name.
///
/// Empty namespace segments are normalised out on construction; the
/// terminal name is never empty for parser-built trees.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct QualifiedName {
    namespaces: Vec<SqlIdent>,
    name: NamePart,
}

impl QualifiedName {
    pub fn new(namespaces: Vec<SqlIdent>, name: NamePart) -> Self {
        let namespaces = namespaces.into_iter().filter(|n| !n.is_empty()).collect();
        Self { namespaces, name }
    }

    pub fn from_ident(ident: SqlIdent) -> Self {
        Self::new(Vec::new(), NamePart::Ident(ident))
    }

    pub fn from_raw(raw: RawString) -> Self {
        Self::new(Vec::new(), NamePart::Raw(raw))
    }

    pub fn namespaces(&self) -> &[SqlIdent] {
        &self.namespaces
    }

    pub fn name(&self) -> &NamePart {
        &self.name
    }

    /// The namespace segment closest to the terminal name, e.g. the
    /// table part of `schema.table.column`.
    pub fn last_namespace(&self) -> Option<&SqlIdent> {
        self.namespaces.last()
    }

    pub fn is_unqualified(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// All parts in order, rendered bare and joined with dots. Only
    /// meant for sort keys and messages, not for SQL output.
    pub fn dotted(&self) -> String {
        let mut parts: Vec<&str> = self.namespaces.iter().map(|n| n.name()).collect();
        parts.push(self.name.text());
        parts.join(".")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_namespaces_are_normalised_out() {
        let name = QualifiedName::new(
            vec![
                SqlIdent::unquoted(""),
                SqlIdent::unquoted("public"),
                SqlIdent::unquoted(""),
            ],
            NamePart::Ident(SqlIdent::unquoted("person")),
        );

        assert_eq!(name.namespaces().len(), 1);
        assert_eq!(name.dotted(), "public.person");
        assert_eq!(name.last_namespace().unwrap().name(), "public");
    }

    #[test]
    fn raw_string_is_trimmed() {
        assert_eq!(RawString::new("  union all ").as_str(), "union all");
    }

    #[test]
    fn raw_string_validation() {
        assert!(RawString::new("int4").validate().is_ok());
        assert!(RawString::new("||").validate().is_ok());
        assert!(RawString::new("   ").validate().is_err());
        assert!(RawString::new(",.;").validate().is_err());
    }
}
