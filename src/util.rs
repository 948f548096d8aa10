// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements miscellaneous types and helper.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use unicode_width::UnicodeWidthChar;

/// Maximum display width of a statement preview.
pub(crate) const PREVIEW_WIDTH: usize = 200;

/// A SQL identifier, together with whether it was written quoted.
///
/// Unquoted identifiers compare and hash case-insensitively, quoted ones
/// exactly. The wildcard `*` is carried as an unquoted identifier and is
/// never escaped by the formatter.
#[derive(Clone, Debug, Eq, Serialize)]
pub struct SqlIdent {
    name: String,
    quoted: bool,
}

impl SqlIdent {
    pub fn new<S>(name: S, quoted: bool) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            quoted,
        }
    }

    /// An unquoted identifier.
    pub fn unquoted<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(name, false)
    }

    /// A quoted identifier.
    pub fn quoted<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(name, true)
    }

    /// The wildcard identifier `*`.
    pub fn wildcard() -> Self {
        Self::unquoted("*")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn is_wildcard(&self) -> bool {
        !self.quoted && self.name == "*"
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.name.replace('"', "\"\""))
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl PartialEq for SqlIdent {
    fn eq(&self, other: &Self) -> bool {
        // If the quote-status is different, don't even try further.
        if self.quoted != other.quoted {
            return false;
        }

        if self.quoted {
            self.name == other.name
        } else {
            self.name.to_lowercase() == other.name.to_lowercase()
        }
    }
}

impl Hash for SqlIdent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.quoted.hash(state);

        if self.quoted {
            self.name.hash(state);
        } else {
            self.name.to_lowercase().hash(state);
        }
    }
}

impl From<&str> for SqlIdent {
    fn from(s: &str) -> Self {
        Self::new(s, s.starts_with('"') && s.ends_with('"'))
    }
}

/// Whether two identifiers name the same table/alias.
///
/// Unlike [`PartialEq`], a quoted and an unquoted spelling match as long
/// as the unquoted side folds to the quoted one, which is how PostgreSQL
/// resolves references against folded names.
pub(crate) fn idents_refer_to_same(a: &SqlIdent, b: &SqlIdent) -> bool {
    match (a.is_quoted(), b.is_quoted()) {
        (true, true) => a.name() == b.name(),
        (false, false) => a.name().to_lowercase() == b.name().to_lowercase(),
        _ => {
            let (quoted, folded) = if a.is_quoted() { (a, b) } else { (b, a) };
            quoted.name() == folded.name().to_lowercase()
        }
    }
}

/// Renders `sql` as a single-line preview for diagnostics.
///
/// Whitespace runs collapse to one space and the result is capped at
/// [`PREVIEW_WIDTH`] display columns, with a trailing ellipsis when cut.
pub(crate) fn statement_preview(sql: &str) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    let mut pending_space = false;

    for c in sql.trim().chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }

        let mut step = c.width().unwrap_or(0);
        if pending_space {
            step += 1;
        }

        if width + step > PREVIEW_WIDTH {
            out.push_str("...");
            return out;
        }

        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
        width += step;
    }

    out
}
