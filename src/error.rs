// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the diagnostic model shared by the lexer, parser, formatter
//! and transform passes.

use std::fmt;

use serde::Serialize;
use text_size::TextSize;

/// Classifies a [`SqlDiagnostic`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// The character stream cannot be tokenised.
    LexFailed,
    /// The token stream parses to no known statement.
    ParseFailed,
    /// Parsed but intentionally unsupported (e.g. `CREATE POLICY`).
    UnsupportedDdl,
    /// A `COMMENT ON` that cannot be resolved to a table/column target.
    Ambiguous,
    /// Raw-string validation failed at format time.
    InvalidRawString,
    /// Two common tables share a name but have different bodies.
    CteNameConflict,
    /// A non-recursive cycle among common tables.
    CteCycle,
    /// Parameter removal would empty a select clause.
    EmptySelect,
    /// A visitor dispatched on an unknown kind tag.
    UnhandledKind,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LexFailed => "LEX_FAILED",
            Self::ParseFailed => "PARSE_FAILED",
            Self::UnsupportedDdl => "UNSUPPORTED_DDL",
            Self::Ambiguous => "AMBIGUOUS",
            Self::InvalidRawString => "INVALID_RAW_STRING",
            Self::CteNameConflict => "CTE_NAME_CONFLICT",
            Self::CteCycle => "CTE_CYCLE",
            Self::EmptySelect => "EMPTY_SELECT",
            Self::UnhandledKind => "UNHANDLED_KIND",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single failure or warning raised by the library.
///
/// Warnings share the shape of errors but do not abort processing; the
/// caller decides based on [`severity`](Self::severity). The optional
/// `path` is filled in by external drivers that know which file the
/// statement came from.
#[derive(Debug, Clone, Eq, thiserror::Error, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct SqlDiagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// Byte offset into the statement source, if known.
    pub offset: Option<u32>,
    /// Single-line, whitespace-collapsed statement preview.
    pub preview: Option<String>,
    pub path: Option<String>,
}

impl SqlDiagnostic {
    pub fn error<M>(kind: DiagnosticKind, message: M) -> Self
    where
        M: Into<String>,
    {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            offset: None,
            preview: None,
            path: None,
        }
    }

    pub fn warning<M>(kind: DiagnosticKind, message: M) -> Self
    where
        M: Into<String>,
    {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    pub fn with_offset(mut self, offset: TextSize) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn with_preview<P>(mut self, preview: P) -> Self
    where
        P: Into<String>,
    {
        self.preview = Some(preview.into());
        self
    }

    pub fn with_path<P>(mut self, path: P) -> Self
    where
        P: Into<String>,
    {
        self.path = Some(path.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
