// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! PostgreSQL-dialect SQL parsing, formatting and AST transformation.
//!
//! The pipeline is: text → [`split`] → per-statement [`parse`] →
//! optional passes ([`analyzer`], [`rewriter`]) → [`format::Formatter`]
//! → text. The core performs no I/O and keeps no state between calls.

pub mod analyzer;
pub mod ast;
pub mod format;
pub mod rewriter;
pub mod visitor;

mod error;
mod grammar;
mod keywords;
mod lexer;
mod parser;
mod splitter;
mod util;

pub use error::{DiagnosticKind, Severity, SqlDiagnostic};
pub use format::{FormatConfig, Formatted, Formatter};
pub use splitter::{split, SplitStatement, StatementSplitter};
pub use util::SqlIdent;

use ast::Statement;
use grammar::ParseOutcome;

/// Parses a single SQL statement into a typed tree.
///
/// Recognised-but-unsupported statements (e.g. `GRANT`) come back as
/// `Err` carrying a warning-severity diagnostic; callers that want the
/// per-statement skip behaviour use [`parse_script`].
pub fn parse(sql: &str) -> Result<Statement, SqlDiagnostic> {
    let mut parser = parser::Parser::new(sql)?;
    match grammar::parse_statement(&mut parser)? {
        ParseOutcome::Statement(statement) => Ok(statement),
        ParseOutcome::Skipped(diagnostic) => Err(diagnostic),
    }
}

/// What one statement of a script turned into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatementOutcome {
    Parsed(Statement),
    /// Recognised but intentionally not modelled; carries the warning.
    Skipped(SqlDiagnostic),
    Failed(SqlDiagnostic),
}

/// One record of [`parse_script`]'s output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScriptStatement {
    /// 1-based index from the splitter.
    pub index: usize,
    pub sql: String,
    pub outcome: StatementOutcome,
}

/// Splits and parses a whole script. A failing statement never stops
/// the statements after it.
pub fn parse_script(sql: &str) -> Vec<ScriptStatement> {
    split(sql)
        .filter(|statement| !statement.is_empty)
        .map(|statement| {
            let outcome = match parse(&statement.sql) {
                Ok(parsed) => StatementOutcome::Parsed(parsed),
                Err(diagnostic) if diagnostic.is_warning() => {
                    StatementOutcome::Skipped(diagnostic)
                }
                Err(diagnostic) => StatementOutcome::Failed(diagnostic),
            };
            ScriptStatement {
                index: statement.index,
                sql: statement.sql,
                outcome,
            }
        })
        .collect()
}
