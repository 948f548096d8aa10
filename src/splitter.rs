// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the multi-statement splitter.
//!
//! The splitter runs the real lexer, so semicolons inside string
//! literals (plain, dollar-quoted, prefixed), quoted identifiers and
//! comments never terminate a statement. Statements are produced as
//! they are found, before the rest of the input is consumed.

use crate::lexer::{Lexer, TokenKind};

/// One segment of a multi-statement script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SplitStatement {
    /// 1-based statement index, counting empty segments too.
    pub index: usize,
    /// The original statement text, trimmed of surrounding trivia and
    /// without the terminating semicolon.
    pub sql: String,
    /// Whether the segment held only whitespace and comments.
    pub is_empty: bool,
}

/// Splits `sql` into individually parseable statements.
pub fn split(sql: &str) -> StatementSplitter<'_> {
    StatementSplitter {
        sql,
        lexer: Lexer::new(sql),
        index: 0,
        done: false,
    }
}

pub struct StatementSplitter<'a> {
    sql: &'a str,
    lexer: Lexer<'a>,
    index: usize,
    done: bool,
}

impl<'a> Iterator for StatementSplitter<'a> {
    type Item = SplitStatement;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut bounds: Option<(usize, usize)> = None;

        loop {
            match self.lexer.next() {
                Some(token) if token.kind == TokenKind::SemiColon => {
                    return Some(self.emit(bounds));
                }
                Some(token) => {
                    // Error tokens still belong to the statement text;
                    // the parser reports them with a proper offset.
                    if !token.kind.is_trivia() {
                        let start: usize = token.range.start().into();
                        let end: usize = token.range.end().into();
                        bounds = match bounds {
                            Some((first, _)) => Some((first, end)),
                            None => Some((start, end)),
                        };
                    }
                }
                None => {
                    self.done = true;
                    // A trailing segment only exists if it has content.
                    return bounds.map(|b| self.emit(Some(b)));
                }
            }
        }
    }
}

impl<'a> StatementSplitter<'a> {
    fn emit(&mut self, bounds: Option<(usize, usize)>) -> SplitStatement {
        self.index += 1;
        match bounds {
            Some((start, end)) => SplitStatement {
                index: self.index,
                sql: self.sql[start..end].to_owned(),
                is_empty: false,
            },
            None => SplitStatement {
                index: self.index,
                sql: String::new(),
                is_empty: true,
            },
        }
    }
}
