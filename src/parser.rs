// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the token cursor the grammar modules parse from.

use text_size::{TextRange, TextSize};

use crate::error::{DiagnosticKind, SqlDiagnostic};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::util::statement_preview;

pub(crate) type ParseResult<T> = Result<T, SqlDiagnostic>;

/// A cursor over the non-trivia tokens of one statement.
///
/// Construction fails with `LEX_FAILED` at the first unrecognisable
/// character; after that the grammar only ever sees clean tokens.
#[derive(Debug)]
pub(crate) struct Parser<'a> {
    sql: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    /// Running ordinal for `?` markers, so anonymous parameters get
    /// stable names.
    anonymous_params: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(sql: &'a str) -> ParseResult<Self> {
        let mut tokens = Vec::new();

        for token in Lexer::new(sql) {
            if token.kind == TokenKind::Error {
                return Err(SqlDiagnostic::error(
                    DiagnosticKind::LexFailed,
                    format!("unrecognised character '{}'", token.text),
                )
                .with_offset(token.range.start())
                .with_preview(statement_preview(sql)));
            }

            if !token.kind.is_trivia() {
                tokens.push(token);
            }
        }

        Ok(Self {
            sql,
            tokens,
            pos: 0,
            anonymous_params: 0,
        })
    }

    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn current_text(&self) -> &'a str {
        self.nth_text(0)
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'a str {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.text)
            .unwrap_or_default()
    }

    pub(crate) fn current_range(&self) -> TextRange {
        self.tokens.get(self.pos).map(|t| t.range).unwrap_or_else(|| {
            let end = TextSize::of(self.sql);
            TextRange::new(end, end)
        })
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consumes and returns the current token.
    pub(crate) fn bump(&mut self) -> Token<'a> {
        let token = self.tokens.get(self.pos).copied().unwrap_or(Token {
            kind: TokenKind::Eof,
            text: "",
            range: self.current_range(),
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'a>> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!(
                "expected {kind}, found {}",
                self.describe_current()
            )))
        }
    }

    pub(crate) fn expect_eof(&self) -> ParseResult<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.error(format!(
                "trailing input after statement: {}",
                self.describe_current()
            )))
        }
    }

    /// Builds a `PARSE_FAILED` diagnostic at the current position.
    pub(crate) fn error<M>(&self, message: M) -> SqlDiagnostic
    where
        M: Into<String>,
    {
        SqlDiagnostic::error(DiagnosticKind::ParseFailed, message)
            .with_offset(self.current_range().start())
            .with_preview(statement_preview(self.sql))
    }

    /// Builds a warning of the given kind at the current position.
    pub(crate) fn warning<M>(&self, kind: DiagnosticKind, message: M) -> SqlDiagnostic
    where
        M: Into<String>,
    {
        SqlDiagnostic::warning(kind, message)
            .with_offset(self.current_range().start())
            .with_preview(statement_preview(self.sql))
    }

    pub(crate) fn next_anonymous_param(&mut self) -> usize {
        self.anonymous_params += 1;
        self.anonymous_params
    }

    fn describe_current(&self) -> String {
        if self.at_eof() {
            "end of input".to_owned()
        } else {
            format!("'{}'", self.current_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivia_is_filtered_out() {
        let p = Parser::new("select /* c */ 1 -- t\n").unwrap();
        assert_eq!(p.nth(0), TokenKind::SelectKw);
        assert_eq!(p.nth(1), TokenKind::NumberLiteral);
        assert_eq!(p.nth(2), TokenKind::Eof);
    }

    #[test]
    fn lex_failure_carries_offset_and_preview() {
        let err = Parser::new("select ^ from t").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::LexFailed);
        assert_eq!(err.offset, Some(7));
        assert_eq!(err.preview.as_deref(), Some("select ^ from t"));
    }

    #[test]
    fn expect_reports_the_offending_token() {
        let mut p = Parser::new("select,").unwrap();
        p.bump();
        let err = p.expect(TokenKind::NumberLiteral).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::ParseFailed);
        assert!(err.message.contains("','"));
    }
}
