// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements grammar parsing of the token stream from the lexer.

mod comment;
mod constraint;
mod datatype;
mod expressions;
mod index;
mod query;
mod table;

pub(crate) use comment::*;
pub(crate) use constraint::*;
pub(crate) use datatype::*;
pub(crate) use expressions::*;
pub(crate) use index::*;
pub(crate) use query::*;
pub(crate) use table::*;

use crate::ast::{DdlStatement, NamePart, QualifiedName, Statement};
use crate::error::{DiagnosticKind, SqlDiagnostic};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};
use crate::util::SqlIdent;

/// What one statement parses to: a typed tree, or a warning for
/// statements this library recognises but does not model.
#[derive(Debug)]
pub(crate) enum ParseOutcome {
    Statement(Statement),
    Skipped(SqlDiagnostic),
}

/// Entry point: dispatches on the leading keywords of the statement.
pub(crate) fn parse_statement(p: &mut Parser) -> ParseResult<ParseOutcome> {
    match parse_statement_inner(p) {
        Ok(statement) => Ok(ParseOutcome::Statement(statement)),
        Err(diag) if diag.is_warning() => Ok(ParseOutcome::Skipped(diag)),
        Err(diag) => Err(diag),
    }
}

fn parse_statement_inner(p: &mut Parser) -> ParseResult<Statement> {
    let statement = match p.current() {
        TokenKind::SelectKw
        | TokenKind::WithKw
        | TokenKind::ValuesKw
        | TokenKind::LParen => Statement::Query(parse_select_query(p)?),
        TokenKind::CreateKw => Statement::Ddl(parse_create(p)?),
        TokenKind::AlterKw if p.nth(1) == TokenKind::TableKw => {
            Statement::Ddl(DdlStatement::AlterTable(parse_alter_table(p)?))
        }
        TokenKind::AlterKw => {
            return Err(p.warning(
                DiagnosticKind::UnsupportedDdl,
                format!("ALTER {} is not supported", p.nth_text(1).to_uppercase()),
            ));
        }
        TokenKind::CommentKw => Statement::Ddl(DdlStatement::CommentOn(parse_comment_on(p)?)),
        TokenKind::GrantKw => {
            return Err(p.warning(
                DiagnosticKind::UnsupportedDdl,
                "GRANT statements are not modelled",
            ));
        }
        TokenKind::SetKw => {
            return Err(p.warning(
                DiagnosticKind::UnsupportedDdl,
                "session settings are not modelled",
            ));
        }
        _ => {
            return Err(p.error(format!(
                "no known statement starts with '{}'",
                p.current_text()
            )));
        }
    };

    p.eat(TokenKind::SemiColon);
    p.expect_eof()?;
    Ok(statement)
}

fn parse_create(p: &mut Parser) -> ParseResult<DdlStatement> {
    match (p.nth(1), p.nth(2)) {
        (TokenKind::TableKw, _) => Ok(DdlStatement::CreateTable(parse_create_table(p)?)),
        (TokenKind::IndexKw, _) | (TokenKind::UniqueKw, TokenKind::IndexKw) => {
            Ok(DdlStatement::CreateIndex(parse_create_index(p)?))
        }
        _ => Err(p.warning(
            DiagnosticKind::UnsupportedDdl,
            format!("CREATE {} is not supported", p.nth_text(1).to_uppercase()),
        )),
    }
}

/// Whether the current token can start an identifier.
pub(crate) fn at_ident(p: &Parser) -> bool {
    matches!(p.current(), TokenKind::Ident | TokenKind::DelimitedIdent)
        || p.current().is_unreserved_keyword()
}

/// Parses a single identifier. Unreserved keywords are accepted as
/// bare identifiers, like PostgreSQL does.
pub(crate) fn parse_ident(p: &mut Parser) -> ParseResult<SqlIdent> {
    match p.current() {
        TokenKind::Ident => Ok(SqlIdent::unquoted(p.bump().text)),
        TokenKind::DelimitedIdent => {
            let text = p.bump().text;
            let inner = &text[1..text.len() - 1];
            Ok(SqlIdent::quoted(inner.replace("\"\"", "\"")))
        }
        kind if kind.is_unreserved_keyword() => Ok(SqlIdent::unquoted(p.bump().text)),
        _ => Err(p.error(format!(
            "expected identifier, found '{}'",
            p.current_text()
        ))),
    }
}

/// Parses a dotted name; the terminal part is an identifier.
pub(crate) fn parse_qualified_name(p: &mut Parser) -> ParseResult<QualifiedName> {
    let mut parts = vec![parse_ident(p)?];
    while p.eat(TokenKind::Dot) {
        parts.push(parse_ident(p)?);
    }

    let name = parts.pop().unwrap();
    Ok(QualifiedName::new(parts, NamePart::Ident(name)))
}

/// Like [`parse_qualified_name`], but the terminal part may be `*`.
pub(crate) fn parse_qualified_name_or_wildcard(p: &mut Parser) -> ParseResult<QualifiedName> {
    let mut parts = vec![parse_ident(p)?];
    loop {
        if !p.eat(TokenKind::Dot) {
            let name = parts.pop().unwrap();
            return Ok(QualifiedName::new(parts, NamePart::Ident(name)));
        }
        if p.eat(TokenKind::Asterisk) {
            return Ok(QualifiedName::new(parts, NamePart::Ident(SqlIdent::wildcard())));
        }
        parts.push(parse_ident(p)?);
    }
}

/// Parses a parenthesised, comma-separated identifier list.
pub(crate) fn parse_ident_list(p: &mut Parser) -> ParseResult<Vec<SqlIdent>> {
    p.expect(TokenKind::LParen)?;
    let mut idents = vec![parse_ident(p)?];
    while p.eat(TokenKind::Comma) {
        idents.push(parse_ident(p)?);
    }
    p.expect(TokenKind::RParen)?;
    Ok(idents)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::Parser;

    /// A helper to run a single parse function over an input.
    pub(crate) fn parse<T, F>(input: &str, f: F) -> ParseResult<T>
    where
        F: Fn(&mut Parser) -> ParseResult<T>,
    {
        let mut parser = Parser::new(input)?;
        f(&mut parser)
    }

    #[test]
    fn test_parse_ident() {
        let ident = parse("hello", parse_ident).unwrap();
        assert_eq!(ident.name(), "hello");
        assert!(!ident.is_quoted());
    }

    #[test]
    fn test_parse_delimited_ident() {
        let ident = parse(r#""He""llo""#, parse_ident).unwrap();
        assert_eq!(ident.name(), r#"He"llo"#);
        assert!(ident.is_quoted());
    }

    #[test]
    fn test_unreserved_keyword_as_ident() {
        let ident = parse("key", parse_ident).unwrap();
        assert_eq!(ident.name(), "key");
    }

    #[test]
    fn test_parse_qualified_name() {
        let name = parse("public.person.id", parse_qualified_name).unwrap();
        assert_eq!(name.dotted(), "public.person.id");
        assert_eq!(name.namespaces().len(), 2);
    }

    #[test]
    fn test_parse_qualified_wildcard() {
        let name = parse("t.*", parse_qualified_name_or_wildcard).unwrap();
        assert_eq!(name.name().text(), "*");
        assert_eq!(name.last_namespace().unwrap().name(), "t");
    }

    #[test]
    fn test_statement_dispatch_rejects_unknown() {
        let err = parse("EXPLAIN SELECT 1", parse_statement).unwrap_err();
        assert_eq!(err.kind, crate::error::DiagnosticKind::ParseFailed);
    }

    #[test]
    fn test_grant_is_skipped_with_a_warning() {
        let outcome = parse("GRANT ALL ON t TO role", parse_statement).unwrap();
        match outcome {
            ParseOutcome::Skipped(diag) => {
                assert!(diag.is_warning());
                assert_eq!(diag.kind, crate::error::DiagnosticKind::UnsupportedDdl);
            }
            ParseOutcome::Statement(_) => panic!("GRANT must not parse to a tree"),
        }
    }
}
