// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of `CREATE INDEX`.

use super::{at_ident, parse_expr, parse_ident, parse_qualified_name};
use crate::ast::CreateIndex;
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};

pub(crate) fn parse_create_index(p: &mut Parser) -> ParseResult<CreateIndex> {
    p.expect(TokenKind::CreateKw)?;
    let unique = p.eat(TokenKind::UniqueKw);
    p.expect(TokenKind::IndexKw)?;

    // The index name is optional; `ON` follows directly for anonymous
    // indexes.
    let name = if at_ident(p) && !p.at(TokenKind::OnKw) {
        Some(parse_ident(p)?)
    } else {
        None
    };

    p.expect(TokenKind::OnKw)?;
    let table = parse_qualified_name(p)?;

    p.expect(TokenKind::LParen)?;
    let mut columns = vec![parse_expr(p)?];
    while p.eat(TokenKind::Comma) {
        columns.push(parse_expr(p)?);
    }
    p.expect(TokenKind::RParen)?;

    Ok(CreateIndex {
        unique,
        name,
        table,
        columns,
    })
}
