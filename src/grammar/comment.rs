// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of `COMMENT ON`.

use super::{parse_expr, parse_qualified_name};
use crate::ast::{CommentOn, CommentTarget};
use crate::error::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};

pub(crate) fn parse_comment_on(p: &mut Parser) -> ParseResult<CommentOn> {
    p.expect(TokenKind::CommentKw)?;
    p.expect(TokenKind::OnKw)?;

    let target = match p.current() {
        TokenKind::TableKw => CommentTarget::Table,
        TokenKind::ColumnKw => CommentTarget::Column,
        _ => {
            return Err(p.warning(
                DiagnosticKind::Ambiguous,
                format!(
                    "COMMENT ON target '{}' cannot be resolved to a table or column",
                    p.current_text()
                ),
            ));
        }
    };
    p.bump();

    let name = parse_qualified_name(p)?;
    p.expect(TokenKind::IsKw)?;

    let comment = if p.eat(TokenKind::NullKw) {
        None
    } else {
        Some(parse_expr(p)?)
    };

    Ok(CommentOn {
        target,
        name,
        comment,
    })
}
