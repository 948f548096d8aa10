// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the value-expression parser.

//  Heavily inspired by
//    https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html

use super::{parse_ident, parse_select_query, parse_type};
use crate::ast::{
    CaseKeyValue, Expr, FrameBound, FrameSpec, FrameType, Literal, NamePart, OverTarget,
    Parameter, PartitionByClause, QualifiedName, RawString, SwitchCase, WindowFrame,
};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};
use crate::util::SqlIdent;

// Binding powers, lowest to highest. Between-bounds and the right-hand
// sides of keyword comparisons bind at additive level so a following
// `AND` stays with the enclosing construct.
const OR_BP: (u8, u8) = (1, 2);
const AND_BP: (u8, u8) = (3, 4);
const NOT_BP: u8 = 5;
const COMP_BP: (u8, u8) = (7, 8);
const ADD_BP: (u8, u8) = (9, 10);
const MUL_BP: (u8, u8) = (11, 12);
const CONCAT_BP: (u8, u8) = (13, 14);
const SIGN_BP: u8 = 15;
const CAST_BP: u8 = 17;

pub(crate) fn parse_expr(p: &mut Parser) -> ParseResult<Expr> {
    expr_bp(p, 0)
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> ParseResult<Expr> {
    let mut lhs = parse_prefix(p)?;

    loop {
        let token = p.current();

        if token == TokenKind::DoubleColon {
            if CAST_BP < min_bp {
                break;
            }
            p.bump();
            let ty = parse_type(p)?;
            lhs = Expr::Cast {
                operand: Box::new(lhs),
                ty,
            };
            continue;
        }

        // Keyword comparisons with special right-hand sides.
        if COMP_BP.0 >= min_bp {
            match token {
                TokenKind::IsKw => {
                    lhs = parse_is(p, lhs)?;
                    continue;
                }
                TokenKind::BetweenKw => {
                    p.bump();
                    lhs = parse_between(p, lhs, false)?;
                    continue;
                }
                TokenKind::InKw => {
                    p.bump();
                    lhs = parse_in(p, lhs, false)?;
                    continue;
                }
                TokenKind::NotKw => match p.nth(1) {
                    TokenKind::BetweenKw => {
                        p.bump();
                        p.bump();
                        lhs = parse_between(p, lhs, true)?;
                        continue;
                    }
                    TokenKind::InKw => {
                        p.bump();
                        p.bump();
                        lhs = parse_in(p, lhs, true)?;
                        continue;
                    }
                    TokenKind::LikeKw | TokenKind::IlikeKw => {
                        p.bump();
                        let op = if p.bump().kind == TokenKind::LikeKw {
                            "not like"
                        } else {
                            "not ilike"
                        };
                        let rhs = expr_bp(p, COMP_BP.1)?;
                        lhs = binary(lhs, op, rhs);
                        continue;
                    }
                    _ => break,
                },
                _ => {}
            }
        }

        let (l_bp, r_bp, op) = match token {
            TokenKind::OrKw => (OR_BP.0, OR_BP.1, "or"),
            TokenKind::AndKw => (AND_BP.0, AND_BP.1, "and"),
            TokenKind::ComparisonOp => (COMP_BP.0, COMP_BP.1, p.current_text()),
            TokenKind::LikeKw => (COMP_BP.0, COMP_BP.1, "like"),
            TokenKind::IlikeKw => (COMP_BP.0, COMP_BP.1, "ilike"),
            TokenKind::Plus => (ADD_BP.0, ADD_BP.1, "+"),
            TokenKind::Minus => (ADD_BP.0, ADD_BP.1, "-"),
            TokenKind::Asterisk => (MUL_BP.0, MUL_BP.1, "*"),
            TokenKind::Slash => (MUL_BP.0, MUL_BP.1, "/"),
            TokenKind::Percent => (MUL_BP.0, MUL_BP.1, "%"),
            TokenKind::DoublePipe => (CONCAT_BP.0, CONCAT_BP.1, "||"),
            _ => break,
        };

        if l_bp < min_bp {
            break;
        }

        let op = op.to_owned();
        p.bump();
        let rhs = expr_bp(p, r_bp)?;
        lhs = binary(lhs, &op, rhs);
    }

    Ok(lhs)
}

fn binary(left: Expr, op: &str, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op: RawString::new(op),
        right: Box::new(right),
    }
}

/// `IS [NOT] NULL|TRUE|FALSE|DISTINCT FROM …`, modelled as a binary
/// expression whose operator is the keyword run.
fn parse_is(p: &mut Parser, lhs: Expr) -> ParseResult<Expr> {
    p.expect(TokenKind::IsKw)?;
    let mut op = String::from("is");
    if p.eat(TokenKind::NotKw) {
        op.push_str(" not");
    }

    let rhs = match p.current() {
        TokenKind::NullKw => {
            p.bump();
            Expr::Literal(Literal::Null)
        }
        TokenKind::TrueKw => {
            p.bump();
            Expr::Literal(Literal::Bool(true))
        }
        TokenKind::FalseKw => {
            p.bump();
            Expr::Literal(Literal::Bool(false))
        }
        TokenKind::DistinctKw => {
            p.bump();
            p.expect(TokenKind::FromKw)?;
            op.push_str(" distinct from");
            expr_bp(p, ADD_BP.0)?
        }
        _ => {
            return Err(p.error(
                "expected NULL, TRUE, FALSE or DISTINCT FROM after IS",
            ));
        }
    };

    Ok(binary(lhs, &op, rhs))
}

fn parse_between(p: &mut Parser, operand: Expr, negated: bool) -> ParseResult<Expr> {
    let lower = expr_bp(p, ADD_BP.0)?;
    p.expect(TokenKind::AndKw)?;
    let upper = expr_bp(p, ADD_BP.0)?;

    Ok(Expr::Between {
        operand: Box::new(operand),
        lower: Box::new(lower),
        upper: Box::new(upper),
        negated,
    })
}

fn parse_in(p: &mut Parser, lhs: Expr, negated: bool) -> ParseResult<Expr> {
    p.expect(TokenKind::LParen)?;

    let rhs = if at_query_start(p) {
        let query = parse_select_query(p)?;
        Expr::InlineQuery(Box::new(query))
    } else {
        let mut values = vec![parse_expr(p)?];
        while p.eat(TokenKind::Comma) {
            values.push(parse_expr(p)?);
        }
        Expr::Tuple(values)
    };
    p.expect(TokenKind::RParen)?;

    let op = if negated { "not in" } else { "in" };
    Ok(binary(lhs, op, rhs))
}

fn at_query_start(p: &Parser) -> bool {
    matches!(
        p.current(),
        TokenKind::SelectKw | TokenKind::WithKw | TokenKind::ValuesKw
    )
}

fn parse_prefix(p: &mut Parser) -> ParseResult<Expr> {
    match p.current() {
        TokenKind::NotKw => {
            p.bump();
            let operand = expr_bp(p, NOT_BP)?;
            Ok(Expr::Unary {
                op: RawString::new("not"),
                operand: Box::new(operand),
            })
        }
        TokenKind::Minus | TokenKind::Plus => {
            let op = if p.bump().kind == TokenKind::Minus {
                "-"
            } else {
                "+"
            };
            let operand = expr_bp(p, SIGN_BP)?;
            Ok(Expr::Unary {
                op: RawString::new(op),
                operand: Box::new(operand),
            })
        }
        TokenKind::ExistsKw => {
            p.bump();
            p.expect(TokenKind::LParen)?;
            let query = parse_select_query(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(Expr::Unary {
                op: RawString::new("exists"),
                operand: Box::new(Expr::InlineQuery(Box::new(query))),
            })
        }
        TokenKind::CaseKw => parse_case(p),
        TokenKind::CastKw => {
            p.bump();
            p.expect(TokenKind::LParen)?;
            let operand = parse_expr(p)?;
            p.expect(TokenKind::AsKw)?;
            let ty = parse_type(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(Expr::Cast {
                operand: Box::new(operand),
                ty,
            })
        }
        TokenKind::ArrayKw => {
            p.bump();
            p.expect(TokenKind::LBracket)?;
            let mut items = Vec::new();
            if !p.at(TokenKind::RBracket) {
                items.push(parse_expr(p)?);
                while p.eat(TokenKind::Comma) {
                    items.push(parse_expr(p)?);
                }
            }
            p.expect(TokenKind::RBracket)?;
            Ok(Expr::Array(items))
        }
        TokenKind::LParen => {
            p.bump();
            if at_query_start(p) {
                let query = parse_select_query(p)?;
                p.expect(TokenKind::RParen)?;
                return Ok(Expr::InlineQuery(Box::new(query)));
            }

            let first = parse_expr(p)?;
            if p.at(TokenKind::Comma) {
                let mut items = vec![first];
                while p.eat(TokenKind::Comma) {
                    items.push(parse_expr(p)?);
                }
                p.expect(TokenKind::RParen)?;
                return Ok(Expr::Tuple(items));
            }
            p.expect(TokenKind::RParen)?;
            Ok(Expr::Paren(Box::new(first)))
        }
        TokenKind::NumberLiteral => Ok(Expr::number(p.bump().text)),
        TokenKind::StringLiteral => {
            let text = p.bump().text;
            let inner = &text[1..text.len() - 1];
            Ok(Expr::string(inner.replace("''", "'")))
        }
        TokenKind::DollarString => {
            let text = p.bump().text;
            // Strip the opening and closing `$tag$`.
            let tag_len = text[1..].find('$').unwrap_or(0) + 2;
            let inner = &text[tag_len..text.len() - tag_len];
            Ok(Expr::string(inner))
        }
        TokenKind::MoneyLiteral => Ok(Expr::string(p.bump().text)),
        TokenKind::EscapeString | TokenKind::HexString | TokenKind::UnicodeString => {
            let text = p.bump().text;
            let quote = text.find('\'').unwrap_or(0);
            Ok(Expr::StringSpecifier {
                specifier: text[..quote].to_uppercase(),
                value: text[quote + 1..text.len() - 1].to_owned(),
            })
        }
        TokenKind::TrueKw => {
            p.bump();
            Ok(Expr::Literal(Literal::Bool(true)))
        }
        TokenKind::FalseKw => {
            p.bump();
            Ok(Expr::Literal(Literal::Bool(false)))
        }
        TokenKind::NullKw => {
            p.bump();
            Ok(Expr::Literal(Literal::Null))
        }
        TokenKind::NamedParam | TokenKind::PositionalParam => {
            let text = p.bump().text;
            Ok(Expr::Parameter(Parameter {
                name: text[1..].to_owned(),
            }))
        }
        TokenKind::AnonymousParam => {
            p.bump();
            let ordinal = p.next_anonymous_param();
            Ok(Expr::Parameter(Parameter {
                name: ordinal.to_string(),
            }))
        }
        TokenKind::Asterisk => {
            p.bump();
            Ok(Expr::column(SqlIdent::wildcard()))
        }
        kind if kind == TokenKind::Ident
            || kind == TokenKind::DelimitedIdent
            || kind.is_unreserved_keyword() =>
        {
            parse_name_or_call(p)
        }
        _ => Err(p.error(format!(
            "expected expression, found '{}'",
            p.current_text()
        ))),
    }
}

/// A dotted name, continued as a function call when a parenthesis
/// follows a non-wildcard terminal.
fn parse_name_or_call(p: &mut Parser) -> ParseResult<Expr> {
    let mut parts = vec![parse_ident(p)?];
    let mut wildcard = false;

    while p.eat(TokenKind::Dot) {
        if p.eat(TokenKind::Asterisk) {
            wildcard = true;
            break;
        }
        parts.push(parse_ident(p)?);
    }

    if wildcard {
        return Ok(Expr::ColumnRef(QualifiedName::new(
            parts,
            NamePart::Ident(SqlIdent::wildcard()),
        )));
    }

    let terminal = parts.pop().unwrap();
    let name = QualifiedName::new(parts, NamePart::Ident(terminal));

    if !p.at(TokenKind::LParen) {
        return Ok(Expr::ColumnRef(name));
    }

    p.bump();
    let arg = if p.at(TokenKind::RParen) {
        None
    } else if p.at(TokenKind::Asterisk) && p.nth(1) == TokenKind::RParen {
        p.bump();
        Some(Box::new(Expr::column(SqlIdent::wildcard())))
    } else {
        let mut args = vec![parse_expr(p)?];
        while p.eat(TokenKind::Comma) {
            args.push(parse_expr(p)?);
        }
        Some(Box::new(if args.len() == 1 {
            args.pop().unwrap()
        } else {
            Expr::ValueList(args)
        }))
    };
    p.expect(TokenKind::RParen)?;

    let over = if p.eat(TokenKind::OverKw) {
        Some(parse_over_target(p)?)
    } else {
        None
    };

    Ok(Expr::FunctionCall { name, arg, over })
}

fn parse_case(p: &mut Parser) -> ParseResult<Expr> {
    p.expect(TokenKind::CaseKw)?;

    let selector = if p.at(TokenKind::WhenKw) {
        None
    } else {
        Some(Box::new(parse_expr(p)?))
    };

    let mut pairs = Vec::new();
    while p.eat(TokenKind::WhenKw) {
        let when = parse_expr(p)?;
        p.expect(TokenKind::ThenKw)?;
        let then = parse_expr(p)?;
        pairs.push(CaseKeyValue { when, then });
    }
    if pairs.is_empty() {
        return Err(p.error("CASE requires at least one WHEN branch"));
    }

    let else_value = if p.eat(TokenKind::ElseKw) {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    p.expect(TokenKind::EndKw)?;

    Ok(Expr::Case {
        selector,
        switch: SwitchCase { pairs, else_value },
    })
}

fn parse_over_target(p: &mut Parser) -> ParseResult<OverTarget> {
    if p.at(TokenKind::LParen) {
        p.bump();
        let frame = parse_window_frame(p)?;
        p.expect(TokenKind::RParen)?;
        Ok(OverTarget::Frame(frame))
    } else {
        Ok(OverTarget::Name(parse_ident(p)?))
    }
}

/// The body of a parenthesised window definition; shared with the
/// `WINDOW` clause parser.
pub(crate) fn parse_window_frame(p: &mut Parser) -> ParseResult<WindowFrame> {
    let partition_by = if p.at(TokenKind::PartitionKw) {
        p.bump();
        p.expect(TokenKind::ByKw)?;
        let mut exprs = vec![parse_expr(p)?];
        while p.eat(TokenKind::Comma) {
            exprs.push(parse_expr(p)?);
        }
        Some(PartitionByClause { exprs })
    } else {
        None
    };

    let order_by = if p.at(TokenKind::OrderKw) {
        Some(super::parse_order_by_clause(p)?)
    } else {
        None
    };

    let frame = match p.current() {
        TokenKind::RowsKw | TokenKind::RangeKw | TokenKind::GroupsKw => {
            Some(parse_frame_spec(p)?)
        }
        _ => None,
    };

    Ok(WindowFrame {
        partition_by,
        order_by,
        frame,
    })
}

fn parse_frame_spec(p: &mut Parser) -> ParseResult<FrameSpec> {
    let frame_type = match p.bump().kind {
        TokenKind::RowsKw => FrameType::Rows,
        TokenKind::RangeKw => FrameType::Range,
        TokenKind::GroupsKw => FrameType::Groups,
        _ => unreachable!("caller checked the frame keyword"),
    };

    if p.eat(TokenKind::BetweenKw) {
        let start = parse_frame_bound(p)?;
        p.expect(TokenKind::AndKw)?;
        let end = parse_frame_bound(p)?;
        Ok(FrameSpec {
            frame_type,
            start,
            end: Some(end),
        })
    } else {
        let start = parse_frame_bound(p)?;
        Ok(FrameSpec {
            frame_type,
            start,
            end: None,
        })
    }
}

fn parse_frame_bound(p: &mut Parser) -> ParseResult<FrameBound> {
    match p.current() {
        TokenKind::UnboundedKw => {
            p.bump();
            if p.eat(TokenKind::PrecedingKw) {
                Ok(FrameBound::UnboundedPreceding)
            } else {
                p.expect(TokenKind::FollowingKw)?;
                Ok(FrameBound::UnboundedFollowing)
            }
        }
        TokenKind::CurrentKw => {
            p.bump();
            p.expect(TokenKind::RowKw)?;
            Ok(FrameBound::CurrentRow)
        }
        _ => {
            let value = expr_bp(p, ADD_BP.0)?;
            if p.eat(TokenKind::PrecedingKw) {
                Ok(FrameBound::Preceding(Box::new(value)))
            } else {
                p.expect(TokenKind::FollowingKw)?;
                Ok(FrameBound::Following(Box::new(value)))
            }
        }
    }
}
