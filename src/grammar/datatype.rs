// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of type references.

use super::{parse_expr, parse_ident};
use crate::ast::{Expr, NamePart, QualifiedName, RawString, TypeValue};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};
use crate::util::SqlIdent;

/// Parses a type reference such as `integer`, `numeric(10, 2)`,
/// `public.mood` or `timestamp with time zone`.
pub(crate) fn parse_type(p: &mut Parser) -> ParseResult<TypeValue> {
    let mut parts: Vec<SqlIdent> = vec![parse_ident(p)?];
    while p.eat(TokenKind::Dot) {
        parts.push(parse_ident(p)?);
    }

    let terminal = parts.pop().unwrap();
    let name = if terminal.is_quoted() {
        NamePart::Ident(terminal)
    } else {
        let mut words = terminal.name().to_owned();
        extend_multi_word_type(p, &mut words);
        NamePart::Raw(RawString::new(words))
    };

    let argument = if p.eat(TokenKind::LParen) {
        let mut args = vec![parse_expr(p)?];
        while p.eat(TokenKind::Comma) {
            args.push(parse_expr(p)?);
        }
        p.expect(TokenKind::RParen)?;
        Some(Box::new(if args.len() == 1 {
            args.pop().unwrap()
        } else {
            Expr::ValueList(args)
        }))
    } else {
        None
    };

    Ok(TypeValue {
        name: QualifiedName::new(parts, name),
        argument,
    })
}

/// Greedily completes the few multi-word built-in type names. The
/// continuation words are checked textually so an alias or column name
/// following a type is never swallowed.
fn extend_multi_word_type(p: &mut Parser, words: &mut String) {
    match words.to_lowercase().as_str() {
        "double" if at_word(p, "precision") => {
            p.bump();
            words.push_str(" precision");
        }
        "character" | "char" | "bit" if at_word(p, "varying") => {
            p.bump();
            words.push_str(" varying");
        }
        "timestamp" | "time" => {
            if p.at(TokenKind::WithKw)
                && word_at(p, 1, "time")
                && word_at(p, 2, "zone")
            {
                p.bump();
                p.bump();
                p.bump();
                words.push_str(" with time zone");
            } else if word_at(p, 0, "without")
                && word_at(p, 1, "time")
                && word_at(p, 2, "zone")
            {
                p.bump();
                p.bump();
                p.bump();
                words.push_str(" without time zone");
            }
        }
        _ => {}
    }
}

fn at_word(p: &Parser, word: &str) -> bool {
    word_at(p, 0, word)
}

fn word_at(p: &Parser, n: usize, word: &str) -> bool {
    p.nth(n) == TokenKind::Ident && p.nth_text(n).eq_ignore_ascii_case(word)
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_type() {
        let ty = parse("integer", parse_type).unwrap();
        assert_eq!(ty.name.name().text(), "integer");
        assert!(ty.argument.is_none());
    }

    #[test]
    fn test_type_with_arguments() {
        let ty = parse("numeric(10, 2)", parse_type).unwrap();
        assert_eq!(ty.name.name().text(), "numeric");
        assert!(matches!(
            ty.argument.as_deref(),
            Some(Expr::ValueList(args)) if args.len() == 2
        ));
    }

    #[test]
    fn test_qualified_type() {
        let ty = parse("public.mood", parse_type).unwrap();
        assert_eq!(ty.name.dotted(), "public.mood");
    }

    #[test]
    fn test_multi_word_types() {
        assert_eq!(
            parse("double precision", parse_type)
                .unwrap()
                .name
                .name()
                .text(),
            "double precision",
        );
        assert_eq!(
            parse("character varying(64)", parse_type)
                .unwrap()
                .name
                .name()
                .text(),
            "character varying",
        );
        assert_eq!(
            parse("timestamp with time zone", parse_type)
                .unwrap()
                .name
                .name()
                .text(),
            "timestamp with time zone",
        );
    }

    #[test]
    fn test_multi_word_does_not_swallow_aliases() {
        // `text` followed by an alias-like identifier stays one word.
        let ty = parse("text something_else", parse_type).unwrap();
        assert_eq!(ty.name.name().text(), "text");
    }
}
