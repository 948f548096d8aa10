// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of `CREATE TABLE` and `ALTER TABLE`.

use super::{
    at_table_constraint, parse_column_constraints, parse_expr, parse_ident,
    parse_qualified_name, parse_table_constraint, parse_type,
};
use crate::ast::{AlterAction, AlterTable, ColumnDef, CreateTable};
use crate::error::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};

pub(crate) fn parse_create_table(p: &mut Parser) -> ParseResult<CreateTable> {
    p.expect(TokenKind::CreateKw)?;
    p.expect(TokenKind::TableKw)?;
    let name = parse_qualified_name(p)?;
    p.expect(TokenKind::LParen)?;

    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    loop {
        if at_table_constraint(p) {
            constraints.push(parse_table_constraint(p)?);
        } else {
            columns.push(parse_column_def(p)?);
        }

        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::RParen)?;

    Ok(CreateTable {
        name,
        columns,
        constraints,
    })
}

fn parse_column_def(p: &mut Parser) -> ParseResult<ColumnDef> {
    let name = parse_ident(p)?;
    let ty = parse_type(p)?;
    let constraints = parse_column_constraints(p)?;

    Ok(ColumnDef {
        name,
        ty,
        constraints,
    })
}

pub(crate) fn parse_alter_table(p: &mut Parser) -> ParseResult<AlterTable> {
    p.expect(TokenKind::AlterKw)?;
    p.expect(TokenKind::TableKw)?;
    let name = parse_qualified_name(p)?;

    let mut actions = vec![parse_alter_action(p)?];
    while p.eat(TokenKind::Comma) {
        actions.push(parse_alter_action(p)?);
    }

    Ok(AlterTable { name, actions })
}

fn parse_alter_action(p: &mut Parser) -> ParseResult<AlterAction> {
    match p.current() {
        TokenKind::AddKw => {
            p.bump();
            Ok(AlterAction::AddConstraint(parse_table_constraint(p)?))
        }
        TokenKind::AlterKw => {
            p.bump();
            p.eat(TokenKind::ColumnKw);
            let column = parse_ident(p)?;

            if p.eat(TokenKind::SetKw) {
                p.expect(TokenKind::DefaultKw)?;
                Ok(AlterAction::AlterColumnDefault {
                    column,
                    default: Some(parse_expr(p)?),
                })
            } else if p.eat(TokenKind::DropKw) {
                p.expect(TokenKind::DefaultKw)?;
                Ok(AlterAction::AlterColumnDefault {
                    column,
                    default: None,
                })
            } else {
                Err(p.warning(
                    DiagnosticKind::UnsupportedDdl,
                    format!(
                        "ALTER COLUMN {} is not supported",
                        p.current_text().to_uppercase()
                    ),
                ))
            }
        }
        _ => Err(p.warning(
            DiagnosticKind::UnsupportedDdl,
            format!(
                "ALTER TABLE action {} is not supported",
                p.current_text().to_uppercase()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;
    use crate::ast::ConstraintKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table_with_columns_and_constraints() {
        let table = parse(
            "CREATE TABLE public.person (\
                id integer PRIMARY KEY,\
                name character varying(100) NOT NULL,\
                dept_id integer REFERENCES dept (id) ON DELETE CASCADE,\
                UNIQUE (name),\
                CONSTRAINT person_chk CHECK (id > 0)\
             )",
            parse_create_table,
        )
        .unwrap();

        assert_eq!(table.name.dotted(), "public.person");
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.constraints.len(), 2);
        assert_eq!(table.columns[0].name.name(), "id");
        assert!(matches!(
            table.columns[0].constraints[0].kind,
            ConstraintKind::PrimaryKey { .. }
        ));
        assert_eq!(
            table.constraints[1].name.as_ref().unwrap().name(),
            "person_chk"
        );
    }

    #[test]
    fn test_alter_table_actions() {
        let alter = parse(
            "ALTER TABLE person \
               ADD CONSTRAINT fk FOREIGN KEY (dept_id) REFERENCES dept (id),\
               ALTER COLUMN name SET DEFAULT 'unknown',\
               ALTER COLUMN dept_id DROP DEFAULT",
            parse_alter_table,
        )
        .unwrap();

        assert_eq!(alter.actions.len(), 3);
        assert!(matches!(alter.actions[0], AlterAction::AddConstraint(_)));
        assert!(matches!(
            alter.actions[1],
            AlterAction::AlterColumnDefault {
                default: Some(_),
                ..
            }
        ));
        assert!(matches!(
            alter.actions[2],
            AlterAction::AlterColumnDefault { default: None, .. }
        ));
    }

    #[test]
    fn test_unsupported_alter_action_is_a_warning() {
        let err = parse("ALTER TABLE t DROP COLUMN c", parse_alter_table).unwrap_err();
        assert!(err.is_warning());
        assert_eq!(err.kind, DiagnosticKind::UnsupportedDdl);
    }
}
