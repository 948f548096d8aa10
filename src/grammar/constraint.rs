// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of column- and table-level constraints.

use super::{parse_expr, parse_ident, parse_ident_list, parse_qualified_name};
use crate::ast::{
    ColumnConstraint, ConstraintKind, ReferencesSpec, ReferentialAction, TableConstraint,
};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};

/// Whether the current token starts a table-level constraint inside a
/// `CREATE TABLE` body.
pub(crate) fn at_table_constraint(p: &Parser) -> bool {
    matches!(
        p.current(),
        TokenKind::ConstraintKw
            | TokenKind::PrimaryKw
            | TokenKind::ForeignKw
            | TokenKind::UniqueKw
            | TokenKind::CheckKw
    )
}

pub(crate) fn parse_table_constraint(p: &mut Parser) -> ParseResult<TableConstraint> {
    let name = if p.eat(TokenKind::ConstraintKw) {
        Some(parse_ident(p)?)
    } else {
        None
    };

    let kind = match p.current() {
        TokenKind::PrimaryKw => {
            p.bump();
            p.expect(TokenKind::KeyKw)?;
            ConstraintKind::PrimaryKey {
                columns: parse_ident_list(p)?,
            }
        }
        TokenKind::UniqueKw => {
            p.bump();
            ConstraintKind::Unique {
                columns: parse_ident_list(p)?,
            }
        }
        TokenKind::CheckKw => {
            p.bump();
            p.expect(TokenKind::LParen)?;
            let condition = parse_expr(p)?;
            p.expect(TokenKind::RParen)?;
            ConstraintKind::Check(condition)
        }
        TokenKind::ForeignKw => {
            p.bump();
            p.expect(TokenKind::KeyKw)?;
            let columns = parse_ident_list(p)?;
            p.expect(TokenKind::ReferencesKw)?;
            ConstraintKind::ForeignKey {
                columns,
                references: parse_references_tail(p)?,
            }
        }
        _ => {
            return Err(p.error(format!(
                "expected a table constraint, found '{}'",
                p.current_text()
            )));
        }
    };

    Ok(TableConstraint { name, kind })
}

/// Parses the (possibly empty) run of constraints after a column type.
pub(crate) fn parse_column_constraints(
    p: &mut Parser,
) -> ParseResult<Vec<ColumnConstraint>> {
    let mut constraints = Vec::new();

    loop {
        let name = if p.eat(TokenKind::ConstraintKw) {
            Some(parse_ident(p)?)
        } else {
            None
        };

        let kind = match p.current() {
            TokenKind::PrimaryKw => {
                p.bump();
                p.expect(TokenKind::KeyKw)?;
                ConstraintKind::PrimaryKey { columns: Vec::new() }
            }
            TokenKind::NotKw if p.nth(1) == TokenKind::NullKw => {
                p.bump();
                p.bump();
                ConstraintKind::NotNull
            }
            TokenKind::DefaultKw => {
                p.bump();
                ConstraintKind::Default(parse_expr(p)?)
            }
            TokenKind::UniqueKw => {
                p.bump();
                ConstraintKind::Unique { columns: Vec::new() }
            }
            TokenKind::CheckKw => {
                p.bump();
                p.expect(TokenKind::LParen)?;
                let condition = parse_expr(p)?;
                p.expect(TokenKind::RParen)?;
                ConstraintKind::Check(condition)
            }
            TokenKind::ReferencesKw => {
                p.bump();
                ConstraintKind::ForeignKey {
                    columns: Vec::new(),
                    references: parse_references_tail(p)?,
                }
            }
            _ => {
                if name.is_some() {
                    return Err(p.error("CONSTRAINT name without a constraint"));
                }
                break;
            }
        };

        constraints.push(ColumnConstraint { name, kind });
    }

    Ok(constraints)
}

/// The part after `REFERENCES`: target table, optional columns and
/// referential actions.
fn parse_references_tail(p: &mut Parser) -> ParseResult<ReferencesSpec> {
    let table = parse_qualified_name(p)?;
    let columns = if p.at(TokenKind::LParen) {
        parse_ident_list(p)?
    } else {
        Vec::new()
    };

    let mut on_delete = None;
    let mut on_update = None;
    while p.eat(TokenKind::OnKw) {
        if p.eat(TokenKind::DeleteKw) {
            on_delete = Some(parse_referential_action(p)?);
        } else {
            p.expect(TokenKind::UpdateKw)?;
            on_update = Some(parse_referential_action(p)?);
        }
    }

    Ok(ReferencesSpec {
        table,
        columns,
        on_delete,
        on_update,
    })
}

fn parse_referential_action(p: &mut Parser) -> ParseResult<ReferentialAction> {
    match p.current() {
        TokenKind::CascadeKw => {
            p.bump();
            Ok(ReferentialAction::Cascade)
        }
        TokenKind::RestrictKw => {
            p.bump();
            Ok(ReferentialAction::Restrict)
        }
        TokenKind::NoKw => {
            p.bump();
            p.expect(TokenKind::ActionKw)?;
            Ok(ReferentialAction::NoAction)
        }
        TokenKind::SetKw => {
            p.bump();
            if p.eat(TokenKind::NullKw) {
                Ok(ReferentialAction::SetNull)
            } else {
                p.expect(TokenKind::DefaultKw)?;
                Ok(ReferentialAction::SetDefault)
            }
        }
        _ => Err(p.error(
            "expected CASCADE, RESTRICT, NO ACTION, SET NULL or SET DEFAULT",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;

    #[test]
    fn test_column_constraint_run() {
        let constraints =
            parse("not null default 0 unique", parse_column_constraints).unwrap();
        assert_eq!(constraints.len(), 3);
        assert!(matches!(constraints[0].kind, ConstraintKind::NotNull));
        assert!(matches!(constraints[1].kind, ConstraintKind::Default(_)));
        assert!(matches!(constraints[2].kind, ConstraintKind::Unique { .. }));
    }

    #[test]
    fn test_named_column_constraint() {
        let constraints =
            parse("constraint c_pk primary key", parse_column_constraints).unwrap();
        assert_eq!(constraints[0].name.as_ref().unwrap().name(), "c_pk");
        assert!(matches!(
            constraints[0].kind,
            ConstraintKind::PrimaryKey { ref columns } if columns.is_empty()
        ));
    }

    #[test]
    fn test_references_with_actions() {
        let constraints = parse(
            "references person (id) on delete cascade on update set null",
            parse_column_constraints,
        )
        .unwrap();
        match &constraints[0].kind {
            ConstraintKind::ForeignKey { references, .. } => {
                assert_eq!(references.table.dotted(), "person");
                assert_eq!(references.on_delete, Some(ReferentialAction::Cascade));
                assert_eq!(references.on_update, Some(ReferentialAction::SetNull));
            }
            other => panic!("expected foreign key, got {other:?}"),
        }
    }

    #[test]
    fn test_table_level_foreign_key() {
        let constraint = parse(
            "foreign key (person_id) references person (id) on delete no action",
            parse_table_constraint,
        )
        .unwrap();
        match constraint.kind {
            ConstraintKind::ForeignKey {
                columns,
                references,
            } => {
                assert_eq!(columns.len(), 1);
                assert_eq!(references.on_delete, Some(ReferentialAction::NoAction));
            }
            other => panic!("expected foreign key, got {other:?}"),
        }
    }
}
