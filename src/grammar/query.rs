// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of `SELECT` queries, `WITH` clauses, `VALUES`
//! and set operations.

use super::{parse_expr, parse_ident, parse_ident_list, parse_qualified_name};
use crate::ast::{
    CommonTable, DataSource, Distinct, Expr, FetchClause, FetchKind, FetchUnit, ForClause,
    FromClause, GroupByClause, HavingClause, JoinClause, JoinCondition, LimitClause,
    Materialized, NullsPosition, OrderByClause, OrderByItem, RawString, SelectClause,
    SelectItem, SelectQuery, SimpleSelect, SortDirection, SourceAlias, SourceExpr,
    ValuesQuery, WhereClause, WindowFrameClause, WindowsClause, WithClause,
};
use crate::lexer::TokenKind;
use crate::parser::{ParseResult, Parser};

/// Parses a full select query including trailing set operations,
/// associating left-to-right.
pub(crate) fn parse_select_query(p: &mut Parser) -> ParseResult<SelectQuery> {
    let mut query = parse_query_term(p)?;

    loop {
        let op = match p.current() {
            TokenKind::UnionKw => {
                p.bump();
                if p.eat(TokenKind::AllKw) {
                    "union all"
                } else {
                    "union"
                }
            }
            TokenKind::IntersectKw => {
                p.bump();
                if p.eat(TokenKind::AllKw) {
                    "intersect all"
                } else {
                    "intersect"
                }
            }
            TokenKind::ExceptKw => {
                p.bump();
                if p.eat(TokenKind::AllKw) {
                    "except all"
                } else {
                    "except"
                }
            }
            _ => break,
        };

        let right = parse_query_term(p)?;
        query = SelectQuery::Binary {
            left: Box::new(query),
            op: RawString::new(op),
            right: Box::new(right),
        };
    }

    Ok(query)
}

fn parse_query_term(p: &mut Parser) -> ParseResult<SelectQuery> {
    match p.current() {
        TokenKind::LParen => {
            p.bump();
            let query = parse_select_query(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(query)
        }
        TokenKind::WithKw => {
            let with = parse_with_clause(p)?;
            if !p.at(TokenKind::SelectKw) {
                return Err(p.error("expected SELECT after WITH clause"));
            }
            parse_simple_select(p, Some(with))
        }
        TokenKind::ValuesKw => parse_values(p),
        TokenKind::SelectKw => parse_simple_select(p, None),
        _ => Err(p.error(format!(
            "expected SELECT, VALUES, WITH or a parenthesised query, found '{}'",
            p.current_text()
        ))),
    }
}

pub(crate) fn parse_with_clause(p: &mut Parser) -> ParseResult<WithClause> {
    p.expect(TokenKind::WithKw)?;
    let recursive = p.eat(TokenKind::RecursiveKw);

    let mut tables = vec![parse_common_table(p)?];
    while p.eat(TokenKind::Comma) {
        tables.push(parse_common_table(p)?);
    }

    Ok(WithClause { recursive, tables })
}

fn parse_common_table(p: &mut Parser) -> ParseResult<CommonTable> {
    let name = parse_ident(p)?;
    let columns = if p.at(TokenKind::LParen) {
        Some(parse_ident_list(p)?)
    } else {
        None
    };
    p.expect(TokenKind::AsKw)?;

    let materialized = if p.eat(TokenKind::MaterializedKw) {
        Some(Materialized::Materialized)
    } else if p.at(TokenKind::NotKw) && p.nth(1) == TokenKind::MaterializedKw {
        p.bump();
        p.bump();
        Some(Materialized::NotMaterialized)
    } else {
        None
    };

    p.expect(TokenKind::LParen)?;
    let query = parse_select_query(p)?;
    p.expect(TokenKind::RParen)?;

    Ok(CommonTable {
        alias: SourceAlias { name, columns },
        query,
        materialized,
    })
}

fn parse_values(p: &mut Parser) -> ParseResult<SelectQuery> {
    p.expect(TokenKind::ValuesKw)?;

    let mut rows = vec![parse_values_row(p)?];
    while p.eat(TokenKind::Comma) {
        rows.push(parse_values_row(p)?);
    }

    Ok(SelectQuery::Values(ValuesQuery { rows }))
}

fn parse_values_row(p: &mut Parser) -> ParseResult<Expr> {
    p.expect(TokenKind::LParen)?;
    let mut items = vec![parse_expr(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(parse_expr(p)?);
    }
    p.expect(TokenKind::RParen)?;
    Ok(Expr::Tuple(items))
}

fn parse_simple_select(
    p: &mut Parser,
    with: Option<WithClause>,
) -> ParseResult<SelectQuery> {
    p.expect(TokenKind::SelectKw)?;

    let distinct = if p.eat(TokenKind::DistinctKw) {
        if p.eat(TokenKind::OnKw) {
            p.expect(TokenKind::LParen)?;
            let mut exprs = vec![parse_expr(p)?];
            while p.eat(TokenKind::Comma) {
                exprs.push(parse_expr(p)?);
            }
            p.expect(TokenKind::RParen)?;
            Some(Distinct::DistinctOn(exprs))
        } else {
            Some(Distinct::Distinct)
        }
    } else {
        p.eat(TokenKind::AllKw);
        None
    };

    let mut items = vec![parse_select_item(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(parse_select_item(p)?);
    }

    let from = if p.at(TokenKind::FromKw) {
        Some(parse_from_clause(p)?)
    } else {
        None
    };

    let where_clause = if p.eat(TokenKind::WhereKw) {
        Some(WhereClause {
            condition: parse_expr(p)?,
        })
    } else {
        None
    };

    let group_by = if p.at(TokenKind::GroupKw) {
        p.bump();
        p.expect(TokenKind::ByKw)?;
        let mut exprs = vec![parse_expr(p)?];
        while p.eat(TokenKind::Comma) {
            exprs.push(parse_expr(p)?);
        }
        Some(GroupByClause { exprs })
    } else {
        None
    };

    let having = if p.eat(TokenKind::HavingKw) {
        Some(HavingClause {
            condition: parse_expr(p)?,
        })
    } else {
        None
    };

    let windows = if p.at(TokenKind::WindowKw) {
        Some(parse_windows_clause(p)?)
    } else {
        None
    };

    let order_by = if p.at(TokenKind::OrderKw) {
        Some(parse_order_by_clause(p)?)
    } else {
        None
    };

    let limit = if p.eat(TokenKind::LimitKw) {
        let limit = parse_expr(p)?;
        let offset = if p.eat(TokenKind::OffsetKw) {
            Some(parse_expr(p)?)
        } else {
            None
        };
        Some(LimitClause { limit, offset })
    } else {
        None
    };

    let fetch = if p.at(TokenKind::FetchKw) {
        Some(parse_fetch_clause(p)?)
    } else {
        None
    };

    let for_clause = if p.at(TokenKind::ForKw) {
        Some(parse_for_clause(p)?)
    } else {
        None
    };

    Ok(SelectQuery::Simple(Box::new(SimpleSelect {
        with,
        select: SelectClause { distinct, items },
        from,
        where_clause,
        group_by,
        having,
        windows,
        order_by,
        limit,
        fetch,
        for_clause,
    })))
}

fn parse_select_item(p: &mut Parser) -> ParseResult<SelectItem> {
    let value = parse_expr(p)?;

    let alias = if p.eat(TokenKind::AsKw) {
        Some(parse_ident(p)?)
    } else if matches!(p.current(), TokenKind::Ident | TokenKind::DelimitedIdent) {
        // Bare aliases are limited to plain identifiers so clause
        // keywords never get swallowed.
        Some(parse_ident(p)?)
    } else {
        None
    };

    Ok(SelectItem { value, alias })
}

fn parse_from_clause(p: &mut Parser) -> ParseResult<FromClause> {
    p.expect(TokenKind::FromKw)?;
    let source = parse_source_expr(p)?;

    let mut joins = Vec::new();
    loop {
        if p.eat(TokenKind::Comma) {
            // Comma lists normalise to cross joins.
            let source = parse_source_expr(p)?;
            joins.push(JoinClause {
                join_type: RawString::new("cross join"),
                source,
                condition: None,
                lateral: false,
            });
            continue;
        }

        let join_type = match p.current() {
            TokenKind::JoinKw => {
                p.bump();
                "join"
            }
            TokenKind::InnerKw if p.nth(1) == TokenKind::JoinKw => {
                p.bump();
                p.bump();
                "inner join"
            }
            TokenKind::CrossKw if p.nth(1) == TokenKind::JoinKw => {
                p.bump();
                p.bump();
                "cross join"
            }
            TokenKind::LeftKw | TokenKind::RightKw | TokenKind::FullKw => {
                let side = match p.bump().kind {
                    TokenKind::LeftKw => "left",
                    TokenKind::RightKw => "right",
                    _ => "full",
                };
                let outer = p.eat(TokenKind::OuterKw);
                p.expect(TokenKind::JoinKw)?;
                match (side, outer) {
                    ("left", false) => "left join",
                    ("left", true) => "left outer join",
                    ("right", false) => "right join",
                    ("right", true) => "right outer join",
                    (_, false) => "full join",
                    (_, true) => "full outer join",
                }
            }
            _ => break,
        };

        let lateral = p.eat(TokenKind::LateralKw);
        let source = parse_source_expr(p)?;

        let condition = if p.eat(TokenKind::OnKw) {
            Some(JoinCondition::On(parse_expr(p)?))
        } else if p.eat(TokenKind::UsingKw) {
            p.expect(TokenKind::LParen)?;
            let mut columns = vec![Expr::column(parse_ident(p)?)];
            while p.eat(TokenKind::Comma) {
                columns.push(Expr::column(parse_ident(p)?));
            }
            p.expect(TokenKind::RParen)?;
            Some(JoinCondition::Using(Expr::ValueList(columns)))
        } else {
            None
        };

        joins.push(JoinClause {
            join_type: RawString::new(join_type),
            source,
            condition,
            lateral,
        });
    }

    Ok(FromClause { source, joins })
}

fn parse_source_expr(p: &mut Parser) -> ParseResult<SourceExpr> {
    let source = if p.at(TokenKind::LParen) {
        if matches!(
            p.nth(1),
            TokenKind::SelectKw | TokenKind::WithKw | TokenKind::ValuesKw
        ) {
            p.bump();
            let query = parse_select_query(p)?;
            p.expect(TokenKind::RParen)?;
            DataSource::Subquery(Box::new(query))
        } else {
            p.bump();
            let inner = parse_source_expr(p)?;
            p.expect(TokenKind::RParen)?;
            DataSource::Paren(Box::new(inner))
        }
    } else {
        DataSource::Table(parse_qualified_name(p)?)
    };

    let alias = if p.eat(TokenKind::AsKw) {
        let name = parse_ident(p)?;
        let columns = if p.at(TokenKind::LParen) {
            Some(parse_ident_list(p)?)
        } else {
            None
        };
        Some(SourceAlias { name, columns })
    } else if matches!(p.current(), TokenKind::Ident | TokenKind::DelimitedIdent) {
        let name = parse_ident(p)?;
        let columns = if p.at(TokenKind::LParen) {
            Some(parse_ident_list(p)?)
        } else {
            None
        };
        Some(SourceAlias { name, columns })
    } else {
        None
    };

    if alias.is_none() && matches!(source, DataSource::Subquery(_)) {
        return Err(p.error("a subquery in FROM requires an alias"));
    }

    Ok(SourceExpr { source, alias })
}

pub(crate) fn parse_order_by_clause(p: &mut Parser) -> ParseResult<OrderByClause> {
    p.expect(TokenKind::OrderKw)?;
    p.expect(TokenKind::ByKw)?;

    let mut items = vec![parse_order_by_item(p)?];
    while p.eat(TokenKind::Comma) {
        items.push(parse_order_by_item(p)?);
    }

    Ok(OrderByClause { items })
}

fn parse_order_by_item(p: &mut Parser) -> ParseResult<OrderByItem> {
    let expr = parse_expr(p)?;

    let direction = if p.eat(TokenKind::AscKw) {
        Some(SortDirection::Asc)
    } else if p.eat(TokenKind::DescKw) {
        Some(SortDirection::Desc)
    } else {
        None
    };

    let nulls = if p.eat(TokenKind::NullsKw) {
        if p.eat(TokenKind::FirstKw) {
            Some(NullsPosition::First)
        } else {
            p.expect(TokenKind::LastKw)?;
            Some(NullsPosition::Last)
        }
    } else {
        None
    };

    Ok(OrderByItem {
        expr,
        direction,
        nulls,
    })
}

fn parse_windows_clause(p: &mut Parser) -> ParseResult<WindowsClause> {
    p.expect(TokenKind::WindowKw)?;

    let mut windows = vec![parse_window_def(p)?];
    while p.eat(TokenKind::Comma) {
        windows.push(parse_window_def(p)?);
    }

    Ok(WindowsClause { windows })
}

fn parse_window_def(p: &mut Parser) -> ParseResult<WindowFrameClause> {
    let name = parse_ident(p)?;
    p.expect(TokenKind::AsKw)?;
    p.expect(TokenKind::LParen)?;
    let frame = super::parse_window_frame(p)?;
    p.expect(TokenKind::RParen)?;
    Ok(WindowFrameClause { name, frame })
}

fn parse_fetch_clause(p: &mut Parser) -> ParseResult<FetchClause> {
    p.expect(TokenKind::FetchKw)?;

    let kind = if p.eat(TokenKind::FirstKw) {
        FetchKind::First
    } else {
        p.expect(TokenKind::NextKw)?;
        FetchKind::Next
    };

    // `FETCH FIRST ROW ONLY` defaults the count to one.
    let count = if matches!(
        p.current(),
        TokenKind::RowKw | TokenKind::RowsKw | TokenKind::OnlyKw
    ) {
        Expr::number("1")
    } else {
        parse_expr(p)?
    };

    let unit = if p.eat(TokenKind::RowKw) {
        Some(FetchUnit::Row)
    } else if p.eat(TokenKind::RowsKw) {
        Some(FetchUnit::Rows)
    } else {
        None
    };

    p.expect(TokenKind::OnlyKw)?;
    Ok(FetchClause { kind, count, unit })
}

fn parse_for_clause(p: &mut Parser) -> ParseResult<ForClause> {
    p.expect(TokenKind::ForKw)?;

    let lock_mode = match p.current() {
        TokenKind::UpdateKw => {
            p.bump();
            "update"
        }
        TokenKind::ShareKw => {
            p.bump();
            "share"
        }
        TokenKind::NoKw => {
            p.bump();
            p.expect(TokenKind::KeyKw)?;
            p.expect(TokenKind::UpdateKw)?;
            "no key update"
        }
        TokenKind::KeyKw => {
            p.bump();
            p.expect(TokenKind::ShareKw)?;
            "key share"
        }
        _ => return Err(p.error("expected UPDATE, NO KEY UPDATE, SHARE or KEY SHARE")),
    };

    Ok(ForClause {
        lock_mode: RawString::new(lock_mode),
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;
    use pretty_assertions::assert_eq;

    fn simple(query: SelectQuery) -> SimpleSelect {
        match query {
            SelectQuery::Simple(select) => *select,
            other => panic!("expected simple select, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_minimal_select() {
        let select = simple(parse("SELECT 1", parse_select_query).unwrap());
        assert_eq!(select.select.items.len(), 1);
        assert_eq!(select.select.items[0].value, Expr::number("1"));
        assert!(select.from.is_none());
    }

    #[test]
    fn test_alias_with_and_without_as() {
        let select = simple(parse("SELECT id a, id AS b FROM t", parse_select_query).unwrap());
        assert_eq!(select.select.items[0].alias.as_ref().unwrap().name(), "a");
        assert_eq!(select.select.items[1].alias.as_ref().unwrap().name(), "b");
    }

    #[test]
    fn test_distinct_on() {
        let select = simple(
            parse(
                "SELECT DISTINCT ON (dept) dept, name FROM emp",
                parse_select_query,
            )
            .unwrap(),
        );
        assert!(matches!(
            select.select.distinct,
            Some(Distinct::DistinctOn(ref exprs)) if exprs.len() == 1
        ));
        assert_eq!(select.select.items.len(), 2);
    }

    #[test]
    fn test_comma_sources_normalise_to_cross_joins() {
        let select = simple(parse("SELECT * FROM a, b, c", parse_select_query).unwrap());
        let from = select.from.unwrap();
        assert_eq!(from.joins.len(), 2);
        assert!(from.joins.iter().all(|j| j.join_type.is("cross join")));
    }

    #[test]
    fn test_join_with_condition() {
        let select = simple(
            parse(
                "SELECT * FROM t LEFT JOIN u ON t.id = u.tid",
                parse_select_query,
            )
            .unwrap(),
        );
        let from = select.from.unwrap();
        assert_eq!(from.joins.len(), 1);
        assert!(from.joins[0].join_type.is("left join"));
        assert!(matches!(
            from.joins[0].condition,
            Some(JoinCondition::On(_))
        ));
    }

    #[test]
    fn test_join_using() {
        let select = simple(
            parse("SELECT * FROM t JOIN u USING (id, tid)", parse_select_query).unwrap(),
        );
        let from = select.from.unwrap();
        assert!(matches!(
            from.joins[0].condition,
            Some(JoinCondition::Using(Expr::ValueList(ref cols))) if cols.len() == 2
        ));
    }

    #[test]
    fn test_subquery_source_requires_alias() {
        assert!(parse("SELECT * FROM (SELECT 1)", parse_select_query).is_err());
        let select = simple(
            parse("SELECT * FROM (SELECT 1) s", parse_select_query).unwrap(),
        );
        let from = select.from.unwrap();
        assert!(matches!(from.source.source, DataSource::Subquery(_)));
        assert_eq!(from.source.alias.unwrap().name.name(), "s");
    }

    #[test]
    fn test_with_clause() {
        let select = simple(
            parse(
                "WITH x AS (SELECT 1) SELECT * FROM x",
                parse_select_query,
            )
            .unwrap(),
        );
        let with = select.with.unwrap();
        assert!(!with.recursive);
        assert_eq!(with.tables.len(), 1);
        assert_eq!(with.tables[0].alias.name.name(), "x");
    }

    #[test]
    fn test_recursive_with_and_materialized_hint() {
        let select = simple(
            parse(
                "WITH RECURSIVE x AS NOT MATERIALIZED (SELECT 1) SELECT * FROM x",
                parse_select_query,
            )
            .unwrap(),
        );
        let with = select.with.unwrap();
        assert!(with.recursive);
        assert_eq!(
            with.tables[0].materialized,
            Some(Materialized::NotMaterialized)
        );
    }

    #[test]
    fn test_set_operations_are_left_associative() {
        let query = parse(
            "SELECT 1 UNION SELECT 2 UNION ALL SELECT 3",
            parse_select_query,
        )
        .unwrap();
        match query {
            SelectQuery::Binary { left, op, .. } => {
                assert!(op.is("union all"));
                assert!(matches!(*left, SelectQuery::Binary { .. }));
            }
            other => panic!("expected binary select, got {other:?}"),
        }
    }

    #[test]
    fn test_values_query() {
        let query = parse("VALUES (1, 'a'), (2, 'b')", parse_select_query).unwrap();
        match query {
            SelectQuery::Values(values) => assert_eq!(values.rows.len(), 2),
            other => panic!("expected values, got {other:?}"),
        }
    }

    #[test]
    fn test_order_limit_fetch_for() {
        let select = simple(
            parse(
                "SELECT * FROM t ORDER BY id DESC NULLS LAST LIMIT 10 OFFSET 5 \
                 FETCH NEXT 3 ROWS ONLY FOR NO KEY UPDATE",
                parse_select_query,
            )
            .unwrap(),
        );
        let order = select.order_by.unwrap();
        assert_eq!(order.items[0].direction, Some(SortDirection::Desc));
        assert_eq!(order.items[0].nulls, Some(NullsPosition::Last));
        let limit = select.limit.unwrap();
        assert_eq!(limit.limit, Expr::number("10"));
        assert_eq!(limit.offset, Some(Expr::number("5")));
        let fetch = select.fetch.unwrap();
        assert_eq!(fetch.kind, FetchKind::Next);
        assert_eq!(fetch.unit, Some(FetchUnit::Rows));
        assert!(select.for_clause.unwrap().lock_mode.is("no key update"));
    }

    #[test]
    fn test_named_window_clause() {
        let select = simple(
            parse(
                "SELECT sum(x) OVER w FROM t WINDOW w AS (PARTITION BY dept)",
                parse_select_query,
            )
            .unwrap(),
        );
        let windows = select.windows.unwrap();
        assert_eq!(windows.windows.len(), 1);
        assert_eq!(windows.windows[0].name.name(), "w");
    }

    #[test]
    fn test_group_by_and_having() {
        let select = simple(
            parse(
                "SELECT dept, count(*) FROM emp GROUP BY dept HAVING count(*) > 3",
                parse_select_query,
            )
            .unwrap(),
        );
        assert_eq!(select.group_by.unwrap().exprs.len(), 1);
        assert!(select.having.is_some());
    }
}
