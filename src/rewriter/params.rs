// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the parameter remover.
//!
//! Prunes every parameter-touching subexpression: logical conjunctions
//! keep their parameter-free side, everything else is dropped whole.
//! Clauses that drain empty disappear with one exception, the select
//! clause, which fails with `EMPTY_SELECT` instead.

use crate::ast::{
    Distinct, Expr, FromClause, JoinClause, JoinCondition, OrderByClause, SelectClause,
    SelectQuery, SimpleSelect, SourceExpr, SwitchCase, ValuesQuery, WindowFrame,
    WithClause,
};
use crate::error::{DiagnosticKind, SqlDiagnostic};
use crate::visitor::{Visit, VisitTracker};

/// Returns a structurally new query with every parameter-touching
/// subexpression removed. The input is not mutated.
pub fn remove_parameters(query: &SelectQuery) -> Result<SelectQuery, SqlDiagnostic> {
    remove_query(query)
}

/// Expression-level entry point. `None` means the whole expression was
/// parameter-touching.
pub fn remove_parameters_from_expr(expr: &Expr) -> Option<Expr> {
    remove_expr(expr)
}

fn remove_query(query: &SelectQuery) -> Result<SelectQuery, SqlDiagnostic> {
    match query {
        SelectQuery::Simple(select) => {
            Ok(SelectQuery::Simple(Box::new(remove_simple(select)?)))
        }
        SelectQuery::Binary { left, op, right } => Ok(SelectQuery::Binary {
            left: Box::new(remove_query(left)?),
            op: op.clone(),
            right: Box::new(remove_query(right)?),
        }),
        SelectQuery::Values(values) => {
            let rows: Vec<Expr> = values.rows.iter().filter_map(remove_expr).collect();
            if rows.is_empty() {
                return Err(SqlDiagnostic::error(
                    DiagnosticKind::EmptySelect,
                    "parameter removal drained every VALUES row",
                ));
            }
            Ok(SelectQuery::Values(ValuesQuery { rows }))
        }
    }
}

fn remove_simple(select: &SimpleSelect) -> Result<SimpleSelect, SqlDiagnostic> {
    let with = match &select.with {
        Some(with) => {
            let tables = with
                .tables
                .iter()
                .map(|table| {
                    Ok(crate::ast::CommonTable {
                        alias: table.alias.clone(),
                        query: remove_query(&table.query)?,
                        materialized: table.materialized,
                    })
                })
                .collect::<Result<Vec<_>, SqlDiagnostic>>()?;
            Some(WithClause {
                recursive: with.recursive,
                tables,
            })
        }
        None => None,
    };

    let items: Vec<crate::ast::SelectItem> = select
        .select
        .items
        .iter()
        .filter_map(|item| {
            remove_expr(&item.value).map(|value| crate::ast::SelectItem {
                value,
                alias: item.alias.clone(),
            })
        })
        .collect();
    if items.is_empty() {
        return Err(SqlDiagnostic::error(
            DiagnosticKind::EmptySelect,
            "parameter removal would empty the select clause",
        ));
    }

    let distinct = match &select.select.distinct {
        Some(Distinct::Distinct) => Some(Distinct::Distinct),
        Some(Distinct::DistinctOn(exprs)) => {
            let exprs: Vec<Expr> = exprs.iter().filter_map(remove_expr).collect();
            if exprs.is_empty() {
                None
            } else {
                Some(Distinct::DistinctOn(exprs))
            }
        }
        None => None,
    };

    let from = select.from.as_ref().map(remove_from).transpose()?;

    let where_clause = select
        .where_clause
        .as_ref()
        .and_then(|clause| remove_expr(&clause.condition))
        .map(|condition| crate::ast::WhereClause { condition });

    let group_by = select.group_by.as_ref().and_then(|clause| {
        let exprs: Vec<Expr> = clause.exprs.iter().filter_map(remove_expr).collect();
        if exprs.is_empty() {
            None
        } else {
            Some(crate::ast::GroupByClause { exprs })
        }
    });

    let having = select
        .having
        .as_ref()
        .and_then(|clause| remove_expr(&clause.condition))
        .map(|condition| crate::ast::HavingClause { condition });

    let windows = select.windows.as_ref().map(|clause| crate::ast::WindowsClause {
        windows: clause
            .windows
            .iter()
            .map(|window| crate::ast::WindowFrameClause {
                name: window.name.clone(),
                frame: remove_window_frame(&window.frame),
            })
            .collect(),
    });

    let order_by = select.order_by.as_ref().and_then(remove_order_by);

    let limit = select.limit.as_ref().and_then(|clause| {
        if contains_parameter(&clause.limit) {
            return None;
        }
        let offset = clause
            .offset
            .as_ref()
            .filter(|offset| !contains_parameter(offset))
            .cloned();
        Some(crate::ast::LimitClause {
            limit: clause.limit.clone(),
            offset,
        })
    });

    let fetch = select
        .fetch
        .as_ref()
        .filter(|clause| !contains_parameter(&clause.count))
        .cloned();

    Ok(SimpleSelect {
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
        for_clause: select.for_clause.clone(),
    })
}

fn remove_from(from: &FromClause) -> Result<FromClause, SqlDiagnostic> {
    Ok(FromClause {
        source: remove_source(&from.source)?,
        joins: from
            .joins
            .iter()
            .map(|join| {
                // A join condition that drains is removed from the
                // join; the source itself stays.
                let condition = match &join.condition {
                    Some(JoinCondition::On(expr)) => {
                        remove_expr(expr).map(JoinCondition::On)
                    }
                    Some(JoinCondition::Using(expr)) => {
                        remove_expr(expr).map(JoinCondition::Using)
                    }
                    None => None,
                };
                Ok(JoinClause {
                    join_type: join.join_type.clone(),
                    source: remove_source(&join.source)?,
                    condition,
                    lateral: join.lateral,
                })
            })
            .collect::<Result<Vec<_>, SqlDiagnostic>>()?,
    })
}

fn remove_source(source: &SourceExpr) -> Result<SourceExpr, SqlDiagnostic> {
    Ok(SourceExpr {
        source: match &source.source {
            crate::ast::DataSource::Table(name) => {
                crate::ast::DataSource::Table(name.clone())
            }
            crate::ast::DataSource::Paren(inner) => {
                crate::ast::DataSource::Paren(Box::new(remove_source(inner)?))
            }
            crate::ast::DataSource::Subquery(query) => {
                crate::ast::DataSource::Subquery(Box::new(remove_query(query)?))
            }
        },
        alias: source.alias.clone(),
    })
}

fn remove_order_by(clause: &OrderByClause) -> Option<OrderByClause> {
    let items: Vec<crate::ast::OrderByItem> = clause
        .items
        .iter()
        .filter_map(|item| {
            remove_expr(&item.expr).map(|expr| crate::ast::OrderByItem {
                expr,
                direction: item.direction,
                nulls: item.nulls,
            })
        })
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(OrderByClause { items })
    }
}

fn remove_window_frame(frame: &WindowFrame) -> WindowFrame {
    WindowFrame {
        partition_by: frame.partition_by.as_ref().and_then(|clause| {
            let exprs: Vec<Expr> = clause.exprs.iter().filter_map(remove_expr).collect();
            if exprs.is_empty() {
                None
            } else {
                Some(crate::ast::PartitionByClause { exprs })
            }
        }),
        order_by: frame.order_by.as_ref().and_then(remove_order_by),
        frame: frame.frame.clone(),
    }
}

fn remove_expr(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Parameter(_) => None,
        Expr::Binary { left, op, right } if op.is("and") || op.is("or") => {
            match (remove_expr(left), remove_expr(right)) {
                (None, None) => None,
                (Some(side), None) | (None, Some(side)) => Some(side),
                (Some(left), Some(right)) => Some(Expr::Binary {
                    left: Box::new(left),
                    op: op.clone(),
                    right: Box::new(right),
                }),
            }
        }
        Expr::Binary { left, right, .. } => {
            if contains_parameter(left) || contains_parameter(right) {
                None
            } else {
                Some(expr.clone())
            }
        }
        Expr::Case { selector, switch } => {
            if let Some(selector) = selector {
                if contains_parameter(selector) {
                    return None;
                }
            }

            let pairs: Vec<crate::ast::CaseKeyValue> = switch
                .pairs
                .iter()
                .filter(|pair| {
                    !contains_parameter(&pair.when) && !contains_parameter(&pair.then)
                })
                .cloned()
                .collect();
            let else_value = switch
                .else_value
                .as_ref()
                .filter(|value| !contains_parameter(value))
                .cloned();

            if pairs.is_empty() && else_value.is_none() {
                return None;
            }

            Some(Expr::Case {
                selector: selector.clone(),
                switch: SwitchCase { pairs, else_value },
            })
        }
        // Everything else is removed whole when any leaf below it is a
        // parameter.
        _ => {
            if contains_parameter(expr) {
                None
            } else {
                Some(expr.clone())
            }
        }
    }
}

/// Whether any leaf of `expr` (including inline queries) is a
/// parameter expression.
fn contains_parameter(expr: &Expr) -> bool {
    #[derive(Default)]
    struct Finder {
        tracker: VisitTracker,
        found: bool,
    }

    impl AsMut<VisitTracker> for Finder {
        fn as_mut(&mut self) -> &mut VisitTracker {
            &mut self.tracker
        }
    }

    impl<'ast> Visit<'ast> for Finder {
        fn visit_parameter(&mut self, _: &'ast crate::ast::Parameter) {
            self.found = true;
        }
    }

    let mut finder = Finder::default();
    VisitTracker::scoped(&mut finder, |f| f.visit_expr(expr));
    finder.found
}
