// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements CTE hoisting: the `WITH` eraser, the name-conflict
//! resolver, the dependency ordering and the injector.

use indexmap::IndexMap;

use crate::ast::{
    CommonTable, DataSource, Expr, FromClause, JoinClause, OverTarget, SelectQuery,
    SimpleSelect, SourceExpr, SwitchCase, ValuesQuery, WithClause,
};
use crate::error::{DiagnosticKind, SqlDiagnostic};
use crate::format::Formatter;
use crate::util::{idents_refer_to_same, SqlIdent};
use crate::visitor::{Visit, VisitTracker};

use crate::analyzer::collect_common_tables;

/// Hoists every nested `WITH` to a single clause at the root.
///
/// Same-named definitions coalesce when their rendered bodies are
/// byte-identical and fail with `CTE_NAME_CONFLICT` otherwise.
/// Definitions are emitted recursive-first, then in dependency order;
/// a cycle that is not a plain self-reference is `CTE_CYCLE`.
pub fn normalize_ctes(query: &SelectQuery) -> Result<SelectQuery, SqlDiagnostic> {
    let collected = collect_common_tables(query);
    let stripped_root = erase_with_clauses(query);

    if collected.is_empty() {
        return Ok(stripped_root);
    }

    let stripped: Vec<CommonTable> = collected
        .iter()
        .map(|table| CommonTable {
            alias: table.alias.clone(),
            query: erase_with_clauses(&table.query),
            materialized: table.materialized,
        })
        .collect();

    let kept = resolve_name_conflicts(stripped)?;
    let (tables, recursive) = order_by_dependencies(kept)?;

    Ok(inject_with(
        &stripped_root,
        WithClause { recursive, tables },
    ))
}

/// Keeps one definition per alias: single definitions survive as-is,
/// duplicates must render byte-identically.
fn resolve_name_conflicts(
    tables: Vec<CommonTable>,
) -> Result<Vec<CommonTable>, SqlDiagnostic> {
    let mut groups: IndexMap<SqlIdent, Vec<CommonTable>> = IndexMap::new();
    for table in tables {
        groups
            .entry(table.alias.name.clone())
            .or_default()
            .push(table);
    }

    let mut formatter = Formatter::new();
    let mut kept = Vec::new();
    for (alias, mut group) in groups {
        if group.len() > 1 {
            let first = formatter.format_query(&group[0].query)?.sql;
            for other in &group[1..] {
                if formatter.format_query(&other.query)?.sql != first {
                    return Err(SqlDiagnostic::error(
                        DiagnosticKind::CteNameConflict,
                        format!(
                            "common table '{}' is defined more than once with different bodies",
                            alias.name()
                        ),
                    ));
                }
            }
        }
        kept.push(group.swap_remove(0));
    }

    Ok(kept)
}

/// Orders kept definitions: self-referencing (recursive) ones first in
/// discovery order, then the rest topologically so dependencies
/// precede dependents. Returns the recursive flag for the clause.
fn order_by_dependencies(
    tables: Vec<CommonTable>,
) -> Result<(Vec<CommonTable>, bool), SqlDiagnostic> {
    let references: Vec<Vec<usize>> = tables
        .iter()
        .map(|table| {
            let referenced = referenced_tables(&table.query);
            tables
                .iter()
                .enumerate()
                .filter(|(_, other)| {
                    referenced
                        .iter()
                        .any(|name| idents_refer_to_same(name, &other.alias.name))
                })
                .map(|(index, _)| index)
                .collect()
        })
        .collect();

    let recursive: Vec<usize> = (0..tables.len())
        .filter(|&i| references[i].contains(&i))
        .collect();
    let is_recursive = !recursive.is_empty();

    let rest: Vec<usize> = (0..tables.len())
        .filter(|i| !recursive.contains(i))
        .collect();

    // Kahn's algorithm over the non-recursive remainder; dependencies
    // on recursive definitions are satisfied by their head position.
    let mut placed: Vec<usize> = Vec::new();
    let mut remaining = rest.clone();
    while !remaining.is_empty() {
        let next = remaining.iter().position(|&candidate| {
            references[candidate]
                .iter()
                .all(|&dep| dep == candidate || !remaining.contains(&dep))
        });

        match next {
            Some(pos) => {
                let index = remaining.remove(pos);
                placed.push(index);
            }
            None => {
                let names: Vec<&str> = remaining
                    .iter()
                    .map(|&i| tables[i].alias.name.name())
                    .collect();
                return Err(SqlDiagnostic::error(
                    DiagnosticKind::CteCycle,
                    format!(
                        "cyclic references among common tables: {}",
                        names.join(", ")
                    ),
                ));
            }
        }
    }

    let mut order = recursive;
    order.extend(placed);

    let mut by_index: Vec<Option<CommonTable>> = tables.into_iter().map(Some).collect();
    let ordered = order
        .into_iter()
        .map(|index| by_index[index].take().expect("each index placed once"))
        .collect();

    Ok((ordered, is_recursive))
}

/// Unqualified table names referenced as sources anywhere in `query`.
fn referenced_tables(query: &SelectQuery) -> Vec<SqlIdent> {
    #[derive(Default)]
    struct Referenced {
        tracker: VisitTracker,
        names: Vec<SqlIdent>,
    }

    impl AsMut<VisitTracker> for Referenced {
        fn as_mut(&mut self) -> &mut VisitTracker {
            &mut self.tracker
        }
    }

    impl<'ast> Visit<'ast> for Referenced {
        fn visit_source_expr(&mut self, source: &'ast SourceExpr) {
            if !self.tracker.mark(source) {
                return;
            }
            if let DataSource::Table(name) = &source.source {
                if name.is_unqualified() {
                    if let Some(ident) = name.name().as_ident() {
                        self.names.push(ident.clone());
                    }
                }
            }
            crate::visitor::walk_source_expr(self, source);
        }
    }

    let mut collector = Referenced::default();
    VisitTracker::scoped(&mut collector, |c| c.visit_query(query));
    collector.names
}

/// Wraps `query` with `with`: a simple select has its clause replaced,
/// a set operation receives it in the leftmost leaf select.
pub fn inject_with(query: &SelectQuery, with: WithClause) -> SelectQuery {
    match query {
        SelectQuery::Simple(select) => {
            let mut select = select.as_ref().clone();
            select.with = Some(with);
            SelectQuery::Simple(Box::new(select))
        }
        SelectQuery::Binary { left, op, right } => SelectQuery::Binary {
            left: Box::new(inject_with(left, with)),
            op: op.clone(),
            right: right.clone(),
        },
        SelectQuery::Values(values) => SelectQuery::Values(values.clone()),
    }
}

/// Produces a structurally identical query with every `WITH` clause
/// removed, at any depth. Table references to erased definitions stay
/// as-is for the injector to reattach.
pub fn erase_with_clauses(query: &SelectQuery) -> SelectQuery {
    match query {
        SelectQuery::Simple(select) => {
            SelectQuery::Simple(Box::new(erase_simple(select)))
        }
        SelectQuery::Binary { left, op, right } => SelectQuery::Binary {
            left: Box::new(erase_with_clauses(left)),
            op: op.clone(),
            right: Box::new(erase_with_clauses(right)),
        },
        SelectQuery::Values(values) => SelectQuery::Values(ValuesQuery {
            rows: values.rows.iter().map(erase_expr).collect(),
        }),
    }
}

fn erase_simple(select: &SimpleSelect) -> SimpleSelect {
    let mut out = select.clone();
    out.with = None;

    for item in &mut out.select.items {
        item.value = erase_expr(&item.value);
    }
    if let Some(crate::ast::Distinct::DistinctOn(exprs)) = &mut out.select.distinct {
        *exprs = exprs.iter().map(erase_expr).collect();
    }
    out.from = select.from.as_ref().map(erase_from);
    if let Some(where_clause) = &mut out.where_clause {
        where_clause.condition = erase_expr(&where_clause.condition);
    }
    if let Some(group_by) = &mut out.group_by {
        group_by.exprs = group_by.exprs.iter().map(erase_expr).collect();
    }
    if let Some(having) = &mut out.having {
        having.condition = erase_expr(&having.condition);
    }
    if let Some(order_by) = &mut out.order_by {
        for item in &mut order_by.items {
            item.expr = erase_expr(&item.expr);
        }
    }
    if let Some(windows) = &mut out.windows {
        for window in &mut windows.windows {
            window.frame = erase_window_frame(&window.frame);
        }
    }
    if let Some(limit) = &mut out.limit {
        limit.limit = erase_expr(&limit.limit);
        limit.offset = limit.offset.as_ref().map(erase_expr);
    }
    if let Some(fetch) = &mut out.fetch {
        fetch.count = erase_expr(&fetch.count);
    }

    out
}

fn erase_window_frame(frame: &crate::ast::WindowFrame) -> crate::ast::WindowFrame {
    crate::ast::WindowFrame {
        partition_by: frame.partition_by.as_ref().map(|clause| {
            crate::ast::PartitionByClause {
                exprs: clause.exprs.iter().map(erase_expr).collect(),
            }
        }),
        order_by: frame.order_by.as_ref().map(|clause| crate::ast::OrderByClause {
            items: clause
                .items
                .iter()
                .map(|item| crate::ast::OrderByItem {
                    expr: erase_expr(&item.expr),
                    direction: item.direction,
                    nulls: item.nulls,
                })
                .collect(),
        }),
        frame: frame.frame.clone(),
    }
}

fn erase_from(from: &FromClause) -> FromClause {
    FromClause {
        source: erase_source(&from.source),
        joins: from
            .joins
            .iter()
            .map(|join| JoinClause {
                join_type: join.join_type.clone(),
                source: erase_source(&join.source),
                condition: join.condition.as_ref().map(|condition| match condition {
                    crate::ast::JoinCondition::On(expr) => {
                        crate::ast::JoinCondition::On(erase_expr(expr))
                    }
                    crate::ast::JoinCondition::Using(expr) => {
                        crate::ast::JoinCondition::Using(erase_expr(expr))
                    }
                }),
                lateral: join.lateral,
            })
            .collect(),
    }
}

fn erase_source(source: &SourceExpr) -> SourceExpr {
    SourceExpr {
        source: match &source.source {
            DataSource::Table(name) => DataSource::Table(name.clone()),
            DataSource::Paren(inner) => DataSource::Paren(Box::new(erase_source(inner))),
            DataSource::Subquery(query) => {
                DataSource::Subquery(Box::new(erase_with_clauses(query)))
            }
        },
        alias: source.alias.clone(),
    }
}

fn erase_expr(expr: &Expr) -> Expr {
    match expr {
        Expr::Literal(_)
        | Expr::ColumnRef(_)
        | Expr::Parameter(_)
        | Expr::TypeValue(_)
        | Expr::StringSpecifier { .. } => expr.clone(),
        Expr::FunctionCall { name, arg, over } => Expr::FunctionCall {
            name: name.clone(),
            arg: arg.as_ref().map(|arg| Box::new(erase_expr(arg))),
            over: over.as_ref().map(|over| match over {
                OverTarget::Name(name) => OverTarget::Name(name.clone()),
                OverTarget::Frame(frame) => OverTarget::Frame(erase_window_frame(frame)),
            }),
        },
        Expr::Unary { op, operand } => Expr::Unary {
            op: op.clone(),
            operand: Box::new(erase_expr(operand)),
        },
        Expr::Binary { left, op, right } => Expr::Binary {
            left: Box::new(erase_expr(left)),
            op: op.clone(),
            right: Box::new(erase_expr(right)),
        },
        Expr::Paren(inner) => Expr::Paren(Box::new(erase_expr(inner))),
        Expr::Tuple(items) => Expr::Tuple(items.iter().map(erase_expr).collect()),
        Expr::ValueList(items) => {
            Expr::ValueList(items.iter().map(erase_expr).collect())
        }
        Expr::Array(items) => Expr::Array(items.iter().map(erase_expr).collect()),
        Expr::Cast { operand, ty } => Expr::Cast {
            operand: Box::new(erase_expr(operand)),
            ty: ty.clone(),
        },
        Expr::Case { selector, switch } => Expr::Case {
            selector: selector.as_ref().map(|s| Box::new(erase_expr(s))),
            switch: SwitchCase {
                pairs: switch
                    .pairs
                    .iter()
                    .map(|pair| crate::ast::CaseKeyValue {
                        when: erase_expr(&pair.when),
                        then: erase_expr(&pair.then),
                    })
                    .collect(),
                else_value: switch
                    .else_value
                    .as_ref()
                    .map(|e| Box::new(erase_expr(e))),
            },
        },
        Expr::Between {
            operand,
            lower,
            upper,
            negated,
        } => Expr::Between {
            operand: Box::new(erase_expr(operand)),
            lower: Box::new(erase_expr(lower)),
            upper: Box::new(erase_expr(upper)),
            negated: *negated,
        },
        Expr::InlineQuery(query) => {
            Expr::InlineQuery(Box::new(erase_with_clauses(query)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn query(sql: &str) -> SelectQuery {
        match parse(sql).unwrap() {
            crate::ast::Statement::Query(query) => query,
            other => panic!("expected query, got {other:?}"),
        }
    }

    fn normalized(sql: &str) -> String {
        let normalized = normalize_ctes(&query(sql)).unwrap();
        Formatter::new().format_query(&normalized).unwrap().sql
    }

    #[test]
    fn root_with_stays_at_root() {
        assert_eq!(
            normalized("WITH x AS (SELECT 1) SELECT * FROM x"),
            r#"with "x" as (select 1) select * from "x""#,
        );
    }

    #[test]
    fn nested_withs_hoist_to_a_single_root_clause() {
        assert_eq!(
            normalized(
                "SELECT * FROM (WITH a AS (SELECT 1) SELECT * FROM a) s, \
                 (WITH a AS (SELECT 1) SELECT * FROM a) t",
            ),
            r#"with "a" as (select 1) select * from (select * from "a") as "s" cross join (select * from "a") as "t""#,
        );
    }

    #[test]
    fn identical_duplicate_bodies_coalesce() {
        let result = normalize_ctes(&query(
            "WITH a AS (SELECT 1) SELECT * FROM (WITH a AS (SELECT 1) SELECT * FROM a) s",
        ))
        .unwrap();
        let ctes = result.with_clause().unwrap();
        assert_eq!(ctes.tables.len(), 1);
    }

    #[test]
    fn different_duplicate_bodies_conflict() {
        let err = normalize_ctes(&query(
            "WITH a AS (SELECT 1) SELECT * FROM (WITH a AS (SELECT 2) SELECT * FROM a) s",
        ))
        .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::CteNameConflict);
    }

    #[test]
    fn dependencies_precede_dependents() {
        let result = normalize_ctes(&query(
            "WITH b AS (SELECT * FROM a), a AS (SELECT 1) SELECT * FROM b",
        ))
        .unwrap();
        let names: Vec<_> = result
            .with_clause()
            .unwrap()
            .tables
            .iter()
            .map(|t| t.alias.name.name().to_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn self_reference_marks_the_clause_recursive() {
        let result = normalize_ctes(&query(
            "WITH RECURSIVE r AS (SELECT 1 UNION ALL SELECT n + 1 FROM r) \
             SELECT * FROM r",
        ))
        .unwrap();
        let with = result.with_clause().unwrap();
        assert!(with.recursive);
        assert_eq!(with.tables[0].alias.name.name(), "r");
    }

    #[test]
    fn recursive_definitions_lead_the_clause() {
        let result = normalize_ctes(&query(
            "WITH plain AS (SELECT 1), r AS (SELECT 1 UNION ALL SELECT n + 1 FROM r) \
             SELECT * FROM plain, r",
        ))
        .unwrap();
        let names: Vec<_> = result
            .with_clause()
            .unwrap()
            .tables
            .iter()
            .map(|t| t.alias.name.name().to_owned())
            .collect();
        assert_eq!(names, vec!["r", "plain"]);
    }

    #[test]
    fn mutual_cycle_is_an_error() {
        let err = normalize_ctes(&query(
            "WITH a AS (SELECT * FROM b), b AS (SELECT * FROM a) SELECT * FROM a",
        ))
        .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::CteCycle);
    }

    #[test]
    fn injection_into_set_operations_targets_the_leftmost_leaf() {
        let result = normalize_ctes(&query(
            "SELECT * FROM (WITH c AS (SELECT 1) SELECT * FROM c) s \
             UNION SELECT 2",
        ))
        .unwrap();
        match result {
            SelectQuery::Binary { left, .. } => {
                assert!(left.with_clause().is_some());
            }
            other => panic!("expected a set operation, got {other:?}"),
        }
    }

    #[test]
    fn eraser_removes_every_with_clause() {
        let erased = erase_with_clauses(&query(
            "WITH x AS (SELECT 1) SELECT * FROM x, (WITH y AS (SELECT 2) SELECT * FROM y) s",
        ));
        assert!(collect_common_tables(&erased).is_empty());
        assert!(erased.with_clause().is_none());
    }
}
