// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the column-reference and selectable-column collectors.

use indexmap::IndexMap;

use crate::ast::{
    DataSource, Expr, NamePart, QualifiedName, SelectQuery, SimpleSelect, SourceExpr,
    WithClause,
};
use crate::error::SqlDiagnostic;
use crate::format::Formatter;
use crate::util::{idents_refer_to_same, SqlIdent};
use crate::visitor::{Visit, VisitTracker};

/// Resolves a physical table to its column names in declaration order.
///
/// This is the one external collaborator interface the collectors
/// consume; the ddl-docs driver backs it with parsed `CREATE TABLE`
/// statements.
pub trait TableColumnResolver {
    fn table_columns(&self, table: &QualifiedName) -> Option<Vec<SqlIdent>>;
}

impl TableColumnResolver for IndexMap<String, Vec<SqlIdent>> {
    fn table_columns(&self, table: &QualifiedName) -> Option<Vec<SqlIdent>> {
        self.get(&table.dotted()).cloned()
    }
}

/// Gathers every column reference in `query`, keyed by the formatter's
/// rendering so spellings that format alike collapse. Sorted by key.
pub fn collect_column_references(
    query: &SelectQuery,
    formatter: &mut Formatter,
) -> Result<Vec<(String, QualifiedName)>, SqlDiagnostic> {
    let mut collector = ColumnRefCollector::default();
    VisitTracker::scoped(&mut collector, |c| c.visit_query(query));

    let mut found = IndexMap::new();
    for name in collector.found {
        let key = formatter.format_expr(&Expr::ColumnRef(name.clone()))?.sql;
        found.entry(key).or_insert(name);
    }

    let mut found: Vec<(String, QualifiedName)> = found.into_iter().collect();
    found.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(found)
}

#[derive(Default)]
struct ColumnRefCollector {
    tracker: VisitTracker,
    found: Vec<QualifiedName>,
}

impl AsMut<VisitTracker> for ColumnRefCollector {
    fn as_mut(&mut self) -> &mut VisitTracker {
        &mut self.tracker
    }
}

impl<'ast> Visit<'ast> for ColumnRefCollector {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if !self.tracker.mark(expr) {
            return;
        }
        if let Expr::ColumnRef(name) = expr {
            self.found.push(name.clone());
        }
        crate::visitor::walk_expr(self, expr);
    }
}

/// The `(name, value)` pairs visible in a simple select's result row,
/// with wildcards expanded and duplicate names resolved first-wins.
pub fn selectable_columns(
    select: &SimpleSelect,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<Vec<(SqlIdent, Expr)>, SqlDiagnostic> {
    let mut out: IndexMap<SqlIdent, Expr> = IndexMap::new();

    for (index, item) in select.select.items.iter().enumerate() {
        match wildcard_target(&item.value) {
            Some(None) => {
                for (name, value) in expand_all_sources(select, resolver)? {
                    out.entry(name).or_insert(value);
                }
            }
            Some(Some(qualifier)) => {
                for (name, value) in
                    expand_qualified(select, qualifier, resolver)?
                {
                    out.entry(name).or_insert(value);
                }
            }
            None => {
                let name = item
                    .alias
                    .clone()
                    .or_else(|| derived_name(&item.value))
                    .unwrap_or_else(|| {
                        SqlIdent::unquoted(format!("?column{}?", index + 1))
                    });
                out.entry(name).or_insert_with(|| item.value.clone());
            }
        }
    }

    Ok(out.into_iter().collect())
}

/// `Some(None)` for a bare `*`, `Some(Some(t))` for `t.*`, `None` for
/// anything else.
fn wildcard_target(value: &Expr) -> Option<Option<&SqlIdent>> {
    match value {
        Expr::ColumnRef(name) => match name.name() {
            NamePart::Ident(ident) if ident.is_wildcard() => {
                Some(name.last_namespace())
            }
            _ => None,
        },
        _ => None,
    }
}

fn derived_name(value: &Expr) -> Option<SqlIdent> {
    match value {
        Expr::ColumnRef(name) => name.name().as_ident().cloned(),
        Expr::FunctionCall { name, .. } => name.name().as_ident().cloned(),
        _ => None,
    }
}

fn expand_all_sources(
    select: &SimpleSelect,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<Vec<(SqlIdent, Expr)>, SqlDiagnostic> {
    let mut out = Vec::new();
    for source in select_sources(select) {
        out.extend(source_columns(source, select.with.as_ref(), resolver)?);
    }
    Ok(out)
}

fn expand_qualified(
    select: &SimpleSelect,
    qualifier: &SqlIdent,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<Vec<(SqlIdent, Expr)>, SqlDiagnostic> {
    for source in select_sources(select) {
        if let Some(binding) = source.binding_name() {
            if idents_refer_to_same(binding, qualifier) {
                return source_columns(source, select.with.as_ref(), resolver);
            }
        }
    }
    Ok(Vec::new())
}

fn select_sources(select: &SimpleSelect) -> Vec<&SourceExpr> {
    let mut sources = Vec::new();
    if let Some(from) = &select.from {
        sources.push(&from.source);
        for join in &from.joins {
            sources.push(&join.source);
        }
    }
    sources
}

/// The columns one source contributes, as `(name, binding.name)`
/// references.
fn source_columns(
    source: &SourceExpr,
    with: Option<&WithClause>,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<Vec<(SqlIdent, Expr)>, SqlDiagnostic> {
    let binding = match source.binding_name() {
        Some(binding) => binding.clone(),
        None => return Ok(Vec::new()),
    };

    // An explicit alias column list overrides every resolved name.
    if let Some(alias) = &source.alias {
        if let Some(columns) = &alias.columns {
            return Ok(reference_columns(&binding, columns.clone()));
        }
    }

    let names = match &source.source {
        DataSource::Paren(inner) => {
            return source_columns(inner, with, resolver);
        }
        DataSource::Subquery(query) => query_column_names(query, resolver)?,
        DataSource::Table(name) => {
            if let Some(table) = lookup_cte(with, name) {
                if let Some(columns) = &table.alias.columns {
                    columns.clone()
                } else {
                    query_column_names(&table.query, resolver)?
                }
            } else {
                match resolver.and_then(|r| r.table_columns(name)) {
                    Some(columns) => columns,
                    None => return Ok(Vec::new()),
                }
            }
        }
    };

    Ok(reference_columns(&binding, names))
}

fn reference_columns(binding: &SqlIdent, names: Vec<SqlIdent>) -> Vec<(SqlIdent, Expr)> {
    names
        .into_iter()
        .map(|name| {
            let value = Expr::ColumnRef(QualifiedName::new(
                vec![binding.clone()],
                NamePart::Ident(name.clone()),
            ));
            (name, value)
        })
        .collect()
}

fn query_column_names(
    query: &SelectQuery,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<Vec<SqlIdent>, SqlDiagnostic> {
    match query.leftmost_simple() {
        Some(select) => Ok(selectable_columns(select, resolver)?
            .into_iter()
            .map(|(name, _)| name)
            .collect()),
        None => Ok(Vec::new()),
    }
}

fn lookup_cte<'a>(
    with: Option<&'a WithClause>,
    name: &QualifiedName,
) -> Option<&'a crate::ast::CommonTable> {
    if !name.is_unqualified() {
        return None;
    }
    let target = name.name().as_ident()?;

    with?.tables.iter().find(|table| {
        idents_refer_to_same(&table.alias.name, target)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn simple(sql: &str) -> SimpleSelect {
        match parse(sql).unwrap() {
            crate::ast::Statement::Query(SelectQuery::Simple(select)) => *select,
            other => panic!("expected simple select, got {other:?}"),
        }
    }

    fn resolver() -> IndexMap<String, Vec<SqlIdent>> {
        let mut tables = IndexMap::new();
        tables.insert(
            "t".to_owned(),
            vec![SqlIdent::unquoted("id"), SqlIdent::unquoted("name")],
        );
        tables.insert(
            "u".to_owned(),
            vec![SqlIdent::unquoted("tid"), SqlIdent::unquoted("extra")],
        );
        tables
    }

    fn rendered(columns: Vec<(SqlIdent, Expr)>) -> Vec<(String, String)> {
        let mut formatter = Formatter::new();
        columns
            .into_iter()
            .map(|(name, value)| {
                (
                    name.name().to_owned(),
                    formatter.format_expr(&value).unwrap().sql,
                )
            })
            .collect()
    }

    #[test]
    fn bare_wildcard_expands_in_declaration_order() {
        let resolver = resolver();
        let columns =
            selectable_columns(&simple("SELECT * FROM t"), Some(&resolver)).unwrap();
        assert_eq!(
            rendered(columns),
            vec![
                ("id".to_owned(), r#""t"."id""#.to_owned()),
                ("name".to_owned(), r#""t"."name""#.to_owned()),
            ],
        );
    }

    #[test]
    fn qualified_wildcard_expands_one_source() {
        let resolver = resolver();
        let columns = selectable_columns(
            &simple("SELECT t.* FROM t JOIN u ON t.id = u.tid"),
            Some(&resolver),
        )
        .unwrap();
        let names: Vec<_> = columns.iter().map(|(n, _)| n.name().to_owned()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn duplicate_names_resolve_first_wins() {
        let mut tables = resolver();
        tables.insert(
            "v".to_owned(),
            vec![SqlIdent::unquoted("id"), SqlIdent::unquoted("other")],
        );
        let columns = selectable_columns(
            &simple("SELECT * FROM t CROSS JOIN v"),
            Some(&tables),
        )
        .unwrap();
        let names: Vec<_> = columns.iter().map(|(n, _)| n.name().to_owned()).collect();
        assert_eq!(names, vec!["id", "name", "other"]);
        // The surviving `id` is t's.
        assert_eq!(rendered(columns)[0].1, r#""t"."id""#);
    }

    #[test]
    fn cte_sources_resolve_recursively() {
        let columns = selectable_columns(
            &simple("WITH c AS (SELECT 1 AS one, 2 AS two) SELECT * FROM c"),
            None,
        )
        .unwrap();
        let names: Vec<_> = columns.iter().map(|(n, _)| n.name().to_owned()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn subquery_sources_use_aliases_and_column_lists() {
        let columns = selectable_columns(
            &simple("SELECT * FROM (SELECT 1, 2) AS s (a, b)"),
            None,
        )
        .unwrap();
        assert_eq!(
            rendered(columns),
            vec![
                ("a".to_owned(), r#""s"."a""#.to_owned()),
                ("b".to_owned(), r#""s"."b""#.to_owned()),
            ],
        );
    }

    #[test]
    fn aliases_and_plain_items_pass_through() {
        let columns = selectable_columns(
            &simple("SELECT id, name AS label, count(*) FROM t"),
            None,
        )
        .unwrap();
        let names: Vec<_> = columns.iter().map(|(n, _)| n.name().to_owned()).collect();
        assert_eq!(names, vec!["id", "label", "count"]);
    }

    #[test]
    fn unresolvable_wildcard_contributes_nothing() {
        let columns =
            selectable_columns(&simple("SELECT * FROM mystery"), None).unwrap();
        assert!(columns.is_empty());
    }

    #[test]
    fn column_reference_collection_dedupes_by_rendering() {
        let query = match parse(r#"SELECT t.id FROM t WHERE "t"."id" > 1 AND t.id < 5"#)
            .unwrap()
        {
            crate::ast::Statement::Query(query) => query,
            other => panic!("expected query, got {other:?}"),
        };
        let mut formatter = Formatter::new();
        let refs = collect_column_references(&query, &mut formatter).unwrap();
        // `t.id` and `"t"."id"` format alike under the default config.
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].0, r#""t"."id""#);
    }
}
