// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! End-to-end scenarios across the parser, formatter and passes.

use pretty_assertions::assert_eq;

use pg_sqlkit::analyzer::{selectable_columns, TableColumnResolver};
use pg_sqlkit::ast::{
    DataSource, Expr, Literal, QualifiedName, SelectQuery, SimpleSelect, Statement,
};
use pg_sqlkit::format::{FormatConfig, ParameterStyle};
use pg_sqlkit::rewriter::{normalize_ctes, remove_parameters};
use pg_sqlkit::{parse, split, Formatter, SqlIdent};

fn query(sql: &str) -> SelectQuery {
    match parse(sql).unwrap() {
        Statement::Query(query) => query,
        other => panic!("expected a query, got {other:?}"),
    }
}

fn simple(sql: &str) -> SimpleSelect {
    match query(sql) {
        SelectQuery::Simple(select) => *select,
        other => panic!("expected a simple select, got {other:?}"),
    }
}

fn format(sql: &str) -> String {
    let statement = parse(sql).unwrap();
    Formatter::new().format_statement(&statement).unwrap().sql
}

#[test]
fn scenario_1_select_one() {
    let select = simple("SELECT 1");
    assert_eq!(select.select.items.len(), 1);
    assert_eq!(
        select.select.items[0].value,
        Expr::Literal(Literal::Number("1".into())),
    );
    assert_eq!(format("SELECT 1"), "select 1");
}

#[test]
fn scenario_2_with_clause_shape() {
    let select = simple("WITH x AS (SELECT 1) SELECT * FROM x");

    let with = select.with.expect("a WITH clause");
    assert_eq!(with.tables.len(), 1);
    assert_eq!(with.tables[0].alias.name.name(), "x");
    assert_eq!(
        Formatter::new()
            .format_query(&with.tables[0].query)
            .unwrap()
            .sql,
        "select 1",
    );

    let from = select.from.expect("a FROM clause");
    match &from.source.source {
        DataSource::Table(name) => assert_eq!(name.dotted(), "x"),
        other => panic!("expected a table source, got {other:?}"),
    }
}

#[test]
fn scenario_3_positional_parameter_reuse() {
    let statement = parse("SELECT $1, $2 FROM t WHERE id = $1").unwrap();

    let config =
        FormatConfig::default().with_parameter_style(ParameterStyle::PositionalNumeric);
    let formatted = Formatter::with_config(config)
        .format_statement(&statement)
        .unwrap();

    assert_eq!(formatted.sql, r#"select $1, $2 from "t" where "id" = $1"#);
    assert_eq!(formatted.parameters, vec!["1", "2"]);
}

#[test]
fn scenario_4_parameter_removal_keeps_the_literal_predicate() {
    let stripped = remove_parameters(&query(
        "SELECT * FROM t WHERE id = :pid AND name = 'x'",
    ))
    .unwrap();

    assert_eq!(
        Formatter::new().format_query(&stripped).unwrap().sql,
        r#"select * from "t" where "name" = 'x'"#,
    );
}

#[test]
fn scenario_5_splitter() {
    let statements: Vec<String> = split("SELECT 1; SELECT ';'; /* ; */ SELECT 3;")
        .filter(|s| !s.is_empty)
        .map(|s| s.sql)
        .collect();
    assert_eq!(statements, vec!["SELECT 1", "SELECT ';'", "SELECT 3"]);
}

#[test]
fn scenario_6_cte_hoisting() {
    let normalized = normalize_ctes(&query(
        "SELECT * FROM (WITH a AS (SELECT 1) SELECT * FROM a) s, \
         (WITH a AS (SELECT 1) SELECT * FROM a) t",
    ))
    .unwrap();

    let with = normalized.with_clause().expect("a root WITH clause");
    assert_eq!(with.tables.len(), 1);
    assert_eq!(with.tables[0].alias.name.name(), "a");
    assert!(!with.recursive);

    // No WITH clause anywhere below the root.
    match &normalized {
        SelectQuery::Simple(select) => {
            let from = select.from.as_ref().unwrap();
            for source in
                std::iter::once(&from.source).chain(from.joins.iter().map(|j| &j.source))
            {
                if let DataSource::Subquery(subquery) = &source.source {
                    assert!(subquery.with_clause().is_none());
                }
            }
        }
        other => panic!("expected a simple select, got {other:?}"),
    }
}

#[test]
fn property_roundtrip_idempotence() {
    let corpus = [
        "SELECT a, b FROM t WHERE a > 1",
        "WITH x AS (SELECT 1) SELECT * FROM x",
        "SELECT * FROM a LEFT JOIN b ON a.id = b.aid ORDER BY a.id LIMIT 3",
        "SELECT CASE WHEN a THEN 1 ELSE 2 END FROM t",
        "VALUES (1, 'a'), (2, 'b')",
        "CREATE TABLE t (id integer PRIMARY KEY, name text NOT NULL)",
    ];

    for sql in corpus {
        let once = format(sql);
        let twice = format(&once);
        assert_eq!(once, twice, "not a fixed point: {sql}");
    }
}

#[test]
fn property_remover_is_identity_without_parameters() {
    let input = query("SELECT a FROM t WHERE a > 1 GROUP BY a HAVING count(*) > 2");
    assert_eq!(remove_parameters(&input).unwrap(), input);
}

#[test]
fn property_remover_is_idempotent() {
    let once =
        remove_parameters(&query("SELECT a FROM t WHERE a = :x OR b = 2")).unwrap();
    assert_eq!(remove_parameters(&once).unwrap(), once);
}

struct FixedResolver;

impl TableColumnResolver for FixedResolver {
    fn table_columns(&self, table: &QualifiedName) -> Option<Vec<SqlIdent>> {
        match table.dotted().as_str() {
            "t" => Some(vec![SqlIdent::unquoted("id"), SqlIdent::unquoted("name")]),
            "u" => Some(vec![SqlIdent::unquoted("tid")]),
            _ => None,
        }
    }
}

#[test]
fn property_selectable_columns_expand_wildcards() {
    let columns =
        selectable_columns(&simple("SELECT * FROM t"), Some(&FixedResolver)).unwrap();
    let mut formatter = Formatter::new();
    let rendered: Vec<(String, String)> = columns
        .into_iter()
        .map(|(name, value)| {
            (
                name.name().to_owned(),
                formatter.format_expr(&value).unwrap().sql,
            )
        })
        .collect();

    assert_eq!(
        rendered,
        vec![
            ("id".to_owned(), r#""t"."id""#.to_owned()),
            ("name".to_owned(), r#""t"."name""#.to_owned()),
        ],
    );
}

#[test]
fn property_qualified_wildcard_expands_one_side_of_a_join() {
    let columns = selectable_columns(
        &simple("SELECT t.* FROM t JOIN u ON t.id = u.tid"),
        Some(&FixedResolver),
    )
    .unwrap();
    let names: Vec<&str> = columns.iter().map(|(name, _)| name.name()).collect();
    assert_eq!(names, vec!["id", "name"]);
}

#[test]
fn splitter_rejoins_arbitrary_statements() {
    let parts = [
        "SELECT 'a; b'",
        "SELECT $x$; ; ;$x$",
        "SELECT /* ; */ 2",
        r#"SELECT ";" FROM t"#,
    ];
    let joined = parts.join("; ");

    let split_texts: Vec<String> = split(&joined)
        .filter(|s| !s.is_empty)
        .map(|s| s.sql)
        .collect();

    assert_eq!(split_texts.len(), parts.len());
    for (part, text) in parts.iter().zip(&split_texts) {
        assert_eq!(part.trim(), text);
    }
}

#[test]
fn warnings_share_the_error_shape() {
    let err = parse("GRANT ALL ON t TO someone").unwrap_err();
    assert!(err.is_warning());
    assert_eq!(err.kind, pg_sqlkit::DiagnosticKind::UnsupportedDdl);
    assert!(err.preview.is_some());
}
