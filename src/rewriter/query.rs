// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the query normalizer.
//!
//! Passes that need a plain `SELECT` to hang clauses off (the CTE
//! injector, the selectable-column collector) use this to reduce any
//! query shape to one: set operations and `VALUES` become the body of
//! a `SELECT * FROM (…) AS q`.

use crate::ast::{
    DataSource, FromClause, SelectClause, SelectQuery, SimpleSelect, SourceAlias,
    SourceExpr,
};
use crate::util::SqlIdent;

/// The alias given to a wrapped query body.
const WRAPPER_ALIAS: &str = "q";

/// Returns `query` as a simple select, wrapping set operations and
/// `VALUES` bodies as subqueries. Simple selects pass through
/// unchanged; the input is never mutated.
pub fn normalize_query(query: &SelectQuery) -> SimpleSelect {
    match query {
        SelectQuery::Simple(select) => select.as_ref().clone(),
        SelectQuery::Binary { .. } | SelectQuery::Values(_) => SimpleSelect {
            select: SelectClause::default(),
            from: Some(FromClause {
                source: SourceExpr {
                    source: DataSource::Subquery(Box::new(query.clone())),
                    alias: Some(SourceAlias {
                        name: SqlIdent::unquoted(WRAPPER_ALIAS),
                        columns: None,
                    }),
                },
                joins: Vec::new(),
            }),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Formatter;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn query(sql: &str) -> SelectQuery {
        match parse(sql).unwrap() {
            crate::ast::Statement::Query(query) => query,
            other => panic!("expected query, got {other:?}"),
        }
    }

    fn normalized(sql: &str) -> String {
        let select = SelectQuery::Simple(Box::new(normalize_query(&query(sql))));
        Formatter::new().format_query(&select).unwrap().sql
    }

    #[test]
    fn simple_selects_pass_through() {
        assert_eq!(
            normalized("SELECT id FROM t WHERE id > 1"),
            r#"select "id" from "t" where "id" > 1"#,
        );
    }

    #[test]
    fn set_operations_are_wrapped() {
        assert_eq!(
            normalized("SELECT 1 UNION ALL SELECT 2"),
            r#"select * from (select 1 union all select 2) as "q""#,
        );
    }

    #[test]
    fn values_bodies_are_wrapped() {
        assert_eq!(
            normalized("VALUES (1, 'a'), (2, 'b')"),
            r#"select * from (values (1, 'a'), (2, 'b')) as "q""#,
        );
    }

    #[test]
    fn normalization_does_not_mutate_the_input() {
        let input = query("SELECT 1 UNION SELECT 2");
        let before = input.clone();
        let _ = normalize_query(&input);
        assert_eq!(input, before);
    }
}
