// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the table-source collector.

use indexmap::IndexMap;

use crate::ast::{DataSource, QualifiedName, SelectQuery, SourceExpr};
use crate::visitor::{Visit, VisitTracker};

/// Gathers table sources appearing in `FROM`/`JOIN` positions.
///
/// With `selectable_only`, only sources whose columns are in scope at
/// the root select are reported (the root's from clause and joins);
/// otherwise the whole tree is searched. Deduplicated by qualified
/// name and sorted alphabetically.
pub fn collect_table_sources(
    query: &SelectQuery,
    selectable_only: bool,
) -> Vec<QualifiedName> {
    let mut collector = TableSourceCollector::default();

    if selectable_only {
        if let Some(select) = query.leftmost_simple() {
            if let Some(from) = &select.from {
                collector.take_source(&from.source);
                for join in &from.joins {
                    collector.take_source(&join.source);
                }
            }
        }
    } else {
        VisitTracker::scoped(&mut collector, |c| c.visit_query(query));
    }

    let mut found: Vec<QualifiedName> = collector.found.into_values().collect();
    found.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    found
}

fn sort_key(name: &QualifiedName) -> String {
    let mut parts: Vec<String> = name
        .namespaces()
        .iter()
        .map(|ns| fold(ns.name(), ns.is_quoted()))
        .collect();
    parts.push(fold(name.name().text(), false));
    parts.join(".")
}

fn fold(name: &str, quoted: bool) -> String {
    if quoted {
        name.to_owned()
    } else {
        name.to_lowercase()
    }
}

#[derive(Default)]
struct TableSourceCollector {
    tracker: VisitTracker,
    found: IndexMap<String, QualifiedName>,
}

impl TableSourceCollector {
    /// Records the table behind one from/join entry, looking through
    /// parentheses but not into subqueries.
    fn take_source(&mut self, source: &SourceExpr) {
        match &source.source {
            DataSource::Table(name) => self.take_table(name),
            DataSource::Paren(inner) => self.take_source(inner),
            DataSource::Subquery(_) => {}
        }
    }

    fn take_table(&mut self, name: &QualifiedName) {
        self.found.entry(sort_key(name)).or_insert_with(|| name.clone());
    }
}

impl AsMut<VisitTracker> for TableSourceCollector {
    fn as_mut(&mut self) -> &mut VisitTracker {
        &mut self.tracker
    }
}

impl<'ast> Visit<'ast> for TableSourceCollector {
    fn visit_source_expr(&mut self, source: &'ast SourceExpr) {
        if !self.tracker.mark(source) {
            return;
        }
        if let DataSource::Table(name) = &source.source {
            self.take_table(name);
        }
        crate::visitor::walk_source_expr(self, source);
    }
}
