// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the common-table collector.

use crate::ast::{CommonTable, SelectQuery};
use crate::visitor::{walk_common_table, Visit, VisitTracker};

/// Collects every common table found at any depth of `query`,
/// including inside subqueries, inline queries and `VALUES` rows.
///
/// Post-order: an inner CTE appears before the outer CTE that contains
/// it. Shared subtrees are visited once per root call.
pub fn collect_common_tables(query: &SelectQuery) -> Vec<CommonTable> {
    let mut collector = CteCollector::default();
    VisitTracker::scoped(&mut collector, |c| c.visit_query(query));
    collector.found
}

#[derive(Default)]
struct CteCollector {
    tracker: VisitTracker,
    found: Vec<CommonTable>,
}

impl AsMut<VisitTracker> for CteCollector {
    fn as_mut(&mut self) -> &mut VisitTracker {
        &mut self.tracker
    }
}

impl<'ast> Visit<'ast> for CteCollector {
    fn visit_common_table(&mut self, table: &'ast CommonTable) {
        if !self.tracker.mark(table) {
            return;
        }

        // Descend first so inner definitions come out before this one.
        walk_common_table(self, table);
        self.found.push(table.clone());
    }
}
