// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the visitor framework the collectors are built on.
//!
//! Visitors override the hooks they care about; the `walk_*` functions
//! descend into every child. Per-visit scratch state lives in a
//! [`VisitTracker`]: the outermost call owns it, recursive descents
//! borrow it, and it is reset on the outer return even when a visit
//! bails early.

use indexmap::IndexSet;

use crate::ast::{
    AlterAction, CommonTable, DataSource, DdlStatement, Distinct, Expr, FrameBound,
    FromClause, JoinClause, JoinCondition, OrderByClause, OverTarget, Parameter,
    QualifiedName, SelectItem, SelectQuery, SimpleSelect, SourceExpr, Statement,
    WindowFrame, WithClause,
};

/// Read-only visitor over an AST.
#[allow(unused_variables)]
pub trait Visit<'ast> {
    fn visit_statement(&mut self, statement: &'ast Statement) {
        walk_statement(self, statement);
    }

    fn visit_ddl(&mut self, ddl: &'ast DdlStatement) {
        walk_ddl(self, ddl);
    }

    fn visit_query(&mut self, query: &'ast SelectQuery) {
        walk_query(self, query);
    }

    fn visit_simple_select(&mut self, select: &'ast SimpleSelect) {
        walk_simple_select(self, select);
    }

    fn visit_with_clause(&mut self, with: &'ast WithClause) {
        walk_with_clause(self, with);
    }

    fn visit_common_table(&mut self, table: &'ast CommonTable) {
        walk_common_table(self, table);
    }

    fn visit_select_item(&mut self, item: &'ast SelectItem) {
        walk_select_item(self, item);
    }

    fn visit_from_clause(&mut self, from: &'ast FromClause) {
        walk_from_clause(self, from);
    }

    fn visit_source_expr(&mut self, source: &'ast SourceExpr) {
        walk_source_expr(self, source);
    }

    fn visit_join_clause(&mut self, join: &'ast JoinClause) {
        walk_join_clause(self, join);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_window_frame(&mut self, frame: &'ast WindowFrame) {
        walk_window_frame(self, frame);
    }

    fn visit_order_by_clause(&mut self, order_by: &'ast OrderByClause) {
        walk_order_by_clause(self, order_by);
    }

    fn visit_qualified_name(&mut self, name: &'ast QualifiedName) {}

    fn visit_parameter(&mut self, parameter: &'ast Parameter) {}
}

pub fn walk_statement<'ast, V>(visitor: &mut V, statement: &'ast Statement)
where
    V: Visit<'ast> + ?Sized,
{
    match statement {
        Statement::Query(query) => visitor.visit_query(query),
        Statement::Ddl(ddl) => visitor.visit_ddl(ddl),
    }
}

pub fn walk_ddl<'ast, V>(visitor: &mut V, ddl: &'ast DdlStatement)
where
    V: Visit<'ast> + ?Sized,
{
    match ddl {
        DdlStatement::CreateTable(table) => {
            visitor.visit_qualified_name(&table.name);
            for column in &table.columns {
                for constraint in &column.constraints {
                    walk_constraint_kind(visitor, &constraint.kind);
                }
            }
            for constraint in &table.constraints {
                walk_constraint_kind(visitor, &constraint.kind);
            }
        }
        DdlStatement::AlterTable(alter) => {
            visitor.visit_qualified_name(&alter.name);
            for action in &alter.actions {
                match action {
                    AlterAction::AddConstraint(constraint) => {
                        walk_constraint_kind(visitor, &constraint.kind);
                    }
                    AlterAction::AlterColumnDefault { default, .. } => {
                        if let Some(default) = default {
                            visitor.visit_expr(default);
                        }
                    }
                }
            }
        }
        DdlStatement::CreateIndex(index) => {
            visitor.visit_qualified_name(&index.table);
            for column in &index.columns {
                visitor.visit_expr(column);
            }
        }
        DdlStatement::CommentOn(comment) => {
            visitor.visit_qualified_name(&comment.name);
            if let Some(expr) = &comment.comment {
                visitor.visit_expr(expr);
            }
        }
    }
}

fn walk_constraint_kind<'ast, V>(visitor: &mut V, kind: &'ast crate::ast::ConstraintKind)
where
    V: Visit<'ast> + ?Sized,
{
    match kind {
        crate::ast::ConstraintKind::Default(expr)
        | crate::ast::ConstraintKind::Check(expr) => visitor.visit_expr(expr),
        crate::ast::ConstraintKind::ForeignKey { references, .. } => {
            visitor.visit_qualified_name(&references.table);
        }
        _ => {}
    }
}

pub fn walk_query<'ast, V>(visitor: &mut V, query: &'ast SelectQuery)
where
    V: Visit<'ast> + ?Sized,
{
    match query {
        SelectQuery::Simple(select) => visitor.visit_simple_select(select),
        SelectQuery::Binary { left, right, .. } => {
            visitor.visit_query(left);
            visitor.visit_query(right);
        }
        SelectQuery::Values(values) => {
            for row in &values.rows {
                visitor.visit_expr(row);
            }
        }
    }
}

pub fn walk_simple_select<'ast, V>(visitor: &mut V, select: &'ast SimpleSelect)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(with) = &select.with {
        visitor.visit_with_clause(with);
    }
    if let Some(Distinct::DistinctOn(exprs)) = &select.select.distinct {
        for expr in exprs {
            visitor.visit_expr(expr);
        }
    }
    for item in &select.select.items {
        visitor.visit_select_item(item);
    }
    if let Some(from) = &select.from {
        visitor.visit_from_clause(from);
    }
    if let Some(where_clause) = &select.where_clause {
        visitor.visit_expr(&where_clause.condition);
    }
    if let Some(group_by) = &select.group_by {
        for expr in &group_by.exprs {
            visitor.visit_expr(expr);
        }
    }
    if let Some(having) = &select.having {
        visitor.visit_expr(&having.condition);
    }
    if let Some(windows) = &select.windows {
        for window in &windows.windows {
            visitor.visit_window_frame(&window.frame);
        }
    }
    if let Some(order_by) = &select.order_by {
        visitor.visit_order_by_clause(order_by);
    }
    if let Some(limit) = &select.limit {
        visitor.visit_expr(&limit.limit);
        if let Some(offset) = &limit.offset {
            visitor.visit_expr(offset);
        }
    }
    if let Some(fetch) = &select.fetch {
        visitor.visit_expr(&fetch.count);
    }
}

pub fn walk_with_clause<'ast, V>(visitor: &mut V, with: &'ast WithClause)
where
    V: Visit<'ast> + ?Sized,
{
    for table in &with.tables {
        visitor.visit_common_table(table);
    }
}

pub fn walk_common_table<'ast, V>(visitor: &mut V, table: &'ast CommonTable)
where
    V: Visit<'ast> + ?Sized,
{
    visitor.visit_query(&table.query);
}

pub fn walk_select_item<'ast, V>(visitor: &mut V, item: &'ast SelectItem)
where
    V: Visit<'ast> + ?Sized,
{
    visitor.visit_expr(&item.value);
}

pub fn walk_from_clause<'ast, V>(visitor: &mut V, from: &'ast FromClause)
where
    V: Visit<'ast> + ?Sized,
{
    visitor.visit_source_expr(&from.source);
    for join in &from.joins {
        visitor.visit_join_clause(join);
    }
}

pub fn walk_source_expr<'ast, V>(visitor: &mut V, source: &'ast SourceExpr)
where
    V: Visit<'ast> + ?Sized,
{
    match &source.source {
        DataSource::Table(name) => visitor.visit_qualified_name(name),
        DataSource::Paren(inner) => visitor.visit_source_expr(inner),
        DataSource::Subquery(query) => visitor.visit_query(query),
    }
}

pub fn walk_join_clause<'ast, V>(visitor: &mut V, join: &'ast JoinClause)
where
    V: Visit<'ast> + ?Sized,
{
    visitor.visit_source_expr(&join.source);
    match &join.condition {
        Some(JoinCondition::On(expr)) | Some(JoinCondition::Using(expr)) => {
            visitor.visit_expr(expr);
        }
        None => {}
    }
}

pub fn walk_order_by_clause<'ast, V>(visitor: &mut V, order_by: &'ast OrderByClause)
where
    V: Visit<'ast> + ?Sized,
{
    for item in &order_by.items {
        visitor.visit_expr(&item.expr);
    }
}

pub fn walk_window_frame<'ast, V>(visitor: &mut V, frame: &'ast WindowFrame)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(partition_by) = &frame.partition_by {
        for expr in &partition_by.exprs {
            visitor.visit_expr(expr);
        }
    }
    if let Some(order_by) = &frame.order_by {
        visitor.visit_order_by_clause(order_by);
    }
    if let Some(spec) = &frame.frame {
        walk_frame_bound(visitor, &spec.start);
        if let Some(end) = &spec.end {
            walk_frame_bound(visitor, end);
        }
    }
}

fn walk_frame_bound<'ast, V>(visitor: &mut V, bound: &'ast FrameBound)
where
    V: Visit<'ast> + ?Sized,
{
    match bound {
        FrameBound::Preceding(expr) | FrameBound::Following(expr) => {
            visitor.visit_expr(expr);
        }
        _ => {}
    }
}

pub fn walk_expr<'ast, V>(visitor: &mut V, expr: &'ast Expr)
where
    V: Visit<'ast> + ?Sized,
{
    match expr {
        Expr::Literal(_) | Expr::StringSpecifier { .. } => {}
        Expr::ColumnRef(name) => visitor.visit_qualified_name(name),
        Expr::FunctionCall { name, arg, over } => {
            visitor.visit_qualified_name(name);
            if let Some(arg) = arg {
                visitor.visit_expr(arg);
            }
            match over {
                Some(OverTarget::Frame(frame)) => visitor.visit_window_frame(frame),
                Some(OverTarget::Name(_)) | None => {}
            }
        }
        Expr::Unary { operand, .. } => visitor.visit_expr(operand),
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Paren(inner) => visitor.visit_expr(inner),
        Expr::Tuple(items) | Expr::ValueList(items) | Expr::Array(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        Expr::Cast { operand, ty } => {
            visitor.visit_expr(operand);
            if let Some(argument) = &ty.argument {
                visitor.visit_expr(argument);
            }
        }
        Expr::Case { selector, switch } => {
            if let Some(selector) = selector {
                visitor.visit_expr(selector);
            }
            for pair in &switch.pairs {
                visitor.visit_expr(&pair.when);
                visitor.visit_expr(&pair.then);
            }
            if let Some(else_value) = &switch.else_value {
                visitor.visit_expr(else_value);
            }
        }
        Expr::Between {
            operand,
            lower,
            upper,
            ..
        } => {
            visitor.visit_expr(operand);
            visitor.visit_expr(lower);
            visitor.visit_expr(upper);
        }
        Expr::Parameter(parameter) => visitor.visit_parameter(parameter),
        Expr::TypeValue(ty) => {
            if let Some(argument) = &ty.argument {
                visitor.visit_expr(argument);
            }
        }
        Expr::InlineQuery(query) => visitor.visit_query(query),
    }
}

/// Per-root-visit scratch state: a set of visited node identities and
/// the nesting depth that distinguishes the root visit from re-entrant
/// ones.
#[derive(Debug, Default)]
pub struct VisitTracker {
    visited: IndexSet<usize>,
    depth: usize,
}

impl VisitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` as one visit level. The outermost call clears the
    /// visited set on entry and on exit, so a tracker can be reused
    /// across root visits and never leaks state on failure.
    pub fn scoped<T, R>(this: &mut T, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: AsMut<VisitTracker>,
    {
        let root = {
            let tracker = this.as_mut();
            let root = tracker.depth == 0;
            if root {
                tracker.visited.clear();
            }
            tracker.depth += 1;
            root
        };

        let result = f(this);

        let tracker = this.as_mut();
        tracker.depth -= 1;
        if root {
            tracker.visited.clear();
        }
        result
    }

    /// Whether this call is the outermost visit.
    pub fn is_root(&self) -> bool {
        self.depth <= 1
    }

    /// Marks a node as visited; returns `false` when it was already
    /// seen in this root visit.
    pub fn mark<T>(&mut self, node: &T) -> bool {
        self.visited.insert(node as *const T as usize)
    }
}
