// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Clauses and `SELECT` query variants.

use crate::ast::expr::{Expr, WindowFrame};
use crate::ast::name::{QualifiedName, RawString};
use crate::ast::NodeKind;
use crate::util::SqlIdent;

/// `DISTINCT` / `DISTINCT ON (…)` marker of a select clause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Distinct {
    Distinct,
    DistinctOn(Vec<Expr>),
}

/// One projected value with an optional alias.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectItem {
    pub value: Expr,
    pub alias: Option<SqlIdent>,
}

/// The projection list. Always holds at least one item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectClause {
    pub distinct: Option<Distinct>,
    pub items: Vec<SelectItem>,
}

impl Default for SelectClause {
    fn default() -> Self {
        Self {
            distinct: None,
            items: vec![SelectItem {
                value: Expr::column(SqlIdent::wildcard()),
                alias: None,
            }],
        }
    }
}

/// `alias (col, …)` attached to a data source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceAlias {
    pub name: SqlIdent,
    pub columns: Option<Vec<SqlIdent>>,
}

/// What a from/join entry reads from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataSource {
    Table(QualifiedName),
    Paren(Box<SourceExpr>),
    Subquery(Box<SelectQuery>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceExpr {
    pub source: DataSource,
    pub alias: Option<SourceAlias>,
}

impl SourceExpr {
    /// The name this source is addressable by: alias first, otherwise
    /// the table name.
    pub fn binding_name(&self) -> Option<&SqlIdent> {
        if let Some(alias) = &self.alias {
            return Some(&alias.name);
        }
        match &self.source {
            DataSource::Table(name) => name.name().as_ident(),
            DataSource::Paren(inner) => inner.binding_name(),
            DataSource::Subquery(_) => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinCondition {
    On(Expr),
    /// The column list of a `USING (…)`, carried as a value list.
    Using(Expr),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinClause {
    /// The join keyword run, e.g. `left join`.
    pub join_type: RawString,
    pub source: SourceExpr,
    pub condition: Option<JoinCondition>,
    pub lateral: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FromClause {
    pub source: SourceExpr,
    pub joins: Vec<JoinClause>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WhereClause {
    pub condition: Expr,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupByClause {
    pub exprs: Vec<Expr>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HavingClause {
    pub condition: Expr,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullsPosition {
    First,
    Last,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsPosition>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LimitClause {
    pub limit: Expr,
    pub offset: Option<Expr>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchKind {
    First,
    Next,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchUnit {
    Row,
    Rows,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchClause {
    pub kind: FetchKind,
    pub count: Expr,
    pub unit: Option<FetchUnit>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForClause {
    /// Lock mode keyword run, e.g. `update` or `no key update`.
    pub lock_mode: RawString,
}

/// A named window definition: `name AS (frame)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WindowFrameClause {
    pub name: SqlIdent,
    pub frame: WindowFrame,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WindowsClause {
    pub windows: Vec<WindowFrameClause>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Materialized {
    Materialized,
    NotMaterialized,
}

/// One `alias AS (query)` entry of a `WITH` clause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommonTable {
    pub alias: SourceAlias,
    pub query: SelectQuery,
    pub materialized: Option<Materialized>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithClause {
    pub recursive: bool,
    pub tables: Vec<CommonTable>,
}

/// A plain `SELECT` with its clauses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimpleSelect {
    pub with: Option<WithClause>,
    pub select: SelectClause,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub windows: Option<WindowsClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub fetch: Option<FetchClause>,
    pub for_clause: Option<ForClause>,
}

impl Default for SimpleSelect {
    fn default() -> Self {
        Self {
            with: None,
            select: SelectClause::default(),
            from: None,
            where_clause: None,
            group_by: None,
            having: None,
            windows: None,
            order_by: None,
            limit: None,
            fetch: None,
            for_clause: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValuesQuery {
    /// Each row is an [`Expr::Tuple`].
    pub rows: Vec<Expr>,
}

/// A select query: plain, set operation, or `VALUES`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectQuery {
    Simple(Box<SimpleSelect>),
    Binary {
        left: Box<SelectQuery>,
        /// Set operator keyword run, e.g. `union all`.
        op: RawString,
        right: Box<SelectQuery>,
    },
    Values(ValuesQuery),
}

impl SelectQuery {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Simple(_) => NodeKind::SimpleSelect,
            Self::Binary { .. } => NodeKind::BinarySelect,
            Self::Values(_) => NodeKind::ValuesQuery,
        }
    }

    /// The `WITH` clause of a simple select, if any.
    pub fn with_clause(&self) -> Option<&WithClause> {
        match self {
            Self::Simple(select) => select.with.as_ref(),
            _ => None,
        }
    }

    /// The leftmost simple select of a set-operation chain.
    pub fn leftmost_simple(&self) -> Option<&SimpleSelect> {
        match self {
            Self::Simple(select) => Some(select),
            Self::Binary { left, .. } => left.leftmost_simple(),
            Self::Values(_) => None,
        }
    }
}
