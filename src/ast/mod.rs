// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the typed AST for PostgreSQL-dialect SQL.
//!
//! Nodes are created by the parser and never mutated afterwards; every
//! transform produces a new tree.

mod ddl;
mod expr;
mod name;
mod query;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

pub use ddl::*;
pub use expr::*;
pub use name::*;
pub use query::*;

pub use crate::util::SqlIdent;

use crate::error::{DiagnosticKind, SqlDiagnostic};

/// Process-wide tag per AST node variant, used by the visitor framework
/// for dispatch and reporting.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum NodeKind {
    // Value expressions
    Literal,
    ColumnRef,
    FunctionCall,
    Unary,
    Binary,
    Paren,
    Tuple,
    ValueList,
    Cast,
    Case,
    Between,
    Array,
    Parameter,
    TypeValue,
    StringSpecifier,
    InlineQuery,

    // Queries
    SimpleSelect,
    BinarySelect,
    ValuesQuery,

    // Clauses
    SelectClause,
    SelectItem,
    FromClause,
    JoinClause,
    SourceExpr,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    LimitClause,
    FetchClause,
    ForClause,
    WindowFrameClause,
    WindowsClause,
    WithClause,
    CommonTable,
    WindowFrame,

    // Names
    QualifiedName,

    // DDL
    CreateTable,
    ColumnDef,
    AlterTable,
    CreateIndex,
    CommentOn,
}

impl NodeKind {
    /// Recovers a kind from its raw tag.
    ///
    /// This is the open extension point of the kind space: embedding
    /// hosts that transport tags as integers get `UNHANDLED_KIND` back
    /// for anything this build does not know.
    pub fn from_raw(raw: u16) -> Result<Self, SqlDiagnostic> {
        Self::from_u16(raw).ok_or_else(|| {
            SqlDiagnostic::error(
                DiagnosticKind::UnhandledKind,
                format!("unknown node kind tag {raw}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::ToPrimitive as _;

    #[test]
    fn kind_tags_round_trip_through_raw() {
        let kind = NodeKind::CommonTable;
        let raw = kind.to_u16().unwrap();
        assert_eq!(NodeKind::from_raw(raw).unwrap(), kind);
    }

    #[test]
    fn unknown_raw_tag_is_reported() {
        let err = NodeKind::from_raw(u16::MAX).unwrap_err();
        assert_eq!(err.kind, crate::error::DiagnosticKind::UnhandledKind);
    }

    #[test]
    fn nodes_report_their_kind() {
        assert_eq!(Expr::number("1").kind(), NodeKind::Literal);
        assert_eq!(
            Expr::column(SqlIdent::unquoted("id")).kind(),
            NodeKind::ColumnRef,
        );
        let query = SelectQuery::Values(ValuesQuery { rows: Vec::new() });
        assert_eq!(query.kind(), NodeKind::ValuesQuery);
        assert_eq!(Statement::Query(query).kind(), NodeKind::ValuesQuery);
    }
}
