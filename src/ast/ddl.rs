// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! DDL statements: `CREATE TABLE`, `ALTER TABLE`, `CREATE INDEX` and
//! `COMMENT ON`.

use crate::ast::expr::{Expr, TypeValue};
use crate::ast::name::QualifiedName;
use crate::ast::query::SelectQuery;
use crate::ast::NodeKind;
use crate::util::SqlIdent;

/// Referential action of a foreign-key constraint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

/// The target side of a `REFERENCES` / `FOREIGN KEY` constraint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferencesSpec {
    pub table: QualifiedName,
    pub columns: Vec<SqlIdent>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// Constraint payload, shared between column and table level. The
/// column lists are empty at column level.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConstraintKind {
    PrimaryKey { columns: Vec<SqlIdent> },
    NotNull,
    Default(Expr),
    Unique { columns: Vec<SqlIdent> },
    Check(Expr),
    ForeignKey {
        columns: Vec<SqlIdent>,
        references: ReferencesSpec,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnConstraint {
    pub name: Option<SqlIdent>,
    pub kind: ConstraintKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableConstraint {
    pub name: Option<SqlIdent>,
    pub kind: ConstraintKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnDef {
    pub name: SqlIdent,
    pub ty: TypeValue,
    pub constraints: Vec<ColumnConstraint>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateTable {
    pub name: QualifiedName,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AlterAction {
    AddConstraint(TableConstraint),
    /// `ALTER COLUMN … SET DEFAULT expr` / `… DROP DEFAULT` (None).
    AlterColumnDefault {
        column: SqlIdent,
        default: Option<Expr>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlterTable {
    pub name: QualifiedName,
    pub actions: Vec<AlterAction>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateIndex {
    pub unique: bool,
    pub name: Option<SqlIdent>,
    pub table: QualifiedName,
    pub columns: Vec<Expr>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommentTarget {
    Table,
    Column,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentOn {
    pub target: CommentTarget,
    pub name: QualifiedName,
    /// `None` renders as `IS NULL` (comment removal).
    pub comment: Option<Expr>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DdlStatement {
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    CreateIndex(CreateIndex),
    CommentOn(CommentOn),
}

impl DdlStatement {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::CreateTable(_) => NodeKind::CreateTable,
            Self::AlterTable(_) => NodeKind::AlterTable,
            Self::CreateIndex(_) => NodeKind::CreateIndex,
            Self::CommentOn(_) => NodeKind::CommentOn,
        }
    }
}

/// Anything the parser entry point can produce.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Statement {
    Query(SelectQuery),
    Ddl(DdlStatement),
}

impl Statement {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Query(query) => query.kind(),
            Self::Ddl(ddl) => ddl.kind(),
        }
    }

    pub fn as_query(&self) -> Option<&SelectQuery> {
        match self {
            Self::Query(query) => Some(query),
            Self::Ddl(_) => None,
        }
    }
}
