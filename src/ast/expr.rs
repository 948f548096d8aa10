// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Value expressions and window constructs.

use crate::ast::name::{QualifiedName, RawString};
use crate::ast::query::{OrderByClause, SelectQuery};
use crate::ast::NodeKind;
use crate::util::SqlIdent;

/// A literal scalar value. Numbers keep their source spelling.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Literal {
    String(String),
    Number(String),
    Bool(bool),
    Null,
}

/// A placeholder bound at execution time.
///
/// The positional index is not stored here; the formatter assigns
/// indices in first-occurrence order and reports them in a side-table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameter {
    pub name: String,
}

/// A type reference with an optional argument, e.g. `numeric(10, 2)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeValue {
    pub name: QualifiedName,
    pub argument: Option<Box<Expr>>,
}

/// One `WHEN … THEN …` pair of a `CASE` expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseKeyValue {
    pub when: Expr,
    pub then: Expr,
}

/// The pair list and optional `ELSE` of a `CASE` expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwitchCase {
    pub pairs: Vec<CaseKeyValue>,
    pub else_value: Option<Box<Expr>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameType {
    Rows,
    Range,
    Groups,
}

/// A window frame boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    CurrentRow,
    UnboundedFollowing,
    Preceding(Box<Expr>),
    Following(Box<Expr>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameSpec {
    pub frame_type: FrameType,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartitionByClause {
    pub exprs: Vec<Expr>,
}

/// The parenthesised part of an `OVER (…)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WindowFrame {
    pub partition_by: Option<PartitionByClause>,
    pub order_by: Option<OrderByClause>,
    pub frame: Option<FrameSpec>,
}

/// The target of an `OVER`: inline frame or named window.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OverTarget {
    Frame(WindowFrame),
    Name(SqlIdent),
}

/// A value expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Qualified column reference; the rightmost part is the column.
    ColumnRef(QualifiedName),
    FunctionCall {
        name: QualifiedName,
        /// `None` for a zero-argument call; a [`Expr::ValueList`] for
        /// more than one argument.
        arg: Option<Box<Expr>>,
        over: Option<OverTarget>,
    },
    Unary {
        op: RawString,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: RawString,
        right: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// A parenthesised, comma-separated row value.
    Tuple(Vec<Expr>),
    /// A bare comma-separated list (function arguments, `USING` columns).
    ValueList(Vec<Expr>),
    Cast {
        operand: Box<Expr>,
        ty: TypeValue,
    },
    Case {
        selector: Option<Box<Expr>>,
        switch: SwitchCase,
    },
    Between {
        operand: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
        negated: bool,
    },
    Array(Vec<Expr>),
    Parameter(Parameter),
    TypeValue(TypeValue),
    /// A prefixed string literal such as `E'…'`, `X'…'` or `U&'…'`;
    /// the value is the body between the quotes, kept verbatim.
    StringSpecifier {
        specifier: String,
        value: String,
    },
    InlineQuery(Box<SelectQuery>),
}

impl Expr {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Literal(_) => NodeKind::Literal,
            Self::ColumnRef(_) => NodeKind::ColumnRef,
            Self::FunctionCall { .. } => NodeKind::FunctionCall,
            Self::Unary { .. } => NodeKind::Unary,
            Self::Binary { .. } => NodeKind::Binary,
            Self::Paren(_) => NodeKind::Paren,
            Self::Tuple(_) => NodeKind::Tuple,
            Self::ValueList(_) => NodeKind::ValueList,
            Self::Cast { .. } => NodeKind::Cast,
            Self::Case { .. } => NodeKind::Case,
            Self::Between { .. } => NodeKind::Between,
            Self::Array(_) => NodeKind::Array,
            Self::Parameter(_) => NodeKind::Parameter,
            Self::TypeValue(_) => NodeKind::TypeValue,
            Self::StringSpecifier { .. } => NodeKind::StringSpecifier,
            Self::InlineQuery(_) => NodeKind::InlineQuery,
        }
    }

    /// A column reference from a single identifier.
    pub fn column(ident: SqlIdent) -> Self {
        Self::ColumnRef(QualifiedName::from_ident(ident))
    }

    pub fn number<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self::Literal(Literal::Number(text.into()))
    }

    pub fn string<S>(text: S) -> Self
    where
        S: Into<String>,
    {
        Self::Literal(Literal::String(text.into()))
    }
}
