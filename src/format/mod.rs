// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the deterministic SQL pretty-printer.

mod config;

pub use config::{
    CommaBreak, FormatConfig, IdentifierEscape, KeywordCase, ParameterStyle, Preset,
};

use indexmap::IndexMap;

use crate::ast::{
    AlterAction, CommentTarget, CommonTable, ConstraintKind, DataSource, DdlStatement,
    Distinct, Expr, FetchKind, FetchUnit, FrameBound, FrameSpec, FrameType, FromClause,
    JoinClause, JoinCondition, Literal, Materialized, NamePart, NullsPosition, OrderByClause,
    OverTarget, Parameter, QualifiedName, RawString, ReferencesSpec, ReferentialAction,
    SelectItem, SelectQuery, SimpleSelect, SortDirection, SourceAlias, SourceExpr, Statement,
    TableConstraint, TypeValue, WindowFrame, WithClause,
};
use crate::error::SqlDiagnostic;
use crate::keywords::is_reserved;
use crate::util::SqlIdent;

type FormatResult<T = String> = Result<T, SqlDiagnostic>;

/// The formatter output: the SQL text plus the parameter names in the
/// order they received positional indices.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Formatted {
    pub sql: String,
    pub parameters: Vec<String>,
}

/// A configurable SQL renderer.
///
/// The same AST always yields the same text. The only per-call state is
/// the parameter side-table, reset at every root format call.
#[derive(Debug)]
pub struct Formatter {
    config: FormatConfig,
    params: IndexMap<String, usize>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    pub fn with_config(config: FormatConfig) -> Self {
        Self {
            config,
            params: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    pub fn format_statement(&mut self, statement: &Statement) -> FormatResult<Formatted> {
        self.params.clear();
        let sql = match statement {
            Statement::Query(query) => self.query(query)?,
            Statement::Ddl(ddl) => self.ddl(ddl)?,
        };
        Ok(self.finish(sql))
    }

    pub fn format_query(&mut self, query: &SelectQuery) -> FormatResult<Formatted> {
        self.params.clear();
        let sql = self.query(query)?;
        Ok(self.finish(sql))
    }

    /// Renders a single expression with a fresh parameter table. Used
    /// by collectors to key column references.
    pub fn format_expr(&mut self, expr: &Expr) -> FormatResult<Formatted> {
        self.params.clear();
        let sql = self.expr(expr)?;
        Ok(self.finish(sql))
    }

    fn finish(&self, sql: String) -> Formatted {
        Formatted {
            sql,
            parameters: self.params.keys().cloned().collect(),
        }
    }

    // --- keywords and identifiers -----------------------------------

    fn kw(&self, words: &str) -> String {
        match self.config.keyword_case {
            KeywordCase::Lower => words.to_lowercase(),
            KeywordCase::Upper => words.to_uppercase(),
            KeywordCase::Preserve => words.to_owned(),
        }
    }

    /// Validates a raw operator/keyword string and applies keyword
    /// casing when it is a keyword run.
    fn raw(&self, raw: &RawString) -> FormatResult {
        let text = raw.validate()?;
        if text.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
            Ok(self.kw(text))
        } else {
            Ok(text.to_owned())
        }
    }

    fn ident(&self, ident: &SqlIdent) -> String {
        if ident.is_wildcard() {
            return "*".to_owned();
        }

        let escape = match self.config.identifier_escape {
            IdentifierEscape::Always => true,
            IdentifierEscape::Never => false,
            IdentifierEscape::WhenNeeded => {
                ident.is_quoted() || !is_safe_bare(ident.name())
            }
        };

        if escape {
            let end = &self.config.identifier_escape_end;
            let doubled = end.repeat(2);
            format!(
                "{}{}{}",
                self.config.identifier_escape_start,
                ident.name().replace(end.as_str(), &doubled),
                end,
            )
        } else {
            ident.name().to_owned()
        }
    }

    fn qualified_name(&self, name: &QualifiedName) -> FormatResult {
        let mut parts: Vec<String> = name
            .namespaces()
            .iter()
            .map(|ns| self.ident(ns))
            .collect();
        parts.push(match name.name() {
            NamePart::Ident(ident) => self.ident(ident),
            NamePart::Raw(raw) => raw.validate()?.to_owned(),
        });
        Ok(parts.join("."))
    }

    /// Joins comma-separated list items honouring the configured break
    /// position.
    fn list(&self, items: &[String]) -> String {
        match self.config.comma_break {
            CommaBreak::None => items.join(", "),
            CommaBreak::After => {
                let sep = format!(",{}{}", self.config.newline, self.config.indent());
                items.join(&sep)
            }
            CommaBreak::Before => {
                let sep = format!("{}{}, ", self.config.newline, self.config.indent());
                items.join(&sep)
            }
        }
    }

    // --- queries ----------------------------------------------------

    fn query(&mut self, query: &SelectQuery) -> FormatResult {
        match query {
            SelectQuery::Simple(select) => self.simple_select(select),
            SelectQuery::Binary { left, op, right } => Ok(format!(
                "{} {} {}",
                self.query(left)?,
                self.raw(op)?,
                self.query(right)?,
            )),
            SelectQuery::Values(values) => {
                let rows = values
                    .rows
                    .iter()
                    .map(|row| self.expr(row))
                    .collect::<FormatResult<Vec<_>>>()?;
                Ok(format!("{} {}", self.kw("values"), rows.join(", ")))
            }
        }
    }

    fn simple_select(&mut self, select: &SimpleSelect) -> FormatResult {
        let mut parts = Vec::new();

        if let Some(with) = &select.with {
            parts.push(self.with_clause(with)?);
        }

        let mut head = self.kw("select");
        match &select.select.distinct {
            Some(Distinct::Distinct) => {
                head.push(' ');
                head.push_str(&self.kw("distinct"));
            }
            Some(Distinct::DistinctOn(exprs)) => {
                let exprs = self.expr_list(exprs)?;
                head.push(' ');
                head.push_str(&self.kw("distinct on"));
                head.push_str(&format!(" ({})", exprs.join(", ")));
            }
            None => {}
        }
        let items = select
            .select
            .items
            .iter()
            .map(|item| self.select_item(item))
            .collect::<FormatResult<Vec<_>>>()?;
        parts.push(format!("{head} {}", self.list(&items)));

        if let Some(from) = &select.from {
            parts.push(self.from_clause(from)?);
        }
        if let Some(where_clause) = &select.where_clause {
            parts.push(format!(
                "{} {}",
                self.kw("where"),
                self.expr(&where_clause.condition)?,
            ));
        }
        if let Some(group_by) = &select.group_by {
            let exprs = self.expr_list(&group_by.exprs)?;
            parts.push(format!("{} {}", self.kw("group by"), exprs.join(", ")));
        }
        if let Some(having) = &select.having {
            parts.push(format!(
                "{} {}",
                self.kw("having"),
                self.expr(&having.condition)?,
            ));
        }
        if let Some(windows) = &select.windows {
            let defs = windows
                .windows
                .iter()
                .map(|w| {
                    Ok(format!(
                        "{} {} ({})",
                        self.ident(&w.name),
                        self.kw("as"),
                        self.window_frame(&w.frame)?,
                    ))
                })
                .collect::<FormatResult<Vec<_>>>()?;
            parts.push(format!("{} {}", self.kw("window"), defs.join(", ")));
        }
        if let Some(order_by) = &select.order_by {
            parts.push(self.order_by_clause(order_by)?);
        }
        if let Some(limit) = &select.limit {
            let mut clause = format!("{} {}", self.kw("limit"), self.expr(&limit.limit)?);
            if let Some(offset) = &limit.offset {
                clause.push_str(&format!(" {} {}", self.kw("offset"), self.expr(offset)?));
            }
            parts.push(clause);
        }
        if let Some(fetch) = &select.fetch {
            let kind = match fetch.kind {
                FetchKind::First => "fetch first",
                FetchKind::Next => "fetch next",
            };
            let mut clause = format!("{} {}", self.kw(kind), self.expr(&fetch.count)?);
            match fetch.unit {
                Some(FetchUnit::Row) => {
                    clause.push(' ');
                    clause.push_str(&self.kw("row"));
                }
                Some(FetchUnit::Rows) => {
                    clause.push(' ');
                    clause.push_str(&self.kw("rows"));
                }
                None => {}
            }
            clause.push(' ');
            clause.push_str(&self.kw("only"));
            parts.push(clause);
        }
        if let Some(for_clause) = &select.for_clause {
            parts.push(format!(
                "{} {}",
                self.kw("for"),
                self.raw(&for_clause.lock_mode)?,
            ));
        }

        Ok(parts.join(" "))
    }

    fn with_clause(&mut self, with: &WithClause) -> FormatResult {
        let mut head = self.kw("with");
        if with.recursive {
            head.push(' ');
            head.push_str(&self.kw("recursive"));
        }

        let tables = with
            .tables
            .iter()
            .map(|table| self.common_table(table))
            .collect::<FormatResult<Vec<_>>>()?;
        Ok(format!("{head} {}", self.list(&tables)))
    }

    fn common_table(&mut self, table: &CommonTable) -> FormatResult {
        let mut out = self.ident(&table.alias.name);
        if let Some(columns) = &table.alias.columns {
            let columns: Vec<String> = columns.iter().map(|c| self.ident(c)).collect();
            out.push_str(&format!(" ({})", columns.join(", ")));
        }
        out.push(' ');
        out.push_str(&self.kw("as"));
        out.push(' ');
        match table.materialized {
            Some(Materialized::Materialized) => {
                out.push_str(&self.kw("materialized"));
                out.push(' ');
            }
            Some(Materialized::NotMaterialized) => {
                out.push_str(&self.kw("not materialized"));
                out.push(' ');
            }
            None => {}
        }
        out.push_str(&format!("({})", self.query(&table.query)?));
        Ok(out)
    }

    fn select_item(&mut self, item: &SelectItem) -> FormatResult {
        let value = self.expr(&item.value)?;

        // `t.id as id` collapses to `t.id`.
        if let Some(alias) = &item.alias {
            let elide = matches!(
                &item.value,
                Expr::ColumnRef(name) if name.name().as_ident() == Some(alias)
            );
            if !elide {
                return Ok(format!("{value} {} {}", self.kw("as"), self.ident(alias)));
            }
        }
        Ok(value)
    }

    fn from_clause(&mut self, from: &FromClause) -> FormatResult {
        let mut out = format!("{} {}", self.kw("from"), self.source_expr(&from.source)?);
        for join in &from.joins {
            out.push(' ');
            out.push_str(&self.join_clause(join)?);
        }
        Ok(out)
    }

    fn join_clause(&mut self, join: &JoinClause) -> FormatResult {
        let mut out = self.raw(&join.join_type)?;
        if join.lateral {
            out.push(' ');
            out.push_str(&self.kw("lateral"));
        }
        out.push(' ');
        out.push_str(&self.source_expr(&join.source)?);

        match &join.condition {
            Some(JoinCondition::On(condition)) => {
                out.push_str(&format!(" {} {}", self.kw("on"), self.expr(condition)?));
            }
            Some(JoinCondition::Using(columns)) => {
                out.push_str(&format!(" {} ({})", self.kw("using"), self.expr(columns)?));
            }
            None => {}
        }
        Ok(out)
    }

    fn source_expr(&mut self, source: &SourceExpr) -> FormatResult {
        let mut out = match &source.source {
            DataSource::Table(name) => self.qualified_name(name)?,
            DataSource::Paren(inner) => format!("({})", self.source_expr(inner)?),
            DataSource::Subquery(query) => format!("({})", self.query(query)?),
        };

        if let Some(alias) = &source.alias {
            out.push_str(&self.source_alias(alias));
        }
        Ok(out)
    }

    fn source_alias(&self, alias: &SourceAlias) -> String {
        let mut out = format!(" {} {}", self.kw("as"), self.ident(&alias.name));
        if let Some(columns) = &alias.columns {
            let columns: Vec<String> = columns.iter().map(|c| self.ident(c)).collect();
            out.push_str(&format!(" ({})", columns.join(", ")));
        }
        out
    }

    fn order_by_clause(&mut self, order_by: &OrderByClause) -> FormatResult {
        let items = order_by
            .items
            .iter()
            .map(|item| {
                let mut out = self.expr(&item.expr)?;
                match item.direction {
                    Some(SortDirection::Asc) => {
                        out.push(' ');
                        out.push_str(&self.kw("asc"));
                    }
                    Some(SortDirection::Desc) => {
                        out.push(' ');
                        out.push_str(&self.kw("desc"));
                    }
                    None => {}
                }
                match item.nulls {
                    Some(NullsPosition::First) => {
                        out.push(' ');
                        out.push_str(&self.kw("nulls first"));
                    }
                    Some(NullsPosition::Last) => {
                        out.push(' ');
                        out.push_str(&self.kw("nulls last"));
                    }
                    None => {}
                }
                Ok(out)
            })
            .collect::<FormatResult<Vec<_>>>()?;
        Ok(format!("{} {}", self.kw("order by"), items.join(", ")))
    }

    fn window_frame(&mut self, frame: &WindowFrame) -> FormatResult {
        let mut parts = Vec::new();

        if let Some(partition_by) = &frame.partition_by {
            let exprs = self.expr_list(&partition_by.exprs)?;
            parts.push(format!(
                "{} {}",
                self.kw("partition by"),
                exprs.join(", "),
            ));
        }
        if let Some(order_by) = &frame.order_by {
            parts.push(self.order_by_clause(order_by)?);
        }
        if let Some(spec) = &frame.frame {
            parts.push(self.frame_spec(spec)?);
        }

        Ok(parts.join(" "))
    }

    fn frame_spec(&mut self, spec: &FrameSpec) -> FormatResult {
        let frame_type = match spec.frame_type {
            FrameType::Rows => "rows",
            FrameType::Range => "range",
            FrameType::Groups => "groups",
        };

        match &spec.end {
            Some(end) => Ok(format!(
                "{} {} {} {} {}",
                self.kw(frame_type),
                self.kw("between"),
                self.frame_bound(&spec.start)?,
                self.kw("and"),
                self.frame_bound(end)?,
            )),
            None => Ok(format!(
                "{} {}",
                self.kw(frame_type),
                self.frame_bound(&spec.start)?,
            )),
        }
    }

    fn frame_bound(&mut self, bound: &FrameBound) -> FormatResult {
        Ok(match bound {
            FrameBound::UnboundedPreceding => self.kw("unbounded preceding"),
            FrameBound::CurrentRow => self.kw("current row"),
            FrameBound::UnboundedFollowing => self.kw("unbounded following"),
            FrameBound::Preceding(expr) => {
                format!("{} {}", self.expr(expr)?, self.kw("preceding"))
            }
            FrameBound::Following(expr) => {
                format!("{} {}", self.expr(expr)?, self.kw("following"))
            }
        })
    }

    // --- expressions ------------------------------------------------

    fn expr_list(&mut self, exprs: &[Expr]) -> FormatResult<Vec<String>> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn expr(&mut self, expr: &Expr) -> FormatResult {
        match expr {
            Expr::Literal(literal) => Ok(self.literal(literal)),
            Expr::ColumnRef(name) => self.qualified_name(name),
            Expr::FunctionCall { name, arg, over } => {
                let mut out = format!(
                    "{}({})",
                    self.qualified_name(name)?,
                    match arg {
                        Some(arg) => self.expr(arg)?,
                        None => String::new(),
                    },
                );
                match over {
                    Some(OverTarget::Name(name)) => {
                        out.push_str(&format!(" {} {}", self.kw("over"), self.ident(name)));
                    }
                    Some(OverTarget::Frame(frame)) => {
                        out.push_str(&format!(
                            " {} ({})",
                            self.kw("over"),
                            self.window_frame(frame)?,
                        ));
                    }
                    None => {}
                }
                Ok(out)
            }
            Expr::Unary { op, operand } => {
                let op_text = self.raw(op)?;
                let operand = self.expr(operand)?;
                if op.as_str().chars().all(|c| c.is_ascii_alphabetic()) {
                    Ok(format!("{op_text} {operand}"))
                } else {
                    Ok(format!("{op_text}{operand}"))
                }
            }
            Expr::Binary { left, op, right } => Ok(format!(
                "{} {} {}",
                self.expr(left)?,
                self.raw(op)?,
                self.expr(right)?,
            )),
            Expr::Paren(inner) => Ok(format!("({})", self.expr(inner)?)),
            Expr::Tuple(items) => {
                let items = self.expr_list(items)?;
                Ok(format!("({})", items.join(", ")))
            }
            Expr::ValueList(items) => {
                let items = self.expr_list(items)?;
                Ok(items.join(", "))
            }
            Expr::Cast { operand, ty } => Ok(format!(
                "{}({} {} {})",
                self.kw("cast"),
                self.expr(operand)?,
                self.kw("as"),
                self.type_value(ty)?,
            )),
            Expr::Case { selector, switch } => {
                let mut out = self.kw("case");
                if let Some(selector) = selector {
                    out.push(' ');
                    out.push_str(&self.expr(selector)?);
                }
                for pair in &switch.pairs {
                    out.push_str(&format!(
                        " {} {} {} {}",
                        self.kw("when"),
                        self.expr(&pair.when)?,
                        self.kw("then"),
                        self.expr(&pair.then)?,
                    ));
                }
                if let Some(else_value) = &switch.else_value {
                    out.push_str(&format!(" {} {}", self.kw("else"), self.expr(else_value)?));
                }
                out.push(' ');
                out.push_str(&self.kw("end"));
                Ok(out)
            }
            Expr::Between {
                operand,
                lower,
                upper,
                negated,
            } => {
                let keyword = if *negated { "not between" } else { "between" };
                Ok(format!(
                    "{} {} {} {} {}",
                    self.expr(operand)?,
                    self.kw(keyword),
                    self.expr(lower)?,
                    self.kw("and"),
                    self.expr(upper)?,
                ))
            }
            Expr::Array(items) => {
                let items = self.expr_list(items)?;
                Ok(format!("{}[{}]", self.kw("array"), items.join(", ")))
            }
            Expr::Parameter(parameter) => Ok(self.parameter(parameter)),
            Expr::TypeValue(ty) => self.type_value(ty),
            Expr::StringSpecifier { specifier, value } => {
                Ok(format!("{specifier}'{value}'"))
            }
            Expr::InlineQuery(query) => Ok(format!("({})", self.query(query)?)),
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::String(value) => format!("'{}'", value.replace('\'', "''")),
            Literal::Number(text) => text.clone(),
            Literal::Bool(true) => self.kw("true"),
            Literal::Bool(false) => self.kw("false"),
            Literal::Null => self.kw("null"),
        }
    }

    /// Renders a parameter, assigning its positional index on first
    /// encounter.
    fn parameter(&mut self, parameter: &Parameter) -> String {
        let next = self.params.len() + 1;
        let index = *self
            .params
            .entry(parameter.name.clone())
            .or_insert(next);

        match self.config.parameter_style {
            ParameterStyle::Named => {
                // Digit-only names (`$1`, ordinals from `?`) have no
                // lexable `:name` form; they keep the `$n` spelling.
                if parameter.name.starts_with(|c: char| c.is_ascii_digit()) {
                    format!("${}", parameter.name)
                } else {
                    format!("{}{}", self.config.parameter_symbol, parameter.name)
                }
            }
            ParameterStyle::PositionalNumeric => {
                format!("{}{}", self.config.parameter_symbol, index)
            }
            ParameterStyle::PositionalAnonymous => self.config.parameter_symbol.clone(),
        }
    }

    fn type_value(&mut self, ty: &TypeValue) -> FormatResult {
        let mut out = self.qualified_name(&ty.name)?;
        if let Some(argument) = &ty.argument {
            out.push_str(&format!("({})", self.expr(argument)?));
        }
        Ok(out)
    }

    // --- DDL --------------------------------------------------------

    fn ddl(&mut self, ddl: &DdlStatement) -> FormatResult {
        match ddl {
            DdlStatement::CreateTable(table) => {
                let mut items = Vec::new();
                for column in &table.columns {
                    let mut out = format!(
                        "{} {}",
                        self.ident(&column.name),
                        self.type_value(&column.ty)?,
                    );
                    for constraint in &column.constraints {
                        out.push(' ');
                        if let Some(name) = &constraint.name {
                            out.push_str(&format!(
                                "{} {} ",
                                self.kw("constraint"),
                                self.ident(name),
                            ));
                        }
                        out.push_str(&self.constraint_kind(&constraint.kind)?);
                    }
                    items.push(out);
                }
                for constraint in &table.constraints {
                    items.push(self.table_constraint(constraint)?);
                }

                Ok(format!(
                    "{} {} ({})",
                    self.kw("create table"),
                    self.qualified_name(&table.name)?,
                    self.list(&items),
                ))
            }
            DdlStatement::AlterTable(alter) => {
                let actions = alter
                    .actions
                    .iter()
                    .map(|action| self.alter_action(action))
                    .collect::<FormatResult<Vec<_>>>()?;
                Ok(format!(
                    "{} {} {}",
                    self.kw("alter table"),
                    self.qualified_name(&alter.name)?,
                    actions.join(", "),
                ))
            }
            DdlStatement::CreateIndex(index) => {
                let head = if index.unique {
                    self.kw("create unique index")
                } else {
                    self.kw("create index")
                };
                let columns = self.expr_list(&index.columns)?;
                let mut out = head;
                if let Some(name) = &index.name {
                    out.push(' ');
                    out.push_str(&self.ident(name));
                }
                out.push_str(&format!(
                    " {} {} ({})",
                    self.kw("on"),
                    self.qualified_name(&index.table)?,
                    columns.join(", "),
                ));
                Ok(out)
            }
            DdlStatement::CommentOn(comment) => {
                let target = match comment.target {
                    CommentTarget::Table => "table",
                    CommentTarget::Column => "column",
                };
                let value = match &comment.comment {
                    Some(expr) => self.expr(expr)?,
                    None => self.kw("null"),
                };
                Ok(format!(
                    "{} {} {} {} {}",
                    self.kw("comment on"),
                    self.kw(target),
                    self.qualified_name(&comment.name)?,
                    self.kw("is"),
                    value,
                ))
            }
        }
    }

    fn table_constraint(&mut self, constraint: &TableConstraint) -> FormatResult {
        let mut out = String::new();
        if let Some(name) = &constraint.name {
            out.push_str(&format!("{} {} ", self.kw("constraint"), self.ident(name)));
        }
        out.push_str(&self.constraint_kind(&constraint.kind)?);
        Ok(out)
    }

    fn constraint_kind(&mut self, kind: &ConstraintKind) -> FormatResult {
        Ok(match kind {
            ConstraintKind::PrimaryKey { columns } => {
                if columns.is_empty() {
                    self.kw("primary key")
                } else {
                    format!("{} ({})", self.kw("primary key"), self.ident_list(columns))
                }
            }
            ConstraintKind::NotNull => self.kw("not null"),
            ConstraintKind::Default(expr) => {
                format!("{} {}", self.kw("default"), self.expr(expr)?)
            }
            ConstraintKind::Unique { columns } => {
                if columns.is_empty() {
                    self.kw("unique")
                } else {
                    format!("{} ({})", self.kw("unique"), self.ident_list(columns))
                }
            }
            ConstraintKind::Check(condition) => {
                format!("{} ({})", self.kw("check"), self.expr(condition)?)
            }
            ConstraintKind::ForeignKey {
                columns,
                references,
            } => {
                let tail = self.references_spec(references)?;
                if columns.is_empty() {
                    tail
                } else {
                    format!(
                        "{} ({}) {}",
                        self.kw("foreign key"),
                        self.ident_list(columns),
                        tail,
                    )
                }
            }
        })
    }

    fn references_spec(&mut self, references: &ReferencesSpec) -> FormatResult {
        let mut out = format!(
            "{} {}",
            self.kw("references"),
            self.qualified_name(&references.table)?,
        );
        if !references.columns.is_empty() {
            out.push_str(&format!(" ({})", self.ident_list(&references.columns)));
        }
        if let Some(action) = references.on_delete {
            out.push_str(&format!(
                " {} {}",
                self.kw("on delete"),
                self.referential_action(action),
            ));
        }
        if let Some(action) = references.on_update {
            out.push_str(&format!(
                " {} {}",
                self.kw("on update"),
                self.referential_action(action),
            ));
        }
        Ok(out)
    }

    fn referential_action(&self, action: ReferentialAction) -> String {
        match action {
            ReferentialAction::Cascade => self.kw("cascade"),
            ReferentialAction::Restrict => self.kw("restrict"),
            ReferentialAction::NoAction => self.kw("no action"),
            ReferentialAction::SetNull => self.kw("set null"),
            ReferentialAction::SetDefault => self.kw("set default"),
        }
    }

    fn alter_action(&mut self, action: &AlterAction) -> FormatResult {
        match action {
            AlterAction::AddConstraint(constraint) => Ok(format!(
                "{} {}",
                self.kw("add"),
                self.table_constraint(constraint)?,
            )),
            AlterAction::AlterColumnDefault { column, default } => match default {
                Some(expr) => Ok(format!(
                    "{} {} {} {}",
                    self.kw("alter column"),
                    self.ident(column),
                    self.kw("set default"),
                    self.expr(expr)?,
                )),
                None => Ok(format!(
                    "{} {} {}",
                    self.kw("alter column"),
                    self.ident(column),
                    self.kw("drop default"),
                )),
            },
        }
    }

    fn ident_list(&self, idents: &[SqlIdent]) -> String {
        idents
            .iter()
            .map(|ident| self.ident(ident))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Whether a name can appear unquoted: PostgreSQL lowercase identifier
/// shape and not a reserved word.
fn is_safe_bare(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !is_reserved(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use expect_test::{expect, Expect};
    use pretty_assertions::assert_eq;

    fn roundtrip(sql: &str) -> Formatted {
        let statement = parse(sql).unwrap();
        Formatter::new().format_statement(&statement).unwrap()
    }

    /// Helper function to compare default-config output with the
    /// expected rendering.
    fn check(sql: &str, expected: Expect) {
        expected.assert_eq(&roundtrip(sql).sql);
    }

    fn format_with(config: FormatConfig, sql: &str) -> Formatted {
        let statement = parse(sql).unwrap();
        Formatter::with_config(config)
            .format_statement(&statement)
            .unwrap()
    }

    #[test]
    fn minimal_select() {
        assert_eq!(roundtrip("SELECT 1").sql, "select 1");
    }

    #[test]
    fn identifiers_are_escaped_by_default() {
        assert_eq!(
            roundtrip("SELECT id, name FROM person").sql,
            r#"select "id", "name" from "person""#,
        );
    }

    #[test]
    fn wildcard_is_never_escaped() {
        assert_eq!(
            roundtrip("SELECT *, t.* FROM t").sql,
            r#"select *, "t".* from "t""#,
        );
    }

    #[test]
    fn when_needed_escaping_quotes_reserved_and_mixed_case() {
        let config = FormatConfig {
            identifier_escape: IdentifierEscape::WhenNeeded,
            ..FormatConfig::default()
        };
        assert_eq!(
            format_with(config, r#"SELECT id, "select", "Mixed" FROM person"#).sql,
            r#"select id, "select", "Mixed" from person"#,
        );
    }

    #[test]
    fn alias_equal_to_column_name_is_elided() {
        assert_eq!(
            roundtrip("SELECT t.id AS id, t.id AS other FROM t").sql,
            r#"select "t"."id", "t"."id" as "other" from "t""#,
        );
    }

    #[test]
    fn named_parameters_keep_their_names() {
        let formatted = roundtrip("SELECT :a, :b, :a");
        assert_eq!(formatted.sql, "select :a, :b, :a");
        assert_eq!(formatted.parameters, vec!["a", "b"]);
    }

    #[test]
    fn digit_named_parameters_keep_the_dollar_form() {
        // `:1` would not lex back, so digit names stay `$n` even in
        // named style.
        let formatted = roundtrip("SELECT ?, ? FROM t WHERE age > ?");
        assert_eq!(
            formatted.sql,
            r#"select $1, $2 from "t" where "age" > $3"#,
        );
        assert_eq!(formatted.parameters, vec!["1", "2", "3"]);
    }

    #[test]
    fn positional_parameters_reuse_indices() {
        let config = FormatConfig::default()
            .with_parameter_style(ParameterStyle::PositionalNumeric);
        let formatted =
            format_with(config, "SELECT $1, $2 FROM t WHERE id = $1");
        assert_eq!(
            formatted.sql,
            r#"select $1, $2 from "t" where "id" = $1"#,
        );
        assert_eq!(formatted.parameters, vec!["1", "2"]);
    }

    #[test]
    fn anonymous_style_renders_bare_symbols() {
        let config = FormatConfig::default()
            .with_parameter_style(ParameterStyle::PositionalAnonymous);
        assert_eq!(
            format_with(config, "SELECT :a + :b").sql,
            "select ? + ?",
        );
    }

    #[test]
    fn keyword_case_upper() {
        let config = FormatConfig {
            keyword_case: KeywordCase::Upper,
            ..FormatConfig::default()
        };
        assert_eq!(
            format_with(config, "select 1 from t where x is not null").sql,
            r#"SELECT 1 FROM "t" WHERE "x" IS NOT NULL"#,
        );
    }

    #[test]
    fn comma_break_after_splits_select_items() {
        let config = FormatConfig {
            comma_break: CommaBreak::After,
            indent_size: 2,
            ..FormatConfig::default()
        };
        assert_eq!(
            format_with(config, "select a, b from t").sql,
            "select \"a\",\n  \"b\" from \"t\"",
        );
    }

    #[test]
    fn mssql_preset_brackets() {
        let config = Preset::Mssql.config();
        assert_eq!(
            format_with(config, "select id from t").sql,
            "select [id] from [t]",
        );
    }

    #[test]
    fn case_without_selector() {
        assert_eq!(
            roundtrip("SELECT CASE WHEN a THEN 1 ELSE 2 END").sql,
            r#"select case when "a" then 1 else 2 end"#,
        );
    }

    #[test]
    fn case_with_selector() {
        assert_eq!(
            roundtrip("SELECT CASE x WHEN 1 THEN 'a' END").sql,
            r#"select case "x" when 1 then 'a' end"#,
        );
    }

    #[test]
    fn cast_uses_the_functional_form() {
        assert_eq!(
            roundtrip("SELECT x::numeric(10, 2)").sql,
            r#"select cast("x" as numeric(10, 2))"#,
        );
    }

    #[test]
    fn set_operations_render_without_extra_parens() {
        assert_eq!(
            roundtrip("SELECT 1 UNION ALL SELECT 2").sql,
            "select 1 union all select 2",
        );
    }

    #[test]
    fn string_literals_re_escape() {
        assert_eq!(roundtrip("SELECT 'it''s'").sql, "select 'it''s'");
    }

    #[test]
    fn string_specifiers_keep_their_bodies() {
        assert_eq!(roundtrip(r"SELECT E'a\'b'").sql, r"select E'a\'b'");
        assert_eq!(roundtrip("SELECT X'1f'").sql, "select X'1f'");
    }

    #[test]
    fn window_function_rendering() {
        assert_eq!(
            roundtrip(
                "SELECT sum(x) OVER (PARTITION BY d ORDER BY y \
                 ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM t",
            )
            .sql,
            r#"select sum("x") over (partition by "d" order by "y" rows between unbounded preceding and current row) from "t""#,
        );
    }

    #[test]
    fn create_table_rendering() {
        assert_eq!(
            roundtrip(
                "CREATE TABLE person (id integer PRIMARY KEY, name text NOT NULL DEFAULT 'x')",
            )
            .sql,
            r#"create table "person" ("id" integer primary key, "name" text not null default 'x')"#,
        );
    }

    #[test]
    fn comment_on_rendering() {
        assert_eq!(
            roundtrip("COMMENT ON COLUMN person.name IS 'full name'").sql,
            r#"comment on column "person"."name" is 'full name'"#,
        );
        assert_eq!(
            roundtrip("COMMENT ON TABLE person IS NULL").sql,
            r#"comment on table "person" is null"#,
        );
    }

    #[test]
    fn snapshot_join_query() {
        check(
            "SELECT p.id, d.name FROM person p LEFT JOIN dept d \
             ON p.dept_id = d.id WHERE d.active",
            expect![[
                r#"select "p"."id", "d"."name" from "person" as "p" left join "dept" as "d" on "p"."dept_id" = "d"."id" where "d"."active""#
            ]],
        );
    }

    #[test]
    fn snapshot_cte_query() {
        check(
            "WITH totals AS (SELECT dept, sum(salary) AS total FROM emp GROUP BY dept) \
             SELECT * FROM totals ORDER BY total DESC",
            expect![[
                r#"with "totals" as (select "dept", sum("salary") as "total" from "emp" group by "dept") select * from "totals" order by "total" desc"#
            ]],
        );
    }

    #[test]
    fn snapshot_alter_table() {
        check(
            "ALTER TABLE person ADD CONSTRAINT fk FOREIGN KEY (dept_id) \
             REFERENCES dept (id) ON DELETE CASCADE",
            expect![[
                r#"alter table "person" add constraint "fk" foreign key ("dept_id") references "dept" ("id") on delete cascade"#
            ]],
        );
    }

    #[test]
    fn empty_raw_string_is_rejected() {
        use crate::ast::{Expr, RawString, Statement};
        let statement = Statement::Query(crate::ast::SelectQuery::Simple(Box::new(
            crate::ast::SimpleSelect {
                select: crate::ast::SelectClause {
                    distinct: None,
                    items: vec![crate::ast::SelectItem {
                        value: Expr::Binary {
                            left: Box::new(Expr::number("1")),
                            op: RawString::new("   "),
                            right: Box::new(Expr::number("2")),
                        },
                        alias: None,
                    }],
                },
                ..Default::default()
            },
        )));

        let err = Formatter::new().format_statement(&statement).unwrap_err();
        assert_eq!(err.kind, crate::error::DiagnosticKind::InvalidRawString);
    }
}
