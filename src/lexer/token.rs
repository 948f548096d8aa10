// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Token definition for the [`logos`] lexer.

use std::fmt;

/// Consumes a `$tag$ … $tag$` string. The slice at callback time is the
/// opening tag; the body runs until the identical closing tag.
fn lex_dollar_string(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let tag = lex.slice().to_owned();
    match lex.remainder().find(&tag) {
        Some(end) => {
            lex.bump(end + tag.len());
            true
        }
        None => false,
    }
}

/// Consumes a `/* … */` comment, honouring nesting.
fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return true;
            }
        } else {
            i += 1;
        }
    }

    false
}

/// Use to tokenize the input text.
#[derive(logos::Logos, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[ \t\n\r\x0c]+")]
    Whitespace,

    #[regex(r"--[^\n]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    #[token("select", ignore(case))]
    SelectKw,

    #[token("from", ignore(case))]
    FromKw,

    #[token("where", ignore(case))]
    WhereKw,

    #[token("group", ignore(case))]
    GroupKw,

    #[token("by", ignore(case))]
    ByKw,

    #[token("having", ignore(case))]
    HavingKw,

    #[token("order", ignore(case))]
    OrderKw,

    #[token("limit", ignore(case))]
    LimitKw,

    #[token("offset", ignore(case))]
    OffsetKw,

    #[token("fetch", ignore(case))]
    FetchKw,

    #[token("first", ignore(case))]
    FirstKw,

    #[token("next", ignore(case))]
    NextKw,

    #[token("row", ignore(case))]
    RowKw,

    #[token("rows", ignore(case))]
    RowsKw,

    #[token("only", ignore(case))]
    OnlyKw,

    #[token("for", ignore(case))]
    ForKw,

    #[token("update", ignore(case))]
    UpdateKw,

    #[token("share", ignore(case))]
    ShareKw,

    #[token("key", ignore(case))]
    KeyKw,

    #[token("no", ignore(case))]
    NoKw,

    #[token("with", ignore(case))]
    WithKw,

    #[token("recursive", ignore(case))]
    RecursiveKw,

    #[token("as", ignore(case))]
    AsKw,

    #[token("distinct", ignore(case))]
    DistinctKw,

    #[token("on", ignore(case))]
    OnKw,

    #[token("all", ignore(case))]
    AllKw,

    #[token("union", ignore(case))]
    UnionKw,

    #[token("intersect", ignore(case))]
    IntersectKw,

    #[token("except", ignore(case))]
    ExceptKw,

    #[token("values", ignore(case))]
    ValuesKw,

    #[token("case", ignore(case))]
    CaseKw,

    #[token("when", ignore(case))]
    WhenKw,

    #[token("then", ignore(case))]
    ThenKw,

    #[token("else", ignore(case))]
    ElseKw,

    #[token("end", ignore(case))]
    EndKw,

    #[token("between", ignore(case))]
    BetweenKw,

    #[token("and", ignore(case))]
    AndKw,

    #[token("or", priority = 100, ignore(case))]
    OrKw,

    #[token("not", ignore(case))]
    NotKw,

    #[token("is", ignore(case))]
    IsKw,

    #[token("null", ignore(case))]
    NullKw,

    #[token("true", ignore(case))]
    TrueKw,

    #[token("false", ignore(case))]
    FalseKw,

    #[token("in", ignore(case))]
    InKw,

    #[token("like", ignore(case))]
    LikeKw,

    #[token("ilike", ignore(case))]
    IlikeKw,

    #[token("exists", ignore(case))]
    ExistsKw,

    #[token("cast", ignore(case))]
    CastKw,

    #[token("over", ignore(case))]
    OverKw,

    #[token("partition", ignore(case))]
    PartitionKw,

    #[token("window", ignore(case))]
    WindowKw,

    #[token("range", ignore(case))]
    RangeKw,

    #[token("groups", ignore(case))]
    GroupsKw,

    #[token("unbounded", ignore(case))]
    UnboundedKw,

    #[token("preceding", ignore(case))]
    PrecedingKw,

    #[token("following", ignore(case))]
    FollowingKw,

    #[token("current", ignore(case))]
    CurrentKw,

    #[token("materialized", ignore(case))]
    MaterializedKw,

    #[token("create", ignore(case))]
    CreateKw,

    #[token("table", ignore(case))]
    TableKw,

    #[token("index", ignore(case))]
    IndexKw,

    #[token("unique", ignore(case))]
    UniqueKw,

    #[token("alter", ignore(case))]
    AlterKw,

    #[token("add", ignore(case))]
    AddKw,

    #[token("constraint", ignore(case))]
    ConstraintKw,

    #[token("primary", ignore(case))]
    PrimaryKw,

    #[token("foreign", ignore(case))]
    ForeignKw,

    #[token("references", ignore(case))]
    ReferencesKw,

    #[token("default", ignore(case))]
    DefaultKw,

    #[token("check", ignore(case))]
    CheckKw,

    #[token("comment", ignore(case))]
    CommentKw,

    #[token("column", ignore(case))]
    ColumnKw,

    #[token("set", ignore(case))]
    SetKw,

    #[token("drop", ignore(case))]
    DropKw,

    #[token("delete", ignore(case))]
    DeleteKw,

    #[token("cascade", ignore(case))]
    CascadeKw,

    #[token("restrict", ignore(case))]
    RestrictKw,

    #[token("action", ignore(case))]
    ActionKw,

    #[token("asc", ignore(case))]
    AscKw,

    #[token("desc", ignore(case))]
    DescKw,

    #[token("nulls", ignore(case))]
    NullsKw,

    #[token("last", ignore(case))]
    LastKw,

    #[token("join", ignore(case))]
    JoinKw,

    #[token("inner", ignore(case))]
    InnerKw,

    #[token("left", ignore(case))]
    LeftKw,

    #[token("right", ignore(case))]
    RightKw,

    #[token("full", ignore(case))]
    FullKw,

    #[token("outer", ignore(case))]
    OuterKw,

    #[token("cross", ignore(case))]
    CrossKw,

    #[token("lateral", ignore(case))]
    LateralKw,

    #[token("using", ignore(case))]
    UsingKw,

    #[token("array", ignore(case))]
    ArrayKw,

    #[token("grant", ignore(case))]
    GrantKw,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?|\.[0-9]+")]
    NumberLiteral,

    #[regex(r"'([^']|'')*'")]
    StringLiteral,

    #[regex(r"(?i)e'([^'\\]|''|\\.)*'")]
    EscapeString,

    #[regex(r"(?i)x'[0-9a-f]*'")]
    HexString,

    #[regex(r"(?i)u&'([^']|'')*'")]
    UnicodeString,

    // The opening tag; the callback consumes body and closing tag.
    #[regex(r"\$([a-zA-Z_][a-zA-Z0-9_]*)?\$", lex_dollar_string)]
    DollarString,

    // Thousands-grouped (or dotted) digits after `$` read as a
    // SQL-Server money literal; a bare `$n` stays a parameter marker.
    #[regex(r"\$[0-9]+(,[0-9][0-9][0-9])+(\.[0-9]+)?|\$[0-9]+\.[0-9]+")]
    MoneyLiteral,

    #[regex(r"\$[0-9]+")]
    PositionalParam,

    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*")]
    NamedParam,

    #[token("?")]
    AnonymousParam,

    #[regex(r"(?i)[a-z_][a-z0-9_$]*", priority = 1)]
    Ident,

    #[regex(r#""([^"]|"")+""#)]
    DelimitedIdent,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(";")]
    SemiColon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("::")]
    DoubleColon,

    #[token(":")]
    Colon,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Asterisk,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("||")]
    DoublePipe,

    #[regex("=|<>|!=|<=|>=|<|>")]
    ComparisonOp,

    #[error]
    Error,

    /// Marker token to indicate end of input, not used by lexer directly.
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }

    /// Keyword tokens that PostgreSQL accepts as bare identifiers.
    pub fn is_unreserved_keyword(self) -> bool {
        matches!(
            self,
            Self::FirstKw
                | Self::NextKw
                | Self::RowKw
                | Self::RowsKw
                | Self::KeyKw
                | Self::NoKw
                | Self::ActionKw
                | Self::SetKw
                | Self::ShareKw
                | Self::UpdateKw
                | Self::DeleteKw
                | Self::CascadeKw
                | Self::RestrictKw
                | Self::CommentKw
                | Self::NullsKw
                | Self::LastKw
                | Self::RangeKw
                | Self::GroupsKw
                | Self::UnboundedKw
                | Self::PrecedingKw
                | Self::FollowingKw
                | Self::MaterializedKw
                | Self::OverKw
                | Self::PartitionKw
                | Self::IndexKw
                | Self::AddKw
                | Self::ByKw
        )
    }

    pub fn is_keyword(self) -> bool {
        !matches!(
            self,
            Self::Whitespace
                | Self::LineComment
                | Self::BlockComment
                | Self::NumberLiteral
                | Self::StringLiteral
                | Self::EscapeString
                | Self::HexString
                | Self::UnicodeString
                | Self::DollarString
                | Self::MoneyLiteral
                | Self::PositionalParam
                | Self::NamedParam
                | Self::AnonymousParam
                | Self::Ident
                | Self::DelimitedIdent
                | Self::Dot
                | Self::Comma
                | Self::SemiColon
                | Self::LParen
                | Self::RParen
                | Self::LBracket
                | Self::RBracket
                | Self::DoubleColon
                | Self::Colon
                | Self::Plus
                | Self::Minus
                | Self::Asterisk
                | Self::Slash
                | Self::Percent
                | Self::DoublePipe
                | Self::ComparisonOp
                | Self::Error
                | Self::Eof
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn check(input: &str, kind: TokenKind) {
        let mut lexer = Lexer::new(input);
        let token = lexer.next().unwrap();
        assert_eq!(token.kind, kind, "input: {input}");
        assert_eq!(token.text, input);
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    #[test]
    fn lex_spaces_and_newlines() {
        check("  \n", TokenKind::Whitespace);
    }

    #[test]
    fn lex_ident() {
        check("hello", TokenKind::Ident);
        check("a$b", TokenKind::Ident);
    }

    #[test]
    fn lex_quoted_ident() {
        check(r#""読文👩🏼‍🔬""#, TokenKind::DelimitedIdent);
        check(r#""select""#, TokenKind::DelimitedIdent);
    }

    #[test]
    fn lex_keywords_case_insensitively() {
        check("SELECT", TokenKind::SelectKw);
        check("Select", TokenKind::SelectKw);
        check("materialized", TokenKind::MaterializedKw);
    }

    #[test]
    fn lex_numbers() {
        check("1", TokenKind::NumberLiteral);
        check("3.14", TokenKind::NumberLiteral);
        check(".5", TokenKind::NumberLiteral);
        check("1e10", TokenKind::NumberLiteral);
        check("2.5e-3", TokenKind::NumberLiteral);
    }

    #[test]
    fn lex_string_literals() {
        check("'hello'", TokenKind::StringLiteral);
        check("'it''s'", TokenKind::StringLiteral);
        assert_eq!(
            kinds("'a' 'b'"),
            vec![
                TokenKind::StringLiteral,
                TokenKind::Whitespace,
                TokenKind::StringLiteral,
            ],
        );
    }

    #[test]
    fn lex_string_specifiers() {
        check(r"E'a\'b'", TokenKind::EscapeString);
        check("X'1f'", TokenKind::HexString);
        check("U&'d!0061t!+000061'", TokenKind::UnicodeString);
    }

    #[test]
    fn lex_dollar_quoted_strings() {
        check("$$ body; $$", TokenKind::DollarString);
        check("$fn$ select 1; $fn$", TokenKind::DollarString);
    }

    #[test]
    fn unterminated_dollar_string_is_an_error() {
        assert!(kinds("$tag$ never closed").contains(&TokenKind::Error));
    }

    #[test]
    fn lex_block_comment_nested() {
        check("/* outer /* inner */ outer */", TokenKind::BlockComment);
    }

    #[test]
    fn lex_line_comment() {
        assert_eq!(
            kinds("-- note\n1"),
            vec![
                TokenKind::LineComment,
                TokenKind::Whitespace,
                TokenKind::NumberLiteral,
            ],
        );
    }

    #[test]
    fn money_beats_parameter_when_grouped() {
        check("$1,000", TokenKind::MoneyLiteral);
        check("$1,000.50", TokenKind::MoneyLiteral);
        check("$12.34", TokenKind::MoneyLiteral);
    }

    #[test]
    fn bare_positional_stays_a_parameter() {
        check("$1", TokenKind::PositionalParam);
        check("$42", TokenKind::PositionalParam);
        // `,00` is not a thousands group, so `$10` is a parameter again.
        assert_eq!(
            kinds("$10,00"),
            vec![
                TokenKind::PositionalParam,
                TokenKind::Comma,
                TokenKind::NumberLiteral,
            ],
        );
    }

    #[test]
    fn lex_parameter_markers() {
        check(":user_id", TokenKind::NamedParam);
        check("?", TokenKind::AnonymousParam);
    }

    #[test]
    fn double_colon_is_not_a_named_parameter() {
        assert_eq!(
            kinds("x::int"),
            vec![TokenKind::Ident, TokenKind::DoubleColon, TokenKind::Ident],
        );
    }

    #[test]
    fn lex_operators() {
        check("<=", TokenKind::ComparisonOp);
        check("<>", TokenKind::ComparisonOp);
        check("||", TokenKind::DoublePipe);
        check("%", TokenKind::Percent);
    }
}
