// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Reserved-word table used by the formatter's `when-needed` escaping.

use std::collections::HashSet;

lazy_static::lazy_static! {
    /// Words that must be quoted when used as a bare identifier.
    ///
    /// This is the PostgreSQL reserved list plus the handful of
    /// non-reserved words this library itself treats as clause starters.
    static ref RESERVED: HashSet<&'static str> = {
        [
            "all", "alter", "and", "any", "array", "as", "asc", "between",
            "both", "case", "cast", "check", "collate", "column", "comment",
            "constraint", "create", "cross", "current", "default",
            "deferrable", "desc", "distinct", "do", "else", "end", "except",
            "exists", "false", "fetch", "for", "foreign", "from", "full",
            "grant", "group", "having", "ilike", "in", "index", "initially",
            "inner", "intersect", "into", "is", "join", "lateral", "leading",
            "left", "like", "limit", "localtime", "localtimestamp",
            "materialized", "natural", "not", "null", "offset", "on", "only",
            "or", "order", "outer", "over", "partition", "placing", "primary",
            "recursive", "references", "returning", "right", "select",
            "session_user", "set", "some", "symmetric", "table", "then",
            "to", "trailing", "true", "union", "unique", "user", "using",
            "values", "variadic", "when", "where", "window", "with",
        ]
        .into_iter()
        .collect()
    };
}

/// Whether `word` needs quoting to be usable as a plain identifier.
pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(word.to_lowercase().as_str())
}
