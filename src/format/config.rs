// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Formatter configuration and presets.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCase {
    Lower,
    Upper,
    Preserve,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommaBreak {
    Before,
    After,
    None,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierEscape {
    Always,
    WhenNeeded,
    Never,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterStyle {
    Named,
    PositionalNumeric,
    PositionalAnonymous,
}

impl ParameterStyle {
    /// The symbol conventionally used with this style.
    fn default_symbol(self) -> &'static str {
        match self {
            Self::Named => ":",
            Self::PositionalNumeric => "$",
            Self::PositionalAnonymous => "?",
        }
    }
}

/// Bundles of settings for well-known environments.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Postgres,
    Mssql,
    Mysql,
    None,
}

impl Preset {
    pub fn config(self) -> FormatConfig {
        let base = FormatConfig::default();
        match self {
            Self::Postgres | Self::None => base,
            Self::Mssql => FormatConfig {
                identifier_escape_start: "[".into(),
                identifier_escape_end: "]".into(),
                ..base
            },
            Self::Mysql => FormatConfig {
                identifier_escape_start: "`".into(),
                identifier_escape_end: "`".into(),
                ..base
            },
        }
    }
}

/// Read-only once constructed; the formatter never mutates it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub identifier_escape_start: String,
    pub identifier_escape_end: String,
    pub parameter_symbol: String,
    pub parameter_style: ParameterStyle,
    pub keyword_case: KeywordCase,
    pub indent_size: usize,
    pub indent_char: char,
    pub newline: String,
    pub comma_break: CommaBreak,
    pub identifier_escape: IdentifierEscape,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            identifier_escape_start: "\"".into(),
            identifier_escape_end: "\"".into(),
            parameter_symbol: ":".into(),
            parameter_style: ParameterStyle::Named,
            keyword_case: KeywordCase::Lower,
            indent_size: 4,
            indent_char: ' ',
            newline: "\n".into(),
            comma_break: CommaBreak::None,
            identifier_escape: IdentifierEscape::Always,
        }
    }
}

impl FormatConfig {
    pub fn preset(preset: Preset) -> Self {
        preset.config()
    }

    /// Switches the parameter style together with its conventional
    /// symbol.
    pub fn with_parameter_style(mut self, style: ParameterStyle) -> Self {
        self.parameter_style = style;
        self.parameter_symbol = style.default_symbol().into();
        self
    }

    pub(crate) fn indent(&self) -> String {
        std::iter::repeat(self.indent_char)
            .take(self.indent_size)
            .collect()
    }
}
