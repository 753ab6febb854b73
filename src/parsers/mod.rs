//! Entity normalizer
//!
//! Turns a raw model definition (TMDL-like text or TMSL-like JSON) into
//! one canonical [`Model`]. Both producers share one vocabulary so rules
//! never branch on the input format.

pub mod dax;
pub mod json;
pub mod mquery;
pub mod text;

use crate::graph::Model;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Which parser to use for a payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    #[default]
    Auto,
    Text,
    Json,
}

impl FromStr for FormatHint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(FormatHint::Auto),
            "text" | "tmdl" => Ok(FormatHint::Text),
            "json" | "tmsl" => Ok(FormatHint::Json),
            _ => Err(anyhow::anyhow!(
                "Unknown input format '{}'. Valid: auto, text, json",
                s
            )),
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Auto => write!(f, "auto"),
            FormatHint::Text => write!(f, "text"),
            FormatHint::Json => write!(f, "json"),
        }
    }
}

/// The payload could not be normalized at all. Every variant is a
/// `MalformedInput` failure; no partial model is ever returned.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("input is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unexpected JSON shape: {0}")]
    UnexpectedShape(String),

    #[error("no model objects found (expected table, relationship, role or expression blocks)")]
    NoModelObjects,
}

impl NormalizeError {
    /// Error taxonomy name
    pub fn kind(&self) -> &'static str {
        "MalformedInput"
    }
}

/// Pick a parser: JSON when the first non-whitespace byte is `{`
pub fn detect_format(raw: &[u8]) -> FormatHint {
    match raw.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => FormatHint::Json,
        _ => FormatHint::Text,
    }
}

/// Normalize a raw definition into a [`Model`]
pub fn normalize(raw: &[u8], hint: FormatHint) -> Result<Model, NormalizeError> {
    // Tolerate a UTF-8 byte order mark
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let text = std::str::from_utf8(raw)?;

    let format = match hint {
        FormatHint::Auto => detect_format(raw),
        explicit => explicit,
    };
    debug!("Normalizing {} bytes as {}", raw.len(), format);

    match format {
        FormatHint::Json => json::parse(text),
        _ => text::parse(text),
    }
}

/// Canonical expression text: lines trimmed, blank lines dropped
pub(crate) fn clean_expression(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
