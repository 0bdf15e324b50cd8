//! Error kinds surfaced by the modular tokenizer.
//!
//! Every fallible operation returns [`ModularTokenizerError`]; nothing is
//! swallowed. Non-fatal conditions (truncation overflow, skipped padding,
//! decoder collisions) are logged via `tracing::warn!` rather than returned
//! as errors - see the call sites in [`crate::pipeline`] and
//! [`crate::decoder_index`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ModularTokenizerError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("inconsistent tokenizer ({reason}): offenders = {offenders:?}")]
    Inconsistent {
        reason: &'static str,
        offenders: Vec<String>,
    },

    #[error("name collision: tokens already exist as regular tokens: {texts:?}")]
    NameCollision { texts: Vec<String> },

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    #[error("ambiguous token {token:?}: maps to ids {ids:?} across {domains:?}")]
    AmbiguousToken {
        token: String,
        ids: Vec<u32>,
        domains: Vec<String>,
    },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("underlying tokenizer engine error: {0}")]
    Engine(String),

    #[error("io error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest '{path}': {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse sub-tokenizer json '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ModularTokenizerResult<T> = std::result::Result<T, ModularTokenizerError>;
