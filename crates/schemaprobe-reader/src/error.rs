//! Read error types

use schemaprobe_catalog::{CommentTarget, SourceError};
use schemaprobe_core::ConfigError;

/// Errors that abort a model read
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// A required metadata query failed
    #[error("Metadata query failed: {0}")]
    Source(#[from] SourceError),

    /// The reader or its normalizer could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A raw row lacks a label the model cannot do without
    #[error("Malformed {kind} row: missing {label}")]
    MalformedRow {
        kind: &'static str,
        label: &'static str,
    },

    /// A comment lookup failed while `comments.strict` is set
    #[error("{target} comment lookup for table '{table}' failed: {source}")]
    CommentLookup {
        table: String,
        target: CommentTarget,
        source: SourceError,
    },
}
