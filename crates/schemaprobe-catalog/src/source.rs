//! Source traits for raw schema metadata
//!
//! A metadata source enumerates tables, columns, indexes and primary keys as
//! raw rows. Comment stores and auto-increment probes are separate capabilities
//! because not every dialect offers them.
//!
//! Per-table lookups take the table's schema. `None` leaves the schema to the
//! source: the mock matches any schema, SQL Server resolves the caller's
//! default schema.

use schemaprobe_core::MetadataRow;
use std::collections::HashSet;
use std::fmt;

/// Extended property holding object descriptions
pub const DESCRIPTION_PROPERTY: &str = "MS_DESCRIPTION";

/// Level-0 object type of comment lookups
pub const COMMENT_LEVEL0_TYPE: &str = "schema";

/// Level-1 object type of comment lookups
pub const COMMENT_LEVEL1_TYPE: &str = "table";

/// Granularity of a comment lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentTarget {
    /// The table's own description
    Table,

    /// Descriptions of all columns of the table
    Column,
}

impl CommentTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Column => "column",
        }
    }
}

impl fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur when querying a source
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SourceError {
    /// Short stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionError(_) => "connection",
            Self::AuthenticationError(_) => "authentication",
            Self::QueryError(_) => "query",
            Self::Unsupported(_) => "unsupported",
            Self::InvalidResponse(_) => "invalid_response",
            Self::ConfigError(_) => "config",
        }
    }
}

/// Enumerates raw schema metadata
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Get the source name (e.g., "SQL Server", "Mock")
    fn name(&self) -> &'static str;

    /// List table rows matching the given search patterns
    ///
    /// `None` for catalog or schema matches any value.
    async fn list_tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError>;

    /// List column rows of the tables of `schema` matching `table_pattern`, in declaration order
    async fn list_columns(
        &self,
        schema: Option<&str>,
        table_pattern: &str,
        column_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError>;

    /// List index rows of a table, one row per indexed column
    async fn list_indexes(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError>;

    /// List primary-key rows of a table, carrying `PK_NAME`
    async fn list_primary_keys(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError>;

    /// Test the connection to the source
    async fn test_connection(&self) -> Result<(), SourceError>;
}

/// Side-channel store of object descriptions
#[async_trait::async_trait]
pub trait CommentStore: Send + Sync {
    /// List comment rows (`objname`, `value`) for a table or its columns
    async fn list_comments(
        &self,
        target: CommentTarget,
        schema: &str,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError>;
}

/// Read-only probe of generated-key behavior
#[async_trait::async_trait]
pub trait AutoIncrementProbe: Send + Sync {
    /// Names of the given columns of `table` whose values the database generates
    ///
    /// Implementations must not fetch any data rows.
    async fn auto_increment_columns(
        &self,
        schema: Option<&str>,
        table: &str,
        columns: &[String],
    ) -> Result<HashSet<String>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_target_names() {
        assert_eq!(CommentTarget::Table.as_str(), "table");
        assert_eq!(CommentTarget::Column.to_string(), "column");
    }

    #[test]
    fn error_kinds() {
        assert_eq!(SourceError::Unsupported("x".into()).kind(), "unsupported");
        assert_eq!(SourceError::ConnectionError("x".into()).kind(), "connection");
        assert_eq!(
            SourceError::QueryError("syntax".into()).to_string(),
            "Query failed: syntax"
        );
    }
}
