//! Dialect normalization hooks
//!
//! The model reader owns the traversal; a `DialectNormalizer` decides which
//! tables are admitted and how raw columns, indexes and comments are corrected
//! for one database dialect. Hooks run per table in this order:
//!
//! 1. `admit_table` for the raw table row
//! 2. `correct_column` for every column, in declaration order
//! 3. `infer_auto_increment`
//! 4. `reconcile_indexes`
//! 5. `enrich_comments` (skipped when comments are disabled)

use crate::error::ReadError;
use schemaprobe_catalog::{AutoIncrementProbe, CommentStore, MetadataSource, SourceError};
use schemaprobe_core::{Column, CommentConfig, Diagnostic, MetadataRow, Table};

/// Per-table state handed to the asynchronous normalizer hooks
pub struct ReadContext<'a> {
    source: &'a dyn MetadataSource,
    comments: Option<&'a dyn CommentStore>,
    probe: Option<&'a dyn AutoIncrementProbe>,
    comment_config: &'a CommentConfig,

    /// Primary-key rows, fetched on first use
    primary_keys: Option<Vec<MetadataRow>>,

    diagnostics: Vec<Diagnostic>,
}

impl<'a> ReadContext<'a> {
    pub fn new(source: &'a dyn MetadataSource, comment_config: &'a CommentConfig) -> Self {
        Self {
            source,
            comments: None,
            probe: None,
            comment_config,
            primary_keys: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_comment_store(mut self, store: Option<&'a dyn CommentStore>) -> Self {
        self.comments = store;
        self
    }

    pub fn with_probe(mut self, probe: Option<&'a dyn AutoIncrementProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn source(&self) -> &'a dyn MetadataSource {
        self.source
    }

    pub fn comment_store(&self) -> Option<&'a dyn CommentStore> {
        self.comments
    }

    pub fn probe(&self) -> Option<&'a dyn AutoIncrementProbe> {
        self.probe
    }

    pub fn comment_config(&self) -> &'a CommentConfig {
        self.comment_config
    }

    /// Primary-key rows of `table` in `schema`
    ///
    /// The source is queried at most once per context; later calls reuse the rows.
    pub async fn primary_keys(
        &mut self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<&[MetadataRow], SourceError> {
        if self.primary_keys.is_none() {
            let rows = self.source.list_primary_keys(schema, table).await?;
            self.primary_keys = Some(rows);
        }
        Ok(self.primary_keys.as_deref().unwrap_or_default())
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Correction policy for one database dialect
///
/// Every hook has a no-op default, so a dialect only overrides what its
/// driver reports inconsistently.
#[async_trait::async_trait]
pub trait DialectNormalizer: Send + Sync {
    /// Get the dialect name (e.g., "mssql", "generic")
    fn name(&self) -> &'static str;

    /// Whether a raw table row becomes part of the model
    fn admit_table(&self, _row: &MetadataRow) -> bool {
        true
    }

    /// Rewrite a freshly read column's default value and type code
    fn correct_column(&self, _column: &mut Column) {}

    /// Set auto-increment flags the metadata reported unreliably
    async fn infer_auto_increment(
        &self,
        _table: &mut Table,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<(), ReadError> {
        Ok(())
    }

    /// Remove indexes that duplicate the primary key
    async fn reconcile_indexes(
        &self,
        _table: &mut Table,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<(), ReadError> {
        Ok(())
    }

    /// Attach table and column descriptions from a side-channel store
    async fn enrich_comments(
        &self,
        _table: &mut Table,
        _ctx: &mut ReadContext<'_>,
    ) -> Result<(), ReadError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaprobe_catalog::{MockOperation, MockSource, MockTable};

    #[tokio::test]
    async fn primary_keys_are_fetched_once() {
        let source = MockSource::from_tables(vec![
            MockTable::new("Orders").with_primary_key("PK_Orders", "Id"),
        ]);
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments);

        assert_eq!(ctx.primary_keys(None, "Orders").await.unwrap().len(), 1);
        assert_eq!(ctx.primary_keys(None, "Orders").await.unwrap().len(), 1);
        assert_eq!(source.call_count(MockOperation::ListPrimaryKeys).await, 1);
    }

    #[tokio::test]
    async fn failed_primary_key_lookup_is_not_cached() {
        let source = MockSource::new().with_failure(
            MockOperation::ListPrimaryKeys,
            SourceError::QueryError("denied".into()),
        );
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments);

        assert!(ctx.primary_keys(None, "Orders").await.is_err());
        assert!(ctx.primary_keys(None, "Orders").await.is_err());
        assert_eq!(source.call_count(MockOperation::ListPrimaryKeys).await, 2);
    }
}
