//! Model reader - traverses a metadata source into a normalized model
//!
//! The reader is dialect-agnostic. It enumerates tables, columns, primary keys
//! and indexes as raw rows, builds the model from them and hands each table to
//! the injected `DialectNormalizer` for correction. All queries run one after
//! another on the calling task.

use crate::error::ReadError;
use crate::normalizer::{DialectNormalizer, ReadContext};
use schemaprobe_catalog::{AutoIncrementProbe, CommentStore, MetadataSource};
use schemaprobe_core::{
    escape_for_search, labels, Column, CommentConfig, Database, Diagnostic, DiagnosticCode, Index,
    MetadataRow, PatternConfig, ReadReport, Severity, Table, TypeCode,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A finished read: the model plus everything worth reporting about it
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub database: Database,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReadOutcome {
    /// Wrap the outcome into a versioned report
    pub fn into_report(self) -> ReadReport {
        ReadReport::new(self.database, self.diagnostics)
    }
}

/// Generic traversal driver holding one dialect normalizer
pub struct ModelReader {
    source: Arc<dyn MetadataSource>,
    comments: Option<Arc<dyn CommentStore>>,
    probe: Option<Arc<dyn AutoIncrementProbe>>,
    normalizer: Box<dyn DialectNormalizer>,
    patterns: PatternConfig,
    comment_config: CommentConfig,
}

impl ModelReader {
    /// Create a reader with default patterns and no comment store or probe
    pub fn new(source: Arc<dyn MetadataSource>, normalizer: Box<dyn DialectNormalizer>) -> Self {
        Self {
            source,
            comments: None,
            probe: None,
            normalizer,
            patterns: PatternConfig::default(),
            comment_config: CommentConfig::default(),
        }
    }

    pub fn with_comment_store(mut self, store: Arc<dyn CommentStore>) -> Self {
        self.comments = Some(store);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn AutoIncrementProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_patterns(mut self, patterns: PatternConfig) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_comment_config(mut self, comment_config: CommentConfig) -> Self {
        self.comment_config = comment_config;
        self
    }

    /// Name of the dialect in use
    pub fn dialect(&self) -> &'static str {
        self.normalizer.name()
    }

    /// Name of the underlying source
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Read every admitted table matching the configured patterns
    pub async fn read_model(&self, name: &str) -> Result<ReadOutcome, ReadError> {
        info!(
            "Reading model '{}' from {} ({} dialect)",
            name,
            self.source.name(),
            self.normalizer.name()
        );

        let rows = self
            .source
            .list_tables(
                self.patterns.catalog.as_deref(),
                self.patterns.schema.as_deref(),
                &self.patterns.table,
            )
            .await?;

        let mut database = Database::new(name);
        let mut diagnostics = Vec::new();

        for row in &rows {
            if !self.normalizer.admit_table(row) {
                debug!(
                    "Skipping system table '{}'",
                    row.get_str(labels::TABLE_NAME).unwrap_or_default()
                );
                continue;
            }

            let table = self.read_table(row, &mut diagnostics).await?;
            database.add_table(table);
        }

        info!(
            "Read {} tables with {} diagnostics",
            database.tables.len(),
            diagnostics.len()
        );

        Ok(ReadOutcome {
            database,
            diagnostics,
        })
    }

    /// Assemble one table from its raw row
    ///
    /// Admission is not checked here; diagnostics are appended to `diagnostics`.
    pub async fn read_table(
        &self,
        row: &MetadataRow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Table, ReadError> {
        let mut table = table_from_row(row)?;
        let schema = table.schema.clone();
        debug!("Reading table '{}'", table.name);

        let column_rows = self
            .source
            .list_columns(
                schema.as_deref(),
                &escape_for_search(&table.name),
                &self.patterns.column,
            )
            .await?;

        for column_row in &column_rows {
            if !belongs_to(column_row, schema.as_deref(), &table.name) {
                continue;
            }

            let mut column = column_from_row(column_row)?;
            if let TypeCode::Other(code) = column.type_code {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnknownTypeCode,
                        Severity::Info,
                        format!("Column '{}' has driver-specific type code {}", column.name, code),
                    )
                    .with_table(&table.name)
                    .with_column(&column.name),
                );
            }

            self.normalizer.correct_column(&mut column);
            table.columns.push(column);
        }

        let mut ctx = ReadContext::new(self.source.as_ref(), &self.comment_config)
            .with_comment_store(self.comments.as_deref())
            .with_probe(self.probe.as_deref());

        for pk_row in ctx.primary_keys(schema.as_deref(), &table.name).await? {
            if let Some(name) = pk_row.get_str(labels::COLUMN_NAME) {
                if let Some(column) = table.columns.iter_mut().find(|c| c.name == name) {
                    column.primary_key = true;
                }
            }
        }

        let index_rows = self.source.list_indexes(schema.as_deref(), &table.name).await?;
        table.indexes = group_indexes(&index_rows);

        self.normalizer.infer_auto_increment(&mut table, &mut ctx).await?;
        self.normalizer.reconcile_indexes(&mut table, &mut ctx).await?;
        if self.comment_config.enabled {
            self.normalizer.enrich_comments(&mut table, &mut ctx).await?;
        }

        diagnostics.extend(ctx.into_diagnostics());
        Ok(table)
    }
}

/// Whether a column row names this table, when it names one at all
fn belongs_to(row: &MetadataRow, schema: Option<&str>, table: &str) -> bool {
    let same_table = row
        .get_str(labels::TABLE_NAME)
        .map_or(true, |owner| owner == table);
    let same_schema = match (row.get_str(labels::TABLE_SCHEM), schema) {
        (Some(owner), Some(schema)) => owner == schema,
        _ => true,
    };
    same_table && same_schema
}

fn table_from_row(row: &MetadataRow) -> Result<Table, ReadError> {
    let name = row.get_string(labels::TABLE_NAME).ok_or(ReadError::MalformedRow {
        kind: "table",
        label: labels::TABLE_NAME,
    })?;

    let mut table = Table::new(name);
    table.catalog = row.get_string(labels::TABLE_CAT);
    table.schema = row.get_string(labels::TABLE_SCHEM);
    table.table_type = row.get_string(labels::TABLE_TYPE);
    table.description = row.get_string(labels::REMARKS);
    Ok(table)
}

fn column_from_row(row: &MetadataRow) -> Result<Column, ReadError> {
    let name = row.get_string(labels::COLUMN_NAME).ok_or(ReadError::MalformedRow {
        kind: "column",
        label: labels::COLUMN_NAME,
    })?;

    let type_code = match row.get_i64(labels::TYPE_CODE) {
        Some(code) => i32::try_from(code).map(TypeCode::from_code).ok(),
        None => row.get_str(labels::TYPE_NAME).and_then(TypeCode::from_name),
    }
    .ok_or(ReadError::MalformedRow {
        kind: "column",
        label: labels::TYPE_CODE,
    })?;

    let mut column = Column::new(name, type_code);
    column.size = row
        .get_i64(labels::COLUMN_SIZE)
        .and_then(|size| u32::try_from(size).ok());
    column.scale = row
        .get_i64(labels::SCALE)
        .and_then(|scale| i32::try_from(scale).ok())
        .unwrap_or(0);
    column.default_value = row.get_string(labels::COLUMN_DEF);
    column.description = row.get_string(labels::REMARKS);
    column.required = row.get_bool(labels::IS_NULLABLE).map(|nullable| !nullable).unwrap_or(false);
    column.auto_increment = row.get_bool(labels::IS_AUTOINCREMENT).unwrap_or(false);
    Ok(column)
}

/// Group per-column index rows by `INDEX_NAME`, in first-seen order
///
/// Columns are ordered by `ORDINAL_POSITION`. Rows without an index name
/// (table statistics) are ignored.
fn group_indexes(rows: &[MetadataRow]) -> Vec<Index> {
    let mut groups: Vec<(Index, Vec<(i64, String)>)> = Vec::new();

    for row in rows {
        let (Some(name), Some(column)) = (
            row.get_str(labels::INDEX_NAME),
            row.get_string(labels::COLUMN_NAME),
        ) else {
            continue;
        };
        let position = row.get_i64(labels::ORDINAL_POSITION).unwrap_or(i64::MAX);

        match groups.iter_mut().find(|(index, _)| index.name == name) {
            Some((_, columns)) => columns.push((position, column)),
            None => {
                let unique = !row.get_bool(labels::NON_UNIQUE).unwrap_or(true);
                groups.push((Index::new(name, unique), vec![(position, column)]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(mut index, mut columns)| {
            columns.sort_by_key(|(position, _)| *position);
            index.columns = columns.into_iter().map(|(_, column)| column).collect();
            index
        })
        .collect()
}
