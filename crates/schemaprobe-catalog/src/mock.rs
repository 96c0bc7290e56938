//! In-memory metadata source for testing and offline reads
//!
//! This source returns predefined raw rows without connecting to any database.
//! It's useful for:
//! - Unit testing dialect normalization
//! - Reading a model from a JSON catalog snapshot (see `CatalogSnapshot`)
//! - Simulating failures of individual metadata queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemaprobe_catalog::mock::{MockSource, MockTable, column_row};
//! use schemaprobe_core::{labels, TypeCode};
//!
//! let source = MockSource::new();
//! source
//!     .add_table(
//!         MockTable::new("Orders")
//!             .with_column(column_row("Amount", TypeCode::Decimal).with(labels::COLUMN_SIZE, 19))
//!             .with_column_comment("amount", "Order total"),
//!     )
//!     .await;
//!
//! let rows = source.list_columns(None, "Orders", "%").await?;
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! let source = MockSource::new()
//!     .with_failure(MockOperation::ColumnComments, SourceError::Unsupported("fn_listextendedproperty".into()));
//! ```

use crate::source::{AutoIncrementProbe, CommentStore, CommentTarget, MetadataSource, SourceError};
use schemaprobe_core::{labels, search_pattern_matches, search_pattern_regex, MetadataRow, TypeCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Operations whose failure can be simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockOperation {
    ListTables,
    ListColumns,
    ListIndexes,
    ListPrimaryKeys,
    TableComments,
    ColumnComments,
    AutoIncrementProbe,
}

/// Raw metadata of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MockTable {
    /// The table row (`TABLE_NAME`, `TABLE_TYPE`, ...)
    pub row: MetadataRow,

    #[serde(default)]
    pub columns: Vec<MetadataRow>,

    #[serde(default)]
    pub indexes: Vec<MetadataRow>,

    #[serde(default)]
    pub primary_keys: Vec<MetadataRow>,

    #[serde(default)]
    pub table_comments: Vec<MetadataRow>,

    #[serde(default)]
    pub column_comments: Vec<MetadataRow>,

    /// Columns the auto-increment probe reports as generated
    #[serde(default)]
    pub auto_increment: Vec<String>,

    /// Schema under which the comments are stored
    #[serde(default = "default_comment_schema")]
    pub comment_schema: String,
}

fn default_comment_schema() -> String {
    "dbo".to_string()
}

impl MockTable {
    /// Create a table of type `TABLE` with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            row: table_row(name),
            comment_schema: default_comment_schema(),
            ..Default::default()
        }
    }

    /// Table name, empty if the row carries none
    pub fn name(&self) -> &str {
        self.row.get_str(labels::TABLE_NAME).unwrap_or_default()
    }

    /// Schema of the table, if the row carries one
    pub fn schema(&self) -> Option<&str> {
        self.row.get_str(labels::TABLE_SCHEM)
    }

    /// Place the table in a schema; column rows added so far follow it
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.row.insert(labels::TABLE_SCHEM, schema);
        for column in &mut self.columns {
            column.insert(labels::TABLE_SCHEM, schema);
        }
        self
    }

    /// Whether the table belongs to `schema`; `None` or a schemaless table always matches
    pub fn in_schema(&self, schema: Option<&str>) -> bool {
        match (schema, self.schema()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }

    /// Add a column row; `TABLE_NAME`, `TABLE_SCHEM` and `ORDINAL_POSITION` are filled in if absent
    pub fn with_column(mut self, mut row: MetadataRow) -> Self {
        if row.get(labels::TABLE_NAME).is_none() {
            row.insert(labels::TABLE_NAME, self.name().to_string());
        }
        if row.get(labels::TABLE_SCHEM).is_none() {
            if let Some(schema) = self.schema().map(str::to_string) {
                row.insert(labels::TABLE_SCHEM, schema);
            }
        }
        if row.get(labels::ORDINAL_POSITION).is_none() {
            row.insert(labels::ORDINAL_POSITION, self.columns.len() as i64 + 1);
        }
        self.columns.push(row);
        self
    }

    /// Add a single-column index
    pub fn with_index(mut self, name: &str, unique: bool, column: &str) -> Self {
        let position = self
            .indexes
            .iter()
            .filter(|r| r.get_str(labels::INDEX_NAME) == Some(name))
            .count() as i64
            + 1;
        let row = index_row(name, unique, column, position).with(labels::TABLE_NAME, self.name().to_string());
        self.indexes.push(row);
        self
    }

    /// Add a primary-key constraint row
    pub fn with_primary_key(mut self, pk_name: &str, column: &str) -> Self {
        let row = MetadataRow::new()
            .with(labels::TABLE_NAME, self.name().to_string())
            .with(labels::COLUMN_NAME, column)
            .with(labels::PK_NAME, pk_name);
        self.primary_keys.push(row);
        self
    }

    /// Add a table comment row
    pub fn with_table_comment(mut self, value: &str) -> Self {
        let row = comment_row(self.name().to_string(), value);
        self.table_comments.push(row);
        self
    }

    /// Add a column comment row
    pub fn with_column_comment(mut self, column: &str, value: &str) -> Self {
        self.column_comments.push(comment_row(column, value));
        self
    }

    /// Report a column as auto-increment through the probe
    pub fn with_auto_increment(mut self, column: &str) -> Self {
        self.auto_increment.push(column.to_string());
        self
    }

    /// Store comments under a different schema
    pub fn with_comment_schema(mut self, schema: &str) -> Self {
        self.comment_schema = schema.to_string();
        self
    }
}

/// A JSON catalog snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Name of the captured database
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub tables: Vec<MockTable>,
}

/// A table row of type `TABLE`
pub fn table_row(name: impl Into<String>) -> MetadataRow {
    MetadataRow::new()
        .with(labels::TABLE_NAME, name.into())
        .with(labels::TABLE_TYPE, "TABLE")
}

/// A column row with a type code
pub fn column_row(name: &str, type_code: TypeCode) -> MetadataRow {
    MetadataRow::new()
        .with(labels::COLUMN_NAME, name)
        .with(labels::TYPE_CODE, type_code.code())
}

/// An index row for one indexed column
pub fn index_row(name: &str, unique: bool, column: &str, position: i64) -> MetadataRow {
    MetadataRow::new()
        .with(labels::INDEX_NAME, name)
        .with(labels::NON_UNIQUE, !unique)
        .with(labels::COLUMN_NAME, column)
        .with(labels::ORDINAL_POSITION, position)
}

/// A comment store row
pub fn comment_row(objname: impl Into<String>, value: &str) -> MetadataRow {
    MetadataRow::new()
        .with(labels::OBJNAME, objname.into())
        .with(labels::VALUE, value)
}

#[derive(Debug, Clone)]
struct MockFailure {
    operation: MockOperation,
    table: Option<String>,
    error: SourceError,
}

/// In-memory metadata source, comment store and auto-increment probe
#[derive(Clone)]
pub struct MockSource {
    /// Tables in enumeration order
    tables: Arc<RwLock<Vec<MockTable>>>,

    /// Simulated failures
    failures: Arc<RwLock<Vec<MockFailure>>>,

    /// Number of calls per operation
    calls: Arc<RwLock<HashMap<MockOperation, usize>>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Name to return from name() method
    source_name: &'static str,
}

impl MockSource {
    /// Create a new mock source with no tables
    pub fn new() -> Self {
        Self::from_tables(Vec::new())
    }

    /// Create a mock source from a pre-built list of tables
    pub fn from_tables(tables: Vec<MockTable>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
            failures: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(HashMap::new())),
            fail_connection: false,
            source_name: "Mock",
        }
    }

    /// Create a mock source serving a catalog snapshot
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self::from_tables(snapshot.tables).with_name("Snapshot")
    }

    /// Parse a JSON catalog snapshot
    pub fn from_snapshot_json(json: &str) -> Result<Self, SourceError> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::InvalidResponse(format!("Invalid catalog snapshot: {}", e)))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a JSON catalog snapshot from disk
    pub fn from_snapshot_file(path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SourceError::ConfigError(format!("Cannot read snapshot {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loading catalog snapshot from {}", path.display());
        Self::from_snapshot_json(&json)
    }

    /// Add a table
    pub async fn add_table(&self, table: MockTable) {
        self.tables.write().await.push(table);
    }

    /// Fail every call of an operation
    pub fn with_failure(self, operation: MockOperation, error: SourceError) -> Self {
        // Builder-time call, the lock is uncontended
        if let Ok(mut failures) = self.failures.try_write() {
            failures.push(MockFailure { operation, table: None, error });
        }
        self
    }

    /// Fail an operation for one table only
    pub async fn add_failure_for_table(&self, operation: MockOperation, table: &str, error: SourceError) {
        self.failures.write().await.push(MockFailure {
            operation,
            table: Some(table.to_string()),
            error,
        });
    }

    /// Configure to fail all connection tests
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Set a custom source name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.source_name = name;
        self
    }

    /// Number of times an operation has been called
    pub async fn call_count(&self, operation: MockOperation) -> usize {
        self.calls.read().await.get(&operation).copied().unwrap_or(0)
    }

    /// Get the number of tables stored in the source
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    async fn record(&self, operation: MockOperation) {
        *self.calls.write().await.entry(operation).or_insert(0) += 1;
    }

    async fn check(&self, operation: MockOperation, table: Option<&str>) -> Result<(), SourceError> {
        let failures = self.failures.read().await;
        let failure = failures.iter().find(|f| {
            f.operation == operation
                && match (&f.table, table) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                }
        });
        match failure {
            Some(f) => Err(f.error.clone()),
            None => Ok(()),
        }
    }

    async fn find_table(&self, schema: Option<&str>, name: &str) -> Option<MockTable> {
        self.tables
            .read()
            .await
            .iter()
            .find(|t| t.name() == name && t.in_schema(schema))
            .cloned()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_pattern(e: regex::Error) -> SourceError {
    SourceError::QueryError(format!("Invalid search pattern: {}", e))
}

/// `None` pattern or absent value matches anything
fn optional_matches(pattern: Option<&str>, value: Option<&str>) -> bool {
    match (pattern, value) {
        (Some(pattern), Some(value)) => search_pattern_matches(pattern, value),
        _ => true,
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockSource {
    fn name(&self) -> &'static str {
        self.source_name
    }

    async fn list_tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        self.record(MockOperation::ListTables).await;
        self.check(MockOperation::ListTables, None).await?;

        let table_pattern = search_pattern_regex(table_pattern).map_err(invalid_pattern)?;

        let tables = self.tables.read().await;
        Ok(tables
            .iter()
            .filter(|t| optional_matches(catalog, t.row.get_str(labels::TABLE_CAT)))
            .filter(|t| optional_matches(schema, t.row.get_str(labels::TABLE_SCHEM)))
            .filter(|t| table_pattern.is_match(t.name()))
            .map(|t| t.row.clone())
            .collect())
    }

    async fn list_columns(
        &self,
        schema: Option<&str>,
        table_pattern: &str,
        column_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        self.record(MockOperation::ListColumns).await;

        let table_pattern = search_pattern_regex(table_pattern).map_err(invalid_pattern)?;
        let column_pattern = search_pattern_regex(column_pattern).map_err(invalid_pattern)?;

        let tables = self.tables.read().await;
        let mut rows = Vec::new();
        for table in tables
            .iter()
            .filter(|t| t.in_schema(schema) && table_pattern.is_match(t.name()))
        {
            self.check(MockOperation::ListColumns, Some(table.name())).await?;
            rows.extend(
                table
                    .columns
                    .iter()
                    .filter(|c| {
                        c.get_str(labels::COLUMN_NAME)
                            .map(|name| column_pattern.is_match(name))
                            .unwrap_or(false)
                    })
                    .cloned(),
            );
        }
        Ok(rows)
    }

    async fn list_indexes(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        self.record(MockOperation::ListIndexes).await;
        self.check(MockOperation::ListIndexes, Some(table)).await?;

        Ok(self
            .find_table(schema, table)
            .await
            .map(|t| t.indexes)
            .unwrap_or_default())
    }

    async fn list_primary_keys(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        self.record(MockOperation::ListPrimaryKeys).await;
        self.check(MockOperation::ListPrimaryKeys, Some(table)).await?;

        Ok(self
            .find_table(schema, table)
            .await
            .map(|t| t.primary_keys)
            .unwrap_or_default())
    }

    async fn test_connection(&self) -> Result<(), SourceError> {
        if self.fail_connection {
            Err(SourceError::ConnectionError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl CommentStore for MockSource {
    async fn list_comments(
        &self,
        target: CommentTarget,
        schema: &str,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        let operation = match target {
            CommentTarget::Table => MockOperation::TableComments,
            CommentTarget::Column => MockOperation::ColumnComments,
        };
        self.record(operation).await;
        self.check(operation, Some(table)).await?;

        let rows = match self.find_table(None, table).await {
            Some(t) if t.comment_schema == schema => match target {
                CommentTarget::Table => t.table_comments,
                CommentTarget::Column => t.column_comments,
            },
            _ => Vec::new(),
        };
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl AutoIncrementProbe for MockSource {
    async fn auto_increment_columns(
        &self,
        schema: Option<&str>,
        table: &str,
        columns: &[String],
    ) -> Result<HashSet<String>, SourceError> {
        self.record(MockOperation::AutoIncrementProbe).await;
        self.check(MockOperation::AutoIncrementProbe, Some(table)).await?;

        let table = self
            .find_table(schema, table)
            .await
            .ok_or_else(|| SourceError::QueryError(format!("Invalid object name '{}'", table)))?;

        Ok(columns
            .iter()
            .filter(|c| table.auto_increment.contains(c))
            .cloned()
            .collect())
    }
}
