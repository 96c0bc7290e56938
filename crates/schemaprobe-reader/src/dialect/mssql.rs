//! Microsoft SQL Server normalization
//!
//! SQL Server drivers wrap default values in parentheses, keep DATE/TIME
//! defaults on DATETIME columns, append a dot to integral DECIMAL defaults,
//! report no auto-increment status and list the index backing each primary
//! key as an ordinary unique index. Descriptions live in extended properties
//! rather than in `REMARKS`.

use crate::error::ReadError;
use crate::normalizer::{DialectNormalizer, ReadContext};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use schemaprobe_catalog::{CommentTarget, SourceError};
use schemaprobe_core::{
    labels, Column, ConfigError, Diagnostic, DiagnosticCode, Index, MetadataRow, Severity, Table,
    TypeCode,
};
use tracing::{debug, warn};

/// Maintenance tables SQL Server creates on its own
pub const KNOWN_SYSTEM_TABLES: &[&str] = &["dtproperties"];

const ISO_DATE_PATTERN: &str = r"^(?:'(\d{4}-\d{2}-\d{2})'|(\d{4}-\d{2}-\d{2}))$";
const ISO_TIME_PATTERN: &str = r"^(?:'(\d{2}:\d{2}:\d{2})'|(\d{2}:\d{2}:\d{2}))$";

/// Canonical surface syntax of TIMESTAMP defaults
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Integral DECIMAL precision SQL Server uses for BIGINT-sized values
const BIGINT_DECIMAL_PRECISION: u32 = 19;

/// Normalizer for SQL Server catalogs
#[derive(Debug, Clone)]
pub struct MssqlNormalizer {
    system_tables: Vec<String>,
    iso_date: Regex,
    iso_time: Regex,
}

impl MssqlNormalizer {
    /// Create a normalizer with the built-in system table list
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_system_tables(Vec::new())
    }

    /// Create a normalizer that also skips `extra` tables
    pub fn with_system_tables<I>(extra: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let system_tables = KNOWN_SYSTEM_TABLES
            .iter()
            .map(|name| name.to_string())
            .chain(extra)
            .collect();

        Ok(Self {
            system_tables,
            iso_date: compile(ISO_DATE_PATTERN)?,
            iso_time: compile(ISO_TIME_PATTERN)?,
        })
    }

    /// Whether `name` is a driver-internal maintenance table (exact match)
    pub fn is_system_table(&self, name: &str) -> bool {
        self.system_tables.iter().any(|t| t == name)
    }

    /// Tables this normalizer never admits
    pub fn system_tables(&self) -> &[String] {
        &self.system_tables
    }

    /// Reinterpret a DATE or TIME literal as a canonical timestamp
    ///
    /// Times are placed on 1970-01-01. Returns `None` when the literal is
    /// neither, or names an impossible date or time.
    pub fn reinterpret_timestamp(&self, literal: &str) -> Option<String> {
        if let Some(caps) = self.iso_date.captures(literal) {
            let text = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
            let timestamp = date.and_hms_opt(0, 0, 0)?;
            return Some(timestamp.format(TIMESTAMP_FORMAT).to_string());
        }

        if let Some(caps) = self.iso_time.captures(literal) {
            let text = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let time = NaiveTime::parse_from_str(text, "%H:%M:%S").ok()?;
            let timestamp = NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time);
            return Some(timestamp.format(TIMESTAMP_FORMAT).to_string());
        }

        None
    }

    fn correct_default(&self, column: &Column, literal: &str) -> String {
        let stripped = strip_parentheses(literal);

        match column.type_code {
            TypeCode::Timestamp => self
                .reinterpret_timestamp(stripped)
                .unwrap_or_else(|| stripped.to_string()),
            TypeCode::Decimal => match stripped.strip_suffix('.') {
                Some(integral) if column.scale == 0 => integral.to_string(),
                _ => stripped.to_string(),
            },
            code if code.is_text() => stripped.replace("''", "'"),
            _ => stripped.to_string(),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Remove matching outer parentheses, one layer at a time
pub fn strip_parentheses(literal: &str) -> &str {
    let mut value = literal;
    while value.len() >= 2 && value.starts_with('(') && value.ends_with(')') {
        value = &value[1..value.len() - 1];
    }
    value
}

/// Whether `index` is named like the index SQL Server generates for a primary key
///
/// Generated names look like `PK__<table>__<hex>`; the match ignores case.
pub fn is_internal_primary_key_index(table: &str, index: &Index) -> bool {
    let prefix = format!("PK__{}__", table).to_uppercase();
    index.name.to_uppercase().starts_with(&prefix)
}

fn has_primary_key_named(rows: &[MetadataRow], name: &str) -> bool {
    rows.iter().any(|row| row.get_str(labels::PK_NAME) == Some(name))
}

/// Record a failed comment lookup, or fail the read when comments are strict
fn absorb_comment_failure(
    table: &str,
    target: CommentTarget,
    error: SourceError,
    ctx: &mut ReadContext<'_>,
) -> Result<(), ReadError> {
    if ctx.comment_config().strict {
        return Err(ReadError::CommentLookup {
            table: table.to_string(),
            target,
            source: error,
        });
    }

    warn!(table = %table, comments = %target, "Comment lookup failed: {}", error);
    ctx.push_diagnostic(
        Diagnostic::new(
            DiagnosticCode::CommentLookupFailed,
            Severity::Warn,
            format!("Could not read {} comments of table '{}': {}", target, table, error),
        )
        .with_table(table)
        .with_cause(error.kind()),
    );
    Ok(())
}

#[async_trait::async_trait]
impl DialectNormalizer for MssqlNormalizer {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn admit_table(&self, row: &MetadataRow) -> bool {
        row.get_str(labels::TABLE_NAME)
            .map(|name| !self.is_system_table(name))
            .unwrap_or(true)
    }

    fn correct_column(&self, column: &mut Column) {
        if let Some(literal) = column.default_value.take() {
            column.default_value = Some(self.correct_default(column, &literal));
        }

        if column.type_code == TypeCode::Decimal
            && column.size == Some(BIGINT_DECIMAL_PRECISION)
            && column.scale == 0
        {
            column.type_code = TypeCode::BigInt;
        }
    }

    async fn infer_auto_increment(
        &self,
        table: &mut Table,
        ctx: &mut ReadContext<'_>,
    ) -> Result<(), ReadError> {
        let Some(probe) = ctx.probe() else {
            return Ok(());
        };
        if table.columns.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
        let generated = probe
            .auto_increment_columns(table.schema.as_deref(), &table.name, &names)
            .await?;

        for column in &mut table.columns {
            column.auto_increment = generated.contains(&column.name);
        }
        Ok(())
    }

    async fn reconcile_indexes(
        &self,
        table: &mut Table,
        ctx: &mut ReadContext<'_>,
    ) -> Result<(), ReadError> {
        let indexes = std::mem::take(&mut table.indexes);
        let mut kept = Vec::with_capacity(indexes.len());

        for index in indexes {
            let duplicates_pk = index.unique
                && (is_internal_primary_key_index(&table.name, &index)
                    || has_primary_key_named(
                        ctx.primary_keys(table.schema.as_deref(), &table.name).await?,
                        &index.name,
                    ));

            if duplicates_pk {
                debug!(table = %table.name, index = %index.name, "Dropping primary-key index");
            } else {
                kept.push(index);
            }
        }

        table.indexes = kept;
        Ok(())
    }

    async fn enrich_comments(
        &self,
        table: &mut Table,
        ctx: &mut ReadContext<'_>,
    ) -> Result<(), ReadError> {
        let Some(store) = ctx.comment_store() else {
            return Ok(());
        };
        let schema = ctx.comment_config().schema.as_str();

        match store.list_comments(CommentTarget::Table, schema, &table.name).await {
            Ok(rows) => {
                if let Some(last) = rows.last() {
                    table.description = last.get_string(labels::VALUE);
                }
            }
            Err(e) => absorb_comment_failure(&table.name, CommentTarget::Table, e, ctx)?,
        }

        match store.list_comments(CommentTarget::Column, schema, &table.name).await {
            Ok(rows) => {
                for row in &rows {
                    let Some(objname) = row.get_str(labels::OBJNAME) else {
                        continue;
                    };
                    if let Some(column) = table.find_column_mut_ignore_case(objname) {
                        column.description = row.get_string(labels::VALUE);
                    }
                }
            }
            Err(e) => absorb_comment_failure(&table.name, CommentTarget::Column, e, ctx)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaprobe_catalog::mock::table_row;
    use schemaprobe_catalog::{MockOperation, MockSource, MockTable};
    use schemaprobe_core::CommentConfig;

    fn normalizer() -> MssqlNormalizer {
        MssqlNormalizer::new().unwrap()
    }

    fn corrected(column: Column) -> Column {
        let mut column = column;
        normalizer().correct_column(&mut column);
        column
    }

    #[test]
    fn test_strip_parentheses() {
        assert_eq!(strip_parentheses("((0))"), "0");
        assert_eq!(strip_parentheses("('abc')"), "'abc'");
        assert_eq!(strip_parentheses("(((getdate())))"), "getdate()");
        assert_eq!(strip_parentheses("()"), "");
        assert_eq!(strip_parentheses("42"), "42");
        assert_eq!(strip_parentheses("(1)+(2)"), "1)+(2");
    }

    #[test]
    fn test_timestamp_from_date() {
        let column = corrected(
            Column::new("CreatedAt", TypeCode::Timestamp).with_default("('2020-01-02')"),
        );
        assert_eq!(column.default_value.as_deref(), Some("2020-01-02 00:00:00"));
    }

    #[test]
    fn test_timestamp_from_time() {
        let column = corrected(
            Column::new("OpensAt", TypeCode::Timestamp).with_default("('10:30:00')"),
        );
        assert_eq!(column.default_value.as_deref(), Some("1970-01-01 10:30:00"));
    }

    #[test]
    fn test_timestamp_unquoted_and_invalid() {
        let n = normalizer();
        assert_eq!(n.reinterpret_timestamp("2021-12-31").as_deref(), Some("2021-12-31 00:00:00"));
        assert_eq!(n.reinterpret_timestamp("'2020-13-40'"), None);
        assert_eq!(n.reinterpret_timestamp("'25:00:00'"), None);
        assert_eq!(n.reinterpret_timestamp("getdate()"), None);

        let column = corrected(Column::new("At", TypeCode::Timestamp).with_default("(getdate())"));
        assert_eq!(column.default_value.as_deref(), Some("getdate()"));
    }

    #[test]
    fn test_decimal_trailing_dot() {
        let column = corrected(
            Column::new("Price", TypeCode::Decimal)
                .with_size(10)
                .with_scale(0)
                .with_default("((100.))"),
        );
        assert_eq!(column.default_value.as_deref(), Some("100"));
        assert_eq!(column.type_code, TypeCode::Decimal);

        let scaled = corrected(
            Column::new("Rate", TypeCode::Decimal)
                .with_size(10)
                .with_scale(2)
                .with_default("(1.)"),
        );
        assert_eq!(scaled.default_value.as_deref(), Some("1."));
    }

    #[test]
    fn test_decimal_19_0_promoted_to_bigint() {
        let with_default = corrected(
            Column::new("Amount", TypeCode::Decimal)
                .with_size(19)
                .with_scale(0)
                .with_default("((100.))"),
        );
        assert_eq!(with_default.type_code, TypeCode::BigInt);
        assert_eq!(with_default.default_value.as_deref(), Some("100"));

        let without_default = corrected(Column::new("Total", TypeCode::Decimal).with_size(19));
        assert_eq!(without_default.type_code, TypeCode::BigInt);
        assert_eq!(without_default.default_value, None);

        let scaled = corrected(Column::new("Ratio", TypeCode::Decimal).with_size(19).with_scale(4));
        assert_eq!(scaled.type_code, TypeCode::Decimal);
    }

    #[test]
    fn test_text_unescaping() {
        let column = corrected(
            Column::new("Name", TypeCode::NVarChar).with_default("('O''Brien')"),
        );
        assert_eq!(column.default_value.as_deref(), Some("'O'Brien'"));

        let numeric = corrected(Column::new("Qty", TypeCode::Integer).with_default("('''')"));
        assert_eq!(numeric.default_value.as_deref(), Some("''''"));
    }

    #[test]
    fn test_system_tables_rejected() {
        let n = MssqlNormalizer::with_system_tables(vec!["sysdiagrams".to_string()]).unwrap();
        assert!(!n.admit_table(&table_row("dtproperties")));
        assert!(!n.admit_table(&table_row("sysdiagrams")));
        assert!(n.admit_table(&table_row("DTPROPERTIES")));
        assert!(n.admit_table(&table_row("Orders")));
        assert_eq!(n.system_tables().len(), 2);
    }

    #[test]
    fn test_internal_primary_key_index_name() {
        assert!(is_internal_primary_key_index("Orders", &Index::new("PK__Orders__1F5A4F0B", true)));
        assert!(is_internal_primary_key_index("Orders", &Index::new("pk__orders__1f5a", true)));
        assert!(!is_internal_primary_key_index("Orders", &Index::new("PK__OrderItems__1F5A", true)));
        assert!(!is_internal_primary_key_index("Orders", &Index::new("PK_Orders", true)));
    }

    #[tokio::test]
    async fn test_reconcile_removes_synthetic_and_named_pk_indexes() {
        let source = MockSource::from_tables(vec![
            MockTable::new("Orders").with_primary_key("OrdersKey", "Id"),
        ]);
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments);

        let mut table = Table::new("Orders").with_indexes(vec![
            Index::new("PK__Orders__1F5A4F0B", true).with_column("Id"),
            Index::new("IX_Orders_Date", false).with_column("CreatedAt"),
            Index::new("OrdersKey", true).with_column("Id"),
            Index::new("UQ_Orders_Number", true).with_column("Number"),
            Index::new("OrdersKey2", false).with_column("Id"),
        ]);

        normalizer().reconcile_indexes(&mut table, &mut ctx).await.unwrap();

        let names: Vec<_> = table.indexes.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["IX_Orders_Date", "UQ_Orders_Number", "OrdersKey2"]);
        assert_eq!(source.call_count(MockOperation::ListPrimaryKeys).await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_skips_lookup_for_synthetic_only() {
        let source = MockSource::from_tables(vec![MockTable::new("Orders")]);
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments);

        let mut table = Table::new("Orders").with_indexes(vec![
            Index::new("PK__Orders__1F5A4F0B", true).with_column("Id"),
            Index::new("IX_Orders_Date", false).with_column("CreatedAt"),
        ]);

        normalizer().reconcile_indexes(&mut table, &mut ctx).await.unwrap();
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(source.call_count(MockOperation::ListPrimaryKeys).await, 0);
    }

    #[tokio::test]
    async fn test_reconcile_propagates_lookup_failure() {
        let source = MockSource::new().with_failure(
            MockOperation::ListPrimaryKeys,
            SourceError::ConnectionError("reset".into()),
        );
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments);
        let mut table = Table::new("Orders")
            .with_indexes(vec![Index::new("UQ_Orders_Number", true).with_column("Number")]);

        let result = normalizer().reconcile_indexes(&mut table, &mut ctx).await;
        assert!(matches!(result, Err(ReadError::Source(SourceError::ConnectionError(_)))));
    }

    #[tokio::test]
    async fn test_auto_increment_from_probe() {
        let source = MockSource::from_tables(vec![MockTable::new("Orders").with_auto_increment("Id")]);
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments).with_probe(Some(&source));

        let mut stale = Column::new("Amount", TypeCode::BigInt);
        stale.auto_increment = true;
        let mut table = Table::new("Orders")
            .with_columns(vec![Column::new("Id", TypeCode::Integer), stale]);

        normalizer().infer_auto_increment(&mut table, &mut ctx).await.unwrap();
        assert!(table.columns[0].auto_increment);
        assert!(!table.columns[1].auto_increment);
    }

    #[tokio::test]
    async fn test_auto_increment_without_probe_keeps_metadata() {
        let source = MockSource::new();
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments);

        let mut id = Column::new("Id", TypeCode::Integer);
        id.auto_increment = true;
        let mut table = Table::new("Orders").with_columns(vec![id]);

        normalizer().infer_auto_increment(&mut table, &mut ctx).await.unwrap();
        assert!(table.columns[0].auto_increment);
    }

    #[tokio::test]
    async fn test_comments_attach_case_insensitively() {
        let source = MockSource::from_tables(vec![
            MockTable::new("Orders")
                .with_table_comment("Old description")
                .with_table_comment("Customer orders")
                .with_column_comment("amount", "Order total")
                .with_column_comment("missing", "Ignored"),
        ]);
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments).with_comment_store(Some(&source));

        let mut table = Table::new("Orders").with_columns(vec![
            Column::new("Id", TypeCode::Integer),
            Column::new("Amount", TypeCode::BigInt),
        ]);

        normalizer().enrich_comments(&mut table, &mut ctx).await.unwrap();

        assert_eq!(table.description.as_deref(), Some("Customer orders"));
        assert_eq!(table.columns[0].description, None);
        assert_eq!(table.columns[1].description.as_deref(), Some("Order total"));
        assert!(ctx.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_comments_match_non_ascii_names() {
        let source = MockSource::from_tables(vec![
            MockTable::new("Saisons").with_column_comment("été", "Summer flag"),
        ]);
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments).with_comment_store(Some(&source));

        let mut table = Table::new("Saisons").with_columns(vec![Column::new("ÉTÉ", TypeCode::Bit)]);

        normalizer().enrich_comments(&mut table, &mut ctx).await.unwrap();

        assert_eq!(table.columns[0].description.as_deref(), Some("Summer flag"));
    }

    #[tokio::test]
    async fn test_comment_failures_are_absorbed() {
        let source = MockSource::from_tables(vec![
            MockTable::new("Orders").with_column_comment("Amount", "Order total"),
        ])
        .with_failure(
            MockOperation::TableComments,
            SourceError::Unsupported("fn_listextendedproperty".into()),
        );
        let comments = CommentConfig::default();
        let mut ctx = ReadContext::new(&source, &comments).with_comment_store(Some(&source));
        let mut table = Table::new("Orders").with_columns(vec![Column::new("Amount", TypeCode::BigInt)]);

        normalizer().enrich_comments(&mut table, &mut ctx).await.unwrap();

        assert_eq!(table.description, None);
        assert_eq!(table.columns[0].description.as_deref(), Some("Order total"));

        let diagnostics = ctx.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::CommentLookupFailed);
        assert_eq!(diagnostics[0].severity, Severity::Warn);
        assert_eq!(diagnostics[0].table.as_deref(), Some("Orders"));
        assert_eq!(diagnostics[0].cause.as_deref(), Some("unsupported"));
    }

    #[tokio::test]
    async fn test_strict_comments_fail_the_table() {
        let source = MockSource::from_tables(vec![MockTable::new("Orders")]).with_failure(
            MockOperation::ColumnComments,
            SourceError::QueryError("permission denied".into()),
        );
        let comments = CommentConfig {
            strict: true,
            ..CommentConfig::default()
        };
        let mut ctx = ReadContext::new(&source, &comments).with_comment_store(Some(&source));
        let mut table = Table::new("Orders");

        let result = normalizer().enrich_comments(&mut table, &mut ctx).await;
        assert!(matches!(
            result,
            Err(ReadError::CommentLookup { target: CommentTarget::Column, .. })
        ));
    }

    #[tokio::test]
    async fn test_comments_use_configured_schema() {
        let source = MockSource::from_tables(vec![
            MockTable::new("Orders").with_table_comment("Sales orders").with_comment_schema("sales"),
        ]);
        let mut comments = CommentConfig::default();
        let mut table = Table::new("Orders");

        {
            let mut ctx = ReadContext::new(&source, &comments).with_comment_store(Some(&source));
            normalizer().enrich_comments(&mut table, &mut ctx).await.unwrap();
        }
        assert_eq!(table.description, None);

        comments.schema = "sales".to_string();
        let mut ctx = ReadContext::new(&source, &comments).with_comment_store(Some(&source));
        normalizer().enrich_comments(&mut table, &mut ctx).await.unwrap();
        assert_eq!(table.description.as_deref(), Some("Sales orders"));
    }
}
