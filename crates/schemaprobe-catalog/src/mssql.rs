//! SQL Server metadata source using INFORMATION_SCHEMA and sys views
//!
//! Serves raw metadata rows, extended-property comments and identity probes
//! over a single tiberius connection. Requires the `mssql` feature.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = MssqlSource::connect(&ConnectionConfig {
//!     host: "localhost".into(),
//!     port: 1433,
//!     database: "shop".into(),
//!     user: "sa".into(),
//!     password: std::env::var("MSSQL_PASSWORD")?,
//!     encrypt: false,
//!     trust_server_cert: true,
//! }).await?;
//! let tables = source.list_tables(None, Some("dbo"), "%").await?;
//! ```
//!
//! Reference: https://learn.microsoft.com/sql/relational-databases/system-functions/sys-fn-listextendedproperty-transact-sql

use crate::source::{
    AutoIncrementProbe, CommentStore, CommentTarget, MetadataSource, SourceError,
    COMMENT_LEVEL0_TYPE, COMMENT_LEVEL1_TYPE, DESCRIPTION_PROPERTY,
};
use schemaprobe_core::{ConnectionConfig, MetadataRow, TypeCode};
use std::collections::HashSet;

#[cfg(feature = "mssql")]
use schemaprobe_core::labels;

#[cfg(feature = "mssql")]
use tiberius::{AuthMethod, Client, Config as TdsConfig, EncryptionLevel, Query, Row};

#[cfg(feature = "mssql")]
use tokio::net::TcpStream;

#[cfg(feature = "mssql")]
use tokio::sync::Mutex;

#[cfg(feature = "mssql")]
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

#[cfg(feature = "mssql")]
use tracing::{debug, info};

#[cfg(feature = "mssql")]
const TABLES_QUERY: &str = r#"
    SELECT TABLE_CATALOG, TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE'
      AND TABLE_CATALOG LIKE @P1 ESCAPE '\'
      AND TABLE_SCHEMA LIKE @P2 ESCAPE '\'
      AND TABLE_NAME LIKE @P3 ESCAPE '\'
    ORDER BY TABLE_SCHEMA, TABLE_NAME
"#;

#[cfg(feature = "mssql")]
const COLUMNS_QUERY: &str = r#"
    SELECT
        TABLE_SCHEMA,
        TABLE_NAME,
        COLUMN_NAME,
        DATA_TYPE,
        CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, 0) AS INT),
        CAST(ISNULL(NUMERIC_SCALE, 0) AS INT),
        COLUMN_DEFAULT,
        IS_NULLABLE,
        CAST(ORDINAL_POSITION AS INT)
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE (@P1 IS NULL OR TABLE_SCHEMA = @P1)
      AND TABLE_NAME LIKE @P2 ESCAPE '\'
      AND COLUMN_NAME LIKE @P3 ESCAPE '\'
    ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION
"#;

#[cfg(feature = "mssql")]
const INDEXES_QUERY: &str = r#"
    SELECT
        i.name,
        CAST(i.is_unique AS INT),
        c.name,
        CAST(ic.key_ordinal AS INT)
    FROM sys.indexes i
    JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
    JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
    WHERE i.object_id = OBJECT_ID(
            CASE WHEN @P1 IS NULL THEN QUOTENAME(@P2)
                 ELSE QUOTENAME(@P1) + '.' + QUOTENAME(@P2) END)
      AND i.type > 0
      AND ic.is_included_column = 0
    ORDER BY i.index_id, ic.key_ordinal
"#;

#[cfg(feature = "mssql")]
const PRIMARY_KEYS_QUERY: &str = r#"
    SELECT tc.TABLE_SCHEMA, tc.TABLE_NAME, kcu.COLUMN_NAME, CAST(kcu.ORDINAL_POSITION AS INT), tc.CONSTRAINT_NAME
    FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
    JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
        ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
        AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA
        AND kcu.TABLE_NAME = tc.TABLE_NAME
    WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
      AND (@P1 IS NULL OR tc.TABLE_SCHEMA = @P1)
      AND tc.TABLE_NAME = @P2
    ORDER BY kcu.ORDINAL_POSITION
"#;

#[cfg(feature = "mssql")]
const IDENTITY_QUERY: &str = r#"
    SELECT c.name
    FROM sys.columns c
    WHERE c.object_id = OBJECT_ID(
            CASE WHEN @P1 IS NULL THEN QUOTENAME(@P2)
                 ELSE QUOTENAME(@P1) + '.' + QUOTENAME(@P2) END)
      AND COLUMNPROPERTY(c.object_id, c.name, 'IsIdentity') = 1
"#;

/// Extended-property lookup; the level-2 type is `NULL` for the table itself
pub fn comment_query(target: CommentTarget) -> String {
    let level2 = match target {
        CommentTarget::Table => "NULL",
        CommentTarget::Column => "'column'",
    };
    format!(
        "SELECT objtype, objname, name, CAST(value AS varchar(8000)) AS value \
         FROM fn_listextendedproperty (@P1, @P2, @P3, @P4, @P5, {}, NULL)",
        level2
    )
}

/// Positional parameters of `comment_query`
pub fn comment_params<'a>(schema: &'a str, table: &'a str) -> [&'a str; 5] {
    [DESCRIPTION_PROPERTY, COMMENT_LEVEL0_TYPE, schema, COMMENT_LEVEL1_TYPE, table]
}

/// Map a SQL Server type name to its JDBC type code
///
/// Follows the type codes reported by the Microsoft JDBC driver.
pub fn map_mssql_type(type_name: &str) -> TypeCode {
    let base_type = type_name
        .split('(')
        .next()
        .unwrap_or(type_name)
        .trim()
        .to_lowercase();

    match base_type.as_str() {
        "bit" => TypeCode::Bit,
        "tinyint" => TypeCode::TinyInt,
        "smallint" => TypeCode::SmallInt,
        "int" => TypeCode::Integer,
        "bigint" => TypeCode::BigInt,

        "decimal" | "money" | "smallmoney" => TypeCode::Decimal,
        "numeric" => TypeCode::Numeric,
        "float" => TypeCode::Double,
        "real" => TypeCode::Real,

        "char" => TypeCode::Char,
        "varchar" => TypeCode::VarChar,
        "text" => TypeCode::LongVarChar,
        "nchar" => TypeCode::NChar,
        "nvarchar" | "sysname" => TypeCode::NVarChar,
        "ntext" => TypeCode::LongNVarChar,
        "uniqueidentifier" => TypeCode::Char,
        "xml" => TypeCode::SqlXml,

        "date" => TypeCode::Date,
        "time" => TypeCode::Time,
        "datetime" | "datetime2" | "smalldatetime" => TypeCode::Timestamp,
        "datetimeoffset" => TypeCode::Other(-155),

        "binary" | "timestamp" | "rowversion" => TypeCode::Binary,
        "varbinary" => TypeCode::VarBinary,
        "image" => TypeCode::LongVarBinary,

        "sql_variant" => TypeCode::Other(-156),

        _ => TypeCode::Other(1111),
    }
}

/// SQL Server metadata source
///
/// All queries run sequentially over one connection; each query holds the
/// connection guard only for its own duration.
pub struct MssqlSource {
    /// Connection (only available with mssql feature)
    #[cfg(feature = "mssql")]
    client: Mutex<Client<Compat<TcpStream>>>,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,

    /// Placeholder for when feature is disabled
    #[cfg(not(feature = "mssql"))]
    _phantom: std::marker::PhantomData<()>,
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for SourceError {
    fn from(e: tiberius::error::Error) -> Self {
        match e {
            tiberius::error::Error::Io { .. } => SourceError::ConnectionError(e.to_string()),
            tiberius::error::Error::Server(ref token) if token.code() == 18456 => {
                SourceError::AuthenticationError(e.to_string())
            }
            other => SourceError::QueryError(other.to_string()),
        }
    }
}

impl MssqlSource {
    /// Connect with the given settings
    #[cfg(feature = "mssql")]
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, SourceError> {
        let mut tds = TdsConfig::new();
        tds.host(&config.host);
        tds.port(config.port);
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));

        if config.encrypt {
            if config.trust_server_cert {
                tds.trust_cert();
            }
            tds.encryption(EncryptionLevel::Required);
        } else {
            tds.encryption(EncryptionLevel::NotSupported);
        }

        let tcp = TcpStream::connect(tds.get_addr()).await.map_err(|e| {
            SourceError::ConnectionError(format!(
                "Failed to connect to SQL Server at {}:{}: {}",
                config.host, config.port, e
            ))
        })?;
        tcp.set_nodelay(true).ok();

        let client = Client::connect(tds, tcp.compat_write()).await?;

        info!(
            "Connected to SQL Server: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            client: Mutex::new(client),
            host: config.host.clone(),
            port: config.port,
            database: config.database.clone(),
        })
    }

    /// Create source without mssql feature (returns error)
    #[cfg(not(feature = "mssql"))]
    pub async fn connect(_config: &ConnectionConfig) -> Result<Self, SourceError> {
        Err(SourceError::ConfigError(
            "SQL Server support not compiled. Rebuild with: cargo build --features mssql".to_string(),
        ))
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }

    #[cfg(feature = "mssql")]
    /// Run a query; `None` parameters bind as SQL NULL
    async fn fetch(&self, sql: &str, params: &[Option<&str>]) -> Result<Vec<Row>, SourceError> {
        let mut query = Query::new(sql.to_string());
        for param in params {
            query.bind(param.map(str::to_string));
        }

        let mut client = self.client.lock().await;
        let stream = query.query(&mut *client).await?;
        let rows = stream.into_first_result().await?;
        Ok(rows)
    }
}

#[cfg(feature = "mssql")]
fn text(row: &Row, idx: usize) -> Result<Option<String>, SourceError> {
    row.try_get::<&str, _>(idx)
        .map(|v| v.map(str::to_string))
        .map_err(|e| SourceError::InvalidResponse(e.to_string()))
}

#[cfg(feature = "mssql")]
fn int(row: &Row, idx: usize) -> Result<Option<i32>, SourceError> {
    row.try_get::<i32, _>(idx)
        .map_err(|e| SourceError::InvalidResponse(e.to_string()))
}

#[cfg(not(feature = "mssql"))]
fn feature_disabled<T>() -> Result<T, SourceError> {
    Err(SourceError::ConfigError(
        "SQL Server support not compiled. Rebuild with: cargo build --features mssql".to_string(),
    ))
}

#[async_trait::async_trait]
impl MetadataSource for MssqlSource {
    fn name(&self) -> &'static str {
        "SQL Server"
    }

    #[cfg(feature = "mssql")]
    async fn list_tables(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        let rows = self
            .fetch(
                TABLES_QUERY,
                &[
                    Some(catalog.unwrap_or("%")),
                    Some(schema.unwrap_or("%")),
                    Some(table_pattern),
                ],
            )
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            tables.push(
                MetadataRow::new()
                    .with(labels::TABLE_CAT, text(row, 0)?)
                    .with(labels::TABLE_SCHEM, text(row, 1)?)
                    .with(labels::TABLE_NAME, text(row, 2)?)
                    .with(labels::TABLE_TYPE, "TABLE"),
            );
        }
        debug!("Listed {} tables matching '{}'", tables.len(), table_pattern);
        Ok(tables)
    }

    #[cfg(feature = "mssql")]
    async fn list_columns(
        &self,
        schema: Option<&str>,
        table_pattern: &str,
        column_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        let rows = self
            .fetch(COLUMNS_QUERY, &[schema, Some(table_pattern), Some(column_pattern)])
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let type_name = text(row, 3)?.unwrap_or_default();
            let nullable = text(row, 7)?;
            columns.push(
                MetadataRow::new()
                    .with(labels::TABLE_SCHEM, text(row, 0)?)
                    .with(labels::TABLE_NAME, text(row, 1)?)
                    .with(labels::COLUMN_NAME, text(row, 2)?)
                    .with(labels::TYPE_CODE, map_mssql_type(&type_name).code())
                    .with(labels::TYPE_NAME, type_name)
                    .with(labels::COLUMN_SIZE, int(row, 4)?)
                    .with(labels::SCALE, int(row, 5)?)
                    .with(labels::COLUMN_DEF, text(row, 6)?)
                    .with(labels::IS_NULLABLE, nullable)
                    .with(labels::ORDINAL_POSITION, int(row, 8)?),
            );
        }
        Ok(columns)
    }

    #[cfg(feature = "mssql")]
    async fn list_indexes(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        let rows = self.fetch(INDEXES_QUERY, &[schema, Some(table)]).await?;

        let mut indexes = Vec::with_capacity(rows.len());
        for row in &rows {
            indexes.push(
                MetadataRow::new()
                    .with(labels::TABLE_SCHEM, schema)
                    .with(labels::TABLE_NAME, table)
                    .with(labels::INDEX_NAME, text(row, 0)?)
                    .with(labels::NON_UNIQUE, int(row, 1)?.map(|unique| unique == 0))
                    .with(labels::COLUMN_NAME, text(row, 2)?)
                    .with(labels::ORDINAL_POSITION, int(row, 3)?),
            );
        }
        Ok(indexes)
    }

    #[cfg(feature = "mssql")]
    async fn list_primary_keys(
        &self,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        let rows = self.fetch(PRIMARY_KEYS_QUERY, &[schema, Some(table)]).await?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            keys.push(
                MetadataRow::new()
                    .with(labels::TABLE_SCHEM, text(row, 0)?)
                    .with(labels::TABLE_NAME, text(row, 1)?)
                    .with(labels::COLUMN_NAME, text(row, 2)?)
                    .with(labels::ORDINAL_POSITION, int(row, 3)?)
                    .with(labels::PK_NAME, text(row, 4)?),
            );
        }
        Ok(keys)
    }

    #[cfg(feature = "mssql")]
    async fn test_connection(&self) -> Result<(), SourceError> {
        let mut client = self.client.lock().await;
        client.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    #[cfg(not(feature = "mssql"))]
    async fn list_tables(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _table_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        feature_disabled()
    }

    #[cfg(not(feature = "mssql"))]
    async fn list_columns(
        &self,
        _schema: Option<&str>,
        _table_pattern: &str,
        _column_pattern: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        feature_disabled()
    }

    #[cfg(not(feature = "mssql"))]
    async fn list_indexes(
        &self,
        _schema: Option<&str>,
        _table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        feature_disabled()
    }

    #[cfg(not(feature = "mssql"))]
    async fn list_primary_keys(
        &self,
        _schema: Option<&str>,
        _table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        feature_disabled()
    }

    #[cfg(not(feature = "mssql"))]
    async fn test_connection(&self) -> Result<(), SourceError> {
        feature_disabled()
    }
}

#[async_trait::async_trait]
impl CommentStore for MssqlSource {
    #[cfg(feature = "mssql")]
    async fn list_comments(
        &self,
        target: CommentTarget,
        schema: &str,
        table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        let rows = self
            .fetch(&comment_query(target), &comment_params(schema, table).map(Some))
            .await?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in &rows {
            comments.push(
                MetadataRow::new()
                    .with("objtype", text(row, 0)?)
                    .with(labels::OBJNAME, text(row, 1)?)
                    .with("name", text(row, 2)?)
                    .with(labels::VALUE, text(row, 3)?),
            );
        }
        Ok(comments)
    }

    #[cfg(not(feature = "mssql"))]
    async fn list_comments(
        &self,
        _target: CommentTarget,
        _schema: &str,
        _table: &str,
    ) -> Result<Vec<MetadataRow>, SourceError> {
        feature_disabled()
    }
}

#[async_trait::async_trait]
impl AutoIncrementProbe for MssqlSource {
    #[cfg(feature = "mssql")]
    async fn auto_increment_columns(
        &self,
        schema: Option<&str>,
        table: &str,
        columns: &[String],
    ) -> Result<HashSet<String>, SourceError> {
        let rows = self.fetch(IDENTITY_QUERY, &[schema, Some(table)]).await?;

        let mut identity = HashSet::new();
        for row in &rows {
            if let Some(name) = text(row, 0)? {
                if columns.contains(&name) {
                    identity.insert(name);
                }
            }
        }
        Ok(identity)
    }

    #[cfg(not(feature = "mssql"))]
    async fn auto_increment_columns(
        &self,
        _schema: Option<&str>,
        _table: &str,
        _columns: &[String],
    ) -> Result<HashSet<String>, SourceError> {
        feature_disabled()
    }
}
