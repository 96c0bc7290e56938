//! Configuration schema (schemaprobe.toml)

use serde::{Deserialize, Serialize};

/// Database dialect whose normalization rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// Microsoft SQL Server
    Mssql,

    /// DM database
    Dm,

    /// No dialect-specific corrections
    Generic,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::Generic
    }
}

impl std::str::FromStr for DialectConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "dm" => Ok(Self::Dm),
            "generic" => Ok(Self::Generic),
            other => Err(ConfigError::Invalid(format!(
                "unknown dialect '{}', expected one of: mssql, dm, generic",
                other
            ))),
        }
    }
}

/// Search patterns used when enumerating metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Catalog pattern (`None` matches any catalog)
    #[serde(default)]
    pub catalog: Option<String>,

    /// Schema pattern (`None` matches any schema)
    #[serde(default)]
    pub schema: Option<String>,

    /// Table name pattern
    #[serde(default = "default_pattern")]
    pub table: String,

    /// Column name pattern
    #[serde(default = "default_pattern")]
    pub column: String,
}

fn default_pattern() -> String {
    "%".to_string()
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            schema: None,
            table: default_pattern(),
            column: default_pattern(),
        }
    }
}

/// Comment enrichment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentConfig {
    /// Look up table and column comments
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Schema passed to the comment store
    #[serde(default = "default_comment_schema")]
    pub schema: String,

    /// Fail the read when a comment lookup fails
    #[serde(default)]
    pub strict: bool,
}

fn default_true() -> bool {
    true
}

fn default_comment_schema() -> String {
    "dbo".to_string()
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schema: default_comment_schema(),
            strict: false,
        }
    }
}

/// Live connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub database: String,

    pub user: String,

    /// Password; usually supplied through `MSSQL_PASSWORD`
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub encrypt: bool,

    #[serde(default)]
    pub trust_server_cert: bool,
}

fn default_port() -> u16 {
    1433
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dialect
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Name given to the resulting database model
    #[serde(default)]
    pub model_name: Option<String>,

    /// Enumeration patterns
    #[serde(default)]
    pub patterns: PatternConfig,

    /// Comment enrichment
    #[serde(default)]
    pub comments: CommentConfig,

    /// Additional maintenance tables to skip, on top of the dialect's own list
    #[serde(default)]
    pub system_tables: Vec<String>,

    /// Live connection
    #[serde(default)]
    pub connection: Option<ConnectionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            model_name: None,
            patterns: PatternConfig::default(),
            comments: CommentConfig::default(),
            system_tables: Vec::new(),
            connection: None,
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Reject settings no read could succeed with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patterns.table.is_empty() {
            return Err(ConfigError::Invalid("patterns.table must not be empty".to_string()));
        }
        if self.patterns.column.is_empty() {
            return Err(ConfigError::Invalid("patterns.column must not be empty".to_string()));
        }
        if self.comments.enabled && self.comments.schema.is_empty() {
            return Err(ConfigError::Invalid("comments.schema must not be empty".to_string()));
        }
        if let Some(conn) = &self.connection {
            if conn.host.is_empty() {
                return Err(ConfigError::Invalid("connection.host must not be empty".to_string()));
            }
            if conn.database.is_empty() {
                return Err(ConfigError::Invalid("connection.database must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Config error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.dialect, DialectConfig::Generic);
        assert_eq!(config.patterns.table, "%");
        assert_eq!(config.patterns.catalog, None);
        assert!(config.comments.enabled);
        assert_eq!(config.comments.schema, "dbo");
        assert!(!config.comments.strict);
    }

    #[test]
    fn parse_full_config() {
        let config = Config::from_toml(
            r#"
            dialect = "mssql"
            model_name = "shop"
            system_tables = ["sysdiagrams"]

            [patterns]
            schema = "dbo"
            table = "Ord%"

            [comments]
            strict = true

            [connection]
            host = "localhost"
            database = "shop"
            user = "sa"
            "#,
        )
        .unwrap();

        assert_eq!(config.dialect, DialectConfig::Mssql);
        assert_eq!(config.model_name.as_deref(), Some("shop"));
        assert_eq!(config.patterns.schema.as_deref(), Some("dbo"));
        assert_eq!(config.patterns.table, "Ord%");
        assert_eq!(config.patterns.column, "%");
        assert!(config.comments.strict);
        assert_eq!(config.comments.schema, "dbo");
        assert_eq!(config.system_tables, vec!["sysdiagrams".to_string()]);

        let conn = config.connection.unwrap();
        assert_eq!(conn.port, 1433);
        assert_eq!(conn.password, "");
        assert!(!conn.encrypt);
    }

    #[test]
    fn rejects_empty_table_pattern() {
        let result = Config::from_toml("[patterns]\ntable = \"\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_dialect() {
        assert!(matches!(Config::from_toml("dialect = \"oracle\""), Err(ConfigError::ParseError(_))));
        assert!("oracle".parse::<DialectConfig>().is_err());
        assert_eq!("SqlServer".parse::<DialectConfig>().unwrap(), DialectConfig::Mssql);
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}
