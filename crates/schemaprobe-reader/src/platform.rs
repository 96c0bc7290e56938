//! Platform selection
//!
//! Maps the configured dialect to its normalizer and wires a source into a
//! ready-to-use `ModelReader`.

use crate::dialect::{GenericNormalizer, MssqlNormalizer};
use crate::normalizer::DialectNormalizer;
use crate::reader::ModelReader;
use schemaprobe_catalog::{AutoIncrementProbe, CommentStore, MetadataSource};
use schemaprobe_core::{Config, ConfigError, DialectConfig};
use std::sync::Arc;

/// A supported database platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Mssql,
    Dm,
    Generic,
}

impl Platform {
    /// Database name of the SQL Server platform
    pub const MSSQL_DATABASE_NAME: &'static str = "MsSql";

    /// Database name of the DM platform
    pub const DM_DATABASE_NAME: &'static str = "DM";

    /// Standard driver of the DM platform
    pub const DM_DRIVER: &'static str = "dm.jdbc.driver.DmDriver";

    pub fn from_dialect(dialect: DialectConfig) -> Self {
        match dialect {
            DialectConfig::Mssql => Self::Mssql,
            DialectConfig::Dm => Self::Dm,
            DialectConfig::Generic => Self::Generic,
        }
    }

    /// Database name reported for this platform
    pub fn database_name(&self) -> &'static str {
        match self {
            Self::Mssql => Self::MSSQL_DATABASE_NAME,
            Self::Dm => Self::DM_DATABASE_NAME,
            Self::Generic => "Generic",
        }
    }

    /// Driver identifier, when the platform names one
    pub fn driver(&self) -> Option<&'static str> {
        match self {
            Self::Dm => Some(Self::DM_DRIVER),
            Self::Mssql | Self::Generic => None,
        }
    }

    /// Build the normalizer for this platform
    ///
    /// `system_tables` extends the dialect's own deny-list.
    pub fn normalizer(&self, system_tables: &[String]) -> Result<Box<dyn DialectNormalizer>, ConfigError> {
        match self {
            Self::Mssql => Ok(Box::new(MssqlNormalizer::with_system_tables(
                system_tables.iter().cloned(),
            )?)),
            Self::Dm | Self::Generic => Ok(Box::new(GenericNormalizer::new())),
        }
    }
}

/// Build the normalizer selected by `config`
pub fn normalizer_for(config: &Config) -> Result<Box<dyn DialectNormalizer>, ConfigError> {
    Platform::from_dialect(config.dialect).normalizer(&config.system_tables)
}

/// Build a reader over a source that also stores comments and probes identities
pub fn reader_for<S>(config: &Config, source: Arc<S>) -> Result<ModelReader, ConfigError>
where
    S: MetadataSource + CommentStore + AutoIncrementProbe + 'static,
{
    let normalizer = normalizer_for(config)?;

    Ok(ModelReader::new(source.clone(), normalizer)
        .with_comment_store(source.clone())
        .with_probe(source)
        .with_patterns(config.patterns.clone())
        .with_comment_config(config.comments.clone()))
}
