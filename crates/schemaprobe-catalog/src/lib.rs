//! Metadata sources for schema introspection
//!
//! This module provides the raw-row sources the model reader traverses:
//! catalog enumeration, side-channel comment stores and auto-increment probes.
//!
//! ## Features
//!
//! Enable live database support via Cargo features:
//! - `mssql` - Microsoft SQL Server support (tiberius)
//!
//! Without any feature, `MockSource` serves in-memory tables and JSON catalog
//! snapshots.
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemaprobe_catalog::{MetadataSource, MssqlSource};
//!
//! let source = MssqlSource::connect(&config.connection.unwrap()).await?;
//! let tables = source.list_tables(None, Some("dbo"), "%").await?;
//! ```

pub mod source;
pub mod mock;
pub mod mssql;

pub use source::{
    AutoIncrementProbe, CommentStore, CommentTarget, MetadataSource, SourceError,
    DESCRIPTION_PROPERTY,
};
pub use mock::{CatalogSnapshot, MockOperation, MockSource, MockTable};
pub use mssql::{map_mssql_type, MssqlSource};
