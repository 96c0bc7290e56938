//! SchemaProbe Core
//!
//! Canonical schema model, raw metadata rows, configuration and diagnostics
//! shared by the catalog sources and the model reader.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod types;
pub mod model;
pub mod row;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use types::TypeCode;
pub use model::{Column, Database, Index, Table};
pub use row::{escape_for_search, labels, search_pattern_matches, search_pattern_regex, MetadataRow};
pub use report::{ReadReport, ReportSummary, ReportVersion};
pub use config::{
    CommentConfig, Config, ConfigError, ConnectionConfig, DialectConfig, PatternConfig,
};
