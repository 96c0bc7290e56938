//! Read report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};
use crate::model::Database;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub tables: usize,
    pub columns: usize,
    pub indexes: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Schema read report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// The normalized model
    pub database: Database,

    /// Diagnostics recorded during the read
    pub diagnostics: Vec<Diagnostic>,
}

impl ReadReport {
    /// Build a report from a finished read
    pub fn new(database: Database, diagnostics: Vec<Diagnostic>) -> Self {
        let summary = ReportSummary {
            tables: database.tables.len(),
            columns: database.tables.iter().map(|t| t.columns.len()).sum(),
            indexes: database.tables.iter().map(|t| t.indexes.len()).sum(),
            warnings: diagnostics.iter().filter(|d| d.severity == Severity::Warn).count(),
            errors: diagnostics.iter().filter(|d| d.severity == Severity::Error).count(),
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            database,
            diagnostics,
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }

    /// Save report to JSON file
    pub fn save_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
