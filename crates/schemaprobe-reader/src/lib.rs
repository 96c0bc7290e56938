//! SchemaProbe model reader
//!
//! Turns raw catalog rows into a normalized `Database` model. Dialect quirks
//! are corrected by a `DialectNormalizer`; the SQL Server normalizer
//! fixes default literals, promotes `DECIMAL(19,0)` to `BIGINT`, drops indexes
//! backing primary keys and attaches extended-property descriptions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemaprobe_reader::reader_for;
//!
//! let reader = reader_for(&config, Arc::new(source))?;
//! let outcome = reader.read_model("shop").await?;
//! for table in &outcome.database.tables {
//!     println!("{} ({} columns)", table.name, table.columns.len());
//! }
//! ```

pub mod error;
pub mod normalizer;
pub mod dialect;
pub mod platform;
pub mod reader;

pub use error::ReadError;
pub use normalizer::{DialectNormalizer, ReadContext};
pub use dialect::{GenericNormalizer, MssqlNormalizer};
pub use platform::{normalizer_for, reader_for, Platform};
pub use reader::{ModelReader, ReadOutcome};
