//! Dialect normalizers

pub mod generic;
pub mod mssql;

pub use generic::GenericNormalizer;
pub use mssql::MssqlNormalizer;
