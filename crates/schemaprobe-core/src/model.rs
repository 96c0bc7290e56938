//! Canonical schema model
//!
//! The destination structures assembled by the model reader. A `Table` owns its
//! columns and indexes exclusively; a `Database` owns its tables.

use serde::{Deserialize, Serialize};
use crate::types::TypeCode;

/// A column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// JDBC type code, possibly promoted by a dialect correction
    pub type_code: TypeCode,

    /// Declared size (length or precision)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    /// Declared scale
    #[serde(default)]
    pub scale: i32,

    /// Default value literal in the surface syntax of `type_code`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the database generates values for this column
    #[serde(default)]
    pub auto_increment: bool,

    /// Whether this column is part of the table's primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Whether the column is declared NOT NULL
    #[serde(default)]
    pub required: bool,
}

impl Column {
    /// Create a new column with no size, scale 0 and no default
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self {
            name: name.into(),
            type_code,
            size: None,
            scale: 0,
            default_value: None,
            description: None,
            auto_increment: false,
            primary_key: false,
            required: false,
        }
    }

    /// Set the declared size
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the declared scale
    pub fn with_scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the default value literal
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Mark as NOT NULL
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Declared size, 0 when unknown
    pub fn size_as_int(&self) -> u32 {
        self.size.unwrap_or(0)
    }
}

/// An index over one or more columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,

    pub unique: bool,

    /// Referenced column names in key order
    pub columns: Vec<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            unique,
            columns: Vec::new(),
        }
    }

    /// Append a referenced column
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }
}

/// A table with its columns and indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, unique within its schema
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Driver-reported table type (e.g. `TABLE`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,

    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<Column>,

    /// Indexes in enumeration order
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: None,
            schema: None,
            table_type: None,
            description: None,
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Set the columns
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Set the indexes
    pub fn with_indexes(mut self, indexes: Vec<Index>) -> Self {
        self.indexes = indexes;
        self
    }

    /// Find a column by exact name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Find a column by case-insensitive name, folding Unicode case
    pub fn find_column_mut_ignore_case(&mut self, name: &str) -> Option<&mut Column> {
        let wanted = name.to_lowercase();
        self.columns
            .iter_mut()
            .find(|c| c.name.to_lowercase() == wanted)
    }

    /// Find an index by exact name
    pub fn find_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of the primary-key columns in declaration order
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// A database model: an ordered collection of tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,

    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Find a table by exact name
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookups() {
        let table = Table::new("Orders")
            .with_columns(vec![
                Column::new("Id", TypeCode::Integer),
                Column::new("Amount", TypeCode::Decimal).with_size(19),
            ])
            .with_indexes(vec![Index::new("IX_Amount", false).with_column("Amount")]);

        assert_eq!(table.column_names(), vec!["Id", "Amount"]);
        assert!(table.find_column("Amount").is_some());
        assert!(table.find_column("amount").is_none());
        assert_eq!(table.find_index("IX_Amount").unwrap().columns, vec!["Amount"]);
    }

    #[test]
    fn case_insensitive_column_lookup() {
        let mut table = Table::new("Orders").with_columns(vec![Column::new("Amount", TypeCode::Decimal)]);

        let column = table.find_column_mut_ignore_case("AMOUNT").unwrap();
        column.description = Some("Order total".to_string());

        assert_eq!(table.columns[0].description.as_deref(), Some("Order total"));

        let mut table = Table::new("Saisons").with_columns(vec![Column::new("ÉTÉ", TypeCode::Bit)]);
        assert!(table.find_column_mut_ignore_case("été").is_some());
        assert!(table.find_column_mut_ignore_case("ete").is_none());
    }

    #[test]
    fn primary_key_columns() {
        let mut id = Column::new("Id", TypeCode::Integer);
        id.primary_key = true;
        let table = Table::new("Orders").with_columns(vec![id, Column::new("Note", TypeCode::VarChar)]);

        assert_eq!(table.primary_key_columns(), vec!["Id"]);
    }

    #[test]
    fn database_serialization() {
        let mut db = Database::new("shop");
        db.add_table(Table::new("Orders").with_columns(vec![
            Column::new("Amount", TypeCode::BigInt).with_default("100"),
        ]));

        let json = serde_json::to_string(&db).unwrap();
        assert!(json.contains("\"BIGINT\""));
        assert!(!json.contains("description"));

        let parsed: Database = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, db);
        assert_eq!(parsed.table_names(), vec!["Orders"]);
    }
}
