//! Test fixtures for model reader integration tests
//!
//! Raw catalogs as a SQL Server driver reports them, before normalization.

use schemaprobe_catalog::mock::{column_row, MockTable};
use schemaprobe_catalog::MockSource;
use schemaprobe_core::{labels, TypeCode};
use std::sync::Arc;

/// The canonical Orders table
///
/// - `Amount` DECIMAL(19,0) with default `((100.))`
/// - `CreatedAt` TIMESTAMP with default `('2020-01-02')`
/// - a synthetic primary-key index `PK__Orders__1F5A4F0B`
/// - an extended-property comment on `amount`
pub fn orders_table() -> MockTable {
    MockTable::new("Orders")
        .with_column(
            column_row("Id", TypeCode::Integer)
                .with(labels::COLUMN_SIZE, 10)
                .with(labels::IS_NULLABLE, "NO"),
        )
        .with_column(
            column_row("Amount", TypeCode::Decimal)
                .with(labels::COLUMN_SIZE, 19)
                .with(labels::SCALE, 0)
                .with(labels::COLUMN_DEF, "((100.))"),
        )
        .with_column(
            column_row("CreatedAt", TypeCode::Timestamp)
                .with(labels::COLUMN_SIZE, 23)
                .with(labels::SCALE, 3)
                .with(labels::COLUMN_DEF, "('2020-01-02')"),
        )
        .with_index("PK__Orders__1F5A4F0B", true, "Id")
        .with_primary_key("PK__Orders__1F5A4F0B", "Id")
        .with_table_comment("Customer orders")
        .with_column_comment("amount", "Order total")
        .with_auto_increment("Id")
}

/// Customers with a named primary key, a secondary index and a quoted default
pub fn customers_table() -> MockTable {
    MockTable::new("Customers")
        .with_column(column_row("CustomerId", TypeCode::Integer).with(labels::IS_NULLABLE, "NO"))
        .with_column(
            column_row("Name", TypeCode::NVarChar)
                .with(labels::COLUMN_SIZE, 100)
                .with(labels::COLUMN_DEF, "('O''Brien')"),
        )
        .with_column(
            column_row("OpensAt", TypeCode::Timestamp).with(labels::COLUMN_DEF, "('10:30:00')"),
        )
        .with_index("CustomersKey", true, "CustomerId")
        .with_index("IX_Customers_Name", false, "Name")
        .with_primary_key("CustomersKey", "CustomerId")
}

/// Driver-internal maintenance table
pub fn dtproperties_table() -> MockTable {
    MockTable::new("dtproperties").with_column(column_row("id", TypeCode::Integer))
}

pub fn shop_source() -> Arc<MockSource> {
    Arc::new(MockSource::from_tables(vec![
        orders_table(),
        dtproperties_table(),
        customers_table(),
    ]))
}

/// Snapshot of the shop database as exported from a live server
pub const SHOP_SNAPSHOT: &str = r#"{
    "name": "shop",
    "tables": [
        {
            "row": { "TABLE_CAT": "shop", "TABLE_SCHEM": "dbo", "TABLE_NAME": "Orders", "TABLE_TYPE": "TABLE" },
            "columns": [
                { "TABLE_NAME": "Orders", "COLUMN_NAME": "Id", "TYPE_CODE": 4, "COLUMN_SIZE": 10, "IS_NULLABLE": "NO", "ORDINAL_POSITION": 1 },
                { "TABLE_NAME": "Orders", "COLUMN_NAME": "Amount", "TYPE_CODE": 3, "COLUMN_SIZE": 19, "SCALE": 0, "COLUMN_DEF": "((100.))", "ORDINAL_POSITION": 2 }
            ],
            "indexes": [
                { "INDEX_NAME": "PK__Orders__1F5A4F0B", "NON_UNIQUE": false, "COLUMN_NAME": "Id", "ORDINAL_POSITION": 1 }
            ],
            "primary_keys": [ { "COLUMN_NAME": "Id", "PK_NAME": "PK__Orders__1F5A4F0B" } ],
            "table_comments": [ { "objname": "Orders", "value": "Customer orders" } ],
            "column_comments": [ { "objname": "amount", "value": "Order total" } ],
            "auto_increment": ["Id"]
        },
        {
            "row": { "TABLE_CAT": "shop", "TABLE_SCHEM": "dbo", "TABLE_NAME": "dtproperties", "TABLE_TYPE": "TABLE" }
        }
    ]
}"#;
