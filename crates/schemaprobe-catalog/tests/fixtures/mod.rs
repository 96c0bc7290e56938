//! Test fixtures for metadata source integration tests
//!
//! Raw tables shaped the way SQL Server drivers report them: parenthesized
//! defaults, synthetic primary-key indexes and extended-property comments.

use schemaprobe_catalog::mock::{column_row, MockTable};
use schemaprobe_core::{labels, TypeCode};

/// Orders table with a DECIMAL(19,0) amount and a synthetic PK index
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
                .with(labels::COLUMN_DEF, "('2020-01-02')"),
        )
        .with_index("PK__Orders__1F5A4F0B", true, "Id")
        .with_primary_key("PK__Orders__1F5A4F0B", "Id")
        .with_table_comment("Customer orders")
        .with_column_comment("amount", "Order total")
        .with_auto_increment("Id")
}

/// Customers table with a named primary key and a secondary index
pub fn customers_table() -> MockTable {
    MockTable::new("Customers")
        .with_column(column_row("CustomerId", TypeCode::Integer).with(labels::IS_NULLABLE, "NO"))
        .with_column(
            column_row("Name", TypeCode::NVarChar)
                .with(labels::COLUMN_SIZE, 100)
                .with(labels::COLUMN_DEF, "('O''Brien')"),
        )
        .with_column(column_row("Email", TypeCode::VarChar).with(labels::COLUMN_SIZE, 255))
        .with_index("CustomersPK", true, "CustomerId")
        .with_index("IX_Customers_Email", false, "Email")
        .with_primary_key("CustomersPK", "CustomerId")
}

/// Driver-internal maintenance table
pub fn dtproperties_table() -> MockTable {
    MockTable::new("dtproperties").with_column(column_row("id", TypeCode::Integer))
}

/// Table whose name contains search-pattern wildcards
pub fn order_items_table() -> MockTable {
    MockTable::new("order_items")
        .with_column(column_row("item_id", TypeCode::Integer))
        .with_column(column_row("qty", TypeCode::SmallInt).with(labels::COLUMN_DEF, "((1))"))
}

/// A catalog snapshot as written by hand or exported from a live server
pub const SHOP_SNAPSHOT: &str = r#"{
    "name": "shop",
    "tables": [
        {
            "row": { "TABLE_CAT": "shop", "TABLE_SCHEM": "dbo", "TABLE_NAME": "Orders", "TABLE_TYPE": "TABLE" },
            "columns": [
                { "COLUMN_NAME": "Id", "TYPE_CODE": 4, "COLUMN_SIZE": 10, "IS_NULLABLE": "NO" },
                { "COLUMN_NAME": "Amount", "TYPE_CODE": 3, "COLUMN_SIZE": 19, "SCALE": 0, "COLUMN_DEF": "((100.))" }
            ],
            "indexes": [
                { "INDEX_NAME": "PK__Orders__1F5A4F0B", "NON_UNIQUE": false, "COLUMN_NAME": "Id", "ORDINAL_POSITION": 1 }
            ],
            "column_comments": [ { "objname": "amount", "value": "Order total" } ],
            "auto_increment": ["Id"]
        },
        {
            "row": { "TABLE_CAT": "shop", "TABLE_SCHEM": "sales", "TABLE_NAME": "Invoices", "TABLE_TYPE": "TABLE" }
        }
    ]
}"#;
