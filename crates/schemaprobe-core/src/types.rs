//! JDBC-standard type codes
//!
//! Drivers report column types as `java.sql.Types` integer codes. The model keeps
//! the code rather than a portable logical type because dialect corrections
//! (e.g. `DECIMAL(19,0)` -> `BIGINT`) are expressed in terms of these codes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A `java.sql.Types` code
///
/// Codes without a dedicated variant are preserved verbatim in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Null,
    Boolean,
    Blob,
    Clob,
    NClob,
    SqlXml,
    RowId,
    Array,
    Struct,
    Ref,
    Distinct,
    JavaObject,
    DataLink,

    /// Any other driver-specific code
    Other(i32),
}

/// Known variants with their integer code and canonical name
const KNOWN: &[(TypeCode, i32, &str)] = &[
    (TypeCode::Bit, -7, "BIT"),
    (TypeCode::TinyInt, -6, "TINYINT"),
    (TypeCode::SmallInt, 5, "SMALLINT"),
    (TypeCode::Integer, 4, "INTEGER"),
    (TypeCode::BigInt, -5, "BIGINT"),
    (TypeCode::Float, 6, "FLOAT"),
    (TypeCode::Real, 7, "REAL"),
    (TypeCode::Double, 8, "DOUBLE"),
    (TypeCode::Numeric, 2, "NUMERIC"),
    (TypeCode::Decimal, 3, "DECIMAL"),
    (TypeCode::Char, 1, "CHAR"),
    (TypeCode::VarChar, 12, "VARCHAR"),
    (TypeCode::LongVarChar, -1, "LONGVARCHAR"),
    (TypeCode::NChar, -15, "NCHAR"),
    (TypeCode::NVarChar, -9, "NVARCHAR"),
    (TypeCode::LongNVarChar, -16, "LONGNVARCHAR"),
    (TypeCode::Date, 91, "DATE"),
    (TypeCode::Time, 92, "TIME"),
    (TypeCode::Timestamp, 93, "TIMESTAMP"),
    (TypeCode::Binary, -2, "BINARY"),
    (TypeCode::VarBinary, -3, "VARBINARY"),
    (TypeCode::LongVarBinary, -4, "LONGVARBINARY"),
    (TypeCode::Null, 0, "NULL"),
    (TypeCode::Boolean, 16, "BOOLEAN"),
    (TypeCode::Blob, 2004, "BLOB"),
    (TypeCode::Clob, 2005, "CLOB"),
    (TypeCode::NClob, 2011, "NCLOB"),
    (TypeCode::SqlXml, 2009, "SQLXML"),
    (TypeCode::RowId, -8, "ROWID"),
    (TypeCode::Array, 2003, "ARRAY"),
    (TypeCode::Struct, 2002, "STRUCT"),
    (TypeCode::Ref, 2006, "REF"),
    (TypeCode::Distinct, 2001, "DISTINCT"),
    (TypeCode::JavaObject, 2000, "JAVA_OBJECT"),
    (TypeCode::DataLink, 70, "DATALINK"),
];

impl TypeCode {
    /// Resolve an integer code as reported by a driver
    pub fn from_code(code: i32) -> Self {
        KNOWN
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(t, _, _)| *t)
            .unwrap_or(Self::Other(code))
    }

    /// Resolve a canonical type name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|(_, _, n)| n.eq_ignore_ascii_case(name))
            .map(|(t, _, _)| *t)
    }

    /// The integer `java.sql.Types` code
    pub fn code(&self) -> i32 {
        match self {
            Self::Other(code) => *code,
            known => KNOWN
                .iter()
                .find(|(t, _, _)| t == known)
                .map(|(_, c, _)| *c)
                .unwrap_or(1111),
        }
    }

    /// Canonical name, `None` for `Other`
    pub fn name(&self) -> Option<&'static str> {
        KNOWN.iter().find(|(t, _, _)| t == self).map(|(_, _, n)| *n)
    }

    /// Character data whose default literals use SQL string escaping
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::VarChar
                | Self::LongVarChar
                | Self::NChar
                | Self::NVarChar
                | Self::LongNVarChar
                | Self::Clob
                | Self::NClob
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Bit
                | Self::TinyInt
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Float
                | Self::Real
                | Self::Double
                | Self::Numeric
                | Self::Decimal
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }
}

impl std::fmt::Display for TypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "OTHER({})", self.code()),
        }
    }
}

impl Serialize for TypeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_i32(self.code()),
        }
    }
}

impl<'de> Deserialize<'de> for TypeCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(i32),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Ok(Self::from_code(code)),
            Repr::Name(name) => Self::from_name(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown type name '{}'", name))),
        }
    }
}
