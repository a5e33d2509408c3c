//! Column schema vocabulary: SQL type classification and transport casts

use serde::{Deserialize, Serialize};

/// Broad category derived from a backend SQL type string.
///
/// The category drives transport casting, value parsing, alignment,
/// sortability, and filter affordances in consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCategory {
    Text,
    Numeric,
    Temporal,
    Boolean,
    Binary,
    Complex,
    Identifier,
    Enum,
    Geo,
    Unknown,
}

/// Schema of a single backend column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Stable column key used in row records and queries
    pub key: String,
    /// Raw SQL type string as reported by the backend
    pub sql_type: String,
    /// Category derived from `sql_type`
    pub category: TypeCategory,
}

impl ColumnSchema {
    /// Build a schema, deriving the category from the SQL type
    pub fn new(key: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let key = key.into();
        let sql_type = sql_type.into();
        let category = categorize(&sql_type);
        Self {
            key,
            sql_type,
            category,
        }
    }

    /// Whether transported values need parsing into a wide integer
    pub fn wide_integer(&self) -> bool {
        is_wide_integer(&self.sql_type)
    }
}

/// One key of a multi-column sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub desc: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            desc: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            desc: true,
        }
    }
}

/// Integer families wider than 53 bits, which lose precision outside a
/// textual transport.
const WIDE_INT_TYPES: &[&str] = &[
    "BIGINT", "INT8", "LONG", "INT64", "UBIGINT", "UINT64", "HUGEINT", "UHUGEINT",
];

/// Exact type names checked before any family prefix
const EXACT: &[(&str, TypeCategory)] = &[
    ("TINYINT", TypeCategory::Numeric),
    ("SMALLINT", TypeCategory::Numeric),
    ("INTEGER", TypeCategory::Numeric),
    ("INT", TypeCategory::Numeric),
    ("INT1", TypeCategory::Numeric),
    ("INT2", TypeCategory::Numeric),
    ("INT4", TypeCategory::Numeric),
    ("INT8", TypeCategory::Numeric),
    ("BIGINT", TypeCategory::Numeric),
    ("HUGEINT", TypeCategory::Numeric),
    ("UTINYINT", TypeCategory::Numeric),
    ("USMALLINT", TypeCategory::Numeric),
    ("UINTEGER", TypeCategory::Numeric),
    ("UBIGINT", TypeCategory::Numeric),
    ("UHUGEINT", TypeCategory::Numeric),
    ("LONG", TypeCategory::Numeric),
    ("SHORT", TypeCategory::Numeric),
    ("DATE", TypeCategory::Temporal),
    ("TIME", TypeCategory::Temporal),
    ("DATETIME", TypeCategory::Temporal),
    ("INTERVAL", TypeCategory::Temporal),
    ("BOOL", TypeCategory::Boolean),
    ("BOOLEAN", TypeCategory::Boolean),
    ("LOGICAL", TypeCategory::Boolean),
    ("BLOB", TypeCategory::Binary),
    ("BYTEA", TypeCategory::Binary),
    ("UUID", TypeCategory::Identifier),
    ("GUID", TypeCategory::Identifier),
    ("JSON", TypeCategory::Complex),
    ("ROW", TypeCategory::Complex),
    ("NAME", TypeCategory::Text),
    ("BPCHAR", TypeCategory::Text),
    ("STRING", TypeCategory::Text),
    ("TEXT", TypeCategory::Text),
];

/// Family prefixes checked in order after the exact table.
///
/// Order matters where families share a stem: `INTERVAL` and `TIMESTAMP`
/// must be tested before the integer and `TIME` stems.
const PREFIX: &[(&str, TypeCategory)] = &[
    ("INTERVAL", TypeCategory::Temporal),
    ("TIMESTAMP", TypeCategory::Temporal),
    ("DATETIME", TypeCategory::Temporal),
    ("DATE", TypeCategory::Temporal),
    ("TIME", TypeCategory::Temporal),
    ("BOOL", TypeCategory::Boolean),
    ("ENUM", TypeCategory::Enum),
    ("UUID", TypeCategory::Identifier),
    ("JSON", TypeCategory::Complex),
    ("LIST", TypeCategory::Complex),
    ("ARRAY", TypeCategory::Complex),
    ("STRUCT", TypeCategory::Complex),
    ("MAP", TypeCategory::Complex),
    ("UNION", TypeCategory::Complex),
    ("GEOMETRY", TypeCategory::Geo),
    ("GEOGRAPHY", TypeCategory::Geo),
    ("POINT", TypeCategory::Geo),
    ("LINESTRING", TypeCategory::Geo),
    ("POLYGON", TypeCategory::Geo),
    ("DECIMAL", TypeCategory::Numeric),
    ("NUMERIC", TypeCategory::Numeric),
    ("FLOAT", TypeCategory::Numeric),
    ("REAL", TypeCategory::Numeric),
    ("DOUBLE", TypeCategory::Numeric),
    ("TINYINT", TypeCategory::Numeric),
    ("SMALLINT", TypeCategory::Numeric),
    ("BIGINT", TypeCategory::Numeric),
    ("HUGEINT", TypeCategory::Numeric),
    ("INT", TypeCategory::Numeric),
    ("UINT", TypeCategory::Numeric),
    ("UBIGINT", TypeCategory::Numeric),
    ("UHUGEINT", TypeCategory::Numeric),
    ("BLOB", TypeCategory::Binary),
    ("BYTEA", TypeCategory::Binary),
    ("VARBINARY", TypeCategory::Binary),
    ("BINARY", TypeCategory::Binary),
    ("VARCHAR", TypeCategory::Text),
    ("CHAR", TypeCategory::Text),
    ("NVARCHAR", TypeCategory::Text),
    ("TEXT", TypeCategory::Text),
    ("STRING", TypeCategory::Text),
];

/// Classify a backend SQL type string.
///
/// Pure and total: unrecognized types map to `Unknown`. Matching is
/// case-insensitive, exact names take precedence over family prefixes.
pub fn categorize(sql_type: &str) -> TypeCategory {
    let ty = sql_type.trim().to_ascii_uppercase();

    for (name, category) in EXACT {
        if ty == *name {
            return *category;
        }
    }
    for (prefix, category) in PREFIX {
        if ty.starts_with(prefix) {
            return *category;
        }
    }
    TypeCategory::Unknown
}

/// Whether the SQL type is an integer family wider than float precision
pub fn is_wide_integer(sql_type: &str) -> bool {
    let ty = sql_type.trim().to_ascii_uppercase();
    WIDE_INT_TYPES.iter().any(|t| ty == *t)
}

/// Select the transport cast for a column, if any.
///
/// Wide integers, `INTERVAL`, `TIME`, and every complex-category type are
/// cast to `TEXT` so values survive transport without precision loss and
/// arrive in a deterministic textual shape. All other types travel as-is.
pub fn cast_for(schema: &ColumnSchema) -> Option<&'static str> {
    if schema.wide_integer() {
        return Some("TEXT");
    }
    let ty = schema.sql_type.trim().to_ascii_uppercase();
    if ty == "INTERVAL" || ty.starts_with("INTERVAL") {
        return Some("TEXT");
    }
    if ty == "TIME" || (ty.starts_with("TIME") && !ty.starts_with("TIMESTAMP")) {
        return Some("TEXT");
    }
    if schema.category == TypeCategory::Complex {
        return Some("TEXT");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_common_types() {
        assert_eq!(categorize("BIGINT"), TypeCategory::Numeric);
        assert_eq!(categorize("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize("TIMESTAMP WITH TIME ZONE"), TypeCategory::Temporal);
        assert_eq!(categorize("LIST(INTEGER)"), TypeCategory::Complex);
        assert_eq!(categorize("UUID"), TypeCategory::Identifier);
        assert_eq!(categorize("ENUM('a','b')"), TypeCategory::Enum);
    }

    #[test]
    fn categorize_is_case_insensitive() {
        assert_eq!(categorize("bigint"), categorize("BIGINT"));
        assert_eq!(categorize("bigint"), TypeCategory::Numeric);
        assert_eq!(categorize("varchar(255)"), TypeCategory::Text);
        assert_eq!(categorize("Boolean"), TypeCategory::Boolean);
    }

    #[test]
    fn interval_is_not_an_integer() {
        assert_eq!(categorize("INTERVAL"), TypeCategory::Temporal);
        assert_eq!(categorize("INTERVAL DAY TO SECOND"), TypeCategory::Temporal);
    }

    #[test]
    fn decimal_with_precision_is_numeric() {
        assert_eq!(categorize("DECIMAL(18,3)"), TypeCategory::Numeric);
        assert_eq!(categorize("NUMERIC(10)"), TypeCategory::Numeric);
    }

    #[test]
    fn geo_and_binary_families() {
        assert_eq!(categorize("GEOMETRY"), TypeCategory::Geo);
        assert_eq!(categorize("POLYGON"), TypeCategory::Geo);
        assert_eq!(categorize("BYTEA"), TypeCategory::Binary);
        assert_eq!(categorize("made_up_type"), TypeCategory::Unknown);
    }

    #[test]
    fn cast_selection() {
        let bigint = ColumnSchema::new("a", "BIGINT");
        let int = ColumnSchema::new("b", "INTEGER");
        let json = ColumnSchema::new("c", "JSON");
        let time = ColumnSchema::new("d", "TIME");
        let ts = ColumnSchema::new("e", "TIMESTAMP");
        assert_eq!(cast_for(&bigint), Some("TEXT"));
        assert_eq!(cast_for(&int), None);
        assert_eq!(cast_for(&json), Some("TEXT"));
        assert_eq!(cast_for(&time), Some("TEXT"));
        assert_eq!(cast_for(&ts), None);
    }

    #[test]
    fn wide_integer_detection() {
        assert!(is_wide_integer("bigint"));
        assert!(is_wide_integer("HUGEINT"));
        assert!(!is_wide_integer("INTEGER"));
        assert!(!is_wide_integer("DOUBLE"));
    }
}
