//! Tabular data moved between engines.
//!
//! `TabularData` is deliberately small: named columns and rows of loosely
//! typed values, enough to carry a query result from a source into a staging
//! table without modelling SQL types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`
    Null,
    /// Boolean (`BIT`)
    Bool(bool),
    /// Any integer column
    Int(i64),
    /// Floating point column
    Float(f64),
    /// Timestamp without time zone
    DateTime(NaiveDateTime),
    /// Text, and anything carried as text (decimals, GUIDs, base64 binaries)
    Text(String),
}

impl Value {
    /// Returns true for SQL `NULL`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A result set: column names plus rows of equal width.
///
/// Rows only enter through [`TabularData::push_row`], so every row has one
/// value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularData {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TabularData {
    /// Creates an empty result with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// # Errors
    /// Returns a configuration error if the row width differs from the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> crate::Result<()> {
        if row.len() != self.columns.len() {
            return Err(crate::SqlStageError::configuration(format!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Schema, or the connection's default when `None`
    pub schema: Option<String>,
    /// Table name
    pub name: String,
}

impl TableRef {
    /// A table in the connection's default schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// A table in an explicit schema.
    pub fn in_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Quotes the name with SQL Server brackets, doubling any closing bracket.
    pub fn bracketed(&self) -> String {
        let quote = |part: &str| format!("[{}]", part.replace(']', "]]"));
        match &self.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&self.name)),
            None => quote(&self.name),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// What to do with existing rows when pushing into a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfExists {
    /// Keep existing rows and add the new ones
    #[default]
    Append,
    /// Delete existing rows before inserting
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_checks_width() {
        let mut data = TabularData::new(vec!["store".to_string(), "sale_value".to_string()]);
        assert!(data.push_row(vec!["XS01".into(), 12.5_f64.into()]).is_ok());
        assert!(data.push_row(vec!["XS01".into()]).is_err());
        assert!(
            data.push_row(vec!["XS01".into(), 1_i64.into(), true.into()])
                .is_err()
        );
        assert_eq!(data.len(), 1);
        assert!(data.rows().iter().all(|row| row.len() == data.columns().len()));
        assert_eq!(data.column_index("sale_value"), Some(1));
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }

    #[test]
    fn test_table_ref_quoting() {
        let table = TableRef::in_schema("staging", "Sales");
        assert_eq!(table.bracketed(), "[staging].[Sales]");
        assert_eq!(table.to_string(), "staging.Sales");

        let odd = TableRef::new("we]ird");
        assert_eq!(odd.bracketed(), "[we]]ird]");
    }

    #[test]
    fn test_value_json_shape() {
        let row = vec![Value::Null, Value::Int(1), Value::Text("a".to_string())];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[null,1,"a"]"#);
    }
}
