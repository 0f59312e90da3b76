//! Tabular result types for viewmerge.
//!
//! Defines the structures used to represent query results from the warehouse,
//! along with the column-level operations the loader applies when merging
//! result sets: constant-column injection, value rewrites, concatenation, and
//! column reordering.

use crate::error::{Result, ViewmergeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the tabular result of one or more warehouse queries.
///
/// Columns are ordered and named; rows are ordered and positional (row `i`
/// holds one value per column, in column order). No schema is known in
/// advance beyond what the query engine reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultTable {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,
}

impl ResultTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the ordered list of column names.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Returns the position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Sets every row's value in the named column to `value`, appending the
    /// column if it does not exist yet.
    ///
    /// An existing column keeps its position and reported data type; a new
    /// column is appended at the end.
    pub fn set_column(&mut self, name: &str, value: Value) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(ColumnInfo::new(name, "text"));
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Rewrites string values in the named column, replacing every occurrence
    /// of `from` with `to`.
    ///
    /// Non-string values pass through untouched. The column must exist.
    pub fn replace_in_column(&mut self, name: &str, from: &str, to: &str) -> Result<()> {
        let idx = self.column_index(name).ok_or_else(|| {
            ViewmergeError::schema(format!("column \"{name}\" not found in result"))
        })?;
        for row in &mut self.rows {
            if let Value::String(s) = &row[idx] {
                if s.contains(from) {
                    row[idx] = Value::String(s.replace(from, to));
                }
            }
        }
        Ok(())
    }

    /// Appends `other`'s rows beneath this table's rows.
    ///
    /// The two tables must have the same set of column names. `other`'s
    /// columns are aligned by name to this table's column order, so the
    /// result keeps this table's layout. Unequal column sets are a schema
    /// error, never a null-filled union.
    pub fn concat(mut self, other: ResultTable) -> Result<ResultTable> {
        if self.columns.len() != other.columns.len() {
            return Err(ViewmergeError::schema(format!(
                "cannot concatenate tables with {} and {} columns",
                self.columns.len(),
                other.columns.len()
            )));
        }

        // Where each of our columns lives in the other table.
        let mut mapping = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let idx = other.column_index(&col.name).ok_or_else(|| {
                ViewmergeError::schema(format!(
                    "column \"{}\" missing from appended table",
                    col.name
                ))
            })?;
            mapping.push(idx);
        }

        for row in other.rows {
            let aligned: Row = mapping.iter().map(|&idx| row[idx].clone()).collect();
            self.rows.push(aligned);
        }
        Ok(self)
    }

    /// Returns a new table containing only the named columns, in the given
    /// order.
    ///
    /// A name not present in this table is a schema error.
    pub fn select_columns(&self, order: &[String]) -> Result<ResultTable> {
        let mut indices = Vec::with_capacity(order.len());
        for name in order {
            let idx = self.column_index(name).ok_or_else(|| {
                ViewmergeError::schema(format!("column \"{name}\" not found in result"))
            })?;
            indices.push(idx);
        }

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(ResultTable { columns, rows })
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type, as reported by the query engine.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single cell value from a warehouse result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the inner string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value to a display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
