//! Numeric reference tables evaluators are fitted on.

use form_core::errors::{codes, FormError};
use serde::{Deserialize, Serialize};

/// Row-major numeric table with named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReferenceTable {
    /// Builds a table; every row must have one finite value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, FormError> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FormError::dataset(
                    codes::DATASET_SHAPE,
                    format!("row {idx} has {} values for {} columns", row.len(), columns.len()),
                ));
            }
            if let Some(col) = row.iter().position(|value| !value.is_finite()) {
                return Err(FormError::dataset(
                    codes::DATASET_SHAPE,
                    format!("row {idx} holds a non finite value in column '{}'", columns[col]),
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Single-column table.
    pub fn from_column(name: impl Into<String>, values: Vec<f64>) -> Result<Self, FormError> {
        Self::new(vec![name.into()], values.into_iter().map(|v| vec![v]).collect())
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of one column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Table restricted to `columns`, in that order.
    pub fn select(&self, columns: &[String]) -> Result<Self, FormError> {
        let indices = columns
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    FormError::dataset(codes::DATASET_COLUMN, format!("table has no column '{name}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx]).collect())
            .collect();
        Ok(Self {
            columns: columns.to_vec(),
            rows,
        })
    }
}
