//! Per-column standardisation shared by every evaluator.

use serde::{Deserialize, Serialize};

/// Centres each column on its mean and divides by its sample deviation.
///
/// Columns with fewer than two rows or zero spread keep a unit scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardiser {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Standardiser {
    /// Fits on the rows of a table; `width` is the column count.
    pub fn fit(rows: &[Vec<f64>], width: usize) -> Self {
        let n = rows.len();
        let mut mean = vec![0.0; width];
        let mut scale = vec![1.0; width];
        if n == 0 {
            return Self { mean, scale };
        }
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row) {
                *acc += value;
            }
        }
        for acc in &mut mean {
            *acc /= n as f64;
        }
        if n > 1 {
            for (col, s) in scale.iter_mut().enumerate() {
                let var = rows
                    .iter()
                    .map(|row| (row[col] - mean[col]).powi(2))
                    .sum::<f64>()
                    / (n - 1) as f64;
                let sd = var.sqrt();
                if sd.is_finite() && sd > f64::EPSILON {
                    *s = sd;
                }
            }
        }
        Self { mean, scale }
    }

    /// Column means.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Column scales.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardised copy of one row.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    /// Standardised copy of many rows.
    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}
