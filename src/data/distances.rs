use anyhow::{Result, ensure};
use ndarray::Array2;

use crate::error::SplitsError;

const SYMMETRY_EPS: f64 = 1e-9;

/// Symmetric `ntax × ntax` matrix of non-negative distances, zero diagonal.
///
/// Stored 0-based in an `Array2`, accessed 1-based through [`get`](Self::get).
/// A missing distance is NaN in both `(i, j)` and `(j, i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    d: Array2<f64>,
}

impl DistanceMatrix {
    pub fn from_array(d: Array2<f64>) -> Result<Self> {
        let n = d.nrows();
        ensure!(
            d.ncols() == n,
            SplitsError::InvalidInput(format!("distance matrix is {}x{}, not square", n, d.ncols()))
        );
        for i in 0..n {
            let dii = d[[i, i]];
            if !(dii == 0.0 || dii.is_nan()) {
                return Err(SplitsError::InvalidInput(format!(
                    "diagonal entry for taxon {} is {}, expected 0",
                    i + 1,
                    dii
                ))
                .into());
            }
            for j in (i + 1)..n {
                let (a, b) = (d[[i, j]], d[[j, i]]);
                if a.is_nan() || b.is_nan() {
                    if !(a.is_nan() && b.is_nan()) {
                        return Err(SplitsError::InvalidInput(format!(
                            "distance between taxa {} and {} is missing on one side only",
                            i + 1,
                            j + 1
                        ))
                        .into());
                    }
                    continue;
                }
                if a < 0.0 || a.is_infinite() {
                    return Err(SplitsError::InvalidInput(format!(
                        "distance between taxa {} and {} is {}",
                        i + 1,
                        j + 1,
                        a
                    ))
                    .into());
                }
                if (a - b).abs() > SYMMETRY_EPS * a.abs().max(1.0) {
                    return Err(SplitsError::InvalidInput(format!(
                        "distance matrix not symmetric at ({}, {}): {} vs {}",
                        i + 1,
                        j + 1,
                        a,
                        b
                    ))
                    .into());
                }
            }
        }
        Ok(Self { d })
    }

    /// From nested rows, e.g. parsed JSON.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let mut d = Array2::<f64>::zeros((n, n));
        for (i, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == n,
                SplitsError::InvalidInput(format!("row {} has {} entries, expected {}", i + 1, row.len(), n))
            );
            for (j, &v) in row.iter().enumerate() {
                d[[i, j]] = v;
            }
        }
        Self::from_array(d)
    }

    pub fn ntax(&self) -> usize {
        self.d.nrows()
    }

    /// 1-based; NaN when missing.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.d[[i - 1, j - 1]]
    }

    pub fn has_missing(&self) -> bool {
        self.d.iter().any(|v| v.is_nan())
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.d
    }
}
