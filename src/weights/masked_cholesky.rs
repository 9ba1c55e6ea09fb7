use anyhow::{Result, ensure};
use ndarray::Array2;

use crate::error::SplitsError;

/// Relative pivot size below which the free block is treated as singular.
const PIVOT_EPS: f64 = 1e-12;

/// Cholesky factor of a symmetric positive-semidefinite matrix restricted to
/// its unmasked (free) variables, updated incrementally. The free block must
/// stay positive definite.
///
/// Rows of `l` follow `order`, the free variables in the order they were
/// unmasked. Unmasking appends a row by forward substitution; masking deletes
/// a row and repairs the trailing block with a rank-one update. Both are
/// `O(f²)` for `f` free variables.
#[derive(Debug, Clone)]
pub struct MaskedCholesky {
    m: Array2<f64>,
    order: Vec<usize>,
    l: Vec<Vec<f64>>,
    masked: Vec<bool>,
}

impl MaskedCholesky {
    /// Factor with every variable free.
    pub fn new(m: &Array2<f64>) -> Result<Self> {
        let n = m.nrows();
        ensure!(
            m.ncols() == n,
            SplitsError::InvalidInput(format!("matrix is {}x{}, not square", n, m.ncols()))
        );
        let mut f = Self {
            m: m.clone(),
            order: Vec::with_capacity(n),
            l: Vec::with_capacity(n),
            masked: vec![true; n],
        };
        for i in 0..n {
            f.unmask(i)?;
        }
        Ok(f)
    }

    /// Factor with every variable masked (empty factor).
    pub fn all_masked(m: &Array2<f64>) -> Result<Self> {
        let n = m.nrows();
        ensure!(
            m.ncols() == n,
            SplitsError::InvalidInput(format!("matrix is {}x{}, not square", n, m.ncols()))
        );
        Ok(Self {
            m: m.clone(),
            order: Vec::with_capacity(n),
            l: Vec::with_capacity(n),
            masked: vec![true; n],
        })
    }

    pub fn dim(&self) -> usize {
        self.masked.len()
    }

    pub fn is_masked(&self, i: usize) -> bool {
        self.masked[i]
    }

    pub fn nfree(&self) -> usize {
        self.order.len()
    }

    /// Bring variable `i` into the free set.
    pub fn unmask(&mut self, i: usize) -> Result<()> {
        match self.try_unmask(i) {
            Ok(()) => Ok(()),
            Err(d2) => Err(SplitsError::Numerical(format!(
                "pivot {:e} for variable {} (matrix singular on the free set)",
                d2, i
            ))
            .into()),
        }
    }

    /// Like [`unmask`](Self::unmask), but a vanishing pivot leaves the
    /// factor unchanged and hands the pivot back. Column `i` of `M` is then
    /// dependent on the free columns.
    pub fn try_unmask(&mut self, i: usize) -> std::result::Result<(), f64> {
        if !self.masked[i] {
            return Ok(());
        }
        let f = self.order.len();
        // Solve L y = M[order, i].
        let mut row = Vec::with_capacity(f + 1);
        for r in 0..f {
            let mut s = self.m[[self.order[r], i]];
            for c in 0..r {
                s -= self.l[r][c] * row[c];
            }
            row.push(s / self.l[r][r]);
        }
        let mii = self.m[[i, i]];
        let d2 = mii - row.iter().map(|y| y * y).sum::<f64>();
        if !(d2 > PIVOT_EPS * mii.abs().max(1.0)) {
            return Err(d2);
        }
        row.push(d2.sqrt());
        self.l.push(row);
        self.order.push(i);
        self.masked[i] = false;
        Ok(())
    }

    /// Hold variable `i` at zero.
    pub fn mask(&mut self, i: usize) -> Result<()> {
        if self.masked[i] {
            return Ok(());
        }
        let Some(p) = self.order.iter().position(|&v| v == i) else {
            return Err(SplitsError::Numerical(format!("free variable {} missing from the factor", i)).into());
        };
        self.order.remove(p);
        self.l.remove(p);

        // Column p of the rows below leaves the factor; fold it back into the
        // trailing block: L22' L22'ᵀ = L22 L22ᵀ + x xᵀ.
        let mut x: Vec<f64> = self.l.iter_mut().skip(p).map(|row| row.remove(p)).collect();
        let t = x.len();
        for k in 0..t {
            let q = p + k;
            let lkk = self.l[q][q];
            let r = lkk.hypot(x[k]);
            let c = r / lkk;
            let s = x[k] / lkk;
            self.l[q][q] = r;
            for j in (k + 1)..t {
                let qj = p + j;
                self.l[qj][q] = (self.l[qj][q] + s * x[j]) / c;
                x[j] = c * x[j] - s * self.l[qj][q];
            }
        }
        self.masked[i] = true;
        Ok(())
    }

    /// Solve the system restricted to the free variables; masked entries are 0.
    pub fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        let f = self.order.len();
        let mut y = vec![0.0; f];
        for r in 0..f {
            let mut s = rhs[self.order[r]];
            for c in 0..r {
                s -= self.l[r][c] * y[c];
            }
            y[r] = s / self.l[r][r];
        }
        for r in (0..f).rev() {
            let mut s = y[r];
            for k in (r + 1)..f {
                s -= self.l[k][r] * y[k];
            }
            y[r] = s / self.l[r][r];
        }
        let mut x = vec![0.0; self.dim()];
        for (r, &v) in self.order.iter().enumerate() {
            x[v] = y[r];
        }
        x
    }
}
