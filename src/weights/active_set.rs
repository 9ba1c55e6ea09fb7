use anyhow::{Result, ensure};
use clap::Args;
use ndarray::{Array1, Array2};

use crate::error::SplitsError;
use crate::progress::{Progress, check};
use crate::weights::SolverMode;
use crate::weights::masked_cholesky::MaskedCholesky;

#[derive(Args, Clone, Debug)]
pub struct ActiveSetParams {
    /// Constrained (x ≥ 0, active set) or unconstrained (solve then clamp).
    #[arg(long, value_enum, default_value = "constrained")]
    pub mode: SolverMode,
    /// Tolerance ε for negative variables and gradients.
    #[arg(long, default_value = "1e-10")]
    pub tolerance: f64,
    /// Hard cap on outer (optimality) iterations.
    #[arg(long, default_value_t = 100_000)]
    pub max_iterations: usize,
    /// Drop fitted splits with weight ≤ cutoff (trivial splits always kept).
    #[arg(long, default_value = "0")]
    pub cutoff: f64,
}

impl Default for ActiveSetParams {
    fn default() -> Self {
        Self {
            mode: SolverMode::Constrained,
            tolerance: 1e-10,
            max_iterations: 100_000,
            cutoff: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ActiveSetSolution {
    pub x: Array1<f64>,
    /// Variables held at zero when the solver stopped.
    pub active: Vec<bool>,
    pub outer_iterations: usize,
    pub inner_iterations: usize,
}

/// Minimizes `xᵀMx − 2vᵀx` subject to `x ≥ 0` for symmetric
/// positive-semidefinite `M`, i.e. finds `x ≥ 0` with `(Mx − v)_i ≥ 0` everywhere and `= 0` where
/// `x_i > 0`.
pub struct ActiveSetSolver<'a> {
    m: &'a Array2<f64>,
    v: &'a Array1<f64>,
    params: &'a ActiveSetParams,
}

impl<'a> ActiveSetSolver<'a> {
    pub fn new(m: &'a Array2<f64>, v: &'a Array1<f64>, params: &'a ActiveSetParams) -> Result<Self> {
        let n = m.nrows();
        ensure!(
            m.ncols() == n,
            SplitsError::InvalidInput(format!("matrix is {}x{}, not square", n, m.ncols()))
        );
        ensure!(
            v.len() == n,
            SplitsError::InvalidInput(format!("vector has {} entries, matrix has {} rows", v.len(), n))
        );
        for i in 0..n {
            ensure!(
                v[i].is_finite(),
                SplitsError::InvalidInput(format!("v[{}] = {} is not finite", i, v[i]))
            );
            for j in i..n {
                let (a, b) = (m[[i, j]], m[[j, i]]);
                ensure!(
                    a.is_finite() && (a - b).abs() <= 1e-9 * a.abs().max(1.0),
                    SplitsError::InvalidInput(format!("matrix not symmetric/finite at ({}, {}): {} vs {}", i, j, a, b))
                );
            }
        }
        Ok(Self { m, v, params })
    }

    pub fn solve(&self, progress: Option<&dyn Progress>) -> Result<ActiveSetSolution> {
        match self.params.mode {
            SolverMode::Unconstrained => self.solve_unconstrained(),
            SolverMode::Constrained => self.active_set_method(progress),
        }
    }

    /// Solve `Mx = v` with all variables free, then clamp negatives to zero.
    /// Variables whose column depends on earlier ones are held at zero.
    pub fn solve_unconstrained(&self) -> Result<ActiveSetSolution> {
        let (chol, skipped) = self.factor_independent()?;
        if skipped > 0 {
            debug!("Unconstrained solve: {} dependent variables held at zero", skipped);
        }
        let x = chol.solve(&self.v.to_vec());
        let active = x.iter().map(|&xi| xi <= 0.0).collect();
        Ok(ActiveSetSolution {
            x: x.into_iter().map(|xi| xi.max(0.0)).collect(),
            active,
            outer_iterations: 0,
            inner_iterations: 1,
        })
    }

    /// Unmask every variable in index order, skipping those with a vanishing
    /// pivot. Returns the factor and the number skipped.
    fn factor_independent(&self) -> Result<(MaskedCholesky, usize)> {
        let mut chol = MaskedCholesky::all_masked(self.m)?;
        let mut skipped = 0;
        for i in 0..self.m.nrows() {
            if let Err(d2) = chol.try_unmask(i) {
                trace!("Variable {} is dependent (pivot {:e})", i, d2);
                skipped += 1;
            }
        }
        Ok((chol, skipped))
    }

    /// Feasibility inner loop nested in an optimality outer loop.
    ///
    /// Warm start: when `M` is nonsingular and the unconstrained solution is
    /// feasible it is optimal; otherwise its negative variables start masked
    /// and the iteration starts from `x = 0`, which is feasible for any
    /// active set. A singular `M` starts with every variable masked, and a
    /// variable is only released when its column is independent of the free
    /// ones, so the free block stays positive definite.
    fn active_set_method(&self, progress: Option<&dyn Progress>) -> Result<ActiveSetSolution> {
        let n = self.m.nrows();
        let eps = self.params.tolerance;
        let rhs = self.v.to_vec();

        let (mut chol, skipped) = self.factor_independent()?;
        if skipped == 0 {
            let x_unc = chol.solve(&rhs);
            if x_unc.iter().all(|&xi| xi >= -eps) {
                debug!("Unconstrained solution is feasible ({} variables)", n);
                return Ok(ActiveSetSolution {
                    active: x_unc.iter().map(|&xi| xi <= 0.0).collect(),
                    x: x_unc.into_iter().map(|xi| xi.max(0.0)).collect(),
                    outer_iterations: 0,
                    inner_iterations: 1,
                });
            }
            for (i, &xi) in x_unc.iter().enumerate() {
                if xi < 0.0 {
                    chol.mask(i)?;
                }
            }
        } else {
            debug!("Matrix is singular ({} dependent variables); starting with all variables masked", skipped);
            chol = MaskedCholesky::all_masked(self.m)?;
        }
        debug!("Active set starts with {} of {} variables masked", n - chol.nfree(), n);

        let mut x = vec![0.0; n];
        let mut outer = 0usize;
        let mut inner = 0usize;
        let mut released: Option<(usize, f64)> = None;

        loop {
            check(progress)?;
            outer += 1;
            if outer > self.params.max_iterations {
                return Err(SplitsError::Numerical(format!(
                    "active set did not converge in {} iterations",
                    self.params.max_iterations
                ))
                .into());
            }

            // Inner loop: move towards the masked solution until it is feasible.
            loop {
                inner += 1;
                let xstar = chol.solve(&rhs);
                if let Some((i, g)) = released.take() {
                    // A released variable with negative gradient must come back positive.
                    if !(xstar[i] > 0.0) {
                        return Err(SplitsError::Numerical(format!(
                            "variable {} released with gradient {:e} but solved to {:e}",
                            i, g, xstar[i]
                        ))
                        .into());
                    }
                }

                let mut t_min = f64::INFINITY;
                let mut hit = None;
                for i in 0..n {
                    if chol.is_masked(i) || xstar[i] >= -eps {
                        continue;
                    }
                    let t = (x[i] / (x[i] - xstar[i])).max(0.0);
                    if t < t_min {
                        t_min = t;
                        hit = Some(i);
                    }
                }

                match hit {
                    None => {
                        for i in 0..n {
                            x[i] = if chol.is_masked(i) { 0.0 } else { xstar[i].max(0.0) };
                        }
                        break;
                    }
                    Some(j) => {
                        for i in 0..n {
                            if !chol.is_masked(i) {
                                x[i] = (x[i] + t_min * (xstar[i] - x[i])).max(0.0);
                            }
                        }
                        x[j] = 0.0;
                        chol.mask(j)?;
                        trace!("Masked variable {} at step {:.6}", j, t_min);
                    }
                }
            }

            // Outer loop: KKT check on the masked variables. A candidate whose
            // column depends on the free set cannot be released; try the next.
            let grad = self.gradient(&x);
            let mut dependent = vec![false; n];
            loop {
                let mut worst = None;
                let mut g_min = -eps;
                for i in 0..n {
                    if chol.is_masked(i) && !dependent[i] && grad[i] < g_min {
                        g_min = grad[i];
                        worst = Some(i);
                    }
                }
                let Some(i) = worst else {
                    break;
                };
                match chol.try_unmask(i) {
                    Ok(()) => {
                        released = Some((i, g_min));
                        trace!("Released variable {} (gradient {:e})", i, g_min);
                        break;
                    }
                    Err(d2) => {
                        dependent[i] = true;
                        trace!("Variable {} not released: dependent on the free set (pivot {:e})", i, d2);
                    }
                }
            }

            if released.is_none() {
                let held = dependent.iter().filter(|&&d| d).count();
                debug!(
                    "Active set converged: {} outer / {} inner iterations, {} variables at zero ({} dependent)",
                    outer,
                    inner,
                    n - chol.nfree(),
                    held
                );
                let active = (0..n).map(|i| chol.is_masked(i)).collect();
                return Ok(ActiveSetSolution {
                    x: Array1::from(x),
                    active,
                    outer_iterations: outer,
                    inner_iterations: inner,
                });
            }
        }
    }

    /// `2(Mx − v)`
    fn gradient(&self, x: &[f64]) -> Array1<f64> {
        let x = Array1::from(x.to_vec());
        (self.m.dot(&x) - self.v) * 2.0
    }
}
