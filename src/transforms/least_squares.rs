use anyhow::{Context, Result, ensure};
use ndarray::{Array1, Array2};

use crate::analysis::update_fit;
use crate::data::distances::DistanceMatrix;
use crate::data::split_system::SplitSystem;
use crate::error::SplitsError;
use crate::progress::Progress;
use crate::weights::active_set::{ActiveSetParams, ActiveSetSolver};

/// Pair–split incidence matrix: one row per taxon pair `i < j` (in
/// lexicographic order), one column per split, 1 where the split separates
/// the pair.
pub fn design_matrix(system: &SplitSystem) -> Array2<f64> {
    let n = system.ntax();
    let npairs = n * n.saturating_sub(1) / 2;
    let mut x = Array2::<f64>::zeros((npairs, system.nsplits()));
    let mut row = 0;
    for i in 1..=n {
        for j in (i + 1)..=n {
            for (c, s) in system.splits().enumerate() {
                if s.separates(i, j) {
                    x[[row, c]] = 1.0;
                }
            }
            row += 1;
        }
    }
    x
}

/// Least-squares split weights for a fixed set of splits.
///
/// Solves the normal equations `XᵀX w = Xᵀd` with the active-set solver
/// (`w ≥ 0` unless the unconstrained mode is selected), writes the weights
/// into a copy of `system`, drops non-trivial splits with weight ≤ cutoff and
/// stores both fit values.
pub fn least_squares_weights(
    system: &SplitSystem,
    distances: &DistanceMatrix,
    params: &ActiveSetParams,
    progress: Option<&dyn Progress>,
) -> Result<SplitSystem> {
    let n = system.ntax();
    ensure!(
        distances.ntax() == n,
        SplitsError::InvalidInput(format!(
            "distance matrix is over {} taxa, splits over {}",
            distances.ntax(),
            n
        ))
    );
    let mut d = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 1..=n {
        for j in (i + 1)..=n {
            let dij = distances.get(i, j);
            ensure!(
                !dij.is_nan(),
                SplitsError::InvalidInput(format!("distance between taxa {} and {} is missing", i, j))
            );
            d.push(dij);
        }
    }
    if let Some(p) = progress {
        p.begin_task("Least squares split weights");
    }

    let x = design_matrix(system);
    let m = x.t().dot(&x);
    let v: Array1<f64> = x.t().dot(&Array1::from(d));
    let solver = ActiveSetSolver::new(&m, &v, params)?;
    let solution = solver.solve(progress).context("solving for split weights")?;
    debug!(
        "Split weights ({}): {} outer / {} inner iterations",
        params.mode.as_str(),
        solution.outer_iterations,
        solution.inner_iterations
    );

    let mut kept = Vec::with_capacity(system.nsplits());
    for (s, &w) in system.splits().zip(solution.x.iter()) {
        if w > params.cutoff || s.is_trivial() {
            let mut s = s.clone();
            s.set_weight(w.max(0.0))?;
            kept.push(s);
        }
    }
    let dropped = system.nsplits() - kept.len();
    if dropped > 0 {
        debug!("Dropped {} splits with weight <= {}", dropped, params.cutoff);
    }

    let mut out = SplitSystem::from_splits(n, kept)?;
    let (fit, ls_fit) = update_fit(&mut out, distances);
    info!(
        "Least squares: {} splits, fit {:.4} %, ls fit {:.4} %",
        out.nsplits(),
        fit,
        ls_fit
    );
    Ok(out)
}
