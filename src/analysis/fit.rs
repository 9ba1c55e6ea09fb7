use ndarray::Array2;

use crate::data::distances::DistanceMatrix;
use crate::data::split_system::{NOT_COMPUTED, SplitSystem};

/// Split-induced distances: `S[i,j]` = sum of the weights of the splits
/// separating taxa `i+1` and `j+1` (0-based n×n, symmetric).
pub fn split_distances(system: &SplitSystem) -> Array2<f64> {
    let n = system.ntax();
    let mut m = Array2::<f64>::zeros((n, n));
    for s in system.splits() {
        let w = s.weight();
        if w == 0.0 {
            continue;
        }
        for i1 in s.side().iter() {
            for j1 in s.rest().iter() {
                m[[i1 - 1, j1 - 1]] += w;
                m[[j1 - 1, i1 - 1]] += w;
            }
        }
    }
    m
}

/// Compare the split-induced distances `s` with `d` over all pairs `i<j`.
///
/// Returns `(fit, ls_fit)` as percentages:
///   fit    = 100 · (Σ d·s)² / (Σ d² · Σ s²)
///   ls_fit = 100 · (1 − Σ (s − d)² / Σ d²)
/// Either is `NOT_COMPUTED` (−1) when undefined: taxon counts differ, a
/// distance is missing, or a denominator vanishes.
pub fn compute_fit(system: &SplitSystem, distances: &DistanceMatrix) -> (f64, f64) {
    let n = system.ntax();
    if distances.ntax() != n || n < 2 {
        return (NOT_COMPUTED, NOT_COMPUTED);
    }
    let s = split_distances(system);
    let d = distances.as_array();

    let (mut sum_ds, mut sum_dd, mut sum_ss, mut sum_diff) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        // Sum each row separately, then add.
        let (mut r_ds, mut r_dd, mut r_ss, mut r_diff) = (0.0, 0.0, 0.0, 0.0);
        for j in (i + 1)..n {
            let (dij, sij) = (d[[i, j]], s[[i, j]]);
            if dij.is_nan() {
                return (NOT_COMPUTED, NOT_COMPUTED);
            }
            r_ds += dij * sij;
            r_dd += dij * dij;
            r_ss += sij * sij;
            r_diff += (sij - dij) * (sij - dij);
        }
        sum_ds += r_ds;
        sum_dd += r_dd;
        sum_ss += r_ss;
        sum_diff += r_diff;
    }

    if sum_dd <= 0.0 {
        return (NOT_COMPUTED, NOT_COMPUTED);
    }
    let fit = if sum_ss > 0.0 {
        100.0 * sum_ds * sum_ds / (sum_dd * sum_ss)
    } else {
        NOT_COMPUTED
    };
    // Can go negative for a very poor fit; clamp so the property stays a valid value.
    let ls_fit = (100.0 * (1.0 - sum_diff / sum_dd)).max(0.0);
    (fit, ls_fit)
}

/// Compute both fit values and store them on the system.
pub fn update_fit(system: &mut SplitSystem, distances: &DistanceMatrix) -> (f64, f64) {
    let (fit, ls_fit) = compute_fit(system, distances);
    system.set_fits(fit, ls_fit);
    (fit, ls_fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_utils::system_from;

    /// Distance matrix induced by a split system.
    fn distances_from_splits(system: &SplitSystem) -> DistanceMatrix {
        DistanceMatrix::from_array(split_distances(system)).unwrap()
    }

    #[test]
    fn perfect_fit() {
        let sys = system_from(6, &[(&[1, 2], 1.0), (&[2, 3, 4], 0.7), (&[5], 0.4)]);
        let d = distances_from_splits(&sys);
        let (fit, ls_fit) = compute_fit(&sys, &d);
        assert!((fit - 100.0).abs() < 1e-9, "fit was {fit}");
        assert!((ls_fit - 100.0).abs() < 1e-9, "ls fit was {ls_fit}");
    }

    #[test]
    fn imperfect_fit_with_noise() {
        let sys = system_from(6, &[(&[1, 2], 1.0), (&[2, 3, 4], 0.7), (&[5], 0.4)]);
        let mut raw = split_distances(&sys);
        for i in 0..6 {
            for j in (i + 1)..6 {
                raw[[i, j]] += 0.01 * ((i + j) as f64);
                raw[[j, i]] = raw[[i, j]];
            }
        }
        let d = DistanceMatrix::from_array(raw).unwrap();
        let (fit, ls_fit) = compute_fit(&sys, &d);
        assert!(fit < 100.0 && fit > 0.0, "fit should drop below 100, got {fit}");
        assert!(ls_fit < 100.0 && ls_fit > 0.0, "ls fit should drop below 100, got {ls_fit}");
    }

    #[test]
    fn not_computable_cases() {
        let sys = system_from(3, &[(&[1], 1.0)]);
        let nan = f64::NAN;
        let missing = DistanceMatrix::from_rows(&[vec![0.0, 1.0, nan], vec![1.0, 0.0, 1.0], vec![nan, 1.0, 0.0]]).unwrap();
        assert_eq!(compute_fit(&sys, &missing), (NOT_COMPUTED, NOT_COMPUTED));

        let zero = DistanceMatrix::from_array(Array2::zeros((3, 3))).unwrap();
        assert_eq!(compute_fit(&sys, &zero), (NOT_COMPUTED, NOT_COMPUTED));

        let other = DistanceMatrix::from_array(Array2::zeros((4, 4))).unwrap();
        assert_eq!(compute_fit(&sys, &other), (NOT_COMPUTED, NOT_COMPUTED));
    }

    #[test]
    fn update_stores_values() {
        let mut sys = system_from(4, &[(&[1, 2], 2.0)]);
        let d = distances_from_splits(&sys);
        update_fit(&mut sys, &d);
        assert!((sys.fit() - 100.0).abs() < 1e-9);
        assert!((sys.ls_fit() - 100.0).abs() < 1e-9);
    }
}
