use anyhow::Result;

use crate::data::split_system::{Compatibility, SplitSystem};
use crate::progress::{Progress, check};
use crate::splits::weighted_split::WeightedSplit;

/// Greedy compatible subset: scan by decreasing weight (input order on ties)
/// and keep each split that is compatible with everything kept so far.
///
/// The output holds the accepted splits in scan order.
pub fn greedy_compatible(system: &SplitSystem, progress: Option<&dyn Progress>) -> Result<SplitSystem> {
    if let Some(p) = progress {
        p.begin_task("Greedy compatible");
        p.set_maximum_progress(system.nsplits() as u64);
    }
    let splits = system.get_splits();
    let mut order: Vec<usize> = (0..splits.len()).collect();
    // Stable, so equal weights keep input order.
    order.sort_by(|&a, &b| splits[b].weight().total_cmp(&splits[a].weight()));

    let mut accepted: Vec<WeightedSplit> = Vec::new();
    for (n, &i) in order.iter().enumerate() {
        check(progress)?;
        if let Some(p) = progress {
            p.set_progress(n as u64);
        }
        let candidate = &splits[i];
        if accepted.iter().all(|s| s.is_compatible_with(candidate)) {
            accepted.push(candidate.clone());
        } else {
            trace!("Rejected split {} ({})", i + 1, candidate);
        }
    }
    debug!("Greedy compatible: kept {} of {} splits", accepted.len(), splits.len());

    let mut out = SplitSystem::from_splits(system.ntax(), accepted)?;
    out.set_compatibility(Compatibility::Compatible);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::is_fully_compatible;
    use crate::analysis::test_utils::{random_system, system_from};
    use crate::error::is_cancelled;
    use crate::progress::CancellationFlag;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn heaviest_first_without_backtracking() {
        // {1,3} is heaviest and blocks {1,2}; {1} fits with both.
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 2.0), (&[1], 1.0)]);
        let out = greedy_compatible(&sys, None).unwrap();
        let weights: Vec<f64> = out.splits().map(|s| s.weight()).collect();
        assert_eq!(weights, vec![2.0, 1.0]);
        assert_eq!(out.get(1), sys.get(2));
        assert_eq!(out.get(2), sys.get(3));
        assert_eq!(out.compatibility(), Compatibility::Compatible);
    }

    #[test]
    fn ties_keep_input_order() {
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0)]);
        let out = greedy_compatible(&sys, None).unwrap();
        assert_eq!(out.nsplits(), 1);
        assert_eq!(out.get(1), sys.get(1));
    }

    #[test]
    fn output_is_compatible_weight_sorted_subsequence() {
        let mut rng = StdRng::seed_from_u64(41);
        for _ in 0..20 {
            let sys = random_system(&mut rng, 7, 15);
            let out = greedy_compatible(&sys, None).unwrap();
            assert!(is_fully_compatible(&out));
            let mut sorted: Vec<&WeightedSplit> = sys.splits().collect();
            sorted.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
            let mut it = sorted.iter();
            for s in out.splits() {
                assert!(it.any(|t| *t == s && t.weight() == s.weight()));
            }
        }
    }

    #[test]
    fn cancellation() {
        let sys = system_from(4, &[(&[1, 2], 1.0)]);
        let flag = CancellationFlag::new();
        flag.cancel();
        assert!(is_cancelled(&greedy_compatible(&sys, Some(&flag)).unwrap_err()));
    }
}
