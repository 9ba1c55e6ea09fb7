use anyhow::{Context, Result};
use clap::Args;

use crate::algorithms::max_weight_clique::{Clique, circular_max_weight_clique, max_weight_clique};
use crate::analysis::{build_compatibility_graph, compute_circular_ordering, is_fully_compatible};
use crate::data::split_system::{Compatibility, SplitSystem};
use crate::progress::Progress;

#[derive(Args, Clone, Debug, Default)]
pub struct ClosestTreeParams {
    /// Exhaustive clique search without the remaining-weight bound.
    #[arg(long, default_value = "false")]
    pub unbounded: bool,
    /// Never use the circular interval algorithm, even on circular systems.
    #[arg(long, default_value = "false")]
    pub no_circular: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosestTreeStrategy {
    AlreadyCompatible,
    Circular,
    BranchAndBound,
}

impl ClosestTreeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosestTreeStrategy::AlreadyCompatible => "already-compatible",
            ClosestTreeStrategy::Circular => "circular",
            ClosestTreeStrategy::BranchAndBound => "branch-and-bound",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClosestTreeResult {
    /// Copy of the input in which every removed split has weight 0. Marked
    /// compatible: the splits left with positive weight are pairwise
    /// compatible.
    pub splits: SplitSystem,
    /// 0-based indices of the removed splits.
    pub removed: Vec<usize>,
    /// `sqrt(Σ w²)` over the removed splits.
    pub distance: f64,
    pub strategy: ClosestTreeStrategy,
}

impl ClosestTreeResult {
    /// The compatible subsystem: removed splits dropped, marked compatible.
    pub fn tree(&self) -> Result<SplitSystem> {
        let kept = self
            .splits
            .splits()
            .enumerate()
            .filter(|(i, _)| self.removed.binary_search(i).is_err())
            .map(|(_, s)| s.clone())
            .collect();
        let mut tree = SplitSystem::from_splits(self.splits.ntax(), kept)?;
        tree.set_compatibility(Compatibility::Compatible);
        Ok(tree)
    }
}

/// Maximum-weight compatible subset, with squared split weights as vertex
/// weights. The input is left untouched.
pub fn closest_tree(
    system: &SplitSystem,
    params: &ClosestTreeParams,
    progress: Option<&dyn Progress>,
) -> Result<ClosestTreeResult> {
    if let Some(p) = progress {
        p.begin_task("Closest tree");
    }
    let mut work = system.clone();
    if is_fully_compatible(&work) {
        work.set_compatibility(Compatibility::Compatible);
        return Ok(ClosestTreeResult {
            splits: work,
            removed: Vec::new(),
            distance: 0.0,
            strategy: ClosestTreeStrategy::AlreadyCompatible,
        });
    }

    let weights: Vec<f64> = work.splits().map(|s| s.weight() * s.weight()).collect();
    let cycle = if params.no_circular {
        None
    } else {
        compute_circular_ordering(&work)
    };
    let (clique, strategy): (Clique, _) = match cycle {
        Some(cycle) => {
            if let Some(p) = progress {
                p.subtask("interval dynamic program");
            }
            let clique = circular_max_weight_clique(&work, &cycle, &weights, progress)
                .context("circular closest tree")?;
            (clique, ClosestTreeStrategy::Circular)
        }
        None => {
            if let Some(p) = progress {
                p.subtask("branch and bound");
            }
            let graph = build_compatibility_graph(&work);
            let clique = max_weight_clique(&graph, &weights, !params.unbounded, progress)
                .context("closest tree search")?;
            (clique, ClosestTreeStrategy::BranchAndBound)
        }
    };

    let mut removed = Vec::with_capacity(work.nsplits() - clique.vertices.len());
    let mut kept = clique.vertices.iter().peekable();
    for i in 0..work.nsplits() {
        if kept.peek() == Some(&&i) {
            kept.next();
        } else {
            removed.push(i);
        }
    }
    let distance = removed.iter().map(|&i| weights[i]).sum::<f64>().sqrt();
    for &i in &removed {
        work.set_weight(i + 1, 0.0)?;
    }
    work.set_compatibility(Compatibility::Compatible);
    info!(
        "Closest tree ({}): kept {} of {} splits, distance {:.6}",
        strategy.as_str(),
        clique.vertices.len(),
        work.nsplits(),
        distance
    );
    Ok(ClosestTreeResult {
        splits: work,
        removed,
        distance,
        strategy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_utils::{random_system, system_from};
    use crate::progress::CancellationFlag;
    use crate::error::is_cancelled;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn compatible_input_is_returned_unchanged() {
        let sys = system_from(5, &[(&[1, 2], 1.0), (&[4, 5], 2.0), (&[3], 0.5)]);
        let r = closest_tree(&sys, &ClosestTreeParams::default(), None).unwrap();
        assert_eq!(r.strategy, ClosestTreeStrategy::AlreadyCompatible);
        assert_eq!(r.distance, 0.0);
        assert!(r.removed.is_empty());
        assert_eq!(r.splits.total_weight(), sys.total_weight());
    }

    #[test]
    fn conflicting_quartet_splits() {
        // Three resolutions of a quartet: not circular, keep the heaviest.
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 3.0), (&[1, 4], 2.0)]);
        let r = closest_tree(&sys, &ClosestTreeParams::default(), None).unwrap();
        assert_eq!(r.strategy, ClosestTreeStrategy::BranchAndBound);
        assert_eq!(r.removed, vec![0, 2]);
        assert!((r.distance - 5f64.sqrt()).abs() < 1e-12);
        assert_eq!(r.splits.get(1).weight(), 0.0);
        assert_eq!(r.splits.get(2).weight(), 3.0);
        assert_eq!(r.splits.compatibility(), Compatibility::Compatible);
        // Input untouched.
        assert_eq!(sys.get(1).weight(), 1.0);
    }

    #[test]
    fn circular_input_uses_interval_algorithm() {
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[2, 3], 2.0), (&[1], 0.5)]);
        let r = closest_tree(&sys, &ClosestTreeParams::default(), None).unwrap();
        assert_eq!(r.strategy, ClosestTreeStrategy::Circular);
        assert_eq!(r.removed, vec![0]);
        let forced = ClosestTreeParams {
            no_circular: true,
            ..Default::default()
        };
        let g = closest_tree(&sys, &forced, None).unwrap();
        assert_eq!(g.strategy, ClosestTreeStrategy::BranchAndBound);
        assert_eq!(g.removed, r.removed);
    }

    #[test]
    fn output_is_compatible_and_distance_matches() {
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..20 {
            let sys = random_system(&mut rng, 6, 9);
            for unbounded in [false, true] {
                let params = ClosestTreeParams {
                    unbounded,
                    no_circular: false,
                };
                let r = closest_tree(&sys, &params, None).unwrap();
                let tree = r.tree().unwrap();
                assert!(is_fully_compatible(&tree));
                let expected: f64 = r
                    .removed
                    .iter()
                    .map(|&i| sys.get_splits()[i].weight().powi(2))
                    .sum::<f64>()
                    .sqrt();
                assert!((r.distance - expected).abs() < 1e-12);
                for &i in &r.removed {
                    assert_eq!(r.splits.get_splits()[i].weight(), 0.0);
                }
            }
        }
    }

    #[test]
    fn cancelled_search_leaves_input_untouched() {
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 3.0), (&[1, 4], 2.0)]);
        let flag = CancellationFlag::new();
        flag.cancel();
        let err = closest_tree(&sys, &ClosestTreeParams::default(), Some(&flag)).unwrap_err();
        assert!(is_cancelled(&err));
        assert_eq!(sys.total_weight(), 6.0);
    }
}
