use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::data::quartets::QuartetSet;
use crate::data::split_system::SplitSystem;
use crate::progress::{Progress, check};
use crate::splits::taxa_set::TaxaSet;
use crate::splits::weighted_split::WeightedSplit;

/// How the agglomeration ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Merged down to three taxa: the splits describe a binary tree.
    Complete,
    /// Every pair of the `remaining` taxa is separated by some quartet.
    NoCherryFound { remaining: usize },
}

#[derive(Clone, Debug)]
pub struct CoalescentResult {
    pub splits: SplitSystem,
    pub resolution: Resolution,
}

/// First pair `(x, y)` of `valid` (ascending ids, scanned by `x` then `y`)
/// that no quartet places on opposite sides.
pub fn find_cherry(valid: &[usize], quartets: &QuartetSet) -> Option<(usize, usize)> {
    let mut separated: HashSet<(usize, usize)> = HashSet::with_capacity(4 * quartets.len());
    for q in quartets.iter() {
        for a in q.a() {
            for b in q.b() {
                separated.insert((a.min(b), a.max(b)));
            }
        }
    }
    for (i, &x) in valid.iter().enumerate() {
        for &y in &valid[i + 1..] {
            if !separated.contains(&(x.min(y), x.max(y))) {
                return Some((x, y));
            }
        }
    }
    None
}

/// Build a tree from quartet topologies by repeatedly merging cherries.
///
/// Starts from the trivial splits. Each cherry `(x, y)` becomes a composite
/// taxon `z` (ids `ntax+1, ntax+2, …`) standing for the union of their
/// original taxa, and that union is emitted as a split. Quartets with `x` and
/// `y` on the same side are dropped; the rest have `x`/`y` renamed to `z`.
/// Stops at three taxa, or early when no pair is free of conflicts, in which
/// case the result is marked partial.
pub fn coalescent(
    ntax: usize,
    quartets: &QuartetSet,
    progress: Option<&dyn Progress>,
) -> Result<CoalescentResult> {
    quartets.validate(ntax).context("checking quartets")?;
    if let Some(p) = progress {
        p.begin_task("Coalescent");
        p.set_maximum_progress(ntax.saturating_sub(3) as u64);
    }

    let mut splits = SplitSystem::new(ntax);
    // members[t]: original taxa behind taxon t; index 0 unused.
    let mut members: Vec<TaxaSet> = vec![TaxaSet::new(ntax)];
    for t in 1..=ntax {
        let single = TaxaSet::from_taxa(ntax, [t])?;
        splits.push(WeightedSplit::new(single.clone())?)?;
        members.push(single);
    }

    let mut work = quartets.clone();
    let mut valid: Vec<usize> = (1..=ntax).collect();
    let mut merges = 0u64;
    let resolution = loop {
        if valid.len() < 4 {
            break Resolution::Complete;
        }
        check(progress)?;
        let Some((x, y)) = find_cherry(&valid, &work) else {
            break Resolution::NoCherryFound {
                remaining: valid.len(),
            };
        };

        let z = members.len();
        let union = members[x].union(&members[y]);
        trace!("Cherry ({}, {}) -> {} = {}", x, y, z, union);
        splits.push(WeightedSplit::new(union.clone())?)?;
        members.push(union);

        work.retain(|q| !q.same_side(x, y));
        for q in work.iter_mut() {
            q.replace(x, z);
            q.replace(y, z);
        }
        valid.retain(|&t| t != x && t != y);
        valid.push(z);

        merges += 1;
        if let Some(p) = progress {
            p.set_progress(merges);
        }
    };

    if let Resolution::NoCherryFound { remaining } = resolution {
        warn!(
            "Coalescent stopped with {} unresolved taxa: no cherry found, tree is partial",
            remaining
        );
        splits.set_partial(true);
    } else {
        debug!("Coalescent: {} merges over {} quartets", merges, quartets.len());
    }
    Ok(CoalescentResult { splits, resolution })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::is_fully_compatible;
    use crate::analysis::test_utils::random_tree;
    use crate::data::quartets::Quartet;
    use crate::splits::bipartition::BiPartition;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn quartets(list: &[[usize; 4]]) -> QuartetSet {
        QuartetSet::from_quartets(
            list.iter()
                .map(|q| Quartet::new(q[0], q[1], q[2], q[3]).unwrap())
                .collect(),
        )
    }

    fn non_trivial(system: &SplitSystem) -> HashSet<BiPartition> {
        system
            .splits()
            .filter(|s| !s.is_trivial())
            .map(|s| s.base().clone())
            .collect()
    }

    /// Every quartet topology displayed by a compatible system.
    fn induced_quartets(tree: &SplitSystem) -> QuartetSet {
        let n = tree.ntax();
        let mut out = QuartetSet::new();
        for a in 1..=n {
            for b in (a + 1)..=n {
                for c in (b + 1)..=n {
                    for d in (c + 1)..=n {
                        for [p, q, r, s] in [[a, b, c, d], [a, c, b, d], [a, d, b, c]] {
                            let shown = tree.splits().any(|sp| {
                                !sp.separates(p, q) && !sp.separates(r, s) && sp.separates(p, r)
                            });
                            if shown {
                                out.push(Quartet::new(p, q, r, s).unwrap());
                            }
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn five_taxon_tree_is_reproduced() {
        // ((1,2),3,(4,5))
        let q = quartets(&[[1, 2, 3, 4], [1, 2, 3, 5], [1, 2, 4, 5], [1, 3, 4, 5], [2, 3, 4, 5]]);
        let r = coalescent(5, &q, None).unwrap();
        assert_eq!(r.resolution, Resolution::Complete);
        assert!(!r.splits.partial());
        assert_eq!(r.splits.nsplits(), 7);
        let expected: HashSet<BiPartition> = [
            BiPartition::from_taxa(5, [1, 2]).unwrap(),
            BiPartition::from_taxa(5, [4, 5]).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(non_trivial(&r.splits), expected);
    }

    #[test]
    fn cherry_scan_order() {
        let q = quartets(&[[1, 2, 3, 4], [1, 2, 3, 5], [1, 2, 4, 5], [1, 3, 4, 5], [2, 3, 4, 5]]);
        assert_eq!(find_cherry(&[1, 2, 3, 4, 5], &q), Some((1, 2)));
        assert_eq!(find_cherry(&[3, 4, 5], &q), Some((4, 5)));
        // No quartets: the first pair is free.
        assert_eq!(find_cherry(&[2, 7, 9], &QuartetSet::new()), Some((2, 7)));
    }

    #[test]
    fn conflicting_quartets_stop_early() {
        let q = quartets(&[[1, 2, 3, 4], [1, 3, 2, 4], [1, 4, 2, 3]]);
        let r = coalescent(4, &q, None).unwrap();
        assert_eq!(r.resolution, Resolution::NoCherryFound { remaining: 4 });
        assert!(r.splits.partial());
        assert_eq!(r.splits.nsplits(), 4);
        // Input quartets are untouched.
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn random_binary_trees_are_recovered() {
        let mut rng = StdRng::seed_from_u64(53);
        for n in [4usize, 6, 8, 9] {
            let tree = random_tree(&mut rng, n);
            let r = coalescent(n, &induced_quartets(&tree), None).unwrap();
            assert_eq!(r.resolution, Resolution::Complete);
            assert_eq!(r.splits.nsplits(), n + n - 3);
            assert!(is_fully_compatible(&r.splits));
            assert_eq!(non_trivial(&r.splits), non_trivial(&tree));
        }
    }

    #[test]
    fn out_of_range_quartet_is_a_domain_error() {
        let q = quartets(&[[1, 2, 3, 9]]);
        let err = coalescent(5, &q, None).unwrap_err();
        assert_eq!(crate::error::kind_of(&err), Some(crate::error::ErrorKind::Domain));
    }
}
