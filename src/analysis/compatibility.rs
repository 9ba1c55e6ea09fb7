use fixedbitset::FixedBitSet;

use crate::data::split_system::SplitSystem;
use crate::splits::bipartition::BiPartition;
use crate::splits::weighted_split::WeightedSplit;

/// Two splits are compatible iff one of their four part intersections is empty.
pub fn are_pair_compatible(a: &WeightedSplit, b: &WeightedSplit) -> bool {
    BiPartition::are_compatible(a.base(), b.base())
}

/// Every pair of splits is compatible, i.e. the system is a tree.
pub fn is_fully_compatible(system: &SplitSystem) -> bool {
    let splits = system.get_splits();
    for i in 0..splits.len() {
        for j in (i + 1)..splits.len() {
            if !are_pair_compatible(&splits[i], &splits[j]) {
                return false;
            }
        }
    }
    true
}

/// No triple of splits realizes a forbidden weak-compatibility pattern.
pub fn is_weakly_compatible(system: &SplitSystem) -> bool {
    let splits = system.get_splits();
    let k = splits.len();
    for i in 0..k {
        for j in (i + 1)..k {
            // A compatible pair cannot take part in a forbidden triple.
            if are_pair_compatible(&splits[i], &splits[j]) {
                continue;
            }
            for l in (j + 1)..k {
                if !BiPartition::are_weakly_compatible(splits[i].base(), splits[j].base(), splits[l].base()) {
                    return false;
                }
            }
        }
    }
    true
}

/// Compatibility graph: one vertex per split (0-based, in system order), an
/// edge between every compatible pair. Rows are adjacency bitsets; the diagonal
/// is clear.
#[derive(Debug, Clone)]
pub struct CompatibilityGraph {
    adjacency: Vec<FixedBitSet>,
}

impl CompatibilityGraph {
    pub fn nvertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_adjacent(&self, u: usize, v: usize) -> bool {
        self.adjacency[u].contains(v)
    }

    pub fn neighbours(&self, v: usize) -> &FixedBitSet {
        &self.adjacency[v]
    }

    pub fn nedges(&self) -> usize {
        self.adjacency.iter().map(|r| r.count_ones(..)).sum::<usize>() / 2
    }

    /// Is every pair of vertices in `clique` adjacent?
    pub fn is_clique(&self, clique: &[usize]) -> bool {
        clique
            .iter()
            .enumerate()
            .all(|(i, &u)| clique[i + 1..].iter().all(|&v| self.is_adjacent(u, v)))
    }
}

pub fn build_compatibility_graph(system: &SplitSystem) -> CompatibilityGraph {
    let splits = system.get_splits();
    let k = splits.len();
    let mut adjacency = vec![FixedBitSet::with_capacity(k); k];
    for i in 0..k {
        for j in (i + 1)..k {
            if are_pair_compatible(&splits[i], &splits[j]) {
                adjacency[i].insert(j);
                adjacency[j].insert(i);
            }
        }
    }
    CompatibilityGraph { adjacency }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_utils::{random_system, system_from};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn pair_compatibility_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let sys = random_system(&mut rng, 7, 12);
            for a in sys.splits() {
                for b in sys.splits() {
                    assert_eq!(are_pair_compatible(a, b), are_pair_compatible(b, a));
                }
            }
        }
    }

    #[test]
    fn tree_is_fully_compatible() {
        let sys = system_from(6, &[(&[1], 1.0), (&[1, 2], 1.0), (&[1, 2, 3], 1.0), (&[5, 6], 1.0)]);
        assert!(is_fully_compatible(&sys));
        assert!(is_weakly_compatible(&sys));
    }

    #[test]
    fn three_quartet_resolutions_are_not_weakly_compatible() {
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0), (&[1, 4], 1.0)]);
        assert!(!is_fully_compatible(&sys));
        assert!(!is_weakly_compatible(&sys));
    }

    #[test]
    fn graph_edges_follow_compatibility() {
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0), (&[1], 1.0)]);
        let g = build_compatibility_graph(&sys);
        assert_eq!(g.nvertices(), 3);
        assert!(!g.is_adjacent(0, 1));
        assert!(g.is_adjacent(0, 2) && g.is_adjacent(2, 0));
        assert!(g.is_adjacent(1, 2));
        assert!(!g.is_adjacent(2, 2));
        assert_eq!(g.nedges(), 2);
        assert!(g.is_clique(&[0, 2]));
        assert!(!g.is_clique(&[0, 1, 2]));
    }
}
