use fixedbitset::FixedBitSet;
use std::collections::HashSet;

use crate::data::split_system::SplitSystem;

/// Does a circular ordering exist under which every split is an arc?
pub fn is_cyclic(system: &SplitSystem) -> bool {
    compute_circular_ordering(system).is_some()
}

/// Is every split of `system` a contiguous arc of `cycle`?
///
/// `cycle` must be a permutation of `1..=ntax`; anything else yields false.
pub fn is_circular_under(system: &SplitSystem, cycle: &[usize]) -> bool {
    let ntax = system.ntax();
    if cycle.len() != ntax {
        return false;
    }
    let mut pos = vec![usize::MAX; ntax + 1];
    for (p, &t) in cycle.iter().enumerate() {
        if t == 0 || t > ntax || pos[t] != usize::MAX {
            return false;
        }
        pos[t] = p;
    }
    let anchor = cycle.first().copied().unwrap_or(1);
    system.splits().all(|s| {
        // The part not holding the first taxon of the cycle must be an interval.
        let part = s.part_not_containing(anchor);
        let (mut lo, mut hi, mut count) = (usize::MAX, 0usize, 0usize);
        for t in part.iter() {
            lo = lo.min(pos[t]);
            hi = hi.max(pos[t]);
            count += 1;
        }
        count > 0 && hi - lo + 1 == count
    })
}

/// Circular ordering of `1..=ntax`, starting at taxon 1, under which every split
/// side is an arc; `None` if the system is not circular.
///
/// Cutting the circle at taxon 1 turns the problem into ordering taxa
/// `2..=ntax` so that each canonical side (which never holds taxon 1) is an
/// interval. The order is built left to right: a side that has been started
/// but not finished is *open*, and the next taxon must belong to every open
/// side. Open sides must therefore be nested; a dead end is remembered by its
/// set of placed taxa, which fully determines the remaining constraints.
/// Candidates are tried in ascending taxon order, so the result is
/// deterministic. A cycle already stored on the system is returned as is when
/// it is still valid.
pub fn compute_circular_ordering(system: &SplitSystem) -> Option<Vec<usize>> {
    let ntax = system.ntax();
    if let Some(c) = system.cycle() {
        if is_circular_under(system, c) {
            return Some(c.to_vec());
        }
    }
    if ntax == 0 {
        return Some(Vec::new());
    }

    // Distinct sides only; trivial sides and duplicates add no constraints.
    let mut sides: Vec<FixedBitSet> = Vec::new();
    let mut seen: HashSet<FixedBitSet> = HashSet::new();
    for s in system.splits() {
        let side = s.side().as_bitset();
        let card = side.count_ones(..);
        if card <= 1 || card >= ntax - 1 {
            continue;
        }
        if seen.insert(side.clone()) {
            sides.push(side.clone());
        }
    }

    let mut search = OrderingSearch {
        ntax,
        sides,
        placed: FixedBitSet::with_capacity(ntax + 1),
        order: Vec::with_capacity(ntax),
        dead_ends: HashSet::new(),
    };
    search.placed.insert(1);
    search.order.push(1);
    if search.extend() {
        debug!("Circular ordering: {:?}", search.order);
        Some(search.order)
    } else {
        debug!("No circular ordering ({} dead ends)", search.dead_ends.len());
        None
    }
}

struct OrderingSearch {
    ntax: usize,
    sides: Vec<FixedBitSet>,
    placed: FixedBitSet,
    order: Vec<usize>,
    dead_ends: HashSet<FixedBitSet>,
}

impl OrderingSearch {
    fn extend(&mut self) -> bool {
        if self.order.len() == self.ntax {
            return true;
        }
        if self.dead_ends.contains(&self.placed) {
            return false;
        }

        let mut candidates = FixedBitSet::with_capacity(self.ntax + 1);
        candidates.insert_range(2..self.ntax + 1);
        candidates.difference_with(&self.placed);

        // Remaining members of each open side, which must be placed next.
        let mut open: Vec<FixedBitSet> = Vec::new();
        for side in &self.sides {
            if side.is_disjoint(&self.placed) || side.is_subset(&self.placed) {
                continue;
            }
            let mut remaining = side.clone();
            remaining.difference_with(&self.placed);
            candidates.intersect_with(&remaining);
            open.push(remaining);
        }

        // The open sides all end in the unplaced region, so they must be nested.
        let nested = open.iter().enumerate().all(|(i, a)| {
            open[i + 1..]
                .iter()
                .all(|b| a.is_subset(b) || b.is_subset(a))
        });

        if nested {
            let choices: Vec<usize> = candidates.ones().collect();
            for t in choices {
                self.placed.insert(t);
                self.order.push(t);
                if self.extend() {
                    return true;
                }
                self.order.pop();
                self.placed.set(t, false);
            }
        }

        self.dead_ends.insert(self.placed.clone());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compatibility::{is_fully_compatible, is_weakly_compatible};
    use crate::analysis::test_utils::{random_system, random_tree, system_from};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn circular_system_gets_an_ordering() {
        // Arcs of the cycle 1,3,2,5,4.
        let sys = system_from(5, &[(&[3, 2], 1.0), (&[2, 5], 1.0), (&[5, 4], 1.0), (&[3, 2, 5], 1.0)]);
        let cycle = compute_circular_ordering(&sys).expect("circular");
        assert_eq!(cycle[0], 1);
        assert!(is_circular_under(&sys, &cycle));
        assert!(is_cyclic(&sys));
        assert!(!is_circular_under(&sys, &[1, 2, 3, 4, 5]));
    }

    #[test]
    fn three_quartet_resolutions_are_not_circular() {
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 1.0), (&[1, 4], 1.0)]);
        assert!(compute_circular_ordering(&sys).is_none());
    }

    #[test]
    fn ordering_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let sys = random_system(&mut rng, 6, 5);
            assert_eq!(compute_circular_ordering(&sys), compute_circular_ordering(&sys));
        }
    }

    #[test]
    fn stored_cycle_is_reused() {
        let mut sys = system_from(4, &[(&[1, 3], 1.0)]);
        sys.set_cycle(vec![1, 3, 2, 4]).unwrap();
        assert_eq!(compute_circular_ordering(&sys).unwrap(), vec![1, 3, 2, 4]);
    }

    #[test]
    fn compatible_implies_cyclic_implies_weakly_compatible() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..25 {
            let tree = random_tree(&mut rng, 9);
            assert!(is_fully_compatible(&tree));
            let cycle = compute_circular_ordering(&tree).expect("trees are circular");
            assert!(is_circular_under(&tree, &cycle));

            let sys = random_system(&mut rng, 7, 6);
            if is_cyclic(&sys) {
                assert!(is_weakly_compatible(&sys));
            }
        }
    }
}
