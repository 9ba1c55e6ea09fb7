use anyhow::{Result, ensure};
use fixedbitset::FixedBitSet;
use ndarray::Array2;

use crate::analysis::compatibility::CompatibilityGraph;
use crate::data::split_system::SplitSystem;
use crate::error::SplitsError;
use crate::progress::{Progress, check};

/// Nodes visited between cancellation polls.
const POLL_INTERVAL: u64 = 4096;

#[derive(Debug, Clone, PartialEq)]
pub struct Clique {
    /// Vertices in ascending order.
    pub vertices: Vec<usize>,
    pub weight: f64,
}

/// Exact maximum-weight clique by depth-first branch and bound.
///
/// Vertices are branched on in ascending order and a clique only extends with
/// later adjacent vertices, so each clique is visited once. A new best is
/// recorded only when strictly heavier. With `bounded`, a branch is cut when
/// its weight plus all still-reachable candidate weight cannot beat the best;
/// such a branch can never produce a strict improvement, so the bounded and
/// the exhaustive search return the same clique.
///
/// Weights must be non-negative.
pub fn max_weight_clique(
    graph: &CompatibilityGraph,
    weights: &[f64],
    bounded: bool,
    progress: Option<&dyn Progress>,
) -> Result<Clique> {
    let k = graph.nvertices();
    debug_assert_eq!(weights.len(), k);

    let mut search = CliqueSearch {
        graph,
        weights,
        bounded,
        progress,
        current: Vec::with_capacity(k),
        best: Clique {
            vertices: Vec::new(),
            weight: 0.0,
        },
        nodes: 0,
    };

    if let Some(p) = progress {
        p.set_maximum_progress(k as u64);
    }
    for v in 0..k {
        check(progress)?;
        if let Some(p) = progress {
            p.set_progress(v as u64);
        }
        // Candidates for a clique whose smallest vertex is v.
        let mut candidates = graph.neighbours(v).clone();
        candidates.set_range(..v + 1, false);
        search.current.push(v);
        search.expand(weights[v], &candidates)?;
        search.current.pop();
    }
    debug!(
        "Max-weight clique: {} of {} vertices, weight {:.6}, {} nodes ({})",
        search.best.vertices.len(),
        k,
        search.best.weight,
        search.nodes,
        if bounded { "bounded" } else { "exhaustive" }
    );
    Ok(search.best)
}

struct CliqueSearch<'a> {
    graph: &'a CompatibilityGraph,
    weights: &'a [f64],
    bounded: bool,
    progress: Option<&'a dyn Progress>,
    current: Vec<usize>,
    best: Clique,
    nodes: u64,
}

impl CliqueSearch<'_> {
    fn expand(&mut self, weight: f64, candidates: &FixedBitSet) -> Result<()> {
        self.nodes += 1;
        if self.nodes % POLL_INTERVAL == 0 {
            check(self.progress)?;
        }
        if weight > self.best.weight {
            self.best = Clique {
                vertices: self.current.clone(),
                weight,
            };
        }

        let order: Vec<usize> = candidates.ones().collect();
        let mut reachable: f64 = order.iter().map(|&u| self.weights[u]).sum();
        for u in order {
            if self.bounded && weight + reachable <= self.best.weight {
                return Ok(());
            }
            reachable -= self.weights[u];

            let mut next = candidates.clone();
            next.intersect_with(self.graph.neighbours(u));
            next.set_range(..u + 1, false);

            self.current.push(u);
            self.expand(weight + self.weights[u], &next)?;
            self.current.pop();
        }
        Ok(())
    }
}

/// Marks a DP cell whose best family leaves the left position uncovered.
const SKIP_LEFT: usize = usize::MAX;

/// Maximum-weight compatible subset of a circular system by interval DP.
///
/// Under `cycle`, every split's part avoiding `cycle[0]` is an interval of
/// positions `1..n`. Two such splits are compatible exactly when their
/// intervals are nested or disjoint, so the problem becomes choosing a heaviest
/// laminar family of intervals:
///
/// `H(l, r) = w(l, r) + max(H(l + 1, r), max_{l <= k < r} H(l, k) + H(k + 1, r))`
///
/// Intervals carrying zero total weight are never selected. Runs in `O(n³)`.
pub fn circular_max_weight_clique(
    system: &SplitSystem,
    cycle: &[usize],
    weights: &[f64],
    progress: Option<&dyn Progress>,
) -> Result<Clique> {
    let n = system.ntax();
    ensure!(
        weights.len() == system.nsplits(),
        SplitsError::InvalidInput(format!(
            "{} weights for {} splits",
            weights.len(),
            system.nsplits()
        ))
    );
    ensure!(
        crate::analysis::is_circular_under(system, cycle),
        SplitsError::InvalidInput("splits are not arcs of the given cycle".to_string())
    );
    if n < 2 || system.is_empty() {
        return Ok(Clique {
            vertices: Vec::new(),
            weight: 0.0,
        });
    }

    let mut pos = vec![0usize; n + 1];
    for (p, &t) in cycle.iter().enumerate() {
        pos[t] = p;
    }

    // Splits grouped by interval; duplicates of a split are mutually compatible.
    let mut w = Array2::<f64>::zeros((n, n));
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n * n];
    for (i, s) in system.splits().enumerate() {
        let part = s.part_not_containing(cycle[0]);
        let (mut lo, mut hi) = (usize::MAX, 0usize);
        for t in part.iter() {
            lo = lo.min(pos[t]);
            hi = hi.max(pos[t]);
        }
        w[[lo, hi]] += weights[i];
        members[lo * n + hi].push(i);
    }

    // h[[l, r]] over positions 1..n; l > r is the empty interval.
    let mut h = Array2::<f64>::zeros((n + 1, n + 1));
    let mut choice = Array2::<usize>::from_elem((n + 1, n + 1), SKIP_LEFT);
    if let Some(p) = progress {
        p.set_maximum_progress(n as u64);
    }
    for len in 1..n {
        check(progress)?;
        if let Some(p) = progress {
            p.set_progress(len as u64);
        }
        for l in 1..=(n - len) {
            let r = l + len - 1;
            let mut best = if l < r { h[[l + 1, r]] } else { 0.0 };
            let mut arg = SKIP_LEFT;
            for k in l..r {
                let v = h[[l, k]] + h[[k + 1, r]];
                if v > best {
                    best = v;
                    arg = k;
                }
            }
            h[[l, r]] = w[[l, r]] + best;
            choice[[l, r]] = arg;
        }
    }

    let mut vertices = Vec::new();
    let mut stack = vec![(1usize, n - 1)];
    while let Some((l, r)) = stack.pop() {
        if l > r {
            continue;
        }
        if w[[l, r]] > 0.0 {
            vertices.extend_from_slice(&members[l * n + r]);
        }
        match choice[[l, r]] {
            SKIP_LEFT => stack.push((l + 1, r)),
            k => {
                stack.push((l, k));
                stack.push((k + 1, r));
            }
        }
    }
    vertices.sort_unstable();
    let weight = vertices.iter().map(|&i| weights[i]).sum();
    debug!(
        "Circular max-weight clique: {} of {} splits, weight {:.6}",
        vertices.len(),
        system.nsplits(),
        weight
    );
    Ok(Clique { vertices, weight })
}
