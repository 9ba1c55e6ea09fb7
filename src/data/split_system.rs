use anyhow::Result;
use fixedbitset::FixedBitSet;

use crate::error::SplitsError;
use crate::splits::weighted_split::WeightedSplit;

/// Value meaning "not computed" for the fit properties.
pub const NOT_COMPUTED: f64 = -1.0;

/// Compatibility class of a split system, from most to least tree-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compatibility {
    #[default]
    Unknown,
    Compatible,
    Cyclic,
    WeaklyCompatible,
    Incompatible,
}

impl Compatibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compatibility::Unknown => "unknown",
            Compatibility::Compatible => "compatible",
            Compatibility::Cyclic => "cyclic",
            Compatibility::WeaklyCompatible => "weakly compatible",
            Compatibility::Incompatible => "incompatible",
        }
    }
}

/// Ordered splits over a shared `ntax`, plus cached derived properties.
///
/// Changing the split list drops the cached compatibility class, the cycle
/// and the fits. Changing a weight drops only the fits.
#[derive(Debug, Clone)]
pub struct SplitSystem {
    ntax: usize,
    splits: Vec<WeightedSplit>,
    compatibility: Compatibility,
    fit: f64,
    ls_fit: f64,
    partial: bool,
    cycle: Option<Vec<usize>>,
}

impl SplitSystem {
    pub fn new(ntax: usize) -> Self {
        Self {
            ntax,
            splits: Vec::new(),
            compatibility: Compatibility::Unknown,
            fit: NOT_COMPUTED,
            ls_fit: NOT_COMPUTED,
            partial: false,
            cycle: None,
        }
    }

    pub fn from_splits(ntax: usize, splits: Vec<WeightedSplit>) -> Result<Self> {
        let mut s = Self::new(ntax);
        for sp in splits {
            s.push(sp)?;
        }
        Ok(s)
    }

    pub fn ntax(&self) -> usize {
        self.ntax
    }

    pub fn nsplits(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn splits(&self) -> impl Iterator<Item = &WeightedSplit> {
        self.splits.iter()
    }

    pub fn get_splits(&self) -> &[WeightedSplit] {
        &self.splits
    }

    /// 1-based accessor (panics if out of range).
    pub fn get(&self, i: usize) -> &WeightedSplit {
        &self.splits[i - 1]
    }

    /// Append a split; returns its 1-based id.
    pub fn push(&mut self, s: WeightedSplit) -> Result<usize> {
        if s.ntax() != self.ntax {
            return Err(SplitsError::InvalidSplit(format!(
                "split {} is over {} taxa, system has {}",
                s,
                s.ntax(),
                self.ntax
            ))
            .into());
        }
        self.splits.push(s);
        self.invalidate_structure();
        Ok(self.splits.len())
    }

    /// Remove and return the split with 1-based id `i`.
    pub fn remove(&mut self, i: usize) -> Result<WeightedSplit> {
        if i == 0 || i > self.splits.len() {
            return Err(SplitsError::InvalidInput(format!("no split {} in a system of {}", i, self.splits.len())).into());
        }
        let s = self.splits.remove(i - 1);
        self.invalidate_structure();
        Ok(s)
    }

    /// Set the weight of split `i` (1-based).
    pub fn set_weight(&mut self, i: usize, w: f64) -> Result<()> {
        if i == 0 || i > self.splits.len() {
            return Err(SplitsError::InvalidInput(format!("no split {} in a system of {}", i, self.splits.len())).into());
        }
        self.splits[i - 1].set_weight(w)?;
        self.invalidate_fit();
        Ok(())
    }

    pub fn total_weight(&self) -> f64 {
        self.splits.iter().map(|s| s.weight()).sum()
    }

    /// 1-based id of the split equal (as a bipartition) to `target`.
    pub fn index_of(&self, target: &WeightedSplit) -> Option<usize> {
        self.splits.iter().position(|s| s == target).map(|i| i + 1)
    }

    pub fn has_confidence_values(&self) -> bool {
        self.splits.iter().any(|s| s.confidence().is_some())
    }

    /* -------- properties -------- */

    pub fn compatibility(&self) -> Compatibility {
        self.compatibility
    }
    pub fn set_compatibility(&mut self, c: Compatibility) {
        self.compatibility = c;
    }

    pub fn fit(&self) -> f64 {
        self.fit
    }
    pub fn ls_fit(&self) -> f64 {
        self.ls_fit
    }
    pub fn set_fits(&mut self, fit: f64, ls_fit: f64) {
        self.fit = fit;
        self.ls_fit = ls_fit;
    }

    pub fn partial(&self) -> bool {
        self.partial
    }
    pub fn set_partial(&mut self, partial: bool) {
        self.partial = partial;
    }

    /// Circular ordering, a permutation of `1..=ntax` starting at taxon 1.
    pub fn cycle(&self) -> Option<&[usize]> {
        self.cycle.as_deref()
    }

    /// Store a circular ordering, rotated so that it starts at taxon 1.
    pub fn set_cycle(&mut self, cycle: Vec<usize>) -> Result<()> {
        self.cycle = Some(normalize_cycle(&cycle, self.ntax)?);
        Ok(())
    }

    pub fn clear_cycle(&mut self) {
        self.cycle = None;
    }

    fn invalidate_structure(&mut self) {
        self.compatibility = Compatibility::Unknown;
        self.cycle = None;
        self.invalidate_fit();
    }

    fn invalidate_fit(&mut self) {
        self.fit = NOT_COMPUTED;
        self.ls_fit = NOT_COMPUTED;
    }
}

/// Check that `cycle` is a permutation of `1..=ntax` and rotate it to start at 1.
pub fn normalize_cycle(cycle: &[usize], ntax: usize) -> Result<Vec<usize>> {
    if cycle.len() != ntax {
        return Err(SplitsError::InvalidInput(format!(
            "cycle has {} entries, expected {}",
            cycle.len(),
            ntax
        ))
        .into());
    }
    let mut seen = FixedBitSet::with_capacity(ntax + 1);
    for &t in cycle {
        if t == 0 || t > ntax {
            return Err(SplitsError::TaxonOutOfRange { taxon: t, ntax }.into());
        }
        if seen.put(t) {
            return Err(SplitsError::InvalidInput(format!("cycle repeats taxon {}", t)).into());
        }
    }
    let mut out = cycle.to_vec();
    if let Some(p) = out.iter().position(|&t| t == 1) {
        out.rotate_left(p);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_split(ntax: usize, a: &[usize], w: f64) -> WeightedSplit {
        WeightedSplit::from_taxa(ntax, a.iter().copied(), w).unwrap()
    }

    #[test]
    fn push_is_one_based_and_checks_ntax() {
        let mut sb = SplitSystem::new(4);
        assert_eq!(sb.push(mk_split(4, &[1, 2], 1.0)).unwrap(), 1);
        assert_eq!(sb.push(mk_split(4, &[3], 0.5)).unwrap(), 2);
        assert_eq!(sb.get(2).weight(), 0.5);
        assert!(sb.push(mk_split(5, &[1, 2], 1.0)).is_err());
        assert_eq!(sb.index_of(&mk_split(4, &[3, 4], 9.0)), Some(1));
        assert_eq!(sb.total_weight(), 1.5);
    }

    #[test]
    fn mutation_invalidates_cached_properties() {
        let mut sb = SplitSystem::from_splits(4, vec![mk_split(4, &[1, 2], 1.0)]).unwrap();
        sb.set_compatibility(Compatibility::Compatible);
        sb.set_cycle(vec![3, 4, 1, 2]).unwrap();
        sb.set_fits(90.0, 80.0);

        sb.set_weight(1, 2.0).unwrap();
        assert_eq!(sb.compatibility(), Compatibility::Compatible);
        assert!(sb.cycle().is_some());
        assert_eq!(sb.fit(), NOT_COMPUTED);

        sb.set_fits(90.0, 80.0);
        sb.push(mk_split(4, &[1, 3], 1.0)).unwrap();
        assert_eq!(sb.compatibility(), Compatibility::Unknown);
        assert!(sb.cycle().is_none());
        assert_eq!(sb.ls_fit(), NOT_COMPUTED);
    }

    #[test]
    fn cycle_is_normalized_and_validated() {
        let mut sb = SplitSystem::new(4);
        sb.set_cycle(vec![3, 4, 1, 2]).unwrap();
        assert_eq!(sb.cycle().unwrap(), &[1, 2, 3, 4]);
        assert!(sb.set_cycle(vec![1, 2, 2, 4]).is_err());
        assert!(sb.set_cycle(vec![1, 2, 3]).is_err());
        assert!(sb.set_cycle(vec![1, 2, 3, 5]).is_err());
    }

    #[test]
    fn remove_and_bad_ids() {
        let mut sb = SplitSystem::from_splits(4, vec![mk_split(4, &[1, 2], 1.0), mk_split(4, &[1], 1.0)]).unwrap();
        assert!(sb.remove(0).is_err());
        assert!(sb.set_weight(3, 1.0).is_err());
        let err = sb.set_weight(0, 1.0).unwrap_err();
        assert_eq!(crate::error::kind_of(&err), Some(crate::error::ErrorKind::Domain));
        assert_eq!(sb.get(1).weight(), 1.0);
        let s = sb.remove(1).unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(sb.nsplits(), 1);
    }
}
