use anyhow::Result;
use fixedbitset::FixedBitSet;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use crate::error::SplitsError;

/// Set of taxa over `1..=ntax`.
///
/// Backed by a `FixedBitSet` of length `ntax + 1` with bit 0 never set, so
/// taxon ids index the bits directly. Sets built over the same `ntax` always
/// have identical bit lengths, which keeps the word-level set operations of
/// `FixedBitSet` valid.
#[derive(Debug, Clone)]
pub struct TaxaSet {
    bits: FixedBitSet,
    ntax: usize,
}

impl TaxaSet {
    /// Empty set over `1..=ntax`.
    pub fn new(ntax: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(ntax + 1),
            ntax,
        }
    }

    /// Full set `{1..ntax}`.
    pub fn full(ntax: usize) -> Self {
        let mut s = Self::new(ntax);
        s.bits.insert_range(1..ntax + 1);
        s
    }

    /// Build from taxon ids; fails on any id outside `1..=ntax`.
    pub fn from_taxa<I>(ntax: usize, taxa: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut s = Self::new(ntax);
        for t in taxa {
            s.insert(t)?;
        }
        Ok(s)
    }

    pub fn ntax(&self) -> usize {
        self.ntax
    }

    pub fn insert(&mut self, taxon: usize) -> Result<()> {
        self.check(taxon)?;
        self.bits.insert(taxon);
        Ok(())
    }

    pub fn remove(&mut self, taxon: usize) {
        if taxon >= 1 && taxon <= self.ntax {
            self.bits.set(taxon, false);
        }
    }

    pub fn contains(&self, taxon: usize) -> bool {
        taxon >= 1 && taxon <= self.ntax && self.bits.contains(taxon)
    }

    pub fn cardinality(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    pub fn is_full(&self) -> bool {
        self.cardinality() == self.ntax
    }

    /// Ascending taxon ids.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    pub fn first(&self) -> Option<usize> {
        self.bits.ones().next()
    }

    pub fn union(&self, other: &TaxaSet) -> TaxaSet {
        debug_assert_eq!(self.ntax, other.ntax);
        let mut out = self.clone();
        out.bits.union_with(&other.bits);
        out
    }

    pub fn intersection(&self, other: &TaxaSet) -> TaxaSet {
        debug_assert_eq!(self.ntax, other.ntax);
        let mut out = self.clone();
        out.bits.intersect_with(&other.bits);
        out
    }

    /// Complement relative to `1..=ntax`.
    pub fn complement(&self) -> TaxaSet {
        let mut out = Self::full(self.ntax);
        out.bits.difference_with(&self.bits);
        out
    }

    pub fn union_with(&mut self, other: &TaxaSet) {
        debug_assert_eq!(self.ntax, other.ntax);
        self.bits.union_with(&other.bits);
    }

    pub fn intersects(&self, other: &TaxaSet) -> bool {
        !self.bits.is_disjoint(&other.bits)
    }

    pub fn is_subset(&self, other: &TaxaSet) -> bool {
        self.bits.is_subset(&other.bits)
    }

    /// Raw bits (length `ntax + 1`, bit 0 clear).
    pub fn as_bitset(&self) -> &FixedBitSet {
        &self.bits
    }

    fn check(&self, taxon: usize) -> Result<()> {
        if taxon == 0 || taxon > self.ntax {
            return Err(SplitsError::TaxonOutOfRange {
                taxon,
                ntax: self.ntax,
            }
            .into());
        }
        Ok(())
    }
}

impl PartialEq for TaxaSet {
    fn eq(&self, other: &Self) -> bool {
        self.ntax == other.ntax && self.bits == other.bits
    }
}
impl Eq for TaxaSet {}

impl Hash for TaxaSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ntax.hash(state);
        for t in self.bits.ones() {
            t.hash(state);
        }
    }
}

impl PartialOrd for TaxaSet {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaxaSet {
    /// Lexicographic on the ascending element lists.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bits.ones().cmp(other.bits.ones())
    }
}

impl Display for TaxaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|t| t.to_string()).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}
