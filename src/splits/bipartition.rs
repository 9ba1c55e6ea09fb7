use anyhow::Result;
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use crate::error::SplitsError;
use crate::splits::taxa_set::TaxaSet;

/// Bipartition of `1..=ntax` into two non-empty parts.
///
/// The canonical `side` is the part that does *not* contain taxon 1, so every
/// bipartition has exactly one representation. `rest` is its complement and
/// always contains taxon 1.
#[derive(Debug, Clone)]
pub struct BiPartition {
    side: TaxaSet,
    rest: TaxaSet,
}

impl BiPartition {
    /// Build from either part; the other is its complement.
    pub fn new(part: TaxaSet) -> Result<Self> {
        let ntax = part.ntax();
        if part.is_empty() || part.is_full() {
            return Err(SplitsError::InvalidSplit(format!(
                "part {} leaves an empty side over {} taxa",
                part, ntax
            ))
            .into());
        }
        let other = part.complement();
        if part.contains(1) {
            Ok(Self {
                side: other,
                rest: part,
            })
        } else {
            Ok(Self {
                side: part,
                rest: other,
            })
        }
    }

    /// Convenience: part given as taxon ids.
    pub fn from_taxa<I>(ntax: usize, taxa: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        Self::new(TaxaSet::from_taxa(ntax, taxa)?)
    }

    pub fn ntax(&self) -> usize {
        self.side.ntax()
    }

    /// Part not containing taxon 1.
    pub fn side(&self) -> &TaxaSet {
        &self.side
    }

    /// Part containing taxon 1.
    pub fn rest(&self) -> &TaxaSet {
        &self.rest
    }

    /// Size of the smaller part.
    pub fn size(&self) -> usize {
        self.side.cardinality().min(self.rest.cardinality())
    }

    /// The smaller part; on a tie, the one holding the smallest taxon (i.e. `rest`).
    pub fn smaller_part(&self) -> &TaxaSet {
        match self.side.cardinality().cmp(&self.rest.cardinality()) {
            Ordering::Less => &self.side,
            _ => &self.rest,
        }
    }

    pub fn part_containing(&self, t: usize) -> &TaxaSet {
        if self.side.contains(t) { &self.side } else { &self.rest }
    }

    pub fn part_not_containing(&self, t: usize) -> &TaxaSet {
        if self.side.contains(t) { &self.rest } else { &self.side }
    }

    /// Smaller part has a single taxon.
    pub fn is_trivial(&self) -> bool {
        self.size() == 1
    }

    /// Are taxa `a` and `b` on different parts?
    pub fn separates(&self, a: usize, b: usize) -> bool {
        self.side.contains(a) != self.side.contains(b)
    }

    /// At least one of the four part intersections is empty.
    pub fn are_compatible(s1: &BiPartition, s2: &BiPartition) -> bool {
        !s1.side.intersects(&s2.side)
            || !s1.side.intersects(&s2.rest)
            || !s1.rest.intersects(&s2.side)
            || !s1.rest.intersects(&s2.rest)
    }

    /// Bandelt–Dress weak compatibility of three bipartitions: neither of the
    /// two forbidden four-way intersection patterns is realized.
    pub fn are_weakly_compatible(s1: &BiPartition, s2: &BiPartition, s3: &BiPartition) -> bool {
        let (a1, b1) = (&s1.side, &s1.rest);
        let (a2, b2) = (&s2.side, &s2.rest);
        let (a3, b3) = (&s3.side, &s3.rest);

        let bad1 = intersects3(a1, a2, a3)
            && intersects3(a1, b2, b3)
            && intersects3(b1, a2, b3)
            && intersects3(b1, b2, a3);

        let bad2 = intersects3(b1, b2, b3)
            && intersects3(b1, a2, a3)
            && intersects3(a1, b2, a3)
            && intersects3(a1, a2, b3);

        !(bad1 || bad2)
    }
}

impl PartialEq for BiPartition {
    fn eq(&self, other: &Self) -> bool {
        self.side == other.side
    }
}
impl Eq for BiPartition {}

impl Hash for BiPartition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.side.hash(state);
    }
}

impl PartialOrd for BiPartition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for BiPartition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ntax()
            .cmp(&other.ntax())
            .then_with(|| self.side.cmp(&other.side))
    }
}

impl Display for BiPartition {
    /// `{1,...} | {...}` with the part containing taxon 1 first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.rest, self.side)
    }
}

fn intersects3(a: &TaxaSet, b: &TaxaSet, c: &TaxaSet) -> bool {
    a.iter().any(|t| b.contains(t) && c.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(ntax: usize, part: &[usize]) -> BiPartition {
        BiPartition::from_taxa(ntax, part.iter().copied()).unwrap()
    }

    #[test]
    fn canonical_side_excludes_taxon_one() {
        let p = bp(5, &[1, 3]);
        assert_eq!(p.side().iter().collect::<Vec<_>>(), vec![2, 4, 5]);
        assert!(p.rest().contains(1));
        assert_eq!(p, bp(5, &[2, 4, 5]));
    }

    #[test]
    fn empty_or_full_side_is_rejected() {
        assert!(BiPartition::from_taxa(4, []).is_err());
        assert!(BiPartition::from_taxa(4, [1, 2, 3, 4]).is_err());
    }

    #[test]
    fn size_and_trivial() {
        let p = bp(4, &[1]);
        assert_eq!(p.ntax(), 4);
        assert_eq!(p.size(), 1);
        assert!(p.is_trivial());
        assert_eq!(p.smaller_part().iter().collect::<Vec<_>>(), vec![1]);
        assert!(!bp(4, &[1, 2]).is_trivial());
    }

    #[test]
    fn compatibility() {
        let p1 = bp(4, &[1, 2]);
        let p2 = bp(4, &[1, 3]);
        assert!(!BiPartition::are_compatible(&p1, &p2));
        assert!(!BiPartition::are_compatible(&p2, &p1));
        let p3 = bp(4, &[1]);
        assert!(BiPartition::are_compatible(&p1, &p3));
    }

    #[test]
    fn weak_compatibility_of_three_quartet_splits() {
        // The three resolutions of one quartet cannot coexist weakly.
        let p1 = bp(4, &[1, 2]);
        let p2 = bp(4, &[1, 3]);
        let p3 = bp(4, &[1, 4]);
        assert!(!BiPartition::are_weakly_compatible(&p1, &p2, &p3));
        // Two resolutions plus a trivial split are fine.
        let t = bp(4, &[2]);
        assert!(BiPartition::are_weakly_compatible(&p1, &p2, &t));
    }

    #[test]
    fn separates_and_display() {
        let p = bp(5, &[2, 4]);
        assert!(p.separates(1, 2));
        assert!(!p.separates(2, 4));
        assert_eq!(p.to_string(), "{1,3,5} | {2,4}");
    }
}
