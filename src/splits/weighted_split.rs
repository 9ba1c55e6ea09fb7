use anyhow::Result;

use crate::error::SplitsError;
use crate::splits::bipartition::BiPartition;
use crate::splits::taxa_set::TaxaSet;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

/// Confidence value meaning "not set".
pub const NO_CONFIDENCE: f64 = -1.0;

/// A split with weight/confidence/label on top of `BiPartition`.
#[derive(Debug, Clone)]
pub struct WeightedSplit {
    base: BiPartition,
    weight: f64,
    confidence: f64,
    label: Option<String>,
}

impl WeightedSplit {
    /* -------- constructors -------- */

    /// Weight 1, no confidence, no label.
    pub fn new(part: TaxaSet) -> Result<Self> {
        Self::new_full(part, 1.0, NO_CONFIDENCE, None)
    }

    pub fn new_with_weight(part: TaxaSet, weight: f64) -> Result<Self> {
        Self::new_full(part, weight, NO_CONFIDENCE, None)
    }

    /// `part` may be either side of the bipartition.
    pub fn new_full(
        part: TaxaSet,
        weight: f64,
        confidence: f64,
        label: Option<String>,
    ) -> Result<Self> {
        Self::from_bipartition(BiPartition::new(part)?, weight, confidence, label)
    }

    pub fn from_bipartition(
        base: BiPartition,
        weight: f64,
        confidence: f64,
        label: Option<String>,
    ) -> Result<Self> {
        check_weight(weight)?;
        Ok(Self {
            base,
            weight,
            confidence,
            label,
        })
    }

    /// Part given as taxon ids.
    pub fn from_taxa<I>(ntax: usize, taxa: I, weight: f64) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        Self::new_with_weight(TaxaSet::from_taxa(ntax, taxa)?, weight)
    }

    /* -------- getters / setters -------- */

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, w: f64) -> Result<()> {
        check_weight(w)?;
        self.weight = w;
        Ok(())
    }

    pub fn confidence(&self) -> Option<f64> {
        if self.confidence == NO_CONFIDENCE {
            None
        } else {
            Some(self.confidence)
        }
    }

    pub fn set_confidence(&mut self, c: f64) {
        self.confidence = c;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label<S: Into<String>>(&mut self, s: S) {
        self.label = Some(s.into());
    }

    /* -------- BiPartition delegation -------- */

    pub fn side(&self) -> &TaxaSet {
        self.base.side()
    }
    pub fn rest(&self) -> &TaxaSet {
        self.base.rest()
    }
    pub fn ntax(&self) -> usize {
        self.base.ntax()
    }
    pub fn size(&self) -> usize {
        self.base.size()
    }
    pub fn smaller_part(&self) -> &TaxaSet {
        self.base.smaller_part()
    }
    pub fn part_not_containing(&self, t: usize) -> &TaxaSet {
        self.base.part_not_containing(t)
    }
    pub fn is_trivial(&self) -> bool {
        self.base.is_trivial()
    }
    pub fn separates(&self, a: usize, b: usize) -> bool {
        self.base.separates(a, b)
    }

    pub fn base(&self) -> &BiPartition {
        &self.base
    }

    pub fn is_compatible_with(&self, other: &WeightedSplit) -> bool {
        BiPartition::are_compatible(&self.base, &other.base)
    }
}

fn check_weight(w: f64) -> Result<()> {
    if !w.is_finite() || w < 0.0 {
        return Err(SplitsError::InvalidSplit(format!("weight {} is not a non-negative number", w)).into());
    }
    Ok(())
}

/* -------- Equality / Hash / Display -------- */

impl PartialEq for WeightedSplit {
    /// Equality depends only on the partition.
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
    }
}
impl Eq for WeightedSplit {}

impl Hash for WeightedSplit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
    }
}

impl Display for WeightedSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} weight={}", self.base, self.weight)?;
        if let Some(c) = self.confidence() {
            write!(f, " confidence={}", c)?;
        }
        if let Some(l) = &self.label {
            write!(f, " label={}", l)?;
        }
        Ok(())
    }
}
