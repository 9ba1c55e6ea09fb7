use anyhow::Result;
use std::fmt::{self, Display};

use crate::error::SplitsError;

/// Resolved quartet topology `{a1,a2 | b1,b2}`.
///
/// Ids are plain `usize` rather than bounded by an `ntax`, since coalescent
/// agglomeration introduces composite taxa beyond the original range.
#[derive(Debug, Clone, PartialEq)]
pub struct Quartet {
    a: [usize; 2],
    b: [usize; 2],
    weight: f64,
    label: Option<String>,
}

impl Quartet {
    pub fn new(a1: usize, a2: usize, b1: usize, b2: usize) -> Result<Self> {
        Self::new_full([a1, a2], [b1, b2], 1.0, None)
    }

    pub fn new_full(a: [usize; 2], b: [usize; 2], weight: f64, label: Option<String>) -> Result<Self> {
        let ids = [a[0], a[1], b[0], b[1]];
        for i in 0..4 {
            if ids[i] == 0 {
                return Err(SplitsError::InvalidInput(format!("quartet {:?}|{:?} uses taxon 0", a, b)).into());
            }
            for j in (i + 1)..4 {
                if ids[i] == ids[j] {
                    return Err(SplitsError::InvalidInput(format!(
                        "quartet {:?}|{:?} repeats taxon {}",
                        a, b, ids[i]
                    ))
                    .into());
                }
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(SplitsError::InvalidInput(format!("quartet weight {} is not a non-negative number", weight)).into());
        }
        Ok(Self { a, b, weight, label })
    }

    pub fn a(&self) -> [usize; 2] {
        self.a
    }

    pub fn b(&self) -> [usize; 2] {
        self.b
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn taxa(&self) -> [usize; 4] {
        [self.a[0], self.a[1], self.b[0], self.b[1]]
    }

    pub fn contains(&self, t: usize) -> bool {
        self.taxa().contains(&t)
    }

    /// `x` and `y` both appear and lie on different pairs.
    pub fn separates(&self, x: usize, y: usize) -> bool {
        (self.a.contains(&x) && self.b.contains(&y)) || (self.b.contains(&x) && self.a.contains(&y))
    }

    /// `x` and `y` form one of the two pairs.
    pub fn same_side(&self, x: usize, y: usize) -> bool {
        (self.a.contains(&x) && self.a.contains(&y)) || (self.b.contains(&x) && self.b.contains(&y))
    }

    /// Rename taxon `from` to `to` wherever it occurs.
    pub fn replace(&mut self, from: usize, to: usize) {
        for t in self.a.iter_mut().chain(self.b.iter_mut()) {
            if *t == from {
                *t = to;
            }
        }
    }

    /// Largest id used.
    pub fn max_taxon(&self) -> usize {
        self.taxa().into_iter().max().unwrap_or(0)
    }
}

impl Display for Quartet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} | {},{}", self.a[0], self.a[1], self.b[0], self.b[1])
    }
}

/// Unordered collection of quartets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuartetSet {
    quartets: Vec<Quartet>,
}

impl QuartetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_quartets(quartets: Vec<Quartet>) -> Self {
        Self { quartets }
    }

    pub fn push(&mut self, q: Quartet) {
        self.quartets.push(q);
    }

    pub fn len(&self) -> usize {
        self.quartets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quartets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quartet> {
        self.quartets.iter()
    }

    pub fn retain<F: FnMut(&Quartet) -> bool>(&mut self, f: F) {
        self.quartets.retain(f);
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Quartet> {
        self.quartets.iter_mut()
    }

    /// Every id must lie in `1..=ntax`.
    pub fn validate(&self, ntax: usize) -> Result<()> {
        for q in &self.quartets {
            if let Some(t) = q.taxa().into_iter().find(|&t| t > ntax) {
                return Err(SplitsError::TaxonOutOfRange { taxon: t, ntax }.into());
            }
        }
        Ok(())
    }
}
