use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::data::characters::CharacterMatrix;
use crate::data::distances::DistanceMatrix;
use crate::data::quartets::{Quartet, QuartetSet};
use crate::data::split_system::SplitSystem;
use crate::data::taxa::Taxa;
use crate::error::SplitsError;
use crate::splits::taxa_set::TaxaSet;
use crate::splits::weighted_split::{NO_CONFIDENCE, WeightedSplit};

/// A taxon given either by 1-based id or by label.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TaxonRef {
    Id(usize),
    Label(String),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SplitSpec {
    /// Either side of the split.
    pub taxa: Vec<TaxonRef>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct QuartetSpec {
    pub a: [TaxonRef; 2],
    pub b: [TaxonRef; 2],
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_weight() -> f64 {
    1.0
}

/// JSON problem file: taxon labels plus any of the data blocks.
///
/// ```json
/// {
///   "taxa": ["a", "b", "c", "d"],
///   "distances": [[0, 2, 5, 5], [2, 0, 5, 5], [5, 5, 0, 2], [5, 5, 2, 0]],
///   "splits": [{"taxa": ["a", "b"], "weight": 1.0}],
///   "quartets": [{"a": [1, 2], "b": [3, 4]}],
///   "characters": ["0011", "0101", "1001", "0000"]
/// }
/// ```
///
/// A `null` distance is missing.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Problem {
    pub taxa: Vec<String>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub splits: Option<Vec<SplitSpec>>,
    #[serde(default)]
    pub quartets: Option<Vec<QuartetSpec>>,
    #[serde(default)]
    pub characters: Option<Vec<String>>,
    /// Circular ordering of the splits, by id or label.
    #[serde(default)]
    pub cycle: Option<Vec<TaxonRef>>,
}

/// Validated data blocks over one taxa block.
#[derive(Debug, Clone)]
pub struct Blocks {
    pub taxa: Taxa,
    pub distances: Option<DistanceMatrix>,
    pub splits: Option<SplitSystem>,
    pub quartets: Option<QuartetSet>,
    pub characters: Option<CharacterMatrix>,
}

impl Problem {
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading '{}'", path))?;
        Self::parse(&text).with_context(|| format!("parsing '{}'", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let problem: Problem = serde_json::from_str(text)?;
        Ok(problem)
    }

    pub fn into_blocks(self) -> Result<Blocks> {
        let taxa = Taxa::from_labels(self.taxa)?;
        let ntax = taxa.ntax();

        let distances = match self.distances {
            Some(rows) => {
                let rows: Vec<Vec<f64>> = rows
                    .into_iter()
                    .map(|r| r.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
                    .collect();
                let d = DistanceMatrix::from_rows(&rows).context("distances block")?;
                check_ntax("distances", d.ntax(), ntax)?;
                Some(d)
            }
            None => None,
        };

        let splits = match self.splits {
            Some(specs) => {
                let mut system = SplitSystem::new(ntax);
                for (i, entry) in specs.into_iter().enumerate() {
                    let split = entry
                        .into_split(&taxa)
                        .with_context(|| format!("split {}", i + 1))?;
                    system.push(split)?;
                }
                if let Some(cycle) = self.cycle {
                    let ids = cycle
                        .iter()
                        .map(|r| resolve(&taxa, r))
                        .collect::<Result<Vec<_>>>()
                        .context("cycle")?;
                    system.set_cycle(ids).context("cycle")?;
                }
                Some(system)
            }
            None => None,
        };

        let quartets = match self.quartets {
            Some(specs) => {
                let mut set = QuartetSet::new();
                for (i, entry) in specs.into_iter().enumerate() {
                    let q = entry
                        .into_quartet(&taxa)
                        .with_context(|| format!("quartet {}", i + 1))?;
                    set.push(q);
                }
                Some(set)
            }
            None => None,
        };

        let characters = match self.characters {
            Some(rows) => {
                let c = CharacterMatrix::from_strings(rows.as_slice()).context("characters block")?;
                check_ntax("characters", c.ntax(), ntax)?;
                Some(c)
            }
            None => None,
        };

        Ok(Blocks {
            taxa,
            distances,
            splits,
            quartets,
            characters,
        })
    }
}

impl SplitSpec {
    fn into_split(self, taxa: &Taxa) -> Result<WeightedSplit> {
        let mut part = TaxaSet::new(taxa.ntax());
        for r in &self.taxa {
            part.insert(resolve(taxa, r)?)?;
        }
        WeightedSplit::new_full(
            part,
            self.weight,
            self.confidence.unwrap_or(NO_CONFIDENCE),
            self.label,
        )
    }
}

impl QuartetSpec {
    fn into_quartet(self, taxa: &Taxa) -> Result<Quartet> {
        let a = [resolve(taxa, &self.a[0])?, resolve(taxa, &self.a[1])?];
        let b = [resolve(taxa, &self.b[0])?, resolve(taxa, &self.b[1])?];
        Quartet::new_full(a, b, self.weight, self.label)
    }
}

fn resolve(taxa: &Taxa, r: &TaxonRef) -> Result<usize> {
    match r {
        TaxonRef::Id(id) if (1..=taxa.ntax()).contains(id) => Ok(*id),
        TaxonRef::Id(id) => Err(SplitsError::TaxonOutOfRange {
            taxon: *id,
            ntax: taxa.ntax(),
        }
        .into()),
        TaxonRef::Label(l) => taxa
            .index_of(l)
            .ok_or_else(|| SplitsError::InvalidInput(format!("unknown taxon '{}'", l)).into()),
    }
}

fn check_ntax(block: &str, found: usize, ntax: usize) -> Result<()> {
    if found != ntax {
        return Err(SplitsError::InvalidInput(format!(
            "{} block has {} taxa, taxa block has {}",
            block, found, ntax
        ))
        .into());
    }
    Ok(())
}
