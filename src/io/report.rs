use serde::Serialize;

use crate::data::split_system::{NOT_COMPUTED, SplitSystem};
use crate::data::taxa::Taxa;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SplitRecord {
    pub id: usize,
    /// Side not containing taxon 1.
    pub side: Vec<usize>,
    pub side_labels: Vec<String>,
    pub weight: f64,
    pub confidence: Option<f64>,
    pub label: Option<String>,
    pub trivial: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SystemRecord {
    pub ntax: usize,
    pub nsplits: usize,
    pub compatibility: String,
    /// `None` when not computed.
    pub fit: Option<f64>,
    pub ls_fit: Option<f64>,
    pub partial: bool,
    pub cycle: Option<Vec<usize>>,
    pub total_weight: f64,
    pub splits: Vec<SplitRecord>,
}

fn computed(v: f64) -> Option<f64> {
    (v != NOT_COMPUTED).then_some(v)
}

impl SystemRecord {
    pub fn new(system: &SplitSystem, taxa: &Taxa) -> Self {
        let splits = system
            .splits()
            .enumerate()
            .map(|(i, s)| {
                let side: Vec<usize> = s.side().iter().collect();
                SplitRecord {
                    id: i + 1,
                    side_labels: side
                        .iter()
                        .map(|&t| taxa.label(t).map_or_else(|| t.to_string(), str::to_string))
                        .collect(),
                    side,
                    weight: s.weight(),
                    confidence: s.confidence(),
                    label: s.label().map(str::to_string),
                    trivial: s.is_trivial(),
                }
            })
            .collect();
        Self {
            ntax: system.ntax(),
            nsplits: system.nsplits(),
            compatibility: system.compatibility().as_str().to_string(),
            fit: computed(system.fit()),
            ls_fit: computed(system.ls_fit()),
            partial: system.partial(),
            cycle: system.cycle().map(<[usize]>::to_vec),
            total_weight: system.total_weight(),
            splits,
        }
    }
}
