pub mod bipartition;
pub mod taxa_set;
pub mod weighted_split;

pub use bipartition::BiPartition;
pub use taxa_set::TaxaSet;
pub use weighted_split::WeightedSplit;
