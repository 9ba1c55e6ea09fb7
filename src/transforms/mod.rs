//! Transforms that produce a split system from an input block.
//!
//! Each transform is a variant of [`SplitsTransform`] with a pure
//! applicability check and an `apply` that works on private copies, so a
//! failed or cancelled call never touches its inputs. [`registry`] lists the
//! transforms available for each kind of input block.

pub mod closest_tree;
pub mod coalescent;
pub mod greedy_compatible;
pub mod least_squares;
pub mod spectral;

use anyhow::{Context, Result, bail};

use crate::data::characters::CharacterMatrix;
use crate::data::distances::DistanceMatrix;
use crate::data::quartets::QuartetSet;
use crate::data::split_system::SplitSystem;
use crate::data::taxa::Taxa;
use crate::error::SplitsError;
use crate::progress::Progress;
use crate::transforms::closest_tree::ClosestTreeParams;
use crate::weights::active_set::ActiveSetParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Distances,
    Splits,
    Quartets,
    Characters,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Distances => "distances",
            BlockKind::Splits => "splits",
            BlockKind::Quartets => "quartets",
            BlockKind::Characters => "characters",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum InputBlock<'a> {
    Distances(&'a DistanceMatrix),
    Splits(&'a SplitSystem),
    Quartets(&'a QuartetSet),
    Characters(&'a CharacterMatrix),
}

impl InputBlock<'_> {
    pub fn kind(&self) -> BlockKind {
        match self {
            InputBlock::Distances(_) => BlockKind::Distances,
            InputBlock::Splits(_) => BlockKind::Splits,
            InputBlock::Quartets(_) => BlockKind::Quartets,
            InputBlock::Characters(_) => BlockKind::Characters,
        }
    }
}

/// Everything a transform reads besides its input block.
#[derive(Default)]
pub struct TransformContext<'a> {
    /// Distances over the same taxa, needed by least squares.
    pub distances: Option<&'a DistanceMatrix>,
    pub progress: Option<&'a dyn Progress>,
    pub active_set: ActiveSetParams,
    pub closest_tree: ClosestTreeParams,
    /// Smallest conjugated weight kept by the spectral transform.
    pub spectral_cutoff: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitsTransform {
    ClosestTree,
    GreedyCompatible,
    LeastSquares,
    Coalescent,
    Spectral,
}

const SPLITS_TRANSFORMS: [SplitsTransform; 3] = [
    SplitsTransform::ClosestTree,
    SplitsTransform::GreedyCompatible,
    SplitsTransform::LeastSquares,
];
const QUARTETS_TRANSFORMS: [SplitsTransform; 1] = [SplitsTransform::Coalescent];
const CHARACTERS_TRANSFORMS: [SplitsTransform; 1] = [SplitsTransform::Spectral];

/// Transforms accepting `kind`, in menu order.
pub fn registry(kind: BlockKind) -> &'static [SplitsTransform] {
    match kind {
        BlockKind::Splits => &SPLITS_TRANSFORMS,
        BlockKind::Quartets => &QUARTETS_TRANSFORMS,
        BlockKind::Characters => &CHARACTERS_TRANSFORMS,
        BlockKind::Distances => &[],
    }
}

impl SplitsTransform {
    pub fn name(&self) -> &'static str {
        match self {
            SplitsTransform::ClosestTree => "ClosestTree",
            SplitsTransform::GreedyCompatible => "GreedyCompatible",
            SplitsTransform::LeastSquares => "LeastSquares",
            SplitsTransform::Coalescent => "Coalescent",
            SplitsTransform::Spectral => "Spectral",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SplitsTransform::ClosestTree => {
                "Maximum-weight compatible subset of the splits; removed splits keep weight 0"
            }
            SplitsTransform::GreedyCompatible => {
                "Compatible subset chosen greedily by decreasing weight"
            }
            SplitsTransform::LeastSquares => {
                "Non-negative least-squares split weights fitted to a distance matrix"
            }
            SplitsTransform::Coalescent => "Tree built by merging cherries of a quartet set",
            SplitsTransform::Spectral => {
                "Split weights from binary characters by Hadamard conjugation"
            }
        }
    }

    pub fn input_kind(&self) -> BlockKind {
        match self {
            SplitsTransform::ClosestTree
            | SplitsTransform::GreedyCompatible
            | SplitsTransform::LeastSquares => BlockKind::Splits,
            SplitsTransform::Coalescent => BlockKind::Quartets,
            SplitsTransform::Spectral => BlockKind::Characters,
        }
    }

    /// Can `apply` run on these inputs? No side effects.
    pub fn is_applicable(&self, ctx: &TransformContext, taxa: &Taxa, input: &InputBlock) -> bool {
        self.unmet_requirement(ctx, taxa, input).is_none()
    }

    /// Run the transform. Inputs are never modified; fails with
    /// `SplitsError::NotApplicable` when `is_applicable` would be false.
    pub fn apply(&self, ctx: &TransformContext, taxa: &Taxa, input: &InputBlock) -> Result<SplitSystem> {
        if let Some(reason) = self.unmet_requirement(ctx, taxa, input) {
            bail!(SplitsError::NotApplicable {
                transform: self.name(),
                reason,
            });
        }
        let ntax = taxa.ntax();
        let out = match (self, input) {
            (SplitsTransform::ClosestTree, InputBlock::Splits(s)) => {
                closest_tree::closest_tree(s, &ctx.closest_tree, ctx.progress)?.splits
            }
            (SplitsTransform::GreedyCompatible, InputBlock::Splits(s)) => {
                greedy_compatible::greedy_compatible(s, ctx.progress)?
            }
            (SplitsTransform::LeastSquares, InputBlock::Splits(s)) => {
                let distances = ctx.distances.ok_or(SplitsError::NotApplicable {
                    transform: self.name(),
                    reason: "no distance matrix".to_string(),
                })?;
                least_squares::least_squares_weights(s, distances, &ctx.active_set, ctx.progress)?
            }
            (SplitsTransform::Coalescent, InputBlock::Quartets(q)) => {
                coalescent::coalescent(ntax, q, ctx.progress)?.splits
            }
            (SplitsTransform::Spectral, InputBlock::Characters(c)) => {
                let spectrum = spectral::spectrum_from_characters(c)?;
                spectral::spectrum_to_splits(ntax, &spectrum, ctx.spectral_cutoff)?
            }
            (t, i) => bail!(SplitsError::NotApplicable {
                transform: t.name(),
                reason: format!("cannot read a {} block", i.kind().as_str()),
            }),
        };
        Ok(out)
    }

    fn unmet_requirement(&self, ctx: &TransformContext, taxa: &Taxa, input: &InputBlock) -> Option<String> {
        let ntax = taxa.ntax();
        if input.kind() != self.input_kind() {
            return Some(format!(
                "expects a {} block, got {}",
                self.input_kind().as_str(),
                input.kind().as_str()
            ));
        }
        let block_ntax = match input {
            InputBlock::Distances(d) => d.ntax(),
            InputBlock::Splits(s) => s.ntax(),
            InputBlock::Characters(c) => c.ntax(),
            InputBlock::Quartets(q) => {
                return q
                    .validate(ntax)
                    .err()
                    .map(|e| format!("{:#}", e))
                    .or_else(|| (ntax < 2).then(|| format!("needs at least 2 taxa, got {}", ntax)));
            }
        };
        if block_ntax != ntax {
            return Some(format!("block has {} taxa, taxa block has {}", block_ntax, ntax));
        }
        match self {
            SplitsTransform::LeastSquares => match ctx.distances {
                None => Some("no distance matrix".to_string()),
                Some(d) if d.ntax() != ntax => {
                    Some(format!("distance matrix has {} taxa, taxa block has {}", d.ntax(), ntax))
                }
                Some(d) if d.has_missing() => Some("distance matrix has missing entries".to_string()),
                Some(_) => None,
            },
            SplitsTransform::Spectral => match input {
                InputBlock::Characters(c) if c.nchar() == 0 => Some("no characters".to_string()),
                _ if !(2..=spectral::MAX_TAXA).contains(&ntax) => {
                    Some(format!("needs 2..={} taxa, got {}", spectral::MAX_TAXA, ntax))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Apply `transform` and annotate failures with its name.
pub fn run_transform(
    transform: SplitsTransform,
    ctx: &TransformContext,
    taxa: &Taxa,
    input: &InputBlock,
) -> Result<SplitSystem> {
    transform
        .apply(ctx, taxa, input)
        .with_context(|| format!("running {}", transform.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_utils::system_from;
    use crate::data::quartets::Quartet;
    use crate::error::{ErrorKind, is_cancelled, kind_of};
    use crate::progress::CancellationFlag;
    use ndarray::arr2;

    fn distances() -> DistanceMatrix {
        DistanceMatrix::from_array(arr2(&[
            [0.0, 2.0, 5.0, 5.0],
            [2.0, 0.0, 5.0, 5.0],
            [5.0, 5.0, 0.0, 2.0],
            [5.0, 5.0, 2.0, 0.0],
        ]))
        .unwrap()
    }

    #[test]
    fn registry_lists_transforms_by_input() {
        for kind in [BlockKind::Splits, BlockKind::Quartets, BlockKind::Characters, BlockKind::Distances] {
            for t in registry(kind) {
                assert_eq!(t.input_kind(), kind);
                assert!(!t.description().is_empty());
            }
        }
        assert_eq!(registry(BlockKind::Splits).len(), 3);
        assert_eq!(registry(BlockKind::Quartets), &[SplitsTransform::Coalescent]);
    }

    #[test]
    fn least_squares_needs_distances() {
        let taxa = Taxa::with_default_labels(4);
        let sys = system_from(4, &[(&[1], 1.0), (&[2], 1.0), (&[3], 1.0), (&[4], 1.0), (&[1, 2], 1.0)]);
        let input = InputBlock::Splits(&sys);
        let t = SplitsTransform::LeastSquares;

        let bare = TransformContext::default();
        assert!(!t.is_applicable(&bare, &taxa, &input));
        let err = t.apply(&bare, &taxa, &input).unwrap_err();
        assert_eq!(kind_of(&err), Some(ErrorKind::Domain));

        let d = distances();
        let ctx = TransformContext {
            distances: Some(&d),
            ..Default::default()
        };
        assert!(t.is_applicable(&ctx, &taxa, &input));
        let out = run_transform(t, &ctx, &taxa, &input).unwrap();
        assert!((out.get(5).weight() - 3.0).abs() < 1e-9);
        assert!((out.ls_fit() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn wrong_block_or_taxa_is_not_applicable() {
        let taxa = Taxa::with_default_labels(5);
        let sys = system_from(4, &[(&[1, 2], 1.0)]);
        let ctx = TransformContext::default();
        assert!(!SplitsTransform::GreedyCompatible.is_applicable(&ctx, &taxa, &InputBlock::Splits(&sys)));
        let q = QuartetSet::from_quartets(vec![Quartet::new(1, 2, 3, 4).unwrap()]);
        assert!(!SplitsTransform::GreedyCompatible.is_applicable(&ctx, &taxa, &InputBlock::Quartets(&q)));
        assert!(SplitsTransform::Coalescent.is_applicable(&ctx, &taxa, &InputBlock::Quartets(&q)));
        let far = QuartetSet::from_quartets(vec![Quartet::new(1, 2, 3, 6).unwrap()]);
        assert!(!SplitsTransform::Coalescent.is_applicable(&ctx, &taxa, &InputBlock::Quartets(&far)));
    }

    #[test]
    fn cancellation_propagates_through_apply() {
        let taxa = Taxa::with_default_labels(4);
        let sys = system_from(4, &[(&[1, 2], 1.0), (&[1, 3], 3.0), (&[1, 4], 2.0)]);
        let flag = CancellationFlag::new();
        flag.cancel();
        let ctx = TransformContext {
            progress: Some(&flag),
            ..Default::default()
        };
        let err = run_transform(SplitsTransform::ClosestTree, &ctx, &taxa, &InputBlock::Splits(&sys)).unwrap_err();
        assert!(is_cancelled(&err));
        assert_eq!(sys.get(2).weight(), 3.0);
    }

    #[test]
    fn spectral_from_characters() {
        let taxa = Taxa::with_default_labels(4);
        // Mostly constant sites keep the transformed spectrum positive.
        let chars =
            CharacterMatrix::from_strings(&["1010000000", "0110000000", "0000000000", "0000000000"]).unwrap();
        let ctx = TransformContext::default();
        let t = SplitsTransform::Spectral;
        assert!(t.is_applicable(&ctx, &taxa, &InputBlock::Characters(&chars)));
        let out = t.apply(&ctx, &taxa, &InputBlock::Characters(&chars)).unwrap();
        assert!(!out.is_empty());
        assert!(out.splits().all(|s| s.weight() > 0.0));
    }
}
