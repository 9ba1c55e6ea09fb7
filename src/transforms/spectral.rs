//! Hadamard conjugation between binary pattern spectra and split weights.
//!
//! Spectra and split-weight vectors have length `2^(ntax-1)`. Index `k`
//! encodes the taxa `b + 1` for every set bit `b`, i.e. a subset of
//! `1..ntax` that never holds the reference taxon `ntax`. As a split, index
//! `k` is the side opposite `ntax`; index 0 is the empty pattern.
//!
//! `q = H⁻¹ ln(H s)` and `s = H⁻¹ exp(H q)` with `q_0 = −Σ q_k`.

use anyhow::{Context, Result, ensure};

use crate::algorithms::hadamard;
use crate::data::characters::CharacterMatrix;
use crate::data::split_system::SplitSystem;
use crate::error::SplitsError;
use crate::splits::taxa_set::TaxaSet;
use crate::splits::weighted_split::WeightedSplit;

/// Vectors of length `2^(ntax-1)` stop being practical beyond this.
pub const MAX_TAXA: usize = 26;

fn spectrum_len(ntax: usize) -> Result<usize> {
    ensure!(
        (2..=MAX_TAXA).contains(&ntax),
        SplitsError::InvalidInput(format!(
            "spectral methods need 2..={} taxa, got {}",
            MAX_TAXA, ntax
        ))
    );
    Ok(1usize << (ntax - 1))
}

fn index_of(part: &TaxaSet) -> usize {
    part.iter().fold(0usize, |k, t| k | (1 << (t - 1)))
}

fn part_of(ntax: usize, k: usize) -> Result<TaxaSet> {
    TaxaSet::from_taxa(ntax, (0..ntax - 1).filter(|b| k & (1 << b) != 0).map(|b| b + 1))
}

/// Relative frequency of each pattern; a character's pattern is the set of
/// taxa whose state differs from that of taxon `ntax`.
pub fn spectrum_from_characters(chars: &CharacterMatrix) -> Result<Vec<f64>> {
    let ntax = chars.ntax();
    let len = spectrum_len(ntax)?;
    ensure!(
        chars.nchar() > 0,
        SplitsError::InvalidInput("character matrix has no characters".to_string())
    );
    let mut counts = vec![0usize; len];
    for c in 0..chars.nchar() {
        let reference = chars.state(ntax, c);
        let k = (1..ntax)
            .filter(|&t| chars.state(t, c) != reference)
            .fold(0usize, |k, t| k | (1 << (t - 1)));
        counts[k] += 1;
    }
    let total = chars.nchar() as f64;
    Ok(counts.into_iter().map(|n| n as f64 / total).collect())
}

/// Split weights by Hadamard conjugation; every pattern `k ≠ 0` with
/// `q_k > cutoff` becomes a split. `H s` must be strictly positive.
pub fn spectrum_to_splits(ntax: usize, spectrum: &[f64], cutoff: f64) -> Result<SplitSystem> {
    let len = spectrum_len(ntax)?;
    ensure!(
        spectrum.len() == len,
        SplitsError::InvalidInput(format!(
            "spectrum has {} entries, {} taxa need {}",
            spectrum.len(),
            ntax,
            len
        ))
    );
    let mut h = spectrum.to_vec();
    hadamard::compute_in_place(&mut h)?;
    if let Some((j, v)) = h.iter().enumerate().find(|(_, v)| !(**v > 0.0)) {
        return Err(SplitsError::InvalidInput(format!(
            "transformed spectrum is not positive at {} ({:e}); the data are saturated",
            j, v
        ))
        .into());
    }
    h.iter_mut().for_each(|v| *v = v.ln());
    hadamard::compute_inverse_in_place(&mut h)?;

    let mut system = SplitSystem::new(ntax);
    for (k, &q) in h.iter().enumerate().skip(1) {
        if q > cutoff {
            let split = WeightedSplit::new_with_weight(part_of(ntax, k)?, q)
                .with_context(|| format!("pattern {}", k))?;
            system.push(split)?;
        }
    }
    debug!("Hadamard conjugation: {} of {} patterns above {}", system.nsplits(), len - 1, cutoff);
    Ok(system)
}

/// Expected pattern spectrum of a split system, the inverse conjugation.
pub fn splits_to_spectrum(system: &SplitSystem) -> Result<Vec<f64>> {
    let ntax = system.ntax();
    let len = spectrum_len(ntax)?;
    let mut q = vec![0.0; len];
    for s in system.splits() {
        q[index_of(s.part_not_containing(ntax))] += s.weight();
    }
    q[0] = -q[1..].iter().sum::<f64>();
    hadamard::compute_in_place(&mut q)?;
    q.iter_mut().for_each(|v| *v = v.exp());
    hadamard::compute_inverse_in_place(&mut q)?;
    Ok(q)
}
