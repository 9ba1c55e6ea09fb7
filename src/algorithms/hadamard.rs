//! Fast Walsh–Hadamard transform.
//!
//! Entry `k` of a length `2^m` vector stands for the subset of `m` items whose
//! bits are set in `k`. The transform is its own inverse up to a factor of
//! `1/len`.

use anyhow::Result;

use crate::error::SplitsError;

/// Forward transform. `Ok(None)` for an empty input; a length that is not a
/// power of two is an error.
pub fn compute(x: &[f64]) -> Result<Option<Vec<f64>>> {
    if x.is_empty() {
        return Ok(None);
    }
    let mut y = x.to_vec();
    compute_in_place(&mut y)?;
    Ok(Some(y))
}

/// Inverse transform: forward transform scaled by `1/len`.
pub fn compute_inverse(x: &[f64]) -> Result<Option<Vec<f64>>> {
    if x.is_empty() {
        return Ok(None);
    }
    let mut y = x.to_vec();
    compute_inverse_in_place(&mut y)?;
    Ok(Some(y))
}

/// Radix-2 butterflies: at each stage the pairs `(i, i + step)` become their
/// sum and difference; `step` doubles until it reaches the length.
pub fn compute_in_place(x: &mut [f64]) -> Result<()> {
    check_len(x.len())?;
    let len = x.len();
    let mut step = 1;
    while step < len {
        for block in (0..len).step_by(2 * step) {
            for i in block..block + step {
                let (a, b) = (x[i], x[i + step]);
                x[i] = a + b;
                x[i + step] = a - b;
            }
        }
        step *= 2;
    }
    Ok(())
}

pub fn compute_inverse_in_place(x: &mut [f64]) -> Result<()> {
    compute_in_place(x)?;
    let scale = 1.0 / x.len() as f64;
    x.iter_mut().for_each(|v| *v *= scale);
    Ok(())
}

fn check_len(len: usize) -> Result<()> {
    if len == 0 || !len.is_power_of_two() {
        return Err(SplitsError::InvalidInput(format!(
            "Hadamard transform needs a power-of-two length, got {}",
            len
        ))
        .into());
    }
    Ok(())
}
