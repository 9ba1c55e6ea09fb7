use anyhow::{Result, ensure};
use ndarray::Array2;

use crate::error::SplitsError;

/// Binary character matrix, one row per taxon (row `i` is taxon `i + 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterMatrix {
    states: Array2<u8>,
}

impl CharacterMatrix {
    pub fn from_array(states: Array2<u8>) -> Result<Self> {
        if let Some(((i, j), v)) = states.indexed_iter().find(|(_, v)| **v > 1) {
            return Err(SplitsError::InvalidInput(format!(
                "character {} of taxon {} has state {}, only 0/1 are supported",
                j + 1,
                i + 1,
                v
            ))
            .into());
        }
        Ok(Self { states })
    }

    /// Rows of `0`/`1` strings, e.g. `["0011", "0101"]`.
    pub fn from_strings<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let ntax = rows.len();
        let nchar = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut states = Array2::<u8>::zeros((ntax, nchar));
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            ensure!(
                row.len() == nchar,
                SplitsError::InvalidInput(format!("taxon {} has {} characters, expected {}", i + 1, row.len(), nchar))
            );
            for (j, c) in row.chars().enumerate() {
                states[[i, j]] = match c {
                    '0' => 0,
                    '1' => 1,
                    other => {
                        return Err(SplitsError::InvalidInput(format!(
                            "character {} of taxon {} is '{}'",
                            j + 1,
                            i + 1,
                            other
                        ))
                        .into());
                    }
                };
            }
        }
        Self::from_array(states)
    }

    pub fn ntax(&self) -> usize {
        self.states.nrows()
    }

    pub fn nchar(&self) -> usize {
        self.states.ncols()
    }

    /// State of character `c` (0-based) for taxon `t` (1-based).
    pub fn state(&self, t: usize, c: usize) -> u8 {
        self.states[[t - 1, c]]
    }
}
