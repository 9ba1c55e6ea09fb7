//! Error payloads carried inside `anyhow::Error`.
//!
//! Every fallible operation in the crate returns `anyhow::Result`; the
//! [`SplitsError`] payload lets callers tell the three failure kinds apart
//! (cancellation, domain validation, numerical breakdown) even after context
//! layers have been added on the way up.

use std::error::Error;
use std::fmt;

/// Broad classification of a [`SplitsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Cancellation,
    Domain,
    Numerical,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitsError {
    /// Host requested an abort; nothing was committed.
    Cancelled,
    /// A taxon id outside `1..=ntax`.
    TaxonOutOfRange { taxon: usize, ntax: usize },
    /// Empty/full split side, negative or non-finite weight, ntax mismatch.
    InvalidSplit(String),
    /// Malformed input block (distances, quartets, characters, vectors).
    InvalidInput(String),
    /// A transform was applied to data its `is_applicable` rejects.
    NotApplicable {
        transform: &'static str,
        reason: String,
    },
    /// Inconsistent solver state or singular factorization.
    Numerical(String),
}

impl SplitsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitsError::Cancelled => ErrorKind::Cancellation,
            SplitsError::Numerical(_) => ErrorKind::Numerical,
            SplitsError::TaxonOutOfRange { .. }
            | SplitsError::InvalidSplit(_)
            | SplitsError::InvalidInput(_)
            | SplitsError::NotApplicable { .. } => ErrorKind::Domain,
        }
    }
}

impl fmt::Display for SplitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitsError::Cancelled => write!(f, "computation cancelled"),
            SplitsError::TaxonOutOfRange { taxon, ntax } => {
                write!(f, "taxon {} is outside 1..={}", taxon, ntax)
            }
            SplitsError::InvalidSplit(msg) => write!(f, "invalid split: {}", msg),
            SplitsError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            SplitsError::NotApplicable { transform, reason } => {
                write!(f, "{} is not applicable: {}", transform, reason)
            }
            SplitsError::Numerical(msg) => write!(f, "numerical failure: {}", msg),
        }
    }
}

impl Error for SplitsError {}

/// Kind of the first [`SplitsError`] found in the chain, if any.
pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|e| e.downcast_ref::<SplitsError>())
        .map(SplitsError::kind)
}

pub fn is_cancelled(err: &anyhow::Error) -> bool {
    kind_of(err) == Some(ErrorKind::Cancellation)
}
