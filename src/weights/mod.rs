pub mod active_set;
pub mod masked_cholesky;

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum SolverMode {
    /// Non-negative least squares via the active-set method.
    #[default]
    #[clap(alias = "active-set")]
    Constrained,
    /// Plain least squares, negative weights clamped to zero.
    Unconstrained,
}

impl SolverMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverMode::Constrained => "constrained",
            SolverMode::Unconstrained => "unconstrained",
        }
    }
}
