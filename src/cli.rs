use clap::{Args, Parser, Subcommand};

use crate::{transforms::closest_tree::ClosestTreeParams, weights::active_set::ActiveSetParams};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ProgramArgs {
    #[command(subcommand)]
    pub subcommand: ProgramSubcommand,
    #[arg(
        short,
        long,
        default_value = "false",
        conflicts_with = "quiet",
        global = true
    )]
    pub verbose: bool,
    #[arg(
        short,
        long,
        default_value = "false",
        conflicts_with = "verbose",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short = 'd',
        long,
        default_value = "output",
        global = true,
        help = "Output directory"
    )]
    pub output_directory: String,
}

#[derive(Subcommand, Debug)]
pub enum ProgramSubcommand {
    #[clap(
        name = "classify",
        about = "Classify a split system and score it against the distances"
    )]
    Classify(InputArgs),
    #[clap(
        name = "closest-tree",
        about = "Maximum-weight compatible subset of a split system"
    )]
    ClosestTree(ClosestTreeArgs),
    #[clap(name = "greedy", about = "Greedy compatible subset of a split system")]
    Greedy(InputArgs),
    #[clap(
        name = "least-squares",
        about = "Fit split weights to the distance matrix"
    )]
    LeastSquares(LeastSquaresArgs),
    #[clap(name = "coalescent", about = "Build a tree from the quartets")]
    Coalescent(InputArgs),
    #[clap(
        name = "spectral",
        about = "Split weights from binary characters by Hadamard conjugation"
    )]
    Spectral(SpectralArgs),
}

impl ProgramSubcommand {
    pub fn name(&self) -> &'static str {
        match self {
            ProgramSubcommand::Classify(_) => "classify",
            ProgramSubcommand::ClosestTree(_) => "closest-tree",
            ProgramSubcommand::Greedy(_) => "greedy",
            ProgramSubcommand::LeastSquares(_) => "least-squares",
            ProgramSubcommand::Coalescent(_) => "coalescent",
            ProgramSubcommand::Spectral(_) => "spectral",
        }
    }

    pub fn input(&self) -> &InputArgs {
        match self {
            ProgramSubcommand::Classify(a)
            | ProgramSubcommand::Greedy(a)
            | ProgramSubcommand::Coalescent(a) => a,
            ProgramSubcommand::ClosestTree(a) => &a.input,
            ProgramSubcommand::LeastSquares(a) => &a.input,
            ProgramSubcommand::Spectral(a) => &a.input,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Input problem file (JSON)
    #[arg(short, long, help = "Input problem file (JSON)", required = true)]
    pub input: String,
    #[arg(
        short,
        long,
        help = "Output prefix for result files",
        default_value = "output"
    )]
    pub output_prefix: String,
}

#[derive(Args, Debug, Clone)]
pub struct ClosestTreeArgs {
    #[clap(flatten)]
    pub input: InputArgs,
    #[clap(flatten)]
    pub params: ClosestTreeParams,
}

#[derive(Args, Debug, Clone)]
pub struct LeastSquaresArgs {
    #[clap(flatten)]
    pub input: InputArgs,
    #[clap(flatten)]
    pub params: ActiveSetParams,
}

#[derive(Args, Debug, Clone)]
pub struct SpectralArgs {
    #[clap(flatten)]
    pub input: InputArgs,
    #[arg(
        long,
        help = "Keep conjugated split weights above this value",
        default_value = "0"
    )]
    pub cutoff: f64,
}

impl InputArgs {
    pub fn new<S: Into<String>>(input: S) -> Self {
        Self {
            input: input.into(),
            output_prefix: String::from("output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::SolverMode;

    #[test]
    fn parses_flattened_params() {
        let args = ProgramArgs::parse_from([
            "fast_splits",
            "-v",
            "least-squares",
            "-i",
            "p.json",
            "--mode",
            "unconstrained",
            "--cutoff",
            "0.5",
        ]);
        assert!(args.verbose);
        assert_eq!(args.output_directory, "output");
        match args.subcommand {
            ProgramSubcommand::LeastSquares(a) => {
                assert_eq!(a.input.input, "p.json");
                assert_eq!(a.params.mode, SolverMode::Unconstrained);
                assert_eq!(a.params.cutoff, 0.5);
                assert_eq!(a.params.tolerance, 1e-10);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn closest_tree_flags() {
        let args = ProgramArgs::parse_from([
            "fast_splits",
            "closest-tree",
            "--input",
            "p.json",
            "--unbounded",
            "-d",
            "out",
        ]);
        assert_eq!(args.output_directory, "out");
        let sub = &args.subcommand;
        assert_eq!(sub.name(), "closest-tree");
        assert_eq!(sub.input().output_prefix, "output");
        match sub {
            ProgramSubcommand::ClosestTree(a) => {
                assert!(a.params.unbounded);
                assert!(!a.params.no_circular);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(ProgramArgs::try_parse_from(["fast_splits", "-v", "-q", "greedy", "-i", "p.json"]).is_err());
    }
}
