use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path, time::Instant};

use crate::analysis::{classify, update_fit};
use crate::cli::ProgramSubcommand;
use crate::data::split_system::SplitSystem;
use crate::error::SplitsError;
use crate::io::{Blocks, Problem, SystemRecord};
use crate::progress::LogProgress;
use crate::transforms::{BlockKind, InputBlock, SplitsTransform, TransformContext, run_transform};

/// What a command does with the problem's blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// Classify and score the splits block as given.
    Classify,
    Transform(SplitsTransform),
}

impl Task {
    pub fn from_subcommand(sub: &ProgramSubcommand) -> Self {
        match sub {
            ProgramSubcommand::Classify(_) => Task::Classify,
            ProgramSubcommand::ClosestTree(_) => Task::Transform(SplitsTransform::ClosestTree),
            ProgramSubcommand::Greedy(_) => Task::Transform(SplitsTransform::GreedyCompatible),
            ProgramSubcommand::LeastSquares(_) => Task::Transform(SplitsTransform::LeastSquares),
            ProgramSubcommand::Coalescent(_) => Task::Transform(SplitsTransform::Coalescent),
            ProgramSubcommand::Spectral(_) => Task::Transform(SplitsTransform::Spectral),
        }
    }
}

/// Run `task` on in-memory blocks. The result is classified and, when the
/// problem has distances, scored against them.
pub fn execute(task: Task, blocks: &Blocks, ctx: &TransformContext) -> Result<SplitSystem> {
    let mut out = match task {
        Task::Classify => blocks
            .splits
            .clone()
            .ok_or_else(|| missing_block(BlockKind::Splits))?,
        Task::Transform(t) => {
            let input = input_block(blocks, t.input_kind())?;
            run_transform(t, ctx, &blocks.taxa, &input)?
        }
    };
    let class = classify(&mut out);
    debug!("Result is {}", class.as_str());
    if let Some(d) = ctx.distances {
        update_fit(&mut out, d);
    }
    Ok(out)
}

fn input_block(blocks: &Blocks, kind: BlockKind) -> Result<InputBlock<'_>> {
    let block = match kind {
        BlockKind::Distances => blocks.distances.as_ref().map(InputBlock::Distances),
        BlockKind::Splits => blocks.splits.as_ref().map(InputBlock::Splits),
        BlockKind::Quartets => blocks.quartets.as_ref().map(InputBlock::Quartets),
        BlockKind::Characters => blocks.characters.as_ref().map(InputBlock::Characters),
    };
    block.ok_or_else(|| missing_block(kind))
}

fn missing_block(kind: BlockKind) -> anyhow::Error {
    SplitsError::InvalidInput(format!("problem has no {} block", kind.as_str())).into()
}

pub struct Runner {
    out_dir: String,
    command: ProgramSubcommand,
}

impl Runner {
    pub fn new(out_dir: String, command: ProgramSubcommand) -> Self {
        Runner { out_dir, command }
    }

    pub fn run(&self) -> Result<()> {
        let t0 = Instant::now();
        let input = self.command.input();

        // 1) Load problem
        let t_load = Instant::now();
        let blocks = Problem::load(&input.input)
            .and_then(Problem::into_blocks)
            .context("loading problem")?;
        let load_sec = t_load.elapsed().as_secs_f64();
        info!(
            "Loaded {} taxa ({}) in {:.3}s",
            blocks.taxa.ntax(),
            describe_blocks(&blocks),
            load_sec
        );

        // 2) Run
        let t_run = Instant::now();
        let progress = LogProgress::new();
        let mut ctx = TransformContext {
            distances: blocks.distances.as_ref(),
            progress: Some(&progress),
            ..Default::default()
        };
        match &self.command {
            ProgramSubcommand::ClosestTree(a) => ctx.closest_tree = a.params.clone(),
            ProgramSubcommand::LeastSquares(a) => ctx.active_set = a.params.clone(),
            ProgramSubcommand::Spectral(a) => ctx.spectral_cutoff = a.cutoff,
            _ => {}
        }
        let task = Task::from_subcommand(&self.command);
        let result = execute(task, &blocks, &ctx).with_context(|| format!("running {}", self.command.name()))?;
        let run_sec = t_run.elapsed().as_secs_f64();
        info!(
            "{}: {} splits, {} in {:.3}s",
            self.command.name(),
            result.nsplits(),
            result.compatibility().as_str(),
            run_sec
        );
        if result.ls_fit() >= 0.0 {
            info!("Least-squares fit: {:.4} %", result.ls_fit());
        }
        if result.partial() {
            warn!("Result is a partial tree");
        }

        // 3) Outputs
        let t_out = Instant::now();
        fs::create_dir_all(&self.out_dir).with_context(|| format!("creating {}", self.out_dir))?;
        let out_path = Path::new(&self.out_dir).join(format!("{}.json", input.output_prefix));
        let log = RunLog {
            input: input.input.clone(),
            out_dir: self.out_dir.clone(),
            command: self.command.name(),
            ntax: blocks.taxa.ntax(),
            taxa: blocks.taxa.labels().to_vec(),
            input_splits: blocks.splits.as_ref().map(SplitSystem::nsplits),
            polls: progress.polls(),
            result: SystemRecord::new(&result, &blocks.taxa),
            timings: RunTimings {
                load_sec,
                run_sec,
                output_sec: t_out.elapsed().as_secs_f64(),
                total_sec: t0.elapsed().as_secs_f64(),
            },
        };
        fs::write(&out_path, serde_json::to_string_pretty(&log)?)
            .with_context(|| format!("writing {}", out_path.display()))?;
        info!("Result written: {}", out_path.display());

        info!("Done in {:.3}s total.", t0.elapsed().as_secs_f64());
        Ok(())
    }
}

fn describe_blocks(blocks: &Blocks) -> String {
    let mut parts = Vec::new();
    if blocks.distances.is_some() {
        parts.push("distances".to_string());
    }
    if let Some(s) = &blocks.splits {
        parts.push(format!("{} splits", s.nsplits()));
    }
    if let Some(q) = &blocks.quartets {
        parts.push(format!("{} quartets", q.len()));
    }
    if let Some(c) = &blocks.characters {
        parts.push(format!("{} characters", c.nchar()));
    }
    if parts.is_empty() {
        "no data blocks".to_string()
    } else {
        parts.join(", ")
    }
}

/* ───────────── run log ───────────── */

#[derive(Serialize)]
struct RunTimings {
    load_sec: f64,
    run_sec: f64,
    output_sec: f64,
    total_sec: f64,
}

#[derive(Serialize)]
struct RunLog {
    input: String,
    out_dir: String,
    command: &'static str,
    ntax: usize,
    taxa: Vec<String>,
    input_splits: Option<usize>,
    polls: u64,
    result: SystemRecord,
    timings: RunTimings,
}
