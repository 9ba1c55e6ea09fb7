use anyhow::Context;
use clap::{Parser, crate_name, crate_version};

use fast_splits::{cli::ProgramArgs, runner::Runner, set_log_level};
use log::error;

fn main() {
    let app = ProgramArgs::parse();
    set_log_level(&app, true, crate_name!(), crate_version!());

    let runner = Runner::new(app.output_directory, app.subcommand);
    let result = runner.run().context("fast_splits failed");

    if let Err(err) = result {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
