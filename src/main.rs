//! fb2shelf CLI: import FB2 archives into a library database, export it as Hugo content.

use anyhow::Result;
use clap::Parser;
use fb2shelf::engine::arg_parser::Cli;
use fb2shelf::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
