use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use distsup::tally::tally_file;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Tally labeled-vs-predicted outcomes from a tagged CSV file")]
#[command(version)]
struct Args {
    /// Tagged CSV file; the first row is a header and is skipped
    #[arg(short, long)]
    input: PathBuf,

    /// Print the table as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let table = tally_file(&args.input)
        .with_context(|| format!("failed to tally {}", args.input.display()))?;
    info!(
        "tallied {} outcomes across {} categories",
        table.totals().total(),
        table.len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print!("{table}");
    }
    Ok(())
}
