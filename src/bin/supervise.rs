use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;

use distsup::data::{open_maybe_gzip, CandidateRow, ParseError};
use distsup::labeling::label_row;

#[derive(Parser, Debug)]
#[command(name = "supervise")]
#[command(about = "Emit weak coworker-relation labels for candidate mention pairs")]
#[command(version)]
struct Args {
    /// Input file with candidate rows (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for label records (writes stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Candidate row encoding
    #[arg(short, long, default_value = "tsv")]
    format: RowFormat,

    /// Log and skip malformed rows instead of aborting
    #[arg(long)]
    skip_bad_rows: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RowFormat {
    /// Tab-separated columns with Postgres array literals
    Tsv,
    /// One JSON object per line
    Jsonl,
}

impl RowFormat {
    fn decode(self, line: &str, line_no: usize) -> Result<CandidateRow, ParseError> {
        match self {
            RowFormat::Tsv => CandidateRow::from_tsv_line(line, line_no),
            RowFormat::Jsonl => CandidateRow::from_json_line(line, line_no),
        }
    }
}

#[derive(Debug, Default)]
struct SuperviseStats {
    total_rows: usize,
    skipped_rows: usize,
    emitted_records: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut writer: BufWriter<Box<dyn Write>> = BufWriter::new(match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    });

    let stats = match &args.input {
        Some(path) => label_file(path, &args, &mut writer)?,
        None => label_stream(io::stdin().lock(), &args, &mut writer)?,
    };
    writer.flush()?;

    info!(
        "labeled {} candidate rows ({} skipped), emitted {} records",
        stats.total_rows, stats.skipped_rows, stats.emitted_records
    );
    Ok(())
}

/// Label every candidate row of a file.
///
/// Rows are decoded up front, then labeled in parallel: labeling calls share
/// no state, and the ordered collect keeps output reproducible.
fn label_file(path: &Path, args: &Args, writer: &mut impl Write) -> Result<SuperviseStats> {
    let reader =
        open_maybe_gzip(path).with_context(|| format!("failed to open {}", path.display()))?;
    let lines: Vec<String> = reader.lines().collect::<io::Result<_>>()?;

    let progress = progress_bar(lines.len() as u64, args.verbose);
    let mut stats = SuperviseStats::default();
    let mut rows = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        match args.format.decode(line, idx + 1) {
            Ok(row) => rows.push(row),
            Err(err) if args.skip_bad_rows => {
                warn!("skipping bad row: {err}");
                stats.skipped_rows += 1;
            }
            Err(err) => return Err(err.into()),
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = &progress {
        pb.finish_with_message("labeling complete");
    }

    stats.total_rows = rows.len();
    let labeled: Vec<_> = rows.par_iter().map(label_row).collect();
    for records in &labeled {
        for record in records {
            writeln!(writer, "{}", record.to_tsv())?;
            stats.emitted_records += 1;
        }
    }
    Ok(stats)
}

/// Label candidate rows as they arrive on a stream, one at a time
fn label_stream<R: BufRead>(
    reader: R,
    args: &Args,
    writer: &mut impl Write,
) -> Result<SuperviseStats> {
    let mut stats = SuperviseStats::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let row = match args.format.decode(&line, idx + 1) {
            Ok(row) => row,
            Err(err) if args.skip_bad_rows => {
                warn!("skipping bad row: {err}");
                stats.skipped_rows += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        stats.total_rows += 1;
        for record in label_row(&row) {
            writeln!(writer, "{}", record.to_tsv())?;
            stats.emitted_records += 1;
        }
    }
    Ok(stats)
}

fn progress_bar(total: u64, verbose: bool) -> Option<ProgressBar> {
    if verbose {
        return None;
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap()
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message("Labeling candidates...");
    Some(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(format: RowFormat, skip_bad_rows: bool) -> Args {
        Args {
            input: None,
            output: None,
            format,
            skip_bad_rows,
            verbose: false,
        }
    }

    #[test]
    fn test_stream_labels_jsonl_rows() {
        let input = concat!(
            r#"{"p1_id":"a","p1_begin":0,"p1_end":0,"p2_id":"b","p2_begin":2,"p2_end":2,"#,
            r#""doc_id":"d","sentence_index":0,"sentence_text":"x and y work","#,
            r#""lemmas":["x","and","y","work"],"ner_tags":["PERSON","O","PERSON","O"]}"#,
            "\n"
        );
        let mut out = Vec::new();
        let stats = label_stream(input.as_bytes(), &args(RowFormat::Jsonl, false), &mut out).unwrap();

        assert_eq!(stats.total_rows, 1);
        assert_eq!(stats.emitted_records, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a\tb\t1\tpos:work_together\n"
        );
    }

    #[test]
    fn test_stream_skips_bad_rows_when_asked() {
        let input = "not a candidate row\n";
        let mut out = Vec::new();

        let result = label_stream(input.as_bytes(), &args(RowFormat::Tsv, false), &mut out);
        assert!(result.is_err());

        let stats =
            label_stream(input.as_bytes(), &args(RowFormat::Tsv, true), &mut out).unwrap();
        assert_eq!(stats.skipped_rows, 1);
        assert_eq!(stats.emitted_records, 0);
        assert!(out.is_empty());
    }
}
