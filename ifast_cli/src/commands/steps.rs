use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use clap::Args;
use ifast_lib::steps::summarize_range;
use ifast_lib::{StaticStepProvider, StepSummary};

use crate::commands::parse_day;
use crate::output::{print_steps, OutputFormat};

#[derive(Args)]
pub struct StepsArgs {
    /// Step count to summarize for a single day
    #[arg(long, conflicts_with = "file")]
    pub count: Option<u32>,

    /// JSON file of daily counts: [{"date": "2024-01-15", "steps": 8421}, ...]
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Last day to show, YYYY-MM-DD (defaults to today, UTC)
    #[arg(long)]
    pub date: Option<String>,

    /// Number of days ending at --date to show from --file
    #[arg(long, default_value = "7")]
    pub days: i64,
}

pub fn run(args: &StepsArgs, format: &OutputFormat) -> Result<()> {
    let end = match &args.date {
        Some(date) => parse_day(date)?,
        None => Utc::now().date_naive(),
    };

    let summaries = match (&args.file, args.count) {
        (_, Some(count)) => vec![StepSummary::new(end, count)],
        (Some(file), None) => {
            if !(1..=366).contains(&args.days) {
                bail!("days must be between 1 and 366, got {}", args.days);
            }
            let provider = StaticStepProvider::from_json_file(file)?;
            let start = end - Duration::days(args.days - 1);
            summarize_range(&provider, start, end)?
        }
        (None, None) => bail!("Pass --count or --file"),
    };
    print_steps(&summaries, format)
}
