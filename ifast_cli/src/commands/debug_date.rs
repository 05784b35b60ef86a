use anyhow::Result;
use clap::Args;
use ifast_lib::ifast_api::dates::{format_utc, probe};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_rows, OutputFormat};

#[derive(Args)]
pub struct DebugDateArgs {
    /// Timestamp string as received from the API
    pub input: String,
}

#[derive(Tabled, Serialize, Clone)]
pub(crate) struct ProbeRow {
    #[tabled(rename = "Format")]
    #[serde(rename = "Format")]
    format: String,
    #[tabled(rename = "Parsed")]
    #[serde(rename = "Parsed")]
    parsed: String,
}

pub(crate) fn build_probe_rows(input: &str) -> Vec<ProbeRow> {
    probe(input)
        .into_iter()
        .map(|(format, parsed)| ProbeRow {
            format: format.name().to_string(),
            parsed: parsed
                .as_ref()
                .map(format_utc)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

/// Shows how each accepted timestamp format reads `input`.
pub fn run(args: &DebugDateArgs, format: &OutputFormat) -> Result<()> {
    let rows = build_probe_rows(&args.input);
    match rows.iter().find(|r| r.parsed != "-") {
        Some(first) => eprintln!("Decodes as {} ({})", first.parsed, first.format),
        None => eprintln!("No accepted format matches '{}'", args.input.trim()),
    }
    print_rows(rows.clone(), &rows, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_rows_mark_matching_formats() {
        let rows = build_probe_rows("1705314600");
        assert_eq!(rows.len(), 7);
        let matched: Vec<&ProbeRow> = rows.iter().filter(|r| r.parsed != "-").collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].format, "Unix epoch seconds");
        assert_eq!(matched[0].parsed, "2024-01-15T10:30:00Z");
    }

    #[test]
    fn probe_rows_for_garbage() {
        assert!(build_probe_rows("next tuesday")
            .iter()
            .all(|r| r.parsed == "-"));
    }
}
