use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use ifast_lib::types::{FastRecord, FastType};
use ifast_lib::{validation, Config, SessionManager};
use uuid::Uuid;

use crate::commands::{open_db, parse_time};
use crate::output::{print_records, print_statistics, OutputFormat};

#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand)]
pub enum RemoteCommand {
    /// List records stored on the server
    Records {
        /// Only records of this type
        #[arg(long = "type")]
        fast_type: Option<FastType>,
        /// Range start (requires --to or defaults it to now)
        #[arg(long)]
        from: Option<String>,
        /// Range end
        #[arg(long)]
        to: Option<String>,
    },
    /// Create a record on the server
    Create {
        /// Start time
        #[arg(long)]
        start: String,
        /// End time (omit for a fast still in progress)
        #[arg(long)]
        end: Option<String>,
        /// Fast type: 16:8, 14:10, 18:6, 24:0, custom
        #[arg(long = "type", default_value = "16:8")]
        fast_type: FastType,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Upload a local record to the server
    Push { id: Uuid },
    /// Delete a record on the server
    Delete { id: Uuid },
    /// Show server-side fasting statistics
    Stats,
}

pub async fn run(
    args: &RemoteArgs,
    session: &SessionManager,
    config: &Config,
    format: &OutputFormat,
) -> Result<()> {
    if !session.auth().has_tokens()? {
        bail!("Not logged in. Run `ifast login <username>` first.");
    }
    let api = session.fasting();

    match &args.command {
        RemoteCommand::Records {
            fast_type,
            from,
            to,
        } => {
            let records = match (fast_type, from, to) {
                (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                    bail!("--type cannot be combined with --from/--to")
                }
                (Some(fast_type), None, None) => api.records_by_type(*fast_type).await?,
                (None, None, None) => api.records().await?,
                (None, from, to) => {
                    let start = match from {
                        Some(from) => parse_time(from)?,
                        None => bail!("--to requires --from"),
                    };
                    let end = match to {
                        Some(to) => parse_time(to)?,
                        None => Utc::now(),
                    };
                    if end < start {
                        bail!("--to is before --from");
                    }
                    api.records_between(start, end).await?
                }
            };
            eprintln!("{} records", records.len());
            print_records(&records, format)
        }
        RemoteCommand::Create {
            start,
            end,
            fast_type,
            notes,
        } => {
            let start = parse_time(start)?;
            let end = end.as_deref().map(parse_time).transpose()?;
            if end.is_some_and(|end| end < start) {
                bail!("--end is before --start");
            }
            let notes = match notes {
                Some(notes) => validation::validate_notes(notes)?,
                None => None,
            };
            let record = FastRecord::new(start, end, *fast_type, notes);
            let created = api.create(&record).await?;
            print_records(&[created], format)
        }
        RemoteCommand::Push { id } => {
            let db = open_db(config)?;
            let record = db
                .get_record(*id)?
                .ok_or_else(|| anyhow!("No local fast record with id {}", id))?;
            let created = api.create(&record).await?;
            eprintln!("Uploaded {}", id);
            print_records(&[created], format)
        }
        RemoteCommand::Delete { id } => {
            let message = api.delete(*id).await?;
            eprintln!("{}", message.trim());
            Ok(())
        }
        RemoteCommand::Stats => {
            let stats = api.statistics().await?;
            print_statistics(&stats, format)
        }
    }
}
