mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ifast_lib::{Config, SessionManager};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "ifast")]
#[command(about = "Track intermittent fasts locally and against the iFast API")]
struct Cli {
    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Config file (TOML). Defaults to $IFAST_CONFIG when set
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login(commands::auth::LoginArgs),
    /// End the session and forget stored tokens
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account and log in
    Signup(commands::auth::SignupArgs),
    /// Track fasts in the local database
    Fast(commands::fast::FastArgs),
    /// Work with records stored on the server
    Remote(commands::remote::RemoteArgs),
    /// Summarize daily step counts
    Steps(commands::steps::StepsArgs),
    /// Show how a timestamp string would be decoded
    DebugDate(commands::debug_date::DebugDateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ifast=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output)?;
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!("Using {} with database {}", config.base_url, config.db_path.display());

    match &cli.command {
        Commands::Login(args) => {
            let mut session = SessionManager::from_config(&config)?;
            commands::auth::login(args, &mut session, &format).await?
        }
        Commands::Logout => {
            let mut session = SessionManager::from_config(&config)?;
            commands::auth::logout(&mut session).await?
        }
        Commands::Whoami => {
            let mut session = SessionManager::from_config(&config)?;
            commands::auth::whoami(&mut session, &format).await?
        }
        Commands::Signup(args) => {
            let mut session = SessionManager::from_config(&config)?;
            commands::auth::signup(args, &mut session, &format).await?
        }
        Commands::Fast(args) => {
            let db = commands::open_db(&config)?;
            commands::fast::run(args, &db, &format)?
        }
        Commands::Remote(args) => {
            let session = SessionManager::from_config(&config)?;
            commands::remote::run(args, &session, &config, &format).await?
        }
        Commands::Steps(args) => commands::steps::run(args, &format)?,
        Commands::DebugDate(args) => commands::debug_date::run(args, &format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ifast", "fast", "list", "--limit", "5", "--output", "json",
        ])
        .unwrap();
        assert_eq!(cli.output, "json");
        assert!(matches!(cli.command, Commands::Fast(_)));
    }

    #[test]
    fn fast_type_is_parsed_by_clap() {
        let cli =
            Cli::try_parse_from(["ifast", "fast", "start", "--type", "18:6"]).unwrap();
        let Commands::Fast(args) = cli.command else {
            panic!("expected fast command");
        };
        assert!(matches!(
            args.command,
            commands::fast::FastCommand::Start {
                fast_type: ifast_lib::types::FastType::EighteenSix,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["ifast", "fast", "start", "--type", "12:12"]).is_err());
    }

    #[test]
    fn steps_count_conflicts_with_file() {
        assert!(Cli::try_parse_from([
            "ifast", "steps", "--count", "100", "--file", "steps.json"
        ])
        .is_err());
    }
}
