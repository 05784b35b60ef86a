use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use clap::Args;
use ifast_lib::{SessionManager, SignupOutcome};

use crate::output::{print_user, OutputFormat};

#[derive(Args)]
pub struct LoginArgs {
    /// Account username
    pub username: String,

    /// Password (read from stdin when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct SignupArgs {
    /// Username for the new account (3-50 characters)
    pub username: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// Password, 8-128 characters (read from stdin when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

fn read_password(given: Option<&str>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn failure(session: &SessionManager, fallback: &str) -> String {
    session
        .state()
        .last_error
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

pub async fn login(
    args: &LoginArgs,
    session: &mut SessionManager,
    format: &OutputFormat,
) -> Result<()> {
    let password = read_password(args.password.as_deref())?;
    if session.login(&args.username, &password).await.is_err() {
        bail!(failure(session, "Login failed"));
    }
    eprintln!("Logged in as {}", args.username);
    if let Some(user) = &session.state().current_user {
        print_user(user, format)?;
    }
    Ok(())
}

pub async fn signup(
    args: &SignupArgs,
    session: &mut SessionManager,
    format: &OutputFormat,
) -> Result<()> {
    let password = read_password(args.password.as_deref())?;
    let outcome = session
        .signup(
            &args.first_name,
            &args.last_name,
            &args.email,
            &args.username,
            &password,
        )
        .await;
    match outcome {
        Ok(SignupOutcome::LoggedIn) => {
            eprintln!("Account created. Logged in as {}", args.username);
        }
        Ok(SignupOutcome::LoginRequired) => {
            eprintln!("{}", failure(session, "Account created. Please log in."));
        }
        Err(_) => bail!(failure(session, "Signup failed")),
    }
    if let Some(user) = &session.state().current_user {
        print_user(user, format)?;
    }
    Ok(())
}

pub async fn logout(session: &mut SessionManager) -> Result<()> {
    session.logout().await;
    eprintln!("Logged out");
    Ok(())
}

pub async fn whoami(session: &mut SessionManager, format: &OutputFormat) -> Result<()> {
    if !session.restore().await {
        bail!("Not logged in. Run `ifast login <username>` first.");
    }
    match &session.state().current_user {
        Some(user) => print_user(user, format),
        None => bail!("Not logged in. Run `ifast login <username>` first."),
    }
}
