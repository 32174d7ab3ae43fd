//! Auth commands - Login, Logout and Whoami
//!
//! Token acquisition happens outside PaySync. These commands only manage
//! the session stored in the system keyring:
//! 1. `login`  - Stores a user id and access token obtained elsewhere.
//!    Signing in as a different user wipes the previous user's local data.
//! 2. `logout` - Removes the session and force-clears the local database.
//! 3. `whoami` - Shows the stored session and whether it is still valid.

use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use paysync_core::domain::UserId;
use paysync_core::ports::Session;

use super::App;
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store a session for the given user
    Login {
        /// Backend user identifier (UUID)
        #[arg(long)]
        user_id: String,
        /// Access token issued by the backend
        #[arg(long)]
        token: String,
        /// Token lifetime in seconds
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Remove the session and the local payments
    Logout,
    /// Show the stored session
    Whoami,
}

impl AuthCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let fmt = get_formatter(format);
        match self {
            AuthCommand::Login {
                user_id,
                token,
                expires_in,
            } => login(app, user_id, token, *expires_in, &*fmt).await,
            AuthCommand::Logout => logout(app, &*fmt).await,
            AuthCommand::Whoami => whoami(app, format, &*fmt),
        }
    }
}

async fn login(
    app: &App,
    user_id: &str,
    token: &str,
    expires_in: Option<i64>,
    fmt: &dyn OutputFormatter,
) -> Result<()> {
    let user_id = UserId::from_str(user_id)?;
    let session = build_session(user_id, token, expires_in)?;

    let previous = app.auth.session().context("Failed to read session")?;
    if previous.is_some_and(|p| p.user_id != user_id) {
        info!("Switching user; clearing local payments");
        if !app.coordinator.clear_local_database(true).await {
            anyhow::bail!("Failed to clear the previous user's local payments");
        }
    }

    app.auth
        .sign_in(&session)
        .context("Failed to store session in keyring")?;

    fmt.success(&format!("Signed in as {user_id}"));
    fmt.print_json(&serde_json::json!({"user_id": user_id, "expires_at": session.expires_at}));
    Ok(())
}

fn build_session(user_id: UserId, token: &str, expires_in: Option<i64>) -> Result<Session> {
    let session = Session::new(user_id, token);
    let Some(seconds) = expires_in else {
        return Ok(session);
    };
    let lifetime = chrono::Duration::try_seconds(seconds)
        .with_context(|| format!("--expires-in {seconds} is out of range"))?;
    session
        .expiring_in(lifetime)
        .with_context(|| format!("--expires-in {seconds} is out of range"))
}

async fn logout(app: &App, fmt: &dyn OutputFormatter) -> Result<()> {
    app.auth
        .sign_out()
        .context("Failed to remove session from keyring")?;

    // Logout must not fail because the local wipe did
    let cleared = app.coordinator.clear_local_database(true).await;
    if cleared {
        fmt.success("Signed out and cleared local payments");
    } else {
        fmt.warn("Signed out, but the local payments could not be cleared");
    }
    fmt.print_json(&serde_json::json!({"signed_out": true, "cleared": cleared}));
    Ok(())
}

fn whoami(app: &App, format: OutputFormat, fmt: &dyn OutputFormatter) -> Result<()> {
    let session = app.auth.session().context("Failed to read session")?;

    if format.is_json() {
        fmt.print_json(&serde_json::json!({
            "user_id": session.as_ref().map(|s| s.user_id),
            "expires_at": session.as_ref().and_then(|s| s.expires_at),
            "expired": session.as_ref().map(|s| s.is_expired()),
        }));
        return Ok(());
    }

    match session {
        None => fmt.info("Not signed in"),
        Some(s) => {
            fmt.field("User", &s.user_id.to_string());
            let expiry = match s.expires_at {
                Some(at) if s.is_expired() => format!("expired at {at}"),
                Some(at) => format!("valid until {at}"),
                None => "no expiry".to_string(),
            };
            fmt.field("Session", &expiry);
        }
    }
    Ok(())
}
