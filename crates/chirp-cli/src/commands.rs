//! Command execution and output rendering.
//!
//! This is the presentation side of the client: it calls the API, prints
//! what comes back, and turns an ended session into a prompt to log in.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use chirp_core::models::{FeedItem, Profile, SearchHit};
use chirp_core::utils::truncate_string;
use chirp_core::{ApiClient, ApiError, Config};

use crate::cli::Commands;

/// Feed lines are cut to this many characters
const MAX_LINE_LENGTH: usize = 200;

pub struct CommandContext<'a> {
    pub api: &'a ApiClient,
    pub config: &'a Config,
    pub json: bool,
    /// Password from `--password` / `CHIRP_PASSWORD`
    pub password: Option<String>,
}

pub async fn run(command: Commands, ctx: CommandContext<'_>) -> Result<()> {
    let api = ctx.api;
    let json = ctx.json;

    match command {
        Commands::Signup { username, email } => {
            let password = read_password(ctx.password)?;
            let message = api
                .signup(&username, email.as_deref(), &password)
                .await
                .map_err(|e| login_failure("Signup failed", e))?;
            println!("{}", message);
            if let Some(email) = email.as_deref() {
                persist_login(email);
            }
            if api.session().is_authenticated() {
                println!("Logged in as {}", username);
            } else {
                println!("Run `chirp login <email>` to sign in.");
            }
        }

        Commands::Login { email } => {
            let email = login_email(email, ctx.config)?;
            let password = read_password(ctx.password)?;
            let message = api
                .login(&email, &password)
                .await
                .map_err(|e| login_failure("Login failed", e))?;
            persist_login(&email);
            println!("{}", message);
        }

        Commands::Logout => {
            api.logout();
            println!("Logged out.");
        }

        Commands::Status => match api.session().current() {
            Some(session) => println!("Logged in as {} ({})", session.username, api.base_url()),
            None => println!("Not logged in ({})", api.base_url()),
        },

        Commands::Profile => {
            let profile = api.profile().await.map_err(session_failure)?;
            if json {
                print_json(&profile)?;
            } else {
                print_profile(&profile);
            }
        }

        Commands::Feed => {
            let feed = api.feed().await.map_err(session_failure)?;
            if json {
                print_json(&feed)?;
            } else {
                print_feed(&feed);
            }
        }

        Commands::Home => {
            let (profile, feed) = api.home().await.map_err(session_failure)?;
            if json {
                print_json(&serde_json::json!({ "profile": profile, "feed": feed }))?;
            } else {
                print_profile(&profile);
                println!();
                print_feed(&feed);
            }
        }

        Commands::Search { prefix } => {
            let hits = api.search(&prefix).await.map_err(session_failure)?;
            if json {
                print_json(&hits)?;
            } else {
                print_hits(&hits);
            }
        }

        Commands::Tweet { content } => {
            let content = content.join(" ");
            if content.trim().is_empty() {
                return Err(anyhow!("tweet: nothing to post"));
            }
            let message = api.tweet(&content).await.map_err(session_failure)?;
            println!("{}", non_empty(message, "Tweet posted!"));
        }

        Commands::Follow { target } => {
            let message = api.follow(&target).await.map_err(session_failure)?;
            println!("{}", non_empty(message, &format!("Following {}", target)));
        }

        Commands::Unfollow { target } => {
            let message = api.unfollow(&target).await.map_err(session_failure)?;
            println!("{}", non_empty(message, &format!("Unfollowed {}", target)));
        }
    }

    Ok(())
}

/// Given password, otherwise a hidden prompt
fn read_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if password.is_empty() {
        return Err(anyhow!("Password required"));
    }
    Ok(password)
}

/// Email to log in with: the argument, else the last email used
fn login_email(given: Option<String>, config: &Config) -> Result<String> {
    given
        .or_else(|| config.last_username.clone())
        .ok_or_else(|| anyhow!("login: email required"))
}

/// Remember the email a later `chirp login` should default to.
/// Only emails are recorded, since login takes an email and not a username.
/// Returns true when the config changed.
fn record_login(config: &mut Config, email: Option<&str>) -> bool {
    match email {
        Some(email) if config.last_username.as_deref() != Some(email) => {
            config.last_username = Some(email.to_string());
            true
        }
        _ => false,
    }
}

/// Record the email in the config file. Works on the file contents alone so
/// command-line and environment overrides are not written back.
fn persist_login(email: &str) {
    let mut stored = match Config::load_file() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to read config, not saving login");
            return;
        }
    };
    if record_login(&mut stored, Some(email)) {
        if let Err(e) = stored.save() {
            warn!(error = %e, "Failed to save config");
        }
    }
}

/// Errors from an authorized call. An ended session becomes a login prompt;
/// anything else is shown as the server or network reported it.
fn session_failure(e: ApiError) -> anyhow::Error {
    debug!(error = %e, "Request failed");
    if e.requires_login() {
        anyhow!("{}\nRun `chirp login <email>` to sign in.", e)
    } else {
        anyhow!(e)
    }
}

fn login_failure(action: &str, e: ApiError) -> anyhow::Error {
    debug!(error = %e, "{}", action);
    if e.is_timeout() {
        anyhow!("{}: connection timed out. Please try again.", action)
    } else if matches!(e, ApiError::Network(_)) {
        anyhow!("{}: unable to connect to server. Check your connection.", action)
    } else {
        anyhow!("{}: {}", action, e)
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("Welcome, {}", profile.username);
    if let Some(ref email) = profile.email {
        println!("  email:     {}", email);
    }
    if let Some(count) = profile.follower_count() {
        println!("  followers: {}", count);
    }
    if let Some(count) = profile.following_count() {
        println!("  following: {}", count);
    }
    for (key, value) in &profile.extra {
        if key == "followers" || key == "following" {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {}: {}", key, truncate_string(&rendered, MAX_LINE_LENGTH));
    }
}

fn print_feed(feed: &[FeedItem]) {
    if feed.is_empty() {
        println!("No posts to show.");
        return;
    }
    for item in feed {
        println!("{}", truncate_string(&item.display_line(), MAX_LINE_LENGTH));
    }
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No users found.");
        return;
    }
    for hit in hits {
        println!("{}", hit.username());
    }
}
