//! Command-line interface definition.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chirp")]
#[command(version)]
#[command(about = "Command-line client for the Design Twitter API", long_about = None)]
pub struct Cli {
    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "CHIRP_API_URL")]
    pub api_url: Option<String>,

    /// Where the session is kept: file, keyring, encrypted or memory
    #[arg(long, global = true, env = "CHIRP_STORAGE")]
    pub storage: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "CHIRP_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Account password (prompted for when not set)
    #[arg(long, global = true, env = "CHIRP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Passphrase for encrypted session storage (prompted for when not set)
    #[arg(long, global = true, env = "CHIRP_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create an account
    Signup {
        /// Username to register
        username: String,

        /// Email address, required by some deployments
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Log in (defaults to the last email used)
    Login {
        /// Account email
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Status,

    /// Show your profile
    Profile,

    /// Show your feed
    Feed,

    /// Profile and feed together
    Home,

    /// Find users by name prefix
    Search {
        /// Username prefix
        prefix: String,
    },

    /// Post a tweet
    Tweet {
        /// Tweet text
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },

    /// Follow a user
    Follow {
        /// Username to follow
        target: String,
    },

    /// Unfollow a user
    Unfollow {
        /// Username to unfollow
        target: String,
    },
}

impl Cli {
    /// Config overrides given on the command line or through `CHIRP_*`
    pub fn config_override(&self, name: &str) -> Option<String> {
        match name {
            "CHIRP_API_URL" => self.api_url.clone(),
            "CHIRP_STORAGE" => self.storage.clone(),
            "CHIRP_TIMEOUT_SECS" => self.timeout_secs.map(|t| t.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("chirp").chain(line.split_whitespace()))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse("login alice@example.com").unwrap().command,
            Commands::Login {
                email: Some("alice@example.com".to_string())
            }
        );
        assert_eq!(parse("login").unwrap().command, Commands::Login { email: None });
        assert_eq!(
            parse("search al").unwrap().command,
            Commands::Search {
                prefix: "al".to_string()
            }
        );
        assert_eq!(
            parse("tweet hello   there world").unwrap().command,
            Commands::Tweet {
                content: vec!["hello".into(), "there".into(), "world".into()]
            }
        );
    }

    #[test]
    fn test_parse_signup() {
        assert_eq!(
            parse("signup alice --email alice@example.com").unwrap().command,
            Commands::Signup {
                username: "alice".to_string(),
                email: Some("alice@example.com".to_string())
            }
        );
        assert!(parse("signup").is_err());
        assert!(parse("signup alice --email").is_err());
        assert!(parse("signup alice bob").is_err());
    }

    #[test]
    fn test_global_flags_anywhere() {
        let cli = parse("feed --json").unwrap();
        assert!(cli.json);
        assert_eq!(cli.command, Commands::Feed);

        let cli = parse("--json --api-url http://example.test home --timeout-secs 5").unwrap();
        assert!(cli.json);
        assert_eq!(cli.config_override("CHIRP_API_URL").as_deref(), Some("http://example.test"));
        assert_eq!(cli.config_override("CHIRP_TIMEOUT_SECS").as_deref(), Some("5"));
        assert_eq!(cli.config_override("CHIRP_PASSWORD"), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("frobnicate").is_err());
        assert!(parse("follow").is_err());
        assert!(parse("follow a b").is_err());
        assert!(parse("logout now").is_err());
        assert!(parse("tweet").is_err());
        assert!(parse("feed --timeout-secs soon").is_err());
    }
}
