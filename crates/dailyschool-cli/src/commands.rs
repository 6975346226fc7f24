//! Command-line and interactive shell grammar.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use dailyschool_core::config::API_URL_ENV;
use dailyschool_core::models::Category;
use dailyschool_core::{Config, SessionRestore};

#[derive(Parser, Debug)]
#[command(name = "dailyschool", author, version, about = "Post and read school announcements")]
pub struct Cli {
    /// API base URL (overrides config and the DAILYSCHOOL_API_URL variable)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Keep tokens in memory only; nothing is written to the keychain
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// How to restore a stored session: optimistic, verify or never
    #[arg(long, global = true)]
    pub restore: Option<SessionRestore>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(restore) = self.restore {
            config.session_restore = restore;
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    #[command(about = "Create an account")]
    Signup {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    #[command(about = "Sign in and store tokens")]
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    #[command(about = "Sign out and delete stored tokens")]
    Logout,
    #[command(about = "Show the signed-in user")]
    Whoami,
    #[command(about = "Publish an announcement")]
    Post {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, default_value = "notice")]
        category: Category,
    },
    #[command(about = "Interactive session (default)")]
    Shell,
}

/// One line typed at the `>` prompt.
#[derive(Parser, Debug, PartialEq)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub enum ShellCommand {
    #[command(about = "Create an account")]
    Signup,
    #[command(about = "Sign in", alias = "signin")]
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    #[command(about = "Sign out")]
    Logout,
    #[command(about = "Show the signed-in user")]
    Whoami,
    #[command(about = "Write an announcement", alias = "write")]
    Post {
        #[arg(long, short, default_value = "notice")]
        category: Category,
    },
    #[command(about = "Announcements grouped by category", alias = "view")]
    News,
    #[command(about = "Daily newsletter", alias = "email")]
    Newsletter {
        /// Day to summarize (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    #[command(about = "Leave the shell", alias = "exit")]
    Quit,
}

impl ShellCommand {
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        Self::try_parse_from(line.split_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_shell() {
        let cli = Cli::try_parse_from(["dailyschool"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.ephemeral);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "dailyschool",
            "--api-url",
            "http://localhost:8080",
            "--restore",
            "verify",
            "whoami",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Command::Whoami));

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.session_restore, SessionRestore::Verify);
        assert!(!API_URL_ENV.is_empty());
    }

    #[test]
    fn test_post_category_parses() {
        let cli = Cli::try_parse_from([
            "dailyschool", "post", "--title", "Lunch", "--content", "Rice", "--category", "meal",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Post {
                title: Some("Lunch".to_string()),
                content: Some("Rice".to_string()),
                category: Category::MealMenu,
            })
        );
    }

    #[test]
    fn test_shell_lines() {
        assert_eq!(
            ShellCommand::parse_line("login").unwrap(),
            ShellCommand::Login { email: None }
        );
        assert_eq!(
            ShellCommand::parse_line("signin --email other@school.kr").unwrap(),
            ShellCommand::Login {
                email: Some("other@school.kr".to_string())
            }
        );
        assert_eq!(ShellCommand::parse_line("exit").unwrap(), ShellCommand::Quit);
        assert_eq!(
            ShellCommand::parse_line("post -c event").unwrap(),
            ShellCommand::Post { category: Category::Event }
        );
        assert_eq!(
            ShellCommand::parse_line("newsletter --date 2024-03-05").unwrap(),
            ShellCommand::Newsletter {
                date: NaiveDate::from_ymd_opt(2024, 3, 5)
            }
        );
        assert!(ShellCommand::parse_line("dance").is_err());
    }
}
