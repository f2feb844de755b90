//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod extract;
mod import;
mod quiz;
mod scrape;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use flashscrape::quiz::AnswerSide;
use flashscrape::Settings;

/// DevTools endpoint of a browser started with `--remote-debugging-port=9222`.
const DEFAULT_REMOTE_URL: &str = "ws://127.0.0.1:9222";

#[derive(Parser)]
#[command(name = "flashscrape")]
#[command(about = "Extract flashcard sets (terms and definitions) to JSON")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "FLASHSCRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a set page and save its cards
    Scrape {
        /// Set page URL
        url: String,
        /// Output file [default: cards.json, or output.path from config]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Render the page in Chrome instead of fetching it directly
        #[arg(long)]
        browser: bool,
        /// Attach to a running browser's DevTools endpoint (implies --browser)
        #[arg(long, env = "FLASHSCRAPE_REMOTE_BROWSER")]
        remote: Option<String>,
        /// Show the browser window when launching Chrome
        #[arg(long)]
        headed: bool,
        /// Go straight to the set page without visiting the homepage first
        #[arg(long)]
        no_homepage: bool,
        /// Keep going when a captcha is detected
        #[arg(long)]
        allow_captcha: bool,
        /// Save an empty set instead of failing when the page has no cards
        #[arg(long)]
        allow_empty: bool,
    },

    /// Save the cards of the set open in an attached browser
    Tab {
        /// Output file [default: cards.json, or output.path from config]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// DevTools endpoint [default: ws://127.0.0.1:9222]
        #[arg(long, env = "FLASHSCRAPE_REMOTE_BROWSER")]
        remote: Option<String>,
        /// Keep going when a captcha is detected
        #[arg(long)]
        allow_captcha: bool,
    },

    /// Extract cards from a saved HTML page
    Extract {
        /// HTML file to read
        html_file: PathBuf,
        /// Output file [default: cards.json, or output.path from config]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Save an empty set instead of failing when the page has no cards
        #[arg(long)]
        allow_empty: bool,
    },

    /// Convert a text export (term<ans>definition per line) to JSON
    Import {
        /// Export file to read
        text_file: PathBuf,
        /// Output file [default: cards.json, or output.path from config]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Separator between term and definition [default: <ans>]
        #[arg(long)]
        pair_delimiter: Option<String>,
        /// Separator between cards; accepts \n and \t escapes [default: \n]
        #[arg(long)]
        row_delimiter: Option<String>,
    },

    /// Quiz yourself on a saved card file
    Quiz {
        /// Card file written by scrape, extract or import
        cards_file: PathBuf,
        /// Show the definition and answer with the term
        #[arg(long)]
        reverse: bool,
        /// Do not ask missed cards again at the end
        #[arg(long)]
        no_review: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML (default)
    Show,
    /// Print the default config file location
    Path,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Scrape {
            url,
            output,
            browser,
            remote,
            headed,
            no_homepage,
            allow_captcha,
            allow_empty,
        } => {
            apply_output(&mut settings, output);
            if remote.is_some() {
                settings.browser.remote_url = remote;
            }
            if headed {
                settings.browser.headless = false;
            }
            if no_homepage {
                settings.provider.start_at_homepage = false;
            }
            settings.provider.allow_captcha_bypass |= allow_captcha;
            settings.extract.allow_empty |= allow_empty;

            let use_browser = browser || settings.browser.remote_url.is_some();
            scrape::cmd_scrape(&settings, &url, use_browser).await
        }
        Commands::Tab {
            output,
            remote,
            allow_captcha,
        } => {
            apply_output(&mut settings, output);
            let remote = remote
                .or_else(|| settings.browser.remote_url.clone())
                .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string());
            settings.browser.remote_url = Some(remote);
            settings.provider.allow_captcha_bypass |= allow_captcha;

            scrape::cmd_tab(&settings).await
        }
        Commands::Extract {
            html_file,
            output,
            allow_empty,
        } => {
            apply_output(&mut settings, output);
            settings.extract.allow_empty |= allow_empty;
            extract::cmd_extract(&settings, &html_file)
        }
        Commands::Import {
            text_file,
            output,
            pair_delimiter,
            row_delimiter,
        } => {
            apply_output(&mut settings, output);
            if let Some(delimiter) = pair_delimiter {
                settings.export.pair_delimiter = import::unescape_delimiter(&delimiter);
            }
            if let Some(delimiter) = row_delimiter {
                settings.export.row_delimiter = import::unescape_delimiter(&delimiter);
            }
            import::cmd_import(&settings, &text_file)
        }
        Commands::Quiz {
            cards_file,
            reverse,
            no_review,
        } => {
            if reverse {
                settings.quiz.answer_side = AnswerSide::Term;
            }
            if no_review {
                settings.quiz.review_missed = false;
            }
            quiz::cmd_quiz(&settings, &cards_file)
        }
        Commands::Config { command } => match command.unwrap_or(ConfigCommands::Show) {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings),
            ConfigCommands::Path => config_cmd::cmd_config_path(&settings),
        },
    }
}

fn apply_output(settings: &mut Settings, output: Option<PathBuf>) {
    if let Some(path) = output {
        settings.output.path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scrape_flags() {
        let cli = Cli::try_parse_from([
            "flashscrape",
            "-v",
            "scrape",
            "https://quizlet.com/123/french-flash-cards/",
            "-o",
            "french.json",
            "--no-homepage",
            "--allow-empty",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Scrape {
                url,
                output,
                browser,
                no_homepage,
                allow_empty,
                allow_captcha,
                ..
            } => {
                assert_eq!(url, "https://quizlet.com/123/french-flash-cards/");
                assert_eq!(output, Some(PathBuf::from("french.json")));
                assert!(!browser);
                assert!(no_homepage);
                assert!(allow_empty);
                assert!(!allow_captcha);
            }
            _ => panic!("expected scrape command"),
        }
    }

    #[test]
    fn test_parse_config_without_subcommand() {
        let cli = Cli::try_parse_from(["flashscrape", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { command: None }));
    }

    #[test]
    fn test_parse_quiz() {
        let cli = Cli::try_parse_from(["flashscrape", "quiz", "cards.json", "--reverse"]).unwrap();
        match cli.command {
            Commands::Quiz {
                cards_file,
                reverse,
                no_review,
            } => {
                assert_eq!(cards_file, PathBuf::from("cards.json"));
                assert!(reverse);
                assert!(!no_review);
            }
            _ => panic!("expected quiz command"),
        }
    }

    #[test]
    fn test_scrape_requires_url() {
        assert!(Cli::try_parse_from(["flashscrape", "scrape"]).is_err());
    }
}
