//! CLI module for Sift.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// Sift - Summarize and fact-check videos and articles
///
/// Give it a YouTube link or a web article URL and it returns a short
/// bulleted summary, optionally with a fact-check of the claims it makes.
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize (and optionally fact-check) a YouTube video or web article
    Analyze {
        /// YouTube URL or http(s) article URL
        url: String,

        /// Extract the main claims and check them against web search
        #[arg(short, long)]
        fact_check: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// LLM model to use (overrides config and MODEL_ID)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Output format for `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown report
    Text,
    /// Full response as JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (API keys masked)
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "sift",
            "-vv",
            "analyze",
            "https://youtu.be/dQw4w9WgXcQ",
            "--fact-check",
            "--format",
            "json",
            "--model",
            "openai/gpt-4o-mini",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Analyze {
                url,
                fact_check,
                format,
                model,
            } => {
                assert_eq!(url, "https://youtu.be/dQw4w9WgXcQ");
                assert!(fact_check);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(model.as_deref(), Some("openai/gpt-4o-mini"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["sift", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: None
            }
        ));
    }

    #[test]
    fn test_analyze_requires_url() {
        assert!(Cli::try_parse_from(["sift", "analyze"]).is_err());
    }
}
