//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod classify;
mod config_cmd;
mod serve;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "doclabel")]
#[command(about = "Document intake, classification and labeled cloud export")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides config file)
    #[arg(long, global = true, env = "DOCLABEL_DATA_DIR")]
    data_dir: Option<PathBuf>,

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
    /// Start the web server
    Serve {
        /// Address to bind: PORT, HOST, or HOST:PORT
        #[arg(default_value = "127.0.0.1:5000")]
        bind: String,
    },

    /// Extract and classify a local file without registering it
    Classify {
        /// File to classify
        file: PathBuf,
    },

    /// Check availability of external extraction tools
    Tools,

    /// Print the effective configuration as TOML
    Config,
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let (settings, _config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Classify { file } => classify::cmd_classify(&settings, &file).await,
        Commands::Tools => tools::cmd_tools(),
        Commands::Config => config_cmd::cmd_config_show(&settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_default_bind() {
        let cli = Cli::try_parse_from(["doclabel", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind, "127.0.0.1:5000"),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "doclabel",
            "classify",
            "scan.pdf",
            "-v",
            "--config",
            "doclabel.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("doclabel.toml")));
        assert!(matches!(cli.command, Commands::Classify { .. }));
    }
}
