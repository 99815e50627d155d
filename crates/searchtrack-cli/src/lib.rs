//! SearchTrack command-line interface.

pub mod commands;
pub mod prompt;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SearchTrack - password-locked API key storage and query refinement
#[derive(Parser)]
#[command(name = "searchtrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "SEARCHTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the encrypted API key
    Key(commands::key::KeyArgs),

    /// Refine a search query with the unlocked key
    Refine(commands::refine::RefineArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Run diagnostics
    Doctor,

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config;
    match cli.command {
        Commands::Key(args) => commands::key::run(args, config_path.as_deref()).await,
        Commands::Refine(args) => commands::refine::run(args, config_path.as_deref()).await,
        Commands::Config(args) => commands::config::run(args, config_path.as_deref()).await,
        Commands::Doctor => commands::doctor::run(config_path.as_deref()).await,
        Commands::Version => {
            println!("searchtrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use searchtrack_core::ProviderKind;

    #[test]
    fn test_parse_version() {
        let cli = Cli::try_parse_from(["searchtrack", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_verbosity_and_config() {
        let cli =
            Cli::try_parse_from(["searchtrack", "-vv", "--config", "/tmp/st.json5", "doctor"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/st.json5")));
        assert!(matches!(cli.command, Commands::Doctor));
    }

    #[test]
    fn test_parse_key_save() {
        let cli = Cli::try_parse_from([
            "searchtrack",
            "key",
            "save",
            "--provider",
            "anthropic",
            "--skip-validation",
        ])
        .unwrap();
        match cli.command {
            Commands::Key(args) => match args.command {
                commands::key::KeyCommand::Save {
                    provider,
                    skip_validation,
                    ..
                } => {
                    assert_eq!(provider, Some(ProviderKind::Anthropic));
                    assert!(skip_validation);
                }
                _ => panic!("Expected Key Save command"),
            },
            _ => panic!("Expected Key command"),
        }
    }

    #[test]
    fn test_parse_key_save_rejects_unknown_provider() {
        let result =
            Cli::try_parse_from(["searchtrack", "key", "save", "--provider", "gemini"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_key_clear() {
        let cli = Cli::try_parse_from(["searchtrack", "key", "clear", "--yes"]).unwrap();
        match cli.command {
            Commands::Key(args) => {
                assert!(matches!(
                    args.command,
                    commands::key::KeyCommand::Clear { yes: true }
                ));
            }
            _ => panic!("Expected Key command"),
        }
    }

    #[test]
    fn test_parse_refine() {
        let cli = Cli::try_parse_from(["searchtrack", "refine", "rust", "async", "traits"])
            .unwrap();
        match cli.command {
            Commands::Refine(args) => {
                assert_eq!(args.query, vec!["rust", "async", "traits"]);
            }
            _ => panic!("Expected Refine command"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["searchtrack", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(args) => {
                assert!(matches!(
                    args.command,
                    commands::config::ConfigCommand::Init { force: true }
                ));
            }
            _ => panic!("Expected Config command"),
        }
    }
}
