//! API key commands.
//!
//! `searchtrack key save|unlock|status|validate|clear` drive the encrypted
//! record on disk through `searchtrack-secrets`.

use anyhow::Context;
use clap::Args;
use console::style;
use searchtrack_core::{Config, ProviderKind, SecretString};
use searchtrack_providers::{CredentialValidator, HttpValidator};
use searchtrack_secrets::{FileKeyValueStore, SecretError, SecureStorage};
use std::path::Path;

use crate::prompt;

/// Key command arguments.
#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[derive(clap::Subcommand)]
pub enum KeyCommand {
    /// Encrypt and store an API key (prompts for key and password)
    Save {
        /// Provider the key belongs to (defaults to providers.default)
        #[arg(short, long)]
        provider: Option<ProviderKind>,

        /// API key (if omitted, prompts for hidden input)
        #[arg(long, env = "SEARCHTRACK_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Store without checking the key against the provider
        #[arg(long)]
        skip_validation: bool,
    },

    /// Decrypt the stored key and show it masked
    Unlock,

    /// Show whether a key is stored
    Status,

    /// Check the stored key against its provider
    Validate,

    /// Remove the stored key
    Clear {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Run the key command.
pub async fn run(args: KeyArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    match args.command {
        KeyCommand::Save {
            provider,
            api_key,
            skip_validation,
        } => {
            let provider = provider.unwrap_or(config.providers.default);
            let api_key = match api_key {
                Some(key) => SecretString::from_input(key),
                None => prompt::secret(&format!("{} API key: ", provider.display_name()))?,
            };
            if api_key.is_empty() {
                anyhow::bail!("Please enter an API key.");
            }

            if !skip_validation {
                println!("Validating API key...");
                let validator = HttpValidator::from_config(&config.providers)?;
                if let Err(e) = validator.validate(provider, &api_key).await {
                    anyhow::bail!("Invalid API key: {}", e.user_message());
                }
            }

            let password = prompt::new_password()?;
            let mut storage = open_storage(&config)?;
            storage
                .initialize(password)
                .await
                .context("Error processing password")?;
            storage.store_api_key(provider, &api_key).await?;
            storage.lock();

            println!(
                "{} {} API key stored securely.",
                style("✓").green(),
                provider.display_name()
            );
        }

        KeyCommand::Unlock => {
            let (provider, api_key) = unlock_stored_key(&config).await?;
            println!(
                "{} Unlocked {} key {}",
                style("✓").green(),
                provider.display_name(),
                api_key.masked()
            );
        }

        KeyCommand::Status => {
            let storage = open_storage(&config)?;
            match storage.store().load().await {
                Ok(Some((provider, _))) => {
                    println!("{} API key is set ({})", style("✓").green(), provider.display_name());
                }
                Ok(None) => {
                    println!("{} No API key set", style("!").yellow());
                    println!("  Run 'searchtrack key save' to store one");
                }
                Err(e) => {
                    println!("{} Stored key unreadable: {}", style("✗").red(), e);
                    println!("  Run 'searchtrack key clear' and save the key again");
                }
            }
        }

        KeyCommand::Validate => {
            let (provider, api_key) = unlock_stored_key(&config).await?;
            println!("Validating API key...");
            let validator = HttpValidator::from_config(&config.providers)?;
            match validator.validate(provider, &api_key).await {
                Ok(()) => println!(
                    "{} {} accepted the API key",
                    style("✓").green(),
                    provider.display_name()
                ),
                Err(e) => anyhow::bail!("Invalid API key: {}", e.user_message()),
            }
        }

        KeyCommand::Clear { yes } => {
            let storage = open_storage(&config)?;
            if !storage.has_stored_key().await? {
                println!("No API key set");
                return Ok(());
            }
            if !yes && !confirm("Remove the stored API key?")? {
                println!("Cancelled");
                return Ok(());
            }
            storage.clear_all().await?;
            println!("API key removed.");
        }
    }

    Ok(())
}

/// Storage backed by the configured file.
pub(crate) fn open_storage(config: &Config) -> anyhow::Result<SecureStorage<FileKeyValueStore>> {
    let path = config.storage_path()?;
    tracing::debug!(path = %path.display(), "opening key storage");
    Ok(SecureStorage::new(FileKeyValueStore::new(path)))
}

/// Prompt for the password and decrypt the stored key.
pub(crate) async fn unlock_stored_key(
    config: &Config,
) -> anyhow::Result<(ProviderKind, SecretString)> {
    let mut storage = open_storage(config)?;
    if !storage.has_stored_key().await? {
        anyhow::bail!("No API key set. Run 'searchtrack key save' first.");
    }

    let password = prompt::password()?;
    storage
        .initialize(password)
        .await
        .context("Error processing password")?;

    let unlocked = storage.api_key().await;
    storage.lock();
    match unlocked {
        Ok(Some(found)) => Ok(found),
        Ok(None) => anyhow::bail!("No API key set. Run 'searchtrack key save' first."),
        Err(e) => Err(anyhow::Error::msg(unlock_failure(&e))),
    }
}

/// User-facing text for a failed unlock.
pub(crate) fn unlock_failure(error: &SecretError) -> String {
    if error.is_wrong_password() {
        "Incorrect password. Please try again.".to_string()
    } else if error.is_corruption() {
        format!(
            "{}. Run 'searchtrack key clear' and save the key again.",
            error
        )
    } else {
        format!("Failed to unlock API key: {}", error)
    }
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
