//! Diagnostic commands.

use console::{style, Emoji};
use searchtrack_core::config::Config;
use searchtrack_core::error::ConfigError;
use searchtrack_core::paths;
use searchtrack_secrets::{KeyValueStore, Salt};
use std::path::Path;

use super::key::open_storage;

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Run the doctor command.
pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("SearchTrack Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    // Check directories
    println!("Checking directories...");

    match paths::base_dir() {
        Ok(dir) => {
            if dir.exists() {
                println!("  {} Base directory exists: {:?}", style(CHECK).green(), dir);
            } else {
                println!("  {} Base directory missing: {:?}", style(WARN).yellow(), dir);
                warnings += 1;
            }
        }
        Err(e) => {
            println!("  {} Failed to determine base directory: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    // Check config
    println!("\nChecking configuration...");

    let loaded = match config_path {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };
    let config = match loaded {
        Ok(config) => {
            println!("  {} Configuration loaded", style(CHECK).green());
            match config.validate() {
                Ok(_) => println!("  {} Configuration valid", style(CHECK).green()),
                Err(e) => {
                    println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
                    errors += 1;
                }
            }
            config
        }
        Err(ConfigError::NotFound(_)) => {
            println!("  {} Configuration file not found, using defaults", style(WARN).yellow());
            println!("    Run 'searchtrack config init' to create one");
            warnings += 1;
            Config::default()
        }
        Err(e) => {
            println!("  {} Configuration error: {}", style(CROSS).red(), e);
            errors += 1;
            Config::default()
        }
    };

    // Check key storage
    println!("\nChecking key storage...");

    match open_storage(&config) {
        Ok(storage) => {
            let kv = storage.store().backend();
            let path = kv.path();
            if path.exists() {
                println!("  {} Storage file: {:?}", style(CHECK).green(), path);
                if let Some(problem) = permission_problem(path) {
                    println!("  {} {}", style(WARN).yellow(), problem);
                    warnings += 1;
                }
            } else {
                println!("  {} Storage file not created yet: {:?}", style(WARN).yellow(), path);
                warnings += 1;
            }

            match storage.store().load().await {
                Ok(Some((provider, _))) => {
                    println!("  {} Encrypted {} key stored", style(CHECK).green(), provider.display_name());
                }
                Ok(None) => {
                    println!("  {} No API key set", style(WARN).yellow());
                    println!("    Run 'searchtrack key save' to store one");
                    warnings += 1;
                }
                Err(e) => {
                    println!("  {} Stored key unreadable: {}", style(CROSS).red(), e);
                    println!("    Run 'searchtrack key clear' and save the key again");
                    errors += 1;
                }
            }

            match kv.get(searchtrack_secrets::store::SALT_KEY).await {
                Ok(Some(serde_json::Value::String(hex))) => match Salt::from_hex(&hex) {
                    Ok(_) => println!("  {} Installation salt present", style(CHECK).green()),
                    Err(e) => {
                        println!("  {} Installation salt invalid: {}", style(CROSS).red(), e);
                        errors += 1;
                    }
                },
                Ok(Some(_)) => {
                    println!("  {} Installation salt is not a string", style(CROSS).red());
                    errors += 1;
                }
                Ok(None) => {
                    println!("  {} Installation salt not generated yet", style(WARN).yellow());
                }
                Err(e) => {
                    println!("  {} Storage error: {}", style(CROSS).red(), e);
                    errors += 1;
                }
            }
        }
        Err(e) => {
            println!("  {} Failed to resolve storage path: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    // Summary
    println!("\n{}", style("Summary").bold());
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }

    Ok(())
}

/// Describe loose permissions on the storage file, if any.
#[cfg(unix)]
fn permission_problem(path: &Path) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path).ok()?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        Some(format!(
            "Storage file is readable by others (mode {:o}); expected 600",
            mode
        ))
    } else {
        None
    }
}

#[cfg(not(unix))]
fn permission_problem(_path: &Path) -> Option<String> {
    None
}
