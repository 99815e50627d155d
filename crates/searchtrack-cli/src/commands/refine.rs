//! Query refinement command.

use clap::Args;
use console::style;
use searchtrack_core::ProviderKind;
use searchtrack_gateway::{Coordinator, SurfaceContext};
use searchtrack_providers::{HttpValidator, QueryRefiner};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::key::unlock_stored_key;

/// Refine command arguments.
#[derive(Args)]
pub struct RefineArgs {
    /// Search query to refine
    #[arg(required = true)]
    pub query: Vec<String>,
}

/// Run the refine command.
pub async fn run(args: RefineArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let query = args.query.join(" ");

    let (provider, api_key) = unlock_stored_key(&config).await?;
    if provider != ProviderKind::OpenAi {
        anyhow::bail!(
            "Query refinement needs an OpenAI key; the stored key is for {}",
            provider.display_name()
        );
    }

    // The unlocked key goes through the coordinator like any other surface.
    let validator = HttpValidator::from_config(&config.providers)?;
    let (handle, task) = Coordinator::builder()
        .config(&config)?
        .validator(Arc::new(validator))
        .build()
        .await
        .spawn();
    let mut surface = SurfaceContext::new("cli", handle);
    surface.unlock(api_key, provider).await?;
    surface.activity().await?;

    let Some(api_key) = surface.api_key().await? else {
        anyhow::bail!("API key was locked before the query could be refined");
    };

    let refiner = QueryRefiner::from_config(&config.refine, &config.providers)?;
    let refined = refiner.refine(&api_key, &query).await;

    if refined == query {
        println!("{} {}", style("=").dim(), refined);
    } else {
        println!("{} {}", style("→").green(), refined);
    }

    surface.lock().await?;
    drop(surface);
    wait_for_coordinator(task).await;
    Ok(())
}

/// Wait for the coordinator to stop. Returns `false` if it panicked or was
/// cancelled.
async fn wait_for_coordinator(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "coordinator task failed");
            false
        }
    }
}
