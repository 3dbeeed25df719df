//! Arena client binary.
//!
//! Composition root that assembles:
//! 1. The level (from `LEVEL_PATH` or the built-in demo)
//! 2. An in-process authority with optional simulated latency and rejections
//! 3. The optimistic runtime
//! 4. A line-oriented front end reading motions from stdin

mod app;
mod config;
mod level;
mod logging;
mod render;

use anyhow::Result;
use runtime::{LocalAuthority, Runtime, RuntimeConfig};

use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let client_config = ClientConfig::from_env();
    let runtime_config = RuntimeConfig::from_env();

    let log_file = logging::setup_logging(client_config.session_id.as_deref())?;
    println!("logging to {}", log_file.display());

    let state = level::load(client_config.level_path.as_deref(), client_config.seed)?;
    tracing::info!(
        rows = state.grid.height(),
        seed = state.game_seed,
        "level loaded"
    );

    let authority = LocalAuthority::with_options(
        state.clone(),
        runtime_config.game_config.clone(),
        client_config.authority.clone(),
    );

    let runtime = Runtime::builder()
        .config(runtime_config)
        .initial_state(state)
        .authority(authority.clone())
        .build()
        .await?;
    tracing::info!("Runtime built successfully");

    app::run(runtime.handle(), authority).await?;

    runtime.shutdown().await?;
    tracing::info!("Client shutdown complete");
    Ok(())
}
