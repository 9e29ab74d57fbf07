mod config;
mod ecowitt;
mod error;
mod forwarder;
mod record;
mod thingspeak;

use crate::config::Config;
use crate::forwarder::Forwarder;
use anyhow::{Context, Result};

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,ecowitt_forwarder=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // The env file may set RUST_LOG, so it is read before the subscriber exists.
    let env_file = config::load_env_file();
    init_tracing()?;

    match env_file {
        Ok(path) => tracing::info!(path = %path.display(), "loaded env file"),
        Err((path, err)) if err.not_found() => {
            tracing::warn!(
                path = %path.display(),
                "env file not found; using process environment"
            );
        }
        Err((path, err)) => {
            return Err(err).with_context(|| format!("failed to load {}", path.display()));
        }
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "refusing to start");
            return Err(err.into());
        }
    };

    tracing::info!(
        mac = %config.credentials.mac,
        ecowitt_url = %config.endpoints.ecowitt_url,
        thingspeak_url = %config.endpoints.thingspeak_url,
        interval_secs = config.poll_interval.as_secs(),
        timeout_secs = config.request_timeout.as_secs(),
        "ecowitt-forwarder starting"
    );

    let forwarder = Forwarder::new(config)?;
    forwarder.run().await;
    Ok(())
}
