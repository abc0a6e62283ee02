use std::env;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use pdot_context::core::config::{AppPaths, ConfigService, Secrets};
use pdot_context::core::logging;
use pdot_context::server;
use pdot_context::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "server.log");

    let config = ConfigService::new(paths.clone());
    let settings = config
        .load_settings()
        .with_context(|| format!("Failed to load config {}", paths.config_path.display()))?;

    tracing::info!("Loading components...");
    let secrets = Secrets::from_env(&paths.env_file);
    let state = match AppState::initialize(&paths, settings, &secrets).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("Startup failed: {:#}", err);
            return Err(err);
        }
    };
    tracing::info!("All components loaded");

    let port = resolve_port(env::var("PORT").ok().as_deref(), state.settings.server.port)?;
    let bind_addr = format!("{}:{}", state.settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// `PORT` overrides the configured port; a value that is not a port number is fatal.
fn resolve_port(raw: Option<&str>, configured: u16) -> anyhow::Result<u16> {
    match raw.map(str::trim).filter(|val| !val.is_empty()) {
        Some(val) => val
            .parse::<u16>()
            .with_context(|| format!("Invalid PORT value '{}'", val)),
        None => Ok(configured),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_env_overrides_config() {
        assert_eq!(resolve_port(Some("9001"), 8000).unwrap(), 9001);
        assert_eq!(resolve_port(None, 8000).unwrap(), 8000);
        assert_eq!(resolve_port(Some("  "), 8000).unwrap(), 8000);
    }

    #[test]
    fn unparsable_port_is_an_error() {
        let err = resolve_port(Some("80a0"), 8000).unwrap_err();
        assert!(err.to_string().contains("80a0"));
        assert!(resolve_port(Some("70000"), 8000).is_err());
    }
}
