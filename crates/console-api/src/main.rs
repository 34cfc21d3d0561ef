//! Console session binary.
//!
//! Signs in (or restores the persisted session), loads the backoffice
//! profile and keeps the session fresh until interrupted.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use console_api::auth::{FileStore, LoginRequest, MemoryStore, SessionStore};
use console_api::menu::flatten;
use console_api::{ClientConfig, ErrorReporter, OptionResultExt, ResultExt, SessionManager, SessionService};

fn init_tracing(production: bool) {
    let json = production.then(|| tracing_subscriber::fmt::layer().json());
    let pretty = (!production).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,console_api=debug".into()),
        )
        .with(json)
        .with(pretty)
        .init();
}

fn open_store(config: &ClientConfig) -> Arc<dyn SessionStore> {
    match config
        .session_file_path()
        .log_none("resolving session file location")
    {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using file session store");
            Arc::new(FileStore::new(path))
        }
        None => Arc::new(MemoryStore::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    init_tracing(config.as_ref().is_ok_and(|config| config.production));
    let config = config.log("loading configuration")?;

    tracing::info!(
        api_base_url = %config.api_base_url,
        auth_base_url = %config.auth_base_url(),
        refresh_buffer_ms = config.refresh_buffer_ms,
        "Starting console session"
    );

    let reporter = ErrorReporter::from_config(&config).with_context_url("console-session");
    let session = SessionManager::from_config(&config, open_store(&config));

    if session.restore().await.is_none() {
        let (Some(email), Some(password)) = (config.email.clone(), config.password.clone()) else {
            bail!("No stored session; set CONSOLE_EMAIL and CONSOLE_PASSWORD to sign in");
        };

        if let Err(e) = session.login(&LoginRequest { email, password }).await {
            let normalized = reporter.handle(&e);
            bail!(normalized.format_for_user());
        }
    }

    let shell = SessionService::from_config(session.clone(), &config);
    if !shell.initialize().await {
        bail!("Failed to load the backoffice profile");
    }

    let current = session.require_session()?;
    if let Some(user) = shell.user() {
        tracing::info!(
            user = %user.email,
            name = %user.full_name,
            expires_at = %current.access_expires_at,
            "Signed in"
        );
    }
    for entry in flatten(&shell.menu().unwrap_or_default()) {
        tracing::debug!(depth = entry.depth, id = %entry.item.id, label = %entry.item.label, "Menu item");
    }

    let mut changes = session.subscribe();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = changes.borrow_and_update().clone();
                match latest {
                    Some(latest) => tracing::info!(
                        expires_at = %latest.access_expires_at,
                        next_refresh = ?session.scheduled_refresh_at(),
                        "Session refreshed"
                    ),
                    None => {
                        reporter.handle_message("Session ended");
                        bail!("Session ended; sign in again");
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Stopping console session");
                break;
            }
        }
    }

    tracing::info!("Console session stopped");
    Ok(())
}
