use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use greengrade::middleware::auth::CookieSettings;
use greengrade::router::AppState;
use greengrade::service::accounts::AccountService;
use greengrade::service::audit::AuditService;
use greengrade::service::dataset::ChemicalDataset;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &greengrade::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        dataset = %cfg.dataset.path.display(),
        loglevel = %cfg.loglevel,
        contact_email = %cfg.contact_email
    );

    // A broken dataset file must not take the whole service down: auth
    // and admin features stay up, search answers 503 until it is fixed.
    let dataset = match ChemicalDataset::load(&cfg.dataset.path) {
        Ok(dataset) => Some(Arc::new(dataset)),
        Err(e) => {
            error!(
                path = %cfg.dataset.path.display(),
                error = %e,
                "failed to load chemical dataset; search is disabled"
            );
            None
        }
    };

    // SQLite creates a missing file, but not a missing parent directory.
    if let Some(raw) = cfg.database_url.strip_prefix("sqlite:") {
        let raw = raw.strip_prefix("//").unwrap_or(raw);
        if let Some(parent) = std::path::Path::new(raw).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    let storage = greengrade::db::Storage::connect(&cfg.database_url).await?;
    let accounts = AccountService::new(storage.clone());
    let audit = AuditService::new(storage);

    if accounts
        .ensure_admin(
            &cfg.admin.display_name,
            &cfg.admin.email,
            &cfg.admin.initial_password,
        )
        .await?
    {
        warn!("admin account created with the configured initial password; change it after first login");
    }

    let cookie = CookieSettings::new(
        &cfg.cookie.name,
        &cfg.cookie.key,
        cfg.cookie.expiry_days,
        cfg.cookie.insecure,
    )?;

    let state = AppState::new(
        dataset,
        accounts,
        audit,
        cookie,
        Arc::from(cfg.contact_email.as_str()),
    );
    let app = greengrade::router::grade_router(state);

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
