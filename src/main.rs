use std::{net::SocketAddr, sync::Arc};

use http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing::{error, info, warn};

use hospital_inventory_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Shared pool; migrations run here when auto_migrate is set
    let db_pool = api::db::global_pool(&cfg).await.map_err(|e| {
        error!("Failed to initialise database: {}", e);
        e
    })?;

    let sessions: Arc<dyn api::auth::SessionValidator> =
        Arc::new(api::auth::JwtSessionValidator::from_config(&cfg));
    let app_state = api::AppState::new(db_pool, sessions);

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        return Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into());
    };

    let app = api::build_router(app_state)
        .layer(CompressionLayer::new())
        .layer(cors_layer);

    let ip: std::net::IpAddr = cfg.host.parse()?;
    let addr = SocketAddr::from((ip, cfg.port));
    info!("hospital-inventory-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and its state were consumed by serve, so the pool is ours again.
    if let Err(e) = api::db::shutdown_global_pool().await {
        warn!("Database pool was not closed cleanly: {}", e);
    }
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
