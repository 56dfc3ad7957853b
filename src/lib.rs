//! Hospital Inventory API Library
//!
//! Hospital-scoped stock records behind a session-validated JSON API, plus the
//! view models used to render the inventory table.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod presentation;
pub mod services;
pub mod tracing;

use axum::{middleware, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::{AuthRouterExt, SessionValidator};
use handlers::health::HealthHandlerState;
use handlers::inventory::InventoryHandlerState;
use services::inventory::InventoryService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub inventory_service: InventoryService,
    pub sessions: Arc<dyn SessionValidator>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, sessions: Arc<dyn SessionValidator>) -> Self {
        Self {
            inventory_service: InventoryService::new(db.clone()),
            db,
            sessions,
        }
    }
}

impl InventoryHandlerState for AppState {
    fn inventory_service(&self) -> &InventoryService {
        &self.inventory_service
    }
}

impl HealthHandlerState for AppState {
    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Versioned API. Every route here sits behind the session validator.
pub fn api_v1_routes(sessions: Arc<dyn SessionValidator>) -> Router<AppState> {
    Router::new().nest(
        "/hospital/inventory",
        handlers::inventory::inventory_routes::<AppState>().with_session(sessions),
    )
}

/// Full application router without transport concerns (CORS, compression),
/// which the binary adds.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "hospital-inventory-api up" }))
        .nest("/health", handlers::health::health_routes::<AppState>())
        .nest("/api/v1", api_v1_routes(state.sessions.clone()))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(middleware::from_fn(request_logging_middleware))
        // Outermost so every span and error body sees the id.
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    ::tracing::info!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
