#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Duration;
use hospital_inventory_api::{
    auth::{JwtSessionValidator, SessionIdentity},
    build_router,
    config::AppConfig,
    db,
    services::hospitals::HospitalService,
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub const SESSION_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Router backed by a throwaway SQLite file with two seeded hospitals:
/// "General" (Pharmacy, Surgery) and "Riverside" (Oncology).
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub general: SessionIdentity,
    pub riverside: SessionIdentity,
    general_token: String,
    riverside_token: String,
    pub validator: JwtSessionValidator,
    _dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("inventory_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            SESSION_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations");
        let db = Arc::new(pool);

        let hospitals = HospitalService::new(db.clone());
        let general = hospitals
            .seed("General", &["Pharmacy", "Surgery"])
            .await
            .expect("seed General");
        let riverside = hospitals
            .seed("Riverside", &["Oncology"])
            .await
            .expect("seed Riverside");

        let validator = JwtSessionValidator::from_config(&cfg);
        let general_token = validator
            .issue_token(general.id, &general.hospital_name, Duration::hours(1))
            .expect("general token");
        let riverside_token = validator
            .issue_token(riverside.id, &riverside.hospital_name, Duration::hours(1))
            .expect("riverside token");

        let state = AppState::new(db, Arc::new(validator.clone()));
        let router = build_router(state.clone());

        Self {
            router,
            state,
            general: SessionIdentity {
                user_id: general.id,
                hospital_name: general.hospital_name,
            },
            riverside: SessionIdentity {
                user_id: riverside.id,
                hospital_name: riverside.hospital_name,
            },
            general_token,
            riverside_token,
            validator,
            _dir: dir,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let body = body.map(|json| serde_json::to_vec(&json).expect("serialize json request body"));
        self.request_raw(method, uri, body, token).await
    }

    /// Like [`request`](Self::request) but with an arbitrary JSON-typed body.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = match body {
            Some(bytes) => {
                builder = builder.header("content-type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request as the "General" hospital.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(&self.general_token)).await
    }

    /// Request as the "Riverside" hospital.
    pub async fn request_as_riverside(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(&self.riverside_token))
            .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
