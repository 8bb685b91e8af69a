//! Formsmith REST API
//!
//! Persists forms, groups and users for the editor, and serves the public
//! view/submit endpoints respondents hit.
//!
//! ```text
//! /health                         liveness
//! /api/auth/{register,login,me}   accounts and bearer tokens
//! /api/groups[/:id]               owner-scoped folders
//! /api/forms[/:id[/...]]          owner-scoped forms, plus public view/submit
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use middleware::JwtKeys;

use storage::{
    FormRepository, GroupRepository, InMemoryFormRepository, InMemoryGroupRepository,
    InMemoryUserRepository, UserRepository,
};

/// API state
pub struct ApiState {
    pub config: Arc<ApiConfig>,
    pub keys: JwtKeys,
    pub forms: Arc<dyn FormRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl ApiState {
    pub fn new(
        config: ApiConfig,
        forms: Arc<dyn FormRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt_secret, config.token_ttl_hours);
        Self { config: Arc::new(config), keys, forms, groups, users }
    }

    /// State backed by the in-memory repositories
    pub fn in_memory(config: ApiConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryFormRepository::new()),
            Arc::new(InMemoryGroupRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        )
    }
}

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/auth", routes::auth::router(state))
        .nest("/groups", routes::groups::router(state))
        .nest("/forms", routes::forms::router(state))
}
