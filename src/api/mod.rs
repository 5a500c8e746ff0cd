//! Admin HTTP API.
//!
//! Every route sits under `/api/auth` and requires a bearer token carrying
//! the `Admin` role.

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::users::UserProjector;
pub use auth::{JwksValidator, TokenValidator};

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub projector: Arc<UserProjector>,
    pub validator: Arc<dyn TokenValidator>,
}

/// Build the admin router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/auth",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/auth/{user_id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/api/auth/user/{user_id}/role/{role}",
            get(handlers::set_user_role),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
