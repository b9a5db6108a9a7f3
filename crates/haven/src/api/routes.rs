//! API route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{AuthGate, auth_middleware};
use crate::portal;

use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let gate = AuthGate::new(state.tokens.clone());

    // Bearer-authenticated routes
    let protected = Router::new()
        .route("/api/terminal/exec", post(handlers::terminal::exec))
        .route("/api/files/list", get(handlers::files::list))
        .route("/api/files/read", post(handlers::files::read))
        .route("/api/files/write", post(handlers::files::write))
        .route("/api/files/delete", post(handlers::files::delete))
        .route("/api/files/mkdir", post(handlers::files::mkdir))
        .route_layer(middleware::from_fn_with_state(gate, auth_middleware));

    let public = Router::new()
        .route("/", get(portal::serve))
        .route("/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/verify", post(handlers::auth::verify));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
