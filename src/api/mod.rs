// HTTP and WebSocket APIs

pub mod stats;
pub mod users;
pub mod websocket;

pub use stats::{create_stats_router, StatsAppState};
pub use users::{create_users_router, UsersAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::hub::Hub;
use crate::users::UserStore;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Compose every router into the full application
pub fn create_app(hub: Arc<Hub>, store: Arc<UserStore>, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(create_ws_router(Arc::new(WsAppState {
            hub: Arc::clone(&hub),
        })))
        .merge(create_stats_router(Arc::new(StatsAppState { hub })))
        .merge(create_users_router(
            Arc::new(UsersAppState { store }),
            body_limit_bytes,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
