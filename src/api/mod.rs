pub mod auth;
mod error;
mod lots;
mod reservations;
mod spots;
mod users;
mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use error::{ApiError, ErrorCode};

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public except /me)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // Admin routes; each handler checks the admin role on its AuthContext
    let admin_routes = Router::new()
        .route("/dashboard", get(lots::admin_dashboard))
        .route("/lots", post(lots::create_lot))
        .route("/lots/search", get(lots::search_lots))
        .route(
            "/lots/:id",
            get(lots::get_lot).put(lots::update_lot).delete(lots::delete_lot),
        )
        .route("/spots/:id", get(spots::get_spot))
        .route("/users", get(users::list_users))
        .route("/reservations", get(reservations::list_all_reservations));

    // End-user routes
    let user_routes = Router::new()
        .route("/dashboard", get(users::user_dashboard))
        .route("/summary", get(users::user_summary))
        .route("/profile", get(users::get_profile).put(users::update_profile))
        .route("/search", post(lots::search_nearby))
        .route("/lots/:lot_id/book", post(reservations::book_spot))
        .route(
            "/reservations/:id/release",
            post(reservations::release_reservation),
        );

    Router::new()
        .route("/", get(auth::home))
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/user", user_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
