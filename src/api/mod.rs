//! API handlers for the Bibliotech REST endpoints

pub mod books;
pub mod fines;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod reservations;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::issue_loan))
        .route("/loans/overdue", post(loans::mark_overdue))
        .route("/loans/:id", get(loans::get_loan).put(loans::update_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        // Reservations
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route("/reservations/batch", post(reservations::create_reservation_batch))
        .route("/reservations/expire", post(reservations::expire_reservations))
        .route(
            "/reservations/:id",
            get(reservations::get_reservation).delete(reservations::delete_reservation),
        )
        .route("/reservations/:id/confirm", post(reservations::confirm_reservation))
        .route("/reservations/:id/cancel", post(reservations::cancel_reservation))
        .route("/reservations/:id/loan", post(reservations::convert_reservation))
        // Fines
        .route("/fines", get(fines::list_fines).post(fines::create_fine))
        .route("/fines/:id", get(fines::get_fine))
        .route("/fines/:id/pay", post(fines::pay_fine))
        .route("/fines/:id/waive", post(fines::waive_fine))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .route("/members/:id/summary", get(stats::get_member_summary))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
