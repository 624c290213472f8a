//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, fines, health, loans, reservations, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bibliotech API",
        version = "1.0.0",
        description = "Library circulation REST API: catalog, loans, reservations and fines",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::issue_loan,
        loans::update_loan,
        loans::return_loan,
        loans::mark_overdue,
        // Reservations
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::create_reservation,
        reservations::create_reservation_batch,
        reservations::confirm_reservation,
        reservations::cancel_reservation,
        reservations::delete_reservation,
        reservations::convert_reservation,
        reservations::expire_reservations,
        // Fines
        fines::list_fines,
        fines::get_fine,
        fines::create_fine,
        fines::pay_fine,
        fines::waive_fine,
        // Stats
        stats::get_stats,
        stats::get_member_summary,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Loans
            crate::models::enums::LoanStatus,
            crate::models::loan::Loan,
            crate::models::loan::IssueLoan,
            crate::models::loan::UpdateLoan,
            crate::models::loan::ReturnLoan,
            crate::models::loan::ReturnOutcome,
            // Reservations
            crate::models::enums::ReservationStatus,
            crate::models::reservation::Reservation,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::CreateReservationBatch,
            crate::models::reservation::ConvertReservation,
            crate::models::reservation::ReservationLoan,
            // Fines
            crate::models::enums::FineStatus,
            crate::models::fine::Fine,
            crate::models::fine::CreateFine,
            crate::models::fine::PayFine,
            crate::models::fine::WaiveFine,
            // Stats
            crate::services::stats::LibraryStats,
            crate::services::stats::MemberSummary,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Loan management"),
        (name = "reservations", description = "Reservation management"),
        (name = "fines", description = "Fine management"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
