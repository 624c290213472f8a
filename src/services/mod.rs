//! Business logic services

pub mod catalog;
pub mod copies;
pub mod fines;
pub mod loans;
pub mod reservations;
pub mod stats;

use crate::{config::CirculationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub reservations: reservations::ReservationsService,
    pub fines: fines::FinesService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, circulation: &CirculationConfig) -> Self {
        let copies = copies::CopyLedger::new(repository.books.clone(), circulation.max_update_attempts);
        let fines = fines::FinesService::new(repository.clone(), circulation.daily_fine_rate);

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(
                repository.clone(),
                copies.clone(),
                fines.clone(),
                circulation.loan_days,
            ),
            reservations: reservations::ReservationsService::new(
                repository.clone(),
                copies,
                circulation.reservation_hold_days,
                circulation.loan_days,
            ),
            fines,
            stats: stats::StatsService::new(repository),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::AppResult,
        models::{
            book::{Book, CreateBook},
            enums::{LoanStatus, ReservationStatus},
            loan::{Loan, LoanQuery, NewLoan},
            reservation::{NewReservation, Reservation, ReservationQuery},
        },
        repository::{LoanStore, ReservationStore},
    };

    /// Store wrapper that yields to the scheduler after every read, so two
    /// joined calls both read before either writes
    pub struct YieldAfterRead<S: ?Sized>(pub Arc<S>);

    #[async_trait]
    impl LoanStore for YieldAfterRead<dyn LoanStore> {
        async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
            self.0.list(query).await
        }

        async fn get(&self, id: i32) -> AppResult<Loan> {
            let loan = self.0.get(id).await;
            tokio::task::yield_now().await;
            loan
        }

        async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
            self.0.create(loan).await
        }

        async fn update(&self, loan: &Loan, expected: LoanStatus) -> AppResult<Loan> {
            self.0.update(loan, expected).await
        }

        async fn delete(&self, id: i32) -> AppResult<()> {
            self.0.delete(id).await
        }
    }

    #[async_trait]
    impl ReservationStore for YieldAfterRead<dyn ReservationStore> {
        async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>> {
            self.0.list(query).await
        }

        async fn get(&self, id: i32) -> AppResult<Reservation> {
            let reservation = self.0.get(id).await;
            tokio::task::yield_now().await;
            reservation
        }

        async fn create(&self, reservation: &NewReservation) -> AppResult<Reservation> {
            self.0.create(reservation).await
        }

        async fn update(&self, reservation: &Reservation, expected: ReservationStatus) -> AppResult<Reservation> {
            self.0.update(reservation, expected).await
        }

        async fn delete(&self, id: i32) -> AppResult<()> {
            self.0.delete(id).await
        }
    }

    /// Services over `repository` whose loan and reservation reads yield
    pub fn interleaving(repository: &Repository) -> Services {
        let yielding = Repository {
            loans: Arc::new(YieldAfterRead(repository.loans.clone())),
            reservations: Arc::new(YieldAfterRead(repository.reservations.clone())),
            ..repository.clone()
        };
        Services::new(yielding, &CirculationConfig::default())
    }

    /// Add another book to the catalog
    pub async fn add_book(services: &Services, title: &str, copies: i32) -> Book {
        services
            .catalog
            .create_book(&CreateBook {
                title: title.to_string(),
                isbn: None,
                author_id: None,
                publisher_id: None,
                category_id: None,
                publication_year: None,
                language: None,
                total_copies: copies,
            })
            .await
            .unwrap()
    }

    /// Services over an empty in-memory repository, plus one book
    pub async fn setup(copies: i32) -> (Services, Repository, Book) {
        let repository = Repository::in_memory();
        let services = Services::new(repository.clone(), &CirculationConfig::default());
        let book = services
            .catalog
            .create_book(&CreateBook {
                title: "Cien años de soledad".to_string(),
                isbn: Some("978-0-307-47472-3".to_string()),
                author_id: Some(1),
                publisher_id: Some(1),
                category_id: Some(1),
                publication_year: Some(1967),
                language: Some("Español".to_string()),
                total_copies: copies,
            })
            .await
            .unwrap();
        (services, repository, book)
    }
}
