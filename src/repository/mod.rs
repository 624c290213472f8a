//! Repository layer: one store per entity, backed by Postgres or memory

pub mod books;
pub mod fines;
pub mod loans;
pub mod memory;
pub mod reservations;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook},
        enums::{LoanStatus, ReservationStatus},
        fine::{Fine, FineQuery, NewFine},
        loan::{Loan, LoanQuery, NewLoan},
        reservation::{NewReservation, Reservation, ReservationQuery},
    },
};

/// Book persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>>;
    async fn get(&self, id: i32) -> AppResult<Book>;
    async fn create(&self, book: &CreateBook) -> AppResult<Book>;
    /// Store `book` if its version still matches the stored one, bumping the
    /// version. Fails with `StaleVersion` otherwise.
    async fn update(&self, book: &Book) -> AppResult<Book>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Loan persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>>;
    async fn get(&self, id: i32) -> AppResult<Loan>;
    async fn create(&self, loan: &NewLoan) -> AppResult<Loan>;
    /// Store `loan` if the stored row is still in status `expected`.
    /// Fails with `StaleVersion` when another writer moved it first.
    async fn update(&self, loan: &Loan, expected: LoanStatus) -> AppResult<Loan>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Reservation persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>>;
    async fn get(&self, id: i32) -> AppResult<Reservation>;
    async fn create(&self, reservation: &NewReservation) -> AppResult<Reservation>;
    /// Store `reservation` if the stored row is still in status `expected`.
    /// Fails with `StaleVersion` when another writer moved it first.
    async fn update(&self, reservation: &Reservation, expected: ReservationStatus) -> AppResult<Reservation>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Fine persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FineStore: Send + Sync {
    async fn list(&self, query: &FineQuery) -> AppResult<Vec<Fine>>;
    async fn get(&self, id: i32) -> AppResult<Fine>;
    async fn create(&self, fine: &NewFine) -> AppResult<Fine>;
    async fn update(&self, fine: &Fine) -> AppResult<Fine>;
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub loans: Arc<dyn LoanStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub fines: Arc<dyn FineStore>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            loans: Arc::new(loans::LoansRepository::new(pool.clone())),
            reservations: Arc::new(reservations::ReservationsRepository::new(pool.clone())),
            fines: Arc::new(fines::FinesRepository::new(pool)),
        }
    }

    /// Create a repository keeping everything in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            books: store.clone(),
            loans: store.clone(),
            reservations: store.clone(),
            fines: store,
        }
    }
}
