//! In-process store used for development without Postgres and by tests

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{BookStore, FineStore, LoanStore, ReservationStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook},
        enums::{FineStatus, LoanStatus, ReservationStatus},
        fine::{Fine, FineQuery, NewFine},
        loan::{Loan, LoanQuery, NewLoan},
        reservation::{NewReservation, Reservation, ReservationQuery},
    },
};

/// Rows of one entity keyed by id, with a serial id counter
struct Table<T> {
    next_id: i32,
    rows: BTreeMap<i32, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(i32) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: i32, entity: &str) -> AppResult<T> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", entity, id)))
    }

    fn replace(&mut self, id: i32, row: T, entity: &str) -> AppResult<T> {
        match self.rows.get_mut(&id) {
            Some(slot) => {
                *slot = row.clone();
                Ok(row)
            }
            None => Err(AppError::NotFound(format!("{} with id {} not found", entity, id))),
        }
    }

    /// Replace a row only while `current` still holds for the stored value
    fn replace_if(
        &mut self,
        id: i32,
        row: T,
        entity: &str,
        current: impl FnOnce(&T) -> Result<(), String>,
    ) -> AppResult<T> {
        let slot = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", entity, id)))?;
        current(&*slot).map_err(AppError::StaleVersion)?;
        *slot = row.clone();
        Ok(row)
    }

    fn remove(&mut self, id: i32, entity: &str) -> AppResult<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", entity, id)))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    books: RwLock<Table<Book>>,
    loans: RwLock<Table<Loan>>,
    reservations: RwLock<Table<Reservation>>,
    fines: RwLock<Table<Fine>>,
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let needle = query.title.as_ref().map(|t| t.to_lowercase());
        let table = self.books.read().await;
        let mut books: Vec<Book> = table
            .rows
            .values()
            .filter(|b| needle.as_ref().map_or(true, |n| b.title.to_lowercase().contains(n)))
            .filter(|b| !query.available.unwrap_or(false) || b.has_available_copy())
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        self.books.read().await.get(id, "Book")
    }

    async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let mut table = self.books.write().await;
        Ok(table.insert_with(|id| Book {
            id,
            title: data.title.clone(),
            isbn: data.isbn.clone(),
            author_id: data.author_id,
            publisher_id: data.publisher_id,
            category_id: data.category_id,
            publication_year: data.publication_year,
            language: data.language.clone(),
            total_copies: data.total_copies,
            available_copies: data.total_copies,
            version: 0,
            created_at: Utc::now(),
            updated_at: None,
        }))
    }

    async fn update(&self, book: &Book) -> AppResult<Book> {
        let mut table = self.books.write().await;
        let current = table.get(book.id, "Book")?;
        if current.version != book.version {
            return Err(AppError::StaleVersion(format!(
                "book {} is at version {}, update was based on {}",
                book.id, current.version, book.version
            )));
        }
        let stored = Book {
            version: book.version + 1,
            updated_at: Some(Utc::now()),
            ..book.clone()
        };
        table.replace(book.id, stored, "Book")
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.books.write().await.remove(id, "Book")
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn list(&self, query: &LoanQuery) -> AppResult<Vec<Loan>> {
        let table = self.loans.read().await;
        let mut loans: Vec<Loan> = table.rows.values().filter(|l| query.matches(l)).cloned().collect();
        loans.sort_by_key(|l| (l.due_date, l.id));
        Ok(loans)
    }

    async fn get(&self, id: i32) -> AppResult<Loan> {
        self.loans.read().await.get(id, "Loan")
    }

    async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
        let mut table = self.loans.write().await;
        Ok(table.insert_with(|id| Loan {
            id,
            book_id: loan.book_id,
            member_id: loan.member_id,
            employee_id: loan.employee_id,
            reservation_id: loan.reservation_id,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: None,
            status: LoanStatus::Active,
            notes: loan.notes.clone(),
        }))
    }

    async fn update(&self, loan: &Loan, expected: LoanStatus) -> AppResult<Loan> {
        self.loans
            .write()
            .await
            .replace_if(loan.id, loan.clone(), "Loan", |stored| {
                if stored.status == expected {
                    Ok(())
                } else {
                    Err(format!("loan {} is {}, update expected {}", stored.id, stored.status, expected))
                }
            })
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.loans.write().await.remove(id, "Loan")
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>> {
        let table = self.reservations.read().await;
        let mut reservations: Vec<Reservation> =
            table.rows.values().filter(|r| query.matches(r)).cloned().collect();
        reservations.sort_by_key(|r| (r.reservation_date, r.id));
        Ok(reservations)
    }

    async fn get(&self, id: i32) -> AppResult<Reservation> {
        self.reservations.read().await.get(id, "Reservation")
    }

    async fn create(&self, reservation: &NewReservation) -> AppResult<Reservation> {
        let mut table = self.reservations.write().await;
        Ok(table.insert_with(|id| Reservation {
            id,
            book_id: reservation.book_id,
            member_id: reservation.member_id,
            reservation_date: reservation.reservation_date,
            expiration_date: reservation.expiration_date,
            status: ReservationStatus::Pending,
            notified: false,
            group_code: reservation.group_code.clone(),
        }))
    }

    async fn update(&self, reservation: &Reservation, expected: ReservationStatus) -> AppResult<Reservation> {
        self.reservations
            .write()
            .await
            .replace_if(reservation.id, reservation.clone(), "Reservation", |stored| {
                if stored.status == expected {
                    Ok(())
                } else {
                    Err(format!(
                        "reservation {} is {}, update expected {}",
                        stored.id, stored.status, expected
                    ))
                }
            })
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.reservations.write().await.remove(id, "Reservation")
    }
}

#[async_trait]
impl FineStore for MemoryStore {
    async fn list(&self, query: &FineQuery) -> AppResult<Vec<Fine>> {
        let table = self.fines.read().await;
        let mut fines: Vec<Fine> = table.rows.values().filter(|f| query.matches(f)).cloned().collect();
        fines.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(a.id.cmp(&b.id)));
        Ok(fines)
    }

    async fn get(&self, id: i32) -> AppResult<Fine> {
        self.fines.read().await.get(id, "Fine")
    }

    async fn create(&self, fine: &NewFine) -> AppResult<Fine> {
        let mut table = self.fines.write().await;
        // Same guarantee as the fines_one_pending_per_loan index
        if table.rows.values().any(|f| f.loan_id == fine.loan_id && f.is_pending()) {
            return Err(AppError::Conflict(format!(
                "Loan {} already has a pending fine",
                fine.loan_id
            )));
        }
        Ok(table.insert_with(|id| Fine {
            id,
            loan_id: fine.loan_id,
            member_id: fine.member_id,
            amount: fine.amount,
            reason: fine.reason.clone(),
            issue_date: fine.issue_date,
            payment_date: None,
            status: FineStatus::Pending,
            notes: fine.notes.clone(),
        }))
    }

    async fn update(&self, fine: &Fine) -> AppResult<Fine> {
        self.fines.write().await.replace(fine.id, fine.clone(), "Fine")
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.fines.write().await.remove(id, "Fine")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_book(copies: i32) -> CreateBook {
        CreateBook {
            title: "Rayuela".to_string(),
            isbn: None,
            author_id: None,
            publisher_id: None,
            category_id: None,
            publication_year: None,
            language: None,
            total_copies: copies,
        }
    }

    #[tokio::test]
    async fn test_book_update_checks_version() {
        let store = MemoryStore::default();
        let book = BookStore::create(&store, &create_book(2)).await.unwrap();
        assert_eq!(book.available_copies, 2);

        let first = BookStore::update(&store, &book.with_copy_taken()).await.unwrap();
        assert_eq!(first.version, 1);

        // Second writer still holds version 0
        let stale = BookStore::update(&store, &book.with_copy_taken()).await;
        assert!(matches!(stale, Err(AppError::StaleVersion(_))));
        assert_eq!(BookStore::get(&store, book.id).await.unwrap().available_copies, 1);
    }

    #[tokio::test]
    async fn test_ids_are_assigned_serially() {
        let store = MemoryStore::default();
        let a = BookStore::create(&store, &create_book(1)).await.unwrap();
        let b = BookStore::create(&store, &create_book(1)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        BookStore::delete(&store, a.id).await.unwrap();
        assert!(matches!(BookStore::get(&store, a.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_loan_update_checks_prior_status() {
        let store = MemoryStore::default();
        let loan = LoanStore::create(
            &store,
            &NewLoan {
                book_id: 1,
                member_id: 2,
                employee_id: 1,
                reservation_id: None,
                loan_date: Utc::now(),
                due_date: Utc::now(),
                notes: None,
            },
        )
        .await
        .unwrap();
        let returned = loan.returned(Utc::now()).unwrap();

        LoanStore::update(&store, &returned, LoanStatus::Active).await.unwrap();
        let again = LoanStore::update(&store, &returned, LoanStatus::Active).await;
        assert!(matches!(again, Err(AppError::StaleVersion(_))));

        let missing = Loan { id: 99, ..returned };
        assert!(matches!(
            LoanStore::update(&store, &missing, LoanStatus::Active).await,
            Err(AppError::NotFound(_))
        ));
    }
}
