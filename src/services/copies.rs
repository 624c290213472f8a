//! Available-copy bookkeeping for books.
//!
//! Every adjustment is a read, a pure transformation of the [`Book`] value and
//! a versioned write. A write that loses a race against another writer is
//! retried from a fresh read, up to the configured number of attempts.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
    repository::BookStore,
};

#[derive(Clone)]
pub struct CopyLedger {
    books: Arc<dyn BookStore>,
    max_attempts: u32,
}

impl CopyLedger {
    pub fn new(books: Arc<dyn BookStore>, max_attempts: u32) -> Self {
        Self {
            books,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Debit one copy, failing with `NoCopiesAvailable` when none is left
    pub async fn take_available(&self, book_id: i32) -> AppResult<Book> {
        self.adjust(book_id, |book| {
            if !book.has_available_copy() {
                return Err(AppError::NoCopiesAvailable(book.id));
            }
            Ok(book.with_copy_taken())
        })
        .await
    }

    /// Debit one copy, clamping at zero
    pub async fn take(&self, book_id: i32) -> AppResult<Book> {
        self.adjust(book_id, |book| {
            if !book.has_available_copy() {
                tracing::warn!(book_id = book.id, "Debiting a copy of a book with none available");
            }
            Ok(book.with_copy_taken())
        })
        .await
    }

    /// Credit one copy back, clamping at the total
    pub async fn release(&self, book_id: i32) -> AppResult<Book> {
        self.adjust(book_id, |book| {
            if book.available_copies >= book.total_copies {
                tracing::debug!(book_id = book.id, "Copy release clamped at total");
            }
            Ok(book.with_copy_returned())
        })
        .await
    }

    async fn adjust<F>(&self, book_id: i32, change: F) -> AppResult<Book>
    where
        F: Fn(&Book) -> AppResult<Book>,
    {
        let mut attempt = 1;
        loop {
            let current = self.books.get(book_id).await?;
            let next = change(&current)?;
            if next.available_copies == current.available_copies {
                return Ok(current);
            }

            match self.books.update(&next).await {
                Err(AppError::StaleVersion(msg)) if attempt < self.max_attempts => {
                    tracing::debug!(book_id, attempt, "Retrying copy update: {}", msg);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
