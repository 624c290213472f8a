//! Books repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    /// List books, optionally filtered by title fragment and availability
    async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let pattern = query.title.as_ref().map(|t| format!("%{}%", t));

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::boolean IS NULL OR $2 = FALSE OR available_copies > 0)
            ORDER BY title
            "#,
        )
        .bind(pattern)
        .bind(query.available)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, isbn, author_id, publisher_id, category_id,
                publication_year, language, total_copies, available_copies
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.publisher_id)
        .bind(data.category_id)
        .bind(data.publication_year)
        .bind(&data.language)
        .bind(data.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Compare-and-swap on `version`
    async fn update(&self, book: &Book) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = $3, isbn = $4, author_id = $5, publisher_id = $6,
                category_id = $7, publication_year = $8, language = $9,
                total_copies = $10, available_copies = $11,
                version = version + 1, updated_at = $12
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(book.version)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.publisher_id)
        .bind(book.category_id)
        .bind(book.publication_year)
        .bind(&book.language)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(book) => Ok(book),
            None => {
                // Distinguish a missing row from a lost race
                let current = self.get(book.id).await?;
                Err(AppError::StaleVersion(format!(
                    "book {} is at version {}, update was based on {}",
                    book.id, current.version, book.version
                )))
            }
        }
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
