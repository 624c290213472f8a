//! Book model and copy-count bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Catalog book with its copy counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub author_id: Option<i32>,
    pub publisher_id: Option<i32>,
    pub category_id: Option<i32>,
    pub publication_year: Option<i32>,
    pub language: Option<String>,
    pub total_copies: i32,
    /// Copies neither on loan nor held by a confirmed reservation
    pub available_copies: i32,
    /// Optimistic concurrency token, bumped by every stored update
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn has_available_copy(&self) -> bool {
        self.available_copies > 0
    }

    /// Copy of this book with one fewer available copy, never below zero
    pub fn with_copy_taken(&self) -> Book {
        self.with_available(self.available_copies - 1)
    }

    /// Copy of this book with one more available copy, never above the total
    pub fn with_copy_returned(&self) -> Book {
        self.with_available(self.available_copies + 1)
    }

    fn with_available(&self, available: i32) -> Book {
        Book {
            available_copies: available.clamp(0, self.total_copies.max(0)),
            ..self.clone()
        }
    }

    /// Apply a catalog edit. A new total resets the available count to that total.
    pub fn with_catalog_edit(&self, edit: &UpdateBook) -> Book {
        let mut book = self.clone();
        if let Some(ref title) = edit.title {
            book.title = title.clone();
        }
        if edit.isbn.is_some() {
            book.isbn = edit.isbn.clone();
        }
        if edit.author_id.is_some() {
            book.author_id = edit.author_id;
        }
        if edit.publisher_id.is_some() {
            book.publisher_id = edit.publisher_id;
        }
        if edit.category_id.is_some() {
            book.category_id = edit.category_id;
        }
        if edit.publication_year.is_some() {
            book.publication_year = edit.publication_year;
        }
        if edit.language.is_some() {
            book.language = edit.language.clone();
        }
        if let Some(total) = edit.total_copies {
            book.total_copies = total;
            book.available_copies = total;
        }
        book
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub isbn: Option<String>,
    pub author_id: Option<i32>,
    pub publisher_id: Option<i32>,
    pub category_id: Option<i32>,
    pub publication_year: Option<i32>,
    pub language: Option<String>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub total_copies: i32,
}

/// Update book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author_id: Option<i32>,
    pub publisher_id: Option<i32>,
    pub category_id: Option<i32>,
    pub publication_year: Option<i32>,
    pub language: Option<String>,
    #[validate(range(min = 0, message = "Copy count cannot be negative"))]
    pub total_copies: Option<i32>,
}

/// Query parameters for books
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title fragment
    pub title: Option<String>,
    /// Only books with at least one available copy
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: i32, available: i32) -> Book {
        Book {
            id: 1,
            title: "Cien años de soledad".to_string(),
            isbn: None,
            author_id: None,
            publisher_id: None,
            category_id: None,
            publication_year: Some(1967),
            language: None,
            total_copies: total,
            available_copies: available,
            version: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_copy_adjustments_clamp() {
        assert_eq!(book(2, 0).with_copy_taken().available_copies, 0);
        assert_eq!(book(2, 2).with_copy_returned().available_copies, 2);
        assert_eq!(book(2, 1).with_copy_taken().available_copies, 0);
        assert_eq!(book(2, 1).with_copy_returned().available_copies, 2);
    }

    #[test]
    fn test_catalog_edit_resets_counts() {
        let edit = UpdateBook {
            total_copies: Some(5),
            ..Default::default()
        };
        let edited = book(3, 1).with_catalog_edit(&edit);
        assert_eq!(edited.total_copies, 5);
        assert_eq!(edited.available_copies, 5);

        let rename = UpdateBook {
            title: Some("La casa de los espíritus".to_string()),
            ..Default::default()
        };
        let renamed = book(3, 1).with_catalog_edit(&rename);
        assert_eq!(renamed.available_copies, 1);
        assert_eq!(renamed.title, "La casa de los espíritus");
    }
}
