//! Catalog management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get(id).await
    }

    /// Create a book with all of its copies available
    pub async fn create_book(&self, data: &CreateBook) -> AppResult<Book> {
        data.validate()?;
        let book = self.repository.books.create(data).await?;
        tracing::info!(book_id = book.id, copies = book.total_copies, "Book added to catalog");
        Ok(book)
    }

    /// Edit a book. Changing the copy total resets the available count.
    pub async fn update_book(&self, id: i32, edit: &UpdateBook) -> AppResult<Book> {
        edit.validate()?;
        let current = self.repository.books.get(id).await?;
        let edited = current.with_catalog_edit(edit);
        if edit.total_copies.is_some() && current.available_copies != current.total_copies {
            tracing::warn!(
                book_id = id,
                outstanding = current.total_copies - current.available_copies,
                "Copy total edited while copies are out; available count reset to total"
            );
        }
        self.repository.books.update(&edited).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book removed from catalog");
        Ok(())
    }
}
