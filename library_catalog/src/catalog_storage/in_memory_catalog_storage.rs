use std::path::PathBuf;

use crate::api::{Book, User};
use crate::catalog_storage::{CatalogError, CatalogStorage};
use crate::record_codec::{LineRecord, DEFAULT_DELIMITER};

/// Keeps encoded lines in memory instead of files.
/// Records still go through the line codec so behaviour matches [`super::FileCatalogStorage`].
#[derive(Default)]
pub struct InMemoryCatalogStorage {
    book_lines: parking_lot::Mutex<Vec<String>>,
    user_lines: parking_lot::Mutex<Vec<String>>,
}

impl InMemoryCatalogStorage {
    /// Creates storage preloaded with raw lines
    pub fn with_lines(book_lines: Vec<String>, user_lines: Vec<String>) -> Self {
        Self {
            book_lines: parking_lot::Mutex::new(book_lines),
            user_lines: parking_lot::Mutex::new(user_lines),
        }
    }

    pub fn book_lines(&self) -> Vec<String> {
        self.book_lines.lock().clone()
    }

    pub fn user_lines(&self) -> Vec<String> {
        self.user_lines.lock().clone()
    }
}

fn decode_lines<R: LineRecord>(lines: &[String], name: &str) -> Result<Vec<R>, CatalogError> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            R::decode(line, DEFAULT_DELIMITER).map_err(|source| CatalogError::Parse {
                path: PathBuf::from(name),
                line_no: index + 1,
                source,
            })
        })
        .collect()
}

impl CatalogStorage for InMemoryCatalogStorage {
    fn load_books(&self) -> Result<Vec<Book>, CatalogError> {
        decode_lines(&self.book_lines.lock(), "memory:books")
    }

    fn load_users(&self) -> Result<Vec<User>, CatalogError> {
        decode_lines(&self.user_lines.lock(), "memory:users")
    }

    fn save_books(&self, books: &[Book]) -> Result<(), CatalogError> {
        *self.book_lines.lock() = books
            .iter()
            .map(|book| book.encode(DEFAULT_DELIMITER))
            .collect();
        Ok(())
    }

    fn save_users(&self, users: &[User]) -> Result<(), CatalogError> {
        *self.user_lines.lock() = users
            .iter()
            .map(|user| user.encode(DEFAULT_DELIMITER))
            .collect();
        Ok(())
    }
}
