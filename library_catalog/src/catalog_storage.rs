use std::path::PathBuf;

pub use file_catalog_storage::FileCatalogStorage;
pub use in_memory_catalog_storage::InMemoryCatalogStorage;

use crate::api::{Book, BookId, User, UserId};
use crate::record_codec::{RecordParseError, DEFAULT_DELIMITER};

mod file_catalog_storage;
mod in_memory_catalog_storage;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse {}:{}: {}", .path.display(), .line_no, .source)]
    Parse {
        path: PathBuf,
        line_no: usize,
        #[source]
        source: RecordParseError,
    },

    #[error("I/O failure on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Field {field} cannot be stored: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("User {0} not found")]
    UserNotFound(UserId),
}

/// Persistence backend of the catalog.
/// Every save replaces the previously stored sequence as a whole.
pub trait CatalogStorage {
    /// Field delimiter used by the underlying line format
    fn delimiter(&self) -> char {
        DEFAULT_DELIMITER
    }
    /// Loads all books in stored order, empty storage yields no books
    fn load_books(&self) -> Result<Vec<Book>, CatalogError>;
    /// Loads all users in stored order, empty storage yields no users
    fn load_users(&self) -> Result<Vec<User>, CatalogError>;
    /// Replaces stored books with given sequence
    fn save_books(&self, books: &[Book]) -> Result<(), CatalogError>;
    /// Replaces stored users with given sequence
    fn save_users(&self, users: &[User]) -> Result<(), CatalogError>;
}
