use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub type BookId = i32;
pub type UserId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Struct representing a single book in the catalog
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// false while the book is borrowed
    pub available: bool,
}

impl Book {
    /// Creates a book that is available for borrowing
    pub fn new(id: BookId, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            available: true,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Book ID: {}, Title: {}, Author: {}, Available: {}",
            self.id,
            self.title,
            self.author,
            if self.available { "Yes" } else { "No" }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Struct representing a registered user together with the ids of books borrowed so far
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Book ids in borrow order, duplicates allowed
    pub borrowed_books: Vec<BookId>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            borrowed_books: vec![],
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User ID: {}, Name: {}", self.id, self.name)?;
        if !self.borrowed_books.is_empty() {
            write!(
                f,
                "\nBorrowed Book IDs: {}",
                self.borrowed_books.iter().join(" ")
            )?;
        }
        Ok(())
    }
}
