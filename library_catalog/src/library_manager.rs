//! In-memory catalog of books and users mirrored to a [`CatalogStorage`].
//!
//! Records are kept in insertion order. Each id is additionally indexed to the
//! position of its first occurrence, so lookups by id are constant time and,
//! when callers insert duplicate ids, always resolve to the earliest record.
//! Duplicates are stored and persisted as given.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::api::{Book, BookId, User, UserId};
use crate::app_config::LibraryConfig;
use crate::catalog_storage::{CatalogError, CatalogStorage, FileCatalogStorage};
use crate::record_codec::is_encodable;

pub struct LibraryManager<S: CatalogStorage> {
    storage: S,
    books: Vec<Book>,
    users: Vec<User>,
    book_index: HashMap<BookId, usize>,
    user_index: HashMap<UserId, usize>,
}

fn index_first_occurrence<T>(
    records: &[T],
    id_of: impl Fn(&T) -> i32,
) -> HashMap<i32, usize> {
    let mut index = HashMap::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        index.entry(id_of(record)).or_insert(position);
    }
    index
}

impl LibraryManager<FileCatalogStorage> {
    /// Opens catalog persisted in files described by config
    pub fn open_files(config: &LibraryConfig) -> Result<Self, CatalogError> {
        Self::open(FileCatalogStorage::new(config)?)
    }
}

impl<S: CatalogStorage> LibraryManager<S> {
    /// Loads books and then users from storage
    pub fn open(storage: S) -> Result<Self, CatalogError> {
        let books = storage.load_books()?;
        let users = storage.load_users()?;
        tracing::info!(
            "Opened catalog with {} books and {} users",
            books.len(),
            users.len()
        );

        Ok(Self {
            book_index: index_first_occurrence(&books, |book| book.id),
            user_index: index_first_occurrence(&users, |user| user.id),
            storage,
            books,
            users,
        })
    }

    /// Persists both sequences and hands the storage back
    pub fn close(self) -> Result<S, CatalogError> {
        self.save_books()?;
        self.save_users()?;
        tracing::info!("Closed catalog");
        Ok(self.storage)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Returns first book with given id
    pub fn get_book(&self, book_id: BookId) -> Result<&Book, CatalogError> {
        self.book_index
            .get(&book_id)
            .map(|&position| &self.books[position])
            .ok_or(CatalogError::BookNotFound(book_id))
    }

    /// Returns first user with given id
    pub fn get_user(&self, user_id: UserId) -> Result<&User, CatalogError> {
        self.user_index
            .get(&user_id)
            .map(|&position| &self.users[position])
            .ok_or(CatalogError::UserNotFound(user_id))
    }

    pub fn save_books(&self) -> Result<(), CatalogError> {
        self.storage.save_books(&self.books)
    }

    pub fn save_users(&self) -> Result<(), CatalogError> {
        self.storage.save_users(&self.users)
    }

    fn ensure_encodable(&self, field: &'static str, value: &str) -> Result<(), CatalogError> {
        if is_encodable(value, self.storage.delimiter()) {
            Ok(())
        } else {
            Err(CatalogError::InvalidField {
                field,
                value: value.to_string(),
            })
        }
    }

    /// Appends book and persists books. Ids are not checked for uniqueness.
    pub fn add_book(&mut self, book: Book) -> Result<(), CatalogError> {
        self.ensure_encodable("title", &book.title)?;
        self.ensure_encodable("author", &book.author)?;

        tracing::info!("Adding book {} {:?}", book.id, book.title);
        self.book_index.entry(book.id).or_insert(self.books.len());
        self.books.push(book);
        self.save_books()
    }

    /// Appends user and persists users. Ids are not checked for uniqueness.
    pub fn register_user(&mut self, user: User) -> Result<(), CatalogError> {
        self.ensure_encodable("name", &user.name)?;

        tracing::info!("Registering user {} {:?}", user.id, user.name);
        self.user_index.entry(user.id).or_insert(self.users.len());
        self.users.push(user);
        self.save_users()
    }

    /// Lends an available book to an existing user.
    /// Returns false without touching anything when the book is unknown or
    /// already borrowed, or when the user is unknown.
    /// On success both sequences are persisted.
    pub fn borrow_book(&mut self, book_id: BookId, user_id: UserId) -> Result<bool, CatalogError> {
        let Some(&book_position) = self.book_index.get(&book_id) else {
            tracing::warn!("Cannot borrow book {}: not found", book_id);
            return Ok(false);
        };
        if !self.books[book_position].available {
            tracing::warn!("Cannot borrow book {}: already borrowed", book_id);
            return Ok(false);
        }
        // user is resolved before the book changes state
        let Some(&user_position) = self.user_index.get(&user_id) else {
            tracing::warn!("Cannot borrow book {}: user {} not found", book_id, user_id);
            return Ok(false);
        };

        self.books[book_position].available = false;
        self.users[user_position].borrowed_books.push(book_id);
        tracing::info!("Book {} borrowed by user {}", book_id, user_id);

        self.save_books()?;
        self.save_users()?;
        Ok(true)
    }

    /// Marks a borrowed book as available again and persists books.
    /// The borrower keeps the id in their borrowed list.
    pub fn return_book(&mut self, book_id: BookId) -> Result<bool, CatalogError> {
        let Some(&book_position) = self.book_index.get(&book_id) else {
            tracing::warn!("Cannot return book {}: not found", book_id);
            return Ok(false);
        };
        let book = &mut self.books[book_position];
        if book.available {
            tracing::warn!("Cannot return book {}: not borrowed", book_id);
            return Ok(false);
        }

        book.available = true;
        tracing::info!("Book {} returned", book_id);
        self.save_books()?;
        Ok(true)
    }

    pub fn write_books(&self, out: &mut impl Write) -> io::Result<()> {
        for book in &self.books {
            writeln!(out, "{book}")?;
        }
        Ok(())
    }

    pub fn write_users(&self, out: &mut impl Write) -> io::Result<()> {
        for user in &self.users {
            writeln!(out, "{user}")?;
        }
        Ok(())
    }

    /// Prints all books to stdout in catalog order
    pub fn display_books(&self) -> io::Result<()> {
        self.write_books(&mut io::stdout().lock())
    }

    /// Prints all users to stdout in registration order
    pub fn display_users(&self) -> io::Result<()> {
        self.write_users(&mut io::stdout().lock())
    }
}

#[cfg(test)]
mod library_manager_tests {
    use super::*;
    use crate::catalog_storage::InMemoryCatalogStorage;

    fn sample_library() -> LibraryManager<InMemoryCatalogStorage> {
        let mut library = LibraryManager::open(InMemoryCatalogStorage::default())
            .expect("Failed to open library");
        library
            .add_book(Book::new(1, "1984", "George Orwell"))
            .expect("Failed to add book");
        library
            .add_book(Book::new(2, "To Kill a Mockingbird", "Harper Lee"))
            .expect("Failed to add book");
        library
            .register_user(User::new(101, "Alice Smith"))
            .expect("Failed to register user");
        library
            .register_user(User::new(102, "Bob Johnson"))
            .expect("Failed to register user");
        library
    }

    #[test]
    /// Every add is written through to storage immediately
    fn test_add_is_persisted() {
        let library = sample_library();

        assert_eq!(
            library.storage().book_lines(),
            vec![
                "1,1984,George Orwell,1".to_string(),
                "2,To Kill a Mockingbird,Harper Lee,1".to_string()
            ]
        );
        assert_eq!(
            library.storage().user_lines(),
            vec!["101,Alice Smith".to_string(), "102,Bob Johnson".to_string()]
        );
    }

    #[test]
    fn test_get_book_and_user() {
        let library = sample_library();

        assert_eq!(
            library.get_book(2).expect("Failed to get book").title,
            "To Kill a Mockingbird"
        );
        assert_eq!(
            library.get_user(101).expect("Failed to get user").name,
            "Alice Smith"
        );
        assert!(matches!(
            library.get_book(3),
            Err(CatalogError::BookNotFound(3))
        ));
        assert!(matches!(
            library.get_user(103),
            Err(CatalogError::UserNotFound(103))
        ));
    }

    #[test]
    /// 1. Borrows available book for existing user
    /// 2. Checks book is borrowed and id appended to user list
    /// 3. Checks both sequences were persisted
    fn test_borrow_available_book() {
        let mut library = sample_library();

        assert!(library.borrow_book(1, 101).expect("Failed to borrow"));

        assert!(!library.get_book(1).expect("Failed to get book").available);
        assert_eq!(
            library.get_user(101).expect("Failed to get user").borrowed_books,
            vec![1]
        );
        assert_eq!(
            library.storage().book_lines()[0],
            "1,1984,George Orwell,0".to_string()
        );
        assert_eq!(
            library.storage().user_lines()[0],
            "101,Alice Smith,1".to_string()
        );
    }

    #[test]
    fn test_borrow_already_borrowed_book_changes_nothing() {
        let mut library = sample_library();
        assert!(library.borrow_book(1, 101).expect("Failed to borrow"));
        let books_before = library.books().to_vec();
        let users_before = library.users().to_vec();

        assert!(!library.borrow_book(1, 102).expect("Failed to borrow"));

        assert_eq!(library.books(), books_before.as_slice());
        assert_eq!(library.users(), users_before.as_slice());
    }

    #[test]
    fn test_borrow_unknown_book_changes_nothing() {
        let mut library = sample_library();
        let books_before = library.books().to_vec();
        let users_before = library.users().to_vec();

        assert!(!library.borrow_book(99, 101).expect("Failed to borrow"));

        assert_eq!(library.books(), books_before.as_slice());
        assert_eq!(library.users(), users_before.as_slice());
    }

    #[test]
    /// Unknown borrower must not leave the book stuck in borrowed state
    fn test_borrow_by_unknown_user_keeps_book_available() {
        let mut library = sample_library();

        assert!(!library.borrow_book(1, 999).expect("Failed to borrow"));

        assert!(library.get_book(1).expect("Failed to get book").available);
        assert_eq!(
            library.storage().book_lines()[0],
            "1,1984,George Orwell,1".to_string()
        );
        // book can still be borrowed by a real user afterwards
        assert!(library.borrow_book(1, 102).expect("Failed to borrow"));
    }

    #[test]
    /// 1. Return of available book is rejected
    /// 2. Return of borrowed book makes it available and persists books
    /// 3. Borrower list keeps the id after return
    /// 4. Borrowing again appends the id once more
    fn test_return_book() {
        let mut library = sample_library();

        assert!(!library.return_book(1).expect("Failed to return"));
        assert!(!library.return_book(99).expect("Failed to return"));

        assert!(library.borrow_book(1, 101).expect("Failed to borrow"));
        assert!(library.return_book(1).expect("Failed to return"));

        assert!(library.get_book(1).expect("Failed to get book").available);
        assert_eq!(
            library.storage().book_lines()[0],
            "1,1984,George Orwell,1".to_string()
        );
        assert_eq!(
            library.get_user(101).expect("Failed to get user").borrowed_books,
            vec![1]
        );

        assert!(library.borrow_book(1, 101).expect("Failed to borrow"));
        assert_eq!(
            library.get_user(101).expect("Failed to get user").borrowed_books,
            vec![1, 1]
        );
    }

    #[test]
    /// Duplicate ids are stored, lookups and lending act on the first one
    fn test_duplicate_ids_resolve_to_first_record() {
        let mut library = sample_library();
        library
            .add_book(Book::new(1, "Animal Farm", "George Orwell"))
            .expect("Failed to add book");

        assert_eq!(library.books().len(), 3);
        assert_eq!(library.get_book(1).expect("Failed to get book").title, "1984");

        assert!(library.borrow_book(1, 101).expect("Failed to borrow"));
        assert!(!library.books()[0].available);
        assert!(library.books()[2].available);
        // first copy is borrowed, the duplicate is never reached
        assert!(!library.borrow_book(1, 102).expect("Failed to borrow"));
    }

    #[test]
    fn test_fields_with_delimiter_are_rejected() {
        let mut library = sample_library();

        assert!(matches!(
            library.add_book(Book::new(3, "Title, with comma", "Author")),
            Err(CatalogError::InvalidField { field: "title", .. })
        ));
        assert!(matches!(
            library.add_book(Book::new(3, "Title", "Last, First")),
            Err(CatalogError::InvalidField { field: "author", .. })
        ));
        assert!(matches!(
            library.register_user(User::new(103, "Two\nLines")),
            Err(CatalogError::InvalidField { field: "name", .. })
        ));
        assert_eq!(library.books().len(), 2);
        assert_eq!(library.users().len(), 2);
    }

    #[test]
    /// Close then reopen over the same storage restores identical state
    fn test_close_and_reopen() {
        let mut library = sample_library();
        assert!(library.borrow_book(2, 102).expect("Failed to borrow"));
        let books = library.books().to_vec();
        let users = library.users().to_vec();

        let storage = library.close().expect("Failed to close");
        let reopened = LibraryManager::open(storage).expect("Failed to reopen");

        assert_eq!(reopened.books(), books.as_slice());
        assert_eq!(reopened.users(), users.as_slice());
        assert!(reopened.get_user(102).is_ok());
    }

    #[test]
    fn test_write_listing() {
        let mut library = sample_library();
        assert!(library.borrow_book(2, 102).expect("Failed to borrow"));

        let mut books_out = vec![];
        library
            .write_books(&mut books_out)
            .expect("Failed to write books");
        assert_eq!(
            String::from_utf8(books_out).expect("Invalid utf8"),
            "Book ID: 1, Title: 1984, Author: George Orwell, Available: Yes\n\
             Book ID: 2, Title: To Kill a Mockingbird, Author: Harper Lee, Available: No\n"
        );

        let mut users_out = vec![];
        library
            .write_users(&mut users_out)
            .expect("Failed to write users");
        assert_eq!(
            String::from_utf8(users_out).expect("Invalid utf8"),
            "User ID: 101, Name: Alice Smith\n\
             User ID: 102, Name: Bob Johnson\n\
             Borrowed Book IDs: 2\n"
        );
    }

    #[test]
    fn test_open_fails_on_corrupted_storage() {
        let storage = InMemoryCatalogStorage::with_lines(vec!["one,1984,Orwell,1".into()], vec![]);

        assert!(matches!(
            LibraryManager::open(storage),
            Err(CatalogError::Parse { line_no: 1, .. })
        ));
    }
}
