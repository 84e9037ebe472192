use std::io::Write;

use anyhow::Context;

use crate::api::{Book, User};
use crate::catalog_storage::CatalogStorage;
use crate::library_manager::LibraryManager;

fn print_status<S: CatalogStorage>(
    library: &LibraryManager<S>,
    out: &mut impl Write,
    header: &str,
) -> anyhow::Result<()> {
    writeln!(out, "{header}")?;
    library.write_books(out)?;
    library.write_users(out)?;
    Ok(())
}

/// Scripted walk through the catalog: adds two books and two users,
/// lends one book to each user and returns both, printing status in between.
/// Ids are fixed, so running it repeatedly over the same files adds duplicates.
pub fn run_demo<S: CatalogStorage>(
    library: &mut LibraryManager<S>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    library.add_book(Book::new(1, "1984", "George Orwell"))?;
    library.add_book(Book::new(2, "To Kill a Mockingbird", "Harper Lee"))?;
    library.register_user(User::new(101, "Alice Smith"))?;
    library.register_user(User::new(102, "Bob Johnson"))?;

    print_status(library, out, "Initial Library Status:")?;

    for (book_id, user_id) in [(1, 101), (2, 102)] {
        if !library
            .borrow_book(book_id, user_id)
            .context("Failed to borrow book")?
        {
            writeln!(out, "Book {book_id} could not be borrowed by user {user_id}")?;
        }
    }

    print_status(library, out, "\nAfter Borrowing:")?;

    for book_id in [1, 2] {
        if !library.return_book(book_id).context("Failed to return book")? {
            writeln!(out, "Book {book_id} could not be returned")?;
        }
    }

    print_status(library, out, "\nAfter Returning:")?;
    Ok(())
}
