use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use library_catalog::api::{Book, BookId, User, UserId};
use library_catalog::app_config::LibraryConfig;
use library_catalog::catalog_storage::CatalogStorage;
use library_catalog::demo::run_demo;
use library_catalog::library_manager::LibraryManager;
use library_catalog::telemetry::init_telemetry;

const APP_NAME: &str = "library_catalog";

#[derive(Debug, Parser)]
#[command(name = APP_NAME, about = "Catalog of books and users kept in flat text files")]
struct Cli {
    /// Config file, defaults to ./library.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the scripted add, borrow and return sequence (default)
    Demo,
    AddBook {
        #[arg(allow_negative_numbers = true)]
        id: BookId,
        title: String,
        author: String,
    },
    RegisterUser {
        #[arg(allow_negative_numbers = true)]
        id: UserId,
        name: String,
    },
    Borrow {
        #[arg(allow_negative_numbers = true)]
        book_id: BookId,
        #[arg(allow_negative_numbers = true)]
        user_id: UserId,
    },
    Return {
        #[arg(allow_negative_numbers = true)]
        book_id: BookId,
    },
    /// Lists books in catalog order
    Books {
        #[arg(long)]
        json: bool,
    },
    /// Lists users in registration order
    Users {
        #[arg(long)]
        json: bool,
    },
}

fn run<S: CatalogStorage>(library: &mut LibraryManager<S>, command: Command) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match command {
        Command::Demo => run_demo(library, &mut stdout)?,
        Command::AddBook { id, title, author } => {
            library.add_book(Book::new(id, title, author))?;
        }
        Command::RegisterUser { id, name } => library.register_user(User::new(id, name))?,
        Command::Borrow { book_id, user_id } => {
            if library.borrow_book(book_id, user_id)? {
                writeln!(stdout, "Book {book_id} borrowed by user {user_id}")?;
            } else {
                writeln!(stdout, "Borrow rejected")?;
            }
        }
        Command::Return { book_id } => {
            if library.return_book(book_id)? {
                writeln!(stdout, "Book {book_id} returned")?;
            } else {
                writeln!(stdout, "Return rejected")?;
            }
        }
        Command::Books { json: true } => {
            serde_json::to_writer_pretty(&mut stdout, library.books())?;
            writeln!(stdout)?;
        }
        Command::Books { json: false } => library.write_books(&mut stdout)?,
        Command::Users { json: true } => {
            serde_json::to_writer_pretty(&mut stdout, library.users())?;
            writeln!(stdout)?;
        }
        Command::Users { json: false } => library.write_users(&mut stdout)?,
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(APP_NAME)?;

    let config = LibraryConfig::load(cli.config.as_deref())?;
    let mut library = LibraryManager::open_files(&config).context("Failed to open catalog")?;

    run(&mut library, cli.command.unwrap_or(Command::Demo))?;

    library.close().context("Failed to save catalog")?;
    Ok(())
}
