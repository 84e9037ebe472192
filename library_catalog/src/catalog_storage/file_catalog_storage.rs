use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::api::{Book, User};
use crate::app_config::LibraryConfig;
use crate::catalog_storage::{CatalogError, CatalogStorage};
use crate::record_codec::LineRecord;

/// Stores books and users in two plain text files, one record per line
pub struct FileCatalogStorage {
    books_path: PathBuf,
    users_path: PathBuf,
    delimiter: char,
}

impl FileCatalogStorage {
    /// Fails if the config describes a format that could not be read back
    pub fn new(config: &LibraryConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        Ok(Self {
            books_path: config.books_path.clone(),
            users_path: config.users_path.clone(),
            delimiter: config.delimiter,
        })
    }

    pub fn books_path(&self) -> &Path {
        &self.books_path
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }
}

impl CatalogStorage for FileCatalogStorage {
    fn delimiter(&self) -> char {
        self.delimiter
    }

    fn load_books(&self) -> Result<Vec<Book>, CatalogError> {
        load_records(&self.books_path, self.delimiter)
    }

    fn load_users(&self) -> Result<Vec<User>, CatalogError> {
        load_records(&self.users_path, self.delimiter)
    }

    fn save_books(&self, books: &[Book]) -> Result<(), CatalogError> {
        save_records(&self.books_path, books, self.delimiter)
    }

    fn save_users(&self, users: &[User]) -> Result<(), CatalogError> {
        save_records(&self.users_path, users, self.delimiter)
    }
}

fn load_records<R: LineRecord>(path: &Path, delimiter: char) -> Result<Vec<R>, CatalogError> {
    let io_error = |source: std::io::Error| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!("{} does not exist yet, nothing to load", path.display());
            return Ok(vec![]);
        }
        Err(err) => return Err(io_error(err)),
    };

    let mut records = vec![];
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_error)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = R::decode(&line, delimiter).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            line_no: index + 1,
            source,
        })?;
        records.push(record);
    }

    tracing::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn save_records<R: LineRecord>(
    path: &Path,
    records: &[R],
    delimiter: char,
) -> Result<(), CatalogError> {
    let io_error = |source: std::io::Error| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    // File::create truncates, the whole sequence is rewritten on every save
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    for record in records {
        writeln!(writer, "{}", record.encode(delimiter)).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;

    tracing::debug!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}
