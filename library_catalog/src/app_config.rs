use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::catalog_storage::CatalogError;
use crate::record_codec::DEFAULT_DELIMITER;

pub const DEFAULT_CONFIG_FILE: &str = "library.toml";
const ENV_PREFIX: &str = "LIBRARY";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
/// Locations and format of the persisted catalog
pub struct LibraryConfig {
    pub books_path: PathBuf,
    pub users_path: PathBuf,
    pub delimiter: char,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            books_path: PathBuf::from("books.txt"),
            users_path: PathBuf::from("users.txt"),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl LibraryConfig {
    /// Loads config layered as defaults, then config file, then `LIBRARY_*` env variables.
    /// Missing default config file is fine, missing explicitly given file is an error.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let file_source = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .set_default("books_path", defaults.books_path.to_string_lossy().into_owned())?
            .set_default("users_path", defaults.users_path.to_string_lossy().into_owned())?
            .set_default("delimiter", defaults.delimiter.to_string())?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        tracing::info!("Using configuration {:?}", config);
        Ok(config)
    }

    /// Delimiter must not be able to appear inside an encoded id or end a line
    pub fn validate(&self) -> Result<(), CatalogError> {
        let d = self.delimiter;
        if d.is_ascii_digit() || d == '-' || d == '+' || d.is_whitespace() {
            return Err(CatalogError::InvalidConfig(format!(
                "delimiter {d:?} is not allowed"
            )));
        }
        if self.books_path == self.users_path {
            return Err(CatalogError::InvalidConfig(format!(
                "books and users cannot share one file: {}",
                self.books_path.display()
            )));
        }
        Ok(())
    }
}
