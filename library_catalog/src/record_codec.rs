//! Line based text encoding of catalog records.
//!
//! Every record occupies exactly one line, fields are joined with a single
//! delimiter character and no escaping is performed. Text fields therefore
//! must never contain the delimiter or a line break, see [`is_encodable`].

use std::str::Split;

use itertools::Itertools;

use crate::api::{Book, BookId, User};

pub const DEFAULT_DELIMITER: char = ',';

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("Missing field {0}")]
    MissingField(&'static str),

    #[error("Field {field} is not a valid integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("Unexpected trailing field {0:?}")]
    UnexpectedField(String),
}

/// Record that can be stored as a single delimited line
pub trait LineRecord: Sized {
    /// Encodes record into a line, without the line terminator
    fn encode(&self, delimiter: char) -> String;
    /// Decodes record from a line previously produced by [`LineRecord::encode`]
    fn decode(line: &str, delimiter: char) -> Result<Self, RecordParseError>;
}

/// Returns true if the value can be written as a text field without corrupting the line
pub fn is_encodable(value: &str, delimiter: char) -> bool {
    !value.contains(|c: char| c == delimiter || c == '\n' || c == '\r')
}

fn next_field<'a>(
    fields: &mut Split<'a, char>,
    field: &'static str,
) -> Result<&'a str, RecordParseError> {
    fields.next().ok_or(RecordParseError::MissingField(field))
}

fn parse_id(value: &str, field: &'static str) -> Result<BookId, RecordParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| RecordParseError::InvalidInteger {
            field,
            value: value.to_string(),
        })
}

impl LineRecord for Book {
    fn encode(&self, delimiter: char) -> String {
        format!(
            "{id}{d}{title}{d}{author}{d}{available}",
            id = self.id,
            title = self.title,
            author = self.author,
            available = if self.available { "1" } else { "0" },
            d = delimiter,
        )
    }

    fn decode(line: &str, delimiter: char) -> Result<Self, RecordParseError> {
        let mut fields = line.split(delimiter);
        let id = parse_id(next_field(&mut fields, "id")?, "id")?;
        let title = next_field(&mut fields, "title")?.to_string();
        let author = next_field(&mut fields, "author")?.to_string();
        let available = next_field(&mut fields, "available")? == "1";

        // More than four fields means a text field contained the delimiter
        if let Some(extra) = fields.next() {
            return Err(RecordParseError::UnexpectedField(extra.to_string()));
        }

        Ok(Self {
            id,
            title,
            author,
            available,
        })
    }
}

impl LineRecord for User {
    fn encode(&self, delimiter: char) -> String {
        std::iter::once(self.id.to_string())
            .chain(std::iter::once(self.name.clone()))
            .chain(self.borrowed_books.iter().map(ToString::to_string))
            .join(&delimiter.to_string())
    }

    fn decode(line: &str, delimiter: char) -> Result<Self, RecordParseError> {
        let mut fields = line.split(delimiter);
        let id = parse_id(next_field(&mut fields, "id")?, "id")?;
        let name = next_field(&mut fields, "name")?.to_string();
        let borrowed_books = fields
            .map(|field| parse_id(field, "borrowed book id"))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            id,
            name,
            borrowed_books,
        })
    }
}
