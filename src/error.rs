//! Error types for loading and configuring documents.
//!
//! Parsing never panics or escapes as an exception: every failure is
//! reported as a `ParseError` value. Editing has no error channel at all;
//! writing a tree back out reports `ExportError`.

use thiserror::Error;

const MEBIBYTE: usize = 1024 * 1024;

/// Why an XML document could not be turned into a node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or whitespace only
    #[error("XML content is empty")]
    Empty,

    /// Input is longer than the configured byte limit
    #[error("File size exceeds maximum limit of {}MB", .limit / MEBIBYTE)]
    TooLarge { limit: usize },

    /// The underlying reader rejected the document
    #[error("XML parsing failed: {message}")]
    Malformed { message: String },

    /// The reader succeeded but produced no element to root the tree
    #[error("Failed to parse XML structure")]
    NoRoot,

    /// The advisory file name does not look like an XML file
    #[error("Please select an XML file (.xml extension)")]
    InvalidFileType { file_name: String },
}

impl ParseError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ParseError::Malformed {
            message: message.into(),
        }
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::malformed(err.to_string())
    }
}

/// A tree could not be written back out as XML.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Exported XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Settings could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}
