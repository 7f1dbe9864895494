//! Error types for building, parsing and serializing node trees.

use thiserror::Error;

/// Result type alias for xmlnode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, mutating or serializing a tree.
#[derive(Debug, Error)]
pub enum Error {
    /// XML syntax error reported by the tokenizer.
    #[error("XML syntax error: {message}{}", format_position(position))]
    XmlSyntax {
        message: String,
        /// Byte offset where the error occurred.
        position: Option<u64>,
    },

    /// The byte source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected end of input.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
    },

    /// Invalid XML structure.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure { message: String },

    /// Empty document (no root element).
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// A second element started after the root element was closed.
    #[error("Invalid XML: multiple root elements")]
    MultipleRoots,

    /// The requested mutation would break the tree shape.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Child position past the end of the children list.
    #[error("Child index {index} out of range for node with {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    /// The output writer rejected a call.
    #[error("Write error: {message}")]
    Write { message: String },
}

fn format_position(position: &Option<u64>) -> String {
    match position {
        Some(pos) => format!(" at byte {}", pos),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_structure(message: impl Into<String>) -> Self {
        Error::InvalidStructure {
            message: message.into(),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::XmlSyntax {
                message: other.to_string(),
                position: None,
            },
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            position: None,
        }
    }
}
