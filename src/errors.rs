//! Error types for document parsing and value (de)serialization

use thiserror::Error;

/// Failures surfaced by the codec layer
///
/// Malformed map items are the one case handled leniently (skipped with a
/// warning inside the recursive codec); everything here aborts the current
/// read or write cycle and is reported by the controller.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A persisted tag resolved to no registered codec
    #[error("no codec registered for type '{id}' (tag '{tag}')")]
    UnknownType { tag: String, id: String },

    /// A persisted tag resolved to a type outside the allow-list
    #[error("type '{id}' is not allow-listed for decoding")]
    TypeNotAllowed { id: String },

    /// A field's text could not be parsed as the codec expects
    #[error("invalid value '{text}' for field '{field}' of {type_id}")]
    InvalidField {
        type_id: &'static str,
        field: String,
        text: String,
    },

    /// The document text is not a well-formed settings document
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A codec registration violated a registry precondition
    #[error("invalid codec registration: {0}")]
    InvalidRegistration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
