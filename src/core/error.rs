//! Errors surfaced on the failure channel of map operations

use thiserror::Error;

/// Wire reason for content that does not decode, or an unknown content type
pub const FORMAT_ERROR: &str = "format-error";

/// Wire reason telling the caller to reload through the collaborative path
pub const MAP_LOAD_REDIRECT: &str = "map-load-redirect";

/// Message used when content does not parse for its declared type
pub const BAD_CONTENT_MESSAGE: &str = "File content not in correct format for this file type";

/// Classification of a decode failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FormatError,
    MapLoadRedirect,
    UnsupportedFormat,
}

/// Failure to turn loaded content into a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The content does not parse as its declared content type
    #[error("File content not in correct format for this file type")]
    Format,

    /// The map lives in a collaborative session and must be loaded from `target`
    #[error("map must be loaded from {target}")]
    Redirect { target: String },

    /// No decoder is registered for the content type
    #[error("Unsupported format {content_type}")]
    UnsupportedFormat { content_type: String },
}

impl DecodeError {
    /// Redirect to the collaborative session for `map_id`
    pub fn redirect(map_id: &str) -> Self {
        Self::Redirect {
            target: format!("c{map_id}"),
        }
    }

    /// No decoder for `content_type`
    pub fn unsupported(content_type: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            content_type: content_type.into(),
        }
    }

    /// Get the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Format => ErrorKind::FormatError,
            DecodeError::Redirect { .. } => ErrorKind::MapLoadRedirect,
            DecodeError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
        }
    }

    /// Reason string reported to callers
    ///
    /// Unsupported content types are reported as format errors.
    pub fn reason(&self) -> &'static str {
        match self.kind() {
            ErrorKind::FormatError | ErrorKind::UnsupportedFormat => FORMAT_ERROR,
            ErrorKind::MapLoadRedirect => MAP_LOAD_REDIRECT,
        }
    }

    /// Message reported alongside [`DecodeError::reason`]
    pub fn message(&self) -> String {
        match self {
            DecodeError::Redirect { target } => target.clone(),
            other => other.to_string(),
        }
    }
}

/// Error from an adapter operation
///
/// Backend errors are carried untouched so callers see exactly what the
/// storage backend reported.
#[derive(Debug, Error)]
pub enum AdapterError<E> {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to encode map: {0}")]
    Encode(#[source] serde_json::Error),

    /// Displays as the backend payload itself
    #[error("{0}")]
    Backend(E),
}

impl<E> AdapterError<E> {
    /// Get the decode error, if this is one
    pub fn as_decode(&self) -> Option<&DecodeError> {
        match self {
            AdapterError::Decode(err) => Some(err),
            _ => None,
        }
    }

    /// Get the backend payload, if this is one
    pub fn as_backend(&self) -> Option<&E> {
        match self {
            AdapterError::Backend(err) => Some(err),
            _ => None,
        }
    }

    /// Take the backend payload, if this is one
    pub fn into_backend(self) -> Option<E> {
        match self {
            AdapterError::Backend(err) => Some(err),
            _ => None,
        }
    }
}
