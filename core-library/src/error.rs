use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    /// The caller's cancellation token fired, or the fetch was invalidated
    /// while in flight.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Bridge error: {0}")]
    Bridge(BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LibraryError::Cancelled)
    }

    pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> Self {
        LibraryError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<BridgeError> for LibraryError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Cancelled => LibraryError::Cancelled,
            other => LibraryError::Bridge(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
