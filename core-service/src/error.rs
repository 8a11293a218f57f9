use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl CoreError {
    /// Returns `true` when the failure is a cancelled catalog request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Library(err) if err.is_cancelled())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
