use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Default bridge could not be created: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Logging already initialized or invalid: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
