//! Registry error types.

use reel_models::asset::TransitionError;
use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Registry lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}
