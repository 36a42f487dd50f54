use thiserror::Error;

use crate::api::ApiError;
use crate::cache::StoreError;
use crate::models::ValidationError;

/// Failure of a catalog operation.
///
/// None of these are fatal: after any of them the catalog keeps its
/// last-known-good collections and stays usable.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Remote catalog error: {0}")]
    Remote(#[from] ApiError),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("Game not found: {0}")]
    UnknownGame(String),
}

impl CatalogError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, CatalogError::Remote(_))
    }
}
