//! Repository interfaces for tracked products
//!
//! Contains the storage contract the serving layer and the scrapers'
//! callers rely on, together with its error taxonomy.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::product::Product;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize products: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Product with ID {id} not found")]
    NotFound { id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Canonical holder of every known product
///
/// Two lookups with different not-found policies are part of the contract
/// and must not be merged:
/// - [`ProductRepository::get`] treats a missing id as [`StoreError::NotFound`]
/// - [`ProductRepository::get_by_id`] returns `Ok(None)` for a missing id
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert or replace the product with the same id and persist the change
    async fn save(&self, product: &Product) -> StoreResult<()>;

    /// Look up a product; absence is an error
    async fn get(&self, id: &str) -> StoreResult<Product>;

    /// Look up a product; absence is `Ok(None)`
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>>;

    /// All products in unspecified order
    async fn get_all(&self) -> StoreResult<Vec<Product>>;

    /// Remove a product and persist the change; unknown ids are an error
    async fn delete(&self, id: &str) -> StoreResult<()>;
}
