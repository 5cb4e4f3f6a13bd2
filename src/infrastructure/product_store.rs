//! JSON snapshot product store
//!
//! Keeps every product in memory, keyed by id, and rewrites the whole
//! snapshot file on each mutation. Writers hold the write lock across the
//! in-memory change and the file rewrite, so readers never observe a state
//! that is not also on disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::domain::product::Product;
use crate::domain::repositories::{ProductRepository, StoreError, StoreResult};

/// File-backed [`ProductRepository`]
#[derive(Debug)]
pub struct JsonFileProductStore {
    path: PathBuf,
    products: RwLock<HashMap<String, Product>>,
}

impl JsonFileProductStore {
    /// Open the store, loading the snapshot when the file exists
    ///
    /// A missing file is an empty store. A file that cannot be parsed as an
    /// array of products is an error.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let products = match fs::read_to_string(&path).await {
            Ok(content) => {
                let loaded: Vec<Product> =
                    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                info!("Loaded {} products from {:?}", loaded.len(), path);
                loaded.into_iter().map(|p| (p.id.clone(), p)).collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Snapshot {:?} not found, starting empty", path);
                HashMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            products: RwLock::new(products),
        })
    }

    /// Location of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the snapshot from `products`; caller holds the write lock
    async fn flush(&self, products: &HashMap<String, Product>) -> StoreResult<()> {
        let snapshot: Vec<&Product> = products.values().collect();
        let data = serde_json::to_vec_pretty(&snapshot).map_err(StoreError::Serialize)?;

        let io_error = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(io_error)?;
        file.write_all(&data).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(io_error)?;
        }

        debug!("Wrote {} products to {:?}", snapshot.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for JsonFileProductStore {
    async fn save(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        let previous = products.insert(product.id.clone(), product.clone());

        if let Err(e) = self.flush(&products).await {
            error!("Failed to persist product {}: {}", product.id, e);
            match previous {
                Some(previous) => products.insert(product.id.clone(), previous),
                None => products.remove(&product.id),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Product> {
        self.products
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn get_all(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut products = self.products.write().await;
        let Some(removed) = products.remove(id) else {
            return Err(StoreError::NotFound { id: id.to_string() });
        };

        if let Err(e) = self.flush(&products).await {
            error!("Failed to persist deletion of {}: {}", id, e);
            products.insert(id.to_string(), removed);
            return Err(e);
        }
        Ok(())
    }
}
