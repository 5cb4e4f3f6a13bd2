//! Domain module - Core entities and repository contracts
//!
//! This module contains the product entity with its price history,
//! identifier derivation from marketplace URLs, and the storage traits
//! the infrastructure layer implements.

pub mod product;
pub mod product_id;
pub mod repositories;

// Re-export commonly used items for convenience
pub use product::{PricePoint, Product};
pub use product_id::derive_product_id;
pub use repositories::ProductRepository;
