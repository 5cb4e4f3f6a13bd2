//! Price Tracker - marketplace product extraction and price history
//!
//! Crawls marketplace product and search pages politely, extracts products
//! through selector fallback chains, and keeps their price histories in a
//! JSON snapshot store that a serving layer reads concurrently.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{ProductService, ScraperRegistry, ServiceError};
pub use domain::{PricePoint, Product};
