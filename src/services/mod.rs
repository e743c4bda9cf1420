//! # Services
//!
//! Operations that span more than one backend (database plus object
//! storage) live here so handlers stay thin.

pub mod products;

pub use products::{ImageUpload, ProductAction, ProductForm, ProductService, ProductServiceError};
