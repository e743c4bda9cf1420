//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities, providing a clean API for data access with tenant-aware methods.

pub mod admin;
pub mod product;
pub mod tenant;

pub use admin::AdminRepository;
pub use product::{ProductRecord, ProductRepository};
pub use tenant::{NewTenant, TenantRepository};
