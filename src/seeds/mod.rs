//! Database seeding functionality
//!
//! Populates an empty local database with a demo storefront so the API is
//! usable straight after `cargo run`.

pub mod demo;

pub use demo::{DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, seed_demo};
