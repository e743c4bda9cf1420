//! # Storefront API Library
//!
//! Core of the multi-tenant phone storefront service: tenant resolution,
//! the catalog view model, admin product management and the HTTP surface.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod gallery;
pub mod handlers;
pub mod inquiry;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod services;
pub mod storage;
pub mod telemetry;
pub mod tenancy;
pub use migration;
