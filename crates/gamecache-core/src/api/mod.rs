//! REST API client module for the remote game catalog.
//!
//! This module provides the `CatalogService` trait the cache manager talks
//! to, and `ApiClient`, its HTTP implementation over the catalog's
//! `/Games` and `/Categories` endpoints.
//!
//! The client never retries: a failed call is returned to the caller as an
//! `ApiError` and the caller decides how to report it.

pub mod client;
pub mod error;

pub use client::{ApiClient, CatalogService};
pub use error::ApiError;
