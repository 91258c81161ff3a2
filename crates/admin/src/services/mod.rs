//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password sign-in gated on the `admins` collection
//! - `catalog` - Product and category writes

pub mod auth;
pub mod catalog;

pub use auth::{AdminAuthService, Authorization, LoginError};
pub use catalog::{Catalog, CatalogService};
