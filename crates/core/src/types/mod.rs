//! Core types for Trident Nova.
//!
//! This module provides type-safe wrappers for the three document kinds the
//! admin console manages.

pub mod category;
pub mod email;
pub mod id;
pub mod product;

pub use category::{Category, CategoryFields};
pub use email::{Email, EmailError};
pub use id::*;
pub use product::{Product, ProductFields, UNCATEGORIZED};
