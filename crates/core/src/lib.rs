//! Trident Nova Core - Shared types library.
//!
//! This crate provides the types shared by the Trident Nova components:
//! - `admin` - Inventory control panel (products, categories, admin gate)
//! - `cli` - Command-line tools for sessions and admin grants
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Record persistence is owned by the
//! document store behind the admin crate; everything here is a read model
//! or a validated write payload.
//!
//! # Modules
//!
//! - [`types`] - Document IDs, emails, products, and categories
//! - [`link`] - Shared-drive link normalization for image rendering

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod link;
pub mod types;

pub use link::{PLACEHOLDER_IMAGE_URL, display_image, is_drive_link, normalize_drive_link};
pub use types::*;
