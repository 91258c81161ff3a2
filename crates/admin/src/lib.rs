//! Trident Nova Admin library.
//!
//! This crate provides the inventory control panel as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! Every page except the login page requires a signed-in identity that also
//! has a document in the `admins` collection. Record store calls carry the
//! admin's own ID token, so the store's access rules still apply.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod gateway;
pub mod inventory;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
