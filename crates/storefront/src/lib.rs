//! Acsess Storefront library.
//!
//! The public shop API as a library, so the CLI and the integration tests
//! can reuse its repositories and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
