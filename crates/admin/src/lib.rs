//! Acsess Admin library.
//!
//! This crate provides the back-office functionality as a library so the CLI
//! and the integration tests can reuse repositories and services.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE operations:
//! - Admin account management and password hashing
//! - Admin token signing
//! - Telegram bot credentials

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
pub mod telegram;
