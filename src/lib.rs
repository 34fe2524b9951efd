//! BiMarket - wish-list and group-buying marketplace backend
//!
//! Buyers submit wish products, browse a public list and petition the
//! entries they want; administrators review submissions.
//!
//! # Architecture
//! - `storage`: SeaORM storage backend (wish products, categories, petitions, uploads)
//! - `services`: business logic shared by HTTP handlers and the CLI
//! - `api`: HTTP handlers and middleware
//! - `interfaces`: command-line commands (legacy CSV import/export, config)
//! - `config`: configuration loading (TOML + `BM__*` env vars)
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
