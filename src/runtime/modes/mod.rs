//! Mode routing
//!
//! - Server mode (HTTP server)
//! - CLI mode (legacy CSV import/export, config generation)

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;
