//! CLI command implementations

mod config_gen;
mod csv_transfer;

pub use config_gen::config_generate;
pub use csv_transfer::{export_csv, import_csv};
