//! Command-line interface definitions using clap
//!
//! 不带子命令时直接启动 HTTP 服务。

use clap::{Parser, Subcommand};

/// BiMarket - wish-list and group-buying marketplace backend
#[derive(Parser)]
#[command(name = "bimarket")]
#[command(version)]
#[command(about = "Wish-list and group-buying marketplace backend", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Import legacy CSV data files into the database
    ///
    /// Reads wish-products.csv, product-categories.csv and file-uploads.csv
    /// from the data directory. Missing files are skipped.
    ImportCsv {
        /// Legacy data directory (default: storage.data_dir)
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Export the database into legacy CSV data files
    ///
    /// Existing files are copied to <data_dir>/backups/ first.
    ExportCsv {
        /// Target data directory (default: storage.data_dir)
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        #[arg(long, short = 'o')]
        output: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// 是否以服务器模式运行
    pub fn is_server_mode(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_server() {
        let cli = Cli::try_parse_from(["bimarket"]).expect("parse");
        assert!(cli.is_server_mode());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_import_csv_with_data_dir() {
        let cli = Cli::try_parse_from(["bimarket", "import-csv", "--data-dir", "legacy"])
            .expect("parse");
        assert!(!cli.is_server_mode());
        match cli.command {
            Some(Commands::ImportCsv { data_dir }) => assert_eq!(data_dir.as_deref(), Some("legacy")),
            _ => panic!("expected import-csv"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from([
            "bimarket",
            "config",
            "generate",
            "--output",
            "out.toml",
            "--config",
            "custom.toml",
        ])
        .expect("parse");
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        match cli.command {
            Some(Commands::Config {
                action: ConfigCommands::Generate { output, force },
            }) => {
                assert_eq!(output.as_deref(), Some("out.toml"));
                assert!(!force);
            }
            _ => panic!("expected config generate"),
        }
    }
}
