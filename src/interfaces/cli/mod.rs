//! CLI interface module
//!
//! 旧版 CSV 数据的导入导出与配置文件生成。

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::storage::StorageFactory;
use commands::{config_generate, export_csv, import_csv};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::BiMarketError> for CliError {
    fn from(err: crate::errors::BiMarketError) -> Self {
        match err {
            crate::errors::BiMarketError::CsvParse(msg) => CliError::ParseError(msg),
            other => CliError::StorageError(other.to_string()),
        }
    }
}

/// 数据目录：命令行参数优先，其次 storage.data_dir
fn resolve_data_dir(data_dir: Option<String>) -> String {
    data_dir.unwrap_or_else(|| crate::config::get_config().storage.data_dir.clone())
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // config generate 不需要数据库连接
    if let Commands::Config {
        action: ConfigCommands::Generate { output, force },
    } = cmd
    {
        return config_generate(output, force).await;
    }

    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    match cmd {
        Commands::ImportCsv { data_dir } => import_csv(storage, resolve_data_dir(data_dir)).await,
        Commands::ExportCsv { data_dir } => export_csv(storage, resolve_data_dir(data_dir)).await,
        Commands::Serve => unreachable!("server mode handled in main"),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
