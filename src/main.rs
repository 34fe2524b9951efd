use clap::Parser;
use colored::Colorize;

use bimarket::cli::Cli;
use bimarket::config::{get_config, init_config_from};
use bimarket::errors::BiMarketError;
use bimarket::runtime::modes::{run_cli, run_server};
use bimarket::system::init_logging;

fn print_startup_error(context: &str, err: &anyhow::Error) {
    match err.downcast_ref::<BiMarketError>() {
        Some(e) => eprintln!("{} {}", context.red().bold(), e.format_colored()),
        None => eprintln!("{} {}", context.red().bold(), format!("{:#}", err).white()),
    }
}

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(cli.config.as_deref());

    if !cli.is_server_mode() {
        let Some(command) = cli.command else {
            return;
        };
        if let Err(e) = run_cli(command).await {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
        return;
    }

    let config = get_config();

    // guard 必须存活到进程结束，保证日志刷盘
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            print_startup_error("Failed to initialize logging:", &e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server().await {
        print_startup_error("Server error:", &e);
        std::process::exit(1);
    }
}
