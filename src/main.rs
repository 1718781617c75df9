use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use upd_loader_lib::commands::{build_processor, status, upload};
use upd_loader_lib::AppConfig;

/// Load UPD archives into MoySklad as a shipment and an outbound invoice
#[derive(Parser, Debug)]
#[command(name = "upd-loader", version)]
struct Cli {
    /// Print machine-readable JSON instead of the user-facing messages
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one or more UPD ZIP archives concurrently
    Process {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Check the API token, organization and permissions
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to read configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let processor = build_processor(config)?;

    match cli.command {
        Command::Process { files } => {
            let outcomes = upload::process_files(processor, &files).await?;
            let all_ok = outcomes.iter().all(|o| o.success);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for (path, outcome) in files.iter().zip(&outcomes) {
                    println!("── {} ──\n{}\n", path.display(), outcome.message);
                }
            }
            Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Status => {
            let response = status::check_status(processor).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.message);
            }
            Ok(if response.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
