//! apiprobe エントリポイント

use apiprobe::cli::{self, Cli, Commands};
use apiprobe::config::ProbeConfig;
use apiprobe::logging;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let config = ProbeConfig::from_env();

    let outcome = match cli.command {
        Some(Commands::Serve(args)) => cli::serve::execute(&args, config)
            .await
            .map(|()| ExitCode::SUCCESS),
        Some(Commands::Test(args)) => cli::test::execute(&args, config).await,
        Some(Commands::Check(args)) => cli::check::execute(&args, config).await,
        None => {
            // サブコマンドなしは serve として扱う
            cli::serve::execute(&cli::serve::ServeArgs::default(), config)
                .await
                .map(|()| ExitCode::SUCCESS)
        }
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
