use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sushi_core::{DataHomePathProvider, SharedPathProvider};
use sushi_lib::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let provider: SharedPathProvider = match &cli.data_dir {
        Some(dir) => Arc::new(DataHomePathProvider::with_base_dir(dir.clone())),
        None => Arc::new(DataHomePathProvider::new()),
    };

    let _log_guard = sushi_lib::logging::init(&provider.logs_dir());

    match sushi_lib::run(cli, provider) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:?}", err);
            ExitCode::from(1)
        }
    }
}
