use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;
use tracing::error;

use crate::domain::client_config::AppConfig;
use crate::domain::error::Result;
use crate::infrastructure::bootstrap::setup;
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::logging::init_tracing;
use crate::interfaces::cli::{run_batch_job, Cli, Commands};
use crate::interfaces::console::Console;

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigService::new(cli.config.as_deref()).load(&cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_filter);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Commands::Console);
    match runtime.block_on(execute(command, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "predictdesk failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands, config: AppConfig) -> Result<()> {
    let state = setup(&config)?;

    match command {
        Commands::Console => {
            let mut console =
                Console::new(state.session, state.predict, Box::new(state.sink));
            let stdin = BufReader::new(tokio::io::stdin());
            console.run(stdin, tokio::io::stdout()).await
        }
        Commands::Batch { input, output } => {
            let saved = run_batch_job(state, &input, &output).await?;
            println!("Saved {}", saved.display());
            Ok(())
        }
    }
}
