//! db-chat - chat with a SQL database.

use db_chat::app::Orchestrator;
use db_chat::cli::Cli;
use db_chat::config::Config;
use db_chat::error::{DbChatError, Result};
use db_chat::llm::{create_client, LlmProvider};
use db_chat::{logging, tui};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.headless {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e.message());
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config)?;

    let provider: LlmProvider = config
        .llm
        .provider
        .parse()
        .map_err(DbChatError::config)?;
    info!("Using {} model {}", provider, config.llm.model);
    let llm = create_client(provider, &config.llm.model, None)?;
    let orchestrator = Orchestrator::new(llm);

    if cli.headless {
        return tui::headless::run_headless(&cli, &config.connection, orchestrator).await;
    }

    tui::run_tui(&config.connection, orchestrator).await?;
    Ok(0)
}
