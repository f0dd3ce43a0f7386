use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxlog::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxlog::AppCommand {
    fn from(cmd: Commands) -> fxlog::AppCommand {
        match cmd {
            Commands::Fetch => fxlog::AppCommand::Fetch,
            Commands::Latest => fxlog::AppCommand::Latest,
            Commands::Dump { limit } => fxlog::AppCommand::Dump { limit },
            Commands::Check => fxlog::AppCommand::Check,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch current rates and store them
    Fetch,
    /// Display the latest stored rate for every currency pair
    Latest,
    /// Display database tables and the most recently stored rates
    Dump {
        /// Number of rows to show
        #[arg(short, long, default_value_t = fxlog::cli::dump::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Check database and API connectivity without storing anything
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Setup) => {
            init_logging(&fxlog::core::log::LogConfig::default())?;
            fxlog::cli::setup::setup()
        }
        Some(cmd) => {
            let config = fxlog::load_config(cli.config_path.as_deref())?;
            init_logging(&config.log_config(cli.verbose))?;
            fxlog::run_command(cmd.into(), &config).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
