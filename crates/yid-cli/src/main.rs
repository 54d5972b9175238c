use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "yid")]
#[command(about = "YID - wallet-bound identity sessions on Sepolia", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/yid/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet bridge
    #[arg(long, global = true)]
    wallet_url: Option<String>,

    /// Identity factory contract address
    #[arg(long, global = true)]
    factory: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved network and contract configuration
    Status,
    /// Connect the wallet and print the session
    Connect,
    /// Switch the wallet to Sepolia, adding the network if needed
    SwitchNetwork,
    /// Deploy a user contract for the connected account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Update the profile stored in the user contract
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Deactivate the user contract
    Deactivate,
    /// Re-read the profile from the user contract
    Refresh,
    /// Print the session on every change until Ctrl-C
    Watch,
    /// List data access audit entries
    Audit,
    /// List data sharing settings
    Settings,
    /// List application permissions
    Permissions,
    /// Enable or disable a data sharing setting
    ToggleSetting {
        #[arg(long)]
        id: String,
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment and config file still apply.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = app::load_config(cli.config, cli.wallet_url, cli.factory)?;

    match cli.command {
        Commands::Status => commands::status::show(&config)?,
        Commands::Connect => commands::session::connect(&app::App::build(config)?).await?,
        Commands::SwitchNetwork => {
            commands::session::switch_network(&app::App::build(config)?).await?
        }
        Commands::Register { name, email } => {
            commands::session::register(&app::App::build(config)?, &name, &email).await?
        }
        Commands::Update { name, email } => {
            commands::session::update(&app::App::build(config)?, &name, &email).await?
        }
        Commands::Deactivate => commands::session::deactivate(&app::App::build(config)?).await?,
        Commands::Refresh => commands::session::refresh(&app::App::build(config)?).await?,
        Commands::Watch => commands::session::watch(&app::App::build(config)?).await?,
        Commands::Audit => commands::dashboard::audit().await?,
        Commands::Settings => commands::dashboard::settings().await?,
        Commands::Permissions => commands::dashboard::permissions().await?,
        Commands::ToggleSetting { id, enabled } => {
            commands::dashboard::toggle_setting(&id, enabled).await?
        }
    }

    Ok(())
}
