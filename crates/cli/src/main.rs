//! mailprobe CLI - Main Entry Point
//!
//! Runs the browser-driven sign-up scenario and exposes the mailbox
//! operations it relies on for manual inspection.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{inbox, run};
use mailprobe_e2e::config::DEFAULT_MAILSLURP_BASE_URL;

/// mailprobe - sign-up and email confirmation checks
#[derive(Parser)]
#[command(name = "mailprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command
#[derive(clap::Args)]
pub struct GlobalArgs {
    /// MailSlurp API key
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// MailSlurp API base URL
    #[arg(long, env = "MAILSLURP_BASE_URL", default_value = DEFAULT_MAILSLURP_BASE_URL, global = true)]
    pub mailslurp_url: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sign-up and email confirmation scenario
    Run(run::RunArgs),

    /// Validate configuration without touching the browser or the network
    Check(run::ScenarioArgs),

    /// Manage disposable inboxes
    #[command(subcommand)]
    Inbox(inbox::InboxCommands),

    /// Wait for the latest email in an inbox
    Wait(inbox::WaitArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.global.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => run::execute(args, &cli.global).await?,
        Commands::Check(args) => run::check(args, &cli.global)?,
        Commands::Inbox(cmd) => inbox::execute(cmd, &cli.global).await?,
        Commands::Wait(args) => inbox::wait_for_email(args, &cli.global).await?,
        Commands::Version => {
            println!("mailprobe v{}", env!("CARGO_PKG_VERSION"));
            println!("Sign-up and email confirmation checks");
            println!();
            println!("Mailbox API: {}", cli.global.mailslurp_url);
        }
    }

    Ok(())
}
