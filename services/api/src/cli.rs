use crate::demo::{run_badge_listing, run_compatibility, run_demo, BadgeListArgs, CompatibilityArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use peve::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "peve",
    about = "Run the peve engagement service or explore its scoring from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the badge catalog
    Badges {
        #[command(subcommand)]
        command: BadgeCommand,
    },
    /// Score two ad-hoc profiles
    Compatibility(CompatibilityArgs),
    /// Seed an in-memory campus and walk through badge awards and the leaderboard
    Demo,
}

#[derive(Subcommand, Debug)]
enum BadgeCommand {
    /// Print the standard catalog, or validate and print an admin CSV
    List(BadgeListArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Start from the demo campus (ada, bob, cy) instead of an empty store
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Badges {
            command: BadgeCommand::List(args),
        } => run_badge_listing(args),
        Command::Compatibility(args) => run_compatibility(args),
        Command::Demo => run_demo().await,
    }
}
