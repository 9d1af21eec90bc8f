use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use sublet_market::error::AppError;
use sublet_market::marketplace::import;

#[derive(Parser, Debug)]
#[command(
    name = "Sublet Market",
    about = "Run the sublease marketplace backend from the command line",
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
    /// Validate a listings seed CSV without starting the server
    Import(ImportArgs),
    /// Run an end-to-end CLI demo covering listings, agreements, and contracts
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the store from a listings CSV before serving
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Listings CSV to parse
    pub(crate) file: PathBuf,
}

fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let listings = import::from_path(&args.file)?;
    let owners: std::collections::BTreeSet<_> = listings
        .iter()
        .map(|listing| listing.owner_email.as_str())
        .collect();
    println!(
        "{}: {} listings across {} owners",
        args.file.display(),
        listings.len(),
        owners.len()
    );
    for listing in &listings {
        println!(
            "  {}: {} ({} to {}, ${}/period)",
            listing.owner_email,
            listing.title,
            listing.window.start,
            listing.window.end,
            listing.rent
        );
    }
    Ok(())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
