#[macro_use]
extern crate rust_i18n;

mod shutdown;
mod startup;
mod terminal;

use clap::Parser;
use tracing::info;

// Initialize i18n
i18n!("locales", fallback = "en");

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = startup::Args::parse();

    // Initialize logging
    startup::init_logging()?;

    info!("Starting kalenterichat");

    // Load configuration
    let config = startup::load_config(&args)?;

    // Run the chat session
    startup::run_session(config, args.open).await
}
