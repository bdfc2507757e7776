use crate::shutdown;
use crate::terminal::Session;
use clap::Parser;
use kalenterichat::components::events_panel::{start_poller, EventDisplay};
use kalenterichat::components::{ChatController, EventsPanelHandle, HttpBackend};
use kalenterichat::config::Config;
use kalenterichat::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Terminal chat client for the calendar assistant
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Base URL of the assistant backend
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Write the rendered page to this file after every change
    #[arg(long)]
    pub export_html: Option<PathBuf>,

    /// UI locale, e.g. `en` or `fi`
    #[arg(long)]
    pub locale: Option<String>,

    /// Open the exported page in a browser
    #[arg(long)]
    pub open: bool,
}

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the configuration and apply command-line overrides
pub fn load_config(args: &Args) -> miette::Result<Config> {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            return Err(e.into());
        }
    };

    if let Some(url) = &args.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(path) = &args.export_html {
        config.export_html = Some(path.clone());
    }
    if let Some(locale) = &args.locale {
        config.locale = locale.clone();
    }
    config.validate()?;

    rust_i18n::set_locale(&config.locale);
    info!("Using locale {}", config.locale);

    Ok(config)
}

/// Wire the components together and run the terminal session until it ends
pub async fn run_session(config: Config, open_browser: bool) -> miette::Result<()> {
    let backend = Arc::new(HttpBackend::from_config(&config)?);
    info!("Using assistant backend at {}", config.backend_url);

    let display = EventDisplay::new(&config.timezone, &config.locale)?;
    let events = EventsPanelHandle::new(backend.clone(), display);
    let chat = Arc::new(
        ChatController::new(backend)
            .with_events_panel(events.clone(), Duration::from_millis(config.refresh_delay_ms)),
    );

    // Background polling, if enabled
    let cancel = CancellationToken::new();
    let poller = (config.events_poll_interval > 0).then(|| {
        start_poller(
            events.clone(),
            Duration::from_secs(config.events_poll_interval),
            cancel.clone(),
        )
    });

    // Create shutdown channel and spawn signal handler task
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(shutdown::handle_signals(shutdown_send, cancel.clone()));

    let mut session = Session::new(chat, events, config.export_html.clone());
    if open_browser {
        session.open_in_browser().await?;
    }

    let result = session.run(&config.backend_url, shutdown_recv).await;

    cancel.cancel();
    if let Some(poller) = poller {
        if let Err(e) = poller.await {
            error!("Events poller task failed: {:?}", e);
        }
    }

    info!("Session ended");
    result.map_err(Into::into)
}
