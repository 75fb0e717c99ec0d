use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use kas_explorer::config::{ExplorerConfig, Skin};
use kas_explorer::controller::ExplorerController;
use kas_explorer::plain::PlainSkin;
use kas_explorer::{dashboard, logging, BrowserOpener, HttpBackend};
use kas_protocol::{DownloadMode, ExplorerKind};
use kas_session::{Event, ResponseOrdering, Session};

#[derive(Parser, Debug)]
#[command(name = "kas-explorer")]
#[command(version, about = "Explore KAS search spaces and algorithms from the terminal")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend address (e.g. http://localhost:7070)
    #[arg(short, long)]
    backend: Option<String>,

    /// Explorer to use: search_space or algorithm
    #[arg(short, long)]
    explorer: Option<ExplorerKind>,

    /// User interface
    #[arg(short, long, value_enum)]
    skin: Option<Skin>,

    /// Console lines to keep
    #[arg(long)]
    console_capacity: Option<usize>,

    /// How download links are resolved: relative or raw
    #[arg(long)]
    download_mode: Option<DownloadMode>,

    /// Which responses are applied: last-arrival or latest-request
    #[arg(long)]
    ordering: Option<ResponseOrdering>,

    /// Load help as soon as the UI starts
    #[arg(long)]
    connect: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply_to(self, config: &mut ExplorerConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(explorer) = self.explorer {
            config.explorer = explorer;
        }
        if let Some(skin) = self.skin {
            config.skin = skin;
        }
        if self.console_capacity.is_some() {
            config.console_capacity = self.console_capacity;
        }
        if self.download_mode.is_some() {
            config.download_mode = self.download_mode;
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering;
        }
        if self.connect {
            config.connect_on_start = true;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ExplorerConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    logging::init_logging(config.log_destination().as_deref())?;
    tracing::info!(
        backend = %config.backend,
        explorer = %config.explorer,
        skin = %config.skin,
        ordering = %config.ordering,
        "starting kas-explorer"
    );

    let session = Session::new(config.session_options());
    let backend = Arc::new(HttpBackend::new()?);
    let mut controller = ExplorerController::new(session, backend, Box::new(BrowserOpener));
    if config.connect_on_start {
        controller.dispatch(Event::ApplyHelp);
    }

    match config.skin {
        Skin::Dashboard => dashboard::run_dashboard(controller).await?,
        Skin::Plain => {
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            PlainSkin::new(controller, stdin, stdout).run().await?;
        }
    }

    tracing::info!("kas-explorer stopped");
    Ok(())
}
