use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fluxgraph::app::FluxGraphApp;
use fluxgraph::config::{VisualTuning, ViewMode, ViewerConfig, load_run_state};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the analysis backend.
    #[arg(long, env = "FLUXGRAPH_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Identifier of the solved run to visualize.
    #[arg(long, env = "FLUXGRAPH_RUN_ID")]
    run_id: String,

    #[arg(long, value_enum, default_value_t = ViewMode::Flux)]
    view: ViewMode,

    /// Start the flux view filtered to one subsystem.
    #[arg(long)]
    subsystem: Option<String>,

    /// JSON file overriding link weight curves and panel settings.
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// JSON run state, enables the results export.
    #[arg(long)]
    run_state: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> Result<ViewerConfig> {
        let tuning = match &self.tuning {
            Some(path) => VisualTuning::load(path)?,
            None => VisualTuning::default(),
        };
        let run_state = self.run_state.as_deref().map(load_run_state).transpose()?;

        Ok(ViewerConfig {
            server: self.server,
            run_id: self.run_id,
            mode: self.view,
            initial_subsystem: self.subsystem.filter(|name| !name.trim().is_empty()),
            tuning,
            run_state,
            export_dir: self.export_dir,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fluxgraph=info")),
        )
        .init();

    let config = Args::parse()
        .into_config()
        .context("invalid command line configuration")?;
    tracing::info!(server = %config.server, run_id = %config.run_id, mode = ?config.mode, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "fluxgraph",
        options,
        Box::new(move |cc| Ok(Box::new(FluxGraphApp::new(cc, config)))),
    )
    .map_err(|err| anyhow!("viewer window failed: {err}"))
}
