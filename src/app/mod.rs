use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use eframe::egui::{self, Context};
use tracing::{error, info};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::model::{
    EhttpTransport, ExportClient, GraphDataStore, RunState, SnapshotFlavor, Transport,
};

mod canvas;
mod controller;
mod render_utils;
mod ui;

pub use canvas::{CanvasLayout, GraphCanvas, GraphRenderer};
pub use controller::{
    Advisory, LoadRequest, OVERSIZED_ADVISORY, PanelContent, Phase, PreparedGraph, RequestId,
    ViewController, ViewEvent, ViewState,
};

pub const CORRELATION_EXPORT_FILE: &str = "correlation_matrix.xlsx";
pub const RESULTS_EXPORT_FILE: &str = "fba_result.xlsx";

type LoadOutcome = (RequestId, Result<PreparedGraph<CanvasLayout>, ViewerError>);
type ExportOutcome = Result<PathBuf, String>;

enum Notice {
    Saved(PathBuf),
    Failed(String),
}

pub struct FluxGraphApp {
    store: Arc<GraphDataStore>,
    exporter: ExportClient,
    controller: ViewController<GraphCanvas>,
    load_tx: Sender<LoadOutcome>,
    load_rx: Receiver<LoadOutcome>,
    export_rx: Option<Receiver<ExportOutcome>>,
    run_state: Option<RunState>,
    export_dir: PathBuf,
    slider_value: f32,
    subsystem_query: String,
    show_matrix: bool,
    notice: Option<Notice>,
}

impl FluxGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(EhttpTransport);
        let flavor = SnapshotFlavor::from(config.mode);
        let controller = ViewController::new(
            config.run_id,
            flavor,
            config.tuning,
            GraphCanvas::default(),
        );
        let (load_tx, load_rx) = mpsc::channel();

        let mut app = Self {
            store: Arc::new(GraphDataStore::new(config.server.clone(), Arc::clone(&transport))),
            exporter: ExportClient::new(config.server, transport),
            controller,
            load_tx,
            load_rx,
            export_rx: None,
            run_state: config.run_state,
            export_dir: config.export_dir,
            slider_value: 0.0,
            subsystem_query: String::new(),
            show_matrix: flavor == SnapshotFlavor::Correlation,
            notice: None,
        };

        let first = match config.initial_subsystem {
            Some(subsystem) if flavor == SnapshotFlavor::Flux => {
                app.subsystem_query = subsystem.clone();
                ViewEvent::SubsystemChanged(Some(subsystem))
            }
            _ => ViewEvent::Start,
        };
        app.dispatch(first);
        app
    }

    /// Routes an event through the controller and starts any load it asks for.
    fn dispatch(&mut self, event: ViewEvent) {
        if let Some(request) = self.controller.handle(event) {
            self.spawn_load(request);
        }
    }

    fn spawn_load(&self, request: LoadRequest) {
        let store = Arc::clone(&self.store);
        let tx = self.load_tx.clone();

        thread::spawn(move || {
            let result = store
                .load(request.flavor, &request.run_id, request.subsystem.as_deref())
                .map(PreparedGraph::prepare::<GraphCanvas>);
            let _ = tx.send((request.id, result));
        });
    }

    fn poll_loads(&mut self) {
        loop {
            match self.load_rx.try_recv() {
                Ok((request, result)) => {
                    if self.controller.complete_load(request, result, Instant::now()) {
                        self.slider_value = self.controller.state().threshold as f32;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn spawn_export<F>(&mut self, file_name: &'static str, job: F)
    where
        F: FnOnce(&ExportClient) -> crate::error::Result<Vec<u8>> + Send + 'static,
    {
        let exporter = self.exporter.clone();
        let export_dir = self.export_dir.clone();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let outcome = job(&exporter)
                .map_err(|err| err.to_string())
                .and_then(|bytes| {
                    write_export(&export_dir, file_name, &bytes).map_err(|err| format!("{err:#}"))
                });
            let _ = tx.send(outcome);
        });

        self.export_rx = Some(rx);
    }

    fn poll_export(&mut self) {
        let Some(rx) = self.export_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(path)) => {
                info!(path = %path.display(), "export saved");
                self.notice = Some(Notice::Saved(path));
            }
            Ok(Err(message)) => {
                error!(%message, "export failed");
                self.notice = Some(Notice::Failed(message));
            }
            Err(TryRecvError::Empty) => self.export_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.notice = Some(Notice::Failed("export worker disconnected".to_owned()));
            }
        }
    }

    fn export_in_flight(&self) -> bool {
        self.export_rx.is_some()
    }
}

fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

impl eframe::App for FluxGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_loads();
        self.poll_export();
        self.controller.tick(now);

        if matches!(self.controller.phase(), Phase::Loading { .. }) || self.export_in_flight() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if let Some(remaining) = self.controller.advisory_remaining(now) {
            ctx.request_repaint_after(remaining);
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("inspector")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_inspector(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_central(ui));

        self.draw_matrix_window(ctx);
        self.draw_advisory(ctx);
        self.draw_notice(ctx);

        self.controller.poll_renderer();
    }
}
