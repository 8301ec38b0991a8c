mod export;
mod payload;
mod store;
mod transport;
mod types;

pub use export::{ConstraintRow, ExportClient, KpiSummary, RunState};
pub use store::{GraphDataStore, correlation_snapshot_from_bytes, flux_snapshot_from_bytes};
pub use transport::{EhttpTransport, HttpResponse, Transport, build_url};
pub use types::{
    CorrelationData, CorrelationTable, FilteredMetabolites, GraphSnapshot, Link, Node, NodeIdx,
    NodeKind, NodeMetrics, ParticipatingReaction, SnapshotFlavor,
};
