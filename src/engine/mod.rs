//! Pure computations over a [`GraphSnapshot`](crate::model::GraphSnapshot).
//! Nothing here performs I/O or keeps state between calls.

mod correlation;
mod inspector;
mod threshold;

pub use correlation::{
    CellAnnotation, CorrelationMatrix, MatrixLayout, build_correlation_matrix, percentile_99,
};
pub use inspector::{DEFAULT_FAN_OUT, FluxDirection, FluxNeighbor, InspectorSummary, inspect};
pub use threshold::{
    FilterOptions, LinkWeight, VisibilityFrame, WeightCurve, compute_visibility,
    normalized_metric, smoothed_threshold,
};
