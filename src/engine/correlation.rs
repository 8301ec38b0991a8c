use crate::model::CorrelationTable;
use crate::util::format_count;

const CLIP_FLOOR: f64 = 10.0;
const CLIP_PERCENTILE: f64 = 0.99;
const MAX_ANNOTATED_SIZE: usize = 25;

#[derive(Clone, Debug, PartialEq)]
pub struct CellAnnotation {
    pub row: usize,
    pub column: usize,
    pub text: String,
}

/// Plot dimensions for a matrix of `n` subsystems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatrixLayout {
    pub height: f32,
    pub width: f32,
    pub tick_font_size: f32,
}

impl MatrixLayout {
    pub fn for_size(n: usize) -> Self {
        let compact = n < 30;
        let per_cell_width = if compact { 40.0 } else { 30.0 };
        Self {
            height: (n as f32 * 30.0).max(600.0),
            width: (n as f32 * per_cell_width).max(900.0),
            tick_font_size: if compact { 12.0 } else { 10.0 },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Unclipped counts. Every number shown as text comes from here.
    pub values: Vec<Vec<f64>>,
    /// Counts capped at `clip_limit`; used for colour only.
    pub clipped: Vec<Vec<f64>>,
    pub clip_limit: f64,
    pub annotations: Vec<CellAnnotation>,
    pub layout: MatrixLayout,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or(0.0)
    }

    /// Position of `value` on the colour scale, in `[0, 1]`.
    pub fn color_position(&self, row: usize, column: usize) -> f32 {
        let clipped = self
            .clipped
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or(0.0);
        (clipped / self.clip_limit).clamp(0.0, 1.0) as f32
    }

    pub fn hover_text(&self, row: usize, column: usize) -> Option<String> {
        let row_label = self.labels.get(row)?;
        let column_label = self.labels.get(column)?;
        Some(format!(
            "{row_label} × {column_label}: {}",
            format_count(self.value(row, column))
        ))
    }
}

/// Value at index `floor(0.99 * count)` of the ascending sort, or 0 when empty.
pub fn percentile_99(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let index = ((sorted.len() as f64) * CLIP_PERCENTILE).floor() as usize;
    sorted.get(index).copied().unwrap_or(0.0)
}

pub fn build_correlation_matrix(subsystems: &[String], table: &CorrelationTable) -> CorrelationMatrix {
    let n = subsystems.len();

    let values = subsystems
        .iter()
        .map(|row| {
            subsystems
                .iter()
                .map(|column| table.value(column, row))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let flat = values.iter().flatten().copied().collect::<Vec<_>>();
    let clip_limit = percentile_99(&flat).max(CLIP_FLOOR);

    let clipped = values
        .iter()
        .map(|cells| cells.iter().map(|value| value.min(clip_limit)).collect())
        .collect();

    let mut annotations = Vec::new();
    if n <= MAX_ANNOTATED_SIZE {
        for (row, cells) in values.iter().enumerate() {
            for (column, value) in cells.iter().enumerate() {
                if *value != 0.0 {
                    annotations.push(CellAnnotation {
                        row,
                        column,
                        text: format_count(*value),
                    });
                }
            }
        }
    }

    CorrelationMatrix {
        labels: subsystems.to_vec(),
        values,
        clipped,
        clip_limit,
        annotations,
        layout: MatrixLayout::for_size(n),
    }
}
