use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::engine::{DEFAULT_FAN_OUT, WeightCurve};
use crate::model::{RunState, SnapshotFlavor};

/// Which backend endpoint the window visualizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewMode {
    Flux,
    Correlation,
}

impl From<ViewMode> for SnapshotFlavor {
    fn from(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Flux => Self::Flux,
            ViewMode::Correlation => Self::Correlation,
        }
    }
}

/// Knobs that change how the graph is drawn but not what it shows.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualTuning {
    pub flux: WeightCurve,
    pub correlation: WeightCurve,
    pub advisory_duration: Duration,
    pub inspector_fan_out: usize,
}

impl Default for VisualTuning {
    fn default() -> Self {
        Self {
            flux: WeightCurve::FLUX,
            correlation: WeightCurve::CORRELATION,
            advisory_duration: Duration::from_secs(6),
            inspector_fan_out: DEFAULT_FAN_OUT,
        }
    }
}

impl VisualTuning {
    pub fn curve(&self, flavor: SnapshotFlavor) -> &WeightCurve {
        match flavor {
            SnapshotFlavor::Flux => &self.flux,
            SnapshotFlavor::Correlation => &self.correlation,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: TuningFile = serde_json::from_str(raw).context("tuning file is not valid JSON")?;
        let defaults = Self::default();

        let advisory_duration = match file.advisory_secs {
            Some(secs) if !secs.is_finite() || secs < 0.0 => {
                bail!("advisory_secs must be a non-negative number, got {secs}")
            }
            Some(secs) => Duration::from_secs_f64(secs),
            None => defaults.advisory_duration,
        };
        let inspector_fan_out = match file.inspector_fan_out {
            Some(0) => bail!("inspector_fan_out must be at least 1"),
            Some(fan_out) => fan_out,
            None => defaults.inspector_fan_out,
        };

        Ok(Self {
            flux: file.flux.apply(defaults.flux),
            correlation: file.correlation.apply(defaults.correlation),
            advisory_duration,
            inspector_fan_out,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read tuning file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid tuning file {}", path.display()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TuningFile {
    flux: CurveOverrides,
    correlation: CurveOverrides,
    advisory_secs: Option<f64>,
    inspector_fan_out: Option<usize>,
}

/// Unset fields keep the per-view defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CurveOverrides {
    width_base: Option<f64>,
    width_scale: Option<f64>,
    particle_base: Option<f64>,
    particle_scale: Option<f64>,
    speed_base: Option<f64>,
    speed_scale: Option<f64>,
}

impl CurveOverrides {
    fn apply(self, base: WeightCurve) -> WeightCurve {
        WeightCurve {
            width_base: self.width_base.unwrap_or(base.width_base),
            width_scale: self.width_scale.unwrap_or(base.width_scale),
            particle_base: self.particle_base.unwrap_or(base.particle_base),
            particle_scale: self.particle_scale.unwrap_or(base.particle_scale),
            speed_base: self.speed_base.unwrap_or(base.speed_base),
            speed_scale: self.speed_scale.unwrap_or(base.speed_scale),
        }
    }
}

pub fn load_run_state(path: &Path) -> Result<RunState> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read run state {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid run state {}", path.display()))
}

/// Everything the window needs, resolved from the command line.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub server: String,
    pub run_id: String,
    pub mode: ViewMode,
    pub initial_subsystem: Option<String>,
    pub tuning: VisualTuning,
    pub run_state: Option<RunState>,
    pub export_dir: PathBuf,
}
