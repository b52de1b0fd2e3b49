use std::sync::Arc;

use serde_json::Value;

use crate::error::ChartResult;
use crate::events::{EngineClickParams, EngineLegendParams};
use crate::instance::InstanceId;

/// How `set_option` combines a document with the chart's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOptionMode {
    /// Discard the previous document.
    Replace,
    /// Override only the top-level keys present in the new document.
    Merge,
}

pub type ResizeCallback = Arc<dyn Fn() + Send + Sync>;
pub type ClickListener = Arc<dyn Fn(EngineClickParams) + Send + Sync>;
pub type LegendListener = Arc<dyn Fn(EngineLegendParams) + Send + Sync>;

/// The charting engine and its surrounding document, as seen by the
/// registry.
pub trait EngineHost: Send + Sync + 'static {
    type Chart: EngineChart;
    type Observer: SizeObserver;

    fn has_mount_point(&self, id: &InstanceId) -> bool;

    /// Creates a chart bound to the mount point of `id`.
    fn create_chart(&self, id: &InstanceId, theme: Option<&str>) -> ChartResult<Self::Chart>;

    /// Starts watching the mount point size; `on_resize` runs on every change.
    fn observe_size(&self, id: &InstanceId, on_resize: ResizeCallback)
    -> ChartResult<Self::Observer>;
}

pub trait EngineChart: Send + 'static {
    fn set_option(&mut self, option: Value, mode: SetOptionMode) -> ChartResult<()>;
    fn on_click(&mut self, listener: ClickListener);
    fn on_legend_select_changed(&mut self, listener: LegendListener);
    fn resize(&mut self) -> ChartResult<()>;
    fn dispose(&mut self) -> ChartResult<()>;
}

pub trait SizeObserver: Send + 'static {
    fn disconnect(&mut self) -> ChartResult<()>;
}
