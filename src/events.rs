//! Event records crossing the renderer boundary and the caller handler set.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChartError, ChartResult};

/// A data item was clicked.
///
/// `value` holds the JSON encoding of the engine value so numbers, arrays and
/// records all fit one field; it is `""` when the engine reported no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickEvent {
    pub name: String,
    pub series_name: String,
    pub data_index: i64,
    pub value: String,
    /// `"series"`, `"markPoint"`, ...
    pub component_type: String,
}

impl ClickEvent {
    /// Builds the wire record from raw engine click parameters, defaulting
    /// every missing field.
    #[must_use]
    pub fn from_engine_params(params: &EngineClickParams) -> Self {
        Self {
            name: params.name.clone().unwrap_or_default(),
            series_name: params.series_name.clone().unwrap_or_default(),
            data_index: params.data_index.unwrap_or(0),
            value: match &params.value {
                None | Some(Value::Null) => String::new(),
                Some(value) => value.to_string(),
            },
            component_type: params.component_type.clone().unwrap_or_default(),
        }
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ChartError::MalformedOption(format!("failed to parse click event: {e}")))
    }

    /// Decodes `value` back into a JSON value; `None` when it is empty or
    /// not valid JSON.
    #[must_use]
    pub fn decoded_value(&self) -> Option<Value> {
        if self.value.is_empty() {
            return None;
        }
        serde_json::from_str(&self.value).ok()
    }
}

/// Legend toggle with the full selection map, for hosts that forward it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<IndexMap<String, bool>>,
}

impl LegendEvent {
    #[must_use]
    pub fn from_engine_params(params: &EngineLegendParams) -> Self {
        Self {
            name: params.name.clone().unwrap_or_default(),
            selected: params.selected.clone(),
        }
    }
}

/// Click parameters as the engine reports them; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineClickParams {
    pub name: Option<String>,
    pub series_name: Option<String>,
    pub data_index: Option<i64>,
    pub value: Option<Value>,
    pub component_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLegendParams {
    pub name: Option<String>,
    pub selected: Option<IndexMap<String, bool>>,
}

pub type ClickHandler = Arc<dyn Fn(&ClickEvent) + Send + Sync>;
pub type LegendHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub type InitializedHandler = Arc<dyn Fn() + Send + Sync>;

/// Caller-supplied callbacks. Every handler is optional; events without a
/// handler are dropped.
#[derive(Clone, Default)]
pub struct ChartEventHandlers {
    on_click: Option<ClickHandler>,
    on_legend_select: Option<LegendHandler>,
    on_initialized: Option<InitializedHandler>,
}

impl ChartEventHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ClickEvent) + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_on_legend_select<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_legend_select = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_on_initialized<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_initialized = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn has_click_handler(&self) -> bool {
        self.on_click.is_some()
    }

    #[must_use]
    pub fn has_legend_handler(&self) -> bool {
        self.on_legend_select.is_some()
    }

    pub(crate) fn dispatch_click(&self, event: &ClickEvent) {
        if let Some(handler) = &self.on_click {
            handler(event);
        }
    }

    pub(crate) fn dispatch_legend_select(&self, name: &str) {
        if let Some(handler) = &self.on_legend_select {
            handler(name);
        }
    }

    pub(crate) fn dispatch_initialized(&self) {
        if let Some(handler) = &self.on_initialized {
            handler();
        }
    }
}

impl fmt::Debug for ChartEventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartEventHandlers")
            .field("on_click", &self.on_click.is_some())
            .field("on_legend_select", &self.on_legend_select.is_some())
            .field("on_initialized", &self.on_initialized.is_some())
            .finish()
    }
}

/// Receiving end of engine events on the caller side of the boundary.
///
/// Calls fail with [`ChartError::ChannelClosed`] once the owning component is
/// gone; the renderer treats that as a benign race.
pub trait ChartEventSink: Send + Sync {
    fn on_chart_click(&self, event: ClickEvent) -> ChartResult<()>;
    fn on_legend_select_changed(&self, name: String) -> ChartResult<()>;
}

/// Sink that forwards to a replaceable handler set until closed.
#[derive(Debug)]
pub struct HandlerSink {
    handlers: RwLock<ChartEventHandlers>,
    closed: AtomicBool,
}

impl HandlerSink {
    #[must_use]
    pub fn new(handlers: ChartEventHandlers) -> Self {
        Self {
            handlers: RwLock::new(handlers),
            closed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current handlers; dispatch runs on the snapshot so a
    /// handler may replace the set without deadlocking.
    #[must_use]
    pub fn handlers(&self) -> ChartEventHandlers {
        self.handlers.read().clone()
    }

    pub fn replace_handlers(&self, handlers: ChartEventHandlers) {
        *self.handlers.write() = handlers;
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> ChartResult<()> {
        if self.is_closed() {
            return Err(ChartError::ChannelClosed);
        }
        Ok(())
    }
}

impl ChartEventSink for HandlerSink {
    fn on_chart_click(&self, event: ClickEvent) -> ChartResult<()> {
        self.ensure_open()?;
        self.handlers().dispatch_click(&event);
        Ok(())
    }

    fn on_legend_select_changed(&self, name: String) -> ChartResult<()> {
        self.ensure_open()?;
        self.handlers().dispatch_legend_select(&name);
        Ok(())
    }
}
