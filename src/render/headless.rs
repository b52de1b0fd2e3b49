use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{ChartError, ChartResult};
use crate::events::{EngineClickParams, EngineLegendParams};
use crate::instance::InstanceId;

use super::engine::{
    ClickListener, EngineChart, EngineHost, LegendListener, ResizeCallback, SetOptionMode,
    SizeObserver,
};

/// In-process engine used by tests and headless hosts.
///
/// Keeps the effective option document of every chart (with top-level merge
/// on update), counts resizes, and lets callers drive clicks, legend toggles
/// and size changes. Cloning yields another handle to the same engine.
#[derive(Clone, Default)]
pub struct HeadlessEngine {
    state: Arc<Mutex<HeadlessState>>,
}

#[derive(Default)]
struct HeadlessState {
    /// `None` resolves every id.
    mount_points: Option<HashSet<InstanceId>>,
    charts: HashMap<InstanceId, Arc<Mutex<ChartState>>>,
    observers: HashMap<InstanceId, ObserverSlot>,
    next_serial: u64,
    created: usize,
    fail_disconnect: bool,
    reflow_on_resize: bool,
}

struct ObserverSlot {
    serial: u64,
    callback: ResizeCallback,
}

#[derive(Default)]
struct ChartState {
    theme: Option<String>,
    option: Value,
    set_option_calls: Vec<SetOptionMode>,
    resize_count: usize,
    disposed: bool,
    click: Option<ClickListener>,
    legend: Option<LegendListener>,
}

/// Observable state of one headless chart.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessChartSnapshot {
    pub theme: Option<String>,
    pub option: Value,
    pub set_option_calls: Vec<SetOptionMode>,
    pub resize_count: usize,
    pub disposed: bool,
}

impl HeadlessEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose document only contains the given mount points.
    #[must_use]
    pub fn with_mount_points<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = InstanceId>,
    {
        let engine = Self::default();
        engine.state.lock().mount_points = Some(ids.into_iter().collect());
        engine
    }

    pub fn add_mount_point(&self, id: InstanceId) {
        let mut state = self.state.lock();
        if let Some(mounts) = state.mount_points.as_mut() {
            mounts.insert(id);
        }
    }

    /// Makes the next observer disconnects fail, to exercise partial disposal.
    pub fn fail_observer_disconnect(&self, fail: bool) {
        self.state.lock().fail_disconnect = fail;
    }

    /// Makes every chart resize raise a size signal on its own mount point
    /// from inside the resize call, as engines that reflow their container do.
    pub fn reflow_on_resize(&self, reflow: bool) {
        self.state.lock().reflow_on_resize = reflow;
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.state.lock().created
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.state
            .lock()
            .charts
            .values()
            .filter(|chart| !chart.lock().disposed)
            .count()
    }

    /// Latest chart created for `id`, live or disposed.
    #[must_use]
    pub fn chart(&self, id: &InstanceId) -> Option<HeadlessChartSnapshot> {
        let chart = self.state.lock().charts.get(id).cloned()?;
        let chart = chart.lock();
        Some(HeadlessChartSnapshot {
            theme: chart.theme.clone(),
            option: chart.option.clone(),
            set_option_calls: chart.set_option_calls.clone(),
            resize_count: chart.resize_count,
            disposed: chart.disposed,
        })
    }

    #[must_use]
    pub fn is_observing(&self, id: &InstanceId) -> bool {
        self.state.lock().observers.contains_key(id)
    }

    /// Signals a size change of the mount point. Returns `false` when nothing
    /// observes it.
    pub fn trigger_size_change(&self, id: &InstanceId) -> bool {
        let callback = self
            .state
            .lock()
            .observers
            .get(id)
            .map(|slot| Arc::clone(&slot.callback));
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn emit_click(&self, id: &InstanceId, params: EngineClickParams) -> ChartResult<()> {
        let listener = self.live_chart(id)?.lock().click.clone();
        if let Some(listener) = listener {
            listener(params);
        }
        Ok(())
    }

    /// Clicks item `data_index` of series `series_index`, deriving the click
    /// parameters from the chart's current option the way the engine would.
    pub fn click_data_point(
        &self,
        id: &InstanceId,
        series_index: usize,
        data_index: usize,
    ) -> ChartResult<()> {
        let params = {
            let chart = self.live_chart(id)?;
            let chart = chart.lock();
            data_point_params(&chart.option, series_index, data_index)?
        };
        self.emit_click(id, params)
    }

    pub fn emit_legend_select_changed(&self, id: &InstanceId, name: &str) -> ChartResult<()> {
        let listener = self.live_chart(id)?.lock().legend.clone();
        if let Some(listener) = listener {
            listener(EngineLegendParams {
                name: Some(name.to_owned()),
                selected: None,
            });
        }
        Ok(())
    }

    fn live_chart(&self, id: &InstanceId) -> ChartResult<Arc<Mutex<ChartState>>> {
        let state = self.state.lock();
        match state.charts.get(id) {
            Some(chart) if !chart.lock().disposed => Ok(Arc::clone(chart)),
            _ => Err(ChartError::UnknownInstance(id.clone())),
        }
    }
}

impl EngineHost for HeadlessEngine {
    type Chart = HeadlessChart;
    type Observer = HeadlessObserver;

    fn has_mount_point(&self, id: &InstanceId) -> bool {
        match &self.state.lock().mount_points {
            Some(mounts) => mounts.contains(id),
            None => true,
        }
    }

    fn create_chart(&self, id: &InstanceId, theme: Option<&str>) -> ChartResult<Self::Chart> {
        let chart = Arc::new(Mutex::new(ChartState {
            theme: theme.map(str::to_owned),
            ..ChartState::default()
        }));
        let mut state = self.state.lock();
        state.created += 1;
        state.charts.insert(id.clone(), Arc::clone(&chart));
        Ok(HeadlessChart {
            id: id.clone(),
            state: chart,
            engine: Arc::clone(&self.state),
        })
    }

    fn observe_size(
        &self,
        id: &InstanceId,
        on_resize: ResizeCallback,
    ) -> ChartResult<Self::Observer> {
        let mut state = self.state.lock();
        state.next_serial += 1;
        let serial = state.next_serial;
        state.observers.insert(
            id.clone(),
            ObserverSlot {
                serial,
                callback: on_resize,
            },
        );
        Ok(HeadlessObserver {
            id: id.clone(),
            serial,
            engine: Arc::clone(&self.state),
        })
    }
}

pub struct HeadlessChart {
    id: InstanceId,
    state: Arc<Mutex<ChartState>>,
    engine: Arc<Mutex<HeadlessState>>,
}

impl EngineChart for HeadlessChart {
    fn set_option(&mut self, option: Value, mode: SetOptionMode) -> ChartResult<()> {
        let mut chart = self.state.lock();
        if chart.disposed {
            return Err(ChartError::Engine("chart is disposed".to_owned()));
        }
        if !option.is_object() {
            return Err(ChartError::Engine(
                "option document must be a json object".to_owned(),
            ));
        }
        match (mode, &mut chart.option, option) {
            (SetOptionMode::Merge, Value::Object(current), Value::Object(incoming)) => {
                for (key, value) in incoming {
                    current.insert(key, value);
                }
            }
            (_, current, incoming) => *current = incoming,
        }
        chart.set_option_calls.push(mode);
        Ok(())
    }

    fn on_click(&mut self, listener: ClickListener) {
        self.state.lock().click = Some(listener);
    }

    fn on_legend_select_changed(&mut self, listener: LegendListener) {
        self.state.lock().legend = Some(listener);
    }

    fn resize(&mut self) -> ChartResult<()> {
        {
            let mut chart = self.state.lock();
            if chart.disposed {
                return Err(ChartError::Engine("chart is disposed".to_owned()));
            }
            chart.resize_count += 1;
        }
        let reflow = {
            let engine = self.engine.lock();
            if engine.reflow_on_resize {
                engine
                    .observers
                    .get(&self.id)
                    .map(|slot| Arc::clone(&slot.callback))
            } else {
                None
            }
        };
        if let Some(signal) = reflow {
            signal();
        }
        Ok(())
    }

    fn dispose(&mut self) -> ChartResult<()> {
        let mut chart = self.state.lock();
        chart.disposed = true;
        chart.click = None;
        chart.legend = None;
        Ok(())
    }
}

pub struct HeadlessObserver {
    id: InstanceId,
    serial: u64,
    engine: Arc<Mutex<HeadlessState>>,
}

impl SizeObserver for HeadlessObserver {
    fn disconnect(&mut self) -> ChartResult<()> {
        let mut state = self.engine.lock();
        if state.fail_disconnect {
            return Err(ChartError::Engine(format!(
                "size observer for `{}` refused to disconnect",
                self.id
            )));
        }
        if state
            .observers
            .get(&self.id)
            .is_some_and(|slot| slot.serial == self.serial)
        {
            state.observers.remove(&self.id);
        }
        Ok(())
    }
}

fn data_point_params(
    option: &Value,
    series_index: usize,
    data_index: usize,
) -> ChartResult<EngineClickParams> {
    let series = option
        .get("series")
        .and_then(Value::as_array)
        .and_then(|series| series.get(series_index))
        .ok_or_else(|| ChartError::Engine(format!("series {series_index} not found")))?;
    let datum = series
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.get(data_index))
        .cloned();
    let category = first_x_axis(option)
        .and_then(|axis| axis.get("data"))
        .and_then(Value::as_array)
        .and_then(|labels| labels.get(data_index))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let (name, value) = match datum {
        Some(Value::Object(record)) => (
            record
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .or(category),
            record.get("value").cloned(),
        ),
        other => (category, other),
    };

    Ok(EngineClickParams {
        name,
        series_name: series
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned),
        data_index: i64::try_from(data_index).ok(),
        value,
        component_type: Some("series".to_owned()),
    })
}

fn first_x_axis(option: &Value) -> Option<&Value> {
    match option.get("xAxis")? {
        Value::Array(axes) => axes.first(),
        axis => Some(axis),
    }
}
