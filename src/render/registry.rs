use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::config::BridgeConfig;
use crate::error::{ChartError, ChartResult};
use crate::events::{ChartEventSink, ClickEvent, EngineClickParams, EngineLegendParams};
use crate::instance::InstanceId;

use super::debounce::ResizeDebouncer;
use super::engine::{
    ClickListener, EngineChart, EngineHost, LegendListener, ResizeCallback, SetOptionMode,
    SizeObserver,
};
use super::{CommandChannel, RendererCommand};

struct ChartEntry<H: EngineHost> {
    chart: H::Chart,
    observer: H::Observer,
}

struct RegistryInner<H: EngineHost> {
    host: H,
    charts: Mutex<HashMap<InstanceId, ChartEntry<H>>>,
    debouncer: ResizeDebouncer,
    /// Thread currently inside an engine call with `charts` held.
    engine_caller: Mutex<Option<ThreadId>>,
    /// Resizes signalled from inside an engine call, run once it returns.
    deferred_resizes: Mutex<HashSet<InstanceId>>,
}

/// Marks the current thread as inside an engine call until dropped.
struct EngineCallGuard<'a> {
    caller: &'a Mutex<Option<ThreadId>>,
}

impl<'a> EngineCallGuard<'a> {
    fn enter(caller: &'a Mutex<Option<ThreadId>>) -> Self {
        *caller.lock() = Some(thread::current().id());
        Self { caller }
    }
}

impl Drop for EngineCallGuard<'_> {
    fn drop(&mut self) {
        *self.caller.lock() = None;
    }
}

/// Renderer-side owner of every live chart, keyed by instance id.
///
/// Holds at most one chart per id. Cloning yields another handle to the same
/// registry.
pub struct ChartRegistry<H: EngineHost> {
    inner: Arc<RegistryInner<H>>,
}

impl<H: EngineHost> Clone for ChartRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: EngineHost> ChartRegistry<H> {
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, &BridgeConfig::default())
    }

    #[must_use]
    pub fn with_config(host: H, config: &BridgeConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                host,
                charts: Mutex::new(HashMap::new()),
                debouncer: ResizeDebouncer::new(config.resize_debounce()),
                engine_caller: Mutex::new(None),
                deferred_resizes: Mutex::new(HashSet::new()),
            }),
        }
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        self.inner.debouncer.window()
    }

    #[must_use]
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.inner.charts.lock().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.charts.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn pending_resize_count(&self) -> usize {
        self.inner.debouncer.pending_count()
    }

    /// Runs one boundary command against the registry.
    pub fn execute(&self, command: RendererCommand) -> ChartResult<()> {
        match command {
            RendererCommand::Init {
                id,
                option,
                theme,
                sink,
            } => self.init(&id, &option, theme.as_deref(), sink),
            RendererCommand::Update { id, option } => self.update(&id, &option),
            RendererCommand::Resize { id } => self.resize(&id),
            RendererCommand::Dispose { id } => self.dispose(&id),
        }
    }

    /// Creates and registers the chart for `id`, replacing any live one.
    ///
    /// Nothing is registered when the mount point is missing or the option
    /// cannot be applied.
    pub fn init(
        &self,
        id: &InstanceId,
        option_json: &str,
        theme: Option<&str>,
        sink: Arc<dyn ChartEventSink>,
    ) -> ChartResult<()> {
        if !self.inner.host.has_mount_point(id) {
            error!(instance = %id, "mount point not found; chart not initialized");
            return Err(ChartError::MountPointNotFound(id.clone()));
        }

        if self.contains(id) {
            debug!(instance = %id, "disposing live chart before re-init");
            if let Err(err) = self.dispose(id) {
                warn!(instance = %id, error = %err, "partial failure disposing previous chart");
            }
        }

        let option = parse_option(id, option_json)?;
        let mut chart = self.inner.host.create_chart(id, theme)?;
        if let Err(err) = chart.set_option(option, SetOptionMode::Replace) {
            error!(instance = %id, error = %err, "initial option rejected by engine");
            release_chart(id, &mut chart);
            return Err(err);
        }

        chart.on_click(click_listener(id, Arc::clone(&sink)));
        chart.on_legend_select_changed(legend_listener(id, sink));

        let observer = match self
            .inner
            .host
            .observe_size(id, self.resize_callback(id))
        {
            Ok(observer) => observer,
            Err(err) => {
                error!(instance = %id, error = %err, "failed to observe mount point size");
                release_chart(id, &mut chart);
                return Err(err);
            }
        };

        self.inner
            .charts
            .lock()
            .insert(id.clone(), ChartEntry { chart, observer });
        debug!(instance = %id, theme = ?theme, "chart initialized");
        Ok(())
    }

    /// Merges `option_json` into the live chart. Unknown ids are ignored.
    pub fn update(&self, id: &InstanceId, option_json: &str) -> ChartResult<()> {
        if !self.contains(id) {
            debug!(instance = %id, "chart not found for update; ignoring");
            return Ok(());
        }
        let option = parse_option(id, option_json)?;
        self.call_chart(id, |chart| chart.set_option(option, SetOptionMode::Merge))
    }

    /// Unknown ids are ignored.
    pub fn resize(&self, id: &InstanceId) -> ChartResult<()> {
        self.call_chart(id, |chart| chart.resize())
    }

    /// Releases the observer, the chart and the pending resize timer of `id`.
    ///
    /// Each release runs regardless of the others; the first failure is
    /// returned after all three were attempted. Unknown ids are ignored.
    pub fn dispose(&self, id: &InstanceId) -> ChartResult<()> {
        let entry = self.inner.charts.lock().remove(id);
        let mut first_failure = None;

        if let Some(ChartEntry {
            mut chart,
            mut observer,
        }) = entry
        {
            if let Err(err) = observer.disconnect() {
                warn!(instance = %id, error = %err, "failed to disconnect size observer");
                first_failure.get_or_insert(err);
            }
            if let Err(err) = chart.dispose() {
                warn!(instance = %id, error = %err, "failed to dispose chart");
                first_failure.get_or_insert(err);
            }
            debug!(instance = %id, "chart disposed");
        }

        if self.inner.debouncer.cancel(id) {
            debug!(instance = %id, "cleared pending resize");
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs `call` on the live chart of `id` with `charts` held. Size signals
    /// the engine raises synchronously from inside the call are deferred and
    /// applied once the lock is released.
    fn call_chart<F>(&self, id: &InstanceId, call: F) -> ChartResult<()>
    where
        F: FnOnce(&mut H::Chart) -> ChartResult<()>,
    {
        let result = {
            let mut charts = self.inner.charts.lock();
            let Some(entry) = charts.get_mut(id) else {
                return Ok(());
            };
            let _guard = EngineCallGuard::enter(&self.inner.engine_caller);
            call(&mut entry.chart)
        };
        self.run_deferred_resizes();
        result
    }

    fn run_deferred_resizes(&self) {
        let deferred: Vec<InstanceId> = self.inner.deferred_resizes.lock().drain().collect();
        if deferred.is_empty() {
            return;
        }
        {
            let mut charts = self.inner.charts.lock();
            let _guard = EngineCallGuard::enter(&self.inner.engine_caller);
            for id in &deferred {
                if let Some(entry) = charts.get_mut(id) {
                    if let Err(err) = entry.chart.resize() {
                        error!(instance = %id, error = %err, "error during deferred resize");
                    }
                }
            }
        }
        // Signals raised by these resizes describe the size just applied.
        self.inner.deferred_resizes.lock().clear();
    }

    fn on_size_signal(&self, id: &InstanceId) {
        if *self.inner.engine_caller.lock() == Some(thread::current().id()) {
            trace!(instance = %id, "size signal during engine call; deferring resize");
            self.inner.deferred_resizes.lock().insert(id.clone());
            return;
        }
        if let Err(err) = self.resize(id) {
            error!(instance = %id, error = %err, "error during resize");
        }
    }

    fn resize_callback(&self, id: &InstanceId) -> ResizeCallback {
        let registry = Arc::downgrade(&self.inner);
        let id = id.clone();
        Arc::new(move || schedule_resize(&registry, &id))
    }
}

fn schedule_resize<H: EngineHost>(registry: &Weak<RegistryInner<H>>, id: &InstanceId) {
    let Some(inner) = registry.upgrade() else {
        return;
    };
    let weak = Weak::clone(registry);
    let target = id.clone();
    inner.debouncer.schedule(id, move || {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        ChartRegistry { inner }.on_size_signal(&target);
    });
}

#[async_trait]
impl<H: EngineHost> CommandChannel for ChartRegistry<H> {
    async fn send(&self, command: RendererCommand) -> ChartResult<()> {
        self.execute(command)
    }
}

fn parse_option(id: &InstanceId, option_json: &str) -> ChartResult<Value> {
    serde_json::from_str(option_json).map_err(|e| {
        error!(instance = %id, error = %e, "option is not valid json");
        ChartError::MalformedOption(e.to_string())
    })
}

fn release_chart<C: EngineChart>(id: &InstanceId, chart: &mut C) {
    if let Err(err) = chart.dispose() {
        warn!(instance = %id, error = %err, "failed to release chart after init failure");
    }
}

fn click_listener(id: &InstanceId, sink: Arc<dyn ChartEventSink>) -> ClickListener {
    let id = id.clone();
    Arc::new(move |params: EngineClickParams| {
        let event = ClickEvent::from_engine_params(&params);
        report_sink_failure(&id, "click", sink.on_chart_click(event));
    })
}

fn legend_listener(id: &InstanceId, sink: Arc<dyn ChartEventSink>) -> LegendListener {
    let id = id.clone();
    Arc::new(move |params: EngineLegendParams| {
        let name = params.name.unwrap_or_default();
        report_sink_failure(&id, "legendselectchanged", sink.on_legend_select_changed(name));
    })
}

fn report_sink_failure(id: &InstanceId, event: &'static str, result: ChartResult<()>) {
    match result {
        Ok(()) => {}
        Err(ChartError::ChannelClosed) => {
            debug!(instance = %id, event, "event sink closed; dropping event");
        }
        Err(err) => {
            error!(instance = %id, event, error = %err, "error forwarding chart event");
        }
    }
}
