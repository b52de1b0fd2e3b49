use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chart_bridge::config::{BridgeConfig, ContainerStyle};
use chart_bridge::events::{ChartEventHandlers, ChartEventSink, ClickEvent};
use chart_bridge::lifecycle::{LifecycleAction, LifecycleController};
use chart_bridge::option::{BarSeries, ChartOption, LineSeries, OptionSource, XAxis, YAxis};
use chart_bridge::render::{CommandChannel, RendererCommand};
use chart_bridge::{ChartError, ChartResult};
use parking_lot::Mutex;

/// Records every command and optionally fails some of them.
#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<RendererCommand>>,
    failing: Mutex<Option<&'static str>>,
    closed: Mutex<bool>,
}

impl RecordingChannel {
    fn sent(&self) -> Vec<RendererCommand> {
        self.sent.lock().clone()
    }

    fn names(&self) -> Vec<&'static str> {
        self.sent.lock().iter().map(RendererCommand::name).collect()
    }

    fn fail(&self, command: &'static str) {
        *self.failing.lock() = Some(command);
    }

    fn close(&self) {
        *self.closed.lock() = true;
    }
}

#[async_trait]
impl CommandChannel for RecordingChannel {
    async fn send(&self, command: RendererCommand) -> ChartResult<()> {
        if *self.closed.lock() {
            return Err(ChartError::ChannelClosed);
        }
        let name = command.name();
        self.sent.lock().push(command);
        if *self.failing.lock() == Some(name) {
            return Err(ChartError::Engine(format!("{name} rejected")));
        }
        Ok(())
    }
}

fn simple_option() -> OptionSource {
    ChartOption::new()
        .with_x_axis(XAxis::category(["A", "B", "C"]))
        .with_y_axis(YAxis::value())
        .with_series(LineSeries::new("Test").with_data([1, 2, 3]))
        .into()
}

fn changed_option() -> OptionSource {
    ChartOption::new()
        .with_x_axis(XAxis::category(["X", "Y", "Z"]))
        .with_y_axis(YAxis::value())
        .with_series(BarSeries::new("Updated").with_data([10, 20, 30]))
        .into()
}

fn controller() -> LifecycleController<Arc<RecordingChannel>> {
    LifecycleController::new(Arc::new(RecordingChannel::default()), ChartEventHandlers::new())
}

fn counting_handlers(initialized: &Arc<AtomicUsize>) -> ChartEventHandlers {
    let initialized = Arc::clone(initialized);
    ChartEventHandlers::new().with_on_initialized(move || {
        initialized.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn first_flush_initializes_with_theme() {
    let mut chart = controller();
    let option = simple_option();

    assert_eq!(
        chart.set_option(Some(&option), Some("dark")),
        LifecycleAction::Init
    );
    assert_eq!(chart.pending_action(), LifecycleAction::Init);
    assert_eq!(chart.flush().await, LifecycleAction::Init);
    assert_eq!(chart.pending_action(), LifecycleAction::None);

    let sent = chart.channel().sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        RendererCommand::Init {
            id, option, theme, ..
        } => {
            assert_eq!(id, chart.id());
            assert_eq!(id.as_str().len(), 32);
            assert_eq!(Some(option.as_str()), chart.last_serialized_option());
            assert_eq!(theme.as_deref(), Some("dark"));
        }
        other => panic!("expected init, got {other:?}"),
    }
    assert_eq!(chart.current_theme(), Some("dark"));
}

#[tokio::test]
async fn identical_option_sends_nothing() {
    let mut chart = controller();
    let option = simple_option();
    chart.set_option(Some(&option), None);
    chart.flush().await;

    assert_eq!(
        chart.set_option(Some(&simple_option()), None),
        LifecycleAction::None
    );
    assert_eq!(chart.flush().await, LifecycleAction::None);
    assert_eq!(chart.channel().names(), vec!["initChart"]);
}

#[tokio::test]
async fn changed_option_merges_into_live_chart() {
    let mut chart = controller();
    chart.set_option(Some(&simple_option()), None);
    chart.flush().await;

    let next = changed_option();
    assert_eq!(chart.set_option(Some(&next), None), LifecycleAction::Update);
    assert_eq!(chart.flush().await, LifecycleAction::Update);

    let sent = chart.channel().sent();
    assert_eq!(chart.channel().names(), vec!["initChart", "updateOption"]);
    match &sent[1] {
        RendererCommand::Update { option, .. } => {
            assert!(option.contains("\"Updated\""));
            assert!(option.contains("\"type\":\"bar\""));
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test]
async fn theme_change_recreates_chart() {
    let mut chart = controller();
    let option = simple_option();
    chart.set_option(Some(&option), Some("light"));
    chart.flush().await;

    assert_eq!(
        chart.set_option(Some(&option), Some("dark")),
        LifecycleAction::Reinit
    );
    assert_eq!(chart.flush().await, LifecycleAction::Reinit);

    assert_eq!(
        chart.channel().names(),
        vec!["initChart", "dispose", "initChart"]
    );
    match &chart.channel().sent()[2] {
        RendererCommand::Init { theme, .. } => assert_eq!(theme.as_deref(), Some("dark")),
        other => panic!("expected init, got {other:?}"),
    }
    assert_eq!(chart.current_theme(), Some("dark"));
}

#[tokio::test]
async fn theme_change_wins_over_option_change() {
    let mut chart = controller();
    chart.set_option(Some(&simple_option()), None);
    chart.flush().await;

    assert_eq!(
        chart.set_option(Some(&changed_option()), Some("dark")),
        LifecycleAction::Reinit
    );
}

#[tokio::test]
async fn removing_the_theme_is_a_theme_change() {
    let mut chart = controller();
    let option = simple_option();
    chart.set_option(Some(&option), Some("dark"));
    chart.flush().await;

    assert_eq!(chart.set_option(Some(&option), None), LifecycleAction::Reinit);
}

#[tokio::test]
async fn absent_option_is_ignored() {
    let mut chart = controller();
    assert_eq!(chart.set_option(None, Some("dark")), LifecycleAction::None);
    assert_eq!(chart.flush().await, LifecycleAction::None);
    assert!(chart.channel().sent().is_empty());
    assert_eq!(chart.last_serialized_option(), None);
}

#[tokio::test]
async fn change_before_first_flush_keeps_init() {
    let mut chart = controller();
    chart.set_option(Some(&simple_option()), None);

    assert_eq!(
        chart.set_option(Some(&changed_option()), None),
        LifecycleAction::Update
    );
    assert_eq!(chart.pending_action(), LifecycleAction::Init);
    assert_eq!(chart.flush().await, LifecycleAction::Init);

    let sent = chart.channel().sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        RendererCommand::Init { option, .. } => assert!(option.contains("\"Updated\"")),
        other => panic!("expected init, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_set_keeps_pending_action() {
    let mut chart = controller();
    let option = simple_option();
    chart.set_option(Some(&option), None);
    assert_eq!(chart.set_option(Some(&option), None), LifecycleAction::None);
    assert_eq!(chart.pending_action(), LifecycleAction::Init);
}

#[tokio::test]
async fn raw_option_is_sent_verbatim() {
    let mut chart = controller();
    let raw = r#"{"title":{"text":"Raw"},"series":[{"type":"line"}]}"#;
    chart.set_option(Some(&OptionSource::from(raw)), None);
    chart.flush().await;

    match &chart.channel().sent()[0] {
        RendererCommand::Init { option, .. } => assert_eq!(option, raw),
        other => panic!("expected init, got {other:?}"),
    }
}

#[tokio::test]
async fn initialized_fires_once_across_reinit() {
    let initialized = Arc::new(AtomicUsize::new(0));
    let mut chart = LifecycleController::new(
        Arc::new(RecordingChannel::default()),
        counting_handlers(&initialized),
    );
    let option = simple_option();

    chart.set_option(Some(&option), None);
    chart.flush().await;
    assert!(chart.is_initialized());

    chart.set_option(Some(&option), Some("dark"));
    chart.flush().await;
    assert_eq!(initialized.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_init_is_swallowed_and_consumed() {
    let initialized = Arc::new(AtomicUsize::new(0));
    let channel = Arc::new(RecordingChannel::default());
    channel.fail("initChart");
    let mut chart = LifecycleController::new(Arc::clone(&channel), counting_handlers(&initialized));
    let option = simple_option();

    chart.set_option(Some(&option), None);
    assert_eq!(chart.flush().await, LifecycleAction::Init);
    assert_eq!(chart.pending_action(), LifecycleAction::None);
    assert_eq!(initialized.load(Ordering::SeqCst), 0);
    assert!(!chart.is_initialized());

    // The failed option is still the baseline.
    assert_eq!(chart.set_option(Some(&option), None), LifecycleAction::None);
}

#[tokio::test]
async fn failed_update_is_swallowed() {
    let channel = Arc::new(RecordingChannel::default());
    let mut chart = LifecycleController::new(Arc::clone(&channel), ChartEventHandlers::new());
    chart.set_option(Some(&simple_option()), None);
    chart.flush().await;

    channel.fail("updateOption");
    chart.set_option(Some(&changed_option()), None);
    assert_eq!(chart.flush().await, LifecycleAction::Update);
    assert_eq!(channel.names(), vec!["initChart", "updateOption"]);
}

#[tokio::test]
async fn reinit_proceeds_after_failed_dispose() {
    let channel = Arc::new(RecordingChannel::default());
    let mut chart = LifecycleController::new(Arc::clone(&channel), ChartEventHandlers::new());
    let option = simple_option();
    chart.set_option(Some(&option), None);
    chart.flush().await;

    channel.fail("dispose");
    chart.set_option(Some(&option), Some("dark"));
    chart.flush().await;
    assert_eq!(channel.names(), vec!["initChart", "dispose", "initChart"]);
}

#[tokio::test]
async fn dispose_releases_chart_once() {
    let mut chart = controller();
    chart.set_option(Some(&simple_option()), None);
    chart.flush().await;

    chart.dispose().await;
    chart.dispose().await;
    assert!(chart.is_disposed());
    assert_eq!(chart.channel().names(), vec!["initChart", "dispose"]);
    match &chart.channel().sent()[1] {
        RendererCommand::Dispose { id } => assert_eq!(id, chart.id()),
        other => panic!("expected dispose, got {other:?}"),
    }
}

#[tokio::test]
async fn dispose_without_init_sends_nothing() {
    let mut chart = controller();
    chart.set_option(Some(&simple_option()), None);
    chart.dispose().await;
    assert!(chart.channel().sent().is_empty());
}

#[tokio::test]
async fn disposed_controller_ignores_new_options() {
    let mut chart = controller();
    chart.set_option(Some(&simple_option()), None);
    chart.flush().await;
    chart.dispose().await;

    assert_eq!(
        chart.set_option(Some(&changed_option()), None),
        LifecycleAction::None
    );
    assert_eq!(chart.flush().await, LifecycleAction::None);
    assert_eq!(chart.channel().names(), vec!["initChart", "dispose"]);
}

#[tokio::test]
async fn closed_channel_is_not_an_error() {
    let initialized = Arc::new(AtomicUsize::new(0));
    let channel = Arc::new(RecordingChannel::default());
    channel.close();
    let mut chart = LifecycleController::new(Arc::clone(&channel), counting_handlers(&initialized));

    chart.set_option(Some(&simple_option()), None);
    assert_eq!(chart.flush().await, LifecycleAction::Init);
    chart.dispose().await;
    assert_eq!(initialized.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn events_reach_handlers_until_disposed() {
    let clicks = Arc::new(Mutex::new(Vec::<ClickEvent>::new()));
    let legends = Arc::new(Mutex::new(Vec::<String>::new()));
    let handlers = {
        let clicks = Arc::clone(&clicks);
        let legends = Arc::clone(&legends);
        ChartEventHandlers::new()
            .with_on_click(move |event| clicks.lock().push(event.clone()))
            .with_on_legend_select(move |name| legends.lock().push(name.to_owned()))
    };
    let mut chart = LifecycleController::new(Arc::new(RecordingChannel::default()), handlers);

    let event = ClickEvent {
        name: "A".to_owned(),
        series_name: "Test".to_owned(),
        data_index: 0,
        value: "1".to_owned(),
        component_type: "series".to_owned(),
    };
    chart.on_chart_click(event.clone());
    chart.on_legend_select_changed("Sales");

    chart.dispose().await;
    chart.on_chart_click(event.clone());
    chart.on_legend_select_changed("Sales");

    assert_eq!(*clicks.lock(), vec![event]);
    assert_eq!(*legends.lock(), vec!["Sales".to_owned()]);
}

#[tokio::test]
async fn init_sink_forwards_engine_events() {
    let clicks = Arc::new(AtomicUsize::new(0));
    let handlers = {
        let clicks = Arc::clone(&clicks);
        ChartEventHandlers::new().with_on_click(move |_| {
            clicks.fetch_add(1, Ordering::SeqCst);
        })
    };
    let mut chart = LifecycleController::new(Arc::new(RecordingChannel::default()), handlers);
    chart.set_option(Some(&simple_option()), None);
    chart.flush().await;

    let sink = match &chart.channel().sent()[0] {
        RendererCommand::Init { sink, .. } => Arc::clone(sink),
        other => panic!("expected init, got {other:?}"),
    };
    sink.on_chart_click(ClickEvent::default()).expect("live sink");
    assert_eq!(clicks.load(Ordering::SeqCst), 1);

    chart.dispose().await;
    let err = sink
        .on_chart_click(ClickEvent::default())
        .expect_err("sink closed after dispose");
    assert!(err.is_channel_closed());
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn replaced_handlers_take_effect() {
    let hits = Arc::new(AtomicUsize::new(0));
    let chart = controller();
    chart.on_legend_select_changed("ignored");

    let counter = Arc::clone(&hits);
    chart.set_handlers(ChartEventHandlers::new().with_on_legend_select(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    chart.on_legend_select_changed("Sales");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn controllers_get_distinct_ids() {
    let first = controller();
    let second = controller();
    assert_ne!(first.id(), second.id());
    assert!(
        first
            .id()
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    );
}

#[test]
fn container_style_defaults_and_overrides() {
    let chart = controller();
    let style = chart.container_style().style_attribute();
    assert!(style.contains("width: 100%"));
    assert!(style.contains("height: 400px"));

    let config = BridgeConfig::new().with_container(ContainerStyle::new("800px", "600px"));
    let chart = LifecycleController::with_config(
        Arc::new(RecordingChannel::default()),
        ChartEventHandlers::new(),
        &config,
    );
    let style = chart.container_style().style_attribute();
    assert!(style.contains("width: 800px"));
    assert!(style.contains("height: 600px"));
}
