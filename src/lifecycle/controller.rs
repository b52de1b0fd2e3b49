use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::config::{BridgeConfig, ContainerStyle};
use crate::events::{ChartEventHandlers, ChartEventSink, ClickEvent, HandlerSink};
use crate::instance::InstanceId;
use crate::option::{OptionSource, serialize_option};
use crate::render::{CommandChannel, RendererClient};

use super::action::{LifecycleAction, classify_change};

/// Owns one chart instance and keeps the renderer in sync with the option
/// and theme the host sets on it.
///
/// The host calls [`LifecycleController::set_option`] whenever its inputs may
/// have changed and [`LifecycleController::flush`] once the mount point is
/// rendered. Repeated sets between flushes coalesce by precedence, so an
/// unapplied `Init` is never downgraded to an `Update`.
///
/// Renderer failures are logged and swallowed; nothing here returns an
/// error to the host.
pub struct LifecycleController<C: CommandChannel> {
    id: InstanceId,
    client: RendererClient<C>,
    sink: Arc<HandlerSink>,
    container: ContainerStyle,
    last_serialized: Option<String>,
    requested_theme: Option<String>,
    current_theme: Option<String>,
    pending: LifecycleAction,
    /// An init has been sent at least once.
    mounted: bool,
    initialized_notified: bool,
    disposed: bool,
}

impl<C: CommandChannel> LifecycleController<C> {
    #[must_use]
    pub fn new(channel: C, handlers: ChartEventHandlers) -> Self {
        Self::with_config(channel, handlers, &BridgeConfig::default())
    }

    #[must_use]
    pub fn with_config(channel: C, handlers: ChartEventHandlers, config: &BridgeConfig) -> Self {
        let id = InstanceId::generate();
        debug!(instance = %id, "chart controller created");
        Self {
            id,
            client: RendererClient::new(channel),
            sink: Arc::new(HandlerSink::new(handlers)),
            container: config.container.clone(),
            last_serialized: None,
            requested_theme: None,
            current_theme: None,
            pending: LifecycleAction::None,
            mounted: false,
            initialized_notified: false,
            disposed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    /// Size of the mount point the host renders for [`Self::id`].
    #[must_use]
    pub fn container_style(&self) -> &ContainerStyle {
        &self.container
    }

    pub fn set_container_style(&mut self, container: ContainerStyle) {
        self.container = container;
    }

    /// Replaces the callbacks; a live chart picks them up on its next event.
    pub fn set_handlers(&self, handlers: ChartEventHandlers) {
        self.sink.replace_handlers(handlers);
    }

    #[must_use]
    pub fn pending_action(&self) -> LifecycleAction {
        self.pending
    }

    /// Theme the live chart was created with.
    #[must_use]
    pub fn current_theme(&self) -> Option<&str> {
        self.current_theme.as_deref()
    }

    #[must_use]
    pub fn last_serialized_option(&self) -> Option<&str> {
        self.last_serialized.as_deref()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized_notified
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn channel(&self) -> &C {
        self.client.channel()
    }

    /// Records the host's current inputs and returns the action they imply.
    ///
    /// An absent option changes nothing. The serialized form is remembered
    /// even when the action is `None`, so the next comparison is against the
    /// latest seen option.
    pub fn set_option(
        &mut self,
        option: Option<&OptionSource>,
        theme: Option<&str>,
    ) -> LifecycleAction {
        if self.disposed {
            return LifecycleAction::None;
        }
        let Some(option) = option else {
            return LifecycleAction::None;
        };
        let serialized = match serialize_option(option) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!(instance = %self.id, error = %err, "error serializing chart option");
                return LifecycleAction::None;
            }
        };

        self.requested_theme = theme.map(str::to_owned);
        let action = classify_change(
            self.last_serialized.as_deref(),
            self.current_theme.as_deref(),
            self.requested_theme.as_deref(),
            &serialized,
        );
        self.pending = self.pending.max(action);
        self.last_serialized = Some(serialized);
        trace!(instance = %self.id, ?action, pending = ?self.pending, "chart option observed");
        action
    }

    /// Applies the pending action and returns it.
    ///
    /// The pending action is consumed whether or not the renderer accepted
    /// it.
    pub async fn flush(&mut self) -> LifecycleAction {
        let action = std::mem::take(&mut self.pending);
        if self.disposed {
            return LifecycleAction::None;
        }
        let Some(option) = self.last_serialized.clone() else {
            return LifecycleAction::None;
        };

        match action {
            LifecycleAction::None => {}
            LifecycleAction::Init => self.apply_init(&option).await,
            LifecycleAction::Reinit => self.apply_reinit(&option).await,
            LifecycleAction::Update => {
                if let Err(err) = self.client.update(&self.id, &option).await {
                    error!(instance = %self.id, error = %err, "error updating chart");
                }
            }
        }
        action
    }

    /// Releases the renderer resource and detaches the event sink.
    ///
    /// Idempotent. A controller that never sent an init sends no dispose.
    pub async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.pending = LifecycleAction::None;
        self.sink.close();

        if self.mounted {
            if let Err(err) = self.client.dispose_chart(&self.id).await {
                warn!(instance = %self.id, error = %err, "error disposing chart");
            }
        }
        self.client.close();
        debug!(instance = %self.id, "chart controller disposed");
    }

    /// Entry point for click events addressed to this instance.
    pub fn on_chart_click(&self, event: ClickEvent) {
        if self.disposed {
            return;
        }
        self.sink.handlers().dispatch_click(&event);
    }

    /// Entry point for legend toggles addressed to this instance.
    pub fn on_legend_select_changed(&self, name: &str) {
        if self.disposed {
            return;
        }
        self.sink.handlers().dispatch_legend_select(name);
    }

    async fn apply_init(&mut self, option: &str) {
        self.mounted = true;
        self.current_theme = self.requested_theme.clone();
        let sink: Arc<dyn ChartEventSink> = self.sink.clone();
        let result = self
            .client
            .init(&self.id, option, self.current_theme.as_deref(), sink)
            .await;
        match result {
            Ok(true) => self.notify_initialized(),
            Ok(false) => debug!(instance = %self.id, "renderer gone before chart init"),
            Err(err) => error!(instance = %self.id, error = %err, "error initializing chart"),
        }
    }

    async fn apply_reinit(&mut self, option: &str) {
        // The renderer replaces any chart still registered under the id, so
        // a failed dispose does not block the init.
        if let Err(err) = self.client.dispose_chart(&self.id).await {
            warn!(instance = %self.id, error = %err, "error disposing chart before theme change");
        }
        self.apply_init(option).await;
    }

    fn notify_initialized(&mut self) {
        if self.initialized_notified {
            return;
        }
        self.initialized_notified = true;
        self.sink.handlers().dispatch_initialized();
    }
}

impl<C: CommandChannel> Drop for LifecycleController<C> {
    fn drop(&mut self) {
        self.sink.close();
    }
}
