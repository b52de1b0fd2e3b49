use std::sync::Arc;

use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::events::ChartEventSink;
use crate::instance::InstanceId;

use super::{CommandChannel, RendererCommand};

/// Controller-side facade over a [`CommandChannel`].
///
/// A closed channel is a teardown race, not a failure: every call that hits
/// one resolves to `Ok`. After [`RendererClient::close`] all calls are
/// no-ops.
pub struct RendererClient<C> {
    channel: C,
    closed: bool,
}

impl<C: CommandChannel> RendererClient<C> {
    #[must_use]
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            closed: false,
        }
    }

    /// Returns `false` when the command never reached a renderer.
    pub async fn init(
        &self,
        id: &InstanceId,
        option: &str,
        theme: Option<&str>,
        sink: Arc<dyn ChartEventSink>,
    ) -> ChartResult<bool> {
        self.deliver(RendererCommand::Init {
            id: id.clone(),
            option: option.to_owned(),
            theme: theme.map(str::to_owned),
            sink,
        })
        .await
    }

    pub async fn update(&self, id: &InstanceId, option: &str) -> ChartResult<()> {
        self.dispatch(RendererCommand::Update {
            id: id.clone(),
            option: option.to_owned(),
        })
        .await
    }

    pub async fn resize(&self, id: &InstanceId) -> ChartResult<()> {
        self.dispatch(RendererCommand::Resize { id: id.clone() }).await
    }

    pub async fn dispose_chart(&self, id: &InstanceId) -> ChartResult<()> {
        self.dispatch(RendererCommand::Dispose { id: id.clone() }).await
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    async fn dispatch(&self, command: RendererCommand) -> ChartResult<()> {
        self.deliver(command).await.map(|_| ())
    }

    async fn deliver(&self, command: RendererCommand) -> ChartResult<bool> {
        if self.closed {
            return Ok(false);
        }
        let name = command.name();
        let id = command.id().clone();
        match self.channel.send(command).await {
            Ok(()) => Ok(true),
            Err(ChartError::ChannelClosed) => {
                debug!(instance = %id, command = name, "renderer channel closed; ignoring");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
