use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ChartResult;
use crate::events::ChartEventSink;
use crate::instance::InstanceId;

/// One call across the renderer boundary.
#[derive(Clone)]
pub enum RendererCommand {
    Init {
        id: InstanceId,
        option: String,
        theme: Option<String>,
        sink: Arc<dyn ChartEventSink>,
    },
    /// Merge `option` into the live chart.
    Update { id: InstanceId, option: String },
    Resize { id: InstanceId },
    Dispose { id: InstanceId },
}

impl RendererCommand {
    #[must_use]
    pub fn id(&self) -> &InstanceId {
        match self {
            Self::Init { id, .. }
            | Self::Update { id, .. }
            | Self::Resize { id }
            | Self::Dispose { id } => id,
        }
    }

    /// Boundary method name, as used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "initChart",
            Self::Update { .. } => "updateOption",
            Self::Resize { .. } => "resize",
            Self::Dispose { .. } => "dispose",
        }
    }
}

impl fmt::Debug for RendererCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init {
                id, option, theme, ..
            } => f
                .debug_struct("Init")
                .field("id", id)
                .field("option", option)
                .field("theme", theme)
                .finish_non_exhaustive(),
            Self::Update { id, option } => f
                .debug_struct("Update")
                .field("id", id)
                .field("option", option)
                .finish(),
            Self::Resize { id } => f.debug_struct("Resize").field("id", id).finish(),
            Self::Dispose { id } => f.debug_struct("Dispose").field("id", id).finish(),
        }
    }
}

/// Asynchronous command transport to the renderer.
///
/// Implementations resolve once the renderer has handled the command, or fail
/// with `ChannelClosed` when the other side is gone.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn send(&self, command: RendererCommand) -> ChartResult<()>;
}

#[async_trait]
impl<T> CommandChannel for Arc<T>
where
    T: CommandChannel + ?Sized,
{
    async fn send(&self, command: RendererCommand) -> ChartResult<()> {
        (**self).send(command).await
    }
}
