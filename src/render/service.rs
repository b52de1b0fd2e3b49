use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{ChartError, ChartResult};

use super::engine::EngineHost;
use super::{ChartRegistry, CommandChannel, RendererCommand};

struct Envelope {
    command: RendererCommand,
    reply: oneshot::Sender<ChartResult<()>>,
}

/// Runs a [`ChartRegistry`] behind an asynchronous command queue.
///
/// Commands are handled one at a time in arrival order. Once the service is
/// shut down every pending and later send fails with `ChannelClosed`, which
/// controllers treat as teardown.
pub struct RendererService {
    handle: RendererHandle,
    task: JoinHandle<()>,
}

impl RendererService {
    /// Spawns the command loop on the current tokio runtime.
    #[must_use]
    pub fn spawn<H: EngineHost>(registry: ChartRegistry<H>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let result = registry.execute(envelope.command);
                // The caller may have stopped waiting.
                let _ = envelope.reply.send(result);
            }
            debug!("renderer service stopped");
        });
        Self {
            handle: RendererHandle { tx },
            task,
        }
    }

    #[must_use]
    pub fn handle(&self) -> RendererHandle {
        self.handle.clone()
    }

    /// Stops the command loop without disposing registered charts, the way a
    /// host tears down its side of the boundary on navigation. Dropping the
    /// service does the same.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for RendererService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Cloneable sending side of a [`RendererService`].
#[derive(Clone)]
pub struct RendererHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl RendererHandle {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl CommandChannel for RendererHandle {
    async fn send(&self, command: RendererCommand) -> ChartResult<()> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply })
            .map_err(|_| ChartError::ChannelClosed)?;
        response.await.map_err(|_| ChartError::ChannelClosed)?
    }
}
