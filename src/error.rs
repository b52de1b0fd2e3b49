use thiserror::Error;

use crate::instance::InstanceId;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("mount point `{0}` not found")]
    MountPointNotFound(InstanceId),

    /// The host tore down the boundary channel (navigation, shutdown).
    #[error("renderer channel closed")]
    ChannelClosed,

    #[error("malformed option json: {0}")]
    MalformedOption(String),

    #[error("chart `{0}` is not registered")]
    UnknownInstance(InstanceId),

    #[error("failed to serialize option: {0}")]
    Serialization(String),

    #[error("engine failure: {0}")]
    Engine(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ChartError {
    #[must_use]
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed)
    }
}
