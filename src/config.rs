use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 100;
pub const DEFAULT_CONTAINER_WIDTH: &str = "100%";
pub const DEFAULT_CONTAINER_HEIGHT: &str = "400px";

/// CSS size of the element a chart mounts into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerStyle {
    pub width: String,
    pub height: String,
}

impl Default for ContainerStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_CONTAINER_WIDTH.to_owned(),
            height: DEFAULT_CONTAINER_HEIGHT.to_owned(),
        }
    }
}

impl ContainerStyle {
    #[must_use]
    pub fn new(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
        }
    }

    /// Inline `style` attribute for the mount element.
    #[must_use]
    pub fn style_attribute(&self) -> String {
        format!("width: {}; height: {};", self.width, self.height)
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.width.trim().is_empty() || self.height.trim().is_empty() {
            return Err(ChartError::InvalidConfig(
                "container width and height must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Host-level settings shared by controllers and the renderer registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Quiet period after the last size change before a chart is resized.
    pub resize_debounce_ms: u64,
    pub container: ContainerStyle,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            container: ContainerStyle::default(),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resize_debounce(mut self, window: Duration) -> Self {
        self.resize_debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_container(mut self, container: ContainerStyle) -> Self {
        self.container = container;
        self
    }

    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn validate(&self) -> ChartResult<()> {
        self.container.validate()
    }

    /// Loads settings from host JSON; missing keys take their defaults.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidConfig(format!("failed to parse bridge config json: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}
