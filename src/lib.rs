//! chart-bridge: declarative lifecycle binding for a JSON-configured charting
//! engine.
//!
//! A [`LifecycleController`] owns one chart instance. It serializes the
//! typed [`ChartOption`] tree, decides whether a change needs a fresh chart,
//! a re-created chart or an in-place merge, and drives the renderer through
//! a [`CommandChannel`]. On the renderer side a [`ChartRegistry`] keeps one
//! engine chart per instance id and forwards click and legend events back.

pub mod config;
pub mod error;
pub mod events;
pub mod instance;
pub mod lifecycle;
pub mod option;
pub mod render;
pub mod telemetry;

pub use config::{BridgeConfig, ContainerStyle};
pub use error::{ChartError, ChartResult};
pub use events::{ChartEventHandlers, ChartEventSink, ClickEvent, LegendEvent};
pub use instance::InstanceId;
pub use lifecycle::{LifecycleAction, LifecycleController};
pub use option::{ChartOption, OptionSource, Series, serialize_option};
pub use render::{ChartRegistry, CommandChannel, HeadlessEngine, RendererCommand, RendererService};
