//! Renderer boundary.
//!
//! Controllers talk to the renderer through a [`CommandChannel`]. On the far
//! side a [`ChartRegistry`] owns one engine chart per instance id, wires its
//! click/legend listeners and size observer, and guarantees leak-free
//! disposal. The engine itself sits behind [`EngineHost`].

mod client;
mod command;
mod debounce;
mod engine;
mod headless;
mod registry;
mod service;

pub use client::RendererClient;
pub use command::{CommandChannel, RendererCommand};
pub use engine::{
    ClickListener, EngineChart, EngineHost, LegendListener, ResizeCallback, SetOptionMode,
    SizeObserver,
};
pub use headless::{HeadlessChart, HeadlessChartSnapshot, HeadlessEngine, HeadlessObserver};
pub use registry::ChartRegistry;
pub use service::{RendererHandle, RendererService};
