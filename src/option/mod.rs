//! Typed option tree and its canonical JSON form.
//!
//! Field names are emitted in lowerCamelCase, unset fields are omitted, and
//! each series carries its `type` discriminator.

mod axis;
mod chart_option;
mod serialize;
mod series;

pub use axis::{AxisType, OneOrMany, XAxis, YAxis};
pub use chart_option::{ChartOption, Grid, Legend, Orientation, Title, Tooltip, TooltipTrigger};
pub use serialize::{OptionSource, serialize_option};
pub use series::{
    BarSeries, LineSeries, PieSeries, RoseType, SankeyLink, SankeyNode, SankeySeries, Series,
};
