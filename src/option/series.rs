use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Orientation;

/// One entry of the option `series` array.
///
/// The variant is encoded as the `type` key of the emitted object, so callers
/// never set the discriminator themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Series {
    Line(LineSeries),
    Bar(BarSeries),
    Pie(PieSeries),
    Sankey(SankeySeries),
}

impl Series {
    /// Discriminator written to the `type` key.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Bar(_) => "bar",
            Self::Pie(_) => "pie",
            Self::Sankey(_) => "sankey",
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Line(series) => series.name.as_deref(),
            Self::Bar(series) => series.name.as_deref(),
            Self::Pie(series) => series.name.as_deref(),
            Self::Sankey(series) => series.name.as_deref(),
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&[Value]> {
        match self {
            Self::Line(series) => series.data.as_deref(),
            Self::Bar(series) => series.data.as_deref(),
            Self::Pie(series) => series.data.as_deref(),
            Self::Sankey(series) => series.data.as_deref(),
        }
    }
}

impl From<LineSeries> for Series {
    fn from(series: LineSeries) -> Self {
        Self::Line(series)
    }
}

impl From<BarSeries> for Series {
    fn from(series: BarSeries) -> Self {
        Self::Bar(series)
    }
}

impl From<PieSeries> for Series {
    fn from(series: PieSeries) -> Self {
        Self::Pie(series)
    }
}

impl From<SankeySeries> for Series {
    fn from(series: SankeySeries) -> Self {
        Self::Sankey(series)
    }
}

fn collect_values<I, T>(items: I) -> Vec<Value>
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    items.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    /// An empty object enables area fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_style: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_style: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl LineSeries {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data<I, T>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.data = Some(collect_values(data));
        self
    }

    #[must_use]
    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = Some(smooth);
        self
    }

    /// Fills the area under the line with the default style.
    #[must_use]
    pub fn with_area_fill(mut self) -> Self {
        self.area_style = Some(Value::Object(serde_json::Map::new()));
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_style: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl BarSeries {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data<I, T>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.data = Some(collect_values(data));
        self
    }

    #[must_use]
    pub fn with_bar_width(mut self, width: impl Into<String>) -> Self {
        self.bar_width = Some(width.into());
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Nightingale rose variants of a pie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoseType {
    Radius,
    Area,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    /// `"50%"`, or `["40%", "70%"]` for a donut.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rose_type: Option<RoseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PieSeries {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data<I, T>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.data = Some(collect_values(data));
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius: impl Into<Value>) -> Self {
        self.radius = Some(radius.into());
        self
    }

    #[must_use]
    pub fn with_rose_type(mut self, rose_type: RoseType) -> Self {
        self.rose_type = Some(rose_type);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeySeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Node records, usually built from [`SankeyNode`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<SankeyLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orient: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl SankeySeries {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_nodes<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = SankeyNode>,
    {
        self.data = Some(nodes.into_iter().map(SankeyNode::into_value).collect());
        self
    }

    #[must_use]
    pub fn with_links<I>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = SankeyLink>,
    {
        self.links = Some(links.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_orient(mut self, orient: Orientation) -> Self {
        self.orient = Some(orient);
        self
    }
}

/// Weighted edge between two sankey nodes, addressed by node name.
///
/// Names are not checked against the node list here; the engine resolves them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl SankeyLink {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            value: Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SankeyNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SankeyNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    fn into_value(self) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(name) = self.name {
            map.insert("name".to_owned(), Value::String(name));
        }
        Value::Object(map)
    }
}
