use serde_json::Value;

use crate::error::{ChartError, ChartResult};

use super::ChartOption;

/// Anything a caller may hand to a chart as its option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// The typed option tree.
    Typed(ChartOption),
    /// A loosely-typed document built with `serde_json::json!` or parsed
    /// from elsewhere. A bare `Value::String` is taken as pre-serialized
    /// JSON, like [`OptionSource::Raw`].
    Value(Value),
    /// Pre-serialized JSON, forwarded byte-for-byte without validation.
    Raw(String),
}

impl OptionSource {
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl From<ChartOption> for OptionSource {
    fn from(option: ChartOption) -> Self {
        Self::Typed(option)
    }
}

impl From<Value> for OptionSource {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for OptionSource {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for OptionSource {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_owned())
    }
}

/// Produces the JSON document sent across the renderer boundary.
///
/// Strings come back unchanged. Everything else is written compactly with
/// `null` object members dropped at every depth, so a typed option and the
/// equivalent loose value produce the same bytes.
pub fn serialize_option(source: &OptionSource) -> ChartResult<String> {
    match source {
        OptionSource::Raw(raw) | OptionSource::Value(Value::String(raw)) => Ok(raw.clone()),
        OptionSource::Typed(option) => {
            let value = serde_json::to_value(option).map_err(|e| {
                ChartError::Serialization(format!("failed to serialize option: {e}"))
            })?;
            to_compact_json(&strip_null_members(value))
        }
        OptionSource::Value(value) => to_compact_json(&strip_null_members(value.clone())),
    }
}

fn to_compact_json<T: serde::Serialize>(payload: &T) -> ChartResult<String> {
    serde_json::to_string(payload)
        .map_err(|e| ChartError::Serialization(format!("failed to serialize option: {e}")))
}

fn strip_null_members(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(key, member)| (key, strip_null_members(member)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_null_members).collect()),
        other => other,
    }
}

impl ChartOption {
    pub fn to_json(&self) -> ChartResult<String> {
        to_compact_json(self)
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::Serialization(format!("failed to serialize option: {e}")))
    }

    /// Parses an option document, keeping keys the model does not type in
    /// the `extra` maps.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ChartError::MalformedOption(format!("failed to parse option json: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{OptionSource, serialize_option};
    use crate::option::{ChartOption, LineSeries, PieSeries, SankeyLink, SankeySeries, Title};

    #[test]
    fn raw_source_is_returned_without_parsing() {
        let raw = "{not even json";
        let out = serialize_option(&OptionSource::from(raw)).expect("raw passthrough");
        assert_eq!(out, raw);
    }

    #[test]
    fn loose_value_drops_null_members_but_keeps_array_nulls() {
        let value = json!({
            "title": { "text": "T", "subtext": null },
            "series": [{ "type": "line", "data": [1, null, 3] }],
            "legend": null
        });
        let out = serialize_option(&OptionSource::from(value)).expect("serialize value");
        assert_eq!(
            out,
            r#"{"title":{"text":"T"},"series":[{"type":"line","data":[1,null,3]}]}"#
        );
    }

    #[test]
    fn typed_option_is_compact_and_ordered_by_model() {
        let option = ChartOption::new()
            .with_title(Title::text("Typed"))
            .with_series(LineSeries::new("Data").with_data([1, 2, 3]));
        let out = serialize_option(&option.into()).expect("serialize typed");
        assert_eq!(
            out,
            r#"{"title":{"text":"Typed"},"series":[{"type":"line","name":"Data","data":[1,2,3]}]}"#
        );
    }

    #[test]
    fn typed_value_slots_drop_null_members() {
        let mut pie = PieSeries::new("P");
        pie.label = Some(json!({"show": true, "formatter": null}));
        let mut line = LineSeries::new("L");
        line.area_style = Some(Value::Null);
        let option = ChartOption::new()
            .with_series(pie)
            .with_series(line)
            .with_extra("dataZoom", Value::Null);

        let typed = serialize_option(&option.clone().into()).expect("serialize typed");
        assert_eq!(
            typed,
            r#"{"series":[{"type":"pie","name":"P","label":{"show":true}},{"type":"line","name":"L"}]}"#
        );

        let loose = serde_json::to_value(&option).expect("to value");
        let loose = serialize_option(&OptionSource::Value(loose)).expect("serialize value");
        assert_eq!(typed, loose);
    }

    #[test]
    fn non_finite_link_value_is_omitted() {
        let option = ChartOption::new()
            .with_series(SankeySeries::new("F").with_links([SankeyLink::new("a", "b", f64::NAN)]));
        let out = serialize_option(&option.into()).expect("serialize typed");
        assert_eq!(
            out,
            r#"{"series":[{"type":"sankey","name":"F","links":[{"source":"a","target":"b"}]}]}"#
        );
    }

    #[test]
    fn string_value_is_treated_as_raw_json() {
        let raw = r#"{"a":1}"#;
        let out = serialize_option(&OptionSource::Value(Value::String(raw.to_owned())))
            .expect("string passthrough");
        assert_eq!(out, raw);
    }
}
