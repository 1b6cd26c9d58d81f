use serde_json::{json, Value};

use crate::rrd::RrdData;

/// Converts data produced by a column into its query output value.
pub trait Renderer<D>: Send + Sync {
    fn render(&self, data: &D) -> Value;
}

#[derive(Debug, Default, Copy, Clone)]
/// Renders [RrdData] as the list `[start, end, step, values...]`.
///
/// Unknown values are rendered as `null`, empty data as an empty list.
pub struct RrdRenderer;

impl RrdRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer<RrdData> for RrdRenderer {
    fn render(&self, data: &RrdData) -> Value {
        if data.is_empty() {
            return Value::Array(Vec::new());
        }

        let mut list = Vec::with_capacity(data.values.len() + 3);
        list.push(json!(data.start));
        list.push(json!(data.end));
        list.push(json!(data.step));
        list.extend(data.values.iter().map(|value| json!(value)));
        Value::Array(list)
    }
}
