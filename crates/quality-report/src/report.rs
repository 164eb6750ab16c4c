use serde_json::Value;

use trust_core::stats::f5;

/// Serialization contract shared by all report types.
pub trait Report {
    /// Nested mapping of the report's fields. With `printable` set, every
    /// scalar is rounded to five significant digits for display.
    fn to_json(&self, printable: bool) -> Value;

    /// Static description of each field. Structurally aligned with
    /// [`to_json`](Self::to_json): every key the summary emits is described
    /// here (a string leaf documents a whole free-form sub-mapping).
    fn to_json_meaning() -> Value
    where
        Self: Sized;
}

pub(crate) fn display(value: f64, printable: bool) -> f64 {
    if printable {
        f5(value)
    } else {
        value
    }
}

/// Every key in `summary` must be documented at the same path in `meaning`.
#[cfg(test)]
pub(crate) fn assert_keys_documented(summary: &Value, meaning: &Value) {
    if let Some(map) = summary.as_object() {
        // A string leaf documents the whole sub-mapping.
        if meaning.is_string() {
            return;
        }
        let meaning_map = meaning
            .as_object()
            .unwrap_or_else(|| panic!("meaning is not an object for summary {map:?}"));
        for (key, sub) in map {
            let sub_meaning = meaning_map
                .get(key)
                .unwrap_or_else(|| panic!("missing meaning for key '{key}'"));
            assert_keys_documented(sub, sub_meaning);
        }
    }
}
