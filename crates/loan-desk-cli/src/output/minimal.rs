use serde_json::{Map, Value};

/// Key answer fields in order of priority.
const PRIORITY_KEYS: [&str; 6] = [
    "monthly_payment",
    "percent_complete",
    "rate",
    "total_items",
    "total_loans",
    "status",
];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority, at
/// the top level and then one level down (a quote nests `terms`, loan
/// progress nests `progress`), then fall back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = find_priority(map) {
            println!("{}", format_minimal(val));
            return;
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn find_priority(map: &Map<String, Value>) -> Option<&Value> {
    PRIORITY_KEYS.iter().find_map(|key| {
        std::iter::once(map)
            .chain(map.values().filter_map(Value::as_object))
            .find_map(|obj| match obj.get(*key) {
                // A rate quote nests its number under `rate.rate`
                Some(Value::Object(inner)) => inner.get(*key).filter(|v| v.is_number() || v.is_string()),
                Some(v) if !v.is_null() => Some(v),
                _ => None,
            })
    })
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
