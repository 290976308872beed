//! Best-effort resource usage extraction from a target's response body.
//!
//! Extractors run in order; the first one that finds its field wins.
//! Anything unparseable degrades to "N/A".

use serde_json::Value;

use crate::models::NOT_AVAILABLE;

type Extractor = fn(&Value) -> Option<String>;

const EXTRACTORS: &[Extractor] = &[connections, heap_used];

pub fn extract(body: &str) -> String {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return NOT_AVAILABLE.into();
    };
    EXTRACTORS
        .iter()
        .find_map(|extractor| extractor(&payload))
        .unwrap_or_else(|| NOT_AVAILABLE.into())
}

/// `data.connections` as `"<n> connections"`.
fn connections(payload: &Value) -> Option<String> {
    let count = payload.get("data")?.get("connections")?;
    match count {
        Value::Number(n) => Some(format!("{} connections", n)),
        Value::String(s) if s.trim().parse::<f64>().is_ok() => {
            Some(format!("{} connections", s.trim()))
        }
        _ => None,
    }
}

/// `data.memoryUsage.heapUsed`, verbatim.
fn heap_used(payload: &Value) -> Option<String> {
    match payload.get("data")?.get("memoryUsage")?.get("heapUsed")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
