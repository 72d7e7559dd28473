//! Locates the canonical message record inside a webhook payload.
//!
//! The gateway (and the client builds behind it) deliver the same logical
//! event in several shapes: a `message` list, a bare record, a record under
//! a `data` wrapper, or buried deeper inside event framing. Resolution tries
//! the known fast paths first and only then falls back to a bounded
//! depth-first search of the whole document.

use serde_json::Value;
use tracing::debug;

use crate::types::InboundEnvelope;

/// How deep the fallback search descends before giving up. Keeps resolution
/// bounded on adversarial or cyclic-looking documents.
pub const MAX_SCAN_DEPTH: usize = 5;

/// Resolves the message record out of an arbitrary webhook payload.
///
/// Returns `None` when no known shape matches; callers answer with a
/// structured "unrecognized format" result instead of failing the request.
pub fn resolve_envelope(payload: &Value) -> Option<InboundEnvelope> {
    // Shape 1: a `message` field holding an ordered list of records.
    if let Some(first) = payload
        .get("message")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
    {
        if let Some(envelope) = envelope_from_record(first) {
            return Some(envelope);
        }
    }

    // Shape 2: the payload is the record itself.
    if let Some(envelope) = envelope_from_record(payload) {
        return Some(envelope);
    }

    // Shape 3: the record sits under a `data` wrapper.
    if let Some(envelope) = payload.get("data").and_then(envelope_from_record) {
        return Some(envelope);
    }

    // Shape 4: bounded recursive search over the full document.
    let record = scan_for_record(payload, 0)?;
    debug!("message record located by recursive scan");
    envelope_from_record(record)
}

fn envelope_from_record(record: &Value) -> Option<InboundEnvelope> {
    let key = record.get("key")?;
    let sender = key.get("remoteJid")?.as_str()?.to_string();
    let from_me = key.get("fromMe").and_then(Value::as_bool).unwrap_or(false);
    let text = record
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Some(InboundEnvelope {
        sender,
        from_me,
        text,
        record: record.clone(),
    })
}

/// Depth-first search for the first node that looks like a message record:
/// a `key.remoteJid` routing field with a sibling `message` field. Lists are
/// walked element by element; every level of nesting counts against the
/// depth budget.
fn scan_for_record(value: &Value, depth: usize) -> Option<&Value> {
    if depth > MAX_SCAN_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            let has_routing_key = map
                .get("key")
                .and_then(|key| key.get("remoteJid"))
                .is_some();
            if has_routing_key && map.contains_key("message") {
                return Some(value);
            }
            map.values().find_map(|child| scan_for_record(child, depth + 1))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| scan_for_record(item, depth + 1)),
        _ => None,
    }
}
