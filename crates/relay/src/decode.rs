//! Decode raw service documents into validated domain records.
//!
//! Envelope problems (wrong top-level shape, missing `data`) reject the whole
//! document. Problems inside one resource reject only that resource: it is
//! logged, reported in [`Decoded::rejected`], and the rest of the batch
//! survives.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use orca_core::{
    parse_timestamp, DecodeError, DestinationDetection, DestinationFeed, SourceDetection,
};

/// Records that decoded cleanly plus the index and cause of every reject.
#[derive(Debug)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub rejected: Vec<(usize, DecodeError)>,
}

impl<T> Decoded<T> {
    fn with_capacity(n: usize) -> Self {
        Self {
            records: Vec::with_capacity(n),
            rejected: Vec::new(),
        }
    }

    fn reject(&mut self, kind: &'static str, index: usize, error: DecodeError) {
        warn!(kind, index, error = %error, "Skipping malformed record");
        self.rejected.push((index, error));
    }
}

/// Human-readable JSON kind, for shape errors.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value, DecodeError> {
    obj.get(key)
        .ok_or_else(|| DecodeError::MissingField(path.to_string()))
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a str, DecodeError> {
    let value = field(obj, key, path)?;
    value
        .as_str()
        .ok_or_else(|| DecodeError::shape(path, "string", json_kind(value)))
}

fn object_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, DecodeError> {
    let value = field(obj, key, path)?;
    value
        .as_object()
        .ok_or_else(|| DecodeError::shape(path, "object", json_kind(value)))
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::shape(path, "object", json_kind(value)))
}

/// Unwrap a JSON:API `{ "data": [...] }` envelope.
fn data_array(root: &Value) -> Result<&Vec<Value>, DecodeError> {
    let obj = as_object(root, "$")?;
    let data = field(obj, "data", "data")?;
    data.as_array()
        .ok_or_else(|| DecodeError::shape("data", "array", json_kind(data)))
}

// ── Destination feeds ─────────────────────────────────────────

fn decode_feed(value: &Value) -> Result<DestinationFeed, DecodeError> {
    let obj = as_object(value, "feed")?;
    let attributes = object_field(obj, "attributes", "attributes")?;
    let name = str_field(attributes, "name", "attributes.name")?;
    let id = str_field(obj, "id", "id")?;
    Ok(DestinationFeed {
        id: id.to_string(),
        name: name.to_string(),
    })
}

/// Decode the destination feed directory.
///
/// Feed ids are unique in the result: a repeated id is rejected and the
/// first occurrence is kept.
pub fn decode_feeds(body: &str) -> Result<Decoded<DestinationFeed>, DecodeError> {
    let root: Value = serde_json::from_str(body)?;
    let items = data_array(&root)?;

    let mut out = Decoded::with_capacity(items.len());
    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match decode_feed(item) {
            Ok(feed) if !seen.insert(feed.id.clone()) => {
                out.reject("feed", index, DecodeError::DuplicateId(feed.id));
            }
            Ok(feed) => out.records.push(feed),
            Err(e) => out.reject("feed", index, e),
        }
    }
    Ok(out)
}

// ── Source detections ─────────────────────────────────────────

fn decode_source_detection(value: &Value) -> Result<SourceDetection, DecodeError> {
    let obj = as_object(value, "detection")?;
    let id = str_field(obj, "id", "id")?;
    let location = object_field(obj, "location", "location")?;
    let location_name = str_field(location, "name", "location.name")?;
    let timestamp = parse_timestamp(str_field(obj, "timestamp", "timestamp")?)?;
    // Must be present; any non-string value means "no comments".
    let comments = field(obj, "comments", "comments")?
        .as_str()
        .map(str::to_string);

    Ok(SourceDetection {
        id: id.to_string(),
        location_name: location_name.to_string(),
        timestamp,
        comments,
    })
}

/// Decode the source service's bare detection array (newest first).
pub fn decode_source_detections(body: &str) -> Result<Decoded<SourceDetection>, DecodeError> {
    let root: Value = serde_json::from_str(body)?;
    let items = root
        .as_array()
        .ok_or_else(|| DecodeError::shape("$", "array", json_kind(&root)))?;

    let mut out = Decoded::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match decode_source_detection(item) {
            Ok(detection) => out.records.push(detection),
            Err(e) => out.reject("source detection", index, e),
        }
    }
    Ok(out)
}

// ── Destination detections ────────────────────────────────────

fn decode_destination_detection(value: &Value) -> Result<DestinationDetection, DecodeError> {
    let obj = as_object(value, "detection")?;
    let attributes = object_field(obj, "attributes", "attributes")?;
    let timestamp = parse_timestamp(str_field(attributes, "timestamp", "attributes.timestamp")?)?;

    // Identity fields are lenient: the timestamp alone still bounds the walk.
    let mut complete = true;
    let description = match attributes.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(
                found = json_kind(other),
                "Destination detection has a non-string description, keeping timestamp only"
            );
            complete = false;
            None
        }
    };
    let feed_id = match str_field(attributes, "feed_id", "attributes.feed_id") {
        Ok(id) => Some(id.to_string()),
        Err(e) => {
            warn!(error = %e, "Destination detection has no usable feed id, keeping timestamp only");
            complete = false;
            None
        }
    };

    Ok(DestinationDetection {
        feed_id,
        description,
        timestamp,
        complete,
    })
}

/// Decode the destination's recent detections (newest first).
pub fn decode_destination_detections(
    body: &str,
) -> Result<Decoded<DestinationDetection>, DecodeError> {
    let root: Value = serde_json::from_str(body)?;
    let items = data_array(&root)?;

    let mut out = Decoded::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match decode_destination_detection(item) {
            Ok(detection) => out.records.push(detection),
            Err(e) => out.reject("destination detection", index, e),
        }
    }
    Ok(out)
}
