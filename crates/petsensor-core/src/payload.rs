//! Raw upstream payloads
//!
//! The Petfinder v1 JSON format wraps every scalar in a text node
//! (`{"$t": value}`) and collapses single-element lists into a bare object.
//! [`RawPayload`] holds a parsed response and offers the few structural
//! lookups the fetcher and the normalizer need; it makes no other promise
//! about the shape.

use serde_json::Value;

use crate::error::{Error, Result};

/// Key of the text node convention
pub const TEXT_KEY: &str = "$t";

/// Upstream status code meaning "no error"
pub const UPSTREAM_OK: &str = "100";

/// A parsed upstream response
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload(Value);

impl RawPayload {
    /// Parse a response body
    ///
    /// Fails with [`Error::MalformedResponse`] when the body is not JSON or
    /// does not carry the `petfinder.pets` collection envelope.
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::malformed(format!("Response is not JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Wrap an already parsed document, checking the envelope
    pub fn from_value(value: Value) -> Result<Self> {
        if value.pointer("/petfinder/pets").is_none() {
            return Err(Error::malformed("Response has no petfinder.pets collection"));
        }
        Ok(Self(value))
    }

    /// The underlying document
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Upstream status code from `petfinder.header.status.code`, if present
    pub fn upstream_status(&self) -> Option<String> {
        self.0
            .pointer("/petfinder/header/status/code")
            .and_then(text)
    }

    /// Whether the upstream header reports success (or reports nothing)
    pub fn upstream_ok(&self) -> bool {
        self.upstream_status()
            .map_or(true, |code| code == UPSTREAM_OK)
    }

    /// The item nodes, in upstream order
    ///
    /// An empty `pets` object means no items. A bare `pet` object is a
    /// single item.
    pub fn items(&self) -> Result<Vec<&Value>> {
        let pets = self
            .0
            .pointer("/petfinder/pets")
            .ok_or_else(|| Error::malformed("Response has no petfinder.pets collection"))?;

        Ok(match pets.get("pet") {
            Some(pet) => as_list(pet),
            None => Vec::new(),
        })
    }
}

/// Unwrap a text node into a string
///
/// Accepts `{"$t": "x"}`, `{"$t": 12}` and bare scalars. Empty strings and
/// `null` count as absent.
pub fn text(node: &Value) -> Option<String> {
    let inner = match node {
        Value::Object(map) => map.get(TEXT_KEY)?,
        other => other,
    };

    match inner {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Treat a node as a list: arrays as-is, `null` as empty, anything else as
/// a single element
pub fn as_list(node: &Value) -> Vec<&Value> {
    match node {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
