use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LookupError;

/// Extra query parameters passed along with a lookup (`fields`, `language`, ...).
pub type QueryParams = BTreeMap<String, String>;

/// Geolocation data for one IP address, keyed by provider field name.
///
/// Values are kept exactly as the provider sent them. Fields the caller asked
/// for but the provider did not return are represented as `null` once the
/// result has been merged over a set of defaults (see [`LookupResult::with_fields`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupResult(Map<String, Value>);

impl LookupResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result holding every field in `fields`, each set to `null`.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(|f| (f.into(), Value::Null)).collect())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The field's value, or `null` when the field is absent.
    pub fn get_or_null(&self, field: &str) -> Value {
        self.0.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Lay `answer` over `self`; fields present in `answer` win.
    pub fn merge(mut self, answer: LookupResult) -> Self {
        for (field, value) in answer.0 {
            self.0.insert(field, value);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<Map<String, Value>> for LookupResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<LookupResult> for Value {
    fn from(result: LookupResult) -> Self {
        Value::Object(result.0)
    }
}

/// Decode a provider response body.
///
/// The ipstack error envelope looks like
/// `{"success": false, "error": {"code": 101, "type": "...", "info": "..."}}`
/// and becomes [`LookupError::Response`] with message `"<type>: <info>"`.
/// Any other JSON object is returned as-is. Bodies that are not a JSON object
/// are reported as a response error with code `0`.
pub fn decode(body: &str) -> Result<LookupResult, LookupError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LookupError::response(format!("malformed response body: {e}"), 0))?;

    let Value::Object(map) = value else {
        return Err(LookupError::response(
            "malformed response body: expected a JSON object",
            0,
        ));
    };

    if map.get("success") == Some(&Value::Bool(false)) {
        if let Some(Value::Object(error)) = map.get("error") {
            let message = format!(
                "{}: {}",
                text_or(error.get("type"), "Error"),
                text_or(error.get("info"), "No description provided"),
            );
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            return Err(LookupError::response(message, code));
        }
    }

    Ok(LookupResult(map))
}

fn text_or(value: Option<&Value>, fallback: &str) -> String {
    match value {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
