//! Form serialization: the submitted field values and the JSON payload built from them.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::SubmitError;

/// Field sent as a JSON number rather than a string.
pub const YEARS_FIELD: &str = "years_of_experience";

/// Submitted form values in document order. Later duplicates win when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    entries: Vec<(String, String)>,
}

impl FormFields {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The JSON object posted to the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormPayload(Map<String, Value>);

impl FormPayload {
    /// Copies every field as a string, then coerces `years_of_experience` to a number.
    ///
    /// Empty, non-numeric, or non-finite years are rejected before any request is made.
    /// Whole numbers become JSON integers; fractional values stay floats and are
    /// left for the server to accept or reject.
    pub fn from_fields(fields: &FormFields) -> Result<Self, SubmitError> {
        let mut map = Map::new();
        for (name, value) in fields.iter() {
            map.insert(name.to_string(), Value::String(value.to_string()));
        }

        if let Some(raw) = fields.get(YEARS_FIELD) {
            map.insert(YEARS_FIELD.to_string(), Value::Number(parse_years(raw)?));
        }

        Ok(Self(map))
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn parse_years(raw: &str) -> Result<Number, SubmitError> {
    let invalid = || SubmitError::InvalidInput("Years of experience must be a number.".to_string());

    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Ok(Number::from(value as i64));
    }
    Number::from_f64(value).ok_or_else(invalid)
}
