use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One analytics record as an ordered JSON object.
///
/// Records arrive in fragments, one per field chunk; fragments sharing a
/// [`MergeKey`] are unioned back into a single record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyticsRecord(Map<String, Value>);

impl AnalyticsRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_object(object: Map<String, Value>) -> Self {
        Self(object)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Field-union with another fragment; on overlap the other side wins.
    pub fn extend_from(&mut self, other: &AnalyticsRecord) {
        for (field, value) in &other.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Identity under which fragments of the same logical record are matched:
/// the flattened window end date plus the pivot identity value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MergeKey {
    pub end_date: String,
    pub pivot: String,
}

impl MergeKey {
    /// Reads the identity off a normalized fragment. Fragments missing
    /// either field collapse into a shared bucket, which is harmless: every
    /// chunk requests both structural fields, so siblings miss them too.
    pub fn of(record: &AnalyticsRecord) -> Self {
        let end_date = record
            .get("end_date")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let pivot = match record.get("pivotValues") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self { end_date, pivot }
    }
}
