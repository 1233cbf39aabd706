use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One unit of the sync's outer iteration, typically a single campaign.
///
/// The identity map names the partition; extra fields carry parent-entity
/// context (status, schedule) that downstream components read but that does
/// not participate in the partition's key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    identity: BTreeMap<String, Value>,
    extra: Map<String, Value>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(field: &str, value: Value) -> Self {
        let mut partition = Self::new();
        partition.insert_identity(field, value);
        partition
    }

    pub fn insert_identity(&mut self, field: &str, value: Value) {
        self.identity.insert(field.to_string(), value);
    }

    pub fn insert_extra(&mut self, field: &str, value: Value) {
        self.extra.insert(field.to_string(), value);
    }

    pub fn identity_value(&self, field: &str) -> Option<&Value> {
        self.identity.get(field)
    }

    pub fn extra_value(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }

    pub fn is_anonymous(&self) -> bool {
        self.identity.is_empty()
    }

    /// Canonical registry key: the identity map serialized with sorted keys.
    /// Equal identities always produce equal keys, regardless of insertion
    /// order.
    pub fn key(&self) -> String {
        serde_json::to_string(&self.identity).unwrap_or_default()
    }

    /// Identity and extra fields as one JSON object, identity winning on
    /// collision. This is the `partition` scope of template contexts.
    pub fn as_context(&self) -> Value {
        let mut object = self.extra.clone();
        for (field, value) in &self.identity {
            object.insert(field.clone(), value.clone());
        }
        Value::Object(object)
    }
}
