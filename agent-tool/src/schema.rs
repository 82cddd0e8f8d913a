//! JSON-Schema-like parameter schema emitted to providers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One typed parameter a tool accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A tool's declared parameters, serialized to providers as
/// `{type:"object", properties:{...}, required:[...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "object_type")]
    pub type_: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

fn object_type() -> String {
    "object".to_string()
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self {
            type_: object_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_object_type_by_default() {
        let s = ParameterSchema::new();
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["type"], "object");
    }

    #[test]
    fn properties_and_required_roundtrip() {
        let s = ParameterSchema::new()
            .with_property("a", PropertySchema::new("integer"))
            .with_property("b", PropertySchema::new("integer").with_description("second operand"))
            .with_required("a")
            .with_required("b");
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["properties"]["a"]["type"], "integer");
        assert_eq!(v["properties"]["b"]["description"], "second operand");
        assert_eq!(v["required"], serde_json::json!(["a", "b"]));
    }
}
