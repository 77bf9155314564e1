//! Structural descriptors and message encoding.
//!
//! A [`Schema`] declares the fields a key or value must carry. Validation
//! happens locally, before any broker contact, so malformed messages never
//! leave the process. Encoding is deterministic JSON: fields are written in
//! schema declaration order regardless of the order they appear in the
//! input value.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Long,
    Double,
    Boolean,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int | FieldType::Long => value.is_i64() || value.is_u64(),
            FieldType::Double => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(name: impl Into<String>, field_type: FieldType) -> Field {
        Field {
            name: name.into(),
            field_type,
            optional: false,
        }
    }

    pub fn optional_field(name: impl Into<String>, field_type: FieldType) -> Field {
        Field {
            name: name.into(),
            field_type,
            optional: true,
        }
    }

    fn validation_error(&self, message: String) -> Error {
        Error::Validation {
            schema: self.name.clone(),
            message,
        }
    }

    /// Checks a value against the declared fields without encoding it.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let object = value
            .as_object()
            .ok_or_else(|| self.validation_error("value is not an object".to_string()))?;

        for field in &self.fields {
            match object.get(&field.name) {
                Some(v) if v.is_null() && field.optional => {}
                Some(v) if field.field_type.matches(v) => {}
                Some(v) => {
                    return Err(self.validation_error(format!(
                        "field '{}' has type mismatch, expected {:?}, got {}",
                        field.name, field.field_type, v
                    )));
                }
                None if field.optional => {}
                None => {
                    return Err(self
                        .validation_error(format!("missing required field '{}'", field.name)));
                }
            }
        }

        for key in object.keys() {
            if !self.fields.iter().any(|f| &f.name == key) {
                return Err(self.validation_error(format!("undeclared field '{}'", key)));
            }
        }

        Ok(())
    }
}

/// Validates and encodes keys and values against their schemas.
///
/// Stateless per call; both directions are pure.
pub struct SchemaCodec;

impl SchemaCodec {
    /// Validates `value` against `schema` and encodes it as JSON with
    /// fields in schema declaration order.
    pub fn encode(value: &Value, schema: &Schema) -> Result<Vec<u8>> {
        schema.validate(value)?;

        let object = value
            .as_object()
            .ok_or_else(|| schema.validation_error("value is not an object".to_string()))?;
        let mut ordered = serde_json::Map::new();
        for field in &schema.fields {
            if let Some(v) = object.get(&field.name) {
                ordered.insert(field.name.clone(), v.clone());
            }
        }

        Ok(serde_json::to_vec(&Value::Object(ordered))?)
    }

    /// Decodes JSON bytes and validates the result against `schema`.
    pub fn decode(bytes: &[u8], schema: &Schema) -> Result<Value> {
        let value: Value = serde_json::from_slice(bytes)?;
        schema.validate(&value)?;
        Ok(value)
    }
}

/// A key/value schema pair bound to one topic.
///
/// Immutable once bound to a publisher.
#[derive(Debug, Clone)]
pub struct SchemaPair {
    pub key: Schema,
    pub value: Schema,
}

impl SchemaPair {
    pub fn new(key: Schema, value: Schema) -> Self {
        Self { key, value }
    }
}

/// Subject name for a topic's key schema, per registry convention.
pub fn key_subject(topic: &str) -> String {
    format!("{}-key", topic)
}

/// Subject name for a topic's value schema, per registry convention.
pub fn value_subject(topic: &str) -> String {
    format!("{}-value", topic)
}

/// Thin client for the schema registry's subject/version surface.
pub struct SchemaRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest {
    schema: String,
}

#[derive(Debug, Deserialize)]
struct SubjectVersion {
    schema: String,
}

impl SchemaRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn register(&self, subject: &str, schema: &Schema) -> Result<()> {
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        let body = RegisterRequest {
            schema: serde_json::to_string(schema)?,
        };

        let resp = self.client.post(&url).json(&body).send().await?;
        resp.error_for_status()?;
        debug!(subject, "Registered schema");
        Ok(())
    }

    /// Registers both halves of a pair under the `<topic>-key` and
    /// `<topic>-value` subjects.
    pub async fn register_pair(&self, topic: &str, pair: &SchemaPair) -> Result<()> {
        self.register(&key_subject(topic), &pair.key).await?;
        self.register(&value_subject(topic), &pair.value).await?;
        info!(topic, "Registered key and value schemas");
        Ok(())
    }

    /// Fetches the latest registered schema for a subject.
    pub async fn fetch(&self, subject: &str) -> Result<Schema> {
        let url = format!(
            "{}/subjects/{}/versions/latest",
            self.base_url, subject
        );

        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let version: SubjectVersion = resp.json().await?;
        Ok(serde_json::from_str(&version.schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turnstile_value_schema() -> Schema {
        Schema::new(
            "turnstile_value",
            vec![
                Schema::field("station_id", FieldType::Long),
                Schema::field("station_name", FieldType::String),
                Schema::field("line", FieldType::String),
                Schema::optional_field("exit_count", FieldType::Int),
            ],
        )
    }

    #[test]
    fn test_valid_value_encodes() {
        let schema = turnstile_value_schema();
        let value = json!({
            "station_id": 40360,
            "station_name": "Southport",
            "line": "brown"
        });

        let bytes = SchemaCodec::encode(&value, &schema).unwrap();
        let decoded = SchemaCodec::decode(&bytes, &schema).unwrap();
        assert_eq!(decoded["station_id"], 40360);
        assert_eq!(decoded["line"], "brown");
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let schema = turnstile_value_schema();
        let value = json!({
            "station_id": 40360,
            "line": "brown"
        });

        let err = SchemaCodec::encode(&value, &schema).unwrap_err();
        match err {
            crate::Error::Validation { message, .. } => {
                assert!(message.contains("station_name"));
            }
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let schema = turnstile_value_schema();
        let value = json!({
            "station_id": "not-a-number",
            "station_name": "Southport",
            "line": "brown"
        });

        assert!(matches!(
            SchemaCodec::encode(&value, &schema),
            Err(crate::Error::Validation { .. })
        ));
    }

    #[test]
    fn test_undeclared_field_rejected() {
        let schema = turnstile_value_schema();
        let value = json!({
            "station_id": 40360,
            "station_name": "Southport",
            "line": "brown",
            "color": "brown"
        });

        assert!(matches!(
            SchemaCodec::encode(&value, &schema),
            Err(crate::Error::Validation { .. })
        ));
    }

    #[test]
    fn test_optional_field_may_be_absent_or_null() {
        let schema = turnstile_value_schema();

        let without = json!({
            "station_id": 1,
            "station_name": "Belmont",
            "line": "red"
        });
        assert!(schema.validate(&without).is_ok());

        let with_null = json!({
            "station_id": 1,
            "station_name": "Belmont",
            "line": "red",
            "exit_count": null
        });
        assert!(schema.validate(&with_null).is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        let schema = turnstile_value_schema();
        assert!(schema.validate(&json!([1, 2, 3])).is_err());
        assert!(schema.validate(&json!("plain string")).is_err());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let schema = turnstile_value_schema();
        let a = json!({
            "line": "brown",
            "station_name": "Southport",
            "station_id": 40360
        });
        let b = json!({
            "station_id": 40360,
            "line": "brown",
            "station_name": "Southport"
        });

        assert_eq!(
            SchemaCodec::encode(&a, &schema).unwrap(),
            SchemaCodec::encode(&b, &schema).unwrap()
        );
    }

    #[test]
    fn test_subject_naming() {
        assert_eq!(key_subject("transit.turnstiles"), "transit.turnstiles-key");
        assert_eq!(
            value_subject("transit.turnstiles"),
            "transit.turnstiles-value"
        );
    }
}
