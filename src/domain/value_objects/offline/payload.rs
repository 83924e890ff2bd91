use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ミューテーションのペイロード。常にJSONオブジェクト。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MutationPayload(Map<String, Value>);

impl MutationPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err("Mutation payload cannot be null".to_string()),
            _ => Err("Mutation payload must be a JSON object".to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for MutationPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<MutationPayload> for Value {
    fn from(payload: MutationPayload) -> Self {
        Value::Object(payload.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_objects_are_accepted() {
        assert!(MutationPayload::new(json!({"postId": 1})).is_ok());
        assert!(MutationPayload::new(Value::Null).is_err());
        assert!(MutationPayload::new(json!([1, 2])).is_err());
        assert!(MutationPayload::from_json_str("{broken").is_err());
    }
}
