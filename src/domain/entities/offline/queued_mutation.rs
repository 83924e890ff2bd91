use super::mutation::Mutation;
use crate::domain::value_objects::offline::{MutationId, MutationKind, MutationPayload, MutationType};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 永続キューに積まれる1件の書き込み要求。
///
/// ストレージ上の形式は `{ id, type, payload, createdAt }`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMutation {
    pub id: MutationId,
    #[serde(rename = "type")]
    pub mutation_type: MutationType,
    pub payload: MutationPayload,
    pub created_at: i64,
}

impl QueuedMutation {
    pub fn new(
        id: MutationId,
        mutation_type: MutationType,
        payload: MutationPayload,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            mutation_type,
            payload,
            created_at,
        }
    }

    /// 型付きミューテーションから新しいキュー項目を作る
    pub fn from_mutation(mutation: &Mutation) -> Result<Self, String> {
        Ok(Self::new(
            MutationId::generate(),
            mutation.kind().into(),
            mutation.to_payload()?,
            Utc::now().timestamp_millis(),
        ))
    }

    /// 保存済みの1レコードを読む
    pub fn from_stored(raw: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }

    /// 読めなかったレコードを元のJSONごと包む。
    ///
    /// 種別は既知のどれにも一致しないため、送信時には poison として扱われる。
    pub fn unreadable(raw: &Value, reason: &str) -> Self {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| MutationId::new(id.to_string()).ok())
            .unwrap_or_else(|| MutationId::fingerprint(&raw.to_string()));
        let created_at = raw.get("createdAt").and_then(Value::as_i64).unwrap_or(0);

        let mut payload = Map::new();
        payload.insert("record".to_string(), raw.clone());
        payload.insert("error".to_string(), Value::String(reason.to_string()));

        Self::new(id, MutationType::unreadable(), payload.into(), created_at)
    }

    pub fn kind(&self) -> Option<MutationKind> {
        self.mutation_type.kind()
    }
}
