//! User records: arbitrary JSON objects addressed by a UUID.
//!
//! Records have no schema. The store only owns the `_id`, `createdAt` and
//! `updatedAt` keys; everything else is kept exactly as the client sent it.

mod store;

pub use store::UserStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys managed by the store and stripped from client input
pub const RESERVED_KEYS: [&str; 3] = ["_id", "createdAt", "updatedAt"];

/// A stored user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    /// Client-supplied fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Drop store-managed keys from client input
pub fn strip_reserved(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        fields.remove(key);
    }
    fields
}

/// Parse a record identifier. `None` means the id is malformed, which callers
/// report separately from "not found".
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_reserved() {
        let input = json!({
            "_id": "spoofed",
            "createdAt": "yesterday",
            "updatedAt": "today",
            "name": "Alice"
        });
        let fields = strip_reserved(input.as_object().unwrap().clone());

        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("name"), Some(&json!("Alice")));
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()), Some(id));
        assert_eq!(parse_id("not-an-id"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn test_record_serialization_flattens_fields() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("Alice"));
        fields.insert("age".to_string(), json!(30));

        let record = UserRecord {
            id,
            created_at: now,
            updated_at: now,
            fields,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], json!(id.to_string()));
        assert_eq!(value["name"], json!("Alice"));
        assert_eq!(value["age"], json!(30));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("fields").is_none());

        let parsed: UserRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }
}
