use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client → Server events
///
/// Wire form: `{"event": "sendMessage", "data": <any JSON>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "sendMessage")]
    SendMessage(Value),
}

/// Server → Client events
///
/// Wire form: `{"event": "receiveMessage", "data": <payload as sent>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "receiveMessage")]
    ReceiveMessage(Value),
}

impl ServerEvent {
    /// Payload carried by the event
    pub fn payload(&self) -> &Value {
        match self {
            ServerEvent::ReceiveMessage(data) => data,
        }
    }
}
