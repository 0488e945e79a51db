//! Feed protocol message types
//!
//! JSON text frames exchanged with the change-feed endpoint. The
//! subscription is unfiltered on the table; the server's row-level
//! authorization scopes delivery to the signed-in owner.

use serde::{Deserialize, Serialize};

use crate::models::ChangeEvent;

/// Messages sent to the feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a subscription on a table
    Subscribe {
        table: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    /// Close the subscription before disconnecting
    Unsubscribe { table: String },
}

/// Messages received from the feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Subscription acknowledged
    Subscribed { table: String },
    /// A row changed
    Change { event: ChangeEvent },
    /// Server-side failure; the subscription may be dead
    Error { message: String },
}

impl ClientMessage {
    /// Create a subscribe message
    pub fn subscribe(table: &str, token: Option<&str>) -> Self {
        ClientMessage::Subscribe {
            table: table.to_string(),
            token: token.map(str::to_string),
        }
    }

    /// Create an unsubscribe message
    pub fn unsubscribe(table: &str) -> Self {
        ClientMessage::Unsubscribe {
            table: table.to_string(),
        }
    }

    /// Encode message to a JSON text frame
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("JSON encoding failed")
    }
}

impl ServerMessage {
    /// Decode message from a JSON text frame
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bookmark;
    use uuid::Uuid;

    #[test]
    fn test_subscribe_encoding() {
        let msg = ClientMessage::subscribe("bookmarks", Some("tok-123"));
        let text = msg.encode();
        assert!(text.contains("\"type\":\"subscribe\""));
        assert!(text.contains("\"table\":\"bookmarks\""));
        assert!(text.contains("tok-123"));
    }

    #[test]
    fn test_subscribe_without_token_omits_field() {
        let msg = ClientMessage::subscribe("bookmarks", None);
        assert!(!msg.encode().contains("token"));
    }

    #[test]
    fn test_change_message_decoding() {
        let bookmark = Bookmark::new(Uuid::new_v4(), "https://example.com", "Example");
        let wire = serde_json::json!({
            "type": "change",
            "event": { "kind": "insert", "record": bookmark },
        })
        .to_string();

        match ServerMessage::decode(&wire).unwrap() {
            ServerMessage::Change {
                event: ChangeEvent::Insert { record },
            } => assert_eq!(record.url, "https://example.com"),
            other => panic!("Expected insert change, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_change_decoding() {
        let id = Uuid::new_v4();
        let wire = format!(
            "{{\"type\":\"change\",\"event\":{{\"kind\":\"delete\",\"id\":\"{id}\"}}}}"
        );

        match ServerMessage::decode(&wire).unwrap() {
            ServerMessage::Change {
                event: ChangeEvent::Delete { id: got },
            } => assert_eq!(got, id),
            other => panic!("Expected delete change, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(ServerMessage::decode("not json").is_err());
        assert!(ServerMessage::decode("{\"type\":\"mystery\"}").is_err());
    }
}
