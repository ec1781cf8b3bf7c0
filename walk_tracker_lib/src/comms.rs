use serde_json::{Map, Value};
use thiserror::Error;

/// Key used for the toggle counter in both directions of the link.
pub const COUNTER_VALUE_KEY: &str = "counterValue";

/// The untyped payload the device link carries.
pub type Dictionary = Map<String, Value>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The paired device is not connected
    #[error("companion device is unreachable")]
    Unreachable,
    #[error("malformed link message: {0}")]
    Malformed(String),
    /// The receiving side went away while the request was in flight
    #[error("companion stopped before replying")]
    PeerGone,
}

/// Messages exchanged between the wearable and the phone.
///
/// On the wire every variant is a dictionary. Requests and replies share the shape
/// `{"counterValue": <integer>}` and are told apart by direction, so conversion goes
/// through the per-direction constructors below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMessage {
    ToggleTrackingRequest { counter: i64 },
    ToggleTrackingReply { counter: i64 },
    ChannelError { reason: String },
}

impl LinkMessage {
    pub fn request_from_dictionary(dictionary: &Dictionary) -> Result<Self, LinkError> {
        read_counter(dictionary).map(|counter| LinkMessage::ToggleTrackingRequest { counter })
    }

    pub fn reply_from_dictionary(dictionary: &Dictionary) -> Result<Self, LinkError> {
        read_counter(dictionary).map(|counter| LinkMessage::ToggleTrackingReply { counter })
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut dictionary = Map::new();
        match self {
            LinkMessage::ToggleTrackingRequest { counter } | LinkMessage::ToggleTrackingReply { counter } => {
                dictionary.insert(COUNTER_VALUE_KEY.into(), Value::from(*counter));
            }
            LinkMessage::ChannelError { reason } => {
                dictionary.insert("error".into(), Value::from(reason.as_str()));
            }
        }
        dictionary
    }
}

fn read_counter(dictionary: &Dictionary) -> Result<i64, LinkError> {
    if let Some(Value::String(reason)) = dictionary.get("error") {
        return Err(LinkError::Malformed(format!("peer reported error: {reason}")));
    }

    match dictionary.get(COUNTER_VALUE_KEY) {
        Some(value) => value
            .as_i64()
            .ok_or_else(|| LinkError::Malformed(format!("{COUNTER_VALUE_KEY} is not an integer: {value}"))),
        None => Err(LinkError::Malformed(format!("missing {COUNTER_VALUE_KEY}"))),
    }
}

/// The bidirectional link between the two paired devices.
#[async_trait::async_trait]
pub trait CompanionChannel: Send + Sync {
    fn is_reachable(&self) -> bool;

    /// Sends a message and waits for the peer's reply.
    async fn send(&self, message: Dictionary) -> Result<Dictionary, LinkError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dict(value: Value) -> Dictionary {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn request_is_validated() {
        assert_eq!(
            LinkMessage::request_from_dictionary(&dict(json!({ "counterValue": 3 }))),
            Ok(LinkMessage::ToggleTrackingRequest { counter: 3 })
        );
        assert!(matches!(
            LinkMessage::request_from_dictionary(&dict(json!({ "counterValue": "3" }))),
            Err(LinkError::Malformed(_))
        ));
        assert!(matches!(
            LinkMessage::request_from_dictionary(&dict(json!({ "counterValue": 1.5 }))),
            Err(LinkError::Malformed(_))
        ));
        assert!(matches!(
            LinkMessage::request_from_dictionary(&dict(json!({ "counter": 3 }))),
            Err(LinkError::Malformed(_))
        ));
    }

    #[test]
    fn reply_dictionary_shape() {
        let reply = LinkMessage::ToggleTrackingReply { counter: 7 };
        assert_eq!(reply.to_dictionary(), dict(json!({ "counterValue": 7 })));
        assert_eq!(LinkMessage::reply_from_dictionary(&reply.to_dictionary()), Ok(reply));
    }

    #[test]
    fn error_dictionary_is_not_a_reply() {
        let error = LinkMessage::ChannelError { reason: "busy".into() }.to_dictionary();
        assert!(matches!(LinkMessage::reply_from_dictionary(&error), Err(LinkError::Malformed(_))));
    }
}
