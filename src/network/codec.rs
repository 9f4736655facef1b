use serde::Deserialize;
use serde_json::{Value, json};

use crate::common::{Message, Sender};
use crate::error::DecodeError;

/// Envelope của một tin nhắn relay gửi xuống.
#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    id: i64,
    text: String,
    sender: String,
    time: String,
}

/// Wire tags the relay uses for the two senders.
#[derive(Debug, Clone)]
pub struct SenderTags {
    pub local: String,
    pub remote: String,
}

pub struct MessageCodec {
    tags: SenderTags,
}

impl MessageCodec {
    pub fn new(tags: SenderTags) -> Self {
        Self { tags }
    }

    pub fn decode_one(&self, raw: &Value) -> Result<Message, DecodeError> {
        let envelope = InboundEnvelope::deserialize(raw)?;
        self.build_message(envelope)
    }

    /// One malformed element fails the whole batch.
    pub fn decode_many(&self, raw: &Value) -> Result<Vec<Message>, DecodeError> {
        Vec::<InboundEnvelope>::deserialize(raw)?
            .into_iter()
            .map(|envelope| self.build_message(envelope))
            .collect()
    }

    /// Envelope gửi lên relay. `id` and `time` stay local.
    pub fn encode_outgoing(&self, text: &str, sender: Sender) -> Value {
        json!({
            "message": text,
            "sender": self.tag_for(sender),
        })
    }

    fn tag_for(&self, sender: Sender) -> &str {
        match sender {
            Sender::LocalUser => &self.tags.local,
            Sender::RemotePeer => &self.tags.remote,
        }
    }

    fn build_message(&self, envelope: InboundEnvelope) -> Result<Message, DecodeError> {
        if envelope.text.trim().is_empty() {
            return Err(DecodeError::BlankText { id: envelope.id });
        }
        // anything that is not our own tag came from someone else
        let sender = if envelope.sender == self.tags.local {
            Sender::LocalUser
        } else {
            Sender::RemotePeer
        };
        Ok(Message {
            id: envelope.id,
            text: envelope.text,
            sender,
            time: envelope.time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> MessageCodec {
        MessageCodec::new(SenderTags {
            local: "me".to_string(),
            remote: "peer".to_string(),
        })
    }

    #[test]
    fn decodes_single_message() {
        let message = codec()
            .decode_one(&json!({"id": 3, "text": "sup", "sender": "peer", "time": "10:02"}))
            .unwrap();
        assert_eq!(message.id, 3);
        assert_eq!(message.text, "sup");
        assert_eq!(message.sender, Sender::RemotePeer);
        assert_eq!(message.time, "10:02");
    }

    #[test]
    fn local_tag_maps_to_local_user() {
        let message = codec()
            .decode_one(&json!({"id": 2, "text": "yo", "sender": "me", "time": "10:01"}))
            .unwrap();
        assert!(message.is_local());
    }

    #[test]
    fn missing_text_is_a_decode_error() {
        let result = codec().decode_one(&json!({"id": 1, "sender": "peer", "time": "10:00"}));
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn wrong_field_type_is_a_decode_error() {
        let result =
            codec().decode_one(&json!({"id": "one", "text": "x", "sender": "peer", "time": "10:00"}));
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn blank_text_is_rejected() {
        let result =
            codec().decode_one(&json!({"id": 1, "text": "   ", "sender": "peer", "time": "10:00"}));
        assert!(matches!(result, Err(DecodeError::BlankText { id: 1 })));
    }

    #[test]
    fn decodes_history_in_order() {
        let history = codec()
            .decode_many(&json!([
                {"id": 1, "text": "hi", "sender": "peer", "time": "10:00"},
                {"id": 2, "text": "yo", "sender": "me", "time": "10:01"}
            ]))
            .unwrap();
        let ids: Vec<i64> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(history[1].sender, Sender::LocalUser);
    }

    #[test]
    fn one_bad_history_element_fails_the_batch() {
        let result = codec().decode_many(&json!([
            {"id": 1, "text": "hi", "sender": "peer", "time": "10:00"},
            {"id": 2, "sender": "me", "time": "10:01"}
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn history_must_be_an_array() {
        let result =
            codec().decode_many(&json!({"id": 1, "text": "hi", "sender": "peer", "time": "10:00"}));
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn outgoing_envelope_has_two_fields() {
        let envelope = codec().encode_outgoing("hello", Sender::LocalUser);
        assert_eq!(envelope, json!({"message": "hello", "sender": "me"}));
    }
}
