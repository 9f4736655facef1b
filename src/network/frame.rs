//! Socket.IO v4 framing over a WebSocket text stream.
//!
//! Engine.IO packet type is the first character; Socket.IO packets are
//! Engine.IO `4` messages with their own type character after it.

use serde_json::{Value, json};

use crate::error::FrameError;

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// `0{..}` handshake, carries sid and ping settings.
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    /// `40`: namespace connect (client request or server ack).
    Connect,
    /// `41`
    Disconnect,
    /// `42[name, payload]`
    Event {
        name: String,
        payload: Option<Value>,
    },
    /// `44{..}`
    ConnectError(Value),
    /// Acks, binary events and upgrades; not used by the relay.
    Unsupported(String),
}

impl Packet {
    pub fn event(name: &str, payload: Value) -> Self {
        Packet::Event {
            name: name.to_string(),
            payload: Some(payload),
        }
    }

    pub fn parse(frame: &str) -> Result<Self, FrameError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(FrameError::Empty)?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(Packet::Open(serde_json::from_str(body)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => parse_socket_packet(body),
            '5' => Ok(Packet::Unsupported(frame.to_string())),
            '6' => Ok(Packet::Noop),
            other => Err(FrameError::UnknownType(other)),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let frame = match self {
            Packet::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect => "40".to_string(),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, payload } => {
                let body = match payload {
                    Some(payload) => json!([name, payload]),
                    None => json!([name]),
                };
                format!("42{}", serde_json::to_string(&body)?)
            }
            Packet::ConnectError(reason) => format!("44{}", serde_json::to_string(reason)?),
            Packet::Unsupported(raw) => raw.clone(),
        };
        Ok(frame)
    }
}

fn parse_socket_packet(body: &str) -> Result<Packet, FrameError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let rest = strip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => {
            // optional ack id before the array
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            let mut items: Vec<Value> = serde_json::from_str(rest)?;
            if items.is_empty() {
                return Err(FrameError::MissingEventName);
            }
            let name = match items.remove(0) {
                Value::String(name) => name,
                _ => return Err(FrameError::MissingEventName),
            };
            Ok(Packet::Event {
                name,
                payload: items.into_iter().next(),
            })
        }
        '4' => {
            let reason = if rest.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(rest)?
            };
            Ok(Packet::ConnectError(reason))
        }
        _ => Ok(Packet::Unsupported(format!("4{body}"))),
    }
}

fn strip_namespace(body: &str) -> &str {
    if !body.starts_with('/') {
        return body;
    }
    match body.find(',') {
        Some(idx) => &body[idx + 1..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_packets() {
        let open = Packet::parse(r#"0{"sid":"abc","pingInterval":25000}"#).unwrap();
        assert!(matches!(open, Packet::Open(ref v) if v["sid"] == "abc"));
        assert_eq!(Packet::parse("2").unwrap(), Packet::Ping);
        assert_eq!(Packet::parse("1").unwrap(), Packet::Close);
        assert_eq!(Packet::parse("6").unwrap(), Packet::Noop);
    }

    #[test]
    fn parses_namespace_connect_with_sid() {
        assert_eq!(
            Packet::parse(r#"40{"sid":"xyz"}"#).unwrap(),
            Packet::Connect
        );
        assert_eq!(Packet::parse("41").unwrap(), Packet::Disconnect);
    }

    #[test]
    fn parses_event_with_payload() {
        let packet = Packet::parse(r#"42["message",{"id":3,"text":"sup"}]"#).unwrap();
        match packet {
            Packet::Event { name, payload } => {
                assert_eq!(name, "message");
                assert_eq!(payload.unwrap()["text"], "sup");
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn parses_event_with_namespace_and_ack_id() {
        let packet = Packet::parse(r#"42/chat,17["previousMessages",[]]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "previousMessages".to_string(),
                payload: Some(json!([])),
            }
        );
    }

    #[test]
    fn rejects_event_without_name() {
        assert!(matches!(
            Packet::parse("42[]"),
            Err(FrameError::MissingEventName)
        ));
        assert!(matches!(
            Packet::parse("42[5]"),
            Err(FrameError::MissingEventName)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(Packet::parse(""), Err(FrameError::Empty)));
        assert!(matches!(Packet::parse("x"), Err(FrameError::UnknownType('x'))));
        assert!(matches!(Packet::parse("42[oops"), Err(FrameError::Body(_))));
    }

    #[test]
    fn encodes_client_packets() {
        assert_eq!(Packet::Connect.encode().unwrap(), "40");
        assert_eq!(Packet::Disconnect.encode().unwrap(), "41");
        assert_eq!(Packet::Pong.encode().unwrap(), "3");
        let frame = Packet::event("message", json!({"message": "hi", "sender": "other"}))
            .encode()
            .unwrap();
        assert_eq!(frame, r#"42["message",{"message":"hi","sender":"other"}]"#);
    }
}
