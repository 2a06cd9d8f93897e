//! WebSocket protocol message definitions
//! These are the wire types for client-server communication
//!
//! Every frame is a JSON text message shaped as `{"event": name, "data": payload}`.
//! Relayed frames also carry `"from"` with the originating connection id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque identifier of one live client connection
pub type ConnectionId = Uuid;

/// Raw inbound frame before the event name is interpreted
#[derive(Debug, Clone, Deserialize)]
struct InboundFrame {
    event: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Payload of a `join` event, taken as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub position: Value,
    #[serde(default)]
    pub team: Value,
}

impl JoinPayload {
    /// Pull `position` and `team` out of an arbitrary payload. Missing fields become null.
    fn from_value(data: Value) -> Self {
        match data {
            Value::Object(mut fields) => Self {
                position: fields.remove("position").unwrap_or(Value::Null),
                team: fields.remove("team").unwrap_or(Value::Null),
            },
            _ => Self {
                position: Value::Null,
                team: Value::Null,
            },
        }
    }
}

/// Events sent from client to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Player entered the game
    Join(JoinPayload),
    /// Tank position/rotation update
    TankMove(Value),
    /// Tank fired a shell
    TankFire(Value),
    /// Tank was destroyed
    TankDestroyed(Value),
    /// Bomb mode: bomb planted
    BombPlanted(Value),
    /// Bomb mode: bomb defused
    BombDefused(Value),
    /// Bomb mode: bomb went off
    BombExploded(Value),
    /// Event name not part of the protocol
    Unknown { event: String },
}

impl ClientEvent {
    /// Decode a text frame into an event
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let frame: InboundFrame = serde_json::from_str(text)?;
        let event = frame.event.ok_or(ProtocolError::MissingEvent)?;
        let data = frame.data;

        Ok(match event.as_str() {
            "join" => Self::Join(JoinPayload::from_value(data)),
            "tankMove" => Self::TankMove(data),
            "tankFire" => Self::TankFire(data),
            "tankDestroyed" => Self::TankDestroyed(data),
            "bombPlanted" => Self::BombPlanted(data),
            "bombDefused" => Self::BombDefused(data),
            "bombExploded" => Self::BombExploded(data),
            _ => Self::Unknown { event },
        })
    }

    /// Wire name of the event
    pub fn name(&self) -> &str {
        match self {
            Self::Join(_) => "join",
            Self::TankMove(_) => "tankMove",
            Self::TankFire(_) => "tankFire",
            Self::TankDestroyed(_) => "tankDestroyed",
            Self::BombPlanted(_) => "bombPlanted",
            Self::BombDefused(_) => "bombDefused",
            Self::BombExploded(_) => "bombExploded",
            Self::Unknown { event } => event,
        }
    }
}

/// Events sent from server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent only to a newly connected client
    Connected(Welcome),
    /// Another player joined
    PlayerJoined(PlayerJoined),
    /// A connection closed
    PlayerLeft(ConnectionId),
    TankMove(Value),
    TankFire(Value),
    TankDestroyed(Value),
    BombPlanted(Value),
    BombDefused(Value),
    BombExploded(Value),
}

/// Identity handed to a client right after it connects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub id: ConnectionId,
    pub server_time: u64,
}

/// Announcement rebuilt from a `join` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoined {
    pub id: ConnectionId,
    pub position: Value,
    pub team: Value,
}

/// A framed outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    #[serde(flatten)]
    pub event: ServerEvent,
    /// Originating connection for relayed events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ConnectionId>,
}

impl Outbound {
    /// Message generated by the server itself
    pub fn system(event: ServerEvent) -> Self {
        Self { event, from: None }
    }

    /// Message relayed on behalf of a client
    pub fn relayed(from: ConnectionId, event: ServerEvent) -> Self {
        Self {
            event,
            from: Some(from),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame has no event name")]
    MissingEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_join_payload() {
        let event =
            ClientEvent::decode(r#"{"event":"join","data":{"position":[0,0,0],"team":"red"}}"#)
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::Join(JoinPayload {
                position: json!([0, 0, 0]),
                team: json!("red"),
            })
        );
    }

    #[test]
    fn join_tolerates_malformed_payload() {
        let event = ClientEvent::decode(r#"{"event":"join","data":"garbage"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join(JoinPayload {
                position: Value::Null,
                team: Value::Null,
            })
        );

        let event = ClientEvent::decode(r#"{"event":"join","data":{"team":7}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join(JoinPayload {
                position: Value::Null,
                team: json!(7),
            })
        );
    }

    #[test]
    fn pass_through_payloads_are_untouched() {
        let raw = r#"{"event":"tankFire","data":{"dir":[1,0,0],"extra":{"nested":true}}}"#;
        assert_eq!(
            ClientEvent::decode(raw).unwrap(),
            ClientEvent::TankFire(json!({"dir": [1, 0, 0], "extra": {"nested": true}}))
        );
        assert_eq!(
            ClientEvent::decode(r#"{"event":"tankMove"}"#).unwrap(),
            ClientEvent::TankMove(Value::Null)
        );
        assert_eq!(
            ClientEvent::decode(r#"{"event":"bombDefused","data":[1,2]}"#).unwrap(),
            ClientEvent::BombDefused(json!([1, 2]))
        );
    }

    #[test]
    fn unknown_event_is_explicit() {
        let event = ClientEvent::decode(r#"{"event":"chat","data":"hi"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Unknown {
                event: "chat".to_string()
            }
        );
        assert_eq!(event.name(), "chat");
    }

    #[test]
    fn rejects_frames_without_event() {
        assert!(matches!(
            ClientEvent::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientEvent::decode(r#"{"data":1}"#),
            Err(ProtocolError::MissingEvent)
        ));
        assert!(matches!(
            ClientEvent::decode(r#"{"event":5}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn outbound_wire_shape() {
        let sender = Uuid::new_v4();
        let relayed = Outbound::relayed(sender, ServerEvent::TankFire(json!({"dir": [1, 0, 0]})));
        let value: Value = serde_json::from_str(&relayed.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"event": "tankFire", "data": {"dir": [1, 0, 0]}, "from": sender.to_string()})
        );

        let left = Outbound::system(ServerEvent::PlayerLeft(sender));
        let value: Value = serde_json::from_str(&left.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"event": "playerLeft", "data": sender.to_string()}));
    }

    #[test]
    fn welcome_uses_camel_case() {
        let id = Uuid::new_v4();
        let welcome = Outbound::system(ServerEvent::Connected(Welcome {
            id,
            server_time: 42,
        }));
        let value: Value = serde_json::from_str(&welcome.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"event": "connected", "data": {"id": id.to_string(), "serverTime": 42}})
        );
    }
}
