use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const SPAWN_X: f32 = 100.0;
pub const SPAWN_Y: f32 = 100.0;

/// Opaque per-connection identifier. Generated once at connect time and
/// never reused while the connection is live.
pub type PlayerId = Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Facing of a player sprite. Serialized lowercase on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A connected participant's identity plus last-known position and facing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub position: Position,
    pub direction: Direction,
}

impl Player {
    /// Creates a player at the default spawn point, facing down.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            position: Position {
                x: SPAWN_X,
                y: SPAWN_Y,
            },
            direction: Direction::Down,
        }
    }
}

/// Failure to interpret an inbound text frame. Recoverable: the caller
/// logs and drops the frame, the connection stays open.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Messages a client sends to the server.
///
/// The wire format is a JSON object with a `type` discriminator. Unknown
/// tags and missing fields fail decoding; there is no fallback variant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// The client reports its own new position and facing.
    #[serde(rename = "playerMove")]
    PlayerMove {
        position: Position,
        direction: Direction,
    },
}

/// Messages the server pushes to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Initial roster snapshot, sent once right after connecting. Never
    /// includes the receiving player itself.
    #[serde(rename = "playerList")]
    PlayerList { players: Vec<Player> },

    /// Another player joined.
    #[serde(rename = "newPlayer")]
    NewPlayer { player: Player },

    /// Relay of another player's state report.
    #[serde(rename = "playerMove")]
    PlayerMove {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        position: Position,
        direction: Direction,
    },

    /// Another player disconnected.
    #[serde(rename = "playerLeft")]
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
}

impl ClientMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerMessage {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_player_spawn_defaults() {
        let id = Uuid::new_v4();
        let player = Player::new(id);

        assert_eq!(player.id, id);
        assert_eq!(player.position.x, SPAWN_X);
        assert_eq!(player.position.y, SPAWN_Y);
        assert_eq!(player.direction, Direction::Down);
    }

    #[test]
    fn test_direction_wire_names() {
        assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "\"up\"");
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), "\"down\"");
        assert_eq!(serde_json::to_string(&Direction::Left).unwrap(), "\"left\"");
        assert_eq!(
            serde_json::to_string(&Direction::Right).unwrap(),
            "\"right\""
        );
    }

    #[test]
    fn test_decode_player_move() {
        let msg =
            ClientMessage::decode(r#"{"type":"playerMove","position":{"x":5,"y":5},"direction":"left"}"#)
                .unwrap();

        match msg {
            ClientMessage::PlayerMove {
                position,
                direction,
            } => {
                assert_approx_eq!(position.x, 5.0);
                assert_approx_eq!(position.y, 5.0);
                assert_eq!(direction, Direction::Left);
            }
        }
    }

    #[test]
    fn test_decode_fractional_position() {
        let msg = ClientMessage::decode(
            r#"{"type":"playerMove","position":{"x":12.25,"y":-3.5},"direction":"up"}"#,
        )
        .unwrap();

        match msg {
            ClientMessage::PlayerMove { position, .. } => {
                assert_approx_eq!(position.x, 12.25);
                assert_approx_eq!(position.y, -3.5);
            }
        }
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let result = ClientMessage::decode(r#"{"type":"teleport","x":1,"y":2}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let result = ClientMessage::decode(r#"{"type":"playerMove","direction":"up"}"#);
        assert!(result.is_err());

        let result = ClientMessage::decode(r#"{"type":"playerMove","position":{"x":1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(ClientMessage::decode("not json at all").is_err());
        assert!(ClientMessage::decode("").is_err());
        assert!(ClientMessage::decode("{\"type\":").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_direction() {
        let result = ClientMessage::decode(
            r#"{"type":"playerMove","position":{"x":1,"y":2},"direction":"sideways"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_player_list_wire_shape() {
        let player = Player::new(Uuid::new_v4());
        let encoded = ServerMessage::PlayerList {
            players: vec![player.clone()],
        }
        .encode()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "playerList");
        assert_eq!(value["players"][0]["id"], player.id.to_string());
        assert_eq!(value["players"][0]["direction"], "down");
        assert_eq!(value["players"][0]["position"]["x"], 100.0);
    }

    #[test]
    fn test_encode_new_player_wire_shape() {
        let player = Player::new(Uuid::new_v4());
        let encoded = ServerMessage::NewPlayer { player }.encode().unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "newPlayer");
        assert!(value["player"]["id"].is_string());
    }

    #[test]
    fn test_encode_player_move_uses_camel_case_id() {
        let id = Uuid::new_v4();
        let encoded = ServerMessage::PlayerMove {
            player_id: id,
            position: Position { x: 5.0, y: 5.0 },
            direction: Direction::Left,
        }
        .encode()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "playerMove");
        assert_eq!(value["playerId"], id.to_string());
        assert_eq!(value["direction"], "left");
        assert!(value.get("player_id").is_none());
    }

    #[test]
    fn test_encode_player_left_wire_shape() {
        let id = Uuid::new_v4();
        let encoded = ServerMessage::PlayerLeft { player_id: id }.encode().unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "playerLeft");
        assert_eq!(value["playerId"], id.to_string());
    }

    #[test]
    fn test_server_message_roundtrip() {
        let original = ServerMessage::PlayerMove {
            player_id: Uuid::new_v4(),
            position: Position { x: 42.5, y: -17.0 },
            direction: Direction::Right,
        };

        let decoded = ServerMessage::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }
}
