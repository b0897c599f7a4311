//! JSON codec for the tagged-union wire format.
//!
//! Every message is a JSON object with exactly one key, the variant tag.
//! Decoding checks the tag before the body so an unknown variant is reported
//! as such instead of as a generic shape mismatch.

use crate::{ClientCommand, ServerEvent};
use serde_json::{Map, Value};
use thiserror::Error;

const COMMAND_TAGS: [&str; 4] = ["Join", "Move", "CastSpell", "Chat"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("payload is not an object with a single variant tag")]
    MissingTag,

    #[error("unknown message variant `{0}`")]
    UnknownVariant(String),

    #[error("malformed `{tag}` message: {source}")]
    Shape {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
#[error("failed to encode message: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

pub fn encode_command(command: &ClientCommand) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(command)?)
}

pub fn encode_event(event: &ServerEvent) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_event(text: &str) -> Result<ServerEvent, DecodeError> {
    decode_tagged(text, &ServerEvent::TAGS)
}

pub fn decode_event_bytes(bytes: &[u8]) -> Result<ServerEvent, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8)?;
    decode_event(text)
}

pub fn decode_command(text: &str) -> Result<ClientCommand, DecodeError> {
    decode_tagged(text, &COMMAND_TAGS)
}

fn decode_tagged<T>(text: &str, known_tags: &[&str]) -> Result<T, DecodeError>
where
    T: serde::de::DeserializeOwned,
{
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Syntax)?;

    let tag = single_tag(&value)
        .ok_or(DecodeError::MissingTag)?
        .to_string();
    if !known_tags.contains(&tag.as_str()) {
        return Err(DecodeError::UnknownVariant(tag));
    }

    serde_json::from_value(value).map_err(|source| DecodeError::Shape { tag, source })
}

fn single_tag(value: &Value) -> Option<&str> {
    let object: &Map<String, Value> = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.keys().next().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityKind, Spell, Vec2, WorldSnapshot};

    #[test]
    fn test_decode_snapshot() {
        let text = r#"{"Snapshot": {"tick": 42,
            "players": [{"id": 1, "name": "ann", "position": [10, 20], "health": 90, "max_health": 100}],
            "projectiles": [{"id": 0, "position": {"x": 5, "y": 6}}],
            "enemies": [{"id": 9, "position": [1, 1], "health": 3, "max_health": 5}]}}"#;

        match decode_event(text).unwrap() {
            ServerEvent::Snapshot(snapshot) => {
                assert_eq!(snapshot.tick, 42);
                assert_eq!(snapshot.players[0].position, Vec2::new(10.0, 20.0));
                assert_eq!(snapshot.projectiles[0].position, Vec2::new(5.0, 6.0));
                assert_eq!(snapshot.entity_count(EntityKind::Hostile), 1);
            }
            other => panic!("Wrong event after decoding: {:?}", other),
        }
    }

    #[test]
    fn test_decode_player_joined_and_left() {
        let joined =
            decode_event(r#"{"PlayerJoined": {"id": 3, "name": "cy", "position": [4, 5]}}"#)
                .unwrap();
        assert_eq!(
            joined,
            ServerEvent::PlayerJoined {
                id: 3,
                name: "cy".to_string(),
                position: Vec2::new(4.0, 5.0),
            }
        );

        let left = decode_event(r#"{"PlayerLeft": {"id": 3}}"#).unwrap();
        assert_eq!(left, ServerEvent::PlayerLeft { id: 3 });
    }

    #[test]
    fn test_decode_chat() {
        let chat = decode_event(r#"{"Chat": {"id": 1, "text": "hello"}}"#).unwrap();
        assert_eq!(
            chat,
            ServerEvent::Chat {
                id: 1,
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_decode_syntax_error() {
        assert!(matches!(
            decode_event("{not json"),
            Err(DecodeError::Syntax(_))
        ));
    }

    #[test]
    fn test_decode_missing_tag() {
        assert!(matches!(decode_event("[1, 2]"), Err(DecodeError::MissingTag)));
        assert!(matches!(decode_event("{}"), Err(DecodeError::MissingTag)));
        assert!(matches!(
            decode_event(r#"{"Chat": {"id": 1, "text": "a"}, "PlayerLeft": {"id": 1}}"#),
            Err(DecodeError::MissingTag)
        ));
    }

    #[test]
    fn test_decode_unknown_variant() {
        match decode_event(r#"{"Teleport": {"id": 1}}"#) {
            Err(DecodeError::UnknownVariant(tag)) => assert_eq!(tag, "Teleport"),
            other => panic!("expected unknown variant, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_overflowing_position() {
        let text = r#"{"Snapshot": {"tick": 1, "players": [{"id": 1, "position": [1e39, 0], "health": 1, "max_health": 1}]}}"#;
        match decode_event(text) {
            Err(DecodeError::Shape { tag, .. }) => assert_eq!(tag, "Snapshot"),
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_shape_error() {
        match decode_event(r#"{"Snapshot": {"tick": "soon"}}"#) {
            Err(DecodeError::Shape { tag, .. }) => assert_eq!(tag, "Snapshot"),
            other => panic!("expected shape error, got {:?}", other),
        }
        assert!(matches!(
            decode_event(r#"{"PlayerLeft": {"id": 1, "extra": true}}"#),
            Ok(ServerEvent::PlayerLeft { id: 1 })
        ));
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8() {
        assert!(matches!(
            decode_event_bytes(&[0xff, 0xfe]),
            Err(DecodeError::NotUtf8)
        ));
        assert!(decode_event_bytes(br#"{"PlayerLeft": {"id": 2}}"#).is_ok());
    }

    #[test]
    fn test_command_wire_format() {
        let encoded = encode_command(&ClientCommand::Chat {
            text: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(encoded, r#"{"Chat":{"text":"hello"}}"#);

        let join = encode_command(&ClientCommand::Join {
            name: "hero".to_string(),
        })
        .unwrap();
        assert_eq!(join, r#"{"Join":{"name":"hero"}}"#);
    }

    #[test]
    fn test_decode_command_accepts_named_target() {
        let command =
            decode_command(r#"{"CastSpell": {"spell": "Heal", "target": {"x": 1, "y": 2}}}"#)
                .unwrap();
        assert_eq!(command, ClientCommand::cast(Spell::Heal, Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_encoded_event_decodes() {
        let event = ServerEvent::Snapshot(WorldSnapshot::new(5));
        let text = encode_event(&event).unwrap();
        assert_eq!(decode_event(&text).unwrap(), event);
    }
}
