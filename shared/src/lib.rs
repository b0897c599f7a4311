use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub mod codec;

pub use codec::{
    decode_command, decode_event, decode_event_bytes, encode_command, encode_event, DecodeError,
    EncodeError,
};

pub const MAX_NAME_LEN: usize = 12;

/// Two-component vector used for positions, movement directions and spell targets.
///
/// The wire accepts both `[x, y]` and `{"x": .., "y": ..}`; both land here at
/// decode time so nothing downstream ever sees the raw shape. Serializing
/// always produces the `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

pub type Position = Vec2;
pub type Direction = Vec2;

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Per-axis linear blend, `a + (b - a) * t`.
    pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(self) -> Vec2 {
        let magnitude = self.length();
        if magnitude > 0.0 {
            Vec2::new(self.x / magnitude, self.y / magnitude)
        } else {
            Vec2::ZERO
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Vec2Repr {
    Pair(f32, f32),
    Named { x: f32, y: f32 },
}

impl<'de> Deserialize<'de> for Vec2 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y) = match Vec2Repr::deserialize(deserializer)? {
            Vec2Repr::Pair(x, y) => (x, y),
            Vec2Repr::Named { x, y } => (x, y),
        };
        // Out-of-range wire values come through as infinities.
        if !x.is_finite() || !y.is_finite() {
            return Err(serde::de::Error::custom(format!(
                "coordinates must be finite, got ({}, {})",
                x, y
            )));
        }
        Ok(Vec2 { x, y })
    }
}

impl Serialize for Vec2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y].serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Hostile,
    Projectile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub position: Position,
    pub health: f32,
    pub max_health: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mana: Option<f32>,
}

impl PlayerState {
    pub fn new(id: u32, name: &str, position: Position, health: f32, max_health: f32) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            health,
            max_health,
            mana: None,
            max_mana: None,
        }
    }

    pub fn with_mana(mut self, mana: f32, max_mana: f32) -> Self {
        self.mana = Some(mana);
        self.max_mana = Some(max_mana);
        self
    }
}

/// Server-controlled hostile actor (slimes and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    pub id: u32,
    pub position: Position,
    pub health: f32,
    pub max_health: f32,
}

impl EnemyState {
    pub fn new(id: u32, position: Position, health: f32, max_health: f32) -> Self {
        Self {
            id,
            position,
            health,
            max_health,
        }
    }
}

/// Projectile ids are not stable across snapshots; the server may reuse a
/// sentinel for every projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    pub id: u32,
    pub position: Position,
}

impl ProjectileState {
    pub fn new(id: u32, position: Position) -> Self {
        Self { id, position }
    }
}

/// Authoritative world state for one server tick.
///
/// Every entity list defaults to empty so payloads from servers that do not
/// send a given kind (older builds omit `enemies`) still decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    #[serde(default)]
    pub players: Vec<PlayerState>,
    #[serde(default)]
    pub enemies: Vec<EnemyState>,
    #[serde(default)]
    pub projectiles: Vec<ProjectileState>,
}

impl WorldSnapshot {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    pub fn entity_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Player => self.players.len(),
            EntityKind::Hostile => self.enemies.len(),
            EntityKind::Projectile => self.projectiles.len(),
        }
    }
}

/// Messages pushed by the server, tagged by their single top-level key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerEvent {
    Snapshot(WorldSnapshot),
    PlayerJoined {
        id: u32,
        name: String,
        position: Position,
    },
    PlayerLeft {
        id: u32,
    },
    Chat {
        id: u32,
        text: String,
    },
}

impl ServerEvent {
    pub const TAGS: [&'static str; 4] = ["Snapshot", "PlayerJoined", "PlayerLeft", "Chat"];

    pub fn tag(&self) -> &'static str {
        match self {
            ServerEvent::Snapshot(_) => "Snapshot",
            ServerEvent::PlayerJoined { .. } => "PlayerJoined",
            ServerEvent::PlayerLeft { .. } => "PlayerLeft",
            ServerEvent::Chat { .. } => "Chat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spell {
    Fireball,
    Dash,
    Heal,
}

/// Player intents sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientCommand {
    Join {
        name: String,
    },
    Move {
        dir: Direction,
    },
    CastSpell {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spell: Option<Spell>,
        target: Position,
    },
    Chat {
        text: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("player name is empty")]
    EmptyName,

    #[error("player name is {len} characters, at most {max} allowed")]
    NameTooLong { len: usize, max: usize },

    #[error("chat message is empty")]
    EmptyChat,

    #[error("movement direction is zero")]
    ZeroDirection,
}

impl ClientCommand {
    pub fn join(name: &str) -> Result<Self, CommandError> {
        let name = name.trim();
        let len = name.chars().count();
        if len == 0 {
            return Err(CommandError::EmptyName);
        }
        if len > MAX_NAME_LEN {
            return Err(CommandError::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            });
        }
        Ok(ClientCommand::Join {
            name: name.to_string(),
        })
    }

    pub fn move_towards(dir: Direction) -> Result<Self, CommandError> {
        let dir = dir.normalized();
        if dir == Vec2::ZERO {
            return Err(CommandError::ZeroDirection);
        }
        Ok(ClientCommand::Move { dir })
    }

    pub fn cast(spell: Spell, target: Position) -> Self {
        ClientCommand::CastSpell {
            spell: Some(spell),
            target,
        }
    }

    pub fn chat(text: &str) -> Result<Self, CommandError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CommandError::EmptyChat);
        }
        Ok(ClientCommand::Chat {
            text: text.to_string(),
        })
    }
}
