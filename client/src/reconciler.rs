//! Entity reconciliation across a snapshot bracket
//!
//! The newer snapshot decides which entities exist this frame. Entities that
//! also appear in the older snapshot have their position blended; everything
//! else (health, mana, names) is taken from the newer snapshot unchanged, so a
//! health bar never shows a value the server never sent.

use crate::config::ProjectilePolicy;
use crate::snapshot_buffer::Bracket;
use shared::{EnemyState, PlayerState, Position, ProjectileState, Vec2, WorldSnapshot};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlayer {
    pub id: u32,
    pub name: String,
    pub position: Position,
    pub health: f32,
    pub max_health: f32,
    pub mana: Option<f32>,
    pub max_mana: Option<f32>,
}

impl RenderPlayer {
    fn from_state(state: &PlayerState, position: Position) -> Self {
        Self {
            id: state.id,
            name: state.name.clone(),
            position,
            health: state.health,
            max_health: state.max_health,
            mana: state.mana,
            max_mana: state.max_mana,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        fraction(self.health, self.max_health)
    }

    /// Missing mana reads as empty against a pool of 100.
    pub fn mana_fraction(&self) -> f32 {
        fraction(self.mana.unwrap_or(0.0), self.max_mana.unwrap_or(100.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderEnemy {
    pub id: u32,
    pub position: Position,
    pub health: f32,
    pub max_health: f32,
}

impl RenderEnemy {
    fn from_state(state: &EnemyState, position: Position) -> Self {
        Self {
            id: state.id,
            position,
            health: state.health,
            max_health: state.max_health,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        fraction(self.health, self.max_health)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProjectile {
    pub id: u32,
    pub position: Position,
}

/// Displayable world for one frame, rebuilt from scratch every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub players: HashMap<u32, RenderPlayer>,
    pub enemies: HashMap<u32, RenderEnemy>,
    pub projectiles: Vec<RenderProjectile>,
}

impl RenderState {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.enemies.is_empty() && self.projectiles.is_empty()
    }
}

fn fraction(value: f32, max: f32) -> f32 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Entities whose identity is stable from one snapshot to the next.
trait Tracked {
    fn id(&self) -> u32;
    fn position(&self) -> Position;
}

impl Tracked for PlayerState {
    fn id(&self) -> u32 {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }
}

impl Tracked for EnemyState {
    fn id(&self) -> u32 {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }
}

/// Yields each newer entity with its display position: blended when the same
/// id exists in `older`, raw otherwise.
fn blend_by_id<'a, E: Tracked>(
    older: &[E],
    newer: &'a [E],
    t: f32,
) -> impl Iterator<Item = (&'a E, Position)> {
    let previous: HashMap<u32, Position> = older.iter().map(|e| (e.id(), e.position())).collect();

    newer.iter().map(move |entity| {
        let position = match previous.get(&entity.id()) {
            Some(&from) => Vec2::lerp(from, entity.position(), t),
            None => entity.position(),
        };
        (entity, position)
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reconciler {
    projectile_policy: ProjectilePolicy,
}

impl Reconciler {
    pub fn new(projectile_policy: ProjectilePolicy) -> Self {
        Self { projectile_policy }
    }

    pub fn projectile_policy(&self) -> ProjectilePolicy {
        self.projectile_policy
    }

    /// Builds the frame's render state from `bracket` at blend factor `t`.
    pub fn reconcile(&self, bracket: &Bracket<'_>, t: f32) -> RenderState {
        let older = &bracket.from.data;
        let newer = &bracket.to.data;

        let players = blend_by_id(&older.players, &newer.players, t)
            .map(|(state, position)| (state.id, RenderPlayer::from_state(state, position)))
            .collect();

        let enemies = blend_by_id(&older.enemies, &newer.enemies, t)
            .map(|(state, position)| (state.id, RenderEnemy::from_state(state, position)))
            .collect();

        RenderState {
            players,
            enemies,
            projectiles: self.reconcile_projectiles(older, newer, t),
        }
    }

    fn reconcile_projectiles(
        &self,
        older: &WorldSnapshot,
        newer: &WorldSnapshot,
        t: f32,
    ) -> Vec<RenderProjectile> {
        match self.projectile_policy {
            ProjectilePolicy::Older => older
                .projectiles
                .iter()
                .map(|p| RenderProjectile {
                    id: p.id,
                    position: p.position,
                })
                .collect(),
            ProjectilePolicy::NearestMatch { max_distance } => {
                match_nearest(&older.projectiles, &newer.projectiles, max_distance, t)
            }
        }
    }
}

/// Greedy nearest-neighbour pairing, in newer-snapshot order. Each older
/// projectile is claimed at most once.
fn match_nearest(
    older: &[ProjectileState],
    newer: &[ProjectileState],
    max_distance: f32,
    t: f32,
) -> Vec<RenderProjectile> {
    let max_distance_sq = max_distance * max_distance;
    let mut claimed = vec![false; older.len()];

    newer
        .iter()
        .map(|projectile| {
            let nearest = older
                .iter()
                .enumerate()
                .filter(|(index, _)| !claimed[*index])
                .map(|(index, candidate)| {
                    (index, candidate.position.distance_squared(projectile.position))
                })
                .filter(|(_, distance_sq)| *distance_sq <= max_distance_sq)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            let position = match nearest {
                Some((index, _)) => {
                    claimed[index] = true;
                    Vec2::lerp(older[index].position, projectile.position, t)
                }
                None => projectile.position,
            };

            RenderProjectile {
                id: projectile.id,
                position,
            }
        })
        .collect()
}
