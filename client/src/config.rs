//! Engine tuning knobs.
//!
//! The interpolation offset trades latency for smoothness: a larger offset
//! covers more jitter and more missing ticks, but remote entities are shown
//! further in the past. The buffer capacity bounds memory and the bracket
//! search; at a 30 Hz tick the default holds roughly one second of history.

use log::warn;
use thiserror::Error;

pub const DEFAULT_INTERPOLATION_OFFSET_MS: f64 = 100.0;
pub const DEFAULT_BUFFER_CAPACITY: usize = 30;
pub const MIN_BUFFER_CAPACITY: usize = 2;
pub const DEFAULT_MATCH_DISTANCE: f32 = 48.0;

/// How projectiles are carried from the bracketing snapshots into the frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProjectilePolicy {
    /// Render the older snapshot's projectiles as-is.
    #[default]
    Older,
    /// Greedily pair each newer projectile with the closest unclaimed older
    /// one within `max_distance` and interpolate between them.
    NearestMatch { max_distance: f32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("interpolation offset must be a finite, non-negative number of milliseconds (got {0})")]
    InvalidOffset(f64),

    #[error("projectile match distance must be finite and positive (got {0})")]
    InvalidMatchDistance(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub interpolation_offset_ms: f64,
    pub buffer_capacity: usize,
    pub projectile_policy: ProjectilePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpolation_offset_ms: DEFAULT_INTERPOLATION_OFFSET_MS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            projectile_policy: ProjectilePolicy::Older,
        }
    }
}

impl EngineConfig {
    /// Validates the offset and match distance; a capacity below two is raised
    /// to two since bracketing needs a pair.
    pub fn new(
        interpolation_offset_ms: f64,
        buffer_capacity: usize,
        projectile_policy: ProjectilePolicy,
    ) -> Result<Self, ConfigError> {
        if !interpolation_offset_ms.is_finite() || interpolation_offset_ms < 0.0 {
            return Err(ConfigError::InvalidOffset(interpolation_offset_ms));
        }

        if let ProjectilePolicy::NearestMatch { max_distance } = projectile_policy {
            if !max_distance.is_finite() || max_distance <= 0.0 {
                return Err(ConfigError::InvalidMatchDistance(max_distance));
            }
        }

        let buffer_capacity = if buffer_capacity < MIN_BUFFER_CAPACITY {
            warn!(
                "Snapshot buffer capacity {} is too small, using {}",
                buffer_capacity, MIN_BUFFER_CAPACITY
            );
            MIN_BUFFER_CAPACITY
        } else {
            buffer_capacity
        };

        Ok(Self {
            interpolation_offset_ms,
            buffer_capacity,
            projectile_policy,
        })
    }
}
