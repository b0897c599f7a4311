//! Render-time selection and interpolation factor
//!
//! Remote entities are drawn a fixed offset in the past so that, most of the
//! time, two received snapshots surround the drawn instant and motion can be
//! blended between them instead of jumping from tick to tick.

use crate::clock::Timestamp;
use crate::config::EngineConfig;
use crate::snapshot_buffer::{Bracket, SnapshotBuffer};
use log::trace;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationError {
    /// Fewer than two snapshots are buffered; the frame is skipped.
    #[error("need at least two buffered snapshots to interpolate, have {buffered}")]
    InsufficientData { buffered: usize },
}

pub fn compute_render_time(now: Timestamp, offset_ms: f64) -> Timestamp {
    now - offset_ms
}

/// Blend factor between `bracket.from` (0) and `bracket.to` (1), always in `[0, 1]`.
///
/// A degenerate bracket yields 0. Distinct entries stamped with the same time
/// yield 1, favouring the newer state, unless the render instant is still
/// before them.
pub fn interpolation_factor(bracket: &Bracket<'_>, render_time: Timestamp) -> f32 {
    if bracket.is_degenerate() {
        return 0.0;
    }

    let span = bracket.to.arrival_time - bracket.from.arrival_time;
    if span <= 0.0 {
        return if render_time >= bracket.from.arrival_time {
            1.0
        } else {
            0.0
        };
    }

    let t = (render_time - bracket.from.arrival_time) / span;
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0) as f32
    }
}

/// Everything the reconciler needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameSample<'a> {
    pub render_time: Timestamp,
    pub bracket: Bracket<'a>,
    pub t: f32,
}

impl FrameSample<'_> {
    /// The render instant was past the newest snapshot and the frame froze on it.
    pub fn is_frozen(&self) -> bool {
        self.bracket.frozen
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationEngine {
    offset_ms: f64,
}

impl InterpolationEngine {
    pub fn new(offset_ms: f64) -> Self {
        Self { offset_ms }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.interpolation_offset_ms)
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    /// Picks the render instant for `now` and the bracket around it.
    pub fn sample<'a>(
        &self,
        buffer: &'a SnapshotBuffer,
        now: Timestamp,
    ) -> Result<FrameSample<'a>, InterpolationError> {
        let render_time = compute_render_time(now, self.offset_ms);
        let bracket = buffer.bracket(render_time)?;
        let t = interpolation_factor(&bracket, render_time);

        trace!(
            "Render time {:.1}ms between ticks {} and {} (t = {:.3}{})",
            render_time,
            bracket.from.tick(),
            bracket.to.tick(),
            t,
            if bracket.frozen { ", frozen" } else { "" }
        );

        Ok(FrameSample {
            render_time,
            bracket,
            t,
        })
    }
}

impl Default for InterpolationEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
