//! Per-connection client state and the once-per-frame update
//!
//! `ClientSession` is the single owner of the snapshot buffer and the render
//! state. Inbound frames are fed in with [`ClientSession::ingest`] and the
//! render loop calls [`ClientSession::tick`] once per frame.

use crate::clock::Timestamp;
use crate::config::EngineConfig;
use crate::events::{ConnectionEvent, EventChannel};
use crate::interpolation::{InterpolationEngine, InterpolationError};
use crate::network::{InboundFrame, Transport, TransportError};
use crate::reconciler::{Reconciler, RenderState};
use crate::snapshot_buffer::SnapshotBuffer;
use log::{debug, info, trace, warn};
use shared::{decode_event_bytes, encode_command, ClientCommand, EncodeError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Rendered { t: f32, frozen: bool },
    /// Not enough snapshots yet; the previous render state was kept.
    Skipped { buffered: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub rendered: u64,
    pub skipped: u64,
    pub frozen: u64,
    pub dropped_messages: u64,
}

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("cannot send while {0:?}")]
    NotConnected(ConnectionState),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct ClientSession<T: Transport> {
    transport: T,
    events: EventChannel,
    buffer: SnapshotBuffer,
    engine: InterpolationEngine,
    reconciler: Reconciler,
    render_state: RenderState,
    connection: ConnectionState,
    stats: FrameStats,
    last_t: Option<f32>,
}

impl<T: Transport> ClientSession<T> {
    pub fn new(transport: T, events: EventChannel, config: &EngineConfig) -> Self {
        Self {
            transport,
            events,
            buffer: SnapshotBuffer::new(config.buffer_capacity),
            engine: InterpolationEngine::from_config(config),
            reconciler: Reconciler::new(config.projectile_policy),
            render_state: RenderState::default(),
            connection: ConnectionState::Disconnected,
            stats: FrameStats::default(),
            last_t: None,
        }
    }

    /// Marks the session as waiting for the transport to open.
    pub fn begin_connect(&mut self) {
        if self.connection == ConnectionState::Disconnected {
            self.connection = ConnectionState::Connecting;
        }
    }

    pub fn events_mut(&mut self) -> &mut EventChannel {
        &mut self.events
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn buffer(&self) -> &SnapshotBuffer {
        &self.buffer
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Blend factor of the last rendered frame.
    pub fn last_t(&self) -> Option<f32> {
        self.last_t
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handles one frame from the transport. Malformed messages are logged
    /// and dropped; nothing here is fatal.
    pub fn ingest(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::Opened => {
                info!("Connection opened");
                self.connection = ConnectionState::Connected;
                self.events.emit(&ConnectionEvent::Connected);
            }
            InboundFrame::Closed { reason } => {
                info!(
                    "Connection closed{}",
                    reason
                        .as_deref()
                        .map(|r| format!(": {}", r))
                        .unwrap_or_default()
                );
                self.connection = ConnectionState::Disconnected;
                self.events.emit(&ConnectionEvent::Disconnected { reason });
            }
            InboundFrame::Message {
                received_at,
                payload,
            } => match decode_event_bytes(&payload) {
                Ok(event) => self.dispatch(event.into(), received_at),
                Err(e) => {
                    self.stats.dropped_messages += 1;
                    warn!("Dropping message: {}", e);
                }
            },
        }
    }

    fn dispatch(&mut self, event: ConnectionEvent, received_at: Timestamp) {
        let handled = self.events.emit(&event);
        trace!("{} event reached {} subscribers", event.topic(), handled);

        if let ConnectionEvent::Snapshot(snapshot) = event {
            self.buffer.push(snapshot, received_at);
        }
    }

    /// Rebuilds the render state for wall-clock `now`, or leaves it untouched
    /// when fewer than two snapshots are buffered.
    pub fn tick(&mut self, now: Timestamp) -> FrameOutcome {
        match self.engine.sample(&self.buffer, now) {
            Ok(sample) => {
                self.render_state = self.reconciler.reconcile(&sample.bracket, sample.t);
                self.stats.rendered += 1;
                if sample.is_frozen() {
                    self.stats.frozen += 1;
                }
                self.last_t = Some(sample.t);
                FrameOutcome::Rendered {
                    t: sample.t,
                    frozen: sample.is_frozen(),
                }
            }
            Err(InterpolationError::InsufficientData { buffered }) => {
                self.stats.skipped += 1;
                trace!("Skipping frame, {} snapshot(s) buffered", buffered);
                FrameOutcome::Skipped { buffered }
            }
        }
    }

    pub fn send_intent(&mut self, command: &ClientCommand) -> Result<(), IntentError> {
        if self.connection != ConnectionState::Connected {
            return Err(IntentError::NotConnected(self.connection));
        }

        let frame = encode_command(command)?;
        debug!("Sending {}", frame);
        self.transport.send(frame)?;
        Ok(())
    }

    /// Closes the transport, detaches all subscribers and drops buffered state.
    pub fn shutdown(&mut self) {
        info!("Shutting down session");
        self.transport.disconnect();
        self.events.clear();
        self.buffer.clear();
        self.connection = ConnectionState::Disconnected;
    }
}
