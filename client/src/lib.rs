//! # Game Client Library
//!
//! Client-side state synchronization for a multiplayer game whose server
//! broadcasts complete world snapshots at a fixed tick rate. The client runs
//! no simulation of its own; everything it shows is derived from those
//! snapshots, which arrive with variable delay and jitter.
//!
//! ## Architecture Overview
//!
//! ### Snapshot Interpolation
//! Every received snapshot is stamped with its local arrival time and kept in
//! a small bounded buffer. Each render frame picks an instant a fixed offset
//! in the past (100ms by default), finds the two snapshots that straddle it and
//! blends entity positions between them. With the offset covering a few tick
//! intervals of jitter, remote entities move smoothly instead of stepping
//! from tick to tick.
//!
//! ### Entity Reconciliation
//! Entities are matched across the two snapshots by id. The newer snapshot
//! decides which entities are shown: one missing from it disappears at once,
//! one that is new is shown at its raw position. Only positions are blended;
//! health, mana and names always show the newer value.
//!
//! ### Graceful Degradation
//! Nothing in the engine is fatal:
//! - Malformed messages are logged and dropped, the connection stays open
//! - With fewer than two snapshots the frame is skipped and the previous
//!   render state stays on screen
//! - When the render instant passes the newest snapshot the frame freezes on
//!   it instead of extrapolating
//!
//! ## Module Organization
//!
//! ### Snapshot Buffer (`snapshot_buffer`)
//! Arrival-ordered FIFO of snapshots with bracket search.
//!
//! ### Interpolation (`interpolation`)
//! Render-time selection and the clamped blend factor.
//!
//! ### Reconciler (`reconciler`)
//! Per-kind identity matching producing the frame's `RenderState`.
//!
//! ### Events (`events`)
//! Synchronous publish/subscribe channel for connection events.
//!
//! ### Session (`session`)
//! Owns the buffer and render state, ingests transport frames, runs the
//! per-frame update and sends player intents.
//!
//! ### Network (`network`)
//! Transport trait and the WebSocket implementation.
//!
//! ### Input, Rendering, Map and Chat
//! Thin collaborators around the engine: intent capture, macroquad drawing,
//! the tile map asset and the chat history.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::clock::SystemClock;
//! use client::config::EngineConfig;
//! use client::events::EventChannel;
//! use client::network::{WebSocketTransport, INBOUND_HEADROOM};
//! use client::session::ClientSession;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let clock = SystemClock::new();
//! let config = EngineConfig::default();
//! let (transport, mut inbound) = WebSocketTransport::connect(
//!     runtime.handle(),
//!     "ws://127.0.0.1:3000/ws",
//!     clock,
//!     config.buffer_capacity + INBOUND_HEADROOM,
//! );
//! let mut session = ClientSession::new(transport, EventChannel::new(), &config);
//! session.begin_connect();
//!
//! loop {
//!     while let Ok(frame) = inbound.try_recv() {
//!         session.ingest(frame);
//!     }
//!     session.tick(clock.now());
//!     // draw session.render_state()
//! #   break;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chat;
pub mod clock;
pub mod config;
pub mod events;
pub mod input;
pub mod interpolation;
pub mod map;
pub mod network;
pub mod reconciler;
pub mod rendering;
pub mod session;
pub mod snapshot_buffer;
