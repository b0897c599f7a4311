//! Client transport: the seam between the socket and the session
//!
//! The WebSocket connection runs on a tokio runtime. Incoming frames are
//! stamped with their arrival time on the network side and handed to the
//! render thread through a bounded channel, so the snapshot buffer itself
//! is only ever touched by one thread. When the render thread falls behind,
//! messages that do not fit are dropped; a later snapshot replaces them.

use crate::clock::{SystemClock, Timestamp};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Extra inbound slots on top of the snapshot buffer capacity.
pub const INBOUND_HEADROOM: usize = 16;

/// Signals and payloads delivered by a transport, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Opened,
    Message {
        received_at: Timestamp,
        payload: Vec<u8>,
    },
    Closed {
        reason: Option<String>,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection is not open")]
    NotOpen,
}

/// Outgoing half of a connection.
pub trait Transport {
    fn send(&self, frame: String) -> Result<(), TransportError>;

    fn disconnect(&self);

    fn is_open(&self) -> bool;
}

/// WebSocket transport built on tokio-tungstenite.
///
/// Reconnecting is left to the caller: once `Closed` is delivered the
/// transport is finished.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    outgoing: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl WebSocketTransport {
    /// Starts connecting to `url` on `runtime` and returns immediately.
    ///
    /// The receiver yields `Opened`, then stamped messages, then exactly one
    /// `Closed`. At most `queue_capacity` frames wait in the receiver; further
    /// messages are dropped until it is drained.
    pub fn connect(
        runtime: &Handle,
        url: &str,
        clock: SystemClock,
        queue_capacity: usize,
    ) -> (Self, mpsc::Receiver<InboundFrame>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(queue_capacity.max(1));
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        runtime.spawn(run_connection(
            url.to_string(),
            clock,
            inbound_tx,
            outgoing_rx,
            Arc::clone(&open),
        ));

        (
            WebSocketTransport {
                outgoing: outgoing_tx,
                open,
            },
            inbound_rx,
        )
    }
}

impl Transport for WebSocketTransport {
    fn send(&self, frame: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.outgoing
            .send(Message::Text(frame))
            .map_err(|_| TransportError::NotOpen)
    }

    fn disconnect(&self) {
        if self.outgoing.send(Message::Close(None)).is_err() {
            debug!("Disconnect requested on a finished connection");
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

async fn run_connection(
    url: String,
    clock: SystemClock,
    inbound: mpsc::Sender<InboundFrame>,
    mut outgoing: mpsc::UnboundedReceiver<Message>,
    open: Arc<AtomicBool>,
) {
    info!("Connecting to {}...", url);

    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            error!("Failed to connect to {}: {}", url, e);
            let _ = inbound
                .send(InboundFrame::Closed {
                    reason: Some(e.to_string()),
                })
                .await;
            return;
        }
    };

    info!("Connected to {}", url);
    open.store(true, Ordering::Release);
    if inbound.send(InboundFrame::Opened).await.is_err() {
        open.store(false, Ordering::Release);
        return;
    }

    let (mut sink, mut stream) = socket.split();

    let reason = loop {
        tokio::select! {
            incoming = stream.next() => {
                let payload = match incoming {
                    Some(Ok(Message::Text(text))) => text.into_bytes(),
                    Some(Ok(Message::Binary(bytes))) => bytes,
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("Connection error: {}", e);
                        break Some(e.to_string());
                    }
                    None => break None,
                };

                let frame = InboundFrame::Message {
                    received_at: clock.now(),
                    payload,
                };
                match inbound.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!("Inbound queue full, dropping message");
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("Inbound receiver dropped, closing connection");
                        let _ = sink.send(Message::Close(None)).await;
                        break None;
                    }
                }
            },

            message = outgoing.recv() => {
                let message = message.unwrap_or(Message::Close(None));
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    error!("Error sending frame: {}", e);
                    break Some(e.to_string());
                }
                if closing {
                    break Some("client disconnected".to_string());
                }
            },
        }
    };

    open.store(false, Ordering::Release);
    info!("Disconnected from {}", url);
    let _ = inbound.send(InboundFrame::Closed { reason }).await;
}
