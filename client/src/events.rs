//! Connection event channel
//!
//! A small synchronous publish/subscribe surface that sits between the
//! transport and everything that reacts to it (snapshot buffering, chat,
//! join/leave notices). The channel is an owned value handed to whoever needs
//! it, so the engine can be exercised in tests without a live connection.

use shared::{Position, ServerEvent, WorldSnapshot};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Connected,
    Disconnected,
    Snapshot,
    PlayerJoined,
    PlayerLeft,
    Chat,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Connected,
        Topic::Disconnected,
        Topic::Snapshot,
        Topic::PlayerJoined,
        Topic::PlayerLeft,
        Topic::Chat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Topic::Connected => "connected",
            Topic::Disconnected => "disconnected",
            Topic::Snapshot => "snapshot",
            Topic::PlayerJoined => "playerJoined",
            Topic::PlayerLeft => "playerLeft",
            Topic::Chat => "chat",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected { reason: Option<String> },
    Snapshot(WorldSnapshot),
    PlayerJoined { id: u32, name: String, position: Position },
    PlayerLeft { id: u32 },
    Chat { id: u32, text: String },
}

impl ConnectionEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ConnectionEvent::Connected => Topic::Connected,
            ConnectionEvent::Disconnected { .. } => Topic::Disconnected,
            ConnectionEvent::Snapshot(_) => Topic::Snapshot,
            ConnectionEvent::PlayerJoined { .. } => Topic::PlayerJoined,
            ConnectionEvent::PlayerLeft { .. } => Topic::PlayerLeft,
            ConnectionEvent::Chat { .. } => Topic::Chat,
        }
    }
}

impl From<ServerEvent> for ConnectionEvent {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::Snapshot(snapshot) => ConnectionEvent::Snapshot(snapshot),
            ServerEvent::PlayerJoined { id, name, position } => {
                ConnectionEvent::PlayerJoined { id, name, position }
            }
            ServerEvent::PlayerLeft { id } => ConnectionEvent::PlayerLeft { id },
            ServerEvent::Chat { id, text } => ConnectionEvent::Chat { id, text },
        }
    }
}

/// Handle returned by [`EventChannel::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&ConnectionEvent)>;

/// Per-topic handler lists, dispatched synchronously in registration order.
///
/// Handlers run on the thread that calls [`EventChannel::emit`] and must not
/// emit on the same channel.
#[derive(Default)]
pub struct EventChannel {
    handlers: HashMap<Topic, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: FnMut(&ConnectionEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(topic)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Removes the handler registered under `id`. Returns false if it was
    /// already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.handlers.values_mut() {
            if let Some(index) = handlers.iter().position(|(handler_id, _)| *handler_id == id) {
                handlers.remove(index);
                return true;
            }
        }
        false
    }

    /// Delivers `event` to its topic's handlers; returns how many ran.
    pub fn emit(&mut self, event: &ConnectionEvent) -> usize {
        match self.handlers.get_mut(&event.topic()) {
            Some(handlers) => {
                for (_, handler) in handlers.iter_mut() {
                    handler(event);
                }
                handlers.len()
            }
            None => 0,
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.get(&topic).map_or(0, Vec::len)
    }

    /// Detaches every handler on every topic.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&'static str, usize> = self
            .handlers
            .iter()
            .map(|(topic, handlers)| (topic.name(), handlers.len()))
            .collect();
        f.debug_struct("EventChannel")
            .field("subscribers", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn chat(text: &str) -> ConnectionEvent {
        ConnectionEvent::Chat {
            id: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_topic_names() {
        let names: Vec<&str> = Topic::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "connected",
                "disconnected",
                "snapshot",
                "playerJoined",
                "playerLeft",
                "chat"
            ]
        );
    }

    #[test]
    fn test_server_event_conversion() {
        let event: ConnectionEvent = ServerEvent::PlayerLeft { id: 4 }.into();
        assert_eq!(event, ConnectionEvent::PlayerLeft { id: 4 });
        assert_eq!(event.topic(), Topic::PlayerLeft);

        let snapshot: ConnectionEvent = ServerEvent::Snapshot(WorldSnapshot::new(3)).into();
        assert_eq!(snapshot.topic(), Topic::Snapshot);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let mut channel = EventChannel::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            channel.subscribe(Topic::Chat, move |_| log.borrow_mut().push(label));
        }

        assert_eq!(channel.emit(&chat("hi")), 3);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_only_reaches_matching_topic() {
        let mut channel = EventChannel::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        channel.subscribe(Topic::PlayerLeft, move |_| *counter.borrow_mut() += 1);

        assert_eq!(channel.emit(&chat("ignored")), 0);
        assert_eq!(channel.emit(&ConnectionEvent::PlayerLeft { id: 1 }), 1);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_handler_receives_payload() {
        let mut channel = EventChannel::new();
        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        channel.subscribe(Topic::Chat, move |event| {
            if let ConnectionEvent::Chat { text, .. } = event {
                *slot.borrow_mut() = Some(text.clone());
            }
        });

        channel.emit(&chat("hello"));
        assert_eq!(seen.borrow().as_deref(), Some("hello"));
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let mut channel = EventChannel::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = {
            let log = Rc::clone(&log);
            channel.subscribe(Topic::Chat, move |_| log.borrow_mut().push("a"))
        };
        {
            let log = Rc::clone(&log);
            channel.subscribe(Topic::Chat, move |_| log.borrow_mut().push("b"));
        }

        assert!(channel.unsubscribe(a));
        assert!(!channel.unsubscribe(a));
        assert_eq!(channel.subscriber_count(Topic::Chat), 1);

        channel.emit(&chat("x"));
        assert_eq!(*log.borrow(), vec!["b"]);
    }

    #[test]
    fn test_clear_detaches_everything() {
        let mut channel = EventChannel::new();
        channel.subscribe(Topic::Connected, |_| {});
        channel.subscribe(Topic::Chat, |_| {});
        channel.clear();

        for topic in Topic::ALL {
            assert_eq!(channel.subscriber_count(topic), 0);
        }
        assert_eq!(channel.emit(&ConnectionEvent::Connected), 0);
    }
}
