//! Rolling chat history fed from the `chat` topic

use crate::events::{ConnectionEvent, EventChannel, SubscriptionId, Topic};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

pub const CHAT_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub id: u32,
    pub text: String,
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.id, self.text)
    }
}

/// Keeps the last [`CHAT_HISTORY`] chat lines while attached to a channel.
#[derive(Debug, Default)]
pub struct ChatLog {
    lines: Rc<RefCell<VecDeque<ChatLine>>>,
    subscription: Option<SubscriptionId>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, channel: &mut EventChannel) {
        if self.subscription.is_some() {
            return;
        }

        let lines = Rc::clone(&self.lines);
        let id = channel.subscribe(Topic::Chat, move |event| {
            if let ConnectionEvent::Chat { id, text } = event {
                let mut lines = lines.borrow_mut();
                if lines.len() >= CHAT_HISTORY {
                    lines.pop_front();
                }
                lines.push_back(ChatLine {
                    id: *id,
                    text: text.clone(),
                });
            }
        });
        self.subscription = Some(id);
    }

    pub fn detach(&mut self, channel: &mut EventChannel) -> bool {
        match self.subscription.take() {
            Some(id) => channel.unsubscribe(id),
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Up to `count` most recent lines, oldest first.
    pub fn recent(&self, count: usize) -> Vec<ChatLine> {
        let lines = self.lines.borrow();
        let skip = lines.len().saturating_sub(count);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: u32, text: &str) -> ConnectionEvent {
        ConnectionEvent::Chat {
            id,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_collects_chat_lines() {
        let mut channel = EventChannel::new();
        let mut log = ChatLog::new();
        log.attach(&mut channel);

        channel.emit(&chat(1, "hello"));
        channel.emit(&ConnectionEvent::PlayerLeft { id: 1 });
        channel.emit(&chat(2, "hi"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.recent(10)[1].to_string(), "#2: hi");
    }

    #[test]
    fn test_history_is_bounded() {
        let mut channel = EventChannel::new();
        let mut log = ChatLog::new();
        log.attach(&mut channel);

        for i in 0..60 {
            channel.emit(&chat(i, &format!("line {}", i)));
        }

        assert_eq!(log.len(), CHAT_HISTORY);
        let recent = log.recent(2);
        assert_eq!(recent[0].text, "line 58");
        assert_eq!(recent[1].text, "line 59");
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut channel = EventChannel::new();
        let mut log = ChatLog::new();
        log.attach(&mut channel);
        log.attach(&mut channel);
        assert_eq!(channel.subscriber_count(Topic::Chat), 1);
    }

    #[test]
    fn test_detach_stops_collection() {
        let mut channel = EventChannel::new();
        let mut log = ChatLog::new();
        log.attach(&mut channel);
        channel.emit(&chat(1, "before"));

        assert!(log.detach(&mut channel));
        assert!(!log.is_attached());
        channel.emit(&chat(1, "after"));

        assert_eq!(log.len(), 1);
        assert!(!log.detach(&mut channel));
    }
}
