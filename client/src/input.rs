//! Keyboard and mouse sampling turned into player intents

use crate::clock::Timestamp;
use macroquad::prelude::*;
use shared::{ClientCommand, Position, Spell, Vec2};

/// While a movement key is held the same direction is re-sent at this interval.
pub const MOVE_REPEAT_MS: f64 = 50.0;

const SPELL_KEYS: [Spell; 3] = [Spell::Fireball, Spell::Dash, Spell::Heal];

/// Raw device state for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Keys 1, 2 and 3.
    pub spell_keys: [bool; 3],
    pub mouse_down: bool,
    pub cursor: Position,
}

impl InputSample {
    /// Reads the current keyboard and mouse state from macroquad.
    pub fn capture() -> Self {
        let (mouse_x, mouse_y) = mouse_position();
        Self {
            up: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            down: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            spell_keys: [
                is_key_down(KeyCode::Key1),
                is_key_down(KeyCode::Key2),
                is_key_down(KeyCode::Key3),
            ],
            mouse_down: is_mouse_button_down(MouseButton::Left),
            cursor: Vec2::new(mouse_x, mouse_y),
        }
    }

    /// Unnormalized movement direction, screen coordinates (y grows downward).
    pub fn direction(&self) -> Vec2 {
        let axis = |negative: bool, positive: bool| match (negative, positive) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Turns per-frame samples into commands with edge detection and move throttling.
pub struct InputManager {
    last_direction: Vec2,
    last_move_sent: Option<Timestamp>,

    // Previous frame state for edge detection
    prev_spell_keys: [bool; 3],
    prev_mouse_down: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            last_direction: Vec2::ZERO,
            last_move_sent: None,
            prev_spell_keys: [false; 3],
            prev_mouse_down: false,
        }
    }

    pub fn update(&mut self, sample: &InputSample, now: Timestamp) -> Vec<ClientCommand> {
        let mut commands = Vec::new();

        let direction = sample.direction();
        if direction == Vec2::ZERO {
            self.last_direction = Vec2::ZERO;
            self.last_move_sent = None;
        } else {
            let changed = direction != self.last_direction;
            let repeat_due = self
                .last_move_sent
                .map_or(true, |sent| now - sent >= MOVE_REPEAT_MS);

            if changed || repeat_due {
                if let Ok(command) = ClientCommand::move_towards(direction) {
                    commands.push(command);
                    self.last_direction = direction;
                    self.last_move_sent = Some(now);
                }
            }
        }

        // Detect key press events (current && !previous)
        for (index, spell) in SPELL_KEYS.iter().enumerate() {
            if sample.spell_keys[index] && !self.prev_spell_keys[index] {
                commands.push(ClientCommand::cast(*spell, sample.cursor));
            }
        }
        if sample.mouse_down && !self.prev_mouse_down {
            commands.push(ClientCommand::cast(Spell::Fireball, sample.cursor));
        }

        self.prev_spell_keys = sample.spell_keys;
        self.prev_mouse_down = sample.mouse_down;

        commands
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest chat line accepted by the entry box, in characters.
pub const MAX_CHAT_INPUT: usize = 120;

/// Keyboard events relevant to the chat entry box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKey {
    Enter,
    Backspace,
    Escape,
    Char(char),
}

impl ChatKey {
    /// Drains this frame's key presses and typed characters from macroquad.
    pub fn capture() -> Vec<ChatKey> {
        let mut keys = Vec::new();
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            keys.push(ChatKey::Enter);
        }
        if is_key_pressed(KeyCode::Backspace) {
            keys.push(ChatKey::Backspace);
        }
        if is_key_pressed(KeyCode::Escape) {
            keys.push(ChatKey::Escape);
        }
        while let Some(c) = get_char_pressed() {
            if !c.is_control() {
                keys.push(ChatKey::Char(c));
            }
        }
        keys
    }
}

/// Chat entry box: Enter opens it, a second Enter sends the line, Escape
/// cancels. Characters typed while closed are ignored.
#[derive(Debug, Default)]
pub struct ChatInput {
    buffer: String,
    active: bool,
}

impl ChatInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Applies one key; returns a `Chat` command when a non-empty line is submitted.
    pub fn handle(&mut self, key: ChatKey) -> Option<ClientCommand> {
        match (self.active, key) {
            (false, ChatKey::Enter) => {
                self.active = true;
                None
            }
            (false, _) => None,
            (true, ChatKey::Enter) => {
                self.active = false;
                let line = std::mem::take(&mut self.buffer);
                ClientCommand::chat(&line).ok()
            }
            (true, ChatKey::Escape) => {
                self.active = false;
                self.buffer.clear();
                None
            }
            (true, ChatKey::Backspace) => {
                self.buffer.pop();
                None
            }
            (true, ChatKey::Char(c)) => {
                if !c.is_control() && self.buffer.chars().count() < MAX_CHAT_INPUT {
                    self.buffer.push(c);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn held_right() -> InputSample {
        InputSample {
            right: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_input_manager_creation() {
        let input_manager = InputManager::new();
        assert_eq!(input_manager.last_direction, Vec2::ZERO);
        assert!(input_manager.last_move_sent.is_none());
    }

    #[test]
    fn test_direction_axes() {
        let sample = InputSample {
            up: true,
            left: true,
            ..Default::default()
        };
        assert_eq!(sample.direction(), Vec2::new(-1.0, -1.0));

        let opposed = InputSample {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(opposed.direction(), Vec2::ZERO);
    }

    #[test]
    fn test_move_is_throttled_while_held() {
        let mut manager = InputManager::new();
        assert_eq!(manager.update(&held_right(), 0.0).len(), 1);
        assert!(manager.update(&held_right(), 16.0).is_empty());
        assert_eq!(manager.update(&held_right(), 50.0).len(), 1);
    }

    #[test]
    fn test_direction_change_sends_immediately() {
        let mut manager = InputManager::new();
        manager.update(&held_right(), 0.0);

        let diagonal = InputSample {
            right: true,
            down: true,
            ..Default::default()
        };
        let commands = manager.update(&diagonal, 5.0);
        match commands.as_slice() {
            [ClientCommand::Move { dir }] => {
                assert_approx_eq!(dir.x, std::f32::consts::FRAC_1_SQRT_2);
                assert_approx_eq!(dir.y, std::f32::consts::FRAC_1_SQRT_2);
            }
            other => panic!("unexpected commands {:?}", other),
        }
    }

    #[test]
    fn test_spell_keys_fire_on_press_only() {
        let mut manager = InputManager::new();
        let pressed = InputSample {
            spell_keys: [false, true, false],
            cursor: Vec2::new(30.0, 40.0),
            ..Default::default()
        };

        assert_eq!(
            manager.update(&pressed, 0.0),
            vec![ClientCommand::cast(Spell::Dash, Vec2::new(30.0, 40.0))]
        );
        assert!(manager.update(&pressed, 16.0).is_empty());
    }

    #[test]
    fn test_click_casts_fireball() {
        let mut manager = InputManager::new();
        let click = InputSample {
            mouse_down: true,
            cursor: Vec2::new(1.0, 2.0),
            ..Default::default()
        };
        assert_eq!(
            manager.update(&click, 0.0),
            vec![ClientCommand::cast(Spell::Fireball, Vec2::new(1.0, 2.0))]
        );
    }

    fn type_line(chat: &mut ChatInput, text: &str) {
        for c in text.chars() {
            assert!(chat.handle(ChatKey::Char(c)).is_none());
        }
    }

    #[test]
    fn test_chat_input_sends_on_second_enter() {
        let mut chat = ChatInput::new();
        type_line(&mut chat, "ignored");
        assert!(!chat.is_active());
        assert_eq!(chat.text(), "");

        assert!(chat.handle(ChatKey::Enter).is_none());
        assert!(chat.is_active());
        type_line(&mut chat, "hello!");
        chat.handle(ChatKey::Backspace);
        assert_eq!(chat.text(), "hello");

        assert_eq!(
            chat.handle(ChatKey::Enter),
            Some(ClientCommand::Chat {
                text: "hello".to_string()
            })
        );
        assert!(!chat.is_active());
        assert_eq!(chat.text(), "");
    }

    #[test]
    fn test_chat_input_empty_or_cancelled_sends_nothing() {
        let mut chat = ChatInput::new();
        chat.handle(ChatKey::Enter);
        type_line(&mut chat, "   ");
        assert!(chat.handle(ChatKey::Enter).is_none());
        assert!(!chat.is_active());

        chat.handle(ChatKey::Enter);
        type_line(&mut chat, "never mind");
        assert!(chat.handle(ChatKey::Escape).is_none());
        assert!(!chat.is_active());
        assert_eq!(chat.text(), "");
    }

    #[test]
    fn test_chat_input_length_is_capped() {
        let mut chat = ChatInput::new();
        chat.handle(ChatKey::Enter);
        type_line(&mut chat, &"x".repeat(MAX_CHAT_INPUT + 10));
        assert_eq!(chat.text().chars().count(), MAX_CHAT_INPUT);
    }
}
