/// Input state tracker.
///
/// Every action in the game is edge-triggered: a movement key sets a
/// direction once and the actors slide on their own. So only fresh
/// presses are tracked; held keys and Repeat events are ignored.
///
/// `KeyBindings` maps the key names from `config.toml` to key codes.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::ControlsConfig;
use crate::domain::entity::Direction;

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        if key.kind == KeyEventKind::Press && !self.fresh_presses.contains(&key.code) {
            self.fresh_presses.push(key.code);
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

// ── Key bindings ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub reset: Vec<KeyCode>,
}

impl KeyBindings {
    /// Unknown key names are logged and skipped.
    pub fn from_config(controls: &ControlsConfig) -> Self {
        KeyBindings {
            up: parse_keys(&controls.up),
            down: parse_keys(&controls.down),
            left: parse_keys(&controls.left),
            right: parse_keys(&controls.right),
            reset: parse_keys(&controls.reset),
        }
    }

    /// First movement key pressed this frame, checked up/down/left/right.
    pub fn direction(&self, input: &InputState) -> Option<Direction> {
        [
            (&self.up, Direction::Up),
            (&self.down, Direction::Down),
            (&self.left, Direction::Left),
            (&self.right, Direction::Right),
        ]
        .into_iter()
        .find(|(keys, _)| input.any_pressed(keys))
        .map(|(_, d)| d)
    }
}

fn parse_keys(names: &[String]) -> Vec<KeyCode> {
    let mut codes = vec![];
    for name in names {
        match parse_key(name) {
            Some(code) => {
                let mut variants = vec![code];
                // letters match regardless of shift/caps lock
                if let KeyCode::Char(c) = code {
                    if c.is_ascii_lowercase() {
                        variants.push(KeyCode::Char(c.to_ascii_uppercase()));
                    } else if c.is_ascii_uppercase() {
                        variants.push(KeyCode::Char(c.to_ascii_lowercase()));
                    }
                }
                for v in variants {
                    if !codes.contains(&v) {
                        codes.push(v);
                    }
                }
            }
            None => tracing::warn!(key = %name, "unknown key name in config"),
        }
    }
    codes
}

/// Key name → code. Single characters map to themselves; named keys are
/// matched case-insensitively.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    let code = match name.to_ascii_lowercase().as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "enter" | "return" => KeyCode::Enter,
        "space" => KeyCode::Char(' '),
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "esc" | "escape" => KeyCode::Esc,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "delete" | "del" => KeyCode::Delete,
        f if f.starts_with('f') => return f[1..].parse::<u8>().ok().filter(|n| (1..=12).contains(n)).map(KeyCode::F),
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn named_and_char_keys() {
        assert_eq!(parse_key("Up"), Some(KeyCode::Up));
        assert_eq!(parse_key("ESC"), Some(KeyCode::Esc));
        assert_eq!(parse_key("w"), Some(KeyCode::Char('w')));
        assert_eq!(parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("F5"), Some(KeyCode::F(5)));
        assert_eq!(parse_key("F13"), None);
        assert_eq!(parse_key("Hyper"), None);
        assert_eq!(parse_key(""), None);
    }

    #[test]
    fn default_bindings() {
        let kb = KeyBindings::from_config(&crate::config::GameConfig::default().controls);
        assert!(kb.up.contains(&KeyCode::Up));
        assert!(kb.up.contains(&KeyCode::Char('w')));
        assert!(kb.up.contains(&KeyCode::Char('W')));
        assert!(kb.reset.contains(&KeyCode::Char('r')));
    }

    #[test]
    fn unknown_names_are_skipped() {
        let controls = ControlsConfig {
            up: vec!["Nope".into(), "k".into()],
            down: vec![],
            left: vec![],
            right: vec![],
            reset: vec![],
        };
        let kb = KeyBindings::from_config(&controls);
        assert_eq!(kb.up, vec![KeyCode::Char('k'), KeyCode::Char('K')]);
    }

    #[test]
    fn only_presses_count() {
        let mut input = InputState::new();
        input.record(press(KeyCode::Left));
        let mut release = press(KeyCode::Right);
        release.kind = KeyEventKind::Release;
        input.record(release);

        let kb = KeyBindings::from_config(&crate::config::GameConfig::default().controls);
        assert_eq!(kb.direction(&input), Some(Direction::Left));
        assert!(!input.was_pressed(KeyCode::Right));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut input = InputState::new();
        input.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(input.ctrl_c_pressed());
    }
}
