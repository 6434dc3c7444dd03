use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::clock::ManualClock;
use crate::error::{Result, TrainerError};
use crate::ui::View;

/// A single key event as the engine sees it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    /// Esc or Ctrl+C
    Cancel,
    Other,
}

impl Key {
    /// Convenience for scripting typed text
    pub fn chars(s: &str) -> Vec<Key> {
        s.chars().map(Key::Char).collect()
    }
}

impl From<KeyEvent> for Key {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Esc => Key::Cancel,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Cancel,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            _ => Key::Other,
        }
    }
}

/// Returns `None` for events the engine should never see (key releases)
pub fn key_from_event(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        None
    } else {
        Some(Key::from(key))
    }
}

/// Blocking input/output surface driven by the engine
pub trait Terminal {
    /// Block until the next key event arrives
    fn read_key(&mut self) -> Result<Key>;
    fn render(&mut self, view: &View) -> Result<()>;
}

/// Headless terminal for tests: replays scripted keys and records views.
///
/// Each scripted key may carry a delay; when a [`ManualClock`] is attached it
/// is advanced by that delay right before the key is delivered. Running out
/// of keys is reported as a terminal failure.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    events: VecDeque<(Duration, Key)>,
    clock: Option<ManualClock>,
    views: Vec<View>,
}

impl ScriptedTerminal {
    pub fn new<I: IntoIterator<Item = Key>>(keys: I) -> Self {
        Self {
            events: keys.into_iter().map(|k| (Duration::ZERO, k)).collect(),
            clock: None,
            views: Vec::new(),
        }
    }

    pub fn timed<I: IntoIterator<Item = (Duration, Key)>>(clock: ManualClock, events: I) -> Self {
        Self {
            events: events.into_iter().collect(),
            clock: Some(clock),
            views: Vec::new(),
        }
    }

    pub fn push(&mut self, delay: Duration, key: Key) {
        self.events.push_back((delay, key));
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn last_view(&self) -> Option<&View> {
        self.views.last()
    }
}

impl Terminal for ScriptedTerminal {
    fn read_key(&mut self) -> Result<Key> {
        let (delay, key) = self.events.pop_front().ok_or_else(|| {
            TrainerError::TerminalIo(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "scripted input exhausted",
            ))
        })?;
        if let Some(clock) = &self.clock {
            clock.advance(delay);
        }
        Ok(key)
    }

    fn render(&mut self, view: &View) -> Result<()> {
        self.views.push(view.clone());
        Ok(())
    }
}
