use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Result, TrainerError};
use crate::generator::{PracticeGenerator, RandomSource};
use crate::history::SessionLog;
use crate::runtime::{Key, Terminal};
use crate::session::{resolve_length, PracticeSession, Progress, SessionResults, DEFAULT_LENGTH};
use crate::stats::{Mode, StatisticsStore};
use crate::ui::View;

pub const NO_PEEK_MESSAGES: [&str; 10] = [
    "Pinky promise no peeking! 🙈",
    "Eyes up here! Keyboard is lava! 🌋",
    "Touch typing mode: Your keyboard just turned invisible! 😎",
    "Warning: Looking at keyboard causes bad luck! 🍀",
    "Jedi mode activated: Trust in the Force! ⭐",
    "No peeking! I'm watching you! 👀",
    "Special characters are special! No peeking! 🎭",
    "No peeking! You got this! 💪",
    "<Insert motivational message here> 🚀",
    "Look at the screen only! 📺",
];

#[derive(Debug, Clone, PartialEq)]
pub enum EngineState {
    AwaitingModeSelection,
    NoPeekPrompt,
    AwaitingLength {
        mode: Mode,
        buffer: String,
    },
    Typing {
        mode: Mode,
        length: usize,
    },
    Completed {
        results: SessionResults,
        warning: Option<String>,
    },
    /// Cancelled by the user. From a prompt this ends the run; from the
    /// typing screen it only discards the session.
    Aborted {
        during_typing: bool,
    },
}

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub cancelled: usize,
}

/// Drives menus and typing sessions over a [`Terminal`].
///
/// Single threaded: the only suspension point is `Terminal::read_key`, and the
/// store is written only after a session's typing loop has exited.
pub struct SessionEngine<'a, T: Terminal, R: RandomSource, C: Clock> {
    store: &'a mut StatisticsStore,
    terminal: &'a mut T,
    rng: R,
    clock: C,
    generator: PracticeGenerator,
    history: Option<SessionLog>,
    notice: Option<String>,
    summary: RunSummary,
}

impl<'a, T: Terminal, R: RandomSource, C: Clock> SessionEngine<'a, T, R, C> {
    pub fn new(store: &'a mut StatisticsStore, terminal: &'a mut T, rng: R, clock: C) -> Self {
        Self {
            store,
            terminal,
            rng,
            clock,
            generator: PracticeGenerator::new(),
            history: None,
            notice: None,
            summary: RunSummary::default(),
        }
    }

    pub fn with_generator(mut self, generator: PracticeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_history(mut self, log: SessionLog) -> Self {
        self.history = Some(log);
        self
    }

    /// One-off message shown on the next mode menu (e.g. a load failure)
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    /// Loop until the user cancels from a prompt.
    ///
    /// Terminal failures end the run with an error; the session in progress is
    /// dropped without touching the store.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut state = EngineState::AwaitingModeSelection;
        loop {
            if let EngineState::Aborted {
                during_typing: false,
            } = state
            {
                info!(summary = ?self.summary, "leaving trainer");
                return Ok(self.summary.clone());
            }
            state = self.step(state)?;
        }
    }

    /// Advance the state machine by one transition
    pub fn step(&mut self, state: EngineState) -> Result<EngineState> {
        let during_typing = matches!(state, EngineState::Typing { .. });
        let next = match state {
            EngineState::AwaitingModeSelection => self.select_mode(),
            EngineState::NoPeekPrompt => self.no_peek_prompt(),
            EngineState::AwaitingLength { mode, buffer } => self.read_length(mode, buffer),
            EngineState::Typing { mode, length } => self.run_session(mode, length),
            EngineState::Completed { results, warning } => self.show_results(results, warning),
            EngineState::Aborted { during_typing: true } => Ok(EngineState::AwaitingModeSelection),
            EngineState::Aborted {
                during_typing: false,
            } => Ok(state),
        };

        match next {
            Err(TrainerError::Cancelled) => {
                if during_typing {
                    info!("session cancelled, discarding");
                    self.summary.cancelled += 1;
                }
                Ok(EngineState::Aborted { during_typing })
            }
            other => other,
        }
    }

    /// Next key from the user, with Cancel surfaced as `TrainerError::Cancelled`
    fn prompt_key(&mut self) -> Result<Key> {
        match self.terminal.read_key()? {
            Key::Cancel => Err(TrainerError::Cancelled),
            key => Ok(key),
        }
    }

    fn select_mode(&mut self) -> Result<EngineState> {
        let notice = self.notice.take();
        self.terminal.render(&View::ModeMenu { notice })?;

        Ok(match self.prompt_key()? {
            Key::Char('2') => EngineState::NoPeekPrompt,
            Key::Char(_) | Key::Enter => EngineState::AwaitingLength {
                mode: Mode::Peek,
                buffer: String::new(),
            },
            _ => EngineState::AwaitingModeSelection,
        })
    }

    fn no_peek_prompt(&mut self) -> Result<EngineState> {
        let message = self
            .rng
            .sample_weighted(&NO_PEEK_MESSAGES, &[1.0; NO_PEEK_MESSAGES.len()], 1)
            .first()
            .copied()
            .unwrap_or(NO_PEEK_MESSAGES[0]);
        self.terminal.render(&View::NoPeekPrompt {
            message: message.to_string(),
        })?;
        self.terminal.read_key()?;

        Ok(EngineState::AwaitingLength {
            mode: Mode::NoPeek,
            buffer: String::new(),
        })
    }

    fn read_length(&mut self, mode: Mode, mut buffer: String) -> Result<EngineState> {
        self.terminal.render(&View::LengthPrompt {
            buffer: buffer.clone(),
        })?;

        Ok(match self.prompt_key()? {
            Key::Enter => EngineState::Typing {
                mode,
                length: resolve_length(&buffer),
            },
            Key::Char(c) if c.is_ascii_digit() => {
                buffer.push(c);
                EngineState::AwaitingLength { mode, buffer }
            }
            Key::Backspace => {
                buffer.pop();
                EngineState::AwaitingLength { mode, buffer }
            }
            _ => EngineState::AwaitingLength { mode, buffer },
        })
    }

    fn generate_target(&mut self, mode: Mode, length: usize) -> Result<Vec<char>> {
        match self.generator.generate(self.store, length, mode, &mut self.rng) {
            Ok(target) => Ok(target),
            Err(e) => {
                warn!(error = %e, "falling back to default length");
                self.generator
                    .generate(self.store, DEFAULT_LENGTH, mode, &mut self.rng)
            }
        }
    }

    fn run_session(&mut self, mode: Mode, length: usize) -> Result<EngineState> {
        let target = self.generate_target(mode, length)?;
        let mut session = PracticeSession::new(target, mode, self.clock.now());
        info!(%mode, length = session.target().len(), "session started");

        loop {
            self.terminal.render(&View::typing(&session))?;
            if let Key::Char(c) = self.prompt_key()? {
                let at = self.clock.now();
                if let Progress::Ended(reason) = session.type_char(c, at) {
                    debug!(?reason, "session ended");
                    break;
                }
            }
        }

        let results = session.results(self.clock.now());
        let warning = session.write_back(self.store).map(|e| e.to_string());
        if let Some(log) = &self.history {
            if let Err(e) = log.append(&results) {
                warn!(error = %e, "could not append session history");
            }
        }
        self.summary.completed += 1;
        info!(
            wpm = results.wpm,
            accuracy = results.accuracy,
            errors = results.error_count,
            "session completed"
        );

        Ok(EngineState::Completed { results, warning })
    }

    fn show_results(
        &mut self,
        results: SessionResults,
        warning: Option<String>,
    ) -> Result<EngineState> {
        self.terminal.render(&View::Results { results, warning })?;
        self.prompt_key()?;
        Ok(EngineState::AwaitingModeSelection)
    }
}
