use crossterm::event::{self, Event};
use ratatui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Terminal as RatatuiTerminal,
};
use unicode_width::UnicodeWidthStr;

use crate::error::Result;
use crate::runtime::{key_from_event, Key, Terminal};
use crate::session::{EndReason, Input, Outcome, PracticeSession, SessionResults};
use crate::stats::Mode;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const TITLE: &str = "Special Character Typing Trainer";

/// Everything one screen needs to be drawn
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    ModeMenu {
        notice: Option<String>,
    },
    NoPeekPrompt {
        message: String,
    },
    LengthPrompt {
        buffer: String,
    },
    Typing {
        target: Vec<char>,
        input: Vec<Input>,
        error_count: usize,
        max_errors: usize,
    },
    Results {
        results: SessionResults,
        warning: Option<String>,
    },
}

impl View {
    pub fn typing(session: &PracticeSession) -> Self {
        View::Typing {
            target: session.target().to_vec(),
            input: session.input().to_vec(),
            error_count: session.error_count(),
            max_errors: session.max_errors(),
        }
    }
}

/// Turn a view into styled lines, top to bottom
pub fn view_lines(view: &View) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green = Style::default().fg(Color::Green);
    let red_bold = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
    let yellow = Style::default().fg(Color::Yellow);
    let magenta = Style::default().fg(Color::Magenta);
    let dim = Style::default().add_modifier(Modifier::DIM);

    match view {
        View::ModeMenu { notice } => {
            let mut lines = vec![
                Line::from(Span::styled(TITLE, bold)),
                Line::from("Choose your mode:"),
                Line::from(format!("1) {}", Mode::Peek.label())),
                Line::from(format!("2) {}", Mode::NoPeek.label())),
                Line::from("ESC to exit"),
            ];
            if let Some(notice) = notice {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(format!("! {notice}"), yellow)));
            }
            lines
        }
        View::NoPeekPrompt { message } => vec![
            Line::from(Span::styled(message.clone(), magenta)),
            Line::from(Span::styled("─".repeat(message.width()), magenta)),
            Line::from("Press any key when ready..."),
        ],
        View::LengthPrompt { buffer } => vec![
            Line::from(Span::styled(TITLE, bold)),
            Line::from(vec![
                Span::raw("Press ESC to exit, or select length (5-100): "),
                Span::styled(buffer.clone(), bold),
            ]),
            Line::from(Span::styled("Enter to start", dim)),
        ],
        View::Typing {
            target,
            input,
            error_count,
            max_errors,
        } => {
            let mut typed: Vec<Span> = input
                .iter()
                .map(|i| match i.outcome {
                    Outcome::Correct => Span::styled(i.char.to_string(), green),
                    Outcome::Incorrect => Span::styled(
                        match i.char {
                            ' ' => "·".to_owned(),
                            c => c.to_string(),
                        },
                        red_bold,
                    ),
                })
                .collect();
            if input.len() < target.len() {
                typed.push(Span::styled("_", yellow));
                let rest: String = target[input.len() + 1..].iter().collect();
                typed.push(Span::raw(rest));
            }

            vec![
                Line::from("Type the following characters:"),
                Line::from(Span::styled(target.iter().collect::<String>(), green)),
                Line::from(typed),
                Line::from(format!("Errors: {error_count}/{max_errors}")),
            ]
        }
        View::Results { results, warning } => {
            let mut lines = vec![
                Line::from(Span::styled("Results:", bold)),
                Line::default(),
                Line::from(format!("Speed: {:.1} WPM", results.wpm)),
                Line::from(format!("Accuracy: {:.1}%", results.accuracy)),
                Line::from(format!("Time: {:.1} seconds", results.elapsed.as_secs_f64())),
            ];
            if results.ended == EndReason::TooManyErrors {
                lines.push(Line::from(Span::styled(
                    format!(
                        "Stopped after {} errors ({}/{} typed)",
                        results.error_count, results.typed_len, results.target_len
                    ),
                    red_bold,
                )));
            }
            if let Some(warning) = warning {
                lines.push(Line::from(Span::styled(format!("! {warning}"), yellow)));
            }
            lines.push(Line::default());
            lines.push(Line::from("Press any key to continue, ESC to exit"));
            lines
        }
    }
}

/// Crossterm input plus ratatui drawing
pub struct TuiTerminal<B: Backend> {
    terminal: RatatuiTerminal<B>,
    last_view: Option<View>,
}

impl<B: Backend> TuiTerminal<B> {
    pub fn new(backend: B) -> Result<Self> {
        Ok(Self {
            terminal: RatatuiTerminal::new(backend)?,
            last_view: None,
        })
    }

    pub fn inner_mut(&mut self) -> &mut RatatuiTerminal<B> {
        &mut self.terminal
    }

    fn draw(&mut self, view: &View) -> Result<()> {
        let lines = view_lines(view);
        self.terminal.draw(|f| {
            let area = f.area();
            let inner = Rect {
                x: area.x + HORIZONTAL_MARGIN.min(area.width / 2),
                y: area.y + VERTICAL_MARGIN.min(area.height / 2),
                width: area.width.saturating_sub(HORIZONTAL_MARGIN * 2),
                height: area.height.saturating_sub(VERTICAL_MARGIN * 2),
            };
            f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        })?;
        Ok(())
    }
}

impl<B: Backend> Terminal for TuiTerminal<B> {
    fn read_key(&mut self) -> Result<Key> {
        loop {
            match event::read()? {
                Event::Key(k) => {
                    if let Some(key) = key_from_event(k) {
                        return Ok(key);
                    }
                }
                Event::Resize(_, _) => {
                    if let Some(view) = self.last_view.clone() {
                        self.draw(&view)?;
                    }
                }
                _ => {}
            }
        }
    }

    fn render(&mut self, view: &View) -> Result<()> {
        self.draw(view)?;
        self.last_view = Some(view.clone());
        Ok(())
    }
}
