//! Full-screen error display.
//!
//! Used when the record screen cannot start, e.g. an invalid config file.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::Paragraph};
use std::io::{self, Stdout};
use std::time::Duration;

use crate::recording::render::ARMED_RED;

/// Error screen: the message centered in white on the cancel red, dismissed by any key.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ErrorScreen {
            terminal,
            active: true,
        })
    }

    /// Shows `error_message` until a key is pressed.
    ///
    /// The message wraps to 80% of the screen width.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let background = Style::default().bg(ARMED_RED);
                frame.buffer_mut().set_style(area, background);

                let lines: Vec<Line> = error_message
                    .lines()
                    .map(|line| Line::styled(line.to_string(), background.fg(Color::White)))
                    .chain(std::iter::once(Line::raw("")))
                    .chain(std::iter::once(Line::styled(
                        "Press any key to exit",
                        background.fg(Color::White).add_modifier(Modifier::DIM),
                    )))
                    .collect();
                let height = (lines.len() as u16).min(area.height);

                let paragraph = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(ratatui::widgets::Wrap { trim: true });

                let centered_area = Rect {
                    x: area.x + area.width / 10,
                    y: area.y + area.height.saturating_sub(height) / 2,
                    width: (area.width * 80) / 100,
                    height: area.height - area.height.saturating_sub(height) / 2,
                };

                frame.render_widget(paragraph, centered_area);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
