//! Terminal host screen for the record widget.
//!
//! Paints the widget's draw list onto a braille canvas, lays out the two host
//! buttons and a status line, and turns crossterm mouse events into widget
//! pointer events. Widget coordinates are braille dots: 2 per cell across,
//! 4 per cell down.

use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::canvas::{Canvas, Context, Line as CanvasLine},
    widgets::Paragraph,
};
use std::io::{stdout, Stdout, Write};

use super::capture::Haptics;
use super::gesture::{PointerEvent, PointerKind};
use super::render::{DrawList, DrawOp, Fill, Icon, RectF};

pub const DOTS_PER_COLUMN: f32 = 2.0;
pub const DOTS_PER_ROW: f32 = 4.0;

const BUTTON_WIDTH: u16 = 11;
const GRADIENT_STEPS: usize = 12;

/// What the host should do in response to a terminal event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostAction {
    Start,
    Stop,
    Quit,
    Resize,
    Pointer(PointerEvent),
    None,
}

/// Screen regions of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenLayout {
    pub widget: Rect,
    pub start_button: Rect,
    pub stop_button: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    /// Centers a widget `widget_rows` tall with the buttons below it.
    pub fn compute(area: Rect, widget_rows: u16) -> Self {
        let margin = area.width / 10;
        let widget_rows = widget_rows.min(area.height.saturating_sub(4)).max(1);
        let top = area.y + area.height.saturating_sub(widget_rows + 4) / 2;

        let widget = Rect {
            x: area.x + margin,
            y: top,
            width: area.width.saturating_sub(2 * margin),
            height: widget_rows,
        };

        let buttons_y = (widget.y + widget.height + 1).min(area.bottom().saturating_sub(2));
        let buttons_x = area.x + area.width.saturating_sub(2 * BUTTON_WIDTH + 2) / 2;
        let start_button = Rect {
            x: buttons_x,
            y: buttons_y,
            width: BUTTON_WIDTH.min(area.width),
            height: 1,
        };
        let stop_button = Rect {
            x: buttons_x + BUTTON_WIDTH + 2,
            ..start_button
        };

        let status = Rect {
            x: area.x,
            y: area.bottom().saturating_sub(1),
            width: area.width,
            height: 1,
        };

        Self {
            widget,
            start_button,
            stop_button,
            status,
        }
    }

    /// Widget size in dots.
    pub fn widget_size(&self) -> (f32, f32) {
        (
            self.widget.width as f32 * DOTS_PER_COLUMN,
            self.widget.height as f32 * DOTS_PER_ROW,
        )
    }

    /// Center of cell (`column`, `row`) in widget dot coordinates. May lie outside the widget.
    pub fn to_widget_coords(&self, column: u16, row: u16) -> (f32, f32) {
        let dx = column as f32 - self.widget.x as f32;
        let dy = row as f32 - self.widget.y as f32;
        (
            dx * DOTS_PER_COLUMN + DOTS_PER_COLUMN / 2.0,
            dy * DOTS_PER_ROW + DOTS_PER_ROW / 2.0,
        )
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    rect.contains(Position::new(column, row))
}

/// Tracks whether the current drag started on the widget.
#[derive(Debug, Default)]
pub struct PointerRouter {
    captured: bool,
}

impl PointerRouter {
    /// Maps a terminal event onto a host action.
    ///
    /// A press inside the widget captures the pointer so drags and the release
    /// reach the widget even outside its bounds, as touch events do.
    pub fn route(&mut self, event: &Event, layout: &ScreenLayout) -> HostAction {
        match event {
            Event::Key(key) => map_key(key),
            Event::Resize(_, _) => HostAction::Resize,
            Event::Mouse(mouse) => self.route_mouse(mouse, layout),
            _ => HostAction::None,
        }
    }

    fn route_mouse(&mut self, mouse: &MouseEvent, layout: &ScreenLayout) -> HostAction {
        let (column, row) = (mouse.column, mouse.row);
        let (x, y) = layout.to_widget_coords(column, row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if contains(layout.widget, column, row) {
                    self.captured = true;
                    HostAction::Pointer(PointerEvent::new(PointerKind::Down, x, y))
                } else if contains(layout.start_button, column, row) {
                    HostAction::Start
                } else if contains(layout.stop_button, column, row) {
                    HostAction::Stop
                } else {
                    HostAction::None
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.captured => {
                HostAction::Pointer(PointerEvent::new(PointerKind::Move, x, y))
            }
            MouseEventKind::Up(MouseButton::Left) if self.captured => {
                self.captured = false;
                HostAction::Pointer(PointerEvent::new(PointerKind::Up, x, y))
            }
            _ => HostAction::None,
        }
    }
}

fn map_key(key: &KeyEvent) -> HostAction {
    if key.kind != KeyEventKind::Press {
        return HostAction::None;
    }
    match key.code {
        KeyCode::Char('s') => HostAction::Start,
        KeyCode::Char('x') => HostAction::Stop,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => HostAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => HostAction::Quit,
        _ => HostAction::None,
    }
}

/// Haptic cue for terminals: the bell.
pub struct TerminalBell;

impl Haptics for TerminalBell {
    fn perform_cue(&mut self) {
        let mut out = stdout();
        if out.write_all(b"\x07").and_then(|_| out.flush()).is_err() {
            tracing::debug!("Failed to ring terminal bell");
        }
    }
}

/// Full-screen host with the widget, two buttons and a status line.
pub struct VoxholdTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    layout: ScreenLayout,
    widget_rows: u16,
    active: bool,
}

impl VoxholdTui {
    /// Enters alternate screen mode with mouse capture.
    ///
    /// # Errors
    /// - If raw mode, the alternate screen or mouse capture cannot be enabled
    pub fn new(widget_rows: u16) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        let mut tui = Self {
            terminal,
            layout: ScreenLayout::default(),
            widget_rows,
            active: true,
        };
        tui.relayout()?;
        Ok(tui)
    }

    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    /// Recomputes screen regions from the current terminal size.
    pub fn relayout(&mut self) -> anyhow::Result<()> {
        let size = self.terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        self.layout = ScreenLayout::compute(area, self.widget_rows);
        Ok(())
    }

    /// Draws one frame.
    pub fn render(
        &mut self,
        widget: &DrawList,
        recording: bool,
        status: &str,
    ) -> anyhow::Result<()> {
        let layout = self.layout;
        let (width, height) = layout.widget_size();

        self.terminal.draw(|frame| {
            let canvas = Canvas::default()
                .marker(Marker::Braille)
                .x_bounds([0.0, width as f64])
                .y_bounds([0.0, height as f64])
                .paint(|ctx| replay(ctx, widget.ops(), height));
            frame.render_widget(canvas, layout.widget);

            let (start_style, stop_style) = if recording {
                (Style::default().fg(Color::DarkGray), button_style())
            } else {
                (button_style(), Style::default().fg(Color::DarkGray))
            };
            frame.render_widget(
                Paragraph::new(" [ Start ] ").style(start_style),
                layout.start_button,
            );
            frame.render_widget(
                Paragraph::new(" [ Stop ]  ").style(stop_style),
                layout.stop_button,
            );

            let indicator = if recording {
                Span::styled("● ", Style::default().fg(Color::Red))
            } else {
                Span::styled("○ ", Style::default().fg(Color::DarkGray))
            };
            let footer = Paragraph::new(ratatui::text::Line::from(vec![
                indicator,
                Span::raw(status.to_string()),
                Span::styled(
                    "   s start · x stop · drag off the button to cancel · q quit",
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            frame.render_widget(footer, layout.status);
        })?;
        Ok(())
    }

    /// Restores the terminal.
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for VoxholdTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn button_style() -> Style {
    Style::default()
        .fg(Color::Rgb(0, 0, 0))
        .bg(Color::Rgb(185, 207, 212))
}

/// Replays draw ops onto a canvas whose y axis points up.
fn replay(ctx: &mut Context<'_>, ops: &[DrawOp], height: f32) {
    for op in ops {
        match op {
            DrawOp::RoundRect { rect, radius, fill } => {
                fill_rounded(ctx, *rect, *radius, *fill, height);
            }
            DrawOp::Circle {
                center,
                radius,
                color,
            } => {
                let rect = RectF::new(
                    center.0 - radius,
                    center.1 - radius,
                    center.0 + radius,
                    center.1 + radius,
                );
                fill_rounded(ctx, rect, *radius, Fill::Solid(*color), height);
            }
            DrawOp::Text {
                text,
                left,
                baseline,
                color,
                ..
            } => {
                ctx.print(
                    *left as f64,
                    (height - baseline) as f64,
                    Span::styled(text.clone(), Style::default().fg(*color)),
                );
            }
            DrawOp::Icon {
                icon: Icon::Delete,
                bounds,
                tint,
                rotation_deg,
            } => draw_delete_icon(ctx, *bounds, *tint, *rotation_deg, height),
        }
        ctx.layer();
    }
}

/// Fills a rounded rectangle with horizontal scanlines, one per dot row.
fn fill_rounded(ctx: &mut Context<'_>, rect: RectF, radius: f32, fill: Fill, height: f32) {
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return;
    }
    let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    let mut y = rect.top + 0.5;
    while y < rect.bottom {
        let edge = (y - rect.top).min(rect.bottom - y);
        let inset = if edge < radius {
            let d = radius - edge;
            radius - (radius * radius - d * d).max(0.0).sqrt()
        } else {
            0.0
        };
        let (left, right) = (rect.left + inset, rect.right - inset);
        if right >= left {
            scanline(ctx, left, right, height - y, fill, rect);
        }
        y += 1.0;
    }
}

fn scanline(ctx: &mut Context<'_>, left: f32, right: f32, y: f32, fill: Fill, rect: RectF) {
    match fill {
        Fill::Solid(color) => ctx.draw(&CanvasLine {
            x1: left as f64,
            y1: y as f64,
            x2: right as f64,
            y2: y as f64,
            color,
        }),
        Fill::HorizontalGradient { from, to } => {
            let step = rect.width() / GRADIENT_STEPS as f32;
            for i in 0..GRADIENT_STEPS {
                let x1 = (rect.left + step * i as f32).max(left);
                let x2 = (rect.left + step * (i + 1) as f32).min(right);
                if x2 < x1 {
                    continue;
                }
                let t = (i as f32 + 0.5) / GRADIENT_STEPS as f32;
                ctx.draw(&CanvasLine {
                    x1: x1 as f64,
                    y1: y as f64,
                    x2: x2 as f64,
                    y2: y as f64,
                    color: lerp_color(from, to, t),
                });
            }
        }
    }
}

/// Trash-can cross: two diagonals and a lid, rotated about the bounds' center.
fn draw_delete_icon(
    ctx: &mut Context<'_>,
    bounds: RectF,
    tint: Color,
    rotation_deg: f32,
    height: f32,
) {
    let (cx, cy) = bounds.center();
    let half = bounds.width().min(bounds.height()) * 0.3;
    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let rotate = |x: f32, y: f32| {
        let (dx, dy) = (x - cx, y - cy);
        (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    };

    let segments = [
        ((cx - half, cy - half * 0.6), (cx + half, cy + half)),
        ((cx + half, cy - half * 0.6), (cx - half, cy + half)),
        ((cx - half * 1.2, cy - half), (cx + half * 1.2, cy - half)),
    ];
    for (a, b) in segments {
        let (x1, y1) = rotate(a.0, a.1);
        let (x2, y2) = rotate(b.0, b.1);
        ctx.draw(&CanvasLine {
            x1: x1 as f64,
            y1: (height - y1) as f64,
            x2: x2 as f64,
            y2: (height - y2) as f64,
            color: tint,
        });
    }
}

fn lerp_color(from: Color, to: Color, t: f32) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => from,
    }
}
