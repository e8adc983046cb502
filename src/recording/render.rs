//! Layout and painting of the record widget.
//!
//! Painting goes through [`RenderSurface`], a small set of shape primitives.
//! [`DrawList`] records those calls as [`DrawOp`]s so any backend (the
//! terminal canvas, tests) can replay them.

use ratatui::style::Color;

use super::animator::{format_elapsed, FrameState};
use super::gesture::HitZone;
use super::visualizations::{bar_height, WaveformHistory};

pub const GRADIENT_START: Color = Color::Rgb(0x4f, 0x99, 0xe9);
pub const GRADIENT_END: Color = Color::Rgb(0x59, 0xc1, 0xf0);
pub const ARMED_RED: Color = Color::Rgb(0xed, 0x49, 0x56);
pub const WHITE: Color = Color::Rgb(0xff, 0xff, 0xff);
pub const ICON_GRAY: Color = Color::Rgb(0x8e, 0x8e, 0x8e);

/// Rotation of the delete icon while armed, degrees.
const ARMED_ICON_ROTATION: f32 = -25.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Left-to-right linear gradient across the shape
    HorizontalGradient { from: Color, to: Color },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Delete,
}

/// Drawing primitives supplied by the host.
pub trait RenderSurface {
    /// Width and height of `text` drawn at `size`.
    fn measure_text(&self, text: &str, size: f32) -> (f32, f32);
    fn fill_round_rect(&mut self, rect: RectF, radius: f32, fill: Fill);
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color);
    fn draw_text(&mut self, text: &str, left: f32, baseline: f32, size: f32, color: Color);
    /// Draws `icon` inside `bounds`, rotated about the bounds' center.
    fn draw_icon(&mut self, icon: Icon, bounds: RectF, tint: Color, rotation_deg: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    RoundRect {
        rect: RectF,
        radius: f32,
        fill: Fill,
    },
    Circle {
        center: (f32, f32),
        radius: f32,
        color: Color,
    },
    Text {
        text: String,
        left: f32,
        baseline: f32,
        size: f32,
        color: Color,
    },
    Icon {
        icon: Icon,
        bounds: RectF,
        tint: Color,
        rotation_deg: f32,
    },
}

/// Records draw calls for later replay.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    ops: Vec<DrawOp>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl RenderSurface for DrawList {
    // Monospace approximation: glyphs are 0.6em wide, capitals 0.7em tall.
    fn measure_text(&self, text: &str, size: f32) -> (f32, f32) {
        (text.chars().count() as f32 * size * 0.6, size * 0.7)
    }

    fn fill_round_rect(&mut self, rect: RectF, radius: f32, fill: Fill) {
        self.ops.push(DrawOp::RoundRect { rect, radius, fill });
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, left: f32, baseline: f32, size: f32, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            left,
            baseline,
            size,
            color,
        });
    }

    fn draw_icon(&mut self, icon: Icon, bounds: RectF, tint: Color, rotation_deg: f32) {
        self.ops.push(DrawOp::Icon {
            icon,
            bounds,
            tint,
            rotation_deg,
        });
    }
}

/// Geometry of the widget for a given size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub text_size: f32,
    pub text_left: f32,
    pub text_bottom: f32,
    pub circle_radius: f32,
    pub bar_width: f32,
}

impl Layout {
    /// Measures the widget. The label is sized for its widest idle value.
    pub fn measure(
        width: f32,
        height: f32,
        number_of_bars: usize,
        surface: &impl RenderSurface,
    ) -> Self {
        let padding = 0.1 * height;
        let text_size = (height - padding) / 3.0;
        let (text_width, text_height) = surface.measure_text(&format_elapsed(0), text_size);
        let circle_radius = (height - 2.0 * padding) / 2.0;
        let bar_width = ((width - 4.0 * padding - text_width - 2.0 * circle_radius)
            / number_of_bars.max(1) as f32
            / 2.0)
            .max(0.0);

        Self {
            width,
            height,
            padding,
            text_size,
            text_left: width - padding - text_width,
            text_bottom: (height + text_height) / 2.0,
            circle_radius,
            bar_width,
        }
    }

    pub fn button_center(&self) -> (f32, f32) {
        (self.padding + self.circle_radius, self.height / 2.0)
    }

    pub fn hit_zone(&self) -> HitZone {
        let (center_x, center_y) = self.button_center();
        HitZone {
            center_x,
            center_y,
            radius: self.circle_radius,
        }
    }

    /// Left edge of the bar area; bars scrolled past it are squashed onto it.
    pub fn bars_origin(&self) -> f32 {
        2.0 * self.padding + 2.0 * self.circle_radius
    }

    /// Rectangle of bar `index` drawn at `height_fraction` of the bar area.
    pub fn bar_rect(&self, index: usize, height_fraction: f32, scroll_offset: f32) -> RectF {
        let origin = self.bars_origin();
        let x = origin + 2.0 * self.bar_width * index as f32 - scroll_offset;
        let inset = (self.height - 2.0 * self.padding) * (1.0 - height_fraction) * 0.5;
        RectF::new(
            x.max(origin),
            self.padding + inset,
            (x + self.bar_width).max(origin),
            self.height - inset - self.padding,
        )
    }

    fn armed_icon_bounds(&self) -> RectF {
        RectF::new(
            self.padding,
            self.padding,
            2.0 * self.circle_radius + self.padding,
            self.height - self.padding,
        )
    }

    fn idle_icon_bounds(&self) -> RectF {
        RectF::new(
            2.0 * self.padding,
            2.0 * self.padding,
            2.0 * self.circle_radius,
            self.height - 2.0 * self.padding,
        )
    }
}

/// Everything the painter reads from the widget.
pub struct Snapshot<'a> {
    pub frame: &'a FrameState,
    pub history: &'a WaveformHistory,
    pub armed_to_cancel: bool,
    pub min_bar_height: f32,
}

/// Paints background, label, bars and button in that order.
pub fn paint(surface: &mut impl RenderSurface, layout: &Layout, snapshot: &Snapshot<'_>) {
    let bounds = RectF::new(0.0, 0.0, layout.width, layout.height);
    surface.fill_round_rect(
        bounds,
        layout.height / 2.0,
        Fill::HorizontalGradient {
            from: GRADIENT_START,
            to: GRADIENT_END,
        },
    );

    surface.draw_text(
        &snapshot.frame.elapsed_label,
        layout.text_left,
        layout.text_bottom,
        layout.text_size,
        WHITE,
    );

    let newest = snapshot.history.len().saturating_sub(1);
    for (i, sample) in snapshot.history.iter().enumerate() {
        let height = bar_height(
            sample,
            i == newest,
            snapshot.frame.growth_factor,
            snapshot.min_bar_height,
        );
        let rect = layout.bar_rect(i, height, snapshot.frame.scroll_offset);
        surface.fill_round_rect(rect, layout.bar_width / 2.0, Fill::Solid(WHITE));
    }

    let center = layout.button_center();
    if snapshot.armed_to_cancel {
        surface.fill_circle(center, layout.circle_radius + layout.padding, ARMED_RED);
        surface.draw_icon(Icon::Delete, layout.armed_icon_bounds(), WHITE, ARMED_ICON_ROTATION);
    } else {
        surface.fill_circle(center, layout.circle_radius, WHITE);
        surface.draw_icon(Icon::Delete, layout.idle_icon_bounds(), ICON_GRAY, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::visualizations::{AmplitudeSample, MIN_BAR_HEIGHT};

    fn layout() -> Layout {
        Layout::measure(300.0, 40.0, 57, &DrawList::new())
    }

    fn frame() -> FrameState {
        FrameState {
            elapsed_label: "00:03".to_string(),
            growth_factor: 0.5,
            scroll_offset: 0.0,
        }
    }

    #[test]
    fn test_measure_geometry() {
        let layout = layout();
        assert!((layout.padding - 4.0).abs() < 1e-5);
        assert!((layout.circle_radius - 16.0).abs() < 1e-5);
        assert!((layout.text_size - 12.0).abs() < 1e-5);
        // label "00:00" measures 5 * 12 * 0.6 = 36 wide
        assert!((layout.text_left - 260.0).abs() < 1e-4);
        let expected_bar = (300.0 - 16.0 - 36.0 - 32.0) / 57.0 / 2.0;
        assert!((layout.bar_width - expected_bar).abs() < 1e-5);
        assert_eq!(layout.button_center(), (20.0, 20.0));
        assert_eq!(layout.hit_zone().radius, 16.0);
    }

    #[test]
    fn test_tiny_widget_has_no_negative_bars() {
        let layout = Layout::measure(20.0, 40.0, 57, &DrawList::new());
        assert_eq!(layout.bar_width, 0.0);
    }

    #[test]
    fn test_bar_rect_is_centered_vertically() {
        let layout = layout();
        let full = layout.bar_rect(0, 1.0, 0.0);
        assert_eq!(full.top, layout.padding);
        assert_eq!(full.bottom, layout.height - layout.padding);

        let half = layout.bar_rect(0, 0.5, 0.0);
        assert!((half.height() - 16.0).abs() < 1e-5);
        assert!((half.center().1 - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_scrolled_bars_clamp_to_origin() {
        let layout = layout();
        let rect = layout.bar_rect(0, 1.0, 50.0);
        assert_eq!(rect.left, layout.bars_origin());
        assert_eq!(rect.right, layout.bars_origin());

        let second = layout.bar_rect(3, 1.0, layout.bar_width);
        let expected = layout.bars_origin() + 5.0 * layout.bar_width;
        assert!((second.left - expected).abs() < 1e-4);
    }

    #[test]
    fn test_paint_order_and_newest_bar_growth() {
        let layout = layout();
        let mut history = WaveformHistory::new(57);
        history.push(AmplitudeSample::new(0.8, MIN_BAR_HEIGHT));
        history.push(AmplitudeSample::new(0.8, MIN_BAR_HEIGHT));
        let frame = frame();
        let snapshot = Snapshot {
            frame: &frame,
            history: &history,
            armed_to_cancel: false,
            min_bar_height: MIN_BAR_HEIGHT,
        };

        let mut list = DrawList::new();
        paint(&mut list, &layout, &snapshot);
        let ops = list.ops();
        assert_eq!(ops.len(), 6);
        assert!(matches!(
            ops[0],
            DrawOp::RoundRect {
                fill: Fill::HorizontalGradient { .. },
                ..
            }
        ));
        assert!(matches!(&ops[1], DrawOp::Text { text, .. } if text == "00:03"));

        let heights: Vec<f32> = ops[2..4]
            .iter()
            .map(|op| match op {
                DrawOp::RoundRect { rect, .. } => rect.height(),
                other => panic!("expected bar, got {other:?}"),
            })
            .collect();
        let area = layout.height - 2.0 * layout.padding;
        assert!((heights[0] - 0.8 * area).abs() < 1e-4);
        assert!((heights[1] - 0.4 * area).abs() < 1e-4);

        assert!(matches!(ops[4], DrawOp::Circle { color: WHITE, .. }));
        assert!(matches!(
            ops[5],
            DrawOp::Icon {
                tint: ICON_GRAY,
                rotation_deg,
                ..
            } if rotation_deg == 0.0
        ));
    }

    #[test]
    fn test_paint_armed_button() {
        let layout = layout();
        let history = WaveformHistory::new(57);
        let frame = frame();
        let snapshot = Snapshot {
            frame: &frame,
            history: &history,
            armed_to_cancel: true,
            min_bar_height: MIN_BAR_HEIGHT,
        };

        let mut list = DrawList::new();
        paint(&mut list, &layout, &snapshot);
        let ops = list.ops();
        assert_eq!(ops.len(), 4);
        match ops[2] {
            DrawOp::Circle { radius, color, .. } => {
                assert_eq!(color, ARMED_RED);
                assert_eq!(radius, layout.circle_radius + layout.padding);
            }
            ref other => panic!("expected circle, got {other:?}"),
        }
        assert!(matches!(
            ops[3],
            DrawOp::Icon { tint: WHITE, rotation_deg, .. } if rotation_deg == ARMED_ICON_ROTATION
        ));
    }
}
