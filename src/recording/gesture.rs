//! Drag-to-cancel gesture on the circular record button.
//!
//! Holding the pointer outside the button's circle while recording arms a
//! cancel; releasing while armed cancels the recording. The haptic cue fires
//! once on each transition into the armed state.

/// Circular hit zone of the record button.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitZone {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
}

impl HitZone {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Pointer event in widget surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self { kind, x, y }
    }
}

/// What the widget must do in response to a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureOutcome {
    /// Fire the one-shot haptic cue
    pub haptic: bool,
    /// Release was armed: cancel the recording
    pub cancel: bool,
    /// Armed state flipped and the button must be redrawn
    pub changed: bool,
}

#[derive(Debug, Default)]
pub struct CancelGesture {
    armed: bool,
}

impl CancelGesture {
    pub fn is_armed_to_cancel(&self) -> bool {
        self.armed
    }

    /// Feeds one pointer event through the gesture.
    ///
    /// While not recording every event is consumed without effect and the
    /// gesture is kept disarmed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        recording: bool,
        zone: &HitZone,
    ) -> GestureOutcome {
        let was_armed = self.armed;
        if !recording {
            self.armed = false;
            return GestureOutcome {
                changed: was_armed,
                ..GestureOutcome::default()
            };
        }

        match event.kind {
            PointerKind::Down | PointerKind::Move => {
                let outside = !zone.contains(event.x, event.y);
                self.armed = outside;
                if outside && !was_armed {
                    tracing::debug!("Pointer left record button: armed to cancel");
                }
                GestureOutcome {
                    haptic: outside && !was_armed,
                    cancel: false,
                    changed: outside != was_armed,
                }
            }
            PointerKind::Up => {
                self.armed = false;
                GestureOutcome {
                    haptic: false,
                    cancel: was_armed,
                    changed: was_armed,
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> HitZone {
        HitZone {
            center_x: 10.0,
            center_y: 10.0,
            radius: 5.0,
        }
    }

    fn event(kind: PointerKind, x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(kind, x, y)
    }

    #[test]
    fn test_hit_zone_boundary() {
        let zone = zone();
        assert!(zone.contains(10.0, 10.0));
        assert!(zone.contains(15.0, 10.0));
        assert!(zone.contains(13.0, 14.0));
        assert!(!zone.contains(15.1, 10.0));
        assert!(!zone.contains(14.0, 14.0));
    }

    #[test]
    fn test_release_inside_does_not_cancel() {
        let mut gesture = CancelGesture::default();
        let down = gesture.handle(event(PointerKind::Down, 10.0, 11.0), true, &zone());
        assert_eq!(down, GestureOutcome::default());
        let up = gesture.handle(event(PointerKind::Up, 11.0, 10.0), true, &zone());
        assert!(!up.cancel);
        assert!(!gesture.is_armed_to_cancel());
    }

    #[test]
    fn test_drag_out_and_release_cancels() {
        let mut gesture = CancelGesture::default();
        gesture.handle(event(PointerKind::Down, 10.0, 10.0), true, &zone());
        let out = gesture.handle(event(PointerKind::Move, 30.0, 10.0), true, &zone());
        assert!(out.haptic);
        assert!(out.changed);
        assert!(gesture.is_armed_to_cancel());

        let up = gesture.handle(event(PointerKind::Up, 30.0, 10.0), true, &zone());
        assert!(up.cancel);
        assert!(!gesture.is_armed_to_cancel());
    }

    #[test]
    fn test_haptic_fires_once_per_transition() {
        let mut gesture = CancelGesture::default();
        gesture.handle(event(PointerKind::Down, 10.0, 10.0), true, &zone());

        let mut cues = 0;
        for x in [20.0, 25.0, 30.0, 35.0] {
            if gesture.handle(event(PointerKind::Move, x, 10.0), true, &zone()).haptic {
                cues += 1;
            }
        }
        assert_eq!(cues, 1);

        // Back inside disarms, out again re-arms with a fresh cue
        let back = gesture.handle(event(PointerKind::Move, 10.0, 10.0), true, &zone());
        assert!(!back.haptic);
        assert!(back.changed);
        assert!(!gesture.is_armed_to_cancel());
        assert!(gesture.handle(event(PointerKind::Move, 40.0, 10.0), true, &zone()).haptic);
    }

    #[test]
    fn test_down_outside_arms_immediately() {
        let mut gesture = CancelGesture::default();
        let down = gesture.handle(event(PointerKind::Down, 40.0, 40.0), true, &zone());
        assert!(down.haptic);
        assert!(gesture.is_armed_to_cancel());
    }

    #[test]
    fn test_idle_consumes_and_disarms() {
        let mut gesture = CancelGesture::default();
        gesture.handle(event(PointerKind::Down, 40.0, 40.0), true, &zone());
        assert!(gesture.is_armed_to_cancel());

        let idle = gesture.handle(event(PointerKind::Up, 40.0, 40.0), false, &zone());
        assert!(!idle.cancel);
        assert!(!idle.haptic);
        assert!(idle.changed);
        assert!(!gesture.is_armed_to_cancel());

        let idle = gesture.handle(event(PointerKind::Move, 40.0, 40.0), false, &zone());
        assert_eq!(idle, GestureOutcome::default());
    }
}
