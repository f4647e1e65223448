use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// One detection event from the hand tracker.
///
/// `open` and the position are meaningless while `detected` is false.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureSample {
    #[serde(alias = "isDetected")]
    pub detected: bool,
    #[serde(default, alias = "isOpen")]
    pub open: bool,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl GestureSample {
    pub fn hand(open: bool, x: f32, y: f32) -> Self {
        Self {
            detected: true,
            open,
            x,
            y,
        }
    }

    pub fn lost() -> Self {
        Self::default()
    }
}

/// Last known scaled gesture position as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

/// Shared pointer slot written by the gesture path and read every frame.
///
/// Updates replace the whole sample, so a reader never observes a half
/// written value. Cloning shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct PointerCell {
    slot: Rc<Cell<PointerSample>>,
}

impl PointerCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> PointerSample {
        self.slot.get()
    }

    pub fn set(&self, sample: PointerSample) {
        self.slot.set(sample);
    }

    /// Marks the hand as gone while keeping the last position, so the
    /// renderer can ease the pointer influence out instead of snapping.
    pub fn deactivate(&self) {
        let mut sample = self.slot.get();
        sample.active = false;
        self.slot.set(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_slot() {
        let writer = PointerCell::new();
        let reader = writer.clone();
        writer.set(PointerSample {
            x: 0.5,
            y: -0.25,
            active: true,
        });
        assert_eq!(reader.get().x, 0.5);
        assert!(reader.get().active);
    }

    #[test]
    fn deactivate_keeps_position() {
        let cell = PointerCell::new();
        cell.set(PointerSample {
            x: 1.2,
            y: 0.4,
            active: true,
        });
        cell.deactivate();
        assert_eq!(
            cell.get(),
            PointerSample {
                x: 1.2,
                y: 0.4,
                active: false
            }
        );
    }

    #[test]
    fn gesture_lines_parse_with_missing_fields() {
        let lost: GestureSample = serde_json::from_str(r#"{"detected":false}"#).unwrap();
        assert_eq!(lost, GestureSample::lost());
        let hand: GestureSample =
            serde_json::from_str(r#"{"detected":true,"open":true,"x":0.1,"y":0.2}"#).unwrap();
        assert_eq!(hand, GestureSample::hand(true, 0.1, 0.2));
        let tracker: GestureSample =
            serde_json::from_str(r#"{"isDetected":true,"isOpen":false,"x":-0.4,"y":0.0}"#)
                .unwrap();
        assert_eq!(tracker, GestureSample::hand(false, -0.4, 0.0));
    }
}
