//! Pointer input and the freehand ink state machine.

use super::Point;

/// Pointer or touch input in surface-local coordinates.
///
/// Touch input maps onto the same variants: the first touch of a
/// `touchstart` is a primary [`PointerInput::Down`], `touchmove` is a
/// [`PointerInput::Move`] and `touchend` is a [`PointerInput::Up`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { at: Point, primary: bool },
    Move { at: Point },
    Up,
    Leave,
}

/// Freehand capture state: `Idle` until a primary press, then `Drawing`
/// until release or leave.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InkState {
    #[default]
    Idle,
    Drawing {
        last: Point,
    },
}

impl InkState {
    pub fn is_drawing(&self) -> bool {
        matches!(self, InkState::Drawing { .. })
    }

    /// Starts a stroke at `at`.
    pub fn press(&mut self, at: Point) {
        *self = InkState::Drawing { last: at };
    }

    /// Advances the stroke to `at` and returns the segment to draw, if drawing.
    pub fn advance(&mut self, at: Point) -> Option<(Point, Point)> {
        match self {
            InkState::Drawing { last } => {
                let from = std::mem::replace(last, at);
                Some((from, at))
            }
            InkState::Idle => None,
        }
    }

    pub fn release(&mut self) {
        *self = InkState::Idle;
    }
}
