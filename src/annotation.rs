//! Draggable text fragments overlaid on the drawing surface.
//!
//! Fragments live in surface pixels while a note is being edited and are
//! persisted as fractions of the surface edge, so a note saved on a 300px
//! surface reopens in proportion on a 600px one.

use crate::{
    note::{clamp_fraction, TextFragment},
    surface::Point,
};

#[cfg(feature = "tracing")]
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnnotationError {
    #[error("Fragment creation failed: {0}")]
    FragmentCreationFailed(String),
    #[error("Unknown fragment: {0:?}")]
    UnknownFragment(FragmentId),
}

/// Identifier of a fragment within one [`AnnotationLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(u64);

/// Stacking order of a fragment. A fragment is raised while it is dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stacking {
    #[default]
    Resting,
    Raised,
}

/// Whether the next tap on the surface places a new fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    #[default]
    Normal,
    Placing,
}

/// A live text fragment, anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    id: FragmentId,
    value: String,
    position: Point,
    stacking: Stacking,
}

impl Fragment {
    pub fn id(&self) -> FragmentId {
        self.id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn stacking(&self) -> Stacking {
        self.stacking
    }

    /// Number of text lines, at least one. The fragment grows by this many rows.
    pub fn line_count(&self) -> usize {
        self.value.lines().count().max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    fragment: FragmentId,
    grab_dx: f64,
    grab_dy: f64,
}

/// The set of fragments of the note being edited.
#[derive(Debug, Clone, Default)]
pub struct AnnotationLayer {
    fragments: Vec<Fragment>,
    next_id: u64,
    surface_size: u32,
    mode: PlacementMode,
    drag: Option<Drag>,
    focused: Option<FragmentId>,
}

impl AnnotationLayer {
    /// Creates an empty layer over a surface of the given edge length.
    pub fn new(surface_size: u32) -> Self {
        Self {
            surface_size,
            ..Self::default()
        }
    }

    pub fn surface_size(&self) -> u32 {
        self.surface_size
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The fragment that currently receives text input.
    pub fn focused(&self) -> Option<FragmentId> {
        self.focused
    }

    pub fn focus(&mut self, id: FragmentId) -> Result<(), AnnotationError> {
        self.index_of(id)?;
        self.focused = Some(id);
        Ok(())
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn is_placing(&self) -> bool {
        self.mode == PlacementMode::Placing
    }

    /// Switches to placement mode: the next tap creates a fragment.
    pub fn arm_placement(&mut self) {
        self.mode = PlacementMode::Placing;
    }

    pub fn cancel_placement(&mut self) {
        self.mode = PlacementMode::Normal;
    }

    /// Handles the tap that ends placement mode by creating a fragment there.
    ///
    /// The layer returns to [`PlacementMode::Normal`] whether or not the
    /// fragment could be created.
    pub fn place_at_tap(&mut self, at: Point) -> Result<FragmentId, AnnotationError> {
        self.mode = PlacementMode::Normal;
        self.place_fragment(at, "")
    }

    /// Creates a fragment at `at` and focuses it.
    pub fn place_fragment(
        &mut self,
        at: Point,
        initial_value: impl Into<String>,
    ) -> Result<FragmentId, AnnotationError> {
        if self.surface_size == 0 {
            return Err(AnnotationError::FragmentCreationFailed(
                "surface is not attached".to_string(),
            ));
        }
        if !at.is_finite() || !self.contains(at) {
            return Err(AnnotationError::FragmentCreationFailed(format!(
                "({}, {}) is outside the {}px surface",
                at.x, at.y, self.surface_size
            )));
        }
        let id = self.insert(at, initial_value.into());
        self.focused = Some(id);
        #[cfg(feature = "tracing")]
        debug!("Placed fragment {id:?} at ({}, {})", at.x, at.y);
        Ok(id)
    }

    pub fn set_value(
        &mut self,
        id: FragmentId,
        value: impl Into<String>,
    ) -> Result<(), AnnotationError> {
        let idx = self.index_of(id)?;
        self.fragments[idx].value = value.into();
        Ok(())
    }

    pub fn remove_fragment(&mut self, id: FragmentId) -> Result<Fragment, AnnotationError> {
        let idx = self.index_of(id)?;
        if self.drag.is_some_and(|drag| drag.fragment == id) {
            self.drag = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        Ok(self.fragments.remove(idx))
    }

    /// Removes every fragment and resets placement and drag state.
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.mode = PlacementMode::Normal;
        self.drag = None;
        self.focused = None;
    }

    /// The fragment being dragged, if any.
    pub fn dragging(&self) -> Option<FragmentId> {
        self.drag.map(|drag| drag.fragment)
    }

    /// Starts dragging `id`, grabbed at pointer position `at`.
    ///
    /// The fragment is raised until [`end_drag`](Self::end_drag). Starting a
    /// drag while another one is active ends the previous one first.
    pub fn begin_drag(&mut self, id: FragmentId, at: Point) -> Result<(), AnnotationError> {
        let idx = self.index_of(id)?;
        self.end_drag();
        let fragment = &mut self.fragments[idx];
        fragment.stacking = Stacking::Raised;
        self.drag = Some(Drag {
            fragment: id,
            grab_dx: at.x - fragment.position.x,
            grab_dy: at.y - fragment.position.y,
        });
        Ok(())
    }

    /// Moves the dragged fragment so the grab point follows `at`.
    ///
    /// Returns `false` when no drag is active. The new position is clamped
    /// to the surface.
    pub fn drag_to(&mut self, at: Point) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        if !at.is_finite() {
            return true;
        }
        let max = f64::from(self.surface_size);
        let position = Point::new(
            (at.x - drag.grab_dx).clamp(0.0, max),
            (at.y - drag.grab_dy).clamp(0.0, max),
        );
        if let Ok(idx) = self.index_of(drag.fragment) {
            self.fragments[idx].position = position;
        }
        true
    }

    /// Ends the active drag and lowers the fragment back to resting order.
    pub fn end_drag(&mut self) -> Option<FragmentId> {
        let drag = self.drag.take()?;
        if let Ok(idx) = self.index_of(drag.fragment) {
            self.fragments[idx].stacking = Stacking::Resting;
        }
        Some(drag.fragment)
    }

    /// Rescales every fragment position to a new surface edge length.
    pub fn rescale(&mut self, new_size: u32) {
        if self.surface_size != 0 && new_size != self.surface_size {
            let factor = f64::from(new_size) / f64::from(self.surface_size);
            for fragment in &mut self.fragments {
                fragment.position.x *= factor;
                fragment.position.y *= factor;
            }
            if let Some(drag) = &mut self.drag {
                drag.grab_dx *= factor;
                drag.grab_dy *= factor;
            }
        }
        self.surface_size = new_size;
    }

    /// Converts every live fragment to its persisted form, dividing its
    /// position by `surface_size`.
    pub fn serialize(&self, surface_size: u32) -> Vec<TextFragment> {
        let size = f64::from(surface_size);
        self.fragments
            .iter()
            .map(|fragment| TextFragment {
                value: fragment.value.clone(),
                left: clamp_fraction(fragment.position.x / size),
                top: clamp_fraction(fragment.position.y / size),
            })
            .collect()
    }

    /// Replaces the layer content with `fragments`, multiplying their
    /// fractional positions by `surface_size`.
    pub fn hydrate(&mut self, fragments: &[TextFragment], surface_size: u32) {
        self.clear();
        self.surface_size = surface_size;
        let size = f64::from(surface_size);
        for fragment in fragments {
            let at = Point::new(
                clamp_fraction(fragment.left) * size,
                clamp_fraction(fragment.top) * size,
            );
            self.insert(at, fragment.value.clone());
        }
    }

    fn insert(&mut self, at: Point, value: String) -> FragmentId {
        let id = FragmentId(self.next_id);
        self.next_id += 1;
        self.fragments.push(Fragment {
            id,
            value,
            position: at,
            stacking: Stacking::Resting,
        });
        id
    }

    fn contains(&self, at: Point) -> bool {
        let max = f64::from(self.surface_size);
        (0.0..=max).contains(&at.x) && (0.0..=max).contains(&at.y)
    }

    fn index_of(&self, id: FragmentId) -> Result<usize, AnnotationError> {
        self.fragments
            .iter()
            .position(|f| f.id == id)
            .ok_or(AnnotationError::UnknownFragment(id))
    }
}
