//! Note persistence and canvas-state synchronization for a handwritten
//! sketch and annotation notebook.
//!
//! A note is a square freehand drawing, a set of text fragments placed on
//! top of it and a list of tags. [`EditorSession`] loads a note from a
//! [`NoteStore`] into a [`RasterSurface`] and an [`AnnotationLayer`], routes
//! pointer input to them and writes the note back as one record.
//!
//! Fragment positions are stored as fractions of the surface edge, so a
//! note drawn on a small screen reopens in proportion on a large one.
//!
//! In the browser, enable the `wasm-js` feature (on by default) for the
//! IndexedDB backed `IdbStore` and the canvas bindings in `dom`.
//!
//! # Usage
//! ```
//! use sketch_memo::{EditorOptions, EditorSession, MemoryStore, Point, PointerInput};
//!
//! # futures::executor::block_on(async {
//! let mut session = EditorSession::new(MemoryStore::new(), EditorOptions::default());
//! session.attach_surface(300).unwrap();
//!
//! session.pointer(PointerInput::Down { at: Point::new(10.0, 10.0), primary: true }).unwrap();
//! session.pointer(PointerInput::Move { at: Point::new(120.0, 80.0) }).unwrap();
//! session.pointer(PointerInput::Up).unwrap();
//!
//! session.add_tags("ideas, todo");
//! let id = session.save().await.unwrap();
//! assert_eq!(session.active_id(), Some(id));
//! # });
//! ```

pub mod annotation;
pub mod note;
pub mod option;
pub mod session;
pub mod store;
pub mod surface;
pub mod tags;
mod util;

#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub mod dom;

pub use util::callback;

pub use annotation::{AnnotationError, AnnotationLayer, Fragment, FragmentId, PlacementMode};
pub use note::{Note, NoteId, TextFragment};
pub use option::EditorOptions;
pub use session::{EditorError, EditorSession, PointerOutcome};
pub use store::{MemoryStore, NoteStore, StoreError};
pub use surface::{Point, PointerInput, RasterSurface, SurfaceError};
pub use tags::{distinct_tags, filter_by_tag, TagSet};

#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub use store::IdbStore;
