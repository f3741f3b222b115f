//! The editor session: load a note into the surfaces, edit it, save it back.
//!
//! An [`EditorSession`] owns everything one edit needs: the store handle,
//! the working [`Note`], the [`RasterSurface`], the [`AnnotationLayer`] and
//! the pointer state. Persistence methods borrow the session mutably across
//! their await point, so a session never has two store operations in flight.

use crate::{
    annotation::{AnnotationError, AnnotationLayer, FragmentId},
    callback::Notice,
    note::{Note, NoteId},
    option::EditorOptions,
    store::{NoteStore, StoreError},
    surface::{decode_data_url, InkState, Point, PointerInput, RasterSurface, SurfaceError},
    tags::TagSet,
};
use chrono::{DateTime, Utc};
use image::RgbaImage;

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// The error type for editor operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("The drawing surface is not attached")]
    SurfaceDetached,
}

#[cfg(feature = "wasm-js")]
impl From<EditorError> for wasm_bindgen::JsValue {
    fn from(err: EditorError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

/// What a [`PointerInput`] did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    StrokeStarted,
    /// A stroke segment was drawn; the surface needs a repaint.
    Inked,
    StrokeEnded,
    Placed(FragmentId),
    Dragged(FragmentId),
    DragEnded(FragmentId),
}

/// One open note being edited.
pub struct EditorSession<S: NoteStore> {
    store: S,
    options: EditorOptions,
    note: Note,
    active_id: Option<NoteId>,
    surface: Option<RasterSurface>,
    layer: AnnotationLayer,
    ink: InkState,
    needs_hydration: bool,
}

impl<S: NoteStore> EditorSession<S> {
    /// Creates a session editing a new, empty note. No surface is attached yet.
    pub fn new(store: S, options: EditorOptions) -> Self {
        Self {
            store,
            options,
            note: Note::new(),
            active_id: None,
            surface: None,
            layer: AnnotationLayer::default(),
            ink: InkState::default(),
            needs_hydration: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The working note. Its image and fragments are refreshed from the
    /// surfaces on every save.
    pub fn note(&self) -> &Note {
        &self.note
    }

    /// Id of the record this session writes to, once it has one.
    pub fn active_id(&self) -> Option<NoteId> {
        self.active_id
    }

    pub fn surface(&self) -> Option<&RasterSurface> {
        self.surface.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.layer
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationLayer {
        &mut self.layer
    }

    pub fn tags(&self) -> &TagSet {
        &self.note.tags
    }

    /// Adds comma-separated tags. Returns how many were new.
    pub fn add_tags(&mut self, input: &str) -> usize {
        self.note.tags.add_tokens(input)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.note.tags.remove(tag)
    }

    /// Signals that the drawing surface has been laid out at `size` pixels.
    ///
    /// The first call creates the surface and hydrates it with the note
    /// opened so far; later calls behave like [`resize_surface`](Self::resize_surface).
    ///
    /// If the stored raster of that note cannot be decoded, the surface is
    /// still attached, blank and with the note's fragments, and the decode
    /// error is returned.
    pub fn attach_surface(&mut self, size: u32) -> Result<(), EditorError> {
        if self.surface.is_some() {
            return self.resize_surface(size);
        }
        let surface = RasterSurface::new(size, self.options.surface_style())?;
        #[cfg(feature = "tracing")]
        debug!("Surface attached at {size}px");
        self.surface = Some(surface);
        self.layer.rescale(size);
        if self.needs_hydration {
            match decode_image(&self.note.image) {
                Ok(image) => self.hydrate(image),
                Err(e) => {
                    self.hydrate(None);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Resizes the attached surface and moves fragments proportionally.
    pub fn resize_surface(&mut self, size: u32) -> Result<(), EditorError> {
        let Some(surface) = self.surface.as_mut() else {
            return self.attach_surface(size);
        };
        surface.resize(size)?;
        self.layer.rescale(size);
        Ok(())
    }

    /// Loads the note to edit.
    ///
    /// `None` starts a new note with a cleared surface and no fragments.
    /// With an id, the record is fetched and, if the surface is attached,
    /// drawn into it right away; otherwise hydration waits for
    /// [`attach_surface`](Self::attach_surface). A failed fetch or decode
    /// leaves the session as it was.
    pub async fn open(&mut self, id: Option<NoteId>) -> Result<(), EditorError> {
        let Some(id) = id else {
            self.reset();
            return Ok(());
        };

        let mut note = match self.store.get(id).await {
            Ok(Some(note)) => note.normalized(),
            Ok(None) => return Err(EditorError::NoteNotFound(id)),
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!("Could not load note {id}: {e}");
                return Err(e.into());
            }
        };
        note.id = Some(id);

        let image = if self.surface.is_some() {
            Some(decode_image(&note.image)?)
        } else {
            None
        };

        self.note = note;
        self.active_id = Some(id);
        self.ink.release();
        match image {
            Some(image) => self.hydrate(image),
            None => {
                self.layer.clear();
                self.needs_hydration = true;
            }
        }
        #[cfg(feature = "tracing")]
        info!("Opened note {id}");
        Ok(())
    }

    /// Writes the note to the store as one record and returns its id.
    pub async fn save(&mut self) -> Result<NoteId, EditorError> {
        self.save_at(Utc::now()).await
    }

    /// Like [`save`](Self::save), stamping the record with `now`.
    ///
    /// The record is assembled from a copy of the working note. The session
    /// only takes it over, together with the id the store assigned, once the
    /// write has succeeded, so a failed save can simply be retried.
    pub async fn save_at(&mut self, now: DateTime<Utc>) -> Result<NoteId, EditorError> {
        let record = self.build_record(now)?;
        let id = match self.store.put(&record).await {
            Ok(id) => id,
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!("Could not save note: {e}");
                return Err(e.into());
            }
        };

        self.note = record;
        self.note.id = Some(id);
        self.active_id = Some(id);
        if let Some(surface) = self.surface.as_mut() {
            surface.commit();
        }
        #[cfg(feature = "tracing")]
        info!("Saved note {id}");
        Ok(id)
    }

    /// Deletes the stored record of this note and starts a new, empty one.
    ///
    /// Returns `false` without touching the store when the note was never
    /// saved.
    pub async fn delete(&mut self) -> Result<bool, EditorError> {
        let Some(id) = self.active_id else {
            #[cfg(feature = "tracing")]
            debug!("Nothing to delete for an unsaved note");
            return Ok(false);
        };
        if let Err(e) = self.store.delete(id).await {
            #[cfg(feature = "tracing")]
            error!("Could not delete note {id}: {e}");
            return Err(e.into());
        }
        self.reset();
        #[cfg(feature = "tracing")]
        info!("Deleted note {id}");
        Ok(true)
    }

    /// Arms fragment placement: the next tap places a fragment instead of inking.
    pub fn arm_fragment_placement(&mut self) {
        self.ink.release();
        self.layer.arm_placement();
    }

    /// Starts dragging a fragment grabbed at `at`. Subsequent moves anywhere
    /// are routed to it by [`pointer`](Self::pointer) until release.
    pub fn begin_fragment_drag(&mut self, id: FragmentId, at: Point) -> Result<(), EditorError> {
        self.ink.release();
        self.layer.begin_drag(id, at)?;
        Ok(())
    }

    pub fn set_fragment_text(
        &mut self,
        id: FragmentId,
        value: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.layer.set_value(id, value)?;
        Ok(())
    }

    pub fn remove_fragment(&mut self, id: FragmentId) -> Result<(), EditorError> {
        self.layer.remove_fragment(id)?;
        Ok(())
    }

    /// Routes one pointer or touch input.
    ///
    /// A fragment drag takes every move until release. Otherwise a primary
    /// press either places a fragment (in placement mode) or starts a
    /// stroke, and moves extend the stroke segment by segment.
    pub fn pointer(&mut self, input: PointerInput) -> Result<PointerOutcome, EditorError> {
        match input {
            PointerInput::Down { at, primary } => {
                if !primary || self.layer.dragging().is_some() {
                    return Ok(PointerOutcome::Ignored);
                }
                if self.layer.is_placing() {
                    let id = self.layer.place_at_tap(at)?;
                    return Ok(PointerOutcome::Placed(id));
                }
                if self.surface.is_none() {
                    return Ok(PointerOutcome::Ignored);
                }
                self.ink.press(at);
                Ok(PointerOutcome::StrokeStarted)
            }
            PointerInput::Move { at } => {
                if let Some(id) = self.layer.dragging() {
                    self.layer.drag_to(at);
                    return Ok(PointerOutcome::Dragged(id));
                }
                match (self.ink.advance(at), self.surface.as_mut()) {
                    (Some((from, to)), Some(surface)) => {
                        surface.stroke_segment(from, to);
                        Ok(PointerOutcome::Inked)
                    }
                    _ => Ok(PointerOutcome::Ignored),
                }
            }
            PointerInput::Up => {
                if let Some(id) = self.layer.end_drag() {
                    return Ok(PointerOutcome::DragEnded(id));
                }
                Ok(self.end_stroke())
            }
            PointerInput::Leave => Ok(self.end_stroke()),
        }
    }

    /// Logs `err` and passes it to the notice callback, if any.
    pub fn report(&self, err: &EditorError) {
        #[cfg(feature = "tracing")]
        error!("{err}");
        self.notify(Notice::error(err.to_string()));
    }

    pub fn notify(&self, notice: Notice) {
        if let Some(on_notice) = &self.options.on_notice {
            on_notice.call(notice);
        }
    }

    fn end_stroke(&mut self) -> PointerOutcome {
        if self.ink.is_drawing() {
            self.ink.release();
            PointerOutcome::StrokeEnded
        } else {
            PointerOutcome::Ignored
        }
    }

    fn build_record(&self, now: DateTime<Utc>) -> Result<Note, EditorError> {
        let surface = self.surface.as_ref().ok_or(EditorError::SurfaceDetached)?;
        let mut record = self.note.clone();
        record.id = self.active_id;
        record.image = surface.to_raster_encoding()?;
        record.texts = self.layer.serialize(surface.size());
        record.legacy_text = None;
        record.stamp(now);
        Ok(record)
    }

    fn hydrate(&mut self, image: Option<RgbaImage>) {
        let Some(surface) = self.surface.as_mut() else {
            self.needs_hydration = true;
            return;
        };
        surface.clear();
        if let Some(image) = image {
            surface.load_image(image);
        }
        self.layer.hydrate(&self.note.texts, surface.size());
        self.needs_hydration = false;
    }

    fn reset(&mut self) {
        self.note = Note::new();
        self.active_id = None;
        self.ink.release();
        self.layer.clear();
        self.needs_hydration = false;
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }
}

fn decode_image(data: &str) -> Result<Option<RgbaImage>, SurfaceError> {
    if data.trim().is_empty() {
        return Ok(None);
    }
    match decode_data_url(data) {
        Ok(image) => Ok(Some(image)),
        Err(e) => {
            #[cfg(feature = "tracing")]
            warn!("Could not decode the stored raster: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        annotation::PlacementMode,
        callback::NoticeLevel,
        note::TextFragment,
        store::MemoryStore,
    };
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn session(store: &MemoryStore) -> EditorSession<MemoryStore> {
        EditorSession::new(store.clone(), EditorOptions::default())
    }

    fn at(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn time(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
    }

    fn draw(session: &mut EditorSession<MemoryStore>, points: &[Point]) {
        session
            .pointer(PointerInput::Down {
                at: points[0],
                primary: true,
            })
            .unwrap();
        for point in &points[1..] {
            session.pointer(PointerInput::Move { at: *point }).unwrap();
        }
        session.pointer(PointerInput::Up).unwrap();
    }

    #[tokio::test]
    async fn test_first_save_assigns_id_and_second_updates() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(200).unwrap();

        let id = session.save_at(time(1)).await.unwrap();
        assert_eq!(session.active_id(), Some(id));
        assert_eq!(session.note().id, Some(id));
        assert_eq!(store.len(), 1);

        session.add_tags("later");
        assert_eq!(session.save_at(time(2)).await.unwrap(), id);
        assert_eq!(store.len(), 1);

        let stored = session.store_mut().get(id).await.unwrap().unwrap();
        assert_eq!(stored.created_at.as_deref(), Some("2024-03-01T09:00:00.000Z"));
        assert_eq!(stored.updated_at.as_deref(), Some("2024-03-02T09:00:00.000Z"));
        assert!(stored.tags.contains("later"));
    }

    #[tokio::test]
    async fn test_fragment_survives_save_and_reopen() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(300).unwrap();

        session.arm_fragment_placement();
        let outcome = session
            .pointer(PointerInput::Down {
                at: at(20.0, 20.0),
                primary: true,
            })
            .unwrap();
        let PointerOutcome::Placed(fragment) = outcome else {
            panic!("expected a placed fragment, got {outcome:?}");
        };
        session.set_fragment_text(fragment, "remember").unwrap();
        let id = session.save().await.unwrap();

        let stored = session.note().texts[0].clone();
        assert!((stored.left - 0.0667).abs() < 1e-4);
        assert!((stored.top - 0.0667).abs() < 1e-4);

        let mut reopened = self::session(&store);
        reopened.attach_surface(300).unwrap();
        reopened.open(Some(id)).await.unwrap();

        let fragments = reopened.annotations().fragments();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].value(), "remember");
        assert!(fragments[0].position().distance_to(at(20.0, 20.0)) < 1e-9);
    }

    #[tokio::test]
    async fn test_open_before_attach_defers_hydration() {
        let store = MemoryStore::new();
        let mut writer = session(&store);
        writer.attach_surface(100).unwrap();
        writer
            .annotations_mut()
            .place_fragment(at(50.0, 50.0), "center")
            .unwrap();
        draw(&mut writer, &[at(10.0, 10.0), at(90.0, 90.0)]);
        let id = writer.save().await.unwrap();

        let mut reader = session(&store);
        reader.open(Some(id)).await.unwrap();
        assert!(reader.annotations().is_empty());
        assert!(reader.surface().is_none());

        reader.attach_surface(400).unwrap();
        let fragment = &reader.annotations().fragments()[0];
        assert_eq!(fragment.position(), at(200.0, 200.0));
        let surface = reader.surface().unwrap();
        assert!(surface.has_committed_image());
        assert!(!surface.is_blank());
    }

    #[tokio::test]
    async fn test_raster_round_trips_through_store() {
        let store = MemoryStore::new();
        let mut writer = session(&store);
        writer.attach_surface(160).unwrap();
        draw(
            &mut writer,
            &[at(10.0, 10.0), at(80.0, 40.0), at(150.0, 150.0)],
        );
        let drawn = writer.surface().unwrap().pixels().clone();
        let id = writer.save().await.unwrap();
        assert!(writer.note().image.starts_with("data:image/png;base64,"));

        let mut reader = session(&store);
        reader.attach_surface(160).unwrap();
        reader.open(Some(id)).await.unwrap();
        assert_eq!(reader.surface().unwrap().pixels(), &drawn);

        reader.resize_surface(90).unwrap();
        reader.resize_surface(160).unwrap();
        assert_eq!(reader.surface().unwrap().pixels(), &drawn);
    }

    #[tokio::test]
    async fn test_strokes_saved_over_opened_note_survive_resize() {
        let store = MemoryStore::new();
        let mut writer = session(&store);
        writer.attach_surface(200).unwrap();
        draw(&mut writer, &[at(20.0, 40.0), at(180.0, 40.0)]);
        let id = writer.save().await.unwrap();

        let mut editor = session(&store);
        editor.attach_surface(200).unwrap();
        editor.open(Some(id)).await.unwrap();
        draw(&mut editor, &[at(20.0, 150.0), at(180.0, 150.0)]);
        editor.save().await.unwrap();

        editor.resize_surface(300).unwrap();
        editor.resize_surface(200).unwrap();
        assert_eq!(
            *editor.surface().unwrap().pixels().get_pixel(140, 150),
            image::Rgba(crate::surface::DEFAULT_INK)
        );

        editor.save().await.unwrap();
        let stored = editor.store_mut().get(id).await.unwrap().unwrap();
        let raster = decode_data_url(&stored.image).unwrap();
        assert_eq!(*raster.get_pixel(140, 150), image::Rgba(crate::surface::DEFAULT_INK));
        assert_eq!(*raster.get_pixel(140, 40), image::Rgba(crate::surface::DEFAULT_INK));
    }

    #[tokio::test]
    async fn test_unreadable_raster_still_attaches_surface() {
        let store = MemoryStore::new();
        let mut broken = Note::new();
        broken.image = "data:image/png;base64,QUJD".to_string();
        broken.texts = vec![TextFragment::new("kept", 0.5, 0.25)];
        let id = store.clone().put(&broken).await.unwrap();

        let mut session = session(&store);
        session.open(Some(id)).await.unwrap();
        assert!(matches!(
            session.attach_surface(100),
            Err(EditorError::Surface(SurfaceError::Decode(_)))
        ));
        assert!(session.is_attached());
        assert!(session.surface().unwrap().is_blank());
        assert_eq!(session.annotations().fragments()[0].position(), at(50.0, 25.0));

        session.attach_surface(120).unwrap();
        assert_eq!(session.surface().unwrap().size(), 120);
    }

    #[tokio::test]
    async fn test_blank_note_saves_empty_image() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(100).unwrap();
        session.save().await.unwrap();
        assert_eq!(session.note().image, "");
    }

    #[tokio::test]
    async fn test_resize_keeps_fragment_centered() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(200).unwrap();
        let id = session
            .annotations_mut()
            .place_fragment(at(100.0, 100.0), "mid")
            .unwrap();

        session.resize_surface(500).unwrap();
        let fragment = session.annotations().fragment(id).unwrap();
        assert_eq!(fragment.position(), at(250.0, 250.0));
        assert_eq!(
            session.annotations().serialize(500),
            vec![TextFragment::new("mid", 0.5, 0.5)]
        );

        assert!(session.resize_surface(0).is_err());
        assert_eq!(session.surface().unwrap().size(), 500);
        assert_eq!(session.annotations().surface_size(), 500);
    }

    #[tokio::test]
    async fn test_delete_unsaved_note_is_noop() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        assert!(!session.delete().await.unwrap());

        store.set_offline(true);
        assert!(!session.delete().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_resets() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(100).unwrap();
        session.add_tags("x");
        session.save().await.unwrap();

        assert!(session.delete().await.unwrap());
        assert!(store.is_empty());
        assert_eq!(session.active_id(), None);
        assert!(session.tags().is_empty());

        session.save().await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_working_note_unchanged() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(100).unwrap();
        session.add_tags("draft");
        draw(&mut session, &[at(5.0, 5.0), at(60.0, 60.0)]);
        let before = session.note().clone();

        store.set_offline(true);
        let err = session.save().await.unwrap_err();
        assert!(matches!(err, EditorError::Store(StoreError::OperationFailed(_))));
        assert_eq!(session.note(), &before);
        assert_eq!(session.active_id(), None);
        assert!(session.note().created_at.is_none());

        store.set_offline(false);
        let id = session.save().await.unwrap();
        assert_eq!(session.active_id(), Some(id));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_open_leaves_session_unchanged() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(100).unwrap();
        session.add_tags("current");
        let id = session.save().await.unwrap();

        let err = session.open(Some(NoteId(42))).await.unwrap_err();
        assert!(matches!(err, EditorError::NoteNotFound(NoteId(42))));
        assert_eq!(session.active_id(), Some(id));
        assert!(session.tags().contains("current"));

        let mut broken = Note::new();
        broken.image = "data:image/png;base64,QUJD".to_string();
        let broken_id = session.store_mut().put(&broken).await.unwrap();
        assert!(matches!(
            session.open(Some(broken_id)).await,
            Err(EditorError::Surface(SurfaceError::Decode(_)))
        ));
        assert_eq!(session.active_id(), Some(id));
    }

    #[tokio::test]
    async fn test_open_none_starts_blank_note() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        session.attach_surface(100).unwrap();
        draw(&mut session, &[at(5.0, 5.0), at(60.0, 60.0)]);
        session
            .annotations_mut()
            .place_fragment(at(1.0, 1.0), "old")
            .unwrap();
        session.save().await.unwrap();

        session.open(None).await.unwrap();
        assert_eq!(session.active_id(), None);
        assert_eq!(session.note(), &Note::new());
        assert!(session.annotations().is_empty());
        assert!(session.surface().unwrap().is_blank());
    }

    #[tokio::test]
    async fn test_legacy_record_opens_with_text_fragment() {
        let store = MemoryStore::new();
        let legacy: Note = serde_json::from_str(r#"{"text": "from v1", "image": ""}"#).unwrap();
        let id = store.clone().put(&legacy).await.unwrap();

        let mut session = session(&store);
        session.attach_surface(100).unwrap();
        session.open(Some(id)).await.unwrap();
        assert_eq!(session.annotations().fragments()[0].value(), "from v1");
        assert_eq!(session.annotations().fragments()[0].position(), at(0.0, 0.0));
    }

    #[tokio::test]
    async fn test_ink_is_suppressed_while_placing() {
        let mut session = session(&MemoryStore::new());
        session.attach_surface(100).unwrap();

        draw(&mut session, &[at(10.0, 10.0), at(50.0, 50.0)]);
        assert!(!session.surface().unwrap().is_blank());

        session.open(None).await.unwrap();
        assert!(session.surface().unwrap().is_blank());
        session.arm_fragment_placement();
        assert_eq!(session.annotations().mode(), PlacementMode::Placing);
        let outcome = session
            .pointer(PointerInput::Down {
                at: at(10.0, 10.0),
                primary: true,
            })
            .unwrap();
        assert!(matches!(outcome, PointerOutcome::Placed(_)));
        assert_eq!(
            session.pointer(PointerInput::Move { at: at(50.0, 50.0) }).unwrap(),
            PointerOutcome::Ignored
        );
        assert!(session.surface().unwrap().is_blank());
        assert_eq!(session.annotations().mode(), PlacementMode::Normal);
    }

    #[test]
    fn test_pointer_state_machine() {
        let mut session = session(&MemoryStore::new());
        assert_eq!(
            session
                .pointer(PointerInput::Down {
                    at: at(1.0, 1.0),
                    primary: true
                })
                .unwrap(),
            PointerOutcome::Ignored
        );

        session.attach_surface(100).unwrap();
        assert_eq!(
            session
                .pointer(PointerInput::Down {
                    at: at(1.0, 1.0),
                    primary: false
                })
                .unwrap(),
            PointerOutcome::Ignored
        );
        assert_eq!(
            session
                .pointer(PointerInput::Down {
                    at: at(1.0, 1.0),
                    primary: true
                })
                .unwrap(),
            PointerOutcome::StrokeStarted
        );
        assert_eq!(
            session.pointer(PointerInput::Move { at: at(9.0, 9.0) }).unwrap(),
            PointerOutcome::Inked
        );
        assert_eq!(
            session.pointer(PointerInput::Leave).unwrap(),
            PointerOutcome::StrokeEnded
        );
        assert_eq!(
            session.pointer(PointerInput::Move { at: at(20.0, 20.0) }).unwrap(),
            PointerOutcome::Ignored
        );
        assert_eq!(
            session.pointer(PointerInput::Up).unwrap(),
            PointerOutcome::Ignored
        );
    }

    #[test]
    fn test_fragment_drag_is_tracked_globally() {
        let mut session = session(&MemoryStore::new());
        session.attach_surface(100).unwrap();
        let id = session
            .annotations_mut()
            .place_fragment(at(10.0, 10.0), "drag me")
            .unwrap();

        session.begin_fragment_drag(id, at(12.0, 12.0)).unwrap();
        // leaving the surface does not end a drag
        assert_eq!(
            session.pointer(PointerInput::Leave).unwrap(),
            PointerOutcome::Ignored
        );
        assert_eq!(
            session.pointer(PointerInput::Move { at: at(42.0, 72.0) }).unwrap(),
            PointerOutcome::Dragged(id)
        );
        assert_eq!(
            session.pointer(PointerInput::Up).unwrap(),
            PointerOutcome::DragEnded(id)
        );
        assert_eq!(
            session.annotations().fragment(id).unwrap().position(),
            at(40.0, 70.0)
        );
        assert!(session.surface().unwrap().is_blank());
    }

    #[test]
    fn test_report_invokes_notice_callback() {
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = notices.clone();
        let options = EditorOptions::builder()
            .on_notice(move |notice: Notice| sink.lock().push(notice))
            .build();
        let session = EditorSession::new(MemoryStore::new(), options);

        session.report(&EditorError::SurfaceDetached);
        let notices = notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "The drawing surface is not attached");
    }

    #[tokio::test]
    async fn test_save_requires_attached_surface() {
        let store = MemoryStore::new();
        let mut session = session(&store);
        assert!(matches!(
            session.save().await,
            Err(EditorError::SurfaceDetached)
        ));
        assert!(store.is_empty());
    }
}
