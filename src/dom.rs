//! Browser bindings: paint a [`RasterSurface`] into a `<canvas>` and feed
//! mouse and touch events into an [`EditorSession`].

use crate::{
    callback::Notice,
    note::NoteId,
    session::{EditorError, EditorSession, PointerOutcome},
    store::NoteStore,
    surface::{Point, PointerInput, RasterSurface},
};
use futures::lock::Mutex;
use gloo_events::{EventListener, EventListenerOptions};
use gloo_utils::{document, window};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Event, HtmlCanvasElement, ImageData, MouseEvent, TouchEvent};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// A `<canvas>` element showing a [`RasterSurface`].
#[derive(Debug, Clone)]
pub struct CanvasView {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasView {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context: js_sys::Object = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?;
        let context = context.dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, context })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Edge length of the laid out canvas in CSS pixels: the smaller of its
    /// client width and height.
    pub fn layout_size(&self) -> u32 {
        let edge = self.canvas.client_width().min(self.canvas.client_height());
        u32::try_from(edge).unwrap_or(0)
    }

    /// Copies the surface pixels into the canvas, resizing its backing store
    /// to match.
    pub fn paint(&self, surface: &RasterSurface) -> Result<(), JsValue> {
        let size = surface.size();
        if self.canvas.width() != size {
            self.canvas.set_width(size);
        }
        if self.canvas.height() != size {
            self.canvas.set_height(size);
        }
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(surface.pixels().as_raw().as_slice()),
            size,
            size,
        )?;
        self.context.put_image_data(&data, 0.0, 0.0)
    }

    /// Converts viewport coordinates to surface pixels.
    pub fn local_point(&self, client_x: i32, client_y: i32) -> Point {
        let rect = self.canvas.get_bounding_client_rect();
        let scale_x = if rect.width() > 0.0 {
            f64::from(self.canvas.width()) / rect.width()
        } else {
            1.0
        };
        let scale_y = if rect.height() > 0.0 {
            f64::from(self.canvas.height()) / rect.height()
        } else {
            1.0
        };
        Point::new(
            (f64::from(client_x) - rect.left()) * scale_x,
            (f64::from(client_y) - rect.top()) * scale_y,
        )
    }

    /// Maps a `mousedown`, `mousemove`, `mouseup` or `mouseleave` event.
    pub fn mouse_input(&self, event: &MouseEvent) -> Option<PointerInput> {
        let at = || self.local_point(event.client_x(), event.client_y());
        match event.type_().as_str() {
            "mousedown" => Some(PointerInput::Down {
                at: at(),
                primary: event.button() == 0,
            }),
            "mousemove" => Some(PointerInput::Move { at: at() }),
            "mouseup" => Some(PointerInput::Up),
            "mouseleave" => Some(PointerInput::Leave),
            _ => None,
        }
    }

    /// Maps a `touchstart`, `touchmove`, `touchend` or `touchcancel` event.
    /// Only the first touch point is followed.
    pub fn touch_input(&self, event: &TouchEvent) -> Option<PointerInput> {
        let first = || event.touches().get(0);
        match event.type_().as_str() {
            "touchstart" => first().map(|touch| PointerInput::Down {
                at: self.local_point(touch.client_x(), touch.client_y()),
                primary: true,
            }),
            "touchmove" => first().map(|touch| PointerInput::Move {
                at: self.local_point(touch.client_x(), touch.client_y()),
            }),
            "touchend" | "touchcancel" => Some(PointerInput::Up),
            _ => None,
        }
    }

    fn input(&self, event: &Event) -> Option<PointerInput> {
        if let Some(event) = event.dyn_ref::<TouchEvent>() {
            return self.touch_input(event);
        }
        event
            .dyn_ref::<MouseEvent>()
            .and_then(|event| self.mouse_input(event))
    }
}

type SharedSession<S> = Rc<Mutex<EditorSession<S>>>;

/// Input that arrived while a store call held the session.
///
/// Presses and moves are dropped, but the latest release and a pending
/// layout change are kept and applied once the session is free again, so
/// a stroke never stays active after the button is up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Deferred {
    release: Option<PointerInput>,
    resize: bool,
}

impl Deferred {
    fn defer_pointer(&mut self, input: PointerInput) {
        match input {
            PointerInput::Up => self.release = Some(PointerInput::Up),
            PointerInput::Leave if self.release.is_none() => {
                self.release = Some(PointerInput::Leave)
            }
            _ => {}
        }
    }
}

type SharedDeferred = Rc<Cell<Deferred>>;

/// Connects an [`EditorSession`] to a canvas.
///
/// Presses and leaves are taken from the canvas, moves and releases from
/// the whole document so strokes and drags continue outside the canvas
/// bounds. Every listener is registered once, on [`attach`](Self::attach),
/// and removed when the host is dropped.
///
/// While a save, open or delete is awaiting the store, presses and moves
/// are dropped; releases and window resizes are applied when it completes.
pub struct EditorHost<S: NoteStore + 'static> {
    session: SharedSession<S>,
    deferred: SharedDeferred,
    view: CanvasView,
    _listeners: Vec<EventListener>,
}

impl<S: NoteStore + 'static> EditorHost<S> {
    /// Attaches `session` to `canvas`, which must already be laid out.
    pub fn attach(session: EditorSession<S>, canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let view = CanvasView::new(canvas)?;
        let session = Rc::new(Mutex::new(session));
        {
            let mut guard = session
                .try_lock()
                .ok_or_else(|| JsValue::from_str("editor session is busy"))?;
            guard.attach_surface(view.layout_size())?;
            if let Some(surface) = guard.surface() {
                view.paint(surface)?;
            }
        }

        let canvas_target = view.canvas().clone();
        let document = document();
        let window = window();
        let deferred = SharedDeferred::default();

        let mut listeners = Vec::new();
        for event_type in ["mousedown", "mouseleave", "touchstart"] {
            listeners.push(Self::pointer_listener(
                &canvas_target,
                event_type,
                &session,
                &deferred,
                &view,
            ));
        }
        for event_type in ["mousemove", "mouseup", "touchmove", "touchend", "touchcancel"] {
            listeners.push(Self::pointer_listener(
                &document, event_type, &session, &deferred, &view,
            ));
        }
        listeners.push(Self::resize_listener(&window, &session, &deferred, &view));

        #[cfg(feature = "tracing")]
        debug!("Editor attached with {} listeners", listeners.len());
        Ok(Self {
            session,
            deferred,
            view,
            _listeners: listeners,
        })
    }

    /// The shared session, for UI code that edits tags or fragments.
    pub fn session(&self) -> SharedSession<S> {
        self.session.clone()
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    /// Saves the note and notifies the user of the outcome.
    pub async fn save(&self) -> Result<NoteId, EditorError> {
        let mut session = self.session.lock().await;
        let result = session.save().await;
        match &result {
            Ok(_) => session.notify(Notice::info("Saved")),
            Err(e) => session.report(e),
        }
        apply_deferred(&self.view, &mut session, &self.deferred);
        result
    }

    /// Opens a stored note, or a new one for `None`, and repaints.
    pub async fn open(&self, id: Option<NoteId>) -> Result<(), EditorError> {
        let mut session = self.session.lock().await;
        let result = session.open(id).await;
        if let Err(e) = &result {
            session.report(e);
        }
        apply_deferred(&self.view, &mut session, &self.deferred);
        self.repaint(&session);
        result
    }

    /// Deletes the stored note and repaints the fresh one. Returns `false`
    /// when the note was never saved.
    pub async fn delete(&self) -> Result<bool, EditorError> {
        let mut session = self.session.lock().await;
        let result = session.delete().await;
        match &result {
            Ok(true) => session.notify(Notice::info("Deleted")),
            Ok(false) => {}
            Err(e) => session.report(e),
        }
        apply_deferred(&self.view, &mut session, &self.deferred);
        self.repaint(&session);
        result
    }

    fn repaint(&self, session: &EditorSession<S>) {
        paint_or_warn(&self.view, session);
    }

    fn pointer_listener(
        target: &web_sys::EventTarget,
        event_type: &'static str,
        session: &SharedSession<S>,
        deferred: &SharedDeferred,
        view: &CanvasView,
    ) -> EventListener {
        let session = session.clone();
        let deferred = deferred.clone();
        let view = view.clone();
        let options = EventListenerOptions::enable_prevent_default();
        EventListener::new_with_options(target, event_type, options, move |event| {
            let Some(input) = view.input(event) else {
                return;
            };
            let Some(mut session) = session.try_lock() else {
                let mut pending = deferred.get();
                pending.defer_pointer(input);
                deferred.set(pending);
                return;
            };
            apply_deferred(&view, &mut session, &deferred);
            match session.pointer(input) {
                Ok(PointerOutcome::Ignored) => {}
                Ok(outcome) => {
                    // keep touch strokes from scrolling the page
                    if matches!(input, PointerInput::Down { .. } | PointerInput::Move { .. }) {
                        event.prevent_default();
                    }
                    if outcome == PointerOutcome::Inked {
                        paint_or_warn(&view, &*session);
                    }
                }
                Err(e) => session.report(&e),
            }
        })
    }

    fn resize_listener(
        target: &web_sys::EventTarget,
        session: &SharedSession<S>,
        deferred: &SharedDeferred,
        view: &CanvasView,
    ) -> EventListener {
        let session = session.clone();
        let deferred = deferred.clone();
        let view = view.clone();
        EventListener::new(target, "resize", move |_| {
            let Some(mut session) = session.try_lock() else {
                let mut pending = deferred.get();
                pending.resize = true;
                deferred.set(pending);
                return;
            };
            apply_deferred(&view, &mut session, &deferred);
            resize_to_layout(&view, &mut session);
        })
    }
}

/// Applies input deferred while the session was locked.
fn apply_deferred<S: NoteStore>(
    view: &CanvasView,
    session: &mut EditorSession<S>,
    deferred: &Cell<Deferred>,
) {
    let pending = deferred.take();
    if let Some(input) = pending.release {
        if let Err(e) = session.pointer(input) {
            session.report(&e);
        }
    }
    if pending.resize {
        resize_to_layout(view, session);
    }
}

fn resize_to_layout<S: NoteStore>(view: &CanvasView, session: &mut EditorSession<S>) {
    let size = view.layout_size();
    if session.surface().is_some_and(|s| s.size() == size) {
        return;
    }
    match session.resize_surface(size) {
        Ok(()) => paint_or_warn(view, session),
        Err(e) => session.report(&e),
    }
}

fn paint_or_warn<S: NoteStore>(view: &CanvasView, session: &EditorSession<S>) {
    let Some(surface) = session.surface() else {
        return;
    };
    if let Err(_e) = view.paint(surface) {
        #[cfg(feature = "tracing")]
        warn!("Could not paint the surface: {_e:?}");
    }
}
