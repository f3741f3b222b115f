//! The persisted note record and its normalization rules.

use crate::tags::TagSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown in the list for notes without any text.
pub const HANDWRITING_ONLY_LABEL: &str = "[handwriting only]";

/// Identifier assigned by the store on the first successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NoteId {
    fn from(value: u64) -> Self {
        NoteId(value)
    }
}

/// A text fragment as persisted: its value and its position as a fraction
/// of the surface edge at the time it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
}

impl TextFragment {
    pub fn new(value: impl Into<String>, left: f64, top: f64) -> Self {
        Self {
            value: value.into(),
            left,
            top,
        }
    }

    /// Returns a copy with both coordinates clamped into `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            value: self.value.clone(),
            left: clamp_fraction(self.left),
            top: clamp_fraction(self.top),
        }
    }
}

/// Clamps a surface-relative coordinate into `[0, 1]`. Non-finite values map to `0`.
pub fn clamp_fraction(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// One persisted note.
///
/// `image`, `texts`, `tags` and both timestamps are always written together
/// as a single record. `id` is omitted from the serialized form until the
/// store has assigned one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,
    /// Raster encoding of the drawing surface, empty when nothing was drawn.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub texts: Vec<TextFragment>,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Single free-text field written by older versions. Read, never written.
    #[serde(default, rename = "text", skip_serializing)]
    pub(crate) legacy_text: Option<String>,
}

impl Note {
    /// Creates an empty, unsaved note.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the load-time rules to a record fetched from the store.
    ///
    /// A legacy `text` field becomes a fragment in the top-left corner when
    /// the record has no fragments of its own, and every fragment coordinate
    /// is clamped into `[0, 1]`.
    pub fn normalized(mut self) -> Self {
        if let Some(text) = self.legacy_text.take() {
            if self.texts.is_empty() && !text.trim().is_empty() {
                self.texts.push(TextFragment::new(text, 0.0, 0.0));
            }
        }
        self.texts = self.texts.iter().map(TextFragment::clamped).collect();
        self
    }

    /// Stamps the save timestamps: `createdAt` only once, `updatedAt` always.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        let now = format_timestamp(now);
        if self.created_at.is_none() {
            self.created_at = Some(now.clone());
        }
        self.updated_at = Some(now);
    }

    /// Text shown for this note in the list view.
    pub fn list_label(&self) -> String {
        let text = self
            .texts
            .iter()
            .map(|fragment| fragment.value.trim())
            .find(|value| !value.is_empty())
            .or_else(|| {
                self.legacy_text
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
            })
            .unwrap_or(HANDWRITING_ONLY_LABEL);

        if self.tags.is_empty() {
            text.to_string()
        } else {
            format!("{} [{}]", text, self.tags.as_slice().join(","))
        }
    }
}

/// Formats a timestamp the way records store it: RFC 3339, UTC, milliseconds.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
