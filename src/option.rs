//! Editor configuration.

use crate::{
    callback::OnNotice,
    surface::{
        SurfaceStyle, DEFAULT_BACKGROUND, DEFAULT_INK, DEFAULT_MAX_SIZE, DEFAULT_MIN_STROKE_WIDTH,
        DEFAULT_STROKE_WIDTH_DIVISOR,
    },
};

/// Options for creating a new [`EditorSession`](crate::EditorSession).
#[derive(Clone, Debug, Default, bon::Builder)]
pub struct EditorOptions {
    /// RGBA color of the ink. Defaults to `#222`.
    pub ink_color: Option<[u8; 4]>,
    /// RGBA color the surface is cleared to. Defaults to white.
    pub background_color: Option<[u8; 4]>,
    /// Lower bound of the stroke width in pixels. Defaults to 2.
    pub min_stroke_width: Option<f64>,
    /// The stroke width is the surface edge divided by this. Defaults to 160.
    pub stroke_width_divisor: Option<f64>,
    /// Largest surface edge in pixels. Larger sizes fail to resize. Defaults to 4096.
    pub max_surface_size: Option<u32>,
    /// Callback for user-visible notices, such as a failed save.
    #[builder(into)]
    pub on_notice: Option<OnNotice>,
}

impl EditorOptions {
    /// The surface style these options describe, with defaults filled in.
    pub fn surface_style(&self) -> SurfaceStyle {
        SurfaceStyle {
            ink: self.ink_color.unwrap_or(DEFAULT_INK),
            background: self.background_color.unwrap_or(DEFAULT_BACKGROUND),
            min_stroke_width: self
                .min_stroke_width
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(DEFAULT_MIN_STROKE_WIDTH),
            stroke_width_divisor: self
                .stroke_width_divisor
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(DEFAULT_STROKE_WIDTH_DIVISOR),
            max_size: self.max_surface_size.unwrap_or(DEFAULT_MAX_SIZE),
        }
    }
}
