//! The square raster drawing surface.
//!
//! [`RasterSurface`] owns the pixels of the sketch. Strokes are rasterized
//! immediately, so the surface never keeps vector paths. A raster loaded
//! from a record, or the surface content at the last save, is kept as the
//! committed image and redrawn, scaled, every time the surface is resized.

use image::{imageops, Rgba, RgbaImage};

pub mod encoding;
pub mod ink;

pub use encoding::{decode_data_url, encode_png_data_url};
pub use ink::{InkState, PointerInput};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Default ink color (`#222`).
pub const DEFAULT_INK: [u8; 4] = [0x22, 0x22, 0x22, 0xff];
/// Default background color (`#fff`).
pub const DEFAULT_BACKGROUND: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
pub const DEFAULT_MIN_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_STROKE_WIDTH_DIVISOR: f64 = 160.0;
/// Largest edge length a surface may be resized to.
pub const DEFAULT_MAX_SIZE: u32 = 4096;

/// A position in surface-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Distance from this point to the segment `a`-`b`.
    pub fn distance_to_segment(&self, a: Point, b: Point) -> f64 {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.distance_to(a);
        }
        let t = (((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        self.distance_to(Point::new(a.x + dx * t, a.y + dy * t))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceError {
    #[error("Invalid surface size: {0}")]
    InvalidSize(u32),
    #[error("Surface resize failed: {0}")]
    ResizeFailed(String),
    #[error("Raster encode error: {0}")]
    Encode(String),
    #[error("Raster decode error: {0}")]
    Decode(String),
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Colors and stroke sizing of a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceStyle {
    pub ink: [u8; 4],
    pub background: [u8; 4],
    pub min_stroke_width: f64,
    pub stroke_width_divisor: f64,
    pub max_size: u32,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            ink: DEFAULT_INK,
            background: DEFAULT_BACKGROUND,
            min_stroke_width: DEFAULT_MIN_STROKE_WIDTH,
            stroke_width_divisor: DEFAULT_STROKE_WIDTH_DIVISOR,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// An N×N drawing surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    size: u32,
    pixels: RgbaImage,
    committed: Option<RgbaImage>,
    blank: bool,
    /// Strokes were drawn since the committed image was set.
    dirty: bool,
    style: SurfaceStyle,
}

impl RasterSurface {
    /// Creates a cleared surface with the given edge length.
    pub fn new(size: u32, style: SurfaceStyle) -> Result<Self, SurfaceError> {
        check_size(size, &style)?;
        Ok(Self {
            size,
            pixels: RgbaImage::from_pixel(size, size, Rgba(style.background)),
            committed: None,
            blank: true,
            dirty: false,
            style,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn style(&self) -> &SurfaceStyle {
        &self.style
    }

    /// Returns `true` while nothing was drawn and no raster was loaded.
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn has_committed_image(&self) -> bool {
        self.committed.is_some()
    }

    /// Returns `true` if strokes were drawn since the last commit or load.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Makes the current pixels the committed image, e.g. after a save.
    pub fn commit(&mut self) {
        self.committed = if self.blank {
            None
        } else {
            Some(self.pixels.clone())
        };
        self.dirty = false;
    }

    /// Stroke width for the current size: `max(min, size / divisor)`.
    pub fn stroke_width(&self) -> f64 {
        (f64::from(self.size) / self.style.stroke_width_divisor).max(self.style.min_stroke_width)
    }

    /// Fills the surface with the background and forgets any loaded raster.
    pub fn clear(&mut self) {
        self.fill_background();
        self.committed = None;
        self.blank = true;
        self.dirty = false;
    }

    /// Changes the edge length.
    ///
    /// The current pixels are snapshotted before the dimension changes. A
    /// committed raster is then redrawn scaled to the new size; strokes drawn
    /// over it are first folded into it from the snapshot. Without a
    /// committed raster the snapshot is put back unscaled at the origin.
    pub fn resize(&mut self, new_size: u32) -> Result<(), SurfaceError> {
        if new_size == self.size {
            return Ok(());
        }
        if let Err(_e) = check_size(new_size, &self.style) {
            #[cfg(feature = "tracing")]
            warn!("Refusing to resize surface from {} to {new_size}: {_e}", self.size);
            return Err(_e);
        }

        let snapshot = std::mem::replace(
            &mut self.pixels,
            RgbaImage::from_pixel(new_size, new_size, Rgba(self.style.background)),
        );
        #[cfg(feature = "tracing")]
        debug!("Resizing surface from {} to {new_size}", self.size);
        self.size = new_size;

        if self.committed.is_some() {
            if self.dirty {
                self.committed = Some(snapshot);
                self.dirty = false;
            }
            self.draw_committed();
        } else {
            imageops::replace(&mut self.pixels, &snapshot, 0, 0);
        }
        if self.pixels.dimensions() != (new_size, new_size) {
            return Err(SurfaceError::ResizeFailed(format!(
                "surface is {:?} after resizing to {new_size}",
                self.pixels.dimensions()
            )));
        }
        Ok(())
    }

    /// Draws one segment of a freehand stroke with round caps.
    ///
    /// Consecutive segments sharing end points produce round joins.
    pub fn stroke_segment(&mut self, from: Point, to: Point) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let half = self.stroke_width() / 2.0;
        let last = i64::from(self.size) - 1;
        let x0 = ((from.x.min(to.x) - half).floor() as i64).max(0);
        let x1 = ((from.x.max(to.x) + half).ceil() as i64).min(last);
        let y0 = ((from.y.min(to.y) - half).floor() as i64).max(0);
        let y1 = ((from.y.max(to.y) + half).ceil() as i64).min(last);

        let ink = Rgba(self.style.ink);
        let mut painted = false;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let center = Point::new(px as f64 + 0.5, py as f64 + 0.5);
                if center.distance_to_segment(from, to) <= half {
                    self.pixels.put_pixel(px as u32, py as u32, ink);
                    painted = true;
                }
            }
        }
        if painted {
            self.blank = false;
            self.dirty = true;
        }
    }

    /// Encodes the full surface, or returns an empty string if it is blank.
    pub fn to_raster_encoding(&self) -> Result<String, SurfaceError> {
        if self.blank {
            return Ok(String::new());
        }
        encode_png_data_url(&self.pixels)
    }

    /// Decodes `data` and draws it scaled over the whole surface.
    ///
    /// An empty string clears the surface. On a decode error the surface is
    /// left untouched.
    pub fn load_raster_encoding(&mut self, data: &str) -> Result<(), SurfaceError> {
        if data.trim().is_empty() {
            self.clear();
            return Ok(());
        }
        let image = decode_data_url(data)?;
        self.load_image(image);
        Ok(())
    }

    /// Replaces the surface content with an already decoded raster.
    pub fn load_image(&mut self, image: RgbaImage) {
        self.committed = Some(image);
        self.draw_committed();
        self.blank = false;
        self.dirty = false;
    }

    fn fill_background(&mut self) {
        let background = Rgba(self.style.background);
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
    }

    fn draw_committed(&mut self) {
        self.fill_background();
        let Some(committed) = &self.committed else {
            return;
        };
        if committed.dimensions() == (self.size, self.size) {
            imageops::overlay(&mut self.pixels, committed, 0, 0);
        } else {
            let scaled = imageops::resize(
                committed,
                self.size,
                self.size,
                imageops::FilterType::Triangle,
            );
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }
}

fn check_size(size: u32, style: &SurfaceStyle) -> Result<(), SurfaceError> {
    if size == 0 {
        return Err(SurfaceError::InvalidSize(size));
    }
    if size > style.max_size {
        return Err(SurfaceError::ResizeFailed(format!(
            "{size}px exceeds the {}px limit",
            style.max_size
        )));
    }
    Ok(())
}
