//! Pluggable glyph rasterization backend
//!
//! The atlas builder is written against the [`FontRasterizer`] /
//! [`RasterFace`] contract, not a concrete rasterizer: glyph presence
//! queries, pixel bounding boxes, and coverage rendering into
//! packer-assigned rectangles. [`OutlineRasterizer`] is the default backend,
//! building glyph outlines with `ttf-parser` and filling them into coverage
//! masks with `tiny-skia`.

use crate::error::FontError;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

/// Pixel-space bounding box of a glyph at a given scale
///
/// Offsets are relative to the glyph origin on the baseline, Y-down:
/// `y0` is typically negative (above the baseline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphBitmapBox {
  pub x0: i32,
  pub y0: i32,
  pub x1: i32,
  pub y1: i32,
}

impl GlyphBitmapBox {
  pub fn width(self) -> u32 {
    (self.x1 - self.x0).max(0) as u32
  }

  pub fn height(self) -> u32 {
    (self.y1 - self.y0).max(0) as u32
  }
}

/// A parsed font face the atlas builder can query and rasterize from
pub trait RasterFace: Send + Sync {
  /// Ascent and descent in font units (descent is negative)
  fn vertical_metrics(&self) -> (f32, f32);

  /// Scale factor mapping font units to a given pixel height
  /// (ascent minus descent spans exactly `pixels`)
  fn scale_for_pixel_height(&self, pixels: f32) -> f32;

  /// Whether the face maps `codepoint` to a real glyph
  fn has_glyph(&self, codepoint: u32) -> bool;

  /// Horizontal advance in font units
  fn glyph_advance(&self, codepoint: u32) -> f32;

  /// Pixel bounding box of the glyph outline at the given scale; None for
  /// glyphs with no outline (whitespace)
  fn glyph_bitmap_box(&self, codepoint: u32, scale_x: f32, scale_y: f32) -> Option<GlyphBitmapBox>;

  /// Renders glyph coverage into an 8-bit buffer
  ///
  /// The buffer window is `out_w` x `out_h` bytes at `out_pitch` bytes per
  /// row, mapped so that pixel (0, 0) corresponds to the top-left of the
  /// glyph's bitmap box at this scale.
  fn render_glyph(
    &self,
    codepoint: u32,
    scale_x: f32,
    scale_y: f32,
    out: &mut [u8],
    out_w: u32,
    out_h: u32,
    out_pitch: usize,
  );
}

/// Factory for [`RasterFace`] instances
pub trait FontRasterizer {
  fn load_face(&self, data: Arc<Vec<u8>>, face_index: u32) -> Result<Arc<dyn RasterFace>, FontError>;
}

// ============================================================================
// Default backend: ttf-parser outlines filled by tiny-skia
// ============================================================================

/// Collects ttf-parser outline callbacks into a tiny-skia path
struct OutlinePathBuilder {
  builder: PathBuilder,
}

impl ttf_parser::OutlineBuilder for OutlinePathBuilder {
  fn move_to(&mut self, x: f32, y: f32) {
    self.builder.move_to(x, y);
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.builder.line_to(x, y);
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.builder.quad_to(x1, y1, x, y);
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.builder.cubic_to(x1, y1, x2, y2, x, y);
  }

  fn close(&mut self) {
    self.builder.close();
  }
}

/// A parsed face pinned to its backing data
struct OutlineFace {
  // Keeps the transmuted 'static borrow below alive.
  _data: Arc<Vec<u8>>,
  face: ttf_parser::Face<'static>,
}

impl OutlineFace {
  fn parse(data: Arc<Vec<u8>>, face_index: u32) -> Result<Self, FontError> {
    // SAFETY: the Arc keeps the font data alive for the lifetime of the face.
    let static_data: &'static [u8] = unsafe { std::mem::transmute::<&[u8], &'static [u8]>(&*data) };
    let face = ttf_parser::Face::parse(static_data, face_index)
      .map_err(|_| FontError::InvalidFontData { face_index })?;
    Ok(Self { _data: data, face })
  }

  fn glyph_id(&self, codepoint: u32) -> Option<ttf_parser::GlyphId> {
    let c = char::from_u32(codepoint)?;
    self.face.glyph_index(c)
  }

  fn glyph_path(&self, glyph: ttf_parser::GlyphId) -> Option<tiny_skia::Path> {
    let mut builder = OutlinePathBuilder {
      builder: PathBuilder::new(),
    };
    self.face.outline_glyph(glyph, &mut builder)?;
    builder.builder.finish()
  }
}

impl RasterFace for OutlineFace {
  fn vertical_metrics(&self) -> (f32, f32) {
    (self.face.ascender() as f32, self.face.descender() as f32)
  }

  fn scale_for_pixel_height(&self, pixels: f32) -> f32 {
    let span = (self.face.ascender() as i32 - self.face.descender() as i32) as f32;
    if span > 0.0 {
      pixels / span
    } else {
      pixels / self.face.units_per_em() as f32
    }
  }

  fn has_glyph(&self, codepoint: u32) -> bool {
    self.glyph_id(codepoint).is_some()
  }

  fn glyph_advance(&self, codepoint: u32) -> f32 {
    self
      .glyph_id(codepoint)
      .and_then(|g| self.face.glyph_hor_advance(g))
      .map(|a| a as f32)
      .unwrap_or(0.0)
  }

  fn glyph_bitmap_box(&self, codepoint: u32, scale_x: f32, scale_y: f32) -> Option<GlyphBitmapBox> {
    let glyph = self.glyph_id(codepoint)?;
    let bounds = self.face.glyph_bounding_box(glyph)?;
    // Font units are Y-up; the pixel box is Y-down, so the vertical bounds
    // swap and negate.
    Some(GlyphBitmapBox {
      x0: (bounds.x_min as f32 * scale_x).floor() as i32,
      y0: (-bounds.y_max as f32 * scale_y).floor() as i32,
      x1: (bounds.x_max as f32 * scale_x).ceil() as i32,
      y1: (-bounds.y_min as f32 * scale_y).ceil() as i32,
    })
  }

  fn render_glyph(
    &self,
    codepoint: u32,
    scale_x: f32,
    scale_y: f32,
    out: &mut [u8],
    out_w: u32,
    out_h: u32,
    out_pitch: usize,
  ) {
    if out_w == 0 || out_h == 0 {
      return;
    }
    let Some(glyph) = self.glyph_id(codepoint) else {
      return;
    };
    let Some(the_box) = self.glyph_bitmap_box(codepoint, scale_x, scale_y) else {
      return;
    };
    let Some(path) = self.glyph_path(glyph) else {
      return;
    };
    let Some(mut pixmap) = Pixmap::new(out_w, out_h) else {
      return;
    };

    // Scale font units to pixels, flip Y, and shift the bitmap box origin to
    // pixel (0, 0).
    let transform = Transform::from_row(
      scale_x,
      0.0,
      0.0,
      -scale_y,
      -the_box.x0 as f32,
      -the_box.y0 as f32,
    );
    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);

    // Coverage is the alpha channel of the white fill.
    let src = pixmap.pixels();
    for y in 0..out_h as usize {
      let row = &mut out[y * out_pitch..y * out_pitch + out_w as usize];
      for (x, dst) in row.iter_mut().enumerate() {
        *dst = src[y * out_w as usize + x].alpha();
      }
    }
  }
}

#[derive(PartialEq, Eq, Hash, Clone, Copy)]
struct FaceCacheKey {
  data_ptr: usize,
  face_index: u32,
}

/// Default rasterizer backend
///
/// Parsed faces are cached per (data pointer, face index) so merge-mode
/// sources sharing one file parse it once.
#[derive(Default)]
pub struct OutlineRasterizer {
  cache: Mutex<FxHashMap<FaceCacheKey, Arc<OutlineFace>>>,
}

impl OutlineRasterizer {
  pub fn new() -> Self {
    Self::default()
  }
}

impl FontRasterizer for OutlineRasterizer {
  fn load_face(&self, data: Arc<Vec<u8>>, face_index: u32) -> Result<Arc<dyn RasterFace>, FontError> {
    let key = FaceCacheKey {
      data_ptr: Arc::as_ptr(&data) as *const u8 as usize,
      face_index,
    };
    let mut cache = self.cache.lock().unwrap();
    if let Some(face) = cache.get(&key) {
      return Ok(Arc::clone(face) as Arc<dyn RasterFace>);
    }
    let face = Arc::new(OutlineFace::parse(data, face_index)?);
    cache.insert(key, Arc::clone(&face));
    Ok(face)
  }
}

/// Sub-pixel shift stb-style oversampling applies to glyph offsets
pub(crate) fn oversample_shift(oversample: u32) -> f32 {
  if oversample == 0 {
    return 0.0;
  }
  -((oversample - 1) as f32) / (2.0 * oversample as f32)
}

/// In-place horizontal box filter of kernel width `kernel`, used to
/// prefilter oversampled glyph bitmaps
pub(crate) fn h_prefilter(pixels: &mut [u8], x: u32, y: u32, w: u32, h: u32, pitch: usize, kernel: u32) {
  if kernel <= 1 {
    return;
  }
  let kernel = kernel.min(8) as usize;
  let mut buf = [0u8; 8];
  for row in 0..h as usize {
    let start = (y as usize + row) * pitch + x as usize;
    let line = &mut pixels[start..start + w as usize];
    buf.fill(0);
    let mut total: u32 = 0;
    for i in 0..w as usize {
      let incoming = line[i];
      total += incoming as u32;
      total -= buf[i % kernel] as u32;
      buf[i % kernel] = incoming;
      line[i] = (total / kernel as u32) as u8;
    }
  }
}

/// Vertical counterpart of [`h_prefilter`]
pub(crate) fn v_prefilter(pixels: &mut [u8], x: u32, y: u32, w: u32, h: u32, pitch: usize, kernel: u32) {
  if kernel <= 1 {
    return;
  }
  let kernel = kernel.min(8) as usize;
  let mut buf = [0u8; 8];
  for col in 0..w as usize {
    buf.fill(0);
    let mut total: u32 = 0;
    for i in 0..h as usize {
      let idx = (y as usize + i) * pitch + x as usize + col;
      let incoming = pixels[idx];
      total += incoming as u32;
      total -= buf[i % kernel] as u32;
      buf[i % kernel] = incoming;
      pixels[idx] = (total / kernel as u32) as u8;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_oversample_shift() {
    assert_eq!(oversample_shift(1), 0.0);
    assert_eq!(oversample_shift(2), -0.25);
    assert_eq!(oversample_shift(4), -0.375);
  }

  #[test]
  fn test_h_prefilter_spreads_coverage() {
    // A single solid column smeared over a kernel of 2.
    let mut pixels = vec![0u8; 4 * 1];
    pixels[1] = 200;
    h_prefilter(&mut pixels, 0, 0, 4, 1, 4, 2);
    assert_eq!(pixels[1], 100);
    assert_eq!(pixels[2], 100);
    assert_eq!(pixels[3], 0);
  }

  #[test]
  fn test_v_prefilter_spreads_coverage() {
    let mut pixels = vec![0u8; 1 * 4];
    pixels[0] = 200;
    v_prefilter(&mut pixels, 0, 0, 1, 4, 1, 2);
    assert_eq!(pixels[0], 100);
    assert_eq!(pixels[1], 100);
    assert_eq!(pixels[2], 0);
  }

  #[test]
  fn test_invalid_font_data_rejected() {
    let rasterizer = OutlineRasterizer::new();
    let result = rasterizer.load_face(Arc::new(vec![0u8; 16]), 0);
    assert!(matches!(result, Err(FontError::InvalidFontData { face_index: 0 })));
  }

  #[test]
  fn test_bitmap_box_flips_y() {
    let b = GlyphBitmapBox {
      x0: 0,
      y0: -10,
      x1: 5,
      y1: 2,
    };
    assert_eq!(b.width(), 5);
    assert_eq!(b.height(), 12);
  }
}
