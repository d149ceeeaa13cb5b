//! Font atlas: gathers glyphs from sources into one shared texture
//!
//! The build runs in two phases. **Gather**: resolve each source's
//! codepoint ranges against its face, claiming codepoints first-writer-wins
//! per destination font, and measure every glyph's pixel box. **Pack +
//! render**: choose a texture width from the total surface, pack the custom
//! rectangles (cursor sheet, baked line ramp) into the upper-left corner
//! followed by all glyph rectangles, rasterize through the backend, and
//! register glyphs (with UVs and clamped/snapped advances) on their fonts.
//!
//! The atlas is built once before any text is drawn and carries a `locked`
//! flag: between frame building and render consumption no structural
//! mutation is permitted.

use crate::draw::context::TEX_LINES_WIDTH_MAX;
use crate::draw::list::TextureId;
use crate::error::{AtlasError, FontError, Result};
use crate::font::font::Font;
use crate::font::glyph::{glyph_ranges_default, GlyphRange};
use crate::font::pack::{PackRect, RectPacker, SkylinePacker};
use crate::font::raster::{
  h_prefilter, oversample_shift, v_prefilter, FontRasterizer, OutlineRasterizer, RasterFace,
};
use crate::geometry::{Rect, Vec2};
use log::{debug, warn};
use std::sync::Arc;

const TEX_HEIGHT_MAX: u32 = 1024 * 32;

/// Handle to a font owned by the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub usize);

/// Atlas-wide build options
#[derive(Debug, Clone, Copy, Default)]
pub struct FontAtlasFlags {
  /// Keep the computed texture height instead of rounding it up to a power
  /// of two
  pub no_power_of_two_height: bool,
  /// Replace the cursor sheet with a single 2x2 white block
  pub no_mouse_cursors: bool,
  /// Skip baking the line-width ramp (disables textured line stroking)
  pub no_baked_lines: bool,
}

/// One font file + size + ranges feeding a destination font
///
/// Several sources can merge into one destination font (icons merged into a
/// text font); a codepoint claimed by an earlier source is never overwritten
/// by a later one.
#[derive(Clone)]
pub struct FontSource {
  pub data: Arc<Vec<u8>>,
  pub face_index: u32,
  pub size_pixels: f32,
  /// Horizontal oversampling for sub-pixel positioning quality
  pub oversample_h: u32,
  pub oversample_v: u32,
  /// Round glyph advances to whole pixels
  pub pixel_snap_h: bool,
  /// Inclusive codepoint ranges; empty means Basic Latin + Supplement
  pub glyph_ranges: Vec<GlyphRange>,
  /// Offset applied to every glyph of this source
  pub glyph_offset: Vec2,
  pub glyph_min_advance_x: f32,
  pub glyph_max_advance_x: f32,
  pub glyph_extra_spacing: Vec2,
  /// Brightness multiplier applied to rasterized coverage
  pub rasterizer_multiply: f32,
  /// Add glyphs into an existing font instead of creating a new one
  pub merge_target: Option<FontId>,
  pub ellipsis_char: Option<u32>,
}

impl FontSource {
  pub fn new(data: Arc<Vec<u8>>, size_pixels: f32) -> Self {
    Self {
      data,
      face_index: 0,
      size_pixels,
      oversample_h: 2,
      oversample_v: 1,
      pixel_snap_h: false,
      glyph_ranges: Vec::new(),
      glyph_offset: Vec2::ZERO,
      glyph_min_advance_x: 0.0,
      glyph_max_advance_x: f32::MAX,
      glyph_extra_spacing: Vec2::ZERO,
      rasterizer_multiply: 1.0,
      merge_target: None,
      ellipsis_char: None,
    }
  }
}

struct SourceRecord {
  source: FontSource,
  dst_font: FontId,
}

/// Glyph registration riding on a custom rectangle (emoji, inline images)
#[derive(Debug, Clone, Copy)]
pub struct CustomRectGlyph {
  pub font: FontId,
  pub codepoint: u32,
  pub advance_x: f32,
  pub offset: Vec2,
}

/// A caller-sized rectangle packed into the atlas alongside the glyphs
#[derive(Debug, Clone, Copy)]
pub struct AtlasCustomRect {
  pub width: u32,
  pub height: u32,
  /// Packed position; `u32::MAX` until the build runs
  pub x: u32,
  pub y: u32,
  pub glyph: Option<CustomRectGlyph>,
}

impl AtlasCustomRect {
  fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      x: u32::MAX,
      y: u32::MAX,
      glyph: None,
    }
  }

  pub fn is_packed(&self) -> bool {
    self.x != u32::MAX
  }
}

// ============================================================================
// Cursor sheet
// ============================================================================

/// Cursors baked into the atlas sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseCursor {
  Arrow = 0,
  TextInput = 1,
}

const CURSOR_TEX_W: u32 = 24;
const CURSOR_TEX_H: u32 = 18;

// Two-layer cursor strip: '.' marks the fill layer, 'X' the border layer,
// anything else is blank. The 2x2 dot block in the top-left corner doubles
// as the atlas white pixel.
#[rustfmt::skip]
const CURSOR_TEX_PIXELS: &[u8] = concat!(
  "..-         -XXXXXXX-   ",
  "..-         -X.....X-   ",
  "---         -XXX.XXX-   ",
  "X           -  X.X  -   ",
  "XX          -  X.X  -   ",
  "X.X         -  X.X  -   ",
  "X..X        -  X.X  -   ",
  "X...X       -  X.X  -   ",
  "X....X      -  X.X  -   ",
  "X.....X     -  X.X  -   ",
  "X......X    -  X.X  -   ",
  "X.......X   -  X.X  -   ",
  "X........X  -XXX.XXX-   ",
  "X.....XXXXX -X.....X-   ",
  "X..X..X     -XXXXXXX-   ",
  "X.X X..X    ------------",
  "XX   X..X   -           ",
  "      X..X  -           ",
).as_bytes();

// Per cursor: position in the sheet, size, hotspot offset.
const CURSOR_TEX_DATA: [(Vec2, Vec2, Vec2); 2] = [
  (Vec2::new(0.0, 3.0), Vec2::new(12.0, 15.0), Vec2::new(0.0, 0.0)), // Arrow
  (Vec2::new(13.0, 0.0), Vec2::new(7.0, 15.0), Vec2::new(1.0, 7.0)), // TextInput
];

fn build_multiply_table(factor: f32) -> [u8; 256] {
  let mut table = [0u8; 256];
  for (i, v) in table.iter_mut().enumerate() {
    *v = (i as f32 * factor).clamp(0.0, 255.0) as u8;
  }
  table
}

// ============================================================================
// Atlas
// ============================================================================

/// The single shared texture holding all rasterized glyphs and auxiliary
/// shapes, plus the fonts built from it
pub struct FontAtlas {
  pub flags: FontAtlasFlags,
  /// Backend texture handle, set by the renderer after uploading
  pub tex_id: TextureId,
  /// Overrides the surface-based width heuristic when non-zero
  pub tex_desired_width: u32,
  /// Blank pixels between packed rectangles
  pub tex_glyph_padding: u32,
  /// Set by the renderer while the built atlas is being consumed; no
  /// structural mutation is permitted while locked
  pub locked: bool,
  sources: Vec<SourceRecord>,
  fonts: Vec<Font>,
  custom_rects: Vec<AtlasCustomRect>,
  pack_id_cursors: Option<usize>,
  pack_id_lines: Option<usize>,
  tex_width: u32,
  tex_height: u32,
  tex_uv_scale: Vec2,
  tex_uv_white_pixel: Vec2,
  tex_uv_lines: [Rect; TEX_LINES_WIDTH_MAX + 1],
  pixels_alpha8: Option<Vec<u8>>,
  tex_ready: bool,
}

impl FontAtlas {
  pub fn new() -> Self {
    Self {
      flags: FontAtlasFlags::default(),
      tex_id: TextureId::default(),
      tex_desired_width: 0,
      tex_glyph_padding: 1,
      locked: false,
      sources: Vec::new(),
      fonts: Vec::new(),
      custom_rects: Vec::new(),
      pack_id_cursors: None,
      pack_id_lines: None,
      tex_width: 0,
      tex_height: 0,
      tex_uv_scale: Vec2::ZERO,
      tex_uv_white_pixel: Vec2::ZERO,
      tex_uv_lines: [Rect::ZERO; TEX_LINES_WIDTH_MAX + 1],
      pixels_alpha8: None,
      tex_ready: false,
    }
  }

  // ==========================================================================
  // Configuration
  // ==========================================================================

  /// Registers a font source; returns the destination font
  pub fn add_font(&mut self, source: FontSource) -> Result<FontId> {
    assert!(!self.locked, "cannot modify a locked atlas between frame building and render");
    if source.data.is_empty() {
      return Err(FontError::InvalidFontData { face_index: source.face_index }.into());
    }
    if !(source.size_pixels > 0.0) {
      return Err(FontError::InvalidSize { size_pixels: source.size_pixels }.into());
    }

    let dst_font = match source.merge_target {
      Some(id) => {
        if id.0 >= self.fonts.len() {
          return Err(AtlasError::UnknownMergeTarget { font_id: id.0 }.into());
        }
        id
      }
      None => {
        self.fonts.push(Font::new());
        FontId(self.fonts.len() - 1)
      }
    };

    self.tex_ready = false;
    self.sources.push(SourceRecord { source, dst_font });
    Ok(dst_font)
  }

  pub fn fonts(&self) -> &[Font] {
    &self.fonts
  }

  pub fn font(&self, id: FontId) -> &Font {
    &self.fonts[id.0]
  }

  pub fn font_mut(&mut self, id: FontId) -> &mut Font {
    &mut self.fonts[id.0]
  }

  /// Reserves a blank rectangle the caller renders into after the build
  pub fn add_custom_rect_regular(&mut self, width: u32, height: u32) -> usize {
    assert!(width > 0 && height > 0);
    self.custom_rects.push(AtlasCustomRect::new(width, height));
    self.custom_rects.len() - 1
  }

  /// Reserves a rectangle registered as a glyph on `font` after the build
  pub fn add_custom_rect_font_glyph(
    &mut self,
    font: FontId,
    codepoint: u32,
    width: u32,
    height: u32,
    advance_x: f32,
    offset: Vec2,
  ) -> usize {
    assert!(width > 0 && height > 0);
    assert!(font.0 < self.fonts.len());
    let mut rect = AtlasCustomRect::new(width, height);
    rect.glyph = Some(CustomRectGlyph {
      font,
      codepoint,
      advance_x,
      offset,
    });
    self.custom_rects.push(rect);
    self.custom_rects.len() - 1
  }

  pub fn custom_rect(&self, index: usize) -> &AtlasCustomRect {
    &self.custom_rects[index]
  }

  pub fn calc_custom_rect_uv(&self, rect: &AtlasCustomRect) -> (Vec2, Vec2) {
    debug_assert!(self.tex_width > 0 && self.tex_height > 0);
    debug_assert!(rect.is_packed());
    (
      Vec2::new(rect.x as f32 * self.tex_uv_scale.x, rect.y as f32 * self.tex_uv_scale.y),
      Vec2::new(
        (rect.x + rect.width) as f32 * self.tex_uv_scale.x,
        (rect.y + rect.height) as f32 * self.tex_uv_scale.y,
      ),
    )
  }

  // ==========================================================================
  // Clearing
  // ==========================================================================

  pub fn clear_input_data(&mut self) {
    assert!(!self.locked, "cannot modify a locked atlas between frame building and render");
    self.sources.clear();
    self.custom_rects.clear();
    self.pack_id_cursors = None;
    self.pack_id_lines = None;
    // tex_ready is deliberately left untouched: the built texture remains
    // consumable until fonts change.
  }

  pub fn clear_tex_data(&mut self) {
    assert!(!self.locked, "cannot modify a locked atlas between frame building and render");
    self.pixels_alpha8 = None;
  }

  pub fn clear_fonts(&mut self) {
    assert!(!self.locked, "cannot modify a locked atlas between frame building and render");
    self.fonts.clear();
    self.tex_ready = false;
  }

  pub fn clear(&mut self) {
    self.clear_input_data();
    self.clear_tex_data();
    self.clear_fonts();
  }

  // ==========================================================================
  // Queries
  // ==========================================================================

  pub fn is_built(&self) -> bool {
    self.tex_ready
  }

  pub fn tex_width(&self) -> u32 {
    self.tex_width
  }

  pub fn tex_height(&self) -> u32 {
    self.tex_height
  }

  pub fn uv_scale(&self) -> Vec2 {
    self.tex_uv_scale
  }

  pub fn uv_white_pixel(&self) -> Vec2 {
    self.tex_uv_white_pixel
  }

  pub fn uv_lines(&self) -> &[Rect; TEX_LINES_WIDTH_MAX + 1] {
    &self.tex_uv_lines
  }

  /// 8-bit coverage texture produced by the last build
  pub fn tex_data_alpha8(&self) -> Option<(&[u8], u32, u32)> {
    self
      .pixels_alpha8
      .as_deref()
      .map(|px| (px, self.tex_width, self.tex_height))
  }

  /// Texture converted to RGBA32 (white, coverage in alpha)
  pub fn tex_data_as_rgba32(&self) -> Option<(Vec<u32>, u32, u32)> {
    let (alpha, w, h) = self.tex_data_alpha8()?;
    let pixels = alpha.iter().map(|&a| (a as u32) << 24 | 0x00FF_FFFF).collect();
    Some((pixels, w, h))
  }

  /// Sheet data for drawing a software cursor: hotspot offset, size, and the
  /// UVs of the border and fill layers
  pub fn cursor_tex_data(&self, cursor: MouseCursor) -> Option<(Vec2, Vec2, [Vec2; 2], [Vec2; 2])> {
    if self.flags.no_mouse_cursors || !self.tex_ready {
      return None;
    }
    let rect = &self.custom_rects[self.pack_id_cursors?];
    if !rect.is_packed() {
      return None;
    }
    let (pos, size, offset) = CURSOR_TEX_DATA[cursor as usize];
    let base = Vec2::new(rect.x as f32, rect.y as f32) + pos;
    let uv_fill = [
      Vec2::new(base.x * self.tex_uv_scale.x, base.y * self.tex_uv_scale.y),
      Vec2::new((base.x + size.x) * self.tex_uv_scale.x, (base.y + size.y) * self.tex_uv_scale.y),
    ];
    let base = base + Vec2::new((CURSOR_TEX_W + 1) as f32, 0.0);
    let uv_border = [
      Vec2::new(base.x * self.tex_uv_scale.x, base.y * self.tex_uv_scale.y),
      Vec2::new((base.x + size.x) * self.tex_uv_scale.x, (base.y + size.y) * self.tex_uv_scale.y),
    ];
    Some((offset, size, uv_border, uv_fill))
  }

  // ==========================================================================
  // Build
  // ==========================================================================

  /// Builds with the default backend (ttf-parser outlines + skyline packer)
  pub fn build(&mut self) -> Result<()> {
    let rasterizer = OutlineRasterizer::new();
    let mut packer = SkylinePacker::new();
    self.build_with(&rasterizer, &mut packer)
  }

  pub fn build_with(&mut self, rasterizer: &dyn FontRasterizer, packer: &mut dyn RectPacker) -> Result<()> {
    assert!(!self.locked, "cannot build a locked atlas");
    if self.sources.is_empty() {
      return Err(AtlasError::NoSources.into());
    }

    self.build_init();

    // Clear output state from any previous build.
    self.tex_id = TextureId::default();
    self.tex_width = 0;
    self.tex_height = 0;
    self.tex_uv_scale = Vec2::ZERO;
    self.tex_uv_white_pixel = Vec2::ZERO;
    self.pixels_alpha8 = None;

    struct BuildSrc {
      face: Arc<dyn RasterFace>,
      dst_index: usize,
      ranges: Vec<GlyphRange>,
      glyphs_list: Vec<u32>,
      rects: Vec<PackRect>,
    }
    struct BuildDst {
      glyphs_set: Vec<bool>,
      glyphs_highest: u32,
    }

    // 1. Parse every source and measure the highest requested codepoint.
    let mut build_src: Vec<BuildSrc> = Vec::with_capacity(self.sources.len());
    let mut build_dst: Vec<BuildDst> = (0..self.fonts.len())
      .map(|_| BuildDst {
        glyphs_set: Vec::new(),
        glyphs_highest: 0,
      })
      .collect();
    for rec in &self.sources {
      let src = &rec.source;
      let face = rasterizer.load_face(Arc::clone(&src.data), src.face_index)?;
      let ranges = if src.glyph_ranges.is_empty() {
        glyph_ranges_default().to_vec()
      } else {
        src.glyph_ranges.clone()
      };
      let mut highest = 0;
      for &(lo, hi) in &ranges {
        assert!(lo <= hi, "invalid glyph range");
        highest = highest.max(hi);
      }
      let dst_index = rec.dst_font.0;
      build_dst[dst_index].glyphs_highest = build_dst[dst_index].glyphs_highest.max(highest);
      build_src.push(BuildSrc {
        face,
        dst_index,
        ranges,
        glyphs_list: Vec::new(),
        rects: Vec::new(),
      });
    }

    // 2. Claim requested codepoints that are present in each face. A later
    // source never overwrites a codepoint already claimed for the same
    // destination font.
    let mut total_glyphs = 0usize;
    for src in &mut build_src {
      let dst = &mut build_dst[src.dst_index];
      if dst.glyphs_set.is_empty() {
        dst.glyphs_set = vec![false; dst.glyphs_highest as usize + 1];
      }
      for &(lo, hi) in &src.ranges {
        for cp in lo..=hi {
          if dst.glyphs_set[cp as usize] {
            continue;
          }
          if !src.face.has_glyph(cp) {
            continue;
          }
          dst.glyphs_set[cp as usize] = true;
          src.glyphs_list.push(cp);
          total_glyphs += 1;
        }
      }
    }
    drop(build_dst);

    // 3. Measure glyph boxes and accumulate the total pixel surface.
    let padding = self.tex_glyph_padding;
    let mut total_surface = 0u64;
    for (src, rec) in build_src.iter_mut().zip(&self.sources) {
      let cfg = &rec.source;
      let scale = src.face.scale_for_pixel_height(cfg.size_pixels);
      src.rects.reserve(src.glyphs_list.len());
      for &cp in &src.glyphs_list {
        let b = src
          .face
          .glyph_bitmap_box(cp, scale * cfg.oversample_h as f32, scale * cfg.oversample_v as f32)
          .unwrap_or_default();
        let w = b.width() + padding + cfg.oversample_h - 1;
        let h = b.height() + padding + cfg.oversample_v - 1;
        total_surface += w as u64 * h as u64;
        src.rects.push(PackRect::new(w, h));
      }
    }

    // 4. Pick a texture width from the surface estimate. The packer only
    // needs some width; larger widths trade height for width to stay under
    // GPU texture limits.
    let surface_sqrt = (total_surface as f32).sqrt() as u32 + 1;
    self.tex_width = if self.tex_desired_width > 0 {
      self.tex_desired_width
    } else if surface_sqrt as f32 >= 4096.0 * 0.7 {
      4096
    } else if surface_sqrt as f32 >= 2048.0 * 0.7 {
      2048
    } else if surface_sqrt as f32 >= 1024.0 * 0.7 {
      1024
    } else {
      512
    };
    debug!(
      "font atlas: {} glyphs from {} sources, {}px² surface, packing at width {}",
      total_glyphs,
      self.sources.len(),
      total_surface,
      self.tex_width
    );

    // 5. Pack the custom rectangles first so they land in the upper-left
    // corner (small UV values), then every source's glyph rectangles.
    packer.begin(self.tex_width, TEX_HEIGHT_MAX);
    self.pack_custom_rects(packer);
    let mut failed_glyphs = 0usize;
    for src in &mut build_src {
      if src.glyphs_list.is_empty() {
        continue;
      }
      packer.pack(&mut src.rects);
      for r in &src.rects {
        if r.was_packed {
          self.tex_height = self.tex_height.max(r.y + r.h);
        } else {
          failed_glyphs += 1;
        }
      }
    }
    if failed_glyphs > 0 {
      warn!("font atlas: {} glyphs failed to pack and will be missing", failed_glyphs);
    }

    // 6. Allocate the texture.
    self.tex_height = if self.flags.no_power_of_two_height {
      self.tex_height + 1
    } else {
      self.tex_height.next_power_of_two()
    };
    self.tex_uv_scale = Vec2::new(1.0 / self.tex_width as f32, 1.0 / self.tex_height as f32);
    let mut pixels = vec![0u8; self.tex_width as usize * self.tex_height as usize];

    // 7. Rasterize every packed glyph, prefiltering oversampled bitmaps and
    // applying the per-source brightness table.
    let tex_width = self.tex_width as usize;
    for (src, rec) in build_src.iter().zip(&self.sources) {
      let cfg = &rec.source;
      let scale = src.face.scale_for_pixel_height(cfg.size_pixels);
      let multiply_table = (cfg.rasterizer_multiply != 1.0).then(|| build_multiply_table(cfg.rasterizer_multiply));

      for (i, &cp) in src.glyphs_list.iter().enumerate() {
        let r = src.rects[i];
        if !r.was_packed {
          continue;
        }
        // The packed rect includes padding and oversample slack; the glyph
        // bitmap itself is rendered at the top-left.
        let bw = r.w - padding;
        let bh = r.h - padding;
        let gw = bw + 1 - cfg.oversample_h;
        let gh = bh + 1 - cfg.oversample_v;
        let offset = r.y as usize * tex_width + r.x as usize;
        src.face.render_glyph(
          cp,
          scale * cfg.oversample_h as f32,
          scale * cfg.oversample_v as f32,
          &mut pixels[offset..],
          gw,
          gh,
          tex_width,
        );
        h_prefilter(&mut pixels, r.x, r.y, bw, bh, tex_width, cfg.oversample_h);
        v_prefilter(&mut pixels, r.x, r.y, bw, bh, tex_width, cfg.oversample_v);

        if let Some(table) = &multiply_table {
          for row in 0..bh as usize {
            let start = (r.y as usize + row) * tex_width + r.x as usize;
            for px in &mut pixels[start..start + bw as usize] {
              *px = table[*px as usize];
            }
          }
        }
      }
    }
    self.pixels_alpha8 = Some(pixels);

    // 8. Register glyphs on their destination fonts.
    for si in 0..build_src.len() {
      let src = &build_src[si];
      if src.glyphs_list.is_empty() && self.sources[si].source.merge_target.is_some() {
        continue;
      }
      let cfg = self.sources[si].source.clone();
      let merge_mode = cfg.merge_target.is_some();

      let scale = src.face.scale_for_pixel_height(cfg.size_pixels);
      let (asc_units, desc_units) = src.face.vertical_metrics();
      let ascent = (asc_units * scale + if asc_units > 0.0 { 1.0 } else { -1.0 }).trunc();
      let descent = (desc_units * scale + if desc_units > 0.0 { 1.0 } else { -1.0 }).trunc();

      let font = &mut self.fonts[src.dst_index];
      if !merge_mode {
        font.clear_output_data();
        font.font_size = cfg.size_pixels;
        font.ascent = ascent;
        font.descent = descent;
        font.ellipsis_char = cfg.ellipsis_char;
      }
      let font_off_x = cfg.glyph_offset.x;
      let font_off_y = cfg.glyph_offset.y + font.ascent.round();

      let recip_h = 1.0 / cfg.oversample_h as f32;
      let recip_v = 1.0 / cfg.oversample_v as f32;
      let sub_x = oversample_shift(cfg.oversample_h);
      let sub_y = oversample_shift(cfg.oversample_v);

      for (i, &cp) in src.glyphs_list.iter().enumerate() {
        let r = src.rects[i];
        if !r.was_packed {
          continue;
        }
        let b = src
          .face
          .glyph_bitmap_box(cp, scale * cfg.oversample_h as f32, scale * cfg.oversample_v as f32)
          .unwrap_or_default();
        let bw = (r.w - padding) as i32;
        let bh = (r.h - padding) as i32;

        let x0 = b.x0 as f32 * recip_h + sub_x;
        let y0 = b.y0 as f32 * recip_v + sub_y;
        let x1 = (b.x0 + bw) as f32 * recip_h + sub_x;
        let y1 = (b.y0 + bh) as f32 * recip_v + sub_y;
        let u0 = r.x as f32 * self.tex_uv_scale.x;
        let v0 = r.y as f32 * self.tex_uv_scale.y;
        let u1 = (r.x as i32 + bw) as f32 * self.tex_uv_scale.x;
        let v1 = (r.y as i32 + bh) as f32 * self.tex_uv_scale.y;
        let advance_x = src.face.glyph_advance(cp) * scale;

        font.add_glyph(
          Some(&cfg),
          cp,
          x0 + font_off_x,
          y0 + font_off_y,
          x1 + font_off_x,
          y1 + font_off_y,
          u0,
          v0,
          u1,
          v1,
          advance_x,
        );
      }
    }

    self.build_finish();
    Ok(())
  }

  /// Registers the cursor and line-ramp rectangles ahead of the first build
  fn build_init(&mut self) {
    // Fractional sizes are truncated: the layout side works in whole pixels.
    for rec in &mut self.sources {
      rec.source.size_pixels = rec.source.size_pixels.trunc();
    }

    if self.pack_id_cursors.is_none() {
      self.pack_id_cursors = Some(if !self.flags.no_mouse_cursors {
        // Two layers side by side plus one spacing column.
        self.add_custom_rect_regular(CURSOR_TEX_W * 2 + 1, CURSOR_TEX_H)
      } else {
        self.add_custom_rect_regular(2, 2)
      });
    }
    if self.pack_id_lines.is_none() && !self.flags.no_baked_lines {
      // +2 columns for the transparent end caps, +1 row for the zero-width
      // line.
      self.pack_id_lines = Some(self.add_custom_rect_regular(
        TEX_LINES_WIDTH_MAX as u32 + 2,
        TEX_LINES_WIDTH_MAX as u32 + 1,
      ));
    }
  }

  fn pack_custom_rects(&mut self, packer: &mut dyn RectPacker) {
    assert!(!self.custom_rects.is_empty());
    let mut pack_rects: Vec<PackRect> = self
      .custom_rects
      .iter()
      .map(|r| PackRect::new(r.width, r.height))
      .collect();
    packer.pack(&mut pack_rects);
    for (rect, packed) in self.custom_rects.iter_mut().zip(&pack_rects) {
      if packed.was_packed {
        rect.x = packed.x;
        rect.y = packed.y;
        debug_assert!(packed.w == rect.width && packed.h == rect.height);
        self.tex_height = self.tex_height.max(packed.y + packed.h);
      }
    }
  }

  fn build_finish(&mut self) {
    assert!(self.pixels_alpha8.is_some());
    self.render_default_tex_data();
    self.render_lines_tex_data();

    // Register custom-rect-backed glyphs (emoji, image glyphs).
    for i in 0..self.custom_rects.len() {
      let rect = self.custom_rects[i];
      let Some(glyph) = rect.glyph else {
        continue;
      };
      if !rect.is_packed() {
        continue;
      }
      // Min/max advance clamping and pixel snapping deliberately do not
      // apply to custom rect glyphs.
      let (uv0, uv1) = self.calc_custom_rect_uv(&rect);
      self.fonts[glyph.font.0].add_glyph(
        None,
        glyph.codepoint,
        glyph.offset.x,
        glyph.offset.y,
        glyph.offset.x + rect.width as f32,
        glyph.offset.y + rect.height as f32,
        uv0.x,
        uv0.y,
        uv1.x,
        uv1.y,
        glyph.advance_x,
      );
    }

    for font in &mut self.fonts {
      if font.dirty_lookup_table {
        font.build_lookup_table();
      }
    }

    self.tex_ready = true;
  }

  /// Writes marker-selected pixels of an ASCII art block into the texture
  fn render_pixels_from_string(&mut self, x: u32, y: u32, w: u32, h: u32, art: &[u8], marker: u8) {
    debug_assert!(x + w <= self.tex_width && y + h <= self.tex_height);
    let tex_width = self.tex_width as usize;
    let pixels = self.pixels_alpha8.as_mut().unwrap();
    for row in 0..h as usize {
      let out = &mut pixels[(y as usize + row) * tex_width + x as usize..];
      for col in 0..w as usize {
        out[col] = if art[row * CURSOR_TEX_W as usize + col] == marker {
          0xFF
        } else {
          0x00
        };
      }
    }
  }

  /// Renders the cursor sheet (or the plain white block) and derives the
  /// white-pixel UV from its top-left corner
  fn render_default_tex_data(&mut self) {
    let rect = self.custom_rects[self.pack_id_cursors.unwrap()];
    assert!(rect.is_packed());

    if !self.flags.no_mouse_cursors {
      debug_assert!(rect.width == CURSOR_TEX_W * 2 + 1 && rect.height == CURSOR_TEX_H);
      let x_for_fill = rect.x;
      let x_for_border = rect.x + CURSOR_TEX_W + 1;
      self.render_pixels_from_string(x_for_fill, rect.y, CURSOR_TEX_W, CURSOR_TEX_H, CURSOR_TEX_PIXELS, b'.');
      self.render_pixels_from_string(x_for_border, rect.y, CURSOR_TEX_W, CURSOR_TEX_H, CURSOR_TEX_PIXELS, b'X');
    } else {
      debug_assert!(rect.width == 2 && rect.height == 2);
      let tex_width = self.tex_width as usize;
      let pixels = self.pixels_alpha8.as_mut().unwrap();
      let offset = rect.x as usize + rect.y as usize * tex_width;
      pixels[offset] = 0xFF;
      pixels[offset + 1] = 0xFF;
      pixels[offset + tex_width] = 0xFF;
      pixels[offset + tex_width + 1] = 0xFF;
    }
    self.tex_uv_white_pixel = Vec2::new(
      (rect.x as f32 + 0.5) * self.tex_uv_scale.x,
      (rect.y as f32 + 0.5) * self.tex_uv_scale.y,
    );
  }

  /// Renders the line-width ramp: one row per width, a centered solid
  /// segment flanked by transparent padding, sampled by the textured line
  /// fast path
  fn render_lines_tex_data(&mut self) {
    if self.flags.no_baked_lines {
      return;
    }
    let rect = self.custom_rects[self.pack_id_lines.unwrap()];
    assert!(rect.is_packed());
    let tex_width = self.tex_width as usize;

    for n in 0..=TEX_LINES_WIDTH_MAX as u32 {
      let y = n;
      let line_width = n;
      let pad_left = (rect.width - line_width) / 2;
      let pad_right = rect.width - (pad_left + line_width);
      debug_assert!(pad_left + line_width + pad_right == rect.width && y < rect.height);

      {
        let pixels = self.pixels_alpha8.as_mut().unwrap();
        let start = rect.x as usize + (rect.y + y) as usize * tex_width;
        let row = &mut pixels[start..start + rect.width as usize];
        row[..pad_left as usize].fill(0x00);
        row[pad_left as usize..(pad_left + line_width) as usize].fill(0xFF);
        row[(pad_left + line_width) as usize..].fill(0x00);
      }

      // Sample one texel into the transparent padding on each side, with a
      // constant V in the middle of the row to avoid bleeding across rows.
      let uv0 = Vec2::new(
        (rect.x + pad_left - 1) as f32 * self.tex_uv_scale.x,
        (rect.y + y) as f32 * self.tex_uv_scale.y,
      );
      let uv1 = Vec2::new(
        (rect.x + pad_left + line_width + 1) as f32 * self.tex_uv_scale.x,
        (rect.y + y + 1) as f32 * self.tex_uv_scale.y,
      );
      let half_v = (uv0.y + uv1.y) * 0.5;
      self.tex_uv_lines[n as usize] =
        Rect::from_min_max(Vec2::new(uv0.x, half_v), Vec2::new(uv1.x, half_v));
    }
  }
}

impl Default for FontAtlas {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cursor_art_dimensions() {
    assert_eq!(CURSOR_TEX_PIXELS.len(), (CURSOR_TEX_W * CURSOR_TEX_H) as usize);
    // The top-left 2x2 block is the white pixel: all fill-marker.
    let w = CURSOR_TEX_W as usize;
    assert_eq!(CURSOR_TEX_PIXELS[0], b'.');
    assert_eq!(CURSOR_TEX_PIXELS[1], b'.');
    assert_eq!(CURSOR_TEX_PIXELS[w], b'.');
    assert_eq!(CURSOR_TEX_PIXELS[w + 1], b'.');
  }

  #[test]
  fn test_cursor_regions_in_bounds() {
    for (pos, size, _) in CURSOR_TEX_DATA {
      assert!(pos.x + size.x <= CURSOR_TEX_W as f32);
      assert!(pos.y + size.y <= CURSOR_TEX_H as f32);
    }
  }

  #[test]
  fn test_add_font_requires_valid_input() {
    let mut atlas = FontAtlas::new();
    let err = atlas.add_font(FontSource::new(Arc::new(Vec::new()), 13.0));
    assert!(err.is_err());
    let err = atlas.add_font(FontSource::new(Arc::new(vec![0u8; 4]), 0.0));
    assert!(err.is_err());
  }

  #[test]
  fn test_merge_target_must_exist() {
    let mut atlas = FontAtlas::new();
    let mut source = FontSource::new(Arc::new(vec![0u8; 4]), 13.0);
    source.merge_target = Some(FontId(3));
    assert!(atlas.add_font(source).is_err());
  }

  #[test]
  fn test_build_without_sources_fails() {
    let mut atlas = FontAtlas::new();
    assert!(matches!(
      atlas.build(),
      Err(crate::Error::Atlas(AtlasError::NoSources))
    ));
  }

  #[test]
  #[should_panic(expected = "locked atlas")]
  fn test_locked_atlas_rejects_mutation() {
    let mut atlas = FontAtlas::new();
    atlas.locked = true;
    atlas.clear_fonts();
  }

  #[test]
  fn test_multiply_table() {
    let table = build_multiply_table(1.5);
    assert_eq!(table[0], 0);
    assert_eq!(table[100], 150);
    assert_eq!(table[200], 255); // clamped
  }
}
