//! Atlas build pipeline exercised end-to-end through a mock rasterizer
//! backend: codepoint claiming, packing, texture layout, glyph registration,
//! and text rendering into a draw list.

use fastdraw::font::pack::SkylinePacker;
use fastdraw::font::raster::{FontRasterizer, GlyphBitmapBox, RasterFace};
use fastdraw::{Color32, DrawContext, DrawList, FontAtlas, FontSource, TextureId, Vec2};
use std::sync::Arc;

/// Fixed-metrics face: every printable ASCII codepoint maps to a 500-unit
/// advance glyph with a 50..550 x 0..700 unit box; space has no outline.
struct MockFace;

impl RasterFace for MockFace {
  fn vertical_metrics(&self) -> (f32, f32) {
    (800.0, -200.0)
  }

  fn scale_for_pixel_height(&self, pixels: f32) -> f32 {
    pixels / 1000.0
  }

  fn has_glyph(&self, codepoint: u32) -> bool {
    (0x20..0x7F).contains(&codepoint)
  }

  fn glyph_advance(&self, _codepoint: u32) -> f32 {
    500.0
  }

  fn glyph_bitmap_box(&self, codepoint: u32, scale_x: f32, scale_y: f32) -> Option<GlyphBitmapBox> {
    if codepoint == 0x20 {
      return None;
    }
    Some(GlyphBitmapBox {
      x0: (50.0 * scale_x).floor() as i32,
      y0: (-700.0 * scale_y).floor() as i32,
      x1: (550.0 * scale_x).ceil() as i32,
      y1: 0,
    })
  }

  fn render_glyph(
    &self,
    _codepoint: u32,
    _scale_x: f32,
    _scale_y: f32,
    out: &mut [u8],
    out_w: u32,
    out_h: u32,
    out_pitch: usize,
  ) {
    for y in 0..out_h as usize {
      for px in &mut out[y * out_pitch..y * out_pitch + out_w as usize] {
        *px = 0xFF;
      }
    }
  }
}

struct MockRasterizer;

impl FontRasterizer for MockRasterizer {
  fn load_face(
    &self,
    _data: Arc<Vec<u8>>,
    _face_index: u32,
  ) -> Result<Arc<dyn RasterFace>, fastdraw::error::FontError> {
    Ok(Arc::new(MockFace))
  }
}

fn plain_source(size: f32) -> FontSource {
  let mut source = FontSource::new(Arc::new(vec![0u8; 4]), size);
  source.oversample_h = 1;
  source.oversample_v = 1;
  source
}

fn built_atlas() -> FontAtlas {
  let mut atlas = FontAtlas::new();
  atlas.tex_desired_width = 512;
  atlas.add_font(plain_source(20.0)).unwrap();
  atlas
    .build_with(&MockRasterizer, &mut SkylinePacker::new())
    .unwrap();
  atlas
}

#[test]
fn build_produces_power_of_two_texture() {
  let atlas = built_atlas();
  assert!(atlas.is_built());
  let (pixels, w, h) = atlas.tex_data_alpha8().unwrap();
  assert_eq!(w, 512);
  assert!(h.is_power_of_two());
  assert_eq!(pixels.len(), (w * h) as usize);
}

#[test]
fn build_registers_lookup_tables() {
  let atlas = built_atlas();
  let font = &atlas.fonts()[0];
  assert!(font.is_loaded());
  assert_eq!(font.font_size, 20.0);
  // Printable ASCII was requested and present.
  assert!(!font.is_glyph_range_unused(0, 255));
  // U+FFFD is not in the mock face, so '?' becomes the fallback.
  assert_eq!(font.fallback_char, Some('?' as u32));
  // Space exists but is invisible.
  let space = font.find_glyph_no_fallback(' ' as u32).unwrap();
  assert!(!space.visible);
  assert!(space.advance_x > 0.0);
}

#[test]
fn white_pixel_uv_inside_cursor_rect() {
  let atlas = built_atlas();
  let uv = atlas.uv_white_pixel();
  assert!(uv.x > 0.0 && uv.y > 0.0);
  // Sampling the white pixel yields full coverage.
  let (pixels, w, _) = atlas.tex_data_alpha8().unwrap();
  let x = (uv.x * w as f32) as usize;
  let y = (uv.y * atlas.tex_height() as f32) as usize;
  assert_eq!(pixels[y * w as usize + x], 0xFF);
}

#[test]
fn baked_line_uvs_are_horizontal_spans() {
  let atlas = built_atlas();
  let lines = atlas.uv_lines();
  for width in [1usize, 5, 32, 63] {
    let uv = lines[width];
    assert!(uv.max.x > uv.min.x, "width {} has no span", width);
    // Constant V at the middle of the row.
    assert_eq!(uv.min.y, uv.max.y);
  }
}

#[test]
fn glyphs_pack_into_top_rows() {
  // One small glyph next to the reserved rectangles still lands on the
  // first skyline row.
  let mut atlas = FontAtlas::new();
  atlas.tex_desired_width = 512;
  let mut source = plain_source(20.0);
  source.glyph_ranges = vec![('A' as u32, 'A' as u32)];
  atlas.add_font(source).unwrap();
  atlas
    .build_with(&MockRasterizer, &mut SkylinePacker::new())
    .unwrap();

  let font = &atlas.fonts()[0];
  let glyph = font.find_glyph_no_fallback('A' as u32).unwrap();
  assert_eq!(glyph.v0, 0.0);
  assert!(glyph.u0 > 0.0);
  assert!(glyph.u1 > glyph.u0 && glyph.v1 > glyph.v0);
}

#[test]
fn advance_clamp_recenters_glyph() {
  let mut atlas = FontAtlas::new();
  atlas.tex_desired_width = 512;
  let mut source = plain_source(20.0);
  // Natural advance is 500 units * 20 / 1000 = 10px; force at least 20px.
  source.glyph_min_advance_x = 20.0;
  atlas.add_font(source).unwrap();
  atlas
    .build_with(&MockRasterizer, &mut SkylinePacker::new())
    .unwrap();

  let font = &atlas.fonts()[0];
  let glyph = font.find_glyph_no_fallback('A' as u32).unwrap();
  assert_eq!(glyph.advance_x, 20.0);
  // The glyph box shifted right by half the clamp delta.
  assert!(glyph.x0 > 1.0);
}

#[test]
fn merge_mode_first_writer_wins() {
  let mut atlas = FontAtlas::new();
  atlas.tex_desired_width = 512;
  let base = atlas.add_font(plain_source(20.0)).unwrap();
  // Merge a second source over the same range into the same font: all its
  // codepoints are already claimed, so it contributes nothing.
  let mut merged = plain_source(20.0);
  merged.merge_target = Some(base);
  let merged_id = atlas.add_font(merged).unwrap();
  assert_eq!(merged_id, base);
  atlas
    .build_with(&MockRasterizer, &mut SkylinePacker::new())
    .unwrap();

  // 0x20..0x7E visible glyphs once each, plus the synthesized tab.
  let font = &atlas.fonts()[0];
  let expected = (0x20..0x7Fu32).count() + 1;
  assert_eq!(font.glyphs.len(), expected);
}

#[test]
fn custom_rect_glyph_registered_on_font() {
  let mut atlas = FontAtlas::new();
  atlas.tex_desired_width = 512;
  let font_id = atlas.add_font(plain_source(20.0)).unwrap();
  atlas.add_custom_rect_font_glyph(font_id, 0x1F600, 16, 16, 18.0, Vec2::new(0.0, -2.0));
  atlas
    .build_with(&MockRasterizer, &mut SkylinePacker::new())
    .unwrap();

  let font = &atlas.fonts()[0];
  let glyph = font.find_glyph_no_fallback(0x1F600).unwrap();
  assert_eq!(glyph.advance_x, 18.0);
  assert_eq!((glyph.x1 - glyph.x0, glyph.y1 - glyph.y0), (16.0, 16.0));
  assert!(glyph.visible);
}

#[test]
fn text_renders_one_quad_per_visible_glyph() {
  let atlas = built_atlas();

  let mut ctx = DrawContext::new();
  ctx.set_font_atlas_data(TextureId(7), atlas.uv_white_pixel(), *atlas.uv_lines());
  let mut list = DrawList::new(Arc::new(ctx));

  let font = &atlas.fonts()[0];
  list.add_text(font, 20.0, Vec2::new(10.0, 10.0), Color32::WHITE, "AB C", 0.0, None);

  // Three visible glyphs; the space advances the pen without geometry.
  assert_eq!(list.vtx_buffer().len(), 3 * 4);
  assert_eq!(list.idx_buffer().len(), 3 * 6);

  // Quads advance left to right.
  let ax = list.vtx_buffer()[0].pos.x;
  let bx = list.vtx_buffer()[4].pos.x;
  assert!(bx > ax);
}

#[test]
fn text_cpu_fine_clip_trims_quads() {
  let atlas = built_atlas();

  let mut ctx = DrawContext::new();
  ctx.set_font_atlas_data(TextureId(7), atlas.uv_white_pixel(), *atlas.uv_lines());
  let mut list = DrawList::new(Arc::new(ctx));

  let font = &atlas.fonts()[0];
  let clip = fastdraw::Rect::from_xywh(0.0, 0.0, 14.0, 40.0);
  list.add_text(font, 20.0, Vec2::new(0.0, 0.0), Color32::WHITE, "AAAA", 0.0, Some(clip));

  // Every emitted vertex lies inside the fine clip rectangle.
  for v in list.vtx_buffer() {
    assert!(v.pos.x >= 0.0 && v.pos.x <= 14.0 + 1e-3);
  }
  // At most two glyphs can touch a 14px-wide clip at 10px advance.
  assert!(list.vtx_buffer().len() <= 2 * 4);
  assert!(!list.vtx_buffer().is_empty());
}

#[test]
fn wrapped_text_breaks_lines() {
  let atlas = built_atlas();
  let font = &atlas.fonts()[0];

  // 10px per glyph at size 20; "aaa bbb" wraps at 35px into two lines.
  let (size, _) = font.calc_text_size(20.0, f32::MAX, 35.0, "aaa bbb");
  assert_eq!(size.y, 40.0);
  let (size_unwrapped, _) = font.calc_text_size(20.0, f32::MAX, 0.0, "aaa bbb");
  assert_eq!(size_unwrapped.y, 20.0);
}
