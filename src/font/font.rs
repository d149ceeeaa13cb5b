//! Font runtime: lookup tables, measurement, text rendering
//!
//! A `Font` owns the glyphs the atlas registered on it plus two dense
//! per-codepoint tables (glyph index and advance width) rebuilt whenever the
//! glyph set changes. Text rendering walks UTF-8 input, resolves glyphs
//! through the tables, and appends one quad per visible glyph into a
//! [`DrawList`].

use crate::color::Color32;
use crate::draw::list::DrawList;
use crate::font::atlas::FontSource;
use crate::font::glyph::Glyph;
use crate::geometry::{Rect, Vec2};

/// Tab stops are rendered as this many space advances
const TAB_SIZE: u32 = 4;

/// Highest codepoint the dense tables may cover
const UNICODE_CODEPOINT_MAX: usize = 0x10FFFF;
const USED_PAGES_BYTES: usize = (UNICODE_CODEPOINT_MAX + 1) / 4096 / 8;

const INDEX_UNSET: u32 = u32::MAX;

/// Unicode replacement character, the preferred fallback glyph
pub const UNICODE_CODEPOINT_INVALID: u32 = 0xFFFD;

#[inline]
fn is_blank(c: u32) -> bool {
  c == ' ' as u32 || c == '\t' as u32 || c == 0x3000
}

/// Wrapping skips blanks (and one newline) at the start of the next line
fn word_wrap_next_line_start(text: &str, mut s: usize) -> usize {
  let bytes = text.as_bytes();
  while s < bytes.len() && (bytes[s] == b' ' || bytes[s] == b'\t') {
    s += 1;
  }
  if s < bytes.len() && bytes[s] == b'\n' {
    s += 1;
  }
  s
}

/// A runtime font: glyph storage plus dense codepoint lookup tables
pub struct Font {
  /// All registered glyphs; order is registration order
  pub glyphs: Vec<Glyph>,
  /// Dense per-codepoint advance cache; unset entries hold -1.0 until the
  /// lookup table build replaces them with the fallback advance
  index_advance_x: Vec<f32>,
  /// Dense codepoint -> glyph index table
  index_lookup: Vec<u32>,
  fallback_glyph: Option<usize>,
  pub fallback_advance_x: f32,
  pub fallback_char: Option<u32>,
  pub ellipsis_char: Option<u32>,
  pub ellipsis_char_count: u32,
  /// Total width of the rendered ellipsis
  pub ellipsis_width: f32,
  /// Step between repeated ellipsis characters (dot-synthesis mode)
  pub ellipsis_char_step: f32,
  /// Size the glyphs were rasterized at
  pub font_size: f32,
  /// User-adjustable display scale
  pub scale: f32,
  pub ascent: f32,
  pub descent: f32,
  pub(crate) dirty_lookup_table: bool,
  used_4k_pages: [u8; USED_PAGES_BYTES],
}

impl Font {
  pub fn new() -> Self {
    Self {
      glyphs: Vec::new(),
      index_advance_x: Vec::new(),
      index_lookup: Vec::new(),
      fallback_glyph: None,
      fallback_advance_x: 0.0,
      fallback_char: None,
      ellipsis_char: None,
      ellipsis_char_count: 0,
      ellipsis_width: 0.0,
      ellipsis_char_step: 0.0,
      font_size: 0.0,
      scale: 1.0,
      ascent: 0.0,
      descent: 0.0,
      dirty_lookup_table: true,
      used_4k_pages: [0; USED_PAGES_BYTES],
    }
  }

  pub fn is_loaded(&self) -> bool {
    !self.glyphs.is_empty()
  }

  pub(crate) fn clear_output_data(&mut self) {
    self.glyphs.clear();
    self.index_advance_x.clear();
    self.index_lookup.clear();
    self.fallback_glyph = None;
    self.fallback_advance_x = 0.0;
    self.ellipsis_char_count = 0;
    self.ellipsis_width = 0.0;
    self.ellipsis_char_step = 0.0;
    self.dirty_lookup_table = true;
    self.used_4k_pages = [0; USED_PAGES_BYTES];
  }

  fn grow_index(&mut self, new_size: usize) {
    debug_assert_eq!(self.index_advance_x.len(), self.index_lookup.len());
    if new_size <= self.index_lookup.len() {
      return;
    }
    self.index_advance_x.resize(new_size, -1.0);
    self.index_lookup.resize(new_size, INDEX_UNSET);
  }

  /// Registers one glyph
  ///
  /// With a source config, the advance is clamped to the configured
  /// min/max, the glyph box re-centered by half the clamp delta, the
  /// advance pixel-snapped, and extra spacing baked in — in exactly that
  /// order; reordering changes glyph spacing.
  #[allow(clippy::too_many_arguments)]
  pub fn add_glyph(
    &mut self,
    cfg: Option<&FontSource>,
    codepoint: u32,
    mut x0: f32,
    y0: f32,
    mut x1: f32,
    y1: f32,
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
    mut advance_x: f32,
  ) {
    if let Some(cfg) = cfg {
      let advance_x_original = advance_x;
      advance_x = advance_x.clamp(cfg.glyph_min_advance_x, cfg.glyph_max_advance_x);
      if advance_x != advance_x_original {
        let char_off_x = if cfg.pixel_snap_h {
          ((advance_x - advance_x_original) * 0.5).trunc()
        } else {
          (advance_x - advance_x_original) * 0.5
        };
        x0 += char_off_x;
        x1 += char_off_x;
      }

      if cfg.pixel_snap_h {
        advance_x = advance_x.round();
      }

      advance_x += cfg.glyph_extra_spacing.x;
    }

    self.glyphs.push(Glyph {
      codepoint,
      visible: x0 != x1 && y0 != y1,
      colored: false,
      advance_x,
      x0,
      y0,
      x1,
      y1,
      u0,
      v0,
      u1,
      v1,
    });
    self.dirty_lookup_table = true;
  }

  /// Directs `dst` to render as `src`'s glyph
  ///
  /// Only valid after the font has been built.
  pub fn add_remap_char(&mut self, dst: u32, src: u32, overwrite_dst: bool) {
    assert!(!self.index_lookup.is_empty(), "font not built yet");
    let index_size = self.index_lookup.len() as u32;

    if dst < index_size && self.index_lookup[dst as usize] == INDEX_UNSET && !overwrite_dst {
      return;
    }
    if src >= index_size && dst >= index_size {
      return;
    }

    self.grow_index(dst as usize + 1);
    self.index_lookup[dst as usize] = if src < index_size {
      self.index_lookup[src as usize]
    } else {
      INDEX_UNSET
    };
    self.index_advance_x[dst as usize] = if src < index_size {
      self.index_advance_x[src as usize]
    } else {
      1.0
    };
  }

  pub fn set_glyph_visible(&mut self, codepoint: u32, visible: bool) {
    if let Some(i) = self.glyph_index(codepoint) {
      self.glyphs[i].visible = visible;
    }
  }

  fn glyph_index(&self, codepoint: u32) -> Option<usize> {
    let i = *self.index_lookup.get(codepoint as usize)?;
    if i == INDEX_UNSET {
      None
    } else {
      Some(i as usize)
    }
  }

  pub fn find_glyph(&self, codepoint: u32) -> Option<&Glyph> {
    match self.glyph_index(codepoint) {
      Some(i) => Some(&self.glyphs[i]),
      None => self.fallback_glyph.map(|i| &self.glyphs[i]),
    }
  }

  pub fn find_glyph_no_fallback(&self, codepoint: u32) -> Option<&Glyph> {
    self.glyph_index(codepoint).map(|i| &self.glyphs[i])
  }

  /// Advance width of a codepoint, falling back for unmapped ones
  #[inline]
  pub fn char_advance(&self, codepoint: u32) -> f32 {
    match self.index_advance_x.get(codepoint as usize) {
      Some(&advance) => advance,
      None => self.fallback_advance_x,
    }
  }

  /// True when no codepoint in `[begin, last]` has a registered glyph
  ///
  /// Granularity is 4K codepoints; useful to skip whole scripts cheaply,
  /// e.g. `is_glyph_range_unused(0, 255)`.
  pub fn is_glyph_range_unused(&self, begin: u32, last: u32) -> bool {
    let page_begin = (begin / 4096) as usize;
    let page_last = (last / 4096) as usize;
    for page in page_begin..=page_last {
      if page >> 3 < self.used_4k_pages.len()
        && self.used_4k_pages[page >> 3] & (1 << (page & 7)) != 0
      {
        return false;
      }
    }
    true
  }

  /// Rebuilds the dense lookup tables after glyphs changed
  ///
  /// Synthesizes the tab glyph, marks blanks invisible, resolves the
  /// fallback glyph (replacement char, then '?', then space, else the last
  /// glyph) and the ellipsis (U+2026, then U+0085, else three dots).
  pub fn build_lookup_table(&mut self) {
    assert!(self.is_loaded(), "font has no loaded glyphs");
    assert!(self.glyphs.len() < 0xFFFF);
    let max_codepoint = self.glyphs.iter().map(|g| g.codepoint).max().unwrap() as usize;

    self.index_advance_x.clear();
    self.index_lookup.clear();
    self.dirty_lookup_table = false;
    self.used_4k_pages = [0; USED_PAGES_BYTES];
    self.grow_index(max_codepoint + 1);
    for (i, glyph) in self.glyphs.iter().enumerate() {
      let cp = glyph.codepoint as usize;
      self.index_advance_x[cp] = glyph.advance_x;
      self.index_lookup[cp] = i as u32;

      let page = cp / 4096;
      self.used_4k_pages[page >> 3] |= 1 << (page & 7);
    }

    // Tab renders as a wide space.
    if let Some(space) = self.find_glyph_no_fallback(' ' as u32).copied() {
      // Guard against the tab glyph being appended twice when this function
      // runs again after further glyph additions.
      if self.glyphs.last().map(|g| g.codepoint) != Some('\t' as u32) {
        self.glyphs.push(space);
      }
      let tab_index = self.glyphs.len() - 1;
      let tab = &mut self.glyphs[tab_index];
      *tab = space;
      tab.codepoint = '\t' as u32;
      tab.advance_x *= TAB_SIZE as f32;
      let tab_advance = tab.advance_x;
      self.index_advance_x['\t' as usize] = tab_advance;
      self.index_lookup['\t' as usize] = tab_index as u32;
    }

    self.set_glyph_visible(' ' as u32, false);
    self.set_glyph_visible('\t' as u32, false);

    // Fallback character resolution.
    let fallback_chars = [UNICODE_CODEPOINT_INVALID, '?' as u32, ' ' as u32];
    self.fallback_glyph = self.fallback_char.and_then(|c| self.glyph_index(c));
    if self.fallback_glyph.is_none() {
      for &c in &fallback_chars {
        if let Some(i) = self.glyph_index(c) {
          self.fallback_char = Some(c);
          self.fallback_glyph = Some(i);
          break;
        }
      }
      if self.fallback_glyph.is_none() {
        let last = self.glyphs.len() - 1;
        self.fallback_glyph = Some(last);
        self.fallback_char = Some(self.glyphs[last].codepoint);
      }
    }
    self.fallback_advance_x = self.glyphs[self.fallback_glyph.unwrap()].advance_x;
    for advance in &mut self.index_advance_x {
      if *advance < 0.0 {
        *advance = self.fallback_advance_x;
      }
    }

    // Ellipsis resolution: a real ellipsis glyph when present, otherwise
    // three packed dots.
    let ellipsis_chars = [0x2026u32, 0x0085];
    let dot_chars = ['.' as u32, 0xFF0E];
    if self.ellipsis_char.is_none() {
      self.ellipsis_char = ellipsis_chars.iter().copied().find(|&c| self.glyph_index(c).is_some());
    }
    let dot_char = dot_chars.iter().copied().find(|&c| self.glyph_index(c).is_some());
    if let Some(e) = self.ellipsis_char {
      if let Some(glyph) = self.find_glyph_no_fallback(e).copied() {
        self.ellipsis_char_count = 1;
        self.ellipsis_width = glyph.x1;
        self.ellipsis_char_step = glyph.x1;
      }
    } else if let Some(d) = dot_char {
      let glyph = *self.find_glyph_no_fallback(d).unwrap();
      self.ellipsis_char = Some(d);
      self.ellipsis_char_count = 3;
      self.ellipsis_char_step = (glyph.x1 - glyph.x0) + 1.0;
      self.ellipsis_width = self.ellipsis_char_step * 3.0 - 1.0;
    }
  }

  // ==========================================================================
  // Measurement
  // ==========================================================================

  /// Next position to wrap `text` from, as a byte offset
  ///
  /// Greedy wrap: trailing blanks are skipped (not counted into line
  /// width), a wrap point is allowed after `. , ; ! ? "` even mid-token,
  /// and a word wider than the wrap width is cut mid-word rather than
  /// overflowing.
  pub fn calc_word_wrap_position(&self, scale: f32, text: &str, wrap_width: f32) -> usize {
    // Work in unscaled widths to avoid scaling every character.
    let wrap_width = wrap_width / scale;

    let mut line_width = 0.0f32;
    let mut word_width = 0.0f32;
    let mut blank_width = 0.0f32;

    let mut word_end = 0usize;
    let mut prev_word_end: Option<usize> = None;
    let mut inside_word = true;

    let mut s = 0usize;
    for (i, c) in text.char_indices() {
      s = i;
      let next_s = i + c.len_utf8();
      let cp = c as u32;

      if cp < 32 {
        if c == '\n' {
          line_width = 0.0;
          word_width = 0.0;
          blank_width = 0.0;
          inside_word = true;
          s = next_s;
          continue;
        }
        if c == '\r' {
          s = next_s;
          continue;
        }
      }

      let char_width = self.char_advance(cp);
      if is_blank(cp) {
        if inside_word {
          line_width += blank_width;
          blank_width = 0.0;
          word_end = i;
        }
        blank_width += char_width;
        inside_word = false;
      } else {
        word_width += char_width;
        if inside_word {
          word_end = next_s;
        } else {
          prev_word_end = Some(word_end);
          line_width += word_width + blank_width;
          word_width = 0.0;
          blank_width = 0.0;
        }

        // Allow wrapping after punctuation.
        inside_word = !matches!(c, '.' | ',' | ';' | '!' | '?' | '"');
      }

      // Trailing blank width is ignored: blanks at a line end are skipped.
      if line_width + word_width > wrap_width {
        // A word that cannot possibly fit within a line is cut anywhere.
        if word_width < wrap_width {
          s = prev_word_end.unwrap_or(word_end);
        }
        return wrap_position_minimum(text, s);
      }

      s = next_s;
    }

    s
  }

  /// Measures `text`, stopping at `max_width`; wraps when `wrap_width` > 0
  ///
  /// Returns the size and the byte offset of the first unconsumed character.
  pub fn calc_text_size(&self, size: f32, max_width: f32, wrap_width: f32, text: &str) -> (Vec2, usize) {
    let line_height = size;
    let scale = size / self.font_size;

    let mut text_size = Vec2::ZERO;
    let mut line_width = 0.0f32;

    let word_wrap_enabled = wrap_width > 0.0;
    let mut word_wrap_eol: Option<usize> = None;

    let mut s = 0usize;
    while s < text.len() {
      if word_wrap_enabled {
        if word_wrap_eol.is_none() {
          word_wrap_eol = Some(s + self.calc_word_wrap_position(scale, &text[s..], wrap_width - line_width));
        }
        if s >= word_wrap_eol.unwrap() {
          if text_size.x < line_width {
            text_size.x = line_width;
          }
          text_size.y += line_height;
          line_width = 0.0;
          word_wrap_eol = None;
          s = word_wrap_next_line_start(text, s);
          continue;
        }
      }

      let prev_s = s;
      let c = text[s..].chars().next().unwrap();
      s += c.len_utf8();

      if (c as u32) < 32 {
        if c == '\n' {
          text_size.x = text_size.x.max(line_width);
          text_size.y += line_height;
          line_width = 0.0;
          continue;
        }
        if c == '\r' {
          continue;
        }
      }

      let char_width = self.char_advance(c as u32) * scale;
      if line_width + char_width >= max_width {
        s = prev_s;
        break;
      }
      line_width += char_width;
    }

    if text_size.x < line_width {
      text_size.x = line_width;
    }
    if line_width > 0.0 || text_size.y == 0.0 {
      text_size.y += line_height;
    }

    (text_size, s)
  }

  // ==========================================================================
  // Rendering
  // ==========================================================================

  /// Appends a single glyph quad
  ///
  /// The font atlas texture must be bound on the draw list.
  pub fn render_char(&self, draw_list: &mut DrawList, size: f32, pos: Vec2, col: Color32, codepoint: u32) {
    let Some(glyph) = self.find_glyph(codepoint) else {
      return;
    };
    if !glyph.visible {
      return;
    }
    let col = if glyph.colored { col.opaque() } else { col };
    let scale = if size >= 0.0 { size / self.font_size } else { 1.0 };
    let x = pos.x.trunc();
    let y = pos.y.trunc();
    let mut w = draw_list.prim_reserve(6, 4);
    w.rect_uv(
      Vec2::new(x + glyph.x0 * scale, y + glyph.y0 * scale),
      Vec2::new(x + glyph.x1 * scale, y + glyph.y1 * scale),
      Vec2::new(glyph.u0, glyph.v0),
      Vec2::new(glyph.u1, glyph.v1),
      col,
    );
    w.finish();
  }

  /// Appends one quad per visible glyph of `text`
  ///
  /// Lines above the clip rectangle are skipped without emitting geometry;
  /// a worst-case vertex budget is reserved for the remainder and surplus is
  /// given back at the end. With `cpu_fine_clip`, glyph quads straddling the
  /// clip rectangle are trimmed CPU-side with their UVs adjusted.
  #[allow(clippy::too_many_arguments)]
  pub fn render_text(
    &self,
    draw_list: &mut DrawList,
    size: f32,
    pos: Vec2,
    col: Color32,
    clip_rect: Rect,
    text: &str,
    wrap_width: f32,
    cpu_fine_clip: bool,
  ) {
    // Align to the pixel grid.
    let mut x = pos.x.trunc();
    let mut y = pos.y.trunc();
    if y > clip_rect.max.y {
      return;
    }

    let start_x = x;
    let scale = size / self.font_size;
    let line_height = self.font_size * scale;
    let word_wrap_enabled = wrap_width > 0.0;

    // Fast-forward to the first visible line.
    let mut s = 0usize;
    let mut text_end = text.len();
    if y + line_height < clip_rect.min.y {
      while y + line_height < clip_rect.min.y && s < text_end {
        let line_end = text[s..].find('\n').map(|i| s + i);
        if word_wrap_enabled {
          let wrap_end = line_end.unwrap_or(text_end);
          s += self.calc_word_wrap_position(scale, &text[s..wrap_end], wrap_width);
          s = word_wrap_next_line_start(text, s);
        } else {
          s = line_end.map(|i| i + 1).unwrap_or(text_end);
        }
        y += line_height;
      }
    }

    // For very long unwrapped text, scan ahead for the last visible line so
    // the reservation below stays proportional to what is drawn.
    if text_end - s > 10000 && !word_wrap_enabled {
      let mut s_end = s;
      let mut y_end = y;
      while y_end < clip_rect.max.y && s_end < text_end {
        s_end = text[s_end..].find('\n').map(|i| s_end + i + 1).unwrap_or(text_end);
        y_end += line_height;
      }
      text_end = s_end;
    }
    if s == text_end {
      return;
    }

    // Reserve for the worst case; over-reserving is cheap and trimmed below.
    let chars_max = text_end - s;
    let vtx_count_max = chars_max * 4;
    let idx_count_max = chars_max * 6;
    let mut w = draw_list.prim_reserve(idx_count_max, vtx_count_max);

    let col_untinted = col.opaque();
    let mut word_wrap_eol: Option<usize> = None;

    while s < text_end {
      if word_wrap_enabled {
        if word_wrap_eol.is_none() {
          word_wrap_eol =
            Some(s + self.calc_word_wrap_position(scale, &text[s..text_end], wrap_width - (x - start_x)));
        }
        if s >= word_wrap_eol.unwrap() {
          x = start_x;
          y += line_height;
          word_wrap_eol = None;
          s = word_wrap_next_line_start(text, s);
          continue;
        }
      }

      let c = text[s..].chars().next().unwrap();
      s += c.len_utf8();
      let cp = c as u32;

      if cp < 32 {
        if c == '\n' {
          x = start_x;
          y += line_height;
          if y > clip_rect.max.y {
            break;
          }
          continue;
        }
        if c == '\r' {
          continue;
        }
      }

      let Some(glyph) = self.find_glyph(cp) else {
        continue;
      };
      let char_width = glyph.advance_x * scale;
      if glyph.visible {
        let mut x1 = x + glyph.x0 * scale;
        let mut x2 = x + glyph.x1 * scale;
        let mut y1 = y + glyph.y0 * scale;
        let mut y2 = y + glyph.y1 * scale;
        // No finer vertical test: everything above the clip top was skipped
        // and the loop exits once past the bottom.
        if x1 <= clip_rect.max.x && x2 >= clip_rect.min.x {
          let mut u1 = glyph.u0;
          let mut v1 = glyph.v0;
          let mut u2 = glyph.u1;
          let mut v2 = glyph.v1;

          // CPU-side clipping of axis-aligned quads, adjusting UVs to match.
          if cpu_fine_clip {
            if x1 < clip_rect.min.x {
              u1 += (1.0 - (x2 - clip_rect.min.x) / (x2 - x1)) * (u2 - u1);
              x1 = clip_rect.min.x;
            }
            if y1 < clip_rect.min.y {
              v1 += (1.0 - (y2 - clip_rect.min.y) / (y2 - y1)) * (v2 - v1);
              y1 = clip_rect.min.y;
            }
            if x2 > clip_rect.max.x {
              u2 = u1 + ((clip_rect.max.x - x1) / (x2 - x1)) * (u2 - u1);
              x2 = clip_rect.max.x;
            }
            if y2 > clip_rect.max.y {
              v2 = v1 + ((clip_rect.max.y - y1) / (y2 - y1)) * (v2 - v1);
              y2 = clip_rect.max.y;
            }
            if y1 >= y2 {
              x += char_width;
              continue;
            }
          }

          let glyph_col = if glyph.colored { col_untinted } else { col };
          w.rect_uv(
            Vec2::new(x1, y1),
            Vec2::new(x2, y2),
            Vec2::new(u1, v1),
            Vec2::new(u2, v2),
            glyph_col,
          );
        }
      }
      x += char_width;
    }

    // Give back the unused reservation (clipped glyphs, blanks).
    let (vtx_used, idx_used) = w.finish_partial();
    draw_list.prim_unreserve(idx_count_max - idx_used, vtx_count_max - vtx_used);
  }
}

impl Default for Font {
  fn default() -> Self {
    Self::new()
  }
}

/// When the wrap width fits nothing, force one character to keep line
/// heights continuous
fn wrap_position_minimum(text: &str, s: usize) -> usize {
  if s == 0 && !text.is_empty() {
    text.chars().next().map(char::len_utf8).unwrap_or(1)
  } else {
    s
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Builds a font with fixed-advance printable-ASCII glyphs
  fn test_font(advance: f32) -> Font {
    let mut font = Font::new();
    font.font_size = 10.0;
    for cp in 0x20u32..0x7F {
      let visible = cp != ' ' as u32;
      let (x0, x1) = if visible { (0.0, advance) } else { (0.0, 0.0) };
      font.add_glyph(None, cp, x0, 0.0, x1, if visible { 10.0 } else { 0.0 }, 0.0, 0.0, 1.0, 1.0, advance);
    }
    font.build_lookup_table();
    font
  }

  #[test]
  fn test_lookup_fallback_is_question_mark() {
    let font = test_font(5.0);
    assert_eq!(font.fallback_char, Some('?' as u32));
    // Unmapped codepoints resolve to the fallback glyph.
    let glyph = font.find_glyph(0x2603).unwrap();
    assert_eq!(glyph.codepoint, '?' as u32);
    assert!(font.find_glyph_no_fallback(0x2603).is_none());
  }

  #[test]
  fn test_lookup_synthesizes_tab() {
    let font = test_font(5.0);
    let tab = font.find_glyph_no_fallback('\t' as u32).unwrap();
    assert_eq!(tab.advance_x, 5.0 * 4.0);
    assert!(!tab.visible);
    let space = font.find_glyph_no_fallback(' ' as u32).unwrap();
    assert!(!space.visible);
  }

  #[test]
  fn test_lookup_rebuild_does_not_duplicate_tab() {
    let mut font = test_font(5.0);
    let count = font.glyphs.len();
    font.build_lookup_table();
    assert_eq!(font.glyphs.len(), count);
  }

  #[test]
  fn test_glyph_range_unused() {
    let font = test_font(5.0);
    assert!(!font.is_glyph_range_unused(0, 255));
    assert!(font.is_glyph_range_unused(0x4E00, 0x9FFF));
  }

  #[test]
  fn test_ellipsis_falls_back_to_three_dots() {
    let font = test_font(5.0);
    assert_eq!(font.ellipsis_char, Some('.' as u32));
    assert_eq!(font.ellipsis_char_count, 3);
    assert_eq!(font.ellipsis_char_step, 6.0); // dot box width 5 + 1
    assert_eq!(font.ellipsis_width, 6.0 * 3.0 - 1.0);
  }

  #[test]
  fn test_word_wrap_prefers_word_boundary() {
    let font = test_font(5.0);
    // "aaa bbb" at width 25: "aaa" (15) + blank (5) + 'b' overflows at the
    // second 'b'; wrap lands after "aaa".
    let pos = font.calc_word_wrap_position(1.0, "aaa bbb", 25.0);
    assert_eq!(&"aaa bbb"[..pos], "aaa");
  }

  #[test]
  fn test_word_wrap_cuts_overlong_word() {
    let font = test_font(5.0);
    let pos = font.calc_word_wrap_position(1.0, "abcdefghij", 20.0);
    assert!(pos > 0 && pos < 10);
  }

  #[test]
  fn test_word_wrap_allows_break_after_punctuation() {
    let font = test_font(5.0);
    // Wrap point permitted right after the comma, mid-token.
    let text = "ab,cd";
    let pos = font.calc_word_wrap_position(1.0, text, 17.0);
    assert_eq!(&text[..pos], "ab,");
  }

  #[test]
  fn test_word_wrap_tiny_width_forces_one_char() {
    let font = test_font(5.0);
    assert_eq!(font.calc_word_wrap_position(1.0, "abc", 1.0), 1);
  }

  #[test]
  fn test_word_wrap_idempotent_on_wrapped_lines() {
    let font = test_font(5.0);
    let text = "the quick brown fox jumps over the lazy dog";
    let width = 60.0;
    // Wrap the whole text into lines, then re-wrap each line: no new breaks.
    let mut lines = Vec::new();
    let mut s = 0;
    while s < text.len() {
      let pos = s + font.calc_word_wrap_position(1.0, &text[s..], width);
      lines.push(&text[s..pos]);
      s = word_wrap_next_line_start(text, pos);
      assert!(s > 0);
    }
    for line in lines {
      let pos = font.calc_word_wrap_position(1.0, line, width);
      assert_eq!(pos, line.len(), "line {:?} re-wrapped", line);
    }
  }

  #[test]
  fn test_calc_text_size_multiline() {
    let font = test_font(5.0);
    let (size, remaining) = font.calc_text_size(10.0, f32::MAX, 0.0, "abc\nab");
    assert_eq!(size, Vec2::new(15.0, 20.0));
    assert_eq!(remaining, 6);
  }

  #[test]
  fn test_calc_text_size_empty_has_one_line_height() {
    let font = test_font(5.0);
    let (size, _) = font.calc_text_size(10.0, f32::MAX, 0.0, "");
    assert_eq!(size.y, 10.0);
  }

  #[test]
  fn test_char_advance_uses_fallback_for_unknown() {
    let font = test_font(5.0);
    assert_eq!(font.char_advance(0x30000), font.fallback_advance_x);
  }
}
