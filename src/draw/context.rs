//! Shared tessellation context
//!
//! One `DrawContext` exists per draw-list-owning renderer and is shared by
//! all of its draw lists through an `Arc`. It owns the caches the tessellator
//! consults on every call: the unit-circle sample table for fast arcs, the
//! per-radius circle segment counts, curve flattening tolerance, and the
//! texture data published by the font atlas (white pixel UV, baked line UVs).
//!
//! Everything here is computed once at construction (or when the renderer
//! rebuilds its atlas) and treated as immutable while draw lists are being
//! recorded.

use crate::draw::list::{DrawListFlags, TextureId};
use crate::geometry::{Rect, Vec2};
use std::f32::consts::PI;

/// Number of precomputed unit-circle samples used by the fast arc path
pub const ARC_FAST_TABLE_SIZE: usize = 48;

/// Largest line width (in pixels) covered by the baked line texture ramp
pub const TEX_LINES_WIDTH_MAX: usize = 63;

const CIRCLE_SEGMENT_MIN: u32 = 4;
const CIRCLE_SEGMENT_MAX: u32 = 512;

/// Number of segments to tessellate a circle of `radius` with, keeping the
/// deviation from a true circle under `max_error` pixels
fn circle_auto_segment_count(radius: f32, max_error: f32) -> u32 {
  let n = (PI / (1.0 - max_error.min(radius) / radius).acos()).ceil() as u32;
  // Round up to even so opposing points land on the axes.
  ((n + 1) / 2 * 2).clamp(CIRCLE_SEGMENT_MIN, CIRCLE_SEGMENT_MAX)
}

/// Largest radius drawable with `segment_count` segments within `max_error`
fn circle_auto_segment_radius(segment_count: f32, max_error: f32) -> f32 {
  max_error / (1.0 - (PI / segment_count.max(PI)).cos())
}

/// Shared tessellation tables and configuration
pub struct DrawContext {
  /// Unit-circle samples, counter-clockwise from east in Y-down coordinates
  pub(crate) arc_fast_vtx: [Vec2; ARC_FAST_TABLE_SIZE],
  /// Radius below which the fast arc sample table is accurate enough
  pub(crate) arc_fast_radius_cutoff: f32,
  /// Auto segment count per integer radius (index = radius in pixels)
  circle_segment_counts: [u8; 64],
  circle_segment_max_error: f32,
  /// Flatness tolerance for adaptive Bezier subdivision
  pub curve_tessellation_tol: f32,
  /// Flags given to draw lists on reset
  pub initial_flags: DrawListFlags,
  /// Clip rectangle restored when the clip stack empties
  pub clip_rect_full_screen: Rect,
  /// Texture holding the font atlas (white pixel, baked lines, glyphs)
  pub font_texture_id: TextureId,
  /// UV of an opaque white texel inside the atlas
  pub tex_uv_white_pixel: Vec2,
  /// Per-width UVs into the baked line ramp; `[n]` covers a line of width n.
  /// Each entry stores (u0, v, u1, v) with a constant mid-row V.
  pub tex_uv_lines: [Rect; TEX_LINES_WIDTH_MAX + 1],
}

impl DrawContext {
  pub fn new() -> Self {
    let mut arc_fast_vtx = [Vec2::ZERO; ARC_FAST_TABLE_SIZE];
    for (i, v) in arc_fast_vtx.iter_mut().enumerate() {
      let a = i as f32 * 2.0 * PI / ARC_FAST_TABLE_SIZE as f32;
      *v = Vec2::new(a.cos(), a.sin());
    }

    let mut ctx = Self {
      arc_fast_vtx,
      arc_fast_radius_cutoff: 0.0,
      circle_segment_counts: [0; 64],
      circle_segment_max_error: 0.0,
      curve_tessellation_tol: 1.25,
      initial_flags: DrawListFlags::default(),
      clip_rect_full_screen: Rect::from_xywh(0.0, 0.0, f32::MAX, f32::MAX),
      font_texture_id: TextureId::default(),
      tex_uv_white_pixel: Vec2::ZERO,
      tex_uv_lines: [Rect::ZERO; TEX_LINES_WIDTH_MAX + 1],
    };
    ctx.set_circle_tessellation_max_error(0.30);
    ctx
  }

  /// Rebuilds the per-radius segment count cache for a new error tolerance
  pub fn set_circle_tessellation_max_error(&mut self, max_error: f32) {
    if self.circle_segment_max_error == max_error {
      return;
    }
    assert!(max_error > 0.0);
    self.circle_segment_max_error = max_error;
    for (i, count) in self.circle_segment_counts.iter_mut().enumerate() {
      *count = if i > 0 {
        circle_auto_segment_count(i as f32, max_error).min(255) as u8
      } else {
        ARC_FAST_TABLE_SIZE as u8
      };
    }
    self.arc_fast_radius_cutoff =
      circle_auto_segment_radius(ARC_FAST_TABLE_SIZE as f32, max_error);
  }

  /// Segment count for a circle of `radius`, from the cache when possible
  pub fn calc_circle_auto_segment_count(&self, radius: f32) -> u32 {
    // Ceil to never reduce accuracy for fractional radii.
    let radius_idx = (radius + 0.999999) as usize;
    if radius_idx < self.circle_segment_counts.len() {
      self.circle_segment_counts[radius_idx] as u32
    } else {
      circle_auto_segment_count(radius, self.circle_segment_max_error)
    }
  }

  /// Publishes the atlas texture data draw lists sample from
  ///
  /// Called after a successful atlas build, before any draw list using this
  /// context records text or textured lines.
  pub fn set_font_atlas_data(
    &mut self,
    texture_id: TextureId,
    uv_white_pixel: Vec2,
    uv_lines: [Rect; TEX_LINES_WIDTH_MAX + 1],
  ) {
    self.font_texture_id = texture_id;
    self.tex_uv_white_pixel = uv_white_pixel;
    self.tex_uv_lines = uv_lines;
  }
}

impl Default for DrawContext {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_arc_table_starts_east() {
    let ctx = DrawContext::new();
    let east = ctx.arc_fast_vtx[0];
    assert!((east.x - 1.0).abs() < 1e-6 && east.y.abs() < 1e-6);
    // Quarter way through the table points south (Y-down).
    let south = ctx.arc_fast_vtx[ARC_FAST_TABLE_SIZE / 4];
    assert!(south.x.abs() < 1e-6 && (south.y - 1.0).abs() < 1e-6);
  }

  #[test]
  fn test_segment_count_monotonic() {
    let ctx = DrawContext::new();
    let mut prev = 0;
    for r in 1..64 {
      let n = ctx.calc_circle_auto_segment_count(r as f32);
      assert!(n >= prev, "segment count decreased at radius {}", r);
      assert!(n >= 4 && n <= 512);
      prev = n;
    }
  }

  #[test]
  fn test_segment_count_even() {
    let ctx = DrawContext::new();
    for r in [1.0, 5.0, 17.0, 100.0, 300.0] {
      let n = ctx.calc_circle_auto_segment_count(r);
      assert_eq!(n % 2, 0, "odd segment count for radius {}", r);
    }
  }

  #[test]
  fn test_tolerance_change_rebuilds_cache() {
    let mut ctx = DrawContext::new();
    let coarse = ctx.calc_circle_auto_segment_count(32.0);
    ctx.set_circle_tessellation_max_error(0.05);
    let fine = ctx.calc_circle_auto_segment_count(32.0);
    assert!(fine > coarse);
  }
}
