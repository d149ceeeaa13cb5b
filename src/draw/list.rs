//! Draw list: command buffer, path builder, tessellator
//!
//! A `DrawList` owns the growable vertex/index arenas and the list of draw
//! commands (clip rectangle + texture + triangle range) that a backend turns
//! into GPU draw calls. Drawing functions append triangles to the *current*
//! command; changing clip/texture state closes it and opens a new one, with
//! opportunistic merging to keep the command count minimal.
//!
//! The scheme is optimized so the common drawing calls never branch on state:
//! the buffer always ends with at least one command ready to receive
//! triangles, and the cost of state analysis is paid only in the
//! `on_changed_*` handlers.
//!
//! # Winding and anti-aliasing
//!
//! Filled shapes must use clockwise winding (Y-down). The anti-aliasing
//! fringe — a one-pixel translucent border — depends on it; counter-clockwise
//! shapes get an inward fringe.

use crate::color::Color32;
use crate::draw::context::{DrawContext, ARC_FAST_TABLE_SIZE, TEX_LINES_WIDTH_MAX};
use crate::draw::splitter::DrawListSplitter;
use crate::draw::triangulator::{TriScratch, Triangulator};
use crate::draw::vertex::{DrawIdx, DrawVert, PrimWindow};
use crate::font::font::Font;
use crate::geometry::{Rect, Vec2};
use std::f32::consts::PI;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// Opaque texture handle passed through to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u64);

/// Per-list tessellation options
///
/// Reset to [`DrawContext::initial_flags`] at the start of each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawListFlags {
  /// Synthesize fringe geometry for stroked lines
  pub anti_aliased_lines: bool,
  /// Draw integer-width lines by sampling the baked line texture instead of
  /// synthesizing fringe geometry (requires an atlas built with the ramp)
  pub anti_aliased_lines_use_tex: bool,
  /// Synthesize fringe geometry for filled shapes
  pub anti_aliased_fill: bool,
  /// Permit rotating the vertex offset so 16-bit indices can address more
  /// than 65536 vertices (backend must honor `DrawCmd::vtx_offset`)
  pub allow_vtx_offset: bool,
}

impl Default for DrawListFlags {
  fn default() -> Self {
    Self {
      anti_aliased_lines: true,
      anti_aliased_lines_use_tex: false,
      anti_aliased_fill: true,
      allow_vtx_offset: false,
    }
  }
}

/// Which corners of a rectangle get rounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundCorners {
  pub top_left: bool,
  pub top_right: bool,
  pub bottom_left: bool,
  pub bottom_right: bool,
}

impl RoundCorners {
  pub const ALL: Self = Self {
    top_left: true,
    top_right: true,
    bottom_left: true,
    bottom_right: true,
  };
  pub const NONE: Self = Self {
    top_left: false,
    top_right: false,
    bottom_left: false,
    bottom_right: false,
  };

  pub const fn top() -> Self {
    Self {
      top_left: true,
      top_right: true,
      bottom_left: false,
      bottom_right: false,
    }
  }

  pub const fn bottom() -> Self {
    Self {
      top_left: false,
      top_right: false,
      bottom_left: true,
      bottom_right: true,
    }
  }

  pub const fn left() -> Self {
    Self {
      top_left: true,
      top_right: false,
      bottom_left: true,
      bottom_right: false,
    }
  }

  pub const fn right() -> Self {
    Self {
      top_left: false,
      top_right: true,
      bottom_left: false,
      bottom_right: true,
    }
  }

  pub fn any(self) -> bool {
    self.top_left || self.top_right || self.bottom_left || self.bottom_right
  }

  fn all_top(self) -> bool {
    self.top_left && self.top_right
  }

  fn all_bottom(self) -> bool {
    self.bottom_left && self.bottom_right
  }

  fn all_left(self) -> bool {
    self.top_left && self.bottom_left
  }

  fn all_right(self) -> bool {
    self.top_right && self.bottom_right
  }
}

impl Default for RoundCorners {
  fn default() -> Self {
    Self::ALL
  }
}

/// Callback attached to a draw command, invoked by the backend in submission
/// order in place of consuming vertices
pub type DrawCallback = Arc<dyn Fn(&DrawList, &DrawCmd) + Send + Sync>;

/// State shared by every triangle of a command: clip rectangle, texture, and
/// the vertex offset applied to its indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCmdHeader {
  pub clip_rect: Rect,
  pub texture_id: TextureId,
  pub vtx_offset: u32,
}

/// A contiguous range of indices sharing one clip rectangle and texture —
/// the unit of GPU submission
#[derive(Clone)]
pub struct DrawCmd {
  /// Scissor rectangle, in framebuffer pixels
  pub clip_rect: Rect,
  /// Texture bound while drawing this range
  pub texture_id: TextureId,
  /// Value added to every index of this command; lets 16-bit index storage
  /// address vertices beyond 65535
  pub vtx_offset: u32,
  /// First index of the range
  pub idx_offset: u32,
  /// Number of indices (3 per triangle); zero for trailing/callback commands
  pub elem_count: u32,
  /// When set, the backend invokes this instead of drawing geometry
  pub callback: Option<DrawCallback>,
}

impl DrawCmd {
  fn from_header(header: DrawCmdHeader, idx_offset: u32) -> Self {
    Self {
      clip_rect: header.clip_rect,
      texture_id: header.texture_id,
      vtx_offset: header.vtx_offset,
      idx_offset,
      elem_count: 0,
      callback: None,
    }
  }

  pub(crate) fn header(&self) -> DrawCmdHeader {
    DrawCmdHeader {
      clip_rect: self.clip_rect,
      texture_id: self.texture_id,
      vtx_offset: self.vtx_offset,
    }
  }

  pub(crate) fn header_eq(&self, other: &DrawCmdHeader) -> bool {
    self.clip_rect == other.clip_rect
      && self.texture_id == other.texture_id
      && self.vtx_offset == other.vtx_offset
  }

  pub(crate) fn copy_header(&mut self, header: &DrawCmdHeader) {
    self.clip_rect = header.clip_rect;
    self.texture_id = header.texture_id;
    self.vtx_offset = header.vtx_offset;
  }

  pub(crate) fn sequential_with(&self, next: &DrawCmd) -> bool {
    self.idx_offset + self.elem_count == next.idx_offset
  }
}

impl fmt::Debug for DrawCmd {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DrawCmd")
      .field("clip_rect", &self.clip_rect)
      .field("texture_id", &self.texture_id)
      .field("vtx_offset", &self.vtx_offset)
      .field("idx_offset", &self.idx_offset)
      .field("elem_count", &self.elem_count)
      .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
      .finish()
  }
}

// Averaged join normals are renormalized with an inverse-length-squared
// clamp to bound miter spikes at extreme angles.
const FIX_NORMAL_MAX_INV_LEN2: f32 = 100.0;

#[inline]
fn fix_normal(dm: Vec2) -> Vec2 {
  let d2 = dm.length_sqr();
  if d2 > 0.000001 {
    let inv_len2 = (1.0 / d2).min(FIX_NORMAL_MAX_INV_LEN2);
    dm * inv_len2
  } else {
    dm
  }
}

/// Batches drawing calls into vertex/index arenas partitioned into commands
///
/// ```
/// use fastdraw::{Color32, DrawContext, DrawList, Vec2};
/// use std::sync::Arc;
///
/// let ctx = Arc::new(DrawContext::new());
/// let mut list = DrawList::new(ctx);
/// list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
/// assert_eq!(list.vtx_buffer().len(), 4);
/// assert_eq!(list.idx_buffer().len(), 6);
/// ```
pub struct DrawList {
  pub(crate) cmd_buffer: Vec<DrawCmd>,
  pub(crate) idx_buffer: Vec<DrawIdx>,
  pub(crate) vtx_buffer: Vec<DrawVert>,
  pub flags: DrawListFlags,
  ctx: Arc<DrawContext>,
  pub(crate) vtx_current_idx: u32,
  clip_rect_stack: Vec<Rect>,
  texture_id_stack: Vec<TextureId>,
  path: Vec<Vec2>,
  pub(crate) cmd_header: DrawCmdHeader,
  splitter: DrawListSplitter,
  fringe_scale: f32,
  temp_buffer: Vec<Vec2>,
  tri_scratch: TriScratch,
}

impl DrawList {
  pub fn new(ctx: Arc<DrawContext>) -> Self {
    let mut list = Self {
      cmd_buffer: Vec::new(),
      idx_buffer: Vec::new(),
      vtx_buffer: Vec::new(),
      flags: ctx.initial_flags,
      cmd_header: DrawCmdHeader {
        clip_rect: ctx.clip_rect_full_screen,
        texture_id: ctx.font_texture_id,
        vtx_offset: 0,
      },
      ctx,
      vtx_current_idx: 0,
      clip_rect_stack: Vec::new(),
      texture_id_stack: Vec::new(),
      path: Vec::new(),
      splitter: DrawListSplitter::default(),
      fringe_scale: 1.0,
      temp_buffer: Vec::new(),
      tri_scratch: TriScratch::default(),
    };
    list.reset_for_new_frame();
    list
  }

  /// Clears geometry and reopens the list for a new frame
  ///
  /// The buffer always ends with a command ready to receive triangles, so
  /// drawing functions can extend it without a branch.
  pub fn reset_for_new_frame(&mut self) {
    if self.splitter.active_count() > 1 {
      let mut splitter = mem::take(&mut self.splitter);
      splitter.merge(self);
      self.splitter = splitter;
    }
    self.cmd_buffer.clear();
    self.idx_buffer.clear();
    self.vtx_buffer.clear();
    self.flags = self.ctx.initial_flags;
    self.cmd_header = DrawCmdHeader {
      clip_rect: self.ctx.clip_rect_full_screen,
      texture_id: self.ctx.font_texture_id,
      vtx_offset: 0,
    };
    self.vtx_current_idx = 0;
    self.clip_rect_stack.clear();
    self.texture_id_stack.clear();
    self.path.clear();
    self.splitter.clear();
    self.fringe_scale = 1.0;
    self.add_draw_cmd();
  }

  /// The shared tessellation context
  pub fn context(&self) -> &Arc<DrawContext> {
    &self.ctx
  }

  pub fn vtx_buffer(&self) -> &[DrawVert] {
    &self.vtx_buffer
  }

  pub fn idx_buffer(&self) -> &[DrawIdx] {
    &self.idx_buffer
  }

  pub fn commands(&self) -> &[DrawCmd] {
    &self.cmd_buffer
  }

  pub(crate) fn vtx_current_idx(&self) -> u32 {
    self.vtx_current_idx
  }

  /// Deep copy of the recorded output (commands + geometry)
  pub fn clone_output(&self) -> DrawList {
    let mut dst = DrawList::new(Arc::clone(&self.ctx));
    dst.cmd_buffer = self.cmd_buffer.clone();
    dst.idx_buffer = self.idx_buffer.clone();
    dst.vtx_buffer = self.vtx_buffer.clone();
    dst.flags = self.flags;
    dst
  }

  // ==========================================================================
  // Command management
  // ==========================================================================

  /// Closes the current command and opens a new one with the current header
  pub fn add_draw_cmd(&mut self) {
    let cmd = DrawCmd::from_header(self.cmd_header, self.idx_buffer.len() as u32);
    debug_assert!(cmd.clip_rect.min.x <= cmd.clip_rect.max.x && cmd.clip_rect.min.y <= cmd.clip_rect.max.y);
    self.cmd_buffer.push(cmd);
  }

  /// Removes trailing empty, callback-free commands before external
  /// consumption
  ///
  /// This leaves the list unfit for further drawing: most code assumes a
  /// trailing command exists.
  pub fn pop_unused_draw_cmd(&mut self) {
    while let Some(cmd) = self.cmd_buffer.last() {
      if cmd.elem_count != 0 || cmd.callback.is_some() {
        return;
      }
      self.cmd_buffer.pop();
    }
  }

  /// Attaches a callback command (zero geometry) and reopens a trailing
  /// command so the list invariants hold
  pub fn add_callback(&mut self, callback: DrawCallback) {
    let needs_new = {
      let curr = self.cmd_buffer.last().expect("draw list has no current command");
      assert!(curr.callback.is_none());
      curr.elem_count != 0
    };
    if needs_new {
      self.add_draw_cmd();
    }
    self.cmd_buffer.last_mut().unwrap().callback = Some(callback);
    // Force a new command after us so the callback's command stays closed.
    self.add_draw_cmd();
  }

  /// Merges the two last commands when their headers match and their index
  /// ranges are contiguous
  pub(crate) fn try_merge_draw_cmds(&mut self) {
    if self.cmd_buffer.len() < 2 {
      return;
    }
    let (prev, curr) = {
      let n = self.cmd_buffer.len();
      let (a, b) = self.cmd_buffer.split_at(n - 1);
      (&a[n - 2], &b[0])
    };
    if curr.header_eq(&prev.header())
      && prev.sequential_with(curr)
      && curr.callback.is_none()
      && prev.callback.is_none()
    {
      let elem_count = curr.elem_count;
      self.cmd_buffer.pop();
      self.cmd_buffer.last_mut().unwrap().elem_count += elem_count;
    }
  }

  fn on_changed_clip_rect(&mut self) {
    let curr = self.cmd_buffer.last().expect("draw list has no current command");
    if curr.elem_count != 0 && curr.clip_rect != self.cmd_header.clip_rect {
      self.add_draw_cmd();
      return;
    }
    debug_assert!(curr.callback.is_none());

    // Try to merge with the previous command if it matches, else reuse the
    // current (still empty) one.
    if curr.elem_count == 0 && self.cmd_buffer.len() > 1 {
      let prev = &self.cmd_buffer[self.cmd_buffer.len() - 2];
      if prev.header_eq(&self.cmd_header)
        && prev.sequential_with(curr)
        && prev.callback.is_none()
      {
        self.cmd_buffer.pop();
        return;
      }
    }
    let header = self.cmd_header;
    self.cmd_buffer.last_mut().unwrap().clip_rect = header.clip_rect;
  }

  fn on_changed_texture_id(&mut self) {
    let curr = self.cmd_buffer.last().expect("draw list has no current command");
    if curr.elem_count != 0 && curr.texture_id != self.cmd_header.texture_id {
      self.add_draw_cmd();
      return;
    }
    debug_assert!(curr.callback.is_none());

    if curr.elem_count == 0 && self.cmd_buffer.len() > 1 {
      let prev = &self.cmd_buffer[self.cmd_buffer.len() - 2];
      if prev.header_eq(&self.cmd_header)
        && prev.sequential_with(curr)
        && prev.callback.is_none()
      {
        self.cmd_buffer.pop();
        return;
      }
    }
    let header = self.cmd_header;
    self.cmd_buffer.last_mut().unwrap().texture_id = header.texture_id;
  }

  fn on_changed_vtx_offset(&mut self) {
    // The offset is known to differ at the time this is called.
    self.vtx_current_idx = 0;
    let curr = self.cmd_buffer.last().expect("draw list has no current command");
    if curr.elem_count != 0 {
      self.add_draw_cmd();
      return;
    }
    debug_assert!(curr.callback.is_none());
    let header = self.cmd_header;
    self.cmd_buffer.last_mut().unwrap().vtx_offset = header.vtx_offset;
  }

  // ==========================================================================
  // Clip / texture state
  // ==========================================================================

  /// Pushes a scissor rectangle, optionally intersected with the current one
  ///
  /// This is render-level scissoring passed down to the backend; it does not
  /// perform CPU-side coarse culling of the geometry.
  pub fn push_clip_rect(&mut self, min: Vec2, max: Vec2, intersect_with_current: bool) {
    let mut cr = Rect::from_min_max(min, max);
    if intersect_with_current {
      cr = cr.intersection(self.cmd_header.clip_rect);
    }
    let cr = cr.sanitize();
    self.clip_rect_stack.push(cr);
    self.cmd_header.clip_rect = cr;
    self.on_changed_clip_rect();
  }

  pub fn push_clip_rect_full_screen(&mut self) {
    let full = self.ctx.clip_rect_full_screen;
    self.push_clip_rect(full.min, full.max, false);
  }

  pub fn pop_clip_rect(&mut self) {
    self.clip_rect_stack.pop();
    self.cmd_header.clip_rect = self
      .clip_rect_stack
      .last()
      .copied()
      .unwrap_or(self.ctx.clip_rect_full_screen);
    self.on_changed_clip_rect();
  }

  /// The scissor rectangle drawing calls are currently recorded under
  pub fn current_clip_rect(&self) -> Rect {
    self.cmd_header.clip_rect
  }

  pub fn push_texture(&mut self, texture_id: TextureId) {
    self.texture_id_stack.push(texture_id);
    self.cmd_header.texture_id = texture_id;
    self.on_changed_texture_id();
  }

  pub fn pop_texture(&mut self) {
    self.texture_id_stack.pop();
    self.cmd_header.texture_id = self
      .texture_id_stack
      .last()
      .copied()
      .unwrap_or(self.ctx.font_texture_id);
    self.on_changed_texture_id();
  }

  pub fn current_texture(&self) -> TextureId {
    self.cmd_header.texture_id
  }

  // ==========================================================================
  // Primitive reservation
  // ==========================================================================

  /// Grows the vertex/index arenas and returns a writable window over the
  /// fresh storage
  ///
  /// The reservation must be filled exactly before the window ends (see
  /// [`PrimWindow`]); callers that over-reserve give the surplus back with
  /// [`DrawList::prim_unreserve`]. When 16-bit indices are in use and the
  /// list allows it, the vertex offset rotates forward here so the window's
  /// base index stays addressable.
  pub fn prim_reserve(&mut self, idx_count: usize, vtx_count: usize) -> PrimWindow<'_> {
    if mem::size_of::<DrawIdx>() == 2
      && self.vtx_current_idx as usize + vtx_count >= (1 << 16)
      && self.flags.allow_vtx_offset
    {
      self.cmd_header.vtx_offset = self.vtx_buffer.len() as u32;
      self.on_changed_vtx_offset();
    }

    let cmd = self.cmd_buffer.last_mut().expect("draw list has no current command");
    cmd.elem_count += idx_count as u32;

    let vtx_start = self.vtx_buffer.len();
    self
      .vtx_buffer
      .resize(vtx_start + vtx_count, DrawVert::new(Vec2::ZERO, Vec2::ZERO, Color32::TRANSPARENT));
    let idx_start = self.idx_buffer.len();
    self.idx_buffer.resize(idx_start + idx_count, 0 as DrawIdx);

    let base = self.vtx_current_idx;
    self.vtx_current_idx += vtx_count as u32;
    PrimWindow::new(
      &mut self.vtx_buffer[vtx_start..],
      &mut self.idx_buffer[idx_start..],
      base,
    )
  }

  /// Releases the tail of the last reservation (counts from its end)
  pub fn prim_unreserve(&mut self, idx_count: usize, vtx_count: usize) {
    let cmd = self.cmd_buffer.last_mut().expect("draw list has no current command");
    cmd.elem_count -= idx_count as u32;
    self.vtx_buffer.truncate(self.vtx_buffer.len() - vtx_count);
    self.idx_buffer.truncate(self.idx_buffer.len() - idx_count);
    self.vtx_current_idx -= vtx_count as u32;
  }

  // ==========================================================================
  // Polyline / polygon tessellation
  // ==========================================================================

  /// Strokes a polyline into triangles
  ///
  /// Antialiased rendering keeps the same vertex positions at path points as
  /// the aliased one (the center line coincides), adding only translucent
  /// fringe vertices around it.
  pub fn add_polyline(&mut self, points: &[Vec2], col: Color32, closed: bool, thickness: f32) {
    if points.len() < 2 || col.is_transparent() {
      return;
    }
    let points_count = points.len();
    let opaque_uv = self.ctx.tex_uv_white_pixel;
    let count = if closed { points_count } else { points_count - 1 };
    let thick_line = thickness > self.fringe_scale;

    if !self.flags.anti_aliased_lines {
      // Aliased path: one independent quad per segment, no shared vertices.
      let idx_count = count * 6;
      let vtx_count = count * 4;
      let mut w = self.prim_reserve(idx_count, vtx_count);
      let mut idx0 = w.base();
      for i1 in 0..count {
        let i2 = if i1 + 1 == points_count { 0 } else { i1 + 1 };
        let p1 = points[i1];
        let p2 = points[i2];
        let d = (p2 - p1).normalize_over_zero() * (thickness * 0.5);

        w.tri(idx0, idx0 + 1, idx0 + 2);
        w.tri(idx0, idx0 + 2, idx0 + 3);
        w.vtx(Vec2::new(p1.x + d.y, p1.y - d.x), opaque_uv, col);
        w.vtx(Vec2::new(p2.x + d.y, p2.y - d.x), opaque_uv, col);
        w.vtx(Vec2::new(p2.x - d.y, p2.y + d.x), opaque_uv, col);
        w.vtx(Vec2::new(p1.x - d.y, p1.y + d.x), opaque_uv, col);
        idx0 += 4;
      }
      w.finish();
      return;
    }

    // Anti-aliased stroke
    let aa_size = self.fringe_scale;
    let col_trans = col.transparent();

    // Thicknesses below 1.0 behave like thickness 1.0.
    let thickness = thickness.max(1.0);
    let integer_thickness = thickness as usize;
    let fractional_thickness = thickness - integer_thickness as f32;

    // Only integer-width lines can use the baked texture, and only while the
    // fringe is exactly one pixel (the +1 in the texture is tied to that).
    let use_texture = self.flags.anti_aliased_lines_use_tex
      && integer_thickness < TEX_LINES_WIDTH_MAX
      && fractional_thickness <= 0.00001
      && aa_size == 1.0;
    let tex_uvs = self.ctx.tex_uv_lines[integer_thickness.min(TEX_LINES_WIDTH_MAX)];

    let idx_count = if use_texture {
      count * 6
    } else if thick_line {
      count * 18
    } else {
      count * 12
    };
    let vtx_count = if use_texture {
      points_count * 2
    } else if thick_line {
      points_count * 4
    } else {
      points_count * 3
    };

    // Temporary buffer: per-point segment normals, then 2 or 4 offset points
    // per line point.
    let mut temp = mem::take(&mut self.temp_buffer);
    temp.clear();
    let per_point = if use_texture || !thick_line { 3 } else { 5 };
    temp.resize(points_count * per_point, Vec2::ZERO);
    let (temp_normals, temp_points) = temp.split_at_mut(points_count);

    for i1 in 0..count {
      let i2 = if i1 + 1 == points_count { 0 } else { i1 + 1 };
      let d = (points[i2] - points[i1]).normalize_over_zero();
      temp_normals[i1] = Vec2::new(d.y, -d.x);
    }
    if !closed {
      temp_normals[points_count - 1] = temp_normals[points_count - 2];
    }

    if use_texture || !thick_line {
      // Thin or textured lines: 2 (textured) or 3 (plain) vertices per point.
      // The drawn width is the line itself plus one pixel of AA; in the
      // textured path the +1 is baked into the ramp.
      let half_draw_size = if use_texture { thickness * 0.5 + 1.0 } else { aa_size };

      if !closed {
        let last = points_count - 1;
        temp_points[0] = points[0] + temp_normals[0] * half_draw_size;
        temp_points[1] = points[0] - temp_normals[0] * half_draw_size;
        temp_points[last * 2] = points[last] + temp_normals[last] * half_draw_size;
        temp_points[last * 2 + 1] = points[last] - temp_normals[last] * half_draw_size;
      }

      let mut w = self.prim_reserve(idx_count, vtx_count);
      let base = w.base();

      // Walk segments: average the two adjacent segment normals at each
      // point, producing the outer edge offsets, and emit the triangles.
      let mut idx1 = base;
      for i1 in 0..count {
        let i2 = if i1 + 1 == points_count { 0 } else { i1 + 1 };
        let idx2 = if i1 + 1 == points_count {
          base
        } else {
          idx1 + if use_texture { 2 } else { 3 }
        };

        let dm = fix_normal((temp_normals[i1] + temp_normals[i2]) * 0.5) * half_draw_size;
        temp_points[i2 * 2] = points[i2] + dm;
        temp_points[i2 * 2 + 1] = points[i2] - dm;

        if use_texture {
          w.tri(idx2, idx1, idx1 + 1);
          w.tri(idx2 + 1, idx1 + 1, idx2);
        } else {
          w.tri(idx2, idx1, idx1 + 2);
          w.tri(idx1 + 2, idx2 + 2, idx2);
          w.tri(idx2 + 1, idx1 + 1, idx1);
          w.tri(idx1, idx2, idx2 + 1);
        }
        idx1 = idx2;
      }

      if use_texture {
        let tex_uv0 = Vec2::new(tex_uvs.min.x, tex_uvs.min.y);
        let tex_uv1 = Vec2::new(tex_uvs.max.x, tex_uvs.max.y);
        for i in 0..points_count {
          w.vtx(temp_points[i * 2], tex_uv0, col);
          w.vtx(temp_points[i * 2 + 1], tex_uv1, col);
        }
      } else {
        for i in 0..points_count {
          w.vtx(points[i], opaque_uv, col);
          w.vtx(temp_points[i * 2], opaque_uv, col_trans);
          w.vtx(temp_points[i * 2 + 1], opaque_uv, col_trans);
        }
      }
      w.finish();
    } else {
      // Thick lines: opaque core plus fringe on both sides, four vertices
      // per point forming three concentric strips per segment.
      let half_inner_thickness = (thickness - aa_size) * 0.5;

      if !closed {
        let last = points_count - 1;
        temp_points[0] = points[0] + temp_normals[0] * (half_inner_thickness + aa_size);
        temp_points[1] = points[0] + temp_normals[0] * half_inner_thickness;
        temp_points[2] = points[0] - temp_normals[0] * half_inner_thickness;
        temp_points[3] = points[0] - temp_normals[0] * (half_inner_thickness + aa_size);
        temp_points[last * 4] = points[last] + temp_normals[last] * (half_inner_thickness + aa_size);
        temp_points[last * 4 + 1] = points[last] + temp_normals[last] * half_inner_thickness;
        temp_points[last * 4 + 2] = points[last] - temp_normals[last] * half_inner_thickness;
        temp_points[last * 4 + 3] = points[last] - temp_normals[last] * (half_inner_thickness + aa_size);
      }

      let mut w = self.prim_reserve(idx_count, vtx_count);
      let base = w.base();

      let mut idx1 = base;
      for i1 in 0..count {
        let i2 = if i1 + 1 == points_count { 0 } else { i1 + 1 };
        let idx2 = if i1 + 1 == points_count { base } else { idx1 + 4 };

        let dm = fix_normal((temp_normals[i1] + temp_normals[i2]) * 0.5);
        let dm_out = dm * (half_inner_thickness + aa_size);
        let dm_in = dm * half_inner_thickness;
        temp_points[i2 * 4] = points[i2] + dm_out;
        temp_points[i2 * 4 + 1] = points[i2] + dm_in;
        temp_points[i2 * 4 + 2] = points[i2] - dm_in;
        temp_points[i2 * 4 + 3] = points[i2] - dm_out;

        w.tri(idx2 + 1, idx1 + 1, idx1 + 2);
        w.tri(idx1 + 2, idx2 + 2, idx2 + 1);
        w.tri(idx2 + 1, idx1 + 1, idx1);
        w.tri(idx1, idx2, idx2 + 1);
        w.tri(idx2 + 2, idx1 + 2, idx1 + 3);
        w.tri(idx1 + 3, idx2 + 3, idx2 + 2);
        idx1 = idx2;
      }

      for i in 0..points_count {
        w.vtx(temp_points[i * 4], opaque_uv, col_trans);
        w.vtx(temp_points[i * 4 + 1], opaque_uv, col);
        w.vtx(temp_points[i * 4 + 2], opaque_uv, col);
        w.vtx(temp_points[i * 4 + 3], opaque_uv, col_trans);
      }
      w.finish();
    }

    self.temp_buffer = temp;
  }

  /// Fills a convex polygon (clockwise winding) as a triangle fan
  pub fn add_convex_poly_filled(&mut self, points: &[Vec2], col: Color32) {
    if points.len() < 3 || col.is_transparent() {
      return;
    }
    let points_count = points.len();
    let uv = self.ctx.tex_uv_white_pixel;

    if self.flags.anti_aliased_fill {
      let aa_size = self.fringe_scale;
      let col_trans = col.transparent();
      let idx_count = (points_count - 2) * 3 + points_count * 6;
      let vtx_count = points_count * 2;

      // Precompute edge normals before the window borrows the arenas.
      let mut temp = mem::take(&mut self.temp_buffer);
      temp.clear();
      temp.resize(points_count, Vec2::ZERO);
      let mut i0 = points_count - 1;
      for i1 in 0..points_count {
        let d = (points[i1] - points[i0]).normalize_over_zero();
        temp[i0] = Vec2::new(d.y, -d.x);
        i0 = i1;
      }

      let mut w = self.prim_reserve(idx_count, vtx_count);
      let vtx_inner_idx = w.base();
      let vtx_outer_idx = w.base() + 1;

      // Fan over the inner (opaque) ring.
      for i in 2..points_count as u32 {
        w.tri(vtx_inner_idx, vtx_inner_idx + ((i - 1) << 1), vtx_inner_idx + (i << 1));
      }

      let mut i0 = points_count - 1;
      for i1 in 0..points_count {
        let dm = fix_normal((temp[i0] + temp[i1]) * 0.5) * (aa_size * 0.5);

        w.vtx(points[i1] - dm, uv, col); // inner
        w.vtx(points[i1] + dm, uv, col_trans); // outer

        w.tri(
          vtx_inner_idx + ((i1 as u32) << 1),
          vtx_inner_idx + ((i0 as u32) << 1),
          vtx_outer_idx + ((i0 as u32) << 1),
        );
        w.tri(
          vtx_outer_idx + ((i0 as u32) << 1),
          vtx_outer_idx + ((i1 as u32) << 1),
          vtx_inner_idx + ((i1 as u32) << 1),
        );
        i0 = i1;
      }
      w.finish();
      self.temp_buffer = temp;
    } else {
      let idx_count = (points_count - 2) * 3;
      let vtx_count = points_count;
      let mut w = self.prim_reserve(idx_count, vtx_count);
      let base = w.base();
      for i in 2..points_count as u32 {
        w.tri(base, base + i - 1, base + i);
      }
      for &p in points {
        w.vtx(p, uv, col);
      }
      w.finish();
    }
  }

  /// Fills a simple concave polygon via ear clipping
  ///
  /// The polygon must be simple (no self-intersection, no holes); malformed
  /// input still terminates but the partition is best-effort. No coarse
  /// culling happens at this layer, and concave fill is noticeably more
  /// expensive than the other primitives.
  pub fn add_concave_poly_filled(&mut self, points: &[Vec2], col: Color32) {
    if points.len() < 3 || col.is_transparent() {
      return;
    }
    let points_count = points.len();
    let uv = self.ctx.tex_uv_white_pixel;
    let mut scratch = mem::take(&mut self.tri_scratch);

    if self.flags.anti_aliased_fill {
      let aa_size = self.fringe_scale;
      let col_trans = col.transparent();
      let idx_count = (points_count - 2) * 3 + points_count * 6;
      let vtx_count = points_count * 2;

      let mut temp = mem::take(&mut self.temp_buffer);
      temp.clear();
      temp.resize(points_count, Vec2::ZERO);
      let mut i0 = points_count - 1;
      for i1 in 0..points_count {
        let d = (points[i1] - points[i0]).normalize_over_zero();
        temp[i0] = Vec2::new(d.y, -d.x);
        i0 = i1;
      }

      let mut w = self.prim_reserve(idx_count, vtx_count);
      let vtx_inner_idx = w.base();
      let vtx_outer_idx = w.base() + 1;

      let mut tri = Triangulator::new(points, &mut scratch);
      while tri.triangles_left() > 0 {
        let t = tri.next_triangle();
        w.tri(
          vtx_inner_idx + (t[0] << 1),
          vtx_inner_idx + (t[1] << 1),
          vtx_inner_idx + (t[2] << 1),
        );
      }

      let mut i0 = points_count - 1;
      for i1 in 0..points_count {
        let dm = fix_normal((temp[i0] + temp[i1]) * 0.5) * (aa_size * 0.5);

        w.vtx(points[i1] - dm, uv, col);
        w.vtx(points[i1] + dm, uv, col_trans);

        w.tri(
          vtx_inner_idx + ((i1 as u32) << 1),
          vtx_inner_idx + ((i0 as u32) << 1),
          vtx_outer_idx + ((i0 as u32) << 1),
        );
        w.tri(
          vtx_outer_idx + ((i0 as u32) << 1),
          vtx_outer_idx + ((i1 as u32) << 1),
          vtx_inner_idx + ((i1 as u32) << 1),
        );
        i0 = i1;
      }
      w.finish();
      self.temp_buffer = temp;
    } else {
      let idx_count = (points_count - 2) * 3;
      let vtx_count = points_count;
      let mut w = self.prim_reserve(idx_count, vtx_count);
      let base = w.base();
      for &p in points {
        w.vtx(p, uv, col);
      }
      let mut tri = Triangulator::new(points, &mut scratch);
      while tri.triangles_left() > 0 {
        let t = tri.next_triangle();
        w.tri(base + t[0], base + t[1], base + t[2]);
      }
      w.finish();
    }

    self.tri_scratch = scratch;
  }

  // ==========================================================================
  // Path building
  // ==========================================================================

  pub fn path_clear(&mut self) {
    self.path.clear();
  }

  #[inline]
  pub fn path_line_to(&mut self, pos: Vec2) {
    self.path.push(pos);
  }

  /// Appends a point unless it duplicates the last one
  pub fn path_line_to_merge_duplicate(&mut self, pos: Vec2) {
    if self.path.last() != Some(&pos) {
      self.path.push(pos);
    }
  }

  /// Consumes the path, stroking it
  pub fn path_stroke(&mut self, col: Color32, closed: bool, thickness: f32) {
    let path = mem::take(&mut self.path);
    self.add_polyline(&path, col, closed, thickness);
    self.path = path;
    self.path.clear();
  }

  /// Consumes the path, filling it as a convex polygon
  pub fn path_fill_convex(&mut self, col: Color32) {
    let path = mem::take(&mut self.path);
    self.add_convex_poly_filled(&path, col);
    self.path = path;
    self.path.clear();
  }

  /// Consumes the path, filling it as a simple (possibly concave) polygon
  pub fn path_fill_concave(&mut self, col: Color32) {
    let path = mem::take(&mut self.path);
    self.add_concave_poly_filled(&path, col);
    self.path = path;
    self.path.clear();
  }

  /// Appends an arc sampled from the cached unit-circle table
  ///
  /// `a_min_sample`/`a_max_sample` are indices into the 48-entry table
  /// (negative and wrapping values allowed); `a_step` of 0 picks a step from
  /// the radius's auto segment count.
  pub fn path_arc_to_fast_ex(
    &mut self,
    center: Vec2,
    radius: f32,
    a_min_sample: i32,
    a_max_sample: i32,
    a_step: i32,
  ) {
    if radius < 0.5 {
      self.path.push(center);
      return;
    }
    let sample_max = ARC_FAST_TABLE_SIZE as i32;

    let mut a_step = if a_step <= 0 {
      sample_max / self.ctx.calc_circle_auto_segment_count(radius) as i32
    } else {
      a_step
    };
    // Never step more than a quarter of the circle at once.
    a_step = a_step.clamp(1, sample_max / 4);

    let sample_range = (a_max_sample - a_min_sample).abs();
    let a_next_step = a_step;

    let mut extra_max_sample = false;
    if a_step > 1 {
      let overstep = sample_range % a_step;
      if overstep > 0 {
        extra_max_sample = true;
        // Distribute the remainder by shrinking the first step, avoiding one
        // long segment followed by a tiny one.
        if sample_range > 0 {
          a_step -= (a_step - overstep) / 2;
        }
      }
    }

    let mut sample_index = a_min_sample;
    if !(0..sample_max).contains(&sample_index) {
      sample_index %= sample_max;
      if sample_index < 0 {
        sample_index += sample_max;
      }
    }

    if a_max_sample >= a_min_sample {
      let mut a = a_min_sample;
      while a <= a_max_sample {
        if sample_index >= sample_max {
          sample_index -= sample_max;
        }
        let s = self.ctx.arc_fast_vtx[sample_index as usize];
        self.path.push(center + s * radius);
        a += a_step;
        sample_index += a_step;
        a_step = a_next_step;
      }
    } else {
      let mut a = a_min_sample;
      while a >= a_max_sample {
        if sample_index < 0 {
          sample_index += sample_max;
        }
        let s = self.ctx.arc_fast_vtx[sample_index as usize];
        self.path.push(center + s * radius);
        a -= a_step;
        sample_index -= a_step;
        a_step = a_next_step;
      }
    }

    if extra_max_sample {
      let mut normalized = a_max_sample % sample_max;
      if normalized < 0 {
        normalized += sample_max;
      }
      let s = self.ctx.arc_fast_vtx[normalized as usize];
      self.path.push(center + s * radius);
    }
  }

  /// Twelve o'clock arc variant: `0` points east, `3` south, `6` west,
  /// `9` north, `12` east again
  pub fn path_arc_to_fast(&mut self, center: Vec2, radius: f32, a_min_of_12: i32, a_max_of_12: i32) {
    if radius < 0.5 {
      self.path.push(center);
      return;
    }
    let sample_max = ARC_FAST_TABLE_SIZE as i32;
    self.path_arc_to_fast_ex(
      center,
      radius,
      a_min_of_12 * sample_max / 12,
      a_max_of_12 * sample_max / 12,
      0,
    );
  }

  fn path_arc_to_n(&mut self, center: Vec2, radius: f32, a_min: f32, a_max: f32, num_segments: usize) {
    if radius < 0.5 {
      self.path.push(center);
      return;
    }
    // A point is emitted at both ends; full-circle callers drop the
    // duplicate themselves.
    self.path.reserve(num_segments + 1);
    for i in 0..=num_segments {
      let a = a_min + (i as f32 / num_segments as f32) * (a_max - a_min);
      self.path.push(center + Vec2::new(a.cos(), a.sin()) * radius);
    }
  }

  /// Appends an arc in radians; `num_segments` of 0 chooses automatically
  pub fn path_arc_to(&mut self, center: Vec2, radius: f32, a_min: f32, a_max: f32, num_segments: usize) {
    if radius < 0.5 {
      self.path.push(center);
      return;
    }
    if num_segments > 0 {
      self.path_arc_to_n(center, radius, a_min, a_max, num_segments);
      return;
    }

    if radius <= self.ctx.arc_fast_radius_cutoff {
      // Use the sample table for the bulk of the arc, emitting exact end
      // points when they fall between samples.
      let sample_max = ARC_FAST_TABLE_SIZE as f32;
      let a_is_reverse = a_max < a_min;

      let a_min_sample_f = sample_max * a_min / (PI * 2.0);
      let a_max_sample_f = sample_max * a_max / (PI * 2.0);

      let a_min_sample = if a_is_reverse {
        a_min_sample_f.floor() as i32
      } else {
        a_min_sample_f.ceil() as i32
      };
      let a_max_sample = if a_is_reverse {
        a_max_sample_f.ceil() as i32
      } else {
        a_max_sample_f.floor() as i32
      };
      let a_mid_samples = if a_is_reverse {
        (a_min_sample - a_max_sample).max(0)
      } else {
        (a_max_sample - a_min_sample).max(0)
      };

      let a_min_segment_angle = a_min_sample as f32 * PI * 2.0 / sample_max;
      let a_max_segment_angle = a_max_sample as f32 * PI * 2.0 / sample_max;
      let emit_start = (a_min_segment_angle - a_min).abs() >= 1e-5;
      let emit_end = (a_max - a_max_segment_angle).abs() >= 1e-5;

      if emit_start {
        self.path.push(center + Vec2::new(a_min.cos(), a_min.sin()) * radius);
      }
      if a_mid_samples > 0 {
        self.path_arc_to_fast_ex(center, radius, a_min_sample, a_max_sample, 0);
      }
      if emit_end {
        self.path.push(center + Vec2::new(a_max.cos(), a_max.sin()) * radius);
      }
    } else {
      let arc_length = (a_max - a_min).abs();
      let circle_segment_count = self.ctx.calc_circle_auto_segment_count(radius);
      let arc_segment_count = ((circle_segment_count as f32 * arc_length / (PI * 2.0)).ceil() as usize)
        .max((2.0 * PI / arc_length) as usize);
      self.path_arc_to_n(center, radius, a_min, a_max, arc_segment_count);
    }
  }

  /// Appends an elliptical arc, optionally rotated by `rot` radians
  pub fn path_elliptical_arc_to(
    &mut self,
    center: Vec2,
    radius: Vec2,
    rot: f32,
    a_min: f32,
    a_max: f32,
    num_segments: usize,
  ) {
    let num_segments = if num_segments == 0 {
      self.ctx.calc_circle_auto_segment_count(radius.x.max(radius.y)) as usize
    } else {
      num_segments
    };

    self.path.reserve(num_segments + 1);
    let (sin_rot, cos_rot) = rot.sin_cos();
    for i in 0..=num_segments {
      let a = a_min + (i as f32 / num_segments as f32) * (a_max - a_min);
      let p = Vec2::new(a.cos() * radius.x, a.sin() * radius.y);
      let rel = Vec2::new(p.x * cos_rot - p.y * sin_rot, p.x * sin_rot + p.y * cos_rot);
      self.path.push(center + rel);
    }
  }

  /// Appends a cubic Bezier from the last path point
  ///
  /// `num_segments` of 0 flattens adaptively against the context tolerance.
  pub fn path_bezier_cubic_curve_to(&mut self, p2: Vec2, p3: Vec2, p4: Vec2, num_segments: usize) {
    let p1 = *self.path.last().expect("path is empty");
    if num_segments == 0 {
      let tol = self.ctx.curve_tessellation_tol;
      assert!(tol > 0.0);
      bezier_cubic_casteljau(&mut self.path, p1, p2, p3, p4, tol, 0);
    } else {
      let t_step = 1.0 / num_segments as f32;
      for i_step in 1..=num_segments {
        self.path.push(bezier_cubic_calc(p1, p2, p3, p4, t_step * i_step as f32));
      }
    }
  }

  /// Appends a quadratic Bezier from the last path point
  pub fn path_bezier_quadratic_curve_to(&mut self, p2: Vec2, p3: Vec2, num_segments: usize) {
    let p1 = *self.path.last().expect("path is empty");
    if num_segments == 0 {
      let tol = self.ctx.curve_tessellation_tol;
      assert!(tol > 0.0);
      bezier_quadratic_casteljau(&mut self.path, p1, p2, p3, tol, 0);
    } else {
      let t_step = 1.0 / num_segments as f32;
      for i_step in 1..=num_segments {
        self.path.push(bezier_quadratic_calc(p1, p2, p3, t_step * i_step as f32));
      }
    }
  }

  /// Appends a rectangle outline with optional rounded corners
  pub fn path_rect(&mut self, a: Vec2, b: Vec2, rounding: f32, corners: RoundCorners) {
    let mut rounding = rounding;
    if rounding >= 0.5 {
      let w_limit = if corners.all_top() || corners.all_bottom() { 0.5 } else { 1.0 };
      let h_limit = if corners.all_left() || corners.all_right() { 0.5 } else { 1.0 };
      rounding = rounding.min((b.x - a.x).abs() * w_limit - 1.0);
      rounding = rounding.min((b.y - a.y).abs() * h_limit - 1.0);
    }
    if rounding < 0.5 || !corners.any() {
      self.path_line_to(a);
      self.path_line_to(Vec2::new(b.x, a.y));
      self.path_line_to(b);
      self.path_line_to(Vec2::new(a.x, b.y));
    } else {
      let r_tl = if corners.top_left { rounding } else { 0.0 };
      let r_tr = if corners.top_right { rounding } else { 0.0 };
      let r_br = if corners.bottom_right { rounding } else { 0.0 };
      let r_bl = if corners.bottom_left { rounding } else { 0.0 };
      self.path_arc_to_fast(Vec2::new(a.x + r_tl, a.y + r_tl), r_tl, 6, 9);
      self.path_arc_to_fast(Vec2::new(b.x - r_tr, a.y + r_tr), r_tr, 9, 12);
      self.path_arc_to_fast(Vec2::new(b.x - r_br, b.y - r_br), r_br, 0, 3);
      self.path_arc_to_fast(Vec2::new(a.x + r_bl, b.y - r_bl), r_bl, 3, 6);
    }
  }

  // ==========================================================================
  // Shapes
  // ==========================================================================

  pub fn add_line(&mut self, p1: Vec2, p2: Vec2, col: Color32, thickness: f32) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1 + Vec2::splat(0.5));
    self.path_line_to(p2 + Vec2::splat(0.5));
    self.path_stroke(col, false, thickness);
  }

  /// Strokes a rectangle outline (`p_min` upper-left, `p_max` lower-right)
  pub fn add_rect(
    &mut self,
    p_min: Vec2,
    p_max: Vec2,
    col: Color32,
    rounding: f32,
    corners: RoundCorners,
    thickness: f32,
  ) {
    if col.is_transparent() {
      return;
    }
    if self.flags.anti_aliased_lines {
      self.path_rect(p_min + Vec2::splat(0.5), p_max - Vec2::splat(0.5), rounding, corners);
    } else {
      // Nudged for a better looking lower-right corner without AA.
      self.path_rect(p_min + Vec2::splat(0.5), p_max - Vec2::splat(0.49), rounding, corners);
    }
    self.path_stroke(col, true, thickness);
  }

  pub fn add_rect_filled(&mut self, p_min: Vec2, p_max: Vec2, col: Color32) {
    self.add_rect_filled_rounded(p_min, p_max, col, 0.0, RoundCorners::NONE);
  }

  pub fn add_rect_filled_rounded(
    &mut self,
    p_min: Vec2,
    p_max: Vec2,
    col: Color32,
    rounding: f32,
    corners: RoundCorners,
  ) {
    if col.is_transparent() {
      return;
    }
    if rounding < 0.5 || !corners.any() {
      let uv = self.ctx.tex_uv_white_pixel;
      let mut w = self.prim_reserve(6, 4);
      w.rect(p_min, p_max, uv, col);
      w.finish();
    } else {
      self.path_rect(p_min, p_max, rounding, corners);
      self.path_fill_convex(col);
    }
  }

  /// Filled rectangle with one color per corner
  pub fn add_rect_filled_multi_color(
    &mut self,
    p_min: Vec2,
    p_max: Vec2,
    col_upr_left: Color32,
    col_upr_right: Color32,
    col_bot_right: Color32,
    col_bot_left: Color32,
  ) {
    if col_upr_left.is_transparent()
      && col_upr_right.is_transparent()
      && col_bot_right.is_transparent()
      && col_bot_left.is_transparent()
    {
      return;
    }
    let uv = self.ctx.tex_uv_white_pixel;
    let mut w = self.prim_reserve(6, 4);
    let base = w.base();
    w.tri(base, base + 1, base + 2);
    w.tri(base, base + 2, base + 3);
    w.vtx(p_min, uv, col_upr_left);
    w.vtx(Vec2::new(p_max.x, p_min.y), uv, col_upr_right);
    w.vtx(p_max, uv, col_bot_right);
    w.vtx(Vec2::new(p_min.x, p_max.y), uv, col_bot_left);
    w.finish();
  }

  pub fn add_quad(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2, col: Color32, thickness: f32) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1);
    self.path_line_to(p2);
    self.path_line_to(p3);
    self.path_line_to(p4);
    self.path_stroke(col, true, thickness);
  }

  pub fn add_quad_filled(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2, col: Color32) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1);
    self.path_line_to(p2);
    self.path_line_to(p3);
    self.path_line_to(p4);
    self.path_fill_convex(col);
  }

  pub fn add_triangle(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, col: Color32, thickness: f32) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1);
    self.path_line_to(p2);
    self.path_line_to(p3);
    self.path_stroke(col, true, thickness);
  }

  pub fn add_triangle_filled(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, col: Color32) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1);
    self.path_line_to(p2);
    self.path_line_to(p3);
    self.path_fill_convex(col);
  }

  /// Strokes a circle; `num_segments` of 0 picks the cached auto count
  pub fn add_circle(&mut self, center: Vec2, radius: f32, col: Color32, num_segments: usize, thickness: f32) {
    if col.is_transparent() || radius < 0.5 {
      return;
    }
    if num_segments == 0 {
      // Fast path covers the whole circle; drop the duplicated seam point.
      self.path_arc_to_fast_ex(center, radius - 0.5, 0, ARC_FAST_TABLE_SIZE as i32, 0);
      self.path.pop();
    } else {
      let num_segments = num_segments.clamp(3, 512);
      let a_max = PI * 2.0 * (num_segments - 1) as f32 / num_segments as f32;
      self.path_arc_to(center, radius - 0.5, 0.0, a_max, num_segments - 1);
    }
    self.path_stroke(col, true, thickness);
  }

  pub fn add_circle_filled(&mut self, center: Vec2, radius: f32, col: Color32, num_segments: usize) {
    if col.is_transparent() || radius < 0.5 {
      return;
    }
    if num_segments == 0 {
      self.path_arc_to_fast_ex(center, radius, 0, ARC_FAST_TABLE_SIZE as i32, 0);
      self.path.pop();
    } else {
      let num_segments = num_segments.clamp(3, 512);
      let a_max = PI * 2.0 * (num_segments - 1) as f32 / num_segments as f32;
      self.path_arc_to(center, radius, 0.0, a_max, num_segments - 1);
    }
    self.path_fill_convex(col);
  }

  /// Regular polygon outline; unlike circles the segment count is explicit
  pub fn add_ngon(&mut self, center: Vec2, radius: f32, col: Color32, num_segments: usize, thickness: f32) {
    if col.is_transparent() || num_segments < 3 {
      return;
    }
    let a_max = PI * 2.0 * (num_segments - 1) as f32 / num_segments as f32;
    self.path_arc_to(center, radius - 0.5, 0.0, a_max, num_segments - 1);
    self.path_stroke(col, true, thickness);
  }

  pub fn add_ngon_filled(&mut self, center: Vec2, radius: f32, col: Color32, num_segments: usize) {
    if col.is_transparent() || num_segments < 3 {
      return;
    }
    let a_max = PI * 2.0 * (num_segments - 1) as f32 / num_segments as f32;
    self.path_arc_to(center, radius, 0.0, a_max, num_segments - 1);
    self.path_fill_convex(col);
  }

  pub fn add_ellipse(
    &mut self,
    center: Vec2,
    radius: Vec2,
    col: Color32,
    rot: f32,
    num_segments: usize,
    thickness: f32,
  ) {
    if col.is_transparent() {
      return;
    }
    let num_segments = if num_segments == 0 {
      self.ctx.calc_circle_auto_segment_count(radius.x.max(radius.y)) as usize
    } else {
      num_segments
    }
    .clamp(3, 512);
    let a_max = PI * 2.0 * (num_segments - 1) as f32 / num_segments as f32;
    self.path_elliptical_arc_to(center, radius, rot, 0.0, a_max, num_segments - 1);
    self.path_stroke(col, true, thickness);
  }

  pub fn add_ellipse_filled(&mut self, center: Vec2, radius: Vec2, col: Color32, rot: f32, num_segments: usize) {
    if col.is_transparent() {
      return;
    }
    let num_segments = if num_segments == 0 {
      self.ctx.calc_circle_auto_segment_count(radius.x.max(radius.y)) as usize
    } else {
      num_segments
    }
    .clamp(3, 512);
    let a_max = PI * 2.0 * (num_segments - 1) as f32 / num_segments as f32;
    self.path_elliptical_arc_to(center, radius, rot, 0.0, a_max, num_segments - 1);
    self.path_fill_convex(col);
  }

  pub fn add_bezier_cubic(
    &mut self,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    p4: Vec2,
    col: Color32,
    thickness: f32,
    num_segments: usize,
  ) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1);
    self.path_bezier_cubic_curve_to(p2, p3, p4, num_segments);
    self.path_stroke(col, false, thickness);
  }

  pub fn add_bezier_quadratic(
    &mut self,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    col: Color32,
    thickness: f32,
    num_segments: usize,
  ) {
    if col.is_transparent() {
      return;
    }
    self.path_line_to(p1);
    self.path_bezier_quadratic_curve_to(p2, p3, num_segments);
    self.path_stroke(col, false, thickness);
  }

  // ==========================================================================
  // Images
  // ==========================================================================

  pub fn add_image(
    &mut self,
    texture_id: TextureId,
    p_min: Vec2,
    p_max: Vec2,
    uv_min: Vec2,
    uv_max: Vec2,
    col: Color32,
  ) {
    if col.is_transparent() {
      return;
    }
    let push_texture = texture_id != self.cmd_header.texture_id;
    if push_texture {
      self.push_texture(texture_id);
    }
    let mut w = self.prim_reserve(6, 4);
    w.rect_uv(p_min, p_max, uv_min, uv_max, col);
    w.finish();
    if push_texture {
      self.pop_texture();
    }
  }

  pub fn add_image_quad(
    &mut self,
    texture_id: TextureId,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    p4: Vec2,
    uv1: Vec2,
    uv2: Vec2,
    uv3: Vec2,
    uv4: Vec2,
    col: Color32,
  ) {
    if col.is_transparent() {
      return;
    }
    let push_texture = texture_id != self.cmd_header.texture_id;
    if push_texture {
      self.push_texture(texture_id);
    }
    let mut w = self.prim_reserve(6, 4);
    w.quad_uv(p1, p2, p3, p4, uv1, uv2, uv3, uv4, col);
    w.finish();
    if push_texture {
      self.pop_texture();
    }
  }

  /// Image in a rounded rectangle; UVs are remapped onto the rounded outline
  pub fn add_image_rounded(
    &mut self,
    texture_id: TextureId,
    p_min: Vec2,
    p_max: Vec2,
    uv_min: Vec2,
    uv_max: Vec2,
    col: Color32,
    rounding: f32,
    corners: RoundCorners,
  ) {
    if col.is_transparent() {
      return;
    }
    if rounding < 0.5 || !corners.any() {
      self.add_image(texture_id, p_min, p_max, uv_min, uv_max, col);
      return;
    }

    let push_texture = texture_id != self.cmd_header.texture_id;
    if push_texture {
      self.push_texture(texture_id);
    }
    let vtx_start = self.vtx_buffer.len();
    self.path_rect(p_min, p_max, rounding, corners);
    self.path_fill_convex(col);
    let vtx_end = self.vtx_buffer.len();
    self.shade_verts_linear_uv(vtx_start, vtx_end, p_min, p_max, uv_min, uv_max, true);
    if push_texture {
      self.pop_texture();
    }
  }

  /// Rewrites UVs of a vertex range by linearly mapping positions from
  /// `[p_min, p_max]` onto `[uv_min, uv_max]`
  ///
  /// Only valid while the vertices' command is still open.
  fn shade_verts_linear_uv(
    &mut self,
    vtx_start: usize,
    vtx_end: usize,
    p_min: Vec2,
    p_max: Vec2,
    uv_min: Vec2,
    uv_max: Vec2,
    clamp: bool,
  ) {
    let size = p_max - p_min;
    let uv_size = uv_max - uv_min;
    let scale = Vec2::new(
      if size.x != 0.0 { uv_size.x / size.x } else { 0.0 },
      if size.y != 0.0 { uv_size.y / size.y } else { 0.0 },
    );
    for v in &mut self.vtx_buffer[vtx_start..vtx_end] {
      let raw = Vec2::new(
        uv_min.x + (v.pos.x - p_min.x) * scale.x,
        uv_min.y + (v.pos.y - p_min.y) * scale.y,
      );
      v.uv = if clamp {
        raw.max(uv_min.min(uv_max)).min(uv_min.max(uv_max))
      } else {
        raw
      };
    }
  }

  // ==========================================================================
  // Text
  // ==========================================================================

  /// Appends one text run using `font` at `font_size`
  ///
  /// Wrapping activates when `wrap_width` is positive. With
  /// `cpu_fine_clip_rect`, glyph quads are clipped CPU-side (UV adjusted) to
  /// the intersection of that rectangle with the current clip rectangle —
  /// used to fit text into frames too small for it.
  pub fn add_text(
    &mut self,
    font: &Font,
    font_size: f32,
    pos: Vec2,
    col: Color32,
    text: &str,
    wrap_width: f32,
    cpu_fine_clip_rect: Option<Rect>,
  ) {
    if col.is_transparent() || text.is_empty() {
      return;
    }
    // The atlas texture must be bound: text quads sample glyph UVs.
    debug_assert!(
      self.cmd_header.texture_id == self.ctx.font_texture_id,
      "text drawn with a non-atlas texture bound"
    );

    let mut clip_rect = self.cmd_header.clip_rect;
    if let Some(fine) = cpu_fine_clip_rect {
      clip_rect = clip_rect.intersection(fine).sanitize();
    }
    font.render_text(
      self,
      font_size,
      pos,
      col,
      clip_rect,
      text,
      wrap_width,
      cpu_fine_clip_rect.is_some(),
    );
  }

  // ==========================================================================
  // Channels
  // ==========================================================================

  /// Forks output into `count` channels for later in-order reassembly
  pub fn channels_split(&mut self, count: usize) {
    let mut splitter = mem::take(&mut self.splitter);
    splitter.split(self, count);
    self.splitter = splitter;
  }

  /// Linearizes all channels back into the list, in channel order
  pub fn channels_merge(&mut self) {
    let mut splitter = mem::take(&mut self.splitter);
    splitter.merge(self);
    self.splitter = splitter;
  }

  pub fn channels_set_current(&mut self, idx: usize) {
    let mut splitter = mem::take(&mut self.splitter);
    splitter.set_current_channel(self, idx);
    self.splitter = splitter;
  }
}

// ============================================================================
// Bezier evaluation / flattening
// ============================================================================

pub(crate) fn bezier_cubic_calc(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2, t: f32) -> Vec2 {
  let u = 1.0 - t;
  let w1 = u * u * u;
  let w2 = 3.0 * u * u * t;
  let w3 = 3.0 * u * t * t;
  let w4 = t * t * t;
  Vec2::new(
    w1 * p1.x + w2 * p2.x + w3 * p3.x + w4 * p4.x,
    w1 * p1.y + w2 * p2.y + w3 * p3.y + w4 * p4.y,
  )
}

pub(crate) fn bezier_quadratic_calc(p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
  let u = 1.0 - t;
  let w1 = u * u;
  let w2 = 2.0 * u * t;
  let w3 = t * t;
  Vec2::new(
    w1 * p1.x + w2 * p2.x + w3 * p3.x,
    w1 * p1.y + w2 * p2.y + w3 * p3.y,
  )
}

// Flatness test: squared perpendicular deviation of the control points from
// the chord, against tol * chord length squared. Recursion depth is capped
// at 10.
fn bezier_cubic_casteljau(path: &mut Vec<Vec2>, p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2, tol: f32, level: u32) {
  let d = p4 - p1;
  let d2 = ((p2.x - p4.x) * d.y - (p2.y - p4.y) * d.x).abs();
  let d3 = ((p3.x - p4.x) * d.y - (p3.y - p4.y) * d.x).abs();
  if (d2 + d3) * (d2 + d3) < tol * d.length_sqr() {
    path.push(p4);
  } else if level < 10 {
    let p12 = (p1 + p2) * 0.5;
    let p23 = (p2 + p3) * 0.5;
    let p34 = (p3 + p4) * 0.5;
    let p123 = (p12 + p23) * 0.5;
    let p234 = (p23 + p34) * 0.5;
    let p1234 = (p123 + p234) * 0.5;
    bezier_cubic_casteljau(path, p1, p12, p123, p1234, tol, level + 1);
    bezier_cubic_casteljau(path, p1234, p234, p34, p4, tol, level + 1);
  }
}

fn bezier_quadratic_casteljau(path: &mut Vec<Vec2>, p1: Vec2, p2: Vec2, p3: Vec2, tol: f32, level: u32) {
  let d = p3 - p1;
  let det = (p2.x - p3.x) * d.y - (p2.y - p3.y) * d.x;
  if det * det * 4.0 < tol * d.length_sqr() {
    path.push(p3);
  } else if level < 10 {
    let p12 = (p1 + p2) * 0.5;
    let p23 = (p2 + p3) * 0.5;
    let p123 = (p12 + p23) * 0.5;
    bezier_quadratic_casteljau(path, p1, p12, p123, tol, level + 1);
    bezier_quadratic_casteljau(path, p123, p23, p3, tol, level + 1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_list() -> DrawList {
    DrawList::new(Arc::new(DrawContext::new()))
  }

  #[test]
  fn test_starts_with_one_empty_command() {
    let list = new_list();
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.commands()[0].elem_count, 0);
  }

  #[test]
  fn test_clip_push_pop_round_trip() {
    let mut list = new_list();
    let before = list.cmd_header;
    list.push_clip_rect(Vec2::new(10.0, 10.0), Vec2::new(50.0, 50.0), false);
    list.push_clip_rect(Vec2::new(20.0, 20.0), Vec2::new(40.0, 40.0), true);
    list.pop_clip_rect();
    list.pop_clip_rect();
    assert_eq!(list.cmd_header, before);
  }

  #[test]
  fn test_texture_push_pop_round_trip() {
    let mut list = new_list();
    let before = list.cmd_header;
    list.push_texture(TextureId(7));
    list.push_texture(TextureId(9));
    list.pop_texture();
    list.pop_texture();
    assert_eq!(list.cmd_header, before);
  }

  #[test]
  fn test_push_clip_intersects_current() {
    let mut list = new_list();
    list.push_clip_rect(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), false);
    list.push_clip_rect(Vec2::new(50.0, 50.0), Vec2::new(200.0, 200.0), true);
    assert_eq!(
      list.current_clip_rect(),
      Rect::from_min_max(Vec2::new(50.0, 50.0), Vec2::new(100.0, 100.0))
    );
  }

  #[test]
  fn test_state_change_splits_commands() {
    let mut list = new_list();
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
    list.push_texture(TextureId(3));
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
    list.pop_texture();
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
    list.pop_unused_draw_cmd();
    assert_eq!(list.commands().len(), 3);
    assert_eq!(list.commands()[0].elem_count, 6);
    assert_eq!(list.commands()[1].texture_id, TextureId(3));
    assert_eq!(list.commands()[2].idx_offset, 12);
  }

  #[test]
  fn test_no_split_when_state_unchanged() {
    let mut list = new_list();
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
    // Push/pop without drawing keeps a single command.
    list.push_texture(TextureId(3));
    list.pop_texture();
    list.add_rect_filled(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0), Color32::BLACK);
    list.pop_unused_draw_cmd();
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.commands()[0].elem_count, 12);
  }

  #[test]
  fn test_reserve_sum_matches_written_indices() {
    let mut list = new_list();
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
    list.add_circle_filled(Vec2::new(50.0, 50.0), 10.0, Color32::WHITE, 0);
    list.add_line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE, 3.0);
    let total_elem: u32 = list.commands().iter().map(|c| c.elem_count).sum();
    assert_eq!(total_elem as usize, list.idx_buffer().len());
    // Every index addresses a written vertex.
    let max_idx = list.idx_buffer().iter().copied().max().unwrap() as usize;
    assert!(max_idx < list.vtx_buffer().len());
  }

  #[test]
  fn test_add_callback_reopens_trailing_command() {
    let mut list = new_list();
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::WHITE);
    list.add_callback(Arc::new(|_, _| {}));
    assert!(list.commands()[list.commands().len() - 2].callback.is_some());
    let last = list.commands().last().unwrap();
    assert!(last.callback.is_none());
    assert_eq!(last.elem_count, 0);
  }

  #[test]
  fn test_stroke_open_polyline_aa_thin() {
    // 4 points, open, thickness 1, AA on: 3 segments, 3 vertices per point,
    // 4 triangles per segment.
    let mut list = new_list();
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(0.0, 10.0),
    ];
    list.add_polyline(&points, Color32::WHITE, false, 1.0);
    assert_eq!(list.vtx_buffer().len(), 4 * 3);
    assert_eq!(list.idx_buffer().len(), 3 * 12);
    // Center vertices coincide with the path points.
    for (i, &p) in points.iter().enumerate() {
      assert_eq!(list.vtx_buffer()[i * 3].pos, p);
    }
  }

  #[test]
  fn test_stroke_positions_match_between_aa_and_aliased() {
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(10.0, 10.0),
    ];
    let mut aa = new_list();
    aa.add_polyline(&points, Color32::WHITE, false, 1.0);
    let mut aliased = new_list();
    aliased.flags.anti_aliased_lines = false;
    aliased.add_polyline(&points, Color32::WHITE, false, 1.0);
    // AA path points appear verbatim as center vertices; the aliased path
    // has no center vertices but the segment quads straddle the same points.
    for (i, &p) in points.iter().enumerate() {
      assert_eq!(aa.vtx_buffer()[i * 3].pos, p);
    }
    let q0 = aliased.vtx_buffer()[0].pos;
    let q3 = aliased.vtx_buffer()[3].pos;
    assert_eq!((q0 + q3) * 0.5, points[0]);
  }

  #[test]
  fn test_stroke_closed_has_extra_segment() {
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(0.0, 10.0),
    ];
    let mut open = new_list();
    open.add_polyline(&points, Color32::WHITE, false, 1.0);
    let mut closed = new_list();
    closed.add_polyline(&points, Color32::WHITE, true, 1.0);
    assert_eq!(open.idx_buffer().len(), 3 * 12);
    assert_eq!(closed.idx_buffer().len(), 4 * 12);
  }

  #[test]
  fn test_fill_convex_quad_non_aa() {
    let mut list = new_list();
    list.flags.anti_aliased_fill = false;
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(0.0, 10.0),
    ];
    list.add_convex_poly_filled(&points, Color32::WHITE);
    assert_eq!(list.idx_buffer().len(), 2 * 3);
    assert_eq!(list.vtx_buffer().len(), 4);
  }

  #[test]
  fn test_fill_convex_quad_aa_adds_fringe() {
    let mut list = new_list();
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(0.0, 10.0),
    ];
    list.add_convex_poly_filled(&points, Color32::WHITE);
    // 2 fill triangles + 4 fringe quads (2 triangles each).
    assert_eq!(list.idx_buffer().len(), (4 - 2) * 3 + 4 * 6);
    assert_eq!(list.vtx_buffer().len(), 8);
    // Fringe vertices are fully transparent versions of the fill color.
    assert_eq!(list.vtx_buffer()[1].col, Color32::WHITE.transparent());
  }

  #[test]
  fn test_concave_fill_emits_n_minus_2_triangles() {
    let mut list = new_list();
    list.flags.anti_aliased_fill = false;
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(20.0, 0.0),
      Vec2::new(20.0, 10.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(10.0, 20.0),
      Vec2::new(0.0, 20.0),
    ];
    list.add_concave_poly_filled(&points, Color32::WHITE);
    assert_eq!(list.idx_buffer().len(), (points.len() - 2) * 3);
  }

  #[test]
  fn test_transparent_color_draws_nothing() {
    let mut list = new_list();
    list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), Color32::TRANSPARENT);
    list.add_circle(Vec2::new(5.0, 5.0), 3.0, Color32::WHITE.transparent(), 0, 1.0);
    assert!(list.vtx_buffer().is_empty());
    assert!(list.idx_buffer().is_empty());
  }

  #[test]
  fn test_circle_auto_segments_closed_loop() {
    let mut list = new_list();
    list.add_circle(Vec2::new(50.0, 50.0), 20.0, Color32::WHITE, 0, 1.0);
    assert!(!list.vtx_buffer().is_empty());
    let total: u32 = list.commands().iter().map(|c| c.elem_count).sum();
    assert_eq!(total as usize, list.idx_buffer().len());
  }

  #[test]
  fn test_bezier_adaptive_flattening_hits_endpoint() {
    let mut list = new_list();
    list.path_line_to(Vec2::new(0.0, 0.0));
    list.path_bezier_cubic_curve_to(
      Vec2::new(10.0, 0.0),
      Vec2::new(20.0, 10.0),
      Vec2::new(30.0, 10.0),
      0,
    );
    let last = *list.path.last().unwrap();
    assert_eq!(last, Vec2::new(30.0, 10.0));
    assert!(list.path.len() > 2);
  }

  #[test]
  fn test_bezier_uniform_sampling_count() {
    let mut list = new_list();
    list.path_line_to(Vec2::new(0.0, 0.0));
    list.path_bezier_quadratic_curve_to(Vec2::new(10.0, 10.0), Vec2::new(20.0, 0.0), 8);
    assert_eq!(list.path.len(), 1 + 8);
  }

  #[test]
  fn test_path_cleared_after_consumption() {
    let mut list = new_list();
    list.path_line_to(Vec2::new(0.0, 0.0));
    list.path_line_to(Vec2::new(10.0, 0.0));
    list.path_stroke(Color32::WHITE, false, 1.0);
    assert!(list.path.is_empty());
  }

  #[test]
  fn test_prim_unreserve_returns_surplus() {
    let mut list = new_list();
    let w = list.prim_reserve(12, 8);
    let (v, i) = w.finish_partial();
    assert_eq!((v, i), (0, 0));
    list.prim_unreserve(12, 8);
    assert!(list.vtx_buffer().is_empty());
    assert!(list.idx_buffer().is_empty());
    assert_eq!(list.commands().last().unwrap().elem_count, 0);
  }

  #[cfg(not(feature = "index32"))]
  #[test]
  fn test_vtx_offset_rotates_past_64k() {
    let mut list = new_list();
    list.flags.allow_vtx_offset = true;
    // 20000 rects * 4 vertices overflows 16-bit indices twice.
    for i in 0..20000 {
      let x = (i % 100) as f32;
      list.add_rect_filled(Vec2::new(x, 0.0), Vec2::new(x + 1.0, 1.0), Color32::WHITE);
    }
    list.pop_unused_draw_cmd();
    assert_eq!(list.vtx_buffer().len(), 80000);
    let offsets: Vec<u32> = list.commands().iter().map(|c| c.vtx_offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    assert!(offsets.len() >= 2);
    // Within each command, indices stay under 2^16.
    let total: u32 = list.commands().iter().map(|c| c.elem_count).sum();
    assert_eq!(total as usize, list.idx_buffer().len());
  }

  #[test]
  fn test_rounded_rect_path_has_corner_arcs() {
    let mut list = new_list();
    list.path_rect(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), 10.0, RoundCorners::ALL);
    assert!(list.path.len() > 4);
    list.path_clear();
    list.path_rect(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), 10.0, RoundCorners::NONE);
    assert_eq!(list.path.len(), 4);
  }
}
