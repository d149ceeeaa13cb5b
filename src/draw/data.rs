//! Per-frame output handed to the rendering backend

use crate::draw::list::DrawList;
use crate::draw::vertex::DrawIdx;
use crate::geometry::Vec2;
use std::mem;

/// All the draw lists of one frame, in submission order, plus the totals a
/// backend needs to size its GPU buffers
///
/// Lists are added through [`DrawData::add_draw_list`], which also runs the
/// final sanity checks on each list (reserved windows fully consumed, 16-bit
/// index capacity respected).
#[derive(Default)]
pub struct DrawData {
  /// True between the end of frame building and rendering
  pub valid: bool,
  lists: Vec<DrawList>,
  pub total_vtx_count: usize,
  pub total_idx_count: usize,
  /// Top-left of the viewport the lists were recorded against
  pub display_pos: Vec2,
  /// Size of the viewport in pixels
  pub display_size: Vec2,
  /// Scale to translate pixel coordinates into framebuffer texels
  pub framebuffer_scale: Vec2,
}

impl DrawData {
  pub fn clear(&mut self) {
    self.valid = false;
    self.lists.clear();
    self.total_vtx_count = 0;
    self.total_idx_count = 0;
    self.display_pos = Vec2::ZERO;
    self.display_size = Vec2::ZERO;
    self.framebuffer_scale = Vec2::ZERO;
  }

  pub fn lists(&self) -> &[DrawList] {
    &self.lists
  }

  /// Finalizes `list` and appends it to the frame output
  ///
  /// Skips lists that recorded nothing. Asserts when a 16-bit-index list
  /// exceeded 65536 vertices without the vertex-offset mechanism engaged —
  /// that is a caller sizing mistake, not a runtime condition.
  pub fn add_draw_list(&mut self, mut list: DrawList) {
    list.pop_unused_draw_cmd();
    if list.commands().is_empty() {
      return;
    }

    if !list.flags.allow_vtx_offset {
      debug_assert_eq!(list.vtx_current_idx() as usize, list.vtx_buffer().len());
    }
    if mem::size_of::<DrawIdx>() == 2 {
      assert!(
        (list.vtx_current_idx() as usize) < (1 << 16),
        "too many vertices in a draw list using 16-bit indices; enable \
         allow_vtx_offset with a backend that honors it, or the index32 feature"
      );
    }

    self.total_vtx_count += list.vtx_buffer().len();
    self.total_idx_count += list.idx_buffer().len();
    self.lists.push(list);
    self.valid = true;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::color::Color32;
  use crate::draw::context::DrawContext;
  use crate::draw::list::DrawList;
  use std::sync::Arc;

  fn new_list() -> DrawList {
    DrawList::new(Arc::new(DrawContext::new()))
  }

  #[test]
  fn test_empty_list_skipped() {
    let mut data = DrawData::default();
    data.add_draw_list(new_list());
    assert!(data.lists().is_empty());
    assert!(!data.valid);
  }

  #[test]
  fn test_totals_accumulate() {
    let mut data = DrawData::default();
    for _ in 0..2 {
      let mut list = new_list();
      list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0), Color32::WHITE);
      data.add_draw_list(list);
    }
    assert_eq!(data.lists().len(), 2);
    assert_eq!(data.total_vtx_count, 8);
    assert_eq!(data.total_idx_count, 12);
    assert!(data.valid);
  }
}
