//! Channel splitter: out-of-order draw recording
//!
//! The splitter forks a draw list's command/index output into independent
//! channels that are later concatenated back in channel order, letting
//! content drawn late end up behind content drawn earlier without
//! re-tessellating. Only commands and indices are swapped around; vertices
//! always accumulate in the draw list's single vertex arena, so the merge
//! only has to rebuild index offsets.
//!
//! The merge step is the sole point where the scattered per-channel buffers
//! are linearized; it must run before the list is consumed, and splits never
//! nest on the same list.

use crate::draw::list::{DrawCmd, DrawList};
use crate::draw::vertex::DrawIdx;

/// One forked output stream: saved command and index buffers
#[derive(Default)]
pub struct DrawChannel {
  cmd_buffer: Vec<DrawCmd>,
  idx_buffer: Vec<DrawIdx>,
}

/// Splits draw output into channels for later in-order reassembly
///
/// ```
/// use fastdraw::{Color32, DrawContext, DrawList, Vec2};
/// use std::sync::Arc;
///
/// let mut list = DrawList::new(Arc::new(DrawContext::new()));
/// list.channels_split(2);
/// list.channels_set_current(1);
/// // Drawn first, appears second:
/// list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0), Color32::WHITE);
/// list.channels_set_current(0);
/// list.add_rect_filled(Vec2::new(2.0, 2.0), Vec2::new(8.0, 8.0), Color32::BLACK);
/// list.channels_merge();
/// ```
#[derive(Default)]
pub struct DrawListSplitter {
  current: usize,
  count: usize,
  channels: Vec<DrawChannel>,
}

impl DrawListSplitter {
  /// Channels active in the current split (1 when not split)
  pub fn active_count(&self) -> usize {
    self.count.max(1)
  }

  pub fn clear(&mut self) {
    self.current = 0;
    self.count = 1;
    // Keep the channel storage allocated for reuse next frame.
    for ch in &mut self.channels {
      ch.cmd_buffer.clear();
      ch.idx_buffer.clear();
    }
  }

  pub fn clear_free_memory(&mut self) {
    self.current = 0;
    self.count = 1;
    self.channels.clear();
  }

  /// Allocates `count` channels; channel 0 aliases the live buffers
  pub fn split(&mut self, _draw_list: &mut DrawList, count: usize) {
    assert!(
      self.current == 0 && self.count <= 1,
      "nested channel splitting is not supported; use separate splitters"
    );
    if self.channels.len() < count {
      self.channels.resize_with(count, DrawChannel::default);
    }
    self.count = count;

    // Channel 0's content does not matter: switching away from it copies the
    // live buffers in, switching back restores them.
    for ch in &mut self.channels[..count] {
      ch.cmd_buffer.clear();
      ch.idx_buffer.clear();
    }
  }

  /// Concatenates all channels back into the list, in channel order
  pub fn merge(&mut self, draw_list: &mut DrawList) {
    if self.count <= 1 {
      return;
    }

    self.set_current_channel(draw_list, 0);
    draw_list.pop_unused_draw_cmd();

    // Where the last command merged into the output so far lives: still in
    // the live buffer, or at the tail of an earlier channel.
    #[derive(Clone, Copy)]
    enum LastCmd {
      Live,
      Channel(usize),
    }

    // First pass: trim trailing empty commands, merge across channel seams,
    // rebuild index offsets, and size the final buffers.
    let mut new_cmd_count = 0;
    let mut new_idx_count = 0;
    let mut last_cmd = if draw_list.cmd_buffer.is_empty() {
      None
    } else {
      Some(LastCmd::Live)
    };
    let mut idx_offset = draw_list
      .cmd_buffer
      .last()
      .map(|cmd| cmd.idx_offset + cmd.elem_count)
      .unwrap_or(0);

    for i in 1..self.count {
      {
        let ch = &mut self.channels[i];
        if let Some(last) = ch.cmd_buffer.last() {
          if last.elem_count == 0 && last.callback.is_none() {
            ch.cmd_buffer.pop();
          }
        }
      }

      if !self.channels[i].cmd_buffer.is_empty() {
        if let Some(loc) = last_cmd {
          let (header, has_callback) = {
            let last = match loc {
              LastCmd::Live => draw_list.cmd_buffer.last().unwrap(),
              LastCmd::Channel(j) => self.channels[j].cmd_buffer.last().unwrap(),
            };
            (last.header(), last.callback.is_some())
          };
          // Index offsets are rebuilt below, so the seam merge only compares
          // headers.
          let next = &self.channels[i].cmd_buffer[0];
          if next.header_eq(&header) && !has_callback && next.callback.is_none() {
            let elem_count = next.elem_count;
            self.channels[i].cmd_buffer.remove(0);
            idx_offset += elem_count;
            match loc {
              LastCmd::Live => draw_list.cmd_buffer.last_mut().unwrap().elem_count += elem_count,
              LastCmd::Channel(j) => {
                self.channels[j].cmd_buffer.last_mut().unwrap().elem_count += elem_count
              }
            }
          }
        }
      }

      if !self.channels[i].cmd_buffer.is_empty() {
        last_cmd = Some(LastCmd::Channel(i));
      }
      let ch = &mut self.channels[i];
      new_cmd_count += ch.cmd_buffer.len();
      new_idx_count += ch.idx_buffer.len();
      for cmd in &mut ch.cmd_buffer {
        cmd.idx_offset = idx_offset;
        idx_offset += cmd.elem_count;
      }
    }

    draw_list.cmd_buffer.reserve(new_cmd_count);
    draw_list.idx_buffer.reserve(new_idx_count);
    for i in 1..self.count {
      let ch = &mut self.channels[i];
      draw_list.cmd_buffer.append(&mut ch.cmd_buffer);
      draw_list.idx_buffer.append(&mut ch.idx_buffer);
    }

    // Restore the always-one-trailing-command invariant.
    let needs_trailing = match draw_list.cmd_buffer.last() {
      None => true,
      Some(cmd) => cmd.callback.is_some(),
    };
    if needs_trailing {
      draw_list.add_draw_cmd();
    }
    let header = draw_list.cmd_header;
    let curr = draw_list.cmd_buffer.last_mut().unwrap();
    if curr.elem_count == 0 {
      curr.copy_header(&header);
    } else if !curr.header_eq(&header) {
      draw_list.add_draw_cmd();
    }

    self.count = 1;
  }

  /// Swaps the selected channel's storage into the live draw list
  pub fn set_current_channel(&mut self, draw_list: &mut DrawList, idx: usize) {
    assert!(idx < self.count, "channel index out of range");
    if self.current == idx {
      return;
    }

    std::mem::swap(&mut self.channels[self.current].cmd_buffer, &mut draw_list.cmd_buffer);
    std::mem::swap(&mut self.channels[self.current].idx_buffer, &mut draw_list.idx_buffer);
    self.current = idx;
    std::mem::swap(&mut self.channels[idx].cmd_buffer, &mut draw_list.cmd_buffer);
    std::mem::swap(&mut self.channels[idx].idx_buffer, &mut draw_list.idx_buffer);

    // The swapped-in channel may carry stale state: re-open a command for
    // the current header if needed.
    if draw_list.cmd_buffer.is_empty() {
      draw_list.add_draw_cmd();
      return;
    }
    let header = draw_list.cmd_header;
    let curr = draw_list.cmd_buffer.last_mut().unwrap();
    if curr.elem_count == 0 {
      curr.copy_header(&header);
    } else if !curr.header_eq(&header) {
      draw_list.add_draw_cmd();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::color::Color32;
  use crate::draw::context::DrawContext;
  use crate::geometry::Vec2;
  use std::sync::Arc;

  fn new_list() -> DrawList {
    DrawList::new(Arc::new(DrawContext::new()))
  }

  fn rect(list: &mut DrawList, x: f32) {
    list.add_rect_filled(Vec2::new(x, 0.0), Vec2::new(x + 1.0, 1.0), Color32::WHITE);
  }

  #[test]
  fn test_merge_linearizes_in_channel_order() {
    let mut list = new_list();
    list.channels_split(2);
    list.channels_set_current(1);
    rect(&mut list, 10.0); // recorded first, output second
    list.channels_set_current(0);
    rect(&mut list, 0.0); // recorded second, output first
    list.channels_merge();
    list.pop_unused_draw_cmd();

    // Same state: a single merged command covering both rects.
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.commands()[0].elem_count, 12);
    // Channel 0's indices come first and reference channel 0's vertices
    // (drawn at x=0, written to the vertex arena after channel 1's).
    let first_vtx = list.vtx_buffer()[list.idx_buffer()[0] as usize];
    assert_eq!(first_vtx.pos, Vec2::new(0.0, 0.0));
    let total: u32 = list.commands().iter().map(|c| c.elem_count).sum();
    assert_eq!(total as usize, list.idx_buffer().len());
  }

  #[test]
  fn test_merge_rebuilds_idx_offsets() {
    let mut list = new_list();
    list.channels_split(3);
    list.channels_set_current(2);
    list.push_clip_rect(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0), false);
    rect(&mut list, 2.0);
    list.pop_clip_rect();
    list.channels_set_current(1);
    rect(&mut list, 1.0);
    list.channels_set_current(0);
    rect(&mut list, 0.0);
    list.channels_merge();
    list.pop_unused_draw_cmd();

    let cmds = list.commands();
    // Offsets are contiguous in output order.
    let mut expected = 0;
    for cmd in cmds {
      assert_eq!(cmd.idx_offset, expected);
      expected += cmd.elem_count;
    }
    assert_eq!(expected as usize, list.idx_buffer().len());
  }

  #[test]
  fn test_merge_with_untouched_channel() {
    let mut list = new_list();
    list.channels_split(2);
    list.channels_set_current(0);
    rect(&mut list, 0.0);
    // Channel 1 never drawn into.
    list.channels_merge();
    list.pop_unused_draw_cmd();
    assert_eq!(list.commands().len(), 1);
    assert_eq!(list.commands()[0].elem_count, 6);
  }

  #[test]
  #[should_panic(expected = "nested channel splitting")]
  fn test_nested_split_panics() {
    let mut list = new_list();
    list.channels_split(2);
    list.channels_split(2);
  }

  #[test]
  fn test_list_usable_after_merge() {
    let mut list = new_list();
    list.channels_split(2);
    list.channels_set_current(1);
    rect(&mut list, 5.0);
    list.channels_set_current(0);
    list.channels_merge();
    rect(&mut list, 9.0);
    list.pop_unused_draw_cmd();
    let total: u32 = list.commands().iter().map(|c| c.elem_count).sum();
    assert_eq!(total as usize, list.idx_buffer().len());
  }
}
