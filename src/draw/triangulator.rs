//! Ear-clipping triangulation of simple polygons
//!
//! Fills concave (but non-self-intersecting, hole-free) polygons supplied as
//! ordered point lists. Based on "Triangulation by Ear Clipping"
//! (geometrictools.com), O(n²) worst case. Polygons are expected in
//! clockwise order; counter-clockwise input is recovered by the degenerate
//! fallback (see [`Triangulator::next_triangle`]).
//!
//! Nodes live in a caller-provided arena addressed by index, with explicit
//! prev/next links. Unlinking an ear is O(1) and no per-call allocation
//! happens once the scratch buffers have grown to the polygon size.

use crate::geometry::{triangle_contains_point, triangle_is_clockwise, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
  Convex,
  Ear,
  Reflex,
}

#[derive(Debug, Clone, Copy)]
struct Node {
  kind: NodeKind,
  /// Index of the vertex in the caller's point list (== arena slot)
  index: u32,
  pos: Vec2,
  prev: u32,
  next: u32,
}

/// Reusable scratch memory for [`Triangulator`]
///
/// Owned by the caller (each `DrawList` keeps one) so repeated concave fills
/// do not allocate.
#[derive(Default)]
pub struct TriScratch {
  nodes: Vec<Node>,
  ears: Vec<u32>,
  reflexes: Vec<u32>,
}

/// Ear-clipping triangulator over a borrowed scratch arena
///
/// ```
/// use fastdraw::draw::triangulator::{TriScratch, Triangulator};
/// use fastdraw::Vec2;
///
/// let points = [
///   Vec2::new(0.0, 0.0),
///   Vec2::new(10.0, 0.0),
///   Vec2::new(10.0, 10.0),
///   Vec2::new(0.0, 10.0),
/// ];
/// let mut scratch = TriScratch::default();
/// let mut tri = Triangulator::new(&points, &mut scratch);
/// let mut count = 0;
/// while tri.triangles_left() > 0 {
///   tri.next_triangle();
///   count += 1;
/// }
/// assert_eq!(count, 2);
/// ```
pub struct Triangulator<'a> {
  scratch: &'a mut TriScratch,
  head: u32,
  triangles_left: usize,
}

impl<'a> Triangulator<'a> {
  /// Expected number of triangles for a polygon of `points_count` vertices
  pub fn triangle_count(points_count: usize) -> usize {
    points_count.saturating_sub(2)
  }

  pub fn new(points: &[Vec2], scratch: &'a mut TriScratch) -> Self {
    assert!(points.len() >= 3, "triangulation needs at least 3 points");
    scratch.nodes.clear();
    scratch.ears.clear();
    scratch.reflexes.clear();

    let n = points.len() as u32;
    scratch.nodes.extend(points.iter().enumerate().map(|(i, &pos)| Node {
      kind: NodeKind::Convex,
      index: i as u32,
      pos,
      prev: (i as u32 + n - 1) % n,
      next: (i as u32 + 1) % n,
    }));

    let mut tri = Self {
      scratch,
      head: 0,
      triangles_left: Self::triangle_count(points.len()),
    };
    tri.build_reflexes();
    tri.build_ears();
    tri
  }

  /// Triangles not yet emitted
  pub fn triangles_left(&self) -> usize {
    self.triangles_left
  }

  /// Pops the next ear and returns its triangle as indices into the original
  /// point list
  ///
  /// When the ear list runs dry before all triangles are emitted (malformed
  /// or counter-clockwise input), the node list is reversed and reclassified
  /// once; if there is still no ear the first remaining triangle is emitted
  /// so the loop always terminates. This fallback guarantees termination and
  /// `n-2` output triangles, not a correct partition of malformed input.
  pub fn next_triangle(&mut self) -> [u32; 3] {
    if self.scratch.ears.is_empty() {
      self.flip_node_list();
      let mut node = self.head;
      for _ in 0..=self.triangles_left {
        self.scratch.nodes[node as usize].kind = NodeKind::Convex;
        node = self.scratch.nodes[node as usize].next;
      }
      self.scratch.reflexes.clear();
      self.build_reflexes();
      self.build_ears();
      if self.scratch.ears.is_empty() {
        // Geometry is degenerated: emit the first triangle available,
        // mimicking the behavior of convex fill.
        assert!(self.triangles_left > 0);
        self.scratch.ears.push(self.head);
      }
    }

    let ear = self.scratch.ears.pop().unwrap() as usize;
    let (prev, next) = {
      let node = self.scratch.nodes[ear];
      (node.prev, node.next)
    };
    let triangle = [
      self.scratch.nodes[prev as usize].index,
      self.scratch.nodes[ear].index,
      self.scratch.nodes[next as usize].index,
    ];

    // Unlink
    self.scratch.nodes[prev as usize].next = next;
    self.scratch.nodes[next as usize].prev = prev;
    if ear as u32 == self.head {
      self.head = next;
    }

    self.reclassify(prev);
    self.reclassify(next);
    self.triangles_left -= 1;
    triangle
  }

  fn build_reflexes(&mut self) {
    let mut n1 = self.head;
    for _ in 0..=self.triangles_left {
      let node = self.scratch.nodes[n1 as usize];
      let prev = self.scratch.nodes[node.prev as usize].pos;
      let next = self.scratch.nodes[node.next as usize].pos;
      if !triangle_is_clockwise(prev, node.pos, next) {
        self.scratch.nodes[n1 as usize].kind = NodeKind::Reflex;
        self.scratch.reflexes.push(n1);
      }
      n1 = node.next;
    }
  }

  fn build_ears(&mut self) {
    let mut n1 = self.head;
    for _ in 0..=self.triangles_left {
      let node = self.scratch.nodes[n1 as usize];
      if node.kind == NodeKind::Convex {
        let prev = self.scratch.nodes[node.prev as usize];
        let next = self.scratch.nodes[node.next as usize];
        if self.is_ear(prev.index, node.index, next.index, prev.pos, node.pos, next.pos) {
          self.scratch.nodes[n1 as usize].kind = NodeKind::Ear;
          self.scratch.ears.push(n1);
        }
      }
      n1 = node.next;
    }
  }

  /// A node is an ear when no other vertex lies inside its triangle; only
  /// reflex vertices can, so only those are tested
  fn is_ear(&self, i0: u32, i1: u32, i2: u32, v0: Vec2, v1: Vec2, v2: Vec2) -> bool {
    for &r in &self.scratch.reflexes {
      let reflex = &self.scratch.nodes[r as usize];
      if reflex.index != i0 && reflex.index != i1 && reflex.index != i2 {
        if triangle_contains_point(v0, v1, v2, reflex.pos) {
          return false;
        }
      }
    }
    true
  }

  /// Reverses the linked list in place (winding recovery)
  fn flip_node_list(&mut self) {
    let head = self.head;
    let mut prev = head;
    let mut current = self.scratch.nodes[head as usize].next;
    self.scratch.nodes[head as usize].next = head;
    self.scratch.nodes[head as usize].prev = head;
    while current != head {
      let temp = self.scratch.nodes[current as usize].next;

      self.scratch.nodes[current as usize].next = prev;
      self.scratch.nodes[prev as usize].prev = current;
      self.scratch.nodes[head as usize].next = current;
      self.scratch.nodes[current as usize].prev = head;

      prev = current;
      current = temp;
    }
    self.head = prev;
  }

  /// Re-derives a neighbor's classification after an ear was clipped; its
  /// kind may change as the remaining polygon shrinks
  fn reclassify(&mut self, n1: u32) {
    let node = self.scratch.nodes[n1 as usize];
    let prev = self.scratch.nodes[node.prev as usize];
    let next = self.scratch.nodes[node.next as usize];
    let kind = if !triangle_is_clockwise(prev.pos, node.pos, next.pos) {
      NodeKind::Reflex
    } else if self.is_ear(prev.index, node.index, next.index, prev.pos, node.pos, next.pos) {
      NodeKind::Ear
    } else {
      NodeKind::Convex
    };

    if kind == node.kind {
      return;
    }
    match node.kind {
      NodeKind::Reflex => find_erase_unsorted(&mut self.scratch.reflexes, n1),
      NodeKind::Ear => find_erase_unsorted(&mut self.scratch.ears, n1),
      NodeKind::Convex => {}
    }
    match kind {
      NodeKind::Reflex => self.scratch.reflexes.push(n1),
      NodeKind::Ear => self.scratch.ears.push(n1),
      NodeKind::Convex => {}
    }
    self.scratch.nodes[n1 as usize].kind = kind;
  }
}

fn find_erase_unsorted(span: &mut Vec<u32>, value: u32) {
  if let Some(i) = span.iter().rposition(|&v| v == value) {
    span.swap_remove(i);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn triangulate(points: &[Vec2]) -> Vec<[u32; 3]> {
    let mut scratch = TriScratch::default();
    let mut tri = Triangulator::new(points, &mut scratch);
    let mut out = Vec::new();
    while tri.triangles_left() > 0 {
      out.push(tri.next_triangle());
    }
    out
  }

  fn triangle_area(points: &[Vec2], t: [u32; 3]) -> f32 {
    let a = points[t[0] as usize];
    let b = points[t[1] as usize];
    let c = points[t[2] as usize];
    ((b - a).cross(c - a) / 2.0).abs()
  }

  fn polygon_area(points: &[Vec2]) -> f32 {
    let mut acc = 0.0;
    for i in 0..points.len() {
      let j = (i + 1) % points.len();
      acc += points[i].cross(points[j]);
    }
    (acc / 2.0).abs()
  }

  #[test]
  fn test_square_two_triangles() {
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(0.0, 10.0),
    ];
    let tris = triangulate(&points);
    assert_eq!(tris.len(), 2);
    let area: f32 = tris.iter().map(|&t| triangle_area(&points, t)).sum();
    assert!((area - 100.0).abs() < 1e-3);
  }

  #[test]
  fn test_concave_l_shape() {
    // Clockwise L-shape with one reflex vertex.
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(20.0, 0.0),
      Vec2::new(20.0, 10.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(10.0, 20.0),
      Vec2::new(0.0, 20.0),
    ];
    let tris = triangulate(&points);
    assert_eq!(tris.len(), points.len() - 2);
    let area: f32 = tris.iter().map(|&t| triangle_area(&points, t)).sum();
    assert!((area - polygon_area(&points)).abs() < 1e-3);
  }

  #[test]
  fn test_counter_clockwise_recovered_by_flip() {
    // Counter-clockwise star-ish concave polygon: first classification pass
    // finds no ears, the flip fallback recovers it.
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(0.0, 20.0),
      Vec2::new(10.0, 20.0),
      Vec2::new(10.0, 10.0),
      Vec2::new(20.0, 10.0),
      Vec2::new(20.0, 0.0),
    ];
    let tris = triangulate(&points);
    assert_eq!(tris.len(), points.len() - 2);
    let area: f32 = tris.iter().map(|&t| triangle_area(&points, t)).sum();
    assert!((area - polygon_area(&points)).abs() < 1e-3);
  }

  #[test]
  fn test_collinear_degenerate_terminates() {
    // All points collinear: zero area but still n-2 triangles and no hang.
    let points = [
      Vec2::new(0.0, 0.0),
      Vec2::new(5.0, 0.0),
      Vec2::new(10.0, 0.0),
      Vec2::new(15.0, 0.0),
    ];
    let tris = triangulate(&points);
    assert_eq!(tris.len(), 2);
  }

  #[test]
  fn test_many_vertices_area_preserved() {
    // Clockwise regular 12-gon (Y-down).
    let mut points = Vec::new();
    for i in 0..12 {
      let a = i as f32 / 12.0 * std::f32::consts::TAU;
      points.push(Vec2::new(50.0 + 20.0 * a.cos(), 50.0 + 20.0 * a.sin()));
    }
    let tris = triangulate(&points);
    assert_eq!(tris.len(), 10);
    let area: f32 = tris.iter().map(|&t| triangle_area(&points, t)).sum();
    assert!((area - polygon_area(&points)).abs() < 1e-2);
  }

  #[test]
  fn test_scratch_reused_without_stale_state() {
    let square = [
      Vec2::new(0.0, 0.0),
      Vec2::new(4.0, 0.0),
      Vec2::new(4.0, 4.0),
      Vec2::new(0.0, 4.0),
    ];
    let mut scratch = TriScratch::default();
    for _ in 0..3 {
      let mut tri = Triangulator::new(&square, &mut scratch);
      let mut n = 0;
      while tri.triangles_left() > 0 {
        tri.next_triangle();
        n += 1;
      }
      assert_eq!(n, 2);
    }
  }
}
