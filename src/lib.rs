pub mod color;
pub mod draw;
pub mod error;
pub mod font;
pub mod geometry;

pub use color::Color32;
pub use draw::context::DrawContext;
pub use draw::data::DrawData;
pub use draw::list::{DrawList, DrawListFlags, RoundCorners, TextureId};
pub use draw::splitter::DrawListSplitter;
pub use draw::vertex::{DrawIdx, DrawVert};
pub use error::{Error, Result};
pub use font::atlas::{FontAtlas, FontAtlasFlags, FontId, FontSource};
pub use font::font::Font;
pub use font::glyph::Glyph;
pub use geometry::{Rect, Vec2};
