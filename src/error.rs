//! Error types for fastdraw
//!
//! Only the build-time surface (font parsing, atlas construction) returns
//! `Result`. The per-frame tessellation hot path treats invalid input as a
//! programmer error and asserts instead of propagating; degenerate geometry
//! is absorbed locally (see the drawing modules).
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

/// Result type alias for fastdraw operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Error, Debug)]
pub enum Error {
  /// Font data parsing or glyph loading error
  #[error("Font error: {0}")]
  Font(#[from] FontError),

  /// Atlas build error
  #[error("Atlas error: {0}")]
  Atlas(#[from] AtlasError),
}

/// Errors that occur while loading font sources
#[derive(Error, Debug, Clone)]
pub enum FontError {
  /// The TTF/OTF data could not be parsed
  #[error("Failed to parse font data (face index {face_index})")]
  InvalidFontData { face_index: u32 },

  /// The font source declared an invalid pixel size
  #[error("Invalid font size: {size_pixels}")]
  InvalidSize { size_pixels: f32 },

  /// The font has no usable vertical metrics
  #[error("Font has no usable vertical metrics (face index {face_index})")]
  MissingMetrics { face_index: u32 },
}

/// Errors that occur while building the font atlas
#[derive(Error, Debug, Clone)]
pub enum AtlasError {
  /// Build was requested with no font sources configured
  #[error("Cannot build an atlas with no font sources")]
  NoSources,

  /// A merge-mode source referenced a font that does not exist
  #[error("Font source targets unknown font id {font_id}")]
  UnknownMergeTarget { font_id: usize },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    let err = Error::Font(FontError::InvalidFontData { face_index: 2 });
    assert_eq!(
      err.to_string(),
      "Font error: Failed to parse font data (face index 2)"
    );
  }

  #[test]
  fn test_error_conversion() {
    fn build() -> Result<()> {
      Err(AtlasError::NoSources)?
    }
    assert!(matches!(build(), Err(Error::Atlas(AtlasError::NoSources))));
  }
}
