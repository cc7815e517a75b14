//! SVG rendering in pure Rust.
//!
//! `lumen-svg` parses SVG markup into a document model, resolves styles and
//! geometry on demand, and rasterizes documents or individual elements into
//! premultiplied RGBA bitmaps. It uses:
//! - `roxmltree` for parsing markup and `simplecss` for `<style>` sheets
//! - `svgtypes` for attribute grammars (paths, transforms, lengths, colors)
//! - `tiny-skia` for anti-aliased rasterization
//! - `fontdb` and `ttf-parser` for text outlines
//!
//! # Example
//!
//! ```rust,no_run
//! use lumen_svg::Document;
//!
//! let document = Document::load_from_file("input.svg")?;
//! let bitmap = document.render_to_bitmap(None, None, 0xFFFFFFFF)?;
//! bitmap.write_to_png("output.png")?;
//! # Ok::<(), lumen_svg::SvgError>(())
//! ```

mod bitmap;
mod document;
mod error;
mod font_config;
pub mod font_registry;
mod geometry;
mod layout;
mod matrix;
mod render;
mod style;
mod units;

// Re-export public API
pub use bitmap::Bitmap;
pub use document::{Document, Element};
pub use error::{SvgError, SvgResult};
pub use font_config::{CustomFont, FontConfig, GenericFamilyMap};
pub use geometry::BoundingBox;
pub use matrix::Matrix;
