//! Text layout: `<text>` and `<tspan>` content to glyph outlines.
//!
//! Text is laid out on a single baseline per chunk. A chunk starts at the
//! `<text>` element and at every `<tspan>` with an absolute `x`; its
//! `text-anchor` shifts all glyphs of the chunk once the chunk is complete.
//! Glyph outlines come from the font registry. Without any face the advance
//! is estimated at half an em per character.

use super::properties::ComputedStyle;
use crate::document::node::{ElementKind, NodeData, NodeId, Tree};
use crate::font_registry;
use crate::geometry::BoundingBox;
use crate::units::{parse_length_list, Axis, LengthContext};
use tiny_skia::{Path, PathBuilder, Transform};

/// The `<text>` element or one of its `<tspan>` descendants.
pub(crate) struct TextOwner {
    pub node: NodeId,
    pub style: ComputedStyle,
    /// Index of the enclosing owner; `None` for the `<text>` element.
    pub parent: Option<usize>,
}

/// A run of glyphs drawn with one owner's style.
pub(crate) struct TextFragment {
    pub owner: usize,
    pub path: Option<Path>,
    pub bbox: BoundingBox,
}

pub(crate) struct TextLayout {
    pub owners: Vec<TextOwner>,
    pub fragments: Vec<TextFragment>,
}

impl TextLayout {
    /// Merged outline of every fragment owned by `owner`.
    pub fn owner_path(&self, owner: usize) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for fragment in self.fragments.iter().filter(|f| f.owner == owner) {
            if let Some(path) = &fragment.path {
                pb.push_path(path);
            }
        }
        pb.finish()
    }

    pub fn owner_bbox(&self, owner: usize) -> Option<BoundingBox> {
        self.fragments
            .iter()
            .filter(|f| f.owner == owner)
            .fold(None, |acc, f| crate::geometry::union_opt(acc, f.bbox))
    }
}

struct Cursor {
    x: f32,
    y: f32,
    chunk_start: usize,
    chunk_x: f32,
    anchor: crate::style::TextAnchor,
    preserve_space: bool,
    /// A collapsed space waiting for the next visible character.
    pending_space: bool,
    /// Nothing visible has been emitted yet.
    at_start: bool,
}

pub(crate) struct TextLayouter<'a, F>
where
    F: FnMut(NodeId, &ComputedStyle) -> ComputedStyle,
{
    tree: &'a Tree,
    viewport: (f32, f32),
    style_of: F,
    owners: Vec<TextOwner>,
    fragments: Vec<TextFragment>,
}

impl<'a, F> TextLayouter<'a, F>
where
    F: FnMut(NodeId, &ComputedStyle) -> ComputedStyle,
{
    /// `style_of` computes a descendant's style from its parent's.
    pub fn new(tree: &'a Tree, viewport: (f32, f32), style_of: F) -> Self {
        Self {
            tree,
            viewport,
            style_of,
            owners: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn layout(mut self, text: NodeId, style: ComputedStyle) -> TextLayout {
        let ctx = style.length_context(self.viewport);
        let preserve_space = self.tree.attribute(text, "xml:space") == Some("preserve");
        let mut cursor = Cursor {
            x: first_length(self.tree.attribute(text, "x"), &ctx, Axis::X).unwrap_or(0.0),
            y: first_length(self.tree.attribute(text, "y"), &ctx, Axis::Y).unwrap_or(0.0),
            chunk_start: 0,
            chunk_x: 0.0,
            anchor: style.text_anchor,
            preserve_space,
            pending_space: false,
            at_start: true,
        };
        cursor.x += first_length(self.tree.attribute(text, "dx"), &ctx, Axis::X).unwrap_or(0.0);
        cursor.y += first_length(self.tree.attribute(text, "dy"), &ctx, Axis::Y).unwrap_or(0.0);
        cursor.chunk_x = cursor.x;

        self.owners.push(TextOwner {
            node: text,
            style,
            parent: None,
        });
        self.walk(text, 0, &mut cursor);
        self.finish_chunk(&cursor);

        TextLayout {
            owners: self.owners,
            fragments: self.fragments,
        }
    }

    fn walk(&mut self, node: NodeId, owner: usize, cursor: &mut Cursor) {
        let children = self.tree.node(node).children.clone();
        for child in children {
            match &self.tree.node(child).data {
                NodeData::Text(content) => {
                    let run = normalize(content, cursor);
                    self.emit(owner, &run, cursor);
                }
                NodeData::Element(element) if element.kind == ElementKind::Tspan => {
                    let style = (self.style_of)(child, &self.owners[owner].style);
                    if style.display_none {
                        continue;
                    }
                    let ctx = style.length_context(self.viewport);
                    if let Some(x) = first_length(self.tree.attribute(child, "x"), &ctx, Axis::X) {
                        self.finish_chunk(cursor);
                        cursor.x = x;
                        cursor.chunk_x = x;
                        cursor.chunk_start = self.fragments.len();
                        cursor.anchor = style.text_anchor;
                    }
                    if let Some(y) = first_length(self.tree.attribute(child, "y"), &ctx, Axis::Y) {
                        cursor.y = y;
                    }
                    cursor.x += first_length(self.tree.attribute(child, "dx"), &ctx, Axis::X)
                        .unwrap_or(0.0);
                    cursor.y += first_length(self.tree.attribute(child, "dy"), &ctx, Axis::Y)
                        .unwrap_or(0.0);

                    self.owners.push(TextOwner {
                        node: child,
                        style,
                        parent: Some(owner),
                    });
                    let index = self.owners.len() - 1;
                    self.walk(child, index, cursor);
                }
                NodeData::Element(_) => {}
            }
        }
    }

    fn emit(&mut self, owner: usize, run: &str, cursor: &mut Cursor) {
        if run.is_empty() {
            return;
        }
        let style = &self.owners[owner].style;
        let glyphs = shape_run(run, style, cursor.x, cursor.y);
        if glyphs.advance > 0.0 || glyphs.path.is_some() {
            self.fragments.push(TextFragment {
                owner,
                path: glyphs.path,
                bbox: BoundingBox::new(
                    cursor.x,
                    cursor.y - glyphs.ascent,
                    glyphs.advance,
                    glyphs.ascent + glyphs.descent,
                ),
            });
        }
        cursor.x += glyphs.advance;
    }

    fn finish_chunk(&mut self, cursor: &Cursor) {
        let dx = cursor.anchor.offset(cursor.x - cursor.chunk_x);
        if dx == 0.0 {
            return;
        }
        let shift = Transform::from_translate(dx, 0.0);
        for fragment in &mut self.fragments[cursor.chunk_start..] {
            fragment.path = fragment.path.take().and_then(|p| p.transform(shift));
            fragment.bbox.x += dx;
        }
    }
}

/// Apply SVG whitespace handling to one text node.
fn normalize(content: &str, cursor: &mut Cursor) -> String {
    let mut out = String::with_capacity(content.len());
    if cursor.preserve_space {
        for ch in content.chars() {
            out.push(if ch.is_whitespace() { ' ' } else { ch });
        }
        return out;
    }

    for ch in content.chars() {
        if ch == '\n' || ch == '\r' {
            continue;
        }
        if ch.is_whitespace() {
            if !cursor.at_start {
                cursor.pending_space = true;
            }
            continue;
        }
        if cursor.pending_space {
            out.push(' ');
            cursor.pending_space = false;
        }
        cursor.at_start = false;
        out.push(ch);
    }
    out
}

fn first_length(text: Option<&str>, ctx: &LengthContext, axis: Axis) -> Option<f32> {
    let lengths = parse_length_list(text?)?;
    lengths.first().map(|l| ctx.resolve(*l, axis))
}

struct GlyphRun {
    path: Option<Path>,
    advance: f32,
    ascent: f32,
    descent: f32,
}

/// Lay out `text` as glyph outlines with the baseline origin at `(x, y)`.
fn shape_run(text: &str, style: &ComputedStyle, x: f32, y: f32) -> GlyphRun {
    let size = style.font_size;
    let shaped = font_registry::with_face(&style.font_family, style.is_bold(), style.font_italic, |face| {
        let scale = size / face.units_per_em() as f32;
        let mut pb = PathBuilder::new();
        let mut pen = x;
        for ch in text.chars() {
            let glyph = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
            let mut outline = GlyphOutline {
                pb: &mut pb,
                scale,
                x: pen,
                y,
            };
            face.outline_glyph(glyph, &mut outline);
            pen += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }
        GlyphRun {
            path: pb.finish(),
            advance: pen - x,
            ascent: face.ascender() as f32 * scale,
            descent: -(face.descender() as f32) * scale,
        }
    });

    shaped.unwrap_or_else(|| GlyphRun {
        path: None,
        advance: text.chars().count() as f32 * size * 0.5,
        ascent: size * 0.8,
        descent: size * 0.2,
    })
}

/// Converts font units to user space, flipping the y axis.
struct GlyphOutline<'a> {
    pb: &'a mut PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl GlyphOutline<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.pb.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.pb.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.pb.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.pb.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.pb.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::layout::properties::is_presentation_attribute;

    fn style_for(tree: &Tree, node: NodeId, parent: &ComputedStyle) -> ComputedStyle {
        let declarations: Vec<(&str, &str)> = tree
            .element(node)
            .unwrap()
            .attributes
            .iter()
            .filter(|(name, _)| is_presentation_attribute(name))
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        ComputedStyle::cascade(parent, &declarations, (100.0, 100.0))
    }

    fn layout(markup: &str) -> TextLayout {
        let doc = format!(r#"<svg xmlns="http://www.w3.org/2000/svg">{markup}</svg>"#);
        let tree = Tree::parse(&doc).unwrap();
        let text = tree.child_elements(tree.root()).next().unwrap();
        let style = style_for(&tree, text, &ComputedStyle::default());
        TextLayouter::new(&tree, (100.0, 100.0), |node, parent: &ComputedStyle| {
            style_for(&tree, node, parent)
        })
        .layout(text, style)
    }

    #[test]
    fn test_whitespace_collapses() {
        let mut cursor = Cursor {
            x: 0.0,
            y: 0.0,
            chunk_start: 0,
            chunk_x: 0.0,
            anchor: crate::style::TextAnchor::Start,
            preserve_space: false,
            pending_space: false,
            at_start: true,
        };
        assert_eq!(normalize("\n  Hello \t  big", &mut cursor), "Hello big");
        // the trailing space is only emitted before the next visible character
        assert_eq!(normalize("   world  ", &mut cursor), " world");
        assert!(cursor.pending_space);
    }

    #[test]
    fn test_tspans_become_owners() {
        let text = layout(r#"<text x="10" y="20">Hi <tspan>there</tspan> you</text>"#);
        assert_eq!(text.owners.len(), 2);
        assert_eq!(text.owners[1].parent, Some(0));
        assert!(text.owner_bbox(0).is_some());
        assert!(text.owner_bbox(1).is_some());

        let first = text.owner_bbox(0).unwrap();
        let tspan = text.owner_bbox(1).unwrap();
        assert_eq!(first.x, 10.0);
        assert!(tspan.x > 10.0);
    }

    #[test]
    fn test_text_anchor_end_shifts_chunk() {
        let start = layout(r#"<text x="50" y="20">abc</text>"#);
        let end = layout(r#"<text x="50" y="20" text-anchor="end">abc</text>"#);
        let start_box = start.owner_bbox(0).unwrap();
        let end_box = end.owner_bbox(0).unwrap();
        assert!((start_box.w - end_box.w).abs() < 1e-3);
        assert_eq!(start_box.x, 50.0);
        assert!((end_box.right() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_tspan_absolute_x_starts_new_chunk() {
        let text = layout(r#"<text x="10" y="20">ab<tspan x="70" y="40">cd</tspan></text>"#);
        let tspan = text.owner_bbox(1).unwrap();
        assert_eq!(tspan.x, 70.0);
        // baseline moved down by 20
        let first = text.owner_bbox(0).unwrap();
        assert!((tspan.y - first.y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_text_has_no_fragments() {
        let text = layout(r#"<text x="5" y="5">   </text>"#);
        assert!(text.fragments.is_empty());
        assert!(text.owner_path(0).is_none());
    }
}
