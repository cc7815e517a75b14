//! The document object model and its public handle types.

pub(crate) mod css;
mod element;
pub(crate) mod node;

pub use element::Element;

use crate::bitmap::Bitmap;
use crate::error::{SvgError, SvgResult};
use crate::geometry::BoundingBox;
use crate::layout::LayoutTree;
use crate::matrix::Matrix;
use crate::render::Renderer;
use node::{NodeId, Tree};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

/// Shared state behind a [`Document`] and its [`Element`] handles.
pub(crate) struct DocumentData {
    pub tree: Tree,
    /// Bumped by every mutation; a layout from an older generation is stale.
    pub generation: u64,
    pub layout: Option<LayoutTree>,
}

pub(crate) type SharedData = Rc<RefCell<DocumentData>>;

/// Run `f` with the tree and an up-to-date layout.
pub(crate) fn with_layout<R>(data: &SharedData, f: impl FnOnce(&Tree, &LayoutTree) -> R) -> R {
    let mut guard = data.borrow_mut();
    let data = &mut *guard;
    let generation = data.generation;
    let layout = match data.layout.take() {
        Some(layout) if layout.generation == generation => layout,
        _ => LayoutTree::build(&data.tree, generation),
    };
    let layout = data.layout.insert(layout);
    f(&data.tree, layout)
}

/// Paint `node` and its subtree into `bitmap`. `matrix` maps the node's
/// parent space to bitmap pixels.
pub(crate) fn render_node(
    data: &SharedData,
    node: NodeId,
    bitmap: &mut Bitmap<'_>,
    matrix: Matrix,
) -> SvgResult<()> {
    if bitmap.is_null() {
        return Err(SvgError::NullBitmap);
    }
    let (width, height) = (bitmap.width(), bitmap.height());
    with_layout(data, |tree, layout| {
        let Some(index) = layout.primary_index(node) else {
            return;
        };
        bitmap.with_packed_pixels(|pixels| {
            Renderer::new(tree, layout, pixels, width, height).render(index, matrix);
        });
    });
    Ok(())
}

/// Allocate a bitmap for content with the given natural box, clear it to
/// `background` and paint `node` into it.
pub(crate) fn render_node_to_bitmap(
    data: &SharedData,
    node: NodeId,
    natural: BoundingBox,
    width: Option<u32>,
    height: Option<u32>,
    background: u32,
) -> SvgResult<Bitmap<'static>> {
    let (width, height) = target_size(natural.w, natural.h, width, height)?;
    let mut bitmap = Bitmap::new(width, height)?;
    bitmap.clear(background);

    let matrix = Matrix::scaled(width as f32 / natural.w, height as f32 / natural.h)
        * Matrix::translated(-natural.x, -natural.y);
    render_node(data, node, &mut bitmap, matrix)?;
    Ok(bitmap)
}

/// Output size for a render of `natural_w` x `natural_h` content. A missing
/// dimension is derived from the other one by aspect ratio.
fn target_size(
    natural_w: f32,
    natural_h: f32,
    width: Option<u32>,
    height: Option<u32>,
) -> SvgResult<(u32, u32)> {
    let invalid = SvgError::InvalidDimensions {
        width: width.unwrap_or(0),
        height: height.unwrap_or(0),
    };
    if !(natural_w.is_finite() && natural_h.is_finite() && natural_w > 0.0 && natural_h > 0.0) {
        return Err(invalid);
    }

    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, (w as f32 * natural_h / natural_w).ceil() as u32),
        (None, Some(h)) => ((h as f32 * natural_w / natural_h).ceil() as u32, h),
        (None, None) => (natural_w.ceil() as u32, natural_h.ceil() as u32),
    };
    if width == 0 || height == 0 {
        return Err(SvgError::InvalidDimensions { width, height });
    }
    Ok((width, height))
}

/// A parsed SVG document.
///
/// Cloning a `Document` yields another handle to the same document.
/// Documents are single-threaded (`!Send`).
#[derive(Clone)]
pub struct Document {
    data: SharedData,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Document")
            .field("nodes", &data.tree.len())
            .field("generation", &data.generation)
            .finish()
    }
}

impl Document {
    /// Load a document from an SVG file.
    pub fn load_from_file(path: impl AsRef<Path>) -> SvgResult<Document> {
        let data = std::fs::read(path.as_ref())?;
        Document::load_from_data(&data)
    }

    /// Load a document from UTF-8 encoded SVG markup.
    pub fn load_from_data(data: &[u8]) -> SvgResult<Document> {
        let text = std::str::from_utf8(data).map_err(|_| SvgError::InvalidEncoding)?;
        text.parse()
    }

    pub(crate) fn from_data(data: SharedData) -> Document {
        Document { data }
    }

    /// Intrinsic width in pixels.
    pub fn width(&self) -> f32 {
        with_layout(&self.data, |_, layout| layout.width)
    }

    /// Intrinsic height in pixels.
    pub fn height(&self) -> f32 {
        with_layout(&self.data, |_, layout| layout.height)
    }

    /// Bounds of the rendered content in document pixel space.
    pub fn bounding_box(&self) -> BoundingBox {
        with_layout(&self.data, |_, layout| {
            let root = layout.root();
            root.bbox.unwrap_or_default().transformed(&root.local)
        })
    }

    /// The root `<svg>` element.
    pub fn document_element(&self) -> Element {
        let root = self.data.borrow().tree.root();
        Element::new(self.data.clone(), root)
    }

    /// First element in document order whose `id` attribute is `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        let node = self.data.borrow().tree.element_by_id(id)?;
        Some(Element::new(self.data.clone(), node))
    }

    /// Recompute styles and geometry now.
    ///
    /// Queries already refresh a stale layout on demand; this rebuilds the
    /// layout immediately even when nothing changed.
    pub fn update_layout(&self) {
        let mut guard = self.data.borrow_mut();
        let data = &mut *guard;
        data.layout = Some(LayoutTree::build(&data.tree, data.generation));
    }

    /// Paint the document into `bitmap`, mapping document pixels through
    /// `matrix`.
    pub fn render(&self, bitmap: &mut Bitmap<'_>, matrix: &Matrix) -> SvgResult<()> {
        self.document_element().render(bitmap, matrix)
    }

    /// Render the document into a new bitmap cleared to `background`
    /// (`0xRRGGBBAA`).
    ///
    /// A missing dimension is derived from the intrinsic aspect ratio; with
    /// neither given the intrinsic size is used.
    pub fn render_to_bitmap(
        &self,
        width: Option<u32>,
        height: Option<u32>,
        background: u32,
    ) -> SvgResult<Bitmap<'static>> {
        let natural = BoundingBox::new(0.0, 0.0, self.width(), self.height());
        let root = self.data.borrow().tree.root();
        render_node_to_bitmap(&self.data, root, natural, width, height, background)
    }
}

impl FromStr for Document {
    type Err = SvgError;

    fn from_str(text: &str) -> SvgResult<Document> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let tree = Tree::parse(text)?;
        Ok(Document::from_data(Rc::new(RefCell::new(DocumentData {
            tree,
            generation: 0,
            layout: None,
        }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, (100, 50))]
    #[case(Some(200), None, (200, 100))]
    #[case(None, Some(10), (20, 10))]
    #[case(Some(7), Some(9), (7, 9))]
    fn test_target_size(
        #[case] width: Option<u32>,
        #[case] height: Option<u32>,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(target_size(100.0, 50.0, width, height).unwrap(), expected);
    }

    #[test]
    fn test_target_size_rounds_up() {
        assert_eq!(target_size(10.2, 3.5, None, None).unwrap(), (11, 4));
    }

    #[test]
    fn test_degenerate_target_size() {
        assert!(matches!(
            target_size(0.0, 50.0, None, None),
            Err(SvgError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            target_size(100.0, 50.0, Some(0), None),
            Err(SvgError::InvalidDimensions { width: 0, .. })
        ));
        assert!(target_size(f32::NAN, 1.0, Some(1), Some(1)).is_err());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Document::load_from_data(&[0xff, 0xfe, 0x00]),
            Err(SvgError::InvalidEncoding)
        ));
        assert!(matches!(Document::load_from_data(b""), Err(SvgError::EmptyDocument)));
        assert!(matches!(
            Document::load_from_file("/nonexistent/file.svg"),
            Err(SvgError::Io(_))
        ));
    }

    #[test]
    fn test_layout_is_cached_per_generation() {
        let doc: Document = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#
            .parse()
            .unwrap();
        assert_eq!(doc.width(), 4.0);
        assert!(doc.data.borrow().layout.is_some());

        doc.document_element().set_attribute("width", "8");
        assert_eq!(doc.data.borrow().generation, 1);
        assert_eq!(doc.width(), 8.0);
        assert_eq!(doc.data.borrow().layout.as_ref().map(|l| l.generation), Some(1));
    }

    #[test]
    fn test_update_layout_rebuilds_immediately() {
        let doc: Document = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#
            .parse()
            .unwrap();
        assert!(doc.data.borrow().layout.is_none());

        doc.update_layout();
        assert_eq!(doc.data.borrow().layout.as_ref().map(|l| l.generation), Some(0));

        doc.document_element().set_attribute("height", "6");
        doc.update_layout();
        let data = doc.data.borrow();
        let layout = data.layout.as_ref().unwrap();
        assert_eq!((layout.generation, layout.height), (1, 6.0));
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let doc = Document::load_from_data(
            "\u{feff}<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"3\" height=\"2\"/>".as_bytes(),
        )
        .unwrap();
        assert_eq!((doc.width(), doc.height()), (3.0, 2.0));
    }
}
