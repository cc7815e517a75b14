//! Handles to individual elements of a [`Document`].

use super::node::NodeId;
use super::{render_node, render_node_to_bitmap, with_layout, Document, SharedData};
use crate::bitmap::Bitmap;
use crate::error::SvgResult;
use crate::geometry::BoundingBox;
use crate::layout::LayoutNode;
use crate::matrix::Matrix;
use std::rc::Rc;

/// A handle to an element of a [`Document`].
///
/// Handles keep their document alive. Two handles are equal when they refer
/// to the same element of the same document.
#[derive(Clone)]
pub struct Element {
    document: SharedData,
    node: NodeId,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.document, &other.document) && self.node == other.node
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag_name())
            .field("node", &self.node.0)
            .finish()
    }
}

impl Element {
    pub(crate) fn new(document: SharedData, node: NodeId) -> Self {
        Self { document, node }
    }

    pub fn tag_name(&self) -> String {
        let data = self.document.borrow();
        data.tree
            .kind(self.node)
            .map(|kind| kind.name().to_string())
            .unwrap_or_default()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.document.borrow().tree.attribute(self.node, name).is_some()
    }

    /// Value of the attribute `name` as written in the markup.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.document
            .borrow()
            .tree
            .attribute(self.node, name)
            .map(str::to_string)
    }

    /// Set an attribute and invalidate the document layout.
    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut data = self.document.borrow_mut();
        data.tree.set_attribute(self.node, name, value);
        data.generation += 1;
    }

    /// The parent element, or `None` for the root.
    pub fn parent_element(&self) -> Option<Element> {
        let parent = self.document.borrow().tree.parent(self.node)?;
        Some(Element::new(self.document.clone(), parent))
    }

    pub fn owner_document(&self) -> Document {
        Document::from_data(self.document.clone())
    }

    /// Child elements in document order.
    pub fn children(&self) -> Vec<Element> {
        let data = self.document.borrow();
        data.tree
            .child_elements(self.node)
            .map(|child| Element::new(self.document.clone(), child))
            .collect()
    }

    fn with_node<R>(&self, default: R, f: impl FnOnce(&LayoutNode) -> R) -> R {
        with_layout(&self.document, |_, layout| match layout.primary(self.node) {
            Some(node) => f(node),
            None => default,
        })
    }

    /// Transform from this element's user space to its parent's.
    pub fn local_matrix(&self) -> Matrix {
        self.with_node(Matrix::identity(), |node| node.local)
    }

    /// Transform from this element's user space to document pixels.
    pub fn global_matrix(&self) -> Matrix {
        self.with_node(Matrix::identity(), |node| node.global)
    }

    /// The element's own geometry in its user space, without descendants.
    pub fn local_bounding_box(&self) -> BoundingBox {
        self.with_node(BoundingBox::default(), |node| {
            node.local_bbox.unwrap_or_default()
        })
    }

    /// The local bounding box mapped to document pixels.
    pub fn global_bounding_box(&self) -> BoundingBox {
        self.with_node(BoundingBox::default(), |node| {
            node.local_bbox.unwrap_or_default().transformed(&node.global)
        })
    }

    /// Bounds of the element and its rendered descendants in its user space.
    pub fn bounding_box(&self) -> BoundingBox {
        self.with_node(BoundingBox::default(), |node| node.bbox.unwrap_or_default())
    }

    /// Paint this element and its subtree into `bitmap`. `matrix` maps the
    /// parent's user space to bitmap pixels; ancestors' transforms are not
    /// applied.
    pub fn render(&self, bitmap: &mut Bitmap<'_>, matrix: &Matrix) -> SvgResult<()> {
        render_node(&self.document, self.node, bitmap, *matrix)
    }

    /// Render this element into a new bitmap sized to its bounding box in
    /// parent space and cleared to `background` (`0xRRGGBBAA`).
    pub fn render_to_bitmap(
        &self,
        width: Option<u32>,
        height: Option<u32>,
        background: u32,
    ) -> SvgResult<Bitmap<'static>> {
        let natural = self.with_node(BoundingBox::default(), |node| {
            node.bbox.unwrap_or_default().transformed(&node.local)
        });
        render_node_to_bitmap(&self.document, self.node, natural, width, height, background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
        <g id="g" transform="translate(10 20)">
            <rect id="r" x="5" y="5" width="10" height="10" transform="scale(2)"/>
        </g>
    </svg>"#;

    fn sample() -> Document {
        SAMPLE.parse().unwrap()
    }

    #[test]
    fn test_identity_equality() {
        let doc = sample();
        let a = doc.get_element_by_id("r").unwrap();
        let b = doc.get_element_by_id("r").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, doc.get_element_by_id("g").unwrap());

        // same markup, different document
        let other = sample().get_element_by_id("r").unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_navigation() {
        let doc = sample();
        let rect = doc.get_element_by_id("r").unwrap();
        let group = rect.parent_element().unwrap();
        assert_eq!(group.tag_name(), "g");
        assert_eq!(group.children(), vec![rect.clone()]);
        assert_eq!(group.parent_element(), Some(doc.document_element()));
        assert_eq!(doc.document_element().parent_element(), None);
        assert_eq!(rect.owner_document().document_element(), doc.document_element());
    }

    #[test]
    fn test_attributes() {
        let doc = sample();
        let rect = doc.get_element_by_id("r").unwrap();
        assert!(rect.has_attribute("width"));
        assert!(!rect.has_attribute("rx"));
        assert_eq!(rect.get_attribute("x").as_deref(), Some("5"));
        // defaults are never written back
        assert_eq!(rect.get_attribute("fill"), None);
        rect.set_attribute("rx", "2");
        assert_eq!(rect.get_attribute("rx").as_deref(), Some("2"));
    }

    #[test]
    fn test_matrices_and_boxes() {
        let doc = sample();
        let rect = doc.get_element_by_id("r").unwrap();
        let group = doc.get_element_by_id("g").unwrap();

        assert_eq!(rect.local_matrix(), Matrix::scaled(2.0, 2.0));
        assert_eq!(
            rect.global_matrix(),
            Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0)
        );
        assert_eq!(rect.local_bounding_box(), BoundingBox::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(rect.global_bounding_box(), BoundingBox::new(20.0, 30.0, 20.0, 20.0));

        assert_eq!(group.local_bounding_box(), BoundingBox::default());
        assert_eq!(group.bounding_box(), BoundingBox::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_set_attribute_updates_geometry() {
        let doc = sample();
        let rect = doc.get_element_by_id("r").unwrap();
        rect.set_attribute("width", "30");
        assert_eq!(rect.local_bounding_box().w, 30.0);
        doc.update_layout();
        assert_eq!(rect.local_bounding_box().w, 30.0);
    }

    #[test]
    fn test_render_element_to_bitmap_uses_parent_space_box() {
        let doc: Document = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
            <rect id="r" x="10" y="10" width="20" height="10" fill="#00ff00"/>
        </svg>"##
            .parse()
            .unwrap();
        let rect = doc.get_element_by_id("r").unwrap();
        let bitmap = rect.render_to_bitmap(None, None, 0).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (20, 10));
        assert_eq!(bitmap.pixel(0, 0), Some(0x00ff00ff));
        assert_eq!(bitmap.pixel(19, 9), Some(0x00ff00ff));
    }
}
