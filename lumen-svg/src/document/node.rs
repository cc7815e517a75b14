//! Arena-backed element tree.

use crate::error::{SvgError, SvgResult};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node in its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub usize);

/// Element types known to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Svg,
    G,
    Defs,
    Use,
    Symbol,
    A,
    Switch,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Path,
    Text,
    Tspan,
    LinearGradient,
    RadialGradient,
    Stop,
    Pattern,
    ClipPath,
    Mask,
    Style,
    Unknown(String),
}

impl ElementKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "svg" => ElementKind::Svg,
            "g" => ElementKind::G,
            "defs" => ElementKind::Defs,
            "use" => ElementKind::Use,
            "symbol" => ElementKind::Symbol,
            "a" => ElementKind::A,
            "switch" => ElementKind::Switch,
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "path" => ElementKind::Path,
            "text" => ElementKind::Text,
            "tspan" => ElementKind::Tspan,
            "linearGradient" => ElementKind::LinearGradient,
            "radialGradient" => ElementKind::RadialGradient,
            "stop" => ElementKind::Stop,
            "pattern" => ElementKind::Pattern,
            "clipPath" => ElementKind::ClipPath,
            "mask" => ElementKind::Mask,
            "style" => ElementKind::Style,
            other => ElementKind::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ElementKind::Svg => "svg",
            ElementKind::G => "g",
            ElementKind::Defs => "defs",
            ElementKind::Use => "use",
            ElementKind::Symbol => "symbol",
            ElementKind::A => "a",
            ElementKind::Switch => "switch",
            ElementKind::Rect => "rect",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line => "line",
            ElementKind::Polyline => "polyline",
            ElementKind::Polygon => "polygon",
            ElementKind::Path => "path",
            ElementKind::Text => "text",
            ElementKind::Tspan => "tspan",
            ElementKind::LinearGradient => "linearGradient",
            ElementKind::RadialGradient => "radialGradient",
            ElementKind::Stop => "stop",
            ElementKind::Pattern => "pattern",
            ElementKind::ClipPath => "clipPath",
            ElementKind::Mask => "mask",
            ElementKind::Style => "style",
            ElementKind::Unknown(name) => name,
        }
    }

    /// Elements with their own geometry.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            ElementKind::Rect
                | ElementKind::Circle
                | ElementKind::Ellipse
                | ElementKind::Line
                | ElementKind::Polyline
                | ElementKind::Polygon
                | ElementKind::Path
        )
    }

    /// Elements painted when encountered in the normal tree walk.
    pub fn is_rendered(&self) -> bool {
        self.is_shape()
            || matches!(
                self,
                ElementKind::Svg
                    | ElementKind::G
                    | ElementKind::Use
                    | ElementKind::A
                    | ElementKind::Switch
                    | ElementKind::Text
                    | ElementKind::Tspan
            )
    }

    pub fn is_paint_server(&self) -> bool {
        matches!(
            self,
            ElementKind::LinearGradient | ElementKind::RadialGradient | ElementKind::Pattern
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub kind: ElementKind,
    /// Attributes in source order.
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// The parsed document tree. Node 0 is the root `<svg>` element and nodes are
/// stored in document (pre-)order.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn parse(text: &str) -> SvgResult<Tree> {
        if text.trim().is_empty() {
            return Err(SvgError::EmptyDocument);
        }

        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(text, options)?;
        let root = xml.root_element();
        if root.tag_name().name() != "svg" {
            return Err(SvgError::UnsupportedRoot(root.tag_name().name().to_string()));
        }

        let mut tree = Tree { nodes: Vec::new() };
        tree.append_element(root, None);
        log::debug!(target: "layout", "parsed document with {} nodes", tree.nodes.len());
        Ok(tree)
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn append_element(&mut self, xml: roxmltree::Node<'_, '_>, parent: Option<NodeId>) {
        let attributes = xml
            .attributes()
            .map(|attr| {
                let name = match attr.namespace() {
                    Some(XLINK_NS) => format!("xlink:{}", attr.name()),
                    Some(XML_NS) => format!("xml:{}", attr.name()),
                    _ => attr.name().to_string(),
                };
                (name, attr.value().to_string())
            })
            .collect();

        let kind = ElementKind::from_name(xml.tag_name().name());
        let keeps_text = matches!(
            kind,
            ElementKind::Text | ElementKind::Tspan | ElementKind::Style
        );
        let id = self.push(parent, NodeData::Element(ElementData { kind, attributes }));

        for child in xml.children() {
            if child.is_element() {
                self.append_element(child, Some(id));
            } else if child.is_text() && keeps_text {
                if let Some(text) = child.text() {
                    self.push(Some(id), NodeData::Text(text.to_string()));
                }
            }
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(data) => Some(data),
            NodeData::Text(_) => None,
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&ElementKind> {
        self.element(id).map(|e| &e.kind)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(Node {
            data: NodeData::Element(element),
            ..
        }) = self.nodes.get_mut(id.0)
        {
            element.set_attribute(name, value);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Element ids in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.element(*id).is_some())
    }

    /// First element in document order whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .find(|node| self.attribute(*node, "id") == Some(id))
    }

    /// Target of the element's `href` (or `xlink:href`) fragment reference.
    pub fn href_target(&self, id: NodeId) -> Option<NodeId> {
        let href = self
            .attribute(id, "href")
            .or_else(|| self.attribute(id, "xlink:href"))?;
        let target = crate::style::parse_iri(href)?;
        self.element_by_id(&target)
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(_) => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg"
        xmlns:xlink="http://www.w3.org/1999/xlink" width="10" height="10">
        <defs><rect id="r" width="4" height="4"/></defs>
        <g id="group"><use xlink:href="#r" x="2"/><text>Hi <tspan>there</tspan></text></g>
        <circle id="r" r="1"/>
    </svg>"##;

    #[test]
    fn test_parse_structure() {
        let tree = Tree::parse(SAMPLE).unwrap();
        assert_eq!(tree.kind(tree.root()), Some(&ElementKind::Svg));
        let kinds: Vec<&str> = tree
            .elements()
            .filter_map(|id| tree.kind(id))
            .map(|k| k.name())
            .collect();
        assert_eq!(
            kinds,
            vec!["svg", "defs", "rect", "g", "use", "text", "tspan", "circle"]
        );
    }

    #[test]
    fn test_xlink_href_key_and_target() {
        let tree = Tree::parse(SAMPLE).unwrap();
        let use_id = tree
            .elements()
            .find(|id| tree.kind(*id) == Some(&ElementKind::Use))
            .unwrap();
        assert_eq!(tree.attribute(use_id, "xlink:href"), Some("#r"));
        let target = tree.href_target(use_id).unwrap();
        // first element with the id wins
        assert_eq!(tree.kind(target), Some(&ElementKind::Rect));
    }

    #[test]
    fn test_text_content() {
        let tree = Tree::parse(SAMPLE).unwrap();
        let text = tree
            .elements()
            .find(|id| tree.kind(*id) == Some(&ElementKind::Text))
            .unwrap();
        assert_eq!(tree.text_content(text), "Hi there");
    }

    #[test]
    fn test_set_attribute_overwrites_in_place() {
        let mut tree = Tree::parse(SAMPLE).unwrap();
        let group = tree.element_by_id("group").unwrap();
        tree.set_attribute(group, "id", "renamed");
        tree.set_attribute(group, "opacity", "0.5");
        assert_eq!(tree.element_by_id("group"), None);
        assert_eq!(tree.element_by_id("renamed"), Some(group));
        let attrs = &tree.element(group).unwrap().attributes;
        assert_eq!(attrs[0].0, "id");
        assert_eq!(attrs.last().map(|a| a.0.as_str()), Some("opacity"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Tree::parse("   "), Err(SvgError::EmptyDocument)));
        assert!(matches!(Tree::parse("<svg><g></svg>"), Err(SvgError::Xml(_))));
        assert!(matches!(
            Tree::parse("<html/>"),
            Err(SvgError::UnsupportedRoot(name)) if name == "html"
        ));
    }
}
