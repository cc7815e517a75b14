//! Style and geometry resolution.
//!
//! Layout walks the document top-down once per generation and produces a
//! [`LayoutTree`]: one node per element in the document, plus extra nodes for
//! the content instantiated by `<use>`. Each node records its computed style,
//! local and global matrices, geometry and bounding boxes. The rasterizer and
//! every geometry query read from this tree.

pub(crate) mod properties;
pub(crate) mod shapes;
pub(crate) mod text;
pub(crate) mod viewport;

use crate::document::css::{inline_declarations, style_sources, StyleRules};
use crate::document::node::{ElementKind, NodeId, Tree};
use crate::geometry::{union_opt, BoundingBox};
use crate::matrix::Matrix;
use crate::units::{Axis, LengthContext};
use properties::{is_presentation_attribute, ComputedStyle};
use std::str::FromStr;
use text::TextLayouter;
use tiny_skia::Path;
use viewport::{parse_aspect_ratio, parse_view_box, view_box_transform};

const DEFAULT_WIDTH: f32 = 300.0;
const DEFAULT_HEIGHT: f32 = 150.0;

/// Layout nodes allowed before further `<use>` instances are skipped.
pub(crate) const MAX_LAYOUT_NODES: usize = 100_000;

pub(crate) struct LayoutNode {
    pub element: NodeId,
    pub style: ComputedStyle,
    /// Maps this node's user space into its parent's.
    pub local: Matrix,
    /// Maps this node's user space into the root's outer coordinate space.
    pub global: Matrix,
    /// Viewport that percentages inside this node resolve against.
    pub viewport: (f32, f32),
    pub geometry: Option<Path>,
    pub local_bbox: Option<BoundingBox>,
    /// `local_bbox` united with the boxes of rendered descendants.
    pub bbox: Option<BoundingBox>,
    /// Viewport clip of a nested `<svg>` or symbol instance, in local space.
    pub clip_box: Option<BoundingBox>,
    pub children: Vec<usize>,
    /// Painted when reached by the normal tree walk.
    pub rendered: bool,
}

pub(crate) struct LayoutTree {
    pub generation: u64,
    pub nodes: Vec<LayoutNode>,
    /// Layout node of each document element, indexed by `NodeId`.
    primary: Vec<Option<usize>>,
    pub width: f32,
    pub height: f32,
}

impl LayoutTree {
    pub fn build(tree: &Tree, generation: u64) -> LayoutTree {
        let (width, height) = intrinsic_size(tree);
        let sources = style_sources(tree);
        let mut builder = Builder {
            tree,
            rules: StyleRules::collect(&sources),
            nodes: Vec::new(),
            primary: vec![None; tree.len()],
            instance_depth: 0,
            use_stack: Vec::new(),
            use_size: None,
            budget_exhausted: false,
        };

        let root_style = ComputedStyle::default();
        builder.build_root(&root_style, width, height);
        log::debug!(
            target: "layout",
            "layout generation {generation}: {} nodes, {width}x{height}",
            builder.nodes.len()
        );

        LayoutTree {
            generation,
            nodes: builder.nodes,
            primary: builder.primary,
            width,
            height,
        }
    }

    pub fn root(&self) -> &LayoutNode {
        &self.nodes[0]
    }

    pub fn primary(&self, element: NodeId) -> Option<&LayoutNode> {
        let index = (*self.primary.get(element.0)?)?;
        self.nodes.get(index)
    }

    pub fn primary_index(&self, element: NodeId) -> Option<usize> {
        *self.primary.get(element.0)?
    }
}

/// Intrinsic size of the document from the root's `width`, `height` and
/// `viewBox`.
fn intrinsic_size(tree: &Tree) -> (f32, f32) {
    let root = tree.root();
    let view_box = parse_view_box(tree.attribute(root, "viewBox"));
    let ctx = LengthContext::new(0.0, 0.0, ComputedStyle::default().font_size);
    let absolute = |name: &str, axis: Axis| {
        crate::units::parse_length(tree.attribute(root, name)?)
            .filter(|l| l.unit != svgtypes::LengthUnit::Percent)
            .map(|l| ctx.resolve(l, axis))
    };

    let width = absolute("width", Axis::X)
        .or(view_box.map(|vb| vb.w))
        .unwrap_or(DEFAULT_WIDTH);
    let height = absolute("height", Axis::Y)
        .or(view_box.map(|vb| vb.h))
        .unwrap_or(DEFAULT_HEIGHT);
    (width.max(0.0), height.max(0.0))
}

pub(crate) fn parse_transform(text: Option<&str>) -> Matrix {
    text.and_then(|t| svgtypes::Transform::from_str(t).ok())
        .map(Matrix::from)
        .unwrap_or_default()
}

struct Builder<'a> {
    tree: &'a Tree,
    rules: StyleRules<'a>,
    nodes: Vec<LayoutNode>,
    primary: Vec<Option<usize>>,
    /// Non-zero while building content instantiated by `<use>`.
    instance_depth: usize,
    /// `<use>` elements and targets currently being instantiated.
    use_stack: Vec<NodeId>,
    /// Viewport size a `<use>` imposes on a referenced `<svg>` or `<symbol>`.
    use_size: Option<(f32, f32)>,
    /// Set once `MAX_LAYOUT_NODES` is reached.
    budget_exhausted: bool,
}

impl<'a> Builder<'a> {
    /// Declarations for `node`, lowest priority first.
    fn declarations(&self, node: NodeId) -> Vec<(&'a str, &'a str)> {
        let tree: &'a Tree = self.tree;
        let Some(element) = tree.element(node) else {
            return Vec::new();
        };

        let mut out: Vec<(&'a str, &'a str)> = element
            .attributes
            .iter()
            .filter(|(name, _)| is_presentation_attribute(name))
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        if !self.rules.is_empty() {
            out.extend(self.rules.matching(tree, node));
        }
        if let Some(style) = element.attribute("style") {
            out.extend(inline_declarations(style));
        }
        out
    }

    fn compute_style(&self, node: NodeId, parent: &ComputedStyle, viewport: (f32, f32)) -> ComputedStyle {
        ComputedStyle::cascade(parent, &self.declarations(node), viewport)
    }

    fn push(&mut self, node: LayoutNode) -> usize {
        let element = node.element;
        self.nodes.push(node);
        let index = self.nodes.len() - 1;
        if self.instance_depth == 0 {
            if let Some(slot) = self.primary.get_mut(element.0) {
                slot.get_or_insert(index);
            }
        }
        index
    }

    fn build_root(&mut self, parent_style: &ComputedStyle, width: f32, height: f32) {
        let root = self.tree.root();
        let view_box = parse_view_box(self.tree.attribute(root, "viewBox"));
        let style = self.compute_style(root, parent_style, (width, height));

        let mut local = parse_transform(self.tree.attribute(root, "transform"));
        let viewport = match view_box {
            Some(vb) => {
                let aspect = parse_aspect_ratio(self.tree.attribute(root, "preserveAspectRatio"));
                local = local * view_box_transform(&vb, aspect, width, height);
                (vb.w, vb.h)
            }
            None => (width, height),
        };

        let index = self.push(LayoutNode {
            element: root,
            style,
            local,
            global: local,
            viewport,
            geometry: None,
            local_bbox: None,
            bbox: None,
            clip_box: None,
            children: Vec::new(),
            rendered: true,
        });
        self.build_children(index, root);
        self.finish(index);
    }

    fn build_children(&mut self, index: usize, element: NodeId) {
        let children: Vec<NodeId> = self.tree.child_elements(element).collect();
        let is_switch = self.tree.kind(element) == Some(&ElementKind::Switch);
        let mut switch_taken = false;

        for child in children {
            let Some(child_index) = self.build_node(child, index) else {
                continue;
            };
            if is_switch {
                let passes = !switch_taken
                    && self.nodes[child_index].rendered
                    && conditions_pass(self.tree, child);
                if passes {
                    switch_taken = true;
                } else {
                    self.nodes[child_index].rendered = false;
                }
            }
            self.nodes[index].children.push(child_index);
        }
    }

    fn build_node(&mut self, node: NodeId, parent: usize) -> Option<usize> {
        let kind = self.tree.kind(node)?.clone();
        let parent_viewport = self.nodes[parent].viewport;
        let parent_global = self.nodes[parent].global;
        let style = {
            let parent_style = &self.nodes[parent].style;
            self.compute_style(node, parent_style, parent_viewport)
        };
        let transform = parse_transform(self.tree.attribute(node, "transform"));
        let ctx = style.length_context(parent_viewport);
        let len = |name: &str, axis: Axis, default: f32| {
            ctx.resolve_str(self.tree.attribute(node, name), axis, default)
        };

        let mut layout = LayoutNode {
            element: node,
            style: style.clone(),
            local: transform,
            global: Matrix::identity(),
            viewport: parent_viewport,
            geometry: None,
            local_bbox: None,
            bbox: None,
            clip_box: None,
            children: Vec::new(),
            rendered: kind.is_rendered(),
        };

        match kind {
            _ if kind.is_shape() => {
                layout.geometry = shapes::build_shape(self.tree, node, &ctx);
                layout.local_bbox = layout.geometry.as_ref().map(shapes::path_bounds);
            }
            ElementKind::Svg => {
                let (width, height) = self.use_size.take().unwrap_or_else(|| {
                    (len("width", Axis::X, parent_viewport.0), len("height", Axis::Y, parent_viewport.1))
                });
                let origin = Matrix::translated(len("x", Axis::X, 0.0), len("y", Axis::Y, 0.0));
                self.establish_viewport(&mut layout, node, width, height);
                layout.local = transform * origin * layout.local;
            }
            ElementKind::Symbol => match self.use_size.take() {
                Some((width, height)) if self.instance_depth > 0 => {
                    self.establish_viewport(&mut layout, node, width, height);
                    layout.rendered = true;
                }
                _ => layout.local = Matrix::identity(),
            },
            ElementKind::Use => {
                let origin = Matrix::translated(len("x", Axis::X, 0.0), len("y", Axis::Y, 0.0));
                layout.local = transform * origin;
            }
            ElementKind::Text => {
                let text = TextLayouter::new(self.tree, parent_viewport, |child, parent| {
                    self.compute_style(child, parent, parent_viewport)
                })
                .layout(node, style);
                layout.geometry = text.owner_path(0);
                layout.local_bbox = text.owner_bbox(0);
                layout.global = parent_global * layout.local;

                let index = self.push(layout);
                let mut owner_nodes = vec![index];
                for owner in 1..text.owners.len() {
                    let info = &text.owners[owner];
                    let parent_index = owner_nodes[info.parent.unwrap_or(0)];
                    let span = self.push(LayoutNode {
                        element: info.node,
                        style: info.style.clone(),
                        local: Matrix::identity(),
                        global: self.nodes[parent_index].global,
                        viewport: parent_viewport,
                        geometry: text.owner_path(owner),
                        local_bbox: text.owner_bbox(owner),
                        bbox: None,
                        clip_box: None,
                        children: Vec::new(),
                        rendered: true,
                    });
                    self.nodes[parent_index].children.push(span);
                    owner_nodes.push(span);
                }
                for span in owner_nodes.into_iter().rev() {
                    self.finish(span);
                }
                return Some(index);
            }
            // stray tspans outside text are not rendered
            ElementKind::Tspan => layout.rendered = false,
            ElementKind::G | ElementKind::A | ElementKind::Switch | ElementKind::ClipPath => {}
            _ => layout.local = Matrix::identity(),
        }

        layout.global = parent_global * layout.local;
        if layout.clip_box.is_some_and(|clip| clip.w <= 0.0 || clip.h <= 0.0) {
            layout.rendered = false;
        }

        let index = self.push(layout);
        if kind == ElementKind::Use {
            self.instantiate(index, node);
        } else {
            self.build_children(index, node);
        }
        self.finish(index);
        Some(index)
    }

    /// Set up the viewport of a nested `<svg>` or symbol instance.
    fn establish_viewport(&self, layout: &mut LayoutNode, node: NodeId, width: f32, height: f32) {
        let view_box = parse_view_box(self.tree.attribute(node, "viewBox"));
        let mapping = match view_box {
            Some(vb) => {
                let aspect = parse_aspect_ratio(self.tree.attribute(node, "preserveAspectRatio"));
                layout.viewport = (vb.w, vb.h);
                view_box_transform(&vb, aspect, width, height)
            }
            None => {
                layout.viewport = (width, height);
                Matrix::identity()
            }
        };
        layout.local = mapping;
        if width <= 0.0 || height <= 0.0 {
            layout.clip_box = Some(BoundingBox::default());
        } else if !layout.style.overflow_visible {
            layout.clip_box =
                Some(BoundingBox::new(0.0, 0.0, width, height).transformed(&mapping.inverse()));
        }
    }

    /// Lay out the element referenced by the `<use>` at `index`.
    fn instantiate(&mut self, index: usize, node: NodeId) {
        let Some(target) = self.tree.href_target(node) else {
            log::warn!(target: "layout", "<use> reference could not be resolved");
            return;
        };
        if self.use_stack.contains(&target) || self.tree.is_ancestor_or_self(target, node) {
            log::warn!(target: "layout", "skipping cyclic <use> reference");
            return;
        }
        if self.nodes.len() >= MAX_LAYOUT_NODES {
            if !self.budget_exhausted {
                log::warn!(
                    target: "layout",
                    "layout reached {MAX_LAYOUT_NODES} nodes, skipping further <use> instances"
                );
                self.budget_exhausted = true;
            }
            return;
        }

        let kind = self.tree.kind(target).cloned();
        self.use_size = match kind {
            Some(ElementKind::Svg) | Some(ElementKind::Symbol) => {
                let viewport = self.nodes[index].viewport;
                let ctx = self.nodes[index].style.length_context(viewport);
                let explicit = |name: &str, axis: Axis| {
                    self.tree
                        .attribute(node, name)
                        .and_then(crate::units::parse_length)
                        .map(|l| ctx.resolve(l, axis))
                };
                let width = explicit("width", Axis::X);
                let height = explicit("height", Axis::Y);
                match kind {
                    // a referenced svg keeps its own size unless the use overrides it
                    Some(ElementKind::Svg) if width.is_none() && height.is_none() => None,
                    Some(ElementKind::Svg) => {
                        let own = |name: &str, axis: Axis, fallback: f32| {
                            ctx.resolve_str(self.tree.attribute(target, name), axis, fallback)
                        };
                        Some((
                            width.unwrap_or_else(|| own("width", Axis::X, viewport.0)),
                            height.unwrap_or_else(|| own("height", Axis::Y, viewport.1)),
                        ))
                    }
                    _ => Some((width.unwrap_or(viewport.0), height.unwrap_or(viewport.1))),
                }
            }
            _ => None,
        };

        self.use_stack.extend([node, target]);
        self.instance_depth += 1;
        let child = self.build_node(target, index);
        self.instance_depth -= 1;
        self.use_stack.truncate(self.use_stack.len() - 2);
        self.use_size = None;

        if let Some(child) = child {
            self.nodes[index].children.push(child);
        }
    }

    /// Compute the bounding boxes of the node at `index` from its children.
    fn finish(&mut self, index: usize) {
        let mut content = None;
        for &child in &self.nodes[index].children {
            let child = &self.nodes[child];
            if !child.rendered || child.style.display_none {
                continue;
            }
            if let Some(bbox) = child.bbox {
                content = union_opt(content, bbox.transformed(&child.local));
            }
        }

        let node = &mut self.nodes[index];
        if self.tree.kind(node.element) == Some(&ElementKind::Use) {
            node.local_bbox = content;
        }
        node.bbox = match (node.local_bbox, content) {
            (Some(own), Some(content)) => Some(own.union(&content)),
            (own, content) => own.or(content),
        };
    }
}

/// Conditional processing attributes evaluated by `<switch>`.
fn conditions_pass(tree: &Tree, node: NodeId) -> bool {
    if tree
        .attribute(node, "requiredExtensions")
        .is_some_and(|ext| !ext.trim().is_empty())
    {
        return false;
    }
    match tree.attribute(node, "systemLanguage") {
        Some(languages) => languages
            .split(',')
            .map(str::trim)
            .any(|lang| lang == "en" || lang.starts_with("en-")),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(markup: &str) -> (Tree, LayoutTree) {
        let tree = Tree::parse(markup).unwrap();
        let layout = LayoutTree::build(&tree, 0);
        (tree, layout)
    }

    fn node<'t>(tree: &Tree, layout: &'t LayoutTree, id: &str) -> &'t LayoutNode {
        layout.primary(tree.element_by_id(id).unwrap()).unwrap()
    }

    #[test]
    fn test_intrinsic_size() {
        let (_, layout) = build(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"/>"#);
        assert_eq!((layout.width, layout.height), (10.0, 20.0));

        let (_, layout) = build(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" viewBox="0 0 40 30"/>"#);
        assert_eq!((layout.width, layout.height), (40.0, 30.0));

        let (_, layout) = build(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#);
        assert_eq!((layout.width, layout.height), (300.0, 150.0));

        let (_, layout) = build(r#"<svg xmlns="http://www.w3.org/2000/svg" width="1in" height="2cm"/>"#);
        assert_eq!(layout.width, 96.0);
        assert!((layout.height - 75.590_55).abs() < 1e-3);
    }

    #[test]
    fn test_root_view_box_mapping() {
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 20 10">
                <rect id="r" x="1" y="1" width="2" height="2"/>
            </svg>"#,
        );
        let rect = node(&tree, &layout, "r");
        assert_eq!(rect.global, Matrix::scaled(10.0, 10.0));
        assert_eq!(layout.root().viewport, (20.0, 10.0));
        // percentages resolve against the viewBox
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 20 10">
                <rect id="r" width="50%" height="50%"/>
            </svg>"#,
        );
        assert_eq!(
            node(&tree, &layout, "r").local_bbox,
            Some(BoundingBox::new(0.0, 0.0, 10.0, 5.0))
        );
    }

    #[test]
    fn test_group_bbox_includes_transformed_children() {
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
                <g id="g">
                    <rect width="10" height="10"/>
                    <rect transform="translate(20 30)" width="10" height="10"/>
                    <rect display="none" x="90" width="10" height="10"/>
                </g>
            </svg>"#,
        );
        let group = node(&tree, &layout, "g");
        assert_eq!(group.local_bbox, None);
        assert_eq!(group.bbox, Some(BoundingBox::new(0.0, 0.0, 30.0, 40.0)));
    }

    #[test]
    fn test_use_instantiates_target() {
        let (tree, layout) = build(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
                <defs><rect id="r" width="10" height="5" fill="red"/></defs>
                <g fill="blue"><use id="u" xlink:href="#r" x="5" y="7"/></g>
            </svg>"##,
        );
        let use_node = node(&tree, &layout, "u");
        assert_eq!(use_node.local, Matrix::translated(5.0, 7.0));
        assert_eq!(use_node.local_bbox, Some(BoundingBox::new(0.0, 0.0, 10.0, 5.0)));
        assert_eq!(use_node.children.len(), 1);

        // the instance is separate from the primary node of the target
        let instance = use_node.children[0];
        let primary = layout.primary_index(tree.element_by_id("r").unwrap()).unwrap();
        assert_ne!(instance, primary);
        assert_eq!(layout.nodes[instance].global, Matrix::translated(5.0, 7.0));
    }

    #[test]
    fn test_use_cycles_are_skipped() {
        let (tree, layout) = build(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
                <g id="a"><use id="u" href="#a"/></g>
                <use id="v" href="#w"/><use id="w" href="#v"/>
            </svg>"##,
        );
        assert!(node(&tree, &layout, "u").children.is_empty());
        assert_eq!(node(&tree, &layout, "u").bbox, None);
        // v instantiates w, whose reference back to v is dropped
        let v = node(&tree, &layout, "v");
        assert_eq!(v.children.len(), 1);
        assert!(layout.nodes[v.children[0]].children.is_empty());
    }

    #[test]
    fn test_use_expansion_is_bounded() {
        // every level instantiates the previous one twice
        let mut markup = String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="l0"><rect width="1" height="1"/></g>"#,
        );
        for level in 1..=24 {
            let prev = level - 1;
            markup.push_str(&format!(
                r##"<g id="l{level}"><use href="#l{prev}"/><use href="#l{prev}"/></g>"##
            ));
        }
        markup.push_str("</svg>");

        let (tree, layout) = build(&markup);
        assert!(layout.nodes.len() >= MAX_LAYOUT_NODES);
        assert!(layout.nodes.len() <= MAX_LAYOUT_NODES + tree.len());
        // every element still has its own layout node
        assert!(layout.primary(tree.element_by_id("l24").unwrap()).is_some());
    }

    #[test]
    fn test_symbol_instance_viewport() {
        let (tree, layout) = build(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
                <symbol id="s" viewBox="0 0 10 10"><rect width="10" height="10"/></symbol>
                <use id="u" href="#s" width="50" height="50"/>
            </svg>"##,
        );
        let symbol = node(&tree, &layout, "s");
        assert!(!symbol.rendered);

        let use_node = node(&tree, &layout, "u");
        let instance = &layout.nodes[use_node.children[0]];
        assert!(instance.rendered);
        assert_eq!(instance.local, Matrix::scaled(5.0, 5.0));
        assert_eq!(use_node.bbox, Some(BoundingBox::new(0.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn test_nested_svg_positioning_and_clip() {
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
                <svg id="inner" x="10" y="20" width="40" height="40" viewBox="0 0 4 4">
                    <rect id="r" width="1" height="1"/>
                </svg>
            </svg>"#,
        );
        let inner = node(&tree, &layout, "inner");
        assert_eq!(
            inner.local,
            Matrix::new(10.0, 0.0, 0.0, 10.0, 10.0, 20.0)
        );
        let clip = inner.clip_box.unwrap();
        assert!(clip.x.abs() < 1e-4 && (clip.w - 4.0).abs() < 1e-4 && (clip.h - 4.0).abs() < 1e-4);
        assert_eq!(inner.viewport, (4.0, 4.0));
        let global = node(&tree, &layout, "r").global;
        assert_eq!(global.map_point(1.0, 1.0), (20.0, 30.0));
    }

    #[test]
    fn test_switch_renders_first_passing_child() {
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <switch>
                    <rect id="a" requiredExtensions="http://example.org/ext" width="1" height="1"/>
                    <rect id="b" systemLanguage="en-US" width="1" height="1"/>
                    <rect id="c" width="1" height="1"/>
                </switch>
            </svg>"#,
        );
        assert!(!node(&tree, &layout, "a").rendered);
        assert!(node(&tree, &layout, "b").rendered);
        assert!(!node(&tree, &layout, "c").rendered);
    }

    #[test]
    fn test_style_sources_priority() {
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <style>rect { stroke-width: 4 } #r { opacity: 0.5 }</style>
                <rect id="r" stroke-width="2" opacity="0.9" style="opacity: 0.25" width="1" height="1"/>
            </svg>"#,
        );
        let rect = node(&tree, &layout, "r");
        assert_eq!(rect.style.stroke_width, 4.0);
        assert_eq!(rect.style.opacity, 0.25);
    }

    #[test]
    fn test_text_and_tspans() {
        let (tree, layout) = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <text id="t" x="10" y="50" font-size="20">Hello <tspan id="s" fill="red">world</tspan></text>
            </svg>"#,
        );
        let text = node(&tree, &layout, "t");
        let span = node(&tree, &layout, "s");
        assert_eq!(text.children.len(), 1);
        let text_box = text.local_bbox.unwrap();
        let span_box = span.local_bbox.unwrap();
        assert_eq!(text_box.x, 10.0);
        assert!(span_box.x >= text_box.right() - 1e-3);
        assert!(text.bbox.unwrap().right() >= span_box.right() - 1e-3);
        assert_ne!(span.style.fill, text.style.fill);
    }
}
