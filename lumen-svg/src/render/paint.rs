//! Paint servers: solid colors, gradients and patterns.

use super::clip::bbox_matrix;
use super::Renderer;
use crate::document::node::{ElementKind, NodeId, Tree};
use crate::geometry::BoundingBox;
use crate::layout::viewport::{parse_aspect_ratio, parse_view_box, view_box_transform};
use crate::layout::{parse_transform, LayoutNode, LayoutTree};
use crate::matrix::Matrix;
use crate::style::{Paint, Rgba, SpreadMethod, Units};
use crate::units::{bbox_fraction, parse_number_or_percent, Axis, LengthContext};
use tiny_skia::{FilterQuality, GradientStop, Pixmap, PixmapMut, Point, Shader, SpreadMode};

/// Largest tile edge rendered for a pattern, in device pixels.
const MAX_TILE_SIZE: f32 = 4096.0;

/// Length of the `href` chain followed for gradient and pattern templates.
const MAX_HREF_DEPTH: usize = 16;

impl Renderer<'_> {
    /// Resolve `paint` for `node` and call `draw` with the current surface.
    pub(super) fn with_paint(
        &mut self,
        paint: &Paint,
        opacity: f32,
        node: &LayoutNode,
        ctm: Matrix,
        draw: impl FnOnce(&mut PixmapMut<'_>, &tiny_skia::Paint<'_>),
    ) {
        let current = node.style.color;
        // keeps a pattern tile alive for as long as the shader borrows it
        let tile;
        let mut sk_paint = tiny_skia::Paint {
            anti_alias: true,
            ..Default::default()
        };

        match paint {
            Paint::None => return,
            Paint::Color(color) => {
                sk_paint.set_color(color.resolve(current).to_skia(opacity));
            }
            Paint::Server { id, fallback } => {
                let server = self
                    .tree
                    .element_by_id(id)
                    .filter(|e| self.tree.kind(*e).is_some_and(ElementKind::is_paint_server));
                let Some(server) = server else {
                    log::warn!(target: "render", "paint server #{id} could not be resolved");
                    match fallback {
                        Some(color) => sk_paint.set_color(color.resolve(current).to_skia(opacity)),
                        None => return,
                    }
                    return self.draw_with(&sk_paint, draw);
                };

                let shader = match self.tree.kind(server) {
                    Some(ElementKind::Pattern) => {
                        let Some((pixmap, transform)) = self.pattern_tile(server, node, ctm) else {
                            return;
                        };
                        tile = pixmap;
                        Some(tiny_skia::Pattern::new(
                            tile.as_ref(),
                            SpreadMode::Repeat,
                            FilterQuality::Bicubic,
                            opacity,
                            transform.into(),
                        ))
                    }
                    _ => self.gradient_shader(server, node, ctm, opacity),
                };
                match shader {
                    Some(shader) => sk_paint.shader = shader,
                    None => return,
                }
            }
        }
        self.draw_with(&sk_paint, draw);
    }

    fn draw_with(
        &mut self,
        paint: &tiny_skia::Paint<'_>,
        draw: impl FnOnce(&mut PixmapMut<'_>, &tiny_skia::Paint<'_>),
    ) {
        if let Some(mut surface) = self.surface() {
            draw(&mut surface, paint);
        }
    }

    fn gradient_shader(
        &self,
        element: NodeId,
        node: &LayoutNode,
        ctm: Matrix,
        opacity: f32,
    ) -> Option<Shader<'static>> {
        let chain = href_chain(self.tree, element, |kind| {
            matches!(kind, ElementKind::LinearGradient | ElementKind::RadialGradient)
        });
        let attr = |name: &str| chain.iter().find_map(|id| self.tree.attribute(*id, name));

        let stops = gradient_stops(self.tree, self.layout, &chain, opacity);
        match stops.len() {
            0 => return None,
            1 => return Some(Shader::SolidColor(stops[0].1)),
            _ => {}
        }
        let solid_last = stops.last().map(|(_, color)| Shader::SolidColor(*color));

        let units = Units::parse(attr("gradientUnits"), Units::ObjectBoundingBox);
        let mut transform = ctm;
        let ctx = node.style.length_context(node.viewport);
        let coord = |name: &str, axis: Axis, default: &str| -> f32 {
            let text = attr(name).unwrap_or(default);
            match units {
                Units::ObjectBoundingBox => bbox_fraction(Some(text), 0.0),
                Units::UserSpaceOnUse => ctx.resolve_str(Some(text), axis, 0.0),
            }
        };
        if units == Units::ObjectBoundingBox {
            let bbox = node.bbox.filter(|b| b.w > 0.0 && b.h > 0.0)?;
            transform = transform * bbox_matrix(&bbox);
        }
        transform = transform * parse_transform(attr("gradientTransform"));
        if transform.try_inverse().is_none() {
            return solid_last;
        }

        let spread: SpreadMode = SpreadMethod::parse(attr("spreadMethod")).into();
        let stops: Vec<GradientStop> = stops
            .into_iter()
            .map(|(offset, color)| GradientStop::new(offset, color))
            .collect();

        let shader = match self.tree.kind(element) {
            Some(ElementKind::RadialGradient) => {
                let cx = coord("cx", Axis::X, "50%");
                let cy = coord("cy", Axis::Y, "50%");
                let r = coord("r", Axis::Diagonal, "50%");
                if r <= 0.0 {
                    return solid_last;
                }
                let fx = attr("fx").map_or(cx, |_| coord("fx", Axis::X, "50%"));
                let fy = attr("fy").map_or(cy, |_| coord("fy", Axis::Y, "50%"));
                tiny_skia::RadialGradient::new(
                    Point::from_xy(fx, fy),
                    Point::from_xy(cx, cy),
                    r,
                    stops,
                    spread,
                    transform.into(),
                )
            }
            _ => {
                let x1 = coord("x1", Axis::X, "0%");
                let y1 = coord("y1", Axis::Y, "0%");
                let x2 = coord("x2", Axis::X, "100%");
                let y2 = coord("y2", Axis::Y, "0%");
                tiny_skia::LinearGradient::new(
                    Point::from_xy(x1, y1),
                    Point::from_xy(x2, y2),
                    stops,
                    spread,
                    transform.into(),
                )
            }
        };
        shader.or(solid_last)
    }

    /// Render one tile of a pattern. Returns the tile and the matrix mapping
    /// tile pixels to device space.
    fn pattern_tile(&mut self, element: NodeId, node: &LayoutNode, ctm: Matrix) -> Option<(Pixmap, Matrix)> {
        if self.active.contains(&element) {
            log::warn!(target: "render", "skipping recursive pattern");
            return None;
        }
        let tree: &Tree = self.tree;
        let layout: &LayoutTree = self.layout;
        let chain = href_chain(tree, element, |kind| *kind == ElementKind::Pattern);
        let attr = |name: &str| chain.iter().find_map(|id| tree.attribute(*id, name));
        let bbox = node.bbox.unwrap_or_default();
        let has_bbox = bbox.w > 0.0 && bbox.h > 0.0;

        let tile_rect = match Units::parse(attr("patternUnits"), Units::ObjectBoundingBox) {
            Units::ObjectBoundingBox => {
                if !has_bbox {
                    return None;
                }
                BoundingBox::new(
                    bbox.x + bbox_fraction(attr("x"), 0.0) * bbox.w,
                    bbox.y + bbox_fraction(attr("y"), 0.0) * bbox.h,
                    bbox_fraction(attr("width"), 0.0) * bbox.w,
                    bbox_fraction(attr("height"), 0.0) * bbox.h,
                )
            }
            Units::UserSpaceOnUse => {
                let ctx = LengthContext::new(node.viewport.0, node.viewport.1, node.style.font_size);
                BoundingBox::new(
                    ctx.resolve_str(attr("x"), Axis::X, 0.0),
                    ctx.resolve_str(attr("y"), Axis::Y, 0.0),
                    ctx.resolve_str(attr("width"), Axis::X, 0.0),
                    ctx.resolve_str(attr("height"), Axis::Y, 0.0),
                )
            }
        };
        if tile_rect.w <= 0.0 || tile_rect.h <= 0.0 {
            return None;
        }

        let pattern_ctm = ctm * parse_transform(attr("patternTransform"));
        let scale_x = (pattern_ctm.a * pattern_ctm.a + pattern_ctm.b * pattern_ctm.b).sqrt();
        let scale_y = (pattern_ctm.c * pattern_ctm.c + pattern_ctm.d * pattern_ctm.d).sqrt();
        let tile_w = (tile_rect.w * scale_x).ceil().clamp(1.0, MAX_TILE_SIZE);
        let tile_h = (tile_rect.h * scale_y).ceil().clamp(1.0, MAX_TILE_SIZE);
        let to_tile = Matrix::scaled(tile_w / tile_rect.w, tile_h / tile_rect.h);

        let content = match parse_view_box(attr("viewBox")) {
            Some(view_box) => {
                let aspect = parse_aspect_ratio(attr("preserveAspectRatio"));
                view_box_transform(&view_box, aspect, tile_rect.w, tile_rect.h)
            }
            None => match Units::parse(attr("patternContentUnits"), Units::UserSpaceOnUse) {
                Units::ObjectBoundingBox if has_bbox => Matrix::scaled(bbox.w, bbox.h),
                Units::ObjectBoundingBox => return None,
                Units::UserSpaceOnUse => Matrix::identity(),
            },
        };

        // content comes from the first pattern in the chain that has children
        let source = chain
            .iter()
            .copied()
            .find(|id| tree.child_elements(*id).next().is_some())?;
        let source_node = layout.primary(source)?;

        let tile = Pixmap::new(tile_w as u32, tile_h as u32)?;
        self.layers.push(tile);
        self.active.push(element);
        for &child in &source_node.children {
            self.render_node(child, to_tile * content, None);
        }
        self.active.pop();
        let tile = self.layers.pop()?;

        let transform = pattern_ctm
            * Matrix::translated(tile_rect.x, tile_rect.y)
            * Matrix::scaled(tile_rect.w / tile_w, tile_rect.h / tile_h);
        Some((tile, transform))
    }
}

/// `element` followed by the templates its `href` chain names, stopping at
/// cycles and at elements rejected by `accept`.
fn href_chain(tree: &Tree, element: NodeId, accept: impl Fn(&ElementKind) -> bool) -> Vec<NodeId> {
    let mut chain = vec![element];
    let mut current = element;
    while chain.len() < MAX_HREF_DEPTH {
        let Some(next) = tree.href_target(current) else {
            break;
        };
        if chain.contains(&next) || !tree.kind(next).is_some_and(&accept) {
            break;
        }
        chain.push(next);
        current = next;
    }
    chain
}

/// Stops of the first gradient in `chain` that has any, with offsets clamped
/// to `[0, 1]` and made non-decreasing.
fn gradient_stops(
    tree: &Tree,
    layout: &LayoutTree,
    chain: &[NodeId],
    opacity: f32,
) -> Vec<(f32, tiny_skia::Color)> {
    let Some(owner) = chain.iter().copied().find(|id| {
        tree.child_elements(*id)
            .any(|child| tree.kind(child) == Some(&ElementKind::Stop))
    }) else {
        return Vec::new();
    };

    let mut stops = Vec::new();
    let mut last_offset = 0.0f32;
    for stop in tree.child_elements(owner) {
        if tree.kind(stop) != Some(&ElementKind::Stop) {
            continue;
        }
        let offset = tree
            .attribute(stop, "offset")
            .and_then(parse_number_or_percent)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
            .max(last_offset);
        last_offset = offset;

        let (color, stop_opacity) = match layout.primary(stop) {
            Some(node) => (
                node.style.stop_color.resolve(node.style.color),
                node.style.stop_opacity,
            ),
            None => (Rgba::BLACK, 1.0),
        };
        stops.push((offset, color.to_skia(stop_opacity * opacity)));
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> (Tree, LayoutTree) {
        let tree = Tree::parse(markup).unwrap();
        let layout = LayoutTree::build(&tree, 0);
        (tree, layout)
    }

    #[test]
    fn test_href_chain_stops_at_cycles() {
        let (tree, _) = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
                <linearGradient id="a" href="#b"/>
                <linearGradient id="b" href="#a"/>
                <linearGradient id="c" href="#p"/>
                <pattern id="p"/>
            </svg>"##,
        );
        let a = tree.element_by_id("a").unwrap();
        let b = tree.element_by_id("b").unwrap();
        let is_gradient =
            |k: &ElementKind| matches!(k, ElementKind::LinearGradient | ElementKind::RadialGradient);
        assert_eq!(href_chain(&tree, a, is_gradient), vec![a, b]);

        let c = tree.element_by_id("c").unwrap();
        assert_eq!(href_chain(&tree, c, is_gradient), vec![c]);
    }

    #[test]
    fn test_gradient_stops_are_inherited_and_clamped() {
        let (tree, layout) = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
                <linearGradient id="base">
                    <stop offset="0.5" stop-color="red"/>
                    <stop offset="20%" style="stop-color: blue; stop-opacity: 0.5"/>
                    <stop offset="2" stop-color="lime"/>
                </linearGradient>
                <linearGradient id="derived" href="#base"/>
            </svg>"##,
        );
        let derived = tree.element_by_id("derived").unwrap();
        let chain = href_chain(&tree, derived, |k| *k == ElementKind::LinearGradient);
        let stops = gradient_stops(&tree, &layout, &chain, 1.0);

        let offsets: Vec<f32> = stops.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![0.5, 0.5, 1.0]);
        assert_eq!(stops[0].1, tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        assert!((stops[1].1.alpha() - 0.5).abs() < 1e-3);
        assert_eq!(stops[2].1, tiny_skia::Color::from_rgba8(0, 255, 0, 255));
    }
}
