//! Rasterization of a laid-out document with tiny-skia.
//!
//! Rendering walks the [`LayoutTree`] depth-first. Geometry is mapped to
//! device space before filling so that every draw uses an identity
//! transform; strokes are outlined in user space first. Group opacity and
//! masks render into offscreen layers that are composited on the way back up.

mod clip;
mod paint;

use crate::document::node::{NodeId, Tree};
use crate::layout::{LayoutNode, LayoutTree};
use crate::matrix::Matrix;
use crate::style::Visibility;
use tiny_skia::{Mask, Pixmap, PixmapMut, PixmapPaint, Transform};

pub(crate) struct Renderer<'a> {
    tree: &'a Tree,
    layout: &'a LayoutTree,
    target: &'a mut [u8],
    width: u32,
    height: u32,
    /// Offscreen layers; drawing goes to the last one, or to `target`.
    layers: Vec<Pixmap>,
    /// Clip paths, masks and patterns currently being expanded.
    active: Vec<NodeId>,
}

impl<'a> Renderer<'a> {
    /// `target` holds packed premultiplied RGBA rows of `width * 4` bytes.
    pub fn new(
        tree: &'a Tree,
        layout: &'a LayoutTree,
        target: &'a mut [u8],
        width: u32,
        height: u32,
    ) -> Self {
        let len = (width as usize * 4 * height as usize).min(target.len());
        Self {
            tree,
            layout,
            target: &mut target[..len],
            width,
            height,
            layers: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Paint the layout node at `index` and its subtree, with `matrix`
    /// mapping the node's parent space to device pixels.
    pub fn render(&mut self, index: usize, matrix: Matrix) {
        log::debug!(
            target: "render",
            "rendering node {index} into {}x{} with {:?}",
            self.width,
            self.height,
            matrix.to_array()
        );
        self.render_node(index, matrix, None);
    }

    fn surface(&mut self) -> Option<PixmapMut<'_>> {
        match self.layers.last_mut() {
            Some(layer) => Some(layer.as_mut()),
            None => PixmapMut::from_bytes(&mut *self.target, self.width, self.height),
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        match self.layers.last() {
            Some(layer) => (layer.width(), layer.height()),
            None => (self.width, self.height),
        }
    }

    fn push_layer(&mut self) -> bool {
        let (width, height) = self.surface_size();
        match Pixmap::new(width, height) {
            Some(layer) => {
                self.layers.push(layer);
                true
            }
            None => {
                log::warn!(target: "render", "failed to allocate {width}x{height} layer");
                false
            }
        }
    }

    fn render_node(&mut self, index: usize, parent_ctm: Matrix, clip: Option<&Mask>) {
        let layout: &'a LayoutTree = self.layout;
        let node = &layout.nodes[index];
        if !node.rendered || node.style.display_none || node.style.opacity <= 0.0 {
            return;
        }
        let ctm = parent_ctm * node.local;

        let mut own_clip = None;
        if let Some(clip_box) = node.clip_box {
            own_clip = self.rect_mask(clip_box, ctm);
        }
        if let Some(id) = &node.style.clip_path {
            if let Some(mask) = self.clip_path_mask(id, node, ctm) {
                own_clip = Some(match own_clip {
                    Some(current) => clip::intersect(mask, Some(&current)),
                    None => mask,
                });
            }
        }
        let combined = own_clip.map(|mask| clip::intersect(mask, clip));
        let clip = combined.as_ref().or(clip);

        let mask_node = node.style.mask.as_deref().and_then(|id| {
            let target = self.tree.element_by_id(id);
            if target.is_none() {
                log::warn!(target: "render", "mask reference #{id} could not be resolved");
            }
            target
        });

        let layered = (node.style.opacity < 1.0 || mask_node.is_some()) && self.push_layer();
        let draw_clip = if layered { None } else { clip };

        self.draw_shape(node, ctm, draw_clip);
        for &child in &node.children {
            self.render_node(child, ctm, draw_clip);
        }

        if !layered {
            return;
        }
        let Some(mut layer) = self.layers.pop() else {
            return;
        };
        if let Some(mask_node) = mask_node {
            match self.mask(mask_node, node, ctm) {
                Some(mask) => layer.apply_mask(&mask),
                // a mask that cannot be built hides the element
                None => return,
            }
        }

        let paint = PixmapPaint {
            opacity: node.style.opacity,
            ..PixmapPaint::default()
        };
        if let Some(mut surface) = self.surface() {
            surface.draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), clip);
        }
    }

    /// Fill and stroke the node's own geometry.
    fn draw_shape(&mut self, node: &LayoutNode, ctm: Matrix, clip: Option<&Mask>) {
        let Some(path) = &node.geometry else {
            return;
        };
        let style = &node.style;
        if style.visibility != Visibility::Visible {
            return;
        }
        let transform: Transform = ctm.into();

        if !style.fill.is_none() {
            if let Some(device) = path.clone().transform(transform) {
                let rule = style.fill_rule.into();
                self.with_paint(&style.fill, style.fill_opacity, node, ctm, |surface, paint| {
                    surface.fill_path(&device, paint, rule, Transform::identity(), clip);
                });
            }
        }

        if !style.stroke.is_none() && style.stroke_width > 0.0 {
            let stroke = tiny_skia::Stroke {
                width: style.stroke_width,
                line_cap: style.stroke_linecap.into(),
                line_join: style.stroke_linejoin.into(),
                miter_limit: style.stroke_miterlimit,
                dash: stroke_dash(&style.stroke_dasharray, style.stroke_dashoffset),
            };
            let outline = path
                .stroke(&stroke, ctm.mean_scale().max(f32::EPSILON))
                .and_then(|outline| outline.transform(transform));
            if let Some(device) = outline {
                self.with_paint(&style.stroke, style.stroke_opacity, node, ctm, |surface, paint| {
                    surface.fill_path(
                        &device,
                        paint,
                        tiny_skia::FillRule::Winding,
                        Transform::identity(),
                        clip,
                    );
                });
            }
        }
    }

    /// Coverage mask of a user-space rectangle.
    fn rect_mask(&self, rect: crate::geometry::BoundingBox, ctm: Matrix) -> Option<Mask> {
        let (width, height) = self.surface_size();
        let mut mask = Mask::new(width, height)?;
        if let Some(rect) = rect.to_rect() {
            let path = tiny_skia::PathBuilder::from_rect(rect);
            mask.fill_path(&path, tiny_skia::FillRule::Winding, true, ctm.into());
        }
        Some(mask)
    }
}

/// Dash pattern for `stroke-dasharray`, or `None` for a solid stroke.
fn stroke_dash(array: &[f32], offset: f32) -> Option<tiny_skia::StrokeDash> {
    if array.is_empty() || array.iter().any(|d| *d < 0.0) || array.iter().sum::<f32>() <= 0.0 {
        return None;
    }
    let mut dashes = array.to_vec();
    if dashes.len() % 2 == 1 {
        dashes.extend_from_within(..);
    }
    tiny_skia::StrokeDash::new(dashes, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_dash_rules() {
        assert!(stroke_dash(&[], 0.0).is_none());
        assert!(stroke_dash(&[0.0, 0.0], 0.0).is_none());
        assert!(stroke_dash(&[4.0, -1.0], 0.0).is_none());
        assert!(stroke_dash(&[4.0, 2.0], 1.0).is_some());
        // odd lists repeat
        assert!(stroke_dash(&[3.0], 0.0).is_some());
    }
}
