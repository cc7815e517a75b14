//! `clip-path` and `mask` coverage.

use super::Renderer;
use crate::document::node::{ElementKind, NodeId};
use crate::geometry::BoundingBox;
use crate::layout::{LayoutNode, LayoutTree};
use crate::matrix::Matrix;
use crate::style::{Units, Visibility};
use crate::units::{bbox_fraction, Axis};
use tiny_skia::{Mask, MaskType};

/// Multiply `mask` by `other`, keeping coverage only where both have it.
pub(super) fn intersect(mut mask: Mask, other: Option<&Mask>) -> Mask {
    if let Some(other) = other {
        for (dst, src) in mask.data_mut().iter_mut().zip(other.data()) {
            *dst = ((*dst as u16 * *src as u16 + 127) / 255) as u8;
        }
    }
    mask
}

/// Matrix mapping the unit square onto `bbox`.
pub(super) fn bbox_matrix(bbox: &BoundingBox) -> Matrix {
    Matrix::new(bbox.w, 0.0, 0.0, bbox.h, bbox.x, bbox.y)
}

impl Renderer<'_> {
    /// Device-space coverage of the `<clipPath>` with id `id` applied to
    /// `node`. Returns `None` when the reference cannot be used, in which case
    /// the element is drawn unclipped.
    pub(super) fn clip_path_mask(&mut self, id: &str, node: &LayoutNode, ctm: Matrix) -> Option<Mask> {
        let Some(element) = self.tree.element_by_id(id) else {
            log::warn!(target: "render", "clip-path reference #{id} could not be resolved");
            return None;
        };
        if self.tree.kind(element) != Some(&ElementKind::ClipPath) {
            log::warn!(target: "render", "clip-path reference #{id} is not a <clipPath>");
            return None;
        }
        if self.active.contains(&element) {
            log::warn!(target: "render", "skipping recursive clip-path #{id}");
            return None;
        }
        let layout: &LayoutTree = self.layout;
        let clip_node = layout.primary(element)?;
        let (width, height) = self.surface_size();
        let mut mask = Mask::new(width, height)?;

        let mut clip_ctm = ctm * clip_node.local;
        if Units::parse(self.tree.attribute(element, "clipPathUnits"), Units::UserSpaceOnUse)
            == Units::ObjectBoundingBox
        {
            // an empty box clips everything away
            let Some(bbox) = node.bbox.filter(|b| b.w > 0.0 && b.h > 0.0) else {
                return Some(mask);
            };
            clip_ctm = clip_ctm * bbox_matrix(&bbox);
        }

        for &child in &clip_node.children {
            fill_clip_geometry(layout, child, clip_ctm, &mut mask);
        }

        // the clipPath itself may be clipped
        if let Some(nested) = &clip_node.style.clip_path {
            self.active.push(element);
            let outer = self.clip_path_mask(nested, node, ctm);
            self.active.pop();
            if let Some(outer) = outer {
                mask = intersect(mask, Some(&outer));
            }
        }
        Some(mask)
    }

    /// Luminance mask from the `<mask>` element `element` applied to `node`.
    pub(super) fn mask(&mut self, element: NodeId, node: &LayoutNode, ctm: Matrix) -> Option<Mask> {
        if self.tree.kind(element) != Some(&ElementKind::Mask) {
            log::warn!(target: "render", "mask reference is not a <mask>");
            return None;
        }
        if self.active.contains(&element) {
            log::warn!(target: "render", "skipping recursive mask");
            return None;
        }
        let layout: &LayoutTree = self.layout;
        let mask_node = layout.primary(element)?;
        let attr = |name: &str| self.tree.attribute(element, name);
        let bbox = node.bbox.unwrap_or_default();

        let region = match Units::parse(attr("maskUnits"), Units::ObjectBoundingBox) {
            Units::ObjectBoundingBox => {
                if bbox.w <= 0.0 || bbox.h <= 0.0 {
                    return None;
                }
                BoundingBox::new(
                    bbox.x + bbox_fraction(attr("x"), -0.1) * bbox.w,
                    bbox.y + bbox_fraction(attr("y"), -0.1) * bbox.h,
                    bbox_fraction(attr("width"), 1.2) * bbox.w,
                    bbox_fraction(attr("height"), 1.2) * bbox.h,
                )
            }
            Units::UserSpaceOnUse => {
                let ctx = mask_node.style.length_context(node.viewport);
                let (vw, vh) = node.viewport;
                BoundingBox::new(
                    ctx.resolve_str(attr("x"), Axis::X, -0.1 * vw),
                    ctx.resolve_str(attr("y"), Axis::Y, -0.1 * vh),
                    ctx.resolve_str(attr("width"), Axis::X, 1.2 * vw),
                    ctx.resolve_str(attr("height"), Axis::Y, 1.2 * vh),
                )
            }
        };
        let region_mask = self.rect_mask(region, ctm)?;

        let content_ctm = match Units::parse(attr("maskContentUnits"), Units::UserSpaceOnUse) {
            Units::ObjectBoundingBox if bbox.w > 0.0 && bbox.h > 0.0 => ctm * bbox_matrix(&bbox),
            Units::ObjectBoundingBox => return None,
            Units::UserSpaceOnUse => ctm,
        };

        if !self.push_layer() {
            return None;
        }
        self.active.push(element);
        for &child in &mask_node.children {
            self.render_node(child, content_ctm, Some(&region_mask));
        }
        self.active.pop();
        let layer = self.layers.pop()?;

        Some(Mask::from_pixmap(layer.as_ref(), MaskType::Luminance))
    }
}

/// Add the geometry of a clipPath child (and of `<use>` instances and text
/// spans below it) to `mask`.
fn fill_clip_geometry(layout: &LayoutTree, index: usize, parent_ctm: Matrix, mask: &mut Mask) {
    let node = &layout.nodes[index];
    if !node.rendered || node.style.display_none {
        return;
    }
    let ctm = parent_ctm * node.local;
    if let Some(path) = &node.geometry {
        if node.style.visibility == Visibility::Visible {
            mask.fill_path(path, node.style.clip_rule.into(), true, ctm.into());
        }
    }
    for &child in &node.children {
        fill_clip_geometry(layout, child, ctm, mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_multiplies_coverage() {
        let mut a = Mask::new(2, 1).unwrap();
        let mut b = Mask::new(2, 1).unwrap();
        a.data_mut().copy_from_slice(&[255, 128]);
        b.data_mut().copy_from_slice(&[255, 255]);
        let out = intersect(a, Some(&b));
        assert_eq!(out.data(), &[255, 128]);

        b.data_mut().copy_from_slice(&[0, 128]);
        let out = intersect(out, Some(&b));
        assert_eq!(out.data(), &[0, 64]);
    }

    #[test]
    fn test_bbox_matrix_maps_unit_square() {
        let m = bbox_matrix(&BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(m.map_point(0.0, 0.0), (10.0, 20.0));
        assert_eq!(m.map_point(1.0, 1.0), (40.0, 60.0));
    }
}
