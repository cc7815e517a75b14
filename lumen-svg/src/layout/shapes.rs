//! Geometry of the basic shapes and `<path>`.

use crate::document::node::{ElementKind, NodeId, Tree};
use crate::units::{Axis, LengthContext};
use tiny_skia::{Path, PathBuilder, Rect};

/// Cubic control point distance for a quarter ellipse.
const KAPPA: f32 = 0.552_284_8;

/// Build the outline of a shape element in its own user space.
///
/// Returns `None` for elements without geometry and for degenerate shapes
/// that render nothing (zero-sized rects, non-positive radii, ...).
pub(crate) fn build_shape(tree: &Tree, id: NodeId, ctx: &LengthContext) -> Option<Path> {
    let attr = |name: &str| tree.attribute(id, name);
    let len = |name: &str, axis: Axis| ctx.resolve_str(attr(name), axis, 0.0);

    match tree.kind(id)? {
        ElementKind::Rect => {
            let w = len("width", Axis::X);
            let h = len("height", Axis::Y);
            if w <= 0.0 || h <= 0.0 {
                return None;
            }
            let rx = attr("rx").map(|_| len("rx", Axis::X)).filter(|r| *r >= 0.0);
            let ry = attr("ry").map(|_| len("ry", Axis::Y)).filter(|r| *r >= 0.0);
            let (rx, ry) = match (rx, ry) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => (0.0, 0.0),
            };
            rect_path(
                len("x", Axis::X),
                len("y", Axis::Y),
                w,
                h,
                rx.min(w / 2.0),
                ry.min(h / 2.0),
            )
        }
        ElementKind::Circle => {
            let r = len("r", Axis::Diagonal);
            ellipse_path(len("cx", Axis::X), len("cy", Axis::Y), r, r)
        }
        ElementKind::Ellipse => {
            let rx = attr("rx").map(|_| len("rx", Axis::X));
            let ry = attr("ry").map(|_| len("ry", Axis::Y));
            let (rx, ry) = match (rx, ry) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => return None,
            };
            ellipse_path(len("cx", Axis::X), len("cy", Axis::Y), rx, ry)
        }
        ElementKind::Line => {
            let mut pb = PathBuilder::new();
            pb.move_to(len("x1", Axis::X), len("y1", Axis::Y));
            pb.line_to(len("x2", Axis::X), len("y2", Axis::Y));
            pb.finish()
        }
        ElementKind::Polyline => points_path(attr("points")?, false),
        ElementKind::Polygon => points_path(attr("points")?, true),
        ElementKind::Path => path_data(attr("d")?),
        _ => None,
    }
}

fn rect_path(x: f32, y: f32, w: f32, h: f32, rx: f32, ry: f32) -> Option<Path> {
    if rx <= 0.0 || ry <= 0.0 {
        return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, w, h)?));
    }

    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    let right = x + w;
    let bottom = y + h;

    let mut pb = PathBuilder::new();
    pb.move_to(x + rx, y);
    pb.line_to(right - rx, y);
    pb.cubic_to(right - rx + kx, y, right, y + ry - ky, right, y + ry);
    pb.line_to(right, bottom - ry);
    pb.cubic_to(right, bottom - ry + ky, right - rx + kx, bottom, right - rx, bottom);
    pb.line_to(x + rx, bottom);
    pb.cubic_to(x + rx - kx, bottom, x, bottom - ry + ky, x, bottom - ry);
    pb.line_to(x, y + ry);
    pb.cubic_to(x, y + ry - ky, x + rx - kx, y, x + rx, y);
    pb.close();
    pb.finish()
}

fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    PathBuilder::from_oval(Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)?)
}

fn points_path(points: &str, close: bool) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let mut count = 0;
    for (x, y) in svgtypes::PointsParser::from(points) {
        if count == 0 {
            pb.move_to(x as f32, y as f32);
        } else {
            pb.line_to(x as f32, y as f32);
        }
        count += 1;
    }
    if count < 2 {
        return None;
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Build a path from SVG path data. Rendering stops at the first error.
pub(crate) fn path_data(data: &str) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for segment in svgtypes::SimplifyingPathParser::from(data) {
        let Ok(segment) = segment else {
            log::warn!(target: "layout", "invalid path data, truncating");
            break;
        };
        match segment {
            svgtypes::SimplePathSegment::MoveTo { x, y } => pb.move_to(x as f32, y as f32),
            svgtypes::SimplePathSegment::LineTo { x, y } => pb.line_to(x as f32, y as f32),
            svgtypes::SimplePathSegment::Quadratic { x1, y1, x, y } => {
                pb.quad_to(x1 as f32, y1 as f32, x as f32, y as f32)
            }
            svgtypes::SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => pb.cubic_to(
                x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32,
            ),
            svgtypes::SimplePathSegment::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Tight bounds of a path, falling back to its control-point bounds.
pub(crate) fn path_bounds(path: &Path) -> crate::geometry::BoundingBox {
    path.compute_tight_bounds()
        .unwrap_or_else(|| path.bounds())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn shape_bounds(markup: &str) -> Option<BoundingBox> {
        let doc = format!(r#"<svg xmlns="http://www.w3.org/2000/svg">{markup}</svg>"#);
        let tree = Tree::parse(&doc).unwrap();
        let ctx = LengthContext::new(200.0, 100.0, 16.0);
        let shape = tree.child_elements(tree.root()).next()?;
        build_shape(&tree, shape, &ctx).map(|p| path_bounds(&p))
    }

    #[test]
    fn test_rect_bounds() {
        assert_eq!(
            shape_bounds(r#"<rect x="10" y="20" width="30" height="40" rx="5"/>"#),
            Some(BoundingBox::new(10.0, 20.0, 30.0, 40.0))
        );
        assert_eq!(
            shape_bounds(r#"<rect width="50%" height="50%"/>"#),
            Some(BoundingBox::new(0.0, 0.0, 100.0, 50.0))
        );
    }

    #[test]
    fn test_degenerate_shapes_have_no_geometry() {
        assert_eq!(shape_bounds(r#"<rect width="0" height="10"/>"#), None);
        assert_eq!(shape_bounds(r#"<circle r="-1"/>"#), None);
        assert_eq!(shape_bounds(r#"<polyline points="1 1"/>"#), None);
        assert_eq!(shape_bounds(r#"<ellipse cx="5"/>"#), None);
    }

    #[test]
    fn test_circle_and_ellipse_bounds() {
        let circle = shape_bounds(r#"<circle cx="50" cy="50" r="10"/>"#).unwrap();
        assert!((circle.x - 40.0).abs() < 1e-3 && (circle.w - 20.0).abs() < 1e-3);

        let ellipse = shape_bounds(r#"<ellipse cx="10" cy="10" rx="10" ry="5"/>"#).unwrap();
        assert!((ellipse.w - 20.0).abs() < 1e-3 && (ellipse.h - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_polygon_and_path_bounds() {
        assert_eq!(
            shape_bounds(r#"<polygon points="0,0 10,0 10,5"/>"#),
            Some(BoundingBox::new(0.0, 0.0, 10.0, 5.0))
        );
        assert_eq!(
            shape_bounds(r#"<path d="M 5 5 h 10 v 10 z"/>"#),
            Some(BoundingBox::new(5.0, 5.0, 10.0, 10.0))
        );
        // valid prefix before the error is kept
        assert_eq!(
            shape_bounds(r#"<path d="M 0 0 L 10 10 L oops"/>"#),
            Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0))
        );
    }
}
