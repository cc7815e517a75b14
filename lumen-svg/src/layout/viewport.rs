//! viewBox to viewport mapping.

use crate::geometry::BoundingBox;
use crate::matrix::Matrix;
use std::str::FromStr;
use svgtypes::{Align, AspectRatio};

/// Parse a `viewBox` attribute. Boxes with a non-positive size are ignored.
pub(crate) fn parse_view_box(text: Option<&str>) -> Option<BoundingBox> {
    let vb = svgtypes::ViewBox::from_str(text?.trim()).ok()?;
    if vb.w <= 0.0 || vb.h <= 0.0 {
        return None;
    }
    Some(BoundingBox::new(
        vb.x as f32,
        vb.y as f32,
        vb.w as f32,
        vb.h as f32,
    ))
}

/// Parse `preserveAspectRatio`, defaulting to `xMidYMid meet`.
pub(crate) fn parse_aspect_ratio(text: Option<&str>) -> AspectRatio {
    text.and_then(|t| AspectRatio::from_str(t.trim()).ok())
        .unwrap_or_default()
}

/// Map `view_box` onto a `width` x `height` viewport placed at the origin.
pub(crate) fn view_box_transform(
    view_box: &BoundingBox,
    aspect: AspectRatio,
    width: f32,
    height: f32,
) -> Matrix {
    let sx = width / view_box.w;
    let sy = height / view_box.h;
    if aspect.align == Align::None {
        return Matrix::new(sx, 0.0, 0.0, sy, -view_box.x * sx, -view_box.y * sy);
    }

    let scale = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
    let free_w = width - view_box.w * scale;
    let free_h = height - view_box.h * scale;

    let (align_x, align_y) = match aspect.align {
        Align::XMinYMin => (0.0, 0.0),
        Align::XMidYMin => (free_w * 0.5, 0.0),
        Align::XMaxYMin => (free_w, 0.0),
        Align::XMinYMid => (0.0, free_h * 0.5),
        Align::XMaxYMid => (free_w, free_h * 0.5),
        Align::XMinYMax => (0.0, free_h),
        Align::XMidYMax => (free_w * 0.5, free_h),
        Align::XMaxYMax => (free_w, free_h),
        Align::XMidYMid | Align::None => (free_w * 0.5, free_h * 0.5),
    };

    Matrix::new(
        scale,
        0.0,
        0.0,
        scale,
        align_x - view_box.x * scale,
        align_y - view_box.y * scale,
    )
}
