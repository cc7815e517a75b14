//! Axis-aligned rectangles used for bounding boxes, viewports and regions.

use crate::matrix::Matrix;
use std::ops::Index;

/// An axis-aligned rectangle `(x, y, w, h)` in some coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box spanning two corner points in any order.
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// True when the box has no extent in either direction.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 && self.h <= 0.0
    }

    /// Axis-aligned bounds of the four corners mapped through `matrix`.
    pub fn transformed(&self, matrix: &Matrix) -> BoundingBox {
        let corners = [
            matrix.map_point(self.x, self.y),
            matrix.map_point(self.right(), self.y),
            matrix.map_point(self.right(), self.bottom()),
            matrix.map_point(self.x, self.bottom()),
        ];

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Map this box through `matrix` in place.
    pub fn transform(&mut self, matrix: &Matrix) -> &mut Self {
        *self = self.transformed(matrix);
        self
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.w, self.h]
    }

    pub(crate) fn to_rect(self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x, self.y, self.w, self.h)
    }
}

impl Index<usize> for BoundingBox {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.w,
            3 => &self.h,
            _ => panic!("BoundingBox index out of range: {index}"),
        }
    }
}

impl From<tiny_skia::Rect> for BoundingBox {
    fn from(rect: tiny_skia::Rect) -> Self {
        BoundingBox::new(rect.x(), rect.y(), rect.width(), rect.height())
    }
}

/// Union of optional boxes where `None` means "nothing yet".
pub(crate) fn union_opt(acc: Option<BoundingBox>, next: BoundingBox) -> Option<BoundingBox> {
    Some(match acc {
        Some(acc) => acc.union(&next),
        None => next,
    })
}
