use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box stored as its two extreme vertices.
///
/// Supports three common construction formats:
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - TLWH: Top-Left X, Top-Left Y, Width, Height
/// - XYWH: Center X, Center Y, Width, Height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisAlignedBox {
    /// Top-left vertex (x1, y1)
    pub min_vertex: [f32; 2],
    /// Bottom-right vertex (x2, y2)
    pub max_vertex: [f32; 2],
}

impl AxisAlignedBox {
    #[inline]
    pub fn new(min_vertex: [f32; 2], max_vertex: [f32; 2]) -> Self {
        Self {
            min_vertex,
            max_vertex,
        }
    }

    /// Create a box from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new([x1, y1], [x2, y2])
    }

    /// Create a box from TLWH format (top-left x, top-left y, width, height).
    #[inline]
    pub fn from_tlwh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new([x, y], [x + width, y + height])
    }

    /// Create a box from XYWH format (center x, center y, width, height).
    #[inline]
    pub fn from_xywh(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(
            [cx - width / 2.0, cy - height / 2.0],
            [cx + width / 2.0, cy + height / 2.0],
        )
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [
            self.min_vertex[0],
            self.min_vertex[1],
            self.max_vertex[0],
            self.max_vertex[1],
        ]
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_vertex[0] - self.min_vertex[0]
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_vertex[1] - self.min_vertex[1]
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_vertex[0] + self.max_vertex[0]) / 2.0,
            (self.min_vertex[1] + self.max_vertex[1]) / 2.0,
        )
    }

    /// Area of the box; degenerate boxes have zero area.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }
}

impl From<[f32; 4]> for AxisAlignedBox {
    fn from(tlbr: [f32; 4]) -> Self {
        Self::from_tlbr(tlbr[0], tlbr[1], tlbr[2], tlbr[3])
    }
}
