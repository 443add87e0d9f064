use crate::label::ClassLabel;

/// Axis-aligned box in pixel coordinates of the source frame.
///
/// Raw model output: coordinates may run past the frame or arrive inverted.
/// The renderer orders and clamps them before drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

/// Backend output before the class table is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl RawDetection {
    pub fn new(class_id: usize, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

/// One model output for one frame: resolved label, display confidence and
/// bounding box. Produced fresh per frame, never mutated, discarded after
/// rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub label: ClassLabel,
    /// Rounded for display; see `round_display_confidence`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    /// The annotation text, e.g. `"NO-Hardhat 0.91"`.
    pub fn display_label(&self) -> String {
        format!("{} {}", self.label, self.confidence)
    }
}
