//! Decoding of raw YOLOv8 outputs into pixel-space detections.
//!
//! The TorchScript export returns a `[1, 4 + classes, preds]` tensor laid out
//! attribute-major: the first four rows are box centers and sizes (cx, cy, w,
//! h) in letterboxed input pixels, the remaining rows are per-class scores.

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

/// Mapping between original image pixels and the square letterboxed model
/// input: uniform scale plus centered padding.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    pub fn fit(width: u32, height: u32, input: u32) -> Self {
        let scale = (input as f32 / width as f32).min(input as f32 / height as f32);
        let scaled_w = (width as f32 * scale).round() as u32;
        let scaled_h = (height as f32 * scale).round() as u32;
        Self {
            scale,
            pad_x: (input - scaled_w.min(input)) / 2,
            pad_y: (input - scaled_h.min(input)) / 2,
        }
    }

    pub fn scaled_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f32 * self.scale).round() as u32;
        let h = (height as f32 * self.scale).round() as u32;
        (w.max(1), h.max(1))
    }

    /// Projects a detection from model-input coordinates back onto the
    /// original image, clamped to its bounds.
    pub fn to_image(&self, det: &Detection, width: u32, height: u32) -> Detection {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        let map_x = |x: f32| ((x - self.pad_x as f32) / self.scale).clamp(0.0, max_x);
        let map_y = |y: f32| ((y - self.pad_y as f32) / self.scale).clamp(0.0, max_y);
        Detection {
            x1: map_x(det.x1),
            y1: map_y(det.y1),
            x2: map_x(det.x2),
            y2: map_y(det.y2),
            score: det.score,
            class_id: det.class_id,
        }
    }
}

/// Decodes the flattened `[attrs, preds]` output buffer. Keeps predictions
/// whose best class score reaches `threshold`, converted to corner form.
pub fn decode_predictions(
    data: &[f32],
    num_attrs: usize,
    num_preds: usize,
    threshold: f32,
) -> Vec<Detection> {
    if num_attrs < 5 || data.len() < num_attrs * num_preds {
        return Vec::new();
    }
    let attr = |a: usize, i: usize| data[a * num_preds + i];

    let mut detections = Vec::new();
    for i in 0..num_preds {
        let mut best_class = 0usize;
        let mut best_score = 0f32;
        for class in 0..num_attrs - 4 {
            let score = attr(4 + class, i);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if best_score < threshold {
            continue;
        }
        let (cx, cy, w, h) = (attr(0, i), attr(1, i), attr(2, i), attr(3, i));
        detections.push(Detection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            score: best_score,
            class_id: best_class,
        });
    }
    detections
}

pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);
    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    inter / (area_a + area_b - inter + f32::EPSILON)
}

/// Greedy NMS: highest score wins, overlapping lower-scored boxes drop.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_thresh: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut picked: Vec<Detection> = Vec::new();
    for det in detections {
        if picked.iter().all(|p| iou(&det, p) < iou_thresh) {
            picked.push(det);
        }
    }
    picked
}
