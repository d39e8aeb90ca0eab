mod classes;
mod postprocess;

pub use classes::class_name;
pub use postprocess::{Detection, Letterbox, decode_predictions, iou, non_max_suppression};

use std::sync::{Arc, Mutex};

use image::RgbImage;
use image::imageops::FilterType;
use tch::{CModule, Device, Kind, Tensor};

use crate::error::ServiceError;

pub const INPUT_SIZE: u32 = 640;
pub const CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const IOU_THRESHOLD: f32 = 0.45;

// YOLO letterbox padding gray, normalized.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Immutable handle around the TorchScript detection model, loaded once at
/// startup and shared across request handlers.
#[derive(Clone)]
pub struct Detector {
    module: Arc<Mutex<CModule>>,
    device: Device,
}

impl Detector {
    pub fn load(model_path: &str) -> Result<Self, tch::TchError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(model_path, device)?;
        Ok(Self {
            module: Arc::new(Mutex::new(module)),
            device,
        })
    }

    /// Runs detection on an image, returning boxes in that image's pixel
    /// coordinates.
    pub fn detect(&self, img: &RgbImage) -> Result<Vec<Detection>, ServiceError> {
        let (width, height) = img.dimensions();
        let letterbox = Letterbox::fit(width, height, INPUT_SIZE);
        let input = self.input_tensor(img, &letterbox);

        let output = {
            let module = self
                .module
                .lock()
                .map_err(|_| ServiceError::ModelUnavailable)?;
            tch::no_grad(|| module.forward_ts(&[input]))?
        };

        let output = output.to_device(Device::Cpu).to_kind(Kind::Float);
        let size = output.size();
        let (num_attrs, num_preds) = match size.as_slice() {
            [1, attrs, preds] if *attrs >= 5 => (*attrs as usize, *preds as usize),
            _ => return Err(ServiceError::BadOutput(size)),
        };

        let flat: Vec<f32> = output
            .flatten(0, -1)
            .try_into()
            .map_err(ServiceError::Inference)?;

        let raw = decode_predictions(&flat, num_attrs, num_preds, CONFIDENCE_THRESHOLD);
        let kept = non_max_suppression(raw, IOU_THRESHOLD);
        let mapped: Vec<Detection> = kept
            .iter()
            .map(|det| letterbox.to_image(det, width, height))
            .collect();
        for det in &mapped {
            log::debug!(
                "detected {} ({:.2}) at [{:.0}, {:.0}, {:.0}, {:.0}]",
                class_name(det.class_id),
                det.score,
                det.x1,
                det.y1,
                det.x2,
                det.y2
            );
        }
        Ok(mapped)
    }

    // Resizes with preserved aspect ratio onto a gray square input and
    // normalizes to 0-1 CHW.
    fn input_tensor(&self, img: &RgbImage, letterbox: &Letterbox) -> Tensor {
        let input = INPUT_SIZE as usize;
        let (scaled_w, scaled_h) = letterbox.scaled_dims(img.width(), img.height());
        let resized = image::imageops::resize(img, scaled_w, scaled_h, FilterType::Triangle);

        let mut buf = vec![PAD_VALUE; 3 * input * input];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let tx = x as usize + letterbox.pad_x as usize;
            let ty = y as usize + letterbox.pad_y as usize;
            if tx >= input || ty >= input {
                continue;
            }
            for c in 0..3 {
                buf[c * input * input + ty * input + tx] = pixel[c] as f32 / 255.0;
            }
        }

        Tensor::from_slice(&buf)
            .view([1, 3, input as i64, input as i64])
            .to_device(self.device)
    }
}
