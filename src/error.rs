use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No 'image' file field found in the multipart payload")]
    MissingImage,
    #[error("Could not decode the uploaded bytes as an image: {0}")]
    InvalidImage(String),
    #[error("Failed to read the multipart payload: {0}")]
    Upload(String),
    #[error("Model inference failed: {0}")]
    Inference(#[from] tch::TchError),
    #[error("Unexpected model output shape {0:?}")]
    BadOutput(Vec<i64>),
    #[error("Detection model is unavailable")]
    ModelUnavailable,
    #[error("Failed to encode the annotated image: {0}")]
    Encode(#[from] image::ImageError),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MissingImage
            | ServiceError::InvalidImage(_)
            | ServiceError::Upload(_) => StatusCode::BAD_REQUEST,
            ServiceError::Inference(_)
            | ServiceError::BadOutput(_)
            | ServiceError::ModelUnavailable
            | ServiceError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
