use actix_multipart::Multipart;
use actix_web::http::header::CACHE_CONTROL;
use actix_web::{HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::comments::CommentClient;
use crate::detector::Detector;
use crate::error::ServiceError;
use crate::{imaging, scoring};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({"message": "Oral Care ML Service"}))
}

async fn predict(
    detector: web::Data<Detector>,
    comments: web::Data<CommentClient>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let request_id = Uuid::new_v4();

    let image_data = read_image_field(&mut payload).await?;
    info!("[{request_id}] received upload of {} bytes", image_data.len());

    let decoded = imaging::decode(&image_data)?;
    let img = imaging::shrink_to_bound(decoded, imaging::MAX_DIMENSION);
    let (width, height) = img.dimensions();

    let detections = detector.detect(&img)?;
    let metrics = scoring::assess(detections.len());
    info!(
        "[{request_id}] {width}x{height}, {} detections, hygiene score {}",
        detections.len(),
        metrics.hygiene_score
    );

    let mut annotated = img;
    imaging::draw_detections(&mut annotated, &detections);

    let comment = comments.generate_or_fallback(metrics.hygiene_score).await;
    let body = imaging::encode_jpeg(&annotated, imaging::JPEG_QUALITY)?;

    Ok(HttpResponse::Ok()
        .content_type("image/jpeg")
        .insert_header(("X-Oral-Hygiene-Score", metrics.hygiene_score.to_string()))
        .insert_header(("X-Plaque-Coverage", metrics.plaque_coverage.to_string()))
        .insert_header((
            "X-Gingival-Inflammation",
            metrics.gingival_inflammation.to_string(),
        ))
        .insert_header(("X-Tartar", metrics.tartar.to_string()))
        .insert_header(("X-AI-Comments", header_safe(&comment)))
        .insert_header((CACHE_CONTROL, "public, max-age=86400"))
        .body(body))
}

/// Collects the bytes of the `image` file field, skipping any other fields.
async fn read_image_field(payload: &mut Multipart) -> Result<Vec<u8>, ServiceError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ServiceError::Upload(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ServiceError::Upload(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }
        if !data.is_empty() {
            return Ok(data);
        }
    }
    Err(ServiceError::MissingImage)
}

// Comment text goes out in a header; line breaks would make it malformed.
fn header_safe(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}
