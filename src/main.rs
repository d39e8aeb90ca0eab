mod comments;
mod config;
mod detector;
mod error;
mod imaging;
mod routes;
mod scoring;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use comments::CommentClient;
use config::ServiceConfig;
use detector::Detector;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = std::env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = ServiceConfig::from_env();

    let detector = match Detector::load(&config.model_path) {
        Ok(detector) => detector,
        Err(e) => {
            log::error!("Failed to load detection model from {}: {e}", config.model_path);
            return Err(std::io::Error::other(format!("Model loading failed: {e}")));
        }
    };
    log::info!("Loaded detection model from {}", config.model_path);

    let comment_client = CommentClient::new(&config.ai);

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allow_any_header()
                    .expose_headers(vec![
                        "X-Oral-Hygiene-Score",
                        "X-Plaque-Coverage",
                        "X-Gingival-Inflammation",
                        "X-Tartar",
                        "X-AI-Comments",
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(detector.clone()))
            .app_data(web::Data::new(comment_client.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
