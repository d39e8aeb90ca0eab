use std::env;

const DEFAULT_MODEL_PATH: &str = "models/yolov8n.torchscript";
const DEFAULT_AI_SERVICE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_PORT: u16 = 8000;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub model_path: String,
    pub port: u16,
    pub ai: AiServiceConfig,
}

#[derive(Clone, Debug)]
pub struct AiServiceConfig {
    pub url: String,
    pub key: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let url =
            env::var("AI_SERVICE_URL").unwrap_or_else(|_| DEFAULT_AI_SERVICE_URL.to_string());
        let key = env::var("AI_SERVICE_KEY").unwrap_or_default();

        Self {
            model_path,
            port,
            ai: AiServiceConfig { url, key },
        }
    }
}
