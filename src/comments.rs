//! Client for the external chat-completion service that writes caregiver
//! comments. A failed or empty response never fails the request; the handler
//! substitutes a fixed fallback string.

use log::warn;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AiServiceConfig;

pub const NO_CHOICES_COMMENT: &str = "Unable to generate AI comments at this time.";
pub const FALLBACK_COMMENT: &str = "Error generating AI comments. Please check the oral hygiene \
                                    score and recommendations from the caregiver.";

const COMPLETION_MODEL: &str = "gpt-3.5-turbo";
const SYSTEM_PROMPT: &str = "You are a helpful assistant specialized in oral healthcare for \
                             elderly and disabled patients.";
const MAX_TOKENS: u32 = 250;
const TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum CommentError {
    #[error("comment service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("comment service returned status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("comment service returned no choices")]
    NoChoices,
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Clone)]
pub struct CommentClient {
    http: HttpClient,
    url: String,
    key: String,
}

impl CommentClient {
    pub fn new(config: &AiServiceConfig) -> Self {
        Self {
            http: HttpClient::new(),
            url: config.url.clone(),
            key: config.key.clone(),
        }
    }

    pub async fn generate(&self, hygiene_score: i64) -> Result<String, CommentError> {
        let prompt = format!(
            "Based on the oral hygiene image analysis with a score of {hygiene_score}/100, \
             write approximately 150 words describing the oral health condition, key \
             observations, and care recommendations for a long-term care patient. \
             Focus on practical advice for caregivers."
        );
        let request = ChatRequest {
            model: COMPLETION_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CommentError::BadStatus(status));
        }

        let parsed: ChatResponse = response.json().await?;
        let first = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CommentError::NoChoices)?;
        Ok(first.message.content.trim().to_string())
    }

    /// Same as [`generate`](Self::generate) but maps every failure to one of
    /// the fixed fallback strings.
    pub async fn generate_or_fallback(&self, hygiene_score: i64) -> String {
        match self.generate(hygiene_score).await {
            Ok(comment) => comment,
            Err(CommentError::NoChoices) => {
                warn!("Comment service returned no choices, using fallback");
                NO_CHOICES_COMMENT.to_string()
            }
            Err(e) => {
                warn!("Error generating AI comments: {e}");
                FALLBACK_COMMENT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CommentClient {
        CommentClient::new(&AiServiceConfig {
            url: format!("{}/v1/chat/completions", server.uri()),
            key: "test-key".to_string(),
        })
    }

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "choices": [
                {"message": {"role": "assistant", "content": content}}
            ]
        })
    }

    #[actix_web::test]
    async fn extracts_first_completion_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 250
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("  Brush twice daily.  ")),
            )
            .mount(&server)
            .await;

        let comment = client_for(&server).generate(72).await.unwrap();
        assert_eq!(comment, "Brush twice daily.");
    }

    #[actix_web::test]
    async fn prompt_embeds_the_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content":
                        "Based on the oral hygiene image analysis with a score of 55/100, \
                         write approximately 150 words describing the oral health condition, \
                         key observations, and care recommendations for a long-term care \
                         patient. Focus on practical advice for caregivers."}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .mount(&server)
            .await;

        let comment = client_for(&server).generate(55).await.unwrap();
        assert_eq!(comment, "ok");
    }

    #[actix_web::test]
    async fn empty_choices_yield_no_choices_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(80).await.unwrap_err();
        assert!(matches!(err, CommentError::NoChoices));
    }

    #[actix_web::test]
    async fn server_error_yields_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(80).await.unwrap_err();
        match err {
            CommentError::BadStatus(status) => assert_eq!(status.as_u16(), 500),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn fallback_strings_are_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;
        let client = client_for(&server);
        assert_eq!(client.generate_or_fallback(80).await, NO_CHOICES_COMMENT);

        server.reset().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        assert_eq!(client.generate_or_fallback(80).await, FALLBACK_COMMENT);
    }
}
