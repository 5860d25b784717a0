//! Client for the hosted chat completion API
//!
//! Speaks the OpenAI-compatible `/openai` endpoint that Pollinations exposes:
//! a JSON body of `{model, messages, seed}` in, `choices[0].message.content`
//! out.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AiConfig;
use crate::error::AiError;
use crate::message::{Role, Turn};

pub type Result<T> = std::result::Result<T, AiError>;

/// Separator after which the service appends sponsored content
const AD_SEPARATOR: &str = "---";

const DESCRIBE_IMAGE_PROMPT: &str =
    "Describe this image in one or two concise sentences, including any visible text.";

/// Everything needed to ask for one answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The normalized prompt for the current turn
    pub prompt: String,
    /// Prior turns, oldest first
    pub history: Vec<Turn>,
    /// Descriptions of images attached to the current turn
    pub image_descriptions: Vec<String>,
}

/// A completion service. [`PollinationsClient`] is the real one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    async fn describe_image(&self, image_url: &str) -> Result<String>;
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    seed: u64,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: WireContent::Text(content.into()),
        }
    }
}

/// Pollinations text API client
pub struct PollinationsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    vision_model: String,
    seed: u64,
    timeout_secs: u64,
    system_prompt: String,
}

impl PollinationsClient {
    /// Create a client. `display_name`, when given, is appended to the
    /// system prompt so the model knows what it is called.
    pub fn new(config: &AiConfig, display_name: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|cause| AiError::RequestFailed {
                endpoint: config.endpoint.clone(),
                cause,
            })?;

        let system_prompt = match display_name {
            Some(name) => format!("{} Your name is {name}.", config.system_prompt),
            None => config.system_prompt.clone(),
        };

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
            seed: config.seed,
            timeout_secs: config.timeout_secs,
            system_prompt,
        })
    }

    fn build_messages(&self, request: &CompletionRequest) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(WireMessage::text("system", self.system_prompt.clone()));

        for turn in &request.history {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(WireMessage::text(role, turn.content.clone()));
        }

        messages.push(WireMessage::text("user", current_turn(request)));
        messages
    }

    async fn post(&self, body: &ChatRequest<'_>) -> Result<String> {
        debug!(
            endpoint = %self.endpoint,
            model = body.model,
            messages = body.messages.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::from_reqwest(&self.endpoint, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::BadStatus {
                status: status.as_u16(),
                body: preview(&body, 200),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::from_reqwest(&self.endpoint, self.timeout_secs, e))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::MalformedResponse {
                reason: "no choices in response".to_string(),
            })?
            .message
            .content
            .ok_or_else(|| AiError::MalformedResponse {
                reason: "choice has no message content".to_string(),
            })?;

        let cleaned = clean_completion(&content);
        if cleaned.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(cleaned)
    }
}

#[async_trait]
impl CompletionBackend for PollinationsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if !request.history.is_empty() {
            debug!(turns = request.history.len(), "including conversation history");
        }

        let body = ChatRequest {
            model: &self.model,
            messages: self.build_messages(request),
            seed: self.seed,
        };

        let answer = self.post(&body).await?;
        info!(chars = answer.chars().count(), "got completion");
        Ok(answer)
    }

    async fn describe_image(&self, image_url: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.vision_model,
            messages: vec![WireMessage {
                role: "user",
                content: WireContent::Parts(vec![
                    ContentPart::Text {
                        text: DESCRIBE_IMAGE_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_url.to_string(),
                        },
                    },
                ]),
            }],
            seed: self.seed,
        };

        self.post(&body).await
    }
}

/// Text of the current user turn, with image descriptions appended as
/// bracketed context.
fn current_turn(request: &CompletionRequest) -> String {
    if request.image_descriptions.is_empty() {
        return request.prompt.clone();
    }

    let mut text = request.prompt.clone();
    text.push_str("\n\n[Attached images]");
    for (i, description) in request.image_descriptions.iter().enumerate() {
        text.push_str(&format!("\n- Image {}: {}", i + 1, description));
    }
    text
}

/// Trim the completion and cut anything after the ad separator.
pub fn clean_completion(text: &str) -> String {
    let text = text.trim();
    match text.split_once(AD_SEPARATOR) {
        Some((answer, _)) => {
            warn!("separator found in completion, dropping trailing content");
            answer.trim().to_string()
        }
        None => text.to_string(),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client_for(server: &MockServer) -> PollinationsClient {
        let config = AiConfig {
            endpoint: server.url("/openai"),
            timeout_secs: 5,
            ..Default::default()
        };
        PollinationsClient::new(&config, None).unwrap()
    }

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[test]
    fn test_clean_completion_drops_sponsored_tail() {
        assert_eq!(
            clean_completion("  Here you go!\n---\n**Sponsor** buy things "),
            "Here you go!"
        );
        assert_eq!(clean_completion(" plain answer \n"), "plain answer");
    }

    #[test]
    fn test_request_layout() {
        let config = AiConfig::default();
        let client = PollinationsClient::new(&config, Some("Esquie")).unwrap();
        let request = CompletionRequest {
            prompt: "what is this?".to_string(),
            history: vec![Turn::user("hello"), Turn::assistant("hi there")],
            image_descriptions: vec!["a cat on a sofa".to_string()],
        };

        let body = ChatRequest {
            model: &client.model,
            messages: client.build_messages(&request),
            seed: client.seed,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "openai",
                "seed": 42,
                "messages": [
                    {
                        "role": "system",
                        "content": "You are a helpful AI assistant that responds naturally to \
                                    user messages. Your name is Esquie."
                    },
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi there" },
                    {
                        "role": "user",
                        "content": "what is this?\n\n[Attached images]\n- Image 1: a cat on a sofa"
                    }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/openai")
                    .header("content-type", "application/json")
                    .json_body_partial(r#"{"model": "openai", "seed": 42}"#);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(completion_body("Hello, friend!"));
            })
            .await;

        let client = client_for(&server);
        let answer = client
            .complete(&CompletionRequest {
                prompt: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(answer, "Hello, friend!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_maps_to_bad_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai");
                then.status(500).body("internal error");
            })
            .await;

        let err = client_for(&server)
            .complete(&CompletionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::BadStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_slow_upstream_maps_to_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .header("content-type", "application/json")
                    .json_body(completion_body("too late"));
            })
            .await;
        let config = AiConfig {
            endpoint: server.url("/openai"),
            timeout_secs: 1,
            ..Default::default()
        };

        let err = PollinationsClient::new(&config, None)
            .unwrap()
            .complete(&CompletionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::Timeout { timeout_secs: 1, .. }));
    }

    #[tokio::test]
    async fn test_missing_content_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "choices": [] }));
            })
            .await;

        let err = client_for(&server)
            .complete(&CompletionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = client_for(&server)
            .complete(&CompletionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_describe_image_sends_image_part() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/openai")
                    .body_contains("image_url")
                    .body_contains("https://cdn.example.com/cat.png");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(completion_body("A grey cat."));
            })
            .await;

        let description = client_for(&server)
            .describe_image("https://cdn.example.com/cat.png")
            .await
            .unwrap();

        assert_eq!(description, "A grey cat.");
        mock.assert_async().await;
    }
}
