//! HTTP client for the remote text-generation service
//!
//! Speaks the OpenAI-compatible chat completions format. The async
//! `LlmClient` does the exchange; `BlockingClient` drives it on its own
//! runtime so the generation core stays synchronous.

use crate::core::config::RemoteServiceConfig;
use crate::core::error::{ForgeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Sampling temperature sent with every request
pub const TEMPERATURE: f32 = 0.8;

/// Output length cap sent with every request
pub const MAX_TOKENS: u32 = 500;

/// Characters of an error body kept in the returned error
const ERROR_EXCERPT_CHARS: usize = 100;

/// One system + user exchange
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// Synchronous seam between the generators and the network
pub trait CompletionBackend {
    /// Perform exactly one request/response exchange and return the reply text
    fn complete(&self, service: &RemoteServiceConfig, request: &CompletionRequest)
        -> Result<String>;
}

/// Async client for making API calls
pub struct LlmClient {
    client: Client,
}

impl LlmClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Send a chat completion request
    ///
    /// # Arguments
    /// * `service` - Endpoint, model and credential
    /// * `system` - Fixed system instruction
    /// * `user` - The filled-in prompt template
    ///
    /// # Returns
    /// The reply text of the first choice
    pub async fn complete(
        &self,
        service: &RemoteServiceConfig,
        system: &str,
        user: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: service.model_id.clone(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", service.endpoint);
        tracing::info!("Sending request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", service.credential))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ForgeError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::info!("Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("API error body: {}", body);
            return Err(ForgeError::Status {
                status: status.as_u16(),
                excerpt: excerpt(&body),
            });
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            tracing::warn!("Malformed response envelope: {}", e);
            ForgeError::InvalidEnvelope
        })?;

        extract_content(completion)
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_EXCERPT_CHARS).collect()
}

fn extract_content(completion: ChatResponse) -> Result<String> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(ForgeError::InvalidEnvelope)?;

    let content = choice.message.content.unwrap_or_default();
    if content.is_empty() {
        return Err(ForgeError::EmptyResponse);
    }
    tracing::debug!(
        "Content received: {}...",
        content.chars().take(50).collect::<String>()
    );
    Ok(content)
}

/// `CompletionBackend` backed by `LlmClient` on a private runtime
pub struct BlockingClient {
    runtime: Runtime,
    client: LlmClient,
}

impl BlockingClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            client: LlmClient::new(timeout)?,
        })
    }
}

impl CompletionBackend for BlockingClient {
    fn complete(
        &self,
        service: &RemoteServiceConfig,
        request: &CompletionRequest,
    ) -> Result<String> {
        self.runtime
            .block_on(self.client.complete(service, &request.system, &request.user))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};

    fn service(endpoint: &str) -> RemoteServiceConfig {
        RemoteServiceConfig {
            endpoint: endpoint.into(),
            model_id: "m".into(),
            credential: "k".into(),
            plain_template: None,
            detailed_template: None,
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "s".into(),
            user: "u".into(),
        }
    }

    /// Read one HTTP request: headers, then as many body bytes as announced
    fn drain_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|len| len.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return;
                }
            }
        }
    }

    /// Answer a single request with a canned response; returns the base URL
    fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            drain_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_error_status_carries_truncated_body() {
        let endpoint = serve_once("429 Too Many Requests", "r".repeat(300));
        let client = BlockingClient::new(Duration::from_secs(5)).unwrap();
        let err = client.complete(&service(&endpoint), &request()).unwrap_err();
        match err {
            ForgeError::Status { status, excerpt } => {
                assert_eq!(status, 429);
                assert_eq!(excerpt.len(), 100);
                assert!(excerpt.chars().all(|c| c == 'r'));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_body_is_invalid_envelope() {
        let endpoint = serve_once("200 OK", "not json".to_string());
        let client = BlockingClient::new(Duration::from_secs(5)).unwrap();
        let err = client.complete(&service(&endpoint), &request()).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidEnvelope), "got {:?}", err);
    }

    #[test]
    fn test_reply_content_is_returned() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Aldric"}}]}"#;
        let endpoint = serve_once("200 OK", body.to_string());
        let client = BlockingClient::new(Duration::from_secs(5)).unwrap();
        assert_eq!(client.complete(&service(&endpoint), &request()).unwrap(), "Aldric");
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "grok-2-latest".into(),
            messages: vec![Message {
                role: "user".into(),
                content: "hi".into(),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "grok-2-latest");
        assert_eq!(json["max_tokens"], 500);
        assert!((json["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_extract_content() {
        let completion: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "Aldric"}}]}"#)
                .unwrap();
        assert_eq!(extract_content(completion).unwrap(), "Aldric");
    }

    #[test]
    fn test_missing_choices_is_invalid_envelope() {
        let completion: ChatResponse = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(matches!(
            extract_content(completion),
            Err(ForgeError::InvalidEnvelope)
        ));
    }

    #[test]
    fn test_empty_content() {
        let completion: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": ""}}]}"#).unwrap();
        assert!(matches!(
            extract_content(completion),
            Err(ForgeError::EmptyResponse)
        ));
    }

    #[test]
    fn test_excerpt_is_truncated() {
        let body = "x".repeat(300);
        assert_eq!(excerpt(&body).len(), 100);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let client = BlockingClient::new(Duration::from_millis(500)).unwrap();
        let err = client
            .complete(&service("http://127.0.0.1:1"), &request())
            .unwrap_err();
        assert!(matches!(err, ForgeError::Transport(_)), "got {:?}", err);
    }
}
