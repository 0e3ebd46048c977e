use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use signsprout_contracts::error::ServiceError;

use super::{GenerateRequest, GenerativeTransport};
use crate::config::ServiceConfig;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// `generateContent` client. Holds the credential; constructing one is what
/// makes the content service "configured".
pub struct GeminiTransport {
    api_base: String,
    api_key: String,
    http: HttpClient,
}

impl GeminiTransport {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http_client(api_base, api_key, HttpClient::new())
    }

    pub fn with_http_client(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        http: HttpClient,
    ) -> Self {
        Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        }
    }

    /// `None` when the configuration carries no credential.
    pub fn from_config(config: &ServiceConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        Some(Self::new(config.api_base.as_str(), api_key))
    }

    pub(crate) fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    pub(crate) fn build_payload(request: &GenerateRequest<'_>) -> Value {
        let mut parts = Vec::new();
        if let Some(image) = request.image {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.to_base64(),
                }
            }));
        }
        parts.push(json!({ "text": request.instruction }));

        json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.schema.to_wire(),
            },
        })
    }

    /// Concatenated text parts of the first candidate, if any.
    pub(crate) fn extract_response_text(payload: &Value) -> Option<String> {
        let parts = payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)?;
        let text = parts
            .iter()
            .filter(|part| part.get("thought").and_then(Value::as_bool) != Some(true))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>();
        if text.trim().is_empty() {
            return None;
        }
        Some(text)
    }
}

impl GenerativeTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, ServiceError> {
        let endpoint = self.endpoint_for_model(request.model);
        let payload = Self::build_payload(request);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .map_err(|err| ServiceError::Transport(error_chain_text(&err)))?;
        let response_payload = response_json_or_error(response)?;
        Self::extract_response_text(&response_payload).ok_or(ServiceError::EmptyResponse)
    }
}

fn response_json_or_error(response: HttpResponse) -> Result<Value, ServiceError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| ServiceError::Transport(error_chain_text(&err)))?;
    if !status.is_success() {
        return Err(ServiceError::Status {
            code: status.as_u16(),
            body: truncate_text(body.trim(), ERROR_BODY_MAX_CHARS),
        });
    }
    serde_json::from_str(&body).map_err(|err| ServiceError::InvalidJson(err.to_string()))
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    parts.join(" | caused by: ")
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use signsprout_contracts::schema::{recognition_schema, story_segment_schema};

    use super::*;
    use crate::capture::CapturedImage;

    /// Serves exactly one canned HTTP response and hands back the raw request.
    fn serve_once(status_line: &str, body: &str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let base = format!("http://{}/v1beta", listener.local_addr().expect("local addr"));
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).expect("read header") == 0 {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
                head.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("read body");
            let mut stream = reader.into_inner();
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            head + &String::from_utf8_lossy(&body)
        });
        (base, handle)
    }

    fn local_transport(base: String) -> GeminiTransport {
        let http = HttpClient::builder()
            .no_proxy()
            .build()
            .expect("build http client");
        GeminiTransport::with_http_client(base, "test-key", http)
    }

    fn story_request(model: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            model,
            instruction: "Continue the story.".to_string(),
            image: None,
            schema: story_segment_schema(),
        }
    }

    #[test]
    fn endpoint_accepts_bare_and_resource_model_names() {
        let transport = GeminiTransport::new("https://example.test/v1beta/", "k");
        assert_eq!(
            transport.endpoint_for_model("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            transport.endpoint_for_model(" models/gemini-2.5-pro "),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn payload_puts_image_before_instruction_and_declares_schema() {
        let image = CapturedImage::new(b"jpeg-bytes".to_vec(), "image/jpeg");
        let request = GenerateRequest {
            model: "gemini-2.5-flash",
            instruction: "Judge the sign for \"CAT\".".to_string(),
            image: Some(&image),
            schema: recognition_schema(),
        };
        let payload = GeminiTransport::build_payload(&request);
        let parts = payload["contents"][0]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/jpeg"));
        assert_eq!(parts[0]["inlineData"]["data"], json!(image.to_base64()));
        assert_eq!(parts[1]["text"], json!("Judge the sign for \"CAT\"."));
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            payload["generationConfig"]["responseSchema"],
            recognition_schema().to_wire()
        );
    }

    #[test]
    fn text_only_payload_has_a_single_part() {
        let payload = GeminiTransport::build_payload(&story_request("gemini-2.5-flash"));
        assert_eq!(payload["contents"][0]["parts"].as_array().map(Vec::len), Some(1));
        assert_eq!(payload["contents"][0]["role"], json!("user"));
    }

    #[test]
    fn response_text_joins_parts_and_skips_thoughts() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "thinking...", "thought": true},
                        {"text": "{\"text\":\"a\","},
                        {"text": "\"gloss\":\"A\",\"nextPrompt\":\"?\"}"}
                    ]
                }
            }]
        });
        assert_eq!(
            GeminiTransport::extract_response_text(&payload).as_deref(),
            Some("{\"text\":\"a\",\"gloss\":\"A\",\"nextPrompt\":\"?\"}")
        );
        assert_eq!(
            GeminiTransport::extract_response_text(&json!({"candidates": []})),
            None
        );
        assert_eq!(
            GeminiTransport::extract_response_text(&json!({
                "candidates": [{"content": {"parts": [{"text": "  "}]}}]
            })),
            None
        );
    }

    #[test]
    fn generate_posts_key_and_returns_candidate_text() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"ok\":true}"}]}}]
        })
        .to_string();
        let (base, handle) = serve_once("200 OK", &body);
        let transport = local_transport(base);

        let text = transport.generate(&story_request("gemini-2.5-flash"));
        let raw_request = handle.join().expect("server thread");

        assert_eq!(text.ok().as_deref(), Some("{\"ok\":true}"));
        assert!(raw_request
            .starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent?key=test-key "));
        assert!(raw_request.contains("\"responseMimeType\":\"application/json\""));
        assert!(raw_request.contains("Continue the story."));
    }

    #[test]
    fn non_success_status_becomes_status_error() {
        let (base, handle) = serve_once(
            "429 Too Many Requests",
            "{\"error\":{\"message\":\"quota\"}}",
        );
        let transport = local_transport(base);
        let result = transport.generate(&story_request("gemini-2.5-flash"));
        handle.join().expect("server thread");

        match result {
            Err(ServiceError::Status { code, body }) => {
                assert_eq!(code, 429);
                assert!(body.contains("quota"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let transport = local_transport(format!("http://{addr}/v1beta"));
        assert!(matches!(
            transport.generate(&story_request("gemini-2.5-flash")),
            Err(ServiceError::Transport(_))
        ));
    }

    #[test]
    fn from_config_requires_a_credential() {
        assert!(GeminiTransport::from_config(&ServiceConfig::default()).is_none());
        let mut config = ServiceConfig::default();
        config.api_key = Some("k".to_string());
        assert!(GeminiTransport::from_config(&config).is_some());
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let long = "x".repeat(600);
        let truncated = truncate_text(&long, ERROR_BODY_MAX_CHARS);
        assert_eq!(truncated.chars().count(), ERROR_BODY_MAX_CHARS + 1);
        assert!(truncated.ends_with('…'));
    }
}
