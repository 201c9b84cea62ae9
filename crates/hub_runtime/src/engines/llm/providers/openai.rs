// OpenAI provider for the Responses API
// Single-turn requests with optional instructions, continuation token and
// file reference; multipart upload to the file store

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::engines::llm::{LlmProvider, TokenUsage, TurnRequest, TurnResponse};
use crate::errors::{ErrorCategory, ErrorCode, ErrorSeverity, HubError, HubResult};

const FILE_PURPOSE: &str = "user_data";

/// OpenAI-backed provider. Constructed once at startup and injected into the
/// chat service; there is no hidden process-wide client.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<InputItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i64>,
}

#[derive(Debug, Serialize)]
struct InputItem {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "input_text")]
    Text { text: String },
    #[serde(rename = "input_file")]
    File { file_id: String },
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    id: String,
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    input_tokens: Option<i64>,
    output_tokens: Option<i64>,
    total_tokens: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str) -> HubResult<Self> {
        if api_key.is_empty() {
            return Err(HubError::config_error("OPENAI_API_KEY is not configured"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            HubError::config_error("OPENAI_API_KEY contains characters not usable in a header")
        })?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| HubError::config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_seconds: 60,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    fn convert_request(&self, request: TurnRequest) -> ResponsesRequest {
        let mut content = vec![ContentPart::Text {
            text: request.input_text,
        }];
        if let Some(file_id) = request.file_id {
            content.push(ContentPart::File { file_id });
        }

        ResponsesRequest {
            model: request.model,
            input: vec![InputItem {
                role: "user".to_string(),
                content,
            }],
            instructions: request.instructions.filter(|i| !i.is_empty()),
            previous_response_id: request.previous_response_id,
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens.filter(|&v| v > 0),
        }
    }

    fn convert_response(&self, response: ResponsesResponse) -> HubResult<TurnResponse> {
        let output_text: String = response
            .output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text.as_str())
            .collect();

        if response.id.is_empty() {
            return Err(HubError::new(
                ErrorCode::LlmInvalidResponse,
                ErrorCategory::Llm,
                ErrorSeverity::High,
                "OpenAI response carries no response id",
            ));
        }

        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(TurnResponse {
            output_text,
            response_id: response.id,
            usage,
        })
    }

    /// Map an HTTP error status onto the error taxonomy.
    fn handle_api_error(&self, status: u16, body: &str) -> HubError {
        let detail = serde_json::from_str::<ApiError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        let (code, severity) = match status {
            400 => (ErrorCode::LlmInvalidRequest, ErrorSeverity::Medium),
            401 => (ErrorCode::LlmAuthentication, ErrorSeverity::Critical),
            429 => (ErrorCode::LlmRateLimited, ErrorSeverity::Medium),
            500..=599 => (ErrorCode::LlmApiError, ErrorSeverity::High),
            _ => (ErrorCode::LlmError, ErrorSeverity::Medium),
        };

        HubError::new(
            code,
            ErrorCategory::Llm,
            severity,
            &format!("OpenAI API error ({}): {}", status, detail),
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn create_response(&self, request: TurnRequest) -> HubResult<TurnResponse> {
        let payload = self.convert_request(request);

        let response = match tokio::time::timeout(
            Duration::from_secs(self.timeout_seconds),
            self.client
                .post(format!("{}/responses", self.base_url))
                .json(&payload)
                .send(),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(HubError::new(
                    ErrorCode::LlmApiError,
                    ErrorCategory::Llm,
                    ErrorSeverity::High,
                    &format!("OpenAI request failed: {}", e),
                ))
            }
            Err(_) => {
                return Err(HubError::new(
                    ErrorCode::LlmTimeout,
                    ErrorCategory::Llm,
                    ErrorSeverity::High,
                    &format!("OpenAI request timeout after {} seconds", self.timeout_seconds),
                ))
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(self.handle_api_error(status, &body));
        }

        let parsed: ResponsesResponse = response.json().await.map_err(|e| {
            HubError::new(
                ErrorCode::LlmInvalidResponse,
                ErrorCategory::Llm,
                ErrorSeverity::High,
                &format!("Failed to parse OpenAI response: {}", e),
            )
        })?;

        self.convert_response(parsed)
    }

    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> HubResult<String> {
        if bytes.is_empty() {
            return Err(HubError::validation("Uploaded file is empty"));
        }

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| {
                HubError::new(
                    ErrorCode::LlmInvalidRequest,
                    ErrorCategory::Llm,
                    ErrorSeverity::Medium,
                    &format!("Invalid content type for upload: {}", e),
                )
            })?;

        let form = reqwest::multipart::Form::new()
            .text("purpose", FILE_PURPOSE)
            .part("file", part);

        let response = match tokio::time::timeout(
            Duration::from_secs(self.timeout_seconds),
            self.client
                .post(format!("{}/files", self.base_url))
                .multipart(form)
                .send(),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(HubError::new(
                    ErrorCode::LlmApiError,
                    ErrorCategory::Llm,
                    ErrorSeverity::High,
                    &format!("OpenAI file upload failed: {}", e),
                ))
            }
            Err(_) => {
                return Err(HubError::new(
                    ErrorCode::LlmTimeout,
                    ErrorCategory::Llm,
                    ErrorSeverity::High,
                    &format!("OpenAI file upload timeout after {} seconds", self.timeout_seconds),
                ))
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(self.handle_api_error(status, &body));
        }

        let parsed: FileResponse = response.json().await.map_err(|e| {
            HubError::new(
                ErrorCode::LlmInvalidResponse,
                ErrorCategory::Llm,
                ErrorSeverity::High,
                &format!("Failed to parse file upload response: {}", e),
            )
        })?;

        Ok(parsed.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new("sk-test").unwrap()
    }

    #[test]
    fn request_omits_unset_fields() {
        let request = TurnRequest {
            model: "gpt-4o-mini".to_string(),
            input_text: "hello".to_string(),
            ..Default::default()
        };
        let payload = provider().convert_request(request);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["input"][0]["role"], "user");
        assert_eq!(json["input"][0]["content"][0]["type"], "input_text");
        assert!(json.get("instructions").is_none());
        assert!(json.get("previous_response_id").is_none());
        assert!(json.get("max_output_tokens").is_none());
    }

    #[test]
    fn request_threads_continuation_and_file() {
        let request = TurnRequest {
            model: "gpt-4o-mini".to_string(),
            input_text: "see the attached file".to_string(),
            file_id: Some("file-123".to_string()),
            instructions: Some("be terse".to_string()),
            previous_response_id: Some("resp-9".to_string()),
            temperature: Some(0.2),
            max_output_tokens: Some(256),
        };
        let json = serde_json::to_value(provider().convert_request(request)).unwrap();

        assert_eq!(json["input"][0]["content"][1]["type"], "input_file");
        assert_eq!(json["input"][0]["content"][1]["file_id"], "file-123");
        assert_eq!(json["instructions"], "be terse");
        assert_eq!(json["previous_response_id"], "resp-9");
        assert_eq!(json["max_output_tokens"], 256);
    }

    #[test]
    fn non_positive_max_tokens_is_not_sent() {
        let request = TurnRequest {
            model: "gpt-4o-mini".to_string(),
            input_text: "hello".to_string(),
            max_output_tokens: Some(0),
            ..Default::default()
        };
        let json = serde_json::to_value(provider().convert_request(request)).unwrap();
        assert!(json.get("max_output_tokens").is_none());
    }

    #[test]
    fn response_text_concatenates_output_parts() {
        let raw = r#"{
            "id": "resp-1",
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Hello "},
                    {"type": "output_text", "text": "there."}
                ]}
            ],
            "usage": {"input_tokens": 3, "output_tokens": 5, "total_tokens": 8}
        }"#;
        let parsed: ResponsesResponse = serde_json::from_str(raw).unwrap();
        let turn = provider().convert_response(parsed).unwrap();

        assert_eq!(turn.output_text, "Hello there.");
        assert_eq!(turn.response_id, "resp-1");
        assert_eq!(turn.usage.unwrap().total_tokens, Some(8));
    }

    #[test]
    fn api_errors_map_onto_the_taxonomy() {
        let p = provider();
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert_eq!(p.handle_api_error(401, body).code, ErrorCode::LlmAuthentication);
        assert_eq!(p.handle_api_error(429, body).code, ErrorCode::LlmRateLimited);
        assert_eq!(p.handle_api_error(500, body).code, ErrorCode::LlmApiError);
        assert_eq!(p.handle_api_error(400, "not json").code, ErrorCode::LlmInvalidRequest);
    }
}
