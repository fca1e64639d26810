// 🤖 Chat Completion Client - free-text generation for report summaries

use super::{check_response, http_client, TextGenerator};
use crate::config::LlmConfig;
use crate::error::{FinanceError, Result};
use serde_json::{json, Value};

const SERVICE: &str = "llm";

const SYSTEM_PROMPT: &str =
    "You are a political finance analyst. Describe campaign finance data factually and concisely.";

pub struct ChatCompletionClient {
    http: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
}

impl ChatCompletionClient {
    /// `endpoint` may be an API base or the full `/chat/completions` URL
    pub fn new(config: &LlmConfig, timeout_secs: u64) -> Result<Self> {
        let base = config.endpoint.trim_end_matches('/');
        let url = if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        };

        Ok(ChatCompletionClient {
            http: http_client(SERVICE, timeout_secs)?,
            url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: 0.3,
        })
    }

    pub fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.temperature
        })
    }
}

/// `choices[0].message.content` of a chat-completion response
pub fn extract_content(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"].as_str().map(str::to_string)
}

impl TextGenerator for ChatCompletionClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut request = self.http.post(&self.url).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let body: Value = check_response(SERVICE, request.send())?
            .json()
            .map_err(|e| FinanceError::unavailable(SERVICE, format!("unreadable response: {}", e)))?;

        extract_content(&body).ok_or_else(|| FinanceError::unavailable(SERVICE, "no content in response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> LlmConfig {
        LlmConfig {
            endpoint: endpoint.to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
        }
    }

    #[test]
    fn test_endpoint_and_body() {
        let client = ChatCompletionClient::new(&config("http://localhost:8080/v1/"), 5).unwrap();
        assert_eq!(client.url, "http://localhost:8080/v1/chat/completions");

        let client = ChatCompletionClient::new(&config("http://x/v1/chat/completions"), 5).unwrap();
        assert_eq!(client.url, "http://x/v1/chat/completions");

        let body = client.request_body("hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_extract_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Summary."}}]});
        assert_eq!(extract_content(&body).as_deref(), Some("Summary."));
        assert_eq!(extract_content(&json!({"choices": []})), None);
    }
}
