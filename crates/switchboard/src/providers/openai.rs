use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, CompletionRequest, Provider};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, get_finish_reason, get_usage, messages_to_openai_spec,
    openai_response_to_message, tools_to_openai_spec,
};

/// Client for any endpoint speaking the OpenAI chat completions protocol
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No API key configured for {}", self.config.host))?;

        let response = self
            .client
            .post(self.config.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow!("Request failed: {}\nResponse: {}", status, body))
            }
        }
    }
}

pub fn create_request_payload(request: &CompletionRequest<'_>) -> Result<Value> {
    let system_message = json!({
        "role": "system",
        "content": request.system
    });

    // create messages array with system message first
    let mut messages_array = vec![system_message];
    messages_array.extend(messages_to_openai_spec(request.messages));

    let mut payload = json!({
        "model": request.model,
        "messages": messages_array
    });

    let Some(object) = payload.as_object_mut() else {
        return Err(anyhow!("payload is not an object"));
    };

    if !request.tools.is_empty() {
        object.insert(
            "tools".to_string(),
            json!(tools_to_openai_spec(request.tools)?),
        );
        object.insert(
            "tool_choice".to_string(),
            json!(request.tool_choice.as_str()),
        );
    }
    if let Some(format) = request.response_format {
        object.insert("response_format".to_string(), format.to_openai_spec());
    }

    Ok(payload)
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let payload = create_request_payload(&request)?;

        let response = self.post(payload).await?;

        // Raise specific error if context length is exceeded
        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("Model endpoint error: {}", error));
        }

        let message = openai_response_to_message(&response)?;
        let finish_reason = get_finish_reason(&response);
        tracing::debug!(model = request.model, ?finish_reason, "completion finished");

        Ok(Completion {
            message,
            finish_reason,
            usage: get_usage(&response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::models::tool::{Tool, ToolChoice};
    use crate::providers::base::{FinishReason, ResponseFormat};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn _setup_mock_server(response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let config = OpenAiProviderConfig::new(mock_server.uri(), Some("test_api_key".to_string()));
        let provider = OpenAiProvider::new(config).unwrap();
        (mock_server, provider)
    }

    fn weather_tool() -> Tool {
        Tool::new(
            "get_weather",
            "Gets the current weather for a location",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. New York, NY"
                    }
                },
                "required": ["location"]
            }),
        )
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_, provider) = _setup_mock_server(response_body).await;
        let messages = vec![Message::user().with_text("Hello?")];

        let completion = provider
            .complete(CompletionRequest::new(
                "deepseek-chat",
                "You are a helpful assistant.",
                &messages,
            ))
            .await?;

        assert_eq!(
            completion.message.text().as_deref(),
            Some("Hello! How can I assist you today?")
        );
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.usage.input_tokens, Some(12));
        assert_eq!(completion.usage.output_tokens, Some(15));
        assert_eq!(completion.usage.total_tokens, Some(27));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_tool_request() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-tool",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "get_weather",
                            "arguments": "{\"location\":\"San Francisco, CA\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 20,
                "completion_tokens": 15,
                "total_tokens": 35
            }
        });

        let (_, provider) = _setup_mock_server(response_body).await;
        let messages = vec![Message::user().with_text("What's the weather in San Francisco?")];
        let tools = [weather_tool()];

        let completion = provider
            .complete(
                CompletionRequest::new("gpt-4.1-mini", "You are a helpful assistant.", &messages)
                    .with_tools(&tools, ToolChoice::Auto),
            )
            .await?;

        let requests = completion.message.tool_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "call_123");
        assert_eq!(requests[0].name, "get_weather");
        assert_eq!(
            serde_json::from_str::<Value>(&requests[0].arguments)?,
            json!({"location": "San Francisco, CA"})
        );
        assert!(completion.finish_reason.is_tool_calls());
        Ok(())
    }

    #[tokio::test]
    async fn test_request_carries_tools_and_choice() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4.1-mini",
                "tool_choice": "required",
                "messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(OpenAiProviderConfig::new(
            mock_server.uri(),
            Some("key".to_string()),
        ))?;
        let messages = vec![Message::user().with_text("hi")];
        let tools = [weather_tool()];
        provider
            .complete(
                CompletionRequest::new("gpt-4.1-mini", "sys", &messages)
                    .with_tools(&tools, ToolChoice::Required),
            )
            .await?;
        Ok(())
    }

    #[test]
    fn test_payload_omits_tools_when_empty() -> Result<()> {
        let messages = vec![Message::user().with_text("hi")];
        let format = ResponseFormat::new("plan", json!({"type": "object"}));
        let payload = create_request_payload(
            &CompletionRequest::new("m", "sys", &messages).with_response_format(Some(&format)),
        )?;
        assert!(payload.get("tools").is_none());
        assert!(payload.get("tool_choice").is_none());
        assert_eq!(payload["response_format"]["json_schema"]["name"], "plan");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_on_first_use() {
        let provider =
            OpenAiProvider::new(OpenAiProviderConfig::new("http://127.0.0.1:9", None)).unwrap();
        let messages = vec![Message::user().with_text("hi")];
        let err = provider
            .complete(CompletionRequest::new("m", "sys", &messages))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[tokio::test]
    async fn test_error_status_is_raised() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(OpenAiProviderConfig::new(
            mock_server.uri(),
            Some("wrong".to_string()),
        ))
        .unwrap();
        let messages = vec![Message::user().with_text("hi")];
        let err = provider
            .complete(CompletionRequest::new("m", "sys", &messages))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
