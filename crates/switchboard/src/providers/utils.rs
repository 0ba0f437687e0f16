use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

use super::base::{FinishReason, Usage};
use crate::models::message::{Message, MessageContent};
use crate::models::tool::{Tool, ToolRequest};

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        // Every text part travels, joined the same way as `Message::text`
        if let Some(text) = message.text().filter(|text| !text.is_empty()) {
            converted["content"] = json!(text);
        }

        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(_) => {}
                MessageContent::ToolRequest(request) => {
                    let tool_calls = converted
                        .as_object_mut()
                        .and_then(|object| {
                            object
                                .entry("tool_calls")
                                .or_insert(json!([]))
                                .as_array_mut()
                        });
                    if let Some(tool_calls) = tool_calls {
                        tool_calls.push(json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": sanitize_function_name(&request.name),
                                "arguments": request.arguments,
                            }
                        }));
                    }
                }
                MessageContent::ToolResponse(response) => {
                    // The model sees the JSON-encoded result, errors included
                    output.push(json!({
                        "role": "tool",
                        "content": response.content.to_string(),
                        "name": response.name,
                        "tool_call_id": response.id
                    }));
                }
            }
        }

        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            if converted.get("content").is_none() {
                converted["content"] = Value::Null;
            }
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No message in response: {}", response))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|text| text.as_str()) {
        message = message.with_text(text);
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|calls| calls.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default();
            let function_name = tool_call["function"]["name"].as_str().unwrap_or_default();
            // Some endpoints send the arguments as an object instead of a string
            let arguments = match &tool_call["function"]["arguments"] {
                Value::String(arguments) => arguments.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            message = message.with_tool_request(ToolRequest::new(id, function_name, arguments));
        }
    }

    Ok(message)
}

pub fn get_finish_reason(response: &Value) -> FinishReason {
    response["choices"][0]["finish_reason"]
        .as_str()
        .map(FinishReason::parse)
        .unwrap_or_else(|| FinishReason::Other("missing".to_string()))
}

pub fn get_usage(response: &Value) -> Usage {
    let Some(usage) = response.get("usage") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok());

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok());

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => input.checked_add(output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

fn sanitize_function_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let re = INVALID.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("static regex"));
    re.replace_all(name, "_").to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use crate::models::tool::ToolResponse;

    const OPENAI_TOOL_USE_RESPONSE: &str = r#"{
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "1",
                    "type": "function",
                    "function": {
                        "name": "record_unknown_question",
                        "arguments": "{\"question\": \"What is your favourite colour?\"}"
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 25,
            "total_tokens": 35
        }
    }"#;

    #[test]
    fn test_messages_to_openai_spec() {
        let message = Message::user().with_text("Hello");
        let spec = messages_to_openai_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_spec_keeps_every_text_part() {
        let message = Message::assistant().with_text("Hello").with_text("there");
        let spec = messages_to_openai_spec(&[message.clone()]);

        assert_eq!(spec[0]["content"], "Hello\nthere");
        assert_eq!(spec[0]["content"], message.text().unwrap());
    }

    #[test]
    fn test_messages_to_openai_spec_tool_round() {
        let messages = vec![
            Message::user().with_text("Here is my email: a@b.com"),
            Message::assistant().with_tool_request(ToolRequest::new(
                "call_1",
                "record_user_details",
                r#"{"email":"a@b.com"}"#,
            )),
            Message::tool(ToolResponse::new(
                "call_1",
                "record_user_details",
                json!({"recorded": "ok"}),
            )),
        ];

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 3);
        assert_eq!(spec[1]["role"], "assistant");
        assert_eq!(spec[1]["content"], Value::Null);
        assert_eq!(spec[1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            spec[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"email":"a@b.com"}"#
        );
        assert_eq!(spec[2]["role"], "tool");
        assert_eq!(spec[2]["name"], "record_user_details");
        assert_eq!(spec[2]["content"], r#"{"recorded":"ok"}"#);
        assert_eq!(spec[2]["tool_call_id"], spec[1]["tool_calls"][0]["id"]);
    }

    #[test]
    fn test_outgoing_tool_names_are_sanitized() {
        let message = Message::assistant().with_tool_request(ToolRequest::new("1", "bad name", "{}"));
        let spec = messages_to_openai_spec(&[message]);
        assert_eq!(spec[0]["tool_calls"][0]["function"]["name"], "bad_name");
        assert_eq!(sanitize_function_name("research.web-search"), "research_web-search");
    }

    #[test]
    fn test_tools_to_openai_spec() -> Result<()> {
        let tool = Tool::new(
            "record_unknown_question",
            "Log a question that the assistant couldn't answer.",
            json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "The unanswerable question"}
                },
                "required": ["question"],
                "additionalProperties": false
            }),
        );

        let spec = tools_to_openai_spec(&[tool])?;

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "record_unknown_question");
        assert_eq!(spec[0]["function"]["parameters"]["additionalProperties"], false);
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool = Tool::new("test_tool", "Test tool", json!({"type": "object"}));
        let result = tools_to_openai_spec(&[tool.clone(), tool]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate tool name"));
    }

    #[test]
    fn test_openai_response_to_message_text() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello from the assistant!"},
                "finish_reason": "stop"
            }]
        });

        let message = openai_response_to_message(&response)?;
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text().as_deref(), Some("Hello from the assistant!"));
        assert_eq!(get_finish_reason(&response), FinishReason::Stop);
        assert_eq!(get_usage(&response), Usage::default());
        Ok(())
    }

    #[test]
    fn test_openai_response_to_message_tool_request() -> Result<()> {
        let response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE)?;
        let message = openai_response_to_message(&response)?;

        assert_eq!(message.text(), None);
        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "record_unknown_question");
        assert_eq!(
            serde_json::from_str::<Value>(&requests[0].arguments)?,
            json!({"question": "What is your favourite colour?"})
        );
        assert_eq!(get_finish_reason(&response), FinishReason::ToolCalls);
        assert_eq!(get_usage(&response), Usage::new(Some(10), Some(25), Some(35)));
        Ok(())
    }

    #[test]
    fn test_usage_out_of_range_counts_are_dropped() {
        let response = json!({
            "usage": {"prompt_tokens": 5_000_000_000_i64, "completion_tokens": 7}
        });

        assert_eq!(get_usage(&response), Usage::new(None, Some(7), None));
    }

    #[test]
    fn test_malformed_arguments_are_kept_verbatim() -> Result<()> {
        let mut response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE)?;
        response["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"] =
            json!("invalid json {");

        let message = openai_response_to_message(&response)?;
        assert_eq!(message.tool_requests()[0].arguments, "invalid json {");
        Ok(())
    }

    #[test]
    fn test_response_without_choices() {
        assert!(openai_response_to_message(&json!({"id": "x"})).is_err());
    }

    #[test]
    fn test_check_openai_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This message is too long"
        });

        let result = check_openai_context_length_error(&error);
        assert_eq!(
            result.unwrap().to_string(),
            "Context length exceeded. Message: This message is too long"
        );

        let error = json!({"code": "other_error", "message": "Some other error"});
        assert!(check_openai_context_length_error(&error).is_none());
    }
}
