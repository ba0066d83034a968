use base64::Engine;
use serde_json::{Value, json};

use crate::error::AnthropicError;
use crate::types::{Completion, ContentBlock, Message, MessagesRequest, TokenUsage};

/// Converts a ContentBlock to the API's JSON format.
fn content_block_to_json(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text(text) => json!({
            "type": "text",
            "text": text
        }),
        ContentBlock::Image { media_type, data } => {
            let b64 = base64::engine::general_purpose::STANDARD.encode(data);
            json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": media_type,
                    "data": b64
                }
            })
        }
    }
}

/// Converts a Message to the API's JSON format.
///
/// A lone text block is sent as a plain string.
fn message_to_json(msg: &Message) -> Value {
    let content = match msg.content.as_slice() {
        [ContentBlock::Text(text)] => json!(text),
        blocks => Value::Array(blocks.iter().map(content_block_to_json).collect()),
    };
    json!({
        "role": msg.role.as_str(),
        "content": content
    })
}

/// Builds the full request body.
pub fn build_request_body(request: &MessagesRequest) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();

    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "messages": messages
    });

    if let Some(system) = &request.system {
        body["system"] = json!(system);
    }

    body
}

/// Parses a successful response body.
pub fn parse_response(response: &Value) -> Result<Completion, AnthropicError> {
    let content = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| AnthropicError::Api {
            status: 0,
            message: "No content in response".to_string(),
        })?;

    let text = content
        .first()
        .and_then(|item| item.get("text"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(String::from);

    let model = response
        .get("model")
        .and_then(|m| m.as_str())
        .map(String::from);

    let stop_reason = response
        .get("stop_reason")
        .and_then(|r| r.as_str())
        .map(String::from);

    let usage = response.get("usage").map(|u| TokenUsage {
        input_tokens: u.get("input_tokens").and_then(|t| t.as_u64()),
        output_tokens: u.get("output_tokens").and_then(|t| t.as_u64()),
    });

    Ok(Completion {
        text,
        model,
        stop_reason,
        usage,
    })
}

/// Pulls the error message out of a non-2xx body.
pub fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_text_message_is_plain_string() {
        let json = message_to_json(&Message::user_text("Add gym tomorrow at 7am"));

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Add gym tomorrow at 7am");
    }

    #[test]
    fn test_image_message_is_multipart() {
        let msg = Message::user_image("image/png", b"png".to_vec(), "Extract ALL classes");
        let json = message_to_json(&msg);

        let content = json["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[0]["source"]["data"], "cG5n");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Extract ALL classes");
    }

    #[test]
    fn test_build_request_body() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 800,
            system: Some("You are Aria".to_string()),
            messages: vec![Message::user_text("hi")],
        };
        let body = build_request_body(&request);

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["system"], "You are Aria");
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_build_request_body_without_system() {
        let request = MessagesRequest {
            model: "m".to_string(),
            max_tokens: 2000,
            system: None,
            messages: vec![Message {
                role: Role::Assistant,
                content: vec![],
            }],
        };
        let body = build_request_body(&request);

        assert!(body.get("system").is_none());
        assert_eq!(body["messages"][0]["role"], "assistant");
        assert!(body["messages"][0]["content"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_simple() {
        let response = json!({
            "model": "claude-sonnet-4-20250514",
            "content": [
                { "type": "text", "text": "{\"action\":\"query\"}" },
                { "type": "text", "text": "ignored" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 120, "output_tokens": 9 }
        });

        let parsed = parse_response(&response).unwrap();

        assert_eq!(parsed.text.as_deref(), Some("{\"action\":\"query\"}"));
        assert_eq!(parsed.model.as_deref(), Some("claude-sonnet-4-20250514"));
        assert_eq!(parsed.stop_reason.as_deref(), Some("end_turn"));
        let usage = parsed.usage.unwrap();
        assert_eq!(usage.input_tokens, Some(120));
        assert_eq!(usage.output_tokens, Some(9));
    }

    #[test]
    fn test_parse_response_empty_content() {
        let parsed = parse_response(&json!({ "content": [] })).unwrap();
        assert_eq!(parsed.text, None);
    }

    #[test]
    fn test_parse_response_missing_content() {
        let err = parse_response(&json!({ "type": "message" })).unwrap_err();
        assert!(matches!(err, AnthropicError::Api { status: 0, .. }));
    }

    #[test]
    fn test_error_message() {
        let body = json!({
            "type": "error",
            "error": { "type": "authentication_error", "message": "invalid x-api-key" }
        });
        assert_eq!(error_message(&body), "invalid x-api-key");
        assert_eq!(error_message(&json!({})), "Unknown error");
    }
}
