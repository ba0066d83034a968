//! Minimal client for the Anthropic messages API.
//!
//! Covers what the calendar needs: a text request with a system prompt and
//! a single image-plus-instruction request, each answered with one text item.
//!
//! # Example
//!
//! ```ignore
//! use aria_anthropic::{AnthropicClient, Message, MessagesRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = AnthropicClient::new("your-api-key");
//!
//!     let request = MessagesRequest {
//!         model: "claude-sonnet-4-20250514".to_string(),
//!         max_tokens: 800,
//!         system: Some("You are Aria, an AI calendar assistant.".to_string()),
//!         messages: vec![Message::user_text("Add gym tomorrow at 7am")],
//!     };
//!
//!     let completion = client.complete(&request).await.unwrap();
//!     println!("{}", completion.text.unwrap_or_default());
//! }
//! ```

mod client;
mod convert;
mod error;
mod types;

pub use client::AnthropicClient;
pub use convert::{build_request_body, parse_response};
pub use error::AnthropicError;
pub use types::{Completion, ContentBlock, Message, MessagesRequest, Role, TokenUsage};
