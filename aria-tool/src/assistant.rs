use aria_anthropic::{AnthropicClient, AnthropicError, Message, MessagesRequest};
use aria_cal::{CommandRequest, ScanRequest};
use tracing::debug;

use crate::config::Config;
use crate::error::AriaError;

/// The two kinds of model calls the calendar makes.
#[derive(Clone)]
pub struct Assistant {
    client: AnthropicClient,
    model: String,
    command_max_tokens: u32,
    scan_max_tokens: u32,
}

impl Assistant {
    pub fn new(client: AnthropicClient, config: &Config) -> Self {
        Self {
            client,
            model: config.model().to_string(),
            command_max_tokens: config.command_max_tokens(),
            scan_max_tokens: config.scan_max_tokens(),
        }
    }

    /// Builds a client from config and `ANTHROPIC_API_KEY`.
    pub fn from_config(config: &Config, api_key: String) -> Self {
        let client = match &config.base_url {
            Some(url) => AnthropicClient::with_base_url(api_key, url.as_str()),
            None => AnthropicClient::new(api_key),
        };
        Self::new(client, config)
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    pub fn command_request(&self, request: &CommandRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.command_max_tokens,
            system: Some(request.system.clone()),
            messages: vec![Message::user_text(request.text.as_str())],
        }
    }

    pub fn scan_request(&self, request: &ScanRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.scan_max_tokens,
            system: None,
            messages: vec![Message::user_image(
                request.media_type.as_str(),
                request.data.clone(),
                request.prompt.as_str(),
            )],
        }
    }

    /// Interprets one chat command; the text is the raw reply.
    pub async fn command(&self, request: &CommandRequest) -> Result<Option<String>, AnthropicError> {
        let completion = self.client.complete(&self.command_request(request)).await?;
        debug!(stop_reason = ?completion.stop_reason, "Command completed");
        Ok(completion.text)
    }

    /// Reads a timetable image; the text should be a JSON array of slots.
    pub async fn scan(&self, request: &ScanRequest) -> Result<Option<String>, AnthropicError> {
        let completion = self.client.complete(&self.scan_request(request)).await?;
        debug!(stop_reason = ?completion.stop_reason, usage = ?completion.usage, "Scan completed");
        Ok(completion.text)
    }
}

pub fn build(config: &Config, model: Option<String>) -> Result<Assistant, AriaError> {
    let api_key = crate::config::load_api_key(config)?;
    Ok(Assistant::from_config(config, api_key).with_model(model))
}
