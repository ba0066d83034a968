/// A block of content within a message.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    /// Raw image bytes, base64-encoded on the wire.
    Image { media_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A single-block text message from the user.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// An image followed by an instruction, from the user.
    pub fn user_image(media_type: impl Into<String>, data: Vec<u8>, text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![
                ContentBlock::Image {
                    media_type: media_type.into(),
                    data,
                },
                ContentBlock::Text(text.into()),
            ],
        }
    }
}

/// A request to the messages endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagesRequest {
    pub model: String,
    /// Token budget for the answer.
    pub max_tokens: u32,
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

/// Token counts reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// What came back from the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Text of the first content item, if it had any.
    pub text: Option<String>,
    pub model: Option<String>,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}
