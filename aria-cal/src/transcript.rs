#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

pub const GREETING: &str = "Hi! I'm Aria ✨\n\n\
• 🗓️ Type to plan events\n\
• 📷 Upload your school timetable\n\
• 🔴🟢 Tell me which classes are mandatory\n\n\
Try: \"Add gym tomorrow at 7am\"";

/// The conversation shown in the chat view.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// A transcript opening with the assistant's greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::Assistant,
                text: GREETING.to_string(),
            }],
        }
    }

    pub fn user(&mut self, text: impl Into<String>) {
        self.push(Role::User, text);
    }

    pub fn assistant(&mut self, text: impl Into<String>) {
        self.push(Role::Assistant, text);
    }

    fn push(&mut self, role: Role, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            text: text.into(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
