use crate::error::AriaError;

/// Shared-password gate. Once unlocked it stays open for the process.
#[derive(Debug, Clone)]
pub struct Gate {
    password: Option<String>,
    unlocked: bool,
}

impl Gate {
    pub fn new(password: Option<&str>) -> Self {
        let password = password.filter(|p| !p.is_empty()).map(String::from);
        Self {
            unlocked: password.is_none(),
            password,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn try_unlock(&mut self, attempt: &str) -> bool {
        if self.unlocked {
            return true;
        }
        self.unlocked = self.password.as_deref() == Some(attempt);
        self.unlocked
    }

    /// Non-interactive check for one-shot commands.
    pub fn require(&mut self, attempt: Option<&str>) -> Result<(), AriaError> {
        match attempt {
            _ if self.unlocked => Ok(()),
            Some(attempt) if self.try_unlock(attempt) => Ok(()),
            _ => Err(AriaError::Locked),
        }
    }
}
