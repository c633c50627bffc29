use eyre::Result;
use tracing::debug;

use super::form::build_prompt;
use super::seed::{SEED_CITIES_JSON, SEED_COUNTRY, SEED_STATE};
use crate::gemini_client::GenerativeBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Append-only exchange with the model, always starting with the seed pair.
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    /// Number of turns that make up the seed example.
    pub const SEED_LEN: usize = 2;

    pub fn new() -> Self {
        Self {
            turns: vec![
                Turn {
                    role: Role::User,
                    text: build_prompt(SEED_STATE, SEED_COUNTRY),
                },
                Turn {
                    role: Role::Model,
                    text: SEED_CITIES_JSON.to_string(),
                },
            ],
        }
    }

    pub fn add_exchange(&mut self, user: &str, model: &str) {
        self.turns.push(Turn {
            role: Role::User,
            text: user.to_string(),
        });
        self.turns.push(Turn {
            role: Role::Model,
            text: model.to_string(),
        });
    }

    pub fn get_turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Drop everything after the seed pair.
    pub fn truncate_to_seed(&mut self) {
        self.turns.truncate(Self::SEED_LEN);
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// One user's conversation with the generative backend.
pub struct PromptSession<B> {
    backend: B,
    state: ConversationState,
}

impl<B: GenerativeBackend> PromptSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: ConversationState::new(),
        }
    }

    /// Send `prompt_text` with the whole conversation so far and return the
    /// reply verbatim.
    ///
    /// The exchange is recorded only when the backend answers, so a failed
    /// call leaves the conversation exactly as it was. Backend errors are
    /// returned unchanged and never retried.
    pub async fn submit(&mut self, prompt_text: &str) -> Result<String> {
        let mut messages: Vec<(&str, &str)> = self
            .state
            .get_turns()
            .iter()
            .map(|turn| (turn.role.as_str(), turn.text.as_str()))
            .collect();
        messages.push((Role::User.as_str(), prompt_text));

        debug!(turns = messages.len(), "Submitting prompt");

        let response = self.backend.generate_content(&messages).await?;
        self.state.add_exchange(prompt_text, &response);

        Ok(response)
    }

    pub fn turns(&self) -> &[Turn] {
        self.state.get_turns()
    }

    /// Forget every exchange after the seed.
    pub fn reset(&mut self) {
        self.state.truncate_to_seed();
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
