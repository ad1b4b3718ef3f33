//! Chat subsystem: one assistant reply per user turn.
//!
//! [`ChatService`] owns the session store, the model registry and the LLM
//! provider. `respond` builds `system + history + new turn`, calls the
//! provider with the model's token budget and the fixed sampling values, and
//! records the exchange only when the provider succeeded. The conversation's
//! [`SessionGuard`](crate::subsystems::memory::SessionGuard) is held for the
//! whole exchange so concurrent turns on one conversation never interleave.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm::models::ModelRegistry;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, ProviderError};
use crate::subsystems::memory::SessionStore;

pub const TEMPERATURE: f32 = 0.7;
pub const PRESENCE_PENALTY: f32 = 0.6;
pub const FREQUENCY_PENALTY: f32 = 0.5;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl ChatError {
    /// Stable machine-readable code sent next to the free-text message.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::UnknownModel(_) => "unknown_model",
            ChatError::ConversationNotFound => "not_found",
            ChatError::Provider(_) => "upstream_error",
        }
    }
}

/// Successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
    pub conversation_id: String,
}

pub struct ChatService {
    store: SessionStore,
    provider: LlmProvider,
    models: ModelRegistry,
    system_prompt: String,
    default_model: String,
}

impl ChatService {
    pub fn new(
        store: SessionStore,
        provider: LlmProvider,
        models: ModelRegistry,
        system_prompt: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            models,
            system_prompt: system_prompt.into(),
            default_model: default_model.into(),
        }
    }

    /// Wire a service from resolved config and an already-built provider.
    pub fn from_config(config: &Config, provider: LlmProvider) -> Self {
        Self::new(
            SessionStore::new(config.chat.max_turns),
            provider,
            config.models.clone(),
            config.chat.system_prompt.clone(),
            config.chat.default_model.clone(),
        )
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Produce the assistant reply for `user_message` in `conversation_id`.
    ///
    /// `user_message` must already be validated as non-empty by the caller.
    /// On any error the stored history is left exactly as it was.
    pub async fn respond(
        &self,
        conversation_id: &str,
        user_message: &str,
        model: &str,
    ) -> Result<ChatReply, ChatError> {
        // The session exists from the first turn on, even if this one fails.
        let mut session = self.store.lock(conversation_id).await;

        let Some(descriptor) = self.models.get(model) else {
            warn!(%conversation_id, %model, "unknown model requested");
            return Err(ChatError::UnknownModel(model.to_string()));
        };

        let mut messages = Vec::with_capacity(session.history().len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.as_str()));
        messages.extend_from_slice(session.history());
        messages.push(ChatMessage::user(user_message));

        let request = CompletionRequest {
            model: descriptor.key.clone(),
            messages,
            max_tokens: descriptor.max_tokens,
            temperature: TEMPERATURE,
            presence_penalty: PRESENCE_PENALTY,
            frequency_penalty: FREQUENCY_PENALTY,
        };

        let response = match self.provider.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(%conversation_id, %model, error = %e, "completion failed; history unchanged");
                return Err(e.into());
            }
        };

        session.append_exchange(
            ChatMessage::user(user_message),
            ChatMessage::assistant(response.text.as_str()),
        );

        info!(
            %conversation_id,
            %model,
            history_len = session.history().len(),
            input_tokens = response.usage.map(|u| u.input_tokens),
            output_tokens = response.usage.map(|u| u.output_tokens),
            "exchange recorded"
        );

        Ok(ChatReply {
            message: response.text,
            conversation_id: conversation_id.to_string(),
        })
    }

    /// Empty a conversation's history. Unknown ids are reported, not created.
    pub async fn reset(&self, conversation_id: &str) -> Result<(), ChatError> {
        if self.store.clear(conversation_id).await {
            info!(%conversation_id, "conversation cleared");
            Ok(())
        } else {
            Err(ChatError::ConversationNotFound)
        }
    }
}
