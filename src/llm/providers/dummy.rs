//! Dummy LLM provider: echoes the last user message back prefixed with `[echo]`.
//! Used for running the relay end to end without an API key.

use crate::llm::{CompletionRequest, LlmResponse, ProviderError, Role};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, ProviderError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(LlmResponse {
            text: format!("[echo] {last_user}"),
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn request(messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            messages,
            max_tokens: 16,
            temperature: 0.7,
            presence_penalty: 0.6,
            frequency_penalty: 0.5,
        }
    }

    #[tokio::test]
    async fn echoes_last_user_message() {
        let req = request(vec![
            ChatMessage::system("persona"),
            ChatMessage::user("first"),
            ChatMessage::assistant("[echo] first"),
            ChatMessage::user("second"),
        ]);
        assert_eq!(DummyProvider.complete(&req).await.unwrap().text, "[echo] second");
    }

    #[tokio::test]
    async fn no_user_message_echoes_empty() {
        let req = request(vec![ChatMessage::system("persona")]);
        assert_eq!(DummyProvider.complete(&req).await.unwrap().text, "[echo] ");
    }

    #[tokio::test]
    async fn usage_is_none() {
        let req = request(vec![ChatMessage::user("test")]);
        assert!(DummyProvider.complete(&req).await.unwrap().usage.is_none());
    }
}
