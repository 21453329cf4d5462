use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// External classifier behind the Action Router. Any implementation
/// (model-backed or rule-based) can sit behind this seam; the router only
/// relies on the returned text containing one JSON decision object.
#[async_trait]
pub trait RoutingOracle: Send + Sync {
    async fn classify(&self, instruction: &str, utterance: &str) -> Result<String>;
}

/// Main generation step with retrieval and web-search tools enabled on the
/// provider side. Returns the plain-text answer.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}
