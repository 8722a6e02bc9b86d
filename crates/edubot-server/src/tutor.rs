//! The tutor: turns a chat history into the assistant's next reply.
//!
//! With an API key configured, requests go to an OpenAI-compatible
//! `chat/completions` endpoint. Without one, a fixed greeting is returned so
//! the rest of the service works offline.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use edubot_shared::constants::CANNED_TUTOR_REPLY;
use edubot_shared::{ExpertiseLevel, UserSettings};
use edubot_store::Message;

use crate::config::ServerConfig;
use crate::error::ServerError;

pub enum Tutor {
    Canned,
    Remote(RemoteTutor),
}

impl Tutor {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        match &config.llm_api_key {
            Some(key) => Ok(Self::Remote(RemoteTutor::new(
                config.llm_api_url.clone(),
                key.clone(),
                config.llm_model.clone(),
                config.llm_timeout,
            )?)),
            None => {
                warn!("LLM_API_KEY not set, using the canned tutor");
                Ok(Self::Canned)
            }
        }
    }

    /// Produce the next assistant message for `history` (oldest first).
    pub async fn reply(
        &self,
        history: &[Message],
        settings: &UserSettings,
    ) -> Result<String, ServerError> {
        match self {
            Self::Canned => Ok(CANNED_TUTOR_REPLY.to_string()),
            Self::Remote(remote) => remote.reply(history, settings).await,
        }
    }
}

pub struct RemoteTutor {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Turn<'a>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl RemoteTutor {
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        timeout: std::time::Duration,
    ) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    async fn reply(
        &self,
        history: &[Message],
        settings: &UserSettings,
    ) -> Result<String, ServerError> {
        let prompt = system_prompt(settings.expertise_level);
        let body = CompletionRequest {
            model: &self.model,
            messages: build_turns(&prompt, history),
        };

        debug!(model = %self.model, turns = body.messages.len(), "Requesting completion");

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServerError::Tutor(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ServerError::Tutor(format!("provider answered {status}")));
        }

        let completion: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| ServerError::Tutor(format!("invalid response body: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ServerError::Tutor("provider returned no content".into()))
    }
}

fn system_prompt(level: ExpertiseLevel) -> String {
    let audience = match level {
        ExpertiseLevel::Beginner => {
            "a beginner. Avoid jargon, define new terms, and use small concrete examples"
        }
        ExpertiseLevel::Intermediate => {
            "an intermediate student. Assume basic programming knowledge and focus on reasoning"
        }
        ExpertiseLevel::Advanced => {
            "an advanced student. Be concise and precise, and point to trade-offs and edge cases"
        }
    };
    format!(
        "You are a teaching assistant for an undergraduate software engineering course. \
         The student is {audience}. Guide them toward the answer rather than doing their \
         graded work for them."
    )
}

fn build_turns<'a>(prompt: &'a str, history: &'a [Message]) -> Vec<Turn<'a>> {
    std::iter::once(Turn {
        role: "system",
        content: prompt,
    })
    .chain(history.iter().map(|m| Turn {
        role: if m.is_from_user { "user" } else { "assistant" },
        content: &m.text,
    }))
    .collect()
}
