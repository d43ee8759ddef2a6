//! `OpenAI` chat completions

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::ports::{CompletionOptions, TextCompletion};
use crate::{Error, Result, http};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Text completion over the `OpenAI` chat API
pub struct OpenAiCompletion {
    client: Client,
    api_key: SecretString,
    model: String,
}

impl OpenAiCompletion {
    /// Requests that outlast `timeout` fail with an error
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(api_key: SecretString, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait(?Send)]
impl TextCompletion for OpenAiCompletion {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = ChatCompletionRequest::new(&self.model, prompt, options);
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");

        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "OpenAI API error: {status} - {body}"
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("failed to parse OpenAI response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::Completion("OpenAI returned no content".to_string()))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, options: &'a CompletionOptions) -> Self {
        let system = options.system.as_deref().map(|content| Message {
            role: "system",
            content,
        });
        let user = Message {
            role: "user",
            content: prompt,
        };

        Self {
            model,
            messages: system.into_iter().chain(std::iter::once(user)).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
