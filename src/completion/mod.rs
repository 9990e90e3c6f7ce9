//! Completion provider seam.
//!
//! The query pipeline sends one fully composed prompt as a single user
//! message and expects plain text back; [`Completion`] captures exactly
//! that. [`RigCompletion`] adapts any
//! [`rig::completion::CompletionModel`].

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;

use crate::types::{RagError, RagResult};

/// Single-turn text completion.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Send `prompt` as one user message and return the model's text.
    async fn complete(&self, prompt: &str) -> RagResult<String>;
}

/// Adapter over a rig completion model.
#[derive(Clone)]
pub struct RigCompletion<M> {
    model: M,
    preamble: Option<String>,
    temperature: Option<f64>,
}

impl<M> RigCompletion<M>
where
    M: CompletionModel,
{
    pub fn new(model: M) -> Self {
        Self {
            model,
            preamble: None,
            temperature: None,
        }
    }

    /// Set a system preamble sent alongside every request.
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl<M> Completion for RigCompletion<M>
where
    M: CompletionModel,
{
    async fn complete(&self, prompt: &str) -> RagResult<String> {
        let mut builder = self
            .model
            .completion_request(rig::completion::Message::user(prompt.to_owned()));
        if let Some(preamble) = &self.preamble {
            builder = builder.preamble(preamble.clone());
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        let request = builder.build();

        let response = self
            .model
            .completion(request)
            .await
            .map_err(|err| RagError::Completion(err.to_string()))?;

        let text = response
            .choice
            .into_iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(RagError::Completion(
                "model response contained no text".into(),
            ));
        }
        Ok(text)
    }
}
