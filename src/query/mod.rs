//! The query pipeline: resolve → retrieve → compose → complete.
//!
//! [`RagService`] is the surface the application talks to. It owns the
//! agent registry and the composed pipeline stages, all constructed with
//! injected collaborators — no global state, so tests substitute fakes
//! freely.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::completion::Completion;
use crate::config::RagConfig;
use crate::embeddings::Embedder;
use crate::prompt::PromptComposer;
use crate::registry::AgentRegistry;
use crate::retrieval::{ContextSet, Retriever};
use crate::stores::VectorStore;
use crate::types::{RagError, RagResult};

/// Answer to one question, with provenance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RagAnswer {
    /// The completion service's text.
    pub answer: String,
    /// Names of the agents consulted, in resolution order.
    pub agents_used: Vec<String>,
    /// Per-agent retrieved chunk texts, in the same order as `agents_used`.
    /// A sequence of pairs rather than a map: ordering is part of the
    /// contract.
    pub contexts: Vec<(String, Vec<String>)>,
}

/// Builds [`RagService`]s with injected collaborators.
#[derive(Default)]
pub struct RagServiceBuilder {
    registry: Option<AgentRegistry>,
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
    completion: Option<Arc<dyn Completion>>,
    config: Option<RagConfig>,
}

impl RagServiceBuilder {
    #[must_use]
    pub fn registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn completion(mut self, completion: Arc<dyn Completion>) -> Self {
        self.completion = Some(completion);
        self
    }

    #[must_use]
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> RagResult<RagService> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let registry = self
            .registry
            .ok_or_else(|| RagError::Config("service requires an agent registry".into()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("service requires an embedder".into()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::Config("service requires a vector store".into()))?;
        let completion = self
            .completion
            .ok_or_else(|| RagError::Config("service requires a completion provider".into()))?;

        let retriever = Retriever::new(embedder, store, &config)?;
        Ok(RagService {
            registry,
            retriever,
            composer: PromptComposer::new(),
            completion,
            config,
        })
    }
}

/// Question-answering service over owner-partitioned document knowledge.
pub struct RagService {
    registry: AgentRegistry,
    retriever: Retriever,
    composer: PromptComposer,
    completion: Arc<dyn Completion>,
    config: RagConfig,
}

impl RagService {
    pub fn builder() -> RagServiceBuilder {
        RagServiceBuilder::default()
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Answer `question`, returning the model's text plus which agents were
    /// consulted and what context each contributed.
    ///
    /// Fails fast on any store or completion error; there is no partial
    /// answer.
    #[instrument(skip(self))]
    pub async fn answer(&self, question: &str) -> RagResult<RagAnswer> {
        let agents = self.registry.resolve(question);
        debug!(agents = ?agents.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), "resolved agents");

        let contexts = self.retriever.retrieve(question, &agents).await?;
        let prompt = self.composer.compose(&contexts, question);

        let answer = tokio::time::timeout(
            self.config.completion_timeout,
            self.completion.complete(&prompt),
        )
        .await
        .map_err(|_| RagError::Timeout {
            operation: "completion",
            seconds: self.config.completion_timeout.as_secs(),
        })??;

        info!(
            agents = contexts.len(),
            answer_len = answer.len(),
            "answered question"
        );
        Ok(Self::into_answer(answer, contexts))
    }

    fn into_answer(answer: String, contexts: ContextSet) -> RagAnswer {
        let mut agents_used = Vec::with_capacity(contexts.len());
        let mut context_pairs = Vec::with_capacity(contexts.len());
        for entry in contexts {
            agents_used.push(entry.agent.name.clone());
            context_pairs.push((entry.agent.name, entry.chunks));
        }
        RagAnswer {
            answer,
            agents_used,
            contexts: context_pairs,
        }
    }
}
