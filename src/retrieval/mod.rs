//! Per-agent retrieval and ordered context assembly.
//!
//! Given a question and a resolved agent list, [`Retriever`] embeds the
//! question once, runs one owner-filtered similarity search per agent, and
//! assembles the results into a [`ContextSet`] whose iteration order is the
//! resolver's emission order.
//!
//! Per-agent searches run concurrently; they are independent, read-only
//! lookups against disjoint partitions. The join is fail-fast: any agent's
//! store error fails the whole query rather than quietly returning a
//! partial answer. Each store call is bounded by
//! [`RagConfig::store_timeout`](crate::config::RagConfig).

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use tracing::debug;

use crate::config::RagConfig;
use crate::embeddings::Embedder;
use crate::registry::Agent;
use crate::stores::VectorStore;
use crate::types::{RagError, RagResult};

/// One agent's retrieved evidence: chunk texts in descending similarity
/// order, possibly empty.
#[derive(Clone, Debug)]
pub struct AgentContext {
    pub agent: Agent,
    pub chunks: Vec<String>,
}

impl AgentContext {
    pub fn new(agent: Agent, chunks: Vec<String>) -> Self {
        Self { agent, chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Ordered per-agent contexts for one query.
///
/// Deliberately a sequence rather than a map: the order of entries is the
/// Agent Resolver's emission order and downstream prompt sections depend on
/// it.
#[derive(Clone, Debug, Default)]
pub struct ContextSet {
    entries: Vec<AgentContext>,
}

impl ContextSet {
    pub fn new(entries: Vec<AgentContext>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AgentContext] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentContext> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunks for one agent, if the set has an entry for it.
    pub fn chunks_for(&self, agent_name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|entry| entry.agent.name == agent_name)
            .map(|entry| entry.chunks.as_slice())
    }
}

impl IntoIterator for ContextSet {
    type Item = AgentContext;
    type IntoIter = std::vec::IntoIter<AgentContext>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Embeds a question once and fans out owner-filtered top-K searches.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
    store_timeout: Duration,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: &RagConfig,
    ) -> RagResult<Self> {
        config.validate()?;
        Ok(Self {
            embedder,
            store,
            top_k: config.top_k,
            store_timeout: config.store_timeout,
        })
    }

    /// Retrieve contexts for every agent in `agents`, preserving their
    /// order.
    ///
    /// The question is embedded exactly once and the resulting vector is
    /// shared across all searches. An agent with no stored records yields
    /// an empty [`AgentContext`]; a store failure or timeout for any agent
    /// fails the whole call.
    pub async fn retrieve(&self, question: &str, agents: &[Agent]) -> RagResult<ContextSet> {
        let query_embedding = self.embedder.embed(question).await?;

        let searches = agents.iter().map(|agent| {
            let embedding = &query_embedding;
            async move {
                let matches = tokio::time::timeout(
                    self.store_timeout,
                    self.store.search(embedding, self.top_k, &agent.name),
                )
                .await
                .map_err(|_| RagError::Timeout {
                    operation: "vector store search",
                    seconds: self.store_timeout.as_secs(),
                })??;

                // Entries with no usable text are dropped, not surfaced.
                let chunks: Vec<String> = matches
                    .into_iter()
                    .filter(|hit| !hit.metadata.text.trim().is_empty())
                    .map(|hit| hit.metadata.text)
                    .collect();
                debug!(agent = %agent.name, chunks = chunks.len(), "retrieved context");
                Ok::<AgentContext, RagError>(AgentContext::new(agent.clone(), chunks))
            }
        });

        // try_join_all yields results in input order regardless of which
        // search completes first.
        let entries = try_join_all(searches).await?;
        Ok(ContextSet::new(entries))
    }
}
