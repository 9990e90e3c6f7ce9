//! Run the scenario questions against an ingested store.
//!
//! Fully offline: the hash embedder pairs with whatever `ingest_cvs` wrote,
//! and the completion seam is filled by a local stub that describes the
//! prompt it received instead of calling a model. Replace the stub with a
//! `RigCompletion` over a provider model for real answers.
//!
//! ```sh
//! DOSSIER_DB=./dossier.sqlite cargo run --example cv_chat
//! ```

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use tracing_subscriber::{EnvFilter, fmt};

use dossier::{
    AgentRegistry, Completion, HashEmbedder, RagConfig, RagResult, RagService, SqliteVectorStore,
};

const QUESTIONS: [&str; 4] = [
    "What is Ricardo's latest job?",
    "Compare Jorge and Francisco's education.",
    "What skills does this person have?",
    "What did Francisco study?",
];

/// Stands in for an LLM: summarizes the prompt it was handed so the
/// routing and segregation behavior is visible on the console.
struct DescribeCompletion;

#[async_trait]
impl Completion for DescribeCompletion {
    async fn complete(&self, prompt: &str) -> RagResult<String> {
        let sections = prompt.matches("=== Context for").count();
        let shape = if sections == 0 {
            "single-agent prompt".to_string()
        } else {
            format!("multi-agent prompt with {sections} labeled sections")
        };
        Ok(format!("[offline stub] received a {shape} of {} chars", prompt.len()))
    }
}

#[tokio::main]
async fn main() -> RagResult<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RagConfig::from_env();
    let db_path = env::var("DOSSIER_DB").unwrap_or_else(|_| "./dossier.sqlite".to_string());

    let store = Arc::new(SqliteVectorStore::open(&db_path, config.dimension).await?);
    let service = RagService::builder()
        .registry(AgentRegistry::new(["Jorge", "Ricardo", "Francisco"])?)
        .embedder(Arc::new(HashEmbedder::new(config.dimension)))
        .store(store)
        .completion(Arc::new(DescribeCompletion))
        .config(config)
        .build()?;

    for question in QUESTIONS {
        let reply = service.answer(question).await?;
        println!("Q: {question}");
        println!("   agents: {}", reply.agents_used.join(", "));
        for (agent, chunks) in &reply.contexts {
            println!("   context[{agent}]: {} chunks", chunks.len());
        }
        println!("   A: {}\n", reply.answer);
    }
    Ok(())
}
