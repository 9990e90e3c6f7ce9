//! Pipeline-wide configuration.
//!
//! Defaults mirror the settings the system was tuned with: 384-dimension
//! embeddings, top-5 retrieval per agent, and ten-second deadlines on
//! external calls. Chunking has its own config in
//! [`crate::chunking::ChunkingConfig`].

use std::time::Duration;

use crate::types::{RagError, RagResult};

#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Number of chunks fetched per agent on each query.
    pub top_k: usize,
    /// Expected embedding vector length.
    pub dimension: usize,
    /// Deadline for a single vector store call.
    pub store_timeout: Duration,
    /// Deadline for a completion call.
    pub completion_timeout: Duration,
}

impl RagConfig {
    pub const DEFAULT_TOP_K: usize = 5;
    pub const DEFAULT_DIMENSION: usize = 384;
    pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

    /// Build a config from `DOSSIER_*` environment variables, falling back
    /// to the defaults for anything unset or unparsable. Loads `.env` first
    /// so local development overrides work without exporting.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            top_k: env_usize("DOSSIER_TOP_K", Self::DEFAULT_TOP_K),
            dimension: env_usize("DOSSIER_DIMENSION", Self::DEFAULT_DIMENSION),
            store_timeout: Duration::from_secs(env_u64(
                "DOSSIER_STORE_TIMEOUT_SECS",
                Self::DEFAULT_STORE_TIMEOUT_SECS,
            )),
            completion_timeout: Duration::from_secs(env_u64(
                "DOSSIER_COMPLETION_TIMEOUT_SECS",
                Self::DEFAULT_COMPLETION_TIMEOUT_SECS,
            )),
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Reject settings that would make the pipeline inoperable.
    pub fn validate(&self) -> RagResult<()> {
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be at least 1".into()));
        }
        if self.dimension == 0 {
            return Err(RagError::Config("dimension must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: Self::DEFAULT_TOP_K,
            dimension: Self::DEFAULT_DIMENSION,
            store_timeout: Duration::from_secs(Self::DEFAULT_STORE_TIMEOUT_SECS),
            completion_timeout: Duration::from_secs(Self::DEFAULT_COMPLETION_TIMEOUT_SECS),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_k, 5);
        assert_eq!(config.dimension, 384);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = RagConfig::default()
            .with_top_k(3)
            .with_dimension(8)
            .with_store_timeout(Duration::from_secs(1));
        assert_eq!(config.top_k, 3);
        assert_eq!(config.dimension, 8);
        assert_eq!(config.store_timeout, Duration::from_secs(1));
    }

    #[test]
    fn zero_top_k_rejected() {
        let config = RagConfig::default().with_top_k(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_dimension_rejected() {
        let config = RagConfig::default().with_dimension(0);
        assert!(config.validate().is_err());
    }
}
