//! Agent registry and query routing.
//!
//! An [`Agent`] names one knowledge partition (one person's documents).
//! [`AgentRegistry`] holds the registered agents in a fixed order and maps a
//! free-text question to the agents it mentions. Name matching is
//! case-insensitive and word-boundary bounded, so `"Jorge"` never matches
//! inside `"Jorgensen"`.
//!
//! Matchers are compiled once at registry construction and reused for every
//! question. Iteration order is the registration order and is part of the
//! contract: resolved agent lists, retrieval output, and prompt sections all
//! follow it.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{RagError, RagResult};

/// A registered knowledge partition, identified by its canonical name.
///
/// The name is a case-sensitive identity; only *matching* against question
/// text is case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug)]
struct RegisteredAgent {
    agent: Agent,
    matcher: Regex,
}

/// Ordered collection of agents with precompiled name matchers.
#[derive(Debug)]
pub struct AgentRegistry {
    entries: Vec<RegisteredAgent>,
    default_index: usize,
}

impl AgentRegistry {
    /// Build a registry from agent names, preserving their order.
    ///
    /// The first name becomes the default agent unless [`with_default`]
    /// overrides it. Fails on an empty list, on duplicate names (compared
    /// case-insensitively, since matching is), and on names that cannot
    /// anchor a word boundary (empty, or starting/ending with a non-word
    /// character).
    ///
    /// [`with_default`]: AgentRegistry::with_default
    pub fn new<I, S>(names: I) -> RagResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<RegisteredAgent> = Vec::new();
        for name in names {
            let name = name.into();
            validate_name(&name)?;
            if entries
                .iter()
                .any(|entry| entry.agent.name.eq_ignore_ascii_case(&name))
            {
                return Err(RagError::Registry(format!(
                    "duplicate agent name '{name}'"
                )));
            }
            let matcher = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&name)))
                .map_err(|err| RagError::Registry(format!("matcher for '{name}': {err}")))?;
            entries.push(RegisteredAgent {
                agent: Agent::new(name),
                matcher,
            });
        }
        if entries.is_empty() {
            return Err(RagError::Registry(
                "registry requires at least one agent".into(),
            ));
        }
        Ok(Self {
            entries,
            default_index: 0,
        })
    }

    /// Designate the fallback agent for questions that mention nobody.
    ///
    /// The name must match a registered agent exactly.
    #[must_use = "returns the updated registry"]
    pub fn with_default(mut self, name: &str) -> RagResult<Self> {
        match self.entries.iter().position(|e| e.agent.name == name) {
            Some(index) => {
                self.default_index = index;
                Ok(self)
            }
            None => Err(RagError::Registry(format!(
                "default agent '{name}' is not registered"
            ))),
        }
    }

    /// Map a question to the agents it mentions.
    ///
    /// Returns the mentioned agents in registration order, without
    /// duplicates. A question mentioning nobody resolves to the default
    /// agent, so the result is never empty.
    pub fn resolve(&self, question: &str) -> Vec<Agent> {
        let matched: Vec<Agent> = self
            .entries
            .iter()
            .filter(|entry| entry.matcher.is_match(question))
            .map(|entry| entry.agent.clone())
            .collect();
        if matched.is_empty() {
            return vec![self.default_agent().clone()];
        }
        matched
    }

    pub fn default_agent(&self) -> &Agent {
        &self.entries[self.default_index].agent
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.entries.iter().map(|entry| &entry.agent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A name must start and end on a word character for `\b` anchoring to
/// behave; anything else would silently never match.
fn validate_name(name: &str) -> RagResult<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| RagError::Registry("agent name must not be empty".into()))?;
    let last = name
        .chars()
        .next_back()
        .unwrap_or(first);
    if !is_word_char(first) || !is_word_char(last) {
        return Err(RagError::Registry(format!(
            "agent name '{name}' must start and end with a letter, digit, or underscore"
        )));
    }
    Ok(())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> AgentRegistry {
        AgentRegistry::new(["Jorge", "Ricardo", "Francisco"]).unwrap()
    }

    fn names(agents: &[Agent]) -> Vec<&str> {
        agents.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn single_mention_resolves_to_that_agent() {
        let resolved = roster().resolve("What is Ricardo's latest job?");
        assert_eq!(names(&resolved), ["Ricardo"]);
    }

    #[test]
    fn no_mention_falls_back_to_default() {
        let resolved = roster().resolve("What programming languages are listed?");
        assert_eq!(names(&resolved), ["Jorge"]);
    }

    #[test]
    fn multiple_mentions_resolve_in_registration_order() {
        let resolved = roster().resolve("Compare Francisco and Jorge's education.");
        assert_eq!(names(&resolved), ["Jorge", "Francisco"]);
    }

    #[test]
    fn repeated_mention_yields_agent_once() {
        let resolved = roster().resolve("Jorge, tell me about Jorge's skills");
        assert_eq!(names(&resolved), ["Jorge"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let resolved = roster().resolve("what does RICARDO do?");
        assert_eq!(names(&resolved), ["Ricardo"]);
    }

    #[test]
    fn name_inside_longer_word_does_not_match() {
        let resolved = roster().resolve("Tell me about Jorgito's experience");
        assert_eq!(names(&resolved), ["Jorge"], "falls back to the default");

        // "Jorgeson" contains "Jorge" as a prefix; the boundary must reject it.
        let resolved = roster().resolve("Is Ricardo related to Jorgeson?");
        assert_eq!(names(&resolved), ["Ricardo"]);
    }

    #[test]
    fn name_beside_punctuation_matches() {
        let resolved = roster().resolve("Education (Jorge)?");
        assert_eq!(names(&resolved), ["Jorge"]);
    }

    #[test]
    fn empty_registry_rejected() {
        let err = AgentRegistry::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, RagError::Registry(_)));
    }

    #[test]
    fn duplicate_name_rejected() {
        let err = AgentRegistry::new(["Jorge", "jorge"]).unwrap_err();
        assert!(matches!(err, RagError::Registry(_)));
    }

    #[test]
    fn unanchorable_name_rejected() {
        assert!(AgentRegistry::new(["-Jorge"]).is_err());
        assert!(AgentRegistry::new(["Jorge!"]).is_err());
        assert!(AgentRegistry::new([""]).is_err());
    }

    #[test]
    fn designated_default_replaces_first() {
        let registry = roster().with_default("Ricardo").unwrap();
        let resolved = registry.resolve("no names here");
        assert_eq!(names(&resolved), ["Ricardo"]);
    }

    #[test]
    fn unknown_default_rejected() {
        let err = roster().with_default("Marcela").unwrap_err();
        assert!(matches!(err, RagError::Registry(_)));
    }

    #[test]
    fn accented_names_match_whole_words() {
        let registry = AgentRegistry::new(["José"]).unwrap();
        assert_eq!(names(&registry.resolve("Where does José work?")), ["José"]);
    }
}
