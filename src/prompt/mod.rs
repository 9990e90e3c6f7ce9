//! Segregated prompt composition.
//!
//! [`PromptComposer`] turns a [`ContextSet`] and the original question into
//! the single prompt string sent to the completion service. Two structurally
//! distinct templates exist: one for a single consulted agent and one for
//! several. The multi-agent template gives every agent its own labeled
//! section, including agents whose retrieval came back empty, so the model
//! can never attribute one person's evidence to another.
//!
//! Both templates carry the same decline-on-missing-information policy: the
//! model is told to use only the supplied context and to answer with a fixed
//! phrase when the context does not contain the answer. The phrases, section
//! header shape, and empty-context placeholder are public constants so tests
//! and callers can assert against them.
//!
//! Composition is pure string assembly; it cannot fail.

use crate::retrieval::ContextSet;

/// Decline phrase the single-agent template instructs the model to use.
pub const SINGLE_DECLINE_PHRASE: &str =
    "The information is not found in the document.";

/// Placeholder emitted in place of chunk text when an agent's retrieval
/// returned nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "(no context retrieved for this person)";

/// Separator between chunk texts inside one agent's section.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Per-agent decline phrase the multi-agent template instructs the model to
/// use when a named person's context lacks the answer.
pub fn decline_phrase_for(agent_name: &str) -> String {
    format!("No information found for {agent_name}.")
}

/// Section header labeling one agent's context in the multi-agent template.
pub fn section_header_for(agent_name: &str) -> String {
    format!("=== Context for {agent_name} ===")
}

/// Builds the prompt for a query from its assembled contexts.
#[derive(Clone, Copy, Debug, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    /// Compose the prompt for `question` over `contexts`.
    ///
    /// A single-entry set produces the single-agent template; anything
    /// larger produces the multi-agent template with one labeled section per
    /// entry, in set order.
    pub fn compose(&self, contexts: &ContextSet, question: &str) -> String {
        debug_assert!(
            !contexts.is_empty(),
            "resolver guarantees at least one agent"
        );
        if contexts.len() == 1 {
            self.compose_single(contexts, question)
        } else {
            self.compose_multi(contexts, question)
        }
    }

    fn compose_single(&self, contexts: &ContextSet, question: &str) -> String {
        let entry = &contexts.entries()[0];
        let context = if entry.chunks.is_empty() {
            NO_CONTEXT_PLACEHOLDER.to_owned()
        } else {
            entry.chunks.join(CHUNK_SEPARATOR)
        };
        format!(
            "You are an assistant that answers questions about {name}'s document.\n\
             Use only the context below. If the answer is not in the context, \
             reply exactly: \"{decline}\"\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question: {question}\n\
             Answer:",
            name = entry.agent.name,
            decline = SINGLE_DECLINE_PHRASE,
        )
    }

    fn compose_multi(&self, contexts: &ContextSet, question: &str) -> String {
        let names: Vec<&str> = contexts
            .iter()
            .map(|entry| entry.agent.name.as_str())
            .collect();

        let sections: Vec<String> = contexts
            .iter()
            .map(|entry| {
                let body = if entry.chunks.is_empty() {
                    NO_CONTEXT_PLACEHOLDER.to_owned()
                } else {
                    entry.chunks.join(CHUNK_SEPARATOR)
                };
                format!("{}\n{}", section_header_for(&entry.agent.name), body)
            })
            .collect();

        format!(
            "You are an assistant that answers questions about the documents of: {names}.\n\
             Answer each part of the question using only the matching person's \
             context section below. Never use one person's context to answer \
             for another.\n\
             If a person's context does not contain the answer, reply for that \
             person exactly: \"No information found for <name>.\"\n\
             \n\
             {sections}\n\
             \n\
             Question: {question}\n\
             Answer:",
            names = names.join(", "),
            sections = sections.join("\n\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Agent;
    use crate::retrieval::AgentContext;

    fn set(entries: Vec<(&str, Vec<&str>)>) -> ContextSet {
        ContextSet::new(
            entries
                .into_iter()
                .map(|(name, chunks)| {
                    AgentContext::new(
                        Agent::new(name),
                        chunks.into_iter().map(str::to_owned).collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn single_agent_prompt_embeds_context_and_question() {
        let prompt = PromptComposer::new().compose(
            &set(vec![("Ricardo", vec!["worked at Acme", "studied physics"])]),
            "What is Ricardo's latest job?",
        );

        assert!(prompt.contains("Ricardo's document"));
        assert!(prompt.contains("worked at Acme\n\nstudied physics"));
        assert!(prompt.contains("Question: What is Ricardo's latest job?"));
        assert!(prompt.contains(SINGLE_DECLINE_PHRASE));
        assert!(prompt.ends_with("Answer:"));
        // Single-agent shape has no labeled sections.
        assert!(!prompt.contains("=== Context for"));
    }

    #[test]
    fn single_agent_prompt_with_empty_context_shows_placeholder() {
        let prompt =
            PromptComposer::new().compose(&set(vec![("Francisco", vec![])]), "Any skills?");
        assert!(prompt.contains(NO_CONTEXT_PLACEHOLDER));
        assert!(prompt.contains(SINGLE_DECLINE_PHRASE));
    }

    #[test]
    fn multi_agent_prompt_lists_agents_and_sections_in_order() {
        let prompt = PromptComposer::new().compose(
            &set(vec![
                ("Jorge", vec!["jorge context"]),
                ("Francisco", vec!["francisco context"]),
            ]),
            "Compare Jorge and Francisco's education.",
        );

        assert!(prompt.contains("documents of: Jorge, Francisco"));
        let jorge = prompt.find(&section_header_for("Jorge")).unwrap();
        let francisco = prompt.find(&section_header_for("Francisco")).unwrap();
        assert!(jorge < francisco, "sections must follow context set order");
        assert!(prompt.contains("jorge context"));
        assert!(prompt.contains("francisco context"));
    }

    #[test]
    fn empty_agent_gets_labeled_placeholder_section() {
        let prompt = PromptComposer::new().compose(
            &set(vec![("Jorge", vec!["jorge context"]), ("Francisco", vec![])]),
            "Compare them.",
        );

        let header = section_header_for("Francisco");
        assert!(prompt.contains(&header), "empty agent must keep its section");
        let after_header = &prompt[prompt.find(&header).unwrap() + header.len()..];
        assert!(
            after_header.trim_start().starts_with(NO_CONTEXT_PLACEHOLDER),
            "section body must be the placeholder, got: {after_header:?}"
        );
    }

    #[test]
    fn templates_are_structurally_distinct() {
        let single = PromptComposer::new().compose(&set(vec![("Jorge", vec!["c"])]), "q");
        let multi = PromptComposer::new().compose(
            &set(vec![("Jorge", vec!["c"]), ("Ricardo", vec!["d"])]),
            "q",
        );
        assert!(!single.contains("=== Context for"));
        assert!(multi.contains("=== Context for Jorge ==="));
        assert!(multi.contains("=== Context for Ricardo ==="));
    }

    #[test]
    fn decline_phrase_names_the_agent() {
        assert_eq!(
            decline_phrase_for("Francisco"),
            "No information found for Francisco."
        );
    }
}
