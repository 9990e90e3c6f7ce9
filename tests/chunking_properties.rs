//! Property tests for the chunker's reassembly guarantees.
//!
//! The load-bearing property: dropping each chunk's overlap with its
//! predecessor and concatenating what remains reproduces the source text
//! exactly. No characters are lost or duplicated outside the declared
//! overlap regions.

#[macro_use]
extern crate proptest;

use proptest::prelude::{Strategy, prop};

use dossier::{ChunkingConfig, RecursiveChunker};

/// Résumé-flavored text: words, sentences, bullets, section headers, and
/// the occasional non-ASCII run, mixed freely.
fn text_strategy() -> impl Strategy<Value = String> {
    let fragment = prop::string::string_regex(
        "([A-Za-zÁÉÍáéíñü0-9]{1,12}[ ]){0,8}[A-Za-z0-9]{1,12}",
    )
    .unwrap();
    let glue = prop::sample::select(vec![
        " ".to_owned(),
        ". ".to_owned(),
        "\n".to_owned(),
        "\n- ".to_owned(),
        "\n•".to_owned(),
        "\n## ".to_owned(),
        "\n### ".to_owned(),
    ]);
    prop::collection::vec((fragment, glue), 0..40).prop_map(|parts| {
        parts
            .into_iter()
            .flat_map(|(fragment, glue)| [fragment, glue])
            .collect()
    })
}

fn chunker_strategy() -> impl Strategy<Value = RecursiveChunker> {
    (20usize..200, 0usize..15).prop_map(|(size, overlap)| {
        RecursiveChunker::new(
            ChunkingConfig::default()
                .with_chunk_size(size)
                .with_chunk_overlap(overlap),
        )
        .unwrap()
    })
}

proptest! {
    #[test]
    fn reassembly_reproduces_the_source(
        text in text_strategy(),
        chunker in chunker_strategy(),
    ) {
        let spans = chunker.chunk_spans(&text);
        if text.is_empty() {
            prop_assert!(spans.is_empty());
            return Ok(());
        }

        // Spans cover the text with no gaps.
        prop_assert_eq!(spans.first().map(|s| s.start), Some(0));
        prop_assert_eq!(spans.last().map(|s| s.end), Some(text.len()));

        // Dropping each span's overlap with its predecessor reassembles
        // the source byte-for-byte.
        let mut rebuilt = String::new();
        let mut covered = 0usize;
        for span in &spans {
            prop_assert!(span.start <= covered, "gap before span at {}", span.start);
            if span.end > covered {
                rebuilt.push_str(&text[covered..span.end]);
                covered = span.end;
            }
        }
        prop_assert_eq!(rebuilt, text.clone());
    }

    #[test]
    fn chunks_respect_size_and_overlap_bounds(
        text in text_strategy(),
        chunker in chunker_strategy(),
    ) {
        let spans = chunker.chunk_spans(&text);
        let size = chunker.config().chunk_size;
        let overlap = chunker.config().chunk_overlap;

        for span in &spans {
            let chars = text[span.start..span.end].chars().count();
            prop_assert!(chars <= size, "chunk of {chars} chars exceeds {size}");
        }
        for pair in spans.windows(2) {
            prop_assert!(pair[1].start <= pair[0].end);
            let shared = text[pair[1].start..pair[0].end].chars().count();
            prop_assert!(
                shared <= overlap,
                "overlap of {shared} chars exceeds configured {overlap}"
            );
        }
    }

    #[test]
    fn chunk_strings_match_their_spans(
        text in text_strategy(),
        chunker in chunker_strategy(),
    ) {
        let chunks = chunker.chunk(&text);
        let spans = chunker.chunk_spans(&text);
        prop_assert_eq!(chunks.len(), spans.len());
        for (chunk, span) in chunks.iter().zip(&spans) {
            prop_assert_eq!(chunk.as_str(), &text[span.start..span.end]);
        }
    }
}
