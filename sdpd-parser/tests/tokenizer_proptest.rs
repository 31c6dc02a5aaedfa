//! Property-based tests for the span tokenizer
//!
//! These check the structural invariants every consumer relies on:
//! - spans are contiguous, ordered and cover the whole buffer
//! - the span count is one more than the number of delimiter bytes
//! - sub-tokenizing one span leaves every other span where it was

use proptest::prelude::*;
use sdpd_parser::tokenizer::{tokenize, DelimiterSet, Span, TokenSequence};

/// Buffers dense in the delimiters we use so splits actually happen
fn buffer_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::sample::select(b"abc xyz:".to_vec()),
            1 => Just(b'\n'),
            1 => Just(b','),
            1 => any::<u8>(),
        ],
        0..200,
    )
}

fn delimiter_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(b'\n'), Just(b','), Just(b' '), any::<u8>()],
        1..4,
    )
}

/// Rebuild the buffer from the spans and the single delimiter byte after each one
fn reconstruct(buffer: &[u8], tokens: &TokenSequence) -> Vec<u8> {
    let mut rebuilt = Vec::with_capacity(buffer.len());
    for (i, span) in tokens.iter().enumerate() {
        rebuilt.extend_from_slice(span.slice(buffer).unwrap());
        if i + 1 < tokens.len() {
            rebuilt.push(buffer[span.end]);
        }
    }
    rebuilt
}

proptest! {
    #[test]
    fn tokenize_reconstructs_buffer(buffer in buffer_strategy(), delims in delimiter_strategy()) {
        let set = DelimiterSet::new(&delims);
        let tokens = tokenize(&buffer, &set).unwrap();

        prop_assert_eq!(reconstruct(&buffer, &tokens), buffer.clone());

        let delimiter_count = buffer.iter().filter(|&&b| set.contains(b)).count();
        prop_assert_eq!(tokens.len(), delimiter_count + 1);
    }

    #[test]
    fn tokenize_spans_are_contiguous(buffer in buffer_strategy(), delims in delimiter_strategy()) {
        let set = DelimiterSet::new(&delims);
        let tokens = tokenize(&buffer, &set).unwrap();
        let spans = tokens.as_slice();

        prop_assert_eq!(spans[0].start, 0);
        prop_assert_eq!(spans[spans.len() - 1].end, buffer.len());
        for pair in spans.windows(2) {
            prop_assert_eq!(pair[0].end + 1, pair[1].start);
            prop_assert!(set.contains(buffer[pair[0].end]));
        }
        for span in spans {
            prop_assert!(span.slice(&buffer).unwrap().iter().all(|&b| !set.contains(b)));
        }
    }

    #[test]
    fn tokenize_is_deterministic(buffer in buffer_strategy()) {
        let set = DelimiterSet::new(b"\n,");
        prop_assert_eq!(tokenize(&buffer, &set).unwrap(), tokenize(&buffer, &set).unwrap());
    }

    #[test]
    fn subtokenize_preserves_neighbours(buffer in buffer_strategy(), pick in any::<prop::sample::Index>()) {
        let lines = DelimiterSet::new(b"\n");
        let commas = DelimiterSet::new(b",");
        let mut tokens = tokenize(&buffer, &lines).unwrap();
        let before: Vec<Span> = tokens.as_slice().to_vec();
        let n = before.len();
        let i = pick.index(n);

        let target = before[i];
        let pieces = target.slice(&buffer).unwrap().iter().filter(|&&b| b == b',').count() + 1;

        let new_len = tokens.subtokenize(&buffer, &commas, i).unwrap();
        let after = tokens.as_slice();

        prop_assert_eq!(new_len, n + pieces - 1);
        prop_assert_eq!(after.len(), new_len);
        prop_assert_eq!(&after[..i], &before[..i]);
        prop_assert_eq!(&after[i + pieces..], &before[i + 1..]);

        // The pieces cover exactly the replaced span
        prop_assert_eq!(after[i].start, target.start);
        prop_assert_eq!(after[i + pieces - 1].end, target.end);
        for pair in after[i..i + pieces].windows(2) {
            prop_assert_eq!(pair[0].end + 1, pair[1].start);
            prop_assert_eq!(buffer[pair[0].end], b',');
        }
    }
}
