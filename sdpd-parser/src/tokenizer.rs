//! Span Tokenizer
//!
//!     Splits a byte buffer into tokens without copying it. A token is a [Span], a half-open
//!     `[start, end)` pair of byte offsets into the buffer, so the buffer must outlive the
//!     [TokenSequence] and must not change underneath it.
//!
//!     Every delimiter byte ends the current span and the next span starts right after it.
//!     The last span always exists, it is empty when the buffer ends with a delimiter (or
//!     is empty). That gives the invariants the rest of the crate leans on:
//!
//!         - `spans[0].start == 0`
//!         - `spans[i].end + 1 == spans[i + 1].start`
//!         - `spans[n - 1].end == buffer.len()`
//!         - `n == 1 + number of delimiter bytes`
//!
//! Sizing
//!
//!     A full pass writes into a fixed guess of [INITIAL_CAPACITY] spans while counting how
//!     many it actually needs. If the guess was too small the storage grows to the exact
//!     count and the split runs again, which is safe because splitting is deterministic. If
//!     the guess was too large the storage is shrunk to fit. We never pre-scan the buffer
//!     just to size the output and never silently drop spans.
//!
//! Sub-tokenizing
//!
//!     [TokenSequence::subtokenize] re-splits one existing span with a different delimiter
//!     set and puts the pieces where the span was. Offsets stay in buffer coordinates and
//!     the spans after it only move in the sequence, never in the buffer. The metadata
//!     format needs this because its last line is a comma separated run of fields inside an
//!     otherwise newline separated block.

use std::collections::TryReserveError;
use std::fmt;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

/// Initial guess for the number of spans in a full tokenize pass.
pub const INITIAL_CAPACITY: usize = 32;

/// A half-open byte range into a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The bytes this span covers, or `None` if it does not fit in `buffer`.
    pub fn slice<'b>(&self, buffer: &'b [u8]) -> Option<&'b [u8]> {
        buffer.get(self.range())
    }

    fn shifted(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A set of single byte delimiters
#[derive(Clone, PartialEq, Eq)]
pub struct DelimiterSet {
    members: [bool; 256],
    count: usize,
}

impl DelimiterSet {
    pub fn new(delimiters: &[u8]) -> Self {
        let mut members = [false; 256];
        let mut count = 0;
        for &byte in delimiters {
            if !members[usize::from(byte)] {
                members[usize::from(byte)] = true;
                count += 1;
            }
        }
        Self { members, count }
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.members[usize::from(byte)]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&byte| self.contains(byte))
    }
}

impl fmt::Debug for DelimiterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.bytes().map(|byte| char::from(byte).escape_default().to_string()))
            .finish()
    }
}

/// Errors that can occur while tokenizing
#[derive(Debug, Error)]
pub enum TokenizeError {
    /// Without delimiters there is nothing to split on.
    #[error("cannot tokenize without delimiters")]
    NoDelimiters,

    #[error("token index {index} out of range for sequence of {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("span {span} does not fit in a buffer of {len} bytes")]
    SpanOutOfBounds { span: Span, len: usize },

    #[error("unable to allocate token storage: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Ordered spans over one buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenSequence {
    spans: Vec<Span>,
}

impl TokenSequence {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// The bytes of token `index` within `buffer`.
    pub fn slice<'b>(&self, buffer: &'b [u8], index: usize) -> Option<&'b [u8]> {
        self.get(index).and_then(|span| span.slice(buffer))
    }

    /// Index of the first token whose bytes start with `prefix`.
    pub fn position_starting_with(&self, buffer: &[u8], prefix: &[u8]) -> Option<usize> {
        self.spans.iter().position(|span| {
            span.slice(buffer)
                .is_some_and(|bytes| bytes.starts_with(prefix))
        })
    }

    /// Re-split token `index` on `delimiters`, replacing it in place.
    ///
    /// Tokens before `index` are untouched, tokens after it keep their byte offsets and move
    /// back by `pieces - 1` positions. Returns the new sequence length. Every failure is
    /// detected before the sequence is modified.
    pub fn subtokenize(
        &mut self,
        buffer: &[u8],
        delimiters: &DelimiterSet,
        index: usize,
    ) -> Result<usize, TokenizeError> {
        if delimiters.is_empty() {
            return Err(TokenizeError::NoDelimiters);
        }

        let len = self.spans.len();
        let target = self
            .get(index)
            .ok_or(TokenizeError::IndexOutOfRange { index, len })?;
        let region = target.slice(buffer).ok_or(TokenizeError::SpanOutOfBounds {
            span: target,
            len: buffer.len(),
        })?;

        let pieces = split_into(region, delimiters, &mut []);
        let grown = len + pieces - 1;
        self.spans.try_reserve(pieces - 1)?;
        self.spans.resize(grown, Span::default());

        // Trailing spans may overlap their destination, copy_within moves them safely.
        if index + 1 < len {
            self.spans.copy_within(index + 1..len, index + pieces);
        }

        let slots = &mut self.spans[index..index + pieces];
        let written = split_into(region, delimiters, slots);
        debug_assert_eq!(written, pieces);
        for slot in slots.iter_mut() {
            *slot = slot.shifted(target.start);
        }

        debug!(index, pieces, len = grown, "subtokenized span {}", target);
        Ok(grown)
    }
}

impl<'a> IntoIterator for &'a TokenSequence {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Split `buffer` on `delimiters` into a new [TokenSequence].
pub fn tokenize(buffer: &[u8], delimiters: &DelimiterSet) -> Result<TokenSequence, TokenizeError> {
    if delimiters.is_empty() {
        return Err(TokenizeError::NoDelimiters);
    }

    let mut spans = span_storage(INITIAL_CAPACITY)?;
    let needed = split_into(buffer, delimiters, &mut spans);

    if needed > spans.len() {
        spans.try_reserve_exact(needed - spans.len())?;
        spans.resize(needed, Span::default());
        let recount = split_into(buffer, delimiters, &mut spans);
        debug_assert_eq!(recount, needed);
    } else {
        spans.truncate(needed);
        spans.shrink_to_fit();
    }

    debug!(bytes = buffer.len(), tokens = needed, "tokenized buffer");
    Ok(TokenSequence { spans })
}

fn span_storage(capacity: usize) -> Result<Vec<Span>, TokenizeError> {
    let mut spans = Vec::new();
    spans.try_reserve_exact(capacity)?;
    spans.resize(capacity, Span::default());
    Ok(spans)
}

/// Write the spans of `buffer` into `out`, as many as fit, and return how many the whole
/// buffer needs. Offsets are relative to `buffer`.
fn split_into(buffer: &[u8], delimiters: &DelimiterSet, out: &mut [Span]) -> usize {
    let mut count = 0;
    let mut start = 0;

    for (i, &byte) in buffer.iter().enumerate() {
        if delimiters.contains(byte) {
            if let Some(slot) = out.get_mut(count) {
                *slot = Span::new(start, i);
            }
            count += 1;
            start = i + 1;
        }
    }

    if let Some(slot) = out.get_mut(count) {
        *slot = Span::new(start, buffer.len());
    }
    count + 1
}
