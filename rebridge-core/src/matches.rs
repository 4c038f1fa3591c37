//! Match results
//!
//! A [`Match`] is an immutable snapshot of one successful search. It keeps
//! the byte regions the engine reported and translates them into character
//! regions on first access. [`Matches`] drives repeated searches over one
//! subject.

use crate::backend::RustRegexEngine;
use crate::encoding::Encoding;
use crate::error::{RegexError, Result};
use crate::native::{ByteRegions, NativeRegexEngine, missing_overall_match};
use crate::pattern::Pattern;
use crate::view::EncodedView;
use std::cell::OnceCell;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;
use std::sync::Arc;
use tracing::trace;

/// A half-open interval `[begin, end)`, in bytes or in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    /// Start offset (inclusive)
    pub begin: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl Region {
    /// Create a new region
    pub const fn new(begin: usize, end: usize) -> Self {
        Region { begin, end }
    }

    /// Length of the region
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// Check if the region is zero-width
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// The region as a range
    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.begin, self.end)
    }
}

/// One successful search
pub struct Match<'p, E: NativeRegexEngine = RustRegexEngine> {
    pattern: &'p Pattern<E>,
    view: Arc<EncodedView>,
    whole: Region,
    byte_regions: ByteRegions,
    span: OnceCell<Region>,
    char_regions: OnceCell<Vec<Option<Region>>>,
}

impl<'p, E: NativeRegexEngine> Match<'p, E> {
    pub(crate) fn new(
        pattern: &'p Pattern<E>,
        view: Arc<EncodedView>,
        byte_regions: ByteRegions,
    ) -> Result<Self> {
        let whole = byte_regions
            .first()
            .copied()
            .flatten()
            .ok_or_else(missing_overall_match)?;
        Ok(Match {
            pattern,
            view,
            whole,
            byte_regions,
            span: OnceCell::new(),
            char_regions: OnceCell::new(),
        })
    }

    fn to_chars(&self, region: Region) -> Region {
        Region::new(
            self.view.byte_offset_to_char_offset(region.begin),
            self.view.byte_offset_to_char_offset(region.end),
        )
    }

    /// Character offset where the match starts
    pub fn start(&self) -> usize {
        self.region().begin
    }

    /// Character offset where the match ends
    pub fn end(&self) -> usize {
        self.region().end
    }

    /// Character region of the whole match
    pub fn region(&self) -> Region {
        *self.span.get_or_init(|| self.to_chars(self.whole))
    }

    /// Character regions of every group, `None` where a group did not take part
    pub fn regions(&self) -> &[Option<Region>] {
        self.char_regions.get_or_init(|| {
            self.byte_regions
                .iter()
                .map(|region| region.map(|r| self.to_chars(r)))
                .collect()
        })
    }

    /// Byte region of the whole match, in [`Match::encoding`]
    pub fn byte_region(&self) -> Region {
        self.whole
    }

    /// Byte regions as reported by the engine
    pub fn byte_regions(&self) -> &[Option<Region>] {
        &self.byte_regions
    }

    /// Number of groups, including group 0
    pub fn group_count(&self) -> usize {
        self.byte_regions.len()
    }

    /// The matched text
    pub fn as_str(&self) -> &str {
        self.view
            .substring_by_byte_offset(self.whole.begin, self.whole.end)
    }

    /// Text of group `index`
    pub fn group(&self, index: usize) -> Result<&str> {
        let region = self
            .byte_regions
            .get(index)
            .copied()
            .flatten()
            .ok_or(RegexError::InvalidGroupIndex(index))?;
        Ok(self.view.substring_by_byte_offset(region.begin, region.end))
    }

    /// Texts of every group named `name`, in group order
    pub fn named_group(&self, name: &str) -> Result<Vec<&str>> {
        self.pattern
            .group_numbers_by_name(name)?
            .into_iter()
            .map(|index| self.group(index))
            .collect()
    }

    /// Texts of all groups; `None` where a group did not take part
    pub fn groups(&self) -> Vec<Option<&str>> {
        (0..self.byte_regions.len())
            .map(|index| self.group(index).ok())
            .collect()
    }

    /// The pattern that produced this match
    pub fn pattern(&self) -> &'p Pattern<E> {
        self.pattern
    }

    /// The encoding the search ran in
    pub fn encoding(&self) -> Encoding {
        self.view.encoding()
    }

    /// The full subject text
    pub fn subject(&self) -> &str {
        self.view.text()
    }
}

impl<E: NativeRegexEngine> fmt::Display for Match<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Match region={}, match={:?}>", self.region(), self.as_str())
    }
}

impl<E: NativeRegexEngine> fmt::Debug for Match<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("region", &self.region())
            .field("byte_regions", &self.byte_regions)
            .field("encoding", &self.encoding())
            .field("text", &self.as_str())
            .finish()
    }
}

/// Iteration state over one subject, independent of the pattern borrow
///
/// The first search always runs, even on an empty subject; later searches
/// run only while the cursor is inside the buffer. The cursor moves to the
/// end of each match, and one character further after a zero-width match.
/// A cursor must only be advanced with the pattern that created it.
pub struct MatchCursor<E: NativeRegexEngine = RustRegexEngine> {
    view: Arc<EncodedView>,
    scratch: E::Scratch,
    cursor: usize,
    started: bool,
    done: bool,
}

impl<E: NativeRegexEngine> MatchCursor<E> {
    pub(crate) fn new(view: Arc<EncodedView>, scratch: E::Scratch, cursor: usize) -> Self {
        MatchCursor {
            view,
            scratch,
            cursor,
            started: false,
            done: false,
        }
    }

    /// The encoding the iteration runs in
    pub fn encoding(&self) -> Encoding {
        self.view.encoding()
    }

    /// Current byte cursor
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether iteration has ended
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Run the next search
    pub fn advance<'p>(&mut self, pattern: &'p Pattern<E>) -> Option<Result<Match<'p, E>>> {
        if self.done {
            return None;
        }
        if self.started && self.cursor >= self.view.len() {
            self.done = true;
            return None;
        }
        self.started = true;

        match pattern.search_prepared(&self.view, &self.scratch, self.cursor) {
            Ok(Some(found)) => {
                let whole = found.byte_region();
                let next = if whole.is_empty() {
                    self.view.next_char_boundary(whole.end)
                } else {
                    whole.end
                };
                self.cursor = next.max(self.view.next_char_boundary(self.cursor));
                trace!(cursor = self.cursor, "advanced iteration cursor");
                Some(Ok(found))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Lazy iterator over successive non-overlapping matches
pub struct Matches<'p, E: NativeRegexEngine = RustRegexEngine> {
    pattern: &'p Pattern<E>,
    state: MatchCursor<E>,
}

impl<'p, E: NativeRegexEngine> Matches<'p, E> {
    pub(crate) fn new(pattern: &'p Pattern<E>, state: MatchCursor<E>) -> Self {
        Matches { pattern, state }
    }

    /// The encoding the iteration runs in
    pub fn encoding(&self) -> Encoding {
        self.state.encoding()
    }

    /// Current byte cursor
    pub fn cursor(&self) -> usize {
        self.state.cursor()
    }
}

impl<'p, E: NativeRegexEngine> Iterator for Matches<'p, E> {
    type Item = Result<Match<'p, E>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.advance(self.pattern)
    }
}

impl<E: NativeRegexEngine> FusedIterator for Matches<'_, E> {}
