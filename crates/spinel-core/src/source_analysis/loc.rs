// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Spans, file identities, and locations.
//!
//! A [`Span`] is a byte-offset range within one file. A [`Loc`] pairs a span
//! with a [`FileId`] and additionally distinguishes *non-existent* locations:
//! nodes synthesised by the lowering that have no source text of their own
//! carry a non-existent `Loc` so editor features never map to them. A span
//! may be zero-length; that is still an existent location (it pins an exact
//! point in the file, e.g. the implicit `self` receiver of a bare send).

use std::ops::Range;

/// An opaque identity for a source file.
///
/// File contents and paths are owned by the driver; the lowering core only
/// ever compares and copies file ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileId(pub u32);

/// A span of source code, represented as a byte offset range.
///
/// # Examples
///
/// ```
/// use spinel_core::source_analysis::Span;
///
/// let span = Span::new(0, 10);
/// assert_eq!(span.start(), 0);
/// assert_eq!(span.end(), 10);
/// assert_eq!(span.len(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Returns the end byte offset (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Creates a span that covers both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Converts to a `Range<usize>` for indexing into source text.
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Range<u32>> for Span {
    fn from(range: Range<u32>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start as usize, span.len() as usize).into()
    }
}

/// A source location: a file plus an optional span within it.
///
/// A `Loc` with no span is *non-existent*. Non-existent locations are
/// reserved for synthesised helper nodes (e.g. the block argument appended
/// to a method that declared none); every node that corresponds to source
/// text, however indirectly, must carry an existent loc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc {
    file: FileId,
    span: Option<Span>,
}

impl Loc {
    /// Creates an existent location covering `span` in `file`.
    #[must_use]
    pub const fn new(file: FileId, span: Span) -> Self {
        Self {
            file,
            span: Some(span),
        }
    }

    /// Creates the non-existent location for `file`.
    #[must_use]
    pub const fn none(file: FileId) -> Self {
        Self { file, span: None }
    }

    /// Returns the file this location belongs to.
    #[must_use]
    pub const fn file(self) -> FileId {
        self.file
    }

    /// Returns the span, or `None` for a non-existent location.
    #[must_use]
    pub const fn span(self) -> Option<Span> {
        self.span
    }

    /// Returns true if this location maps to source text.
    #[must_use]
    pub const fn exists(self) -> bool {
        self.span.is_some()
    }

    /// Collapses this location to a zero-length span at its start offset.
    ///
    /// Desugar-produced nodes that do not correspond to any source text of
    /// their own (the receiver of an implicit-self send, safe-navigation
    /// temporaries) carry zero-length locs so editors skip them when mapping
    /// a text position to a node. A non-existent loc stays non-existent.
    #[must_use]
    pub fn copy_with_zero_length(self) -> Self {
        Self {
            file: self.file,
            span: self.span.map(|s| Span::new(s.start(), s.start())),
        }
    }

    /// Creates a location covering both `self` and `other`.
    ///
    /// If either side is non-existent, the other side wins.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        debug_assert_eq!(self.file, other.file, "merging locs across files");
        let span = match (self.span, other.span) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        };
        Self {
            file: self.file,
            span,
        }
    }
}
