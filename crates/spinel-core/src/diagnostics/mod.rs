// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Located diagnostics and the collecting sink.
//!
//! User-facing problems found during lowering never abort the pass: the pass
//! emits a [`Diagnostic`] through [`Diagnostics::begin_error`] and continues
//! with a conservative substitution (usually an empty tree). A diagnostic
//! carries a primary location, a header message, optional additional located
//! notes, and optional replacement fix-its for editors.
//!
//! `begin_error` returns `None` when the requested code is suppressed for
//! this run (the driver configures suppression, e.g. for generated files);
//! the caller skips the message body and continues identically either way:
//!
//! ```
//! # use spinel_core::diagnostics::{Diagnostics, ErrorCode};
//! # use spinel_core::source_analysis::{FileId, Loc, Span};
//! # let sink = Diagnostics::new();
//! # let loc = Loc::new(FileId(0), Span::new(0, 3));
//! if let Some(mut e) = sink.begin_error(loc, ErrorCode::UnsupportedNode) {
//!     e.set_header("Unsupported node type `Redo`");
//! }
//! ```
//!
//! The builder commits its diagnostic to the sink when dropped.

use std::collections::HashSet;
use std::sync::Mutex;

use ecow::EcoString;

use crate::source_analysis::Loc;

/// The stable error-code catalogue.
///
/// The numeric values are an ABI shared with editors and test tooling; codes
/// are never renumbered, only added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// A structural invariant was violated inside the lowering itself.
    InternalError = 1001,

    /// A parse-tree node kind the lowering does not support.
    UnsupportedNode = 3001,
    /// Executable code in a declaration-only (RBI) file.
    CodeInRbi = 3002,
    /// Compound assignment to a constant.
    NoConstantReassignment = 3003,
    /// A rest argument inside a destructuring assignment.
    UnsupportedRestArgsDestructure = 3004,
    /// `def x.f` or `class << x` for an `x` other than `self`.
    InvalidSingletonDef = 3005,
    /// An integer literal outside the representable range.
    IntegerOutOfRange = 3006,
    /// A float literal outside the representable range.
    FloatOutOfRange = 3007,
    /// `yield` in a method that declares no block parameter.
    UnnamedBlockParameter = 3008,
    /// Use of `undef`.
    UndefUsage = 3009,

    /// A constant on an enum class that is not an enum value.
    TEnumConstNotEnumValue = 3501,
    /// An enum value defined outside the `enums do` block.
    TEnumOutsideEnumsDo = 3502,
}

impl ErrorCode {
    /// Returns the stable numeric value of this code.
    #[must_use]
    pub const fn value(self) -> u16 {
        self as u16
    }
}

/// An additional located note attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNote {
    /// Where the note points.
    pub loc: Loc,
    /// The note text.
    pub message: EcoString,
}

/// A replacement fix-it attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// A short label for the edit (e.g. "Delete the body").
    pub label: EcoString,
    /// The range to replace.
    pub loc: Loc,
    /// The replacement text (may be empty, meaning deletion).
    pub text: EcoString,
}

/// A single located diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The catalogue code.
    pub code: ErrorCode,
    /// The primary location.
    pub loc: Loc,
    /// The headline message.
    pub header: EcoString,
    /// Additional located notes, in emission order.
    pub notes: Vec<ErrorNote>,
    /// Suggested replacements, in emission order.
    pub replacements: Vec<Replacement>,
}

/// The collecting diagnostic sink.
///
/// Shared by every file being lowered; interior synchronisation keeps
/// `begin_error` callable from per-file threads.
#[derive(Default)]
pub struct Diagnostics {
    collected: Mutex<Vec<Diagnostic>>,
    suppressed: HashSet<ErrorCode>,
}

impl Diagnostics {
    /// Creates a sink with no codes suppressed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that drops diagnostics with the given codes.
    #[must_use]
    pub fn with_suppressed(codes: impl IntoIterator<Item = ErrorCode>) -> Self {
        Self {
            collected: Mutex::new(Vec::new()),
            suppressed: codes.into_iter().collect(),
        }
    }

    /// Begins an error at `loc`, or returns `None` if `code` is suppressed.
    ///
    /// The returned builder commits when dropped; callers that get `None`
    /// must continue as if the error had been recorded.
    pub fn begin_error(&self, loc: Loc, code: ErrorCode) -> Option<ErrorBuilder<'_>> {
        if self.suppressed.contains(&code) {
            return None;
        }
        Some(ErrorBuilder {
            sink: self,
            diagnostic: Diagnostic {
                code,
                loc,
                header: EcoString::new(),
                notes: Vec::new(),
                replacements: Vec::new(),
            },
        })
    }

    /// Returns the number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drains the collected diagnostics in source-location order.
    ///
    /// Emission order follows traversal order; sorting here gives the
    /// deterministic, location-ordered output the driver prints.
    pub fn drain_sorted(&self) -> Vec<Diagnostic> {
        let mut collected = std::mem::take(&mut *self.lock());
        collected.sort_by_key(|d| {
            (
                d.loc.file().0,
                d.loc.span().map_or(u32::MAX, |s| s.start()),
                d.code.value(),
            )
        });
        collected
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.collected
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn commit(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

/// An in-flight diagnostic; commits to the sink on drop.
pub struct ErrorBuilder<'a> {
    sink: &'a Diagnostics,
    diagnostic: Diagnostic,
}

impl ErrorBuilder<'_> {
    /// Sets the headline message.
    pub fn set_header(&mut self, header: impl Into<EcoString>) {
        self.diagnostic.header = header.into();
    }

    /// Appends a located note.
    pub fn add_error_line(&mut self, loc: Loc, message: impl Into<EcoString>) {
        self.diagnostic.notes.push(ErrorNote {
            loc,
            message: message.into(),
        });
    }

    /// Appends a replacement fix-it.
    pub fn replace_with(
        &mut self,
        label: impl Into<EcoString>,
        loc: Loc,
        text: impl Into<EcoString>,
    ) {
        self.diagnostic.replacements.push(Replacement {
            label: label.into(),
            loc,
            text: text.into(),
        });
    }
}

impl Drop for ErrorBuilder<'_> {
    fn drop(&mut self) {
        let diagnostic = Diagnostic {
            code: self.diagnostic.code,
            loc: self.diagnostic.loc,
            header: std::mem::take(&mut self.diagnostic.header),
            notes: std::mem::take(&mut self.diagnostic.notes),
            replacements: std::mem::take(&mut self.diagnostic.replacements),
        };
        self.sink.commit(diagnostic);
    }
}
