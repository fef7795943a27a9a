// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The per-file lowering context.
//!
//! A [`Context`] bundles the shared services (name table, diagnostic sink)
//! with the identity and flavour of the file being lowered. It is a `Copy`
//! bundle of borrows, so passes thread it by value the way the rest of the
//! checker does.

use crate::diagnostics::{Diagnostics, ErrorBuilder, ErrorCode};
use crate::names::{NameTable, WellKnown};
use crate::source_analysis::{FileId, Loc};

/// The flavour of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileKind {
    /// An ordinary source file.
    #[default]
    Source,
    /// A declaration-only interface file (RBI). Method bodies in these files
    /// may not contain executable code.
    Rbi,
}

/// Everything a lowering pass needs about the file it is processing.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// The shared name interner.
    pub names: &'a NameTable,
    /// The shared diagnostic sink.
    pub diagnostics: &'a Diagnostics,
    /// The file being lowered.
    pub file: FileId,
    /// Whether the file is declaration-only.
    pub file_kind: FileKind,
    /// The file's source text (for line lookups; the core never re-parses).
    pub source: &'a str,
    /// True when running under the autogen driver, which skips the DSL
    /// rewriters entirely.
    pub autogen: bool,
}

impl<'a> Context<'a> {
    /// The pre-interned well-known names.
    #[must_use]
    pub fn known(&self) -> &'a WellKnown {
        self.names.known()
    }

    /// Begins an error at `loc`; see [`Diagnostics::begin_error`].
    pub fn begin_error(&self, loc: Loc, code: ErrorCode) -> Option<ErrorBuilder<'a>> {
        self.diagnostics.begin_error(loc, code)
    }

    /// Returns true if the file is declaration-only.
    #[must_use]
    pub fn is_rbi(&self) -> bool {
        self.file_kind == FileKind::Rbi
    }

    /// Returns the 1-based line number containing byte `offset`.
    #[must_use]
    pub fn line_of(&self, offset: u32) -> u32 {
        let offset = (offset as usize).min(self.source.len());
        let newlines = self.source.as_bytes()[..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        u32::try_from(newlines).unwrap_or(u32::MAX - 1) + 1
    }
}
