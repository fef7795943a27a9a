// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Spinel type checker front-end lowering core.
//!
//! This crate contains the first half of the Spinel pipeline:
//! - The parse-tree data model ([`parse`]) — the concrete syntax produced
//!   by the parser, which lives in a sibling crate
//! - The abstract tree kernel ([`ast`]) — the small node set every later
//!   pass consumes
//! - Desugaring ([`desugar`]) — the total, node-kind-directed translation
//!   from parse tree to abstract tree
//! - Rewriters ([`rewriter`]) — pattern-directed transforms that run on the
//!   abstract tree after desugaring (test DSL lifting, enum expansion)
//!
//! The pipeline for a single file is strictly forward:
//!
//! ```text
//! parse tree ──► desugar ──► kernel AT ──► rewriters ──► rewritten AT
//! ```
//!
//! Each pass takes an owned tree and returns an owned tree. User-facing
//! problems become diagnostics through [`diagnostics::Diagnostics`]; only
//! structural invariant violations abort a file, via
//! [`desugar::InternalError`]. Lowering is single-threaded per file; the
//! name table and diagnostic sink tolerate concurrent callers so files can
//! be lowered in parallel.

pub mod ast;
pub mod context;
pub mod desugar;
pub mod diagnostics;
pub mod names;
pub mod parse;
pub mod rewriter;
pub mod source_analysis;
pub mod symbols;

#[cfg(test)]
mod test_support;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Expression, LiteralValue};
    pub use crate::context::Context;
    pub use crate::diagnostics::{Diagnostics, ErrorCode};
    pub use crate::names::{NameRef, NameTable};
    pub use crate::parse::{Node, NodeKind};
    pub use crate::source_analysis::{FileId, Loc, Span};
    pub use crate::symbols::Symbol;
}
