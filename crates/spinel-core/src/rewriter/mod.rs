// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Pattern-directed rewriters that run on the abstract tree after
//! desugaring.
//!
//! A rewriter recognises a source-level idiom by its lowered shape and
//! replaces it with the declarations the rest of the checker should see:
//!
//! - [`test_dsl`] lifts `describe`/`it`/`before`/`after` blocks into real
//!   class and method definitions, hoisting constants out of the
//!   synthesised method bodies via the constant mover
//! - [`t_enum`] expands the declarative enum-value DSL inside `T::Enum`
//!   subclasses into singleton child classes plus typed assignments
//!
//! Rewriters never abort: a statement that almost matches gets a diagnostic
//! and passes through unchanged. In autogen mode they are no-ops.

pub(crate) mod constant_mover;
pub mod t_enum;
pub mod test_dsl;
