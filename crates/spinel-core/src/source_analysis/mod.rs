// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Every tree node — parse tree and abstract tree alike — carries a [`Loc`]
//! identifying the file and byte range it came from. Locations power error
//! reporting and the editor features downstream of the checker.

mod loc;

pub use loc::{FileId, Loc, Span};
