// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Name interning.
//!
//! Every identifier, selector, string literal, and constant name that flows
//! through the lowering is interned into a [`NameTable`] and handled as an
//! opaque [`NameRef`]. Interning the same text twice yields the same ref, so
//! name equality is a `u32` compare.
//!
//! The table holds three keyspaces:
//!
//! - **UTF-8 names** — identifiers, selectors, string contents.
//! - **Constant names** — constant identifiers (`Foo` in `Foo::Bar`). These
//!   are interned separately so a constant `x` and a local `x` never compare
//!   equal.
//! - **Unique names** — hygienic temporaries minted by
//!   [`NameTable::fresh_unique`], keyed by `(kind, base, counter)`. Because
//!   they live in their own keyspace, a unique name can never collide with
//!   any name a user could write, no matter what its display text looks
//!   like.
//!
//! The table is shared by every file being lowered; all methods take
//! `&self` and synchronise internally, so per-file lowering threads can
//! intern concurrently.

use std::collections::HashMap;
use std::sync::Mutex;

use ecow::{EcoString, eco_format};

/// An opaque handle to an interned name.
///
/// Refs are only meaningful relative to the [`NameTable`] that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameRef(u32);

/// The provenance tag of a unique name.
///
/// Part of the unique-name key: temporaries minted by different subsystems
/// with the same base and counter stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueNameKind {
    /// Temporaries minted while desugaring (`$t`-style scratch locals).
    Desugar,
    /// Singleton class names minted by the enum rewriter.
    TEnum,
}

enum NameData {
    Utf8(EcoString),
    Constant(EcoString),
    Unique {
        kind: UniqueNameKind,
        base: NameRef,
        counter: u32,
    },
}

#[derive(Default)]
struct Inner {
    entries: Vec<NameData>,
    utf8: HashMap<EcoString, NameRef>,
    constants: HashMap<EcoString, NameRef>,
    uniques: HashMap<(UniqueNameKind, NameRef, u32), NameRef>,
}

impl Inner {
    fn push(&mut self, data: NameData) -> NameRef {
        let id = u32::try_from(self.entries.len()).expect("name table overflow");
        self.entries.push(data);
        NameRef(id)
    }

    fn intern_utf8(&mut self, text: &str) -> NameRef {
        if let Some(&name) = self.utf8.get(text) {
            return name;
        }
        let text = EcoString::from(text);
        let name = self.push(NameData::Utf8(text.clone()));
        self.utf8.insert(text, name);
        name
    }

    fn intern_constant(&mut self, text: &str) -> NameRef {
        if let Some(&name) = self.constants.get(text) {
            return name;
        }
        let text = EcoString::from(text);
        let name = self.push(NameData::Constant(text.clone()));
        self.constants.insert(text, name);
        name
    }
}

/// The process-wide name interner.
pub struct NameTable {
    inner: Mutex<Inner>,
    known: WellKnown,
}

impl NameTable {
    /// Creates a table with the well-known names pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner::default();
        let known = WellKnown::intern(&mut inner);
        Self {
            inner: Mutex::new(inner),
            known,
        }
    }

    /// The pre-interned well-known names.
    #[must_use]
    pub fn known(&self) -> &WellKnown {
        &self.known
    }

    /// Interns a UTF-8 name (identifier, selector, or string contents).
    pub fn intern_utf8(&self, text: &str) -> NameRef {
        self.lock().intern_utf8(text)
    }

    /// Interns a constant name.
    pub fn intern_constant(&self, text: &str) -> NameRef {
        self.lock().intern_constant(text)
    }

    /// Mints (or re-derives) the unique name `(kind, base, counter)`.
    ///
    /// The same triple always yields the same ref, so passes that re-run are
    /// deterministic; distinct triples always yield distinct refs, and no
    /// unique ref ever equals a ref returned by `intern_utf8` or
    /// `intern_constant`.
    pub fn fresh_unique(&self, kind: UniqueNameKind, base: NameRef, counter: u32) -> NameRef {
        let mut inner = self.lock();
        if let Some(&name) = inner.uniques.get(&(kind, base, counter)) {
            return name;
        }
        let name = inner.push(NameData::Unique {
            kind,
            base,
            counter,
        });
        inner.uniques.insert((kind, base, counter), name);
        name
    }

    /// Returns the display text of a name.
    ///
    /// UTF-8 and constant names show their interned text; unique names show
    /// as `base$counter`, which is purely cosmetic — their identity is the
    /// `(kind, base, counter)` key, not the text.
    pub fn show(&self, name: NameRef) -> EcoString {
        let inner = self.lock();
        show_in(&inner, name)
    }

    /// Interns the writer selector for `name`: `foo` becomes `foo=`.
    pub fn add_eq(&self, name: NameRef) -> NameRef {
        let mut inner = self.lock();
        let text = eco_format!("{}=", show_in(&inner, name));
        inner.intern_utf8(&text)
    }

    /// Returns true if `name` came from [`NameTable::fresh_unique`].
    pub fn is_unique(&self, name: NameRef) -> bool {
        matches!(
            self.lock().entries[name.0 as usize],
            NameData::Unique { .. }
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means another lowering thread panicked; the table
        // itself is append-only and still structurally sound.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

fn show_in(inner: &Inner, name: NameRef) -> EcoString {
    match &inner.entries[name.0 as usize] {
        NameData::Utf8(text) | NameData::Constant(text) => text.clone(),
        NameData::Unique { base, counter, .. } => {
            eco_format!("{}${counter}", show_in(inner, *base))
        }
    }
}

/// Names the lowering refers to by identity.
///
/// Selector names the desugared output calls (`to_s`, `concat`, …), the
/// canonical synthesised-parameter names, the bases unique temporaries are
/// derived from, and the constant names the rewriters pattern-match on.
/// All are interned once at table construction.
#[expect(missing_docs, reason = "fields are the names they are named after")]
pub struct WellKnown {
    // Keywords and synthesised parameters.
    pub self_: NameRef,
    pub blk_arg: NameRef,

    // Bases for unique temporaries.
    pub assign_temp: NameRef,
    pub destructure_arg: NameRef,
    pub block_pass_temp: NameRef,
    pub rescue_temp: NameRef,
    pub for_temp: NameRef,
    pub and_and: NameRef,
    pub or_or: NameRef,

    // Selectors the desugared output calls.
    pub to_s: NameRef,
    pub to_a: NameRef,
    pub to_h: NameRef,
    pub concat: NameRef,
    pub merge: NameRef,
    pub intern: NameRef,
    pub call: NameRef,
    pub new: NameRef,
    pub each: NameRef,
    pub slice: NameRef,
    pub square_brackets: NameRef,
    pub eq_eq: NameRef,
    pub triple_eq: NameRef,
    pub bang: NameRef,
    pub or_op: NameRef,
    pub super_: NameRef,
    pub alias_method: NameRef,
    pub undef: NameRef,
    pub backtick: NameRef,
    pub block_given_p: NameRef,

    // Helpers on the internal `Magic` namespace.
    pub call_with_splat: NameRef,
    pub call_with_splat_and_block: NameRef,
    pub call_with_block: NameRef,
    pub expand_splat: NameRef,
    pub defined_p: NameRef,
    pub self_new: NameRef,

    // Type-system surface recognised or emitted by the rewriters.
    pub let_: NameRef,
    pub unsafe_: NameRef,
    pub sig: NameRef,
    pub void: NameRef,
    pub params: NameRef,
    pub include: NameRef,
    pub extend: NameRef,
    pub instance: NameRef,
    pub abstract_bang: NameRef,
    pub sealed_bang: NameRef,
    pub final_bang: NameRef,
    pub const_set: NameRef,

    // Test-DSL selectors.
    pub describe: NameRef,
    pub it: NameRef,
    pub before: NameRef,
    pub after: NameRef,
    pub enums: NameRef,
    pub initialize: NameRef,
    pub after_angles: NameRef,

    // Miscellaneous.
    pub empty: NameRef,
    pub current_file: NameRef,
    pub singleton_class: NameRef,

    // Constant names recognised structurally.
    pub cnst_t: NameRef,
    pub cnst_enum: NameRef,
}

impl WellKnown {
    fn intern(inner: &mut Inner) -> Self {
        Self {
            self_: inner.intern_utf8("self"),
            blk_arg: inner.intern_utf8("blkArg"),

            assign_temp: inner.intern_utf8("<assignTemp>"),
            destructure_arg: inner.intern_utf8("<destructure>"),
            block_pass_temp: inner.intern_utf8("<blockPassTemp>"),
            rescue_temp: inner.intern_utf8("<rescueTemp>"),
            for_temp: inner.intern_utf8("<forTemp>"),
            and_and: inner.intern_utf8("<andAnd>"),
            or_or: inner.intern_utf8("<orOr>"),

            to_s: inner.intern_utf8("to_s"),
            to_a: inner.intern_utf8("to_a"),
            to_h: inner.intern_utf8("to_h"),
            concat: inner.intern_utf8("concat"),
            merge: inner.intern_utf8("merge"),
            intern: inner.intern_utf8("intern"),
            call: inner.intern_utf8("call"),
            new: inner.intern_utf8("new"),
            each: inner.intern_utf8("each"),
            slice: inner.intern_utf8("slice"),
            square_brackets: inner.intern_utf8("[]"),
            eq_eq: inner.intern_utf8("=="),
            triple_eq: inner.intern_utf8("==="),
            bang: inner.intern_utf8("!"),
            or_op: inner.intern_utf8("|"),
            super_: inner.intern_utf8("super"),
            alias_method: inner.intern_utf8("alias_method"),
            undef: inner.intern_utf8("undef"),
            backtick: inner.intern_utf8("`"),
            block_given_p: inner.intern_utf8("block_given?"),

            call_with_splat: inner.intern_utf8("<call-with-splat>"),
            call_with_splat_and_block: inner.intern_utf8("<call-with-splat-and-block>"),
            call_with_block: inner.intern_utf8("<call-with-block>"),
            expand_splat: inner.intern_utf8("<expand-splat>"),
            defined_p: inner.intern_utf8("<defined?>"),
            self_new: inner.intern_utf8("<self-new>"),

            let_: inner.intern_utf8("let"),
            unsafe_: inner.intern_utf8("unsafe"),
            sig: inner.intern_utf8("sig"),
            void: inner.intern_utf8("void"),
            params: inner.intern_utf8("params"),
            include: inner.intern_utf8("include"),
            extend: inner.intern_utf8("extend"),
            instance: inner.intern_utf8("instance"),
            abstract_bang: inner.intern_utf8("abstract!"),
            sealed_bang: inner.intern_utf8("sealed!"),
            final_bang: inner.intern_utf8("final!"),
            const_set: inner.intern_utf8("const_set"),

            describe: inner.intern_utf8("describe"),
            it: inner.intern_utf8("it"),
            before: inner.intern_utf8("before"),
            after: inner.intern_utf8("after"),
            enums: inner.intern_utf8("enums"),
            initialize: inner.intern_utf8("initialize"),
            after_angles: inner.intern_utf8("<after>"),

            empty: inner.intern_utf8(""),
            current_file: inner.intern_utf8("__FILE__"),
            singleton_class: inner.intern_utf8("<singleton>"),

            cnst_t: inner.intern_constant("T"),
            cnst_enum: inner.intern_constant("Enum"),
        }
    }
}
