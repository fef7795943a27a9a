// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The abstract tree (AT) kernel.
//!
//! Everything after desugaring — rewriters, resolution, inference — works on
//! this closed sum. It is deliberately small: the whole surface language
//! collapses onto sends, assignments, conditionals, loops, sequences, and
//! definitions. Ownership is tree-structural (`Box`/`Vec` children, moved
//! through the pipeline); no node is ever aliased mutably.
//!
//! # Invariants
//!
//! 1. Every node has an existent [`Loc`], possibly zero-length.
//!    Non-existent locs appear only on synthesised helpers that must not
//!    participate in editor mapping (and on [`Expression::EmptyTree`], which
//!    has no location at all).
//! 2. Every [`Expression::MethodDef`]'s argument list ends with exactly one
//!    [`Expression::BlockArg`]; construction through [`builders::method`]
//!    synthesises one when absent.
//! 3. [`Expression::UnresolvedConstantLit`] scopes form a left-linear chain
//!    terminating in `EmptyTree` or `ConstantLit(Root)`.
//! 4. A [`Block`] appears only as the `block` of a [`Expression::Send`] and
//!    belongs exclusively to it.
//! 5. The root of a lowered file is a synthetic `ClassDef` named by the root
//!    constant symbol, wrapping the file's statement sequence.

use ecow::{EcoString, eco_format};

use crate::names::{NameRef, NameTable};
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

pub mod builders;
pub mod walk;

/// The value carried by a [`Expression::Literal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    /// An integer.
    Integer(i64),
    /// A float.
    Float(f64),
    /// A string; contents are interned.
    String(NameRef),
    /// A symbol; contents are interned.
    Symbol(NameRef),
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,
}

impl LiteralValue {
    /// The interned contents, if this is a string literal.
    #[must_use]
    pub const fn as_string(self) -> Option<NameRef> {
        match self {
            LiteralValue::String(name) => Some(name),
            _ => None,
        }
    }

    /// The interned contents, if this is a symbol literal.
    #[must_use]
    pub const fn as_symbol(self) -> Option<NameRef> {
        match self {
            LiteralValue::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

/// The binding namespace of an [`Expression::UnresolvedIdent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentKind {
    /// A local variable.
    Local,
    /// An instance variable (`@a`).
    Instance,
    /// A class variable (`@@a`).
    Class,
    /// A global variable (`$a`).
    Global,
}

/// Whether a [`Expression::ClassDef`] came from `class` or `module`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassDefKind {
    /// A class definition.
    Class,
    /// A module definition.
    Module,
}

/// Bit set of send properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SendFlags(u16);

impl SendFlags {
    /// The send may invoke private methods (it was written without an
    /// explicit receiver).
    pub const PRIVATE_OK: SendFlags = SendFlags(1);

    /// Returns true if every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: SendFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SendFlags {
    type Output = SendFlags;
    fn bitor(self, rhs: SendFlags) -> SendFlags {
        SendFlags(self.0 | rhs.0)
    }
}

/// Bit set of method-definition properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodFlags(u16);

impl MethodFlags {
    /// The method is defined on `self` (a singleton method).
    pub const SELF_METHOD: MethodFlags = MethodFlags(1);
    /// The method was synthesised by a rewriter rather than written by the
    /// user.
    pub const REWRITER_SYNTHESIZED: MethodFlags = MethodFlags(2);

    /// Returns true if every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: MethodFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MethodFlags {
    type Output = MethodFlags;
    fn bitor(self, rhs: MethodFlags) -> MethodFlags {
        MethodFlags(self.0 | rhs.0)
    }
}

/// An anonymous closure. Appears only as [`Expression::Send::block`].
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Source location of the block (braces/`do` included).
    pub loc: Loc,
    /// The block's parameters (argument variants).
    pub args: Vec<Expression>,
    /// The block body.
    pub body: Box<Expression>,
}

/// An abstract-tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The no-op placeholder. Carries no location.
    EmptyTree,

    /// A literal value.
    Literal {
        /// Source location.
        loc: Loc,
        /// The value.
        value: LiteralValue,
    },

    /// A local variable reference. `self` is the local named `self`.
    Local {
        /// Source location.
        loc: Loc,
        /// The variable name.
        name: NameRef,
    },

    /// A reference whose binding is resolved by a later pass.
    UnresolvedIdent {
        /// Source location.
        loc: Loc,
        /// The binding namespace.
        kind: IdentKind,
        /// The referenced name.
        name: NameRef,
    },

    /// A constant path element. `scope` is the qualifying expression, an
    /// `EmptyTree` for an unqualified constant, or `ConstantLit(Root)` for a
    /// root-anchored one.
    UnresolvedConstantLit {
        /// Source location.
        loc: Loc,
        /// The qualifying scope.
        scope: Box<Expression>,
        /// The constant's own name.
        name: NameRef,
    },

    /// An already-resolved builtin constant.
    ConstantLit {
        /// Source location.
        loc: Loc,
        /// The builtin.
        symbol: Symbol,
    },

    /// An assignment. The left side is a reference or constant form.
    Assign {
        /// Source location.
        loc: Loc,
        /// The target.
        lhs: Box<Expression>,
        /// The value.
        rhs: Box<Expression>,
    },

    /// A method call.
    Send {
        /// Source location.
        loc: Loc,
        /// The receiver.
        recv: Box<Expression>,
        /// The method name.
        fun: NameRef,
        /// Positional/keyword arguments, in evaluation order.
        args: Vec<Expression>,
        /// Send properties.
        flags: SendFlags,
        /// The literal block, if one is attached.
        block: Option<Box<Block>>,
    },

    /// A conditional.
    If {
        /// Source location.
        loc: Loc,
        /// The condition.
        cond: Box<Expression>,
        /// The then-branch.
        then_branch: Box<Expression>,
        /// The else-branch.
        else_branch: Box<Expression>,
    },

    /// A pre-condition loop. (`until`, `for`, and post-condition loops all
    /// desugar onto this.)
    While {
        /// Source location.
        loc: Loc,
        /// The condition.
        cond: Box<Expression>,
        /// The body.
        body: Box<Expression>,
    },

    /// `break`, with its value (or an empty tree).
    Break {
        /// Source location.
        loc: Loc,
        /// The value.
        expr: Box<Expression>,
    },

    /// `next`, with its value (or an empty tree).
    Next {
        /// Source location.
        loc: Loc,
        /// The value.
        expr: Box<Expression>,
    },

    /// `return`, with its value (or an empty tree).
    Return {
        /// Source location.
        loc: Loc,
        /// The value.
        expr: Box<Expression>,
    },

    /// `retry`
    Retry {
        /// Source location.
        loc: Loc,
    },

    /// The argument placeholder of a bare `super`: forwards the enclosing
    /// method's arguments.
    ZSuperArgs {
        /// Source location.
        loc: Loc,
    },

    /// A sequence: evaluates `stats` for effect, then `expr` for its value.
    InsSeq {
        /// Source location.
        loc: Loc,
        /// The effect-only statements.
        stats: Vec<Expression>,
        /// The value expression.
        expr: Box<Expression>,
    },

    /// A class or module definition.
    ClassDef {
        /// Source location of the whole definition.
        loc: Loc,
        /// Source location of the declaration header.
        decl_loc: Loc,
        /// Class or module.
        kind: ClassDefKind,
        /// The name (a constant form, or a singleton-class marker).
        name: Box<Expression>,
        /// Superclass and mixins known at lowering time.
        ancestors: Vec<Expression>,
        /// The body's top-level statements.
        rhs: Vec<Expression>,
    },

    /// A method definition.
    MethodDef {
        /// Source location of the whole definition.
        loc: Loc,
        /// Source location of the declaration header.
        decl_loc: Loc,
        /// The method name.
        name: NameRef,
        /// The parameters (argument variants, trailing `BlockArg`).
        args: Vec<Expression>,
        /// The body.
        body: Box<Expression>,
        /// Definition properties.
        flags: MethodFlags,
    },

    /// An array literal.
    Array {
        /// Source location.
        loc: Loc,
        /// The elements.
        elems: Vec<Expression>,
    },

    /// A hash literal; `keys` and `values` run in parallel.
    Hash {
        /// Source location.
        loc: Loc,
        /// The keys.
        keys: Vec<Expression>,
        /// The values.
        values: Vec<Expression>,
    },

    /// A splatted expression (`*e`).
    Splat {
        /// Source location.
        loc: Loc,
        /// The splatted expression.
        expr: Box<Expression>,
    },

    /// A required positional parameter.
    Arg {
        /// Source location.
        loc: Loc,
        /// The parameter name.
        name: NameRef,
    },

    /// A parameter with a default value.
    OptionalArg {
        /// Source location.
        loc: Loc,
        /// The underlying parameter.
        inner: Box<Expression>,
        /// The default-value expression.
        default: Box<Expression>,
    },

    /// A rest parameter.
    RestArg {
        /// Source location.
        loc: Loc,
        /// The underlying parameter.
        inner: Box<Expression>,
    },

    /// A keyword parameter.
    KeywordArg {
        /// Source location.
        loc: Loc,
        /// The underlying parameter.
        inner: Box<Expression>,
    },

    /// A block parameter.
    BlockArg {
        /// Source location.
        loc: Loc,
        /// The underlying parameter.
        inner: Box<Expression>,
    },

    /// A block-local shadow parameter.
    ShadowArg {
        /// Source location.
        loc: Loc,
        /// The underlying parameter.
        inner: Box<Expression>,
    },

    /// One rescue clause: exception classes, the binding variable, and the
    /// handler body.
    RescueCase {
        /// Source location.
        loc: Loc,
        /// The exception class expressions (possibly empty).
        exceptions: Vec<Expression>,
        /// The binding variable (a local).
        var: Box<Expression>,
        /// The handler body.
        body: Box<Expression>,
    },

    /// A protected region with rescue clauses, else, and ensure.
    Rescue {
        /// Source location.
        loc: Loc,
        /// The protected body.
        body: Box<Expression>,
        /// The rescue clauses (each a [`Expression::RescueCase`]).
        cases: Vec<Expression>,
        /// The else body (runs when nothing was raised).
        else_branch: Box<Expression>,
        /// The ensure body (always runs).
        ensure: Box<Expression>,
    },
}

impl Expression {
    /// Returns the node's location, or `None` for [`Expression::EmptyTree`].
    #[must_use]
    pub fn loc(&self) -> Option<Loc> {
        match self {
            Expression::EmptyTree => None,
            Expression::Literal { loc, .. }
            | Expression::Local { loc, .. }
            | Expression::UnresolvedIdent { loc, .. }
            | Expression::UnresolvedConstantLit { loc, .. }
            | Expression::ConstantLit { loc, .. }
            | Expression::Assign { loc, .. }
            | Expression::Send { loc, .. }
            | Expression::If { loc, .. }
            | Expression::While { loc, .. }
            | Expression::Break { loc, .. }
            | Expression::Next { loc, .. }
            | Expression::Return { loc, .. }
            | Expression::Retry { loc }
            | Expression::ZSuperArgs { loc }
            | Expression::InsSeq { loc, .. }
            | Expression::ClassDef { loc, .. }
            | Expression::MethodDef { loc, .. }
            | Expression::Array { loc, .. }
            | Expression::Hash { loc, .. }
            | Expression::Splat { loc, .. }
            | Expression::Arg { loc, .. }
            | Expression::OptionalArg { loc, .. }
            | Expression::RestArg { loc, .. }
            | Expression::KeywordArg { loc, .. }
            | Expression::BlockArg { loc, .. }
            | Expression::ShadowArg { loc, .. }
            | Expression::RescueCase { loc, .. }
            | Expression::Rescue { loc, .. } => Some(*loc),
        }
    }

    /// Returns the node's location, or `fallback` for an empty tree.
    #[must_use]
    pub fn loc_or(&self, fallback: Loc) -> Loc {
        self.loc().unwrap_or(fallback)
    }

    /// Returns true if this is the no-op placeholder.
    #[must_use]
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, Expression::EmptyTree)
    }

    /// Returns true if this node is reference-shaped: a local, an
    /// unresolved identifier, or a constant path.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Expression::Local { .. }
                | Expression::UnresolvedIdent { .. }
                | Expression::UnresolvedConstantLit { .. }
        )
    }

    /// Returns true if this node is the local named `self`.
    #[must_use]
    pub fn is_self_reference(&self, self_name: NameRef) -> bool {
        matches!(self, Expression::Local { name, .. } if *name == self_name)
    }

    /// The interned contents, if this is a string literal.
    #[must_use]
    pub fn as_string_lit(&self) -> Option<NameRef> {
        match self {
            Expression::Literal { value, .. } => value.as_string(),
            _ => None,
        }
    }

    /// The interned contents, if this is a symbol literal.
    #[must_use]
    pub fn as_symbol_lit(&self) -> Option<NameRef> {
        match self {
            Expression::Literal { value, .. } => value.as_symbol(),
            _ => None,
        }
    }

    /// Renders a compact, source-like display of this node.
    ///
    /// This is a best-effort stringifier for diagnostics and synthesised
    /// names (e.g. rendering the argument of a `describe` block); it is not
    /// an unparser.
    #[must_use]
    pub fn show(&self, names: &NameTable) -> EcoString {
        match self {
            Expression::EmptyTree => EcoString::new(),
            Expression::Literal { value, .. } => match value {
                LiteralValue::Integer(v) => eco_format!("{v}"),
                LiteralValue::Float(v) => eco_format!("{v}"),
                LiteralValue::String(name) => eco_format!("\"{}\"", names.show(*name)),
                LiteralValue::Symbol(name) => eco_format!(":{}", names.show(*name)),
                LiteralValue::True => "true".into(),
                LiteralValue::False => "false".into(),
                LiteralValue::Nil => "nil".into(),
            },
            Expression::Local { name, .. }
            | Expression::UnresolvedIdent { name, .. }
            | Expression::Arg { name, .. } => names.show(*name),
            Expression::UnresolvedConstantLit { scope, name, .. } => {
                if scope.is_empty_tree() {
                    names.show(*name)
                } else {
                    eco_format!("{}::{}", scope.show(names), names.show(*name))
                }
            }
            Expression::ConstantLit { symbol, .. } => symbol.show().into(),
            Expression::Assign { lhs, rhs, .. } => {
                eco_format!("{} = {}", lhs.show(names), rhs.show(names))
            }
            Expression::Send {
                recv, fun, args, ..
            } => {
                let mut out = eco_format!("{}.{}", recv.show(names), names.show(*fun));
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&arg.show(names));
                }
                out.push(')');
                out
            }
            Expression::OptionalArg { inner, .. }
            | Expression::RestArg { inner, .. }
            | Expression::KeywordArg { inner, .. }
            | Expression::BlockArg { inner, .. }
            | Expression::ShadowArg { inner, .. } => inner.show(names),
            _ => eco_format!("<{}>", self.kind_name()),
        }
    }

    /// The kernel-level name of this node kind.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::EmptyTree => "EmptyTree",
            Expression::Literal { .. } => "Literal",
            Expression::Local { .. } => "Local",
            Expression::UnresolvedIdent { .. } => "UnresolvedIdent",
            Expression::UnresolvedConstantLit { .. } => "UnresolvedConstantLit",
            Expression::ConstantLit { .. } => "ConstantLit",
            Expression::Assign { .. } => "Assign",
            Expression::Send { .. } => "Send",
            Expression::If { .. } => "If",
            Expression::While { .. } => "While",
            Expression::Break { .. } => "Break",
            Expression::Next { .. } => "Next",
            Expression::Return { .. } => "Return",
            Expression::Retry { .. } => "Retry",
            Expression::ZSuperArgs { .. } => "ZSuperArgs",
            Expression::InsSeq { .. } => "InsSeq",
            Expression::ClassDef { .. } => "ClassDef",
            Expression::MethodDef { .. } => "MethodDef",
            Expression::Array { .. } => "Array",
            Expression::Hash { .. } => "Hash",
            Expression::Splat { .. } => "Splat",
            Expression::Arg { .. } => "Arg",
            Expression::OptionalArg { .. } => "OptionalArg",
            Expression::RestArg { .. } => "RestArg",
            Expression::KeywordArg { .. } => "KeywordArg",
            Expression::BlockArg { .. } => "BlockArg",
            Expression::ShadowArg { .. } => "ShadowArg",
            Expression::RescueCase { .. } => "RescueCase",
            Expression::Rescue { .. } => "Rescue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{FileId, Span};

    fn loc() -> Loc {
        Loc::new(FileId(0), Span::new(0, 5))
    }

    #[test]
    fn empty_tree_has_no_loc() {
        assert_eq!(Expression::EmptyTree.loc(), None);
        assert_eq!(Expression::EmptyTree.loc_or(loc()), loc());
    }

    #[test]
    fn reference_shapes() {
        let names = NameTable::new();
        let x = names.intern_utf8("x");
        assert!(Expression::Local { loc: loc(), name: x }.is_reference());
        assert!(
            Expression::UnresolvedIdent {
                loc: loc(),
                kind: IdentKind::Instance,
                name: x
            }
            .is_reference()
        );
        assert!(
            !Expression::Literal {
                loc: loc(),
                value: LiteralValue::Nil
            }
            .is_reference()
        );
    }

    #[test]
    fn self_reference_is_by_name() {
        let names = NameTable::new();
        let self_name = names.known().self_;
        let e = Expression::Local {
            loc: loc(),
            name: self_name,
        };
        assert!(e.is_self_reference(self_name));
        assert!(!e.is_self_reference(names.intern_utf8("other")));
    }

    #[test]
    fn send_flags_compose() {
        let flags = SendFlags::default() | SendFlags::PRIVATE_OK;
        assert!(flags.contains(SendFlags::PRIVATE_OK));
        assert!(!SendFlags::default().contains(SendFlags::PRIVATE_OK));
    }

    #[test]
    fn show_renders_constant_paths() {
        let names = NameTable::new();
        let t = names.intern_constant("T");
        let enum_ = names.intern_constant("Enum");
        let path = Expression::UnresolvedConstantLit {
            loc: loc(),
            scope: Box::new(Expression::UnresolvedConstantLit {
                loc: loc(),
                scope: Box::new(Expression::EmptyTree),
                name: t,
            }),
            name: enum_,
        };
        assert_eq!(path.show(&names), "T::Enum");
    }

    #[test]
    fn show_renders_sends_and_literals() {
        let names = NameTable::new();
        let x = names.intern_utf8("x");
        let f = names.intern_utf8("f");
        let send = Expression::Send {
            loc: loc(),
            recv: Box::new(Expression::Local { loc: loc(), name: x }),
            fun: f,
            args: vec![Expression::Literal {
                loc: loc(),
                value: LiteralValue::Integer(1),
            }],
            flags: SendFlags::default(),
            block: None,
        };
        assert_eq!(send.show(&names), "x.f(1)");
    }
}
