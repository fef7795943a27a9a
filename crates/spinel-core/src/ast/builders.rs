// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Constructors for the common abstract-tree shapes.
//!
//! Desugaring and the rewriters build trees exclusively through these
//! helpers (conventionally imported as `mk`), which keeps node construction
//! uniform: every constructor takes the produced node's [`Loc`] first, and
//! the few constructors that synthesise well-known names take the
//! [`WellKnown`] table.

use crate::names::{NameRef, WellKnown};
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

use super::{
    Block, ClassDefKind, Expression, IdentKind, LiteralValue, MethodFlags, SendFlags,
};

/// The no-op placeholder.
#[must_use]
pub fn empty_tree() -> Expression {
    Expression::EmptyTree
}

/// A literal with an arbitrary value.
#[must_use]
pub fn literal(loc: Loc, value: LiteralValue) -> Expression {
    Expression::Literal { loc, value }
}

/// An integer literal.
#[must_use]
pub fn int(loc: Loc, value: i64) -> Expression {
    literal(loc, LiteralValue::Integer(value))
}

/// A float literal.
#[must_use]
pub fn float(loc: Loc, value: f64) -> Expression {
    literal(loc, LiteralValue::Float(value))
}

/// A string literal.
#[must_use]
pub fn string(loc: Loc, value: NameRef) -> Expression {
    literal(loc, LiteralValue::String(value))
}

/// A symbol literal.
#[must_use]
pub fn symbol(loc: Loc, value: NameRef) -> Expression {
    literal(loc, LiteralValue::Symbol(value))
}

/// The `nil` literal.
#[must_use]
pub fn nil(loc: Loc) -> Expression {
    literal(loc, LiteralValue::Nil)
}

/// The `true` literal.
#[must_use]
pub fn true_(loc: Loc) -> Expression {
    literal(loc, LiteralValue::True)
}

/// The `false` literal.
#[must_use]
pub fn false_(loc: Loc) -> Expression {
    literal(loc, LiteralValue::False)
}

/// A local variable reference.
#[must_use]
pub fn local(loc: Loc, name: NameRef) -> Expression {
    Expression::Local { loc, name }
}

/// The `self` reference.
#[must_use]
pub fn self_(loc: Loc, known: &WellKnown) -> Expression {
    local(loc, known.self_)
}

/// An unresolved identifier.
#[must_use]
pub fn unresolved_ident(loc: Loc, kind: IdentKind, name: NameRef) -> Expression {
    Expression::UnresolvedIdent { loc, kind, name }
}

/// A constant path element.
#[must_use]
pub fn unresolved_constant(loc: Loc, scope: Expression, name: NameRef) -> Expression {
    Expression::UnresolvedConstantLit {
        loc,
        scope: Box::new(scope),
        name,
    }
}

/// A resolved builtin constant.
#[must_use]
pub fn constant(loc: Loc, symbol: Symbol) -> Expression {
    Expression::ConstantLit { loc, symbol }
}

/// An assignment to an arbitrary target.
#[must_use]
pub fn assign(loc: Loc, lhs: Expression, rhs: Expression) -> Expression {
    Expression::Assign {
        loc,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// An assignment to a local.
#[must_use]
pub fn assign_local(loc: Loc, name: NameRef, rhs: Expression) -> Expression {
    assign(loc, local(loc, name), rhs)
}

/// A send with explicit arguments and flags.
#[must_use]
pub fn send(
    loc: Loc,
    recv: Expression,
    fun: NameRef,
    args: Vec<Expression>,
    flags: SendFlags,
) -> Expression {
    Expression::Send {
        loc,
        recv: Box::new(recv),
        fun,
        args,
        flags,
        block: None,
    }
}

/// A send carrying a literal block.
#[must_use]
pub fn send_with_block(
    loc: Loc,
    recv: Expression,
    fun: NameRef,
    args: Vec<Expression>,
    flags: SendFlags,
    block: Block,
) -> Expression {
    Expression::Send {
        loc,
        recv: Box::new(recv),
        fun,
        args,
        flags,
        block: Some(Box::new(block)),
    }
}

/// A no-argument send.
#[must_use]
pub fn send0(loc: Loc, recv: Expression, fun: NameRef) -> Expression {
    send(loc, recv, fun, Vec::new(), SendFlags::default())
}

/// A one-argument send.
#[must_use]
pub fn send1(loc: Loc, recv: Expression, fun: NameRef, arg1: Expression) -> Expression {
    send(loc, recv, fun, vec![arg1], SendFlags::default())
}

/// A two-argument send.
#[must_use]
pub fn send2(
    loc: Loc,
    recv: Expression,
    fun: NameRef,
    arg1: Expression,
    arg2: Expression,
) -> Expression {
    send(loc, recv, fun, vec![arg1, arg2], SendFlags::default())
}

/// A three-argument send.
#[must_use]
pub fn send3(
    loc: Loc,
    recv: Expression,
    fun: NameRef,
    arg1: Expression,
    arg2: Expression,
    arg3: Expression,
) -> Expression {
    send(loc, recv, fun, vec![arg1, arg2, arg3], SendFlags::default())
}

/// A block with the given parameters.
#[must_use]
pub fn block(loc: Loc, body: Expression, args: Vec<Expression>) -> Block {
    Block {
        loc,
        args,
        body: Box::new(body),
    }
}

/// A parameterless block.
#[must_use]
pub fn block0(loc: Loc, body: Expression) -> Block {
    block(loc, body, Vec::new())
}

/// A one-parameter block.
#[must_use]
pub fn block1(loc: Loc, body: Expression, arg1: Expression) -> Block {
    block(loc, body, vec![arg1])
}

/// A conditional.
#[must_use]
pub fn if_(
    loc: Loc,
    cond: Expression,
    then_branch: Expression,
    else_branch: Expression,
) -> Expression {
    Expression::If {
        loc,
        cond: Box::new(cond),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    }
}

/// A pre-condition loop.
#[must_use]
pub fn while_(loc: Loc, cond: Expression, body: Expression) -> Expression {
    Expression::While {
        loc,
        cond: Box::new(cond),
        body: Box::new(body),
    }
}

/// A `break`.
#[must_use]
pub fn break_(loc: Loc, expr: Expression) -> Expression {
    Expression::Break {
        loc,
        expr: Box::new(expr),
    }
}

/// A `next`.
#[must_use]
pub fn next_(loc: Loc, expr: Expression) -> Expression {
    Expression::Next {
        loc,
        expr: Box::new(expr),
    }
}

/// A `return`.
#[must_use]
pub fn return_(loc: Loc, expr: Expression) -> Expression {
    Expression::Return {
        loc,
        expr: Box::new(expr),
    }
}

/// A sequence. With no statements this is just `expr`.
#[must_use]
pub fn ins_seq(loc: Loc, stats: Vec<Expression>, expr: Expression) -> Expression {
    if stats.is_empty() {
        expr
    } else {
        Expression::InsSeq {
            loc,
            stats,
            expr: Box::new(expr),
        }
    }
}

/// A sequence with a single leading statement.
#[must_use]
pub fn ins_seq1(loc: Loc, stat: Expression, expr: Expression) -> Expression {
    ins_seq(loc, vec![stat], expr)
}

/// A class definition.
#[must_use]
pub fn class_def(
    loc: Loc,
    decl_loc: Loc,
    name: Expression,
    ancestors: Vec<Expression>,
    rhs: Vec<Expression>,
) -> Expression {
    Expression::ClassDef {
        loc,
        decl_loc,
        kind: ClassDefKind::Class,
        name: Box::new(name),
        ancestors,
        rhs,
    }
}

/// A module definition.
#[must_use]
pub fn module_def(
    loc: Loc,
    decl_loc: Loc,
    name: Expression,
    ancestors: Vec<Expression>,
    rhs: Vec<Expression>,
) -> Expression {
    Expression::ClassDef {
        loc,
        decl_loc,
        kind: ClassDefKind::Module,
        name: Box::new(name),
        ancestors,
        rhs,
    }
}

/// A method definition.
///
/// If `args` does not end with a `BlockArg`, one named `blkArg` is appended
/// with a non-existent loc, so the trailing-block-arg invariant holds for
/// every method regardless of who builds it.
#[must_use]
pub fn method(
    loc: Loc,
    decl_loc: Loc,
    name: NameRef,
    mut args: Vec<Expression>,
    body: Expression,
    flags: MethodFlags,
    known: &WellKnown,
) -> Expression {
    if !matches!(args.last(), Some(Expression::BlockArg { .. })) {
        let blk_loc = Loc::none(loc.file());
        args.push(block_arg(blk_loc, arg(blk_loc, known.blk_arg)));
    }
    Expression::MethodDef {
        loc,
        decl_loc,
        name,
        args,
        body: Box::new(body),
        flags,
    }
}

/// A parameterless method definition.
#[must_use]
pub fn method0(
    loc: Loc,
    decl_loc: Loc,
    name: NameRef,
    body: Expression,
    flags: MethodFlags,
    known: &WellKnown,
) -> Expression {
    method(loc, decl_loc, name, Vec::new(), body, flags, known)
}

/// An array literal.
#[must_use]
pub fn array(loc: Loc, elems: Vec<Expression>) -> Expression {
    Expression::Array { loc, elems }
}

/// A hash literal.
#[must_use]
pub fn hash(loc: Loc, keys: Vec<Expression>, values: Vec<Expression>) -> Expression {
    Expression::Hash { loc, keys, values }
}

/// An empty hash literal.
#[must_use]
pub fn hash0(loc: Loc) -> Expression {
    hash(loc, Vec::new(), Vec::new())
}

/// A splatted expression.
#[must_use]
pub fn splat(loc: Loc, expr: Expression) -> Expression {
    Expression::Splat {
        loc,
        expr: Box::new(expr),
    }
}

/// A required positional parameter.
#[must_use]
pub fn arg(loc: Loc, name: NameRef) -> Expression {
    Expression::Arg { loc, name }
}

/// A parameter with a default.
#[must_use]
pub fn optional_arg(loc: Loc, inner: Expression, default: Expression) -> Expression {
    Expression::OptionalArg {
        loc,
        inner: Box::new(inner),
        default: Box::new(default),
    }
}

/// A rest parameter.
#[must_use]
pub fn rest_arg(loc: Loc, inner: Expression) -> Expression {
    Expression::RestArg {
        loc,
        inner: Box::new(inner),
    }
}

/// A keyword parameter.
#[must_use]
pub fn keyword_arg(loc: Loc, inner: Expression) -> Expression {
    Expression::KeywordArg {
        loc,
        inner: Box::new(inner),
    }
}

/// A block parameter.
#[must_use]
pub fn block_arg(loc: Loc, inner: Expression) -> Expression {
    Expression::BlockArg {
        loc,
        inner: Box::new(inner),
    }
}

/// A block-local shadow parameter.
#[must_use]
pub fn shadow_arg(loc: Loc, inner: Expression) -> Expression {
    Expression::ShadowArg {
        loc,
        inner: Box::new(inner),
    }
}

/// One rescue clause.
#[must_use]
pub fn rescue_case(
    loc: Loc,
    exceptions: Vec<Expression>,
    var: Expression,
    body: Expression,
) -> Expression {
    Expression::RescueCase {
        loc,
        exceptions,
        var: Box::new(var),
        body: Box::new(body),
    }
}

/// A protected region.
#[must_use]
pub fn rescue(
    loc: Loc,
    body: Expression,
    cases: Vec<Expression>,
    else_branch: Expression,
    ensure: Expression,
) -> Expression {
    Expression::Rescue {
        loc,
        body: Box::new(body),
        cases,
        else_branch: Box::new(else_branch),
        ensure: Box::new(ensure),
    }
}

/// `T.unsafe(expr)` — escapes the type system for a synthesised value.
#[must_use]
pub fn unsafe_(loc: Loc, expr: Expression, known: &WellKnown) -> Expression {
    send1(loc, constant(loc, Symbol::T), known.unsafe_, expr)
}

/// `T.let(expr, type)` — a type ascription.
#[must_use]
pub fn let_(loc: Loc, expr: Expression, type_: Expression, known: &WellKnown) -> Expression {
    send2(loc, constant(loc, Symbol::T), known.let_, expr, type_)
}

/// A `sig { void }` signature send (with a `params(...)` call when the
/// params hash is non-empty).
#[must_use]
pub fn sig_void(loc: Loc, params: Expression, known: &WellKnown) -> Expression {
    let has_params = !matches!(&params, Expression::Hash { keys, .. } if keys.is_empty());
    let sig_self = self_(loc, known);
    let inner = if has_params {
        send1(loc, self_(loc, known), known.params, params)
    } else {
        self_(loc, known)
    };
    let body = send0(loc, inner, known.void);
    send_with_block(
        loc,
        sig_self,
        known.sig,
        Vec::new(),
        SendFlags::PRIVATE_OK,
        block0(loc, body),
    )
}

/// Duplicates a reference-shaped node (`Local`, `UnresolvedIdent`,
/// `UnresolvedConstantLit`). Returns `None` for anything else; callers treat
/// that as an internal error.
#[must_use]
pub fn cp_ref(expr: &Expression) -> Option<Expression> {
    match expr {
        Expression::Local { .. }
        | Expression::UnresolvedIdent { .. }
        | Expression::UnresolvedConstantLit { .. } => Some(expr.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NameTable;
    use crate::source_analysis::{FileId, Span};

    fn loc() -> Loc {
        Loc::new(FileId(0), Span::new(0, 5))
    }

    #[test]
    fn ins_seq_with_no_stats_is_the_expr() {
        let expr = ins_seq(loc(), Vec::new(), int(loc(), 1));
        assert_eq!(expr, int(loc(), 1));

        let seq = ins_seq1(loc(), nil(loc()), int(loc(), 1));
        assert!(matches!(seq, Expression::InsSeq { ref stats, .. } if stats.len() == 1));
    }

    #[test]
    fn method_synthesises_missing_block_arg() {
        let names = NameTable::new();
        let known = names.known();
        let m = method0(
            loc(),
            loc(),
            names.intern_utf8("f"),
            Expression::EmptyTree,
            MethodFlags::default(),
            known,
        );
        let Expression::MethodDef { args, .. } = &m else {
            panic!("expected MethodDef");
        };
        assert_eq!(args.len(), 1);
        let Expression::BlockArg { loc: blk_loc, inner } = &args[0] else {
            panic!("expected trailing BlockArg, got {:?}", args[0]);
        };
        assert!(!blk_loc.exists(), "synthesised block arg has no source loc");
        assert!(matches!(
            inner.as_ref(),
            Expression::Arg { name, .. } if *name == known.blk_arg
        ));
    }

    #[test]
    fn method_keeps_existing_block_arg() {
        let names = NameTable::new();
        let known = names.known();
        let blk = names.intern_utf8("blk");
        let m = method(
            loc(),
            loc(),
            names.intern_utf8("f"),
            vec![block_arg(loc(), arg(loc(), blk))],
            Expression::EmptyTree,
            MethodFlags::default(),
            known,
        );
        let Expression::MethodDef { args, .. } = &m else {
            panic!("expected MethodDef");
        };
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn cp_ref_rejects_non_references() {
        let names = NameTable::new();
        let x = names.intern_utf8("x");
        assert!(cp_ref(&local(loc(), x)).is_some());
        assert!(cp_ref(&int(loc(), 3)).is_none());
    }

    #[test]
    fn sig_void_without_params_is_bare_void() {
        let names = NameTable::new();
        let known = names.known();
        let sig = sig_void(loc(), hash0(loc()), known);
        let Expression::Send { fun, block, .. } = &sig else {
            panic!("expected Send");
        };
        assert_eq!(*fun, known.sig);
        let body = &block.as_ref().unwrap().body;
        let Expression::Send { fun, recv, .. } = body.as_ref() else {
            panic!("expected void send");
        };
        assert_eq!(*fun, known.void);
        assert!(recv.is_self_reference(known.self_), "no params() wrapper");
    }
}
