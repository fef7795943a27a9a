// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lifting the test DSL into real declarations.
//!
//! Test files declare their structure through calls:
//!
//! ```text
//! describe "Widget" do
//!   before { @w = Widget.new }
//!   it "renders" do
//!     @w.render
//!   end
//! end
//! ```
//!
//! The checker wants classes and methods, so each recognised call rewrites:
//!
//! - `describe(arg) { body }` → a class named `<describe 'arg'>` inheriting
//!   the enclosing class, with the recursively rewritten body
//! - `it(arg) { body }` → a method named `<it 'arg'>`
//! - `before { body }` / `after { body }` → `initialize` / `<after>`
//!
//! Synthesised methods are flagged [`MethodFlags::REWRITER_SYNTHESIZED`] and
//! get a `sig { void }` signature. Constants defined inside a lifted method
//! body are hoisted to class scope by the constant mover.

use ecow::EcoString;

use crate::ast::builders as mk;
use crate::ast::{Expression, MethodFlags};
use crate::context::Context;
use crate::names::NameRef;

use super::constant_mover::ConstantMover;

/// Rewrites one class-body statement.
///
/// Returns the replacement statements; a statement that does not match the
/// DSL (or any statement in autogen mode) is returned unchanged as a single
/// element, so the driver splices the result unconditionally and re-running
/// the rewriter is a no-op.
pub fn run(ctx: Context<'_>, stat: Expression) -> Vec<Expression> {
    if ctx.autogen {
        return vec![stat];
    }
    vec![recurse(ctx, stat)]
}

/// True if `stat` is a DSL send this rewriter handles.
fn wants_rewrite(ctx: Context<'_>, stat: &Expression) -> bool {
    let known = ctx.known();
    let Expression::Send {
        recv,
        fun,
        args,
        block,
        ..
    } = stat
    else {
        return false;
    };
    if block.is_none() || !recv.is_self_reference(known.self_) {
        return false;
    }
    if args.is_empty() && (*fun == known.before || *fun == known.after) {
        return true;
    }
    args.len() == 1 && (*fun == known.describe || *fun == known.it)
}

fn recurse(ctx: Context<'_>, stat: Expression) -> Expression {
    if wants_rewrite(ctx, &stat) {
        rewrite_send(ctx, stat)
    } else {
        stat
    }
}

/// Applies the rewriter to every top-level statement of a lifted body, so
/// nested `describe`/`it` compose.
fn prepare_body(ctx: Context<'_>, body: Expression) -> Expression {
    let body = recurse(ctx, body);
    match body {
        Expression::InsSeq { loc, stats, expr } => Expression::InsSeq {
            loc,
            stats: stats.into_iter().map(|s| recurse(ctx, s)).collect(),
            expr: Box::new(recurse(ctx, *expr)),
        },
        other => other,
    }
}

/// Renders a `describe`/`it` argument for embedding in the synthesised
/// declaration name.
fn display_string(ctx: Context<'_>, arg: &Expression) -> EcoString {
    if let Some(name) = arg.as_string_lit().or_else(|| arg.as_symbol_lit()) {
        return ctx.names.show(name);
    }
    if let Expression::UnresolvedConstantLit { name, .. } = arg {
        return ctx.names.show(*name);
    }
    arg.show(ctx.names)
}

/// Prepends a `sig { void }` to a synthesised method.
fn add_sig_void(ctx: Context<'_>, method: Expression) -> Expression {
    let known = ctx.known();
    let loc = method.loc_or(crate::source_analysis::Loc::none(ctx.file));
    mk::ins_seq1(loc, mk::sig_void(loc, mk::hash0(loc), known), method)
}

/// Builds the `initialize`/`<after>`/`<it …>` method for a lifted block
/// body, hoisting constants first.
fn lift_method(
    ctx: Context<'_>,
    loc: crate::source_analysis::Loc,
    name: NameRef,
    body: Expression,
) -> Expression {
    let mut mover = ConstantMover::new();
    let body = mover.transform(ctx, body);
    let body = prepare_body(ctx, body);
    let method = mk::method0(
        loc,
        loc,
        name,
        body,
        MethodFlags::REWRITER_SYNTHESIZED,
        ctx.known(),
    );
    let method = add_sig_void(ctx, method);
    mover.add_constants_to_expression(loc, method)
}

/// Rewrites a send [`wants_rewrite`] accepted.
fn rewrite_send(ctx: Context<'_>, stat: Expression) -> Expression {
    let known = ctx.known();
    let Expression::Send {
        loc,
        fun,
        mut args,
        block: Some(block),
        ..
    } = stat
    else {
        unreachable!("wants_rewrite only accepts sends with blocks");
    };
    let body = *block.body;

    if fun == known.before || fun == known.after {
        let name = if fun == known.after {
            known.after_angles
        } else {
            known.initialize
        };
        return lift_method(ctx, loc, name, body);
    }

    let arg = args.remove(0);
    let arg_loc = arg.loc_or(loc);
    let arg_string = display_string(ctx, &arg);

    if fun == known.describe {
        let ancestors = vec![mk::self_(arg_loc, known)];
        let rhs = vec![prepare_body(ctx, body)];
        let name = mk::unresolved_constant(
            arg_loc,
            mk::empty_tree(),
            ctx.names.intern_constant(&format!("<describe '{arg_string}'>")),
        );
        mk::class_def(loc, loc, name, ancestors, rhs)
    } else {
        let name = ctx.names.intern_utf8(&format!("<it '{arg_string}'>"));
        lift_method(ctx, loc, name, body)
    }
}
