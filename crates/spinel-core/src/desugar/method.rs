// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method construction: parameter lowering, the synthesised trailing block
//! parameter, and declaration-only file validation.

use crate::ast::builders as mk;
use crate::ast::{Expression, IdentKind, MethodFlags};
use crate::context::Context;
use crate::diagnostics::ErrorCode;
use crate::names::NameRef;
use crate::parse::{Node, NodeKind};
use crate::source_analysis::Loc;

use super::{DesugarContext, InternalError, Result, node_opt_to_tree, node_to_tree_impl};

/// Lowers a parameter list into argument variants, plus the destructuring
/// assignments synthesised for pattern parameters.
///
/// A pattern parameter (`def f((a, b))`) becomes a fresh positional
/// temporary; the returned `destructures` bind the pattern from it and are
/// prepended to the body by [`desugar_body`].
pub(super) fn desugar_args(
    dctx: &mut DesugarContext<'_, '_>,
    _loc: Loc,
    argnode: Option<Box<Node>>,
) -> Result<(Vec<Expression>, Vec<Expression>)> {
    let mut args = Vec::new();
    let mut destructures = Vec::new();

    let Some(argnode) = argnode else {
        return Ok((args, destructures));
    };
    let argnode_loc = argnode.loc;
    let node_name = argnode.node_name();
    let NodeKind::Args(arg_nodes) = argnode.kind else {
        return Err(InternalError::new(
            argnode_loc,
            format!("unsupported parameter list node `{node_name}`"),
        ));
    };

    args.reserve(arg_nodes.len());
    for arg in arg_nodes {
        let arg_loc = arg.loc;
        if matches!(arg.kind, NodeKind::Mlhs(_)) {
            let known = dctx.ctx.known();
            let temporary = dctx.fresh(known.destructure_arg);
            args.push(mk::arg(arg_loc, temporary));
            let destructure = Node::new(
                arg_loc,
                NodeKind::Masgn {
                    lhs: Box::new(arg),
                    rhs: Box::new(Node::new(arg_loc, NodeKind::LVar(temporary))),
                },
            );
            destructures.push(node_to_tree_impl(dctx, destructure)?);
        } else {
            args.push(node_to_tree_impl(dctx, arg)?);
        }
    }

    Ok((args, destructures))
}

/// Lowers a method or block body, prepending any synthesised destructuring
/// assignments.
pub(super) fn desugar_body(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    body: Option<Box<Node>>,
    destructures: Vec<Expression>,
) -> Result<Expression> {
    let body = node_opt_to_tree(dctx, body)?;
    Ok(mk::ins_seq(loc, destructures, body))
}

/// The name bound by a method's trailing block parameter.
fn block_arg_name(args: &[Expression], loc: Loc) -> Result<NameRef> {
    let Some(Expression::BlockArg { inner, .. }) = args.last() else {
        return Err(InternalError::new(
            loc,
            "method parameter list does not end with a block parameter",
        ));
    };
    let Expression::Arg { name, .. } = inner.as_ref() else {
        return Err(InternalError::new(
            loc,
            "block parameter does not wrap a plain parameter",
        ));
    };
    Ok(*name)
}

/// Builds a `MethodDef` from a `def` node.
///
/// The unique counter resets for the method's scope; a missing block
/// parameter is appended under the canonical name `blkArg` (with a
/// non-existent loc), and that name is bound as the enclosing block-arg
/// while the body lowers, so `yield` inside resolves to it.
pub(super) fn build_method(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    decl_loc: Loc,
    name: NameRef,
    argnode: Option<Box<Node>>,
    body: Option<Box<Node>>,
    is_self: bool,
) -> Result<Expression> {
    let ctx = dctx.ctx;
    let known = ctx.known();

    let mut unique_counter: u16 = 1;
    let mut dctx1 = DesugarContext {
        ctx,
        unique_counter: &mut unique_counter,
        enclosing_block_arg: dctx.enclosing_block_arg,
        enclosing_method_loc: Some(decl_loc),
        enclosing_method_name: Some(name),
    };
    let (mut args, destructures) = desugar_args(&mut dctx1, loc, argnode)?;

    if !matches!(args.last(), Some(Expression::BlockArg { .. })) {
        let blk_loc = Loc::none(loc.file());
        args.push(mk::block_arg(blk_loc, mk::arg(blk_loc, known.blk_arg)));
    }
    let enclosing_block_arg = block_arg_name(&args, loc)?;

    let mut dctx2 = DesugarContext {
        ctx,
        unique_counter: &mut unique_counter,
        enclosing_block_arg: Some(enclosing_block_arg),
        enclosing_method_loc: Some(decl_loc),
        enclosing_method_name: Some(name),
    };
    let body = desugar_body(&mut dctx2, loc, body, destructures)?;
    let body = validate_rbi_body(ctx, body);

    let flags = if is_self {
        MethodFlags::SELF_METHOD
    } else {
        MethodFlags::default()
    };
    Ok(mk::method(loc, decl_loc, name, args, body, flags, known))
}

fn is_ivar_assign(stat: &Expression) -> bool {
    matches!(
        stat,
        Expression::Assign { lhs, .. }
            if matches!(
                lhs.as_ref(),
                Expression::UnresolvedIdent { kind: IdentKind::Instance, .. }
            )
    )
}

/// In a declaration-only file, a method body may be empty, a single
/// instance-variable assignment, or a sequence of them; anything else is
/// flagged with a fix-it suggesting deletion.
fn validate_rbi_body(ctx: Context<'_>, body: Expression) -> Expression {
    let Some(body_loc) = body.loc() else {
        return body;
    };
    if !body_loc.exists() || !ctx.is_rbi() {
        return body;
    }

    let flag = |loc: Loc| {
        if let Some(mut e) = ctx.begin_error(loc, ErrorCode::CodeInRbi) {
            e.set_header("RBI methods must not have code");
            e.replace_with("Delete the body", body_loc, "");
        }
    };

    match &body {
        Expression::Assign { .. } => {
            if !is_ivar_assign(&body) {
                flag(body_loc);
            }
        }
        Expression::InsSeq { stats, expr, .. } => {
            for stat in stats {
                if !is_ivar_assign(stat) {
                    flag(stat.loc_or(body_loc));
                }
            }
            if !is_ivar_assign(expr) {
                flag(expr.loc_or(body_loc));
            }
        }
        _ => flag(body_loc),
    }
    body
}
