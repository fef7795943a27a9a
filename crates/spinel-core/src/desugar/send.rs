// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering for method calls: plain sends, splatted argument lists, block
//! attachment, safe navigation, and symbol-as-block shorthand.

use crate::ast::builders as mk;
use crate::ast::{Block, Expression, SendFlags};
use crate::diagnostics::ErrorCode;
use crate::names::NameRef;
use crate::parse::{Node, NodeKind};
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

use super::{DesugarContext, InternalError, Result, method, node_opt_to_tree, node_to_tree_impl};

/// Lowers a method call.
///
/// - A receiverless call gets an implicit `self` receiver (zero-length loc,
///   since `self.` appears nowhere in the file) and `PRIVATE_OK`.
/// - A splat anywhere in the argument list reroutes the whole call through
///   `Magic.<call-with-splat>` with the arguments collected into one array.
/// - A `&blk` argument is extracted into the send's block slot; `&:sym` is
///   materialised as a one-parameter block calling `sym`.
pub(super) fn desugar_send(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    receiver: Option<Box<Node>>,
    method: NameRef,
    args: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut flags = SendFlags::default();
    let mut rec = node_opt_to_tree(dctx, receiver)?;
    if rec.is_empty_tree() {
        // Zero-length loc: `self.` does not appear in the original file.
        rec = mk::self_(loc.copy_with_zero_length(), known);
        flags = flags | SendFlags::PRIVATE_OK;
    }

    if args.iter().any(|a| matches!(a.kind, NodeKind::Splat(_))) {
        return desugar_send_with_splat(dctx, loc, rec, method, args);
    }

    let mut out_args = Vec::with_capacity(args.len());
    let mut block: Option<Box<Node>> = None;
    for stat in args {
        match stat.kind {
            NodeKind::BlockPass(inner) => {
                if block.is_some() {
                    return Err(InternalError::new(stat.loc, "second block-pass argument"));
                }
                block = Some(inner);
            }
            kind => out_args.push(node_to_tree_impl(dctx, Node::new(stat.loc, kind))?),
        }
    }

    let res = match block {
        None => mk::send(loc, rec, method, out_args, flags),
        Some(block) => {
            let converted = node_to_tree_impl(dctx, *block)?;
            if converted.as_symbol_lit().is_some() {
                let proc_block = symbol_to_proc(dctx, loc, converted)?;
                mk::send_with_block(loc, rec, method, out_args, flags, proc_block)
            } else {
                // A dynamic block value routes through the helper that
                // forwards it positionally.
                let method_lit = mk::symbol(loc, method);
                let mut send_args = vec![rec, method_lit, converted];
                send_args.extend(out_args);
                mk::send(
                    loc,
                    mk::constant(loc, Symbol::Magic),
                    known.call_with_block,
                    send_args,
                    SendFlags::default(),
                )
            }
        }
    };

    if method == known.block_given_p {
        if let Some(block_arg) = dctx.enclosing_block_arg {
            return Ok(mk::if_(
                loc,
                mk::local(loc, block_arg),
                res,
                mk::false_(loc),
            ));
        }
    }
    Ok(res)
}

fn desugar_send_with_splat(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    rec: Expression,
    method: NameRef,
    mut args: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut block: Option<Box<Node>> = None;
    if let Some(pos) = args
        .iter()
        .position(|a| matches!(a.kind, NodeKind::BlockPass(_)))
    {
        let bp = args.remove(pos);
        if let NodeKind::BlockPass(inner) = bp.kind {
            block = Some(inner);
        }
    }

    // Collect the argument list into one array (the array lowering splices
    // the splats) and let the helper unpack it at the call site.
    let array = Node::new(loc, NodeKind::Array(args));
    let args_expr = node_to_tree_impl(dctx, array)?;
    let method_lit = mk::symbol(loc, method);
    let mut send_args = vec![rec, method_lit, args_expr];

    match block {
        None => Ok(mk::send(
            loc,
            mk::constant(loc, Symbol::Magic),
            known.call_with_splat,
            send_args,
            SendFlags::default(),
        )),
        Some(block) => {
            let converted = node_to_tree_impl(dctx, *block)?;
            if converted.as_symbol_lit().is_some() {
                let proc_block = symbol_to_proc(dctx, loc, converted)?;
                Ok(mk::send_with_block(
                    loc,
                    mk::constant(loc, Symbol::Magic),
                    known.call_with_splat,
                    send_args,
                    SendFlags::default(),
                    proc_block,
                ))
            } else {
                send_args.push(converted);
                Ok(mk::send(
                    loc,
                    mk::constant(loc, Symbol::Magic),
                    known.call_with_splat_and_block,
                    send_args,
                    SendFlags::default(),
                ))
            }
        }
    }
}

/// Lowers `recv&.m(args)` to
/// `{ $t = recv; if $t == nil then nil else $t.m(args) }`.
///
/// The scaffolding nodes carry zero-length locs so editors skip them; only
/// the inner send keeps the full call's loc. Equality with `nil` is tested
/// with `==`, so a receiver overriding `==` technically diverges from the
/// surface semantics.
pub(super) fn desugar_csend(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    receiver: Box<Node>,
    method: NameRef,
    args: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let temp = dctx.fresh(known.assign_temp);
    let recv_loc = receiver.loc;
    let zero_loc = loc.copy_with_zero_length();
    let zero_recv_loc = recv_loc.copy_with_zero_length();

    let recv_expr = node_to_tree_impl(dctx, *receiver)?;
    let assgn = mk::assign_local(zero_recv_loc, temp, recv_expr);
    let cond = mk::send1(
        zero_loc,
        mk::local(zero_recv_loc, temp),
        known.eq_eq,
        mk::nil(zero_loc),
    );

    let send_node = Node::new(
        loc,
        NodeKind::Send {
            receiver: Some(Box::new(Node::new(recv_loc, NodeKind::LVar(temp)))),
            method,
            args,
        },
    );
    let send = node_to_tree_impl(dctx, send_node)?;

    let iff = mk::if_(zero_loc, cond, mk::nil(zero_loc), send);
    Ok(mk::ins_seq1(zero_loc, assgn, iff))
}

/// Attaches a literal block to the send it belongs to.
///
/// The send is lowered first; for a safe-navigation receiver that lowering
/// produced the `{ $t = recv; if … else $t.m(args) }` shape, and the block
/// attaches to the send in the else branch.
pub(super) fn desugar_block(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    send: Box<Node>,
    args: Option<Box<Node>>,
    body: Option<Box<Node>>,
) -> Result<Expression> {
    let mut send_node = *send;
    send_node.loc = loc;
    let mut res = node_to_tree_impl(dctx, send_node)?;

    if !matches!(
        res,
        Expression::Send { .. } | Expression::InsSeq { .. }
    ) {
        if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::UnsupportedNode) {
            e.set_header("No body in block");
        }
        return Ok(mk::empty_tree());
    }

    let (block_args, destructures) = method::desugar_args(dctx, loc, args)?;
    let block_body = method::desugar_body(dctx, loc, body, destructures)?;
    let block = mk::block(loc, block_body, block_args);

    match &mut res {
        Expression::Send { block: slot, .. } => {
            *slot = Some(Box::new(block));
        }
        Expression::InsSeq { expr, .. } => {
            let Expression::If { else_branch, .. } = expr.as_mut() else {
                return Err(InternalError::new(
                    loc,
                    "block over safe navigation: expected a conditional",
                ));
            };
            let Expression::Send { block: slot, .. } = else_branch.as_mut() else {
                return Err(InternalError::new(
                    loc,
                    "block over safe navigation: expected a send in the else branch",
                ));
            };
            *slot = Some(Box::new(block));
        }
        _ => unreachable!("shape checked before lowering the block body"),
    }
    Ok(res)
}

/// Materialises `&:name` as `{ |$t| $t.name() }`.
pub(super) fn symbol_to_proc(
    dctx: &mut DesugarContext<'_, '_>,
    fallback_loc: Loc,
    expr: Expression,
) -> Result<Block> {
    let known = dctx.ctx.known();
    let loc = expr.loc_or(fallback_loc);
    let temp = dctx.fresh(known.block_pass_temp);
    let Some(name) = expr.as_symbol_lit() else {
        return Err(InternalError::new(
            loc,
            "symbol-to-proc over a non-symbol literal",
        ));
    };
    // `$t` refers to no source text; a zero-length loc keeps editors away.
    let zero_loc = loc.copy_with_zero_length();
    let recv = mk::local(zero_loc, temp);
    let body = mk::send0(loc, recv, name);
    Ok(mk::block1(loc, body, mk::arg(zero_loc, temp)))
}
