// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering for compound assignment: `&&=`, `||=`, and `op=`.
//!
//! Lowering the left side first often yields a send (anything with a dot in
//! it). `x.y += 1` must read through `.y` once and write through `.y=` once,
//! with the receiver and every argument evaluated exactly once, so the
//! expansion binds each to a fresh temporary:
//!
//! ```text
//! x.y[z] += 1   ⟶   { $r = x; $a = z; $t = $r.y[$a]; $r.y=($a, $t + 1) }
//! ```
//!
//! A left side that lowered from safe navigation arrives as an `InsSeq`
//! whose final expression is an `If`; the write is spliced into its else
//! branch so the whole update stays nil-guarded.

use crate::ast::builders as mk;
use crate::ast::{Expression, SendFlags};
use crate::diagnostics::ErrorCode;
use crate::names::NameRef;
use crate::parse::Node;
use crate::source_analysis::Loc;

use super::{DesugarContext, InternalError, Result, node_to_tree_impl};

/// The common scaffolding for reading and writing through a send-shaped
/// left side: the receiver temporary, the bindings evaluated up front, and
/// the argument lists for the read (`fun`) and write (`fun=`) sends.
struct OpAsgnScaffolding {
    temp_recv: NameRef,
    stats: Vec<Expression>,
    read_args: Vec<Expression>,
    assgn_args: Vec<Expression>,
}

fn copy_args_for_op_asgn(
    dctx: &mut DesugarContext<'_, '_>,
    send_loc: Loc,
    recv: Expression,
    fun: NameRef,
    args: Vec<Expression>,
) -> OpAsgnScaffolding {
    let mut stats = Vec::with_capacity(args.len() + 2);
    let temp_recv = dctx.fresh(fun);
    stats.push(mk::assign_local(send_loc, temp_recv, recv));

    let mut read_args = Vec::with_capacity(args.len());
    let mut assgn_args = Vec::with_capacity(args.len() + 1);
    for arg in args {
        let arg_loc = arg.loc_or(send_loc);
        let name = dctx.fresh(fun);
        stats.push(mk::assign_local(arg_loc, name, arg));
        read_args.push(mk::local(arg_loc, name));
        assgn_args.push(mk::local(arg_loc, name));
    }

    OpAsgnScaffolding {
        temp_recv,
        stats,
        read_args,
        assgn_args,
    }
}

/// Which compound assignment is being lowered; decides how the read value
/// and the write combine.
#[derive(Clone, Copy)]
enum OpAsgnKind {
    /// `&&=`: write only when the read value is truthy.
    And,
    /// `||=`: write only when the read value is falsy.
    Or,
    /// `op=`: always write `read op rhs`.
    Op(NameRef),
}

/// Lowers `lhs &&= rhs`.
pub(super) fn desugar_and_asgn(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    left: Box<Node>,
    right: Box<Node>,
) -> Result<Expression> {
    desugar_op_asgn_impl(dctx, loc, left, right, OpAsgnKind::And)
}

/// Lowers `lhs ||= rhs`.
pub(super) fn desugar_or_asgn(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    left: Box<Node>,
    right: Box<Node>,
) -> Result<Expression> {
    desugar_op_asgn_impl(dctx, loc, left, right, OpAsgnKind::Or)
}

/// Lowers `lhs op= rhs`.
pub(super) fn desugar_op_asgn(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    left: Box<Node>,
    op: NameRef,
    right: Box<Node>,
) -> Result<Expression> {
    desugar_op_asgn_impl(dctx, loc, left, right, OpAsgnKind::Op(op))
}

fn desugar_op_asgn_impl(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    left: Box<Node>,
    right: Box<Node>,
    kind: OpAsgnKind,
) -> Result<Expression> {
    let recv = node_to_tree_impl(dctx, *left)?;
    let arg = node_to_tree_impl(dctx, *right)?;

    match recv {
        Expression::Send {
            loc: send_loc,
            recv,
            fun,
            args,
            flags,
            ..
        } => Ok(op_asgn_on_send(
            dctx, loc, send_loc, *recv, fun, args, flags, arg, kind,
        )),

        Expression::UnresolvedConstantLit { .. } => {
            if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::NoConstantReassignment) {
                e.set_header("Constant reassignment is not supported");
            }
            Ok(mk::empty_tree())
        }

        recv @ (Expression::Local { .. } | Expression::UnresolvedIdent { .. }) => {
            let copy = |e: &Expression| {
                mk::cp_ref(e).ok_or_else(|| {
                    InternalError::new(loc, "compound-assignment target stopped being a reference")
                })
            };
            match kind {
                OpAsgnKind::And => {
                    let cond = copy(&recv)?;
                    let elsep = copy(&recv)?;
                    let body = mk::assign(loc, recv, arg);
                    Ok(mk::if_(loc, cond, body, elsep))
                }
                OpAsgnKind::Or => {
                    let cond = copy(&recv)?;
                    let thenp = copy(&recv)?;
                    let body = mk::assign(loc, recv, arg);
                    Ok(mk::if_(loc, cond, thenp, body))
                }
                OpAsgnKind::Op(op) => {
                    let lhs = copy(&recv)?;
                    let send = mk::send1(loc, recv, op, arg);
                    Ok(mk::assign(loc, lhs, send))
                }
            }
        }

        // A safe-navigation left side:
        //   { $t = x; if $t == nil then nil else $t.y }
        // The update is built exactly as for a send and spliced into the
        // else branch:
        //   { $t = x; if $t == nil then nil else { …; $t.y=(…) } }
        Expression::InsSeq {
            loc: seq_loc,
            stats,
            expr,
        } => {
            let Expression::If {
                loc: if_loc,
                cond,
                then_branch,
                else_branch,
            } = *expr
            else {
                return Err(unexpected_lhs(loc, kind));
            };
            let Expression::Send {
                loc: send_loc,
                recv,
                fun,
                args,
                flags,
                ..
            } = *else_branch
            else {
                return Err(unexpected_lhs(loc, kind));
            };
            let wrapped = op_asgn_on_send(
                dctx, loc, send_loc, *recv, fun, args, flags, arg, kind,
            );
            Ok(Expression::InsSeq {
                loc: seq_loc,
                stats,
                expr: Box::new(Expression::If {
                    loc: if_loc,
                    cond,
                    then_branch,
                    else_branch: Box::new(wrapped),
                }),
            })
        }

        _ => Err(unexpected_lhs(loc, kind)),
    }
}

fn unexpected_lhs(loc: Loc, kind: OpAsgnKind) -> InternalError {
    let op = match kind {
        OpAsgnKind::And => "&&=",
        OpAsgnKind::Or => "||=",
        OpAsgnKind::Op(_) => "op-assign",
    };
    InternalError::new(loc, format!("unexpected left-hand side of `{op}`"))
}

#[expect(clippy::too_many_arguments, reason = "the destructured Send fields")]
fn op_asgn_on_send(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    send_loc: Loc,
    recv: Expression,
    fun: NameRef,
    args: Vec<Expression>,
    flags: SendFlags,
    arg: Expression,
    kind: OpAsgnKind,
) -> Expression {
    let OpAsgnScaffolding {
        temp_recv,
        mut stats,
        read_args,
        mut assgn_args,
    } = copy_args_for_op_asgn(dctx, send_loc, recv, fun, args);

    let read = mk::send(
        send_loc,
        mk::local(send_loc, temp_recv),
        fun,
        read_args,
        flags,
    );
    let write_fun = dctx.ctx.names.add_eq(fun);

    match kind {
        OpAsgnKind::And | OpAsgnKind::Or => {
            assgn_args.push(arg);
            let temp_result = dctx.fresh(fun);
            stats.push(mk::assign_local(send_loc, temp_result, read));
            let write = mk::send(
                send_loc,
                mk::local(send_loc, temp_recv),
                write_fun,
                assgn_args,
                flags,
            );
            let keep = mk::local(send_loc, temp_result);
            let iff = match kind {
                OpAsgnKind::And => mk::if_(
                    send_loc,
                    mk::local(send_loc, temp_result),
                    write,
                    keep,
                ),
                _ => mk::if_(
                    send_loc,
                    mk::local(send_loc, temp_result),
                    keep,
                    write,
                ),
            };
            mk::ins_seq(loc, stats, iff)
        }
        OpAsgnKind::Op(op) => {
            let new_value = mk::send1(send_loc, read, op, arg);
            assgn_args.push(new_value);
            let write = mk::send(
                send_loc,
                mk::local(send_loc, temp_recv),
                write_fun,
                assgn_args,
                flags,
            );
            mk::ins_seq(loc, stats, write)
        }
    }
}
