// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering for destructuring assignment (`a, *b, c = rhs`).
//!
//! The right side binds to a temporary, `Magic.<expand-splat>` normalises it
//! to an array with the splat's share in the middle, and each target indexes
//! into the expansion — positionally before the splat, by computed `Range`
//! for the splat itself. The value of the whole assignment is the original
//! right side, matching the surface language's rule.

use crate::ast::builders as mk;
use crate::ast::Expression;
use crate::diagnostics::ErrorCode;
use crate::parse::{Node, NodeKind};
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

use super::{DesugarContext, InternalError, Result, node_opt_to_tree, node_to_tree_impl};

pub(super) fn desugar_mlhs(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    exprs: Vec<Node>,
    rhs: Expression,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let temp_rhs = dctx.fresh(known.assign_temp);
    let temp_expanded = dctx.fresh(known.assign_temp);

    let mut stats = Vec::new();
    let mut i: i64 = 0;
    let mut before: i64 = 0;
    let mut after: i64 = 0;
    let mut did_splat = false;
    let total = i64::try_from(exprs.len()).unwrap_or(i64::MAX);

    for c in exprs {
        let c_loc = c.loc;
        match c.kind {
            NodeKind::SplatLhs(var) => {
                if did_splat {
                    return Err(InternalError::new(c_loc, "second splat in destructure"));
                }
                did_splat = true;

                let lh = node_opt_to_tree(dctx, var)?;

                let left = i;
                let mut right = total - left - 1;
                if !lh.is_empty_tree() {
                    let lh_loc = lh.loc_or(c_loc);
                    let exclusive = if right == 0 {
                        right = 1;
                        mk::false_(lh_loc)
                    } else {
                        mk::true_(lh_loc)
                    };
                    let index = mk::send3(
                        lh_loc,
                        mk::constant(lh_loc, Symbol::Range),
                        known.new,
                        mk::int(lh_loc, left),
                        mk::int(lh_loc, -right),
                        exclusive,
                    );
                    stats.push(mk::assign(
                        lh_loc,
                        lh,
                        mk::send1(loc, mk::local(loc, temp_expanded), known.slice, index),
                    ));
                }
                i = -right;
            }
            kind => {
                if did_splat {
                    after += 1;
                } else {
                    before += 1;
                }
                let val = mk::send1(
                    loc,
                    mk::local(loc, temp_expanded),
                    known.square_brackets,
                    mk::int(loc, i),
                );

                if let NodeKind::Mlhs(nested) = kind {
                    stats.push(desugar_mlhs(dctx, c_loc, nested, val)?);
                } else {
                    let lh = node_to_tree_impl(dctx, Node::new(c_loc, kind))?;
                    let lh = match lh {
                        Expression::RestArg { loc: rest_loc, inner } => {
                            if let Some(mut e) = dctx
                                .ctx
                                .begin_error(rest_loc, ErrorCode::UnsupportedRestArgsDestructure)
                            {
                                e.set_header("Unsupported rest args in destructure");
                            }
                            *inner
                        }
                        lh => lh,
                    };
                    let lh_loc = lh.loc_or(c_loc);
                    stats.push(mk::assign(lh_loc, lh, val));
                }

                i += 1;
            }
        }
    }

    let expanded = mk::send3(
        loc,
        mk::constant(loc, Symbol::Magic),
        known.expand_splat,
        mk::local(loc, temp_rhs),
        mk::int(loc, before),
        mk::int(loc, after),
    );
    stats.insert(0, mk::assign_local(loc, temp_expanded, expanded));
    stats.insert(0, mk::assign_local(loc, temp_rhs, rhs));

    // However the targets slice it up, the assignment's own value is the
    // whole right-hand side.
    Ok(mk::ins_seq(loc, stats, mk::local(loc, temp_rhs)))
}
