// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering for array and hash literals with splatted parts.
//!
//! A splat splits the literal into runs: literal runs stay literal
//! collections, splatted parts are normalised (`.to_a` / `.to_h`) and the
//! runs are stitched back together with `.concat` / `.merge`, preserving
//! left-to-right evaluation order.

use crate::ast::builders as mk;
use crate::ast::Expression;
use crate::parse::{Node, NodeKind};
use crate::source_analysis::Loc;

use super::{DesugarContext, InternalError, Result, node_to_tree_impl};

/// Lowers an array literal: `[a, *x, b]` becomes
/// `[a].concat(x.to_a).concat([b])`.
pub(super) fn desugar_array(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    elts: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut elems: Vec<Expression> = Vec::with_capacity(elts.len());
    let mut last_merge: Option<Expression> = None;

    for stat in elts {
        match stat.kind {
            NodeKind::Splat(var) => {
                let var = mk::send0(loc, node_to_tree_impl(dctx, *var)?, known.to_a);
                if elems.is_empty() {
                    last_merge = Some(match last_merge.take() {
                        Some(prev) => mk::send1(loc, prev, known.concat, var),
                        None => var,
                    });
                } else {
                    let current = mk::array(loc, std::mem::take(&mut elems));
                    let merged = match last_merge.take() {
                        Some(prev) => mk::send1(loc, prev, known.concat, current),
                        None => current,
                    };
                    last_merge = Some(mk::send1(loc, merged, known.concat, var));
                }
            }
            kind => elems.push(node_to_tree_impl(dctx, Node::new(stat.loc, kind))?),
        }
    }

    Ok(if elems.is_empty() {
        match last_merge {
            Some(merged) => merged,
            None => mk::array(loc, elems),
        }
    } else {
        let tail = mk::array(loc, elems);
        match last_merge {
            Some(merged) => mk::send1(loc, merged, known.concat, tail),
            None => tail,
        }
    })
}

/// Lowers a hash literal: `{a: 1, **x, b: 2}` becomes
/// `{a: 1}.merge(x.to_h).merge({b: 2})`.
pub(super) fn desugar_hash(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    pairs: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut keys: Vec<Expression> = Vec::with_capacity(pairs.len());
    let mut values: Vec<Expression> = Vec::with_capacity(pairs.len());
    let mut last_merge: Option<Expression> = None;

    for pair in pairs {
        let pair_loc = pair.loc;
        match pair.kind {
            NodeKind::Pair { key, value } => {
                keys.push(node_to_tree_impl(dctx, *key)?);
                values.push(node_to_tree_impl(dctx, *value)?);
            }
            NodeKind::Kwsplat(expr) => {
                let expr = mk::send0(loc, node_to_tree_impl(dctx, *expr)?, known.to_h);
                if keys.is_empty() {
                    last_merge = Some(match last_merge.take() {
                        Some(prev) => mk::send1(loc, prev, known.merge, expr),
                        None => expr,
                    });
                } else {
                    let current =
                        mk::hash(loc, std::mem::take(&mut keys), std::mem::take(&mut values));
                    let merged = match last_merge.take() {
                        Some(prev) => mk::send1(loc, prev, known.merge, current),
                        None => current,
                    };
                    last_merge = Some(mk::send1(loc, merged, known.merge, expr));
                }
            }
            _ => {
                return Err(InternalError::new(
                    pair_loc,
                    "hash element is neither a pair nor a keyword splat",
                ));
            }
        }
    }

    Ok(if keys.is_empty() {
        match last_merge {
            Some(merged) => merged,
            None => mk::hash0(loc),
        }
    } else {
        let tail = mk::hash(loc, keys, values);
        match last_merge {
            Some(merged) => mk::send1(loc, merged, known.merge, tail),
            None => tail,
        }
    })
}
