// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering for interpolated strings, symbols, and regular expressions.
//!
//! Runs of adjacent string literals collapse into a single interned string;
//! dynamic parts are converted with `.to_s` and joined with `.concat`. An
//! interpolated symbol is the interpolated string followed by `.intern`.

use ecow::EcoString;

use crate::ast::builders as mk;
use crate::ast::Expression;
use crate::parse::Node;
use crate::source_analysis::Loc;

use super::{DesugarContext, InternalError, Result, node_to_tree_impl};

/// Lowers the parts of an interpolated string to a single expression.
pub(super) fn desugar_dstring(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    nodes: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut iter = nodes.into_iter();
    let Some(first_node) = iter.next() else {
        return Ok(mk::string(loc, known.empty));
    };

    let first = node_to_tree_impl(dctx, first_node)?;
    let mut res: Option<Expression> = None;
    let mut accumulated: Vec<Expression> = Vec::new();
    let mut all_strings_so_far;
    if first.as_string_lit().is_some() || first.is_empty_tree() {
        accumulated.push(first);
        all_strings_so_far = true;
    } else {
        let piece_loc = first.loc_or(loc);
        res = Some(mk::send0(piece_loc, first, known.to_s));
        all_strings_so_far = false;
    }

    for stat in iter {
        let mut narg = node_to_tree_impl(dctx, stat)?;
        if narg.as_string_lit().is_none() && !narg.is_empty_tree() {
            let piece_loc = narg.loc_or(loc);
            narg = mk::send0(piece_loc, narg, known.to_s);
        }
        if all_strings_so_far && narg.as_string_lit().is_some() {
            accumulated.push(narg);
        } else if narg.is_empty_tree() {
            // Contributes nothing.
        } else {
            if all_strings_so_far {
                all_strings_so_far = false;
                res = Some(merge_strings(dctx, loc, std::mem::take(&mut accumulated)));
            }
            let Some(prev) = res.take() else {
                return Err(InternalError::new(loc, "interpolation lost its prefix"));
            };
            res = Some(mk::send1(loc, prev, known.concat, narg));
        }
    }

    if all_strings_so_far {
        res = Some(merge_strings(dctx, loc, accumulated));
    }
    res.ok_or_else(|| InternalError::new(loc, "interpolation produced no value"))
}

/// Collapses a run of string literals (and empty trees) into one literal.
fn merge_strings(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    mut accumulated: Vec<Expression>,
) -> Expression {
    if accumulated.len() == 1 {
        return accumulated.remove(0);
    }
    let mut text = EcoString::new();
    for expr in &accumulated {
        if let Some(name) = expr.as_string_lit() {
            text.push_str(&dctx.ctx.names.show(name));
        }
    }
    mk::string(loc, dctx.ctx.names.intern_utf8(&text))
}

/// Lowers the parts of an interpolated symbol: the interpolated string
/// followed by `.intern`.
pub(super) fn desugar_dsymbol(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    nodes: Vec<Node>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut iter = nodes.into_iter();
    let Some(first_node) = iter.next() else {
        return Ok(mk::symbol(loc, known.empty));
    };

    let first = node_to_tree_impl(dctx, first_node)?;
    let mut res = if first.as_string_lit().is_some() {
        first
    } else {
        mk::send0(loc, first, known.to_s)
    };
    for stat in iter {
        let mut narg = node_to_tree_impl(dctx, stat)?;
        if narg.as_string_lit().is_none() {
            narg = mk::send0(loc, narg, known.to_s);
        }
        res = mk::send1(loc, res, known.concat, narg);
    }
    Ok(mk::send0(loc, res, known.intern))
}

/// Lowers regular-expression option letters to the numeric flag word the
/// `Regexp` constructor takes: `i` = 1, `x` = 2, `m` = 4, combined with `|`.
/// Encoding options were already handled by the parser and are ignored.
pub(super) fn desugar_regopt(dctx: &DesugarContext<'_, '_>, loc: Loc, opts: &str) -> Expression {
    let known = dctx.ctx.known();
    let mut acc = mk::int(loc, 0);
    for c in opts.chars() {
        let flag = match c {
            'i' => 1,
            'x' => 2,
            'm' => 4,
            // 'n', 'e', 's', 'u' and anything the parser already rejected.
            _ => 0,
        };
        if flag != 0 {
            acc = mk::send1(loc, acc, known.or_op, mk::int(loc, flag));
        }
    }
    acc
}
