// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared read-only expression walker.
//!
//! Provides [`walk_expression`] — a pre-order recursive walk of an abstract
//! tree, calling a visitor closure on every node. Invariant checks and tests
//! use it instead of hand-rolling a 30-arm traversal each time; passes that
//! must *transform* the tree (the constant mover) keep their own recursion
//! because they need ownership.

use super::{Block, Expression};

/// Recursively walks an expression tree in pre-order, calling `f` on every
/// node (including the root and the bodies of attached blocks).
pub fn walk_expression<F>(expr: &Expression, f: &mut F)
where
    F: FnMut(&Expression),
{
    f(expr);
    match expr {
        Expression::Send {
            recv, args, block, ..
        } => {
            walk_expression(recv, f);
            for arg in args {
                walk_expression(arg, f);
            }
            if let Some(block) = block {
                walk_block(block, f);
            }
        }
        Expression::UnresolvedConstantLit { scope, .. } => {
            walk_expression(scope, f);
        }
        Expression::Assign { lhs, rhs, .. } => {
            walk_expression(lhs, f);
            walk_expression(rhs, f);
        }
        Expression::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            walk_expression(cond, f);
            walk_expression(then_branch, f);
            walk_expression(else_branch, f);
        }
        Expression::While { cond, body, .. } => {
            walk_expression(cond, f);
            walk_expression(body, f);
        }
        Expression::Break { expr, .. }
        | Expression::Next { expr, .. }
        | Expression::Return { expr, .. }
        | Expression::Splat { expr, .. } => {
            walk_expression(expr, f);
        }
        Expression::InsSeq { stats, expr, .. } => {
            for stat in stats {
                walk_expression(stat, f);
            }
            walk_expression(expr, f);
        }
        Expression::ClassDef {
            name,
            ancestors,
            rhs,
            ..
        } => {
            walk_expression(name, f);
            for ancestor in ancestors {
                walk_expression(ancestor, f);
            }
            for stat in rhs {
                walk_expression(stat, f);
            }
        }
        Expression::MethodDef { args, body, .. } => {
            for arg in args {
                walk_expression(arg, f);
            }
            walk_expression(body, f);
        }
        Expression::Array { elems, .. } => {
            for elem in elems {
                walk_expression(elem, f);
            }
        }
        Expression::Hash { keys, values, .. } => {
            for key in keys {
                walk_expression(key, f);
            }
            for value in values {
                walk_expression(value, f);
            }
        }
        Expression::OptionalArg { inner, default, .. } => {
            walk_expression(inner, f);
            walk_expression(default, f);
        }
        Expression::RestArg { inner, .. }
        | Expression::KeywordArg { inner, .. }
        | Expression::BlockArg { inner, .. }
        | Expression::ShadowArg { inner, .. } => {
            walk_expression(inner, f);
        }
        Expression::RescueCase {
            exceptions,
            var,
            body,
            ..
        } => {
            for exception in exceptions {
                walk_expression(exception, f);
            }
            walk_expression(var, f);
            walk_expression(body, f);
        }
        Expression::Rescue {
            body,
            cases,
            else_branch,
            ensure,
            ..
        } => {
            walk_expression(body, f);
            for case in cases {
                walk_expression(case, f);
            }
            walk_expression(else_branch, f);
            walk_expression(ensure, f);
        }
        // Leaf nodes — nothing to recurse into.
        Expression::EmptyTree
        | Expression::Literal { .. }
        | Expression::Local { .. }
        | Expression::UnresolvedIdent { .. }
        | Expression::ConstantLit { .. }
        | Expression::Retry { .. }
        | Expression::ZSuperArgs { .. }
        | Expression::Arg { .. } => {}
    }
}

fn walk_block<F>(block: &Block, f: &mut F)
where
    F: FnMut(&Expression),
{
    for arg in &block.args {
        walk_expression(arg, f);
    }
    walk_expression(&block.body, f);
}
