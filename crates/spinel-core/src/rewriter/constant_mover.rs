// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Hoisting constant definitions out of synthesised method bodies.
//!
//! When the test-DSL rewriter turns an `it`/`before` block into a method,
//! constants defined inside the block would become method-local — but the
//! surface language scopes them to the enclosing class. This visitor walks
//! the block body, replaces each constant definition with a
//! `Module.const_set` call at the original site, and collects a placeholder
//! definition (`Name = T.unsafe(nil)`, keeping any `T.let` type ascription)
//! to re-emit at class scope.
//!
//! Whole class definitions — and `describe` sends, which become classes —
//! are moved out verbatim, but only the outermost one: `class_depth` tracks
//! nesting so a class inside a class stays where it is.
//!
//! This is a returning visitor: `transform` consumes a tree and returns the
//! rewritten tree, and the mover accumulates what it hoisted until
//! [`ConstantMover::add_constants_to_expression`] prepends it.

use crate::ast::builders as mk;
use crate::ast::{Block, Expression};
use crate::context::Context;
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

pub(crate) struct ConstantMover {
    class_depth: u32,
    moved: Vec<Expression>,
}

impl ConstantMover {
    pub(crate) fn new() -> Self {
        Self {
            class_depth: 0,
            moved: Vec::new(),
        }
    }

    /// Prepends everything hoisted so far to `expr`.
    pub(crate) fn add_constants_to_expression(self, loc: Loc, expr: Expression) -> Expression {
        mk::ins_seq(loc, self.moved, expr)
    }

    /// Post-order transform of `expr`, hoisting as it goes.
    pub(crate) fn transform(&mut self, ctx: Context<'_>, expr: Expression) -> Expression {
        match expr {
            Expression::Assign { loc, lhs, rhs } => {
                let lhs = self.transform(ctx, *lhs);
                let rhs = self.transform(ctx, *rhs);
                self.transform_assign(ctx, loc, lhs, rhs)
            }

            Expression::ClassDef {
                loc,
                decl_loc,
                kind,
                name,
                ancestors,
                rhs,
            } => {
                self.class_depth += 1;
                let name = Box::new(self.transform(ctx, *name));
                let ancestors = self.transform_all(ctx, ancestors);
                let rhs = self.transform_all(ctx, rhs);
                self.class_depth -= 1;
                let class_def = Expression::ClassDef {
                    loc,
                    decl_loc,
                    kind,
                    name,
                    ancestors,
                    rhs,
                };
                if self.class_depth == 0 {
                    self.moved.push(class_def);
                    mk::empty_tree()
                } else {
                    class_def
                }
            }

            Expression::Send {
                loc,
                recv,
                fun,
                args,
                flags,
                block,
            } => {
                // A `describe` send becomes a class, so it scopes constants
                // the way a class does.
                let is_describe = fun == ctx.known().describe
                    && args.len() == 1
                    && recv.is_self_reference(ctx.known().self_);
                if is_describe {
                    self.class_depth += 1;
                }
                let recv = Box::new(self.transform(ctx, *recv));
                let args = self.transform_all(ctx, args);
                let block = block.map(|b| {
                    let Block { loc, args, body } = *b;
                    Box::new(Block {
                        loc,
                        args: self.transform_all(ctx, args),
                        body: Box::new(self.transform(ctx, *body)),
                    })
                });
                let send = Expression::Send {
                    loc,
                    recv,
                    fun,
                    args,
                    flags,
                    block,
                };
                if is_describe {
                    self.class_depth -= 1;
                    if self.class_depth == 0 {
                        self.moved.push(send);
                        return mk::empty_tree();
                    }
                }
                send
            }

            // Structural forms: rebuild with transformed children.
            Expression::UnresolvedConstantLit { loc, scope, name } => {
                Expression::UnresolvedConstantLit {
                    loc,
                    scope: Box::new(self.transform(ctx, *scope)),
                    name,
                }
            }
            Expression::If {
                loc,
                cond,
                then_branch,
                else_branch,
            } => Expression::If {
                loc,
                cond: Box::new(self.transform(ctx, *cond)),
                then_branch: Box::new(self.transform(ctx, *then_branch)),
                else_branch: Box::new(self.transform(ctx, *else_branch)),
            },
            Expression::While { loc, cond, body } => Expression::While {
                loc,
                cond: Box::new(self.transform(ctx, *cond)),
                body: Box::new(self.transform(ctx, *body)),
            },
            Expression::Break { loc, expr } => Expression::Break {
                loc,
                expr: Box::new(self.transform(ctx, *expr)),
            },
            Expression::Next { loc, expr } => Expression::Next {
                loc,
                expr: Box::new(self.transform(ctx, *expr)),
            },
            Expression::Return { loc, expr } => Expression::Return {
                loc,
                expr: Box::new(self.transform(ctx, *expr)),
            },
            Expression::InsSeq { loc, stats, expr } => Expression::InsSeq {
                loc,
                stats: self.transform_all(ctx, stats),
                expr: Box::new(self.transform(ctx, *expr)),
            },
            Expression::MethodDef {
                loc,
                decl_loc,
                name,
                args,
                body,
                flags,
            } => Expression::MethodDef {
                loc,
                decl_loc,
                name,
                args: self.transform_all(ctx, args),
                body: Box::new(self.transform(ctx, *body)),
                flags,
            },
            Expression::Array { loc, elems } => Expression::Array {
                loc,
                elems: self.transform_all(ctx, elems),
            },
            Expression::Hash { loc, keys, values } => Expression::Hash {
                loc,
                keys: self.transform_all(ctx, keys),
                values: self.transform_all(ctx, values),
            },
            Expression::Splat { loc, expr } => Expression::Splat {
                loc,
                expr: Box::new(self.transform(ctx, *expr)),
            },
            Expression::OptionalArg { loc, inner, default } => Expression::OptionalArg {
                loc,
                inner: Box::new(self.transform(ctx, *inner)),
                default: Box::new(self.transform(ctx, *default)),
            },
            Expression::RestArg { loc, inner } => Expression::RestArg {
                loc,
                inner: Box::new(self.transform(ctx, *inner)),
            },
            Expression::KeywordArg { loc, inner } => Expression::KeywordArg {
                loc,
                inner: Box::new(self.transform(ctx, *inner)),
            },
            Expression::BlockArg { loc, inner } => Expression::BlockArg {
                loc,
                inner: Box::new(self.transform(ctx, *inner)),
            },
            Expression::ShadowArg { loc, inner } => Expression::ShadowArg {
                loc,
                inner: Box::new(self.transform(ctx, *inner)),
            },
            Expression::RescueCase {
                loc,
                exceptions,
                var,
                body,
            } => Expression::RescueCase {
                loc,
                exceptions: self.transform_all(ctx, exceptions),
                var: Box::new(self.transform(ctx, *var)),
                body: Box::new(self.transform(ctx, *body)),
            },
            Expression::Rescue {
                loc,
                body,
                cases,
                else_branch,
                ensure,
            } => Expression::Rescue {
                loc,
                body: Box::new(self.transform(ctx, *body)),
                cases: self.transform_all(ctx, cases),
                else_branch: Box::new(self.transform(ctx, *else_branch)),
                ensure: Box::new(self.transform(ctx, *ensure)),
            },

            // Leaves.
            leaf @ (Expression::EmptyTree
            | Expression::Literal { .. }
            | Expression::Local { .. }
            | Expression::UnresolvedIdent { .. }
            | Expression::ConstantLit { .. }
            | Expression::Retry { .. }
            | Expression::ZSuperArgs { .. }
            | Expression::Arg { .. }) => leaf,
        }
    }

    fn transform_all(&mut self, ctx: Context<'_>, exprs: Vec<Expression>) -> Vec<Expression> {
        exprs
            .into_iter()
            .map(|e| self.transform(ctx, e))
            .collect()
    }

    /// A constant definition found in a synthesised method body.
    fn transform_assign(
        &mut self,
        ctx: Context<'_>,
        loc: Loc,
        lhs: Expression,
        rhs: Expression,
    ) -> Expression {
        let (cnst_loc, cnst_name, scope) = match lhs {
            Expression::UnresolvedConstantLit { loc, name, scope } => (loc, name, scope),
            other => return mk::assign(loc, other, rhs),
        };
        let lhs = Expression::UnresolvedConstantLit {
            loc: cnst_loc,
            scope,
            name: cnst_name,
        };

        // A constant aliasing another constant moves out whole.
        if matches!(rhs, Expression::UnresolvedConstantLit { .. }) {
            self.moved.push(mk::assign(loc, lhs, rhs));
            return mk::empty_tree();
        }

        let name = mk::symbol(cnst_loc, cnst_name);
        // The moved definition keeps a `T.let` ascription, decayed to
        // unsafe; anything else becomes a bare unsafe placeholder.
        self.moved.push(create_const_assign(ctx, loc, lhs, &rhs));

        let module = mk::constant(loc, Symbol::Module);
        mk::send2(loc, module, ctx.known().const_set, name, rhs)
    }
}

/// `Name = T.unsafe(nil)`, or `Name = T.let(T.unsafe(nil), Type)` when the
/// original right side was a `T.let`.
fn create_const_assign(
    ctx: Context<'_>,
    loc: Loc,
    lhs: Expression,
    rhs: &Expression,
) -> Expression {
    let known = ctx.known();
    let unsafe_nil = mk::unsafe_(loc, mk::nil(loc), known);
    if let Expression::Send { fun, args, .. } = rhs {
        if *fun == known.let_ && args.len() == 2 {
            let ascribed = mk::let_(loc, unsafe_nil, args[1].clone(), known);
            return mk::assign(loc, lhs, ascribed);
        }
    }
    mk::assign(loc, lhs, unsafe_nil)
}
