// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expanding the enum-value DSL.
//!
//! A `T::Enum` subclass declares its values inside an `enums do` block:
//!
//! ```text
//! class Suit < T::Enum
//!   enums do
//!     Spades = new
//!     Hearts = new
//!   end
//! end
//! ```
//!
//! By the time this rewriter runs, each `new` has become
//! `Magic.<self-new>(self)` (possibly wrapped in a `T.let`). The rewriter
//! replaces every accepted value with two statements:
//!
//! - a singleton child class `<Name$1> < Suit` whose body is
//!   `include Singleton; final!`
//! - `Name = T.let(<Name$1>.instance, <Name$1>)`
//!
//! and prepends `extend T::Helpers; abstract!; sealed!` to the enum class
//! itself. Constants that are not enum values are flagged; values declared
//! outside the `enums do` block are flagged too, but still expanded.

use ecow::eco_format;

use crate::ast::builders as mk;
use crate::ast::{ClassDefKind, Expression};
use crate::context::Context;
use crate::diagnostics::ErrorCode;
use crate::names::UniqueNameKind;
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

/// Whether a statement was found inside the `enums do` block.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FromWhere {
    Inside,
    Outside,
}

/// Rewrites `class_def` in place if it is a `T::Enum` subclass.
///
/// Non-enum classes, already-expanded classes, and autogen mode are no-ops,
/// so the rewriter is idempotent.
pub fn run(ctx: Context<'_>, class_def: &mut Expression) {
    if ctx.autogen {
        return;
    }
    if !is_t_enum(ctx, class_def) {
        return;
    }
    let Expression::ClassDef {
        decl_loc,
        name,
        rhs,
        ..
    } = class_def
    else {
        return;
    };
    if already_expanded(ctx, rhs) {
        return;
    }

    let decl_loc = *decl_loc;
    let enum_name = name.as_ref().clone();
    let known = ctx.known();
    let old_rhs = std::mem::take(rhs);

    let mut new_rhs = Vec::with_capacity(old_rhs.len() + 3);
    new_rhs.push(mk::send1(
        decl_loc,
        mk::self_(decl_loc, known),
        known.extend,
        mk::constant(decl_loc, Symbol::THelpers),
    ));
    new_rhs.push(mk::send0(
        decl_loc,
        mk::self_(decl_loc, known),
        known.abstract_bang,
    ));
    new_rhs.push(mk::send0(
        decl_loc,
        mk::self_(decl_loc, known),
        known.sealed_bang,
    ));

    for stat in old_rhs {
        match into_enums_do_body(ctx, stat) {
            Ok(block_body) => match block_body {
                Expression::InsSeq { stats, expr, .. } => {
                    for stat in stats {
                        collect_new_stats(
                            ctx,
                            &enum_name,
                            decl_loc,
                            &mut new_rhs,
                            stat,
                            FromWhere::Inside,
                        );
                    }
                    collect_new_stats(
                        ctx,
                        &enum_name,
                        decl_loc,
                        &mut new_rhs,
                        *expr,
                        FromWhere::Inside,
                    );
                }
                single => collect_new_stats(
                    ctx,
                    &enum_name,
                    decl_loc,
                    &mut new_rhs,
                    single,
                    FromWhere::Inside,
                ),
            },
            Err(stat) => {
                collect_new_stats(ctx, &enum_name, decl_loc, &mut new_rhs, stat, FromWhere::Outside);
            }
        }
    }

    *rhs = new_rhs;
}

/// True for a class definition whose first ancestor is the constant path
/// `T::Enum` (unqualified or root-anchored).
fn is_t_enum(ctx: Context<'_>, class_def: &Expression) -> bool {
    let known = ctx.known();
    let Expression::ClassDef {
        kind: ClassDefKind::Class,
        ancestors,
        ..
    } = class_def
    else {
        return false;
    };
    let Some(Expression::UnresolvedConstantLit { scope, name, .. }) = ancestors.first() else {
        return false;
    };
    if *name != known.cnst_enum {
        return false;
    }
    let Expression::UnresolvedConstantLit {
        scope: t_scope,
        name: t_name,
        ..
    } = scope.as_ref()
    else {
        return false;
    };
    if *t_name != known.cnst_t {
        return false;
    }
    matches!(
        t_scope.as_ref(),
        Expression::EmptyTree
            | Expression::ConstantLit {
                symbol: Symbol::Root,
                ..
            }
    )
}

/// True if the class body already starts with the `extend T::Helpers`
/// prologue this rewriter emits.
fn already_expanded(ctx: Context<'_>, rhs: &[Expression]) -> bool {
    matches!(
        rhs.first(),
        Some(Expression::Send { fun, args, .. })
            if *fun == ctx.known().extend
                && matches!(
                    args.first(),
                    Some(Expression::ConstantLit { symbol: Symbol::THelpers, .. })
                )
    )
}

/// If `stat` is `enums do … end`, returns its block body; otherwise gives
/// the statement back.
fn into_enums_do_body(ctx: Context<'_>, stat: Expression) -> Result<Expression, Expression> {
    let is_enums_do = matches!(
        &stat,
        Expression::Send { fun, block: Some(_), .. } if *fun == ctx.known().enums
    );
    if !is_enums_do {
        return Err(stat);
    }
    let Expression::Send {
        block: Some(block), ..
    } = stat
    else {
        unreachable!("shape checked above");
    };
    Ok(*block.body)
}

enum Verdict {
    /// Not a constant definition at all; passes through silently.
    NotAConstant,
    /// A constant definition that is not an enum value; flagged and kept.
    BadConstant,
    /// `Name = Magic.<self-new>(self)`, optionally inside a `T.let`.
    EnumValue,
}

fn classify(ctx: Context<'_>, stat: &Expression) -> Verdict {
    let known = ctx.known();
    let Expression::Assign { lhs, rhs, .. } = stat else {
        return Verdict::NotAConstant;
    };
    if !matches!(lhs.as_ref(), Expression::UnresolvedConstantLit { .. }) {
        return Verdict::NotAConstant;
    }
    let Expression::Send {
        recv, fun, args, ..
    } = rhs.as_ref()
    else {
        return Verdict::BadConstant;
    };

    if *fun == known.self_new {
        if is_magic_class(recv) {
            return Verdict::EnumValue;
        }
        return Verdict::BadConstant;
    }

    if *fun == known.let_ {
        // T.let(Magic.<self-new>(self), SomeType)
        if !matches!(recv.as_ref(), Expression::UnresolvedConstantLit { .. }) {
            return Verdict::BadConstant;
        }
        if args.len() != 2 {
            return Verdict::BadConstant;
        }
        if is_self_new(ctx, &args[0]) {
            return Verdict::EnumValue;
        }
        return Verdict::BadConstant;
    }

    Verdict::BadConstant
}

fn is_magic_class(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::ConstantLit {
            symbol: Symbol::Magic,
            ..
        }
    )
}

fn is_self_new(ctx: Context<'_>, expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Send { recv, fun, .. }
            if *fun == ctx.known().self_new && is_magic_class(recv)
    )
}

fn bad_const(ctx: Context<'_>, stat_loc: Loc, class_loc: Loc) {
    if let Some(mut e) = ctx.begin_error(stat_loc, ErrorCode::TEnumConstNotEnumValue) {
        e.set_header("All constants defined on a `T::Enum` must be unique instances of the enum");
        e.add_error_line(class_loc, "Enclosing definition here");
    }
}

/// Appends the expansion of `stat` to `out` — or `stat` itself when it is
/// not an accepted enum value.
fn collect_new_stats(
    ctx: Context<'_>,
    enum_name: &Expression,
    decl_loc: Loc,
    out: &mut Vec<Expression>,
    stat: Expression,
    from_where: FromWhere,
) {
    match classify(ctx, &stat) {
        Verdict::NotAConstant => out.push(stat),
        Verdict::BadConstant => {
            bad_const(ctx, stat.loc_or(decl_loc), decl_loc);
            out.push(stat);
        }
        Verdict::EnumValue => {
            let known = ctx.known();
            let stat_loc = stat.loc_or(decl_loc);
            let Expression::Assign { lhs, .. } = stat else {
                unreachable!("classify only accepts assignments");
            };
            let Expression::UnresolvedConstantLit {
                loc: lhs_loc,
                name: value_name,
                ..
            } = *lhs
            else {
                unreachable!("classify only accepts constant targets");
            };

            if from_where == FromWhere::Outside {
                if let Some(mut e) = ctx.begin_error(stat_loc, ErrorCode::TEnumOutsideEnumsDo) {
                    e.set_header(eco_format!(
                        "Definition of enum value `{}` must be within the `enums do` block for this `T::Enum`",
                        ctx.names.show(value_name)
                    ));
                    e.add_error_line(decl_loc, "Enclosing definition here");
                }
            }

            let singleton_name =
                ctx.names
                    .fresh_unique(UniqueNameKind::TEnum, value_name, 1);
            let class_cnst = mk::unresolved_constant(lhs_loc, mk::empty_tree(), singleton_name);

            let class_rhs = vec![
                mk::send1(
                    stat_loc,
                    mk::self_(stat_loc, known),
                    known.include,
                    mk::constant(stat_loc, Symbol::Singleton),
                ),
                mk::send0(stat_loc, mk::self_(stat_loc, known), known.final_bang),
            ];
            let class_def = mk::class_def(
                stat_loc,
                stat_loc,
                class_cnst.clone(),
                vec![enum_name.clone()],
                class_rhs,
            );

            let singleton_asgn = mk::assign(
                stat_loc,
                mk::unresolved_constant(lhs_loc, mk::empty_tree(), value_name),
                mk::let_(
                    stat_loc,
                    mk::send0(stat_loc, class_cnst.clone(), known.instance),
                    class_cnst,
                    known,
                ),
            );

            out.push(class_def);
            out.push(singleton_asgn);
        }
    }
}
