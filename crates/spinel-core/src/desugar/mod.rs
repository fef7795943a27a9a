// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Desugaring: parse tree to abstract tree.
//!
//! This is the canonical lowering pass. Every syntactic form of the surface
//! language maps deterministically onto the small kernel in [`crate::ast`]:
//! compound assignment, safe navigation, string interpolation,
//! destructuring, `case`, and the loop/flow sugar all expand into sends,
//! assignments, conditionals, and sequences. Evaluation order is preserved
//! exactly — wherever a receiver or argument would be evaluated once in the
//! source, the expansion binds it to a hygienic temporary minted through
//! [`crate::names::NameTable::fresh_unique`].
//!
//! The pass is *total*: parse-tree forms the checker does not model lower to
//! an empty tree plus an `UnsupportedNode` diagnostic, and user-level
//! problems never abort lowering. Only structural invariant violations do,
//! as [`InternalError`]; the first one per tree also emits a located
//! `Internal::InternalError` diagnostic, and the file is abandoned.
//!
//! After lowering, the file's statements are wrapped in a synthetic root
//! [`Expression::ClassDef`] named by the root constant symbol — the one
//! shape the downstream verifier depends on.

use ecow::{EcoString, eco_format};
use miette::Diagnostic;
use thiserror::Error;

use crate::ast::builders as mk;
use crate::ast::{Expression, IdentKind, SendFlags};
use crate::context::Context;
use crate::diagnostics::ErrorCode;
use crate::names::{NameRef, UniqueNameKind};
use crate::parse::{Node, NodeKind};
use crate::source_analysis::Loc;
use crate::symbols::Symbol;

mod collections;
mod destructure;
mod method;
mod op_assign;
mod send;
mod strings;

#[cfg(test)]
mod tests;

/// A structural invariant violated while lowering.
///
/// These are bugs in the front end (or a parse tree of an impossible
/// shape), not user errors: the file's tree is abandoned rather than handed
/// downstream partially lowered.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("failed to lower parse tree: {message}")]
#[diagnostic(code(spinel::lower::internal))]
pub struct InternalError {
    message: EcoString,
    #[label("while lowering this")]
    span: Option<miette::SourceSpan>,
    loc: Loc,
}

impl InternalError {
    pub(crate) fn new(loc: Loc, message: impl Into<EcoString>) -> Self {
        Self {
            message: message.into(),
            span: loc.span().map(Into::into),
            loc,
        }
    }

    /// The location the violation was detected at.
    #[must_use]
    pub fn loc(&self) -> Loc {
        self.loc
    }

    /// The violation description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) type Result<T> = std::result::Result<T, InternalError>;

/// Per-scope desugaring state.
///
/// The unique counter resets at every method and class-body scope so
/// temporary names stay small; the enclosing block-arg name is what `yield`
/// lowers onto; the enclosing method loc/name localise diagnostics about
/// blocks the user never named.
pub(crate) struct DesugarContext<'a, 'c> {
    pub(crate) ctx: Context<'c>,
    pub(crate) unique_counter: &'a mut u16,
    pub(crate) enclosing_block_arg: Option<NameRef>,
    pub(crate) enclosing_method_loc: Option<Loc>,
    pub(crate) enclosing_method_name: Option<NameRef>,
}

impl DesugarContext<'_, '_> {
    /// Mints the next hygienic temporary derived from `base`.
    pub(crate) fn fresh(&mut self, base: NameRef) -> NameRef {
        *self.unique_counter += 1;
        self.ctx
            .names
            .fresh_unique(UniqueNameKind::Desugar, base, u32::from(*self.unique_counter))
    }
}

/// Lowers a file's parse tree to its abstract tree.
///
/// This is the single entry point for desugaring: it lowers `node`, wraps
/// the result in the synthetic root class, and converts the first internal
/// error into a located diagnostic before propagating it.
pub fn node_to_tree(ctx: Context<'_>, node: Node) -> std::result::Result<Expression, InternalError> {
    let mut unique_counter: u16 = 1;
    let mut dctx = DesugarContext {
        ctx,
        unique_counter: &mut unique_counter,
        enclosing_block_arg: None,
        enclosing_method_loc: None,
        enclosing_method_name: None,
    };
    let loc = node.loc;
    match node_to_tree_impl(&mut dctx, node) {
        Ok(tree) => Ok(lift_top_level(loc, tree)),
        Err(err) => {
            if let Some(mut e) = ctx.begin_error(err.loc(), ErrorCode::InternalError) {
                e.set_header("Failed to process tree");
            }
            Err(err)
        }
    }
}

/// Wraps a lowered file in the synthetic root class definition.
fn lift_top_level(loc: Loc, what: Expression) -> Expression {
    let rhs = match what {
        Expression::InsSeq { stats, expr, .. } => {
            let mut rhs = stats;
            rhs.push(*expr);
            rhs
        }
        other => vec![other],
    };
    mk::class_def(loc, loc, mk::constant(loc, Symbol::Root), Vec::new(), rhs)
}

/// Lowers an optional child; an absent child is an empty tree.
pub(crate) fn node_opt_to_tree(
    dctx: &mut DesugarContext<'_, '_>,
    node: Option<Box<Node>>,
) -> Result<Expression> {
    match node {
        Some(node) => node_to_tree_impl(dctx, *node),
        None => Ok(mk::empty_tree()),
    }
}

/// Emits an `UnsupportedNode` diagnostic and substitutes an empty tree.
fn unsupported_node(dctx: &mut DesugarContext<'_, '_>, loc: Loc, name: &str) -> Expression {
    if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::UnsupportedNode) {
        e.set_header(eco_format!("Unsupported node type `{name}`"));
    }
    mk::empty_tree()
}

/// Lowers a class or module body into its top-level statement list.
///
/// The unique counter resets here: each class body is its own scope for
/// temporary names.
fn scope_node_to_body(
    dctx: &mut DesugarContext<'_, '_>,
    node: Option<Box<Node>>,
) -> Result<Vec<Expression>> {
    let mut unique_counter: u16 = 1;
    let mut dctx1 = DesugarContext {
        ctx: dctx.ctx,
        unique_counter: &mut unique_counter,
        enclosing_block_arg: dctx.enclosing_block_arg,
        enclosing_method_loc: dctx.enclosing_method_loc,
        enclosing_method_name: dctx.enclosing_method_name,
    };
    match node {
        Some(node) => match node.kind {
            NodeKind::Begin(stmts) => {
                let mut body = Vec::with_capacity(stmts.len());
                for stat in stmts {
                    body.push(node_to_tree_impl(&mut dctx1, stat)?);
                }
                Ok(body)
            }
            _ => Ok(vec![node_to_tree_impl(&mut dctx1, *node)?]),
        },
        None => Ok(vec![mk::empty_tree()]),
    }
}

/// Builds `while true; body; if cond then break; end` — the at-least-once
/// loop shape post-condition loops over a `begin … end` body lower to.
fn do_until(loc: Loc, cond: Expression, body: Expression) -> Expression {
    let breaker = mk::if_(loc, cond, mk::break_(loc, mk::empty_tree()), mk::empty_tree());
    let break_with_body = mk::ins_seq1(loc, body, breaker);
    mk::while_(loc, mk::true_(loc), break_with_body)
}

#[expect(clippy::too_many_lines, reason = "one arm per parse-tree form")]
pub(crate) fn node_to_tree_impl(
    dctx: &mut DesugarContext<'_, '_>,
    node: Node,
) -> Result<Expression> {
    let loc = node.loc;
    debug_assert!(loc.exists(), "parse-tree node has no location");
    let node_name = node.node_name();
    let known = dctx.ctx.known();
    match node.kind {
        // The hot clauses: sends, constants, plain literals, sequences.
        NodeKind::Send {
            receiver,
            method,
            args,
        } => send::desugar_send(dctx, loc, receiver, method, args),
        NodeKind::Const { scope, name } => {
            let scope = node_opt_to_tree(dctx, scope)?;
            Ok(mk::unresolved_constant(loc, scope, name))
        }
        NodeKind::String(value) => Ok(mk::string(loc, value)),
        NodeKind::Symbol(value) => Ok(mk::symbol(loc, value)),
        NodeKind::LVar(name) | NodeKind::LVarLhs(name) => Ok(mk::local(loc, name)),
        NodeKind::DString(nodes) => strings::desugar_dstring(dctx, loc, nodes),
        NodeKind::Begin(stmts) => {
            if stmts.is_empty() {
                Ok(mk::nil(loc))
            } else {
                desugar_sequence(dctx, loc, stmts)
            }
        }

        NodeKind::And { left, right } => {
            let lhs = node_to_tree_impl(dctx, *left)?;
            let rhs = node_to_tree_impl(dctx, *right)?;
            if lhs.is_reference() {
                let cond = mk::cp_ref(&lhs)
                    .ok_or_else(|| InternalError::new(loc, "and lhs stopped being a reference"))?;
                Ok(mk::if_(loc, cond, rhs, lhs))
            } else {
                let temp_name = dctx.fresh(known.and_and);
                let temp = mk::assign_local(loc, temp_name, lhs);
                let iff = mk::if_(loc, mk::local(loc, temp_name), rhs, mk::local(loc, temp_name));
                Ok(mk::ins_seq1(loc, temp, iff))
            }
        }
        NodeKind::Or { left, right } => {
            let lhs = node_to_tree_impl(dctx, *left)?;
            let rhs = node_to_tree_impl(dctx, *right)?;
            if lhs.is_reference() {
                let cond = mk::cp_ref(&lhs)
                    .ok_or_else(|| InternalError::new(loc, "or lhs stopped being a reference"))?;
                Ok(mk::if_(loc, cond, lhs, rhs))
            } else {
                let temp_name = dctx.fresh(known.or_or);
                let temp = mk::assign_local(loc, temp_name, lhs);
                let iff = mk::if_(loc, mk::local(loc, temp_name), mk::local(loc, temp_name), rhs);
                Ok(mk::ins_seq1(loc, temp, iff))
            }
        }
        NodeKind::AndAsgn { left, right } => op_assign::desugar_and_asgn(dctx, loc, left, right),
        NodeKind::OrAsgn { left, right } => op_assign::desugar_or_asgn(dctx, loc, left, right),
        NodeKind::OpAsgn { left, op, right } => {
            op_assign::desugar_op_asgn(dctx, loc, left, op, right)
        }
        NodeKind::CSend {
            receiver,
            method,
            args,
        } => send::desugar_csend(dctx, loc, receiver, method, args),

        NodeKind::SelfKw => Ok(mk::self_(loc, known)),
        NodeKind::DSymbol(nodes) => strings::desugar_dsymbol(dctx, loc, nodes),
        NodeKind::FileLiteral => Ok(mk::string(loc, known.current_file)),
        NodeKind::ConstLhs { scope, name } => {
            let scope = node_opt_to_tree(dctx, scope)?;
            Ok(mk::unresolved_constant(loc, scope, name))
        }
        NodeKind::Cbase => Ok(mk::constant(loc, Symbol::Root)),
        NodeKind::Kwbegin(stmts) => {
            if stmts.is_empty() {
                Ok(mk::empty_tree())
            } else {
                desugar_sequence(dctx, loc, stmts)
            }
        }

        NodeKind::Module {
            decl_loc,
            name,
            body,
        } => {
            let body = scope_node_to_body(dctx, body)?;
            let name = node_to_tree_impl(dctx, *name)?;
            Ok(mk::module_def(loc, decl_loc, name, Vec::new(), body))
        }
        NodeKind::Class {
            decl_loc,
            name,
            superclass,
            body,
        } => {
            let body = scope_node_to_body(dctx, body)?;
            let ancestors = vec![match superclass {
                Some(superclass) => node_to_tree_impl(dctx, *superclass)?,
                None => mk::constant(loc, Symbol::Todo),
            }];
            let name = node_to_tree_impl(dctx, *name)?;
            Ok(mk::class_def(loc, decl_loc, name, ancestors, body))
        }
        NodeKind::SClass {
            decl_loc,
            expr,
            body,
        } => {
            // This stays a nested ClassDef in the tree; resolution gives it
            // the enclosing class's singleton class as its symbol.
            if !matches!(expr.kind, NodeKind::SelfKw) {
                if let Some(mut e) = dctx.ctx.begin_error(expr.loc, ErrorCode::InvalidSingletonDef)
                {
                    e.set_header(
                        "`class << EXPRESSION` is only supported for `class << self`",
                    );
                }
                return Ok(mk::empty_tree());
            }
            let body = scope_node_to_body(dctx, body)?;
            let name =
                mk::unresolved_ident(expr.loc, IdentKind::Class, known.singleton_class);
            Ok(mk::class_def(loc, decl_loc, name, Vec::new(), body))
        }
        NodeKind::DefMethod {
            decl_loc,
            name,
            args,
            body,
        } => method::build_method(dctx, loc, decl_loc, name, args, body, false),
        NodeKind::DefS {
            decl_loc,
            singleton,
            name,
            args,
            body,
        } => {
            if !matches!(singleton.kind, NodeKind::SelfKw) {
                if let Some(mut e) =
                    dctx.ctx.begin_error(singleton.loc, ErrorCode::InvalidSingletonDef)
                {
                    e.set_header(
                        "`def EXPRESSION.method` is only supported for `def self.method`",
                    );
                }
                return Ok(mk::empty_tree());
            }
            method::build_method(dctx, loc, decl_loc, name, args, body, true)
        }
        NodeKind::Block { send, args, body } => send::desugar_block(dctx, loc, send, args, body),

        NodeKind::While { cond, body } => {
            let cond = node_to_tree_impl(dctx, *cond)?;
            let body = node_opt_to_tree(dctx, body)?;
            Ok(mk::while_(loc, cond, body))
        }
        NodeKind::WhilePost { cond, body } => {
            let is_kwbegin = matches!(body.kind, NodeKind::Kwbegin(_));
            let cond = node_to_tree_impl(dctx, *cond)?;
            let body = node_to_tree_impl(dctx, *body)?;
            if is_kwbegin {
                Ok(do_until(loc, mk::send0(loc, cond, known.bang), body))
            } else {
                Ok(mk::while_(loc, cond, body))
            }
        }
        NodeKind::Until { cond, body } => {
            let cond = node_to_tree_impl(dctx, *cond)?;
            let body = node_opt_to_tree(dctx, body)?;
            Ok(mk::while_(loc, mk::send0(loc, cond, known.bang), body))
        }
        // Like WhilePost, with the condition negation on the other branch.
        // A non-`begin` body runs zero-or-more times, exactly as the
        // surface-language implementation behaves.
        NodeKind::UntilPost { cond, body } => {
            let is_kwbegin = matches!(body.kind, NodeKind::Kwbegin(_));
            let cond = node_to_tree_impl(dctx, *cond)?;
            let body = node_to_tree_impl(dctx, *body)?;
            if is_kwbegin {
                Ok(do_until(loc, cond, body))
            } else {
                Ok(mk::while_(loc, mk::send0(loc, cond, known.bang), body))
            }
        }

        NodeKind::Nil => Ok(mk::nil(loc)),
        NodeKind::True => Ok(mk::true_(loc)),
        NodeKind::False => Ok(mk::false_(loc)),
        NodeKind::IVar(name) | NodeKind::IVarLhs(name) => {
            Ok(mk::unresolved_ident(loc, IdentKind::Instance, name))
        }
        NodeKind::GVar(name) | NodeKind::GVarLhs(name) => {
            Ok(mk::unresolved_ident(loc, IdentKind::Global, name))
        }
        NodeKind::CVar(name) | NodeKind::CVarLhs(name) => {
            Ok(mk::unresolved_ident(loc, IdentKind::Class, name))
        }
        NodeKind::NthRef(n) => {
            let name = dctx.ctx.names.intern_utf8(&n.to_string());
            Ok(mk::unresolved_ident(loc, IdentKind::Global, name))
        }

        NodeKind::Assign { lhs, rhs } => {
            let lhs = node_to_tree_impl(dctx, *lhs)?;
            let rhs = node_to_tree_impl(dctx, *rhs)?;
            Ok(mk::assign(loc, lhs, rhs))
        }
        NodeKind::Masgn { lhs, rhs } => {
            let NodeKind::Mlhs(exprs) = lhs.kind else {
                return Err(InternalError::new(loc, "Masgn target is not an Mlhs"));
            };
            let rhs = node_to_tree_impl(dctx, *rhs)?;
            destructure::desugar_mlhs(dctx, loc, exprs, rhs)
        }

        NodeKind::Super(args) => {
            // A call to the method named `super`; synthesising a receiverless
            // send picks up the implicit self and PRIVATE_OK.
            let send = Node::new(
                loc,
                NodeKind::Send {
                    receiver: None,
                    method: known.super_,
                    args,
                },
            );
            node_to_tree_impl(dctx, send)
        }
        NodeKind::ZSuper => Ok(mk::send1(
            loc,
            mk::self_(loc, known),
            known.super_,
            Expression::ZSuperArgs { loc },
        )),
        NodeKind::Yield(exprs) => {
            let mut args = Vec::with_capacity(exprs.len());
            for expr in exprs {
                args.push(node_to_tree_impl(dctx, expr)?);
            }
            let recv = if let Some(block_arg) = dctx.enclosing_block_arg {
                if block_arg == known.blk_arg {
                    // The block parameter was synthesised; the user never
                    // named one, so point at the method header.
                    let method_loc = dctx.enclosing_method_loc.unwrap_or(loc);
                    let method_name = dctx
                        .enclosing_method_name
                        .map_or_else(EcoString::new, |n| dctx.ctx.names.show(n));
                    if let Some(mut e) =
                        dctx.ctx.begin_error(method_loc, ErrorCode::UnnamedBlockParameter)
                    {
                        e.set_header(eco_format!(
                            "Method `{method_name}` uses `yield` but does not mention a block parameter"
                        ));
                        e.add_error_line(loc, "Arising from use of `yield` in method body");
                    }
                }
                mk::local(loc, block_arg)
            } else {
                // yield outside any method body (class body, top level).
                mk::unsafe_(loc, mk::nil(loc), known)
            };
            Ok(mk::send(loc, recv, known.call, args, SendFlags::default()))
        }

        NodeKind::For { vars, expr, body } => desugar_for(dctx, loc, vars, expr, body),

        NodeKind::Integer(val) => Ok(desugar_integer(dctx, loc, &val)),
        NodeKind::Float(val) => Ok(desugar_float(dctx, loc, &val)),
        NodeKind::Complex(val) => {
            let kernel = mk::constant(loc, Symbol::Kernel);
            let fun = dctx.ctx.names.intern_utf8(Symbol::Complex.show());
            let value = dctx.ctx.names.intern_utf8(&val);
            Ok(mk::send2(
                loc,
                kernel,
                fun,
                mk::int(loc, 0),
                mk::string(loc, value),
            ))
        }
        NodeKind::Rational(val) => {
            let kernel = mk::constant(loc, Symbol::Kernel);
            let fun = dctx.ctx.names.intern_utf8(Symbol::Rational.show());
            let value = dctx.ctx.names.intern_utf8(&val);
            Ok(mk::send1(loc, kernel, fun, mk::string(loc, value)))
        }

        NodeKind::Array(elts) => collections::desugar_array(dctx, loc, elts),
        NodeKind::Hash(pairs) => collections::desugar_hash(dctx, loc, pairs),
        NodeKind::IRange { from, to } => {
            let range_name = dctx.ctx.names.intern_constant(Symbol::Range.show());
            let range = mk::unresolved_constant(loc, mk::empty_tree(), range_name);
            let from = node_opt_to_tree(dctx, from)?;
            let to = node_opt_to_tree(dctx, to)?;
            Ok(mk::send2(loc, range, known.new, from, to))
        }
        NodeKind::ERange { from, to } => {
            let range = mk::constant(loc, Symbol::Range);
            let from = node_opt_to_tree(dctx, from)?;
            let to = node_opt_to_tree(dctx, to)?;
            Ok(mk::send3(loc, range, known.new, from, to, mk::true_(loc)))
        }
        NodeKind::Regexp { parts, opts } => {
            let cnst = mk::constant(loc, Symbol::Regexp);
            let pattern = strings::desugar_dstring(dctx, loc, parts)?;
            let opts = match opts {
                Some(opts) => node_to_tree_impl(dctx, *opts)?,
                None => mk::int(loc, 0),
            };
            Ok(mk::send2(loc, cnst, known.new, pattern, opts))
        }
        NodeKind::Regopt(opts) => Ok(strings::desugar_regopt(dctx, loc, &opts)),

        NodeKind::Return(exprs) => {
            desugar_flow(dctx, loc, exprs, FlowKind::Return)
        }
        NodeKind::Break(exprs) => desugar_flow(dctx, loc, exprs, FlowKind::Break),
        NodeKind::Next(exprs) => desugar_flow(dctx, loc, exprs, FlowKind::Next),
        NodeKind::Retry => Ok(Expression::Retry { loc }),

        NodeKind::Rescue {
            body,
            rescue,
            else_branch,
        } => {
            let body = node_opt_to_tree(dctx, body)?;
            let mut cases = Vec::with_capacity(rescue.len());
            for case_node in rescue {
                let case_loc = case_node.loc;
                let case = node_to_tree_impl(dctx, case_node)?;
                if !matches!(case, Expression::RescueCase { .. }) {
                    return Err(InternalError::new(
                        case_loc,
                        "rescue clause did not lower to a RescueCase",
                    ));
                }
                cases.push(case);
            }
            let else_branch = node_opt_to_tree(dctx, else_branch)?;
            Ok(mk::rescue(loc, body, cases, else_branch, mk::empty_tree()))
        }
        NodeKind::Resbody {
            exception,
            var,
            body,
        } => desugar_resbody(dctx, loc, exception, var, body),
        NodeKind::Ensure { body, ensure } => {
            let body_expr = node_opt_to_tree(dctx, body)?;
            let ensure_expr = node_opt_to_tree(dctx, ensure)?;
            match body_expr {
                Expression::Rescue {
                    loc: rescue_loc,
                    body,
                    cases,
                    else_branch,
                    ..
                } => Ok(Expression::Rescue {
                    loc: rescue_loc,
                    body,
                    cases,
                    else_branch,
                    ensure: Box::new(ensure_expr),
                }),
                body_expr => Ok(mk::rescue(
                    loc,
                    body_expr,
                    Vec::new(),
                    mk::empty_tree(),
                    ensure_expr,
                )),
            }
        }

        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = node_to_tree_impl(dctx, *condition)?;
            let then_branch = node_opt_to_tree(dctx, then_branch)?;
            let else_branch = node_opt_to_tree(dctx, else_branch)?;
            Ok(mk::if_(loc, cond, then_branch, else_branch))
        }
        NodeKind::Case {
            condition,
            whens,
            else_branch,
        } => desugar_case(dctx, loc, condition, whens, else_branch),

        NodeKind::Splat(var) => {
            let var = node_to_tree_impl(dctx, *var)?;
            Ok(mk::splat(loc, var))
        }
        NodeKind::Alias { from, to } => {
            let from = node_to_tree_impl(dctx, *from)?;
            let to = node_to_tree_impl(dctx, *to)?;
            Ok(mk::send2(
                loc,
                mk::self_(loc, known),
                known.alias_method,
                from,
                to,
            ))
        }
        NodeKind::Defined(value) => {
            let value = node_to_tree_impl(dctx, *value)?;
            let loc = value.loc_or(loc);
            let mut args = Vec::new();
            let mut value = value;
            loop {
                match value {
                    Expression::EmptyTree => break,
                    Expression::UnresolvedConstantLit { loc, scope, name } => {
                        args.push(mk::string(loc, name));
                        value = *scope;
                    }
                    _ => {
                        // Non-constant operand: `defined?` degrades to a
                        // query with no path.
                        args.clear();
                        break;
                    }
                }
            }
            args.reverse();
            Ok(mk::send(
                loc,
                mk::constant(loc, Symbol::Magic),
                known.defined_p,
                args,
                SendFlags::default(),
            ))
        }
        NodeKind::LineLiteral => {
            let offset = loc.span().map_or(0, crate::source_analysis::Span::start);
            Ok(mk::int(loc, i64::from(dctx.ctx.line_of(offset))))
        }
        NodeKind::XString(nodes) => {
            let command = strings::desugar_dstring(dctx, loc, nodes)?;
            Ok(mk::send1(loc, mk::self_(loc, known), known.backtick, command))
        }
        NodeKind::Undef(exprs) => {
            if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::UndefUsage) {
                e.set_header("Unsupported method: undef");
            }
            let mut args = Vec::with_capacity(exprs.len());
            for expr in exprs {
                args.push(node_to_tree_impl(dctx, expr)?);
            }
            Ok(mk::send(
                loc,
                mk::constant(loc, Symbol::Kernel),
                known.undef,
                args,
                SendFlags::default(),
            ))
        }

        // Argument-list forms.
        NodeKind::Arg(name) => Ok(mk::arg(loc, name)),
        NodeKind::Restarg { name, name_loc } => {
            Ok(mk::rest_arg(loc, mk::arg(name_loc, name)))
        }
        NodeKind::Kwrestarg(name) => Ok(mk::rest_arg(
            loc,
            mk::keyword_arg(loc, mk::arg(loc, name)),
        )),
        NodeKind::Kwarg(name) => Ok(mk::keyword_arg(loc, mk::arg(loc, name))),
        NodeKind::Blockarg(name) => Ok(mk::block_arg(loc, mk::arg(loc, name))),
        NodeKind::Kwoptarg {
            name,
            name_loc,
            default,
        } => {
            let default = node_to_tree_impl(dctx, *default)?;
            Ok(mk::optional_arg(
                loc,
                mk::keyword_arg(loc, mk::arg(name_loc, name)),
                default,
            ))
        }
        NodeKind::Optarg {
            name,
            name_loc,
            default,
        } => {
            let default = node_to_tree_impl(dctx, *default)?;
            Ok(mk::optional_arg(loc, mk::arg(name_loc, name), default))
        }
        NodeKind::Shadowarg(name) => Ok(mk::shadow_arg(loc, mk::arg(loc, name))),

        // Forms the checker does not model.
        NodeKind::Preexe(_)
        | NodeKind::Postexe(_)
        | NodeKind::Backref(_)
        | NodeKind::EFlipflop { .. }
        | NodeKind::IFlipflop { .. }
        | NodeKind::MatchCurLine(_)
        | NodeKind::Redo
        | NodeKind::EncodingLiteral => Ok(unsupported_node(dctx, loc, node_name)),

        // Forms that only occur inside a parent handled above; reaching one
        // here means the parse tree is malformed.
        NodeKind::BlockPass(_)
        | NodeKind::Args(_)
        | NodeKind::Mlhs(_)
        | NodeKind::SplatLhs(_)
        | NodeKind::Kwsplat(_)
        | NodeKind::Pair { .. }
        | NodeKind::When { .. } => Err(InternalError::new(
            loc,
            eco_format!("unexpected bare `{node_name}` node"),
        )),
    }
}

/// Lowers a non-empty statement list to a flattened sequence.
fn desugar_sequence(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    mut stmts: Vec<Node>,
) -> Result<Expression> {
    let Some(last) = stmts.pop() else {
        return Err(InternalError::new(loc, "sequence with no statements"));
    };
    let mut stats = Vec::with_capacity(stmts.len());
    for stat in stmts {
        stats.push(node_to_tree_impl(dctx, stat)?);
    }
    let expr = node_to_tree_impl(dctx, last)?;
    Ok(mk::ins_seq(loc, stats, expr))
}

#[derive(Clone, Copy)]
enum FlowKind {
    Return,
    Break,
    Next,
}

/// Lowers `return`/`break`/`next`: no value is an empty tree, one value is
/// itself, several values collect into an array. A block-pass argument is
/// rejected with a diagnostic.
fn desugar_flow(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    exprs: Vec<Node>,
    kind: FlowKind,
) -> Result<Expression> {
    let wrap = |expr: Expression| match kind {
        FlowKind::Return => mk::return_(loc, expr),
        FlowKind::Break => mk::break_(loc, expr),
        FlowKind::Next => mk::next_(loc, expr),
    };
    if exprs.len() > 1 {
        let mut elems = Vec::with_capacity(exprs.len());
        for expr in exprs {
            if matches!(expr.kind, NodeKind::BlockPass(_)) {
                if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::UnsupportedNode) {
                    e.set_header("Block argument should not be given");
                }
                continue;
            }
            elems.push(node_to_tree_impl(dctx, expr)?);
        }
        Ok(wrap(mk::array(loc, elems)))
    } else if let Some(expr) = exprs.into_iter().next() {
        if matches!(expr.kind, NodeKind::BlockPass(_)) {
            if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::UnsupportedNode) {
                e.set_header("Block argument should not be given");
            }
            // A lone block-pass collapses to a bare break, whatever the
            // keyword was.
            Ok(mk::break_(loc, mk::empty_tree()))
        } else {
            Ok(wrap(node_to_tree_impl(dctx, expr)?))
        }
    } else {
        Ok(wrap(mk::empty_tree()))
    }
}

/// Lowers `case` to nested conditionals, testing each pattern with `===`
/// against a temporary bound from the scrutinee.
fn desugar_case(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    condition: Option<Box<Node>>,
    whens: Vec<Node>,
    else_branch: Option<Box<Node>>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut assign = None;
    let mut temp = None;
    let mut cond_loc = loc;
    if let Some(condition) = condition {
        cond_loc = condition.loc;
        let name = dctx.fresh(known.assign_temp);
        temp = Some(name);
        assign = Some(mk::assign_local(
            cond_loc,
            name,
            node_to_tree_impl(dctx, *condition)?,
        ));
    }

    let mut res = node_opt_to_tree(dctx, else_branch)?;
    for when in whens.into_iter().rev() {
        let when_loc = when.loc;
        let NodeKind::When { patterns, body } = when.kind else {
            return Err(InternalError::new(when_loc, "case arm is not a When"));
        };
        let mut cond: Option<Expression> = None;
        for pattern in patterns {
            let ctree = node_to_tree_impl(dctx, pattern)?;
            let test = if let Some(temp) = temp {
                let pattern_loc = ctree.loc_or(cond_loc);
                mk::send1(pattern_loc, ctree, known.triple_eq, mk::local(cond_loc, temp))
            } else {
                ctree
            };
            cond = Some(match cond {
                None => test,
                Some(prev) => {
                    let test_loc = test.loc_or(when_loc);
                    mk::if_(test_loc, test, mk::true_(test_loc), prev)
                }
            });
        }
        let body = node_opt_to_tree(dctx, body)?;
        res = mk::if_(
            when_loc,
            cond.unwrap_or_else(mk::empty_tree),
            body,
            res,
        );
    }
    if let Some(assign) = assign {
        res = mk::ins_seq1(loc, assign, res);
    }
    Ok(res)
}

/// Lowers `for v in e; body; end` to `e.each { |v| body }`, destructuring
/// through a temporary when the iteration variable is a pattern.
fn desugar_for(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    vars: Box<Node>,
    expr: Box<Node>,
    body: Option<Box<Node>>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let mut args = Vec::new();
    let mut pattern = None;

    let all_locals = matches!(
        &vars.kind,
        NodeKind::Mlhs(exprs) if exprs.iter().all(|c| matches!(c.kind, NodeKind::LVarLhs(_)))
    );
    let vars = *vars;
    let vars_loc = vars.loc;
    match vars.kind {
        NodeKind::Mlhs(exprs) if all_locals => {
            for c in exprs {
                args.push(node_to_tree_impl(dctx, c)?);
            }
        }
        kind @ NodeKind::LVarLhs(_) => {
            args.push(node_to_tree_impl(dctx, Node::new(vars_loc, kind))?);
        }
        kind @ NodeKind::Mlhs(_) => pattern = Some(Node::new(vars_loc, kind)),
        kind => {
            pattern = Some(Node::new(
                vars_loc,
                NodeKind::Mlhs(vec![Node::new(vars_loc, kind)]),
            ));
        }
    }

    let mut body = node_opt_to_tree(dctx, body)?;
    let block = if let Some(pattern) = pattern {
        let temp = dctx.fresh(known.for_temp);
        let masgn = Node::new(
            loc,
            NodeKind::Masgn {
                lhs: Box::new(pattern),
                rhs: Box::new(Node::new(loc, NodeKind::LVar(temp))),
            },
        );
        body = mk::ins_seq1(loc, node_to_tree_impl(dctx, masgn)?, body);
        mk::block1(loc, body, mk::arg(loc, temp))
    } else {
        mk::block(loc, body, args)
    };

    let recv = node_to_tree_impl(dctx, *expr)?;
    Ok(mk::send_with_block(
        loc,
        recv,
        known.each,
        Vec::new(),
        SendFlags::default(),
        block,
    ))
}

/// Parses an integer literal, accepting underscores and a leading `~`
/// (bitwise complement applied at lowering time). Out-of-range literals
/// produce `0` plus a diagnostic.
fn desugar_integer(dctx: &mut DesugarContext<'_, '_>, loc: Loc, raw: &str) -> Expression {
    let has_tilde = raw.contains('~');
    let cleaned: String = raw.chars().filter(|&c| c != '~' && c != '_').collect();
    let val = match cleaned.parse::<i64>() {
        Ok(val) => val,
        Err(_) => {
            if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::IntegerOutOfRange) {
                e.set_header(eco_format!("Unsupported integer literal: `{raw}`"));
            }
            0
        }
    };
    mk::int(loc, if has_tilde { !val } else { val })
}

/// Parses a float literal, accepting underscores. Out-of-range literals
/// produce NaN plus a diagnostic.
fn desugar_float(dctx: &mut DesugarContext<'_, '_>, loc: Loc, raw: &str) -> Expression {
    let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
    let val = match cleaned.parse::<f64>() {
        Ok(val) if val.is_finite() => val,
        _ => {
            if let Some(mut e) = dctx.ctx.begin_error(loc, ErrorCode::FloatOutOfRange) {
                e.set_header(eco_format!("Unsupported float literal: `{raw}`"));
            }
            f64::NAN
        }
    };
    mk::float(loc, val)
}

/// Lowers one rescue clause: collects the exception list, binds the rescue
/// variable (freshening a temporary when the source wrote none or wrote a
/// non-local), and produces a `RescueCase`.
fn desugar_resbody(
    dctx: &mut DesugarContext<'_, '_>,
    loc: Loc,
    exception: Option<Box<Node>>,
    var: Option<Box<Node>>,
    body: Option<Box<Node>>,
) -> Result<Expression> {
    let known = dctx.ctx.known();
    let exceptions_expr = node_opt_to_tree(dctx, exception)?;
    let mut exceptions = Vec::new();
    match exceptions_expr {
        Expression::EmptyTree => {}
        Expression::Array { elems, .. } => exceptions = elems,
        expr @ Expression::Send { .. } => {
            // A splatted exception list lowers to a to_a/concat chain; keep
            // it whole.
            let ok = matches!(
                &expr,
                Expression::Send { fun, .. } if *fun == known.to_a || *fun == known.concat
            );
            if !ok {
                return Err(InternalError::new(
                    loc,
                    "unexpected send shape in rescue exception list",
                ));
            }
            exceptions.push(expr);
        }
        other => {
            return Err(InternalError::new(
                other.loc_or(loc),
                "unexpected node shape in rescue exception list",
            ));
        }
    }

    let var_expr = node_opt_to_tree(dctx, var)?;
    let mut body = node_opt_to_tree(dctx, body)?;

    let mut var_loc = var_expr.loc_or(loc);
    let (var, leftover) = match var_expr {
        Expression::Local { name, .. } => (name, None),
        other => (dctx.fresh(known.rescue_temp), Some(other)),
    };

    match leftover {
        None => {}
        Some(Expression::EmptyTree) => var_loc = loc,
        Some(other) => {
            // The source bound something other than a plain local (an ivar,
            // a constant, …): forward the freshened temp into it.
            body = mk::ins_seq1(
                var_loc,
                mk::assign(var_loc, other, mk::local(var_loc, var)),
                body,
            );
        }
    }

    Ok(mk::rescue_case(
        loc,
        exceptions,
        mk::local(var_loc, var),
        body,
    ))
}
