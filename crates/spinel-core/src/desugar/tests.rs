// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shape tests for the lowering: each builds a parse tree by hand and
//! asserts the structure of the abstract tree that comes out.

use super::*;
use crate::ast::{ClassDefKind, LiteralValue, MethodFlags};
use crate::test_support::Harness;

fn lower(h: &Harness, node: Node) -> Expression {
    node_to_tree(h.ctx(), node).expect("lowering failed")
}

/// Unwraps the synthetic root class and returns the file's statements.
fn body_of(tree: Expression) -> Vec<Expression> {
    match tree {
        Expression::ClassDef { name, rhs, kind, .. } => {
            assert_eq!(kind, ClassDefKind::Class);
            assert!(
                matches!(*name, Expression::ConstantLit { symbol: Symbol::Root, .. }),
                "root class must be named by the root symbol"
            );
            rhs
        }
        other => panic!("expected the synthetic root class, got {other:?}"),
    }
}

fn lower_stat(h: &Harness, node: Node) -> Expression {
    let mut rhs = body_of(lower(h, node));
    assert_eq!(rhs.len(), 1, "expected a single lowered statement");
    rhs.remove(0)
}

// ── Top-level lift ────────────────────────────────────────────────────────

#[test]
fn file_statements_are_wrapped_in_the_root_class() {
    let h = Harness::new();
    let tree = lower(&h, h.begin(vec![h.int("1"), h.int("2")]));
    let rhs = body_of(tree);
    assert_eq!(rhs.len(), 2, "the sequence is flattened into the class body");
}

// ── Literals ──────────────────────────────────────────────────────────────

#[test]
fn integer_literals_accept_underscores_and_tilde() {
    let h = Harness::new();
    assert_eq!(
        lower_stat(&h, h.int("1_000")),
        Expression::Literal {
            loc: h.loc(0, 1),
            value: LiteralValue::Integer(1000)
        }
    );
    // `~1` is the bitwise complement, applied at lowering time.
    assert!(matches!(
        lower_stat(&h, h.int("~1")),
        Expression::Literal {
            value: LiteralValue::Integer(-2),
            ..
        }
    ));
    assert!(h.drained().is_empty());
}

#[test]
fn out_of_range_integer_becomes_zero_with_diagnostic() {
    let h = Harness::new();
    let stat = lower_stat(&h, h.int("99999999999999999999999999"));
    assert!(matches!(
        stat,
        Expression::Literal {
            value: LiteralValue::Integer(0),
            ..
        }
    ));
    let diags = h.drained();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::IntegerOutOfRange);
}

#[test]
fn malformed_float_becomes_nan_with_diagnostic() {
    let h = Harness::new();
    let stat = lower_stat(&h, h.node(NodeKind::Float("1e999999".into())));
    let Expression::Literal {
        value: LiteralValue::Float(f),
        ..
    } = stat
    else {
        panic!("expected a float literal");
    };
    assert!(f.is_nan());
    assert_eq!(h.drained()[0].code, ErrorCode::FloatOutOfRange);
}

#[test]
fn empty_begin_is_nil_but_empty_kwbegin_is_empty() {
    let h = Harness::new();
    assert!(matches!(
        lower_stat(&h, h.begin(vec![])),
        Expression::Literal {
            value: LiteralValue::Nil,
            ..
        }
    ));
    assert!(lower_stat(&h, h.node(NodeKind::Kwbegin(vec![]))).is_empty_tree());
}

// ── Sends ─────────────────────────────────────────────────────────────────

#[test]
fn receiverless_send_gets_self_and_private_ok() {
    let h = Harness::new();
    let stat = lower_stat(&h, h.send(None, "foo", vec![]));
    let Expression::Send {
        recv, fun, flags, ..
    } = stat
    else {
        panic!("expected a send");
    };
    assert_eq!(fun, h.name("foo"));
    assert!(flags.contains(SendFlags::PRIVATE_OK));
    assert!(recv.is_self_reference(h.names.known().self_));
    // `self.` appears nowhere in the file: zero-length loc.
    assert_eq!(recv.loc().unwrap().span().unwrap().len(), 0);
}

#[test]
fn explicit_receiver_send_is_direct() {
    let h = Harness::new();
    let stat = lower_stat(&h, h.send(Some(h.lvar("x")), "bar", vec![h.int("1")]));
    let Expression::Send {
        recv, flags, args, ..
    } = stat
    else {
        panic!("expected a send");
    };
    assert!(!flags.contains(SendFlags::PRIVATE_OK));
    assert!(matches!(*recv, Expression::Local { .. }));
    assert_eq!(args.len(), 1);
}

#[test]
fn splat_argument_reroutes_through_magic() {
    let h = Harness::new();
    // f(*xs)
    let stat = lower_stat(&h, h.send(None, "f", vec![h.splat(h.lvar("xs"))]));
    let Expression::Send {
        recv, fun, args, ..
    } = stat
    else {
        panic!("expected a send");
    };
    assert!(matches!(
        *recv,
        Expression::ConstantLit {
            symbol: Symbol::Magic,
            ..
        }
    ));
    assert_eq!(fun, h.names.known().call_with_splat);
    // receiver, :f, and the collected argument array
    assert_eq!(args.len(), 3);
    assert_eq!(args[1].as_symbol_lit(), Some(h.name("f")));
}

#[test]
fn symbol_block_pass_materialises_a_block() {
    let h = Harness::new();
    // xs.map(&:to_s)
    let bp = h.node(NodeKind::BlockPass(Box::new(h.sym_lit("to_s"))));
    let stat = lower_stat(&h, h.send(Some(h.lvar("xs")), "map", vec![bp]));
    let Expression::Send { fun, block, .. } = stat else {
        panic!("expected a send");
    };
    assert_eq!(fun, h.name("map"));
    let block = block.expect("expected a materialised block");
    assert_eq!(block.args.len(), 1);
    let Expression::Send { fun, recv, .. } = block.body.as_ref() else {
        panic!("expected the block body to call the symbol");
    };
    assert_eq!(*fun, h.name("to_s"));
    assert!(matches!(recv.as_ref(), Expression::Local { .. }));
}

#[test]
fn dynamic_block_pass_routes_through_call_with_block() {
    let h = Harness::new();
    let bp = h.node(NodeKind::BlockPass(Box::new(h.lvar("blk"))));
    let stat = lower_stat(&h, h.send(Some(h.lvar("xs")), "map", vec![bp]));
    let Expression::Send { recv, fun, args, .. } = stat else {
        panic!("expected a send");
    };
    assert!(matches!(
        *recv,
        Expression::ConstantLit {
            symbol: Symbol::Magic,
            ..
        }
    ));
    assert_eq!(fun, h.names.known().call_with_block);
    // receiver, :map, the block value
    assert_eq!(args.len(), 3);
}

#[test]
fn block_given_p_tests_the_block_parameter() {
    let h = Harness::new();
    let body = h.send(None, "block_given?", vec![]);
    let method = lower_stat(&h, h.def_method("f", None, Some(body)));
    let Expression::MethodDef { body, .. } = method else {
        panic!("expected a method");
    };
    let Expression::If { cond, else_branch, .. } = *body else {
        panic!("expected block_given? to lower to a conditional");
    };
    assert!(
        matches!(*cond, Expression::Local { name, .. } if name == h.names.known().blk_arg)
    );
    assert!(matches!(
        *else_branch,
        Expression::Literal {
            value: LiteralValue::False,
            ..
        }
    ));
}

// ── Safe navigation ───────────────────────────────────────────────────────

#[test]
fn safe_navigation_binds_and_nil_checks_the_receiver() {
    let h = Harness::new();
    let stat = lower_stat(&h, h.csend(h.lvar("y"), "z", vec![]));
    let Expression::InsSeq { stats, expr, .. } = stat else {
        panic!("expected the safe-navigation sequence");
    };
    assert_eq!(stats.len(), 1);
    assert!(matches!(&stats[0], Expression::Assign { .. }));
    let Expression::If {
        cond,
        then_branch,
        else_branch,
        ..
    } = *expr
    else {
        panic!("expected the nil guard");
    };
    let Expression::Send { fun, args, .. } = *cond else {
        panic!("expected `== nil`");
    };
    assert_eq!(fun, h.name("=="));
    assert!(matches!(
        args[0],
        Expression::Literal {
            value: LiteralValue::Nil,
            ..
        }
    ));
    assert!(matches!(
        *then_branch,
        Expression::Literal {
            value: LiteralValue::Nil,
            ..
        }
    ));
    assert!(matches!(*else_branch, Expression::Send { fun, .. } if fun == h.name("z")));
}

// ── Compound assignment ───────────────────────────────────────────────────

#[test]
fn and_asgn_on_reference_short_circuits() {
    let h = Harness::new();
    let node = h.node(NodeKind::AndAsgn {
        left: Box::new(h.lvar_lhs("x")),
        right: Box::new(h.int("1")),
    });
    let Expression::If {
        cond,
        then_branch,
        else_branch,
        ..
    } = lower_stat(&h, node)
    else {
        panic!("expected a conditional");
    };
    assert!(matches!(*cond, Expression::Local { name, .. } if name == h.name("x")));
    assert!(matches!(*then_branch, Expression::Assign { .. }));
    assert!(matches!(*else_branch, Expression::Local { .. }));
}

#[test]
fn or_asgn_on_reference_writes_on_falsy() {
    let h = Harness::new();
    let node = h.node(NodeKind::OrAsgn {
        left: Box::new(h.lvar_lhs("x")),
        right: Box::new(h.int("1")),
    });
    let Expression::If {
        then_branch,
        else_branch,
        ..
    } = lower_stat(&h, node)
    else {
        panic!("expected a conditional");
    };
    assert!(matches!(*then_branch, Expression::Local { .. }));
    assert!(matches!(*else_branch, Expression::Assign { .. }));
}

#[test]
fn op_asgn_on_send_reads_once_and_writes_through_setter() {
    let h = Harness::new();
    // x.y += 1
    let node = h.node(NodeKind::OpAsgn {
        left: Box::new(h.send(Some(h.lvar("x")), "y", vec![])),
        op: h.name("+"),
        right: Box::new(h.int("1")),
    });
    let Expression::InsSeq { stats, expr, .. } = lower_stat(&h, node) else {
        panic!("expected the op-assign scaffolding");
    };
    // One temporary: the receiver.
    assert_eq!(stats.len(), 1);
    let Expression::Send { fun, args, .. } = *expr else {
        panic!("expected the setter send");
    };
    assert_eq!(h.names.show(fun), "y=");
    let Expression::Send { fun: plus, recv, .. } = &args[0] else {
        panic!("expected the combine send");
    };
    assert_eq!(*plus, h.name("+"));
    assert!(matches!(recv.as_ref(), Expression::Send { fun, .. } if *fun == h.name("y")));
}

#[test]
fn op_asgn_on_constant_is_rejected() {
    let h = Harness::new();
    let node = h.node(NodeKind::OpAsgn {
        left: Box::new(h.node(NodeKind::ConstLhs {
            scope: None,
            name: h.cname("A"),
        })),
        op: h.name("+"),
        right: Box::new(h.int("1")),
    });
    assert!(lower_stat(&h, node).is_empty_tree());
    assert_eq!(h.drained()[0].code, ErrorCode::NoConstantReassignment);
}

/// `x &&= y&.z`-style: the write is spliced into the safe-navigation
/// guard's else branch, and the read side binds receiver and arguments to
/// temporaries.
#[test]
fn and_asgn_over_safe_navigation_splices_the_write() {
    let h = Harness::new();
    let node = h.node(NodeKind::AndAsgn {
        left: Box::new(h.csend(h.lvar("y"), "z", vec![])),
        right: Box::new(h.int("1")),
    });
    let Expression::InsSeq { stats, expr, .. } = lower_stat(&h, node) else {
        panic!("expected a single sequence");
    };
    // The receiver binding from the safe-navigation lowering.
    assert_eq!(stats.len(), 1);
    let Expression::If { else_branch, .. } = *expr else {
        panic!("expected the nil guard");
    };
    let Expression::InsSeq { stats, expr, .. } = *else_branch else {
        panic!("expected the op-assign scaffolding in the else branch");
    };
    // Receiver temp plus the read-result temp.
    assert_eq!(stats.len(), 2);
    let Expression::If { then_branch, .. } = *expr else {
        panic!("expected the truthiness test");
    };
    let Expression::Send { fun, .. } = *then_branch else {
        panic!("expected the setter in the write branch");
    };
    assert_eq!(h.names.show(fun), "z=");
}

// ── Destructuring ─────────────────────────────────────────────────────────

#[test]
fn destructure_expands_and_indexes() {
    let h = Harness::new();
    // a, *b, c = rhs
    let node = h.masgn(
        vec![
            h.lvar_lhs("a"),
            h.splat_lhs(Some(h.lvar_lhs("b"))),
            h.lvar_lhs("c"),
        ],
        h.lvar("rhs"),
    );
    let Expression::InsSeq { stats, expr, .. } = lower_stat(&h, node) else {
        panic!("expected the destructuring sequence");
    };
    // rhs temp, expansion, and one assignment per target.
    assert_eq!(stats.len(), 5);
    let Expression::Assign { rhs: expand, .. } = &stats[1] else {
        panic!("expected the expansion binding");
    };
    let Expression::Send { recv, fun, args, .. } = expand.as_ref() else {
        panic!("expected the expand-splat call");
    };
    assert!(matches!(
        recv.as_ref(),
        Expression::ConstantLit {
            symbol: Symbol::Magic,
            ..
        }
    ));
    assert_eq!(*fun, h.names.known().expand_splat);
    // one element before the splat, one after
    assert!(matches!(
        args[1],
        Expression::Literal {
            value: LiteralValue::Integer(1),
            ..
        }
    ));
    assert!(matches!(
        args[2],
        Expression::Literal {
            value: LiteralValue::Integer(1),
            ..
        }
    ));
    // The splat target slices with a computed range.
    let Expression::Assign { rhs: slice, .. } = &stats[3] else {
        panic!("expected the splat assignment");
    };
    assert!(
        matches!(slice.as_ref(), Expression::Send { fun, .. } if *fun == h.names.known().slice)
    );
    // The whole assignment evaluates to the right-hand side's temporary.
    assert!(matches!(*expr, Expression::Local { .. }));
}

#[test]
fn rest_arg_in_destructure_is_flagged() {
    let h = Harness::new();
    let node = h.masgn(
        vec![
            h.lvar_lhs("a"),
            h.node(NodeKind::Restarg {
                name: h.name("r"),
                name_loc: h.loc(0, 1),
            }),
        ],
        h.lvar("rhs"),
    );
    lower_stat(&h, node);
    assert_eq!(
        h.drained()[0].code,
        ErrorCode::UnsupportedRestArgsDestructure
    );
}

// ── Collections ───────────────────────────────────────────────────────────

#[test]
fn array_splats_concat_in_order() {
    let h = Harness::new();
    // [*a, b, *c]  →  a.to_a.concat([b]).concat(c.to_a)
    let node = h.array(vec![
        h.splat(h.lvar("a")),
        h.lvar("b"),
        h.splat(h.lvar("c")),
    ]);
    let known = h.names.known();
    let Expression::Send { recv, fun, args, .. } = lower_stat(&h, node) else {
        panic!("expected the outer concat");
    };
    assert_eq!(fun, known.concat);
    assert!(
        matches!(&args[0], Expression::Send { fun, .. } if *fun == known.to_a),
        "the trailing splat normalises with to_a"
    );
    let Expression::Send { recv, fun, args, .. } = *recv else {
        panic!("expected the inner concat");
    };
    assert_eq!(fun, known.concat);
    assert!(matches!(&args[0], Expression::Array { elems, .. } if elems.len() == 1));
    assert!(
        matches!(*recv, Expression::Send { fun, .. } if fun == known.to_a),
        "the leading splat normalises with to_a"
    );
}

#[test]
fn hash_kwsplats_merge_in_order() {
    let h = Harness::new();
    // {a => 1, **x}
    let pair = h.node(NodeKind::Pair {
        key: Box::new(h.sym_lit("a")),
        value: Box::new(h.int("1")),
    });
    let kwsplat = h.node(NodeKind::Kwsplat(Box::new(h.lvar("x"))));
    let node = h.node(NodeKind::Hash(vec![pair, kwsplat]));
    let known = h.names.known();
    let Expression::Send { recv, fun, args, .. } = lower_stat(&h, node) else {
        panic!("expected the merge");
    };
    assert_eq!(fun, known.merge);
    assert!(matches!(*recv, Expression::Hash { .. }));
    assert!(matches!(&args[0], Expression::Send { fun, .. } if *fun == known.to_h));
}

// ── Strings ───────────────────────────────────────────────────────────────

#[test]
fn adjacent_string_parts_merge_before_interpolation() {
    let h = Harness::new();
    let node = h.node(NodeKind::DString(vec![
        h.str_lit("a"),
        h.str_lit("b"),
        h.lvar("x"),
    ]));
    let known = h.names.known();
    let Expression::Send { recv, fun, args, .. } = lower_stat(&h, node) else {
        panic!("expected the concat");
    };
    assert_eq!(fun, known.concat);
    assert_eq!(recv.as_string_lit(), Some(h.name("ab")));
    assert!(matches!(&args[0], Expression::Send { fun, .. } if *fun == known.to_s));
}

#[test]
fn dsymbol_interns_the_built_string() {
    let h = Harness::new();
    let node = h.node(NodeKind::DSymbol(vec![h.str_lit("a"), h.lvar("x")]));
    let known = h.names.known();
    let Expression::Send { fun, recv, .. } = lower_stat(&h, node) else {
        panic!("expected the intern call");
    };
    assert_eq!(fun, known.intern);
    assert!(matches!(*recv, Expression::Send { fun, .. } if fun == known.concat));
}

#[test]
fn regexp_builds_constructor_call_with_flags() {
    let h = Harness::new();
    let node = h.node(NodeKind::Regexp {
        parts: vec![h.str_lit("ab")],
        opts: Some(Box::new(h.node(NodeKind::Regopt("im".into())))),
    });
    let Expression::Send { recv, fun, args, .. } = lower_stat(&h, node) else {
        panic!("expected Regexp.new");
    };
    assert!(matches!(
        *recv,
        Expression::ConstantLit {
            symbol: Symbol::Regexp,
            ..
        }
    ));
    assert_eq!(fun, h.names.known().new);
    assert_eq!(args[0].as_string_lit(), Some(h.name("ab")));
    // 0 | 1 | 4 — folded left-to-right with `|` sends.
    let Expression::Send { fun, args: or_args, .. } = &args[1] else {
        panic!("expected the flag fold");
    };
    assert_eq!(*fun, h.name("|"));
    assert!(matches!(
        or_args[0],
        Expression::Literal {
            value: LiteralValue::Integer(4),
            ..
        }
    ));
}

// ── Control flow ──────────────────────────────────────────────────────────

#[test]
fn until_negates_the_condition() {
    let h = Harness::new();
    let node = h.node(NodeKind::Until {
        cond: Box::new(h.lvar("c")),
        body: Some(Box::new(h.int("1"))),
    });
    let Expression::While { cond, .. } = lower_stat(&h, node) else {
        panic!("expected a while");
    };
    assert!(matches!(*cond, Expression::Send { fun, .. } if fun == h.name("!")));
}

#[test]
fn post_condition_loop_over_kwbegin_runs_at_least_once() {
    let h = Harness::new();
    let node = h.node(NodeKind::WhilePost {
        cond: Box::new(h.lvar("c")),
        body: Box::new(h.node(NodeKind::Kwbegin(vec![h.int("1")]))),
    });
    let Expression::While { cond, body, .. } = lower_stat(&h, node) else {
        panic!("expected a while");
    };
    assert!(matches!(
        *cond,
        Expression::Literal {
            value: LiteralValue::True,
            ..
        }
    ));
    let Expression::InsSeq { expr, .. } = *body else {
        panic!("expected the body-then-breaker sequence");
    };
    let Expression::If { then_branch, .. } = *expr else {
        panic!("expected the breaker");
    };
    assert!(matches!(*then_branch, Expression::Break { .. }));
}

#[test]
fn post_condition_until_without_kwbegin_stays_a_plain_loop() {
    let h = Harness::new();
    let node = h.node(NodeKind::UntilPost {
        cond: Box::new(h.lvar("c")),
        body: Box::new(h.int("1")),
    });
    let Expression::While { cond, .. } = lower_stat(&h, node) else {
        panic!("expected a while");
    };
    assert!(matches!(*cond, Expression::Send { fun, .. } if fun == h.name("!")));
}

#[test]
fn case_lowers_to_nested_conditionals_with_triple_eq() {
    let h = Harness::new();
    let when1 = h.node(NodeKind::When {
        patterns: vec![h.int("1")],
        body: Some(Box::new(h.str_lit("one"))),
    });
    let when2 = h.node(NodeKind::When {
        patterns: vec![h.int("2")],
        body: Some(Box::new(h.str_lit("two"))),
    });
    let node = h.node(NodeKind::Case {
        condition: Some(Box::new(h.lvar("x"))),
        whens: vec![when1, when2],
        else_branch: Some(Box::new(h.str_lit("other"))),
    });
    let Expression::InsSeq { stats, expr, .. } = lower_stat(&h, node) else {
        panic!("expected the scrutinee binding");
    };
    assert_eq!(stats.len(), 1);
    let Expression::If { cond, else_branch, .. } = *expr else {
        panic!("expected the first arm");
    };
    assert!(matches!(*cond, Expression::Send { fun, .. } if fun == h.name("===")));
    assert!(matches!(*else_branch, Expression::If { .. }));
}

#[test]
fn for_over_a_local_becomes_each_with_a_block() {
    let h = Harness::new();
    let node = h.node(NodeKind::For {
        vars: Box::new(h.lvar_lhs("v")),
        expr: Box::new(h.lvar("xs")),
        body: Some(Box::new(h.send(None, "p", vec![h.lvar("v")]))),
    });
    let Expression::Send { fun, block, .. } = lower_stat(&h, node) else {
        panic!("expected the each call");
    };
    assert_eq!(fun, h.names.known().each);
    let block = block.expect("for lowers to a literal block");
    assert_eq!(block.args.len(), 1);
}

#[test]
fn multi_value_return_collects_an_array() {
    let h = Harness::new();
    let node = h.node(NodeKind::Return(vec![h.int("1"), h.int("2")]));
    let Expression::Return { expr, .. } = lower_stat(&h, node) else {
        panic!("expected a return");
    };
    assert!(matches!(*expr, Expression::Array { elems, .. } if elems.len() == 2));

    let bare = h.node(NodeKind::Return(vec![]));
    let Expression::Return { expr, .. } = lower_stat(&h, bare) else {
        panic!("expected a return");
    };
    assert!(expr.is_empty_tree());
}

// ── Methods and yield ─────────────────────────────────────────────────────

#[test]
fn method_without_block_param_synthesises_blk_arg() {
    let h = Harness::new();
    let method = lower_stat(&h, h.def_method("f", Some(h.args(&["a"])), None));
    let Expression::MethodDef { args, .. } = method else {
        panic!("expected a method");
    };
    assert_eq!(args.len(), 2);
    let Expression::BlockArg { loc, .. } = &args[1] else {
        panic!("expected the synthesised trailing block arg");
    };
    assert!(!loc.exists());
}

#[test]
fn yield_without_named_block_param_flags_and_calls_blk_arg() {
    let h = Harness::new();
    let body = h.yield_(vec![h.int("1")]);
    let method = lower_stat(&h, h.def_method("f", None, Some(body)));
    let Expression::MethodDef { body, .. } = method else {
        panic!("expected a method");
    };
    let Expression::Send { recv, fun, args, .. } = *body else {
        panic!("expected the block call");
    };
    assert_eq!(fun, h.names.known().call);
    assert!(
        matches!(*recv, Expression::Local { name, .. } if name == h.names.known().blk_arg)
    );
    assert_eq!(args.len(), 1);

    let diags = h.drained();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::UnnamedBlockParameter);
    assert!(diags[0].header.contains("`f`"));
    assert_eq!(diags[0].notes.len(), 1);
}

#[test]
fn yield_with_named_block_param_is_silent() {
    let h = Harness::new();
    let args = h.node(NodeKind::Args(vec![
        h.node(NodeKind::Blockarg(h.name("blk"))),
    ]));
    let method = lower_stat(&h, h.def_method("f", Some(args), Some(h.yield_(vec![]))));
    let Expression::MethodDef { body, .. } = method else {
        panic!("expected a method");
    };
    assert!(
        matches!(*body, Expression::Send { ref recv, .. }
            if matches!(recv.as_ref(), Expression::Local { name, .. } if *name == h.name("blk")))
    );
    assert!(h.drained().is_empty());
}

#[test]
fn yield_outside_a_method_calls_through_unsafe_nil() {
    let h = Harness::new();
    let Expression::Send { recv, .. } = lower_stat(&h, h.yield_(vec![])) else {
        panic!("expected the call");
    };
    let Expression::Send { recv: t, fun, .. } = *recv else {
        panic!("expected T.unsafe(nil)");
    };
    assert!(matches!(*t, Expression::ConstantLit { symbol: Symbol::T, .. }));
    assert_eq!(fun, h.names.known().unsafe_);
    assert!(h.drained().is_empty());
}

#[test]
fn pattern_parameter_destructures_into_the_body() {
    let h = Harness::new();
    // def f((a, b)); end
    let pattern = h.node(NodeKind::Mlhs(vec![h.lvar_lhs("a"), h.lvar_lhs("b")]));
    let args = h.node(NodeKind::Args(vec![pattern]));
    let method = lower_stat(&h, h.def_method("f", Some(args), None));
    let Expression::MethodDef { args, body, .. } = method else {
        panic!("expected a method");
    };
    // temp positional arg + synthesised block arg
    assert_eq!(args.len(), 2);
    let Expression::Arg { name, .. } = &args[0] else {
        panic!("expected the temp positional arg");
    };
    assert!(h.names.is_unique(*name), "destructure temp is hygienic");
    assert!(
        matches!(*body, Expression::InsSeq { .. }),
        "the destructuring assign is prepended to the body"
    );
}

#[test]
fn def_on_non_self_singleton_is_rejected() {
    let h = Harness::new();
    let node = h.node(NodeKind::DefS {
        decl_loc: h.loc(0, 1),
        singleton: Box::new(h.lvar("obj")),
        name: h.name("f"),
        args: None,
        body: None,
    });
    assert!(lower_stat(&h, node).is_empty_tree());
    assert_eq!(h.drained()[0].code, ErrorCode::InvalidSingletonDef);
}

#[test]
fn def_self_sets_the_self_method_flag() {
    let h = Harness::new();
    let node = h.node(NodeKind::DefS {
        decl_loc: h.loc(0, 1),
        singleton: Box::new(h.node(NodeKind::SelfKw)),
        name: h.name("f"),
        args: None,
        body: None,
    });
    let Expression::MethodDef { flags, .. } = lower_stat(&h, node) else {
        panic!("expected a method");
    };
    assert!(flags.contains(MethodFlags::SELF_METHOD));
}

#[test]
fn rbi_method_bodies_must_be_declaration_only() {
    let h = Harness::rbi();
    let method = h.def_method("f", None, Some(h.int("1")));
    lower_stat(&h, method);
    let diags = h.drained();
    assert_eq!(diags[0].code, ErrorCode::CodeInRbi);
    assert_eq!(diags[0].replacements.len(), 1);
    assert_eq!(diags[0].replacements[0].text, "");

    // An ivar assignment is the permitted declaration form.
    let h = Harness::rbi();
    let assign = h.node(NodeKind::Assign {
        lhs: Box::new(h.ivar_lhs("x")),
        rhs: Box::new(h.int("1")),
    });
    lower_stat(&h, h.def_method("g", None, Some(assign)));
    assert!(h.drained().is_empty());
}

// ── Classes and modules ───────────────────────────────────────────────────

#[test]
fn class_without_superclass_gets_the_todo_ancestor() {
    let h = Harness::new();
    let node = h.node(NodeKind::Class {
        decl_loc: h.loc(0, 1),
        name: Box::new(h.const_(None, "Foo")),
        superclass: None,
        body: None,
    });
    let Expression::ClassDef { kind, ancestors, .. } = lower_stat(&h, node) else {
        panic!("expected a class");
    };
    assert_eq!(kind, ClassDefKind::Class);
    assert!(matches!(
        ancestors[0],
        Expression::ConstantLit {
            symbol: Symbol::Todo,
            ..
        }
    ));
}

#[test]
fn singleton_class_of_self_is_a_nested_class_def() {
    let h = Harness::new();
    let node = h.node(NodeKind::SClass {
        decl_loc: h.loc(0, 1),
        expr: Box::new(h.node(NodeKind::SelfKw)),
        body: None,
    });
    let Expression::ClassDef { name, .. } = lower_stat(&h, node) else {
        panic!("expected a class");
    };
    assert!(matches!(
        *name,
        Expression::UnresolvedIdent {
            kind: IdentKind::Class,
            ..
        }
    ));
}

#[test]
fn singleton_class_of_other_expression_is_rejected() {
    let h = Harness::new();
    let node = h.node(NodeKind::SClass {
        decl_loc: h.loc(0, 1),
        expr: Box::new(h.lvar("obj")),
        body: None,
    });
    assert!(lower_stat(&h, node).is_empty_tree());
    assert_eq!(h.drained()[0].code, ErrorCode::InvalidSingletonDef);
}

// ── Blocks ────────────────────────────────────────────────────────────────

#[test]
fn literal_block_attaches_to_its_send() {
    let h = Harness::new();
    let node = h.node(NodeKind::Block {
        send: Box::new(h.send(Some(h.lvar("xs")), "map", vec![])),
        args: Some(Box::new(h.args(&["v"]))),
        body: Some(Box::new(h.lvar("v"))),
    });
    let Expression::Send { block, .. } = lower_stat(&h, node) else {
        panic!("expected the send");
    };
    let block = block.expect("the block must attach to the send");
    assert_eq!(block.args.len(), 1);
}

#[test]
fn literal_block_over_safe_navigation_attaches_inside_the_guard() {
    let h = Harness::new();
    let node = h.node(NodeKind::Block {
        send: Box::new(h.csend(h.lvar("xs"), "map", vec![])),
        args: None,
        body: Some(Box::new(h.int("1"))),
    });
    let Expression::InsSeq { expr, .. } = lower_stat(&h, node) else {
        panic!("expected the safe-navigation sequence");
    };
    let Expression::If { else_branch, .. } = *expr else {
        panic!("expected the guard");
    };
    let Expression::Send { block, .. } = *else_branch else {
        panic!("expected the guarded send");
    };
    assert!(block.is_some());
}

// ── Misc statements ───────────────────────────────────────────────────────

#[test]
fn super_lowers_to_a_private_ok_send() {
    let h = Harness::new();
    let Expression::Send { fun, flags, .. } =
        lower_stat(&h, h.node(NodeKind::Super(vec![h.int("1")])))
    else {
        panic!("expected a send");
    };
    assert_eq!(fun, h.names.known().super_);
    assert!(flags.contains(SendFlags::PRIVATE_OK));
}

#[test]
fn bare_super_forwards_the_enclosing_arguments() {
    let h = Harness::new();
    let Expression::Send { args, .. } = lower_stat(&h, h.node(NodeKind::ZSuper)) else {
        panic!("expected a send");
    };
    assert!(matches!(args[0], Expression::ZSuperArgs { .. }));
}

#[test]
fn defined_on_a_constant_path_lists_its_parts() {
    let h = Harness::new();
    let path = h.const_(Some(h.const_(None, "A")), "B");
    let Expression::Send { fun, args, .. } =
        lower_stat(&h, h.node(NodeKind::Defined(Box::new(path))))
    else {
        panic!("expected the query");
    };
    assert_eq!(fun, h.names.known().defined_p);
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].as_string_lit(), Some(h.cname("A")));
    assert_eq!(args[1].as_string_lit(), Some(h.cname("B")));
}

#[test]
fn defined_on_a_non_constant_clears_the_path() {
    let h = Harness::new();
    let Expression::Send { args, .. } =
        lower_stat(&h, h.node(NodeKind::Defined(Box::new(h.lvar("x")))))
    else {
        panic!("expected the query");
    };
    assert!(args.is_empty());
}

#[test]
fn undef_is_flagged_but_still_lowers() {
    let h = Harness::new();
    let node = h.node(NodeKind::Undef(vec![h.sym_lit("f")]));
    let Expression::Send { recv, .. } = lower_stat(&h, node) else {
        panic!("expected the kernel call");
    };
    assert!(matches!(
        *recv,
        Expression::ConstantLit {
            symbol: Symbol::Kernel,
            ..
        }
    ));
    assert_eq!(h.drained()[0].code, ErrorCode::UndefUsage);
}

#[test]
fn unsupported_nodes_lower_to_empty_with_a_diagnostic() {
    let h = Harness::new();
    assert!(lower_stat(&h, h.node(NodeKind::Redo)).is_empty_tree());
    let diags = h.drained();
    assert_eq!(diags[0].code, ErrorCode::UnsupportedNode);
    assert!(diags[0].header.contains("`Redo`"));
}

#[test]
fn line_literal_uses_the_line_index() {
    let h = Harness::with_source("x\ny\nz");
    let node = Node::new(h.loc(4, 4), NodeKind::LineLiteral);
    let tree = lower(&h, node);
    let mut rhs = body_of(tree);
    assert!(matches!(
        rhs.remove(0),
        Expression::Literal {
            value: LiteralValue::Integer(3),
            ..
        }
    ));
}

// ── Exceptions ────────────────────────────────────────────────────────────

#[test]
fn rescue_without_variable_freshens_a_temp() {
    let h = Harness::new();
    let resbody = h.node(NodeKind::Resbody {
        exception: Some(Box::new(h.array(vec![h.const_(None, "Error")]))),
        var: None,
        body: Some(Box::new(h.int("1"))),
    });
    let node = h.node(NodeKind::Rescue {
        body: Some(Box::new(h.int("0"))),
        rescue: vec![resbody],
        else_branch: None,
    });
    let Expression::Rescue { cases, ensure, .. } = lower_stat(&h, node) else {
        panic!("expected a rescue");
    };
    assert!(ensure.is_empty_tree());
    let Expression::RescueCase { exceptions, var, .. } = &cases[0] else {
        panic!("expected a rescue case");
    };
    assert_eq!(exceptions.len(), 1);
    let Expression::Local { name, .. } = var.as_ref() else {
        panic!("expected the binding local");
    };
    assert!(h.names.is_unique(*name), "unnamed rescue binds a fresh temp");
}

#[test]
fn ensure_attaches_to_an_inner_rescue() {
    let h = Harness::new();
    let resbody = h.node(NodeKind::Resbody {
        exception: None,
        var: None,
        body: None,
    });
    let rescue = h.node(NodeKind::Rescue {
        body: Some(Box::new(h.int("0"))),
        rescue: vec![resbody],
        else_branch: None,
    });
    let node = h.node(NodeKind::Ensure {
        body: Some(Box::new(rescue)),
        ensure: Some(Box::new(h.int("9"))),
    });
    let Expression::Rescue { cases, ensure, .. } = lower_stat(&h, node) else {
        panic!("expected the merged rescue");
    };
    assert_eq!(cases.len(), 1);
    assert!(matches!(
        *ensure,
        Expression::Literal {
            value: LiteralValue::Integer(9),
            ..
        }
    ));
}

#[test]
fn ensure_without_rescue_wraps_in_a_bare_rescue() {
    let h = Harness::new();
    let node = h.node(NodeKind::Ensure {
        body: Some(Box::new(h.int("0"))),
        ensure: Some(Box::new(h.int("9"))),
    });
    let Expression::Rescue { cases, .. } = lower_stat(&h, node) else {
        panic!("expected a rescue wrapper");
    };
    assert!(cases.is_empty());
}

// ── Internal failure model ────────────────────────────────────────────────

#[test]
fn malformed_tree_reports_one_internal_error_and_aborts() {
    let h = Harness::new();
    // A bare Mlhs is never produced by the parser at statement position.
    let node = h.node(NodeKind::Mlhs(vec![]));
    let err = node_to_tree(h.ctx(), node).expect_err("lowering must abort");
    assert!(err.loc().exists());
    let diags = h.drained();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::InternalError);
}
