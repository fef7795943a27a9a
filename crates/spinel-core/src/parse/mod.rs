// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The parse-tree data model.
//!
//! The parser (a sibling crate) produces one [`Node`] per syntactic form of
//! the surface language — concrete syntax, before any lowering. The shape of
//! this tree is fixed by the parser; the lowering core consumes it read-only
//! and by move.
//!
//! A node is a [`Loc`] plus a [`NodeKind`], mirroring the lexer's
//! token-plus-kind layout. Child slots that the grammar allows to be absent
//! are `Option<Box<Node>>`; desugaring treats an absent child as an empty
//! tree. Numeric literals keep their raw source text (underscores and all)
//! because the lowering, not the parser, owns numeric range diagnostics.

use ecow::EcoString;

use crate::names::NameRef;
use crate::source_analysis::Loc;

/// A single parse-tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Source location of the whole construct.
    pub loc: Loc,
    /// The syntactic form.
    pub kind: NodeKind,
}

impl Node {
    /// Creates a new node.
    #[must_use]
    pub fn new(loc: Loc, kind: NodeKind) -> Self {
        Self { loc, kind }
    }

    /// The grammar-level name of this node, for diagnostics.
    #[must_use]
    pub fn node_name(&self) -> &'static str {
        self.kind.node_name()
    }
}

/// Every syntactic form the parser can produce.
///
/// Lowering must be total over this sum: the handful of forms the checker
/// does not model (`Redo`, flip-flops, …) still desugar — to an empty tree
/// plus an "unsupported node" diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ── Literals ─────────────────────────────────────────────────────────
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,
    /// An integer literal, raw source text (`1_000`, `~0`).
    Integer(EcoString),
    /// A float literal, raw source text.
    Float(EcoString),
    /// A complex literal, raw source text without the trailing `i`.
    Complex(EcoString),
    /// A rational literal, raw source text without the trailing `r`.
    Rational(EcoString),
    /// A plain (non-interpolated) string literal.
    String(NameRef),
    /// A plain symbol literal.
    Symbol(NameRef),
    /// An interpolated string: alternating string and expression parts.
    DString(Vec<Node>),
    /// An interpolated symbol.
    DSymbol(Vec<Node>),
    /// A backtick command string.
    XString(Vec<Node>),
    /// A regular expression literal: interpolation parts plus options.
    Regexp {
        /// The pattern parts (as for [`NodeKind::DString`]).
        parts: Vec<Node>,
        /// The options node ([`NodeKind::Regopt`]), if any were written.
        opts: Option<Box<Node>>,
    },
    /// Regular-expression option letters (`imx…`).
    Regopt(EcoString),
    /// `__FILE__`
    FileLiteral,
    /// `__LINE__`
    LineLiteral,
    /// `__ENCODING__`
    EncodingLiteral,

    // ── Variables and constants ──────────────────────────────────────────
    /// `self`
    SelfKw,
    /// A local variable read.
    LVar(NameRef),
    /// A local variable in assignment position.
    LVarLhs(NameRef),
    /// An instance variable read (`@a`).
    IVar(NameRef),
    /// An instance variable in assignment position.
    IVarLhs(NameRef),
    /// A global variable read (`$a`).
    GVar(NameRef),
    /// A global variable in assignment position.
    GVarLhs(NameRef),
    /// A class variable read (`@@a`).
    CVar(NameRef),
    /// A class variable in assignment position.
    CVarLhs(NameRef),
    /// A numbered regexp capture reference (`$1`).
    NthRef(u32),
    /// A named regexp back-reference (`` $` ``, `$&`).
    Backref(NameRef),
    /// A constant read, optionally scoped (`A::B`).
    Const {
        /// The scope expression, or `None` for an unqualified constant.
        scope: Option<Box<Node>>,
        /// The constant's own name.
        name: NameRef,
    },
    /// A constant in assignment position.
    ConstLhs {
        /// The scope expression, or `None` for an unqualified constant.
        scope: Option<Box<Node>>,
        /// The constant's own name.
        name: NameRef,
    },
    /// The root scope anchor (`::A` starts from here).
    Cbase,

    // ── Sends and blocks ─────────────────────────────────────────────────
    /// A method call.
    Send {
        /// The receiver, or `None` for an implicit-`self` call.
        receiver: Option<Box<Node>>,
        /// The method name.
        method: NameRef,
        /// The arguments, in source order.
        args: Vec<Node>,
    },
    /// A safe-navigation call (`recv&.m`).
    CSend {
        /// The receiver (always present; `&.` requires one).
        receiver: Box<Node>,
        /// The method name.
        method: NameRef,
        /// The arguments, in source order.
        args: Vec<Node>,
    },
    /// A literal block attached to a send.
    Block {
        /// The send (or safe-navigation send) the block attaches to.
        send: Box<Node>,
        /// The block's parameter list ([`NodeKind::Args`]), if any.
        args: Option<Box<Node>>,
        /// The block body, if any.
        body: Option<Box<Node>>,
    },
    /// A block-pass argument (`&blk` or `&:sym`).
    BlockPass(Box<Node>),
    /// `super` with an explicit argument list.
    Super(Vec<Node>),
    /// `super` with no parentheses: forwards the enclosing method's args.
    ZSuper,
    /// `yield`
    Yield(Vec<Node>),

    // ── Operators and assignment ─────────────────────────────────────────
    /// Short-circuit `and` / `&&`.
    And {
        /// Left operand.
        left: Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },
    /// Short-circuit `or` / `||`.
    Or {
        /// Left operand.
        left: Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },
    /// `lhs &&= rhs`
    AndAsgn {
        /// The assignment target.
        left: Box<Node>,
        /// The value.
        right: Box<Node>,
    },
    /// `lhs ||= rhs`
    OrAsgn {
        /// The assignment target.
        left: Box<Node>,
        /// The value.
        right: Box<Node>,
    },
    /// `lhs op= rhs` for any other operator.
    OpAsgn {
        /// The assignment target.
        left: Box<Node>,
        /// The operator name (without the `=`).
        op: NameRef,
        /// The value.
        right: Box<Node>,
    },
    /// A plain assignment.
    Assign {
        /// The assignment target.
        lhs: Box<Node>,
        /// The value.
        rhs: Box<Node>,
    },
    /// A destructuring assignment (`a, b = rhs`).
    Masgn {
        /// The target pattern (always [`NodeKind::Mlhs`]).
        lhs: Box<Node>,
        /// The value.
        rhs: Box<Node>,
    },
    /// The left-hand pattern of a destructuring assignment.
    Mlhs(Vec<Node>),
    /// A splatted slot inside an [`NodeKind::Mlhs`] (`*b`); the target may
    /// be absent (`a, * = rhs`).
    SplatLhs(Option<Box<Node>>),
    /// A splatted argument or array element (`*xs`).
    Splat(Box<Node>),
    /// A double-splatted hash element (`**h`).
    Kwsplat(Box<Node>),

    // ── Collections ──────────────────────────────────────────────────────
    /// An array literal.
    Array(Vec<Node>),
    /// A hash literal; elements are [`NodeKind::Pair`] or
    /// [`NodeKind::Kwsplat`].
    Hash(Vec<Node>),
    /// A key-value pair inside a hash literal.
    Pair {
        /// The key expression.
        key: Box<Node>,
        /// The value expression.
        value: Box<Node>,
    },
    /// An inclusive range (`a..b`).
    IRange {
        /// The lower bound, if written.
        from: Option<Box<Node>>,
        /// The upper bound, if written.
        to: Option<Box<Node>>,
    },
    /// An exclusive range (`a...b`).
    ERange {
        /// The lower bound, if written.
        from: Option<Box<Node>>,
        /// The upper bound, if written.
        to: Option<Box<Node>>,
    },

    // ── Sequencing and control flow ──────────────────────────────────────
    /// A statement sequence (implicit, or parenthesised).
    Begin(Vec<Node>),
    /// A `begin … end` sequence (distinct from [`NodeKind::Begin`]: it
    /// changes post-condition loop semantics).
    Kwbegin(Vec<Node>),
    /// An `if`/`unless`/ternary.
    If {
        /// The condition.
        condition: Box<Node>,
        /// The then-branch, if any.
        then_branch: Option<Box<Node>>,
        /// The else-branch, if any.
        else_branch: Option<Box<Node>>,
    },
    /// A leading-condition `while` loop.
    While {
        /// The condition.
        cond: Box<Node>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A trailing-condition `while` (`body while cond`).
    WhilePost {
        /// The condition.
        cond: Box<Node>,
        /// The body.
        body: Box<Node>,
    },
    /// A leading-condition `until` loop.
    Until {
        /// The condition.
        cond: Box<Node>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A trailing-condition `until` (`body until cond`).
    UntilPost {
        /// The condition.
        cond: Box<Node>,
        /// The body.
        body: Box<Node>,
    },
    /// A `for` loop.
    For {
        /// The iteration variable(s).
        vars: Box<Node>,
        /// The expression iterated over.
        expr: Box<Node>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A `case` expression.
    Case {
        /// The scrutinee, if any (`case` without one tests each `when`
        /// pattern as a plain condition).
        condition: Option<Box<Node>>,
        /// The `when` arms, in source order.
        whens: Vec<Node>,
        /// The `else` arm, if any.
        else_branch: Option<Box<Node>>,
    },
    /// One `when` arm of a `case`.
    When {
        /// The patterns tested by this arm.
        patterns: Vec<Node>,
        /// The arm body, if any.
        body: Option<Box<Node>>,
    },
    /// `return`, with zero or more values.
    Return(Vec<Node>),
    /// `break`, with zero or more values.
    Break(Vec<Node>),
    /// `next`, with zero or more values.
    Next(Vec<Node>),
    /// `redo`
    Redo,
    /// `retry`
    Retry,

    // ── Exceptions ───────────────────────────────────────────────────────
    /// A body with rescue clauses.
    Rescue {
        /// The protected body, if any.
        body: Option<Box<Node>>,
        /// The rescue clauses ([`NodeKind::Resbody`]).
        rescue: Vec<Node>,
        /// The `else` clause, if any.
        else_branch: Option<Box<Node>>,
    },
    /// One rescue clause.
    Resbody {
        /// The exception class list, if written.
        exception: Option<Box<Node>>,
        /// The binding variable, if written.
        var: Option<Box<Node>>,
        /// The clause body, if any.
        body: Option<Box<Node>>,
    },
    /// A body with an ensure clause.
    Ensure {
        /// The protected body, if any.
        body: Option<Box<Node>>,
        /// The ensure body, if any.
        ensure: Option<Box<Node>>,
    },

    // ── Definitions ──────────────────────────────────────────────────────
    /// A `module` definition.
    Module {
        /// Location of the `module Name` header.
        decl_loc: Loc,
        /// The module name (a constant path).
        name: Box<Node>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A `class` definition.
    Class {
        /// Location of the `class Name < Super` header.
        decl_loc: Loc,
        /// The class name (a constant path).
        name: Box<Node>,
        /// The superclass expression, if written.
        superclass: Option<Box<Node>>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A singleton-class reopening (`class << expr`).
    SClass {
        /// Location of the `class << expr` header.
        decl_loc: Loc,
        /// The expression whose singleton class is opened.
        expr: Box<Node>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// An instance method definition.
    DefMethod {
        /// Location of the `def name` header.
        decl_loc: Loc,
        /// The method name.
        name: NameRef,
        /// The parameter list ([`NodeKind::Args`]), if any.
        args: Option<Box<Node>>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A singleton method definition (`def expr.name`).
    DefS {
        /// Location of the `def expr.name` header.
        decl_loc: Loc,
        /// The singleton expression (`self` is the only supported one).
        singleton: Box<Node>,
        /// The method name.
        name: NameRef,
        /// The parameter list ([`NodeKind::Args`]), if any.
        args: Option<Box<Node>>,
        /// The body, if any.
        body: Option<Box<Node>>,
    },
    /// A parameter list.
    Args(Vec<Node>),
    /// A required positional parameter.
    Arg(NameRef),
    /// An optional positional parameter.
    Optarg {
        /// The parameter name.
        name: NameRef,
        /// Location of the name alone.
        name_loc: Loc,
        /// The default-value expression.
        default: Box<Node>,
    },
    /// A rest parameter (`*xs`).
    Restarg {
        /// The parameter name.
        name: NameRef,
        /// Location of the name alone.
        name_loc: Loc,
    },
    /// A required keyword parameter.
    Kwarg(NameRef),
    /// An optional keyword parameter.
    Kwoptarg {
        /// The parameter name.
        name: NameRef,
        /// Location of the name alone.
        name_loc: Loc,
        /// The default-value expression.
        default: Box<Node>,
    },
    /// A keyword-rest parameter (`**opts`).
    Kwrestarg(NameRef),
    /// A block parameter (`&blk`).
    Blockarg(NameRef),
    /// A block-local shadow parameter.
    Shadowarg(NameRef),

    // ── Miscellaneous statements ─────────────────────────────────────────
    /// `alias to from`
    Alias {
        /// The new name.
        from: Box<Node>,
        /// The existing name.
        to: Box<Node>,
    },
    /// `undef m1, m2`
    Undef(Vec<Node>),
    /// `defined?(expr)`
    Defined(Box<Node>),
    /// A `BEGIN { … }` block.
    Preexe(Option<Box<Node>>),
    /// An `END { … }` block.
    Postexe(Option<Box<Node>>),
    /// An inclusive flip-flop condition.
    IFlipflop {
        /// The left bound, if written.
        left: Option<Box<Node>>,
        /// The right bound, if written.
        right: Option<Box<Node>>,
    },
    /// An exclusive flip-flop condition.
    EFlipflop {
        /// The left bound, if written.
        left: Option<Box<Node>>,
        /// The right bound, if written.
        right: Option<Box<Node>>,
    },
    /// An implicit match against the current line (`if /re/`).
    MatchCurLine(Box<Node>),
}

impl NodeKind {
    /// The grammar-level name of this form, for diagnostics.
    #[must_use]
    pub fn node_name(&self) -> &'static str {
        match self {
            NodeKind::True => "True",
            NodeKind::False => "False",
            NodeKind::Nil => "Nil",
            NodeKind::Integer(_) => "Integer",
            NodeKind::Float(_) => "Float",
            NodeKind::Complex(_) => "Complex",
            NodeKind::Rational(_) => "Rational",
            NodeKind::String(_) => "String",
            NodeKind::Symbol(_) => "Symbol",
            NodeKind::DString(_) => "DString",
            NodeKind::DSymbol(_) => "DSymbol",
            NodeKind::XString(_) => "XString",
            NodeKind::Regexp { .. } => "Regexp",
            NodeKind::Regopt(_) => "Regopt",
            NodeKind::FileLiteral => "FileLiteral",
            NodeKind::LineLiteral => "LineLiteral",
            NodeKind::EncodingLiteral => "EncodingLiteral",
            NodeKind::SelfKw => "Self",
            NodeKind::LVar(_) => "LVar",
            NodeKind::LVarLhs(_) => "LVarLhs",
            NodeKind::IVar(_) => "IVar",
            NodeKind::IVarLhs(_) => "IVarLhs",
            NodeKind::GVar(_) => "GVar",
            NodeKind::GVarLhs(_) => "GVarLhs",
            NodeKind::CVar(_) => "CVar",
            NodeKind::CVarLhs(_) => "CVarLhs",
            NodeKind::NthRef(_) => "NthRef",
            NodeKind::Backref(_) => "Backref",
            NodeKind::Const { .. } => "Const",
            NodeKind::ConstLhs { .. } => "ConstLhs",
            NodeKind::Cbase => "Cbase",
            NodeKind::Send { .. } => "Send",
            NodeKind::CSend { .. } => "CSend",
            NodeKind::Block { .. } => "Block",
            NodeKind::BlockPass(_) => "BlockPass",
            NodeKind::Super(_) => "Super",
            NodeKind::ZSuper => "ZSuper",
            NodeKind::Yield(_) => "Yield",
            NodeKind::And { .. } => "And",
            NodeKind::Or { .. } => "Or",
            NodeKind::AndAsgn { .. } => "AndAsgn",
            NodeKind::OrAsgn { .. } => "OrAsgn",
            NodeKind::OpAsgn { .. } => "OpAsgn",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::Masgn { .. } => "Masgn",
            NodeKind::Mlhs(_) => "Mlhs",
            NodeKind::SplatLhs(_) => "SplatLhs",
            NodeKind::Splat(_) => "Splat",
            NodeKind::Kwsplat(_) => "Kwsplat",
            NodeKind::Array(_) => "Array",
            NodeKind::Hash(_) => "Hash",
            NodeKind::Pair { .. } => "Pair",
            NodeKind::IRange { .. } => "IRange",
            NodeKind::ERange { .. } => "ERange",
            NodeKind::Begin(_) => "Begin",
            NodeKind::Kwbegin(_) => "Kwbegin",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::WhilePost { .. } => "WhilePost",
            NodeKind::Until { .. } => "Until",
            NodeKind::UntilPost { .. } => "UntilPost",
            NodeKind::For { .. } => "For",
            NodeKind::Case { .. } => "Case",
            NodeKind::When { .. } => "When",
            NodeKind::Return(_) => "Return",
            NodeKind::Break(_) => "Break",
            NodeKind::Next(_) => "Next",
            NodeKind::Redo => "Redo",
            NodeKind::Retry => "Retry",
            NodeKind::Rescue { .. } => "Rescue",
            NodeKind::Resbody { .. } => "Resbody",
            NodeKind::Ensure { .. } => "Ensure",
            NodeKind::Module { .. } => "Module",
            NodeKind::Class { .. } => "Class",
            NodeKind::SClass { .. } => "SClass",
            NodeKind::DefMethod { .. } => "DefMethod",
            NodeKind::DefS { .. } => "DefS",
            NodeKind::Args(_) => "Args",
            NodeKind::Arg(_) => "Arg",
            NodeKind::Optarg { .. } => "Optarg",
            NodeKind::Restarg { .. } => "Restarg",
            NodeKind::Kwarg(_) => "Kwarg",
            NodeKind::Kwoptarg { .. } => "Kwoptarg",
            NodeKind::Kwrestarg(_) => "Kwrestarg",
            NodeKind::Blockarg(_) => "Blockarg",
            NodeKind::Shadowarg(_) => "Shadowarg",
            NodeKind::Alias { .. } => "Alias",
            NodeKind::Undef(_) => "Undef",
            NodeKind::Defined(_) => "Defined",
            NodeKind::Preexe(_) => "Preexe",
            NodeKind::Postexe(_) => "Postexe",
            NodeKind::IFlipflop { .. } => "IFlipflop",
            NodeKind::EFlipflop { .. } => "EFlipflop",
            NodeKind::MatchCurLine(_) => "MatchCurLine",
        }
    }
}
