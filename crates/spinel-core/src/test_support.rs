// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared test helpers: a harness owning the interner and diagnostic sink,
//! plus terse parse-node builders for writing lowering tests without a
//! parser.

use crate::context::{Context, FileKind};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::names::{NameRef, NameTable};
use crate::parse::{Node, NodeKind};
use crate::source_analysis::{FileId, Loc, Span};

/// Owns everything a [`Context`] borrows.
pub(crate) struct Harness {
    pub(crate) names: NameTable,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) source: String,
    pub(crate) file_kind: FileKind,
    pub(crate) autogen: bool,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_source("")
    }

    pub(crate) fn with_source(source: &str) -> Self {
        Self {
            names: NameTable::new(),
            diagnostics: Diagnostics::new(),
            source: source.to_string(),
            file_kind: FileKind::Source,
            autogen: false,
        }
    }

    pub(crate) fn rbi() -> Self {
        let mut harness = Self::new();
        harness.file_kind = FileKind::Rbi;
        harness
    }

    pub(crate) fn ctx(&self) -> Context<'_> {
        Context {
            names: &self.names,
            diagnostics: &self.diagnostics,
            file: FileId(0),
            file_kind: self.file_kind,
            source: &self.source,
            autogen: self.autogen,
        }
    }

    pub(crate) fn loc(&self, start: u32, end: u32) -> Loc {
        Loc::new(FileId(0), Span::new(start, end))
    }

    pub(crate) fn name(&self, text: &str) -> NameRef {
        self.names.intern_utf8(text)
    }

    pub(crate) fn cname(&self, text: &str) -> NameRef {
        self.names.intern_constant(text)
    }

    pub(crate) fn drained(&self) -> Vec<Diagnostic> {
        self.diagnostics.drain_sorted()
    }

    // ── Parse-node builders ──────────────────────────────────────────────

    pub(crate) fn node(&self, kind: NodeKind) -> Node {
        Node::new(self.loc(0, 1), kind)
    }

    pub(crate) fn lvar(&self, name: &str) -> Node {
        self.node(NodeKind::LVar(self.name(name)))
    }

    pub(crate) fn lvar_lhs(&self, name: &str) -> Node {
        self.node(NodeKind::LVarLhs(self.name(name)))
    }

    pub(crate) fn ivar_lhs(&self, name: &str) -> Node {
        self.node(NodeKind::IVarLhs(self.name(name)))
    }

    pub(crate) fn int(&self, raw: &str) -> Node {
        self.node(NodeKind::Integer(raw.into()))
    }

    pub(crate) fn str_lit(&self, text: &str) -> Node {
        self.node(NodeKind::String(self.name(text)))
    }

    pub(crate) fn sym_lit(&self, text: &str) -> Node {
        self.node(NodeKind::Symbol(self.name(text)))
    }

    pub(crate) fn const_(&self, scope: Option<Node>, name: &str) -> Node {
        self.node(NodeKind::Const {
            scope: scope.map(Box::new),
            name: self.cname(name),
        })
    }

    pub(crate) fn send(&self, receiver: Option<Node>, method: &str, args: Vec<Node>) -> Node {
        self.node(NodeKind::Send {
            receiver: receiver.map(Box::new),
            method: self.name(method),
            args,
        })
    }

    pub(crate) fn csend(&self, receiver: Node, method: &str, args: Vec<Node>) -> Node {
        self.node(NodeKind::CSend {
            receiver: Box::new(receiver),
            method: self.name(method),
            args,
        })
    }

    pub(crate) fn begin(&self, stmts: Vec<Node>) -> Node {
        self.node(NodeKind::Begin(stmts))
    }

    pub(crate) fn args(&self, names: &[&str]) -> Node {
        let list = names
            .iter()
            .map(|n| self.node(NodeKind::Arg(self.name(n))))
            .collect();
        self.node(NodeKind::Args(list))
    }

    pub(crate) fn def_method(&self, name: &str, args: Option<Node>, body: Option<Node>) -> Node {
        self.node(NodeKind::DefMethod {
            decl_loc: self.loc(0, 1),
            name: self.name(name),
            args: args.map(Box::new),
            body: body.map(Box::new),
        })
    }

    pub(crate) fn masgn(&self, lhs: Vec<Node>, rhs: Node) -> Node {
        self.node(NodeKind::Masgn {
            lhs: Box::new(self.node(NodeKind::Mlhs(lhs))),
            rhs: Box::new(rhs),
        })
    }

    pub(crate) fn splat_lhs(&self, var: Option<Node>) -> Node {
        self.node(NodeKind::SplatLhs(var.map(Box::new)))
    }

    pub(crate) fn splat(&self, var: Node) -> Node {
        self.node(NodeKind::Splat(Box::new(var)))
    }

    pub(crate) fn array(&self, elts: Vec<Node>) -> Node {
        self.node(NodeKind::Array(elts))
    }

    pub(crate) fn yield_(&self, exprs: Vec<Node>) -> Node {
        self.node(NodeKind::Yield(exprs))
    }
}
