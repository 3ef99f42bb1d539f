//! Shared helpers for parser integration tests

#![allow(dead_code)]

use yolol_vm_parser::ast::yolol;
use yolol_vm_parser::{walk, NodeMut, Phase, Span, Visit, Visitor};

/// Resets every span so trees can be compared structurally
pub struct SpanStripper;

impl Visitor for SpanStripper {
    type Error = std::convert::Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Self::Error> {
        if matches!(phase, Phase::Pre | Phase::Single) {
            match node {
                NodeMut::Expr(e) => *e.span_mut() = Span::empty(),
                NodeMut::Stmt(s) => *s.span_mut() = Span::empty(),
                NodeMut::Line(l) => l.span = Span::empty(),
                NodeMut::Element(e) => *e.span_mut() = Span::empty(),
                NodeMut::Block(b) => b.span = Span::empty(),
                NodeMut::YololProgram(_) | NodeMut::NololProgram(_) => {}
            }
        }
        Ok(Visit::Continue)
    }
}

pub fn strip_spans(mut program: yolol::Program) -> yolol::Program {
    if let Err(never) = walk(&mut program, &mut SpanStripper) {
        match never {}
    }
    program
}
