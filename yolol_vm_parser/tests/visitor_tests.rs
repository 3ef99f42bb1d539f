//! Visitor engine behaviour on NOLOL trees

use yolol_vm_parser::ast::nolol::{Element, StatementLine};
use yolol_vm_parser::ast::{Expr, Stmt};
use yolol_vm_parser::{parse_nolol, walk, NodeMut, Phase, Visit, Visitor};

/// Replaces `insert twice(...)` with two copies of a statement line that
/// itself contains another insertion target, checking that chained
/// rewrites reach nested blocks
struct Expand {
    expansions: usize,
}

impl Visitor for Expand {
    type Error = String;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, String> {
        match (node, phase) {
            (NodeMut::Element(Element::Insert(insert)), Phase::Pre) if insert.name == "twice" => {
                self.expansions += 1;
                let line = StatementLine::new(
                    vec![Stmt::assign("hit", Expr::number("1", insert.span.clone()))],
                    insert.span.clone(),
                );
                Ok(Visit::replace([Element::Line(line.clone()), Element::Line(line)]))
            }
            (NodeMut::Element(Element::Insert(insert)), Phase::Pre) => {
                Err(format!("unknown macro {}", insert.name))
            }
            (NodeMut::Expr(Expr::Deref(d)), Phase::Single) if d.variable == "old" => {
                Ok(Visit::with(Expr::var("new", d.span.clone())))
            }
            _ => Ok(Visit::Continue),
        }
    }
}

#[test]
fn test_replacements_inside_nested_blocks() {
    let mut program = parse_nolol("while 1 do\n  if x then\n    insert twice()\n  end\nend").unwrap();
    let mut visitor = Expand { expansions: 0 };
    walk(&mut program, &mut visitor).unwrap();
    assert_eq!(visitor.expansions, 1);

    let Element::While(w) = &program.elements[0] else {
        panic!("expected while");
    };
    let Element::If(mif) = &w.block.elements[0] else {
        panic!("expected if");
    };
    assert_eq!(mif.blocks[0].elements.len(), 2);
}

#[test]
fn test_expression_replacement_in_place() {
    let mut program = parse_nolol("a = old + old * 2").unwrap();
    walk(&mut program, &mut Expand { expansions: 0 }).unwrap();
    let printed = match &program.elements[0] {
        Element::Line(l) => yolol_vm_parser::Printer::new()
            .print_statements(&l.statements)
            .unwrap(),
        _ => unreachable!(),
    };
    assert_eq!(printed, "a=new+new*2");
}

#[test]
fn test_errors_propagate_from_deep_nodes() {
    let mut program = parse_nolol("if a then\n  insert nothing()\nend").unwrap();
    let result = walk(&mut program, &mut Expand { expansions: 0 });
    assert_eq!(result, Err("unknown macro nothing".to_string()));
}

/// Counts child-index phases on a multi-line if
struct BranchCounter {
    branches: Vec<usize>,
    saw_else: bool,
}

impl Visitor for BranchCounter {
    type Error = ();

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, ()> {
        if let NodeMut::Element(Element::If(_)) = node {
            match phase {
                Phase::Child(i) => self.branches.push(i),
                Phase::Inter1 => self.saw_else = true,
                _ => {}
            }
        }
        Ok(Visit::Continue)
    }
}

#[test]
fn test_multiline_if_phases() {
    let mut program =
        parse_nolol("if a then\n x=1\nelse if b then\n x=2\nelse\n x=3\nend").unwrap();
    let mut counter = BranchCounter {
        branches: Vec::new(),
        saw_else: false,
    };
    walk(&mut program, &mut counter).unwrap();
    assert_eq!(counter.branches, vec![0, 1]);
    assert!(counter.saw_else);
}

#[test]
fn test_clone_is_a_deep_copy() {
    let original = parse_nolol("a = old").unwrap();
    let mut copy = original.clone();
    walk(&mut copy, &mut Expand { expansions: 0 }).unwrap();
    assert_ne!(copy, original);
}
