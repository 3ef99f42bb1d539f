//! Visitor and rewrite engine shared by both languages
//!
//! Every node implements [`Accept`]. A traversal calls
//! [`Visitor::visit`] on each node once per [`Phase`]: `Pre` before the
//! children, `Post` after them, `Single` for leaves, `Inter*` between groups
//! of children and `Child(i)` right before the i-th entry of an ordered child
//! list.
//!
//! A visitor rewrites the tree by returning [`Visit::Replace`]. The parent
//! holding the visited node splices the replacement nodes in place of the
//! original (zero, one or many of them) and, unless `skip` is set, accepts
//! every inserted node again so that rewrites can chain. Replacements are a
//! control-flow signal; they never leave the engine. A replacement arriving
//! at the traversal root, or carrying nodes of the wrong category for the
//! slot it lands in, is a bug in the visitor and panics.
//!
//! Owned trees are deep-copied with `Clone`.

use crate::ast::nolol::{self, Block, Element};
use crate::ast::yolol::{self, Line};
use crate::ast::{Expr, Stmt};

/// When a node is being visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before any child
    Pre,
    /// After all children
    Post,
    /// Leaf node without children
    Single,
    /// Between the first and second group of children
    Inter1,
    /// Between the second and third group of children
    Inter2,
    /// Between the third and fourth group of children
    Inter3,
    /// Before the child with this index
    Child(usize),
}

/// An owned node, used as replacement payload
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Expr(Expr),
    Stmt(Stmt),
    Line(Line),
    Element(Element),
    Block(Block),
}

impl From<Expr> for Node {
    fn from(value: Expr) -> Self {
        Node::Expr(value)
    }
}

impl From<Stmt> for Node {
    fn from(value: Stmt) -> Self {
        Node::Stmt(value)
    }
}

impl From<Line> for Node {
    fn from(value: Line) -> Self {
        Node::Line(value)
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<Block> for Node {
    fn from(value: Block) -> Self {
        Node::Block(value)
    }
}

/// A borrowed node handed to a visitor
#[derive(Debug)]
pub enum NodeMut<'a> {
    Expr(&'a mut Expr),
    Stmt(&'a mut Stmt),
    Line(&'a mut Line),
    Element(&'a mut Element),
    Block(&'a mut Block),
    YololProgram(&'a mut yolol::Program),
    NololProgram(&'a mut nolol::Program),
}

/// Nodes that take the place of a visited node
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub nodes: Vec<Node>,
    /// Do not visit the inserted nodes again
    pub skip: bool,
}

/// Outcome of visiting a node
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Visit {
    Continue,
    Replace(Replacement),
}

impl Visit {
    /// Replace the node and visit the replacement again
    pub fn replace<N: Into<Node>>(nodes: impl IntoIterator<Item = N>) -> Visit {
        Visit::Replace(Replacement {
            nodes: nodes.into_iter().map(Into::into).collect(),
            skip: false,
        })
    }

    /// Replace the node without visiting the replacement
    pub fn replace_skip<N: Into<Node>>(nodes: impl IntoIterator<Item = N>) -> Visit {
        Visit::Replace(Replacement {
            nodes: nodes.into_iter().map(Into::into).collect(),
            skip: true,
        })
    }

    /// Replace the node by a single node, without visiting it again
    pub fn with(node: impl Into<Node>) -> Visit {
        Visit::replace_skip([node.into()])
    }

    /// Delete the node from its parent list
    pub fn remove() -> Visit {
        Visit::Replace(Replacement {
            nodes: Vec::new(),
            skip: true,
        })
    }
}

/// A tree visitor
pub trait Visitor {
    type Error;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Self::Error>;
}

/// Double-dispatch entry point implemented by every node
pub trait Accept {
    /// Traverse this node and its children.
    ///
    /// Returns `Visit::Replace` when the node itself is to be replaced by its
    /// parent.
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error>;
}

/// Nodes that can appear in a child slot or child list
pub trait ChildNode: Accept + Sized {
    const KIND: &'static str;

    /// Unwrap a replacement node. Panics on a category mismatch.
    fn from_node(node: Node) -> Self;
}

macro_rules! child_node {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl ChildNode for $ty {
            const KIND: &'static str = $kind;

            fn from_node(node: Node) -> Self {
                match node {
                    Node::$variant(inner) => inner,
                    other => panic!(
                        "{} slot received a replacement of the wrong kind: {:?}",
                        Self::KIND,
                        other
                    ),
                }
            }
        }
    };
}

child_node!(Expr, Expr, "expression");
child_node!(Stmt, Stmt, "statement");
child_node!(Line, Line, "line");
child_node!(Element, Element, "element");
child_node!(Block, Block, "block");

/// Return early from `accept` when a visit asks for the node to be replaced
macro_rules! propagate {
    ($visit:expr) => {
        if let replaced @ Visit::Replace(_) = $visit {
            return Ok(replaced);
        }
    };
}

macro_rules! visit {
    ($visitor:expr, $node:expr, $phase:expr) => {
        propagate!($visitor.visit($node, $phase)?)
    };
}

/// Traverse a tree from its root.
///
/// # Panics
///
/// Panics if a visitor tries to replace the root itself.
pub fn walk<N: Accept, V: Visitor>(root: &mut N, visitor: &mut V) -> Result<(), V::Error> {
    match root.accept(visitor)? {
        Visit::Continue => Ok(()),
        Visit::Replace(_) => panic!("node replacement reached the root of the traversal"),
    }
}

/// Accept a node held in a single slot, applying replacements in place.
///
/// A replacement for a slot must consist of exactly one node.
pub fn accept_slot<T: ChildNode, V: Visitor>(slot: &mut T, visitor: &mut V) -> Result<(), V::Error> {
    loop {
        match slot.accept(visitor)? {
            Visit::Continue => return Ok(()),
            Visit::Replace(Replacement { nodes, skip }) => {
                let count = nodes.len();
                let Ok([node]) = <[Node; 1]>::try_from(nodes) else {
                    panic!("{} slot must be replaced by exactly one node, got {}", T::KIND, count);
                };
                *slot = T::from_node(node);
                if skip {
                    return Ok(());
                }
            }
        }
    }
}

/// Accept every entry of a child list, splicing replacements in place
pub fn accept_list<T: ChildNode, V: Visitor>(
    list: &mut Vec<T>,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut index = 0;
    while index < list.len() {
        index += accept_at(list, index, visitor)?;
    }
    Ok(())
}

/// Accept the entry at `index` and return how many entries now occupy its place
fn accept_at<T: ChildNode, V: Visitor>(
    list: &mut Vec<T>,
    index: usize,
    visitor: &mut V,
) -> Result<usize, V::Error> {
    match list[index].accept(visitor)? {
        Visit::Continue => Ok(1),
        Visit::Replace(Replacement { nodes, skip }) => {
            let count = nodes.len();
            list.splice(index..=index, nodes.into_iter().map(T::from_node));
            if skip {
                return Ok(count);
            }
            // Inserted nodes may expand again, so their final width is only
            // known after visiting them.
            let mut width = 0;
            for _ in 0..count {
                width += accept_at(list, index + width, visitor)?;
            }
            Ok(width)
        }
    }
}

/// Accept an ordered child list, visiting the parent with `Phase::Child(i)`
/// before each entry
fn accept_indexed<P, T: ChildNode, V: Visitor>(
    parent: &mut P,
    node: for<'a> fn(&'a mut P) -> NodeMut<'a>,
    list: for<'a> fn(&'a mut P) -> Option<&'a mut Vec<T>>,
    visitor: &mut V,
) -> Result<Visit, V::Error> {
    let mut index = 0;
    loop {
        match list(parent) {
            Some(children) if index < children.len() => {}
            _ => return Ok(Visit::Continue),
        }
        visit!(visitor, node(parent), Phase::Child(index));
        let Some(children) = list(parent) else {
            return Ok(Visit::Continue);
        };
        if index >= children.len() {
            return Ok(Visit::Continue);
        }
        index += accept_at(children, index, visitor)?;
    }
}

// ==================== Expressions and statements ====================

impl Accept for Expr {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        if self.is_leaf() {
            return visitor.visit(NodeMut::Expr(self), Phase::Single);
        }
        visit!(visitor, NodeMut::Expr(self), Phase::Pre);
        match self {
            Expr::Unary(u) => accept_slot(&mut *u.operand, visitor)?,
            Expr::Binary(b) => {
                accept_slot(&mut *b.lhs, visitor)?;
                visit!(visitor, NodeMut::Expr(self), Phase::Inter1);
                if let Expr::Binary(b) = self {
                    accept_slot(&mut *b.rhs, visitor)?;
                }
            }
            Expr::FuncCall(_) => propagate!(accept_indexed(
                self,
                |e| NodeMut::Expr(e),
                |e| match e {
                    Expr::FuncCall(call) => Some(&mut call.args),
                    _ => None,
                },
                visitor
            )?),
            _ => {}
        }
        visitor.visit(NodeMut::Expr(self), Phase::Post)
    }
}

impl Accept for Stmt {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        if !matches!(self, Stmt::Assignment(_) | Stmt::If(_) | Stmt::Goto(_)) {
            return visitor.visit(NodeMut::Stmt(self), Phase::Single);
        }
        visit!(visitor, NodeMut::Stmt(self), Phase::Pre);
        match self {
            Stmt::Assignment(a) => accept_slot(&mut a.value, visitor)?,
            Stmt::Goto(g) => accept_slot(&mut g.line, visitor)?,
            Stmt::If(s) => {
                accept_slot(&mut s.condition, visitor)?;
                visit!(visitor, NodeMut::Stmt(self), Phase::Inter1);
                if let Stmt::If(s) = self {
                    accept_list(&mut s.then_block, visitor)?;
                }
                if matches!(self, Stmt::If(s) if s.else_block.is_some()) {
                    visit!(visitor, NodeMut::Stmt(self), Phase::Inter2);
                    if let Stmt::If(s) = self {
                        if let Some(block) = &mut s.else_block {
                            accept_list(block, visitor)?;
                        }
                    }
                }
            }
            _ => {}
        }
        visitor.visit(NodeMut::Stmt(self), Phase::Post)
    }
}

// ==================== Flat language ====================

impl Accept for Line {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        visit!(visitor, NodeMut::Line(self), Phase::Pre);
        propagate!(accept_indexed(
            self,
            |l| NodeMut::Line(l),
            |l| Some(&mut l.statements),
            visitor
        )?);
        visitor.visit(NodeMut::Line(self), Phase::Post)
    }
}

impl Accept for yolol::Program {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        visit!(visitor, NodeMut::YololProgram(self), Phase::Pre);
        propagate!(accept_indexed(
            self,
            |p| NodeMut::YololProgram(p),
            |p| Some(&mut p.lines),
            visitor
        )?);
        visitor.visit(NodeMut::YololProgram(self), Phase::Post)
    }
}

// ==================== Higher-level language ====================

impl Accept for Element {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        if matches!(self, Element::Include(_)) {
            return visitor.visit(NodeMut::Element(self), Phase::Single);
        }
        visit!(visitor, NodeMut::Element(self), Phase::Pre);
        match self {
            Element::Line(_) => propagate!(accept_indexed(
                self,
                |e| NodeMut::Element(e),
                |e| match e {
                    Element::Line(line) => Some(&mut line.statements),
                    _ => None,
                },
                visitor
            )?),
            Element::If(_) => propagate!(accept_multiline_if(self, visitor)?),
            Element::While(w) => {
                accept_slot(&mut w.condition, visitor)?;
                visit!(visitor, NodeMut::Element(self), Phase::Inter1);
                if let Element::While(w) = self {
                    accept_slot(&mut w.block, visitor)?;
                }
            }
            Element::Wait(w) => accept_slot(&mut w.condition, visitor)?,
            Element::Define(d) => accept_slot(&mut d.value, visitor)?,
            Element::Macro(m) => accept_slot(&mut m.block, visitor)?,
            Element::Insert(_) => propagate!(accept_indexed(
                self,
                |e| NodeMut::Element(e),
                |e| match e {
                    Element::Insert(insert) => Some(&mut insert.arguments),
                    _ => None,
                },
                visitor
            )?),
            Element::Include(_) => {}
        }
        visitor.visit(NodeMut::Element(self), Phase::Post)
    }
}

/// Conditions and blocks of each branch, then `Inter1` and the else block
fn accept_multiline_if<V: Visitor>(
    element: &mut Element,
    visitor: &mut V,
) -> Result<Visit, V::Error> {
    let mut index = 0;
    loop {
        match element {
            Element::If(mif) if index < mif.conditions.len() => {}
            _ => break,
        }
        visit!(visitor, NodeMut::Element(element), Phase::Child(index));
        if let Element::If(mif) = element {
            if let Some(condition) = mif.conditions.get_mut(index) {
                accept_slot(condition, visitor)?;
            }
            if let Some(block) = mif.blocks.get_mut(index) {
                accept_slot(block, visitor)?;
            }
        }
        index += 1;
    }
    if matches!(element, Element::If(mif) if mif.else_block.is_some()) {
        visit!(visitor, NodeMut::Element(element), Phase::Inter1);
        if let Element::If(mif) = element {
            if let Some(block) = &mut mif.else_block {
                accept_slot(block, visitor)?;
            }
        }
    }
    Ok(Visit::Continue)
}

impl Accept for Block {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        visit!(visitor, NodeMut::Block(self), Phase::Pre);
        propagate!(accept_indexed(
            self,
            |b| NodeMut::Block(b),
            |b| Some(&mut b.elements),
            visitor
        )?);
        visitor.visit(NodeMut::Block(self), Phase::Post)
    }
}

impl Accept for nolol::Program {
    fn accept<V: Visitor>(&mut self, visitor: &mut V) -> Result<Visit, V::Error> {
        visit!(visitor, NodeMut::NololProgram(self), Phase::Pre);
        propagate!(accept_indexed(
            self,
            |p| NodeMut::NololProgram(p),
            |p| Some(&mut p.elements),
            visitor
        )?);
        visitor.visit(NodeMut::NololProgram(self), Phase::Post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Dereference};
    use crate::span::Span;

    fn var(name: &str) -> Expr {
        Expr::var(name, Span::empty())
    }

    fn num(value: &str) -> Expr {
        Expr::number(value, Span::empty())
    }

    /// Records every (kind, phase) pair it sees
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(&'static str, Phase)>,
    }

    impl Visitor for Recorder {
        type Error = ();

        fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, ()> {
            let kind = match node {
                NodeMut::Expr(Expr::Binary(_)) => "binary",
                NodeMut::Expr(Expr::NumberConst(_)) => "number",
                NodeMut::Expr(Expr::Deref(_)) => "deref",
                NodeMut::Expr(_) => "expr",
                NodeMut::Stmt(_) => "stmt",
                NodeMut::Line(_) => "line",
                _ => "other",
            };
            self.seen.push((kind, phase));
            Ok(Visit::Continue)
        }
    }

    #[test]
    fn test_phase_order_for_binary() {
        let mut expr = Expr::binary(BinaryOp::Add, var("a"), num("1"));
        let mut recorder = Recorder::default();
        walk(&mut expr, &mut recorder).unwrap();
        assert_eq!(
            recorder.seen,
            vec![
                ("binary", Phase::Pre),
                ("deref", Phase::Single),
                ("binary", Phase::Inter1),
                ("number", Phase::Single),
                ("binary", Phase::Post),
            ]
        );
    }

    #[test]
    fn test_child_phases_on_line() {
        let mut line = Line::new(
            vec![Stmt::assign("a", num("1")), Stmt::assign("b", num("2"))],
            Span::empty(),
        );
        let mut recorder = Recorder::default();
        walk(&mut line, &mut recorder).unwrap();
        let line_phases: Vec<Phase> = recorder
            .seen
            .iter()
            .filter(|(kind, _)| *kind == "line")
            .map(|(_, phase)| *phase)
            .collect();
        assert_eq!(
            line_phases,
            vec![Phase::Pre, Phase::Child(0), Phase::Child(1), Phase::Post]
        );
    }

    /// Expands `dup` statements into two `x++` statements, which are then
    /// revisited and turned into `y++` by the second rule
    struct Expander;

    impl Visitor for Expander {
        type Error = ();

        fn visit(&mut self, node: NodeMut<'_>, _phase: Phase) -> Result<Visit, ()> {
            if let NodeMut::Stmt(Stmt::Deref(d)) = node {
                if d.variable == "dup" {
                    let x = Stmt::Deref(Dereference::new("x", d.span.clone()));
                    return Ok(Visit::replace([x.clone(), x]));
                }
                if d.variable == "x" {
                    return Ok(Visit::with(Stmt::Deref(Dereference::new(
                        "y",
                        d.span.clone(),
                    ))));
                }
                if d.variable == "gone" {
                    return Ok(Visit::remove());
                }
            }
            Ok(Visit::Continue)
        }
    }

    #[test]
    fn test_replacement_is_spliced_and_revisited() {
        let deref = |name: &str| Stmt::Deref(Dereference::new(name, Span::empty()));
        let mut line = Line::new(
            vec![deref("gone"), deref("dup"), deref("z")],
            Span::empty(),
        );
        walk(&mut line, &mut Expander).unwrap();
        assert_eq!(line.statements, vec![deref("y"), deref("y"), deref("z")]);
    }

    struct Failing;

    impl Visitor for Failing {
        type Error = String;

        fn visit(&mut self, node: NodeMut<'_>, _phase: Phase) -> Result<Visit, String> {
            match node {
                NodeMut::Expr(Expr::Deref(d)) => Err(d.variable.clone()),
                _ => Ok(Visit::Continue),
            }
        }
    }

    #[test]
    fn test_error_aborts_traversal() {
        let mut expr = Expr::binary(BinaryOp::Mul, var("first"), var("second"));
        assert_eq!(walk(&mut expr, &mut Failing), Err("first".to_string()));
    }

    #[test]
    #[should_panic(expected = "exactly one node")]
    fn test_slot_rejects_multiple_nodes() {
        struct Splitter;
        impl Visitor for Splitter {
            type Error = ();
            fn visit(&mut self, node: NodeMut<'_>, _phase: Phase) -> Result<Visit, ()> {
                match node {
                    NodeMut::Expr(Expr::NumberConst(n)) => {
                        let copy = Expr::NumberConst(n.clone());
                        Ok(Visit::replace([copy.clone(), copy]))
                    }
                    _ => Ok(Visit::Continue),
                }
            }
        }
        let mut stmt = Stmt::assign("a", num("1"));
        let _ = walk(&mut stmt, &mut Splitter);
    }
}
