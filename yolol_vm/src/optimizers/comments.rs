//! Comment stripping

use std::convert::Infallible;

use yolol_vm_parser::ast::nolol::Element;
use yolol_vm_parser::{NodeMut, Phase, Visit, Visitor};

/// Drops every comment. NOLOL lines left without statements, label or
/// line markers are removed as well; YOLOL lines always stay so that line
/// numbers do not move.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommentRemover;

impl Visitor for CommentRemover {
    type Error = Infallible;

    fn visit(&mut self, node: NodeMut<'_>, phase: Phase) -> Result<Visit, Infallible> {
        if phase != Phase::Pre {
            return Ok(Visit::Continue);
        }
        match node {
            NodeMut::Line(line) => line.comment = None,
            NodeMut::Element(Element::Line(line)) => {
                line.comment = None;
                if line.statements.is_empty()
                    && line.label.is_none()
                    && !line.has_bol
                    && !line.has_eol
                {
                    return Ok(Visit::remove());
                }
            }
            _ => {}
        }
        Ok(Visit::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::apply;
    use yolol_vm_parser::{parse_nolol, parse_yolol, Printer};

    #[test]
    fn test_yolol_lines_are_kept() {
        let mut program = parse_yolol("a=1 // one\n// two\nb=2").unwrap();
        apply(&mut program, &mut CommentRemover);
        assert_eq!(Printer::new().print(&program).unwrap(), "a=1\n\nb=2\n");
    }

    #[test]
    fn test_empty_nolol_lines_vanish() {
        let mut program = parse_nolol("a=1 // one\n// two\nstart> // three\nb=2").unwrap();
        apply(&mut program, &mut CommentRemover);
        assert_eq!(program.elements.len(), 3);
        assert!(program.elements.iter().all(|e| match e {
            Element::Line(l) => l.comment.is_none(),
            _ => true,
        }));
    }
}
