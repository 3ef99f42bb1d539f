//! Time counter and size limits

use tracing::debug;
use yolol_vm_parser::ast::yolol::Line;
use yolol_vm_parser::ast::{Expr, Stmt};
use yolol_vm_parser::Printer;

use super::{Context, Conversion, Numbered};
use crate::error::{ConvertError, ConvertErrors};

pub(crate) fn finish(ctx: Context<'_>, Numbered(mut program): Numbered) -> Result<Conversion, ConvertErrors> {
    let max_lines = ctx.options.max_lines;
    let max_length = ctx.options.max_line_length;

    // Past the last line execution wraps to line 1 anyway
    if program.lines.len() == max_lines + 1 && program.lines.last().is_some_and(is_restart) {
        program.lines.pop();
        debug!("trailing goto 1 dropped");
    }

    if ctx.uses_time {
        for line in &mut program.lines {
            let increment = ctx.time_increment(line.span.clone());
            line.statements.insert(0, increment);
        }
    }

    let mut errors = ConvertErrors::new();
    if program.lines.len() > max_lines {
        errors.push(ConvertError::ProgramTooLong {
            lines: program.lines.len(),
            max: max_lines,
            span: program.span(),
        });
    }
    let printer = Printer::new();
    for (index, line) in program.lines.iter().enumerate() {
        let length = printer.print_line(line)?.len();
        if length > max_length {
            errors.push(ConvertError::LineTooLong {
                line: index + 1,
                length,
                max: max_length,
                span: line.span.clone(),
            });
        }
    }
    errors.into_result()?;

    Ok(Conversion {
        program,
        variable_translations: ctx.translations,
    })
}

/// A line that is nothing but `goto 1`
fn is_restart(line: &Line) -> bool {
    match line.statements.as_slice() {
        [Stmt::Goto(goto)] => matches!(&goto.line, Expr::NumberConst(n) if n.value == "1"),
        _ => false,
    }
}
