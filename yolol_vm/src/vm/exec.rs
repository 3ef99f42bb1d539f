//! Execution of a single program line

use std::collections::HashMap;

use yolol_vm_parser::ast::yolol::Line;
use yolol_vm_parser::ast::{is_global, Dereference, Expr, Stmt};
use yolol_vm_parser::Span;

use super::{Coordinator, PROGRAM_LINES};
use crate::error::RuntimeError;
use crate::number::Number;
use crate::value::{Value, ValueError};

/// Where execution continues after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Next,
    /// 1-based, already clamped into the program space
    Goto(usize),
}

/// The variables one line sees while it runs
pub(crate) struct Frame<'a> {
    pub locals: &'a mut HashMap<String, Value>,
    /// Globals are routed here when the VM is coordinated
    pub globals: Option<&'a Coordinator>,
    /// Every successful write, in order
    pub writes: Vec<(String, Value)>,
    pub line: usize,
}

impl<'a> Frame<'a> {
    pub fn new(
        locals: &'a mut HashMap<String, Value>,
        globals: Option<&'a Coordinator>,
        line: usize,
    ) -> Self {
        Self {
            locals,
            globals,
            writes: Vec::new(),
            line,
        }
    }

    /// Run every statement of the line. A goto ends the line early.
    pub fn run_line(&mut self, line: &Line) -> Result<Flow, RuntimeError> {
        Ok(match self.run_block(&line.statements)? {
            Some(target) => Flow::Goto(target),
            None => Flow::Next,
        })
    }

    fn run_block(&mut self, statements: &[Stmt]) -> Result<Option<usize>, RuntimeError> {
        for stmt in statements {
            if let Some(target) = self.run_statement(stmt)? {
                return Ok(Some(target));
            }
        }
        Ok(None)
    }

    fn run_statement(&mut self, stmt: &Stmt) -> Result<Option<usize>, RuntimeError> {
        match stmt {
            Stmt::Assignment(assignment) => {
                let mut value = self.eval(&assignment.value)?;
                if let Some(op) = assignment.op.binary_op() {
                    let current = self.read(&assignment.variable);
                    value = Value::binary(op, &current, &value)
                        .map_err(|e| self.error(e, &assignment.span))?;
                }
                self.write(&assignment.variable, value);
                Ok(None)
            }
            Stmt::If(stmt) => {
                let condition = self.eval(&stmt.condition)?;
                let taken = condition
                    .truthy()
                    .map_err(|e| self.error(e, stmt.condition.span()))?;
                if taken {
                    self.run_block(&stmt.then_block)
                } else if let Some(block) = &stmt.else_block {
                    self.run_block(block)
                } else {
                    Ok(None)
                }
            }
            Stmt::Goto(goto) => {
                let target = self.eval(&goto.line)?;
                let Some(number) = target.as_number() else {
                    return Err(RuntimeError::new(
                        "goto target must be a number",
                        goto.span.clone(),
                        self.line,
                    ));
                };
                let line = number.trunc().clamp(1, PROGRAM_LINES as i64);
                Ok(Some(line as usize))
            }
            Stmt::Deref(deref) => {
                self.deref(deref)?;
                Ok(None)
            }
            Stmt::GotoLabel(goto) => Err(RuntimeError::new(
                format!("unresolved label '{}'", goto.label),
                goto.span.clone(),
                self.line,
            )),
            Stmt::Break(control) | Stmt::Continue(control) => Err(RuntimeError::new(
                "break and continue are not executable",
                control.span.clone(),
                self.line,
            )),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::StringConst(s) => Ok(Value::String(s.value.clone())),
            Expr::NumberConst(n) => n
                .value
                .parse::<Number>()
                .map(Value::Number)
                .map_err(|e| RuntimeError::new(e.to_string(), n.span.clone(), self.line)),
            Expr::Deref(deref) => self.deref(deref),
            Expr::Unary(unary) => {
                let operand = self.eval(&unary.operand)?;
                Value::unary(unary.op, &operand).map_err(|e| self.error(e, &unary.span))
            }
            Expr::Binary(binary) => {
                // Both sides always run, there is no short-circuiting
                let lhs = self.eval(&binary.lhs)?;
                let rhs = self.eval(&binary.rhs)?;
                Value::binary(binary.op, &lhs, &rhs).map_err(|e| self.error(e, &binary.span))
            }
            Expr::FuncCall(call) => Err(RuntimeError::new(
                format!("unknown function '{}'", call.name),
                call.span.clone(),
                self.line,
            )),
        }
    }

    fn deref(&mut self, deref: &Dereference) -> Result<Value, RuntimeError> {
        let current = self.read(&deref.variable);
        let Some(op) = deref.op else {
            return Ok(current);
        };
        let updated = if op.is_increment() {
            current.incremented()
        } else {
            current
                .decremented()
                .map_err(|e| self.error(e, &deref.span))?
        };
        self.write(&deref.variable, updated.clone());
        Ok(if op.is_prefix() { updated } else { current })
    }

    /// Undefined variables read as zero
    fn read(&self, name: &str) -> Value {
        if let (true, Some(coordinator)) = (is_global(name), self.globals) {
            return coordinator.load(name).unwrap_or_default();
        }
        self.locals.get(name).cloned().unwrap_or_default()
    }

    fn write(&mut self, name: &str, value: Value) {
        self.writes.push((name.to_string(), value.clone()));
        match self.globals {
            Some(coordinator) if is_global(name) => coordinator.store(name, value),
            _ => {
                self.locals.insert(name.to_string(), value);
            }
        }
    }

    fn error(&self, error: ValueError, span: &Span) -> RuntimeError {
        RuntimeError::from_value_error(error, span, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yolol_vm_parser::parse_yolol;

    fn run(source: &str, locals: &mut HashMap<String, Value>) -> Result<Flow, RuntimeError> {
        let program = parse_yolol(source).unwrap();
        let mut frame = Frame::new(locals, None, 1);
        frame.run_line(&program.lines[0])
    }

    fn run_fresh(source: &str) -> HashMap<String, Value> {
        let mut locals = HashMap::new();
        run(source, &mut locals).unwrap();
        locals
    }

    #[test]
    fn test_undefined_reads_as_zero() {
        let locals = run_fresh("a=b+1");
        assert_eq!(locals["a"], Value::from(1_i64));
    }

    #[test]
    fn test_compound_assignment_and_increments() {
        let locals = run_fresh("a=5 a*=2 b=a++ c=++a a--");
        assert_eq!(locals["a"], Value::from(11_i64));
        assert_eq!(locals["b"], Value::from(10_i64));
        assert_eq!(locals["c"], Value::from(12_i64));
    }

    #[test]
    fn test_string_contagion() {
        let locals = run_fresh("a=\"x\"+1 b=\"hello world\"-\"o\"");
        assert_eq!(locals["a"], Value::from("x1"));
        assert_eq!(locals["b"], Value::from("hello wrld"));
    }

    #[test]
    fn test_goto_is_clamped_and_ends_the_line() {
        let mut locals = HashMap::new();
        assert_eq!(run("goto 35 a=1", &mut locals).unwrap(), Flow::Goto(20));
        assert!(!locals.contains_key("a"));
        assert_eq!(run("goto -4", &mut locals).unwrap(), Flow::Goto(1));
        assert_eq!(run("goto 2.9", &mut locals).unwrap(), Flow::Goto(2));
    }

    #[test]
    fn test_if_else() {
        let locals = run_fresh("if 0 then a=1 else a=2 end if 3 then b=1 end");
        assert_eq!(locals["a"], Value::from(2_i64));
        assert_eq!(locals["b"], Value::from(1_i64));
    }

    #[test]
    fn test_goto_inside_if() {
        let mut locals = HashMap::new();
        assert_eq!(run("if 1 then goto 4 end a=1", &mut locals).unwrap(), Flow::Goto(4));
        assert!(locals.is_empty());
    }

    #[test]
    fn test_writes_are_recorded_in_order() {
        let program = parse_yolol("a=1 b=2 a++").unwrap();
        let mut locals = HashMap::new();
        let mut frame = Frame::new(&mut locals, None, 1);
        frame.run_line(&program.lines[0]).unwrap();
        let names: Vec<&str> = frame.writes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "b", "a"]);
    }

    #[test]
    fn test_runtime_errors_keep_earlier_writes() {
        let mut locals = HashMap::new();
        let err = run("a=1 b=1/0 c=1", &mut locals).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(locals["a"], Value::from(1_i64));
        assert!(!locals.contains_key("c"));

        let err = run("if \"s\" then a=2 end", &mut locals).unwrap_err();
        assert!(err.message.contains("condition"));
    }

    #[test]
    fn test_goto_to_string_fails() {
        let mut locals = HashMap::new();
        assert!(run("goto \"x\"", &mut locals).is_err());
    }
}
