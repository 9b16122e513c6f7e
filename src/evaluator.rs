use crate::ast::{BinaryOp, Expr, LogicalOp, Program, Stmt, UnaryOp};
use crate::environment::Environment;
use crate::error::{LoxError, Span};
use crate::value::Value;
use log::{debug, trace};
use std::io::{self, Write};

/// Tree-walking evaluator. Globals persist for the evaluator's lifetime so a
/// REPL session can reuse one instance across lines.
pub struct Evaluator<W: Write = io::Stdout> {
    environment: Environment,
    output: W,
}

impl Evaluator<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Evaluator<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Evaluator<W> {
    /// Evaluator whose `print` statements write to `output`.
    pub fn with_output(output: W) -> Self {
        Self {
            environment: Environment::new(),
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs statements in order, stopping at the first runtime error.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), LoxError> {
        debug!("evaluating {} statements", program.statements.len());
        for statement in &program.statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    pub fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), LoxError> {
        trace!("executing {:?}", stmt);
        match stmt {
            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(())
            }
            Stmt::Print { expr, span } => {
                let value = self.evaluate_expression(expr)?;
                self.write_value(&value, span)
            }
            Stmt::Var {
                name, initializer, ..
            } => {
                let value = match initializer {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name, value);
                Ok(())
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(then_branch)?;
                } else if let Some(else_stmt) = else_branch {
                    self.execute_statement(else_stmt)?;
                }
                Ok(())
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(body)?;
                }
                Ok(())
            }
        }
    }

    /// Writes the printed form of `value` as one output line.
    pub fn write_value(&mut self, value: &Value, span: &Span) -> Result<(), LoxError> {
        writeln!(self.output, "{}", value).map_err(|e| write_error(span, e))?;
        self.output.flush().map_err(|e| write_error(span, e))
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        self.environment.push_scope();

        let result = statements
            .iter()
            .try_for_each(|statement| self.execute_statement(statement));

        // Pop even on error so a REPL session keeps a sane scope chain
        self.environment.pop_scope();
        result
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Grouping { expr, .. } => self.evaluate_expression(expr),
            Expr::Variable { name, span } => {
                self.environment.get(name).cloned().ok_or_else(|| {
                    LoxError::runtime_error(*span, format!("Undefined variable '{}'.", name))
                        .with_help("Declare the variable first with 'var'.")
                })
            }
            Expr::Assign { name, value, span } => {
                let val = self.evaluate_expression(value)?;
                if !self.environment.assign(name, val.clone()) {
                    return Err(LoxError::runtime_error(
                        *span,
                        format!("Undefined variable '{}'.", name),
                    )
                    .with_help("Assignment does not declare variables. Use 'var' to declare it."));
                }
                Ok(val)
            }
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand_val = self.evaluate_expression(operand)?;
                evaluate_unary_op(*operator, operand_val, span)
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left_val = self.evaluate_expression(left)?;
                let right_val = self.evaluate_expression(right)?;
                evaluate_binary_op(*operator, left_val, right_val, span)
            }
            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left_val = self.evaluate_expression(left)?;

                match operator {
                    LogicalOp::Or if left_val.is_truthy() => Ok(left_val),
                    LogicalOp::And if !left_val.is_truthy() => Ok(left_val),
                    _ => self.evaluate_expression(right),
                }
            }
        }
    }
}

fn write_error(span: &Span, error: io::Error) -> LoxError {
    LoxError::runtime_error(*span, format!("Failed to write output: {}", error))
}

fn evaluate_unary_op(operator: UnaryOp, operand: Value, span: &Span) -> Result<Value, LoxError> {
    match operator {
        UnaryOp::Negate => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(LoxError::runtime_error(
                *span,
                "Operand must be a number.".to_string(),
            )
            .with_help(format!("Cannot negate a {}.", other.type_name()))),
        },
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
    }
}

fn evaluate_binary_op(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
) -> Result<Value, LoxError> {
    match operator {
        BinaryOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
            (l, r) => Err(LoxError::runtime_error(
                *span,
                "Operands must be two numbers or two strings.".to_string(),
            )
            .with_help(format!("Cannot add {} and {}.", l.type_name(), r.type_name()))),
        },
        BinaryOp::Subtract => arithmetic(left, right, span, |l, r| l - r),
        BinaryOp::Multiply => arithmetic(left, right, span, |l, r| l * r),
        // IEEE semantics: x / 0 is infinite or NaN, not an error
        BinaryOp::Divide => arithmetic(left, right, span, |l, r| l / r),
        BinaryOp::Greater => comparison(left, right, span, |l, r| l > r),
        BinaryOp::GreaterEqual => comparison(left, right, span, |l, r| l >= r),
        BinaryOp::Less => comparison(left, right, span, |l, r| l < r),
        BinaryOp::LessEqual => comparison(left, right, span, |l, r| l <= r),
        BinaryOp::Equal => Ok(Value::Bool(left.is_equal(&right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!left.is_equal(&right))),
    }
}

fn number_operands(left: Value, right: Value, span: &Span) -> Result<(f64, f64), LoxError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((l, r)),
        (l, r) => Err(
            LoxError::runtime_error(*span, "Operands must be numbers.".to_string()).with_help(
                format!("Got {} and {}.", l.type_name(), r.type_name()),
            ),
        ),
    }
}

fn arithmetic(
    left: Value,
    right: Value,
    span: &Span,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Value, LoxError> {
    let (l, r) = number_operands(left, right, span)?;
    Ok(Value::Number(op(l, r)))
}

fn comparison(
    left: Value,
    right: Value,
    span: &Span,
    op: impl Fn(f64, f64) -> bool,
) -> Result<Value, LoxError> {
    let (l, r) = number_operands(left, right, span)?;
    Ok(Value::Bool(op(l, r)))
}
