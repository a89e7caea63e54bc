//! Tree-walking backend.
//!
//! This path evaluates AST nodes directly, without a bytecode stage. Runtime
//! failures are reported in-band as `Object::Error` values: every multi-step
//! rule checks sub-results with `is_error` and forwards the first error it
//! sees, so `eval_program` always returns an Object.

use anyhow::Result;

use crate::ast::{BinaryOperator, BlockStatement, Expression, Program, Statement, UnaryOperator};
use crate::backend::{Backend, PreparedBackend};
use crate::object::{FALSE, NULL, Object, TRUE};

pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PreparedEvaluator {
    statements: Vec<Statement>,
}

impl PreparedBackend for PreparedEvaluator {
    fn run(&self) -> Result<Object> {
        // Evaluator errors are values, not failures of the backend itself.
        Ok(eval_statements(&self.statements))
    }
}

impl Backend for Evaluator {
    fn name(&self) -> &'static str {
        "evaluator"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedEvaluator {
            statements: program.statements.clone(),
        }))
    }
}

pub fn eval_program(program: &Program) -> Object {
    eval_statements(&program.statements)
}

/// Program scope: `return` wrappers are unwrapped here and nowhere else.
fn eval_statements(statements: &[Statement]) -> Object {
    let mut result = NULL;
    for statement in statements {
        match eval_statement(statement) {
            Object::ReturnValue(value) => return *value,
            error @ Object::Error(_) => return error,
            other => result = other,
        }
    }
    result
}

/// Block scope: `return` wrappers and errors propagate unchanged so a
/// `return` inside a nested block escapes every enclosing block intact.
fn eval_block(block: &BlockStatement) -> Object {
    let mut result = NULL;
    for statement in &block.statements {
        match eval_statement(statement) {
            outcome @ (Object::ReturnValue(_) | Object::Error(_)) => return outcome,
            other => result = other,
        }
    }
    result
}

fn eval_statement(statement: &Statement) -> Object {
    match statement {
        Statement::Expr(expression) => eval_expression(expression),
        Statement::Return(value) => {
            let value = eval_expression(value);
            if value.is_error() {
                return value;
            }
            Object::ReturnValue(Box::new(value))
        }
    }
}

fn eval_expression(expression: &Expression) -> Object {
    match expression {
        Expression::Integer(value) => Object::Integer(*value),
        Expression::Boolean(value) => Object::from_native_bool(*value),
        Expression::UnaryOp { op, right } => {
            let right = eval_expression(right);
            if right.is_error() {
                return right;
            }
            eval_unary_op(*op, right)
        }
        Expression::BinaryOp { left, op, right } => {
            let left = eval_expression(left);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right);
            if right.is_error() {
                return right;
            }
            eval_binary_op(*op, left, right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_block(consequence)
            } else if let Some(alternative) = alternative {
                eval_block(alternative)
            } else {
                NULL
            }
        }
    }
}

fn eval_unary_op(op: UnaryOperator, right: Object) -> Object {
    match op {
        UnaryOperator::Not => eval_not(right),
        UnaryOperator::Neg => match right {
            Object::Integer(value) => Object::Integer(value.wrapping_neg()),
            other => Object::Error(format!("unknown operator: -{}", other.object_type())),
        },
    }
}

fn eval_not(right: Object) -> Object {
    match right {
        Object::Boolean(true) => FALSE,
        Object::Boolean(false) => TRUE,
        Object::Null => TRUE,
        _ => FALSE,
    }
}

fn eval_binary_op(op: BinaryOperator, left: Object, right: Object) -> Object {
    match (left, right) {
        (Object::Integer(left), Object::Integer(right)) => {
            eval_integer_binary_op(op, left, right)
        }
        (left, right) => match op {
            // Safe as identity equality: Boolean and Null are singletons.
            BinaryOperator::Equal => Object::from_native_bool(left == right),
            BinaryOperator::NotEqual => Object::from_native_bool(left != right),
            _ if left.object_type() != right.object_type() => Object::Error(format!(
                "type mismatch: {} {} {}",
                left.object_type(),
                op,
                right.object_type()
            )),
            _ => Object::Error(format!(
                "unknown operator: {} {} {}",
                left.object_type(),
                op,
                right.object_type()
            )),
        },
    }
}

fn eval_integer_binary_op(op: BinaryOperator, left: i64, right: i64) -> Object {
    match op {
        BinaryOperator::Add => Object::Integer(left.wrapping_add(right)),
        BinaryOperator::Sub => Object::Integer(left.wrapping_sub(right)),
        BinaryOperator::Mul => Object::Integer(left.wrapping_mul(right)),
        BinaryOperator::Div => {
            if right == 0 {
                return Object::Error("division by zero".to_string());
            }
            // wrapping_div: i64::MIN / -1 wraps instead of overflowing
            Object::Integer(left.wrapping_div(right))
        }
        BinaryOperator::LessThan => Object::from_native_bool(left < right),
        BinaryOperator::GreaterThan => Object::from_native_bool(left > right),
        BinaryOperator::Equal => Object::from_native_bool(left == right),
        BinaryOperator::NotEqual => Object::from_native_bool(left != right),
    }
}
