//! Stack virtual machine for compiled bytecode.
//!
//! A fetch-decode-execute loop over the flat instruction stream with a fixed
//! operand stack. `sp` always indexes the next free slot; popping leaves the
//! slot intact so tests can observe what the last `OpPop` discarded.

use anyhow::Result;
use thiserror::Error;

use crate::ast::Program;
use crate::backend::{Backend, PreparedBackend};
use crate::bytecode::{Instructions, Opcode, read_u16};
use crate::compiler::{Bytecode, compile};
use crate::object::{FALSE, NULL, Object, ObjectType, TRUE};

pub const STACK_SIZE: usize = 2048;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
    #[error("no such constant {index}")]
    MissingConstant { index: usize },
    #[error("unsupported types for binary operation: {left} {right}")]
    UnsupportedBinaryTypes { left: ObjectType, right: ObjectType },
    #[error("unknown operator: {opcode} ({left} {right})")]
    UnknownOperator {
        opcode: Opcode,
        left: ObjectType,
        right: ObjectType,
    },
    #[error("unsupported type for negation: {operand}")]
    UnsupportedNegation { operand: ObjectType },
    #[error("division by zero")]
    DivisionByZero,
}

pub struct VM {
    constants: Vec<Object>,
    instructions: Instructions,
    stack: Vec<Object>,
    /// Next free slot; `stack[sp - 1]` is the top of the stack when `sp > 0`.
    sp: usize,
}

impl VM {
    pub fn new(bytecode: Bytecode) -> Self {
        Self {
            constants: bytecode.constants,
            instructions: bytecode.instructions,
            stack: vec![NULL; STACK_SIZE],
            sp: 0,
        }
    }

    pub fn stack_top(&self) -> Option<&Object> {
        if self.sp == 0 {
            None
        } else {
            Some(&self.stack[self.sp - 1])
        }
    }

    /// The slot just above the current top: whatever the most recent `OpPop`
    /// discarded. Tests and the backend seam observe results through this.
    pub fn last_popped_stack_element(&self) -> &Object {
        &self.stack[self.sp]
    }

    pub fn run(&mut self) -> Result<(), VmError> {
        let mut ip = 0;
        while ip < self.instructions.len() {
            let opcode = Opcode::try_from(self.instructions[ip]).map_err(|error| {
                VmError::UnknownOpcode {
                    opcode: error.opcode,
                    offset: ip,
                }
            })?;
            match opcode {
                Opcode::Constant => {
                    let index = read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 3;
                    let constant = self
                        .constants
                        .get(index)
                        .cloned()
                        .ok_or(VmError::MissingConstant { index })?;
                    self.push(constant)?;
                }
                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                    self.execute_binary_operation(opcode)?;
                    ip += 1;
                }
                Opcode::Equal | Opcode::NotEqual | Opcode::GreaterThan => {
                    self.execute_comparison(opcode)?;
                    ip += 1;
                }
                Opcode::Bang => {
                    let operand = self.pop()?;
                    self.push(Object::from_native_bool(!operand.is_truthy()))?;
                    ip += 1;
                }
                Opcode::Minus => {
                    self.execute_minus_operator()?;
                    ip += 1;
                }
                Opcode::True => {
                    self.push(TRUE)?;
                    ip += 1;
                }
                Opcode::False => {
                    self.push(FALSE)?;
                    ip += 1;
                }
                Opcode::Null => {
                    self.push(NULL)?;
                    ip += 1;
                }
                Opcode::Pop => {
                    self.pop()?;
                    ip += 1;
                }
                Opcode::Jump => {
                    ip = read_u16(&self.instructions[ip + 1..]) as usize;
                }
                Opcode::JumpNotTruthy => {
                    let target = read_u16(&self.instructions[ip + 1..]) as usize;
                    ip += 3;
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        ip = target;
                    }
                }
            }
        }
        Ok(())
    }

    fn execute_binary_operation(&mut self, opcode: Opcode) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (left, right) {
            (Object::Integer(left), Object::Integer(right)) => {
                self.execute_binary_integer_operation(opcode, left, right)
            }
            (left, right) => Err(VmError::UnsupportedBinaryTypes {
                left: left.object_type(),
                right: right.object_type(),
            }),
        }
    }

    fn execute_binary_integer_operation(
        &mut self,
        opcode: Opcode,
        left: i64,
        right: i64,
    ) -> Result<(), VmError> {
        let result = match opcode {
            Opcode::Add => left.wrapping_add(right),
            Opcode::Sub => left.wrapping_sub(right),
            Opcode::Mul => left.wrapping_mul(right),
            Opcode::Div => {
                if right == 0 {
                    return Err(VmError::DivisionByZero);
                }
                left.wrapping_div(right)
            }
            _ => {
                return Err(VmError::UnknownOperator {
                    opcode,
                    left: ObjectType::Integer,
                    right: ObjectType::Integer,
                });
            }
        };
        self.push(Object::Integer(result))
    }

    fn execute_comparison(&mut self, opcode: Opcode) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        if matches!(left, Object::Integer(_)) || matches!(right, Object::Integer(_)) {
            return self.execute_integer_comparison(opcode, left, right);
        }
        match opcode {
            // Identity equality; valid because Boolean and Null are singletons.
            Opcode::Equal => self.push(Object::from_native_bool(left == right)),
            Opcode::NotEqual => self.push(Object::from_native_bool(left != right)),
            _ => Err(VmError::UnknownOperator {
                opcode,
                left: left.object_type(),
                right: right.object_type(),
            }),
        }
    }

    fn execute_integer_comparison(
        &mut self,
        opcode: Opcode,
        left: Object,
        right: Object,
    ) -> Result<(), VmError> {
        let (Object::Integer(left_value), Object::Integer(right_value)) = (&left, &right) else {
            return Err(VmError::UnsupportedBinaryTypes {
                left: left.object_type(),
                right: right.object_type(),
            });
        };
        match opcode {
            Opcode::Equal => self.push(Object::from_native_bool(left_value == right_value)),
            Opcode::NotEqual => self.push(Object::from_native_bool(left_value != right_value)),
            Opcode::GreaterThan => self.push(Object::from_native_bool(left_value > right_value)),
            _ => Err(VmError::UnknownOperator {
                opcode,
                left: ObjectType::Integer,
                right: ObjectType::Integer,
            }),
        }
    }

    fn execute_minus_operator(&mut self) -> Result<(), VmError> {
        let operand = self.pop()?;
        match operand {
            Object::Integer(value) => self.push(Object::Integer(value.wrapping_neg())),
            other => Err(VmError::UnsupportedNegation {
                operand: other.object_type(),
            }),
        }
    }

    fn push(&mut self, object: Object) -> Result<(), VmError> {
        if self.sp >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.stack[self.sp] = object;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<Object, VmError> {
        if self.sp == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.sp -= 1;
        // the slot is cloned, not vacated, so last_popped_stack_element works
        Ok(self.stack[self.sp].clone())
    }
}

pub struct VmBackend;

impl VmBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VmBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PreparedVm {
    bytecode: Bytecode,
}

impl PreparedBackend for PreparedVm {
    fn run(&self) -> Result<Object> {
        let mut vm = VM::new(self.bytecode.clone());
        vm.run()?;
        Ok(vm.last_popped_stack_element().clone())
    }
}

impl Backend for VmBackend {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedVm {
            bytecode: compile(program)?,
        }))
    }
}
