//! Bytecode interpreter for verified chunks.
//!
//! All frames of one call live on the VM stack: a frame's locals start at
//! its `base`, and its operands sit above `floor`. Arguments become the
//! first locals in place.

use crate::error::{RuntimeError, TrapKind};
use crate::machine::Vm;
use kestrel_common::{Chunk, Instruction, Opcode, Value};
use std::cmp::Ordering;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
struct Frame {
    function: usize,
    pc: usize,
    /// First local slot.
    base: usize,
    /// First operand slot (`base + locals`).
    floor: usize,
}

/// What the loop does after an instruction.
enum Flow {
    Next,
    Jump(usize),
    Call(usize),
    Return,
}

impl Vm {
    /// Run bytecode function `index` on the arguments at the top of the
    /// stack. On success they are replaced by the single result; on a
    /// trap the stack is cut back to where the arguments began.
    pub(crate) fn run_function(
        &mut self,
        chunk: &Rc<Chunk>,
        index: usize,
    ) -> Result<(), RuntimeError> {
        let arity = chunk
            .functions
            .get(index)
            .map_or(0, |func| func.arity as usize);
        let args_base = self.stack.raw_len().saturating_sub(arity);
        let saved_depth = self.depth;

        let result = self.interpret(chunk, index, args_base);

        self.depth = saved_depth;
        if result.is_err() {
            self.stack.raw_truncate(args_base);
        }
        result
    }

    fn interpret(
        &mut self,
        chunk: &Chunk,
        entry: usize,
        args_base: usize,
    ) -> Result<(), RuntimeError> {
        let mut frames = Vec::new();
        let first = self
            .enter_frame(chunk, entry, args_base)
            .map_err(|kind| trap(chunk, entry, 0, kind))?;
        frames.push(first);

        while let Some(frame) = frames.last().copied() {
            let at = frame.pc;
            let instr = chunk
                .functions
                .get(frame.function)
                .and_then(|func| func.code.get(at))
                .copied()
                .ok_or_else(|| {
                    trap(
                        chunk,
                        frame.function,
                        at,
                        TrapKind::InvalidOperand { index: at as u16 },
                    )
                })?;

            let flow = self
                .step(chunk, &frame, &instr)
                .map_err(|kind| trap(chunk, frame.function, at, kind))?;

            let Some(current) = frames.last_mut() else {
                break;
            };
            match flow {
                Flow::Next => current.pc = at + 1,
                Flow::Jump(target) => current.pc = target,
                Flow::Call(callee) => {
                    current.pc = at + 1;
                    let arity = chunk
                        .functions
                        .get(callee)
                        .map_or(0, |func| func.arity as usize);
                    if self.stack.raw_len() < frame.floor + arity {
                        return Err(trap(chunk, frame.function, at, TrapKind::StackUnderflow));
                    }
                    let next = self
                        .enter_frame(chunk, callee, self.stack.raw_len() - arity)
                        .map_err(|kind| trap(chunk, frame.function, at, kind))?;
                    frames.push(next);
                }
                Flow::Return => {
                    let result = self
                        .stack
                        .raw_pop(frame.floor)
                        .ok_or_else(|| trap(chunk, frame.function, at, TrapKind::StackUnderflow))?;
                    self.stack.raw_truncate(frame.base);
                    self.stack.push(result);
                    frames.pop();
                    self.depth -= 1;
                }
            }
        }

        Ok(())
    }

    /// Start a frame whose arguments begin at `base`; pads the remaining
    /// locals with null.
    fn enter_frame(&mut self, chunk: &Chunk, function: usize, base: usize) -> Result<Frame, TrapKind> {
        let func = chunk
            .functions
            .get(function)
            .ok_or(TrapKind::InvalidOperand {
                index: function as u16,
            })?;
        let limit = self.config.max_call_depth;
        if self.depth >= limit {
            return Err(TrapKind::CallDepthExceeded { limit });
        }
        let floor = base + func.locals as usize;
        if floor > self.config.max_stack_depth {
            return Err(TrapKind::StackOverflow {
                limit: self.config.max_stack_depth,
            });
        }
        self.stack.raw_resize(floor);
        self.depth += 1;
        Ok(Frame {
            function,
            pc: 0,
            base,
            floor,
        })
    }

    fn step(&mut self, chunk: &Chunk, frame: &Frame, instr: &Instruction) -> Result<Flow, TrapKind> {
        match instr.opcode {
            Opcode::Nop => {}

            Opcode::Const => {
                let value = chunk
                    .constants
                    .get(instr.arg1 as usize)
                    .cloned()
                    .ok_or(TrapKind::InvalidOperand { index: instr.arg1 })?;
                self.push_operand(value)?;
            }
            Opcode::Pop => {
                self.pop_operand(frame)?;
            }
            Opcode::Dup => {
                let top = self.peek_operand(frame)?.clone();
                self.push_operand(top)?;
            }

            Opcode::LoadLocal => {
                let value = self
                    .stack
                    .raw_get(self.local_slot(frame, instr.arg1)?)
                    .cloned()
                    .ok_or(TrapKind::InvalidOperand { index: instr.arg1 })?;
                self.push_operand(value)?;
            }
            Opcode::StoreLocal => {
                let slot = self.local_slot(frame, instr.arg1)?;
                let value = self.pop_operand(frame)?;
                self.stack.raw_set(slot, value);
            }

            Opcode::GetGlobal => {
                let name = const_name(chunk, instr.arg1)?;
                let value = self
                    .globals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| TrapKind::UnknownGlobal {
                        name: String::from_utf8_lossy(name).into_owned(),
                    })?;
                self.push_operand(value)?;
            }
            Opcode::SetGlobal => {
                let name = const_name(chunk, instr.arg1)?;
                let value = self.pop_operand(frame)?;
                self.globals.set(name, value);
            }

            Opcode::Add => self.exec_arith(frame, instr.opcode, i64::wrapping_add, |a, b| a + b)?,
            Opcode::Sub => self.exec_arith(frame, instr.opcode, i64::wrapping_sub, |a, b| a - b)?,
            Opcode::Mul => self.exec_arith(frame, instr.opcode, i64::wrapping_mul, |a, b| a * b)?,
            Opcode::Div | Opcode::Mod => self.exec_div(frame, instr.opcode)?,
            Opcode::Neg => {
                let value = match self.pop_operand(frame)? {
                    Value::I64(x) => Value::I64(x.wrapping_neg()),
                    Value::F64(x) => Value::F64(-x),
                    other => return Err(mismatch(instr.opcode, &other)),
                };
                self.push_operand(value)?;
            }

            Opcode::Eq | Opcode::Neq => {
                let b = self.pop_operand(frame)?;
                let a = self.pop_operand(frame)?;
                let equal = values_equal(&a, &b);
                self.push_operand(Value::Bool(equal == (instr.opcode == Opcode::Eq)))?;
            }
            Opcode::Lt | Opcode::Gt | Opcode::Lte | Opcode::Gte => {
                self.exec_ordering(frame, instr.opcode)?
            }

            Opcode::And | Opcode::Or => {
                let b = self.pop_operand(frame)?;
                let a = self.pop_operand(frame)?;
                let result = match (&a, &b) {
                    (Value::Bool(x), Value::Bool(y)) if instr.opcode == Opcode::And => *x && *y,
                    (Value::Bool(x), Value::Bool(y)) => *x || *y,
                    (Value::Bool(_), other) | (other, _) => {
                        return Err(mismatch(instr.opcode, other))
                    }
                };
                self.push_operand(Value::Bool(result))?;
            }
            Opcode::Not => match self.pop_operand(frame)? {
                Value::Bool(x) => self.push_operand(Value::Bool(!x))?,
                other => return Err(mismatch(instr.opcode, &other)),
            },

            Opcode::Jump => return Ok(Flow::Jump(instr.arg1 as usize)),
            Opcode::JumpIfFalse => match self.pop_operand(frame)? {
                Value::Bool(false) => return Ok(Flow::Jump(instr.arg1 as usize)),
                Value::Bool(true) => {}
                other => return Err(mismatch(instr.opcode, &other)),
            },

            Opcode::Call => return Ok(Flow::Call(instr.arg1 as usize)),
            Opcode::CallHost => self.exec_call_host(chunk, frame, instr)?,
            Opcode::Ret => return Ok(Flow::Return),

            Opcode::IsType => {
                let matches = self.peek_operand(frame)?.type_tag() == instr.type_tag;
                self.push_operand(Value::Bool(matches))?;
            }
            Opcode::Concat => {
                let b = self.pop_operand(frame)?;
                let a = self.pop_operand(frame)?;
                let joined = match (&a, &b) {
                    (Value::Str(x), Value::Str(y)) => [&x[..], &y[..]].concat(),
                    (Value::Str(_), other) | (other, _) => {
                        return Err(mismatch(instr.opcode, other))
                    }
                };
                self.push_operand(Value::Str(joined.into_boxed_slice()))?;
            }
        }
        Ok(Flow::Next)
    }

    // ---- Operand helpers ----

    fn push_operand(&mut self, value: Value) -> Result<(), TrapKind> {
        let limit = self.config.max_stack_depth;
        if self.stack.raw_len() >= limit {
            return Err(TrapKind::StackOverflow { limit });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop_operand(&mut self, frame: &Frame) -> Result<Value, TrapKind> {
        self.stack
            .raw_pop(frame.floor)
            .ok_or(TrapKind::StackUnderflow)
    }

    fn peek_operand(&self, frame: &Frame) -> Result<&Value, TrapKind> {
        let len = self.stack.raw_len();
        if len <= frame.floor {
            return Err(TrapKind::StackUnderflow);
        }
        self.stack.raw_get(len - 1).ok_or(TrapKind::StackUnderflow)
    }

    fn local_slot(&self, frame: &Frame, index: u16) -> Result<usize, TrapKind> {
        let slot = frame.base + index as usize;
        if slot < frame.floor {
            Ok(slot)
        } else {
            Err(TrapKind::InvalidOperand { index })
        }
    }

    // ---- Arithmetic and comparison ----

    fn exec_arith(
        &mut self,
        frame: &Frame,
        op: Opcode,
        i64_op: fn(i64, i64) -> i64,
        f64_op: fn(f64, f64) -> f64,
    ) -> Result<(), TrapKind> {
        let b = self.pop_operand(frame)?;
        let a = self.pop_operand(frame)?;
        let result = match (&a, &b) {
            (Value::I64(x), Value::I64(y)) => Value::I64(i64_op(*x, *y)),
            (Value::F64(x), Value::F64(y)) => Value::F64(f64_op(*x, *y)),
            _ => return Err(numeric_mismatch(op, &a, &b)),
        };
        self.push_operand(result)
    }

    fn exec_div(&mut self, frame: &Frame, op: Opcode) -> Result<(), TrapKind> {
        let b = self.pop_operand(frame)?;
        let a = self.pop_operand(frame)?;
        let result = match (&a, &b) {
            (Value::I64(_), Value::I64(0)) => return Err(TrapKind::DivisionByZero),
            (Value::I64(x), Value::I64(y)) if op == Opcode::Div => Value::I64(x.wrapping_div(*y)),
            (Value::I64(x), Value::I64(y)) => Value::I64(x.wrapping_rem(*y)),
            // Floats follow IEEE 754: x / 0.0 is infinite or NaN.
            (Value::F64(x), Value::F64(y)) if op == Opcode::Div => Value::F64(x / y),
            (Value::F64(x), Value::F64(y)) => Value::F64(x % y),
            _ => return Err(numeric_mismatch(op, &a, &b)),
        };
        self.push_operand(result)
    }

    fn exec_ordering(&mut self, frame: &Frame, op: Opcode) -> Result<(), TrapKind> {
        let b = self.pop_operand(frame)?;
        let a = self.pop_operand(frame)?;
        let ordering = match (&a, &b) {
            (Value::I64(x), Value::I64(y)) => Some(x.cmp(y)),
            (Value::F64(x), Value::F64(y)) => x.partial_cmp(y),
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            (Value::I64(_) | Value::F64(_) | Value::Str(_), other) | (other, _) => {
                return Err(mismatch(op, other))
            }
        };
        // Unordered (NaN) compares false under every operator.
        let result = ordering.is_some_and(|ordering| match op {
            Opcode::Lt => ordering == Ordering::Less,
            Opcode::Gt => ordering == Ordering::Greater,
            Opcode::Lte => ordering != Ordering::Greater,
            _ => ordering != Ordering::Less,
        });
        self.push_operand(Value::Bool(result))
    }

    // ---- Host calls ----

    fn exec_call_host(
        &mut self,
        chunk: &Chunk,
        frame: &Frame,
        instr: &Instruction,
    ) -> Result<(), TrapKind> {
        let raw_name = const_name(chunk, instr.arg1)?;
        let name = String::from_utf8_lossy(raw_name).into_owned();
        let host = std::str::from_utf8(raw_name)
            .ok()
            .and_then(|name| self.hosts.get(name))
            .cloned()
            .ok_or_else(|| TrapKind::UnknownHostFunction { name: name.clone() })?;

        let argc = instr.arg2 as usize;
        if host.arity != argc {
            return Err(TrapKind::HostArityMismatch {
                name,
                expected: host.arity,
                found: argc,
            });
        }
        let len = self.stack.raw_len();
        if len < frame.floor + argc {
            return Err(TrapKind::StackUnderflow);
        }
        let limit = self.config.max_call_depth;
        if self.depth >= limit {
            return Err(TrapKind::CallDepthExceeded { limit });
        }

        let window = len - argc;
        let status = self.invoke_host(&host, argc);
        if !status.is_ok() {
            return Err(TrapKind::HostFailed { name, status });
        }
        let count = self.stack.raw_len().saturating_sub(window);
        if count != 1 {
            return Err(TrapKind::HostResultCount { name, count });
        }
        Ok(())
    }
}

fn trap(chunk: &Chunk, function: usize, at: usize, kind: TrapKind) -> RuntimeError {
    RuntimeError {
        kind,
        function: chunk
            .functions
            .get(function)
            .map(|func| func.name.clone())
            .unwrap_or_default(),
        at,
    }
}

/// Name bytes of a string constant used as a global or host name.
fn const_name(chunk: &Chunk, index: u16) -> Result<&[u8], TrapKind> {
    chunk
        .constants
        .get(index as usize)
        .and_then(Value::as_bytes)
        .ok_or(TrapKind::InvalidOperand { index })
}

fn mismatch(op: Opcode, found: &Value) -> TrapKind {
    TrapKind::TypeMismatch {
        op: op.mnemonic(),
        found: found.type_tag(),
    }
}

/// Blame the left operand unless it is numeric, then the right one.
fn numeric_mismatch(op: Opcode, a: &Value, b: &Value) -> TrapKind {
    match a {
        Value::I64(_) | Value::F64(_) => mismatch(op, b),
        _ => mismatch(op, a),
    }
}

/// `EQ` semantics: floats compare numerically, other values structurally,
/// different types are never equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F64(x), Value::F64(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VmConfig;
    use crate::status::Status;
    use kestrel_common::{Function, TypeTag};

    fn op(opcode: Opcode) -> Instruction {
        Instruction::simple(opcode)
    }

    fn arg(opcode: Opcode, arg1: u16) -> Instruction {
        Instruction::with_arg(opcode, arg1)
    }

    fn call(opcode: Opcode, target: u16, argc: u16) -> Instruction {
        Instruction::new(opcode, TypeTag::None, target, argc, 0)
    }

    fn load(vm: &mut Vm, constants: Vec<Value>, functions: Vec<Function>) {
        vm.load_chunk(&Chunk::new(constants, functions).encode())
            .expect("chunk loads");
    }

    /// Load a one-function chunk `main` with the given body and run it.
    fn eval(constants: Vec<Value>, code: Vec<Instruction>) -> (Vm, Result<(), crate::VmError>) {
        let mut vm = Vm::new();
        load(&mut vm, constants, vec![Function::new("main", 0, 2, code)]);
        let result = vm.call("main", 0);
        (vm, result)
    }

    fn binary(a: Value, b: Value, opcode: Opcode) -> Vm {
        let (vm, result) = eval(
            vec![a, b],
            vec![arg(Opcode::Const, 0), arg(Opcode::Const, 1), op(opcode), op(Opcode::Ret)],
        );
        result.expect("runs");
        vm
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let vm = binary(Value::I64(i64::MAX), Value::I64(1), Opcode::Add);
        assert_eq!(vm.to_i64(-1), i64::MIN);
        let vm = binary(Value::I64(i64::MIN), Value::I64(-1), Opcode::Div);
        assert_eq!(vm.to_i64(-1), i64::MIN);
        let vm = binary(Value::I64(-7), Value::I64(3), Opcode::Mod);
        assert_eq!(vm.to_i64(-1), -1);
    }

    #[test]
    fn float_arithmetic() {
        let vm = binary(Value::F64(1.5), Value::F64(2.0), Opcode::Mul);
        assert_eq!(vm.to_f64(-1), 3.0);
        let vm = binary(Value::F64(1.0), Value::F64(0.0), Opcode::Div);
        assert!(vm.to_f64(-1).is_infinite());
    }

    #[test]
    fn integer_division_by_zero_traps() {
        let (vm, result) = eval(
            vec![Value::I64(1), Value::I64(0)],
            vec![arg(Opcode::Const, 0), arg(Opcode::Const, 1), op(Opcode::Div), op(Opcode::Ret)],
        );
        let err = result.unwrap_err();
        assert_eq!(err.status(), Status::ErrorRuntime);
        match err {
            crate::VmError::Runtime(trap) => {
                assert_eq!(trap.kind, TrapKind::DivisionByZero);
                assert_eq!(trap.function, "main");
                assert_eq!(trap.at, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(vm.top(), 0);
    }

    #[test]
    fn mixed_types_trap_with_type_error() {
        let (_, result) = eval(
            vec![Value::I64(1), Value::string("x")],
            vec![arg(Opcode::Const, 0), arg(Opcode::Const, 1), op(Opcode::Add), op(Opcode::Ret)],
        );
        assert_eq!(result.unwrap_err().status(), Status::ErrorType);
    }

    #[test]
    fn comparisons() {
        assert!(binary(Value::I64(1), Value::I64(2), Opcode::Lt).to_bool(-1));
        assert!(binary(Value::string("ab"), Value::string("b"), Opcode::Lt).to_bool(-1));
        assert!(binary(Value::F64(2.0), Value::F64(2.0), Opcode::Gte).to_bool(-1));
        assert!(!binary(Value::F64(f64::NAN), Value::F64(f64::NAN), Opcode::Eq).to_bool(-1));
        assert!(!binary(Value::F64(f64::NAN), Value::F64(1.0), Opcode::Lte).to_bool(-1));
        assert!(!binary(Value::I64(1), Value::F64(1.0), Opcode::Eq).to_bool(-1));
        assert!(binary(Value::Null, Value::Null, Opcode::Eq).to_bool(-1));
        assert!(binary(Value::Bool(true), Value::I64(1), Opcode::Neq).to_bool(-1));
    }

    #[test]
    fn logic() {
        assert!(!binary(Value::Bool(true), Value::Bool(false), Opcode::And).to_bool(-1));
        assert!(binary(Value::Bool(true), Value::Bool(false), Opcode::Or).to_bool(-1));
        let (_, result) = eval(
            vec![Value::Bool(true), Value::Null],
            vec![arg(Opcode::Const, 0), arg(Opcode::Const, 1), op(Opcode::Or), op(Opcode::Ret)],
        );
        assert_eq!(result.unwrap_err().status(), Status::ErrorType);
    }

    #[test]
    fn concat_strings() {
        let vm = binary(Value::string("foo"), Value::string("\0bar"), Opcode::Concat);
        assert_eq!(vm.to_bytes(-1), Some(&b"foo\0bar"[..]));
    }

    #[test]
    fn is_type_keeps_value() {
        let (vm, result) = eval(
            vec![Value::F64(0.5)],
            vec![
                arg(Opcode::Const, 0),
                Instruction::new(Opcode::IsType, TypeTag::F64, 0, 0, 0),
                arg(Opcode::StoreLocal, 0),
                op(Opcode::Ret),
            ],
        );
        result.unwrap();
        assert_eq!(vm.to_f64(-1), 0.5);
    }

    #[test]
    fn locals_and_loop() {
        // local0 = 0; local1 = 0; while local0 < 5 { local1 += local0; local0 += 1 }
        let (vm, result) = eval(
            vec![Value::I64(0), Value::I64(5), Value::I64(1)],
            vec![
                arg(Opcode::Const, 0),
                arg(Opcode::StoreLocal, 0),
                arg(Opcode::Const, 0),
                arg(Opcode::StoreLocal, 1),
                arg(Opcode::LoadLocal, 0), // 4
                arg(Opcode::Const, 1),
                op(Opcode::Lt),
                arg(Opcode::JumpIfFalse, 17),
                arg(Opcode::LoadLocal, 1),
                arg(Opcode::LoadLocal, 0),
                op(Opcode::Add),
                arg(Opcode::StoreLocal, 1),
                arg(Opcode::LoadLocal, 0),
                arg(Opcode::Const, 2),
                op(Opcode::Add),
                arg(Opcode::StoreLocal, 0),
                arg(Opcode::Jump, 4),
                arg(Opcode::LoadLocal, 1), // 17
                op(Opcode::Ret),
            ],
        );
        result.unwrap();
        assert_eq!(vm.to_i64(-1), 10);
        assert_eq!(vm.top(), 1);
    }

    #[test]
    fn recursive_factorial() {
        let mut vm = Vm::new();
        // fact(n) = if n <= 1 { 1 } else { n * fact(n - 1) }
        let body = vec![
            arg(Opcode::LoadLocal, 0),
            arg(Opcode::Const, 0),
            op(Opcode::Lte),
            arg(Opcode::JumpIfFalse, 6),
            arg(Opcode::Const, 0),
            op(Opcode::Ret),
            arg(Opcode::LoadLocal, 0), // 6
            arg(Opcode::LoadLocal, 0),
            arg(Opcode::Const, 0),
            op(Opcode::Sub),
            call(Opcode::Call, 0, 1),
            op(Opcode::Mul),
            op(Opcode::Ret),
        ];
        load(&mut vm, vec![Value::I64(1)], vec![Function::new("fact", 1, 1, body)]);
        vm.push_i64(10);
        vm.call("fact", 1).unwrap();
        assert_eq!(vm.to_i64(-1), 3_628_800);
        assert_eq!(vm.top(), 1);
    }

    #[test]
    fn runaway_recursion_hits_depth_limit() {
        let mut vm = Vm::with_config(VmConfig::default().with_max_call_depth(16));
        load(
            &mut vm,
            vec![],
            vec![Function::new(
                "forever",
                0,
                0,
                vec![call(Opcode::Call, 0, 0), op(Opcode::Ret)],
            )],
        );
        vm.push_i64(42);
        let err = vm.call("forever", 0).unwrap_err();
        assert_eq!(err.status(), Status::ErrorMemory);
        assert_eq!(vm.top(), 1);
        assert_eq!(vm.to_i64(0), 42);
    }

    #[test]
    fn operand_growth_hits_stack_limit() {
        let mut vm = Vm::with_config(VmConfig::default().with_max_stack_depth(4));
        load(
            &mut vm,
            vec![Value::I64(1)],
            vec![Function::new(
                "grow",
                0,
                0,
                vec![
                    arg(Opcode::Const, 0),
                    arg(Opcode::Const, 0),
                    arg(Opcode::Const, 0),
                    arg(Opcode::Const, 0),
                    arg(Opcode::Const, 0),
                    op(Opcode::Add),
                    op(Opcode::Add),
                    op(Opcode::Add),
                    op(Opcode::Add),
                    op(Opcode::Ret),
                ],
            )],
        );
        let err = vm.call("grow", 0).unwrap_err();
        assert_eq!(err.status(), Status::ErrorMemory);
        assert_eq!(vm.top(), 0);
    }

    #[test]
    fn bytecode_calls_host() {
        let mut vm = Vm::new();
        vm.register_function("double", 1, |vm| {
            let x = vm.to_i64(0);
            vm.pop(1);
            vm.push_i64(x * 2);
            Status::Ok
        })
        .unwrap();
        load(
            &mut vm,
            vec![Value::string("double"), Value::I64(21)],
            vec![Function::new(
                "main",
                0,
                0,
                vec![arg(Opcode::Const, 1), call(Opcode::CallHost, 0, 1), op(Opcode::Ret)],
            )],
        );
        vm.call("main", 0).unwrap();
        assert_eq!(vm.to_i64(-1), 42);
    }

    #[test]
    fn host_must_leave_one_result() {
        let mut vm = Vm::new();
        vm.register_function("nothing", 0, |_| Status::Ok).unwrap();
        load(
            &mut vm,
            vec![Value::string("nothing"), Value::I64(1)],
            vec![Function::new(
                "main",
                0,
                0,
                vec![call(Opcode::CallHost, 0, 0), op(Opcode::Ret)],
            )],
        );
        let err = vm.call("main", 0).unwrap_err();
        assert!(matches!(
            err,
            crate::VmError::Runtime(RuntimeError {
                kind: TrapKind::HostResultCount { count: 0, .. },
                ..
            })
        ));
    }

    #[test]
    fn globals_from_bytecode() {
        let (mut vm, result) = eval(
            vec![Value::string("counter"), Value::I64(5)],
            vec![
                arg(Opcode::Const, 1),
                arg(Opcode::SetGlobal, 0),
                arg(Opcode::GetGlobal, 0),
                op(Opcode::Dup),
                op(Opcode::Add),
                op(Opcode::Ret),
            ],
        );
        result.unwrap();
        assert_eq!(vm.to_i64(-1), 10);
        vm.get_global("counter").unwrap();
        assert_eq!(vm.to_i64(-1), 5);
    }

    #[test]
    fn unknown_global_traps() {
        let (_, result) = eval(
            vec![Value::string("missing")],
            vec![arg(Opcode::GetGlobal, 0), op(Opcode::Ret)],
        );
        assert_eq!(result.unwrap_err().status(), Status::ErrorRuntime);
    }
}
