//! Stack machine executing one chunk per run.
//!
//! Each `Vm` owns its stack and configuration; a chunk is only borrowed,
//! read-only, for the duration of [`Vm::run`]. Separate instances share
//! nothing and can run on separate threads.

use std::{
    fmt,
    io::{self, Write},
};

use rlox_core::{Chunk, Compiler, OpCode, Value};

use crate::{
    config::VmConfig,
    error::{Fault, InterpretError, RuntimeError, VmResult},
    stack::Stack,
    trace::trace_record,
};

/// Instruction pointer over a borrowed chunk, with bounds-checked reads.
#[derive(Debug, Clone, Copy)]
struct Cursor<'c> {
    chunk: &'c Chunk,
    ip: usize,
}

impl<'c> Cursor<'c> {
    const fn new(chunk: &'c Chunk) -> Self { Self { chunk, ip: 0 } }

    fn read_byte(&mut self) -> Result<u8, Fault> {
        let byte = *self
            .chunk
            .code()
            .get(self.ip)
            .ok_or(Fault::TruncatedInstruction { needed: 1 })?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u32_le(&mut self) -> Result<u32, Fault> {
        let code = self.chunk.code();
        let bytes = code.get(self.ip..self.ip + 4).ok_or_else(|| Fault::TruncatedInstruction {
            needed: (self.ip + 4).saturating_sub(code.len()),
        })?;
        self.ip += 4;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn constant(&self, index: usize) -> Result<Value, Fault> {
        let pool = self.chunk.constants();
        pool.get(index).ok_or(Fault::ConstantIndexOutOfRange { index, len: pool.len() })
    }

    fn read_constant(&mut self) -> Result<Value, Fault> {
        let index = usize::from(self.read_byte()?);
        self.constant(index)
    }

    fn read_constant_long(&mut self) -> Result<Value, Fault> {
        let index = usize::try_from(self.read_u32_le()?).unwrap_or(usize::MAX);
        self.constant(index)
    }
}

/// Virtual machine.
pub struct Vm {
    config: VmConfig,
    stack: Stack,
    trace_out: Option<Box<dyn Write + Send>>,
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("config", &self.config)
            .field("stack", &self.stack)
            .field("trace_out", &self.trace_out.as_ref().map(|_| "<writer>"))
            .finish()
    }
}

impl Default for Vm {
    fn default() -> Self { Self::new() }
}

impl Vm {
    /// VM with default limits, tracing off.
    pub fn new() -> Self { Self::with_config(VmConfig::default()) }

    /// VM with explicit limits.
    pub fn with_config(config: VmConfig) -> Self {
        Vm { stack: Stack::new(config.stack_max), trace_out: None, config }
    }

    /// Send trace records to `writer` instead of stderr. Does not enable tracing.
    #[must_use]
    pub fn with_trace_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.trace_out = Some(Box::new(writer));
        self
    }

    /// Toggle tracing at runtime.
    pub fn set_trace(&mut self, on: bool) { self.config.trace = on; }

    /// Active configuration.
    pub const fn config(&self) -> &VmConfig { &self.config }

    /// Operand stack, bottom to top. After a fault it shows the state at the fault.
    pub fn stack(&self) -> &[Value] { self.stack.as_slice() }

    /// Compile `source` through `compiler`, then run the chunk.
    pub fn interpret<C>(&mut self, source: &str, compiler: &C) -> Result<Value, InterpretError>
    where
        C: Compiler + ?Sized,
    {
        let chunk = compiler.compile(source)?;
        Ok(self.run(&chunk)?)
    }

    /// Execute `chunk` until `OP_RETURN` (its popped value is the result) or a fault.
    pub fn run(&mut self, chunk: &Chunk) -> VmResult<Value> {
        self.stack.reset();
        let mut cursor = Cursor::new(chunk);

        #[cfg(feature = "trace")]
        log::debug!(
            "run: {} bytes, {} constants, stack_max={}",
            chunk.len(),
            chunk.constants().len(),
            self.config.stack_max
        );

        loop {
            let offset = cursor.ip;
            if self.config.trace {
                self.trace(chunk, offset);
            }
            match self.step(&mut cursor) {
                Ok(None) => {}
                Ok(Some(result)) => {
                    #[cfg(feature = "trace")]
                    log::debug!("run: returned {result}");
                    return Ok(result);
                }
                Err(fault) => {
                    let err = RuntimeError { fault, offset, line: chunk.line(offset) };
                    #[cfg(feature = "trace")]
                    log::warn!("run: {err}");
                    return Err(err);
                }
            }
        }
    }

    /// Fetch, decode and execute one instruction. `Some` on return.
    fn step(&mut self, cursor: &mut Cursor<'_>) -> Result<Option<Value>, Fault> {
        let byte = cursor.read_byte()?;
        let op = OpCode::from_u8(byte).ok_or(Fault::UnknownOpcode { opcode: byte })?;

        match op {
            OpCode::Constant => {
                let value = cursor.read_constant()?;
                self.stack.push(value)?;
            }
            OpCode::ConstantLong => {
                let value = cursor.read_constant_long()?;
                self.stack.push(value)?;
            }
            OpCode::Negate => {
                let value = self.stack.pop()?;
                self.stack.push(Value::Number(-value.as_number()))?;
            }
            OpCode::Add => self.binary_op(|a, b| a + b)?,
            OpCode::Subtract => self.binary_op(|a, b| a - b)?,
            OpCode::Multiply => self.binary_op(|a, b| a * b)?,
            OpCode::Divide => self.binary_op(|a, b| a / b)?,
            OpCode::Return => return self.stack.pop().map(Some),

            OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::Equal
            | OpCode::Greater
            | OpCode::Less
            | OpCode::Not
            | OpCode::DefineGlobal
            | OpCode::GetGlobal
            | OpCode::SetGlobal
            | OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetUpvalue
            | OpCode::SetUpvalue
            | OpCode::Pop
            | OpCode::Print
            | OpCode::Jump
            | OpCode::JumpIfFalse
            | OpCode::Loop
            | OpCode::Call
            | OpCode::Closure
            | OpCode::CloseUpvalue => return Err(Fault::UnknownOpcode { opcode: byte }),
        }
        Ok(None)
    }

    /// Pops `b` then `a`, pushes `a op b`.
    fn binary_op(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<(), Fault> {
        let b = self.stack.pop()?.as_number();
        let a = self.stack.pop()?.as_number();
        self.stack.push(Value::Number(op(a, b)))
    }

    fn trace(&mut self, chunk: &Chunk, offset: usize) {
        let record = trace_record(self.stack.as_slice(), chunk, offset);
        let written = match self.trace_out.as_mut() {
            Some(w) => w.write_all(record.as_bytes()),
            None => io::stderr().lock().write_all(record.as_bytes()),
        };
        if let Err(_e) = written {
            #[cfg(feature = "trace")]
            log::warn!("trace sink at offset {offset}: {_e}");
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Captured;
    use pretty_assertions::assert_eq;

    fn chunk_of(ops: &[(Option<f64>, OpCode)]) -> Chunk {
        let mut chunk = Chunk::new();
        for &(constant, op) in ops {
            match constant {
                Some(v) => {
                    chunk.write_constant(Value::from(v), 1);
                }
                None => chunk.write_op(op, 1),
            }
        }
        chunk
    }

    const fn k(v: f64) -> (Option<f64>, OpCode) { (Some(v), OpCode::Constant) }
    const fn op(op: OpCode) -> (Option<f64>, OpCode) { (None, op) }

    #[test]
    fn arithmetic() {
        let mut vm = Vm::new();
        let cases = [
            (vec![k(1.0), k(2.0), op(OpCode::Add), op(OpCode::Return)], 3.0),
            (vec![k(4.0), k(2.0), op(OpCode::Subtract), op(OpCode::Return)], 2.0),
            (vec![k(3.0), k(5.0), op(OpCode::Multiply), op(OpCode::Return)], 15.0),
            (vec![k(1.0), k(4.0), op(OpCode::Divide), op(OpCode::Return)], 0.25),
            (vec![k(2.5), op(OpCode::Negate), op(OpCode::Return)], -2.5),
        ];
        for (ops, expected) in cases {
            assert_eq!(vm.run(&chunk_of(&ops)), Ok(Value::from(expected)));
        }
    }

    #[test]
    fn divide_by_zero_is_ieee() {
        let mut vm = Vm::new();
        let chunk = chunk_of(&[k(1.0), k(0.0), op(OpCode::Divide), op(OpCode::Return)]);
        assert_eq!(vm.run(&chunk), Ok(Value::from(f64::INFINITY)));
    }

    #[test]
    fn long_constants_execute() {
        let mut chunk = Chunk::new();
        for i in 0..300 {
            chunk.add_constant(Value::from(i));
        }
        chunk.write_constant(Value::from(40.0), 1);
        chunk.write_constant(Value::from(2.0), 1);
        chunk.write_op(OpCode::Add, 1);
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(Vm::new().run(&chunk), Ok(Value::from(42.0)));
    }

    #[test]
    fn wide_load_followed_by_more_code() {
        let mut chunk = Chunk::new();
        for _ in 0..256 {
            chunk.add_constant(Value::from(0.0));
        }
        assert_eq!(chunk.write_constant(Value::from(5.0), 1), 256);
        chunk.write_op(OpCode::Negate, 1);
        chunk.write_op(OpCode::Return, 2);
        assert_eq!(chunk.code()[0], OpCode::ConstantLong.as_u8());
        assert_eq!(Vm::new().run(&chunk), Ok(Value::from(-5.0)));
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn failing_trace_sink_does_not_abort_run() {
        let mut vm = Vm::with_config(VmConfig::new().with_trace(true)).with_trace_writer(BrokenSink);
        let chunk = chunk_of(&[k(6.0), k(2.0), op(OpCode::Divide), op(OpCode::Return)]);
        assert_eq!(vm.run(&chunk), Ok(Value::from(3.0)));
    }

    #[test]
    fn underflow_is_reported() {
        let chunk = chunk_of(&[k(1.0), op(OpCode::Add), op(OpCode::Return)]);
        let err = Vm::new().run(&chunk).unwrap_err();
        assert_eq!(err, RuntimeError { fault: Fault::StackUnderflow, offset: 2, line: Some(1) });
    }

    #[test]
    fn unwired_opcodes_fault() {
        let chunk = chunk_of(&[op(OpCode::Nil), op(OpCode::Return)]);
        let err = Vm::new().run(&chunk).unwrap_err();
        assert_eq!(err.fault, Fault::UnknownOpcode { opcode: OpCode::Nil.as_u8() });

        let mut chunk = Chunk::new();
        chunk.write(250, 9);
        let err = Vm::new().run(&chunk).unwrap_err();
        assert_eq!(err, RuntimeError { fault: Fault::UnknownOpcode { opcode: 250 }, offset: 0, line: Some(9) });
    }

    #[test]
    fn bad_constant_index() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(5, 1);
        let err = Vm::new().run(&chunk).unwrap_err();
        assert_eq!(err.fault, Fault::ConstantIndexOutOfRange { index: 5, len: 0 });
    }

    #[test]
    fn truncated_code() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::ConstantLong, 1);
        chunk.write(0, 1);
        let err = Vm::new().run(&chunk).unwrap_err();
        assert_eq!(err.fault, Fault::TruncatedInstruction { needed: 3 });

        let chunk = chunk_of(&[k(1.0)]);
        let err = Vm::new().run(&chunk).unwrap_err();
        assert_eq!(err, RuntimeError { fault: Fault::TruncatedInstruction { needed: 1 }, offset: 2, line: None });
    }

    #[test]
    fn trace_dumps_stack_before_each_instruction() {
        let cap = Captured::default();
        let mut vm = Vm::with_config(VmConfig::new().with_trace(true)).with_trace_writer(cap.clone());
        let chunk = chunk_of(&[k(1.0), k(2.0), op(OpCode::Add), op(OpCode::Return)]);
        assert_eq!(vm.run(&chunk), Ok(Value::from(3.0)));
        assert_eq!(
            cap.get(),
            "          \n\
             0000 0001 OP_CONSTANT         0 '1'\n\
             \x20         [ 1 ]\n\
             0002    | OP_CONSTANT         1 '2'\n\
             \x20         [ 1 ][ 2 ]\n\
             0004    | OP_ADD\n\
             \x20         [ 3 ]\n\
             0005    | OP_RETURN\n"
        );
    }

    #[test]
    fn trace_does_not_change_results() {
        let chunk = chunk_of(&[k(7.0), k(3.0), op(OpCode::Subtract), op(OpCode::Return)]);
        let plain = Vm::new().run(&chunk);
        let mut traced = Vm::new().with_trace_writer(io::sink());
        traced.set_trace(true);
        assert_eq!(traced.run(&chunk), plain);
    }

    #[test]
    fn thread_bounds() {
        fn send<T: Send>() {}
        fn sync<T: Sync>() {}
        send::<Vm>();
        send::<Chunk>();
        sync::<Chunk>();
    }

    #[test]
    fn vm_is_reusable_after_fault() {
        let mut vm = Vm::new();
        let bad = chunk_of(&[op(OpCode::Return)]);
        assert!(vm.run(&bad).is_err());
        let good = chunk_of(&[k(1.0), op(OpCode::Return)]);
        assert_eq!(vm.run(&good), Ok(Value::from(1.0)));
        assert!(vm.stack().is_empty());
    }
}
