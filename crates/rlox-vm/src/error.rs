//! Runtime faults.
//!
//! Every fault ends the current run and leaves the chunk untouched.

use rlox_core::CompileError;
use thiserror::Error;

/// What went wrong while executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Push on a full stack.
    #[error("stack overflow (capacity {capacity})")]
    StackOverflow {
        /// Configured stack capacity.
        capacity: usize,
    },
    /// Pop from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,
    /// Opcode outside the executable subset, declared or not.
    #[error("unknown opcode {opcode}")]
    UnknownOpcode {
        /// Raw byte.
        opcode: u8,
    },
    /// Constant load past the end of the pool.
    #[error("constant index {index} out of range (pool has {len})")]
    ConstantIndexOutOfRange {
        /// Referenced index.
        index: usize,
        /// Pool length.
        len: usize,
    },
    /// Code ended inside an instruction, or without a return.
    #[error("truncated instruction: {needed} more byte(s) expected")]
    TruncatedInstruction {
        /// Missing byte count.
        needed: usize,
    },
}

/// A fault plus where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {}] {fault} at offset {offset}", line_label(.line))]
pub struct RuntimeError {
    /// The fault.
    pub fault: Fault,
    /// Offset of the instruction being executed.
    pub offset: usize,
    /// Its source line, `None` past the end of the code.
    pub line: Option<u32>,
}

fn line_label(line: &Option<u32>) -> String {
    line.map_or_else(|| "?".to_owned(), |l| l.to_string())
}

/// Outcome of [`crate::Vm::interpret`] when it does not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// The front end rejected the source.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    /// The chunk faulted.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Résultat de la VM.
pub type VmResult<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = RuntimeError { fault: Fault::StackUnderflow, offset: 3, line: Some(7) };
        assert_eq!(e.to_string(), "[line 7] stack underflow at offset 3");
        let e = RuntimeError {
            fault: Fault::TruncatedInstruction { needed: 1 },
            offset: 9,
            line: None,
        };
        assert_eq!(
            e.to_string(),
            "[line ?] truncated instruction: 1 more byte(s) expected at offset 9"
        );
        let e: InterpretError = CompileError::new(2, "bad").into();
        assert_eq!(e.to_string(), "compile error: [line 2] bad");
    }
}
