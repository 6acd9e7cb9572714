//! Erreurs du cœur : validation structurelle d'un chunk, front end.

use thiserror::Error;

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, ChunkError>;

/// Structural problems found while walking a chunk's instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// Byte at `offset` is not in the executable instruction subset.
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode {
        /// Raw opcode byte.
        opcode: u8,
        /// Offset of the opcode.
        offset: usize,
    },
    /// The code ends before the operand of the instruction at `offset`.
    #[error("instruction at offset {offset} needs {needed} operand bytes, {available} left")]
    TruncatedOperand {
        /// Offset of the opcode.
        offset: usize,
        /// Operand width of the opcode.
        needed: usize,
        /// Bytes actually left after the opcode.
        available: usize,
    },
    /// A load refers past the end of the constant pool.
    #[error("constant index {index} out of range (pool has {len}) at offset {offset}")]
    ConstantOutOfRange {
        /// Referenced index.
        index: usize,
        /// Pool length.
        len: usize,
        /// Offset of the opcode.
        offset: usize,
    },
    /// Pool index too large for the 4-byte `OP_CONSTANT_LONG` operand.
    #[error("constant index {index} does not fit a 4-byte operand (max {max})", max = u32::MAX)]
    ConstantIndexTooWide {
        /// Index that would have been emitted.
        index: usize,
    },
    /// Line table and code disagree on length.
    #[error("line table covers {lines} bytes, code has {code}")]
    LineMismatch {
        /// Bytes covered by the line table.
        lines: usize,
        /// Bytes of code.
        code: usize,
    },
}

/// Failure reported by a front end handing a chunk over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] {message}")]
pub struct CompileError {
    /// Source line the error points at.
    pub line: u32,
    /// Human readable description.
    pub message: String,
}

impl CompileError {
    /// Build an error for `line`.
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}
