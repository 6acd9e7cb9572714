//! Bytecode chunk: instruction bytes, constant pool and line table.
//!
//! Wide constant loads carry their pool index as 4 bytes, least significant
//! first, over the full `u32` range.

use crate::{
    buffer::push_grow,
    error::{ChunkError, CoreResult},
    lines::LineTable,
    opcode::OpCode,
    value::Value,
};

/// Largest pool index that still fits the short `OP_CONSTANT` operand.
pub const SHORT_CONSTANT_MAX: usize = u8::MAX as usize;

/// Constant pool with stable indices (0-based).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    values: Vec<Value>,
}

impl ConstantPool {
    /// Create an empty pool.
    pub const fn new() -> Self { Self { values: Vec::new() } }

    /// Number of stored constants.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Current allocation, in values.
    pub fn capacity(&self) -> usize { self.values.capacity() }

    /// Pushes a value and returns its index. Equal values are not merged.
    pub fn add(&mut self, value: Value) -> usize {
        push_grow(&mut self.values, value);
        self.values.len() - 1
    }

    /// Lookup a constant by index.
    pub fn get(&self, idx: usize) -> Option<Value> { self.values.get(idx).copied() }

    /// All constants in index order.
    pub fn as_slice(&self) -> &[Value] { &self.values }

    /// Iterate as `(index, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.values.iter().copied().enumerate()
    }

    /// Remove all constants and release the allocation.
    pub fn clear(&mut self) { self.values = Vec::new(); }
}

/// Bytecode chunk.
///
/// Grows monotonically: bytes, constants and line runs are appended and
/// never removed one by one. [`Chunk::release`] drops all three at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    constants: ConstantPool,
    lines: LineTable,
}

impl Chunk {
    /// Create an empty chunk.
    pub const fn new() -> Self {
        Self { code: Vec::new(), constants: ConstantPool::new(), lines: LineTable::new() }
    }

    /// Instruction stream.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Constant pool.
    pub fn constants(&self) -> &ConstantPool { &self.constants }

    /// Line table.
    pub fn lines(&self) -> &LineTable { &self.lines }

    /// Number of bytes of code.
    pub fn len(&self) -> usize { self.code.len() }

    /// True when no byte has been written.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// Current allocation of the code buffer, in bytes.
    pub fn capacity(&self) -> usize { self.code.capacity() }

    /// Source line of the byte at `offset`.
    pub fn line(&self, offset: usize) -> Option<u32> { self.lines.line(offset) }

    /// Append one byte and record the source line it came from.
    ///
    /// Lines above [`MAX_LINE`](crate::lines::MAX_LINE) (`0xFF_FFFF`) do not fit
    /// the packed line table: they are recorded as `MAX_LINE`, and
    /// [`Chunk::line`] returns that value for the byte.
    pub fn write(&mut self, byte: u8, line: u32) {
        push_grow(&mut self.code, byte);
        self.lines.push(line);
    }

    /// Append an opcode byte.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.as_u8(), line); }

    /// Append a constant and return its index.
    pub fn add_constant(&mut self, value: Value) -> usize { self.constants.add(value) }

    /// Add `value` to the pool and emit the load instruction sized to its index.
    ///
    /// Indices up to 255 use `OP_CONSTANT idx`; larger ones use
    /// `OP_CONSTANT_LONG b0 b1 b2 b3` (little-endian). Returns the index.
    ///
    /// # Panics
    ///
    /// When the pool already holds more than `u32::MAX` constants, the most a
    /// 4-byte operand can address. [`Chunk::try_write_constant`] reports that
    /// case as an error instead.
    pub fn write_constant(&mut self, value: Value, line: u32) -> usize {
        match self.try_write_constant(value, line) {
            Ok(index) => index,
            Err(e) => panic!("write_constant: {e}"),
        }
    }

    /// Checked [`Chunk::write_constant`]. On error nothing is added or emitted.
    pub fn try_write_constant(&mut self, value: Value, line: u32) -> CoreResult<usize> {
        let index = self.constants.len();
        if let Ok(short) = u8::try_from(index) {
            self.add_constant(value);
            self.write_op(OpCode::Constant, line);
            self.write(short, line);
        } else {
            let operand = wide_operand(index)?;
            self.add_constant(value);
            self.write_op(OpCode::ConstantLong, line);
            for byte in operand {
                self.write(byte, line);
            }
        }
        Ok(index)
    }

    /// Decode the constant load at `offset`.
    ///
    /// Returns the pool index and the offset of the next instruction. The
    /// index is not checked against the pool.
    pub fn constant_operand(&self, offset: usize) -> CoreResult<(usize, usize)> {
        let opcode = *self.code.get(offset).ok_or(ChunkError::TruncatedOperand {
            offset,
            needed: 1,
            available: 0,
        })?;
        let width = match OpCode::from_u8(opcode) {
            Some(OpCode::Constant) => 1,
            Some(OpCode::ConstantLong) => 4,
            _ => return Err(ChunkError::UnknownOpcode { opcode, offset }),
        };
        let start = offset + 1;
        let operand = self.code.get(start..start + width).ok_or(ChunkError::TruncatedOperand {
            offset,
            needed: width,
            available: self.code.len() - start,
        })?;
        let index = match *operand {
            [b] => usize::from(b),
            [b0, b1, b2, b3] => u32::from_le_bytes([b0, b1, b2, b3]) as usize,
            _ => unreachable!("operand width is 1 or 4"),
        };
        Ok((index, start + width))
    }

    /// Structural validation of the instruction stream.
    ///
    /// Checks that every opcode belongs to the executable subset, operands
    /// are complete, constant indices are in range and the line table covers
    /// exactly the code.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.len() != self.code.len() {
            return Err(ChunkError::LineMismatch { lines: self.lines.len(), code: self.code.len() });
        }

        let mut offset = 0;
        while offset < self.code.len() {
            let opcode = self.code[offset];
            match OpCode::from_u8(opcode) {
                Some(OpCode::Constant | OpCode::ConstantLong) => {
                    let (index, next) = self.constant_operand(offset)?;
                    if index >= self.constants.len() {
                        return Err(ChunkError::ConstantOutOfRange {
                            index,
                            len: self.constants.len(),
                            offset,
                        });
                    }
                    offset = next;
                }
                Some(op) if op.is_executable() => offset += 1,
                _ => return Err(ChunkError::UnknownOpcode { opcode, offset }),
            }
        }

        #[cfg(feature = "trace")]
        log::trace!("chunk ok: {} bytes, {} constants", self.code.len(), self.constants.len());
        Ok(())
    }

    /// Discard code, constants and lines, returning to the freshly created state.
    pub fn release(&mut self) {
        self.code = Vec::new();
        self.constants.clear();
        self.lines.clear();
    }
}

/// `OP_CONSTANT_LONG` operand bytes for `index`.
fn wide_operand(index: usize) -> CoreResult<[u8; 4]> {
    u32::try_from(index)
        .map(u32::to_le_bytes)
        .map_err(|_| ChunkError::ConstantIndexTooWide { index })
}

/* ─────────────────────────── Tests ─────────────────────────── */
