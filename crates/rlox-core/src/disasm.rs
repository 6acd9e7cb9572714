//! Textual disassembly.
//!
//! One line per instruction:
//!
//! ```text
//! 0000 0123 OP_CONSTANT         0 '1.2'
//! 0002    | OP_CONSTANT_LONG  300 '7'
//! 0007 0124 OP_RETURN
//! ```
//!
//! The offset and the line are zero-padded to 4 digits; the line is replaced
//! by `   |` when it repeats the previous byte's line. Never panics and never
//! stops early: unknown opcodes are reported and skipped one byte at a time.

use core::fmt::Write;

use crate::{
    chunk::Chunk,
    error::ChunkError,
    opcode::OpCode,
};

/// Placeholder printed instead of a line number repeated from the previous byte.
pub const SAME_LINE: &str = "   |";

/// Disassemble the whole chunk under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Append the instruction at `offset` to `out` and return the next offset.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{offset:04} ");
    let line = chunk.line(offset);
    if offset > 0 && line == chunk.line(offset - 1) {
        let _ = write!(out, "{SAME_LINE} ");
    } else {
        let _ = write!(out, "{:04} ", line.unwrap_or_default());
    }

    let Some(&byte) = chunk.code().get(offset) else {
        let _ = writeln!(out, "<end of code>");
        return offset + 1;
    };

    match OpCode::from_u8(byte) {
        Some(op @ (OpCode::Constant | OpCode::ConstantLong)) => constant_instruction(chunk, op, offset, out),
        Some(op) if op.is_executable() => simple_instruction(op, offset, out),
        Some(op) => {
            let _ = writeln!(out, "Unknown opcode {byte} ({op})");
            offset + 1
        }
        None => {
            let _ = writeln!(out, "Unknown opcode {byte}");
            offset + 1
        }
    }
}

/// Disassemble a single instruction into its own line, without the trailing newline.
pub fn instruction_to_string(chunk: &Chunk, offset: usize) -> String {
    let mut out = String::new();
    disassemble_instruction(chunk, offset, &mut out);
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn simple_instruction(op: OpCode, offset: usize, out: &mut String) -> usize {
    let _ = writeln!(out, "{}", op.mnemonic());
    offset + 1
}

fn constant_instruction(chunk: &Chunk, op: OpCode, offset: usize, out: &mut String) -> usize {
    let name = op.mnemonic();
    match chunk.constant_operand(offset) {
        Ok((index, next)) => {
            match chunk.constants().get(index) {
                Some(value) => {
                    let _ = writeln!(out, "{name:<16} {index:4} '{value}'");
                }
                None => {
                    let _ = writeln!(out, "{name:<16} {index:4} <no such constant>");
                }
            }
            next
        }
        Err(ChunkError::TruncatedOperand { needed, available, .. }) => {
            let _ = writeln!(out, "{name:<16} <truncated operand: {available}/{needed} bytes>");
            chunk.len()
        }
        Err(other) => {
            let _ = writeln!(out, "{name:<16} <{other}>");
            offset + 1
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
