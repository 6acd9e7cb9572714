//! Tiny line-oriented assembler, used to feed chunks through the
//! [`Compiler`] hand-off without a real front end.
//!
//! ```text
//! ; comments start with a semicolon
//! .line 123          ; following instructions are attributed to line 123
//! CONSTANT 1.2       ; short or long form picked from the pool index
//! CONSTANT 2.5
//! ADD
//! NEGATE
//! BYTE 200           ; raw byte, for exercising the decoders
//! RETURN
//! ```
//!
//! Without a `.line` directive, each instruction takes the line it appears on.
//! Any declared mnemonic is accepted (with or without `OP_`), including
//! opcodes the engine does not execute.

use crate::{
    chunk::Chunk,
    compiler::Compiler,
    error::CompileError,
    opcode::OpCode,
    value::Value,
};

/// Assembler for the syntax above.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler;

impl Compiler for Assembler {
    fn compile(&self, source: &str) -> Result<Chunk, CompileError> { assemble(source) }
}

/// Assemble a source snippet into a [`Chunk`].
pub fn assemble(source: &str) -> Result<Chunk, CompileError> {
    let mut chunk = Chunk::new();
    let mut pinned_line: Option<u32> = None;

    for (idx, raw_line) in source.lines().enumerate() {
        let source_line = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let line = raw_line.split(';').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let at = pinned_line.unwrap_or(source_line);

        if head.eq_ignore_ascii_case(".line") {
            let n = rest.parse::<u32>().map_err(|_| {
                CompileError::new(source_line, format!(".line expects a line number: `{rest}`"))
            })?;
            pinned_line = Some(n);
            continue;
        }

        if head.eq_ignore_ascii_case("BYTE") {
            let byte = rest.parse::<u8>().map_err(|_| {
                CompileError::new(source_line, format!("BYTE expects 0..=255: `{rest}`"))
            })?;
            chunk.write(byte, at);
            continue;
        }

        let op = OpCode::from_mnemonic(head).ok_or_else(|| {
            CompileError::new(source_line, format!("unknown instruction `{head}`"))
        })?;

        match op {
            OpCode::Constant | OpCode::ConstantLong => {
                let n = rest.parse::<f64>().map_err(|_| {
                    CompileError::new(source_line, format!("CONSTANT expects a number: `{rest}`"))
                })?;
                chunk
                    .try_write_constant(Value::from(n), at)
                    .map_err(|e| CompileError::new(source_line, e.to_string()))?;
            }
            _ if !rest.is_empty() => {
                return Err(CompileError::new(
                    source_line,
                    format!("{} takes no operand, got `{rest}`", op.mnemonic()),
                ));
            }
            _ => chunk.write_op(op, at),
        }
    }

    Ok(chunk)
}
