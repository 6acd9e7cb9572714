//! Hand-off point between a front end and the chunk consumers.
//!
//! The real lexer/parser/compiler lives outside this workspace. Anything that
//! turns source text into a populated [`Chunk`] can be plugged in here.

use crate::{chunk::Chunk, error::CompileError};

/// Source text → chunk.
pub trait Compiler {
    /// Compile `source` into a fresh chunk.
    fn compile(&self, source: &str) -> Result<Chunk, CompileError>;
}

impl<F> Compiler for F
where
    F: Fn(&str) -> Result<Chunk, CompileError>,
{
    fn compile(&self, source: &str) -> Result<Chunk, CompileError> { self(source) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{opcode::OpCode, value::Value};

    fn one_constant(source: &str) -> Result<Chunk, CompileError> {
        let n: f64 = source.trim().parse().map_err(|_| CompileError::new(1, "expected a number"))?;
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::from(n), 1);
        chunk.write_op(OpCode::Return, 1);
        Ok(chunk)
    }

    #[test]
    fn closures_are_compilers() {
        let chunk = one_constant.compile("4.5").unwrap();
        assert_eq!(chunk.constants().get(0), Some(Value::from(4.5)));
        assert_eq!(one_constant.compile("x").unwrap_err().line, 1);
    }
}
