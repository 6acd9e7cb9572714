//! Execution trace output.
//!
//! Before each dispatch the engine writes the stack, bottom to top, and the
//! disassembled instruction about to run:
//!
//! ```text
//!           [ 1 ][ 2 ]
//! 0004    | OP_ADD
//! ```

use std::{
    fmt::Write as _,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use rlox_core::{disasm, Chunk, Value};

/// Format one trace record (two lines, newline-terminated).
pub fn trace_record(stack: &[Value], chunk: &Chunk, offset: usize) -> String {
    let mut out = String::from("          ");
    for slot in stack {
        let _ = write!(out, "[ {slot} ]");
    }
    out.push('\n');
    disasm::disassemble_instruction(chunk, offset, &mut out);
    out
}

/// Writer that captures trace output into a shared `String` (tests, REPLs).
#[derive(Debug, Default, Clone)]
pub struct Captured(Arc<Mutex<String>>);

impl Captured {
    /// Copy of the buffer.
    pub fn get(&self) -> String {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Empty the buffer.
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push_str(&s);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
