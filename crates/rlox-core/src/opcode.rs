//! Instruction set.
//!
//! Opcode byte values are part of the chunk format: a compiler front end
//! emits them and the engine decodes them, so the numbering never changes.
//! The whole language's instruction set is declared here, but only the
//! *executable* subset (constants, arithmetic, return) is understood by the
//! disassembler and the engine; everything else decodes as a fault there.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bytecode opcodes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OpCode {
    /// Load constant, 1-byte pool index.
    Constant = 0,
    /// Load constant, 4-byte little-endian pool index.
    ConstantLong = 1,
    /// Push nil.
    Nil = 2,
    /// Push true.
    True = 3,
    /// Push false.
    False = 4,
    /// Equality.
    Equal = 5,
    /// `a > b`.
    Greater = 6,
    /// `a < b`.
    Less = 7,
    /// `a + b`.
    Add = 8,
    /// `a - b`.
    Subtract = 9,
    /// `a * b`.
    Multiply = 10,
    /// `a / b`.
    Divide = 11,
    /// Logical not.
    Not = 12,
    /// Arithmetic negation.
    Negate = 13,
    /// Define a global variable.
    DefineGlobal = 14,
    /// Read a global variable.
    GetGlobal = 15,
    /// Assign a global variable.
    SetGlobal = 16,
    /// Read a local slot.
    GetLocal = 17,
    /// Assign a local slot.
    SetLocal = 18,
    /// Read a captured upvalue.
    GetUpvalue = 19,
    /// Assign a captured upvalue.
    SetUpvalue = 20,
    /// Discard the top of the stack.
    Pop = 21,
    /// Print the top of the stack.
    Print = 22,
    /// Unconditional forward jump.
    Jump = 23,
    /// Forward jump when the top of the stack is falsey.
    JumpIfFalse = 24,
    /// Backward jump.
    Loop = 25,
    /// Call a function.
    Call = 26,
    /// Build a closure.
    Closure = 27,
    /// Hoist a captured local to the heap.
    CloseUpvalue = 28,
    /// Return from the current chunk.
    Return = 29,
}

impl OpCode {
    /// Every declared opcode, in byte order.
    pub const ALL: [OpCode; 30] = [
        OpCode::Constant,
        OpCode::ConstantLong,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Equal,
        OpCode::Greater,
        OpCode::Less,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::DefineGlobal,
        OpCode::GetGlobal,
        OpCode::SetGlobal,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::GetUpvalue,
        OpCode::SetUpvalue,
        OpCode::Pop,
        OpCode::Print,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::Loop,
        OpCode::Call,
        OpCode::Closure,
        OpCode::CloseUpvalue,
        OpCode::Return,
    ];

    /// Decode a raw byte. `None` when the byte is not a declared opcode.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Raw byte value.
    pub const fn as_u8(self) -> u8 { self as u8 }

    /// Mnemonic used in disassembly listings.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::ConstantLong => "OP_CONSTANT_LONG",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::GetUpvalue => "OP_GET_UPVALUE",
            OpCode::SetUpvalue => "OP_SET_UPVALUE",
            OpCode::Pop => "OP_POP",
            OpCode::Print => "OP_PRINT",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Loop => "OP_LOOP",
            OpCode::Call => "OP_CALL",
            OpCode::Closure => "OP_CLOSURE",
            OpCode::CloseUpvalue => "OP_CLOSE_UPVALUE",
            OpCode::Return => "OP_RETURN",
        }
    }

    /// Lookup by mnemonic, with or without the `OP_` prefix, case-insensitive.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("OP_").unwrap_or(&upper);
        Self::ALL
            .iter()
            .copied()
            .find(|op| &op.mnemonic()[3..] == bare)
    }

    /// True for opcodes the disassembler and the engine know how to decode.
    pub const fn is_executable(self) -> bool {
        matches!(
            self,
            OpCode::Constant
                | OpCode::ConstantLong
                | OpCode::Add
                | OpCode::Subtract
                | OpCode::Multiply
                | OpCode::Divide
                | OpCode::Negate
                | OpCode::Return
        )
    }

    /// Operand bytes following the opcode, for the executable subset.
    ///
    /// `None` for declared-but-unwired opcodes, whose encoding is not fixed yet.
    pub const fn operand_width(self) -> Option<usize> {
        match self {
            OpCode::Constant => Some(1),
            OpCode::ConstantLong => Some(4),
            op if op.is_executable() => Some(0),
            _ => None,
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op.as_u8() }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_u8(byte).ok_or(byte)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_values_match_declaration_order() {
        for (i, op) in OpCode::ALL.iter().enumerate() {
            assert_eq!(usize::from(op.as_u8()), i, "{op}");
            assert_eq!(OpCode::from_u8(op.as_u8()), Some(*op));
        }
        assert_eq!(OpCode::Constant.as_u8(), 0);
        assert_eq!(OpCode::Return.as_u8(), 29);
        assert_eq!(OpCode::from_u8(30), None);
        assert_eq!(OpCode::try_from(255), Err(255));
    }

    #[test]
    fn executable_subset() {
        let exec: Vec<_> = OpCode::ALL.iter().filter(|op| op.is_executable()).collect();
        assert_eq!(exec.len(), 8);
        assert_eq!(OpCode::Constant.operand_width(), Some(1));
        assert_eq!(OpCode::ConstantLong.operand_width(), Some(4));
        assert_eq!(OpCode::Add.operand_width(), Some(0));
        assert_eq!(OpCode::Jump.operand_width(), None);
    }

    #[test]
    fn mnemonic_lookup() {
        assert_eq!(OpCode::from_mnemonic("add"), Some(OpCode::Add));
        assert_eq!(OpCode::from_mnemonic("OP_CONSTANT_LONG"), Some(OpCode::ConstantLong));
        assert_eq!(OpCode::from_mnemonic("jump_if_false"), Some(OpCode::JumpIfFalse));
        assert_eq!(OpCode::from_mnemonic("frobnicate"), None);
    }
}
