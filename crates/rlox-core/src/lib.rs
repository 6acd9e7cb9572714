//! rlox-core — format de bytecode partagé par le front end, le désassembleur et la VM
//!
//! Fournit :
//! - `Value` : valeur runtime (nombre f64 pour l'instant)
//! - `OpCode` : jeu d'instructions complet (sous-ensemble exécutable marqué)
//! - `LineTable` / `LineRun` : table de lignes compressée (RLE, runs ≤ 255)
//! - `Chunk` / `ConstantPool` : buffer d'instructions + constantes + lignes
//! - `disasm` : désassemblage textuel déterministe
//! - `Compiler` : point de raccordement d'un front end externe, `asm` pour les tests
//! - Erreurs `ChunkError`, `CompileError` + alias `CoreResult<T>`
//!
//! Features :
//! - `trace` (par défaut) : journalisation via la façade `log`
//! - `serde` : derive (dé)sérialisation sur `Value`, `OpCode`, `LineRun`

#![deny(missing_docs)]
#![forbid(unsafe_code)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Assembleur textuel minimal (implémente `Compiler`).
pub mod asm;
/// Politique de croissance des buffers (doublement, minimum 8).
pub mod buffer;
/// Chunk de bytecode et pool de constantes.
pub mod chunk;
/// Point de raccordement du front end.
pub mod compiler;
/// Désassembleur textuel.
pub mod disasm;
/// Erreurs du cœur.
pub mod error;
/// Table de lignes RLE.
pub mod lines;
/// Jeu d'instructions.
pub mod opcode;
/// Valeurs runtime.
pub mod value;

pub use chunk::{Chunk, ConstantPool};
pub use compiler::Compiler;
pub use error::{ChunkError, CompileError, CoreResult};
pub use lines::{LineRun, LineTable};
pub use opcode::OpCode;
pub use value::Value;

/* ─────────────────────────── Prélude ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        asm::{assemble, Assembler},
        disasm::{disassemble_chunk, disassemble_instruction},
        Chunk, ChunkError, CompileError, Compiler, ConstantPool, CoreResult, LineRun, LineTable,
        OpCode, Value,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn hand_built_demo_chunk() {
        let mut chunk = Chunk::new();
        let constant = chunk.add_constant(Value::from(1.2));
        chunk.write_op(OpCode::Constant, 123);
        chunk.write(u8::try_from(constant).unwrap(), 123);
        for i in 0..10 {
            chunk.write_constant(Value::from(2.3 + f64::from(i)), 124);
        }
        chunk.write_op(OpCode::Return, 123);

        assert_eq!(chunk.len(), 2 + 10 * 2 + 1);
        assert_eq!(chunk.constants().len(), 11);
        chunk.validate().unwrap();

        let text = disassemble_chunk(&chunk, "test chunk");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 12);
        assert_eq!(lines[1], "0000 0123 OP_CONSTANT         0 '1.2'");
        assert_eq!(lines[2], "0002 0124 OP_CONSTANT         1 '2.3'");
        assert_eq!(lines[3], "0004    | OP_CONSTANT         2 '3.3'");
        assert_eq!(lines[12], "0022 0123 OP_RETURN");
    }
}
