//! rlox-vm — machine à pile qui exécute les chunks de `rlox-core`
//!
//! Fournit :
//! - `Vm` : boucle fetch/decode/dispatch, pile bornée, trace optionnelle
//! - `VmConfig` : limites (taille de pile) et trace
//! - Erreurs `Fault`, `RuntimeError`, `InterpretError` + alias `VmResult<T>`
//! - `trace` : format des enregistrements de trace et writer de capture
//!
//! Features :
//! - `trace` (par défaut) : journalisation via la façade `log`
//! - `serde` : derive (dé)sérialisation sur `VmConfig`

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Configuration de la VM.
pub mod config;
/// Fautes d'exécution.
pub mod error;
/// Pile d'opérandes bornée.
pub mod stack;
/// Sortie de trace.
pub mod trace;
/// Moteur d'exécution.
pub mod vm;

pub use config::{VmConfig, STACK_MAX};
pub use error::{Fault, InterpretError, RuntimeError, VmResult};
pub use stack::Stack;
pub use vm::Vm;

/* ─────────────────────────── Prélude ─────────────────────────── */

/// Prélude : VM + types du cœur les plus utilisés.
pub mod prelude {
    pub use super::{
        trace::Captured, Fault, InterpretError, RuntimeError, Vm, VmConfig, VmResult,
    };
    pub use rlox_core::prelude::*;
}
