//! rlox-cli — bibliothèque interne du binaire `rlox`
//!
//! Le parsing d'arguments reste dans `main.rs` ; ici :
//! - les tâches (`Demo`, `Run`, `Disasm`) et leur exécution
//! - le chunk de démonstration construit à la main
//! - la lecture des sources (fichier ou stdin)
//! - les codes de sortie (65 : erreur de compilation, 70 : faute d'exécution)
//! - traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
#[cfg(feature = "color")]
use owo_colors::OwoColorize;
use rlox_core::{asm::Assembler, disasm, Chunk, OpCode, Value};
use rlox_vm::{InterpretError, Vm, VmConfig};

// ───────────────────────────── Codes de sortie ─────────────────────────────

/// Succès.
pub const EXIT_OK: i32 = 0;
/// La source n'a pas pu être assemblée.
pub const EXIT_COMPILE_ERROR: i32 = 65;
/// La VM a levé une faute.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

// ───────────────────────────── Types publics ─────────────────────────────

/// Commande haut-niveau (sans parsing CLI, réservé à main.rs).
#[derive(Clone, Debug)]
pub enum Command {
    /// Construit le chunk de démonstration, le désassemble puis l'exécute.
    Demo(DemoTask),
    /// Assemble une source puis l'exécute.
    Run(RunTask),
    /// Assemble une source et imprime son désassemblage.
    Disasm(DisasmTask),
}

/// Options de `demo`.
#[derive(Clone, Debug, Default)]
pub struct DemoTask {
    pub vm: VmConfig,
}

/// Options de `run`.
#[derive(Clone, Debug, Default)]
pub struct RunTask {
    pub input: Input,
    pub vm: VmConfig,
    pub listing: bool, // désassembler avant d'exécuter
}

/// Options de `disasm`.
#[derive(Clone, Debug, Default)]
pub struct DisasmTask {
    pub input: Input,
    pub validate: bool, // vérifier la structure du chunk avant impression
}

/// Entrée texte : fichier ou `-` (=stdin).
#[derive(Clone, Debug, Default)]
pub enum Input {
    Path(PathBuf),
    #[default]
    Stdin,
}

impl Input {
    fn name(&self) -> String {
        match self {
            Input::Path(p) => p.to_string_lossy().into_owned(),
            Input::Stdin => "<stdin>".to_owned(),
        }
    }
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .format_timestamp_secs()
            .try_init();
    }
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande ; les résultats vont dans `out`, les diagnostics sur stderr.
/// Retourne un code de sortie.
pub fn execute(cmd: Command, out: &mut dyn Write) -> Result<i32> {
    match cmd {
        Command::Demo(t) => {
            let chunk = demo_chunk();
            write!(out, "{}", disasm::disassemble_chunk(&chunk, "test chunk"))?;
            Ok(run_chunk(&chunk, t.vm, out)?)
        },
        Command::Run(t) => run_entry(t, out),
        Command::Disasm(t) => disasm_entry(t, out),
    }
}

/// Chunk de démonstration : `1.2` en forme courte (ligne 123), dix constantes
/// `2.3 + i` via `write_constant` (ligne 124), puis `OP_RETURN` (ligne 123).
pub fn demo_chunk() -> Chunk {
    let mut chunk = Chunk::new();
    let constant = chunk.add_constant(Value::from(1.2));
    chunk.write_op(OpCode::Constant, 123);
    chunk.write(u8::try_from(constant).unwrap_or_default(), 123);
    for i in 0..10 {
        chunk.write_constant(Value::from(2.3 + f64::from(i)), 124);
    }
    chunk.write_op(OpCode::Return, 123);
    chunk
}

fn run_entry(task: RunTask, out: &mut dyn Write) -> Result<i32> {
    let source = read_source(&task.input)?;
    let name = task.input.name();

    #[cfg(feature = "trace")]
    log::info!("run: {name} ({} bytes)", source.len());

    let chunk = match rlox_core::Compiler::compile(&Assembler, &source) {
        Ok(chunk) => chunk,
        Err(e) => {
            status_err("compile", &format!("{name}: {e}"));
            return Ok(EXIT_COMPILE_ERROR);
        },
    };
    if task.listing {
        write!(out, "{}", disasm::disassemble_chunk(&chunk, &name))?;
    }
    Ok(run_chunk(&chunk, task.vm, out)?)
}

fn run_chunk(chunk: &Chunk, config: VmConfig, out: &mut dyn Write) -> io::Result<i32> {
    let mut vm = Vm::with_config(config);
    match vm.run(chunk) {
        Ok(value) => {
            writeln!(out, "{value}")?;
            Ok(EXIT_OK)
        },
        Err(e) => {
            status_err("runtime", &InterpretError::from(e).to_string());
            Ok(EXIT_RUNTIME_ERROR)
        },
    }
}

fn disasm_entry(task: DisasmTask, out: &mut dyn Write) -> Result<i32> {
    let source = read_source(&task.input)?;
    let name = task.input.name();
    let chunk = match rlox_core::asm::assemble(&source) {
        Ok(chunk) => chunk,
        Err(e) => {
            status_err("compile", &format!("{name}: {e}"));
            return Ok(EXIT_COMPILE_ERROR);
        },
    };
    if task.validate {
        match chunk.validate() {
            Ok(()) => status_ok("valid", &format!("{name}: {} bytes", chunk.len())),
            Err(e) => status_warn("invalid", &format!("{name}: {e}")),
        }
    }
    write!(out, "{}", disasm::disassemble_chunk(&chunk, &name))?;
    Ok(EXIT_OK)
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

fn read_source(input: &Input) -> Result<String> {
    match input {
        Input::Stdin => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s).context("lecture de stdin")?;
            Ok(s)
        },
        Input::Path(p) => {
            fs::read_to_string(p).with_context(|| format!("ouverture: {}", p.display()))
        },
    }
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

fn status_ok(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.green().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

fn status_warn(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.yellow().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

fn status_err(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.red().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

// ───────────────────────────── Tests ─────────────────────────────
