//! `rlox` — CLI de la VM rlox
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `rlox_cli` (lib).

#![forbid(unsafe_code)]

use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rlox_vm::{VmConfig, STACK_MAX};

use rlox_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "rlox", version, about = "rlox : désassembler, tracer et exécuter des chunks de bytecode", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Réglages de la VM communs à `demo` et `run`.
#[derive(Debug, clap::Args)]
struct VmArgs {
    /// Afficher la pile et l'instruction avant chaque dispatch (stderr)
    #[arg(long)]
    trace: bool,
    /// Capacité de la pile d'opérandes
    #[arg(long = "stack-max", default_value_t = STACK_MAX)]
    stack_max: usize,
}

impl VmArgs {
    fn config(&self) -> VmConfig {
        VmConfig::new().with_stack_max(self.stack_max).with_trace(self.trace)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Construire le chunk de démonstration, le désassembler puis l'exécuter
    Demo {
        #[command(flatten)]
        vm: VmArgs,
    },

    /// Assembler une source puis l'exécuter
    Run {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
        /// Désassembler avant d'exécuter
        #[arg(long)]
        listing: bool,
        #[command(flatten)]
        vm: VmArgs,
    },

    /// Assembler une source et imprimer son désassemblage
    Disasm {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
        /// Vérifier la structure du chunk (opcodes, opérandes, constantes)
        #[arg(long)]
        validate: bool,
    },
}

// ──────────────────────────── Entrée ────────────────────────────

fn input_from_opt(p: Option<PathBuf>) -> cli::Input {
    match p {
        Some(path) if path.as_os_str() == "-" => cli::Input::Stdin,
        Some(path) => cli::Input::Path(path),
        None => cli::Input::Stdin,
    }
}

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        if std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", level);
        }
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    let _ = (verbose, quiet);
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte le TTY ; on force via NO_COLOR / CLICOLOR_FORCE.
    match choice {
        ColorChoice::Auto => {},
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        },
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        },
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        },
    }
}

fn real_main() -> Result<i32> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    let command = match opt.cmd {
        Command::Demo { vm } => cli::Command::Demo(cli::DemoTask { vm: vm.config() }),
        Command::Run { input, listing, vm } => cli::Command::Run(cli::RunTask {
            input: input_from_opt(input),
            vm: vm.config(),
            listing,
        }),
        Command::Disasm { input, validate } => {
            cli::Command::Disasm(cli::DisasmTask { input: input_from_opt(input), validate })
        },
    };

    let stdout = io::stdout();
    cli::execute(command, &mut stdout.lock()).context("échec d'exécution de la commande")
}
