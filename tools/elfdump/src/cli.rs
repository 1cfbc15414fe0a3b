//! Command-line interface definitions for elfdump.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Format, Radix};

/// Print the structure of an ELF file.
#[derive(Parser)]
#[command(name = "elfdump", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Config file to read instead of `./elfdump.toml`.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, short = 'f', global = true, value_enum)]
    pub format: Option<Format>,

    /// Radix for addresses, offsets and sizes in table output.
    #[arg(long, global = true, value_enum)]
    pub radix: Option<Radix>,

    /// Demangle Rust symbol names.
    #[arg(long, short = 'C', global = true, conflicts_with = "no_demangle")]
    pub demangle: bool,

    /// Print symbol names as stored, even if the config enables demangling.
    #[arg(long, global = true)]
    pub no_demangle: bool,

    /// Print errors only.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print config source and per-stage timings to stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl Cli {
    /// The demangle setting requested on the command line, if any.
    pub fn demangle_flag(&self) -> Option<bool> {
        if self.demangle {
            Some(true)
        } else if self.no_demangle {
            Some(false)
        } else {
            None
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the file header.
    Header(FileArgs),
    /// Print the section header table.
    Sections(FileArgs),
    /// Print the `.symtab` symbol table.
    Symbols(FileArgs),
    /// Print every string in a string table section.
    Strings(StringsArgs),
    /// Print header, sections and symbols.
    All(FileArgs),
}

/// Arguments for subcommands that take only a file.
#[derive(Parser)]
pub struct FileArgs {
    /// ELF file to read.
    pub file: PathBuf,
}

/// Arguments for the `strings` subcommand.
#[derive(Parser)]
pub struct StringsArgs {
    /// ELF file to read.
    pub file: PathBuf,

    /// Section to split, e.g. `.strtab` or `.shstrtab`.
    pub section: String,
}
