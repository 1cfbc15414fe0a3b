//! elfdump: prints the header, sections and symbols of an ELF file.
//!
//! Pipeline: read file → decode header → decode section table and names →
//!           decode `.symtab` and names → render as a table or JSON.
//!
//! The first decode error is reported with the stage it came from and the
//! process exits non-zero.

mod cli;
mod config;
mod render;
mod verbose;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use elfparser::{ElfImage, FileHeader, StringTable, SymbolEntry, section_data};

use config::Settings;
use verbose::{Timer, dprintln, vprintln};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let file_config = config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.format, cli.radix, cli.demangle_flag(), &file_config);
    vprintln!("settings: {settings:?}");

    match cli.command {
        cli::Command::Header(ref args) => cmd_header(&args.file, &settings),
        cli::Command::Sections(ref args) => cmd_sections(&args.file, &settings),
        cli::Command::Symbols(ref args) => cmd_symbols(&args.file, &settings),
        cli::Command::Strings(ref args) => cmd_strings(&args.file, &args.section, &settings),
        cli::Command::All(ref args) => cmd_all(&args.file, &settings),
    }
}

// ===========================================================================
// Decoding
// ===========================================================================

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let _t = Timer::start("read");
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    vprintln!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Runs the whole decode pipeline over `data`.
fn decode(path: &Path, data: &[u8]) -> Result<ElfImage> {
    let _t = Timer::start("decode");
    let image = ElfImage::parse(data).map_err(|e| {
        anyhow::Error::new(e).context(format!(
            "failed to decode {} (error code {})",
            path.display(),
            e.code()
        ))
    })?;

    let symbols = image.symbols().map_or(0, elfparser::SymbolTable::len);
    vprintln!("{} sections, {symbols} symbols", image.sections().len());
    dprintln!(
        "{}: {} {}",
        path.display(),
        image.header().class().map_or("?".to_string(), |c| c.to_string()),
        image.header().elf_type().name(),
    );
    Ok(image)
}

fn symbol_slice(image: &ElfImage) -> &[SymbolEntry] {
    image
        .symbols()
        .map(|s| s.iter().as_slice())
        .unwrap_or_default()
}

fn emit(text: &str) {
    print!("{text}");
}

// ===========================================================================
// Commands
// ===========================================================================

/// Decodes only the file header, so it also works on files whose section
/// table is damaged.
fn cmd_header(path: &Path, settings: &Settings) -> Result<()> {
    let data = read_file(path)?;
    let header = {
        let _t = Timer::start("decode header");
        FileHeader::from_bytes(&data)
            .with_context(|| format!("failed to decode header of {}", path.display()))?
    };
    emit(&render::header(&header, settings)?);
    Ok(())
}

fn cmd_sections(path: &Path, settings: &Settings) -> Result<()> {
    let data = read_file(path)?;
    let image = decode(path, &data)?;
    emit(&render::sections(image.sections(), settings)?);
    Ok(())
}

fn cmd_symbols(path: &Path, settings: &Settings) -> Result<()> {
    let data = read_file(path)?;
    let image = decode(path, &data)?;
    emit(&render::symbols(symbol_slice(&image), settings)?);
    Ok(())
}

fn cmd_strings(path: &Path, section: &str, settings: &Settings) -> Result<()> {
    let data = read_file(path)?;
    let image = decode(path, &data)?;
    let entry = image
        .section_by_name(section)
        .with_context(|| format!("no section named {section} in {}", path.display()))?;
    let bytes = section_data(&data, entry)
        .with_context(|| format!("section {section} lies outside the file"))?;
    let table = {
        let _t = Timer::start("split strings");
        StringTable::parse(bytes).with_context(|| format!("failed to split {section}"))?
    };
    vprintln!("{} strings in {section}", table.len());
    emit(&render::strings(section, &table, settings)?);
    Ok(())
}

fn cmd_all(path: &Path, settings: &Settings) -> Result<()> {
    let data = read_file(path)?;
    let image = decode(path, &data)?;
    emit(&render::all(
        image.header(),
        image.sections(),
        symbol_slice(&image),
        settings,
    )?);
    Ok(())
}
