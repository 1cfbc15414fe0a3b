//! Text and JSON rendering of decoded ELF structures.

use std::fmt::Write as _;

use elfparser::section::section_type_name;
use elfparser::symbol::{SHN_ABS, SHN_COMMON, SHN_UNDEF, bind_name, type_name, visibility_name};
use elfparser::{FileHeader, SectionEntry, SectionFlags, SectionTable, StringTable, SymbolEntry};
use serde::Serialize;

use crate::config::{Format, Radix, Settings};

/// Serializable view of the file header.
#[derive(Debug, Serialize)]
pub struct HeaderView {
    class: String,
    data: String,
    version: u8,
    os_abi: String,
    abi_version: u8,
    file_type: String,
    machine: u16,
    entry: u64,
    phoff: u64,
    shoff: u64,
    flags: u32,
    ehsize: u16,
    phentsize: u16,
    phnum: u16,
    shentsize: u16,
    shnum: u16,
    shstrndx: u16,
}

impl HeaderView {
    fn new(h: &FileHeader) -> Self {
        Self {
            class: h.class().map_or_else(|_| format!("unknown ({})", h.ident.class), |c| c.to_string()),
            data: h.encoding().map_or_else(|_| format!("unknown ({})", h.ident.data), |e| e.to_string()),
            version: h.ident.version,
            os_abi: h.ident.os_abi().name().to_string(),
            abi_version: h.ident.abi_version,
            file_type: h.elf_type().name().to_string(),
            machine: h.e_machine,
            entry: h.e_entry,
            phoff: h.e_phoff,
            shoff: h.e_shoff,
            flags: h.e_flags,
            ehsize: h.e_ehsize,
            phentsize: h.e_phentsize,
            phnum: h.e_phnum,
            shentsize: h.e_shentsize,
            shnum: h.e_shnum,
            shstrndx: h.e_shstrndx,
        }
    }
}

/// Serializable view of one section header entry.
#[derive(Debug, Serialize)]
pub struct SectionView {
    index: usize,
    name: String,
    #[serde(rename = "type")]
    sh_type: String,
    flags: String,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    addralign: u64,
    entsize: u64,
}

impl SectionView {
    fn new(index: usize, s: &SectionEntry) -> Self {
        Self {
            index,
            name: s.name().unwrap_or_default().to_string(),
            sh_type: section_type_name(s.sh_type).to_string(),
            flags: flag_letters(s.flags()),
            addr: s.sh_addr,
            offset: s.sh_offset,
            size: s.sh_size,
            link: s.sh_link,
            info: s.sh_info,
            addralign: s.sh_addralign,
            entsize: s.sh_entsize,
        }
    }
}

/// Serializable view of one symbol.
#[derive(Debug, Serialize)]
pub struct SymbolView {
    index: usize,
    name: String,
    value: u64,
    size: u64,
    #[serde(rename = "type")]
    sym_type: String,
    bind: String,
    visibility: String,
    section: String,
}

impl SymbolView {
    fn new(index: usize, s: &SymbolEntry, demangle: bool) -> Self {
        Self {
            index,
            name: symbol_name(s.name().unwrap_or_default(), demangle),
            value: s.value,
            size: s.size,
            sym_type: type_name(s.sym_type).to_string(),
            bind: bind_name(s.bind).to_string(),
            visibility: visibility_name(s.visibility()).to_string(),
            section: section_index(s.shndx),
        }
    }
}

/// Everything `elfdump all` prints.
#[derive(Debug, Serialize)]
pub struct Dump {
    header: HeaderView,
    sections: Vec<SectionView>,
    symbols: Vec<SymbolView>,
}

/// Returns the name as stored, or demangled in the `{:#}` form (no hash).
pub fn symbol_name(raw: &str, demangle: bool) -> String {
    if demangle {
        format!("{:#}", rustc_demangle::demangle(raw))
    } else {
        raw.to_string()
    }
}

fn section_index(shndx: u16) -> String {
    match shndx {
        SHN_UNDEF => "UND".to_string(),
        SHN_ABS => "ABS".to_string(),
        SHN_COMMON => "COM".to_string(),
        n => n.to_string(),
    }
}

/// readelf-style flag letters.
fn flag_letters(flags: SectionFlags) -> String {
    const LETTERS: [(SectionFlags, char); 10] = [
        (SectionFlags::WRITE, 'W'),
        (SectionFlags::ALLOC, 'A'),
        (SectionFlags::EXECINSTR, 'X'),
        (SectionFlags::MERGE, 'M'),
        (SectionFlags::STRINGS, 'S'),
        (SectionFlags::INFO_LINK, 'I'),
        (SectionFlags::LINK_ORDER, 'L'),
        (SectionFlags::OS_NONCONFORMING, 'O'),
        (SectionFlags::GROUP, 'G'),
        (SectionFlags::TLS, 'T'),
    ];
    LETTERS
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|&(_, letter)| letter)
        .collect()
}

fn machine_name(machine: u16) -> &'static str {
    match machine {
        0 => "None",
        3 => "Intel 80386",
        8 => "MIPS",
        20 => "PowerPC",
        21 => "PowerPC64",
        40 => "ARM",
        62 => "AMD x86-64",
        183 => "AArch64",
        243 => "RISC-V",
        _ => "unknown",
    }
}

fn num(value: u64, radix: Radix) -> String {
    match radix {
        Radix::Hex => format!("{value:#x}"),
        Radix::Dec => value.to_string(),
    }
}

/// Lays out rows under a header line and a dashed rule.
///
/// Columns flagged in `right` are right-aligned.
fn table(headers: &[&str], right: &[bool], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: &[String]| {
        let mut text = String::from(" ");
        for ((cell, &w), &r) in cells.iter().zip(&widths).zip(right) {
            if r {
                let _ = write!(text, " {cell:>w$}");
            } else {
                let _ = write!(text, " {cell:<w$}");
            }
        }
        out.push_str(text.trim_end());
        out.push('\n');
    };

    let head: Vec<String> = headers.iter().map(ToString::to_string).collect();
    line(&mut out, &head);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    line(&mut out, &rule);
    for row in rows {
        line(&mut out, row);
    }
    out
}

fn header_text(h: &FileHeader, settings: &Settings) -> String {
    let v = HeaderView::new(h);
    let r = settings.radix;
    let magic: Vec<String> = h.ident.magic.iter().map(|b| format!("{b:02x}")).collect();
    let fields = [
        ("Magic", magic.join(" ")),
        ("Class", v.class),
        ("Data", v.data),
        ("Version", v.version.to_string()),
        ("OS/ABI", v.os_abi),
        ("ABI Version", v.abi_version.to_string()),
        ("Type", v.file_type),
        ("Machine", format!("{} ({})", machine_name(v.machine), v.machine)),
        ("Entry point", num(v.entry, r)),
        ("Program headers offset", num(v.phoff, r)),
        ("Section headers offset", num(v.shoff, r)),
        ("Flags", format!("{:#x}", v.flags)),
        ("Header size", v.ehsize.to_string()),
        ("Program header size", v.phentsize.to_string()),
        ("Program header count", v.phnum.to_string()),
        ("Section header size", v.shentsize.to_string()),
        ("Section header count", v.shnum.to_string()),
        ("Section name table index", v.shstrndx.to_string()),
    ];

    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    let mut out = String::from("ELF header:\n");
    for (key, value) in fields {
        let _ = writeln!(out, "  {:<width$} {value}", format!("{key}:"));
    }
    if !h.ehsize_matches_class() {
        let _ = writeln!(out, "  warning: header size does not match class");
    }
    out
}

fn sections_text(sections: &SectionTable, settings: &Settings) -> String {
    if sections.is_empty() {
        return "There are no sections in this file.\n".to_string();
    }
    let r = settings.radix;
    let rows: Vec<Vec<String>> = sections
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let v = SectionView::new(i, s);
            vec![
                format!("[{i}]"),
                v.name,
                v.sh_type,
                v.flags,
                num(v.addr, r),
                num(v.offset, r),
                num(v.size, r),
                num(v.entsize, r),
                v.link.to_string(),
                v.info.to_string(),
                v.addralign.to_string(),
            ]
        })
        .collect();
    let mut out = format!("Section headers ({}):\n", sections.len());
    out.push_str(&table(
        &["Nr", "Name", "Type", "Flg", "Address", "Offset", "Size", "EntSize", "Lk", "Inf", "Al"],
        &[true, false, false, false, true, true, true, true, true, true, true],
        &rows,
    ));
    out
}

fn symbols_text(symbols: &[SymbolEntry], settings: &Settings) -> String {
    let count = symbols.len();
    if count == 0 {
        return "There is no symbol table in this file.\n".to_string();
    }
    let r = settings.radix;
    let rows: Vec<Vec<String>> = symbols
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let v = SymbolView::new(i, s, settings.demangle);
            vec![
                i.to_string(),
                num(v.value, r),
                num(v.size, r),
                v.sym_type,
                v.bind,
                v.visibility,
                v.section,
                v.name,
            ]
        })
        .collect();
    let mut out = format!("Symbol table .symtab ({count} entries):\n");
    out.push_str(&table(
        &["Num", "Value", "Size", "Type", "Bind", "Vis", "Ndx", "Name"],
        &[true, true, true, false, false, false, true, false],
        &rows,
    ));
    out
}

fn json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Renders the file header.
pub fn header(h: &FileHeader, settings: &Settings) -> anyhow::Result<String> {
    match settings.format {
        Format::Table => Ok(header_text(h, settings)),
        Format::Json => json(&HeaderView::new(h)),
    }
}

/// Renders the section header table.
pub fn sections(sections: &SectionTable, settings: &Settings) -> anyhow::Result<String> {
    match settings.format {
        Format::Table => Ok(sections_text(sections, settings)),
        Format::Json => json(&section_views(sections)),
    }
}

/// Renders the symbol table; an absent table renders as empty.
pub fn symbols(symbols: &[SymbolEntry], settings: &Settings) -> anyhow::Result<String> {
    match settings.format {
        Format::Table => Ok(symbols_text(symbols, settings)),
        Format::Json => json(&symbol_views(symbols, settings.demangle)),
    }
}

/// Renders a standalone string table, one string per line.
pub fn strings(section: &str, table: &StringTable, settings: &Settings) -> anyhow::Result<String> {
    match settings.format {
        Format::Table => {
            let rows: Vec<Vec<String>> = table
                .iter()
                .enumerate()
                .map(|(i, s)| vec![i.to_string(), s.to_string()])
                .collect();
            let mut out = format!("String table {section} ({} strings):\n", table.len());
            out.push_str(&table_or_empty(&rows));
            Ok(out)
        }
        Format::Json => json(&table.iter().collect::<Vec<_>>()),
    }
}

fn table_or_empty(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        String::new()
    } else {
        table(&["Idx", "String"], &[true, false], rows)
    }
}

/// Renders header, sections and symbols together.
pub fn all(
    h: &FileHeader,
    sections_table: &SectionTable,
    symbol_entries: &[SymbolEntry],
    settings: &Settings,
) -> anyhow::Result<String> {
    match settings.format {
        Format::Table => {
            let mut out = header_text(h, settings);
            out.push('\n');
            out.push_str(&sections_text(sections_table, settings));
            out.push('\n');
            out.push_str(&symbols_text(symbol_entries, settings));
            Ok(out)
        }
        Format::Json => json(&Dump {
            header: HeaderView::new(h),
            sections: section_views(sections_table),
            symbols: symbol_views(symbol_entries, settings.demangle),
        }),
    }
}

fn section_views(sections: &SectionTable) -> Vec<SectionView> {
    sections
        .iter()
        .enumerate()
        .map(|(i, s)| SectionView::new(i, s))
        .collect()
}

fn symbol_views(symbols: &[SymbolEntry], demangle: bool) -> Vec<SymbolView> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, s)| SymbolView::new(i, s, demangle))
        .collect()
}
