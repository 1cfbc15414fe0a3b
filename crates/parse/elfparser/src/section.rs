//! Section header table decoding and section name resolution.
//!
//! A [`SectionTable`] goes through three steps: [`setup`](SectionTable::setup)
//! sizes it from the file header, [`parse`](SectionTable::parse) decodes the
//! fixed-size entries, and [`resolve_names`](SectionTable::resolve_names)
//! attaches owned names from the section header string table.

use alloc::string::String;
use alloc::vec::Vec;

use bitflags::bitflags;

use crate::bytes;
use crate::error::ElfError;
use crate::header::{DataEncoding, ElfClass, FileHeader};
use crate::layout::{self, SectionField};
use crate::strings;

/// Section type: inactive entry.
pub const SHT_NULL: u32 = 0;

/// Section type: program-defined contents.
pub const SHT_PROGBITS: u32 = 1;

/// Section type: symbol table.
pub const SHT_SYMTAB: u32 = 2;

/// Section type: string table.
pub const SHT_STRTAB: u32 = 3;

/// Section type: relocation entries with addends.
pub const SHT_RELA: u32 = 4;

/// Section type: symbol hash table.
pub const SHT_HASH: u32 = 5;

/// Section type: dynamic linking information.
pub const SHT_DYNAMIC: u32 = 6;

/// Section type: notes.
pub const SHT_NOTE: u32 = 7;

/// Section type: occupies no file space (`.bss`).
pub const SHT_NOBITS: u32 = 8;

/// Section type: relocation entries without addends.
pub const SHT_REL: u32 = 9;

/// Section type: reserved.
pub const SHT_SHLIB: u32 = 10;

/// Section type: dynamic symbol table.
pub const SHT_DYNSYM: u32 = 11;

bitflags! {
    /// Section attribute flags (`sh_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        /// Writable data.
        const WRITE = 0x1;
        /// Occupies memory during execution.
        const ALLOC = 0x2;
        /// Executable machine instructions.
        const EXECINSTR = 0x4;
        /// Might be merged.
        const MERGE = 0x10;
        /// Contains NUL-terminated strings.
        const STRINGS = 0x20;
        /// `sh_info` holds a section header table index.
        const INFO_LINK = 0x40;
        /// Preserve order after combining.
        const LINK_ORDER = 0x80;
        /// Non-standard OS-specific handling required.
        const OS_NONCONFORMING = 0x100;
        /// Member of a section group.
        const GROUP = 0x200;
        /// Holds thread-local data.
        const TLS = 0x400;
        /// OS-specific bits.
        const MASKOS = 0x0ff0_0000;
        /// Processor-specific bits.
        const MASKPROC = 0xf000_0000;
    }
}

/// Returns the conventional name of a section type.
#[must_use]
pub fn section_type_name(sh_type: u32) -> &'static str {
    match sh_type {
        SHT_NULL => "NULL",
        SHT_PROGBITS => "PROGBITS",
        SHT_SYMTAB => "SYMTAB",
        SHT_STRTAB => "STRTAB",
        SHT_RELA => "RELA",
        SHT_HASH => "HASH",
        SHT_DYNAMIC => "DYNAMIC",
        SHT_NOTE => "NOTE",
        SHT_NOBITS => "NOBITS",
        SHT_REL => "REL",
        SHT_SHLIB => "SHLIB",
        SHT_DYNSYM => "DYNSYM",
        _ => "UNKNOWN",
    }
}

/// One decoded section header entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionEntry {
    /// Offset of this section's name in the section header string table.
    pub name_index: u32,
    /// Section type (`SHT_*`).
    pub sh_type: u32,
    /// Raw section flags.
    pub sh_flags: u64,
    /// Virtual address in memory (0 for non-loaded sections).
    pub sh_addr: u64,
    /// File offset of the section data.
    pub sh_offset: u64,
    /// Size of the section data in bytes.
    pub sh_size: u64,
    /// Associated section index.
    pub sh_link: u32,
    /// Extra info; meaning depends on the section type.
    pub sh_info: u32,
    /// Required alignment.
    pub sh_addralign: u64,
    /// Size of each entry, for sections with fixed-size entries.
    pub sh_entsize: u64,
    /// Resolved name; `None` until names are resolved.
    pub name: Option<String>,
}

impl SectionEntry {
    /// Returns the resolved name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the flags as a typed set, keeping unknown bits.
    #[must_use]
    pub fn flags(&self) -> SectionFlags {
        SectionFlags::from_bits_retain(self.sh_flags)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "value was read with the field's own width"
    )]
    fn assign(&mut self, field: SectionField, value: u64) {
        match field {
            SectionField::Name => self.name_index = value as u32,
            SectionField::Type => self.sh_type = value as u32,
            SectionField::Flags => self.sh_flags = value,
            SectionField::Addr => self.sh_addr = value,
            SectionField::Offset => self.sh_offset = value,
            SectionField::Size => self.sh_size = value,
            SectionField::Link => self.sh_link = value as u32,
            SectionField::Info => self.sh_info = value as u32,
            SectionField::AddrAlign => self.sh_addralign = value,
            SectionField::EntSize => self.sh_entsize = value,
        }
    }
}

/// The decoded section header table.
///
/// The table owns its entries and every resolved name. After
/// [`release`](Self::release) it holds nothing, and every operation other
/// than metadata accessors reports [`ElfError::NullInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTable {
    class: u8,
    data: u8,
    entry_size: u16,
    table_len: usize,
    name_table_index: u16,
    max_idx: u32,
    entries: Option<Vec<SectionEntry>>,
}

impl SectionTable {
    /// Sizes an empty table from the header's section table metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::AllocationFailure`] if `e_shnum` entries cannot be
    /// allocated.
    pub fn setup(header: &FileHeader) -> Result<Self, ElfError> {
        let table_len = usize::from(header.e_shnum);
        let mut entries = Vec::new();
        entries.try_reserve_exact(table_len)?;
        entries.resize_with(table_len, SectionEntry::default);

        Ok(Self {
            class: header.ident.class,
            data: header.ident.data,
            entry_size: header.e_shentsize,
            table_len,
            name_table_index: header.e_shstrndx,
            max_idx: 0,
            entries: Some(entries),
        })
    }

    /// Decodes every entry from `data`, which starts at the first entry.
    ///
    /// A successful call replaces every entry, so calling this again rebuilds
    /// the table from scratch (resolved names are dropped). On failure the
    /// table keeps its previous entries.
    ///
    /// # Errors
    ///
    /// - [`ElfError::NullInput`] if the table has been released.
    /// - [`ElfError::InsufficientSize`] if the table is empty, `data` is
    ///   shorter than `entry_size * len`, or a field runs past `data`.
    /// - [`ElfError::InvalidClassOrEncoding`] for an unknown class or encoding.
    pub fn parse(&mut self, data: &[u8]) -> Result<(), ElfError> {
        let entries = self.entries.as_mut().ok_or(ElfError::NullInput)?;
        let entry_size = usize::from(self.entry_size);
        let total = entry_size
            .checked_mul(self.table_len)
            .ok_or(ElfError::InsufficientSize)?;
        if total == 0 || data.len() < total {
            return Err(ElfError::InsufficientSize);
        }
        let class = ElfClass::from_raw(self.class).ok_or(ElfError::InvalidClassOrEncoding)?;
        let encoding = DataEncoding::from_raw(self.data).ok_or(ElfError::InvalidClassOrEncoding)?;
        let fields = layout::section_fields(class);

        let mut decoded = Vec::new();
        decoded.try_reserve_exact(self.table_len)?;
        let mut max_idx = 0;
        for i in 0..self.table_len {
            let mut entry = SectionEntry::default();
            let base = i * entry_size;
            for spec in fields {
                let value = layout::read_field(data, base, spec, encoding)?;
                entry.assign(spec.field, value);
            }
            max_idx = max_idx.max(entry.name_index);
            decoded.push(entry);
        }

        *entries = decoded;
        self.max_idx = max_idx;
        Ok(())
    }

    /// Attaches a name to every entry from the string table `strtab`.
    ///
    /// The size check happens before any name is attached, so a failure
    /// for a too-small `strtab` leaves the entries untouched.
    ///
    /// # Errors
    ///
    /// - [`ElfError::NullInput`] if the table has been released.
    /// - [`ElfError::InsufficientSize`] if `strtab` does not reach the
    ///   largest name index seen during [`parse`](Self::parse).
    /// - [`ElfError::AllocationFailure`] if a name cannot be allocated.
    pub fn resolve_names(&mut self, strtab: &[u8]) -> Result<(), ElfError> {
        let entries = self.entries.as_mut().ok_or(ElfError::NullInput)?;
        resolve_into(
            entries.iter_mut().map(|e| (e.name_index, &mut e.name)),
            self.max_idx,
            strtab,
        )
    }

    /// Finds the first entry at or after `start` whose name equals `name`.
    ///
    /// Entries without a resolved name never match.
    ///
    /// # Errors
    ///
    /// - [`ElfError::NullInput`] if the table has been released.
    /// - [`ElfError::OutOfRange`] if `start` is not a valid index (which
    ///   includes every `start` for an empty table).
    /// - [`ElfError::NotFound`] if no entry matches.
    pub fn find_by_name(&self, name: &str, start: usize) -> Result<usize, ElfError> {
        let entries = self.entries.as_ref().ok_or(ElfError::NullInput)?;
        find_name(entries.iter().map(SectionEntry::name), name, start)
    }

    /// Drops every entry and name, leaving an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::NullInput`] if the table was already released;
    /// nothing is dropped twice.
    pub fn release(&mut self) -> Result<(), ElfError> {
        self.entries.take().map(drop).ok_or(ElfError::NullInput)?;
        self.table_len = 0;
        self.max_idx = 0;
        Ok(())
    }

    /// Returns `true` once [`release`](Self::release) has run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.entries.is_none()
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SectionEntry> {
        self.entries.as_ref()?.get(index)
    }

    /// Returns an iterator over the entries (empty once released).
    pub fn iter(&self) -> core::slice::Iter<'_, SectionEntry> {
        self.entries.as_deref().unwrap_or_default().iter()
    }

    /// Number of entries the table was sized for; 0 once released.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table_len
    }

    /// Returns `true` if the table was sized for no entries or released.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table_len == 0
    }

    /// Size of one on-disk entry, from `e_shentsize`.
    #[must_use]
    pub fn entry_size(&self) -> u16 {
        self.entry_size
    }

    /// Index of the section header string table, from `e_shstrndx`.
    #[must_use]
    pub fn name_table_index(&self) -> u16 {
        self.name_table_index
    }

    /// Largest name index seen by the last [`parse`](Self::parse).
    #[must_use]
    pub fn max_idx(&self) -> u32 {
        self.max_idx
    }
}

impl<'a> IntoIterator for &'a SectionTable {
    type Item = &'a SectionEntry;
    type IntoIter = core::slice::Iter<'a, SectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Resolves `(name_index, slot)` pairs against `strtab`.
///
/// Shared by the section and symbol tables.
pub(crate) fn resolve_into<'e>(
    slots: impl Iterator<Item = (u32, &'e mut Option<String>)>,
    max_idx: u32,
    strtab: &[u8],
) -> Result<(), ElfError> {
    let size = strtab.len();
    if size <= max_idx as usize {
        return Err(ElfError::InsufficientSize);
    }
    for (name_index, slot) in slots {
        let start = name_index as usize;
        if start >= size {
            return Err(ElfError::InsufficientSize);
        }
        let extracted = strings::extract_at(strtab, start, size)?;
        *slot = Some(extracted.text);
    }
    Ok(())
}

/// Linear name search shared by the section and symbol tables.
pub(crate) fn find_name<'n>(
    names: impl ExactSizeIterator<Item = Option<&'n str>>,
    name: &str,
    start: usize,
) -> Result<usize, ElfError> {
    if start >= names.len() {
        return Err(ElfError::OutOfRange);
    }
    for (i, candidate) in names.enumerate().skip(start) {
        let Some(candidate) = candidate else {
            continue;
        };
        if bytes::string_compare(Some(candidate.as_bytes()), Some(name.as_bytes()))? == 0 {
            return Ok(i);
        }
    }
    Err(ElfError::NotFound)
}
