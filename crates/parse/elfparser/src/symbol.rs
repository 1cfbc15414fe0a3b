//! Symbol table decoding and symbol name resolution.
//!
//! Mirrors [`SectionTable`]: [`SymbolTable::setup`] sizes the table from
//! the `.symtab` section entry, [`SymbolTable::parse`] decodes the entries
//! and splits `st_info`, and [`SymbolTable::resolve_names`] attaches names
//! from the `.strtab` section.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::ElfError;
use crate::header::{DataEncoding, ElfClass, FileHeader};
use crate::layout::{self, SymbolField};
use crate::section::{self, SectionTable};

/// Name of the section holding symbol names.
pub const STRTAB_SECTION_NAME: &str = ".strtab";

/// Symbol binding: local.
pub const STB_LOCAL: u8 = 0;

/// Symbol binding: global.
pub const STB_GLOBAL: u8 = 1;

/// Symbol binding: weak.
pub const STB_WEAK: u8 = 2;

/// Symbol type: unspecified.
pub const STT_NOTYPE: u8 = 0;

/// Symbol type: data object.
pub const STT_OBJECT: u8 = 1;

/// Symbol type: function.
pub const STT_FUNC: u8 = 2;

/// Symbol type: section.
pub const STT_SECTION: u8 = 3;

/// Symbol type: source file.
pub const STT_FILE: u8 = 4;

/// Symbol type: uninitialized common block.
pub const STT_COMMON: u8 = 5;

/// Symbol type: thread-local storage.
pub const STT_TLS: u8 = 6;

/// Symbol visibility: as given by the binding.
pub const STV_DEFAULT: u8 = 0;

/// Symbol visibility: processor-specific hidden.
pub const STV_INTERNAL: u8 = 1;

/// Symbol visibility: not visible outside the component.
pub const STV_HIDDEN: u8 = 2;

/// Symbol visibility: visible but not preemptible.
pub const STV_PROTECTED: u8 = 3;

/// Special section index: undefined.
pub const SHN_UNDEF: u16 = 0;

/// Special section index: absolute value.
pub const SHN_ABS: u16 = 0xfff1;

/// Special section index: common block.
pub const SHN_COMMON: u16 = 0xfff2;

/// One decoded symbol table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Offset of this symbol's name in `.strtab`.
    pub name_index: u32,
    /// Binding, the upper nibble of `st_info`.
    pub bind: u8,
    /// Type, the lower nibble of `st_info`.
    pub sym_type: u8,
    /// Raw `st_other`; the low two bits are the visibility.
    pub other: u8,
    /// Index of the section this symbol is defined in.
    pub shndx: u16,
    /// Symbol value (an address for defined symbols).
    pub value: u64,
    /// Symbol size in bytes.
    pub size: u64,
    /// Resolved name; `None` until names are resolved.
    pub name: Option<String>,
}

impl SymbolEntry {
    /// Returns the resolved name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the visibility (`STV_*`).
    #[must_use]
    pub fn visibility(&self) -> u8 {
        self.other & 0x3
    }

    /// Returns `true` if the symbol is defined in some section.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.shndx != SHN_UNDEF
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "value was read with the field's own width"
    )]
    fn assign(&mut self, field: SymbolField, value: u64) {
        match field {
            SymbolField::Name => self.name_index = value as u32,
            // Split into bind/type once the whole entry is decoded.
            SymbolField::Info => self.sym_type = value as u8,
            SymbolField::Other => self.other = value as u8,
            SymbolField::Shndx => self.shndx = value as u16,
            SymbolField::Value => self.value = value,
            SymbolField::Size => self.size = value,
        }
    }

    fn split_info(&mut self) {
        self.bind = self.sym_type >> 4;
        self.sym_type &= 0x0f;
    }
}

/// Returns the conventional name of a symbol binding.
#[must_use]
pub fn bind_name(bind: u8) -> &'static str {
    match bind {
        STB_LOCAL => "LOCAL",
        STB_GLOBAL => "GLOBAL",
        STB_WEAK => "WEAK",
        10..=12 => "OS",
        13..=15 => "PROC",
        _ => "UNKNOWN",
    }
}

/// Returns the conventional name of a symbol type.
#[must_use]
pub fn type_name(sym_type: u8) -> &'static str {
    match sym_type {
        STT_NOTYPE => "NOTYPE",
        STT_OBJECT => "OBJECT",
        STT_FUNC => "FUNC",
        STT_SECTION => "SECTION",
        STT_FILE => "FILE",
        STT_COMMON => "COMMON",
        STT_TLS => "TLS",
        10..=12 => "OS",
        13..=15 => "PROC",
        _ => "UNKNOWN",
    }
}

/// Returns the conventional name of a symbol visibility.
#[must_use]
pub fn visibility_name(visibility: u8) -> &'static str {
    match visibility & 0x3 {
        STV_DEFAULT => "DEFAULT",
        STV_INTERNAL => "INTERNAL",
        STV_HIDDEN => "HIDDEN",
        _ => "PROTECTED",
    }
}

/// The decoded symbol table.
///
/// Ownership and lifecycle match [`SectionTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    class: u8,
    data: u8,
    entry_size: usize,
    table_len: usize,
    string_table_index: usize,
    max_idx: u32,
    entries: Option<Vec<SymbolEntry>>,
}

impl SymbolTable {
    /// Sizes an empty table from the symbol table section at `symtab_index`.
    ///
    /// The entry count is `sh_size / sh_entsize` and is allocated up front,
    /// so `sh_size` must already be known to lie inside the file (see
    /// [`section_data`](crate::section_data)). The string table is located
    /// by searching `sections` for a section named `.strtab`.
    ///
    /// # Errors
    ///
    /// - [`ElfError::NullInput`] if `sections` has been released.
    /// - [`ElfError::OutOfRange`] if `symtab_index` is not a valid section
    ///   index, or the section's `sh_entsize` is 0.
    /// - [`ElfError::NotFound`] if there is no `.strtab` section. Nothing is
    ///   allocated in that case.
    /// - [`ElfError::AllocationFailure`] if the entries cannot be allocated.
    pub fn setup(
        sections: &SectionTable,
        symtab_index: usize,
        header: &FileHeader,
    ) -> Result<Self, ElfError> {
        if sections.is_released() {
            return Err(ElfError::NullInput);
        }
        let section = sections.get(symtab_index).ok_or(ElfError::OutOfRange)?;
        if section.sh_entsize == 0 {
            return Err(ElfError::OutOfRange);
        }
        let entry_size = usize::try_from(section.sh_entsize).map_err(|_| ElfError::OutOfRange)?;
        let table_len = usize::try_from(section.sh_size / section.sh_entsize)
            .map_err(|_| ElfError::OutOfRange)?;

        let string_table_index = sections.find_by_name(STRTAB_SECTION_NAME, 0)?;

        let mut entries = Vec::new();
        entries.try_reserve_exact(table_len)?;
        entries.resize_with(table_len, SymbolEntry::default);

        Ok(Self {
            class: header.ident.class,
            data: header.ident.data,
            entry_size,
            table_len,
            string_table_index,
            max_idx: 0,
            entries: Some(entries),
        })
    }

    /// Decodes every entry from `data`, the symbol table section contents.
    ///
    /// # Errors
    ///
    /// Same as [`SectionTable::parse`].
    pub fn parse(&mut self, data: &[u8]) -> Result<(), ElfError> {
        let entries = self.entries.as_mut().ok_or(ElfError::NullInput)?;
        let total = self
            .entry_size
            .checked_mul(self.table_len)
            .ok_or(ElfError::InsufficientSize)?;
        if total == 0 || data.len() < total {
            return Err(ElfError::InsufficientSize);
        }
        let class = ElfClass::from_raw(self.class).ok_or(ElfError::InvalidClassOrEncoding)?;
        let encoding = DataEncoding::from_raw(self.data).ok_or(ElfError::InvalidClassOrEncoding)?;
        let fields = layout::symbol_fields(class);

        let mut decoded = Vec::new();
        decoded.try_reserve_exact(self.table_len)?;
        let mut max_idx = 0;
        for i in 0..self.table_len {
            let mut entry = SymbolEntry::default();
            let base = i * self.entry_size;
            for spec in fields {
                let value = layout::read_field(data, base, spec, encoding)?;
                entry.assign(spec.field, value);
            }
            entry.split_info();
            max_idx = max_idx.max(entry.name_index);
            decoded.push(entry);
        }

        *entries = decoded;
        self.max_idx = max_idx;
        Ok(())
    }

    /// Attaches a name to every entry from the string table `strtab`.
    ///
    /// # Errors
    ///
    /// Same as [`SectionTable::resolve_names`].
    pub fn resolve_names(&mut self, strtab: &[u8]) -> Result<(), ElfError> {
        let entries = self.entries.as_mut().ok_or(ElfError::NullInput)?;
        section::resolve_into(
            entries.iter_mut().map(|e| (e.name_index, &mut e.name)),
            self.max_idx,
            strtab,
        )
    }

    /// Finds the first entry at or after `start` whose name equals `name`.
    ///
    /// # Errors
    ///
    /// Same as [`SectionTable::find_by_name`].
    pub fn find_by_name(&self, name: &str, start: usize) -> Result<usize, ElfError> {
        let entries = self.entries.as_ref().ok_or(ElfError::NullInput)?;
        section::find_name(entries.iter().map(SymbolEntry::name), name, start)
    }

    /// Drops every entry and name, leaving an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::NullInput`] if the table was already released.
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
    pub fn get(&self, index: usize) -> Option<&SymbolEntry> {
        self.entries.as_ref()?.get(index)
    }

    /// Returns an iterator over the entries (empty once released).
    pub fn iter(&self) -> core::slice::Iter<'_, SymbolEntry> {
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

    /// Size of one on-disk entry, from the section's `sh_entsize`.
    #[must_use]
    pub fn entry_size(&self) -> usize {
        self.entry_size
    }

    /// Section index of `.strtab`.
    #[must_use]
    pub fn string_table_index(&self) -> usize {
        self.string_table_index
    }

    /// Largest name index seen by the last [`parse`](Self::parse).
    #[must_use]
    pub fn max_idx(&self) -> u32 {
        self.max_idx
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a SymbolEntry;
    type IntoIter = core::slice::Iter<'a, SymbolEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
