//! End-to-end decoding of an in-memory ELF file.

use crate::error::ElfError;
use crate::header::FileHeader;
use crate::section::{SHT_NOBITS, SectionEntry, SectionTable};
use crate::symbol::{STRTAB_SECTION_NAME, SymbolTable};

/// Name of the section holding the static symbol table.
pub const SYMTAB_SECTION_NAME: &str = ".symtab";

/// A fully decoded ELF file.
///
/// Owns everything it decoded; nothing borrows the input slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage {
    header: FileHeader,
    sections: SectionTable,
    symbols: Option<SymbolTable>,
}

impl ElfImage {
    /// Decodes the header, the section table with its names, and the
    /// `.symtab` symbol table with its names, in that order.
    ///
    /// A file without section headers (`e_shnum == 0`) decodes to an empty
    /// section table. A file without `.symtab` decodes without symbols.
    ///
    /// # Errors
    ///
    /// The first error from any stage is returned unchanged. In addition:
    ///
    /// - [`ElfError::InsufficientSize`] if `e_shoff` or a section's data lies
    ///   outside `data`.
    /// - [`ElfError::OutOfRange`] if `e_shstrndx` is not a valid section index.
    /// - [`ElfError::NotFound`] if `.symtab` exists but `.strtab` does not.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let header = FileHeader::from_bytes(data)?;
        let mut sections = SectionTable::setup(&header)?;
        if sections.is_empty() {
            return Ok(Self {
                header,
                sections,
                symbols: None,
            });
        }

        let start = to_usize(header.e_shoff)?;
        sections.parse(data.get(start..).ok_or(ElfError::InsufficientSize)?)?;

        let shstrtab = sections
            .get(usize::from(header.e_shstrndx))
            .ok_or(ElfError::OutOfRange)?;
        let names = section_data(data, shstrtab)?;
        sections.resolve_names(names)?;

        let symbols = match sections.find_by_name(SYMTAB_SECTION_NAME, 0) {
            Ok(index) => Some(load_symbols(data, &sections, index, &header)?),
            Err(ElfError::NotFound) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            header,
            sections,
            symbols,
        })
    }

    /// The decoded file header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The decoded section table.
    #[must_use]
    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    /// The decoded `.symtab`, if the file has one.
    #[must_use]
    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_ref()
    }

    /// Returns the first section named `name`.
    ///
    /// # Errors
    ///
    /// Same as [`SectionTable::find_by_name`] with a start index of 0.
    pub fn section_by_name(&self, name: &str) -> Result<&SectionEntry, ElfError> {
        let index = self.sections.find_by_name(name, 0)?;
        self.sections.get(index).ok_or(ElfError::OutOfRange)
    }

    /// Splits the image into its parts.
    #[must_use]
    pub fn into_parts(self) -> (FileHeader, SectionTable, Option<SymbolTable>) {
        (self.header, self.sections, self.symbols)
    }
}

fn load_symbols(
    data: &[u8],
    sections: &SectionTable,
    symtab_index: usize,
    header: &FileHeader,
) -> Result<SymbolTable, ElfError> {
    // Bounds first: setup allocates sh_size / sh_entsize entries.
    let symtab = sections.get(symtab_index).ok_or(ElfError::OutOfRange)?;
    let symtab_data = section_data(data, symtab)?;
    if symtab.sh_type == SHT_NOBITS && symtab.sh_size != 0 {
        return Err(ElfError::InsufficientSize);
    }

    let mut symbols = SymbolTable::setup(sections, symtab_index, header)?;
    if symbols.is_empty() {
        return Ok(symbols);
    }
    symbols.parse(symtab_data)?;

    let strtab = sections
        .get(symbols.string_table_index())
        .ok_or(ElfError::NotFound)?;
    debug_assert_eq!(strtab.name(), Some(STRTAB_SECTION_NAME));
    symbols.resolve_names(section_data(data, strtab)?)?;
    Ok(symbols)
}

/// Returns the bytes of `entry` within the file `data`.
///
/// `SHT_NOBITS` sections occupy no file space and yield an empty slice.
///
/// # Errors
///
/// Returns [`ElfError::InsufficientSize`] if `sh_offset + sh_size` lies
/// outside `data`.
pub fn section_data<'d>(data: &'d [u8], entry: &SectionEntry) -> Result<&'d [u8], ElfError> {
    if entry.sh_type == SHT_NOBITS {
        return Ok(&[]);
    }
    let start = to_usize(entry.sh_offset)?;
    let end = start
        .checked_add(to_usize(entry.sh_size)?)
        .ok_or(ElfError::InsufficientSize)?;
    data.get(start..end).ok_or(ElfError::InsufficientSize)
}

fn to_usize(value: u64) -> Result<usize, ElfError> {
    usize::try_from(value).map_err(|_| ElfError::InsufficientSize)
}
