//! Per-class field layouts of the fixed-size ELF records.
//!
//! Each record kind has one table per class listing `(field, offset, width)`.
//! Decoders walk the table once per record and dispatch on the field tag,
//! so offset and width can never drift apart.

use crate::bytes;
use crate::error::ElfError;
use crate::header::{DataEncoding, ElfClass};

/// Location of one field inside a fixed-size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec<F> {
    /// Which field this is.
    pub field: F,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// Width in bytes (1, 2, 4 or 8).
    pub width: usize,
}

const fn spec<F>(field: F, offset: usize, width: usize) -> FieldSpec<F> {
    FieldSpec {
        field,
        offset,
        width,
    }
}

/// Fields of the file header that follow the identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// `e_type`
    Type,
    /// `e_machine`
    Machine,
    /// `e_version`
    Version,
    /// `e_entry`
    Entry,
    /// `e_phoff`
    PhOff,
    /// `e_shoff`
    ShOff,
    /// `e_flags`
    Flags,
    /// `e_ehsize`
    EhSize,
    /// `e_phentsize`
    PhEntSize,
    /// `e_phnum`
    PhNum,
    /// `e_shentsize`
    ShEntSize,
    /// `e_shnum`
    ShNum,
    /// `e_shstrndx`
    ShStrNdx,
}

/// Fields of a section header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionField {
    /// `sh_name`
    Name,
    /// `sh_type`
    Type,
    /// `sh_flags`
    Flags,
    /// `sh_addr`
    Addr,
    /// `sh_offset`
    Offset,
    /// `sh_size`
    Size,
    /// `sh_link`
    Link,
    /// `sh_info`
    Info,
    /// `sh_addralign`
    AddrAlign,
    /// `sh_entsize`
    EntSize,
}

/// Fields of a symbol table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolField {
    /// `st_name`
    Name,
    /// `st_info`
    Info,
    /// `st_other`
    Other,
    /// `st_shndx`
    Shndx,
    /// `st_value`
    Value,
    /// `st_size`
    Size,
}

const HEADER_32: [FieldSpec<HeaderField>; 13] = [
    spec(HeaderField::Type, 0x10, 2),
    spec(HeaderField::Machine, 0x12, 2),
    spec(HeaderField::Version, 0x14, 4),
    spec(HeaderField::Entry, 0x18, 4),
    spec(HeaderField::PhOff, 0x1C, 4),
    spec(HeaderField::ShOff, 0x20, 4),
    spec(HeaderField::Flags, 0x24, 4),
    spec(HeaderField::EhSize, 0x28, 2),
    spec(HeaderField::PhEntSize, 0x2A, 2),
    spec(HeaderField::PhNum, 0x2C, 2),
    spec(HeaderField::ShEntSize, 0x2E, 2),
    spec(HeaderField::ShNum, 0x30, 2),
    spec(HeaderField::ShStrNdx, 0x32, 2),
];

const HEADER_64: [FieldSpec<HeaderField>; 13] = [
    spec(HeaderField::Type, 0x10, 2),
    spec(HeaderField::Machine, 0x12, 2),
    spec(HeaderField::Version, 0x14, 4),
    spec(HeaderField::Entry, 0x18, 8),
    spec(HeaderField::PhOff, 0x20, 8),
    spec(HeaderField::ShOff, 0x28, 8),
    spec(HeaderField::Flags, 0x30, 4),
    spec(HeaderField::EhSize, 0x34, 2),
    spec(HeaderField::PhEntSize, 0x36, 2),
    spec(HeaderField::PhNum, 0x38, 2),
    spec(HeaderField::ShEntSize, 0x3A, 2),
    spec(HeaderField::ShNum, 0x3C, 2),
    spec(HeaderField::ShStrNdx, 0x3E, 2),
];

const SECTION_32: [FieldSpec<SectionField>; 10] = [
    spec(SectionField::Name, 0x00, 4),
    spec(SectionField::Type, 0x04, 4),
    spec(SectionField::Flags, 0x08, 4),
    spec(SectionField::Addr, 0x0C, 4),
    spec(SectionField::Offset, 0x10, 4),
    spec(SectionField::Size, 0x14, 4),
    spec(SectionField::Link, 0x18, 4),
    spec(SectionField::Info, 0x1C, 4),
    spec(SectionField::AddrAlign, 0x20, 4),
    spec(SectionField::EntSize, 0x24, 4),
];

const SECTION_64: [FieldSpec<SectionField>; 10] = [
    spec(SectionField::Name, 0x00, 4),
    spec(SectionField::Type, 0x04, 4),
    spec(SectionField::Flags, 0x08, 8),
    spec(SectionField::Addr, 0x10, 8),
    spec(SectionField::Offset, 0x18, 8),
    spec(SectionField::Size, 0x20, 8),
    spec(SectionField::Link, 0x28, 4),
    spec(SectionField::Info, 0x2C, 4),
    spec(SectionField::AddrAlign, 0x30, 8),
    spec(SectionField::EntSize, 0x38, 8),
];

// Elf32_Sym puts value and size ahead of info/other/shndx.
const SYMBOL_32: [FieldSpec<SymbolField>; 6] = [
    spec(SymbolField::Name, 0x00, 4),
    spec(SymbolField::Info, 0x0C, 1),
    spec(SymbolField::Other, 0x0D, 1),
    spec(SymbolField::Shndx, 0x0E, 2),
    spec(SymbolField::Value, 0x04, 4),
    spec(SymbolField::Size, 0x08, 4),
];

const SYMBOL_64: [FieldSpec<SymbolField>; 6] = [
    spec(SymbolField::Name, 0x00, 4),
    spec(SymbolField::Info, 0x04, 1),
    spec(SymbolField::Other, 0x05, 1),
    spec(SymbolField::Shndx, 0x06, 2),
    spec(SymbolField::Value, 0x08, 8),
    spec(SymbolField::Size, 0x10, 8),
];

/// Header field layout for `class`.
#[must_use]
pub fn header_fields(class: ElfClass) -> &'static [FieldSpec<HeaderField>] {
    match class {
        ElfClass::Elf32 => &HEADER_32,
        ElfClass::Elf64 => &HEADER_64,
    }
}

/// Section header entry layout for `class`.
#[must_use]
pub fn section_fields(class: ElfClass) -> &'static [FieldSpec<SectionField>] {
    match class {
        ElfClass::Elf32 => &SECTION_32,
        ElfClass::Elf64 => &SECTION_64,
    }
}

/// Symbol entry layout for `class`.
#[must_use]
pub fn symbol_fields(class: ElfClass) -> &'static [FieldSpec<SymbolField>] {
    match class {
        ElfClass::Elf32 => &SYMBOL_32,
        ElfClass::Elf64 => &SYMBOL_64,
    }
}

/// Reads the field described by `spec` from the record starting at `base`.
///
/// The raw bytes go into an 8-byte little-endian temporary, copied straight
/// for little-endian data and reversed for big-endian data, and the value is
/// returned widened to `u64`.
///
/// # Errors
///
/// - [`ElfError::InsufficientSize`] if `base + offset + width` exceeds `data`.
/// - [`ElfError::CopyFailure`] if the field is wider than 8 bytes.
pub fn read_field<F>(
    data: &[u8],
    base: usize,
    spec: &FieldSpec<F>,
    encoding: DataEncoding,
) -> Result<u64, ElfError> {
    let start = base
        .checked_add(spec.offset)
        .ok_or(ElfError::InsufficientSize)?;
    let end = start
        .checked_add(spec.width)
        .ok_or(ElfError::InsufficientSize)?;
    let src = data.get(start..end).ok_or(ElfError::InsufficientSize)?;

    let mut tmp = [0u8; 8];
    match encoding {
        DataEncoding::Little => bytes::copy(&mut tmp, src, spec.width)?,
        DataEncoding::Big => bytes::reverse_copy(&mut tmp, src, spec.width)?,
    }
    Ok(u64::from_le_bytes(tmp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_within<F: Copy>(fields: &[FieldSpec<F>], record: usize) {
        for f in fields {
            assert!(f.offset + f.width <= record);
            assert!(matches!(f.width, 1 | 2 | 4 | 8));
        }
    }

    #[test]
    fn tables_fit_their_records() {
        for class in [ElfClass::Elf32, ElfClass::Elf64] {
            assert_within(header_fields(class), class.header_size());
            assert_within(section_fields(class), class.section_entry_size());
            assert_within(symbol_fields(class), class.symbol_entry_size());
        }
    }

    #[test]
    fn section_fields_do_not_overlap() {
        for class in [ElfClass::Elf32, ElfClass::Elf64] {
            let mut covered = 0;
            for f in section_fields(class) {
                assert_eq!(f.offset, covered);
                covered += f.width;
            }
            assert_eq!(covered, class.section_entry_size());
        }
    }

    #[test]
    fn read_little_and_big() {
        let data = [0u8, 0x12, 0x34, 0x56, 0x78];
        let f = spec((), 1, 4);
        assert_eq!(read_field(&data, 0, &f, DataEncoding::Little), Ok(0x7856_3412));
        assert_eq!(read_field(&data, 0, &f, DataEncoding::Big), Ok(0x1234_5678));
    }

    #[test]
    fn read_single_byte_ignores_encoding() {
        let data = [0xAB];
        let f = spec((), 0, 1);
        assert_eq!(read_field(&data, 0, &f, DataEncoding::Little), Ok(0xAB));
        assert_eq!(read_field(&data, 0, &f, DataEncoding::Big), Ok(0xAB));
    }

    #[test]
    fn read_past_end() {
        let data = [0u8; 8];
        let f = spec((), 6, 4);
        assert_eq!(
            read_field(&data, 0, &f, DataEncoding::Little),
            Err(ElfError::InsufficientSize)
        );
        assert_eq!(
            read_field(&data, usize::MAX, &f, DataEncoding::Little),
            Err(ElfError::InsufficientSize)
        );
    }

    #[test]
    fn read_too_wide() {
        let data = [0u8; 16];
        let f = spec((), 0, 16);
        assert_eq!(
            read_field(&data, 0, &f, DataEncoding::Little),
            Err(ElfError::CopyFailure)
        );
    }
}
