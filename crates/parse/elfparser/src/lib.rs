//! ELF32/ELF64 structural decoder.
//!
//! Decodes the file header, the section header table and the symbol table
//! from a raw byte slice, in either byte order. Every field read is bounds
//! checked against the slice it comes from; names are copied out of the
//! string tables into owned strings so the decoded tables do not borrow the
//! input.
//!
//! # Usage
//!
//! ```
//! use elfparser::ElfImage;
//!
//! fn list_symbols(data: &[u8]) {
//!     let image = ElfImage::parse(data).expect("valid ELF");
//!     if let Some(symbols) = image.symbols() {
//!         for sym in symbols.iter() {
//!             let _ = (sym.name(), sym.value, sym.bind);
//!         }
//!     }
//! }
//! ```
//!
//! The individual decoders can also be driven step by step, which is what
//! [`ElfImage::parse`] does internally:
//!
//! ```
//! use elfparser::{FileHeader, SectionTable};
//!
//! fn sections(data: &[u8]) -> Result<SectionTable, elfparser::ElfError> {
//!     let mut header = FileHeader::default();
//!     header.parse_ident(data)?;
//!     header.parse(data)?;
//!
//!     let mut table = SectionTable::setup(&header)?;
//!     let start = usize::try_from(header.e_shoff).map_err(|_| elfparser::ElfError::OutOfRange)?;
//!     table.parse(data.get(start..).ok_or(elfparser::ElfError::InsufficientSize)?)?;
//!     Ok(table)
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod bytes;
pub mod error;
pub mod header;
pub mod image;
pub mod layout;
pub mod section;
pub mod strings;
pub mod strtab;
pub mod symbol;

pub use error::ElfError;
pub use header::{DataEncoding, ElfClass, ElfType, FileHeader, Ident, OsAbi};
pub use image::{ElfImage, section_data};
pub use section::{
    SHT_DYNAMIC, SHT_DYNSYM, SHT_HASH, SHT_NOBITS, SHT_NOTE, SHT_NULL, SHT_PROGBITS, SHT_REL,
    SHT_RELA, SHT_SHLIB, SHT_STRTAB, SHT_SYMTAB, SectionEntry, SectionFlags, SectionTable,
};
pub use strtab::StringTable;
pub use symbol::{
    STB_GLOBAL, STB_LOCAL, STB_WEAK, STT_COMMON, STT_FILE, STT_FUNC, STT_NOTYPE, STT_OBJECT,
    STT_SECTION, STT_TLS, STV_DEFAULT, STV_HIDDEN, STV_INTERNAL, STV_PROTECTED, SymbolEntry,
    SymbolTable,
};
