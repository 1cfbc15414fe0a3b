//! ELF identification block and file header decoding.
//!
//! Decoding is a two-step state machine over one [`FileHeader`]:
//! [`FileHeader::parse_ident`] validates the magic and records class and
//! data encoding, then [`FileHeader::parse`] uses them to pick the field
//! layout and byte order for the remaining thirteen header fields.

use core::fmt;

use crate::bytes;
use crate::error::ElfError;
use crate::layout::{self, HeaderField};

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the identification block.
pub const EI_NIDENT: usize = 16;

const EI_MAG: usize = 0;
const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;
const EI_OSABI: usize = 7;
const EI_ABIVERSION: usize = 8;

/// Size of an ELF32 file header (52 bytes).
pub const ELF32_EHDR_SIZE: usize = 52;

/// Size of an ELF64 file header (64 bytes).
pub const ELF64_EHDR_SIZE: usize = 64;

/// Width of addresses and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElfClass {
    /// `ELFCLASS32`
    Elf32 = 1,
    /// `ELFCLASS64`
    Elf64 = 2,
}

impl ElfClass {
    /// Maps the raw `EI_CLASS` byte to a class.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Elf32),
            2 => Some(Self::Elf64),
            _ => None,
        }
    }

    /// Size of the file header for this class.
    #[must_use]
    pub const fn header_size(self) -> usize {
        match self {
            Self::Elf32 => ELF32_EHDR_SIZE,
            Self::Elf64 => ELF64_EHDR_SIZE,
        }
    }

    /// Size of one section header entry for this class.
    #[must_use]
    pub const fn section_entry_size(self) -> usize {
        match self {
            Self::Elf32 => 40,
            Self::Elf64 => 64,
        }
    }

    /// Size of one symbol table entry for this class.
    #[must_use]
    pub const fn symbol_entry_size(self) -> usize {
        match self {
            Self::Elf32 => 16,
            Self::Elf64 => 24,
        }
    }
}

impl fmt::Display for ElfClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elf32 => write!(f, "ELF32"),
            Self::Elf64 => write!(f, "ELF64"),
        }
    }
}

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataEncoding {
    /// `ELFDATA2LSB`
    Little = 1,
    /// `ELFDATA2MSB`
    Big = 2,
}

impl DataEncoding {
    /// Maps the raw `EI_DATA` byte to an encoding.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Little),
            2 => Some(Self::Big),
            _ => None,
        }
    }
}

impl fmt::Display for DataEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => write!(f, "little-endian"),
            Self::Big => write!(f, "big-endian"),
        }
    }
}

/// Operating system / ABI identifier from `EI_OSABI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsAbi {
    /// System V
    SystemV,
    /// HP-UX
    HpUx,
    /// NetBSD
    NetBsd,
    /// Linux
    Linux,
    /// GNU Hurd
    GnuHurd,
    /// Solaris
    Solaris,
    /// AIX
    Aix,
    /// IRIX
    Irix,
    /// FreeBSD
    FreeBsd,
    /// Compaq Tru64
    Tru64,
    /// Novell Modesto
    NovellModesto,
    /// OpenBSD
    OpenBsd,
    /// OpenVMS
    OpenVms,
    /// HP NonStop Kernel
    NonStopKernel,
    /// AROS
    Aros,
    /// FenixOS
    FenixOs,
    /// Nuxi CloudABI
    CloudAbi,
    /// Stratus OpenVOS
    OpenVos,
    /// Any identifier not listed above.
    Other(u8),
}

impl OsAbi {
    /// Maps the raw `EI_OSABI` byte.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::SystemV,
            0x01 => Self::HpUx,
            0x02 => Self::NetBsd,
            0x03 => Self::Linux,
            0x04 => Self::GnuHurd,
            0x06 => Self::Solaris,
            0x07 => Self::Aix,
            0x08 => Self::Irix,
            0x09 => Self::FreeBsd,
            0x0A => Self::Tru64,
            0x0B => Self::NovellModesto,
            0x0C => Self::OpenBsd,
            0x0D => Self::OpenVms,
            0x0E => Self::NonStopKernel,
            0x0F => Self::Aros,
            0x10 => Self::FenixOs,
            0x11 => Self::CloudAbi,
            0x12 => Self::OpenVos,
            other => Self::Other(other),
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SystemV => "UNIX - System V",
            Self::HpUx => "HP-UX",
            Self::NetBsd => "NetBSD",
            Self::Linux => "Linux",
            Self::GnuHurd => "GNU Hurd",
            Self::Solaris => "Solaris",
            Self::Aix => "AIX",
            Self::Irix => "IRIX",
            Self::FreeBsd => "FreeBSD",
            Self::Tru64 => "Tru64",
            Self::NovellModesto => "Novell Modesto",
            Self::OpenBsd => "OpenBSD",
            Self::OpenVms => "OpenVMS",
            Self::NonStopKernel => "NonStop Kernel",
            Self::Aros => "AROS",
            Self::FenixOs => "FenixOS",
            Self::CloudAbi => "Nuxi CloudABI",
            Self::OpenVos => "OpenVOS",
            Self::Other(_) => "unknown",
        }
    }
}

/// Object file type from `e_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElfType {
    /// `ET_NONE`
    None,
    /// `ET_REL`
    Relocatable,
    /// `ET_EXEC`
    Executable,
    /// `ET_DYN`
    Shared,
    /// `ET_CORE`
    Core,
    /// OS- or processor-specific type.
    Other(u16),
}

impl ElfType {
    /// Maps the raw `e_type` value.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Relocatable,
            2 => Self::Executable,
            3 => Self::Shared,
            4 => Self::Core,
            other => Self::Other(other),
        }
    }

    /// Short name in the style of `readelf`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Relocatable => "REL",
            Self::Executable => "EXEC",
            Self::Shared => "DYN",
            Self::Core => "CORE",
            Self::Other(_) => "OTHER",
        }
    }
}

/// The identification block (`e_ident`).
///
/// Class and data encoding are kept as raw bytes so an unknown value can be
/// carried to [`FileHeader::parse`], which reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ident {
    /// Magic bytes; equal to [`ELF_MAGIC`] once parsed.
    pub magic: [u8; 4],
    /// Raw `EI_CLASS`.
    pub class: u8,
    /// Raw `EI_DATA`.
    pub data: u8,
    /// `EI_VERSION`.
    pub version: u8,
    /// Raw `EI_OSABI`.
    pub osabi: u8,
    /// `EI_ABIVERSION`.
    pub abi_version: u8,
}

impl Ident {
    /// Returns the address width.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidClassOrEncoding`] for an unknown class byte.
    pub fn elf_class(&self) -> Result<ElfClass, ElfError> {
        ElfClass::from_raw(self.class).ok_or(ElfError::InvalidClassOrEncoding)
    }

    /// Returns the byte order.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidClassOrEncoding`] for an unknown encoding byte.
    pub fn encoding(&self) -> Result<DataEncoding, ElfError> {
        DataEncoding::from_raw(self.data).ok_or(ElfError::InvalidClassOrEncoding)
    }

    /// Returns the OS/ABI identifier.
    #[must_use]
    pub fn os_abi(&self) -> OsAbi {
        OsAbi::from_raw(self.osabi)
    }
}

/// Decoded ELF file header.
///
/// Class-dependent fields (`e_entry`, `e_phoff`, `e_shoff`) are widened to
/// `u64`, so ELF32 and ELF64 headers share this one shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileHeader {
    /// Identification block.
    pub ident: Ident,
    /// Object file type.
    pub e_type: u16,
    /// Target machine architecture.
    pub e_machine: u16,
    /// Object file version.
    pub e_version: u32,
    /// Virtual address of the entry point.
    pub e_entry: u64,
    /// Offset of the program header table in the file.
    pub e_phoff: u64,
    /// Offset of the section header table in the file.
    pub e_shoff: u64,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Size of this header as recorded in the file.
    pub e_ehsize: u16,
    /// Size of each program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl FileHeader {
    /// Decodes a complete header (identification block, then fields).
    ///
    /// # Errors
    ///
    /// Any error from [`parse_ident`](Self::parse_ident) or
    /// [`parse`](Self::parse).
    pub fn from_bytes(data: &[u8]) -> Result<Self, ElfError> {
        let mut header = Self::default();
        header.parse_ident(data)?;
        header.parse(data)?;
        Ok(header)
    }

    /// Decodes the identification block from the start of `data`.
    ///
    /// Every identification field is reset before copying, so a failed call
    /// never leaves values from an earlier parse behind.
    ///
    /// # Errors
    ///
    /// - [`ElfError::InsufficientSize`] if `data` is shorter than 16 bytes.
    /// - [`ElfError::InvalidFormat`] if the magic bytes do not match.
    pub fn parse_ident(&mut self, data: &[u8]) -> Result<(), ElfError> {
        self.ident = Ident::default();
        if data.len() < EI_NIDENT {
            return Err(ElfError::InsufficientSize);
        }
        if bytes::compare(Some(data), Some(ELF_MAGIC.as_slice()), ELF_MAGIC.len())? != 0 {
            return Err(ElfError::InvalidFormat);
        }

        let mut ident = Ident::default();
        let magic = data
            .get(EI_MAG..EI_MAG + ELF_MAGIC.len())
            .ok_or(ElfError::InsufficientSize)?;
        bytes::copy(&mut ident.magic, magic, ELF_MAGIC.len())?;
        ident.class = ident_byte(data, EI_CLASS)?;
        ident.data = ident_byte(data, EI_DATA)?;
        ident.version = ident_byte(data, EI_VERSION)?;
        ident.osabi = ident_byte(data, EI_OSABI)?;
        ident.abi_version = ident_byte(data, EI_ABIVERSION)?;

        self.ident = ident;
        Ok(())
    }

    /// Decodes the header fields that follow the identification block.
    ///
    /// On error the header keeps whatever it held before the call.
    ///
    /// # Errors
    ///
    /// - [`ElfError::NullInput`] if the identification block was never parsed.
    /// - [`ElfError::InsufficientSize`] if the class is unknown (its header
    ///   size is 0) or `data` is shorter than the class header size.
    /// - [`ElfError::InvalidClassOrEncoding`] for an unknown data encoding.
    pub fn parse(&mut self, data: &[u8]) -> Result<(), ElfError> {
        if self.ident.magic != ELF_MAGIC {
            return Err(ElfError::NullInput);
        }
        let size = self.size();
        if size == 0 || data.len() < size {
            return Err(ElfError::InsufficientSize);
        }
        let class = self.ident.elf_class()?;
        let encoding = self.ident.encoding()?;

        let mut decoded = Self {
            ident: self.ident,
            ..Self::default()
        };
        for spec in layout::header_fields(class) {
            let value = layout::read_field(data, 0, spec, encoding)?;
            decoded.assign(spec.field, value);
        }
        *self = decoded;
        Ok(())
    }

    /// Header size implied by the class: 52, 64, or 0 for an unknown class.
    #[must_use]
    pub fn size(&self) -> usize {
        ElfClass::from_raw(self.ident.class).map_or(0, ElfClass::header_size)
    }

    /// Returns `true` if `e_ehsize` agrees with the class header size.
    #[must_use]
    pub fn ehsize_matches_class(&self) -> bool {
        self.size() != 0 && usize::from(self.e_ehsize) == self.size()
    }

    /// Returns the address width.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidClassOrEncoding`] for an unknown class byte.
    pub fn class(&self) -> Result<ElfClass, ElfError> {
        self.ident.elf_class()
    }

    /// Returns the byte order.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidClassOrEncoding`] for an unknown encoding byte.
    pub fn encoding(&self) -> Result<DataEncoding, ElfError> {
        self.ident.encoding()
    }

    /// Returns the object file type.
    #[must_use]
    pub fn elf_type(&self) -> ElfType {
        ElfType::from_raw(self.e_type)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "value was read with the field's own width"
    )]
    fn assign(&mut self, field: HeaderField, value: u64) {
        match field {
            HeaderField::Type => self.e_type = value as u16,
            HeaderField::Machine => self.e_machine = value as u16,
            HeaderField::Version => self.e_version = value as u32,
            HeaderField::Entry => self.e_entry = value,
            HeaderField::PhOff => self.e_phoff = value,
            HeaderField::ShOff => self.e_shoff = value,
            HeaderField::Flags => self.e_flags = value as u32,
            HeaderField::EhSize => self.e_ehsize = value as u16,
            HeaderField::PhEntSize => self.e_phentsize = value as u16,
            HeaderField::PhNum => self.e_phnum = value as u16,
            HeaderField::ShEntSize => self.e_shentsize = value as u16,
            HeaderField::ShNum => self.e_shnum = value as u16,
            HeaderField::ShStrNdx => self.e_shstrndx = value as u16,
        }
    }
}

fn ident_byte(data: &[u8], off: usize) -> Result<u8, ElfError> {
    data.get(off).copied().ok_or(ElfError::InsufficientSize)
}
