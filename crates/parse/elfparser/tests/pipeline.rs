//! Whole-file decoding of synthetic ELF images in every class and byte order.

use elfparser::{
    DataEncoding, ElfClass, ElfError, ElfImage, ElfType, FileHeader, SHT_NOBITS, SHT_NULL,
    SHT_PROGBITS, SHT_STRTAB, SHT_SYMTAB, STB_GLOBAL, STB_LOCAL, STT_FUNC, STT_OBJECT, STV_DEFAULT, STV_HIDDEN,
    SectionTable, StringTable, SymbolTable, section_data,
};

const TEXT: &[u8] = &[0x55, 0x48, 0x89, 0xe5, 0x5d, 0xc3];
const SYMBOL_NAMES: &[u8] = b"\0main\0buffer\0";

/// Serializes integers in the image's class and byte order.
struct Writer {
    class: ElfClass,
    enc: DataEncoding,
    buf: Vec<u8>,
}

impl Writer {
    fn new(class: ElfClass, enc: DataEncoding) -> Self {
        Self {
            class,
            enc,
            buf: Vec::new(),
        }
    }

    fn uint(&mut self, width: usize, value: u64) {
        let mut field = value.to_le_bytes()[..width].to_vec();
        if self.enc == DataEncoding::Big {
            field.reverse();
        }
        self.buf.extend_from_slice(&field);
    }

    fn byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn half(&mut self, value: u16) {
        self.uint(2, u64::from(value));
    }

    fn word(&mut self, value: u32) {
        self.uint(4, u64::from(value));
    }

    /// An address-sized field: 4 bytes for ELF32, 8 for ELF64.
    fn addr(&mut self, value: u64) {
        match self.class {
            ElfClass::Elf32 => self.uint(4, value),
            ElfClass::Elf64 => self.uint(8, value),
        }
    }
}

struct Symbol {
    name: u32,
    info: u8,
    other: u8,
    shndx: u16,
    value: u64,
    size: u64,
}

fn symbol_bytes(class: ElfClass, enc: DataEncoding, symbols: &[Symbol]) -> Vec<u8> {
    let mut w = Writer::new(class, enc);
    for s in symbols {
        w.word(s.name);
        match class {
            ElfClass::Elf32 => {
                w.word(s.value as u32);
                w.word(s.size as u32);
                w.byte(s.info);
                w.byte(s.other);
                w.half(s.shndx);
            }
            ElfClass::Elf64 => {
                w.byte(s.info);
                w.byte(s.other);
                w.half(s.shndx);
                w.addr(s.value);
                w.addr(s.size);
            }
        }
    }
    w.buf
}

struct Section {
    name: &'static str,
    sh_type: u32,
    flags: u64,
    data: Vec<u8>,
    link: u32,
    entsize: u64,
}

impl Section {
    fn new(name: &'static str, sh_type: u32, data: Vec<u8>) -> Self {
        Self {
            name,
            sh_type,
            flags: 0,
            data,
            link: 0,
            entsize: 0,
        }
    }
}

/// Lays out header, section contents, then the section header table.
///
/// `.shstrtab` is appended last and built from the other sections' names.
fn build(class: ElfClass, enc: DataEncoding, mut sections: Vec<Section>) -> Vec<u8> {
    let mut shstrtab = vec![0u8];
    let mut name_offsets = vec![0u32];
    for s in sections.iter().skip(1) {
        name_offsets.push(shstrtab.len() as u32);
        shstrtab.extend_from_slice(s.name.as_bytes());
        shstrtab.push(0);
    }
    name_offsets.push(shstrtab.len() as u32);
    shstrtab.extend_from_slice(b".shstrtab\0");
    sections.push(Section::new(".shstrtab", SHT_STRTAB, shstrtab));

    let mut offsets = Vec::new();
    let mut cursor = class.header_size();
    for s in &sections {
        offsets.push(cursor);
        cursor += s.data.len();
    }
    let shoff = cursor.next_multiple_of(8);

    let mut w = Writer::new(class, enc);
    w.buf.extend_from_slice(&[0x7f, b'E', b'L', b'F', class as u8, enc as u8, 1, 0]);
    w.buf.resize(16, 0);
    w.half(2);
    w.half(62);
    w.word(1);
    w.addr(0x0040_1000);
    w.addr(0);
    w.addr(shoff as u64);
    w.word(0);
    w.half(class.header_size() as u16);
    w.half(0);
    w.half(0);
    w.half(class.section_entry_size() as u16);
    w.half(sections.len() as u16);
    w.half((sections.len() - 1) as u16);
    assert_eq!(w.buf.len(), class.header_size());

    for s in &sections {
        w.buf.extend_from_slice(&s.data);
    }
    w.buf.resize(shoff, 0);

    for (i, s) in sections.iter().enumerate() {
        let offset = if s.sh_type == SHT_NULL { 0 } else { offsets[i] };
        w.word(name_offsets[i]);
        w.word(s.sh_type);
        w.addr(s.flags);
        w.addr(0);
        w.addr(offset as u64);
        w.addr(s.data.len() as u64);
        w.word(s.link);
        w.word(0);
        w.addr(1);
        w.addr(s.entsize);
    }
    w.buf
}

fn symbols(class: ElfClass, enc: DataEncoding) -> Vec<u8> {
    symbol_bytes(
        class,
        enc,
        &[
            Symbol {
                name: 1,
                info: (STB_GLOBAL << 4) | STT_FUNC,
                other: STV_DEFAULT,
                shndx: 1,
                value: 0x0040_1000,
                size: TEXT.len() as u64,
            },
            Symbol {
                name: 6,
                info: (STB_LOCAL << 4) | STT_OBJECT,
                other: STV_HIDDEN,
                shndx: 1,
                value: 0x0040_2000,
                size: 64,
            },
        ],
    )
}

/// NULL, `.text`, `.strtab`, `.symtab`, `.shstrtab`.
fn full_image(class: ElfClass, enc: DataEncoding) -> Vec<u8> {
    let mut text = Section::new(".text", SHT_PROGBITS, TEXT.to_vec());
    text.flags = 0x6;
    let mut symtab = Section::new(".symtab", SHT_SYMTAB, symbols(class, enc));
    symtab.link = 2;
    symtab.entsize = class.symbol_entry_size() as u64;
    build(
        class,
        enc,
        vec![
            Section::new("", SHT_NULL, Vec::new()),
            text,
            Section::new(".strtab", SHT_STRTAB, SYMBOL_NAMES.to_vec()),
            symtab,
        ],
    )
}

/// Overwrites `sh_type`, `sh_size` and `sh_entsize` of `.symtab` (index 3)
/// in an image from [`full_image`].
fn patch_symtab(data: &mut [u8], class: ElfClass, enc: DataEncoding, sh_type: u32, size: u64, entsize: u64) {
    let header = FileHeader::from_bytes(data).unwrap();
    let entry = usize::try_from(header.e_shoff).unwrap() + 3 * class.section_entry_size();
    let (size_at, entsize_at, width) = match class {
        ElfClass::Elf32 => (0x14, 0x24, 4),
        ElfClass::Elf64 => (0x20, 0x38, 8),
    };
    for (at, width, value) in [
        (0x04, 4, u64::from(sh_type)),
        (size_at, width, size),
        (entsize_at, width, entsize),
    ] {
        let mut w = Writer::new(class, enc);
        w.uint(width, value);
        data[entry + at..entry + at + width].copy_from_slice(&w.buf);
    }
}

const COMBOS: [(ElfClass, DataEncoding); 4] = [
    (ElfClass::Elf32, DataEncoding::Little),
    (ElfClass::Elf32, DataEncoding::Big),
    (ElfClass::Elf64, DataEncoding::Little),
    (ElfClass::Elf64, DataEncoding::Big),
];

#[test]
fn little_endian_64_full_pipeline() {
    let data = full_image(ElfClass::Elf64, DataEncoding::Little);
    let image = ElfImage::parse(&data).unwrap();

    let header = image.header();
    assert_eq!(header.size(), 64);
    assert!(header.ehsize_matches_class());
    assert_eq!(header.elf_type(), ElfType::Executable);
    assert_eq!(header.e_machine, 62);
    assert_eq!(header.e_entry, 0x0040_1000);
    assert_eq!(header.e_shnum, 5);
    assert_eq!(header.e_shstrndx, 4);

    let sections = image.sections();
    assert_eq!(sections.len(), 5);
    assert_eq!(sections.find_by_name(".symtab", 0), Ok(3));
    assert_eq!(sections.find_by_name(".strtab", 0), Ok(2));
    assert_eq!(sections.find_by_name(".shstrtab", 0), Ok(4));

    let symbols = image.symbols().unwrap();
    assert_eq!(symbols.len(), 2);
    assert!(symbols.iter().all(|s| s.name().is_some()));
    assert_eq!(symbols.find_by_name("buffer", 0), Ok(1));
}

#[test]
fn every_class_and_byte_order() {
    for (class, enc) in COMBOS {
        let data = full_image(class, enc);
        let image = ElfImage::parse(&data).unwrap();
        assert_eq!(image.header().class(), Ok(class));
        assert_eq!(image.header().encoding(), Ok(enc));

        let text = image.section_by_name(".text").unwrap();
        assert_eq!(text.sh_type, SHT_PROGBITS);
        assert_eq!(text.sh_addralign, 1);
        assert_eq!(section_data(&data, text), Ok(TEXT));

        let symbols = image.symbols().unwrap();
        assert_eq!(symbols.string_table_index(), 2);

        let main = symbols.get(0).unwrap();
        assert_eq!(main.name(), Some("main"));
        assert_eq!(main.bind, STB_GLOBAL);
        assert_eq!(main.sym_type, STT_FUNC);
        assert_eq!(main.visibility(), STV_DEFAULT);
        assert_eq!(main.value, 0x0040_1000);
        assert_eq!(main.size, TEXT.len() as u64);
        assert!(main.is_defined());

        let buffer = symbols.get(1).unwrap();
        assert_eq!(buffer.name(), Some("buffer"));
        assert_eq!(buffer.bind, STB_LOCAL);
        assert_eq!(buffer.sym_type, STT_OBJECT);
        assert_eq!(buffer.visibility(), STV_HIDDEN);
        assert_eq!(buffer.value, 0x0040_2000);
        assert_eq!(buffer.size, 64);
    }
}

#[test]
fn step_by_step_matches_image() {
    for (class, enc) in COMBOS {
        let data = full_image(class, enc);

        let mut header = FileHeader::default();
        header.parse_ident(&data).unwrap();
        header.parse(&data).unwrap();

        let mut sections = SectionTable::setup(&header).unwrap();
        let shoff = usize::try_from(header.e_shoff).unwrap();
        sections.parse(&data[shoff..]).unwrap();
        let shstrtab = sections.get(usize::from(header.e_shstrndx)).unwrap();
        sections.resolve_names(section_data(&data, shstrtab).unwrap()).unwrap();

        let symtab_index = sections.find_by_name(".symtab", 0).unwrap();
        let mut symbols = SymbolTable::setup(&sections, symtab_index, &header).unwrap();
        symbols
            .parse(section_data(&data, sections.get(symtab_index).unwrap()).unwrap())
            .unwrap();
        let strtab = sections.get(symbols.string_table_index()).unwrap();
        symbols.resolve_names(section_data(&data, strtab).unwrap()).unwrap();

        let image = ElfImage::parse(&data).unwrap();
        assert_eq!(image.into_parts(), (header, sections, Some(symbols)));
    }
}

#[test]
fn section_names_as_string_table() {
    let data = full_image(ElfClass::Elf32, DataEncoding::Big);
    let image = ElfImage::parse(&data).unwrap();
    let shstrtab = image.section_by_name(".shstrtab").unwrap();
    let table = StringTable::parse(section_data(&data, shstrtab).unwrap()).unwrap();
    let names: Vec<&str> = table.iter().collect();
    assert_eq!(names, ["", ".text", ".strtab", ".symtab", ".shstrtab"]);
}

#[test]
fn without_symtab() {
    let data = build(
        ElfClass::Elf64,
        DataEncoding::Big,
        vec![
            Section::new("", SHT_NULL, Vec::new()),
            Section::new(".text", SHT_PROGBITS, TEXT.to_vec()),
        ],
    );
    let image = ElfImage::parse(&data).unwrap();
    assert_eq!(image.sections().len(), 3);
    assert!(image.symbols().is_none());
}

#[test]
fn symtab_without_strtab() {
    let class = ElfClass::Elf32;
    let enc = DataEncoding::Little;
    let mut symtab = Section::new(".symtab", SHT_SYMTAB, symbols(class, enc));
    symtab.entsize = class.symbol_entry_size() as u64;
    let data = build(class, enc, vec![Section::new("", SHT_NULL, Vec::new()), symtab]);
    assert_eq!(ElfImage::parse(&data), Err(ElfError::NotFound));
}

#[test]
fn symtab_with_zero_entsize() {
    let class = ElfClass::Elf64;
    let enc = DataEncoding::Little;
    let symtab = Section::new(".symtab", SHT_SYMTAB, symbols(class, enc));
    let data = build(
        class,
        enc,
        vec![
            Section::new("", SHT_NULL, Vec::new()),
            Section::new(".strtab", SHT_STRTAB, SYMBOL_NAMES.to_vec()),
            symtab,
        ],
    );
    assert_eq!(ElfImage::parse(&data), Err(ElfError::OutOfRange));
}

#[test]
fn oversized_symtab_fails_before_allocating() {
    for (class, enc) in COMBOS {
        let largest = match class {
            ElfClass::Elf32 => u64::from(u32::MAX),
            ElfClass::Elf64 => 1 << 40,
        };
        for size in [1 << 25, largest] {
            let mut data = full_image(class, enc);
            patch_symtab(&mut data, class, enc, SHT_SYMTAB, size, 1);
            assert_eq!(ElfImage::parse(&data), Err(ElfError::InsufficientSize), "sh_size {size:#x}");

            // NOBITS has no file data to bound the size against.
            patch_symtab(&mut data, class, enc, SHT_NOBITS, size, 1);
            assert_eq!(ElfImage::parse(&data), Err(ElfError::InsufficientSize), "sh_size {size:#x}");
        }
    }
}

#[test]
fn empty_nobits_symtab_has_no_symbols() {
    let class = ElfClass::Elf64;
    let enc = DataEncoding::Little;
    let mut data = full_image(class, enc);
    patch_symtab(&mut data, class, enc, SHT_NOBITS, 0, class.symbol_entry_size() as u64);
    let image = ElfImage::parse(&data).unwrap();
    assert!(image.symbols().unwrap().is_empty());
}

#[test]
fn every_truncation_fails_cleanly() {
    for (class, enc) in COMBOS {
        let data = full_image(class, enc);
        for len in 0..data.len() {
            assert!(ElfImage::parse(&data[..len]).is_err(), "prefix of {len} bytes");
        }
    }
}

#[test]
fn bad_identification() {
    let mut data = full_image(ElfClass::Elf64, DataEncoding::Little);
    data[5] = 3;
    assert_eq!(ElfImage::parse(&data), Err(ElfError::InvalidClassOrEncoding));
    data[1] = b'X';
    assert_eq!(ElfImage::parse(&data), Err(ElfError::InvalidFormat));
}

#[test]
fn released_section_table_rejects_reuse() {
    let data = full_image(ElfClass::Elf64, DataEncoding::Little);
    let (_, mut sections, symbols) = ElfImage::parse(&data).unwrap().into_parts();
    let mut symbols = symbols.unwrap();

    assert_eq!(sections.release(), Ok(()));
    assert_eq!(sections.release(), Err(ElfError::NullInput));
    assert_eq!(sections.find_by_name(".text", 0), Err(ElfError::NullInput));

    assert_eq!(symbols.release(), Ok(()));
    assert_eq!(symbols.parse(&data), Err(ElfError::NullInput));
}
