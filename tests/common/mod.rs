//! Writes small little-endian ELF64 executables for the integration tests.
#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;

pub const CODE: u64 = SHF_ALLOC | SHF_EXECINSTR;
pub const DATA: u64 = SHF_ALLOC | SHF_WRITE;
pub const RODATA: u64 = SHF_ALLOC;

const EHDR_SIZE: usize = 64;
const SHDR_SIZE: usize = 64;

pub struct Section {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub data: Vec<u8>,
    /// Overrides `sh_size`; used for NOBITS and for truncated payloads.
    pub size: Option<u64>,
    /// Overrides the string table offset of the name.
    pub name_offset: Option<u32>,
}

#[derive(Default)]
pub struct ElfBuilder {
    sections: Vec<Section>,
    ident_version: Option<u8>,
    e_version: Option<u32>,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progbits(mut self, name: &str, flags: u64, addr: u64, data: &[u8]) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_PROGBITS,
            flags,
            addr,
            data: data.to_vec(),
            size: None,
            name_offset: None,
        });
        self
    }

    pub fn nobits(mut self, name: &str, flags: u64, addr: u64, size: u64) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_NOBITS,
            flags,
            addr,
            data: Vec::new(),
            size: Some(size),
            name_offset: None,
        });
        self
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn version(mut self, ident: u8, e_version: u32) -> Self {
        self.ident_version = Some(ident);
        self.e_version = Some(e_version);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for s in &self.sections {
            name_offsets.push(s.name_offset.unwrap_or(shstrtab.len() as u32));
            shstrtab.extend_from_slice(s.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let mut out = vec![0u8; EHDR_SIZE];
        let mut offsets = Vec::new();
        for s in &self.sections {
            offsets.push(out.len() as u64);
            out.extend_from_slice(&s.data);
        }
        let shstrtab_offset = out.len() as u64;
        out.extend_from_slice(&shstrtab);
        while out.len() % 8 != 0 {
            out.push(0);
        }
        let shoff = out.len() as u64;

        // Null section header.
        out.extend_from_slice(&[0u8; SHDR_SIZE]);
        for (i, s) in self.sections.iter().enumerate() {
            let size = s.size.unwrap_or(s.data.len() as u64);
            push_shdr(
                &mut out,
                name_offsets[i],
                s.sh_type,
                s.flags,
                s.addr,
                offsets[i],
                size,
            );
        }
        push_shdr(
            &mut out,
            shstrtab_name,
            SHT_STRTAB,
            0,
            0,
            shstrtab_offset,
            shstrtab.len() as u64,
        );

        let shnum = self.sections.len() as u16 + 2;
        let mut ehdr = Vec::with_capacity(EHDR_SIZE);
        ehdr.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1]);
        ehdr.push(self.ident_version.unwrap_or(1));
        ehdr.extend_from_slice(&[0; 9]);
        ehdr.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        ehdr.extend_from_slice(&2u16.to_le_bytes()); // EM_SPARC
        ehdr.extend_from_slice(&self.e_version.unwrap_or(1).to_le_bytes());
        ehdr.extend_from_slice(&0x1000u64.to_le_bytes()); // e_entry
        ehdr.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
        ehdr.extend_from_slice(&shoff.to_le_bytes());
        ehdr.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&56u16.to_le_bytes()); // e_phentsize
        ehdr.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
        ehdr.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&shnum.to_le_bytes());
        ehdr.extend_from_slice(&(shnum - 1).to_le_bytes()); // e_shstrndx
        assert_eq!(ehdr.len(), EHDR_SIZE);
        out[..EHDR_SIZE].copy_from_slice(&ehdr);
        out
    }

    pub fn write(&self) -> NamedTempFile {
        write_file(&self.build())
    }
}

pub fn write_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn push_shdr(
    out: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
) {
    out.extend_from_slice(&name.to_le_bytes());
    out.extend_from_slice(&sh_type.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&addr.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // sh_link
    out.extend_from_slice(&0u32.to_le_bytes()); // sh_info
    out.extend_from_slice(&1u64.to_le_bytes()); // sh_addralign
    out.extend_from_slice(&0u64.to_le_bytes()); // sh_entsize
}

/// Records every byte write in order.
#[derive(Default, Debug)]
pub struct Writes(pub Vec<(u64, u8)>);

impl elfstage::MemorySink for Writes {
    fn write_byte(&mut self, address: u64, value: u8) {
        self.0.push((address, value));
    }
}
