use bitflags::bitflags;
use elf::abi::{EV_CURRENT, SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHT_NOBITS};
use elf::endian::AnyEndian;
use elf::section::SectionHeader;
use elf::string_table::StringTable;
use elf::{ElfBytes, ParseError};

use crate::error::LoadError;

bitflags! {
    /// The `sh_flags` bits the loader looks at. Other bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        const WRITE = SHF_WRITE as u64;
        const ALLOC = SHF_ALLOC as u64;
        const EXECINSTR = SHF_EXECINSTR as u64;
    }
}

/// Header fields of one section, in image order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub index: usize,
    pub name_offset: u32,
    pub section_type: u32,
    pub flags: SectionFlags,
    pub address: u64,
    pub size: u64,
}

/// One piece of a section's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    Bytes(&'a [u8]),
    /// A run of zeros with no backing bytes in the file.
    Zeros(u64),
}

impl Chunk<'_> {
    pub fn len(&self) -> u64 {
        match self {
            Chunk::Bytes(bytes) => bytes.len() as u64,
            Chunk::Zeros(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read access to the sections of a binary image.
pub trait SectionSource {
    fn sections(&self) -> Result<Vec<SectionDescriptor>, LoadError>;

    fn section_name(&self, section: &SectionDescriptor) -> Result<&str, LoadError>;

    /// Raw payload of a section. It may arrive split over several chunks.
    fn section_chunks(&self, section: &SectionDescriptor) -> Result<Vec<Chunk<'_>>, LoadError>;
}

/// An ELF file parsed from an in-memory image.
pub struct ElfImage<'data> {
    file: ElfBytes<'data, AnyEndian>,
    headers: Vec<SectionHeader>,
    strtab: Option<StringTable<'data>>,
    zero_fill_nobits: bool,
}

impl<'data> ElfImage<'data> {
    pub fn parse(content: &'data [u8]) -> Result<Self, LoadError> {
        let file = ElfBytes::<AnyEndian>::minimal_parse(content).map_err(|e| match e {
            ParseError::UnsupportedVersion((found, expected)) => {
                LoadError::VersionMismatch { found, expected }
            }
            e => LoadError::Malformed(e),
        })?;

        let expected = u32::from(EV_CURRENT);
        if file.ehdr.version != expected {
            return Err(LoadError::VersionMismatch {
                found: u64::from(file.ehdr.version),
                expected: u64::from(expected),
            });
        }

        let (shdrs, strtab) = file
            .section_headers_with_strtab()
            .map_err(LoadError::Malformed)?;
        let headers: Vec<SectionHeader> = shdrs.map(|t| t.iter().collect()).unwrap_or_default();

        Ok(Self {
            file,
            headers,
            strtab,
            zero_fill_nobits: true,
        })
    }

    pub fn zero_fill_nobits(mut self, zero_fill: bool) -> Self {
        self.zero_fill_nobits = zero_fill;
        self
    }

    pub fn entry(&self) -> u64 {
        self.file.ehdr.e_entry
    }

    pub fn machine(&self) -> u16 {
        self.file.ehdr.e_machine
    }

    fn header(&self, section: &SectionDescriptor) -> Result<&SectionHeader, LoadError> {
        self.headers
            .get(section.index)
            .ok_or_else(|| LoadError::SectionData {
                index: section.index,
                reason: "no such section header".to_string(),
            })
    }
}

impl SectionSource for ElfImage<'_> {
    fn sections(&self) -> Result<Vec<SectionDescriptor>, LoadError> {
        // Index 0 is the reserved null header.
        Ok(self
            .headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, s)| SectionDescriptor {
                index,
                name_offset: s.sh_name,
                section_type: s.sh_type,
                flags: SectionFlags::from_bits_retain(s.sh_flags),
                address: s.sh_addr,
                size: s.sh_size,
            })
            .collect())
    }

    fn section_name(&self, section: &SectionDescriptor) -> Result<&str, LoadError> {
        let err = || LoadError::NameResolution {
            index: section.index,
            offset: section.name_offset,
        };
        let strtab = self.strtab.as_ref().ok_or_else(err)?;
        strtab.get(section.name_offset as usize).map_err(|_| err())
    }

    fn section_chunks(&self, section: &SectionDescriptor) -> Result<Vec<Chunk<'_>>, LoadError> {
        let shdr = self.header(section)?;

        if shdr.sh_type == SHT_NOBITS {
            if !self.zero_fill_nobits || shdr.sh_size == 0 {
                return Ok(Vec::new());
            }
            return Ok(vec![Chunk::Zeros(shdr.sh_size)]);
        }

        let (data, compression) =
            self.file
                .section_data(shdr)
                .map_err(|e| LoadError::SectionData {
                    index: section.index,
                    reason: e.to_string(),
                })?;
        if compression.is_some() {
            return Err(LoadError::SectionData {
                index: section.index,
                reason: "compressed sections cannot be staged".to_string(),
            });
        }
        if data.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Chunk::Bytes(data)])
    }
}
