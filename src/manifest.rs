use std::collections::TryReserveError;
use std::fmt;

use crate::error::ErrorKind;
use crate::image::SectionFlags;

/// Longest section name kept in a record, in bytes.
pub const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Code,
    Data,
    Error(ErrorKind),
}

impl SectionKind {
    /// Classifies a section by its flags; `None` means it is not loaded.
    pub fn classify(flags: SectionFlags) -> Option<Self> {
        if !flags.contains(SectionFlags::ALLOC) {
            None
        } else if flags.contains(SectionFlags::EXECINSTR) {
            Some(SectionKind::Code)
        } else if flags.contains(SectionFlags::WRITE) {
            Some(SectionKind::Data)
        } else {
            None
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SectionKind::Error(_))
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Code => f.write_str("code"),
            SectionKind::Data => f.write_str("data"),
            SectionKind::Error(kind) => write!(f, "error: {kind}"),
        }
    }
}

/// One loaded section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    name: String,
    load_address: u64,
    size: u64,
    kind: SectionKind,
    instruction_count: u64,
}

impl SectionRecord {
    pub(crate) fn new(
        name: String,
        load_address: u64,
        size: u64,
        kind: SectionKind,
        instruction_count: u64,
    ) -> Self {
        Self {
            name,
            load_address,
            size,
            kind,
            instruction_count,
        }
    }

    fn error(kind: ErrorKind) -> Self {
        Self {
            name: String::new(),
            load_address: 0,
            size: 0,
            kind: SectionKind::Error(kind),
            instruction_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load_address(&self) -> u64 {
        self.load_address
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }
}

/// Copies a section name, cut to [`MAX_NAME_LEN`], without aborting on allocation failure.
pub(crate) fn bounded_name(name: &str) -> Result<String, TryReserveError> {
    let name = truncate_name(name);
    let mut owned = String::new();
    owned.try_reserve_exact(name.len())?;
    owned.push_str(name);
    Ok(owned)
}

fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// The ordered records produced by one load.
///
/// A failed load yields a manifest with exactly one record whose kind is
/// [`SectionKind::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    records: Vec<SectionRecord>,
}

impl Manifest {
    pub(crate) fn from_records(records: Vec<SectionRecord>) -> Self {
        Self { records }
    }

    pub fn failed(kind: ErrorKind) -> Self {
        Self {
            records: vec![SectionRecord::error(kind)],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SectionRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectionRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[SectionRecord] {
        &self.records
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self.records.as_slice() {
            [record] => match record.kind {
                SectionKind::Error(kind) => Some(kind),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }

    pub fn code_sections(&self) -> impl Iterator<Item = &SectionRecord> {
        self.iter().filter(|r| r.kind == SectionKind::Code)
    }

    pub fn data_sections(&self) -> impl Iterator<Item = &SectionRecord> {
        self.iter().filter(|r| r.kind == SectionKind::Data)
    }

    /// Bytes staged across all records.
    pub fn total_bytes(&self) -> u64 {
        self.iter().map(|r| r.size).sum()
    }
}

impl IntoIterator for Manifest {
    type Item = SectionRecord;
    type IntoIter = std::vec::IntoIter<SectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a SectionRecord;
    type IntoIter = std::slice::Iter<'a, SectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
