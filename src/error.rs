use std::collections::TryReserveError;
use std::fmt;
use std::path::PathBuf;

/// The failure classes a load can end in.
///
/// A failed load is reported as a manifest holding a single record of
/// kind [`crate::SectionKind::Error`] carrying one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ImageNotFound,
    FormatVersionMismatch,
    SessionInitError,
    AllocationError,
    NameResolutionError,
    SectionDataError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ImageNotFound => "image not found",
            ErrorKind::FormatVersionMismatch => "ELF version mismatch",
            ErrorKind::SessionInitError => "ELF session init error",
            ErrorKind::AllocationError => "allocation error",
            ErrorKind::NameResolutionError => "name resolution error",
            ErrorKind::SectionDataError => "section data error",
        };
        f.write_str(s)
    }
}

/// All errors produced while loading an image.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Image not found: {}", path.display())]
    ImageNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported ELF version {found} (expected {expected})")]
    VersionMismatch { found: u64, expected: u64 },

    #[error("Malformed ELF image: {0}")]
    Malformed(#[source] elf::ParseError),

    #[error("Could not read image: {0}")]
    ReadImage(#[source] std::io::Error),

    #[error("Out of memory while building the manifest")]
    Allocation(#[from] TryReserveError),

    #[error("Section {index}: no name at string table offset {offset:#x}")]
    NameResolution { index: usize, offset: u32 },

    #[error("Section {index}: unreadable data: {reason}")]
    SectionData { index: usize, reason: String },
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::ImageNotFound { .. } => ErrorKind::ImageNotFound,
            LoadError::VersionMismatch { .. } => ErrorKind::FormatVersionMismatch,
            LoadError::Malformed(_) | LoadError::ReadImage(_) => ErrorKind::SessionInitError,
            LoadError::Allocation(_) => ErrorKind::AllocationError,
            LoadError::NameResolution { .. } => ErrorKind::NameResolutionError,
            LoadError::SectionData { .. } => ErrorKind::SectionDataError,
        }
    }
}
