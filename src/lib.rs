//! Stages the loadable sections of an ELF image into simulated memory.
//!
//! [`extract_sections`] opens an image, copies every allocatable code and
//! writable data section to its load address through a [`MemorySink`], and
//! returns a [`Manifest`] describing what was loaded.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod handle;
pub mod hexprinter;
pub mod image;
pub mod logger;
pub mod manifest;
pub mod memory;

pub use config::{AccessMode, CountMode, LoaderConfig};
pub use error::{ErrorKind, LoadError};
pub use extract::{extract_sections, load_image, try_extract_sections};
pub use handle::ImageHandle;
pub use image::{Chunk, ElfImage, SectionDescriptor, SectionFlags, SectionSource};
pub use manifest::{Manifest, SectionKind, SectionRecord};
pub use memory::{MemorySink, SparseMemory};
