use std::path::Path;

use crate::config::{CountMode, LoaderConfig};
use crate::error::LoadError;
use crate::handle::ImageHandle;
use crate::image::{Chunk, ElfImage, SectionDescriptor, SectionSource};
use crate::manifest::{bounded_name, Manifest, SectionKind, SectionRecord};
use crate::memory::MemorySink;

/// Bytes per staged unit.
pub const UNIT_SIZE: usize = 4;

/// Loads the image at `path` into `memory`.
///
/// Never fails outright: errors come back as a single-record manifest,
/// see [`Manifest::error`].
pub fn extract_sections<M: MemorySink + ?Sized>(
    path: impl AsRef<Path>,
    memory: &mut M,
    config: &LoaderConfig,
) -> Manifest {
    let path = path.as_ref();
    match try_extract_sections(path, memory, config) {
        Ok(manifest) => manifest,
        Err(e) => {
            log::error!("failed to load {}: {}", path.display(), e);
            Manifest::failed(e.kind())
        }
    }
}

pub fn try_extract_sections<M: MemorySink + ?Sized>(
    path: impl AsRef<Path>,
    memory: &mut M,
    config: &LoaderConfig,
) -> Result<Manifest, LoadError> {
    let mut handle = ImageHandle::acquire(path, config.access)?;
    let content = handle.read_image()?;
    let image = ElfImage::parse(&content)?.zero_fill_nobits(config.zero_fill_nobits);
    log::debug!(
        "{}: machine {:#x}, entry {:#x}",
        handle.path().display(),
        image.machine(),
        image.entry()
    );

    let manifest = load_image(&image, memory, config)?;
    log::info!(
        "loaded {} sections ({} bytes) from {}",
        manifest.len(),
        manifest.total_bytes(),
        handle.path().display()
    );
    handle.release();
    Ok(manifest)
}

struct PlannedSection<'a> {
    descriptor: SectionDescriptor,
    name: String,
    kind: SectionKind,
    chunks: Vec<Chunk<'a>>,
}

/// Stages every loadable section of `image` into `memory`.
///
/// Everything that can fail happens before the first byte is written, so an
/// error leaves `memory` untouched.
pub fn load_image<S, M>(
    image: &S,
    memory: &mut M,
    config: &LoaderConfig,
) -> Result<Manifest, LoadError>
where
    S: SectionSource + ?Sized,
    M: MemorySink + ?Sized,
{
    let plan = plan_sections(image, config)?;

    let mut records = Vec::new();
    records.try_reserve_exact(plan.len())?;

    let mut total_units = 0u64;
    for section in plan {
        let mut cursor = section.descriptor.address;
        let mut size = 0u64;
        let mut units = 0u64;
        for chunk in &section.chunks {
            units += match *chunk {
                Chunk::Bytes(bytes) => stage_chunk(bytes, &mut cursor, memory),
                Chunk::Zeros(len) => stage_zeros(len, &mut cursor, memory),
            };
            size += chunk.len();
        }
        total_units += units;

        let instruction_count = match config.count_mode {
            CountMode::PerSection => units,
            CountMode::Cumulative => total_units,
        };
        log::debug!(
            "staged {} ({}) at {:#x}: {} bytes, {} units",
            section.name,
            section.kind,
            section.descriptor.address,
            size,
            units
        );
        records.push(SectionRecord::new(
            section.name,
            section.descriptor.address,
            size,
            section.kind,
            instruction_count,
        ));
    }

    Ok(Manifest::from_records(records))
}

fn plan_sections<'a, S: SectionSource + ?Sized>(
    image: &'a S,
    config: &LoaderConfig,
) -> Result<Vec<PlannedSection<'a>>, LoadError> {
    let mut plan = Vec::new();
    let mut zero_fill = 0u64;
    for descriptor in image.sections()? {
        let Some(kind) = SectionKind::classify(descriptor.flags) else {
            log::trace!(
                "skipping section {} (flags {:#x})",
                descriptor.index,
                descriptor.flags.bits()
            );
            continue;
        };
        let name = bounded_name(image.section_name(&descriptor)?)?;
        let chunks = image.section_chunks(&descriptor)?;

        for chunk in &chunks {
            if let Chunk::Zeros(len) = chunk {
                zero_fill = zero_fill.saturating_add(*len);
            }
        }
        if zero_fill > config.max_zero_fill {
            return Err(LoadError::SectionData {
                index: descriptor.index,
                reason: format!(
                    "zero fill of {} bytes exceeds the limit of {}",
                    zero_fill, config.max_zero_fill
                ),
            });
        }

        plan.try_reserve(1)?;
        plan.push(PlannedSection {
            descriptor,
            name,
            kind,
            chunks,
        });
    }
    Ok(plan)
}

/// Copies one chunk to consecutive addresses starting at `cursor`, a unit at
/// a time. Returns the number of complete units written; a trailing partial
/// unit is written byte by byte and not counted.
pub fn stage_chunk<M: MemorySink + ?Sized>(
    chunk: &[u8],
    cursor: &mut u64,
    memory: &mut M,
) -> u64 {
    let mut units = 0;
    let mut words = chunk.chunks_exact(UNIT_SIZE);
    for word in &mut words {
        for &byte in word {
            memory.write_byte(*cursor, byte);
            *cursor = cursor.wrapping_add(1);
        }
        units += 1;
    }
    for &byte in words.remainder() {
        memory.write_byte(*cursor, byte);
        *cursor = cursor.wrapping_add(1);
    }
    units
}

/// Like [`stage_chunk`] for `len` zero bytes, generated as they are written.
pub fn stage_zeros<M: MemorySink + ?Sized>(
    len: u64,
    cursor: &mut u64,
    memory: &mut M,
) -> u64 {
    for _ in 0..len {
        memory.write_byte(*cursor, 0);
        *cursor = cursor.wrapping_add(1);
    }
    len / UNIT_SIZE as u64
}
