use std::io::{self, Write};

use ansi_term::{Color, Style};

use crate::hexprinter::HexPrinter;
use crate::manifest::{Manifest, SectionKind};
use crate::memory::SparseMemory;

const BG_COLORS: [u8; 2] = [232, 236];
const CODE_FG: u8 = 2;
const DATA_FG: u8 = 4;

/// Writes one line per manifest record.
pub fn print_manifest<W: Write>(out: &mut W, manifest: &Manifest) -> io::Result<()> {
    if let Some(kind) = manifest.error() {
        return writeln!(out, "load failed: {kind}");
    }
    writeln!(
        out,
        "{:<20} {:>18} {:>10} {:>6} {:>12}",
        "name", "address", "size", "kind", "instructions"
    )?;
    for r in manifest {
        writeln!(
            out,
            "{:<20} {:#018x} {:>10} {:>6} {:>12}",
            r.name(),
            r.load_address(),
            r.size(),
            r.kind().to_string(),
            r.instruction_count()
        )?;
    }
    Ok(())
}

/// Hex-dumps every staged region as it now sits in `memory`.
pub fn dump_regions<W: Write>(
    out: W,
    manifest: &Manifest,
    memory: &SparseMemory,
    cols: u64,
    break_on_bounds: bool,
    color: bool,
) -> io::Result<W> {
    let mut printer = HexPrinter::new(out, cols, break_on_bounds, color);

    let mut regions: Vec<_> = manifest.iter().filter(|r| !r.kind().is_error()).collect();
    regions.sort_by_key(|r| (r.load_address(), r.size()));

    for (i, r) in regions.iter().enumerate() {
        let bg = BG_COLORS[i % BG_COLORS.len()];
        let fg = match r.kind() {
            SectionKind::Code => CODE_FG,
            _ => DATA_FG,
        };

        printer.set_addr(r.load_address())?;
        printer.add_label(
            format!("[{}] {}", r.name(), r.kind()),
            Style::default().fg(Color::Fixed(fg)).on(Color::Fixed(bg)),
        );
        // Regions are not dumped past the top of the address space.
        let room = (u64::MAX - r.load_address()).saturating_add(1);
        let len = r.size().min(room) as usize;
        for b in memory.read(r.load_address(), len) {
            printer.push_byte(b, fg, bg)?;
        }
        printer.bound()?;
    }
    printer.flush_line()?;
    Ok(printer.into_inner())
}
