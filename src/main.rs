use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use elfstage::app::{dump_regions, print_manifest};
use elfstage::config::DEFAULT_MAX_ZERO_FILL;
use elfstage::{extract_sections, logger, AccessMode, CountMode, LoaderConfig, SparseMemory};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    filename: String,

    /// Bytes per line
    #[arg(short, default_value = "16")]
    cols: u64,

    /// Break on section boundaries
    #[arg(short, long)]
    break_on_bounds: bool,

    /// Hex-dump the staged sections
    #[arg(short = 'x', long)]
    hexdump: bool,

    /// Open the image without write access
    #[arg(long)]
    read_only: bool,

    /// Report a running instruction total instead of per-section counts
    #[arg(long)]
    cumulative_count: bool,

    /// Leave NOBITS sections (.bss) unstaged
    #[arg(long)]
    no_zero_fill: bool,

    /// Most bytes of NOBITS zero fill allowed in one load
    #[arg(long, default_value_t = DEFAULT_MAX_ZERO_FILL)]
    max_zero_fill: u64,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// More logging (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> LoaderConfig {
        LoaderConfig::default()
            .access(if self.read_only {
                AccessMode::ReadOnly
            } else {
                AccessMode::ReadWrite
            })
            .count_mode(if self.cumulative_count {
                CountMode::Cumulative
            } else {
                CountMode::PerSection
            })
            .zero_fill_nobits(!self.no_zero_fill)
            .max_zero_fill(self.max_zero_fill)
    }
}

fn run(args: &Args) -> io::Result<bool> {
    let mut memory = SparseMemory::new();
    let manifest = extract_sections(&args.filename, &mut memory, &args.config());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_manifest(&mut out, &manifest)?;
    if manifest.is_failure() {
        return Ok(false);
    }
    if args.hexdump {
        writeln!(out)?;
        dump_regions(
            &mut out,
            &manifest,
            &memory,
            args.cols,
            args.break_on_bounds,
            !args.no_color,
        )?;
    }
    Ok(true)
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("elfstage: {e}");
            ExitCode::FAILURE
        }
    }
}
