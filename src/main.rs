//! edid-tool - EDID inspection and editing tool
//!
//! Decodes 128-byte EDID records (optionally followed by one DisplayID
//! extension block), reports every field and any findings, and can
//! re-encode the record with a new display name, serial number or
//! manufacturer id.

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod edid;
mod formatter;
mod scan;
mod storage;

use edid::{Edid, display_report};
use formatter::{OutputFormat, OutputFormatter, create_formatter};
use scan::{DEFAULT_SCAN_ROOT, DisplayScanner, display_scan};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a 128- or 256-byte EDID file
    #[arg(value_name = "PATH", required_unless_present = "scan")]
    input: Option<PathBuf>,

    /// Write the re-encoded record to this path
    #[arg(long, short = 'o', value_name = "PATH")]
    out: Option<PathBuf>,

    /// Install a monitor name descriptor (up to 13 ASCII characters)
    #[arg(long, short = 'n', value_name = "TEXT", requires = "out")]
    name: Option<String>,

    /// Descriptor slot (0-3) for the monitor name
    #[arg(long, value_name = "N", requires = "name")]
    name_slot: Option<usize>,

    /// Set the serial number (decimal or 0x-prefixed hex)
    #[arg(long, short = 's', value_name = "U32", value_parser = parse_serial, requires = "out")]
    serial: Option<u32>,

    /// Set the three-letter manufacturer id
    #[arg(long, short = 'm', value_name = "ABC", requires = "out")]
    manufacturer: Option<String>,

    /// Drop the extension block when writing
    #[arg(long, requires = "out")]
    base_only: bool,

    /// Scan a directory tree for `edid` files instead of reading one record
    #[arg(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = DEFAULT_SCAN_ROOT,
        conflicts_with_all = ["input", "out"]
    )]
    scan: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', default_value = "plain")]
    format: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_serial(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid serial number {s:?}: {e}"))
}

/// One-line warning for a record with findings; the findings themselves go to the report
fn findings_summary(source: &Path, count: usize) -> Option<String> {
    (count > 0).then(|| format!("{}: {count} finding(s), see the report for details", source.display()))
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    let level = match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let output_format: OutputFormat = args.format.parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut formatter = create_formatter(output_format);
    let mut stdout = io::stdout();

    formatter.begin_document(&mut stdout)?;

    match (&args.scan, &args.input) {
        (Some(root), _) => scan_displays(root, &mut *formatter, &mut stdout)?,
        (None, Some(input)) => process_record(&args, input, &mut *formatter, &mut stdout)?,
        (None, None) => anyhow::bail!("Please specify an EDID file or --scan"),
    }

    formatter.end_document(&mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn scan_displays(root: &Path, formatter: &mut dyn OutputFormatter, writer: &mut dyn Write) -> Result<()> {
    if !root.exists() {
        anyhow::bail!("Scan path does not exist: {}", root.display());
    }

    let scanner = DisplayScanner::new()?;
    let entries = scanner.scan(root);
    info!("found {} display(s) under {}", entries.len(), root.display());

    display_scan(&entries, &root.display().to_string(), formatter, writer)?;
    Ok(())
}

fn process_record(
    args: &Args,
    input: &Path,
    formatter: &mut dyn OutputFormatter,
    writer: &mut dyn Write,
) -> Result<()> {
    let data = storage::read_all(input)?;
    let mut edid = Edid::decode(&data)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    let report = edid.parse();
    for finding in &report.findings {
        debug!("{}: {finding}", input.display());
    }
    if let Some(summary) = findings_summary(input, report.findings.len()) {
        warn!("{summary}");
    }
    display_report(&report, &input.display().to_string(), formatter, writer)?;

    let Some(out) = &args.out else {
        return Ok(());
    };

    // Mutations proceed regardless of findings
    if let Some(name) = &args.name {
        if let Some(previous) = edid.monitor_name() {
            info!("replacing display name {previous:?}");
        }
        edid.set_display_name(name, args.name_slot)
            .with_context(|| format!("Cannot set display name {name:?}"))?;
    }
    if let Some(serial) = args.serial {
        edid.set_serial_number(serial);
        info!("serial number set to {serial} (0x{serial:08x})");
    }
    if let Some(manufacturer) = &args.manufacturer {
        edid.set_manufacturer_id(manufacturer)
            .with_context(|| format!("Cannot set manufacturer id {manufacturer:?}"))?;
        info!("manufacturer id set to {manufacturer}");
    }

    let bytes = if args.base_only {
        if edid.has_extension() {
            info!("dropping the extension block");
        }
        edid.encode()
    } else {
        edid.encode_with_extension()
    };

    storage::write_all(out, &bytes)?;
    formatter.output_written(writer, &out.display().to_string(), bytes.len())?;
    Ok(())
}
