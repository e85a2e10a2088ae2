//! # Listing and Redacting String Literals
//!
//! **What this example teaches:**
//! - Loading a managed image from disk
//! - Scanning every method body for `ldstr` instructions
//! - Inspecting the located `#US` entries
//! - Writing a redacted copy that keeps every byte in place
//!
//! Usage: `redact <input> [output] [--verbose]`. Without an output path the strings are only
//! listed.

use dotredact::prelude::*;
use std::{env, path::Path};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|arg| arg == "--verbose");
    let paths: Vec<&String> = args
        .iter()
        .skip(1)
        .filter(|arg| !arg.starts_with("--"))
        .collect();

    let Some(input) = paths.first() else {
        eprintln!("Usage: {} <path-to-dotnet-assembly> [output] [--verbose]", args[0]);
        eprintln!();
        eprintln!("Lists the string literals loaded by ldstr and, given an output path,");
        eprintln!("writes a copy with their UTF-16 payload overwritten.");
        return Ok(());
    };

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("dotredact", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();

    let image = CilImage::from_file(Path::new(input.as_str()))?;
    println!("Module: {}", image.module_name()?);
    println!("Runtime: {}", image.metadata_root().version);

    let config = ScanConfig::default();
    let report = scan(&image, &config);

    println!("\nString loads:");
    for load in &report.loads {
        println!(
            "  {:#010x} IL@{:#08x} #US[{:#x}] {:?}",
            load.method.value(),
            load.instruction_offset,
            load.us_offset,
            load.value
        );
    }

    if !report.is_complete() {
        println!("\nMethods that could not be scanned:");
        for failure in &report.failures {
            println!("  {:#010x}: {}", failure.token.value(), failure.error);
        }
    }

    println!(
        "\n{} loads of {} distinct strings in {} methods",
        report.loads.len(),
        report.unique().len(),
        report.methods_scanned
    );

    if let Some(output) = paths.get(1) {
        let redacted = redact(&image, &report, &config)?;
        redacted.write_to(Path::new(output.as_str()))?;
        println!(
            "Redacted {} strings ({} bytes) into {}",
            redacted.patched().len(),
            redacted.patched_bytes(),
            output
        );
    }

    Ok(())
}
