//! String load scanning and in-place `#US` redaction.
//!
//! [`scan`] walks the code of every located method body, collects each `ldstr` instruction and
//! resolves its token against the `#US` heap. The result is a [`ScanReport`] with one
//! [`StringLoad`] per instruction, plus the methods that could not be scanned.
//!
//! [`redact`] and [`redact_where`] then overwrite the UTF-16 payload of the selected entries in
//! a copy of the image. The compressed length prefix and the trailing flag byte are left as
//! they are, so no other byte of the file moves and every heap offset stays valid.
//!
//! # Example
//!
//! ```rust,no_run
//! use dotredact::{redaction::{redact, scan, ScanConfig}, CilImage};
//!
//! let image = CilImage::from_file("HelloWorld.exe".as_ref())?;
//! let config = ScanConfig::default();
//!
//! let report = scan(&image, &config);
//! for load in &report.loads {
//!     println!("{:#010x} IL at {:#x}: {:?}", load.method.value(), load.instruction_offset, load.value);
//! }
//!
//! let redacted = redact(&image, &report, &config)?;
//! redacted.write_to("HelloWorld.redacted.exe".as_ref())?;
//! # Ok::<(), dotredact::Error>(())
//! ```

mod config;

use std::{collections::BTreeMap, ops::Range, path::Path};

use rayon::prelude::*;

pub use config::ScanConfig;

use crate::{
    disassembler::scan_ldstr,
    metadata::{
        cilimage::CilImage,
        method::{MethodCode, MethodFailure},
        streams::UserStrings,
        token::Token,
    },
    Result,
};

/// One `ldstr` instruction and the `#US` entry it loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLoad {
    /// MethodDef row id of the containing method
    pub rid: u32,
    /// MethodDef token of the containing method
    pub method: Token,
    /// File offset of the `ldstr` opcode
    pub instruction_offset: usize,
    /// The string token operand
    pub token: Token,
    /// Offset of the entry within the `#US` heap
    pub us_offset: u32,
    /// File range of the UTF-16 payload
    pub payload: Range<usize>,
    /// The trailing flag byte of the entry
    pub flag: Option<u8>,
    /// The decoded string
    pub value: String,
}

/// Result of scanning all method bodies of an image
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Every `ldstr` found, in method order and code order within a method
    pub loads: Vec<StringLoad>,
    /// Methods that could not be located or scanned
    pub failures: Vec<MethodFailure>,
    /// Number of methods whose code was scanned successfully
    pub methods_scanned: usize,
    /// Number of methods with RVA 0 or native, OPTIL or runtime code
    pub methods_without_body: usize,
}

impl ScanReport {
    /// Returns true if every method with a body was scanned
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The loaded strings, one per distinct `#US` entry, in heap order
    #[must_use]
    pub fn unique(&self) -> Vec<&StringLoad> {
        let mut entries = BTreeMap::new();
        for load in &self.loads {
            entries.entry(load.us_offset).or_insert(load);
        }

        entries.into_values().collect()
    }
}

/// Scan every method body of `image` for `ldstr` instructions
///
/// Problems with a single method, such as an invalid header, an undefined opcode or a token
/// that does not resolve to the start of a `#US` entry, are recorded in [`ScanReport::failures`]. Loads already found in that
/// method are discarded.
#[must_use]
pub fn scan(image: &CilImage, config: &ScanConfig) -> ScanReport {
    let bodies = image.method_bodies();
    let heap = image.userstrings();
    let heap_start = image.stream_range("#US").map_or(0, |range| range.start);
    let entries = heap.as_ref().map(entry_offsets).unwrap_or_default();

    let scan_one = |code: &MethodCode| {
        scan_method(image, code, heap.as_ref(), heap_start, &entries, config)
    };
    let results: Vec<Result<Vec<StringLoad>>> = if config.parallel {
        bodies.bodies.par_iter().map(scan_one).collect()
    } else {
        bodies.bodies.iter().map(scan_one).collect()
    };

    let mut report = ScanReport {
        failures: bodies.failures,
        methods_without_body: bodies.without_body,
        ..ScanReport::default()
    };

    for (code, result) in bodies.bodies.iter().zip(results) {
        match result {
            Ok(loads) => {
                report.methods_scanned += 1;
                report.loads.extend(loads);
            }
            Err(error) => {
                log::warn!(
                    "Method {} (token {:#010x}) could not be scanned - {}",
                    code.rid,
                    code.token.value(),
                    error
                );
                report.failures.push(MethodFailure {
                    rid: code.rid,
                    token: code.token,
                    error,
                });
            }
        }
    }
    report.failures.sort_by_key(|failure| failure.rid);

    log::info!(
        "Scanned {} methods: {} string loads, {} distinct strings, {} failures",
        report.methods_scanned,
        report.loads.len(),
        report.unique().len(),
        report.failures.len()
    );

    report
}

/// Offsets of the entries found by walking the `#US` heap from the start
///
/// The walk stops at the first undecodable entry; nothing behind it can be located.
fn entry_offsets(heap: &UserStrings) -> Vec<usize> {
    let mut offsets = Vec::new();
    for entry in heap.iter() {
        match entry {
            Ok(entry) => offsets.push(entry.offset),
            Err(error) => {
                log::warn!(
                    "#US heap walk stopped after {} entries - {}",
                    offsets.len(),
                    error
                );
                break;
            }
        }
    }

    offsets
}

fn scan_method(
    image: &CilImage,
    code: &MethodCode,
    heap: Option<&UserStrings>,
    heap_start: usize,
    entries: &[usize],
    config: &ScanConfig,
) -> Result<Vec<StringLoad>> {
    let range = code.code_range();
    let sites = scan_ldstr(image.file().data_slice(range.start, range.len())?)?;

    let mut loads = Vec::with_capacity(sites.len());
    for site in sites {
        let instruction_offset = range.start + site.offset;

        if !site.token.is_user_string() {
            if config.skip_invalid_tokens {
                log::debug!(
                    "Skipping ldstr at {:#x} with token {:#010x}",
                    instruction_offset,
                    site.token.value()
                );
                continue;
            }

            return Err(malformed_error!(
                "ldstr at offset {:#x} has token {:#010x}, which is not a #US reference",
                instruction_offset,
                site.token.value()
            ));
        }

        let Some(heap) = heap else {
            return Err(malformed_error!(
                "ldstr at offset {:#x} but the image has no #US heap",
                instruction_offset
            ));
        };

        let us_offset = site.token.row();
        let entry = heap.get(us_offset as usize)?;
        if entries.binary_search(&entry.offset).is_err() {
            return Err(malformed_error!(
                "ldstr at offset {:#x} has token {:#010x}, which points inside a #US entry",
                instruction_offset,
                site.token.value()
            ));
        }

        let payload = entry.payload_range();

        loads.push(StringLoad {
            rid: code.rid,
            method: code.token,
            instruction_offset,
            token: site.token,
            us_offset,
            payload: heap_start + payload.start..heap_start + payload.end,
            flag: entry.flag,
            value: entry.to_string_lossy(),
        });
    }

    Ok(loads)
}

/// Redact every string found by `report`
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if a payload range does not lie within the image
pub fn redact(image: &CilImage, report: &ScanReport, config: &ScanConfig) -> Result<RedactedImage> {
    redact_where(image, report, config, |_| true)
}

/// Redact the strings of `report` accepted by `predicate`
///
/// Each `#US` entry is overwritten once, however many instructions load it. Entries are
/// selected if any of their loads is accepted.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if a payload range does not lie within the image
pub fn redact_where<F>(
    image: &CilImage,
    report: &ScanReport,
    config: &ScanConfig,
    predicate: F,
) -> Result<RedactedImage>
where
    F: Fn(&StringLoad) -> bool,
{
    let mut targets = BTreeMap::new();
    for load in report.loads.iter().filter(|load| predicate(load)) {
        targets
            .entry(load.us_offset)
            .or_insert_with(|| load.payload.clone());
    }

    let mut redacted = RedactedImage::new(image.data().to_vec());
    for payload in targets.into_values() {
        redacted.fill(payload, config.filler)?;
    }

    log::info!(
        "Redacted {} strings, {} bytes overwritten with {:#04x}",
        redacted.patched().len(),
        redacted.patched_bytes(),
        config.filler
    );

    Ok(redacted)
}

/// A copy of an image with string payloads overwritten
///
/// The buffer always has the length of the input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedImage {
    data: Vec<u8>,
    patched: Vec<Range<usize>>,
}

impl RedactedImage {
    /// Wrap a copy of the image bytes
    #[must_use]
    pub fn new(data: Vec<u8>) -> RedactedImage {
        RedactedImage {
            data,
            patched: Vec::new(),
        }
    }

    /// Overwrite `range` with `filler`
    ///
    /// Filling an already filled range again leaves the buffer unchanged.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `range` does not lie within the buffer
    pub fn fill(&mut self, range: Range<usize>, filler: u8) -> Result<()> {
        let available = self.data.len();
        let Some(bytes) = self.data.get_mut(range.clone()) else {
            return Err(out_of_bounds_error!(range.start, range.len(), available));
        };

        bytes.fill(filler);
        if !self.patched.contains(&range) {
            self.patched.push(range);
        }

        Ok(())
    }

    /// The redacted image bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the redacted image bytes
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// The ranges overwritten so far
    #[must_use]
    pub fn patched(&self) -> &[Range<usize>] {
        &self.patched
    }

    /// Number of bytes overwritten so far
    #[must_use]
    pub fn patched_bytes(&self) -> usize {
        self.patched.iter().map(ExactSizeIterator::len).sum()
    }

    /// Write the whole image to `path`
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be written
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.data)?;
        log::info!("Wrote {} bytes to {}", self.data.len(), path.display());

        Ok(())
    }
}
