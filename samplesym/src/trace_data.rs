//! Trace files read and written by the driver
//!
//! - Events: JSON array of tagged records, in chronological order
//! - On-device symbols: JSON object `module -> {"min_vaddr", "symbols"}`
//! - Output: one `pid tid` header per sample, then one indented line per frame

use anyhow::{Context, Result};
use samplesym_common::EventRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use crate::profiling::SymbolizedSample;
use crate::symbolization::{ModuleSymbolTable, OnDeviceSymbols};

/// Parse an events file
pub fn load_events(path: impl AsRef<Path>) -> Result<Vec<EventRecord>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open events file {}", path.display()))?;
    let events: Vec<EventRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse events file {}", path.display()))?;
    Ok(events)
}

/// Parse an on-device symbols file
pub fn load_on_device_symbols(path: impl AsRef<Path>) -> Result<OnDeviceSymbols> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open symbols file {}", path.display()))?;
    let tables: HashMap<String, ModuleSymbolTable> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse symbols file {}", path.display()))?;
    Ok(tables.into_iter().collect())
}

/// Write samples in the text form
///
/// ```text
/// 1234 1235
///     foo_func+0x10 (libfoo.so)
///     [kernel] ([kernel])
/// ```
pub fn write_samples<W: Write>(writer: &mut W, samples: &[SymbolizedSample]) -> std::io::Result<()> {
    for sample in samples {
        writeln!(writer, "{} {}", sample.pid.0, sample.tid.0)?;
        for frame in &sample.frames {
            writeln!(writer, "    {frame}")?;
        }
    }
    writer.flush()
}
