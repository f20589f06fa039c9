//! Helpers for annotation files and database files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::io::{self, BufRead, BufReader};

use flate2::bufread::MultiGzDecoder;

//-----------------------------------------------------------------------------

/// Returns the path to a fixture file in `test-data`.
pub fn get_test_data(filename: &'static str) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "test-data", filename].iter().collect()
}

//-----------------------------------------------------------------------------

// Database files stay well below a TiB.
const SIZE_UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Formats a byte count for log messages, e.g. `1.500 KiB`.
pub fn human_readable_size(bytes: usize) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.3} {}", value, SIZE_UNITS[unit])
}

/// Returns the size of a database or annotation file in human-readable form.
///
/// Returns [`None`] if the file cannot be accessed.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    fs::metadata(filename).ok().map(|metadata| human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    filename.as_ref().exists()
}

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Opens an annotation or sequence file for line-by-line reading.
///
/// Gzip compression is detected from the first bytes of the file rather than from the extension.
pub fn open_file<P: AsRef<Path>>(filename: P) -> io::Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(File::open(filename)?);
    let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if compressed {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
