//! Content fingerprints for import deduplication.
//!
//! Fingerprints are hex SHA-256 digests used only for equality comparison
//! during an import decision; they are never persisted. The comparison basis
//! is the exact byte content to be written versus the raw bytes of existing
//! stored files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use sha2::{Digest, Sha256};

const HASH_BUFFER_SIZE: usize = 8192;

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn fingerprint_file(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Opening {path:?} for hashing"))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];
    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("Reading {path:?} for hashing"))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Where an import should land.
#[derive(Debug, PartialEq, Eq)]
pub enum Destination {
    /// No stored file with this content; write to the given path.
    Fresh(PathBuf),
    /// Byte-identical content already stored under the given path.
    Duplicate(PathBuf),
}

/// Picks a destination for `content` under `desired_name` in `dir`.
///
/// The desired name is the first candidate (`.csv` appended if missing).
/// While a candidate exists, its digest is compared with the new content:
/// equal means duplicate, different means try `base_1.csv`, `base_2.csv`,
/// and so on. An existing file that cannot be read is treated as
/// not-a-duplicate and the suffix search continues, so differing content is
/// never overwritten and an unreadable file never blocks an import.
pub fn resolve_destination(dir: &Path, desired_name: &str, content: &[u8]) -> Destination {
    let file_name = ensure_csv_extension(desired_name);
    let base = file_name
        .strip_suffix(".csv")
        .unwrap_or(&file_name)
        .to_string();
    let new_hash = fingerprint_bytes(content);

    let mut candidate = dir.join(&file_name);
    let mut counter = 1usize;
    while candidate.exists() {
        match fingerprint_file(&candidate) {
            Ok(existing) if existing == new_hash => {
                debug!("content matches {candidate:?}");
                return Destination::Duplicate(candidate);
            }
            Ok(_) => {}
            Err(err) => {
                warn!("cannot hash {candidate:?}, treating as distinct: {err:#}");
            }
        }
        candidate = dir.join(format!("{base}_{counter}.csv"));
        counter += 1;
    }
    Destination::Fresh(candidate)
}

pub fn ensure_csv_extension(name: &str) -> String {
    if name.to_lowercase().ends_with(".csv") {
        name.to_string()
    } else {
        format!("{name}.csv")
    }
}
