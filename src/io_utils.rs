//! Input plumbing: stdin routing and character-encoding resolution.
//!
//! Contact dumps arrive in whatever encoding the source system used
//! (windows-1251 is common), so input is decoded to UTF-8 on the way in via
//! `encoding_rs`, defaulting to UTF-8. The `-` path convention routes
//! through stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Opens a file (or stdin for `-`) as a decoded, buffered text reader.
pub fn open_text_reader(path: &Path, encoding: &'static Encoding) -> Result<Box<dyn BufRead>> {
    let raw: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?)
    };
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(raw);
    Ok(Box::new(BufReader::new(decoded)))
}

pub fn printable_delimiter(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        other => other.to_string(),
    }
}
