//! Import pipeline: raw dump -> normalized content -> dedup -> stored file.

use std::io::{BufRead, Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use crate::cli::ImportArgs;
use crate::detect::{self, FileSchema};
use crate::fingerprint::{self, Destination};
use crate::io_utils;
use crate::normalize::{RecordStream, split_and_clean};
use crate::store::{self, Template};

/// What an import attempt concluded. Duplicates are a user-visible no-op,
/// not an error.
#[derive(Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { name: String, rows: usize },
    Duplicate { name: String },
}

pub fn execute(args: &ImportArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let reader = io_utils::open_text_reader(&args.input, encoding)?;
    let name = resolve_source_name(args)?;
    store::ensure_store_dir(&args.store)?;

    let outcome = run_import(reader, &args.store, &name, args.keep_schema)
        .with_context(|| format!("Importing {:?}", args.input))?;
    match outcome {
        ImportOutcome::Imported { name, rows } => {
            println!("imported {name} ({rows} row(s))");
        }
        ImportOutcome::Duplicate { name } => {
            println!("duplicate of {name}, nothing written");
        }
    }
    Ok(())
}

/// Normalizes the input, decides a destination by content fingerprint, and
/// writes the file plus its sidecar template. The whole source is read
/// before anything is written, and the write itself goes through a temp
/// file, so a failed import never leaves a partial stored file behind.
pub fn run_import(
    mut reader: Box<dyn BufRead>,
    store_dir: &Path,
    desired_name: &str,
    keep_schema: bool,
) -> Result<ImportOutcome> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("reading input stream")?;

    let (content, template, rows) = if keep_schema {
        reschema_content(&text)?
    } else {
        canonical_content(&text)?
    };

    match fingerprint::resolve_destination(store_dir, desired_name, content.as_bytes()) {
        Destination::Duplicate(existing) => Ok(ImportOutcome::Duplicate {
            name: file_name(&existing),
        }),
        Destination::Fresh(path) => {
            store::write_atomic(&path, content.as_bytes())?;
            template
                .save(&path)
                .with_context(|| format!("Writing sidecar for {path:?}"))?;
            let name = file_name(&path);
            info!("stored {rows} row(s) in {name}");
            Ok(ImportOutcome::Imported { name, rows })
        }
    }
}

/// Default convention: headerless canonical `phone;name;handle;email` rows.
fn canonical_content(text: &str) -> Result<(String, Template, usize)> {
    let mut stream = RecordStream::new(Cursor::new(text.as_bytes()))?;
    info!(
        "input delimiter '{}', header: {}",
        io_utils::printable_delimiter(stream.schema().delimiter),
        stream.schema().has_header
    );
    let mut content = String::new();
    let mut rows = 0usize;
    for record in &mut stream {
        let record = record.context("normalizing input")?;
        content.push_str(&record.to_line());
        content.push('\n');
        rows += 1;
    }
    Ok((content, Template::canonical(), rows))
}

/// Schema-preserving convention: the original header plus `;`-re-delimited
/// rows, with the header's role list recorded in the sidecar.
fn reschema_content(text: &str) -> Result<(String, Template, usize)> {
    let first = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| anyhow!("input is empty"))?;

    let delimiter = detect::detect_delimiter(first);
    let header = split_and_clean(first, delimiter);
    if !detect::looks_like_header(&header) {
        // Nothing to preserve; a headerless dump normalizes as usual.
        warn!("input has no textual header, falling back to canonical output");
        return canonical_content(text);
    }

    let schema = FileSchema::from_header(delimiter, &header);
    let mut content = header.join(";");
    content.push('\n');
    let mut rows = 0usize;
    for line in text.lines().skip_while(|l| l.trim().is_empty()).skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_and_clean(line, delimiter);
        if fields.len() < header.len() {
            continue;
        }
        content.push_str(&fields[..header.len()].join(";"));
        content.push('\n');
        rows += 1;
    }
    Ok((content, Template::from_roles(&schema.roles), rows))
}

fn resolve_source_name(args: &ImportArgs) -> Result<String> {
    if let Some(name) = &args.name {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("--name must not be empty"));
        }
        return Ok(trimmed.to_string());
    }
    if io_utils::is_dash(&args.input) {
        return Ok("imported.csv".to_string());
    }
    args.input
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| anyhow!("cannot derive a file name from {:?}", args.input))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}
