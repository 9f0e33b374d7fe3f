//! Turns a raw text stream into a sequence of canonical contact records.

use std::io::{BufRead, Lines};

use anyhow::{Context, Result, anyhow};

use crate::classify;
use crate::detect::{self, FileSchema, Role};

/// One normalized contact row. Exactly one value per role, possibly empty,
/// never null. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub phone: String,
    pub name: String,
    pub handle: String,
    pub email: String,
}

impl Record {
    /// Canonical storage form: `phone;name;handle;email`, no header.
    pub fn to_line(&self) -> String {
        format!("{};{};{};{}", self.phone, self.name, self.handle, self.email)
    }
}

/// Trims a field and strips one pair of bounding quote characters.
pub fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn split_and_clean(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(clean_field).collect()
}

/// Lazy, forward-only record sequence over a text stream.
///
/// The delimiter and layout are decided once from the first non-empty line:
/// a textual header yields a role-mapped schema, anything else is treated as
/// headerless fixed-arity data. A read error on the underlying stream ends
/// the sequence after yielding the error; records already produced stand,
/// and the caller must treat the short sequence as an incomplete import.
pub struct RecordStream<R: BufRead> {
    lines: Lines<R>,
    schema: FileSchema,
    pending: Option<String>,
    done: bool,
}

impl<R: BufRead> RecordStream<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let first = loop {
            match lines.next() {
                None => return Err(anyhow!("input is empty")),
                Some(line) => {
                    let line = line.context("reading first line of input")?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
            }
        };

        let delimiter = detect::detect_delimiter(&first);
        let fields = split_and_clean(&first, delimiter);
        let (schema, pending) = if detect::looks_like_header(&fields) {
            (FileSchema::from_header(delimiter, &fields), None)
        } else {
            (FileSchema::canonical(delimiter), Some(first))
        };

        Ok(RecordStream {
            lines,
            schema,
            pending,
            done: false,
        })
    }

    pub fn schema(&self) -> &FileSchema {
        &self.schema
    }

    /// Maps one data line to a record, or `None` for skippable rows.
    fn record_from_line(&self, line: &str) -> Option<Record> {
        let fields = split_and_clean(line, self.schema.delimiter);
        if self.schema.has_header {
            if fields.len() < self.schema.roles.len() {
                return None;
            }
            let pick = |role: Role| {
                self.schema
                    .role_index(&role)
                    .map(|idx| fields[idx].clone())
                    .unwrap_or_default()
            };
            Some(Record {
                phone: pick(Role::Phone),
                name: pick(Role::Name),
                handle: pick(Role::Handle),
                email: pick(Role::Email),
            })
        } else {
            let fields: [String; 4] = fields.try_into().ok()?;
            Some(classify::classify_row(line, fields))
        }
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(line) = self.pending.take() {
            if let Some(record) = self.record_from_line(&line) {
                return Some(Ok(record));
            }
        }
        loop {
            match self.lines.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(anyhow::Error::from(err).context("reading input stream")));
                }
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match self.record_from_line(&line) {
                        Some(record) => return Some(Ok(record)),
                        None => continue,
                    }
                }
            }
        }
    }
}
