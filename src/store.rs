//! Storage-area collaborator: stored-file enumeration, atomic writes, and
//! per-file sidecar templates.
//!
//! A sidecar (`<name>.template.json`) records the ordered role tags of a
//! stored file plus whether the file uses the headerless canonical layout.
//! Keeping the template next to the file (instead of in a flat settings
//! area) means rename and delete cannot drift apart from it.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::{Role, canonical_roles};

pub const STORE_EXTENSION: &str = "csv";
const TEMPLATE_SUFFIX: &str = ".template.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no stored file named '{0}'")]
    NotFound(String),
    #[error("a stored file named '{0}' already exists")]
    AlreadyExists(String),
    #[error("stored file names must end with .csv, got '{0}'")]
    BadName(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Ordered role tags for one stored file, fixed at import time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Template {
    pub roles: Vec<String>,
    pub canonical: bool,
}

impl Template {
    pub fn canonical() -> Self {
        Template {
            roles: canonical_roles().iter().map(|r| r.tag().to_string()).collect(),
            canonical: true,
        }
    }

    pub fn from_roles(roles: &[Role]) -> Self {
        Template {
            roles: roles.iter().map(|r| r.tag().to_string()).collect(),
            canonical: false,
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        self.roles.iter().map(|tag| Role::from_tag(tag)).collect()
    }

    pub fn path_for(stored_file: &Path) -> PathBuf {
        let name = stored_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        stored_file.with_file_name(format!("{name}{TEMPLATE_SUFFIX}"))
    }

    pub fn save(&self, stored_file: &Path) -> Result<()> {
        let path = Template::path_for(stored_file);
        let file =
            File::create(&path).with_context(|| format!("Creating template file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing template JSON")
    }

    pub fn load(stored_file: &Path) -> Result<Option<Self>> {
        let path = Template::path_for(stored_file);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).with_context(|| format!("Opening template file {path:?}"))?;
        let template = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing template JSON {path:?}"))?;
        Ok(Some(template))
    }
}

pub fn ensure_store_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating store directory {dir:?}"))
}

/// Stored `.csv` files in the directory, sorted by name so scans are
/// deterministic across runs.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Listing store directory {dir:?}"))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Reading store directory entry in {dir:?}"))?;
        let path = entry.path();
        let is_store_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(STORE_EXTENSION));
        if is_store_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Writes through a sibling temp file and renames into place, so a failed
/// import never leaves a truncated stored file behind.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{name}.tmp"));
    fs::write(&tmp, content).with_context(|| format!("Writing temporary file {tmp:?}"))?;
    fs::rename(&tmp, path).with_context(|| format!("Finalizing {path:?}"))
}

/// Renames a stored file, moving its sidecar template along with it.
pub fn rename_file(dir: &Path, from: &str, to: &str) -> Result<(), StoreError> {
    if !to.to_lowercase().ends_with(".csv") {
        return Err(StoreError::BadName(to.to_string()));
    }
    let source = dir.join(from);
    if !source.exists() {
        return Err(StoreError::NotFound(from.to_string()));
    }
    let target = dir.join(to);
    if target.exists() {
        return Err(StoreError::AlreadyExists(to.to_string()));
    }
    fs::rename(&source, &target)?;
    let source_template = Template::path_for(&source);
    if source_template.exists() {
        fs::rename(&source_template, Template::path_for(&target))?;
    }
    Ok(())
}

/// Deletes a stored file and its sidecar template, if any.
pub fn remove_file(dir: &Path, name: &str) -> Result<(), StoreError> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(StoreError::NotFound(name.to_string()));
    }
    fs::remove_file(&path)?;
    let template = Template::path_for(&path);
    if template.exists() {
        fs::remove_file(&template)?;
    }
    Ok(())
}
