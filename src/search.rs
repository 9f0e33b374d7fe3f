//! Cancellable, field-aware substring search across the stored corpus.
//!
//! The engine is a linear multi-file scan with no index: files are read in
//! name order, rows in stream order, and result blocks preserve that order.
//! A cooperative cancel flag is checked between files and between rows.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use log::{debug, warn};

use crate::detect::{self, FileSchema, Role};
use crate::normalize::split_and_clean;
use crate::query::{self, QueryKind};
use crate::store::{self, Template};

pub const PAGE_SIZE: usize = 20;
pub const MISSING_PLACEHOLDER: &str = "missing";

/// Ordered result blocks accumulated by one completed scan.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    blocks: Vec<String>,
}

impl SearchResults {
    pub fn from_blocks(blocks: Vec<String>) -> Self {
        SearchResults { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Fixed-size slice of the results. Pages past the end are empty and
    /// carry `has_more: false`.
    pub fn page(&self, page: usize, page_size: usize) -> Page {
        let from = page.saturating_mul(page_size).min(self.blocks.len());
        let to = from.saturating_add(page_size).min(self.blocks.len());
        Page {
            blocks: self.blocks[from..to].to_vec(),
            has_more: to < self.blocks.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub blocks: Vec<String>,
    pub has_more: bool,
}

/// Outcome of one scan invocation. A cancelled scan discards whatever it
/// had collected and reports `Stopped` rather than a partial result set.
#[derive(Debug)]
pub enum SearchOutcome {
    Completed(SearchResults),
    Stopped,
}

enum FileScan {
    Blocks(Vec<String>),
    Cancelled,
}

/// Scans every stored file for the query. One unreadable file contributes a
/// single error block and never stops the scan of the remaining files.
pub fn scan(
    store_dir: &Path,
    query: &str,
    kind: QueryKind,
    cancel: &AtomicBool,
) -> Result<SearchOutcome> {
    let files = store::list_files(store_dir)?;
    let mut blocks = Vec::new();
    for path in files {
        if cancel.load(Ordering::Relaxed) {
            return Ok(SearchOutcome::Stopped);
        }
        let name = file_name(&path);
        match scan_file(&path, query, kind, cancel) {
            Ok(FileScan::Cancelled) => return Ok(SearchOutcome::Stopped),
            Ok(FileScan::Blocks(file_blocks)) => {
                debug!("{name}: {} match(es)", file_blocks.len());
                blocks.extend(file_blocks);
            }
            Err(err) => {
                warn!("{name}: {err:#}");
                blocks.push(format!("read error: {name}"));
            }
        }
    }
    Ok(SearchOutcome::Completed(SearchResults::from_blocks(blocks)))
}

fn scan_file(path: &Path, query: &str, kind: QueryKind, cancel: &AtomicBool) -> Result<FileScan> {
    let template = match Template::load(path) {
        Ok(template) => template,
        Err(err) => {
            warn!("ignoring unreadable template for {path:?}: {err:#}");
            None
        }
    };

    let file = std::fs::File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let first = match lines.next() {
        None => return Ok(FileScan::Blocks(Vec::new())),
        Some(line) => line?,
    };

    let delimiter = detect::detect_delimiter(&first);
    let (schema, first_is_data) = match template {
        Some(template) => {
            let canonical = template.canonical;
            let schema = FileSchema {
                delimiter,
                roles: template.roles(),
                has_header: !canonical,
            };
            (schema, canonical)
        }
        None => {
            let fields = split_and_clean(&first, delimiter);
            if detect::looks_like_header(&fields) {
                (FileSchema::from_header(delimiter, &fields), false)
            } else {
                (FileSchema::canonical(delimiter), true)
            }
        }
    };

    let target = target_index(&schema, kind);
    let matcher = RowMatcher::new(query, kind, target);
    let name = file_name(path);

    let mut blocks = Vec::new();
    let mut consider = |line: &str| {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        let fields = split_and_clean(trimmed, schema.delimiter);
        if fields.len() < schema.roles.len() {
            return;
        }
        if matcher.matches(&fields) {
            blocks.push(format_block(&name, &schema.roles, &fields));
        }
    };

    if first_is_data {
        consider(&first);
    }
    for line in lines {
        if cancel.load(Ordering::Relaxed) {
            return Ok(FileScan::Cancelled);
        }
        consider(&line?);
    }
    Ok(FileScan::Blocks(blocks))
}

fn target_index(schema: &FileSchema, kind: QueryKind) -> Option<usize> {
    let role = match kind {
        QueryKind::Phone => Role::Phone,
        QueryKind::Email => Role::Email,
        QueryKind::Handle => Role::Handle,
        QueryKind::Name => Role::Name,
        QueryKind::All => return None,
    };
    schema.role_index(&role)
}

struct RowMatcher {
    query: String,
    query_lower: String,
    literal: bool,
    target: Option<usize>,
}

impl RowMatcher {
    fn new(query: &str, kind: QueryKind, target: Option<usize>) -> Self {
        RowMatcher {
            query: query.to_string(),
            query_lower: query.to_lowercase(),
            // Phone queries are digit-only, so case folding is pointless.
            literal: kind == QueryKind::Phone,
            target,
        }
    }

    fn field_matches(&self, value: &str) -> bool {
        if self.literal {
            value.contains(&self.query)
        } else {
            value.to_lowercase().contains(&self.query_lower)
        }
    }

    /// Targeted match when the role's column is known for this file,
    /// whole-row match otherwise.
    fn matches(&self, fields: &[String]) -> bool {
        match self.target {
            Some(idx) => fields.get(idx).is_some_and(|v| self.field_matches(v)),
            None => fields.iter().any(|v| self.field_matches(v)),
        }
    }
}

fn format_block(file_name: &str, roles: &[Role], fields: &[String]) -> String {
    let mut out = format!("File: {file_name}");
    for (role, value) in roles.iter().zip(fields.iter()) {
        let shown = if value.is_empty() {
            MISSING_PLACEHOLDER
        } else {
            value.as_str()
        };
        out.push_str(&format!("\n{}: {}", role.tag(), shown));
    }
    out
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unnamed>")
        .to_string()
}

/// Owns the one in-flight search worker. Starting a new search first
/// requests cancellation of the old one and waits for it to observe the
/// flag, so two scans never run concurrently.
pub struct Searcher {
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<SearchOutcome>>>,
}

impl Default for Searcher {
    fn default() -> Self {
        Searcher::new()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Searcher {
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn start(&mut self, store_dir: &Path, query: &str) {
        self.cancel();
        let flag = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&flag);
        let dir: PathBuf = store_dir.to_path_buf();
        let query = query.to_string();
        self.worker = Some(thread::spawn(move || {
            let kind = query::classify(&query);
            scan(&dir, &query, kind, &flag)
        }));
    }

    /// Requests cancellation and waits for the worker to stop.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.cancel.store(true, Ordering::Relaxed);
            let _ = handle.join();
        }
    }

    /// Waits for the running search and returns its outcome.
    pub fn finish(&mut self) -> Result<SearchOutcome> {
        match self.worker.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("search worker panicked"))?,
            None => Ok(SearchOutcome::Completed(SearchResults::default())),
        }
    }
}

impl Drop for Searcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_store_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).expect("write store file");
    }

    fn run(dir: &Path, query: &str) -> SearchResults {
        let cancel = AtomicBool::new(false);
        match scan(dir, query, query::classify(query), &cancel).expect("scan") {
            SearchOutcome::Completed(results) => results,
            SearchOutcome::Stopped => panic!("unexpected stop"),
        }
    }

    #[test]
    fn pagination_slices_45_results_into_three_pages() {
        let blocks = (0..45).map(|i| format!("block {i}")).collect();
        let results = SearchResults::from_blocks(blocks);
        let first = results.page(0, PAGE_SIZE);
        assert_eq!(first.blocks.len(), 20);
        assert!(first.has_more);
        let second = results.page(1, PAGE_SIZE);
        assert_eq!(second.blocks.len(), 20);
        assert!(second.has_more);
        let third = results.page(2, PAGE_SIZE);
        assert_eq!(third.blocks.len(), 5);
        assert!(!third.has_more);
        let past_end = results.page(3, PAGE_SIZE);
        assert!(past_end.blocks.is_empty());
        assert!(!past_end.has_more);
    }

    #[test]
    fn phone_query_targets_only_the_phone_column() {
        let dir = tempdir().expect("temp dir");
        write_store_file(
            dir.path(),
            "dump.csv",
            "tel;name\n555123;Anna\n777;Bob555123\n",
        );
        let results = run(dir.path(), "555123");
        assert_eq!(results.len(), 1);
        assert!(results.blocks()[0].contains("tel: 555123"));
    }

    #[test]
    fn unknown_column_degrades_to_whole_row_matching() {
        let dir = tempdir().expect("temp dir");
        write_store_file(dir.path(), "dump.csv", "фио;mail\nAnna555;a@b.com\n");
        let results = run(dir.path(), "555");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn canonical_files_match_without_a_header() {
        let dir = tempdir().expect("temp dir");
        write_store_file(
            dir.path(),
            "dump.csv",
            "555123;Мария;@masha;m@x.com\n777;Анна;@anna;a@x.com\n",
        );
        Template::canonical()
            .save(&dir.path().join("dump.csv"))
            .expect("sidecar");
        let results = run(dir.path(), "Мария");
        assert_eq!(results.len(), 1);
        assert!(results.blocks()[0].starts_with("File: dump.csv"));
        assert!(results.blocks()[0].contains("name: Мария"));
    }

    #[test]
    fn empty_fields_render_the_missing_placeholder() {
        let dir = tempdir().expect("temp dir");
        write_store_file(dir.path(), "dump.csv", "555;Мария;;\n");
        let results = run(dir.path(), "555");
        assert_eq!(results.len(), 1);
        assert!(results.blocks()[0].contains("handle: missing"));
        assert!(results.blocks()[0].contains("email: missing"));
    }

    #[test]
    fn one_bad_file_does_not_poison_the_scan() {
        let dir = tempdir().expect("temp dir");
        // A directory with a .csv name enumerates but fails to read.
        fs::create_dir(dir.path().join("bad.csv")).expect("create dir");
        write_store_file(dir.path(), "a.csv", "555;Мария;@m;m@x.com\n");
        write_store_file(dir.path(), "z.csv", "555;Анна;@a;a@x.com\n");
        let results = run(dir.path(), "555");
        assert_eq!(results.len(), 3);
        assert!(results.blocks()[1].contains("read error: bad.csv"));
    }

    #[test]
    fn preset_cancel_flag_stops_the_scan() {
        let dir = tempdir().expect("temp dir");
        write_store_file(dir.path(), "dump.csv", "555;Мария;@m;m@x.com\n");
        let cancel = AtomicBool::new(true);
        match scan(dir.path(), "555", QueryKind::Phone, &cancel).expect("scan") {
            SearchOutcome::Stopped => {}
            SearchOutcome::Completed(_) => panic!("expected a stopped scan"),
        }
    }

    #[test]
    fn searcher_runs_to_completion() {
        let dir = tempdir().expect("temp dir");
        write_store_file(dir.path(), "dump.csv", "555;Мария;@m;m@x.com\n");
        let mut searcher = Searcher::new();
        searcher.start(dir.path(), "555");
        match searcher.finish().expect("outcome") {
            SearchOutcome::Completed(results) => assert_eq!(results.len(), 1),
            SearchOutcome::Stopped => panic!("not cancelled"),
        }
    }

    #[test]
    fn starting_a_new_search_supersedes_the_old_one() {
        let dir = tempdir().expect("temp dir");
        write_store_file(dir.path(), "dump.csv", "555;Мария;@m;m@x.com\n");
        let mut searcher = Searcher::new();
        searcher.start(dir.path(), "nothing-matches-this");
        searcher.start(dir.path(), "555");
        match searcher.finish().expect("outcome") {
            SearchOutcome::Completed(results) => assert_eq!(results.len(), 1),
            SearchOutcome::Stopped => panic!("second search must run"),
        }
    }
}
