use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Import, normalize, and search contact record dumps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize a delimited dump and add it to the store, skipping duplicates
    Import(ImportArgs),
    /// Search the stored corpus with field-aware substring matching
    Search(SearchArgs),
    /// Show which field a query string would be routed to
    Classify(ClassifyArgs),
    /// List stored files
    List(ListArgs),
    /// Rename a stored file (its sidecar template moves with it)
    Rename(RenameArgs),
    /// Delete a stored file and its sidecar template
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input dump to import ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Store directory holding normalized files
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Destination file name (defaults to the input file name)
    #[arg(long)]
    pub name: Option<String>,
    /// Preserve the original header and column order instead of normalizing
    /// to canonical phone;name;handle;email rows
    #[arg(long = "keep-schema")]
    pub keep_schema: bool,
    /// Character encoding of the input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Query string; its detected type picks the targeted field
    pub query: String,
    /// Store directory holding normalized files
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Zero-based result page to display
    #[arg(long, default_value_t = 0)]
    pub page: usize,
    /// Results per page
    #[arg(long = "page-size", default_value_t = crate::search::PAGE_SIZE)]
    pub page_size: usize,
    /// Print every result block instead of one page
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Query string to classify
    pub query: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Store directory holding normalized files
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Store directory holding normalized files
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Current file name
    pub from: String,
    /// New file name (must end with .csv)
    pub to: String,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Store directory holding normalized files
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// File name to delete
    pub name: String,
}
