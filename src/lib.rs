pub mod classify;
pub mod cli;
pub mod detect;
pub mod fingerprint;
pub mod import;
pub mod io_utils;
pub mod normalize;
pub mod query;
pub mod search;
pub mod store;

use std::{env, sync::OnceLock};

use anyhow::{Result, anyhow};
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};
use crate::search::{SearchOutcome, Searcher};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("contact_vault", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Import(args) => import::execute(&args),
        Commands::Search(args) => handle_search(&args),
        Commands::Classify(args) => handle_classify(&args),
        Commands::List(args) => handle_list(&args),
        Commands::Rename(args) => handle_rename(&args),
        Commands::Remove(args) => handle_remove(&args),
    }
}

fn handle_search(args: &cli::SearchArgs) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(anyhow!("query is empty"));
    }
    if args.page_size == 0 {
        return Err(anyhow!("--page-size must be at least 1"));
    }

    let kind = query::classify(query);
    log::info!("searching by {} for '{query}'", kind.label());

    let mut searcher = Searcher::new();
    searcher.start(&args.store, query);
    match searcher.finish()? {
        SearchOutcome::Stopped => {
            println!("search stopped");
        }
        SearchOutcome::Completed(results) => {
            if results.is_empty() {
                println!("no results");
                return Ok(());
            }
            if args.all {
                println!("{}", results.blocks().join("\n\n"));
                println!("\n{} result(s)", results.len());
                return Ok(());
            }
            let page = results.page(args.page, args.page_size);
            if page.blocks.is_empty() {
                println!("no more results");
                return Ok(());
            }
            println!("{}", page.blocks.join("\n\n"));
            if page.has_more {
                println!(
                    "\n{} of {} result(s) shown; more available",
                    page.blocks.len(),
                    results.len()
                );
            } else {
                println!("\nno more results");
            }
        }
    }
    Ok(())
}

fn handle_classify(args: &cli::ClassifyArgs) -> Result<()> {
    let kind = query::classify(&args.query);
    println!("searching by: {}", kind.label());
    Ok(())
}

fn handle_list(args: &cli::ListArgs) -> Result<()> {
    let files = store::list_files(&args.store)?;
    if files.is_empty() {
        println!("no stored files");
        return Ok(());
    }
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>");
        println!("{name}");
    }
    Ok(())
}

fn handle_rename(args: &cli::RenameArgs) -> Result<()> {
    store::rename_file(&args.store, &args.from, &args.to)?;
    println!("renamed {} -> {}", args.from, args.to);
    Ok(())
}

fn handle_remove(args: &cli::RemoveArgs) -> Result<()> {
    store::remove_file(&args.store, &args.name)?;
    println!("removed {}", args.name);
    Ok(())
}
