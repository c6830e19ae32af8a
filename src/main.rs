//! ghostfs - metadata-indexed content cache.
//!
//! Entry point for the ghostfs CLI.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use ghostfs::cli::{Cli, Commands};
use ghostfs::config::Config;
use ghostfs::fs::{Candidate, GhostFs, Outcome};
use ghostfs::logging::init_logging;
use ghostfs::store::{Entry, FileRecord};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load();
    let root = config.resolve_root(cli.root)?;
    let cache = GhostFs::open(&root)
        .with_context(|| format!("failed to open store at {}", root.display()))?;
    let json = cli.json;

    match cli.command {
        Commands::Ls(args) => {
            let entries = cache.list(&args.dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    match entry {
                        Entry::Dir { path, .. } => println!("{path}/"),
                        Entry::File(rec) => {
                            println!("{:>12}  {}  {}", rec.reported_size(), rec.mod_time, rec.path);
                        }
                    }
                }
            }
        }
        Commands::Stat(args) => {
            let record = if args.raw {
                cache
                    .store_record(&args.path)?
                    .with_context(|| format!("no record for {}", args.path))?
            } else {
                cache.lookup(&args.path)?
            };
            print_record(&record, json)?;
        }
        Commands::Put(args) => {
            let meta = fs::metadata(&args.source)
                .with_context(|| format!("cannot read {}", args.source.display()))?;
            let mod_time = match args.mod_time {
                Some(t) => t,
                None => DateTime::<Utc>::from(meta.modified()?),
            };
            let reader = fs::File::open(&args.source)?;
            let candidate = Candidate::new(&args.path, meta.len(), mod_time);
            let result = cache.reconcile(candidate, reader)?;
            match result.outcome {
                Outcome::Created => log::info!("created {}", args.path),
                Outcome::Updated => log::info!("updated {}", args.path),
                Outcome::Skipped => log::info!("unchanged, skipped {}", args.path),
            }
            print_record(&result.record, json)?;
        }
        Commands::Rm(args) => cache.mark_deleted(&args.path)?,
        Commands::Mkdir(args) => cache.mkdir(&args.path)?,
        Commands::Rmdir(args) => cache.rmdir_if_empty(&args.path)?,
        Commands::Touch(args) => {
            cache.set_mod_time(&args.path, args.time.unwrap_or_else(Utc::now))?;
        }
        Commands::Cat(args) => {
            let mut content = cache.open_content(&args.path)?;
            io::copy(&mut content, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

fn print_record(record: &FileRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("path:     {}", record.display_name());
        println!("size:     {}", record.reported_size());
        println!("mod_time: {}", record.mod_time);
        if record.has_hash {
            println!("blake3:   {}", record.hash);
        }
        if record.is_dir {
            println!("type:     directory");
        }
    }
    Ok(())
}
