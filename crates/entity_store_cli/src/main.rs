//! Diagnostic probe for entity stores.
//!
//! # Responsibility
//! - Verify `entity_store_core` linkage and print its version.
//! - Validate a schema catalog and dump stored records as JSON lines.

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use entity_store_core::{
    core_version, init_logging, EntityStorage, FetchSpec, LogConfig, PersistenceStore,
    SchemaCatalog, SchemaSource, StoreOptions,
};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "entity-store", version, about = "Inspect entity store catalogs and data")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Defaults to `debug` in debug builds and `info` otherwise.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate a catalog, then list its kinds.
    Check(SchemaArgs),
    /// Print records of one kind from a store file as JSON lines.
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Directory holding `<name>.schema.json`.
    #[arg(long)]
    schema_dir: PathBuf,

    /// Catalog name.
    #[arg(long)]
    schema: String,
}

#[derive(Args, Debug)]
struct DumpArgs {
    #[command(flatten)]
    schema: SchemaArgs,

    /// Store file to read.
    #[arg(long)]
    store: PathBuf,

    /// Entity kind to dump.
    #[arg(long)]
    kind: String,

    /// Maximum records to print (0 = all).
    #[arg(short = 'n', long, default_value = "0")]
    limit: u32,

    /// How long to wait on a locked store file, in milliseconds.
    #[arg(long, default_value = "5000")]
    busy_timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let config = match cli.log_level.as_deref() {
            Some(level) => LogConfig::new(level, log_dir)?,
            None => LogConfig::with_default_level(log_dir)?,
        };
        init_logging(&config)?;
    }

    match cli.command {
        None => println!("entity_store_core version={}", core_version()),
        Some(Command::Check(args)) => check(&args)?,
        Some(Command::Dump(args)) => dump(&args)?,
    }
    Ok(())
}

fn check(args: &SchemaArgs) -> anyhow::Result<()> {
    let catalog = SchemaCatalog::load(&args.schema, &SchemaSource::directory(&args.schema_dir))
        .with_context(|| format!("loading catalog `{}`", args.schema))?;

    println!("catalog={} version={}", catalog.name, catalog.version);
    for entity in &catalog.entities {
        println!(
            "kind={} identifier={} fields={}",
            entity.name,
            entity.identifier,
            entity.fields.len()
        );
    }
    Ok(())
}

fn dump(args: &DumpArgs) -> anyhow::Result<()> {
    let options = StoreOptions::new(
        args.schema.schema.as_str(),
        SchemaSource::directory(&args.schema.schema_dir),
    )
    .with_store_path(&args.store)
    .with_busy_timeout(Duration::from_millis(args.busy_timeout_ms));
    let store = PersistenceStore::open(&options)
        .with_context(|| format!("opening store `{}`", args.store.display()))?;
    let storage = EntityStorage::with_store(store);

    let records = storage.fetch_records(&args.kind, &FetchSpec::new().limit(args.limit))?;
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    info!(
        "event=cli_dump module=cli status=ok kind={} rows={}",
        args.kind,
        records.len()
    );
    Ok(())
}
