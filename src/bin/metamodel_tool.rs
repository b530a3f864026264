use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustmemodb_metamodel::metamodel::{CollectionElement, IndexSource};
use rustmemodb_metamodel::{CollectionSemantics, MappingDocument, Metamodel, MetamodelBuilder};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "metamodel-tool")]
#[command(about = "Inspect mapping documents and the collection metamodel built from them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every entity and collection descriptor of a mapping document
    Describe { mapping: PathBuf },
    /// Print the load statement of a collection role for the given owners
    LoadSql {
        mapping: PathBuf,
        role: String,
        #[arg(required = true)]
        owner_ids: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Describe { mapping } => describe(&mapping),
        Command::LoadSql {
            mapping,
            role,
            owner_ids,
        } => load_sql(&mapping, &role, &owner_ids),
    }
}

fn build(path: &Path) -> Result<Metamodel> {
    let doc = MappingDocument::from_path(path)
        .with_context(|| format!("failed to read mapping {}", path.display()))?;
    MetamodelBuilder::for_document(&doc)
        .build(&doc)
        .with_context(|| format!("failed to build metamodel from {}", path.display()))
}

fn describe(path: &Path) -> Result<()> {
    let model = build(path)?;

    println!("entities: {}", model.entity_count());
    for descriptor in model.collections() {
        let core = descriptor.core();
        println!("{} ({})", descriptor.role(), descriptor.kind());
        println!("  table:   {}", core.table());
        println!("  key:     {} {}", core.key().column, core.key().data_type);

        if let Some(index) = descriptor.index() {
            let source = match index.source() {
                IndexSource::Column(column) => column.clone(),
                IndexSource::Formula(formula) => format!("formula ({})", formula),
            };
            println!("  index:   {} {}", source, index.data_type());
        }

        let element = match core.element() {
            CollectionElement::Basic(column) => format!("{} {}", column.name, column.data_type),
            CollectionElement::Entity {
                entity_name,
                column,
                ..
            } => format!("{} -> {}", column, entity_name),
        };
        println!("  element: {}", element);

        if let Some(comparator) = descriptor.sorting_comparator() {
            println!("  sort:    {}", comparator.name());
        }
        if let Some(cache) = core.cache() {
            println!("  cache:   {} ({:?})", cache.region(), cache.strategy());
        }
    }

    Ok(())
}

fn load_sql(path: &Path, role: &str, owner_ids: &[String]) -> Result<()> {
    let model = build(path)?;
    let loader = model.loader(role)?;

    let key_type = &loader.descriptor().core().key().data_type;
    let ids = owner_ids
        .iter()
        .map(|raw| key_type.parse(raw))
        .collect::<rustmemodb_metamodel::Result<Vec<_>>>()
        .context("invalid owner id")?;

    for batch in ids.chunks(loader.batch_size()) {
        println!("{};", loader.load_statement(batch)?);
    }

    Ok(())
}
