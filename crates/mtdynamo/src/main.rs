use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mtdynamo::Config;
use mtdynamo_core::mapping::{
    ByKeyTypeSchemaProvider, FieldMappings, IndexMapperByKind, PhysicalSchemaProvider,
    SingletonSchemaProvider, TableMapping,
};
use mtdynamo_core::schema::{shared_table_catalog, TableDescription};

/// mtdynamo - Multitenant virtual tables on shared DynamoDB tables
#[derive(Parser, Debug)]
#[command(name = "mtdynamo")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Print how a virtual table maps onto a physical table
    Map {
        /// Virtual table description (JSON file)
        #[arg(long = "virtual", value_name = "FILE")]
        virtual_table: PathBuf,

        /// Physical table description (JSON file); defaults to the shared table catalog
        #[arg(long = "physical", value_name = "FILE")]
        physical_table: Option<PathBuf>,
    },

    /// Check that a physical table can host virtual tables
    ValidatePhysical {
        /// Physical table description (JSON file)
        #[arg(value_name = "FILE")]
        physical_table: PathBuf,
    },

    /// Print the shared table catalog for the configured prefix
    Catalog,

    /// List the shared tables present in DynamoDB
    #[cfg(feature = "dynamodb")]
    ListTables {
        /// Maximum number of names to return
        #[arg(long, default_value = "100")]
        limit: usize,

        /// Continue after this table name
        #[arg(long)]
        start: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct MappingReport<'a> {
    virtual_table: &'a str,
    physical_table: &'a str,
    secondary_indexes: BTreeMap<&'a str, &'a str>,
    field_mappings: &'a FieldMappings,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mtdynamo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Map {
            virtual_table,
            physical_table,
        } => map(&config, &virtual_table, physical_table.as_deref()),
        Commands::ValidatePhysical { physical_table } => {
            let table = read_table(&physical_table)?;
            TableMapping::validate_physical_table(&table)?;
            println!("{} can host virtual tables", table.name);
            Ok(())
        }
        Commands::Catalog => print_json(&shared_table_catalog(&config.table_prefix)),
        #[cfg(feature = "dynamodb")]
        Commands::ListTables { limit, start } => {
            list_tables(&config, start.as_deref(), limit).await
        }
    }
}

fn read_table(path: &Path) -> Result<TableDescription> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse table description in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn map(config: &Config, virtual_path: &Path, physical_path: Option<&Path>) -> Result<()> {
    let virtual_table = read_table(virtual_path)?;
    let provider: Box<dyn PhysicalSchemaProvider> = match physical_path {
        Some(path) => Box::new(SingletonSchemaProvider::new(read_table(path)?)),
        None => Box::new(ByKeyTypeSchemaProvider::new(shared_table_catalog(
            &config.table_prefix,
        ))),
    };

    let mapping = TableMapping::new(
        virtual_table,
        provider.as_ref(),
        &IndexMapperByKind,
        None,
        config.delimiter,
    )?;
    tracing::debug!(physical_table = %mapping.physical_table().name, "Mapped virtual table");

    let secondary_indexes = mapping
        .virtual_table()
        .secondary_indexes
        .iter()
        .filter_map(|si| {
            mapping
                .physical_secondary_index(&si.name)
                .map(|physical| (si.name.as_str(), physical.name.as_str()))
        })
        .collect();

    print_json(&MappingReport {
        virtual_table: &mapping.virtual_table().name,
        physical_table: &mapping.physical_table().name,
        secondary_indexes,
        field_mappings: mapping.all_virtual_to_physical_field_mappings(),
    })
}

#[cfg(feature = "dynamodb")]
async fn list_tables(config: &Config, start: Option<&str>, limit: usize) -> Result<()> {
    use std::sync::Arc;

    use mtdynamo::storage::dynamodb::{AwsConfig, DynamoDbStore};
    use mtdynamo::{PassThroughStore, StaticContext};
    use mtdynamo_core::store::BackingStore;

    let store = DynamoDbStore::connect(&AwsConfig::from(config)).await;
    let facade = PassThroughStore::new(
        Arc::new(store),
        Arc::new(StaticContext::none()),
        config.table_prefix.clone(),
    );
    let page = facade.list_tables(start, limit).await?;
    print_json(&page)
}
