//! Command-line entry point for the catalog search indexer.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use catalog_search::{maintenance, AppError, Dependencies, LogFormat, Settings};
use catalog_search_shared::{EntityKind, FieldFilter, SearchQuery, SortField};

#[derive(Parser)]
#[command(name = "catalog-search")]
#[command(about = "Index the catalog into the search store and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reindex every kind of the full sequence
    IndexAll,
    /// Index one kind, or a single record of it with --id (`all` reindexes everything)
    Index {
        /// Entity type, or `all`
        target: String,
        /// Index only this record
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete one document from the search store
    Delete { kind: EntityKind, id: String },
    /// Run a query and print hits grouped per type
    Query {
        /// Free-text term matched against names and titles
        term: Option<String>,
        /// Restrict to these types (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
        /// Field filter as `field1,field2=query` (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Require this field to be present (repeatable)
        #[arg(long)]
        exists: Vec<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = catalog_search_shared::DEFAULT_LIMIT)]
        limit: usize,
        /// Sort as `field` or `field:desc` (repeatable)
        #[arg(long)]
        sort: Vec<String>,
    },
    /// Print one indexed document
    Get { kind: EntityKind, id: String },
    /// Tag a source record with the deployment environment, then reindex it
    TagEnvironment {
        kind: EntityKind,
        id: String,
        /// Environment tag to add (default: DEPLOYMENT_ENVIRONMENT)
        #[arg(long)]
        environment: Option<String>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_filter(raw: &str) -> Result<FieldFilter, AppError> {
    let (fields, query) = raw
        .split_once('=')
        .ok_or_else(|| AppError::config(format!("Invalid filter: {}", raw)))?;
    Ok(FieldFilter::new(
        fields.split(',').map(str::trim).filter(|f| !f.is_empty()),
        query,
    ))
}

async fn run(command: Commands, settings: &Settings) -> Result<(), AppError> {
    let deps = Dependencies::new(settings).await?;
    let coordinator = &deps.coordinator;

    match command {
        Commands::IndexAll => {
            let report = coordinator.index_all().await?;
            print_json(&report)?;
        }
        Commands::Index { target, id } => {
            let outcome = coordinator.index_data(&target, id.as_deref()).await?;
            print_json(&outcome)?;
        }
        Commands::Delete { kind, id } => {
            coordinator.delete_one(kind, &id).await?;
        }
        Commands::Query {
            term,
            types,
            filters,
            exists,
            offset,
            limit,
            sort,
        } => {
            let mut query = SearchQuery::default().with_page(offset, limit);
            query.term = term;
            if !types.is_empty() {
                query = query.with_types(types);
            }
            for raw in &filters {
                query = query.with_filter(parse_filter(raw)?);
            }
            for field in exists {
                query = query.with_exists(field);
            }
            for raw in &sort {
                let field = SortField::parse(raw)
                    .ok_or_else(|| AppError::config(format!("Invalid sort: {}", raw)))?;
                query = query.with_sort(field);
            }

            let results = coordinator.query(&query).await?;
            print_json(&results)?;
        }
        Commands::Get { kind, id } => {
            let document = coordinator
                .find_one(kind, &id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("{} {}", kind, id)))?;
            print_json(&document)?;
        }
        Commands::TagEnvironment {
            kind,
            id,
            environment,
        } => {
            let environment = environment.unwrap_or_else(|| settings.environment.clone());
            maintenance::tag_environment(deps.source.as_ref(), kind, &id, &environment).await?;
            if environment == settings.environment {
                let document = coordinator.index_one(kind, &id).await?;
                print_json(&document)?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.log_format);

    match run(cli.command, &settings).await {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
