use std::path::Path;
use std::sync::Arc;

use adquery::search::InMemorySearchBackend;
use adquery::store::{FsObjectStore, MemoryObjectStore};
use adquery::{AdQuery, AppConfig, QueryNode, QueryResponse};
use anyhow::{Context, Result, bail};
use chrono::Duration;
use serde_json::{Value, json};

use crate::cli::Commands;

mod support;

use self::support::{load_documents, print_json, read_json_input};

pub(crate) fn run(command: Commands) -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    adquery::logging::init(config.log_profile);

    let output = execute(&config, command)?;
    print_json(&output)?;
    if output.get("success") == Some(&Value::Bool(false)) {
        bail!(
            "request failed: {}",
            output["comment"].as_str().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn open_engine(config: &AppConfig, store: &Path, documents: Vec<Value>) -> Result<AdQuery> {
    let store = FsObjectStore::open(store)
        .with_context(|| format!("failed to open store at {}", store.display()))?;
    Ok(AdQuery::new(
        config.clone(),
        Arc::new(store),
        Arc::new(InMemorySearchBackend::new(documents)),
    ))
}

fn detached_engine(config: &AppConfig) -> AdQuery {
    AdQuery::new(
        config.clone(),
        Arc::new(MemoryObjectStore::new()),
        Arc::new(InMemorySearchBackend::new(Vec::new())),
    )
}

fn parse_query(raw: &str) -> Result<QueryNode> {
    let value = read_json_input(raw, "query")?;
    Ok(QueryNode::from_json(&value)?)
}

fn execute(config: &AppConfig, command: Commands) -> Result<Value> {
    match command {
        Commands::Compile(args) => {
            let node = parse_query(&args.query)?;
            let clause = detached_engine(config).compile(&node)?;
            Ok(adquery::dsl::search_body(
                &clause,
                config.search.default_page_size,
                None,
            ))
        }
        Commands::Eval(args) => {
            let node = parse_query(&args.query.query)?;
            let engine = open_engine(config, &args.store.store, Vec::new())?;
            let results = engine.query_offline(&node)?;
            Ok(serde_json::to_value(QueryResponse::from_results(results))?)
        }
        Commands::Index(args) => {
            let engine = open_engine(config, &args.store.store, Vec::new())?;
            let (index, rebuilt) = if args.force {
                (engine.rebuild_index()?, true)
            } else if let Some(hours) = args.max_age_hours {
                engine.index_with_max_age(Duration::hours(i64::from(hours)))?
            } else {
                engine.index()?
            };
            Ok(json!({
                "rebuilt": rebuilt,
                "total_paths": index.total_paths(),
                "categories": index.summary(),
            }))
        }
        Commands::Registry => {
            let engine = detached_engine(config);
            let report = engine.registry_report();
            Ok(json!({
                "consistent": report.is_consistent(),
                "report": report,
            }))
        }
        Commands::Search(args) => {
            let request = read_json_input(&args.request, "request")?;
            let documents = load_documents(&args.documents)?;
            let engine = open_engine(config, &args.store.store, documents)?;
            let (_, body) = engine.handle(&request);
            Ok(body)
        }
        Commands::NewSession(args) => {
            let engine = open_engine(config, &args.store, Vec::new())?;
            let session = engine.new_session()?;
            Ok(serde_json::to_value(session)?)
        }
    }
}
