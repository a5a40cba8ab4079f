use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query JSON, or `@path` to read it from a file.
    #[arg(long, allow_hyphen_values = true)]
    pub query: String,
}

#[derive(Debug, Args)]
pub struct StoreArg {
    /// Directory backing the object store.
    #[arg(long)]
    pub store: PathBuf,
}

#[derive(Debug, Args)]
pub struct EvalArgs {
    #[command(flatten)]
    pub store: StoreArg,
    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct IndexArgs {
    #[command(flatten)]
    pub store: StoreArg,
    /// Overrides the configured freshness window.
    #[arg(long)]
    pub max_age_hours: Option<u32>,
    /// Rebuild even when the stored index is fresh.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub store: StoreArg,
    /// JSON array of documents served by the in-process backend.
    #[arg(long)]
    pub documents: PathBuf,
    /// Request JSON (`{method, args, session_id?, context?}`), or `@path`.
    #[arg(long, allow_hyphen_values = true)]
    pub request: String,
}
