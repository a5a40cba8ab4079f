use clap::{Parser, Subcommand};

mod args;


pub use args::{EvalArgs, IndexArgs, QueryArgs, SearchArgs, StoreArg};

#[derive(Debug, Parser)]
#[command(name = "adquery")]
#[command(about = "Boolean ad queries over a candidate index or a search backend", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the search-DSL body a query compiles to.
    Compile(QueryArgs),
    /// Interpret a query against the candidate index of a local store.
    Eval(EvalArgs),
    /// Load or rebuild the candidate index and summarize it.
    Index(IndexArgs),
    /// Compare the interpreter and compiler method registries.
    Registry,
    /// Serve one request against documents loaded into the in-process backend.
    Search(SearchArgs),
    /// Create a paging session.
    NewSession(StoreArg),
}
