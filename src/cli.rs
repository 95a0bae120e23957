use clap::{Args, Parser, Subcommand};

use crate::annotate::AnnotationScheme;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download every table in the catalog into `raw_difficulty_table_data/`.
    Fetch(FetchArgs),
    /// Merge the downloaded tables into `difficulty_table_data/`.
    Merge(MergeArgs),
    /// Fetch, then merge.
    Update(FetchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Project root holding `raw_difficulty_table_data/`.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Pause between two tables (politeness).
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Attempts per table, including the first one.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Backoff before the second attempt; doubles after every failure.
    #[arg(long, default_value_t = 500)]
    pub backoff_ms: u64,

    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Timeout for a whole request, body included.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Which provenance link to inject into song records.
    #[arg(long, value_enum, default_value_t = AnnotationScheme::SiteUrl)]
    pub annotation_scheme: AnnotationScheme,
}

#[derive(Debug, Clone, Args)]
pub struct MergeArgs {
    /// Project root holding `raw_difficulty_table_data/`.
    #[arg(long, default_value = ".")]
    pub root: String,
}
