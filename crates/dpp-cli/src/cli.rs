use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dpp",
    about = "Digital product passports: classify ontologies, ingest and export across schemas",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify raw ontology definitions into part-class categories
    Classify {
        /// Source schema the definitions belong to (e.g. ECLASS, ISA-95)
        #[arg(long)]
        source: String,

        /// Raw definitions, one JSON object per line
        #[arg(long)]
        input: String,

        /// Classification table JSONL; rows of other sources are kept
        #[arg(long, default_value = "classification.jsonl")]
        out: String,

        /// Heuristics TOML (extra keywords, fallback, manual overrides)
        #[arg(long)]
        heuristics: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered schemas with version and aliases
    Schemas {
        /// Directory with per-schema mapper configuration
        #[arg(long)]
        config_dir: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a canonical passport into a target schema
    Export {
        /// Target schema name or alias
        #[arg(long)]
        schema: String,

        /// Canonical passport JSON
        #[arg(long)]
        passport: String,

        /// Directory with per-schema mapper configuration
        #[arg(long)]
        config_dir: Option<String>,

        /// Validate the document and fail on error findings
        #[arg(long)]
        check: bool,
    },

    /// Ingest a source schema document into a canonical passport
    Ingest {
        /// Source schema name or alias
        #[arg(long)]
        schema: String,

        /// Source document JSON
        #[arg(long)]
        input: String,

        /// Classification table JSONL used to resolve categories
        #[arg(long)]
        table: Option<String>,

        /// Directory with per-schema mapper configuration
        #[arg(long)]
        config_dir: Option<String>,
    },

    /// Validate a mapped document against its schema
    Validate {
        /// Schema name or alias
        #[arg(long)]
        schema: String,

        /// Mapped document JSON
        #[arg(long)]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a demonstration passport, optionally exported to a schema
    Sample {
        /// Target schema name or alias; canonical JSON when omitted
        #[arg(long)]
        schema: Option<String>,
    },
}
