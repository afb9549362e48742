use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nestdb",
    about = "NestDB: hierarchical JSON document server",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Port to listen on (default 3318)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// JSON Schema every document must satisfy
    #[arg(short, long, global = true)]
    pub schema: Option<PathBuf>,

    /// JSON file of preloaded `{"user": "token"}` pairs
    #[arg(short, long, global = true)]
    pub tokens: Option<PathBuf>,

    /// TOML configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `nest_tree=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (the default)
    Serve,
    /// Print the effective configuration as TOML
    Config,
    /// Check a JSON document against the schema given with --schema
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    pub document: PathBuf,
}
