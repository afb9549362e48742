use anyhow::{bail, Context};
use colored::Colorize;

use nest_server::{NestServer, ServerConfig};
use nest_tree::{JsonSchema, SchemaValidator};

use crate::cli::{Cli, Command, ValidateArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = effective_config(&cli)?;
    tracing::debug!(?config, "effective configuration");
    match cli.command {
        None | Some(Command::Serve) => cmd_serve(config).await,
        Some(Command::Config) => cmd_config(&config),
        Some(Command::Validate(args)) => cmd_validate(&config, args),
    }
}

/// The config file (if any) with command-line flags applied on top.
pub fn effective_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(schema) = &cli.schema {
        config.schema_file = Some(schema.clone());
    }
    if let Some(tokens) = &cli.tokens {
        config.token_file = Some(tokens.clone());
    }
    Ok(config)
}

async fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    let server = NestServer::new(config).context("starting server")?;
    println!("{} NestDB on {}", "✓".green().bold(), server.config().bind_addr.to_string().bold());
    match &server.config().schema_file {
        Some(path) => println!("  Schema: {}", path.display().to_string().cyan()),
        None => println!("  Schema: {}", "none (all documents accepted)".yellow()),
    }
    if let Some(path) = &server.config().token_file {
        println!("  Tokens: {}", path.display().to_string().cyan());
    }
    server.serve().await.context("server stopped")?;
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn cmd_validate(config: &ServerConfig, args: ValidateArgs) -> anyhow::Result<()> {
    let Some(schema_path) = &config.schema_file else {
        bail!("validate needs a schema (--schema or schema_file)");
    };
    let schema = JsonSchema::from_file(schema_path)
        .with_context(|| format!("loading schema {}", schema_path.display()))?;
    let raw = std::fs::read(&args.document)
        .with_context(|| format!("reading {}", args.document.display()))?;

    match schema.validate_bytes(&raw) {
        Ok(_) => {
            println!("{} {} conforms", "✓".green().bold(), args.document.display());
            Ok(())
        }
        Err(e) => {
            println!("{} {}: {}", "✗".red().bold(), args.document.display(), e);
            bail!("document does not conform to schema")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nestdb.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:4000\"\nkeep_alive_secs = 3\n").unwrap();

        let cli = Cli::try_parse_from([
            "nestdb",
            "-c",
            path.to_str().unwrap(),
            "-p",
            "5000",
        ])
        .unwrap();
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:5000");
        assert_eq!(config.keep_alive_secs, 3);
    }

    #[test]
    fn defaults_without_file() {
        let cli = Cli::try_parse_from(["nestdb"]).unwrap();
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.bind_addr.port(), 3318);
    }

    #[test]
    fn validate_reports_conformance() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.json");
        std::fs::write(&schema, r#"{"type": "object", "required": ["name"]}"#).unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"name": "x"}"#).unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"other": 1}"#).unwrap();

        let config = ServerConfig {
            schema_file: Some(schema),
            ..ServerConfig::default()
        };
        assert!(cmd_validate(&config, ValidateArgs { document: good }).is_ok());
        assert!(cmd_validate(&config, ValidateArgs { document: bad }).is_err());

        let garbled = dir.path().join("garbled.json");
        std::fs::write(&garbled, "{not json").unwrap();
        assert!(cmd_validate(&config, ValidateArgs { document: garbled }).is_err());
    }

    #[test]
    fn config_renders_as_toml() {
        let config = ServerConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let reparsed = ServerConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.bind_addr, config.bind_addr);
        assert_eq!(reparsed.tree, config.tree);
    }
}
