mod config;
mod decode;
mod engine;
mod llm;

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::engine::{Engine, ExecOutcome};
use crate::llm::{CompletionClient, OpenAiClient};

const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";

fn print_help() {
    println!(
        "\
promptforge v{}

A code-generation playground: asks an LLM for a script, vets it against
a safety denylist, and runs it in an embedded Starlark interpreter.

USAGE:
    promptforge [OPTIONS] <PROMPT>...
    promptforge decode <VALUE>

ARGUMENTS:
    <PROMPT>...    Natural-language description of the code to generate
    decode         Decode a base64 value printed by a generated script

OPTIONS:
    -c, --config <PATH>   Path to TOML configuration file
                          [default: {DEFAULT_CONFIG_PATH}]
    -n, --no-exec         Generate code only, skip validation and execution
    -h, --help            Print this help message and exit
    -V, --version         Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.
    Without a config file, built-in defaults apply.

    RUST_LOG          Log level filter for tracing
                      (e.g. debug, promptforge=debug,warn)
    OPENAI_API_KEY    API key for OpenAI models
                      (from https://platform.openai.com/)

EXAMPLES:
    promptforge \"print the number 42\"
    promptforge -n \"read password.txt and print it\"    # generate only
    promptforge decode c2VjcmV0",
        env!("CARGO_PKG_VERSION"),
    );
}

struct CliArgs {
    config_path: Option<String>,
    execute: bool,
    positionals: Vec<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        config_path: None,
        execute: true,
        positionals: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("promptforge v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--no-exec" | "-n" => parsed.execute = false,
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("{arg} requires a path argument"))?;
                parsed.config_path = Some(path);
            }
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            _ => parsed.positionals.push(arg),
        }
    }

    Ok(parsed)
}

/// Loads the config from an explicit path, the default path if it
/// exists, or built-in defaults (credential from OPENAI_API_KEY).
fn load_config(config_path: Option<&str>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH)
        }
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    // Initialize logging (RUST_LOG=debug for debug mode)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("promptforge=info")),
        )
        .init();

    // `decode` is stand-alone: no config, no network, no pipeline
    if args.positionals.first().map(String::as_str) == Some("decode") {
        let value = args
            .positionals
            .get(1)
            .ok_or_else(|| anyhow!("usage: promptforge decode <VALUE>"))?;
        let text = decode::reveal(value).map_err(|e| anyhow!("could not decode: {e:#}"))?;
        println!("Decoded value: {text}");
        return Ok(());
    }

    let prompt = args.positionals.join(" ");

    let config = load_config(args.config_path.as_deref())?;

    let llm: Arc<dyn CompletionClient> = match config.llm.provider.as_str() {
        "openai" => Arc::new(OpenAiClient::new(config.llm.clone())),
        other => bail!("unknown LLM provider: {other}"),
    };

    info!("LLM: {}", llm.description());
    info!("Denylist: {} patterns", config.engine.denylist.len());

    let engine = Engine::new(config, llm);

    if args.execute {
        eprintln!("Executing AI-generated code. This is NOT a sandbox; use trusted prompts only.");
    }

    let report = engine.run(&prompt, args.execute).await?;

    println!("── Generated code ──");
    println!("{}", report.code);

    match report.outcome {
        None => {}
        Some(ExecOutcome::Blocked { reason }) => {
            println!();
            println!("✗ {reason}");
        }
        Some(ExecOutcome::Ran(result)) => {
            println!();
            println!("── Stdout ──");
            if result.stdout.is_empty() {
                println!("No stdout.");
            } else {
                print!("{}", result.stdout);
            }
            println!();
            println!("── Errors ──");
            if result.stderr.is_empty() {
                println!("No errors.");
            } else {
                print!("{}", result.stderr);
            }
        }
    }

    Ok(())
}
