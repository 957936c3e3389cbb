#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use linkbox::builder::ConfigBuilder;
use linkbox::catalog::RuleSpec;
use linkbox::cli::Args;
use linkbox::i18n::{Lang, Translations};
use linkbox::parser;

fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    if let Err(e) = run(args) {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    tracing::info!("Reading share links from: {}", args.input);
    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read links from {}", args.input))?;
    let outbounds = parser::parse_links(&content)?;

    let custom: Vec<RuleSpec> = match &args.custom_rules {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read custom rules from {}", path))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse custom rules from {}", path))?
        }
        None => Vec::new(),
    };

    let selected: Vec<String> = args
        .rules
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let lang = Lang::from_str(&args.lang)?;
    let mut builder = ConfigBuilder::new(selected, custom, Box::new(Translations::new(lang)));
    builder.add_proxies(outbounds);
    let config = builder.build();

    let json = config
        .to_json_pretty()
        .context("Failed to serialize config to JSON")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write config to {}", path))?;
            tracing::info!("Config written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
