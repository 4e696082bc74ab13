use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use hivealert_alerter::{HiveAlerter, MatchRecord};
use hivealert_rules::load_rule;
use serde_json::Value;
use tracing::debug;

#[derive(Parser)]
#[command(name = "hivealert")]
#[command(about = "Send rule matches to TheHive as alerts", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "HIVEALERT_LOG")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an alert from matches and post it to TheHive
    Send(SendArgs),
    /// Show the alerter information for a rule
    Info(RuleArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct RuleArgs {
    /// Rule file (YAML or JSON)
    #[arg(long, env = "HIVEALERT_RULE")]
    rule: PathBuf,
}

#[derive(Args)]
struct SendArgs {
    #[command(flatten)]
    rule: RuleArgs,
    /// JSON file holding one match object or an array of them
    #[arg(long)]
    matches: PathBuf,
    /// Print the request instead of sending it
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    hivealert_core::init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Send(args) => {
            let alerter = alerter_for(&args.rule.rule)?;
            let matches = load_matches(&args.matches)?;
            debug!(count = matches.len(), "loaded matches");

            if args.dry_run {
                let request = alerter.prepare(&matches)?;
                println!("POST {}", request.url);
                for (name, value) in &request.headers {
                    println!("{name}: {value}");
                }
                println!("{}", request.body);
            } else {
                alerter.alert(&matches).await?;
                println!("Alert sent to {}", alerter.rule().hive_connection.alert_url());
            }
        }
        Commands::Info(args) => {
            let alerter = alerter_for(&args.rule)?;
            println!("{}", serde_json::to_string_pretty(&alerter.get_info())?);
        }
        Commands::Version => {
            println!("hivealert v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn alerter_for(path: &Path) -> anyhow::Result<HiveAlerter> {
    let rule = load_rule(path)?;
    Ok(HiveAlerter::new(rule)?)
}

fn load_matches(path: &Path) -> anyhow::Result<Vec<MatchRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read matches from {}", path.display()))?;
    parse_matches(&raw).with_context(|| format!("invalid matches in {}", path.display()))
}

fn parse_matches(raw: &str) -> anyhow::Result<Vec<MatchRecord>> {
    let matches = match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => items,
        record @ Value::Object(_) => vec![record],
        other => bail!("expected a JSON object or array, found {other}"),
    };

    if matches.is_empty() {
        bail!("no matches provided");
    }
    if let Some(position) = matches.iter().position(|record| !record.is_object()) {
        bail!("match #{position} is not a JSON object");
    }

    Ok(matches)
}
