use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use tally_ledger::{AmountInput, NewTransaction};

mod config;
mod session;
mod state;

use session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")"),
    about = "Keyword-based expense categorizer"
)]
struct Cli {
    /// Rule table TOML to use instead of the configured one
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the category for a description
    Classify {
        /// Description text (empty means the fallback category)
        description: Option<String>,
    },

    /// Summarize a CSV upload into per-category totals
    Upload {
        /// CSV with Description and Amount columns
        #[arg(long)]
        csv: PathBuf,
    },

    /// Validate and classify a single transaction
    Add {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        amount: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// Read commands from stdin against one in-memory store (type `help`)
    Shell,

    /// Inspect the category rule table
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// List categories in priority order
    List,

    /// Write the effective rule table as TOML
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,

    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let rules = cli.rules.as_deref();

    match cli.command {
        Command::Classify { description } => {
            let classifier = cfg.classifier(rules)?;
            println!("{}", classifier.classify(description.as_deref()));
        }

        Command::Upload { csv } => {
            if !csv.exists() {
                bail!("CSV not found: {} (pass --csv <path>)", csv.display());
            }
            let session = open_session(&cfg, rules)?;
            let response = session.upload(&csv)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Add {
            title,
            description,
            amount,
            date,
        } => {
            let mut session = open_session(&cfg, rules)?;
            let record = NewTransaction {
                title,
                description,
                amount: amount.map(AmountInput::Text),
                date,
            };
            let response = session.add(record)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Shell => {
            let mut session = open_session(&cfg, rules)?;
            let stdin = io::stdin();
            session.run(stdin.lock(), io::stdout().lock())?;
        }

        Command::Rules { command } => match command {
            RulesCommand::List => {
                let table = cfg.rule_table(rules)?;
                for (i, rule) in table.categories.iter().enumerate() {
                    println!("{:>2}. {:<14} {}", i + 1, rule.label, rule.keywords.join(", "));
                }
                println!("    {:<14} (fallback)", table.fallback);
            }
            RulesCommand::Export { out } => {
                let table = cfg.rule_table(rules)?;
                let text = table.to_toml_string()?;
                match out {
                    Some(p) => {
                        std::fs::write(&p, text).with_context(|| format!("write {}", p.display()))?;
                        println!("Wrote {}", p.display());
                    }
                    None => print!("{text}"),
                }
            }
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn open_session(cfg: &config::Config, rules: Option<&std::path::Path>) -> Result<Session> {
    let classifier = cfg.classifier(rules)?;
    let uploads_dir = cfg.uploads.resolved_dir()?;
    Ok(Session::new(classifier, uploads_dir, cfg.uploads.max_bytes))
}

/// Logs go to stderr so stdout stays parseable. Level from `TALLY_LOG`
/// (default `info`).
fn setup_logging() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .init();
}
