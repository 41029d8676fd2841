mod commands;
mod display;

use anyhow::Context;
use clap::Parser;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transitbuddy_core::config::AppConfig;
use transitbuddy_core::geo::GeoPosition;
use transitbuddy_engine::engine::{ConversationOrchestrator, ExchangeReport, SubmitOutcome};
use transitbuddy_runtime::config_store::ConfigStore;
use transitbuddy_runtime::runtime_engine::build_orchestrator_from_config;

use commands::{Command, HELP};
use display::{Style, latest_stop_codes, render_message};

#[derive(Parser, Debug)]
#[command(name = "transitbuddy", version, about = "Terminal client for the transit assistant")]
struct Args {
    /// Config file (JSON). A missing file means built-in defaults.
    #[arg(long, env = "TRANSITBUDDY_CONFIG", default_value = "transitbuddy.json")]
    config: PathBuf,

    /// Chatbot API base URL, e.g. http://localhost:5000/api/chatbot
    #[arg(long, env = "TRANSITBUDDY_BASE_URL")]
    base_url: Option<String>,

    /// Latitude reported for "near me" lookups
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude reported for "near me" lookups
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Send a single message, print the reply and exit
    #[arg(long)]
    message: Option<String>,

    /// Write the effective config to --config and exit
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(url) = &self.base_url {
            cfg.api_base_url = url.clone();
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            cfg.geolocation.fixed_position = Some(GeoPosition::new(lat, lon));
        }
    }
}

fn init_logging() {
    // Logs go to stderr; stdout carries the conversation.
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let store = ConfigStore::at_path(&args.config);
    let mut cfg = store.load_or_default()?;
    args.apply(&mut cfg);
    log::debug!(
        "config {}: base_url={} fixed_position={}",
        store.path().display(),
        cfg.api_base_url,
        cfg.geolocation.fixed_position.is_some()
    );

    if args.save_config {
        store.save(&cfg)?;
        println!("saved {}", store.path().display());
        return Ok(());
    }

    let orchestrator = build_orchestrator_from_config(&cfg, None)?;
    let style = Style {
        ansi: std::io::stdout().is_terminal(),
    };

    match &args.message {
        Some(text) => {
            if let SubmitOutcome::Completed(ExchangeReport {
                failure: Some(e), ..
            }) = orchestrator.submit(text).await
            {
                log::warn!("one-shot message failed: {e}");
            }
            print_since(&orchestrator, 0, style);
            Ok(())
        }
        None => repl(&orchestrator, style).await,
    }
}

/// Prints messages from `seq` on and returns the next unseen sequence number.
fn print_since(o: &ConversationOrchestrator, seq: u64, style: Style) -> u64 {
    let mut next = seq;
    for msg in o.messages_since(seq) {
        print!("{}", render_message(&msg, style));
        next = msg.seq + 1;
    }
    next
}

fn print_prompts(o: &ConversationOrchestrator) {
    for (i, p) in o.config().suggested_prompts.iter().enumerate() {
        println!("  [{}] {p}", i + 1);
    }
}

async fn repl(o: &ConversationOrchestrator, style: Style) -> anyhow::Result<()> {
    println!("Session {}. /help for commands.", o.session().id());
    if !o.config().suggested_prompts.is_empty() {
        println!("Try:");
        print_prompts(o);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = 0;
    loop {
        print!("> ");
        std::io::stdout().flush().context("flush stdout")?;

        let Some(line) = lines.next_line().await.context("read stdin")? else {
            log::debug!("stdin closed, leaving session {}", o.session().id());
            break;
        };
        let Some(cmd) = commands::parse(&line) else {
            continue;
        };

        let outcome = match cmd {
            Command::Say(text) => Some(o.submit(&text).await),
            Command::Nearby => {
                o.request_nearby_stops().await;
                None
            }
            Command::Home => Some(o.route_home().await),
            Command::Arrivals(code) => Some(o.request_arrivals(&code).await),
            Command::Select(n) => {
                let codes = latest_stop_codes(o.transcript().messages());
                match codes.get(n - 1) {
                    Some(code) => Some(o.select_stop(code).await),
                    None => {
                        println!("No stop [{n}] in the last list.");
                        None
                    }
                }
            }
            Command::Prompts => {
                print_prompts(o);
                None
            }
            Command::Prompt(n) => match o.config().suggested_prompts.get(n - 1) {
                Some(p) => Some(o.submit_quick_action(p).await),
                None => {
                    println!("No suggested prompt [{n}].");
                    None
                }
            },
            Command::Help => {
                println!("{HELP}");
                None
            }
            Command::Quit => break,
            Command::Invalid(line) => {
                println!("Unrecognised command: {line}. /help for commands.");
                None
            }
        };

        if let Some(SubmitOutcome::Busy) = outcome {
            println!("Still waiting for the previous reply.");
        }
        seen = print_since(o, seen, style);
    }
    Ok(())
}
