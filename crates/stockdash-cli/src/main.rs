//! Stock dashboard CLI
//!
//! An interactive terminal front end for the stock dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Provider payloads live in <data-dir>/primary and <data-dir>/fallback
//! export STOCKDASH_DATA_DIR=./data
//!
//! # Interactive session
//! cargo run --bin stockdash
//!
//! # One-shot
//! cargo run --bin stockdash -- --symbol AAPL --range 6mo
//! ```

mod render;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use stockdash_core::{ChartRange, Dashboard, DashboardConfig, SessionState};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stockdash")]
#[command(about = "Stock dashboard with moving averages, RSI and analyst ratings", long_about = None)]
struct Args {
    /// Directory with primary/ and fallback/ payload files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Show one symbol and exit instead of starting a session
    #[arg(short, long)]
    symbol: Option<String>,

    /// Chart range: 3mo, 6mo or 1y
    #[arg(short, long)]
    range: Option<ChartRange>,
}

/// One line of REPL input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Fetch(String),
    Range(String),
    Help,
    Exit,
    Unknown(String),
}

impl Command {
    fn parse(input: &str) -> Self {
        let input = input.trim();
        let Some(command) = input.strip_prefix('/') else {
            return Self::Fetch(input.to_string());
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));
        match name.to_ascii_lowercase().as_str() {
            "range" => Self::Range(arg.to_string()),
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            _ => Self::Unknown(name.to_string()),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,stockdash_core=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn print_help() {
    println!(
        r#"
Commands:
  <SYMBOL>             - Fetch and show a stock (e.g. AAPL)
  /range <3mo|6mo|1y>  - Change the chart range
  /help                - Show this help
  /exit                - Quit
"#
    );
}

fn prompt(state: &SessionState, range: ChartRange) -> String {
    match state.snapshot() {
        Some(snapshot) => format!("[{} {range}] > ", snapshot.symbol),
        None => format!("[{range}] > "),
    }
}

async fn run_repl(dashboard: &Dashboard, mut range: ChartRange) -> anyhow::Result<()> {
    println!("Stock Dashboard");
    print_help();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut state = SessionState::Empty;

    loop {
        print!("{}", prompt(&state, range));
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }
        if input.trim().is_empty() {
            continue;
        }

        match Command::parse(&input) {
            Command::Fetch(symbol) => {
                let transition = dashboard.fetch(state, &symbol).await;
                state = transition.state;
                if let Some(e) = transition.error {
                    eprintln!("Error: {e}");
                    if let Some(snapshot) = state.snapshot() {
                        eprintln!("Still showing {}", snapshot.symbol);
                    }
                    continue;
                }
                if let Some(snapshot) = state.snapshot() {
                    println!("{}\n", render::dashboard(snapshot, range, dashboard.config()));
                }
            }
            Command::Range(arg) => match arg.parse::<ChartRange>() {
                Ok(new_range) => {
                    range = new_range;
                    if let Some(snapshot) = state.snapshot() {
                        println!("{}\n", render::dashboard(snapshot, range, dashboard.config()));
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            },
            Command::Help => print_help(),
            Command::Exit => {
                println!("Goodbye!");
                break;
            }
            Command::Unknown(name) => eprintln!("Unknown command /{name}, try /help"),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let mut builder = DashboardConfig::builder().with_env();
    if let Some(dir) = args.data_dir {
        builder = builder.data_dir(dir);
    }
    let config = builder.build()?;
    let range = args.range.unwrap_or(config.default_range);
    let dashboard = Dashboard::with_data_dir(config)?;

    match args.symbol {
        Some(symbol) => {
            info!(symbol = %symbol, "Running one-shot fetch");
            let transition = dashboard.fetch(SessionState::Empty, &symbol).await;
            if let Some(e) = transition.error {
                return Err(e.into());
            }
            if let Some(snapshot) = transition.state.snapshot() {
                println!("{}", render::dashboard(snapshot, range, dashboard.config()));
            }
            Ok(())
        }
        None => run_repl(&dashboard, range).await,
    }
}
