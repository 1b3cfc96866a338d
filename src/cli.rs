//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_history_adapter::{DEFAULT_HISTORY_PATH, JsonHistoryAdapter};
use crate::adapters::kraken_adapter::{DEFAULT_BASE_URL, KrakenAdapter};
use crate::adapters::svg_chart::{self, ChartKind, ChartOptions, SeriesKind};
use crate::domain::config_validation::validate_bot_config;
use crate::domain::crossover::EqualPolicy;
use crate::domain::error::BotError;
use crate::domain::history::{HistoryEntry, Section, TradingHistory};
use crate::domain::summary::RunSummary;
use crate::domain::trader::{self, BotConfig, StopToken, Trader};
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use crate::ports::price_port::PricePort;

#[derive(Parser, Debug)]
#[command(name = "smacross", about = "SMA crossover paper-trading bot")]
pub struct Cli {
    /// INI configuration file; defaults apply to every missing key
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the trading bot
    Run,
    /// Show the transaction history
    History,
    /// Interactive menu (default)
    Menu,
    /// Delete the most recent entry from one history list
    DropLast {
        /// transactions or portfolio-history; prompted for when omitted
        #[arg(short, long)]
        section: Option<Section>,
    },
    /// Render the history as an SVG line chart
    Chart {
        #[arg(short, long, default_value = "percent")]
        kind: ChartKind,
        #[arg(short, long, value_delimiter = ',', default_value = "portfolio")]
        series: Vec<SeriesKind>,
        #[arg(short, long, default_value = "chart.svg")]
        output: PathBuf,
        #[arg(short, long)]
        title: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match cli.command.unwrap_or(Command::Menu) {
        Command::Run => {
            let stop = StopToken::new();
            if let Err(code) = install_interrupt_handler(&stop) {
                return code;
            }
            run_bot(&config, &stop)
        }
        Command::History => run_history(&config),
        Command::Menu => run_menu(&config),
        Command::DropLast { section } => run_drop_last(&config, section),
        Command::Chart {
            kind,
            series,
            output,
            title,
        } => run_chart(&config, kind, series, &output, title),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    let adapter = FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    tracing::debug!(source = adapter.source(), "configuration loaded");
    Ok(adapter)
}

pub fn build_bot_config(adapter: &dyn ConfigPort) -> Result<BotConfig, BotError> {
    validate_bot_config(adapter)?;
    let defaults = BotConfig::default();

    let equal_policy = match adapter.get_string("bot", "equal_policy") {
        Some(raw) => raw
            .parse::<EqualPolicy>()
            .map_err(|reason| BotError::ConfigInvalid {
                section: "bot".into(),
                key: "equal_policy".into(),
                reason,
            })?,
        None => defaults.equal_policy,
    };

    let interval_secs = adapter.get_double(
        "bot",
        "fetch_interval_secs",
        defaults.fetch_interval.as_secs_f64(),
    );
    let fetch_interval =
        Duration::try_from_secs_f64(interval_secs).map_err(|e| BotError::ConfigInvalid {
            section: "bot".into(),
            key: "fetch_interval_secs".into(),
            reason: e.to_string(),
        })?;

    Ok(BotConfig {
        symbol: adapter
            .get_string("exchange", "symbol")
            .map(|s| s.trim().to_uppercase())
            .unwrap_or(defaults.symbol),
        fetch_interval,
        sma_window_secs: adapter.get_int("bot", "sma_window_secs", defaults.sma_window_secs),
        initial_capital: adapter.get_double("bot", "initial_capital", defaults.initial_capital),
        equal_policy,
    })
}

pub fn history_path(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("history", "path")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH))
}

pub fn build_price_adapter(adapter: &dyn ConfigPort) -> Result<KrakenAdapter, BotError> {
    let base_url = adapter
        .get_string("exchange", "base_url")
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout = adapter.get_double("exchange", "timeout_secs", 10.0);
    let timeout =
        Duration::try_from_secs_f64(timeout).map_err(|e| BotError::ConfigInvalid {
            section: "exchange".into(),
            key: "timeout_secs".into(),
            reason: e.to_string(),
        })?;
    KrakenAdapter::new(&base_url, timeout)
}

fn install_interrupt_handler(stop: &StopToken) -> Result<(), ExitCode> {
    let token = stop.clone();
    ctrlc::set_handler(move || {
        if token.is_armed() {
            token.cancel();
        } else {
            std::process::exit(130);
        }
    })
    .map_err(|e| {
        eprintln!("error: failed to install Ctrl-C handler: {e}");
        ExitCode::from(1)
    })
}

pub fn run_bot(adapter: &dyn ConfigPort, stop: &StopToken) -> ExitCode {
    match start_bot(adapter, stop) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn start_bot(adapter: &dyn ConfigPort, stop: &StopToken) -> Result<RunSummary, BotError> {
    let config = build_bot_config(adapter)?;
    let price_port = build_price_adapter(adapter)?;
    let history_port = JsonHistoryAdapter::new(history_path(adapter));
    let summary = run_with_ports(config, &price_port, &history_port, stop, &mut io::stdout())?;
    Ok(summary)
}

/// Load history, trade until `stop` is cancelled, and print the start and
/// stop banners to `out`. A banner that cannot be written aborts before
/// any trading.
pub fn run_with_ports(
    config: BotConfig,
    price_port: &dyn PricePort,
    history_port: &dyn HistoryPort,
    stop: &StopToken,
    out: &mut dyn Write,
) -> io::Result<RunSummary> {
    let history = history_port.load_or_empty();
    let resuming = !history.portfolio_history.is_empty();
    let mut trader = Trader::new(config, history);

    write!(out, "{}", format_banner(&trader, resuming))?;
    out.flush()?;

    stop.arm();
    let summary = trader::run(&mut trader, price_port, history_port, stop);
    stop.disarm();

    write!(out, "{}", format_summary(&summary))?;
    out.flush()?;
    Ok(summary)
}

fn format_banner(trader: &Trader, resuming: bool) -> String {
    let label = if resuming {
        "Resuming with Capital"
    } else {
        "Initial Capital"
    };
    format!(
        "\n{label}: ${:.2}\nMonitoring {} price and {}-second SMA crossover signals...\n\n",
        trader.ledger().capital,
        trader.config().symbol,
        trader.config().sma_window_secs
    )
}

pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "\n--- Trading Bot Stopped ---\nFinal Portfolio Value: ${:.2}\nTotal Return: {:.2}%\n\n",
        summary.final_value,
        summary.total_return_pct()
    )
}

pub fn format_transactions(history: &TradingHistory) -> String {
    if history.transactions.is_empty() {
        return "\nNo transactions found.\n\n".to_string();
    }

    let mut out = String::from("\n--- Transaction History ---\n");
    out.push_str(&format!(
        "{:<23} {:<6} {:>14} {:>14} {:>14}\n",
        "timestamp", "action", "price", "btc_holding", "capital"
    ));
    for txn in &history.transactions {
        out.push_str(&format!(
            "{:<23} {:<6} {:>14.2} {:>14.8} {:>14.2}\n",
            txn.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            txn.action.to_string(),
            txn.price,
            txn.holding,
            txn.capital
        ));
    }
    out.push_str("----------------------------\n\n");
    out
}

fn run_history(adapter: &dyn ConfigPort) -> ExitCode {
    let history = JsonHistoryAdapter::new(history_path(adapter)).load_or_empty();
    print!("{}", format_transactions(&history));
    ExitCode::SUCCESS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    StartBot,
    ViewHistory,
    Exit,
}

/// Show the main menu and read choices until a valid one is entered.
/// Returns `None` at end of input.
pub fn read_menu_choice(input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<Option<MenuChoice>> {
    loop {
        writeln!(out, "=== Crossover Trading Bot ===")?;
        writeln!(out, "1. Start Trading Bot")?;
        writeln!(out, "2. View Transaction History")?;
        writeln!(out, "3. Exit")?;
        write!(out, "Enter your choice (1/2/3): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim() {
            "1" => return Ok(Some(MenuChoice::StartBot)),
            "2" => return Ok(Some(MenuChoice::ViewHistory)),
            "3" => return Ok(Some(MenuChoice::Exit)),
            _ => writeln!(out, "Invalid choice. Please enter 1, 2, or 3.\n")?,
        }
    }
}

fn run_menu(adapter: &dyn ConfigPort) -> ExitCode {
    let stop = StopToken::new();
    if let Err(code) = install_interrupt_handler(&stop) {
        return code;
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    loop {
        match read_menu_choice(&mut input, &mut out) {
            Ok(Some(MenuChoice::StartBot)) => {
                if let Err(e) = start_bot(adapter, &stop) {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
            Ok(Some(MenuChoice::ViewHistory)) => {
                run_history(adapter);
            }
            Ok(Some(MenuChoice::Exit)) | Ok(None) => {
                println!("Exiting the trading bot. Goodbye!");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                let err = BotError::from(e);
                eprintln!("error: {err}");
                return (&err).into();
            }
        }
    }
}

/// Prompt for the history list to edit. Returns `None` on cancel or end
/// of input.
pub fn read_section_choice(input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<Option<Section>> {
    loop {
        writeln!(out, "=== Delete Last Entry from Trading History ===")?;
        writeln!(out, "1. transactions")?;
        writeln!(out, "2. portfolio_history")?;
        writeln!(out, "3. cancel")?;
        write!(out, "Enter your choice (1/2/3): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let choice = line.trim();
        if choice == "3" {
            return Ok(None);
        }
        match choice.parse::<Section>() {
            Ok(section) => return Ok(Some(section)),
            Err(_) => writeln!(out, "Invalid choice. Please enter 1, 2, or 3.\n")?,
        }
    }
}

/// Remove and persist the most recent entry of `section`. A history that
/// cannot be read is left untouched.
pub fn drop_last_entry(port: &dyn HistoryPort, section: Section) -> Result<HistoryEntry, BotError> {
    let mut history = port.load()?;
    let removed = history.drop_last(section)?;
    port.save(&history)?;
    Ok(removed)
}

fn run_drop_last(adapter: &dyn ConfigPort, section: Option<Section>) -> ExitCode {
    let section = match section {
        Some(s) => s,
        None => {
            let stdin = io::stdin();
            match read_section_choice(&mut stdin.lock(), &mut io::stdout()) {
                Ok(Some(s)) => s,
                Ok(None) => {
                    println!("Operation cancelled.");
                    return ExitCode::SUCCESS;
                }
                Err(e) => {
                    let err = BotError::from(e);
                    eprintln!("error: {err}");
                    return (&err).into();
                }
            }
        }
    };

    let port = JsonHistoryAdapter::new(history_path(adapter));
    match drop_last_entry(&port, section) {
        Ok(removed) => {
            println!("Removed the last entry from '{section}':");
            println!("{}", removed.to_json_pretty());
            println!("Successfully updated '{}'.", port.path().display());
            ExitCode::SUCCESS
        }
        Err(BotError::EmptySection { section }) => {
            println!("The section '{section}' is already empty. Nothing to delete.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_chart(
    adapter: &dyn ConfigPort,
    kind: ChartKind,
    series: Vec<SeriesKind>,
    output: &Path,
    title: Option<String>,
) -> ExitCode {
    let port = JsonHistoryAdapter::new(history_path(adapter));
    let history = match port.load() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let default_title = match kind {
        ChartKind::Percent => "Portfolio Value Percent Change Over Time",
        ChartKind::Absolute => "Portfolio Value Over Time",
    };
    let options = ChartOptions {
        kind,
        series,
        title: title.unwrap_or_else(|| default_title.to_string()),
    };
    let svg = svg_chart::render_chart(&history, &options);

    match fs::write(output, svg) {
        Ok(()) => {
            eprintln!("Chart written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write chart: {e}");
            ExitCode::from(1)
        }
    }
}
