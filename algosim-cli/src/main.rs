//! AlgoSim CLI: run backtests and parameter sweeps.
//!
//! Commands:
//! - `run`: backtest one or more tickers from a TOML config and/or flags
//! - `sweep`: rank (fast, slow) moving-average windows on one ticker

mod obs;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use algosim_core::engine::{AllocationPolicy, ExecutionTiming, FeeModel, Instrument};
use algosim_core::indicators::MaType;
use algosim_core::signal::PositionMode;
use algosim_runner::data_loader::load_bars;
use algosim_runner::runner::load_options;
use algosim_runner::sweep::parse_periods;
use algosim_runner::{
    parse_symbols, run_batch, run_sweep, save_artifacts, BacktestConfig, BacktestResult,
    ParamGrid,
};

#[derive(Parser)]
#[command(
    name = "algosim",
    about = "AlgoSim: moving-average crossover backtests on stocks and option overlays"
)]
struct Cli {
    /// Log filter (overridden by ALGOSIM_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every ticker and print a summary per ticker.
    Run {
        #[command(flatten)]
        opts: CommonOpts,

        /// Fast moving-average window.
        #[arg(long)]
        fast: Option<usize>,

        /// Slow moving-average window.
        #[arg(long)]
        slow: Option<usize>,

        /// Write manifest.json, equity.csv and trades.csv per ticker here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Sweep moving-average windows on the first ticker, ranked by Sharpe.
    Sweep {
        #[command(flatten)]
        opts: CommonOpts,

        /// Fast windows: a list "5,10,20" or a range "5..30:5".
        #[arg(long, default_value = "5..30:5")]
        fast: String,

        /// Slow windows: a list "50,100" or a range "20..200:20".
        #[arg(long, default_value = "20..200:20")]
        slow: String,

        /// How many ranked rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Args)]
struct CommonOpts {
    /// TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker or comma list (e.g. QQQ,SPY,AAPL).
    #[arg(long)]
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Stock position mode. Option modes are always long only.
    #[arg(long, value_enum)]
    position: Option<PositionArg>,

    #[arg(long, value_enum)]
    ma: Option<MaArg>,

    #[arg(long)]
    initial_cash: Option<f64>,

    /// Proportional fee in basis points.
    #[arg(long, conflicts_with = "fixed_fee")]
    fee_bps: Option<f64>,

    /// Fixed fee per trade.
    #[arg(long)]
    fixed_fee: Option<f64>,

    #[arg(long)]
    slip_bps: Option<f64>,

    #[arg(long, value_enum)]
    execution: Option<ExecutionArg>,

    /// Option life in trading periods.
    #[arg(long)]
    dte: Option<usize>,

    /// Realized-volatility window in returns.
    #[arg(long)]
    rv_window: Option<usize>,

    /// OTM offset as a fraction of spot (0.05 = 5%).
    #[arg(long)]
    otm: Option<f64>,

    /// Strike rounding step; 0 disables rounding.
    #[arg(long)]
    strike_step: Option<f64>,

    /// Fixed size per entry: call contracts, or shares for the other modes.
    #[arg(long)]
    contracts: Option<f64>,

    /// Close any open position on the last bar.
    #[arg(long)]
    liquidate: bool,

    /// Directory with <TICKER>.csv files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Generate synthetic data for tickers without a data file.
    #[arg(long)]
    synthetic: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Stock,
    LongCall,
    ProtectivePut,
}

#[derive(Clone, Copy, ValueEnum)]
enum PositionArg {
    Long,
    Short,
    Both,
}

#[derive(Clone, Copy, ValueEnum)]
enum MaArg {
    Sma,
    Ema,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExecutionArg {
    SignalClose,
    NextOpen,
    NextClose,
}

impl From<ModeArg> for Instrument {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Stock => Instrument::Stock,
            ModeArg::LongCall => Instrument::LongCall,
            ModeArg::ProtectivePut => Instrument::ProtectivePut,
        }
    }
}

impl From<PositionArg> for PositionMode {
    fn from(p: PositionArg) -> Self {
        match p {
            PositionArg::Long => PositionMode::LongOnly,
            PositionArg::Short => PositionMode::ShortOnly,
            PositionArg::Both => PositionMode::LongShort,
        }
    }
}

impl From<MaArg> for MaType {
    fn from(m: MaArg) -> Self {
        match m {
            MaArg::Sma => MaType::Sma,
            MaArg::Ema => MaType::Ema,
        }
    }
}

impl From<ExecutionArg> for ExecutionTiming {
    fn from(e: ExecutionArg) -> Self {
        match e {
            ExecutionArg::SignalClose => ExecutionTiming::SignalClose,
            ExecutionArg::NextOpen => ExecutionTiming::NextOpen,
            ExecutionArg::NextClose => ExecutionTiming::NextClose,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Run {
            opts,
            fast,
            slow,
            output_dir,
        } => {
            let mut config = build_config(&opts)?;
            if let Some(f) = fast {
                config.signal.fast = f;
            }
            if let Some(s) = slow {
                config.signal.slow = s;
            }
            config.validate()?;
            run_cmd(&config, output_dir.as_deref())
        }
        Commands::Sweep {
            opts,
            fast,
            slow,
            top,
        } => {
            let config = build_config(&opts)?;
            config.validate()?;
            let grid = ParamGrid::new(periods("--fast", &fast)?, periods("--slow", &slow)?);
            sweep_cmd(&config, &grid, top)
        }
    }
}

fn periods(flag: &str, raw: &str) -> Result<Vec<usize>> {
    parse_periods(raw).with_context(|| format!("invalid {flag} '{raw}'"))
}

/// Config file (or defaults) with every given flag applied on top.
fn build_config(opts: &CommonOpts) -> Result<BacktestConfig> {
    let mut config = match &opts.config {
        Some(path) => BacktestConfig::from_file(path)?,
        None => BacktestConfig::default(),
    };

    if let Some(raw) = &opts.ticker {
        let symbols = parse_symbols(raw);
        if symbols.is_empty() {
            bail!("--ticker '{raw}' contains no symbols");
        }
        config.backtest.symbols = symbols;
    }
    let bt = &mut config.backtest;
    if opts.start.is_some() {
        bt.start = opts.start;
    }
    if opts.end.is_some() {
        bt.end = opts.end;
    }
    if let Some(m) = opts.mode {
        bt.instrument = m.into();
    }
    if let Some(p) = opts.position {
        bt.position_mode = p.into();
    }
    if let Some(cash) = opts.initial_cash {
        bt.initial_cash = cash;
    }
    if let Some(e) = opts.execution {
        bt.execution = e.into();
    }
    bt.liquidate_at_end |= opts.liquidate;

    if let Some(m) = opts.ma {
        config.signal.ma_type = m.into();
    }
    if let Some(bps) = opts.fee_bps {
        config.costs.fee = FeeModel::Proportional { bps };
    }
    if let Some(amount) = opts.fixed_fee {
        config.costs.fee = FeeModel::Fixed { amount };
    }
    if let Some(bps) = opts.slip_bps {
        config.costs.slippage_bps = bps;
    }

    let options = &mut config.options;
    if let Some(dte) = opts.dte {
        options.settings.horizon = dte;
    }
    if let Some(w) = opts.rv_window {
        options.volatility_window = w;
    }
    if let Some(otm) = opts.otm {
        options.settings.moneyness_offset = otm;
    }
    if let Some(step) = opts.strike_step {
        options.settings.strike_step = step;
    }

    if let Some(quantity) = opts.contracts {
        config.sizing = Some(AllocationPolicy::FixedQuantity { quantity });
    }

    if let Some(dir) = &opts.data_dir {
        config.data.data_dir = dir.clone();
    }
    config.data.synthetic |= opts.synthetic;
    Ok(config)
}

fn run_cmd(config: &BacktestConfig, output_dir: Option<&Path>) -> Result<()> {
    print_run_config(config);
    info!(run_id = %config.run_id(), "starting run");

    let outcome = run_batch(config, None);
    for failure in &outcome.failures {
        println!("\n[SKIP] {}: {}", failure.symbol, failure.error);
    }
    for result in &outcome.results {
        print_summary(result);
        if let Some(dir) = output_dir {
            let run_dir = save_artifacts(result, dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }

    if outcome.results.is_empty() {
        bail!("no ticker produced a result");
    }
    Ok(())
}

fn sweep_cmd(config: &BacktestConfig, grid: &ParamGrid, top: usize) -> Result<()> {
    let symbol = config
        .backtest
        .symbols
        .first()
        .context("no ticker to sweep")?;
    let data = load_bars(symbol, &load_options(config))?;
    info!(symbol = %symbol, points = grid.size(), bars = data.bars.len(), "starting sweep");
    let results = run_sweep(grid, config, &data, None);
    if results.is_empty() {
        bail!("no sweep point completed for {symbol}");
    }

    println!();
    println!(
        "=== Sweep: {symbol} | {:?} | {} points ({} skipped) ===",
        config.backtest.instrument,
        results.len(),
        results.skipped.len()
    );
    println!(
        "{:>5} {:>5} {:>8} {:>9} {:>9} {:>7} {:>14}",
        "fast", "slow", "sharpe", "CAGR", "MaxDD", "trades", "final equity"
    );
    for r in results.top(top) {
        let m = &r.metrics;
        println!(
            "{:>5} {:>5} {:>8.3} {:>8.2}% {:>8.2}% {:>7} {:>14.2}",
            r.config.signal.fast,
            r.config.signal.slow,
            m.sharpe,
            m.cagr * 100.0,
            m.max_drawdown * 100.0,
            m.trade_count,
            m.final_equity
        );
    }
    Ok(())
}

fn print_run_config(config: &BacktestConfig) {
    let bt = &config.backtest;
    println!("=== Run Config ===");
    println!("Tickers:        {}", bt.symbols.join(", "));
    println!("Mode:           {:?}", bt.instrument);
    if !bt.instrument.uses_options() {
        println!("Position:       {:?}", bt.position_mode);
    }
    println!(
        "MA:             {:?}({}, {})",
        config.signal.ma_type, config.signal.fast, config.signal.slow
    );
    println!("Execution:      {:?}", bt.execution);
    println!(
        "Fee / slippage: {:?} / {} bps",
        config.costs.fee, config.costs.slippage_bps
    );
    if bt.instrument.uses_options() {
        let o = &config.options;
        println!(
            "Options:        {} periods, {:.1}% OTM, RV window {}",
            o.settings.horizon,
            o.settings.moneyness_offset * 100.0,
            o.volatility_window
        );
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    let config = &result.config;
    println!();
    println!(
        "=== {} | {:?} | {:?}({},{}) | {:?} ===",
        result.symbol,
        config.backtest.instrument,
        config.signal.ma_type,
        config.signal.fast,
        config.signal.slow,
        config.backtest.execution
    );
    println!("Period:         {} to {}", result.start_date, result.end_date);
    println!("Bars:           {}", result.bar_count);
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("CAGR:           {:.2}%", m.cagr * 100.0);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Trades:         {}", m.trade_count);
    println!("Total Costs:    {:.2}", m.total_costs);
    if let Some(b) = &m.benchmark {
        println!("--- Buy & Hold ---");
        println!("Final Equity:   {:.2}", b.final_equity);
        println!("CAGR:           {:.2}%", b.cagr * 100.0);
        println!("Max Drawdown:   {:.2}%", b.max_drawdown * 100.0);
    }
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
