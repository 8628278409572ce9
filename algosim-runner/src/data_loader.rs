//! Bar loading for the runner.
//!
//! Resolution policy for a symbol:
//! 1. `<data_dir>/<SYMBOL>.csv` exists → parse it
//! 2. no file and `synthetic` → generate a deterministic random walk (tagged)
//! 3. otherwise → fail with a clear error
//!
//! Bars are filtered to the inclusive `[start, end]` range after loading.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use algosim_core::domain::Bar;

/// Range used for synthetic data when the config leaves a bound open.
const SYNTHETIC_START: (i32, u32, u32) = (2018, 1, 1);
const SYNTHETIC_END: (i32, u32, u32) = (2025, 12, 31);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{symbol}' at {path} (use --synthetic for synthetic data)")]
    NotFound { symbol: String, path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: {reason}")]
    BadRow { row: usize, reason: String },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("no bars for '{symbol}' in the requested range")]
    Empty { symbol: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Generate synthetic bars when no file exists.
    pub synthetic: bool,
}

impl LoadOptions {
    pub fn in_range(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Bars for one symbol plus their provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over all bar data.
    pub dataset_hash: String,
    pub synthetic: bool,
}

pub fn csv_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", symbol.to_uppercase()))
}

/// Load bars for one symbol, with fallback to synthetic data.
pub fn load_bars(symbol: &str, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let path = csv_path(&opts.data_dir, symbol);

    let (bars, source) = if path.exists() {
        let file = std::fs::File::open(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let bars = read_csv_bars(file)?;
        debug!(symbol, path = %path.display(), bars = bars.len(), "loaded CSV");
        (bars, DataSource::Csv(path))
    } else if opts.synthetic {
        warn!(symbol, "generating synthetic data; results are tagged as synthetic");
        let start = opts.start.unwrap_or_else(|| ymd(SYNTHETIC_START));
        let end = opts.end.unwrap_or_else(|| ymd(SYNTHETIC_END));
        (generate_synthetic_bars(symbol, start, end), DataSource::Synthetic)
    } else {
        return Err(LoadError::NotFound {
            symbol: symbol.to_string(),
            path,
        });
    };

    let bars: Vec<Bar> = bars.into_iter().filter(|b| opts.in_range(b.date)).collect();
    if bars.is_empty() {
        return Err(LoadError::Empty {
            symbol: symbol.to_string(),
        });
    }

    let synthetic = source == DataSource::Synthetic;
    Ok(LoadedData {
        symbol: symbol.to_string(),
        dataset_hash: compute_dataset_hash(symbol, &bars),
        bars,
        source,
        synthetic,
    })
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_ascii_lowercase();
                aliases.iter().any(|a| *a == h)
            })
        };
        let require = |name: &'static str, aliases: &[&str]| {
            find(aliases).ok_or(LoadError::MissingColumn(name))
        };

        Ok(Self {
            // A pandas index written without a name leaves the first header blank.
            date: find(&["date", "datetime", "timestamp", "time", ""])
                .ok_or(LoadError::MissingColumn("Date"))?,
            open: require("Open", &["open", "o"])?,
            high: require("High", &["high", "h"])?,
            low: require("Low", &["low", "l"])?,
            close: require("Close", &["close", "c"])?,
            volume: find(&["volume", "vol", "v"]),
        })
    }
}

/// Parse daily bars from CSV. Rows come back sorted by date.
///
/// Rows with an empty price cell or inconsistent OHLC are skipped; any other
/// malformed value is an error. An optional Adj Close column is ignored.
pub fn read_csv_bars<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let cols = Columns::resolve(rdr.headers()?)?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    let mut inconsistent = 0usize;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let prices = [cols.open, cols.high, cols.low, cols.close].map(field);
        if prices.iter().any(|p| p.is_empty() || p.eq_ignore_ascii_case("nan")) {
            skipped += 1;
            continue;
        }
        let [open, high, low, close] = prices.map(|p| p.parse::<f64>());
        let parsed = (|| Some((open.ok()?, high.ok()?, low.ok()?, close.ok()?)))();
        let (open, high, low, close) = parsed.ok_or_else(|| LoadError::BadRow {
            row,
            reason: format!("unparseable price in {prices:?}"),
        })?;

        let date = parse_date(field(cols.date)).ok_or_else(|| LoadError::BadRow {
            row,
            reason: format!("unparseable date '{}'", field(cols.date)),
        })?;
        let volume = match cols.volume.map(field) {
            None | Some("") => 0,
            Some(v) => v.parse::<f64>().map(|v| v.max(0.0) as u64).map_err(|_| {
                LoadError::BadRow {
                    row,
                    reason: format!("unparseable volume '{v}'"),
                }
            })?,
        };
        let bar = Bar::new(date, open, high, low, close, volume);
        if !bar.is_sane() {
            inconsistent += 1;
            continue;
        }
        bars.push(bar);
    }
    if skipped > 0 {
        warn!(skipped, "skipped rows with missing prices");
    }
    if inconsistent > 0 {
        warn!(inconsistent, "skipped rows with inconsistent OHLC");
    }

    bars.sort_by_key(|b| b.date);
    if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::DuplicateDate(w[1].date));
    }
    Ok(bars)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split(|c| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Deterministic BLAKE3 hash over the symbol and every bar.
pub fn compute_dataset_hash(symbol: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Random walk on weekdays from 100.0, seeded by the symbol name.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price * (1.0 + rng.gen_range(-0.005..0.005));
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar::new(current, open, high, low, close, volume));

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
