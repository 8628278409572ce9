//! Serializable backtest configuration, loaded from TOML.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration (SPY, SMA 20/50, stock, 10 000 cash, 2 bps fee, 3 bps
//! slippage).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use algosim_core::engine::{
    AllocationPolicy, CostModel, EngineConfig, ExecutionTiming, FeeModel, Instrument,
    OptionSettings,
};
use algosim_core::indicators::MaType;
use algosim_core::signal::PositionMode;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration for one backtest (or a batch over several symbols).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub data: DataSection,
    pub signal: SignalSection,
    pub costs: CostsSection,
    /// Unset means the instrument's default sizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizing: Option<AllocationPolicy>,
    pub options: OptionsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbols: Vec<String>,
    /// Inclusive; `None` keeps everything in the data file.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub initial_cash: f64,
    pub instrument: Instrument,
    pub position_mode: PositionMode,
    pub execution: ExecutionTiming,
    pub liquidate_at_end: bool,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbols: vec!["SPY".to_string()],
            start: None,
            end: None,
            initial_cash: 10_000.0,
            instrument: Instrument::Stock,
            position_mode: PositionMode::LongOnly,
            execution: ExecutionTiming::SignalClose,
            liquidate_at_end: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory holding `<SYMBOL>.csv` files.
    pub data_dir: PathBuf,
    /// Generate a deterministic random walk when no file exists.
    pub synthetic: bool,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSection {
    pub ma_type: MaType,
    pub fast: usize,
    pub slow: usize,
}

impl Default for SignalSection {
    fn default() -> Self {
        Self {
            ma_type: MaType::Sma,
            fast: 20,
            slow: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostsSection {
    pub fee: FeeModel,
    pub slippage_bps: f64,
}

impl Default for CostsSection {
    fn default() -> Self {
        Self {
            fee: FeeModel::Proportional { bps: 2.0 },
            slippage_bps: 3.0,
        }
    }
}

impl From<CostsSection> for CostModel {
    fn from(c: CostsSection) -> Self {
        CostModel::new(c.fee, c.slippage_bps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsSection {
    #[serde(flatten)]
    pub settings: OptionSettings,
    /// Returns in the realized-volatility window.
    pub volatility_window: usize,
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            settings: OptionSettings::default(),
            volatility_window: 20,
        }
    }
}

impl BacktestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.backtest.symbols.is_empty() {
            return invalid("backtest.symbols must not be empty".into());
        }
        if self.backtest.symbols.iter().any(|s| s.trim().is_empty()) {
            return invalid("backtest.symbols contains an empty symbol".into());
        }
        if let (Some(start), Some(end)) = (self.backtest.start, self.backtest.end) {
            if start > end {
                return invalid(format!("backtest.start {start} is after backtest.end {end}"));
            }
        }
        let s = &self.signal;
        if s.fast == 0 {
            return invalid("signal.fast must be >= 1".into());
        }
        if s.fast >= s.slow {
            return invalid(format!(
                "signal.fast ({}) must be smaller than signal.slow ({})",
                s.fast, s.slow
            ));
        }
        if self.options.volatility_window < 2 {
            return invalid(format!(
                "options.volatility_window must be >= 2, got {}",
                self.options.volatility_window
            ));
        }
        self.to_engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The engine's view of this configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_cash: self.backtest.initial_cash,
            instrument: self.backtest.instrument,
            costs: self.costs.into(),
            allocation: self
                .sizing
                .unwrap_or_else(|| self.backtest.instrument.default_allocation()),
            timing: self.backtest.execution,
            options: self.options.settings.clone(),
            liquidate_at_end: self.backtest.liquidate_at_end,
        }
    }

    /// Position mode actually applied. Option instruments only act on LONG.
    pub fn effective_position_mode(&self) -> PositionMode {
        if self.backtest.instrument.uses_options() {
            PositionMode::LongOnly
        } else {
            self.backtest.position_mode
        }
    }

    /// Copy of this configuration for a single symbol.
    pub fn for_symbol(&self, symbol: &str) -> Self {
        let mut config = self.clone();
        config.backtest.symbols = vec![symbol.to_string()];
        config
    }

    /// Deterministic hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
