//! Analysis configuration
//!
//! Every setting has a default matching the daily bike-rental workflow, so
//! a TOML file only needs the values that differ:
//!
//! ```toml
//! horizon = 14
//! levels = [90.0]
//!
//! [csv]
//! value_column = "registered"
//!
//! [manual_order]
//! p = 1
//! d = 1
//! q = 7
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bikecast_core::algorithms::arima::{ArimaOrder, ArimaSpec};
use bikecast_core::data::CsvSpec;
use bikecast_core::utils::preprocessing::CleanConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decomposition::{DecompositionMethod, SeasonalWindow, StlConfig};
use crate::selection::AutoArimaConfig;

/// Errors loading or validating an [`AnalysisConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Settings for [`crate::Analysis`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub csv: CsvSpec,
    pub cleaning: CleanConfig,
    /// Order of the weekly centered moving average
    pub weekly_order: usize,
    /// Order of the monthly centered moving average
    pub monthly_order: usize,
    /// Seasonal period used for STL and the seasonal refit
    pub stl_period: usize,
    pub decomposition: DecompositionMethod,
    pub stl_window: SeasonalWindow,
    pub stl_robust: bool,
    /// Lagged differences in the ADF regression; default `trunc((n-1)^(1/3))`
    pub adf_lags: Option<usize>,
    /// Correlogram depth; default `10 log10(n)`
    pub acf_max_lag: Option<usize>,
    /// Ljung-Box lag; default `min(10, n / 5)`
    pub ljung_box_lag: Option<usize>,
    /// Significance level for tests and correlogram bounds
    pub significance: f64,
    pub horizon: usize,
    /// Prediction interval levels in percent
    pub levels: Vec<f64>,
    /// Order refitted by hand after the automatic selection
    pub manual_order: Option<ArimaOrder>,
    /// Trailing observations held out for evaluation; 0 disables
    pub holdout: usize,
    pub auto: AutoArimaConfig,
    /// Also select a seasonal model at `stl_period`
    pub seasonal_refit: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            csv: CsvSpec::default(),
            cleaning: CleanConfig::default(),
            weekly_order: 7,
            monthly_order: 30,
            stl_period: 30,
            decomposition: DecompositionMethod::Stl,
            stl_window: SeasonalWindow::Periodic,
            stl_robust: false,
            adf_lags: None,
            acf_max_lag: None,
            ljung_box_lag: None,
            significance: 0.05,
            horizon: 30,
            levels: vec![80.0, 95.0],
            manual_order: None,
            holdout: 25,
            auto: AutoArimaConfig::non_seasonal(),
            seasonal_refit: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weekly_order == 0 {
            return Err(invalid("weekly_order", "must be at least 1"));
        }
        if self.monthly_order == 0 {
            return Err(invalid("monthly_order", "must be at least 1"));
        }
        if self.stl_period < 2 {
            return Err(invalid("stl_period", "must be at least 2"));
        }
        if self.cleaning.window == 0 || self.cleaning.window % 2 == 0 {
            return Err(invalid("cleaning.window", "must be odd and positive"));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(invalid("significance", "must be in (0, 1)"));
        }
        if self.horizon == 0 {
            return Err(invalid("horizon", "must be at least 1"));
        }
        if let Some(level) = self.levels.iter().find(|l| !(**l > 0.0 && **l < 100.0)) {
            return Err(invalid(
                "levels",
                format!("{} is not a percentage in (0, 100)", level),
            ));
        }
        if let Some(order) = self.manual_order {
            ArimaSpec::new(order.p, order.d, order.q)
                .validate()
                .map_err(|e| invalid("manual_order", e.to_string()))?;
        }
        if self.auto.max_models == 0 {
            return Err(invalid("auto.max_models", "must be at least 1"));
        }
        Ok(())
    }

    /// Interval levels as fractions in (0, 1)
    pub fn interval_levels(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l / 100.0).collect()
    }

    /// STL settings for the deseasonalizing step
    pub fn stl_config(&self) -> StlConfig {
        let config = StlConfig::new(self.stl_period).with_seasonal_window(self.stl_window);
        if self.stl_robust {
            config.robust()
        } else {
            config
        }
    }
}
