use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Look-back windows and the default regression threshold
///
/// The plan classification thresholds are fixed and deliberately absent here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Threshold used when a caller passes none (default: 20.0)
    pub default_threshold_percent: f64,
    /// Trailing window for current-vs-historical comparison (default: 7)
    #[serde(deserialize_with = "deserialize_days_i64")]
    pub history_days: i64,
    /// Trailing window for trend analysis (default: 30)
    #[serde(deserialize_with = "deserialize_days_i64")]
    pub trend_days: i64,
    /// Older period of regression detection (default: 7)
    #[serde(deserialize_with = "deserialize_days_i64")]
    pub baseline_days: i64,
    /// Recent period of regression detection, ends now (default: 1)
    #[serde(deserialize_with = "deserialize_days_i64")]
    pub recent_days: i64,
}

impl Config {
    /// Load configuration with environment variable and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Environment variables (prefixed with APP_, `.env` is read first)
    /// 2. Configuration file (`path`, else conf/config.toml or config.toml)
    /// 3. Default values
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }

        let config_path = path.map(str::to_string).or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,stellar_regression=debug")
    /// - APP_LOG_FILE: Log file path, empty to log to stdout only
    /// - APP_ANALYSIS_THRESHOLD_PERCENT: Default regression threshold (e.g., "25")
    /// - APP_ANALYSIS_HISTORY_DAYS: History window (accepts "7d", "2w")
    /// - APP_ANALYSIS_TREND_DAYS: Trend window (accepts "30d")
    /// - APP_ANALYSIS_BASELINE_DAYS: Baseline period of regression detection
    /// - APP_ANALYSIS_RECENT_DAYS: Recent period of regression detection
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Some(file) = lookup("APP_LOG_FILE") {
            self.logging.file = if file.trim().is_empty() { None } else { Some(file) };
            tracing::info!("Override logging.file from env: {:?}", self.logging.file);
        }

        if let Some(threshold) = lookup("APP_ANALYSIS_THRESHOLD_PERCENT") {
            match threshold.trim().parse::<f64>() {
                Ok(val) => {
                    self.analysis.default_threshold_percent = val;
                    tracing::info!(
                        "Override analysis.default_threshold_percent from env: {}",
                        self.analysis.default_threshold_percent
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_ANALYSIS_THRESHOLD_PERCENT '{}': {} (keep {})",
                    threshold,
                    e,
                    self.analysis.default_threshold_percent
                ),
            }
        }

        let windows: [(&str, &str, &mut i64); 4] = [
            ("APP_ANALYSIS_HISTORY_DAYS", "history_days", &mut self.analysis.history_days),
            ("APP_ANALYSIS_TREND_DAYS", "trend_days", &mut self.analysis.trend_days),
            ("APP_ANALYSIS_BASELINE_DAYS", "baseline_days", &mut self.analysis.baseline_days),
            ("APP_ANALYSIS_RECENT_DAYS", "recent_days", &mut self.analysis.recent_days),
        ];
        for (key, field, target) in windows {
            let Some(raw) = lookup(key) else { continue };
            match parse_days_to_i64(&raw) {
                Ok(val) => {
                    *target = val;
                    tracing::info!("Override analysis.{} from env: {}", field, val);
                },
                Err(e) => tracing::warn!("Invalid {} '{}': {} (keep {})", key, raw, e, target),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let threshold = self.analysis.default_threshold_percent;
        if !threshold.is_finite() || threshold <= 0.0 {
            anyhow::bail!("analysis.default_threshold_percent must be a positive number");
        }

        for (field, days) in [
            ("history_days", self.analysis.history_days),
            ("trend_days", self.analysis.trend_days),
            ("baseline_days", self.analysis.baseline_days),
            ("recent_days", self.analysis.recent_days),
        ] {
            if days <= 0 {
                anyhow::bail!("analysis.{} must be > 0", field);
            }
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,stellar_regression=debug".to_string(), file: None }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_threshold_percent: 20.0,
            history_days: 7,
            trend_days: 30,
            baseline_days: 7,
            recent_days: 1,
        }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_days_to_i64(input: &str) -> Result<i64, String> {
    // Accept plain numbers (treated as days)
    if let Ok(val) = input.trim().parse::<i64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: i64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit.trim() {
        "d" | "day" | "days" => Ok(n),
        "w" | "week" | "weeks" => {
            n.checked_mul(7).ok_or_else(|| "day count too large".to_string())
        },
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Custom serde deserializer to support numeric or human-friendly string values
fn deserialize_days_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = i64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of days or a string like '7d' or '2w'")
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            i64::try_from(v).map_err(|_| E::custom("day count too large"))
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_days_to_i64(v).map_err(E::custom)
        }
        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_days_to_i64(&v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
