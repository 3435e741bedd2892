use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hashing::HashAlgorithm;
use crate::types::{DeviceClass, ImageFormat, PerformanceBudget, QualityRange};

// ---------------------------------------------------------------------------
// DetectorConfig
//
// Loaded once and held behind an `Arc`; a reconfiguration replaces the whole
// value, nothing mutates a config that an in-flight request may be reading.
// Every section has complete defaults so a partial YAML document is valid.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub strategies: StrategiesConfig,
    pub cache: CacheConfig,
    pub budgets: BudgetTable,
    pub format_cascade: FormatCascadeConfig,
    pub quality_cascade: QualityCascadeConfig,
    pub device: DeviceThresholds,
    pub network: NetworkThresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub enabled: bool,
    pub priority: i32,
}

impl StrategyConfig {
    const fn enabled(priority: i32) -> Self {
        Self {
            enabled: true,
            priority,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::enabled(50)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    pub client_hints: StrategyConfig,
    pub accept_header: StrategyConfig,
    pub user_agent: StrategyConfig,
    pub static_data: StrategyConfig,
    pub defaults: StrategyConfig,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            client_hints: StrategyConfig::enabled(100),
            accept_header: StrategyConfig::enabled(80),
            user_agent: StrategyConfig::enabled(60),
            static_data: StrategyConfig::enabled(20),
            defaults: StrategyConfig::enabled(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_size: usize,
    pub prune_amount: usize,
    /// Entries older than this are recomputed. `None` keeps entries until evicted.
    pub ttl_ms: Option<u64>,
    /// User-Agent bytes fed into the cache-key hash.
    pub max_user_agent_length: usize,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 1000,
            prune_amount: 100,
            ttl_ms: None,
            max_user_agent_length: 256,
            hash_algorithm: HashAlgorithm::Djb2,
        }
    }
}

impl CacheConfig {
    /// Capacity actually granted to the cache (0 when disabled).
    pub fn effective_max_size(&self) -> usize {
        if self.enabled {
            self.max_size
        } else {
            0
        }
    }
}

/// Budget for one device tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBudget {
    pub quality: QualityRange,
    pub max_width: u32,
    pub max_height: u32,
    pub preferred_format: ImageFormat,
}

impl TierBudget {
    pub fn to_budget(&self, dpr: f64) -> PerformanceBudget {
        PerformanceBudget {
            quality: self.quality,
            max_width: self.max_width,
            max_height: self.max_height,
            preferred_format: self.preferred_format,
            dpr,
        }
    }
}

/// Performance budgets per device tier (`low` = low-end, `medium` = mid-range,
/// `high` = high-end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetTable {
    pub low: TierBudget,
    pub medium: TierBudget,
    pub high: TierBudget,
    /// Upper bound applied to any detected DPR.
    pub max_dpr: f64,
}

impl Default for BudgetTable {
    fn default() -> Self {
        Self {
            low: TierBudget {
                quality: QualityRange {
                    min: 50,
                    max: 70,
                    target: 60,
                },
                max_width: 800,
                max_height: 800,
                preferred_format: ImageFormat::Webp,
            },
            medium: TierBudget {
                quality: QualityRange {
                    min: 60,
                    max: 85,
                    target: 75,
                },
                max_width: 1600,
                max_height: 1600,
                preferred_format: ImageFormat::Webp,
            },
            high: TierBudget {
                quality: QualityRange {
                    min: 70,
                    max: 95,
                    target: 85,
                },
                max_width: 2560,
                max_height: 2560,
                preferred_format: ImageFormat::Avif,
            },
            max_dpr: 3.0,
        }
    }
}

impl BudgetTable {
    pub fn for_class(&self, class: DeviceClass) -> &TierBudget {
        match class {
            DeviceClass::LowEnd => &self.low,
            DeviceClass::MidRange => &self.medium,
            DeviceClass::HighEnd => &self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatCascadeConfig {
    pub accept_header_priority: i32,
    pub client_hints_priority: i32,
    pub browser_detection_priority: i32,
    /// Used when no rule matches.
    pub fallback: ImageFormat,
}

impl Default for FormatCascadeConfig {
    fn default() -> Self {
        Self {
            accept_header_priority: 100,
            client_hints_priority: 90,
            browser_detection_priority: 80,
            fallback: ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityCascadeConfig {
    pub save_data_priority: i32,
    pub network_condition_priority: i32,
    pub device_memory_priority: i32,
    pub device_cpu_priority: i32,
    pub slow_network_factor: f64,
    pub fast_network_factor: f64,
    /// Ignore network tiers that were guessed rather than reported.
    pub network_condition_requires_measurement: bool,
    pub high_memory_gb: f64,
    pub low_memory_gb: f64,
    pub high_cores: u32,
    pub low_cores: u32,
    pub dpr_adjustment: bool,
    pub dpr_increment: u8,
    /// Cap applied after the DPR increment.
    pub max_quality: u8,
}

impl Default for QualityCascadeConfig {
    fn default() -> Self {
        Self {
            save_data_priority: 100,
            network_condition_priority: 90,
            device_memory_priority: 80,
            device_cpu_priority: 70,
            slow_network_factor: 0.85,
            fast_network_factor: 1.1,
            network_condition_requires_measurement: false,
            high_memory_gb: 8.0,
            low_memory_gb: 2.0,
            high_cores: 8,
            low_cores: 2,
            dpr_adjustment: true,
            dpr_increment: 5,
            max_quality: 95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceThresholds {
    pub high_end_score: u8,
    pub mid_range_score: u8,
}

impl Default for DeviceThresholds {
    fn default() -> Self {
        Self {
            high_end_score: 65,
            mid_range_score: 35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkThresholds {
    /// Below this RTT (and above `fast_downlink_mbps`) the network is fast.
    pub fast_rtt_ms: u32,
    /// Above this RTT the network is slow.
    pub slow_rtt_ms: u32,
    pub fast_downlink_mbps: f64,
    pub slow_downlink_mbps: f64,
}

impl Default for NetworkThresholds {
    fn default() -> Self {
        Self {
            fast_rtt_ms: 100,
            slow_rtt_ms: 500,
            fast_downlink_mbps: 5.0,
            slow_downlink_mbps: 1.0,
        }
    }
}

impl DetectorConfig {
    /// Parse a YAML document; missing sections and fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load from `path` if given, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let cache = &self.cache;
        if cache.effective_max_size() > 0 && cache.prune_amount == 0 {
            return Err(invalid("cache.prune_amount must be at least 1"));
        }
        if cache.max_user_agent_length == 0 {
            return Err(invalid("cache.max_user_agent_length must be at least 1"));
        }

        for (tier, budget) in [
            ("low", &self.budgets.low),
            ("medium", &self.budgets.medium),
            ("high", &self.budgets.high),
        ] {
            let q = budget.quality;
            if q.min > q.max || q.target < q.min || q.target > q.max || q.max > 100 {
                return Err(invalid(format!(
                    "budgets.{tier}.quality must satisfy min <= target <= max <= 100"
                )));
            }
        }
        if !(self.budgets.max_dpr.is_finite() && self.budgets.max_dpr >= 1.0) {
            return Err(invalid("budgets.max_dpr must be a finite number >= 1"));
        }

        let qc = &self.quality_cascade;
        if !positive(qc.slow_network_factor) || !positive(qc.fast_network_factor) {
            return Err(invalid("quality_cascade network factors must be positive"));
        }
        if !positive(qc.low_memory_gb) || !positive(qc.high_memory_gb) {
            return Err(invalid("quality_cascade memory thresholds must be positive"));
        }
        if qc.low_memory_gb >= qc.high_memory_gb || qc.low_cores >= qc.high_cores {
            return Err(invalid(
                "quality_cascade low thresholds must be below high thresholds",
            ));
        }
        if qc.max_quality == 0 || qc.max_quality > 100 {
            return Err(invalid("quality_cascade.max_quality must be in 1..=100"));
        }

        if self.device.mid_range_score > self.device.high_end_score {
            return Err(invalid("device.mid_range_score must not exceed high_end_score"));
        }
        let net = &self.network;
        if !positive(net.slow_downlink_mbps) || !positive(net.fast_downlink_mbps) {
            return Err(invalid("network downlink thresholds must be positive"));
        }
        if net.fast_rtt_ms > net.slow_rtt_ms || net.slow_downlink_mbps > net.fast_downlink_mbps {
            return Err(invalid("network fast/slow thresholds are inverted"));
        }
        Ok(())
    }
}

/// Finite and strictly positive; rejects NaN and infinities.
fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}
