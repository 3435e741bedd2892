use std::sync::Arc;

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::headers::RequestHeaders;
use crate::types::*;

use super::{DetectionStrategy, PartialDetection};

pub(crate) const DEFAULT_STRATEGY_NAME: &str = "default";

pub(crate) fn baseline_formats() -> FormatSupport {
    FormatSupport {
        webp: false,
        avif: false,
        source: FormatSource::Defaults,
    }
}

pub(crate) fn baseline_network() -> NetworkQuality {
    NetworkQuality::estimated(NetworkTier::Medium, "no network information")
}

pub(crate) fn baseline_device() -> DeviceCapabilities {
    DeviceCapabilities::estimated(DeviceClass::MidRange, 50)
}

pub(crate) fn baseline_performance(config: &DetectorConfig) -> PerformanceBudget {
    config.budgets.medium.to_budget(1.0)
}

/// Never fails: conservative values for every field, all marked estimated.
pub struct DefaultStrategy {
    priority: i32,
    config: Arc<DetectorConfig>,
}

impl DefaultStrategy {
    pub fn new(priority: i32, config: Arc<DetectorConfig>) -> Self {
        Self { priority, config }
    }

    /// A complete record built from conservative values alone.
    pub fn baseline_record(config: &DetectorConfig) -> CapabilityRecord {
        CapabilityRecord {
            browser: BrowserInfo::unknown(),
            formats: baseline_formats(),
            network: baseline_network(),
            device: baseline_device(),
            performance: baseline_performance(config),
            client_hints: ClientHints::default(),
            detection_time_ms: 0.0,
            detection_source: format!("{0}+{0}", DEFAULT_STRATEGY_NAME),
            sources: FieldSources {
                browser: DEFAULT_STRATEGY_NAME,
                formats: DEFAULT_STRATEGY_NAME,
                network: DEFAULT_STRATEGY_NAME,
                device: DEFAULT_STRATEGY_NAME,
                performance: DEFAULT_STRATEGY_NAME,
            },
        }
    }
}

impl DetectionStrategy for DefaultStrategy {
    fn name(&self) -> &'static str {
        DEFAULT_STRATEGY_NAME
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn detect(&self, _request: &dyn RequestHeaders) -> Result<Option<PartialDetection>> {
        Ok(Some(PartialDetection {
            browser: Some(BrowserInfo::unknown()),
            formats: Some(baseline_formats()),
            network: Some(baseline_network()),
            device: Some(baseline_device()),
            performance: Some(baseline_performance(&self.config)),
            client_hints: None,
        }))
    }
}
