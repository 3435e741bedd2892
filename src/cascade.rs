use std::cmp::Reverse;

use serde::Serialize;

use crate::config::{DetectorConfig, FormatCascadeConfig};
use crate::types::*;

/// Rule name reported when no format rule matched.
pub const FALLBACK_RULE: &str = "fallback";
/// Rule name reported when no quality rule matched.
pub const BASE_RULE: &str = "base";

// ---------------------------------------------------------------------------
// Format cascade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatRule {
    AcceptHeader,
    ClientHints,
    BrowserDetection,
}

impl FormatRule {
    fn name(self) -> &'static str {
        match self {
            Self::AcceptHeader => "accept-header",
            Self::ClientHints => "client-hints",
            Self::BrowserDetection => "browser-detection",
        }
    }

    fn applies_to(self, source: FormatSource) -> bool {
        match self {
            Self::AcceptHeader => source == FormatSource::AcceptHeader,
            Self::ClientHints => source == FormatSource::ClientHints,
            Self::BrowserDetection => {
                matches!(source, FormatSource::UserAgent | FormatSource::StaticData)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDecision {
    pub format: ImageFormat,
    /// Name of the rule that decided, or `"fallback"`.
    pub rule: &'static str,
}

/// Pick the output format for a record: AVIF, then WebP, from the most
/// trusted source of format support; otherwise the configured fallback.
pub fn decide_format(record: &CapabilityRecord, config: &FormatCascadeConfig) -> FormatDecision {
    let mut rules = [
        (FormatRule::AcceptHeader, config.accept_header_priority),
        (FormatRule::ClientHints, config.client_hints_priority),
        (FormatRule::BrowserDetection, config.browser_detection_priority),
    ];
    rules.sort_by_key(|&(_, priority)| Reverse(priority));

    let formats = &record.formats;
    rules
        .iter()
        .filter(|(rule, _)| rule.applies_to(formats.source))
        .find_map(|(rule, _)| {
            formats.best_modern().map(|format| FormatDecision {
                format,
                rule: rule.name(),
            })
        })
        .unwrap_or(FormatDecision {
            format: config.fallback,
            rule: FALLBACK_RULE,
        })
}

// ---------------------------------------------------------------------------
// Quality cascade
//
// Two stages: one discrete rule picks the quality regime, then DPR nudges the
// result. DPR never competes with the rules.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualityRule {
    SaveData,
    NetworkCondition,
    DeviceMemory,
    DeviceCpu,
}

impl QualityRule {
    fn name(self) -> &'static str {
        match self {
            Self::SaveData => "save-data",
            Self::NetworkCondition => "network-condition",
            Self::DeviceMemory => "device-memory",
            Self::DeviceCpu => "device-cpu",
        }
    }

    fn evaluate(self, record: &CapabilityRecord, config: &DetectorConfig, base: u8) -> Option<u8> {
        let qc = &config.quality_cascade;
        let budgets = &config.budgets;
        match self {
            Self::SaveData => record
                .client_hints
                .save_data_on()
                .then_some(budgets.low.quality.min),
            Self::NetworkCondition => {
                if record.network.estimated && qc.network_condition_requires_measurement {
                    return None;
                }
                match record.network.tier {
                    NetworkTier::Slow => Some(scale(base, qc.slow_network_factor)),
                    NetworkTier::Fast => {
                        Some(scale(base, qc.fast_network_factor).min(budgets.high.quality.max))
                    }
                    NetworkTier::Medium => None,
                }
            }
            Self::DeviceMemory => {
                let memory = record
                    .client_hints
                    .device_memory
                    .or(record.device.memory_gb)?;
                if memory >= qc.high_memory_gb {
                    Some(budgets.high.quality.target)
                } else if memory <= qc.low_memory_gb {
                    Some(budgets.low.quality.target)
                } else {
                    None
                }
            }
            Self::DeviceCpu => {
                let cores = record
                    .client_hints
                    .hardware_concurrency
                    .or(record.device.processors)?;
                if cores >= qc.high_cores {
                    Some(budgets.high.quality.target)
                } else if cores <= qc.low_cores {
                    Some(budgets.low.quality.target)
                } else {
                    None
                }
            }
        }
    }
}

fn scale(base: u8, factor: f64) -> u8 {
    (f64::from(base) * factor).round().clamp(1.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityDecision {
    pub quality: u8,
    /// Name of the rule that decided, or `"base"`.
    pub rule: &'static str,
    /// Whether the DPR increment was applied on top of the rule's value.
    pub dpr_adjusted: bool,
}

/// Pick the output quality for a record.
pub fn decide_quality(record: &CapabilityRecord, config: &DetectorConfig) -> QualityDecision {
    let qc = &config.quality_cascade;
    let base = config.budgets.medium.quality.target;

    let mut rules = [
        (QualityRule::SaveData, qc.save_data_priority),
        (QualityRule::NetworkCondition, qc.network_condition_priority),
        (QualityRule::DeviceMemory, qc.device_memory_priority),
        (QualityRule::DeviceCpu, qc.device_cpu_priority),
    ];
    rules.sort_by_key(|&(_, priority)| Reverse(priority));

    let (quality, rule) = rules
        .iter()
        .find_map(|&(rule, _)| rule.evaluate(record, config, base).map(|q| (q, rule.name())))
        .unwrap_or((base, BASE_RULE));

    let save_data = record.client_hints.save_data_on();
    let dpr = record.client_hints.dpr.unwrap_or(record.performance.dpr);
    if qc.dpr_adjustment && !save_data && dpr > 1.0 {
        let adjusted = quality
            .saturating_add(qc.dpr_increment)
            .min(qc.max_quality)
            .max(quality);
        return QualityDecision {
            quality: adjusted,
            rule,
            dpr_adjusted: adjusted != quality,
        };
    }

    QualityDecision {
        quality,
        rule,
        dpr_adjusted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::DefaultStrategy;

    fn record() -> CapabilityRecord {
        DefaultStrategy::baseline_record(&DetectorConfig::default())
    }

    fn with_formats(webp: bool, avif: bool, source: FormatSource) -> CapabilityRecord {
        let mut r = record();
        r.formats = FormatSupport { webp, avif, source };
        r
    }

    #[test]
    fn format_prefers_avif_then_webp() {
        let c = FormatCascadeConfig::default();
        let d = decide_format(&with_formats(true, true, FormatSource::AcceptHeader), &c);
        assert_eq!(d, FormatDecision { format: ImageFormat::Avif, rule: "accept-header" });
        let d = decide_format(&with_formats(true, false, FormatSource::ClientHints), &c);
        assert_eq!(d, FormatDecision { format: ImageFormat::Webp, rule: "client-hints" });
        let d = decide_format(&with_formats(true, false, FormatSource::StaticData), &c);
        assert_eq!(d.rule, "browser-detection");
    }

    #[test]
    fn format_falls_back() {
        let c = FormatCascadeConfig::default();
        let d = decide_format(&with_formats(false, false, FormatSource::UserAgent), &c);
        assert_eq!(d, FormatDecision { format: ImageFormat::Jpeg, rule: FALLBACK_RULE });
        // Defaults never win a rule even when they claim support.
        let d = decide_format(&with_formats(true, false, FormatSource::Defaults), &c);
        assert_eq!(d.rule, FALLBACK_RULE);

        let png = FormatCascadeConfig {
            fallback: ImageFormat::Png,
            ..Default::default()
        };
        assert_eq!(decide_format(&record(), &png).format, ImageFormat::Png);
    }

    #[test]
    fn base_quality_without_signals() {
        let d = decide_quality(&record(), &DetectorConfig::default());
        assert_eq!(d, QualityDecision { quality: 75, rule: BASE_RULE, dpr_adjusted: false });
    }

    #[test]
    fn save_data_beats_network_and_skips_dpr() {
        let mut r = record();
        r.client_hints.save_data = Some(true);
        r.client_hints.dpr = Some(3.0);
        r.network = NetworkQuality::measured(NetworkTier::Fast, "4g");
        let d = decide_quality(&r, &DetectorConfig::default());
        assert_eq!(d, QualityDecision { quality: 50, rule: "save-data", dpr_adjusted: false });
    }

    #[test]
    fn network_condition_follows_tier() {
        let config = DetectorConfig::default();
        let mut r = record();
        r.network = NetworkQuality::measured(NetworkTier::Slow, "rtt");
        let d = decide_quality(&r, &config);
        assert_eq!((d.quality, d.rule), (64, "network-condition"));

        r.network = NetworkQuality::measured(NetworkTier::Fast, "4g");
        assert_eq!(decide_quality(&r, &config).quality, 83);

        r.network = NetworkQuality::estimated(NetworkTier::Fast, "desktop user agent");
        let d = decide_quality(&r, &config);
        assert_eq!((d.quality, d.rule), (83, "network-condition"));

        r.network = NetworkQuality::estimated(NetworkTier::Medium, "mobile user agent");
        assert_eq!(decide_quality(&r, &config).rule, BASE_RULE);
    }

    #[test]
    fn estimated_tier_beats_lower_priority_device_rules() {
        let config = DetectorConfig::default();
        let mut r = record();
        r.network = NetworkQuality::estimated(NetworkTier::Fast, "desktop user agent");
        r.client_hints.device_memory = Some(1.0);
        r.client_hints.hardware_concurrency = Some(2);
        let d = decide_quality(&r, &config);
        assert_eq!((d.quality, d.rule), (83, "network-condition"));

        let mut strict = config;
        strict.quality_cascade.network_condition_requires_measurement = true;
        let d = decide_quality(&r, &strict);
        assert_eq!((d.quality, d.rule), (60, "device-memory"));
    }

    #[test]
    fn fast_network_capped_by_high_tier_max() {
        let mut config = DetectorConfig::default();
        config.quality_cascade.fast_network_factor = 2.0;
        let mut r = record();
        r.network = NetworkQuality::measured(NetworkTier::Fast, "4g");
        assert_eq!(decide_quality(&r, &config).quality, 95);
    }

    #[test]
    fn device_rules() {
        let config = DetectorConfig::default();
        let mut r = record();
        r.client_hints.device_memory = Some(8.0);
        assert_eq!(
            (decide_quality(&r, &config).quality, decide_quality(&r, &config).rule),
            (85, "device-memory")
        );
        r.client_hints.device_memory = Some(4.0);
        r.client_hints.hardware_concurrency = Some(2);
        let d = decide_quality(&r, &config);
        assert_eq!((d.quality, d.rule), (60, "device-cpu"));
    }

    #[test]
    fn priorities_reorder_rules() {
        let mut config = DetectorConfig::default();
        config.quality_cascade.device_cpu_priority = 200;
        let mut r = record();
        r.network = NetworkQuality::measured(NetworkTier::Slow, "2g");
        r.client_hints.hardware_concurrency = Some(16);
        assert_eq!(decide_quality(&r, &config).rule, "device-cpu");
    }

    #[test]
    fn dpr_post_adjustment() {
        let config = DetectorConfig::default();
        let mut r = record();
        r.client_hints.dpr = Some(2.0);
        assert_eq!(
            decide_quality(&r, &config),
            QualityDecision { quality: 80, rule: BASE_RULE, dpr_adjusted: true }
        );

        r.client_hints.device_memory = Some(16.0);
        r.network = NetworkQuality::measured(NetworkTier::Fast, "4g");
        let mut capped = config.clone();
        capped.quality_cascade.fast_network_factor = 2.0;
        let d = decide_quality(&r, &capped);
        assert_eq!((d.quality, d.dpr_adjusted), (95, false));

        let mut off = config;
        off.quality_cascade.dpr_adjustment = false;
        r.network = NetworkQuality::estimated(NetworkTier::Medium, "unknown");
        r.client_hints.device_memory = None;
        assert_eq!(decide_quality(&r, &off).quality, 75);
    }
}
