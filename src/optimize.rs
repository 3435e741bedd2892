use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cascade::{decide_format, decide_quality, FormatDecision, QualityDecision};
use crate::classify::bound_dpr;
use crate::config::DetectorConfig;
use crate::types::*;

/// Caller-supplied transform parameters, enriched in place.
pub type TransformOptions = IndexMap<String, Value>;

/// Diagnostics key added to the options.
pub const DETECTION_METRICS_KEY: &str = "__detectionMetrics";

/// Decisions taken while enriching one options map.
///
/// `None` means the caller had already chosen and the cascade did not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimization {
    pub format: Option<FormatDecision>,
    pub quality: Option<QualityDecision>,
    pub dpr: Option<f64>,
    pub optimized_width: Option<u32>,
    pub optimized_height: Option<u32>,
}

fn is_unset(options: &TransformOptions, key: &str) -> bool {
    matches!(options.get(key), None | Some(Value::Null))
}

fn wants_auto_format(options: &TransformOptions) -> bool {
    match options.get("format") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("auto"),
        Some(_) => false,
    }
}

/// Fill the transform options the caller left unspecified from a detected
/// record. Caller-supplied keys are never overwritten or removed.
pub fn optimize(
    record: &CapabilityRecord,
    options: &mut TransformOptions,
    config: &DetectorConfig,
) -> Optimization {
    let budget = &record.performance;

    let format = wants_auto_format(options).then(|| decide_format(record, &config.format_cascade));
    if let Some(d) = format {
        options.insert("format".into(), json!(d.format.as_str()));
    }

    let quality = is_unset(options, "quality").then(|| decide_quality(record, config));
    if let Some(d) = quality {
        options.insert("quality".into(), json!(d.quality));
    }

    let dpr = bound_dpr(
        record.client_hints.dpr.unwrap_or(budget.dpr),
        config.budgets.max_dpr,
    );
    let dpr = is_unset(options, "dpr").then_some(dpr);
    if let Some(dpr) = dpr {
        options.insert("dpr".into(), json!(dpr));
    }
    let effective_dpr = options.get("dpr").and_then(Value::as_f64).unwrap_or(1.0);

    let optimized_width = if is_unset(options, "width") && is_unset(options, "optimizedWidth") {
        record
            .client_hints
            .width
            .or_else(|| {
                record
                    .client_hints
                    .viewport_width
                    .map(|vw| (f64::from(vw) * effective_dpr).round() as u32)
            })
            .map(|w| w.min(budget.max_width))
    } else {
        None
    };
    if let Some(w) = optimized_width {
        options.insert("optimizedWidth".into(), json!(w));
    }

    let optimized_height = if is_unset(options, "height") && is_unset(options, "optimizedHeight") {
        record
            .client_hints
            .viewport_height
            .map(|vh| ((f64::from(vh) * effective_dpr).round() as u32).min(budget.max_height))
    } else {
        None
    };
    if let Some(h) = optimized_height {
        options.insert("optimizedHeight".into(), json!(h));
    }

    if !options.contains_key(DETECTION_METRICS_KEY) {
        options.insert(
            DETECTION_METRICS_KEY.into(),
            json!({
                "browser": {
                    "name": record.browser.name,
                    "version": record.browser.version,
                    "mobile": record.browser.mobile,
                    "source": record.browser.source.as_str(),
                },
                "deviceClass": record.device.class.as_str(),
                "networkTier": record.network.tier.as_str(),
                "detectionTime": record.detection_time_ms,
                "detectionSource": record.detection_source,
                "sources": record.sources,
                "formatRule": format.map(|d| d.rule),
                "qualityRule": quality.map(|d| d.rule),
            }),
        );
    }

    Optimization {
        format,
        quality,
        dpr,
        optimized_width,
        optimized_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::DefaultStrategy;

    fn record() -> CapabilityRecord {
        DefaultStrategy::baseline_record(&DetectorConfig::default())
    }

    #[test]
    fn fills_unset_options() {
        let mut r = record();
        r.formats = FormatSupport {
            webp: true,
            avif: false,
            source: FormatSource::AcceptHeader,
        };
        r.client_hints.dpr = Some(2.0);
        r.client_hints.viewport_width = Some(400);
        let mut opts = TransformOptions::new();
        let o = optimize(&r, &mut opts, &DetectorConfig::default());

        assert_eq!(opts["format"], json!("webp"));
        assert_eq!(opts["quality"], json!(80));
        assert_eq!(opts["dpr"], json!(2.0));
        assert_eq!(opts["optimizedWidth"], json!(800));
        assert!(!opts.contains_key("optimizedHeight"));
        assert_eq!(o.format.unwrap().rule, "accept-header");
        let metrics = &opts[DETECTION_METRICS_KEY];
        assert_eq!(metrics["deviceClass"], json!("mid-range"));
        assert_eq!(metrics["networkTier"], json!("medium"));
        assert_eq!(metrics["formatRule"], json!("accept-header"));
    }

    #[test]
    fn respects_caller_values() {
        let mut opts = TransformOptions::new();
        opts.insert("format".into(), json!("png"));
        opts.insert("quality".into(), json!(42));
        opts.insert("width".into(), json!(300));
        opts.insert(DETECTION_METRICS_KEY.into(), json!("mine"));
        let mut r = record();
        r.client_hints.viewport_width = Some(1000);
        let o = optimize(&r, &mut opts, &DetectorConfig::default());

        assert!(o.format.is_none() && o.quality.is_none());
        assert_eq!(opts["format"], json!("png"));
        assert_eq!(opts["quality"], json!(42));
        assert!(!opts.contains_key("optimizedWidth"));
        assert_eq!(opts[DETECTION_METRICS_KEY], json!("mine"));
    }

    #[test]
    fn auto_format_is_decided() {
        let mut opts = TransformOptions::new();
        opts.insert("format".into(), json!("AUTO"));
        optimize(&record(), &mut opts, &DetectorConfig::default());
        assert_eq!(opts["format"], json!("jpeg"));
    }

    #[test]
    fn dimensions_capped_by_budget() {
        let mut r = record();
        r.client_hints.dpr = Some(3.0);
        r.client_hints.viewport_width = Some(1000);
        r.client_hints.viewport_height = Some(900);
        let mut opts = TransformOptions::new();
        optimize(&r, &mut opts, &DetectorConfig::default());
        assert_eq!(opts["optimizedWidth"], json!(r.performance.max_width));
        assert_eq!(opts["optimizedHeight"], json!(r.performance.max_height));
    }

    #[test]
    fn caller_dpr_drives_dimensions() {
        let mut r = record();
        r.client_hints.dpr = Some(3.0);
        r.client_hints.viewport_width = Some(100);
        let mut opts = TransformOptions::new();
        opts.insert("dpr".into(), json!(1.5));
        let o = optimize(&r, &mut opts, &DetectorConfig::default());
        assert_eq!(o.dpr, None);
        assert_eq!(opts["optimizedWidth"], json!(150));
    }
}
