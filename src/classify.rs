//! Pure classifiers turning raw hint values into coarse tiers.

use crate::config::{BudgetTable, DeviceThresholds, NetworkThresholds};
use crate::types::{
    ClientHints, DeviceCapabilities, DeviceClass, EffectiveConnectionType, NetworkQuality,
    NetworkTier, PerformanceBudget,
};

/// Network tier from Save-Data, ECT, RTT and downlink, in that order of
/// precedence. With no signal at all the tier is `medium`, estimated.
pub fn network_quality(hints: &ClientHints, t: &NetworkThresholds) -> NetworkQuality {
    if hints.save_data_on() {
        return NetworkQuality::measured(NetworkTier::Slow, "save-data requested");
    }

    if let Some(ect) = hints.ect {
        let tier = match ect {
            EffectiveConnectionType::FourG => NetworkTier::Fast,
            EffectiveConnectionType::ThreeG => NetworkTier::Medium,
            EffectiveConnectionType::TwoG | EffectiveConnectionType::Slow2G => NetworkTier::Slow,
        };
        return NetworkQuality::measured(tier, &format!("ect {}", ect.as_str()));
    }

    let rtt_fast = |rtt: u32| rtt < t.fast_rtt_ms;
    let rtt_slow = |rtt: u32| rtt > t.slow_rtt_ms;
    let dl_fast = |dl: f64| dl > t.fast_downlink_mbps;
    let dl_slow = |dl: f64| dl < t.slow_downlink_mbps;

    let (tier, description) = match (hints.rtt, hints.downlink) {
        (Some(rtt), Some(dl)) => {
            let tier = if rtt_fast(rtt) && dl_fast(dl) {
                NetworkTier::Fast
            } else if rtt_slow(rtt) || dl_slow(dl) {
                NetworkTier::Slow
            } else {
                NetworkTier::Medium
            };
            (tier, format!("rtt {rtt}ms, downlink {dl}Mbps"))
        }
        (Some(rtt), None) => {
            let tier = if rtt_fast(rtt) {
                NetworkTier::Fast
            } else if rtt_slow(rtt) {
                NetworkTier::Slow
            } else {
                NetworkTier::Medium
            };
            (tier, format!("rtt {rtt}ms"))
        }
        (None, Some(dl)) => {
            let tier = if dl_fast(dl) {
                NetworkTier::Fast
            } else if dl_slow(dl) {
                NetworkTier::Slow
            } else {
                NetworkTier::Medium
            };
            (tier, format!("downlink {dl}Mbps"))
        }
        (None, None) => {
            return NetworkQuality::estimated(NetworkTier::Medium, "no network hints");
        }
    };
    NetworkQuality::measured(tier, &description)
}

/// Score-based device classification from memory, cores and the mobile flag.
///
/// Returns `None` when none of those hints is present: an unhinted client is
/// unknown, not mid-range.
pub fn device_capabilities(hints: &ClientHints, t: &DeviceThresholds) -> Option<DeviceCapabilities> {
    if !hints.has_device_signal() {
        return None;
    }

    let mut score: i32 = 50;

    if let Some(mem) = hints.device_memory {
        if mem >= 8.0 {
            score += 20;
        } else if mem >= 4.0 {
            score += 10;
        } else if mem <= 1.0 {
            score -= 20;
        } else if mem <= 2.0 {
            score -= 10;
        }
    }

    if let Some(cores) = hints.hardware_concurrency {
        if cores >= 8 {
            score += 15;
        } else if cores >= 4 {
            score += 5;
        } else if cores <= 2 {
            score -= 10;
        }
    }

    if hints.mobile == Some(true) {
        score -= 15;
    }

    let score = score.clamp(0, 100) as u8;
    Some(DeviceCapabilities {
        class: class_for_score(score, t),
        score,
        memory_gb: hints.device_memory,
        processors: hints.hardware_concurrency,
        estimated: false,
    })
}

pub fn class_for_score(score: u8, t: &DeviceThresholds) -> DeviceClass {
    if score >= t.high_end_score {
        DeviceClass::HighEnd
    } else if score >= t.mid_range_score {
        DeviceClass::MidRange
    } else {
        DeviceClass::LowEnd
    }
}

/// Pick the tier budget for a device class, one tier lower on a slow network
/// or when Save-Data is on. DPR is the hinted value clamped to `[1, max_dpr]`.
pub fn performance_budget(
    device: DeviceClass,
    network: NetworkTier,
    hints: &ClientHints,
    budgets: &BudgetTable,
) -> PerformanceBudget {
    let class = if network == NetworkTier::Slow || hints.save_data_on() {
        device.step_down()
    } else {
        device
    };
    let dpr = bound_dpr(hints.dpr.unwrap_or(1.0), budgets.max_dpr);
    budgets.for_class(class).to_budget(dpr)
}

/// `max`/`min` instead of `clamp`: a NaN bound is ignored rather than panicking.
pub(crate) fn bound_dpr(dpr: f64, max_dpr: f64) -> f64 {
    dpr.max(1.0).min(max_dpr)
}
