use super::*;
use serde::Serialize;

/// Strategy name that filled each required field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSources {
    pub browser: &'static str,
    pub formats: &'static str,
    pub network: &'static str,
    pub device: &'static str,
    pub performance: &'static str,
}

/// Everything detected about one client, produced by a single detection pass.
///
/// Records are frozen once built and shared as `Arc<CapabilityRecord>`;
/// cascades read them and never write back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityRecord {
    pub browser: BrowserInfo,
    pub formats: FormatSupport,
    pub network: NetworkQuality,
    pub device: DeviceCapabilities,
    pub performance: PerformanceBudget,
    pub client_hints: ClientHints,
    /// Wall-clock time spent in the detection pass.
    pub detection_time_ms: f64,
    /// `"<browser strategy>+<formats strategy>"`, for diagnostics.
    pub detection_source: String,
    pub sources: FieldSources,
}

impl CapabilityRecord {
    /// True if both records carry the same detection outcome, ignoring timing.
    pub fn same_detection(&self, other: &CapabilityRecord) -> bool {
        self.browser == other.browser
            && self.formats == other.formats
            && self.network == other.network
            && self.device == other.device
            && self.performance == other.performance
            && self.client_hints == other.client_hints
            && self.detection_source == other.detection_source
            && self.sources == other.sources
    }
}
