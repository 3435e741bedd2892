use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheStats, ResultCache};
use crate::cascade::{decide_format, decide_quality, FormatDecision, QualityDecision};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::hashing::cache_key;
use crate::headers::{parse_client_hints, RequestHeaders};
use crate::optimize::{optimize, Optimization, TransformOptions};
use crate::prefilter::HeaderFamilies;
use crate::response_hints::client_hint_response_headers;
use crate::strategies::{
    baseline_device, baseline_formats, baseline_network, baseline_performance,
    builtin_strategies, DetectionStrategy, PartialDetection,
};
use crate::types::*;
use crate::ua_parser::UserAgentParser;

/// Source name recorded for fields no strategy filled.
const BASELINE: &str = "baseline";

// ---------------------------------------------------------------------------
// Field bookkeeping for one detection pass
// ---------------------------------------------------------------------------

/// Bit set over the five required record fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FieldSet(u8);

impl FieldSet {
    const BROWSER: u8 = 1 << 0;
    const FORMATS: u8 = 1 << 1;
    const NETWORK: u8 = 1 << 2;
    const DEVICE: u8 = 1 << 3;
    const PERFORMANCE: u8 = 1 << 4;
    const ALL: u8 = Self::BROWSER | Self::FORMATS | Self::NETWORK | Self::DEVICE | Self::PERFORMANCE;

    fn has(&self, field: u8) -> bool {
        self.0 & field != 0
    }

    fn insert(&mut self, field: u8) {
        self.0 |= field;
    }

    fn is_complete(&self) -> bool {
        self.0 & Self::ALL == Self::ALL
    }
}

/// Accumulates partial results: first writer wins per field, hints are merged.
struct RecordBuilder {
    filled: FieldSet,
    browser: Option<(BrowserInfo, &'static str)>,
    formats: Option<(FormatSupport, &'static str)>,
    network: Option<(NetworkQuality, &'static str)>,
    device: Option<(DeviceCapabilities, &'static str)>,
    performance: Option<(PerformanceBudget, &'static str)>,
    client_hints: ClientHints,
}

impl RecordBuilder {
    fn new(seed_hints: ClientHints) -> Self {
        Self {
            filled: FieldSet::default(),
            browser: None,
            formats: None,
            network: None,
            device: None,
            performance: None,
            client_hints: seed_hints,
        }
    }

    fn merge(&mut self, source: &'static str, partial: PartialDetection) {
        fn take<T>(
            filled: &mut FieldSet,
            bit: u8,
            slot: &mut Option<(T, &'static str)>,
            value: Option<T>,
            source: &'static str,
        ) {
            if let Some(v) = value {
                if !filled.has(bit) {
                    *slot = Some((v, source));
                    filled.insert(bit);
                }
            }
        }

        take(&mut self.filled, FieldSet::BROWSER, &mut self.browser, partial.browser, source);
        take(&mut self.filled, FieldSet::FORMATS, &mut self.formats, partial.formats, source);
        take(&mut self.filled, FieldSet::NETWORK, &mut self.network, partial.network, source);
        take(&mut self.filled, FieldSet::DEVICE, &mut self.device, partial.device, source);
        take(
            &mut self.filled,
            FieldSet::PERFORMANCE,
            &mut self.performance,
            partial.performance,
            source,
        );
        if let Some(hints) = partial.client_hints {
            self.client_hints.fill_missing(&hints);
        }
    }

    fn is_complete(&self) -> bool {
        self.filled.is_complete()
    }

    /// Default whatever is still missing and freeze the record.
    fn finish(self, config: &DetectorConfig, elapsed: Duration) -> CapabilityRecord {
        let (browser, browser_src) = self
            .browser
            .unwrap_or_else(|| (BrowserInfo::unknown(), BASELINE));
        let (formats, formats_src) = self.formats.unwrap_or_else(|| (baseline_formats(), BASELINE));
        let (network, network_src) = self.network.unwrap_or_else(|| (baseline_network(), BASELINE));
        let (device, device_src) = self.device.unwrap_or_else(|| (baseline_device(), BASELINE));
        let (performance, performance_src) = self
            .performance
            .unwrap_or_else(|| (baseline_performance(config), BASELINE));

        CapabilityRecord {
            browser,
            formats,
            network,
            device,
            performance,
            client_hints: self.client_hints,
            detection_time_ms: elapsed.as_secs_f64() * 1000.0,
            detection_source: format!("{}+{}", browser_src, formats_src),
            sources: FieldSources {
                browser: browser_src,
                formats: formats_src,
                network: network_src,
                device: device_src,
                performance: performance_src,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Config plus the strategies derived from it, swapped as one unit.
struct DetectorState {
    config: Arc<DetectorConfig>,
    /// Sorted by descending priority; ties keep registration order.
    strategies: Vec<Box<dyn DetectionStrategy>>,
    /// Prefixed to cache keys so records computed under an older config are
    /// never served after a swap.
    generation: u64,
}

impl DetectorState {
    fn new(
        config: Arc<DetectorConfig>,
        mut strategies: Vec<Box<dyn DetectionStrategy>>,
        generation: u64,
    ) -> Self {
        strategies.sort_by_key(|s| Reverse(s.priority()));
        Self {
            config,
            strategies,
            generation,
        }
    }
}

/// Per-request client capability detection with a shared result cache.
///
/// Construct once at startup and share (`Arc<Detector>`) across request
/// handlers; every method takes `&self`.
pub struct Detector {
    state: RwLock<Arc<DetectorState>>,
    parser: Arc<UserAgentParser>,
    cache: ResultCache,
}

impl Detector {
    /// Build a detector running the built-in strategies enabled in `config`.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let parser = Arc::new(UserAgentParser::new()?);
        let config = Arc::new(config);
        let strategies = builtin_strategies(&config, &parser);
        Ok(Self::assemble(config, strategies, parser))
    }

    /// Detector with the built-in default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DetectorConfig::default())
    }

    /// Load configuration from a YAML file, or use the defaults when no path
    /// is given.
    pub fn from_config_file(path: Option<&Path>) -> Result<Self> {
        Self::new(DetectorConfig::load_or_default(path)?)
    }

    /// Detector running a caller-supplied strategy set instead of the
    /// built-ins. `config` still drives caching and the cascades.
    pub fn with_strategies(
        config: DetectorConfig,
        strategies: Vec<Box<dyn DetectionStrategy>>,
    ) -> Result<Self> {
        config.validate()?;
        let parser = Arc::new(UserAgentParser::new()?);
        Ok(Self::assemble(Arc::new(config), strategies, parser))
    }

    fn assemble(
        config: Arc<DetectorConfig>,
        strategies: Vec<Box<dyn DetectionStrategy>>,
        parser: Arc<UserAgentParser>,
    ) -> Self {
        let cache = ResultCache::from_config(&config.cache);
        let state = DetectorState::new(config, strategies, 0);
        debug!(
            strategies = ?state.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            ua_rules = parser.rule_count(),
            "detector ready"
        );
        Self {
            state: RwLock::new(Arc::new(state)),
            parser,
            cache,
        }
    }

    fn current(&self) -> Arc<DetectorState> {
        Arc::clone(&self.state.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// The configuration currently in effect.
    pub fn config(&self) -> Arc<DetectorConfig> {
        Arc::clone(&self.current().config)
    }

    /// Names of the active strategies in execution order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.current().strategies.iter().map(|s| s.name()).collect()
    }

    /// Replace the configuration and re-derive the built-in strategies.
    ///
    /// In-flight detections finish against the state they started with. The
    /// cache is cleared and resized. A detector built with
    /// [`Detector::with_strategies`] switches to the built-ins.
    pub fn update_config(&self, config: DetectorConfig) -> Result<()> {
        config.validate()?;
        let config = Arc::new(config);
        let strategies = builtin_strategies(&config, &self.parser);
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            let generation = guard.generation + 1;
            *guard = Arc::new(DetectorState::new(Arc::clone(&config), strategies, generation));
        }
        self.cache.reconfigure(&config.cache);
        info!("detector configuration replaced");
        Ok(())
    }

    /// Capability record for a request, served from the cache when possible.
    pub fn detect(&self, request: &dyn RequestHeaders) -> Arc<CapabilityRecord> {
        let state = self.current();
        let key = format!(
            "{}#{}",
            state.generation,
            cache_key(request, &state.config.cache)
        );
        if let Some(hit) = self.cache.get(&key) {
            trace!(key = %key, "capability cache hit");
            return hit;
        }
        let record = Arc::new(run_pass(&state, request));
        self.cache.put(key, Arc::clone(&record));
        record
    }

    /// Run a full detection pass, bypassing the cache entirely.
    pub fn detect_uncached(&self, request: &dyn RequestHeaders) -> CapabilityRecord {
        run_pass(&self.current(), request)
    }

    /// Detect many requests in parallel. Results keep input order.
    pub fn detect_batch<H>(&self, requests: &[H]) -> Vec<Arc<CapabilityRecord>>
    where
        H: RequestHeaders + Sync,
    {
        requests.par_iter().map(|r| self.detect(r)).collect()
    }

    /// Format decision for a detected record under the current config.
    pub fn decide_format(&self, record: &CapabilityRecord) -> FormatDecision {
        decide_format(record, &self.current().config.format_cascade)
    }

    /// Quality decision for a detected record under the current config.
    pub fn decide_quality(&self, record: &CapabilityRecord) -> QualityDecision {
        decide_quality(record, &self.current().config)
    }

    /// Detect, then fill the caller's unspecified transform options.
    pub fn optimize_request(
        &self,
        request: &dyn RequestHeaders,
        options: &mut TransformOptions,
    ) -> Optimization {
        let record = self.detect(request);
        optimize(&record, options, &self.current().config)
    }

    /// `Accept-CH` & co. to send back so the client includes hints next time.
    pub fn response_hint_headers(&self, record: &CapabilityRecord) -> Vec<(&'static str, String)> {
        client_hint_response_headers(&record.browser)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// One detection pass over the strategies of `state`.
fn run_pass(state: &DetectorState, request: &dyn RequestHeaders) -> CapabilityRecord {
    run_strategies(state, request, true)
}

/// `skip_unmet` only saves work: with it off, every strategy runs and the
/// ones missing their headers answer `None`.
fn run_strategies(
    state: &DetectorState,
    request: &dyn RequestHeaders,
    skip_unmet: bool,
) -> CapabilityRecord {
    let started = Instant::now();
    let present = HeaderFamilies::scan(request);
    let mut builder = RecordBuilder::new(parse_client_hints(request));

    for strategy in &state.strategies {
        let name = strategy.name();
        if skip_unmet && !present.satisfies(strategy.requires()) {
            trace!(strategy = name, "skipped: required headers absent");
            continue;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| strategy.detect(request))) {
            Ok(Ok(Some(partial))) => {
                trace!(strategy = name, "strategy contributed");
                builder.merge(name, partial);
            }
            Ok(Ok(None)) => trace!(strategy = name, "no opinion"),
            Ok(Err(err)) => warn!(strategy = name, error = %err, "detection strategy failed"),
            Err(_) => warn!(strategy = name, "detection strategy panicked"),
        }

        if builder.is_complete() {
            trace!(strategy = name, "all fields filled");
            break;
        }
    }

    builder.finish(&state.config, started.elapsed())
}
