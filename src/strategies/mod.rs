//! Pluggable detection strategies.
//!
//! Each strategy inspects the request and answers with the subset of the
//! capability record it can fill, or nothing. Strategies never fail on bad
//! input; an unparsable header is simply an absent one.

mod accept_header;
mod client_hints;
mod fallback;
mod static_data;
mod user_agent;

use std::sync::Arc;

pub use accept_header::AcceptHeaderStrategy;
pub use client_hints::ClientHintsStrategy;
pub use fallback::DefaultStrategy;
pub use static_data::StaticDataStrategy;
pub use user_agent::UserAgentStrategy;

pub(crate) use fallback::{
    baseline_device, baseline_formats, baseline_network, baseline_performance,
};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::headers::RequestHeaders;
use crate::prefilter::HeaderFamilies;
use crate::types::*;
use crate::ua_parser::UserAgentParser;

/// Fields a strategy managed to determine. `None` means "no opinion".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDetection {
    pub browser: Option<BrowserInfo>,
    pub formats: Option<FormatSupport>,
    pub network: Option<NetworkQuality>,
    pub device: Option<DeviceCapabilities>,
    pub performance: Option<PerformanceBudget>,
    /// Merged additively into the record's hints rather than first-writer-wins.
    pub client_hints: Option<ClientHints>,
}

impl PartialDetection {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub trait DetectionStrategy: Send + Sync {
    /// Short identifier used in diagnostics (`detection_source`, logs).
    fn name(&self) -> &'static str;

    /// Higher runs first.
    fn priority(&self) -> i32;

    /// Header families without which `detect` can only answer `None`.
    fn requires(&self) -> HeaderFamilies {
        HeaderFamilies::NONE
    }

    fn detect(&self, request: &dyn RequestHeaders) -> Result<Option<PartialDetection>>;
}

/// Instantiate the enabled built-in strategies for `config`.
///
/// The UA parser is shared by every strategy that reads the User-Agent.
pub fn builtin_strategies(
    config: &Arc<DetectorConfig>,
    parser: &Arc<UserAgentParser>,
) -> Vec<Box<dyn DetectionStrategy>> {
    let s = &config.strategies;
    let mut out: Vec<Box<dyn DetectionStrategy>> = Vec::with_capacity(5);
    if s.client_hints.enabled {
        out.push(Box::new(ClientHintsStrategy::new(
            s.client_hints.priority,
            Arc::clone(parser),
            Arc::clone(config),
        )));
    }
    if s.accept_header.enabled {
        out.push(Box::new(AcceptHeaderStrategy::new(s.accept_header.priority)));
    }
    if s.user_agent.enabled {
        out.push(Box::new(UserAgentStrategy::new(
            s.user_agent.priority,
            Arc::clone(parser),
            Arc::clone(config),
        )));
    }
    if s.static_data.enabled {
        out.push(Box::new(StaticDataStrategy::new(
            s.static_data.priority,
            Arc::clone(parser),
        )));
    }
    if s.defaults.enabled {
        out.push(Box::new(DefaultStrategy::new(
            s.defaults.priority,
            Arc::clone(config),
        )));
    }
    out
}
