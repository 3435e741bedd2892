mod browser_support;
mod cache;
mod cascade;
mod classify;
mod config;
mod detector;
mod error;
mod hashing;
pub mod headers;
mod helpers;
mod literal;
mod optimize;
mod prefilter;
mod response_hints;
pub mod strategies;
mod types;
mod ua_parser;

pub use browser_support::{format_support, supports_client_hints};
pub use cache::{CacheStats, ResultCache};
pub use cascade::{decide_format, decide_quality, FormatDecision, QualityDecision};
pub use classify::{class_for_score, device_capabilities, network_quality, performance_budget};
pub use config::*;
pub use detector::Detector;
pub use error::{Error, Result};
pub use hashing::{cache_key, HashAlgorithm};
pub use headers::{parse_client_hints, HeaderMap, RequestHeaders};
pub use optimize::{optimize, Optimization, TransformOptions, DETECTION_METRICS_KEY};
pub use prefilter::HeaderFamilies;
pub use response_hints::client_hint_response_headers;
pub use strategies::{DetectionStrategy, PartialDetection};
pub use types::*;
pub use ua_parser::{BrowserMatch, ParsedUserAgent, UserAgentParser};
