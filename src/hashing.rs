use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::headers::{self, RequestHeaders};

/// Non-cryptographic string hash used for cache keys and memo tables.
/// The choice only changes key distribution, never detection results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Djb2,
    Fnv1a,
}

impl HashAlgorithm {
    pub fn hash(&self, input: &str) -> u32 {
        match self {
            Self::Djb2 => djb2(input.as_bytes()),
            Self::Fnv1a => fnv1a(input.as_bytes()),
        }
    }
}

/// `h = h * 33 + byte`, seeded with 5381.
pub fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(5381u32, |h, &b| {
        h.wrapping_shl(5).wrapping_add(h).wrapping_add(u32::from(b))
    })
}

/// 32-bit FNV-1a.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes
        .iter()
        .fold(OFFSET, |h, &b| (h ^ u32::from(b)).wrapping_mul(PRIME))
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
pub(crate) fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn flag(b: bool) -> char {
    if b {
        '1'
    } else {
        '0'
    }
}

/// Build the result-cache key for a request.
///
/// Layout: `<ua hash>:<webp><avif>:<dpr>:<viewport width>:<save-data><sec-ch-ua*>`.
/// Two clients that agree on every component share a cache entry even if
/// their other headers differ.
pub fn cache_key(headers: &dyn RequestHeaders, config: &CacheConfig) -> String {
    let ua = headers.header(headers::USER_AGENT).unwrap_or("");
    let ua_hash = config
        .hash_algorithm
        .hash(truncate_str(ua, config.max_user_agent_length));

    let accept = headers.header(headers::ACCEPT).unwrap_or("");
    let webp = accept.contains("image/webp");
    let avif = accept.contains("image/avif");

    let dpr = headers
        .first_header(&[headers::SEC_CH_DPR, headers::DPR])
        .unwrap_or("");
    let viewport = headers
        .first_header(&[headers::SEC_CH_VIEWPORT_WIDTH, headers::VIEWPORT_WIDTH])
        .unwrap_or("");
    let save_data = headers
        .first_header(&[headers::SAVE_DATA])
        .map_or(false, headers::parse_save_data);
    let has_ua_hints = headers.has_header_prefix(headers::SEC_CH_UA);

    format!(
        "{:08x}:{}{}:{}:{}:{}{}",
        ua_hash,
        flag(webp),
        flag(avif),
        dpr,
        viewport,
        flag(save_data),
        flag(has_ua_hints)
    )
}
