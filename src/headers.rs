use indexmap::IndexMap;

use crate::types::{Brand, ClientHints, EffectiveConnectionType};

pub const USER_AGENT: &str = "user-agent";
pub const ACCEPT: &str = "accept";
pub const SEC_CH_DPR: &str = "sec-ch-dpr";
pub const DPR: &str = "dpr";
pub const SEC_CH_VIEWPORT_WIDTH: &str = "sec-ch-viewport-width";
pub const VIEWPORT_WIDTH: &str = "viewport-width";
pub const SEC_CH_VIEWPORT_HEIGHT: &str = "sec-ch-viewport-height";
pub const SEC_CH_WIDTH: &str = "sec-ch-width";
pub const WIDTH: &str = "width";
pub const SEC_CH_UA: &str = "sec-ch-ua";
pub const SEC_CH_UA_MOBILE: &str = "sec-ch-ua-mobile";
pub const SEC_CH_UA_PLATFORM: &str = "sec-ch-ua-platform";
pub const SEC_CH_UA_ARCH: &str = "sec-ch-ua-arch";
pub const SAVE_DATA: &str = "save-data";
pub const ECT: &str = "ect";
pub const RTT: &str = "rtt";
pub const DOWNLINK: &str = "downlink";
pub const SEC_CH_PREFERS_COLOR_SCHEME: &str = "sec-ch-prefers-color-scheme";
pub const SEC_CH_PREFERS_REDUCED_MOTION: &str = "sec-ch-prefers-reduced-motion";
pub const DEVICE_MEMORY: &str = "device-memory";
pub const HARDWARE_CONCURRENCY: &str = "hardware-concurrency";

/// Every header that carries a hint parsed into `ClientHints`.
pub const HINT_HEADERS: &[&str] = &[
    SEC_CH_DPR,
    DPR,
    SEC_CH_VIEWPORT_WIDTH,
    VIEWPORT_WIDTH,
    SEC_CH_VIEWPORT_HEIGHT,
    SEC_CH_WIDTH,
    WIDTH,
    SEC_CH_UA,
    SEC_CH_UA_MOBILE,
    SEC_CH_UA_PLATFORM,
    SEC_CH_UA_ARCH,
    SAVE_DATA,
    ECT,
    RTT,
    DOWNLINK,
    SEC_CH_PREFERS_COLOR_SCHEME,
    SEC_CH_PREFERS_REDUCED_MOTION,
    DEVICE_MEMORY,
    HARDWARE_CONCURRENCY,
];

/// Read access to a request's headers.
///
/// Lookups are case-insensitive. Implementors only need `header` and
/// `has_header_prefix`; everything else in the crate is built on those two.
pub trait RequestHeaders {
    fn header(&self, name: &str) -> Option<&str>;

    /// True if any header name starts with `prefix` (case-insensitive).
    fn has_header_prefix(&self, prefix: &str) -> bool;

    fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// First non-empty value among `names`, in order.
    fn first_header(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|n| self.header(n))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// Simple owned header set with lowercase keys, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: IndexMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl RequestHeaders for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        if let Some(v) = self.entries.get(name) {
            return Some(v.as_str());
        }
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn has_header_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.to_ascii_lowercase();
        self.entries.keys().any(|k| k.starts_with(&prefix))
    }
}

// ---------------------------------------------------------------------------
// Hint parsing
//
// Every parser returns `None` for a malformed value; nothing here fails.
// ---------------------------------------------------------------------------

/// Parse every hint header present on the request.
pub fn parse_client_hints(headers: &dyn RequestHeaders) -> ClientHints {
    ClientHints {
        dpr: headers
            .first_header(&[SEC_CH_DPR, DPR])
            .and_then(parse_positive_f64),
        viewport_width: headers
            .first_header(&[SEC_CH_VIEWPORT_WIDTH, VIEWPORT_WIDTH])
            .and_then(parse_u32),
        viewport_height: headers
            .first_header(&[SEC_CH_VIEWPORT_HEIGHT])
            .and_then(parse_u32),
        width: headers
            .first_header(&[SEC_CH_WIDTH, WIDTH])
            .and_then(parse_u32),
        brands: headers.first_header(&[SEC_CH_UA]).and_then(parse_brand_list),
        mobile: headers
            .first_header(&[SEC_CH_UA_MOBILE])
            .and_then(parse_structured_bool),
        platform: headers
            .first_header(&[SEC_CH_UA_PLATFORM])
            .and_then(parse_sf_string),
        arch: headers
            .first_header(&[SEC_CH_UA_ARCH])
            .and_then(parse_sf_string),
        save_data: headers.first_header(&[SAVE_DATA]).map(parse_save_data),
        ect: headers
            .first_header(&[ECT])
            .and_then(EffectiveConnectionType::from_str),
        rtt: headers.first_header(&[RTT]).and_then(parse_u32),
        downlink: headers
            .first_header(&[DOWNLINK])
            .and_then(parse_non_negative_f64),
        prefers_color_scheme: headers
            .first_header(&[SEC_CH_PREFERS_COLOR_SCHEME])
            .and_then(parse_sf_string),
        prefers_reduced_motion: headers
            .first_header(&[SEC_CH_PREFERS_REDUCED_MOTION])
            .and_then(parse_sf_string)
            .map(|v| v.eq_ignore_ascii_case("reduce")),
        device_memory: headers
            .first_header(&[DEVICE_MEMORY])
            .and_then(parse_positive_f64),
        hardware_concurrency: headers
            .first_header(&[HARDWARE_CONCURRENCY])
            .and_then(parse_u32)
            .filter(|&n| n > 0),
    }
}

/// True if any header parsed by `parse_client_hints` is present.
pub fn has_any_hint_header(headers: &dyn RequestHeaders) -> bool {
    HINT_HEADERS.iter().any(|h| headers.has_header(h))
}

fn parse_u32(v: &str) -> Option<u32> {
    let v = v.trim();
    if let Ok(n) = v.parse::<u32>() {
        return Some(n);
    }
    // Some agents send widths as decimals ("412.5").
    v.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f64)
        .map(|f| f.round() as u32)
}

fn parse_non_negative_f64(v: &str) -> Option<f64> {
    v.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
}

fn parse_positive_f64(v: &str) -> Option<f64> {
    parse_non_negative_f64(v).filter(|f| *f > 0.0)
}

/// Structured-field boolean: `?1` / `?0`.
fn parse_structured_bool(v: &str) -> Option<bool> {
    match v.trim() {
        "?1" => Some(true),
        "?0" => Some(false),
        _ => None,
    }
}

/// Structured-field string: strips surrounding quotes, rejects empty values.
fn parse_sf_string(v: &str) -> Option<String> {
    let s = v.trim().trim_matches('"').trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// `Save-Data: on` is the only value that enables data saving.
pub(crate) fn parse_save_data(v: &str) -> bool {
    v.split(';')
        .next()
        .map(|t| t.trim().eq_ignore_ascii_case("on"))
        .unwrap_or(false)
}

/// Parse a `Sec-CH-UA` brand list: `"Chromium";v="119", "Not?A_Brand";v="24"`.
///
/// Entries without a quoted brand are skipped; a list with no valid entry
/// is treated as absent.
pub(crate) fn parse_brand_list(v: &str) -> Option<Vec<Brand>> {
    let brands: Vec<Brand> = split_brand_entries(v)
        .into_iter()
        .filter_map(|entry| {
            let quoted = entry.trim().strip_prefix('"')?;
            let end = quoted.find('"')?;
            let name = &quoted[..end];
            if name.is_empty() {
                return None;
            }
            let major = quoted[end + 1..]
                .split(';')
                .filter_map(|p| p.trim().strip_prefix("v="))
                .map(|p| p.trim_matches('"').to_string())
                .next()
                .unwrap_or_default();
            Some(Brand {
                name: name.to_string(),
                major,
            })
        })
        .collect();
    if brands.is_empty() {
        None
    } else {
        Some(brands)
    }
}

/// Split on commas that are not inside a quoted string (GREASE brands may
/// contain punctuation).
fn split_brand_entries(v: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in v.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                out.push(&v[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&v[start..]);
    out
}
