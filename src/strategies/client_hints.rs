use std::sync::Arc;

use crate::browser_support::{format_support, supports_client_hints, Memo};
use crate::classify::{device_capabilities, network_quality, performance_budget};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::hashing::fnv1a;
use crate::headers::{self, parse_client_hints, RequestHeaders};
use crate::prefilter::HeaderFamilies;
use crate::types::*;
use crate::ua_parser::UserAgentParser;

use super::{DetectionStrategy, PartialDetection};

/// Distinct User-Agents remembered by the support check before it resets.
const SUPPORT_MEMO_LIMIT: usize = 4096;

/// Highest-confidence strategy: reads Client Hints headers directly.
///
/// Gated on the User-Agent belonging to a browser known to send hints, so a
/// stray `DPR` header from an old proxy does not outrank UA detection.
pub struct ClientHintsStrategy {
    priority: i32,
    parser: Arc<UserAgentParser>,
    config: Arc<DetectorConfig>,
    /// UA hash → supports Client Hints.
    support: Memo<u32, bool>,
}

impl ClientHintsStrategy {
    pub fn new(priority: i32, parser: Arc<UserAgentParser>, config: Arc<DetectorConfig>) -> Self {
        Self {
            priority,
            parser,
            config,
            support: Memo::new(SUPPORT_MEMO_LIMIT),
        }
    }

    fn ua_supports_hints(&self, ua: &str) -> bool {
        self.support.get_or_insert_with(fnv1a(ua.as_bytes()), || {
            self.parser
                .parse(ua)
                .browser
                .map_or(false, |b| supports_client_hints(&b.name, &b.version))
        })
    }
}

/// GREASE entries (`"Not?A_Brand"`, `"Not)A;Brand"`, ...) are noise by design.
fn is_grease(brand: &str) -> bool {
    let lower = brand.to_ascii_lowercase();
    lower.contains("not") && lower.contains("brand")
}

fn canonical_brand(brand: &str, mobile: bool) -> String {
    match brand {
        "Google Chrome" | "Chromium" if mobile => "and_chr".to_string(),
        "Google Chrome" | "Chromium" => "chrome".to_string(),
        "Microsoft Edge" => "edge".to_string(),
        "Opera" | "Opera GX" => "opera".to_string(),
        "Samsung Internet" => "samsung".to_string(),
        "Brave" => "brave".to_string(),
        other => other.to_ascii_lowercase().replace(' ', "_"),
    }
}

/// Browser from the brand list: the first non-GREASE brand, preferring a
/// vendor brand over the generic `Chromium` entry.
fn browser_from_brands(hints: &ClientHints) -> Option<BrowserInfo> {
    let brands = hints.brands.as_ref()?;
    let mut real = brands.iter().filter(|b| !is_grease(&b.name));
    let first = real.clone().next()?;
    let chosen = if first.name == "Chromium" {
        real.find(|b| b.name != "Chromium").unwrap_or(first)
    } else {
        first
    };
    let mobile = hints.mobile.unwrap_or(false);
    Some(BrowserInfo {
        name: canonical_brand(&chosen.name, mobile),
        version: chosen.major.clone(),
        mobile,
        platform: hints.platform.clone(),
        source: BrowserSource::ClientHints,
    })
}

impl DetectionStrategy for ClientHintsStrategy {
    fn name(&self) -> &'static str {
        "client-hints"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn requires(&self) -> HeaderFamilies {
        HeaderFamilies {
            user_agent: true,
            client_hints: true,
            ..HeaderFamilies::NONE
        }
    }

    fn detect(&self, request: &dyn RequestHeaders) -> Result<Option<PartialDetection>> {
        let ua = match request.first_header(&[headers::USER_AGENT]) {
            Some(ua) => ua,
            None => return Ok(None),
        };
        if !self.ua_supports_hints(ua) {
            return Ok(None);
        }

        let hints = parse_client_hints(request);
        if hints.is_empty() {
            return Ok(None);
        }

        let browser = browser_from_brands(&hints);
        let formats = browser.as_ref().map(|b| {
            let (webp, avif) = format_support(&b.name, &b.version);
            FormatSupport {
                webp,
                avif,
                source: FormatSource::ClientHints,
            }
        });

        let network = hints
            .has_network_signal()
            .then(|| network_quality(&hints, &self.config.network));
        let device = device_capabilities(&hints, &self.config.device);

        let performance = (network.is_some() || device.is_some()).then(|| {
            performance_budget(
                device.as_ref().map_or(DeviceClass::MidRange, |d| d.class),
                network.as_ref().map_or(NetworkTier::Medium, |n| n.tier),
                &hints,
                &self.config.budgets,
            )
        });

        Ok(Some(PartialDetection {
            browser,
            formats,
            network,
            device,
            performance,
            client_hints: Some(hints),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderMap;

    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Mobile Safari/537.36";
    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

    fn strategy() -> ClientHintsStrategy {
        ClientHintsStrategy::new(
            100,
            Arc::new(UserAgentParser::new().unwrap()),
            Arc::new(DetectorConfig::default()),
        )
    }

    #[test]
    fn full_hint_request() {
        let h = HeaderMap::new()
            .with("User-Agent", CHROME_ANDROID)
            .with(
                "Sec-CH-UA",
                r#""Not_A Brand";v="8", "Chromium";v="119", "Google Chrome";v="119""#,
            )
            .with("Sec-CH-UA-Mobile", "?1")
            .with("Sec-CH-UA-Platform", "\"Android\"")
            .with("ECT", "4g")
            .with("Device-Memory", "8")
            .with("Sec-CH-DPR", "2.625");
        let p = strategy().detect(&h).unwrap().unwrap();

        let browser = p.browser.unwrap();
        assert_eq!(browser.name, "and_chr");
        assert_eq!(browser.version, "119");
        assert!(browser.mobile);
        assert_eq!(browser.platform.as_deref(), Some("Android"));
        assert_eq!(browser.source, BrowserSource::ClientHints);

        let formats = p.formats.unwrap();
        assert!(formats.webp && formats.avif);
        assert_eq!(formats.source, FormatSource::ClientHints);

        assert_eq!(p.network.unwrap().tier, NetworkTier::Fast);
        // 50 + 20 (memory) - 15 (mobile)
        assert_eq!(p.device.unwrap().score, 55);
        assert_eq!(p.performance.unwrap().dpr, 2.625);
        assert_eq!(p.client_hints.unwrap().dpr, Some(2.625));
    }

    #[test]
    fn unsupported_browser_yields_nothing() {
        let h = HeaderMap::new()
            .with("User-Agent", FIREFOX)
            .with("Sec-CH-DPR", "2");
        assert!(strategy().detect(&h).unwrap().is_none());
    }

    #[test]
    fn supported_browser_without_hints_yields_nothing() {
        let h = HeaderMap::new().with("User-Agent", CHROME_ANDROID);
        assert!(strategy().detect(&h).unwrap().is_none());
    }

    #[test]
    fn partial_hints_leave_gaps() {
        let h = HeaderMap::new()
            .with("User-Agent", CHROME_ANDROID)
            .with("Sec-CH-DPR", "3");
        let p = strategy().detect(&h).unwrap().unwrap();
        assert!(p.browser.is_none());
        assert!(p.formats.is_none());
        assert!(p.network.is_none());
        assert!(p.device.is_none());
        assert!(p.performance.is_none());
        assert_eq!(p.client_hints.unwrap().dpr, Some(3.0));
    }

    #[test]
    fn support_check_is_memoized() {
        let s = strategy();
        let h = HeaderMap::new()
            .with("User-Agent", CHROME_ANDROID)
            .with("RTT", "50");
        s.detect(&h).unwrap();
        s.detect(&h).unwrap();
        assert_eq!(s.support.len(), 1);
    }

    #[test]
    fn brand_selection() {
        let pick = |list: &str| {
            browser_from_brands(&ClientHints {
                brands: crate::headers::parse_brand_list(list),
                ..Default::default()
            })
            .map(|b| (b.name, b.version))
        };
        assert_eq!(
            pick(r#""Microsoft Edge";v="120", "Chromium";v="120", "Not?A_Brand";v="24""#),
            Some(("edge".into(), "120".into()))
        );
        assert_eq!(
            pick(r#""Chromium";v="118", "Not)A;Brand";v="24""#),
            Some(("chrome".into(), "118".into()))
        );
        assert_eq!(pick(r#""Not_A Brand";v="99""#), None);
    }
}
