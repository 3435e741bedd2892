use std::sync::Arc;

use crate::browser_support::format_support;
use crate::classify::{class_for_score, performance_budget};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::headers::{self, RequestHeaders};
use crate::prefilter::HeaderFamilies;
use crate::types::*;
use crate::ua_parser::{ParsedUserAgent, UserAgentParser};

use super::{DetectionStrategy, PartialDetection};

/// Browser identity from User-Agent sniffing, with format support from the
/// static table and rough device/network guesses from the form factor.
pub struct UserAgentStrategy {
    priority: i32,
    parser: Arc<UserAgentParser>,
    config: Arc<DetectorConfig>,
}

impl UserAgentStrategy {
    pub fn new(priority: i32, parser: Arc<UserAgentParser>, config: Arc<DetectorConfig>) -> Self {
        Self {
            priority,
            parser,
            config,
        }
    }

    /// A UA string carries no network signal: phones are assumed to be on a
    /// cellular-grade link, everything else on a fast one.
    fn approximate_network(parsed: &ParsedUserAgent) -> NetworkQuality {
        if parsed.mobile {
            NetworkQuality::estimated(NetworkTier::Medium, "mobile user agent")
        } else {
            NetworkQuality::estimated(NetworkTier::Fast, "desktop user agent")
        }
    }

    fn approximate_device(&self, parsed: &ParsedUserAgent) -> DeviceCapabilities {
        let score = match (parsed.mobile, parsed.platform.as_deref()) {
            (true, Some("iOS")) => 50,
            (true, _) => 35,
            (false, Some("Android")) => 45,
            (false, None) => 50,
            (false, Some(_)) => 65,
        };
        DeviceCapabilities::estimated(class_for_score(score, &self.config.device), score)
    }
}

impl DetectionStrategy for UserAgentStrategy {
    fn name(&self) -> &'static str {
        "user-agent"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn requires(&self) -> HeaderFamilies {
        HeaderFamilies::USER_AGENT
    }

    fn detect(&self, request: &dyn RequestHeaders) -> Result<Option<PartialDetection>> {
        let ua = match request.first_header(&[headers::USER_AGENT]) {
            Some(ua) => ua,
            None => return Ok(None),
        };
        let parsed = self.parser.parse(ua);
        let found = match &parsed.browser {
            Some(b) => b,
            None => return Ok(None),
        };

        let (webp, avif) = format_support(&found.name, &found.version);
        let network = Self::approximate_network(&parsed);
        let device = self.approximate_device(&parsed);
        let hints = ClientHints {
            mobile: Some(parsed.mobile),
            platform: parsed.platform.clone(),
            ..Default::default()
        };
        let performance =
            performance_budget(device.class, network.tier, &hints, &self.config.budgets);

        Ok(Some(PartialDetection {
            browser: Some(BrowserInfo {
                name: found.name.clone(),
                version: found.version.clone(),
                mobile: parsed.mobile,
                platform: parsed.platform.clone(),
                source: BrowserSource::UserAgent,
            }),
            formats: Some(FormatSupport {
                webp,
                avif,
                source: FormatSource::UserAgent,
            }),
            network: Some(network),
            device: Some(device),
            performance: Some(performance),
            client_hints: Some(hints),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderMap;

    const CHROME_119: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";
    const OLD_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.1.2 Safari/605.1.15";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

    fn detect(ua: &str) -> Option<PartialDetection> {
        let s = UserAgentStrategy::new(
            60,
            Arc::new(UserAgentParser::new().unwrap()),
            Arc::new(DetectorConfig::default()),
        );
        s.detect(&HeaderMap::new().with("User-Agent", ua)).unwrap()
    }

    #[test]
    fn desktop_chrome() {
        let p = detect(CHROME_119).unwrap();
        let b = p.browser.unwrap();
        assert_eq!((b.name.as_str(), b.version.as_str()), ("chrome", "119.0"));
        assert!(!b.mobile);
        assert_eq!(b.source, BrowserSource::UserAgent);
        let f = p.formats.unwrap();
        assert!(f.webp && f.avif);
        assert_eq!(f.source, FormatSource::UserAgent);
        let n = p.network.unwrap();
        assert!(n.estimated);
        assert_eq!(n.tier, NetworkTier::Fast);
        assert_eq!(p.device.unwrap().class, DeviceClass::HighEnd);
    }

    #[test]
    fn old_safari_has_no_modern_formats() {
        let f = detect(OLD_SAFARI).unwrap().formats.unwrap();
        assert!(!f.webp && !f.avif);
    }

    #[test]
    fn iphone_is_mobile_mid_range() {
        let p = detect(IPHONE).unwrap();
        assert!(p.browser.as_ref().unwrap().mobile);
        assert_eq!(p.browser.unwrap().name, "ios_saf");
        let d = p.device.unwrap();
        assert_eq!(d.class, DeviceClass::MidRange);
        assert!(d.estimated);
        assert_eq!(p.network.unwrap().tier, NetworkTier::Medium);
        let hints = p.client_hints.unwrap();
        assert_eq!(hints.mobile, Some(true));
        assert_eq!(hints.platform.as_deref(), Some("iOS"));
    }

    #[test]
    fn unrecognised_agent_is_no_opinion() {
        assert!(detect("python-requests/2.31").is_none());
    }
}
