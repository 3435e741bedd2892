use crate::browser_support::supports_client_hints;
use crate::types::{BrowserInfo, BrowserSource};

/// Hints requested from the client for subsequent requests.
const ACCEPT_CH: &str = "Sec-CH-DPR, Sec-CH-Width, Sec-CH-Viewport-Width, Sec-CH-Viewport-Height, \
Sec-CH-UA, Sec-CH-UA-Mobile, Sec-CH-UA-Platform, ECT, RTT, Downlink, Device-Memory, Save-Data";

/// Hints worth a retry of the very first request when missing.
const CRITICAL_CH: &str = "Sec-CH-DPR, Sec-CH-Viewport-Width";

/// Delegates the hints to cross-origin image hosts as well.
const PERMISSIONS_POLICY: &str = "ch-dpr=(self \"*\"), ch-width=(self \"*\"), \
ch-viewport-width=(self \"*\"), ch-viewport-height=(self \"*\"), ch-ect=(self \"*\"), \
ch-rtt=(self \"*\"), ch-downlink=(self \"*\"), ch-device-memory=(self \"*\")";

/// Response headers asking a Client-Hints capable browser to send hints next
/// time. Empty for browsers that would ignore them.
pub fn client_hint_response_headers(browser: &BrowserInfo) -> Vec<(&'static str, String)> {
    let capable = browser.source == BrowserSource::ClientHints
        || supports_client_hints(&browser.name, &browser.version);
    if !capable {
        return Vec::new();
    }
    vec![
        ("Accept-CH", ACCEPT_CH.to_string()),
        ("Critical-CH", CRITICAL_CH.to_string()),
        ("Permissions-Policy", PERMISSIONS_POLICY.to_string()),
    ]
}
