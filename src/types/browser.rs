use serde::{Deserialize, Serialize};

/// Which strategy actually produced a `BrowserInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserSource {
    ClientHints,
    UserAgent,
    Unknown,
}

impl BrowserSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientHints => "client-hints",
            Self::UserAgent => "user-agent",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserInfo {
    /// Canonical lowercase token (`chrome`, `and_chr`, `ios_saf`, ...).
    pub name: String,
    /// Possibly coarse (`"119"` from brand lists, `"119.0"` from UA strings).
    pub version: String,
    pub mobile: bool,
    pub platform: Option<String>,
    pub source: BrowserSource,
}

impl BrowserInfo {
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            version: String::new(),
            mobile: false,
            platform: None,
            source: BrowserSource::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.source == BrowserSource::Unknown
    }
}
