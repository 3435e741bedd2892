use serde::{Deserialize, Serialize};

/// Client hints extracted from HTTP request headers.
///
/// Every field is independently optional: `None` means the header was absent
/// or unparsable, which is never the same thing as `Some(false)` / `Some(0)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientHints {
    /// `Sec-CH-DPR` / `DPR`.
    pub dpr: Option<f64>,
    /// `Sec-CH-Viewport-Width` / `Viewport-Width`.
    pub viewport_width: Option<u32>,
    /// `Sec-CH-Viewport-Height`.
    pub viewport_height: Option<u32>,
    /// `Sec-CH-Width` / `Width` (intended resource width in physical pixels).
    pub width: Option<u32>,
    /// Brand list from `Sec-CH-UA`, in header order.
    pub brands: Option<Vec<Brand>>,
    /// `Sec-CH-UA-Mobile` (`?1` → true).
    pub mobile: Option<bool>,
    /// `Sec-CH-UA-Platform`, unquoted.
    pub platform: Option<String>,
    /// `Sec-CH-UA-Arch`, unquoted.
    pub arch: Option<String>,
    /// `Save-Data: on`.
    pub save_data: Option<bool>,
    /// `ECT`.
    pub ect: Option<EffectiveConnectionType>,
    /// `RTT` in milliseconds.
    pub rtt: Option<u32>,
    /// `Downlink` in Mbps.
    pub downlink: Option<f64>,
    /// `Sec-CH-Prefers-Color-Scheme`.
    pub prefers_color_scheme: Option<String>,
    /// `Sec-CH-Prefers-Reduced-Motion` (`reduce` → true).
    pub prefers_reduced_motion: Option<bool>,
    /// `Device-Memory` in GB.
    pub device_memory: Option<f64>,
    /// `Hardware-Concurrency` (logical cores).
    pub hardware_concurrency: Option<u32>,
}

/// One entry of the `Sec-CH-UA` brand list, e.g. `"Chromium";v="119"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    /// Significant version only; brand lists never carry full versions.
    pub major: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectiveConnectionType {
    #[serde(rename = "4g")]
    FourG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "slow-2g")]
    Slow2G,
}

impl EffectiveConnectionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4g" => Some(Self::FourG),
            "3g" => Some(Self::ThreeG),
            "2g" => Some(Self::TwoG),
            "slow-2g" => Some(Self::Slow2G),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FourG => "4g",
            Self::ThreeG => "3g",
            Self::TwoG => "2g",
            Self::Slow2G => "slow-2g",
        }
    }
}

impl ClientHints {
    /// True if no field carries a value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True if any network signal (Save-Data, ECT, RTT, Downlink) is present.
    pub fn has_network_signal(&self) -> bool {
        self.save_data.is_some()
            || self.ect.is_some()
            || self.rtt.is_some()
            || self.downlink.is_some()
    }

    /// True if any device capability signal (memory, cores, mobile) is present.
    pub fn has_device_signal(&self) -> bool {
        self.device_memory.is_some() || self.hardware_concurrency.is_some() || self.mobile.is_some()
    }

    /// Save-Data is only honoured when explicitly on.
    pub fn save_data_on(&self) -> bool {
        self.save_data == Some(true)
    }

    /// Copy every field that is absent here but present in `other`.
    /// Fields already set are never overwritten.
    pub fn fill_missing(&mut self, other: &ClientHints) {
        fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if dst.is_none() {
                dst.clone_from(src);
            }
        }
        fill(&mut self.dpr, &other.dpr);
        fill(&mut self.viewport_width, &other.viewport_width);
        fill(&mut self.viewport_height, &other.viewport_height);
        fill(&mut self.width, &other.width);
        fill(&mut self.brands, &other.brands);
        fill(&mut self.mobile, &other.mobile);
        fill(&mut self.platform, &other.platform);
        fill(&mut self.arch, &other.arch);
        fill(&mut self.save_data, &other.save_data);
        fill(&mut self.ect, &other.ect);
        fill(&mut self.rtt, &other.rtt);
        fill(&mut self.downlink, &other.downlink);
        fill(&mut self.prefers_color_scheme, &other.prefers_color_scheme);
        fill(&mut self.prefers_reduced_motion, &other.prefers_reduced_motion);
        fill(&mut self.device_memory, &other.device_memory);
        fill(&mut self.hardware_concurrency, &other.hardware_concurrency);
    }
}
